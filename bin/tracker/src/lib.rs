#![allow(missing_docs)]

pub mod config;
pub mod report;
pub mod snapshot;
