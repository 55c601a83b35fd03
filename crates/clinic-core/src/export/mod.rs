//! Export functionality for monthly reports.

mod report;

pub use report::*;
