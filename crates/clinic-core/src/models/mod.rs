//! Domain models for the clinic core.

mod examination;
mod invoice;
mod patient;
mod regulation;

pub use examination::*;
pub use invoice::*;
pub use patient::*;
pub use regulation::*;

/// Money amounts in whole Vietnamese đồng.
pub type Vnd = i64;
