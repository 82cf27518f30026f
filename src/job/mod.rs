//! Job execution module
//!
//! This module provides the append job and the storage interface it runs against.

mod append;
pub mod storage;

pub use append::{AppendError, AppendJob, FILE_PATH_FIELD};
