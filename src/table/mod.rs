//! CSV table handling
//!
//! Pure helpers used by the append job: reading the header line of an
//! existing document, projecting records into rows, serializing rows and
//! merging new content onto existing content. Nothing here performs I/O.

pub mod merge;
pub mod parse;
pub mod serialize;
pub mod types;

pub use merge::merge;
pub use parse::{ParseError, header_line};
pub use serialize::{compose, project, stringify};
pub use types::{Header, Record, Row};
