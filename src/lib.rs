//! Bundle a flat directory of files into a single `cats.txt`.
//!
//! Each regular file becomes one block: an 80-hyphen separator, a
//! `# File: <name>` header and the file's contents verbatim.

pub mod cli;
pub mod concat;
pub mod error;

pub use concat::{concatenate, Config, EntryOrder, Summary, OUTPUT_FILENAME};
pub use error::{CatsError, FileReadError, Result};
