#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

pub mod calendar;
pub mod error;
pub mod idf;
pub mod interchange;
mod prelude;
pub mod schedule;

pub use self::error::{ConflictError, Error, LookupError, Result, ValidationError};
