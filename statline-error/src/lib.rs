//! # statline-error
//!
//! Unified error handling for statline - following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., ColumnNotFound, InferenceFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use statline_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ColumnNotFound, "column 'ReceivingTD' not in header")
//!         .with_operation("table::top_by")
//!         .with_context("column", "ReceivingTD")
//!         .with_context("csv", "WR.csv"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, statline_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using statline Error
pub type Result<T> = std::result::Result<T, Error>;
