//! # statline-table
//!
//! Dataset loading and ground-truth aggregates.
//!
//! A [`Table`] is a header row plus an ordered list of string records,
//! loaded once from CSV and immutable afterward. The two aggregates the
//! demo needs are deterministic and independent of any model:
//! - [`Table::top_by`]: the row with the maximum numeric value of a column
//!   (ties broken by original row order)
//! - [`Table::sum_by`]: per-group sums of a column, ordered by descending
//!   total

pub mod table;

pub use table::{GroupSum, Table, TopResult};

pub use statline_error::{Error, ErrorKind, Result};
