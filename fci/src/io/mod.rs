//! Input/Output operations for FCI calculations
//!
//! This module handles logging setup and writing result tables.

mod output;

pub use output::{setup_output, write_spectrum};
