//! Duplex Badges Library
//!
//! Stamps a name onto every page of a PDF template and duplicates each
//! stamped page so the result prints duplex (same content front and back).
//! This library provides functionality to:
//! - Read a newline-delimited list of names
//! - Load a badge typeface once and measure text for centering
//! - Overlay each name onto every template page
//! - Write one duplex-ready PDF per name
//!
//! # Example
//!
//! ```no_run
//! use duplex_badges::batch::{run_batch, BatchOptions};
//! use std::path::PathBuf;
//!
//! let options = BatchOptions {
//!     template: PathBuf::from("badge-template.pdf"),
//!     names: PathBuf::from("attendees.txt"),
//!     output_dir: PathBuf::from("output"),
//!     font: PathBuf::from("ObviouslyNarwSemi.ttf"),
//!     font_size: 17.0,
//! };
//!
//! let summary = run_batch(&options, |_event| {}).expect("Failed to stamp badges");
//! println!("{} badges written", summary.written.len());
//! ```

pub mod batch;
pub mod error;
pub mod font;
pub mod names;
pub mod pdf;

// Re-export commonly used items
pub use error::{Error, Result};
