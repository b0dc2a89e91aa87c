//! Section-based translation file toolkit.
//!
//! This library parses StepMania-style translation files (`[Section]` titles,
//! `key=value` lines, free-form comments) into an order-preserving model,
//! writes them back byte for byte, and builds two maintenance tools on top:
//! a duplicates checker and a reference/target synchronizer.
//!
//! # Features
//!
//! - **Lossless round trip**: comments, blank lines and the file header survive
//!   a parse/write cycle unchanged
//! - **Duplicate tolerant**: repeated sections and keys are kept and indexed,
//!   never merged behind your back
//! - **Non-destructive tools**: fixes go to a `.generated` file next to the
//!   original, which is never overwritten
//! - **Optional tracing**: detailed logging when the `tracing` feature is enabled
//!
//! # Example
//!
//! ```rust,no_run
//! use section_sync::duplicates::DuplicatesChecker;
//!
//! let mut checker = DuplicatesChecker::new();
//! let report = checker.run_analyzer("fr.ini").unwrap();
//! println!("{}", report);
//!
//! if let Some(path) = checker.remove_duplicates().unwrap() {
//!     println!("Cleaned file written to {}", path.display());
//! }
//! ```

pub mod count;
pub mod duplicates;
pub mod format;
pub mod model;
pub mod parse;
pub mod sync;
pub mod validation;
pub mod write;
