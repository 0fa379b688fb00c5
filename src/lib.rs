//! EPUB script converter
//!
//! A Rust library for converting the text of EPUB eBooks between Chinese script
//! variants, for example from Traditional to Simplified Chinese, while keeping the
//! container intact.
//!
//! A conversion unpacks the EPUB container into a temporary working tree, rewrites
//! the HTML/XHTML documents and the convertible fields of the OPF package document,
//! and packs the tree into a new container. Images, fonts, stylesheets and every
//! other file are carried over byte for byte.
//!
//! ## Features
//!
//! - Whole-archive conversion with stage-annotated errors and guaranteed removal
//!   of the working tree.
//! - Package document handling that converts the title, the description, the
//!   creators and the titles of flagged manifest items, and preserves the rest.
//! - Pluggable conversion through the [convert::TextConverter] trait, with a
//!   built-in dictionary based converter for Traditional and Simplified Chinese.
//!
//! ## Quick Start
//!
//! ```rust, no_run
//! # use epub_converter::{convert::{Ruleset, ScriptConverter}, pipeline::convert_archive};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = ScriptConverter::new(Ruleset::TraditionalToSimplified);
//! convert_archive("path/to/book.epub", "path/to/book.t2s.epub", &converter)?;
//! # Ok(())
//! # }
//! ```
//!
//! Any function with the signature `Fn(&str) -> Result<String, EpubError>` can be
//! used as a converter as well:
//!
//! ```rust, no_run
//! # use epub_converter::{error::EpubError, pipeline::convert_archive};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let upper = |text: &str| -> Result<String, EpubError> { Ok(text.to_uppercase()) };
//! convert_archive("path/to/book.epub", "path/to/book.upper.epub", &upper)?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod utils;

pub mod archive;
pub mod convert;
pub mod error;
pub mod opf;
pub mod pipeline;
pub mod transform;
pub mod types;

pub use utils::DecodeBytes;
