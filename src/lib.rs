//! # docxmerge
//!
//! A small library and CLI for merging DOCX documents into one output
//! document, normalizing run-level font formatting and inserting hard page
//! breaks between sources.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docxmerge::{FontRule, combine, ui::ConsoleNotifier};
//! use std::path::PathBuf;
//!
//! let inputs = vec![PathBuf::from("a.docx"), PathBuf::from("b.docx")];
//! let report = combine(
//!     "template.docx",
//!     &inputs,
//!     "combined.docx",
//!     &FontRule::default(),
//!     &ConsoleNotifier::new(false),
//! )?;
//! println!("merged {} files", report.merged.len());
//! # Ok::<(), docxmerge::Error>(())
//! ```
//!
//! ## Working with documents
//!
//! The [`Document`] struct is the central data type: the package's zip parts
//! plus a typed view of the body tree. Markup the merge pipeline does not
//! interpret is carried verbatim, so a load/save cycle preserves it.
//!
//! ```no_run
//! use docxmerge::{FontRule, normalize_document, read_docx, write_docx};
//!
//! let mut doc = read_docx("input.docx")?;
//! normalize_document(&mut doc, &FontRule::default());
//! write_docx(&doc, "normalized.docx")?;
//! # Ok::<(), docxmerge::Error>(())
//! ```

pub mod document;
pub mod docx;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod ui;

pub use document::{Block, Body, Document, Paragraph, Run, Table};
pub use docx::{read_docx, read_docx_from_reader, write_docx, write_docx_to_writer};
pub use error::{Error, Result};
pub use merge::{MergeReport, append_page_break, combine};
pub use normalize::{FontRule, normalize_document};
