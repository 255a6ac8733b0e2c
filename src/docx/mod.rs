//! DOCX package reading and writing.

mod reader;
mod writer;

pub use reader::{read_docx, read_docx_from_reader};
pub use writer::{write_docx, write_docx_to_writer};

/// Package part holding the main document body.
pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
