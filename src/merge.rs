//! Document combination: page-break insertion and the merge loop.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::document::{Block, Document, Paragraph};
use crate::docx::{read_docx, write_docx};
use crate::error::Result;
use crate::normalize::{FontRule, normalize_document};
use crate::ui::Notifier;

/// Append one paragraph holding a hard page-break marker to the end of the
/// document body. Calling it N times appends N independent break paragraphs.
pub fn append_page_break(doc: &mut Document) {
    doc.body.blocks.push(Block::Paragraph(Paragraph::page_break()));
}

/// Outcome of a [`combine`] run.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Inputs merged into the output, in order.
    pub merged: Vec<PathBuf>,
    /// Inputs skipped, with the failure message.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Merge `inputs` into the template document and save the result.
///
/// The template is loaded as the base document. Each input is loaded,
/// font-normalized, preceded by a page break (for every input index after the
/// first), and its body blocks are moved onto the end of the base body in
/// original order. The base is saved exactly once, after all inputs.
///
/// A template or save failure is fatal and propagates; no output is written
/// on that path. A failure on an individual input is reported through the
/// notifier and that input is skipped.
pub fn combine<P, Q>(
    template: P,
    inputs: &[PathBuf],
    output: Q,
    rule: &FontRule,
    notifier: &dyn Notifier,
) -> Result<MergeReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let template = template.as_ref();
    let output = output.as_ref();

    let mut base = match read_docx(template) {
        Ok(doc) => doc,
        Err(e) => {
            notifier.error(&format!(
                "Template '{}' could not be loaded: {e}",
                template.display()
            ));
            return Err(e);
        }
    };
    notifier.info(&format!(
        "Template '{}' loaded as base document.",
        template.display()
    ));

    let mut report = MergeReport::default();
    for (i, path) in inputs.iter().enumerate() {
        let mut doc = match read_docx(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                notifier.warn(&format!(
                    "Could not process '{}': {e}. Skipping this file.",
                    path.display()
                ));
                report.skipped.push((path.clone(), e.to_string()));
                continue;
            }
        };
        debug!("processing {}", path.display());

        normalize_document(&mut doc, rule);

        // No break precedes the first document in the list.
        if i > 0 {
            append_page_break(&mut base);
        }

        base.body.append(&mut doc.body);
        notifier.info(&format!("Merged '{}'.", path.display()));
        report.merged.push(path.clone());
    }

    if let Err(e) = write_docx(&base, output) {
        notifier.error(&format!(
            "Could not save combined document to '{}': {e}",
            output.display()
        ));
        return Err(e);
    }
    notifier.info(&format!(
        "Combined document saved to '{}'.",
        output.display()
    ));

    Ok(report)
}
