//! Run-level font normalization.
//!
//! Rewrites runs whose font family and size exactly match a [`FontRule`]'s
//! source pair, replacing the family for all three character-class variants
//! so no stale `w:rFonts` override survives. Everything else passes through
//! unchanged.

use crate::document::{Body, Document, Run, RunFonts, RunProp, Table};

/// An exact-match font rewrite rule. Sizes are in half-points.
#[derive(Debug, Clone, PartialEq)]
pub struct FontRule {
    pub source_family: String,
    pub source_size: u32,
    pub target_family: String,
    pub target_size: u32,
}

impl Default for FontRule {
    /// Times New Roman 10pt becomes Arial 9pt.
    fn default() -> Self {
        FontRule {
            source_family: "Times New Roman".to_string(),
            source_size: 20,
            target_family: "Arial".to_string(),
            target_size: 18,
        }
    }
}

impl FontRule {
    pub fn new(
        source_family: impl Into<String>,
        source_size: u32,
        target_family: impl Into<String>,
        target_size: u32,
    ) -> Self {
        FontRule {
            source_family: source_family.into(),
            source_size,
            target_family: target_family.into(),
            target_size,
        }
    }

    fn matches(&self, run: &Run) -> bool {
        run.font_family() == Some(self.source_family.as_str())
            && run.font_size() == Some(self.source_size)
    }
}

/// Apply the rule to body paragraphs and to table-cell paragraphs.
pub fn normalize_document(doc: &mut Document, rule: &FontRule) {
    normalize_paragraphs(&mut doc.body, rule);
    normalize_tables(&mut doc.body, rule);
}

/// Rewrite matching runs in body-level paragraphs. Tables are handled
/// separately by [`normalize_tables`].
pub fn normalize_paragraphs(body: &mut Body, rule: &FontRule) {
    for paragraph in body.paragraphs_mut() {
        for run in paragraph.runs_mut() {
            normalize_run(run, rule);
        }
    }
}

/// Rewrite matching runs in every paragraph of every table cell, recursing
/// into nested tables.
pub fn normalize_tables(body: &mut Body, rule: &FontRule) {
    for table in body.tables_mut() {
        normalize_table(table, rule);
    }
}

fn normalize_table(table: &mut Table, rule: &FontRule) {
    for row in table.rows_mut() {
        for cell in row.cells_mut() {
            for paragraph in cell.paragraphs_mut() {
                for run in paragraph.runs_mut() {
                    normalize_run(run, rule);
                }
            }
            for nested in cell.tables_mut() {
                normalize_table(nested, rule);
            }
        }
    }
}

/// Rewrite a single run in place if it matches the rule exactly.
///
/// On a match, every `w:rFonts` entry is dropped and a single fresh one with
/// the target family for the default, high-ANSI, and complex-script classes
/// takes its place at the front of the property list; every size entry
/// (`w:sz` and `w:szCs`) is set to the target size.
pub fn normalize_run(run: &mut Run, rule: &FontRule) {
    if !rule.matches(run) {
        return;
    }

    run.props.retain(|p| !matches!(p, RunProp::Fonts(_)));
    run.props
        .insert(0, RunProp::Fonts(RunFonts::uniform(rule.target_family.as_str())));

    for prop in &mut run.props {
        match prop {
            RunProp::Size(v) | RunProp::SizeCs(v) => *v = rule.target_size,
            _ => {}
        }
    }
}
