use std::cell::RefCell;
use std::path::{Path, PathBuf};

use docxmerge::document::{
    Block, ParaChild, Paragraph, RowChild, Run, RunFonts, RunProp, Table, TableCell, TableChild,
    TableRow,
};
use docxmerge::ui::Notifier;
use docxmerge::{Document, FontRule, append_page_break, combine, read_docx, write_docx};
use tempfile::tempdir;

#[derive(Default)]
struct RecordingNotifier {
    warnings: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn info(&self, _message: &str) {}

    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

fn text_paragraph(text: &str) -> Block {
    Block::Paragraph(Paragraph {
        props: None,
        children: vec![ParaChild::Run(Run::text_run(text))],
    })
}

fn times_new_roman_run(text: &str) -> Run {
    Run {
        props: vec![
            RunProp::Fonts(RunFonts {
                ascii: Some("Times New Roman".to_string()),
                h_ansi: Some("Times New Roman".to_string()),
                ..Default::default()
            }),
            RunProp::Size(20),
        ],
        children: Run::text_run(text).children,
    }
}

fn doc_with_paragraphs(texts: &[&str]) -> Document {
    let mut doc = Document::new();
    for text in texts {
        doc.body.blocks.push(text_paragraph(text));
    }
    doc
}

fn write_to(dir: &Path, name: &str, doc: &Document) -> PathBuf {
    let path = dir.join(name);
    write_docx(doc, &path).expect("failed to write fixture");
    path
}

/// One label per body block: paragraph text, "<break>", "<table>", or "<raw>".
fn body_labels(doc: &Document) -> Vec<String> {
    doc.body
        .blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(p) if p.is_page_break() => "<break>".to_string(),
            Block::Paragraph(p) => p.text(),
            Block::Table(_) => "<table>".to_string(),
            Block::Raw(_) => "<raw>".to_string(),
        })
        .collect()
}

#[test]
fn test_combine_order_with_breaks_between_inputs() {
    let dir = tempdir().unwrap();

    let mut template = doc_with_paragraphs(&["Template heading"]);
    template
        .body
        .blocks
        .push(Block::Raw("<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/></w:sectPr>".into()));
    let template = write_to(dir.path(), "template.docx", &template);

    let a = write_to(dir.path(), "a.docx", &doc_with_paragraphs(&["Alpha"]));
    let b = write_to(dir.path(), "b.docx", &doc_with_paragraphs(&["Bravo"]));
    let c = write_to(dir.path(), "c.docx", &doc_with_paragraphs(&["Charlie"]));

    let output = dir.path().join("combined.docx");
    let notifier = RecordingNotifier::default();
    let report = combine(
        &template,
        &[a, b, c],
        &output,
        &FontRule::default(),
        &notifier,
    )
    .expect("combine failed");

    assert_eq!(report.merged.len(), 3);
    assert!(report.skipped.is_empty());

    let combined = read_docx(&output).unwrap();
    assert_eq!(
        body_labels(&combined),
        vec![
            "Template heading",
            "<raw>",
            "Alpha",
            "<break>",
            "Bravo",
            "<break>",
            "Charlie",
        ]
    );
}

#[test]
fn test_combine_with_zero_inputs_reproduces_template() {
    let dir = tempdir().unwrap();
    let template_doc = doc_with_paragraphs(&["Only the template"]);
    let template = write_to(dir.path(), "template.docx", &template_doc);
    let output = dir.path().join("combined.docx");

    let notifier = RecordingNotifier::default();
    let report = combine(&template, &[], &output, &FontRule::default(), &notifier).unwrap();

    assert!(report.merged.is_empty());
    let combined = read_docx(&output).unwrap();
    assert_eq!(combined.body, template_doc.body);
}

#[test]
fn test_missing_input_is_skipped_without_break() {
    let dir = tempdir().unwrap();
    let template = write_to(dir.path(), "template.docx", &doc_with_paragraphs(&["T"]));
    let a = write_to(dir.path(), "a.docx", &doc_with_paragraphs(&["Alpha"]));
    let missing = dir.path().join("missing.docx");
    let c = write_to(dir.path(), "c.docx", &doc_with_paragraphs(&["Charlie"]));

    let output = dir.path().join("combined.docx");
    let notifier = RecordingNotifier::default();
    let report = combine(
        &template,
        &[a, missing.clone(), c],
        &output,
        &FontRule::default(),
        &notifier,
    )
    .expect("a single bad input must not abort the batch");

    assert_eq!(report.merged.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, missing);
    assert_eq!(notifier.warnings.borrow().len(), 1);
    assert!(notifier.warnings.borrow()[0].contains("missing.docx"));

    let combined = read_docx(&output).unwrap();
    assert_eq!(
        body_labels(&combined),
        vec!["T", "Alpha", "<break>", "Charlie"]
    );
}

#[test]
fn test_missing_template_is_fatal_and_writes_no_output() {
    let dir = tempdir().unwrap();
    let a = write_to(dir.path(), "a.docx", &doc_with_paragraphs(&["Alpha"]));
    let output = dir.path().join("combined.docx");

    let notifier = RecordingNotifier::default();
    let result = combine(
        dir.path().join("no-such-template.docx"),
        &[a],
        &output,
        &FontRule::default(),
        &notifier,
    );

    assert!(result.is_err());
    assert!(!output.exists());
    assert_eq!(notifier.errors.borrow().len(), 1);
}

#[test]
fn test_combine_is_deterministic() {
    let dir = tempdir().unwrap();
    let template = write_to(dir.path(), "template.docx", &doc_with_paragraphs(&["T"]));
    let a = write_to(dir.path(), "a.docx", &doc_with_paragraphs(&["Alpha"]));
    let b = write_to(dir.path(), "b.docx", &doc_with_paragraphs(&["Bravo"]));

    let out1 = dir.path().join("first.docx");
    let out2 = dir.path().join("second.docx");
    let notifier = RecordingNotifier::default();
    let inputs = vec![a, b];
    combine(&template, &inputs, &out1, &FontRule::default(), &notifier).unwrap();
    combine(&template, &inputs, &out2, &FontRule::default(), &notifier).unwrap();

    assert_eq!(std::fs::read(&out1).unwrap(), std::fs::read(&out2).unwrap());
}

#[test]
fn test_inputs_are_normalized_but_template_is_not() {
    let dir = tempdir().unwrap();

    let mut template_doc = Document::new();
    template_doc.body.blocks.push(Block::Paragraph(Paragraph {
        props: None,
        children: vec![ParaChild::Run(times_new_roman_run("Template text"))],
    }));
    let template = write_to(dir.path(), "template.docx", &template_doc);

    let mut input_doc = Document::new();
    input_doc.body.blocks.push(Block::Paragraph(Paragraph {
        props: None,
        children: vec![ParaChild::Run(times_new_roman_run("Input text"))],
    }));
    input_doc.body.blocks.push(Block::Table(Table {
        children: vec![TableChild::Row(TableRow {
            children: vec![RowChild::Cell(TableCell {
                blocks: vec![Block::Paragraph(Paragraph {
                    props: None,
                    children: vec![ParaChild::Run(times_new_roman_run("Cell text"))],
                })],
            })],
        })],
    }));
    let input = write_to(dir.path(), "input.docx", &input_doc);

    let output = dir.path().join("combined.docx");
    let notifier = RecordingNotifier::default();
    combine(&template, &[input], &output, &FontRule::default(), &notifier).unwrap();

    let combined = read_docx(&output).unwrap();
    let paragraphs: Vec<_> = combined.body.paragraphs().collect();

    // The template's own formatting is left alone.
    let template_run = paragraphs[0].runs().next().unwrap();
    assert_eq!(template_run.font_family(), Some("Times New Roman"));
    assert_eq!(template_run.font_size(), Some(20));

    // The merged input's body run is rewritten, all three variants included.
    let input_run = paragraphs[1].runs().next().unwrap();
    assert_eq!(input_run.font_family(), Some("Arial"));
    assert_eq!(input_run.font_size(), Some(18));
    let fonts = input_run.fonts().unwrap();
    assert_eq!(fonts.h_ansi.as_deref(), Some("Arial"));
    assert_eq!(fonts.cs.as_deref(), Some("Arial"));

    // So is the run inside the table cell.
    let table = combined.body.tables().next().unwrap();
    let cell = table.rows().next().unwrap().cells().next().unwrap();
    let cell_run = cell.paragraphs().next().unwrap().runs().next().unwrap();
    assert_eq!(cell_run.font_family(), Some("Arial"));
}

#[test]
fn test_append_page_break_appends_independent_paragraphs() {
    let mut doc = Document::new();
    append_page_break(&mut doc);
    append_page_break(&mut doc);

    assert_eq!(doc.body.blocks.len(), 2);
    for block in &doc.body.blocks {
        let Block::Paragraph(p) = block else {
            panic!("expected paragraph block");
        };
        assert!(p.is_page_break());
    }
}
