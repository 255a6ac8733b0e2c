//! In-memory representation of a DOCX package and its body tree.
//!
//! A [`Document`] owns the raw zip parts of the package plus a typed view of
//! `word/document.xml`. Only the constructs the merge pipeline manipulates
//! (paragraphs, runs, run properties, tables) are modeled; everything else is
//! carried as verbatim markup so a load/save cycle preserves it.

use std::collections::HashSet;

/// WordprocessingML main namespace.
pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// A loaded DOCX package.
///
/// `parts` holds every file entry of the archive in original order, including
/// the stale bytes of `word/document.xml`; the parsed [`Body`] is
/// authoritative for that part and is re-serialized on save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub(crate) parts: Vec<(String, Vec<u8>)>,
    /// Verbatim attribute text of the `<w:document>` root element, so
    /// namespace declarations survive a round trip.
    pub document_attrs: String,
    pub body: Body,
}

impl Document {
    /// Create a minimal valid empty package: content types, package
    /// relationships, and an empty body.
    pub fn new() -> Self {
        Document {
            parts: vec![
                (
                    "[Content_Types].xml".to_string(),
                    CONTENT_TYPES_XML.as_bytes().to_vec(),
                ),
                ("_rels/.rels".to_string(), RELS_XML.as_bytes().to_vec()),
                ("word/document.xml".to_string(), Vec::new()),
            ],
            document_attrs: format!(" xmlns:w=\"{}\"", NS_W),
            body: Body::default(),
        }
    }

    /// Raw bytes of a package part, if present.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Names of all package parts, in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    pub(crate) fn push_part(&mut self, name: String, data: Vec<u8>) {
        self.parts.push((name, data));
    }

    pub(crate) fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    /// Drop duplicate part names, keeping the first occurrence.
    /// Some producers emit archives with repeated entries.
    pub(crate) fn dedup_parts(&mut self) {
        let mut seen = HashSet::new();
        self.parts.retain(|(n, _)| seen.insert(n.clone()));
    }
}

/// Root container of a document's block content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub blocks: Vec<Block>,
}

impl Body {
    /// Body-level paragraphs (not those inside tables).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Body-level tables.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Move every block of `other` onto the end of this body, preserving
    /// order. `other` is left empty.
    pub fn append(&mut self, other: &mut Body) {
        self.blocks.append(&mut other.blocks);
    }

    /// Concatenated text of all body-level paragraphs, one per line.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A block-level element of a body or table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Any other body-level element (`w:sectPr`, bookmarks, ...), verbatim.
    Raw(String),
}

/// An ordered sequence of runs with optional paragraph properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Verbatim `w:pPr` element, if present.
    pub props: Option<String>,
    pub children: Vec<ParaChild>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph whose sole content is a hard page break.
    pub fn page_break() -> Self {
        Paragraph {
            props: None,
            children: vec![ParaChild::Run(Run {
                props: Vec::new(),
                children: vec![RunChild::Break {
                    break_type: Some("page".to_string()),
                }],
            })],
        }
    }

    /// True when the paragraph consists of exactly one run holding a single
    /// page-break marker.
    pub fn is_page_break(&self) -> bool {
        matches!(
            self.children.as_slice(),
            [ParaChild::Run(run)] if matches!(
                run.children.as_slice(),
                [RunChild::Break { break_type: Some(t) }] if t == "page"
            )
        )
    }

    /// Direct child runs (runs nested inside hyperlinks etc. are not
    /// enumerated).
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|c| match c {
            ParaChild::Run(r) => Some(r),
            _ => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.children.iter_mut().filter_map(|c| match c {
            ParaChild::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Concatenated text of all direct runs.
    pub fn text(&self) -> String {
        self.runs().map(|r| r.text()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParaChild {
    Run(Run),
    /// Hyperlinks, bookmark markers, proofing marks, ..., verbatim.
    Raw(String),
}

/// Smallest text span carrying uniform formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    /// `w:rPr` children in document order.
    pub props: Vec<RunProp>,
    pub children: Vec<RunChild>,
}

impl Run {
    /// A plain text run with no properties.
    pub fn text_run(text: impl Into<String>) -> Self {
        Run {
            props: Vec::new(),
            children: vec![RunChild::Text {
                text: text.into(),
                preserve_space: true,
            }],
        }
    }

    /// Effective font family: the `w:ascii` attribute of `w:rFonts`.
    pub fn font_family(&self) -> Option<&str> {
        self.props.iter().find_map(|p| match p {
            RunProp::Fonts(f) => f.ascii.as_deref(),
            _ => None,
        })
    }

    /// Font size in half-points (`w:sz`).
    pub fn font_size(&self) -> Option<u32> {
        self.props.iter().find_map(|p| match p {
            RunProp::Size(v) => Some(*v),
            _ => None,
        })
    }

    pub fn fonts(&self) -> Option<&RunFonts> {
        self.props.iter().find_map(|p| match p {
            RunProp::Fonts(f) => Some(f),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                RunChild::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// One child of `w:rPr`, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum RunProp {
    Fonts(RunFonts),
    /// `w:sz`, in half-points.
    Size(u32),
    /// `w:szCs`, in half-points.
    SizeCs(u32),
    /// Any other run property (`w:b`, `w:i`, `w:color`, ...), verbatim.
    Raw(String),
}

/// Per-character-class font family overrides (`w:rFonts`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFonts {
    pub ascii: Option<String>,
    pub h_ansi: Option<String>,
    pub cs: Option<String>,
    pub east_asia: Option<String>,
    pub hint: Option<String>,
}

impl RunFonts {
    /// The same family for the default, high-ANSI, and complex-script
    /// character classes.
    pub fn uniform(family: impl Into<String>) -> Self {
        let family = family.into();
        RunFonts {
            ascii: Some(family.clone()),
            h_ansi: Some(family.clone()),
            cs: Some(family),
            east_asia: None,
            hint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunChild {
    Text {
        text: String,
        /// `xml:space="preserve"` on the `w:t`.
        preserve_space: bool,
    },
    /// `w:br`; `break_type` mirrors `w:type` ("page", "column", or absent
    /// for a line break).
    Break { break_type: Option<String> },
    /// Tabs, drawings, field chars, ..., verbatim.
    Raw(String),
}

/// An ordered sequence of rows (plus verbatim `w:tblPr`/`w:tblGrid`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub children: Vec<TableChild>,
}

impl Table {
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.children.iter().filter_map(|c| match c {
            TableChild::Row(r) => Some(r),
            _ => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut TableRow> {
        self.children.iter_mut().filter_map(|c| match c {
            TableChild::Row(r) => Some(r),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableChild {
    Row(TableRow),
    Raw(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub children: Vec<RowChild>,
}

impl TableRow {
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.children.iter().filter_map(|c| match c {
            RowChild::Cell(c) => Some(c),
            _ => None,
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.children.iter_mut().filter_map(|c| match c {
            RowChild::Cell(c) => Some(c),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowChild {
    Cell(TableCell),
    Raw(String),
}

/// A table cell: recursively the same shape as a document body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

impl TableCell {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.blocks.iter_mut().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }
}
