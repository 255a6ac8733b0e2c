use std::io::{Seek, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::docx::DOCUMENT_PART;
use crate::document::{
    Block, Document, ParaChild, Paragraph, RowChild, Run, RunChild, RunFonts, RunProp, Table,
    TableChild,
};
use crate::error::Result;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// Write a [`Document`] to a DOCX file on disk, overwriting any existing
/// file.
///
/// The body is re-serialized into `word/document.xml`; every other package
/// part is emitted byte-for-byte in its original archive order. Output is a
/// pure function of the document, so identical inputs produce identical
/// files.
///
/// # Example
///
/// ```no_run
/// use docxmerge::{Document, write_docx};
///
/// let doc = Document::new();
/// write_docx(&doc, "empty.docx")?;
/// # Ok::<(), docxmerge::Error>(())
/// ```
pub fn write_docx<P: AsRef<Path>>(doc: &Document, path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_docx_to_writer(doc, file)
}

/// Write a [`Document`] to any [`Write`] + [`Seek`] destination.
pub fn write_docx_to_writer<W: Write + Seek>(doc: &Document, writer: W) -> Result<()> {
    let document_xml = serialize_document_xml(doc);

    let mut zip = ZipWriter::new(writer);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, data) in &doc.parts {
        zip.start_file(name.as_str(), options)?;
        if name == DOCUMENT_PART {
            zip.write_all(document_xml.as_bytes())?;
        } else {
            zip.write_all(data)?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Serialize the body tree back into `word/document.xml`.
pub(crate) fn serialize_document_xml(doc: &Document) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push_str("<w:document");
    xml.push_str(&doc.document_attrs);
    xml.push_str("><w:body>");
    for block in &doc.body.blocks {
        write_block(&mut xml, block);
    }
    xml.push_str("</w:body></w:document>");
    xml
}

fn write_block(xml: &mut String, block: &Block) {
    match block {
        Block::Paragraph(p) => write_paragraph(xml, p),
        Block::Table(t) => write_table(xml, t),
        Block::Raw(raw) => xml.push_str(raw),
    }
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) {
    xml.push_str("<w:p>");
    if let Some(props) = &paragraph.props {
        xml.push_str(props);
    }
    for child in &paragraph.children {
        match child {
            ParaChild::Run(run) => write_run(xml, run),
            ParaChild::Raw(raw) => xml.push_str(raw),
        }
    }
    xml.push_str("</w:p>");
}

fn write_run(xml: &mut String, run: &Run) {
    xml.push_str("<w:r>");
    if !run.props.is_empty() {
        xml.push_str("<w:rPr>");
        for prop in &run.props {
            write_run_prop(xml, prop);
        }
        xml.push_str("</w:rPr>");
    }
    for child in &run.children {
        match child {
            RunChild::Text {
                text,
                preserve_space,
            } => {
                if *preserve_space {
                    xml.push_str("<w:t xml:space=\"preserve\">");
                } else {
                    xml.push_str("<w:t>");
                }
                xml.push_str(&escape_xml(text));
                xml.push_str("</w:t>");
            }
            RunChild::Break { break_type } => match break_type {
                Some(kind) => {
                    xml.push_str("<w:br w:type=\"");
                    xml.push_str(&escape_xml(kind));
                    xml.push_str("\"/>");
                }
                None => xml.push_str("<w:br/>"),
            },
            RunChild::Raw(raw) => xml.push_str(raw),
        }
    }
    xml.push_str("</w:r>");
}

fn write_run_prop(xml: &mut String, prop: &RunProp) {
    match prop {
        RunProp::Fonts(fonts) => write_run_fonts(xml, fonts),
        RunProp::Size(v) => {
            xml.push_str("<w:sz w:val=\"");
            xml.push_str(&v.to_string());
            xml.push_str("\"/>");
        }
        RunProp::SizeCs(v) => {
            xml.push_str("<w:szCs w:val=\"");
            xml.push_str(&v.to_string());
            xml.push_str("\"/>");
        }
        RunProp::Raw(raw) => xml.push_str(raw),
    }
}

fn write_run_fonts(xml: &mut String, fonts: &RunFonts) {
    xml.push_str("<w:rFonts");
    for (attr, value) in [
        ("w:ascii", &fonts.ascii),
        ("w:hAnsi", &fonts.h_ansi),
        ("w:cs", &fonts.cs),
        ("w:eastAsia", &fonts.east_asia),
        ("w:hint", &fonts.hint),
    ] {
        if let Some(value) = value {
            xml.push(' ');
            xml.push_str(attr);
            xml.push_str("=\"");
            xml.push_str(&escape_xml(value));
            xml.push('"');
        }
    }
    xml.push_str("/>");
}

fn write_table(xml: &mut String, table: &Table) {
    xml.push_str("<w:tbl>");
    for child in &table.children {
        match child {
            TableChild::Row(row) => {
                xml.push_str("<w:tr>");
                for row_child in &row.children {
                    match row_child {
                        RowChild::Cell(cell) => {
                            xml.push_str("<w:tc>");
                            for block in &cell.blocks {
                                write_block(xml, block);
                            }
                            xml.push_str("</w:tc>");
                        }
                        RowChild::Raw(raw) => xml.push_str(raw),
                    }
                }
                xml.push_str("</w:tr>");
            }
            TableChild::Raw(raw) => xml.push_str(raw),
        }
    }
    xml.push_str("</w:tbl>");
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
