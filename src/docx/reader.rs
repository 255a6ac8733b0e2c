use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use crate::docx::DOCUMENT_PART;
use crate::document::{
    Block, Body, Document, ParaChild, Paragraph, RowChild, Run, RunChild, RunFonts, RunProp,
    Table, TableCell, TableChild, TableRow,
};
use crate::error::{Error, Result};

/// Read a DOCX file from disk into a [`Document`].
///
/// Every package part is kept verbatim; `word/document.xml` is additionally
/// parsed into the typed body tree.
///
/// # Example
///
/// ```no_run
/// use docxmerge::read_docx;
///
/// let doc = read_docx("report.docx")?;
/// println!("{} paragraphs", doc.body.paragraphs().count());
/// # Ok::<(), docxmerge::Error>(())
/// ```
pub fn read_docx<P: AsRef<Path>>(path: P) -> Result<Document> {
    let file = std::fs::File::open(path)?;
    read_docx_from_reader(file)
}

/// Read a DOCX from any [`Read`] + [`Seek`] source.
///
/// Useful for reading from memory buffers.
pub fn read_docx_from_reader<R: Read + Seek>(reader: R) -> Result<Document> {
    let mut archive = ZipArchive::new(reader)?;

    let mut doc = Document::default();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        doc.push_part(name, data);
    }
    doc.dedup_parts();
    log::trace!("read {} package parts", doc.part_names().count());

    let xml = doc
        .part(DOCUMENT_PART)
        .ok_or_else(|| Error::MissingPart(DOCUMENT_PART.to_string()))?;
    let xml = String::from_utf8(strip_bom(xml).to_vec())?;

    let (document_attrs, body) = parse_document_xml(&xml)?;
    doc.document_attrs = document_attrs;
    doc.body = body;

    Ok(doc)
}

/// Parse `word/document.xml` into the root element's attribute text and the
/// typed [`Body`].
pub(crate) fn parse_document_xml(xml: &str) -> Result<(String, Body)> {
    let mut reader = Reader::from_str(xml);

    let mut document_attrs = String::new();
    let mut body = Body::default();
    let mut saw_body = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"document" => document_attrs = raw_attrs(&e),
                b"body" => {
                    let end = e.name().as_ref().to_vec();
                    body.blocks = parse_blocks(&mut reader, &end)?;
                    saw_body = true;
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"document" => document_attrs = raw_attrs(&e),
                b"body" => saw_body = true,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    if !saw_body {
        return Err(Error::InvalidDocx("no w:body element found".to_string()));
    }

    Ok((document_attrs, body))
}

/// Parse block-level children (paragraphs, tables, anything else verbatim)
/// until the given closing tag. Used for both `w:body` and `w:tc`.
fn parse_blocks(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"p" => blocks.push(Block::Paragraph(parse_paragraph(reader, &e)?)),
                b"tbl" => blocks.push(Block::Table(parse_table(reader, &e)?)),
                _ => blocks.push(Block::Raw(capture_element(reader, &e)?)),
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"p" => blocks.push(Block::Paragraph(Paragraph::new())),
                b"tbl" => blocks.push(Block::Table(Table::default())),
                _ => blocks.push(Block::Raw(raw_tag(&e, true))),
            },
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(blocks),
            Ok(Event::Eof) => {
                return Err(Error::InvalidDocx(
                    "unexpected end of document.xml".to_string(),
                ));
            }
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
}

fn parse_paragraph(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Paragraph> {
    let end = start.name().as_ref().to_vec();
    let mut paragraph = Paragraph::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"pPr" => paragraph.props = Some(capture_element(reader, &e)?),
                b"r" => paragraph.children.push(ParaChild::Run(parse_run(reader, &e)?)),
                _ => paragraph
                    .children
                    .push(ParaChild::Raw(capture_element(reader, &e)?)),
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"pPr" => paragraph.props = Some(raw_tag(&e, true)),
                b"r" => paragraph.children.push(ParaChild::Run(Run::default())),
                _ => paragraph.children.push(ParaChild::Raw(raw_tag(&e, true))),
            },
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(paragraph),
            Ok(Event::Eof) => {
                return Err(Error::InvalidDocx("unterminated w:p element".to_string()));
            }
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
}

fn parse_run(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Run> {
    let end = start.name().as_ref().to_vec();
    let mut run = Run::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"rPr" => run.props = parse_run_props(reader, &e)?,
                b"t" => {
                    let preserve_space = has_preserve_space(&e);
                    let text = read_element_text(reader, e.name().as_ref())?;
                    run.children.push(RunChild::Text {
                        text,
                        preserve_space,
                    });
                }
                b"br" => {
                    let break_type = attr_value(&e, b"type")?;
                    // w:br is defined as empty; tolerate a start/end pair.
                    reader.read_text(e.name())?;
                    run.children.push(RunChild::Break { break_type });
                }
                _ => run.children.push(RunChild::Raw(capture_element(reader, &e)?)),
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"rPr" => {}
                b"t" => run.children.push(RunChild::Text {
                    text: String::new(),
                    preserve_space: has_preserve_space(&e),
                }),
                b"br" => run.children.push(RunChild::Break {
                    break_type: attr_value(&e, b"type")?,
                }),
                _ => run.children.push(RunChild::Raw(raw_tag(&e, true))),
            },
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(run),
            Ok(Event::Eof) => {
                return Err(Error::InvalidDocx("unterminated w:r element".to_string()));
            }
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
}

fn parse_run_props(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Vec<RunProp>> {
    let end = start.name().as_ref().to_vec();
    let mut props = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"rFonts" => props.push(RunProp::Fonts(parse_run_fonts(&e)?)),
                b"sz" => props.push(parse_half_points(&e, RunProp::Size)?),
                b"szCs" => props.push(parse_half_points(&e, RunProp::SizeCs)?),
                _ => props.push(RunProp::Raw(raw_tag(&e, true))),
            },
            Ok(Event::Start(e)) => {
                // Typed properties are empty elements; anything with content
                // passes through verbatim.
                props.push(RunProp::Raw(capture_element(reader, &e)?));
            }
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(props),
            Ok(Event::Eof) => {
                return Err(Error::InvalidDocx("unterminated w:rPr element".to_string()));
            }
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
}

fn parse_run_fonts(e: &BytesStart) -> Result<RunFonts> {
    let mut fonts = RunFonts::default();
    for attr in e.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        match local_name(attr.key.as_ref()) {
            b"ascii" => fonts.ascii = Some(value),
            b"hAnsi" => fonts.h_ansi = Some(value),
            b"cs" => fonts.cs = Some(value),
            b"eastAsia" => fonts.east_asia = Some(value),
            b"hint" => fonts.hint = Some(value),
            _ => {}
        }
    }
    Ok(fonts)
}

/// Parse a `w:val` half-point size; a malformed value falls back to verbatim
/// markup (non-matching, not a failure).
fn parse_half_points(e: &BytesStart, wrap: fn(u32) -> RunProp) -> Result<RunProp> {
    match attr_value(e, b"val")? {
        Some(val) => match val.parse::<u32>() {
            Ok(v) => Ok(wrap(v)),
            Err(_) => Ok(RunProp::Raw(raw_tag(e, true))),
        },
        None => Ok(RunProp::Raw(raw_tag(e, true))),
    }
}

fn parse_table(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Table> {
    let end = start.name().as_ref().to_vec();
    let mut table = Table::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"tr" => table.children.push(TableChild::Row(parse_row(reader, &e)?)),
                _ => table
                    .children
                    .push(TableChild::Raw(capture_element(reader, &e)?)),
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"tr" => table.children.push(TableChild::Row(TableRow::default())),
                _ => table.children.push(TableChild::Raw(raw_tag(&e, true))),
            },
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(table),
            Ok(Event::Eof) => {
                return Err(Error::InvalidDocx("unterminated w:tbl element".to_string()));
            }
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
}

fn parse_row(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<TableRow> {
    let end = start.name().as_ref().to_vec();
    let mut row = TableRow::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"tc" => {
                    let cell_end = e.name().as_ref().to_vec();
                    row.children.push(RowChild::Cell(TableCell {
                        blocks: parse_blocks(reader, &cell_end)?,
                    }));
                }
                _ => row
                    .children
                    .push(RowChild::Raw(capture_element(reader, &e)?)),
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"tc" => row.children.push(RowChild::Cell(TableCell::default())),
                _ => row.children.push(RowChild::Raw(raw_tag(&e, true))),
            },
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(row),
            Ok(Event::Eof) => {
                return Err(Error::InvalidDocx("unterminated w:tr element".to_string()));
            }
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
}

/// Capture a whole element (start tag, inner markup, end tag) verbatim.
fn capture_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut raw = raw_tag(start, false);
    raw.push_str(&reader.read_text(start.name())?);
    raw.push_str("</");
    raw.push_str(&name);
    raw.push('>');
    Ok(raw)
}

/// Reconstruct a tag from its event, preserving attribute order and raw
/// (still-escaped) attribute values.
fn raw_tag(e: &BytesStart, self_closing: bool) -> String {
    let mut tag = String::from("<");
    tag.push_str(&String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes().flatten() {
        tag.push(' ');
        tag.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        tag.push_str("=\"");
        tag.push_str(&String::from_utf8_lossy(&attr.value));
        tag.push('"');
    }
    tag.push_str(if self_closing { "/>" } else { ">" });
    tag
}

/// The attribute portion of a start tag, with a leading space.
fn raw_attrs(e: &BytesStart) -> String {
    let mut attrs = String::new();
    for attr in e.attributes().flatten() {
        attrs.push(' ');
        attrs.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        attrs.push_str("=\"");
        attrs.push_str(&String::from_utf8_lossy(&attr.value));
        attrs.push('"');
    }
    attrs
}

/// Accumulate the text content of an element, resolving entity references.
fn read_element_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => text.push_str(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::GeneralRef(e)) => {
                text.push_str(&resolve_entity(&String::from_utf8_lossy(e.as_ref())));
            }
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(text),
            Ok(Event::Eof) => {
                return Err(Error::InvalidDocx("unterminated text element".to_string()));
            }
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
}

/// Resolve the predefined XML entities plus numeric character references.
fn resolve_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "amp" => "&".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        _ => {
            let parsed = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()));
            parsed
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        }
    }
}

fn has_preserve_space(e: &BytesStart) -> bool {
    e.attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"xml:space" && a.value.as_ref() == b"preserve")
}

fn attr_value(e: &BytesStart, local: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == local {
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Strip UTF-8 BOM (byte order mark) if present
fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Body {
        parse_document_xml(xml).expect("parse failed").1
    }

    const DOC_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
    const DOC_CLOSE: &str = "</w:body></w:document>";

    fn doc(body: &str) -> String {
        format!("{DOC_OPEN}{body}{DOC_CLOSE}")
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"w:p"), b"p");
        assert_eq!(local_name(b"p"), b"p");
        assert_eq!(local_name(b"xml:space"), b"space");
    }

    #[test]
    fn parses_simple_paragraph() {
        let body = parse(&doc("<w:p><w:r><w:t>Hello</w:t></w:r></w:p>"));
        assert_eq!(body.blocks.len(), 1);
        assert_eq!(body.text(), "Hello");
    }

    #[test]
    fn parses_document_attrs() {
        let (attrs, _) = parse_document_xml(&doc("")).unwrap();
        assert!(attrs.contains("xmlns:w="));
    }

    #[test]
    fn resolves_entities_in_text() {
        let body = parse(&doc(
            "<w:p><w:r><w:t>Fish &amp; Chips &#233;</w:t></w:r></w:p>",
        ));
        assert_eq!(body.text(), "Fish & Chips é");
    }

    #[test]
    fn parses_run_font_properties() {
        let body = parse(&doc(concat!(
            "<w:p><w:r><w:rPr>",
            r#"<w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman"/>"#,
            r#"<w:b/><w:sz w:val="20"/><w:szCs w:val="20"/>"#,
            "</w:rPr><w:t>x</w:t></w:r></w:p>",
        )));
        let para = body.paragraphs().next().unwrap();
        let run = para.runs().next().unwrap();
        assert_eq!(run.font_family(), Some("Times New Roman"));
        assert_eq!(run.font_size(), Some(20));
        assert_eq!(run.props.len(), 4);
        assert!(matches!(&run.props[1], RunProp::Raw(raw) if raw == "<w:b/>"));
        assert!(matches!(run.props[3], RunProp::SizeCs(20)));
    }

    #[test]
    fn malformed_size_becomes_raw() {
        let body = parse(&doc(
            r#"<w:p><w:r><w:rPr><w:sz w:val="abc"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        ));
        let run = body.paragraphs().next().unwrap().runs().next().unwrap();
        assert_eq!(run.font_size(), None);
        assert!(matches!(&run.props[0], RunProp::Raw(_)));
    }

    #[test]
    fn preserves_unknown_body_elements() {
        let body = parse(&doc(concat!(
            "<w:p><w:r><w:t>a</w:t></w:r></w:p>",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#,
        )));
        assert_eq!(body.blocks.len(), 2);
        assert!(matches!(
            &body.blocks[1],
            Block::Raw(raw) if raw.contains("<w:pgSz") && raw.starts_with("<w:sectPr>")
        ));
    }

    #[test]
    fn hyperlinks_pass_through_verbatim() {
        let body = parse(&doc(concat!(
            "<w:p>",
            r#"<w:hyperlink r:id="rId4"><w:r><w:t>link</w:t></w:r></w:hyperlink>"#,
            "<w:r><w:t>tail</w:t></w:r></w:p>",
        )));
        let para = body.paragraphs().next().unwrap();
        // Only the direct run is enumerated; the hyperlink is raw.
        assert_eq!(para.runs().count(), 1);
        assert_eq!(para.text(), "tail");
        assert!(matches!(
            &para.children[0],
            ParaChild::Raw(raw) if raw.starts_with("<w:hyperlink r:id=\"rId4\">")
        ));
    }

    #[test]
    fn parses_table_with_cells() {
        let body = parse(&doc(concat!(
            "<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr>",
            "<w:tr><w:tc><w:tcPr><w:tcW w:w=\"4814\" w:type=\"dxa\"/></w:tcPr>",
            "<w:p><w:r><w:t>cell text</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        )));
        let table = body.tables().next().unwrap();
        let row = table.rows().next().unwrap();
        let cell = row.cells().next().unwrap();
        assert_eq!(cell.blocks.len(), 2); // raw tcPr + paragraph
        let para = cell.paragraphs().next().unwrap();
        assert_eq!(para.text(), "cell text");
    }

    #[test]
    fn parses_page_break_run() {
        let body = parse(&doc(
            r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#,
        ));
        assert!(body.paragraphs().next().unwrap().is_page_break());
    }

    #[test]
    fn preserve_space_attribute_detected() {
        let body = parse(&doc(concat!(
            r#"<w:p><w:r><w:t xml:space="preserve"> lead </w:t></w:r>"#,
            "<w:r><w:t>tight</w:t></w:r></w:p>",
        )));
        let para = body.paragraphs().next().unwrap();
        let runs: Vec<_> = para.runs().collect();
        assert_eq!(
            runs[0].children[0],
            RunChild::Text {
                text: " lead ".to_string(),
                preserve_space: true
            }
        );
        assert_eq!(
            runs[1].children[0],
            RunChild::Text {
                text: "tight".to_string(),
                preserve_space: false
            }
        );
    }

    #[test]
    fn missing_body_is_invalid() {
        let err = parse_document_xml(
            r#"<w:document xmlns:w="http://example.invalid"></w:document>"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDocx(_)));
    }
}
