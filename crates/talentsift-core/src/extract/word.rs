//! Word (.docx) text extraction.
//!
//! A .docx file is a ZIP archive whose main content lives in
//! `word/document.xml`. Paragraph text is collected from `w:t` runs;
//! tables come out as rows of cell text joined by `" | "`.

use crate::error::ExtractError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;

/// Extract plain text from .docx bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor).map_err(|e| ExtractError::Word {
        message: format!("not a valid archive: {e}"),
    })?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Word {
            message: format!("missing word/document.xml: {e}"),
        })?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Word {
            message: format!("unreadable word/document.xml: {e}"),
        })?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut parts: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut row_cells: Vec<String> = Vec::new();
    let mut table_rows: Vec<String> = Vec::new();

    let mut in_text = false;
    let mut table_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:tbl" => table_depth += 1,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if table_depth > 0 {
                        // Separate paragraphs within a cell.
                        cell.push('\n');
                    } else {
                        let trimmed = paragraph.trim();
                        if !trimmed.is_empty() {
                            parts.push(trimmed.to_string());
                        }
                        paragraph.clear();
                    }
                }
                b"w:tc" => {
                    row_cells.push(cell.trim().to_string());
                    cell.clear();
                }
                b"w:tr" => {
                    if !row_cells.is_empty() {
                        table_rows.push(row_cells.join(" | "));
                        row_cells.clear();
                    }
                }
                b"w:tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 && !table_rows.is_empty() {
                        parts.push(table_rows.join("\n"));
                        table_rows.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.decode().map_err(|e| ExtractError::Word {
                    message: format!("bad XML text: {e}"),
                })?;
                if table_depth > 0 {
                    cell.push_str(&text);
                } else {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::GeneralRef(r)) if in_text => {
                let resolved = r.resolve_char_ref().map_err(|e| ExtractError::Word {
                    message: format!("bad XML entity: {e}"),
                })?;
                let resolved = match resolved {
                    Some(c) => c.to_string(),
                    None => {
                        let name = r.decode().map_err(|e| ExtractError::Word {
                            message: format!("bad XML entity: {e}"),
                        })?;
                        quick_xml::escape::resolve_xml_entity(&name)
                            .ok_or_else(|| ExtractError::Word {
                                message: format!("unknown XML entity: {name}"),
                            })?
                            .to_string()
                    }
                };
                if table_depth > 0 {
                    cell.push_str(&resolved);
                } else {
                    paragraph.push_str(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractError::Word {
                    message: format!("malformed XML: {e}"),
                })
            }
        }
    }

    if parts.is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(parts.join("\n\n"))
}
