//! XML syntax for the document tree (quick-xml)

use quick_xml::events::attributes::Attributes;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::Element;
use crate::errors::{invalid_document, xml_error, Result};
use emfx_core::errors::ModelError;

/// Decode document bytes and read the element tree
///
/// # Errors
///
/// `InvalidEncoding` if the bytes are not UTF-8; see [`read_xml`] for the rest.
pub fn read_xml_bytes(bytes: &[u8]) -> Result<Element> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| ModelError::InvalidEncoding {
        message: format!("document is not valid UTF-8: {}", e),
    })?;
    read_xml(text)
}

/// Read the element tree of an XML document
///
/// Comments, processing instructions and whitespace-only text are dropped.
///
/// # Errors
///
/// - `InvalidEncoding` if the declaration names an encoding other than UTF-8
/// - `InvalidDocument` if there is no top-level element, or more than one
/// - `Xml` for malformed markup
pub fn read_xml(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Decl(decl) => {
                if let Some(Ok(encoding)) = decl.encoding() {
                    let encoding = String::from_utf8_lossy(&encoding).to_ascii_lowercase();
                    if encoding != "utf-8" && encoding != "utf8" {
                        return Err(ModelError::InvalidEncoding {
                            message: format!("unsupported declared encoding {}", encoding),
                        });
                    }
                }
            }
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(invalid_document("more than one top-level element"));
                }
                stack.push(open_element(&start)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| invalid_document("unbalanced end tag"))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_error)?;
                append_text(&mut stack, text.trim());
            }
            Event::CData(data) => {
                let data = String::from_utf8_lossy(data.as_ref()).to_string();
                append_text(&mut stack, &data);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(invalid_document("document ends inside an element"));
    }
    root.ok_or_else(|| invalid_document("no top-level element"))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_string();
    Ok(Element {
        tag,
        attributes: read_attributes(start.attributes())?,
        children: Vec::new(),
        text: None,
    })
}

fn read_attributes(attributes: Attributes<'_>) -> Result<Vec<(String, String)>> {
    attributes
        .map(|attr| {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(xml_error)?.to_string();
            Ok((key, value))
        })
        .collect()
}

fn close_element(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(invalid_document("more than one top-level element")),
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        match current.text.as_mut() {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => current.text = Some(text.to_string()),
        }
    }
}

/// Write an element tree as an indented UTF-8 XML document
///
/// # Errors
///
/// `Xml` if the writer fails.
pub fn write_xml(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    if let Some(text) = &element.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
        .map_err(xml_error)
}
