//! Response serialization.
//!
//! # Responsibilities
//! - Render an [`Envelope`] as a JSON object or an XML document
//! - Lay out XML `data` according to the envelope's [`Dimension`]
//!
//! # Preconditions
//! The payload shape must match the dimension. Mismatches are not detected;
//! they degrade to empty text (nested value where a scalar is expected) or
//! empty elements (scalar where children are expected). Positional keys take
//! the envelope's tag (or `element`) as their element name in dimensions
//! 1–3, and the dynamic fallback name in `Dynamic`.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::ocs::envelope::{Dimension, Envelope};
use crate::ocs::payload::{Key, Payload};

/// Element name for positional entries when the envelope has no tag.
const DEFAULT_ENTRY_TAG: &str = "element";

/// Requested response format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Xml,
    Json,
}

impl Format {
    /// `json` selects JSON; anything else, including empty, selects XML.
    pub fn from_param(value: &str) -> Self {
        if value == "json" {
            Format::Json
        } else {
            Format::Xml
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Xml => "application/xml; charset=utf-8",
            Format::Json => "application/json",
        }
    }
}

/// Writer failure. Rendering into memory only fails on encoder bugs.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("XML writer failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML writer failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Renders envelopes in either wire format.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSerializer {
    xml_indent: usize,
}

impl Default for ResponseSerializer {
    fn default() -> Self {
        Self { xml_indent: 1 }
    }
}

impl ResponseSerializer {
    /// `xml_indent` spaces per nesting level; zero writes compact XML.
    pub fn new(xml_indent: usize) -> Self {
        Self { xml_indent }
    }

    pub fn render(&self, format: Format, envelope: &Envelope) -> Result<String, SerializeError> {
        match format {
            Format::Json => render_json(envelope),
            Format::Xml => self.render_xml(envelope),
        }
    }

    fn render_xml(&self, envelope: &Envelope) -> Result<String, SerializeError> {
        let mut doc = XmlDocument::new(self.xml_indent);
        doc.declaration()?;
        doc.start("ocs")?;

        doc.start("meta")?;
        doc.leaf("status", envelope.status.as_str())?;
        doc.leaf("statuscode", &envelope.status_code.to_string())?;
        doc.leaf("message", &envelope.message)?;
        if let Some(count) = envelope.items_count {
            doc.leaf("totalitems", &count.to_string())?;
        }
        if let Some(per_page) = envelope.items_per_page.filter(|n| *n != 0) {
            doc.leaf("itemsperpage", &per_page.to_string())?;
        }
        doc.end("meta")?;

        let data = &envelope.data;
        let entry_tag = if envelope.tag.is_empty() {
            DEFAULT_ENTRY_TAG
        } else {
            envelope.tag.as_str()
        };

        match &envelope.dimension {
            Dimension::Absent => {}
            Dimension::Scalar => doc.leaf("data", &data.text())?,
            Dimension::Flat => {
                doc.start("data")?;
                for (key, value) in data.children() {
                    doc.leaf(key.name_or(entry_tag), &value.text())?;
                }
                doc.end("data")?;
            }
            Dimension::Entries | Dimension::Grouped => {
                let grouped = envelope.dimension == Dimension::Grouped;
                doc.start("data")?;
                for (entry_key, entry) in data.children() {
                    doc.start_with_details(entry_tag, &envelope.tag_attribute)?;
                    for (field, value) in entry.children() {
                        if !value.is_nested() {
                            doc.leaf(field.name_or(entry_tag), &value.text())?;
                            continue;
                        }
                        // The wrapper is named after the entry, not the field.
                        let wrapper = entry_key.name_or(entry_tag);
                        if grouped {
                            doc.start(wrapper)?;
                        }
                        for (k, v) in value.children() {
                            doc.leaf(k.name_or(entry_tag), &v.text())?;
                        }
                        if grouped {
                            doc.end(wrapper)?;
                        }
                    }
                    doc.end(entry_tag)?;
                }
                doc.end("data")?;
            }
            Dimension::Dynamic { fallback } => {
                doc.start("data")?;
                write_tree(&mut doc, data, fallback)?;
                doc.end("data")?;
            }
        }

        doc.end("ocs")?;
        doc.finish()
    }
}

fn write_tree(doc: &mut XmlDocument, node: &Payload, fallback: &str) -> Result<(), SerializeError> {
    for (key, value) in node.children() {
        let name = match key {
            Key::Named(name) if !is_numeric_key(name) => name,
            _ => fallback,
        };
        if value.is_nested() {
            doc.start(name)?;
            write_tree(doc, value, fallback)?;
            doc.end(name)?;
        } else {
            doc.leaf(name, &value.text())?;
        }
    }
    Ok(())
}

/// Numeric strings: optional sign, digits with an optional fraction and
/// exponent, surrounding whitespace allowed.
fn is_numeric_key(key: &str) -> bool {
    let s = key.trim();
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let int = parts.next().unwrap_or_default();
    let frac = parts.next().unwrap_or_default();
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = !(int.is_empty() && frac.is_empty()) && all_digits(int) && all_digits(frac);

    let exponent_ok = match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && all_digits(e)
        }
    };
    mantissa_ok && exponent_ok
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    status: &'static str,
    statuscode: u32,
    message: &'a str,
    #[serde(serialize_with = "count_or_blank")]
    totalitems: Option<u64>,
    #[serde(serialize_with = "count_or_blank")]
    itemsperpage: Option<u64>,
    data: &'a Payload,
}

/// Unset counts render as an empty string.
fn count_or_blank<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(n) => serializer.serialize_u64(*n),
        None => serializer.serialize_str(""),
    }
}

fn render_json(envelope: &Envelope) -> Result<String, SerializeError> {
    Ok(serde_json::to_string(&JsonEnvelope {
        status: envelope.status.as_str(),
        statuscode: envelope.status_code,
        message: &envelope.message,
        totalitems: envelope.items_count,
        itemsperpage: envelope.items_per_page,
        data: &envelope.data,
    })?)
}

struct XmlDocument {
    writer: Writer<Vec<u8>>,
}

impl XmlDocument {
    fn new(indent: usize) -> Self {
        let writer = if indent == 0 {
            Writer::new(Vec::new())
        } else {
            Writer::new_with_indent(Vec::new(), b' ', indent)
        };
        Self { writer }
    }

    fn declaration(&mut self) -> Result<(), SerializeError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        Ok(())
    }

    fn start(&mut self, name: &str) -> Result<(), SerializeError> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn start_with_details(&mut self, name: &str, details: &str) -> Result<(), SerializeError> {
        let mut element = BytesStart::new(name);
        if !details.is_empty() {
            element.push_attribute(("details", details));
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), SerializeError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn leaf(&mut self, name: &str, text: &str) -> Result<(), SerializeError> {
        self.start(name)?;
        // Quotes stay literal inside element text.
        let escaped = partial_escape(text);
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(escaped)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String, SerializeError> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        Ok(String::from_utf8(bytes)?)
    }
}
