//! Event walker over tool XML exports.
//!
//! Wraps `quick-xml` so the adapters see lowercased local names, unescaped
//! attribute values and the trimmed text of every element when it closes.
//! Malformed input stops the walk with an [`XmlError`]; whatever the
//! visitor collected up to that point is kept by the caller.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::types::status::normalize_token;

/// An opened element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlElement {
    /// Lowercased local name (namespace prefix removed).
    pub name: String,
    attrs: Vec<(String, String)>,
}

impl XmlElement {
    /// First non-blank attribute whose normalized key matches one of `keys`.
    ///
    /// Keys are compared after [`normalize_token`], so `VulnID`, `vuln_id`
    /// and `vuln-id` all match `"vulnid"`.
    pub fn attr(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| {
            self.attrs
                .iter()
                .find(|(k, v)| k == key && !v.trim().is_empty())
                .map(|(_, v)| v.trim())
        })
    }
}

/// Events delivered to the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum XmlEvent {
    Open(XmlElement),
    /// Element closed; `text` is its own trimmed character data.
    Close { name: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlError {
    pub position: u64,
    pub message: String,
}

impl std::fmt::Display for XmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "at byte {}: {}", self.position, self.message)
    }
}

/// Walk every element of `content`, calling `visit` on open and close.
pub(crate) fn walk(content: &str, mut visit: impl FnMut(XmlEvent)) -> Result<(), XmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut text_stack: Vec<(String, String)> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = element_from(&e);
                text_stack.push((element.name.clone(), String::new()));
                visit(XmlEvent::Open(element));
            }
            Ok(Event::Empty(e)) => {
                let element = element_from(&e);
                let name = element.name.clone();
                visit(XmlEvent::Open(element));
                visit(XmlEvent::Close {
                    name,
                    text: String::new(),
                });
            }
            Ok(Event::End(_)) => {
                if let Some((name, text)) = text_stack.pop() {
                    visit(XmlEvent::Close {
                        name,
                        text: text.trim().to_string(),
                    });
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                append_text(&mut text_stack, &text);
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                append_text(&mut text_stack, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(XmlError {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                });
            }
        }
    }

    if let Some((name, _)) = text_stack.last() {
        return Err(XmlError {
            position: content.len() as u64,
            message: format!("unexpected end of document inside <{name}>"),
        });
    }
    Ok(())
}

/// Lowercased local name of the first element, if the document has one.
pub(crate) fn root_element(content: &str) -> Option<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return Some(local_name(&e)),
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn append_text(stack: &mut [(String, String)], text: &str) {
    if let Some((_, buffer)) = stack.last_mut() {
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(text);
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn element_from(e: &BytesStart<'_>) -> XmlElement {
    let attrs = e
        .attributes()
        .with_checks(false)
        .filter_map(|a| a.ok())
        .map(|a| {
            let key = normalize_token(&String::from_utf8_lossy(a.key.local_name().as_ref()));
            let value = a
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned());
            (key, value)
        })
        .collect();
    XmlElement {
        name: local_name(e),
        attrs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(content: &str) -> (Vec<XmlEvent>, Result<(), XmlError>) {
        let mut events = Vec::new();
        let outcome = walk(content, |e| events.push(e));
        (events, outcome)
    }

    #[test]
    fn test_walk_reports_text_on_close() {
        let (events, outcome) = collect("<A><B x=\"1\">hello &amp; bye</B></A>");
        assert!(outcome.is_ok());
        assert_eq!(
            events[2],
            XmlEvent::Close {
                name: "b".to_string(),
                text: "hello & bye".to_string()
            }
        );
    }

    #[test]
    fn test_walk_strips_namespace_prefix() {
        let (events, _) = collect(r#"<cdf:rule-result xmlns:cdf="urn:x" cdf:idref="r1"/>"#);
        match &events[0] {
            XmlEvent::Open(el) => {
                assert_eq!(el.name, "rule-result");
                assert_eq!(el.attr(&["idref"]), Some("r1"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_attr_lookup_is_normalized() {
        let (events, _) = collect(r#"<Finding VulnID="V-1" Rule_ID="SV-1" Status=" "/>"#);
        let XmlEvent::Open(el) = &events[0] else {
            panic!("expected open");
        };
        assert_eq!(el.attr(&["vulnid"]), Some("V-1"));
        assert_eq!(el.attr(&["ruleid"]), Some("SV-1"));
        assert_eq!(el.attr(&["status"]), None);
    }

    #[test]
    fn test_walk_cdata() {
        let (events, _) = collect("<C><![CDATA[a < b]]></C>");
        assert_eq!(
            events[1],
            XmlEvent::Close {
                name: "c".to_string(),
                text: "a < b".to_string()
            }
        );
    }

    #[test]
    fn test_walk_mismatched_tag_is_error_after_partial_events() {
        let (events, outcome) = collect("<A><B>ok</B><C></A>");
        assert!(outcome.is_err());
        assert!(events.contains(&XmlEvent::Close {
            name: "b".to_string(),
            text: "ok".to_string()
        }));
    }

    #[test]
    fn test_walk_truncated_document_is_error() {
        let (_, outcome) = collect("<A><B>ok</B>");
        let err = outcome.unwrap_err();
        assert!(err.message.contains("<a>"));
    }

    #[test]
    fn test_root_element() {
        assert_eq!(
            root_element("<?xml version=\"1.0\"?>\n<!-- c --><CHECKLIST><ASSET/></CHECKLIST>"),
            Some("checklist".to_string())
        );
        assert_eq!(root_element("not xml at all"), None);
    }
}
