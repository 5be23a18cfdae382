//! OAI-PMH `ListRecords` response parsing.
//!
//! Extracts, per record, the header identifier, the deleted flag, and every
//! metadata element two levels below `<metadata>` (the children of the
//! `oai_dc:dc` wrapper) keyed by local name. Namespace prefixes are ignored.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::HarvestError;

/// One `<record>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OaiRecord {
    /// Header `<identifier>` (the OAI item id, not the DOI).
    pub identifier: String,
    /// Whether the header carries `status="deleted"`.
    pub deleted: bool,
    /// Metadata element values by local name, in document order.
    pub fields: BTreeMap<String, Vec<String>>,
}

/// An OAI-PMH `<error>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiError {
    /// Protocol error code (e.g. `"noRecordsMatch"`, `"badResumptionToken"`).
    pub code: String,
    pub message: String,
}

/// Parsed `ListRecords` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRecordsPage {
    pub records: Vec<OaiRecord>,
    /// Token for the next request; `None` when the list is complete.
    pub resumption_token: Option<String>,
    /// `completeListSize` attribute of the resumption token, if sent.
    pub complete_list_size: Option<u64>,
    pub error: Option<OaiError>,
}

/// What the text currently being read belongs to.
enum Capture {
    HeaderIdentifier,
    Field(String),
    ResumptionToken,
    Error { code: String },
}

/// Parses one `ListRecords` response body.
///
/// # Errors
///
/// Returns [`HarvestError::Xml`] if the body is not well-formed XML.
#[allow(clippy::too_many_lines)]
pub fn parse_list_records(xml: &str) -> Result<ListRecordsPage, HarvestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = ListRecordsPage::default();
    let mut current: Option<OaiRecord> = None;
    let mut in_header = false;
    let mut metadata_depth: Option<usize> = None;
    let mut capture: Option<(Capture, usize)> = None;
    let mut text = String::new();
    let mut depth: usize = 0;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = local_name(&e);
                if capture.is_none() {
                    capture = match name.as_str() {
                        "record" => {
                            current = Some(OaiRecord::default());
                            None
                        }
                        "header" if current.is_some() => {
                            in_header = true;
                            if let Some(record) = current.as_mut() {
                                record.deleted =
                                    attribute(&e, "status")?.is_some_and(|s| s == "deleted");
                            }
                            None
                        }
                        "metadata" if current.is_some() => {
                            metadata_depth = Some(depth);
                            None
                        }
                        "identifier" if in_header => Some((Capture::HeaderIdentifier, depth)),
                        "resumptionToken" => {
                            page.complete_list_size = attribute(&e, "completeListSize")?
                                .and_then(|s| s.parse().ok());
                            Some((Capture::ResumptionToken, depth))
                        }
                        "error" => Some((
                            Capture::Error {
                                code: attribute(&e, "code")?.unwrap_or_default(),
                            },
                            depth,
                        )),
                        _ if metadata_depth.is_some_and(|d| depth == d + 2) => {
                            Some((Capture::Field(name), depth))
                        }
                        _ => None,
                    };
                    text.clear();
                }
                depth += 1;
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                match name.as_str() {
                    "resumptionToken" => {
                        page.complete_list_size = attribute(&e, "completeListSize")?
                            .and_then(|s| s.parse().ok());
                    }
                    "error" => {
                        page.error = Some(OaiError {
                            code: attribute(&e, "code")?.unwrap_or_default(),
                            message: String::new(),
                        });
                    }
                    "header" if current.is_some() => {
                        if let Some(record) = current.as_mut() {
                            record.deleted =
                                attribute(&e, "status")?.is_some_and(|s| s == "deleted");
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(e) if capture.is_some() => {
                text.push_str(&e.unescape().map_err(xml_error)?);
            }
            Event::CData(e) if capture.is_some() => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);

                if capture.as_ref().is_some_and(|(_, start)| *start == depth) {
                    let value = text.trim().to_owned();
                    text.clear();
                    match capture.take().map(|(kind, _)| kind) {
                        Some(Capture::HeaderIdentifier) => {
                            if let Some(record) = current.as_mut() {
                                record.identifier = value;
                            }
                        }
                        Some(Capture::Field(name)) => {
                            if let Some(record) = current.as_mut()
                                && !value.is_empty()
                            {
                                record.fields.entry(name).or_default().push(value);
                            }
                        }
                        Some(Capture::ResumptionToken) => {
                            page.resumption_token = Some(value).filter(|t| !t.is_empty());
                        }
                        Some(Capture::Error { code }) => {
                            page.error = Some(OaiError {
                                code,
                                message: value,
                            });
                        }
                        None => {}
                    }
                    continue;
                }

                if capture.is_none() {
                    match String::from_utf8_lossy(e.local_name().as_ref()).as_ref() {
                        "header" => in_header = false,
                        "metadata" => metadata_depth = None,
                        "record" => {
                            if let Some(record) = current.take() {
                                page.records.push(record);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(page)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, HarvestError> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned()));
        }
    }
    Ok(None)
}

fn xml_error(e: impl std::fmt::Display) -> HarvestError {
    HarvestError::Xml {
        message: e.to_string(),
    }
}
