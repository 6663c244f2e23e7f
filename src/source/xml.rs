use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use xmlparser::{ElementEnd, Token, Tokenizer};

use crate::error::{CcmlError, Result};

/// Classification names the source schema allows. An unclassified method
/// carries no classification text at all.
pub const VALID_CLASSES: &[&str] = &[
    "Place",
    "Bob",
    "Slow Course",
    "Treble Bob",
    "Delight",
    "Surprise",
    "Alliance",
    "Treble Place",
    "Hybrid",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub name: Option<String>,
    pub little: bool,
    pub differential: bool,
    pub plain: bool,
    pub treble_dodging: bool,
}

/// One source entry, with methodSet-level properties already resolved.
#[derive(Debug, Clone)]
pub struct RawMethod {
    pub title: String,
    pub notation: String,
    pub stage: u8,
    pub lead_head: String,
    pub number_of_hunts: Option<u8>,
    pub classification: Option<Classification>,
}

#[derive(Debug, Clone, Default)]
struct Properties {
    stage: Option<u8>,
    lead_head: Option<String>,
    number_of_hunts: Option<u8>,
    classification: Option<Classification>,
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn parse_xml_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(CcmlError::InvalidFormat(format!(
            "invalid XML boolean {:?}",
            value
        ))),
    }
}

fn parse_int(name: &str, text: &str) -> Result<u8> {
    text.trim().parse().map_err(|_| {
        CcmlError::InvalidFormat(format!("invalid {} value {:?}", name, text.trim()))
    })
}

fn validate_classification(class: &Classification) -> Result<()> {
    if let Some(name) = &class.name {
        if !VALID_CLASSES.contains(&name.as_str()) {
            return Err(CcmlError::InvalidFormat(format!(
                "unknown classification {:?}",
                name
            )));
        }
    }
    Ok(())
}

/// Streaming reader for the source method XML. Method-level elements
/// override the enclosing methodSet's shared properties.
pub fn read_methods(xml: &str) -> Result<Vec<RawMethod>> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

    let mut methods = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    let mut set_props = Properties::default();
    let mut method_props = Properties::default();
    let mut title: Option<String> = None;
    let mut notation: Option<String> = None;
    let mut pending_class: Option<Classification> = None;

    for token in Tokenizer::from(xml) {
        let token = token.map_err(|e| CcmlError::InvalidFormat(format!("bad XML: {}", e)))?;
        match token {
            Token::ElementStart { local, .. } => {
                stack.push(local.to_string());
                text.clear();
                match local.as_str() {
                    "method" => {
                        method_props = Properties::default();
                        title = None;
                        notation = None;
                    }
                    "methodSet" => set_props = Properties::default(),
                    "classification" => pending_class = Some(Classification::default()),
                    _ => {}
                }
            }
            Token::Attribute { local, value, .. } => {
                if let Some(class) = pending_class.as_mut() {
                    if stack.last().map(String::as_str) == Some("classification") {
                        let flag = parse_xml_bool(&unescape_xml(value.as_str()))?;
                        match local.as_str() {
                            "little" => class.little = flag,
                            "differential" => class.differential = flag,
                            "plain" => class.plain = flag,
                            "trebleDodging" => class.treble_dodging = flag,
                            _ => {}
                        }
                    }
                }
            }
            Token::Text { text: t } => text.push_str(t.as_str()),
            Token::Cdata { text: t, .. } => text.push_str(t.as_str()),
            Token::ElementEnd { end, .. } => {
                let closed = match end {
                    ElementEnd::Open => continue,
                    ElementEnd::Close(..) | ElementEnd::Empty => stack.pop(),
                };
                let Some(closed) = closed else {
                    return Err(CcmlError::InvalidFormat("unbalanced XML".to_string()));
                };

                let in_method = stack.iter().any(|e| e == "method");
                let content = unescape_xml(text.trim());
                let props = if in_method {
                    &mut method_props
                } else {
                    &mut set_props
                };

                match closed.as_str() {
                    "title" if in_method => title = Some(content),
                    "notation" if in_method => notation = Some(content),
                    "stage" => props.stage = Some(parse_int("stage", &content)?),
                    "leadHead" => props.lead_head = Some(content),
                    "numberOfHunts" => {
                        props.number_of_hunts = Some(parse_int("numberOfHunts", &content)?)
                    }
                    "classification" => {
                        let mut class = pending_class.take().unwrap_or_default();
                        if !content.is_empty() {
                            class.name = Some(content);
                        }
                        validate_classification(&class)?;
                        props.classification = Some(class);
                    }
                    "method" => {
                        let title = title.take().ok_or_else(|| {
                            CcmlError::InvalidFormat("method without title".to_string())
                        })?;
                        let missing = |field: &str| {
                            CcmlError::InvalidFormat(format!(
                                "method {:?} is missing {}",
                                title, field
                            ))
                        };
                        methods.push(RawMethod {
                            notation: notation.take().ok_or_else(|| missing("notation"))?,
                            stage: method_props
                                .stage
                                .or(set_props.stage)
                                .ok_or_else(|| missing("stage"))?,
                            lead_head: method_props
                                .lead_head
                                .take()
                                .or_else(|| set_props.lead_head.clone())
                                .ok_or_else(|| missing("leadHead"))?,
                            number_of_hunts: method_props
                                .number_of_hunts
                                .or(set_props.number_of_hunts),
                            classification: method_props
                                .classification
                                .take()
                                .or_else(|| set_props.classification.clone()),
                            title,
                        });
                    }
                    _ => {}
                }
                text.clear();
            }
            _ => {}
        }
    }

    Ok(methods)
}

/// Memory-map and read a source XML file.
pub fn read_methods_from_path(path: &Path) -> Result<Vec<RawMethod>> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let xml = std::str::from_utf8(&mmap)
        .map_err(|e| CcmlError::InvalidFormat(format!("source is not UTF-8: {}", e)))?;
    read_methods(xml)
}
