//! Namecheap `ApiResponse` documents
//!
//! Responses are flattened into a list of elements in document order. The
//! commands regflow uses only ever need "find the element named X" and
//! "read attribute Y", so no tree is built.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regflow_core::{Error, Result};

/// One XML element with its attributes and direct text content
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub text: String,
}

impl Element {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
        let attributes = e
            .attributes()
            .flatten()
            .map(|attr| {
                (
                    String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string(),
                    String::from_utf8_lossy(&attr.value).to_string(),
                )
            })
            .collect();

        Self {
            name,
            attributes,
            text: String::new(),
        }
    }

    /// Attribute value by exact name
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether attribute `key` is the string "true" (any case)
    pub fn flag(&self, key: &str) -> bool {
        self.attr(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Attribute parsed as a decimal amount
    pub fn amount(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(|v| v.trim().parse().ok())
    }
}

/// A parsed, successful Namecheap API response
#[derive(Debug, Clone)]
pub(crate) struct ApiResponse {
    elements: Vec<Element>,
}

impl ApiResponse {
    /// Parse `xml` and reject `Status="ERROR"` responses
    pub fn parse(xml: &str, command: &str) -> Result<Self> {
        let elements = flatten(xml).map_err(|e| {
            Error::provider(
                "namecheap",
                format!("Malformed XML in {} response: {}", command, e),
            )
        })?;
        let response = Self { elements };

        let root = response.find("ApiResponse").ok_or_else(|| {
            Error::provider(
                "namecheap",
                format!("{} response has no ApiResponse element", command),
            )
        })?;

        if root
            .attr("Status")
            .is_some_and(|s| s.eq_ignore_ascii_case("ERROR"))
        {
            return Err(response.api_error(command));
        }

        Ok(response)
    }

    /// First element named `name`
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Every element named `name`
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.name == name)
    }

    /// Every element whose name is one of `names`, in document order
    pub fn find_all_of<'a>(&'a self, names: &'a [&'a str]) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |e| names.contains(&e.name.as_str()))
    }

    /// First element named `name`, or a provider error naming the command
    pub fn require(&self, name: &str, command: &str) -> Result<&Element> {
        self.find(name).ok_or_else(|| {
            Error::provider(
                "namecheap",
                format!("{} response has no {} element", command, name),
            )
        })
    }

    fn api_error(&self, command: &str) -> Error {
        let messages: Vec<String> = self
            .find_all("Error")
            .map(|e| match e.attr("Number") {
                Some(number) => format!("{} (error {})", e.text.trim(), number),
                None => e.text.trim().to_string(),
            })
            .filter(|m| !m.is_empty())
            .collect();

        if messages.is_empty() {
            Error::registrar(format!("Namecheap API returned an error for {}", command))
        } else {
            Error::registrar(format!(
                "Namecheap API error for {}: {}",
                command,
                messages.join("; ")
            ))
        }
    }
}

fn flatten(xml: &str) -> std::result::Result<Vec<Element>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut elements = Vec::new();
    // Indices of currently open elements
    let mut open: Vec<usize> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                open.push(elements.len());
                elements.push(Element::from_start(e));
            }
            Event::Empty(ref e) => elements.push(Element::from_start(e)),
            Event::End(_) => {
                open.pop();
            }
            Event::Text(ref e) => {
                if let Some(&index) = open.last() {
                    elements[index]
                        .text
                        .push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::CData(ref e) => {
                if let Some(&index) = open.last() {
                    elements[index]
                        .text
                        .push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(elements)
}
