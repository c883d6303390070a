//! Attendee Registry
//!
//! Attendees arrive from a parser as flat string maps. The registry holds
//! the current list and is replaced wholesale on every new upload.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::ParseError;

/// Field that selects the template category.
pub const PARTICIPATION_TYPE: &str = "participationType";

/// One attendee record. Immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attendee {
    fields: HashMap<String, String>,
}

impl Attendee {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// Field value, or the empty string when absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Lowercased participation type, or `default` when absent or empty.
    pub fn category(&self, default: &str) -> String {
        match self.get(PARTICIPATION_TYPE) {
            Some(kind) if !kind.is_empty() => kind.to_lowercase(),
            _ => default.to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.field("firstname"), self.field("lastname"))
            .trim()
            .to_string()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attendee {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// The parsing collaborator: raw upload in, ordered attendees out.
pub trait AttendeeParser {
    fn name(&self) -> &'static str;
    fn parse(&self, raw: &[u8]) -> Result<Vec<Attendee>, ParseError>;
}

/// JSON uploads: either a top-level array of objects or `{"attendees": [...]}`.
pub struct JsonAttendeeParser;

impl AttendeeParser for JsonAttendeeParser {
    fn name(&self) -> &'static str { "json" }

    fn parse(&self, raw: &[u8]) -> Result<Vec<Attendee>, ParseError> {
        let doc: Value = serde_json::from_slice(raw)
            .map_err(|e| ParseError::Unreadable(e.to_string()))?;

        let records = match doc {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("attendees") {
                Some(Value::Array(items)) => items,
                _ => return Err(ParseError::Unreadable("expected an array of attendees".to_string())),
            },
            _ => return Err(ParseError::Unreadable("expected an array of attendees".to_string())),
        };

        let attendees = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record_to_attendee(index, record))
            .collect::<Result<Vec<_>, _>>()?;

        if attendees.is_empty() {
            return Err(ParseError::NoAttendees);
        }
        Ok(attendees)
    }
}

fn record_to_attendee(index: usize, record: Value) -> Result<Attendee, ParseError> {
    let Value::Object(map) = record else {
        return Err(ParseError::MalformedRecord {
            index,
            reason: "not an object".to_string(),
        });
    };

    let mut fields = HashMap::with_capacity(map.len());
    for (key, value) in map {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ParseError::MalformedRecord {
                    index,
                    reason: format!("field '{}' is not a scalar", key),
                });
            }
        };
        fields.insert(key, text);
    }
    Ok(Attendee::new(fields))
}

/// Pick a parser from the file extension.
pub fn parser_for_path(path: &Path) -> Result<Box<dyn AttendeeParser + Send + Sync>, ParseError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Box::new(JsonAttendeeParser)),
        other => Err(ParseError::UnsupportedFormat(other.to_string())),
    }
}

/// In-memory ordered attendee list; the single source of who gets a badge.
#[derive(Debug, Default)]
pub struct AttendeeRegistry {
    attendees: Vec<Attendee>,
}

impl AttendeeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an upload and replace the current list.
    ///
    /// On failure the current list is left as it was.
    pub fn load(&mut self, parser: &dyn AttendeeParser, raw: &[u8]) -> Result<usize, ParseError> {
        let attendees = parser.parse(raw)?;
        self.replace(attendees)
    }

    pub fn replace(&mut self, attendees: Vec<Attendee>) -> Result<usize, ParseError> {
        if attendees.is_empty() {
            return Err(ParseError::NoAttendees);
        }
        self.attendees = attendees;
        Ok(self.attendees.len())
    }

    pub fn get(&self, index: usize) -> Option<&Attendee> {
        self.attendees.get(index)
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    pub fn len(&self) -> usize {
        self.attendees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attendees.is_empty()
    }

    /// "3 badges loaded", "1 badge loaded"; empty when nothing is loaded.
    pub fn count_label(&self) -> String {
        match self.attendees.len() {
            0 => String::new(),
            1 => "1 badge loaded".to_string(),
            n => format!("{} badges loaded", n),
        }
    }
}
