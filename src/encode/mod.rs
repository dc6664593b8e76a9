//! Serializers for the two export formats.
//!
//! Both encoders are pure: they take a synthesized track plus
//! [`ActivityMetadata`] and either return the complete document or an
//! [`EncodeError`], never a partial buffer.

pub mod gpx;
pub mod tcx;

use std::fmt;

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::track::{Activity, TrackError};

pub use gpx::encode_gpx;
pub use tcx::encode_tcx;

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Identity written into document headers (`creator`, TCX `Author`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub creator: String,
    pub author_name: String,
    pub version_major: u16,
    pub version_minor: u16,
    pub build_major: u16,
    pub build_minor: u16,
    pub lang_id: String,
    pub part_number: String,
}

impl Default for ApplicationInfo {
    fn default() -> Self {
        Self {
            creator: "runsync".to_string(),
            author_name: "runsync".to_string(),
            version_major: 1,
            version_minor: 0,
            build_major: 1,
            build_minor: 0,
            lang_id: "en".to_string(),
            part_number: "000-00000-00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sport {
    Running,
    Biking,
    Other,
}

impl Sport {
    pub fn from_activity_type(activity_type: &str) -> Self {
        match activity_type.to_ascii_lowercase().as_str() {
            "run" | "running" => Sport::Running,
            "cycle" | "cycling" | "bike" | "biking" | "ride" => Sport::Biking,
            _ => Sport::Other,
        }
    }

    /// TCX `Sport_t` value.
    pub fn as_tcx(&self) -> &'static str {
        match self {
            Sport::Running => "Running",
            Sport::Biking => "Biking",
            Sport::Other => "Other",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Sport::Running => "run",
            Sport::Biking => "ride",
            Sport::Other => "activity",
        }
    }
}

/// Activity-level facts the encoders need besides the track itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityMetadata {
    pub activity_id: String,
    pub start: DateTime<Utc>,
    pub sport: Sport,
    pub application: ApplicationInfo,
}

impl ActivityMetadata {
    pub fn from_activity(
        activity: &Activity,
        application: ApplicationInfo,
    ) -> Result<Self, TrackError> {
        let start = activity.start()?;

        Ok(Self {
            activity_id: activity.id.clone(),
            start,
            sport: Sport::from_activity_type(&activity.activity_type),
            application,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A field the target schema requires has no value.
    MissingField {
        activity_id: String,
        field: &'static str,
    },
    Xml(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::MissingField { activity_id, field } => write!(
                f,
                "Cannot encode activity {activity_id}: required field `{field}` is unset"
            ),
            EncodeError::Xml(msg) => write!(f, "Failed to write XML: {msg}"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Indented XML writer over an in-memory buffer.
pub(crate) struct XmlDocument {
    writer: Writer<Vec<u8>>,
}

impl XmlDocument {
    /// Start a document with the UTF-8 XML declaration.
    pub(crate) fn new() -> Result<Self, EncodeError> {
        let mut document = Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 1),
        };
        document.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(document)
    }

    pub(crate) fn open(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), EncodeError> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.write(Event::Start(start))
    }

    pub(crate) fn close(&mut self, name: &str) -> Result<(), EncodeError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// `<name>text</name>`
    pub(crate) fn leaf(&mut self, name: &str, text: &str) -> Result<(), EncodeError> {
        self.write(Event::Start(BytesStart::new(name)))?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// `<name><Value>value</Value></name>`, the TCX wrapper for bpm values.
    pub(crate) fn value_leaf(&mut self, name: &str, value: &str) -> Result<(), EncodeError> {
        self.open(name, &[])?;
        self.leaf("Value", value)?;
        self.close(name)
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), EncodeError> {
        self.writer
            .write_event(event)
            .map_err(|err| EncodeError::Xml(err.to_string()))
    }
}
