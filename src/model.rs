use serde::{Deserialize, Deserializer, Serialize};

/// Local display timestamp, e.g. `10/19/2026, 9:05:00 AM`.
pub type Timestamp = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
}

/// Opaque signature image as handed over by the capture widget, normally a
/// `data:image/png;base64,...` URL. Only the export packager looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureImage(String);

impl SignatureImage {
    pub fn new(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub name: String,
    pub time_in: Timestamp,
    pub signature_in: SignatureImage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_out: Option<SignatureImage>,
}

impl AttendanceRecord {
    pub fn is_signed_out(&self) -> bool {
        self.time_out.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetails {
    #[serde(default, deserialize_with = "string_or_number")]
    pub class_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub class_week: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub class_day: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassDetailsField {
    ClassName,
    ClassWeek,
    ClassDay,
}

impl ClassDetailsField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "className" => Some(Self::ClassName),
            "classWeek" => Some(Self::ClassWeek),
            "classDay" => Some(Self::ClassDay),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClassName => "className",
            Self::ClassWeek => "classWeek",
            Self::ClassDay => "classDay",
        }
    }
}

impl ClassDetails {
    pub fn with_field(mut self, field: ClassDetailsField, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            ClassDetailsField::ClassName => self.class_name = value,
            ClassDetailsField::ClassWeek => self.class_week = value,
            ClassDetailsField::ClassDay => self.class_day = value,
        }
        self
    }
}

// Week and day arrive as numbers from some form inputs and as text from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}
