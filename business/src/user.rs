//! Directory entries as read from the `users` collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::ParseRoleError;
use crate::store::Document;

/// Which half of the directory is being browsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Alumni,
    Student,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Alumni, Self::Student];

    /// Value stored in a user document's `type` field.
    pub fn type_tag(self) -> &'static str {
        match self {
            Self::Alumni => "Alumni",
            Self::Student => "Student",
        }
    }

    pub fn from_type_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.type_tag() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alumni => "alumni",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseRoleError(s.to_owned()))
    }
}

/// A person listed in the directory.
///
/// Every display field is optional; documents in the wild are sparse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: Option<String>,
    pub work: Option<String>,
    pub graduation: Option<String>,
    pub major: Option<String>,
    pub picture: Option<String>,
    /// Serialized as the stored tag (`"Alumni"`), not the lowercase role name.
    #[serde(rename = "type", serialize_with = "serialize_type_tag")]
    pub role: Option<Role>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            work: None,
            graduation: None,
            major: None,
            picture: None,
            role: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_work(mut self, work: impl Into<String>) -> Self {
        self.work = Some(work.into());
        self
    }

    pub fn with_graduation(mut self, graduation: impl Into<String>) -> Self {
        self.graduation = Some(graduation.into());
        self
    }

    pub fn with_major(mut self, major: impl Into<String>) -> Self {
        self.major = Some(major.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Decode a store document. Unknown fields are ignored and unknown role
    /// tags decode to `None`.
    pub fn from_document(document: &Document) -> Self {
        let text = |key: &str| document.field(key).and_then(display_text);
        Self {
            id: document.id.clone(),
            name: text("name"),
            work: text("work"),
            graduation: text("graduation"),
            major: text("major"),
            picture: text("picture"),
            role: document
                .field("type")
                .and_then(Value::as_str)
                .and_then(Role::from_type_tag),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }
}

fn serialize_type_tag<S: Serializer>(
    role: &Option<Role>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match role {
        Some(role) => serializer.serialize_str(role.type_tag()),
        None => serializer.serialize_none(),
    }
}

// Graduation years are sometimes stored as numbers.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
