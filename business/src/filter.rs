//! The two filter stages behind the directory.
//!
//! 1. [`role_predicate`] is sent to the store and narrows the collection to one role.
//! 2. [`SearchQuery`] runs in memory over whatever snapshot the store delivered.
//!
//! Neither stage knows about the other.

use crate::store::Predicate;
use crate::user::{Role, UserRecord};

/// Document field holding the role tag.
pub const TYPE_FIELD: &str = "type";

pub fn role_predicate(role: Role) -> Predicate {
    Predicate::equals(TYPE_FIELD, role.type_tag())
}

/// Free-text search over name, major and graduation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    needle: String,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        let raw = text.into();
        let needle = raw.trim().to_lowercase();
        Self { raw, needle }
    }

    /// The text as typed, untrimmed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whitespace-only queries match everything.
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        self.is_empty() || search_text(user).contains(&self.needle)
    }

    /// Matching users in their original order.
    pub fn apply<'a>(&self, users: &'a [UserRecord]) -> Vec<&'a UserRecord> {
        if self.is_empty() {
            return users.iter().collect();
        }
        users.iter().filter(|user| self.matches(user)).collect()
    }
}

/// Lower-cased `name major graduation`, skipping absent fields.
pub fn search_text(user: &UserRecord) -> String {
    [&user.name, &user.major, &user.graduation]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn derived_list<'a>(users: &'a [UserRecord], query: &str) -> Vec<&'a UserRecord> {
    SearchQuery::new(query).apply(users)
}
