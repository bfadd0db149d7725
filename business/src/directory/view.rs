use crate::user::{Role, UserRecord};

/// What the home screen should show, by priority:
/// loading, then error, then the empty message, then the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryView<'a> {
    Idle,
    Loading { role: Role },
    Error(&'a str),
    Empty { role: Role },
    Results(Vec<&'a UserRecord>),
}

impl DirectoryView<'_> {
    /// Status line for the non-list states.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Loading { role } => Some(format!("Loading {role}...")),
            Self::Error(message) => Some((*message).to_owned()),
            Self::Empty { role } => Some(format!("No {role} found.")),
            Self::Idle | Self::Results(_) => None,
        }
    }

    pub fn users(&self) -> &[&UserRecord] {
        match self {
            Self::Results(users) => users,
            _ => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
