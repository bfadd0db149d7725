//! Business layer for the CU Meets directory.
//!
//! - [`Directory`]: role-scoped live listener plus client-side search
//! - [`DocumentStore`]: the collaborator contract, with [`MemoryStore`] and
//!   [`FirestoreStore`] implementations
//! - [`FirebaseConfig`]: environment-driven project settings

pub mod config;
pub mod directory;
pub mod error;
pub mod filter;
pub mod store;
pub mod user;

pub use config::FirebaseConfig;
pub use directory::{Directory, DirectoryPhase, DirectoryState, DirectoryView};
pub use error::{ConfigError, DirectoryError, ParseRoleError, StoreError};
pub use filter::{SearchQuery, derived_list, role_predicate};
pub use store::{
    Document, DocumentStore, FieldOp, FirestoreStore, MemoryStore, OnError, OnSnapshot, Predicate,
    Subscription,
};
pub use user::{Role, UserRecord};
