use std::env::vars;
use std::time::Duration;

use log::info;
use serde::Deserialize;
use ustr::Ustr;

use crate::error::ConfigError;

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE_ID: &str = "(default)";
pub const DEFAULT_USERS_COLLECTION: &str = "users";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Firebase project settings used to reach the directory collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    api_key: String,
    project_id: String,
    database_id: String,
    firestore_base_url: String,
    users_collection: Ustr,
    poll_interval: Duration,
}

// Everything optional so missing values can be reported by variable name.
#[derive(Debug, Deserialize)]
struct RawConfig {
    firebase_api_key: Option<String>,
    firebase_project_id: Option<String>,
    firebase_database_id: Option<String>,
    firestore_base_url: Option<String>,
    cumeets_users_collection: Option<String>,
    cumeets_poll_interval_secs: Option<u64>,
}

impl FirebaseConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE_ID.to_owned(),
            firestore_base_url: DEFAULT_FIRESTORE_BASE_URL.to_owned(),
            users_collection: Ustr::from(DEFAULT_USERS_COLLECTION),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Point at a different Firestore endpoint, e.g. the emulator or a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.firestore_base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_users_collection(mut self, collection: &str) -> Self {
        self.users_collection = Ustr::from(collection);
        self
    }

    /// Reads the configuration from the process environment.
    pub fn init() -> Result<Self, ConfigError> {
        info!("Loading Firebase configuration from environment variables");
        Self::from_vars(vars())
    }

    pub fn from_vars<I, S>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let raw: RawConfig =
            serde_env::from_iter(vars).map_err(|e| ConfigError::Env(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let RawConfig {
            firebase_api_key,
            firebase_project_id,
            firebase_database_id,
            firestore_base_url,
            cumeets_users_collection,
            cumeets_poll_interval_secs,
        } = raw;

        let api_key = non_empty(firebase_api_key).ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;
        let project_id =
            non_empty(firebase_project_id).ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        let mut config = Self::new(project_id, api_key);

        if let Some(database_id) = non_empty(firebase_database_id) {
            config.database_id = database_id;
        }
        if let Some(base_url) = non_empty(firestore_base_url) {
            info!("Using FIRESTORE_BASE_URL: {base_url}");
            config = config.with_base_url(base_url);
        }
        if let Some(collection) = non_empty(cumeets_users_collection) {
            config = config.with_users_collection(&collection);
        }
        match cumeets_poll_interval_secs {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    name: "CUMEETS_POLL_INTERVAL_SECS",
                    reason: "must be greater than zero".to_owned(),
                });
            }
            Some(secs) => config.poll_interval = Duration::from_secs(secs),
            None => {}
        }

        Ok(config)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn firestore_base_url(&self) -> &str {
        &self.firestore_base_url
    }

    pub fn users_collection(&self) -> Ustr {
        self.users_collection
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Structured-query endpoint for the configured database. The API key is
    /// passed separately as the `key` query parameter.
    pub fn run_query_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents:runQuery",
            self.firestore_base_url, self.project_id, self.database_id
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
