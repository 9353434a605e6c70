use super::error::{FirestoreApiError, FirestoreResult};

/// Default REST endpoint of the managed service.
const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
/// Database id used when none is configured.
const DEFAULT_DATABASE_ID: &str = "(default)";
/// Bearer token the emulator accepts for any project.
const EMULATOR_TOKEN: &str = "owner";

/// Runtime configuration describing how to reach a Firestore database.
///
/// The crate never mints or refreshes credentials; a caller that talks to
/// the managed service supplies a valid OAuth bearer token, and a caller
/// that targets the emulator gets the emulator's fixed token for free via
/// [`FirestoreConfig::from_env`].
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Cloud project owning the database.
    pub project_id: String,
    /// Database id within the project.
    pub database_id: String,
    /// Base URL of the REST endpoint, without a trailing slash.
    pub base_url: String,
    /// OAuth bearer token attached to every request, when present.
    pub bearer_token: Option<String>,
}

impl FirestoreConfig {
    /// Configuration for the managed service's default database.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE_ID.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            bearer_token: None,
        }
    }

    /// Target a database other than `(default)`.
    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    /// Point at a different endpoint, e.g. a local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Attach a bearer token to every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    ///
    /// `FIRESTORE_PROJECT_ID` is required. `FIRESTORE_DATABASE_ID` and
    /// `FIRESTORE_BEARER_TOKEN` are optional, and `FIRESTORE_EMULATOR_HOST`
    /// (the variable the official tooling exports) rewrites the base URL and
    /// implies the emulator's `owner` token unless an explicit token is set.
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("FIRESTORE_PROJECT_ID").map_err(|_| {
            FirestoreApiError::MissingEnvVar {
                var: "FIRESTORE_PROJECT_ID",
            }
        })?;

        let mut config = Self::new(project_id);

        if let Ok(database_id) = std::env::var("FIRESTORE_DATABASE_ID") {
            config = config.with_database(database_id);
        }

        if let Ok(host) = std::env::var("FIRESTORE_EMULATOR_HOST") {
            config = config
                .with_base_url(format!("http://{host}"))
                .with_bearer_token(EMULATOR_TOKEN);
        }

        if let Ok(token) = std::env::var("FIRESTORE_BEARER_TOKEN") {
            config = config.with_bearer_token(token);
        }

        Ok(config)
    }
}
