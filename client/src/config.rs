use std::path::PathBuf;

/// Backend used when `TASKLY_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Directory name appended to the platform data directory
pub const APP_DIR_NAME: &str = "Taskly";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without a trailing `/`.
    pub api_url: String,
    /// Where `session.yaml` lives.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Load configuration from the process environment, after reading an
    /// optional `.env` file.
    ///
    /// | Env Var           | Default                         |
    /// |-------------------|---------------------------------|
    /// | `TASKLY_API_URL`  | `http://localhost:3001`         |
    /// | `TASKLY_DATA_DIR` | `<platform data dir>/Taskly`    |
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("TASKLY_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let data_dir = lookup("TASKLY_DATA_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Self { api_url, data_dir }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".taskly"))
}
