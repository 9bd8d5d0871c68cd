use thiserror::Error;

#[derive(Debug, Error)]
pub enum CuratorError {
    #[error("not a catalog root: missing '{0}/' directory")]
    MissingSourceDir(String),

    #[error("invalid resource id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidId(String),

    #[error("invalid category '{0}': expected 'skills' or 'tools'")]
    InvalidCategory(String),

    #[error("scan failed in '{dir}': {reason}")]
    Scan { dir: String, reason: String },

    #[error("registry not found: {0} (run 'curator build' first)")]
    RegistryNotFound(String),

    #[error("malformed registry {path}: {reason}")]
    MalformedRegistry { path: String, reason: String },

    #[error("fetch failed for {unit}: {reason}")]
    Fetch { unit: String, reason: String },

    #[error("apply failed for '{path}': {reason}")]
    Apply { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CuratorError>;
