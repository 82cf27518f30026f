use serde::Deserialize;

pub mod disk;

pub const DEFAULT_ENDPOINT: &str = "https://cloud-api.yandex.net/";

/// Error body returned by the REST API on failure.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub error: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// A short lived transfer handle.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: url::Url,
    pub method: Option<String>,
    #[serde(default)]
    pub templated: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub login: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    pub total_space: u64,
    pub used_space: u64,
    pub user: Option<User>,
}
