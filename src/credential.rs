use serde::Deserialize;

/// OAuth credential for the Yandex Disk API. The token is kept out of `Debug`
/// output.
#[derive(Deserialize, Clone, derive_debug::Dbg)]
pub struct Credential {
    #[dbg(skip)]
    pub access_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("OAuth {}", self.access_token)
    }
}
