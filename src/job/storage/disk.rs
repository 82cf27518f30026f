use bytes::Bytes;
use url::Url;

/// A resolved storage path such as `disk:/reports/2024.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiskPath(String);

const SCHEMES: &[&str] = &["disk:", "app:"];

impl DiskPath {
    /// Resolve a user supplied path. Paths without a storage scheme are placed
    /// under `disk:/`. Returns `None` for an empty path.
    pub fn resolve(path: &str) -> Option<Self> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if SCHEMES.iter().any(|scheme| path.starts_with(scheme)) {
            return Some(Self(path.to_owned()));
        }
        match path.strip_prefix('/') {
            Some(rest) => Some(Self(format!("disk:/{rest}"))),
            None => Some(Self(format!("disk:/{path}"))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DiskPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of asking the storage for a download handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadLink {
    Found(Url),
    Absent,
}

pub trait Client {
    type Error;

    fn download_link(
        &self,
        path: &DiskPath,
    ) -> impl Future<Output = Result<DownloadLink, Self::Error>> + Send;

    fn download(&self, href: &Url) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;

    fn upload_link(
        &self,
        path: &DiskPath,
        overwrite: bool,
    ) -> impl Future<Output = Result<Url, Self::Error>> + Send;

    fn upload(
        &self,
        href: &Url,
        content_type: String,
        body: Bytes,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
