use std::collections::HashMap;

use bytes::Bytes;
use url::Url;

use crate::job::storage::disk::{self, DiskPath, DownloadLink};

/// Operations of [`disk::Client`], used to record calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DownloadLink,
    Download,
    UploadLink,
    Upload,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{operation:?} failed with status {status}")]
    Status { operation: Operation, status: u16 },
    #[error("unknown href: {0}")]
    UnknownHref(Url),
    #[error("failed to build href: {0}")]
    Href(url::ParseError),
    #[error("no such file: {0}")]
    Missing(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub body: Bytes,
    pub content_type: String,
}

/// In-memory disk keyed by resolved path.
#[derive(Default)]
pub struct Client {
    files: tokio::sync::Mutex<HashMap<String, StoredFile>>,
    calls: tokio::sync::Mutex<Vec<Operation>>,
    failures: tokio::sync::Mutex<HashMap<Operation, u16>>,
}

fn href(kind: &str, path: &DiskPath) -> Result<Url, Error> {
    let mut url = Url::parse(&format!("local://{kind}")).map_err(Error::Href)?;
    url.query_pairs_mut().append_pair("path", path.as_str());
    Ok(url)
}

fn path_of(href: &Url, kind: &str) -> Result<String, Error> {
    if href.scheme() != "local" || href.path() != kind {
        return Err(Error::UnknownHref(href.clone()));
    }
    href.query_pairs()
        .find(|(key, _)| key == "path")
        .map(|(_, path)| path.into_owned())
        .ok_or_else(|| Error::UnknownHref(href.clone()))
}

impl Client {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn insert(&self, path: &DiskPath, body: impl Into<Bytes>) {
        self.files.lock().await.insert(
            path.as_str().to_owned(),
            StoredFile {
                body: body.into(),
                content_type: mime::TEXT_CSV.to_string(),
            },
        );
    }

    pub async fn file(&self, path: &DiskPath) -> Option<StoredFile> {
        self.files.lock().await.get(path.as_str()).cloned()
    }

    /// Make every later call of `operation` fail with `status`.
    pub async fn fail(&self, operation: Operation, status: u16) {
        self.failures.lock().await.insert(operation, status);
    }

    pub async fn calls(&self) -> Vec<Operation> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, operation: Operation) -> Result<(), Error> {
        self.calls.lock().await.push(operation);
        match self.failures.lock().await.get(&operation) {
            Some(&status) => Err(Error::Status { operation, status }),
            None => Ok(()),
        }
    }
}

impl disk::Client for Client {
    type Error = Error;

    async fn download_link(&self, path: &DiskPath) -> Result<DownloadLink, Self::Error> {
        self.enter(Operation::DownloadLink).await?;
        if self.files.lock().await.contains_key(path.as_str()) {
            Ok(DownloadLink::Found(href("/download", path)?))
        } else {
            Ok(DownloadLink::Absent)
        }
    }

    async fn download(&self, href: &Url) -> Result<Bytes, Self::Error> {
        self.enter(Operation::Download).await?;
        let path = path_of(href, "/download")?;
        self.files
            .lock()
            .await
            .get(&path)
            .map(|file| file.body.clone())
            .ok_or(Error::Missing(path))
    }

    async fn upload_link(&self, path: &DiskPath, overwrite: bool) -> Result<Url, Self::Error> {
        self.enter(Operation::UploadLink).await?;
        if !overwrite && self.files.lock().await.contains_key(path.as_str()) {
            return Err(Error::Status {
                operation: Operation::UploadLink,
                status: 409,
            });
        }
        href("/upload", path)
    }

    async fn upload(&self, href: &Url, content_type: String, body: Bytes) -> Result<(), Self::Error> {
        self.enter(Operation::Upload).await?;
        let path = path_of(href, "/upload")?;
        self.files
            .lock()
            .await
            .insert(path, StoredFile { body, content_type });
        Ok(())
    }
}
