use bytes::Bytes;
use reqwest::{StatusCode, header};
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    credential::Credential,
    job::storage::disk::{self, DiskPath, DownloadLink},
};

use super::{ApiError, DiskInfo, Link};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error(
        "request failed. status: {status}{}",
        .error.as_ref().map(|error| format!(", error: {error}")).unwrap_or_default()
    )]
    Api {
        status: StatusCode,
        error: Option<ApiError>,
    },
    #[error("failed to parse response: {0}")]
    ParseJson(serde_json::Error),
    #[error("invalid endpoint: {0}")]
    Endpoint(url::ParseError),
}

pub struct Client {
    endpoint: Url,
    credential: Credential,
    client: reqwest::Client,
}

impl Client {
    pub fn new(endpoint: &str, credential: Credential) -> Result<Self, Error> {
        let mut endpoint = Url::parse(endpoint).map_err(Error::Endpoint)?;
        // relative joins drop the last segment unless the path ends with a slash
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(Self {
            endpoint,
            credential,
            client: reqwest::Client::new(),
        })
    }

    fn resource(&self, resource: &str) -> Result<Url, Error> {
        self.endpoint.join(resource).map_err(Error::Endpoint)
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<reqwest::Response, Error> {
        self.client
            .get(url)
            .query(query)
            .header(header::AUTHORIZATION, self.credential.authorization())
            .send()
            .await
            .map_err(Error::Transport)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.map_err(Error::Transport)?;
        trace!(%status, body, "error response");
        let error = serde_json::from_str::<ApiError>(&body).ok();
        warn!(%status, ?error, "request failed");
        Err(Error::Api { status, error })
    }

    async fn receive_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, Error> {
        let text = Self::check(response)
            .await?
            .text()
            .await
            .map_err(Error::Transport)?;
        trace!(text, "response");
        serde_json::from_str(&text).map_err(Error::ParseJson)
    }

    /// Fetch disk information. Succeeds only for a valid token, so it doubles
    /// as a credential check.
    pub async fn disk_info(&self) -> Result<DiskInfo, Error> {
        let response = self.get(self.resource("v1/disk/")?, &[]).await?;
        Self::receive_json(response).await
    }
}

impl disk::Client for Client {
    type Error = Error;

    async fn download_link(&self, path: &DiskPath) -> Result<DownloadLink, Self::Error> {
        let response = self
            .get(
                self.resource("v1/disk/resources/download")?,
                &[("path", path.as_str())],
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%path, "resource not found");
            return Ok(DownloadLink::Absent);
        }
        let link = Self::receive_json::<Link>(response).await?;
        Ok(DownloadLink::Found(link.href))
    }

    async fn download(&self, href: &Url) -> Result<Bytes, Self::Error> {
        let response = self.get(href.clone(), &[]).await?;
        let body = Self::check(response)
            .await?
            .bytes()
            .await
            .map_err(Error::Transport)?;
        debug!(size = body.len(), "downloaded");
        Ok(body)
    }

    async fn upload_link(&self, path: &DiskPath, overwrite: bool) -> Result<Url, Self::Error> {
        let overwrite = if overwrite { "true" } else { "false" };
        let response = self
            .get(
                self.resource("v1/disk/resources/upload")?,
                &[("path", path.as_str()), ("overwrite", overwrite)],
            )
            .await?;
        let link = Self::receive_json::<Link>(response).await?;
        Ok(link.href)
    }

    async fn upload(&self, href: &Url, content_type: String, body: Bytes) -> Result<(), Self::Error> {
        let size = body.len();
        let response = self
            .client
            .put(href.clone())
            .header(header::AUTHORIZATION, self.credential.authorization())
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        let status = Self::check(response).await?.status();
        debug!(%status, size, "uploaded");
        Ok(())
    }
}
