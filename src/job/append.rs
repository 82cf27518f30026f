//! Append job
//!
//! Downloads the current document, lays the input records out as rows and
//! uploads the merged document back to the same path. Every step runs in
//! order and the first failure aborts the job before anything is uploaded.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::{
    config::{Mapping, Settings},
    table::{self, Header, Record},
};

use super::storage::disk::{self, DiskPath, DownloadLink};

/// Field added to every output record, holding the resolved file path.
pub const FILE_PATH_FIELD: &str = "filePath";

/// Error type for the append job.
#[derive(Debug, thiserror::Error)]
pub enum AppendError<E> {
    #[error("{0} not found and creation is disabled")]
    NotFound(DiskPath),
    #[error("storage: {0}")]
    Storage(#[source] E),
    #[error("malformed header: {0}")]
    MalformedHeader(table::ParseError),
    #[error("first record has no fields to derive a header from")]
    EmptyLayout,
    #[error("failed to serialize rows: {0}")]
    Serialize(csv::Error),
}

/// Appends records to one CSV document on a disk backend.
pub struct AppendJob<'a, D> {
    pub disk: &'a D,
    pub settings: &'a Settings,
}

impl<D: disk::Client> AppendJob<'_, D> {
    /// Append `records` and return them, each tagged with [`FILE_PATH_FIELD`].
    pub async fn run(&self, records: Vec<Record>) -> Result<Vec<Record>, AppendError<D::Error>> {
        let settings = self.settings;
        let path = &settings.path;
        let delimiter = settings.delimiter.as_byte();
        if records.is_empty() {
            debug!(%path, "no records to append");
            return Ok(Vec::new());
        }

        let existing = self.fetch().await?;

        let discovered = match &existing {
            Some(content) if settings.has_header && !content.is_empty() => {
                let header =
                    table::header_line(content, delimiter).map_err(AppendError::MalformedHeader)?;
                debug!(%header, "header discovered");
                Some(header)
            }
            _ => None,
        };

        let layout = match &settings.mapping {
            Mapping::ByColumns(columns) => Header::new(columns.clone()),
            Mapping::ByHeader => discovered.unwrap_or_else(|| {
                let header = records.first().map(Header::from_record).unwrap_or_default();
                debug!(%header, "header derived from first record");
                header
            }),
        };
        if layout.is_empty() {
            return Err(AppendError::EmptyLayout);
        }

        let rows = records
            .iter()
            .map(|record| table::project(record, &layout))
            .collect::<Vec<_>>();
        let write_header = existing.is_none() && settings.header_on_create();
        let appended = table::compose(write_header.then_some(&layout), &rows, delimiter)
            .map_err(AppendError::Serialize)?;
        let merged = table::merge(existing.as_deref().unwrap_or_default(), &appended);
        debug!(rows = rows.len(), write_header, size = merged.len(), "composed");

        let href = self
            .disk
            .upload_link(path, true)
            .await
            .map_err(AppendError::Storage)?;
        self.disk
            .upload(&href, settings.content_type(), self.encode(&merged))
            .await
            .map_err(AppendError::Storage)?;
        debug!(%path, rows = rows.len(), "append finished");

        let tag = serde_json::Value::String(path.to_string());
        Ok(records
            .into_iter()
            .map(|mut record| {
                record.insert(FILE_PATH_FIELD.to_owned(), tag.clone());
                record
            })
            .collect())
    }

    /// Current content of the document, or `None` when it does not exist yet.
    async fn fetch(&self) -> Result<Option<String>, AppendError<D::Error>> {
        let path = &self.settings.path;
        match self
            .disk
            .download_link(path)
            .await
            .map_err(AppendError::Storage)?
        {
            DownloadLink::Found(href) => {
                let body = self
                    .disk
                    .download(&href)
                    .await
                    .map_err(AppendError::Storage)?;
                debug!(%path, size = body.len(), "fetched existing content");
                Ok(Some(self.decode(&body)))
            }
            DownloadLink::Absent if self.settings.create_if_missing => {
                debug!(%path, "file absent, creating");
                Ok(None)
            }
            DownloadLink::Absent => Err(AppendError::NotFound(path.clone())),
        }
    }

    fn decode(&self, body: &[u8]) -> String {
        let encoding = self.settings.encoding;
        // a BOM stays in the text so it is written back unchanged
        let (content, had_errors) = encoding.decode_without_bom_handling(body);
        if had_errors {
            warn!(encoding = encoding.name(), "malformed bytes replaced while decoding");
        }
        content.into_owned()
    }

    fn encode(&self, content: &str) -> Bytes {
        let encoding = self.settings.encoding;
        let (body, _, had_errors) = encoding.encode(content);
        if had_errors {
            warn!(encoding = encoding.name(), "unmappable characters replaced while encoding");
        }
        Bytes::from(body.into_owned())
    }
}
