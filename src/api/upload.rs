//! Multipart file upload to the BizFlow upload endpoint.
//!
//! Uploads are not encrypted and carry only the session token header; the
//! server's `JSESSIONID` is not replayed on this path.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{error, info};

use super::client::{build_http_client, HttpOptions, SESSION_KEY_HEADER};
use super::types::{UploadResponse, UploadedFileRef};
use crate::error::{DecodeError, Result, UploadError};

/// Client for the multipart upload endpoint.
pub struct UploadClient {
    http: Client,
}

impl UploadClient {
    pub fn new(options: &HttpOptions) -> Result<Self> {
        Ok(Self {
            http: build_http_client(options, None)?,
        })
    }

    /// Upload the file at `path` and return the server's file references.
    ///
    /// The whole file is read into memory first. The part is named `file`
    /// and typed from the file extension, falling back to
    /// `application/octet-stream`.
    pub async fn upload(
        &self,
        endpoint: &str,
        session_token: &str,
        path: &Path,
    ) -> Result<Vec<UploadedFileRef>> {
        info!(operation = "file.upload", path = %path.display(), "uploading file");

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.as_ref())
            .map_err(UploadError::from)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(endpoint)
            .header(SESSION_KEY_HEADER, session_token)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(UploadError::from)?;
        if !status.is_success() {
            error!(operation = "file.upload", %status, "upload failed");
            return Err(UploadError::Status { status, body }.into());
        }

        let parsed: UploadResponse =
            serde_json::from_str(&body).map_err(|e| DecodeError::new(e, body.as_str()))?;
        if !parsed.success {
            return Err(UploadError::Rejected { body }.into());
        }

        info!(operation = "file.upload", files = parsed.data.len(), "upload complete");
        Ok(parsed.data)
    }
}
