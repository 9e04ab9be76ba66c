use std::path::{Path, PathBuf};

use http::header::CONTENT_TYPE;
use tether_error::{Result, StructuredError};
use tokio::io::AsyncWriteExt;

use crate::client::RestClient;
use crate::template::RequestTemplate;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

impl RestClient {
    /// Stream every part of a `multipart/form-data` response into `destination`
    ///
    /// The directory is created when missing. Each part is written to a file
    /// named after the final component of its declared filename; parts
    /// without one are skipped. Reading stops at the first error between
    /// parts, so a truncated body looks like a shorter one: callers that
    /// expect a fixed set of files should check the returned paths.
    pub async fn download_multipart(&self, template: &RequestTemplate, destination: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(destination).await.map_err(|e| {
            StructuredError::internal(format!("failed to create {}: {e}", destination.display()))
        })?;

        let url = self.endpoint(template)?;
        let response = self.send(template, &url).await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(StructuredError::http(response.status()).with_uri(url.path()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !content_type.to_ascii_lowercase().starts_with(MULTIPART_FORM_DATA) {
            return Err(StructuredError::bad_request("content-type is not multipart").with_uri(url.path()));
        }

        let boundary = multer::parse_boundary(content_type)
            .map_err(|e| StructuredError::bad_request(format!("invalid multipart boundary: {e}")))?;

        let mut multipart = multer::Multipart::new(response.bytes_stream(), boundary);
        let mut written = Vec::new();

        while let Ok(Some(mut field)) = multipart.next_field().await {
            let Some(file_name) = field.file_name().and_then(part_file_name) else {
                tracing::warn!(field = field.name().unwrap_or_default(), "skipping part without a file name");
                continue;
            };

            let path = destination.join(file_name);
            let mut file = tokio::fs::File::create(&path)
                .await
                .map_err(|e| StructuredError::internal(format!("failed to create {}: {e}", path.display())))?;

            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| StructuredError::internal(format!("failed to read part {}: {e}", path.display())))?
            {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| StructuredError::internal(format!("failed to write {}: {e}", path.display())))?;
            }

            file.flush()
                .await
                .map_err(|e| StructuredError::internal(format!("failed to write {}: {e}", path.display())))?;

            tracing::debug!(file = %path.display(), "multipart part written");
            written.push(path);
        }

        Ok(written)
    }
}

/// Final path component of a declared filename, if any
fn part_file_name(declared: &str) -> Option<PathBuf> {
    Path::new(declared).file_name().map(PathBuf::from)
}
