//! `multipart/form-data` parsing.
//!
//! The whole body is buffered before a request reaches the dispatcher, so
//! the form is read in one pass into text fields and [`UploadedFile`]s.

use std::io;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;

use hermes_core::UploadedFile;

use crate::error::ExtractionError;

/// Default maximum body size (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum size of one field (5 MiB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 5 * 1024 * 1024;

/// Limits applied to multipart bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Maximum size of one field in bytes.
    pub max_field_size: usize,
    /// Maximum number of fields.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: 100,
        }
    }
}

impl MultipartConfig {
    /// Default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body limit.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Sets the field limit.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Sets the field count limit.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// A parsed multipart form.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormData {
    /// Parses `body` using the boundary from the `Content-Type` header.
    pub async fn parse(
        headers: &HeaderMap,
        body: Bytes,
        config: MultipartConfig,
    ) -> Result<Self, ExtractionError> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .ok_or(ExtractionError::UnsupportedMediaType {
                expected: "multipart/form-data",
                actual: None,
            })?;

        let boundary = multer::parse_boundary(content_type).map_err(|_| {
            ExtractionError::UnsupportedMediaType {
                expected: "multipart/form-data",
                actual: Some(content_type.to_string()),
            }
        })?;

        if body.len() > config.max_body_size {
            return Err(ExtractionError::PayloadTooLarge {
                limit: config.max_body_size,
                actual: body.len(),
            });
        }

        let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);
        let mut form = Self::default();
        let mut count = 0;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ExtractionError::Multipart(e.to_string()))?
        {
            count += 1;
            if count > config.max_fields {
                return Err(ExtractionError::Multipart(format!(
                    "too many fields (max {})",
                    config.max_fields
                )));
            }

            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(ToString::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ExtractionError::Multipart(e.to_string()))?;

            if data.len() > config.max_field_size {
                return Err(ExtractionError::PayloadTooLarge {
                    limit: config.max_field_size,
                    actual: data.len(),
                });
            }

            if file_name.is_some() {
                form.files.push(UploadedFile {
                    field_name: name,
                    file_name,
                    content_type,
                    data,
                });
            } else {
                form.fields
                    .push((name, String::from_utf8_lossy(&data).into_owned()));
            }
        }

        tracing::trace!(
            fields = form.fields.len(),
            files = form.files.len(),
            "parsed multipart body"
        );
        Ok(form)
    }

    /// First text field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text fields in body order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// First file uploaded under `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|file| file.field_name == name)
    }

    /// Every file uploaded under `name`.
    #[must_use]
    pub fn files_named(&self, name: &str) -> Vec<UploadedFile> {
        self.files
            .iter()
            .filter(|file| file.field_name == name)
            .cloned()
            .collect()
    }

    /// Every uploaded file.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }
}

/// Returns true if the headers announce a multipart body.
#[must_use]
pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA)
}
