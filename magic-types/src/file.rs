use std::path::Path;

use crate::error::Result;

/// A single file sent as one part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl FilePart {
    #[must_use]
    pub fn new(field: impl ToString, file_name: impl ToString, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.to_string(),
            file_name: file_name.to_string(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    /// Reads the whole file into memory. The part is named after the final
    /// path component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read.
    pub fn from_path(field: impl ToString, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(field, file_name, bytes))
    }

    #[must_use]
    pub fn mime(mut self, mime: impl ToString) -> Self {
        self.mime = Some(mime.to_string());
        self
    }
}
