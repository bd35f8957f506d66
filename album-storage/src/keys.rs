//! Mapping from logical filenames to object keys

use crate::config::StorageConfig;

const THUMBNAIL_MARKER: &str = "thumb-";

/// Builds object keys from the configured prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    upload_prefix: String,
    thumbnail_prefix: String,
    files_prefix: String,
}

impl KeyBuilder {
    /// Creates a key builder from already normalized prefixes
    #[must_use]
    pub fn new(
        upload_prefix: impl Into<String>,
        thumbnail_prefix: impl Into<String>,
        files_prefix: impl Into<String>,
    ) -> Self {
        Self {
            upload_prefix: upload_prefix.into(),
            thumbnail_prefix: thumbnail_prefix.into(),
            files_prefix: files_prefix.into(),
        }
    }

    /// Creates a key builder with the prefixes of `config`
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.upload_prefix.clone(),
            config.thumbnail_prefix.clone(),
            config.files_prefix.clone(),
        )
    }

    /// Key of an original image
    #[must_use]
    pub fn object_key(&self, filename: &str) -> String {
        format!("{}{filename}", self.upload_prefix)
    }

    /// Key of the thumbnail derived from an original image
    #[must_use]
    pub fn thumbnail_key(&self, filename: &str) -> String {
        format!("{}{THUMBNAIL_MARKER}{filename}", self.thumbnail_prefix)
    }

    /// Key of a generic file
    #[must_use]
    pub fn file_object_key(&self, filename: &str) -> String {
        format!("{}{filename}", self.files_prefix)
    }

    /// Key for a file uploaded straight from the browser into a fileset
    ///
    /// `{files_prefix}{fileset_id}/{file_id}`, suffixed with `-{name}` when a
    /// name is given. Characters outside `[A-Za-z0-9._-]` in the name become `_`.
    #[must_use]
    pub fn fileset_object_key(
        &self,
        fileset_id: impl std::fmt::Display,
        file_id: impl std::fmt::Display,
        name: Option<&str>,
    ) -> String {
        let base = format!("{}{fileset_id}/{file_id}", self.files_prefix);
        match name {
            Some(name) => format!("{base}-{}", sanitize_key_segment(name)),
            None => base,
        }
    }
}

fn sanitize_key_segment(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
