//! Doc values format configuration

use crate::codec::MAX_CODEC_NAME_LEN;
use crate::error::{Error, Result};

/// Codec names and file extensions of the doc values file pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocValuesFormatConfig {
    /// Codec name stamped in the data file header
    pub data_codec: String,
    /// Extension of the data file
    pub data_extension: String,
    /// Codec name stamped in the metadata file header
    pub meta_codec: String,
    /// Extension of the metadata file
    pub meta_extension: String,
}

impl Default for DocValuesFormatConfig {
    fn default() -> Self {
        Self {
            data_codec: "DocValuesData".to_string(),
            data_extension: "dvd".to_string(),
            meta_codec: "DocValuesMetadata".to_string(),
            meta_extension: "dvm".to_string(),
        }
    }
}

impl DocValuesFormatConfig {
    /// Format used for per-document norms
    pub fn norms() -> Self {
        Self {
            data_codec: "NormsData".to_string(),
            data_extension: "nvd".to_string(),
            meta_codec: "NormsMetadata".to_string(),
            meta_extension: "nvm".to_string(),
        }
    }

    pub fn with_data_codec(mut self, codec: impl Into<String>) -> Self {
        self.data_codec = codec.into();
        self
    }

    pub fn with_data_extension(mut self, extension: impl Into<String>) -> Self {
        self.data_extension = extension.into();
        self
    }

    pub fn with_meta_codec(mut self, codec: impl Into<String>) -> Self {
        self.meta_codec = codec.into();
        self
    }

    pub fn with_meta_extension(mut self, extension: impl Into<String>) -> Self {
        self.meta_extension = extension.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_codec_name("data codec", &self.data_codec)?;
        check_codec_name("metadata codec", &self.meta_codec)?;
        check_extension("data extension", &self.data_extension)?;
        check_extension("metadata extension", &self.meta_extension)?;
        if self.data_extension == self.meta_extension {
            return Err(Error::Config(format!(
                "data and metadata extensions must differ (both {:?})",
                self.data_extension
            )));
        }
        Ok(())
    }
}

fn check_codec_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config(format!("{} must not be empty", what)));
    }
    if !name.is_ascii() {
        return Err(Error::Config(format!("{} {:?} is not ASCII", what, name)));
    }
    if name.len() > MAX_CODEC_NAME_LEN {
        return Err(Error::Config(format!(
            "{} is {} bytes, at most {} allowed",
            what,
            name.len(),
            MAX_CODEC_NAME_LEN
        )));
    }
    Ok(())
}

fn check_extension(what: &str, ext: &str) -> Result<()> {
    if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::Config(format!(
            "{} {:?} must be non-empty ASCII alphanumerics",
            what, ext
        )));
    }
    Ok(())
}
