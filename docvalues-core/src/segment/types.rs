//! Segment types and metadata

use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::config::DocValuesFormatConfig;
use crate::directories::{Directory, DirectoryWriter};
use crate::error::{Error, Result};

/// Unique segment identifier (UUID7-like: 48-bit timestamp + 80-bit random)
///
/// Stored as u128 internally for full 128-bit support.
/// Format: [48-bit timestamp ms][80-bit random]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(pub u128);

impl SegmentId {
    pub fn new() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        // UUID7-like: 48 bits timestamp (ms) + 80 bits random
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let random_bits: u128 =
            ((rand::random::<u64>() as u128) << 16) | (rand::random::<u16>() as u128);

        // Combine: timestamp in upper 48 bits, random in lower 80 bits
        Self((timestamp_ms << 80) | random_bits)
    }

    pub fn from_u128(id: u128) -> Self {
        Self(id)
    }

    /// Create from hex string (32 chars)
    pub fn from_hex(s: &str) -> Option<Self> {
        u128::from_str_radix(s, 16).ok().map(Self)
    }

    /// Convert to hex string (32 chars, zero-padded)
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of the segment a doc values file pair belongs to.
///
/// The same state is used on both sides: the writer stamps `segment_id` and
/// `suffix` into both headers and the reader requires them to match.
#[derive(Debug, Clone)]
pub struct SegmentState {
    pub segment_id: SegmentId,
    /// Number of documents in the segment; every value stream has this length.
    pub max_doc: u32,
    /// Distinguishes several file pairs of the same segment ("" for none).
    pub suffix: String,
}

pub type SegmentWriteState = SegmentState;
pub type SegmentReadState = SegmentState;

impl SegmentState {
    pub fn new(segment_id: SegmentId, max_doc: u32) -> Self {
        Self {
            segment_id,
            max_doc,
            suffix: String::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Segment file name: `seg_<hex>[_<suffix>].<ext>`
    pub fn file_name(&self, extension: &str) -> PathBuf {
        segment_file_name(self.segment_id, &self.suffix, extension)
    }
}

pub fn segment_file_name(segment_id: SegmentId, suffix: &str, extension: &str) -> PathBuf {
    let mut name = format!("seg_{}", segment_id.to_hex());
    if !suffix.is_empty() {
        name.push('_');
        name.push_str(suffix);
    }
    if !extension.is_empty() {
        name.push('.');
        name.push_str(extension);
    }
    PathBuf::from(name)
}

/// Paths for the files of one doc values segment
#[derive(Debug, Clone)]
pub struct SegmentFiles {
    pub data: PathBuf,
    pub meta: PathBuf,
    pub info: PathBuf,
}

impl SegmentFiles {
    pub fn new(state: &SegmentState, config: &DocValuesFormatConfig) -> Self {
        Self {
            data: state.file_name(&config.data_extension),
            meta: state.file_name(&config.meta_extension),
            info: segment_file_name(state.segment_id, "", SEGMENT_INFO_EXTENSION),
        }
    }
}

/// Extension of the small segment info file written next to the doc values pair
pub const SEGMENT_INFO_EXTENSION: &str = "info";

/// Segment metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMeta {
    pub id: u128,
    pub num_docs: u32,
}

impl SegmentMeta {
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.write_u128::<LittleEndian>(self.id)?;
        buf.write_u32::<LittleEndian>(self.num_docs)?;
        Ok(buf)
    }

    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        let mut reader = Cursor::new(data);
        let id = reader.read_u128::<LittleEndian>()?;
        let num_docs = reader.read_u32::<LittleEndian>()?;
        Ok(Self { id, num_docs })
    }

    pub fn segment_id(&self) -> SegmentId {
        SegmentId(self.id)
    }

    pub async fn write_to<D: DirectoryWriter>(&self, dir: &D) -> Result<()> {
        let path = segment_file_name(self.segment_id(), "", SEGMENT_INFO_EXTENSION);
        dir.write(&path, &self.serialize()?).await?;
        Ok(())
    }

    pub async fn load<D: Directory>(dir: &D, segment_id: SegmentId) -> Result<Self> {
        let path = segment_file_name(segment_id, "", SEGMENT_INFO_EXTENSION);
        let bytes = dir.open_read(&path).await?;
        let meta = Self::deserialize(bytes.as_slice())
            .map_err(|e| Error::Corruption(format!("{}: {}", display(&path), e)))?;
        if meta.id != segment_id.0 {
            return Err(Error::Corruption(format!(
                "{}: segment id mismatch",
                display(&path)
            )));
        }
        Ok(meta)
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
