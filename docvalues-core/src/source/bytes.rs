//! Byte-string sources.

use super::{NumericReader, SortedSource, Source, check_doc};
use crate::DocId;
use crate::directories::OwnedBytes;
use crate::error::{Error, Result};
use crate::packed::{MonotonicBlockPackedReader, PACKED_VERSION};
use crate::store::IndexInput;

/// `count` byte strings: concatenated payload plus `count + 1` start addresses.
#[derive(Debug, Clone)]
struct BytesTable {
    bytes: OwnedBytes,
    addresses: MonotonicBlockPackedReader,
    count: u32,
}

impl BytesTable {
    fn open(data: &IndexInput, offset: u64, count: u32) -> Result<Self> {
        let mut input = data.clone();
        input.seek(offset)?;
        let total = input.read_vlong()?;
        let total = usize::try_from(total)
            .map_err(|_| Error::Corruption(format!("{}: {} bytes", input.name(), total)))?;
        let bytes = input.read_bytes(total)?;
        let version = input.read_vint()?;
        if version != PACKED_VERSION {
            return Err(Error::Corruption(format!(
                "{}: packed version {} (expected {})",
                input.name(),
                version,
                PACKED_VERSION
            )));
        }
        let block_size = input.read_vint()? as usize;
        let addresses =
            MonotonicBlockPackedReader::open(&mut input, block_size, count as usize + 1)?;
        Ok(Self {
            bytes,
            addresses,
            count,
        })
    }

    fn get(&self, index: u32) -> Result<&[u8]> {
        if index >= self.count {
            return Err(Error::InvalidArgument(format!(
                "ordinal {} out of range (value count {})",
                index, self.count
            )));
        }
        let start = self.addresses.get(index as usize);
        let end = self.addresses.get(index as usize + 1);
        if start < 0 || start > end || end as u64 > self.bytes.len() as u64 {
            return Err(Error::Corruption(format!(
                "bytes address range {}..{} outside payload of {}",
                start,
                end,
                self.bytes.len()
            )));
        }
        Ok(&self.bytes[start as usize..end as usize])
    }

    fn ram_bytes_used(&self) -> usize {
        self.bytes.len() + self.addresses.ram_bytes_used()
    }
}

/// One byte string per document.
#[derive(Debug, Clone)]
pub struct StraightBytesSource {
    table: BytesTable,
}

impl StraightBytesSource {
    pub fn open(data: &IndexInput, offset: u64, count: u32) -> Result<Self> {
        Ok(Self {
            table: BytesTable::open(data, offset, count)?,
        })
    }
}

impl Source for StraightBytesSource {
    fn get_bytes(&self, doc: DocId) -> Result<&[u8]> {
        check_doc(doc, self.table.count)?;
        self.table.get(doc)
    }

    fn value_count(&self) -> Result<u32> {
        Ok(self.table.count)
    }

    fn max_doc(&self) -> u32 {
        self.table.count
    }

    fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>() + self.table.ram_bytes_used()
    }
}

/// Sorted dictionary plus per-document ordinals.
#[derive(Debug, Clone)]
pub struct SortedBytesSource {
    dictionary: BytesTable,
    ords: NumericReader,
    max_doc: u32,
}

impl SortedBytesSource {
    pub fn open(
        data: &IndexInput,
        offset: u64,
        value_count: u32,
        ords: NumericReader,
        max_doc: u32,
    ) -> Result<Self> {
        Ok(Self {
            dictionary: BytesTable::open(data, offset, value_count)?,
            ords,
            max_doc,
        })
    }
}

impl Source for SortedBytesSource {
    fn get_bytes(&self, doc: DocId) -> Result<&[u8]> {
        let ord = self.ord(doc)?;
        self.get_by_ord(ord)
    }

    /// Dictionary size, including the empty value at ordinal 0.
    fn value_count(&self) -> Result<u32> {
        Ok(self.dictionary.count)
    }

    fn max_doc(&self) -> u32 {
        self.max_doc
    }

    fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>() + self.dictionary.ram_bytes_used() + self.ords.ram_bytes_used()
    }

    fn as_sorted(&self) -> Option<&dyn SortedSource> {
        Some(self)
    }
}

impl SortedSource for SortedBytesSource {
    fn ord(&self, doc: DocId) -> Result<u32> {
        let index = check_doc(doc, self.max_doc)?;
        let ord = self.ords.get(index);
        if ord < 0 || ord >= self.dictionary.count as i64 {
            return Err(Error::Corruption(format!(
                "document {} has ordinal {} outside dictionary of {}",
                doc, ord, self.dictionary.count
            )));
        }
        Ok(ord as u32)
    }

    fn get_by_ord(&self, ord: u32) -> Result<&[u8]> {
        self.dictionary.get(ord)
    }
}
