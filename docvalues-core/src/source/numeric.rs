//! Numeric sources, one reader per storage strategy.

use super::{Source, check_doc};
use crate::DocId;
use crate::directories::OwnedBytes;
use crate::error::{Error, Result};
use crate::norms::{NumericEntry, Strategy};
use crate::packed::{
    BlockPackedReader, FORMAT_PACKED_SINGLE_BLOCK, FixedWidthReader, MonotonicBlockPackedReader,
    PACKED_VERSION,
};
use crate::store::IndexInput;

/// Decoded view of one numeric stream.
#[derive(Debug, Clone)]
pub enum NumericReader {
    Const(i64),
    Uncompressed(OwnedBytes),
    Table {
        table: Vec<i64>,
        ords: FixedWidthReader,
    },
    Delta(BlockPackedReader),
    Indirect {
        docs: MonotonicBlockPackedReader,
        values: Box<NumericReader>,
    },
}

impl NumericReader {
    /// Decode the payload described by `entry` from the whole data file.
    pub fn open(data: &IndexInput, entry: &NumericEntry) -> Result<Self> {
        let mut input = data.clone();
        let reader = match entry {
            NumericEntry::Const { value } => NumericReader::Const(*value),
            NumericEntry::Uncompressed { count, offset } => {
                input.seek(*offset)?;
                NumericReader::Uncompressed(input.read_bytes(*count as usize)?)
            }
            NumericEntry::Table { count, offset } => {
                input.seek(*offset)?;
                check_packed_version(&mut input)?;
                let size = input.read_vint()? as usize;
                if !size.is_power_of_two() || size > 256 {
                    return Err(Error::Corruption(format!(
                        "{}: table size {} is not a power of two <= 256",
                        input.name(),
                        size
                    )));
                }
                let table = (0..size)
                    .map(|_| input.read_long())
                    .collect::<Result<Vec<_>>>()?;
                let format = input.read_vint()?;
                if format != FORMAT_PACKED_SINGLE_BLOCK {
                    return Err(Error::Corruption(format!(
                        "{}: unknown packed format {}",
                        input.name(),
                        format
                    )));
                }
                let bits = input.read_vint()?;
                if bits > 8 || 1usize << bits != size {
                    return Err(Error::Corruption(format!(
                        "{}: {} bits per ordinal for a table of {}",
                        input.name(),
                        bits,
                        size
                    )));
                }
                let remaining = input.remaining();
                let ords = FixedWidthReader::new(
                    input.read_bytes(remaining)?,
                    bits as u8,
                    *count as usize,
                )?;
                NumericReader::Table { table, ords }
            }
            NumericEntry::Delta { count, offset } => {
                input.seek(*offset)?;
                check_packed_version(&mut input)?;
                let block_size = input.read_vint()? as usize;
                NumericReader::Delta(BlockPackedReader::open(
                    &mut input,
                    block_size,
                    *count as usize,
                )?)
            }
            NumericEntry::Indirect {
                count,
                offset,
                values,
            } => {
                input.seek(*offset)?;
                check_packed_version(&mut input)?;
                let block_size = input.read_vint()? as usize;
                let docs =
                    MonotonicBlockPackedReader::open(&mut input, block_size, *count as usize)?;
                NumericReader::Indirect {
                    docs,
                    values: Box::new(NumericReader::open(data, values)?),
                }
            }
        };
        Ok(reader)
    }

    /// Value at `index`; callers bound `index` by the stream's length.
    #[inline]
    pub fn get(&self, index: usize) -> i64 {
        match self {
            NumericReader::Const(value) => *value,
            NumericReader::Uncompressed(bytes) => bytes[index] as i8 as i64,
            NumericReader::Table { table, ords } => table[ords.get(index) as usize],
            NumericReader::Delta(reader) => reader.get(index),
            NumericReader::Indirect { docs, values } => match docs.binary_search(index as i64) {
                Ok(i) => values.get(i),
                Err(_) => 0,
            },
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            NumericReader::Const(_) => Strategy::Const,
            NumericReader::Uncompressed(_) => Strategy::Uncompressed,
            NumericReader::Table { .. } => Strategy::Table,
            NumericReader::Delta(_) => Strategy::Delta,
            NumericReader::Indirect { .. } => Strategy::Indirect,
        }
    }

    /// Number of stored values, if the encoding records it.
    pub fn stored_count(&self) -> Option<u32> {
        match self {
            NumericReader::Const(_) => None,
            NumericReader::Uncompressed(bytes) => Some(bytes.len() as u32),
            NumericReader::Table { ords, .. } => Some(ords.len() as u32),
            NumericReader::Delta(reader) => Some(reader.len() as u32),
            NumericReader::Indirect { docs, .. } => Some(docs.len() as u32),
        }
    }

    pub fn ram_bytes_used(&self) -> usize {
        let own = std::mem::size_of::<Self>();
        match self {
            NumericReader::Const(_) => own,
            NumericReader::Uncompressed(bytes) => own + bytes.len(),
            NumericReader::Table { table, ords } => {
                own + table.len() * std::mem::size_of::<i64>() + ords.ram_bytes_used()
            }
            NumericReader::Delta(reader) => own + reader.ram_bytes_used(),
            NumericReader::Indirect { docs, values } => {
                own + docs.ram_bytes_used() + values.ram_bytes_used()
            }
        }
    }
}

fn check_packed_version(input: &mut IndexInput) -> Result<()> {
    let version = input.read_vint()?;
    if version != PACKED_VERSION {
        return Err(Error::Corruption(format!(
            "{}: packed version {} (expected {})",
            input.name(),
            version,
            PACKED_VERSION
        )));
    }
    Ok(())
}

/// Which typed accessor a numeric source answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Int,
    Float,
}

/// Integer or float values of one field.
#[derive(Debug, Clone)]
pub struct NumericSource {
    reader: NumericReader,
    kind: NumericKind,
    max_doc: u32,
}

impl NumericSource {
    pub fn new(reader: NumericReader, kind: NumericKind, max_doc: u32) -> Self {
        Self {
            reader,
            kind,
            max_doc,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.reader.strategy()
    }

    pub fn reader(&self) -> &NumericReader {
        &self.reader
    }
}

impl Source for NumericSource {
    fn get_int(&self, doc: DocId) -> Result<i64> {
        let index = check_doc(doc, self.max_doc)?;
        match self.kind {
            NumericKind::Int => Ok(self.reader.get(index)),
            NumericKind::Float => Err(Error::Unsupported("ints requested from a float field")),
        }
    }

    fn get_float(&self, doc: DocId) -> Result<f64> {
        let index = check_doc(doc, self.max_doc)?;
        match self.kind {
            NumericKind::Float => Ok(f64::from_bits(self.reader.get(index) as u64)),
            NumericKind::Int => Err(Error::Unsupported("floats requested from an int field")),
        }
    }

    fn value_count(&self) -> Result<u32> {
        self.reader
            .stored_count()
            .ok_or(Error::Unsupported("const fields do not record a value count"))
    }

    fn max_doc(&self) -> u32 {
        self.max_doc
    }

    fn ram_bytes_used(&self) -> usize {
        std::mem::size_of::<Self>() + self.reader.ram_bytes_used()
    }
}
