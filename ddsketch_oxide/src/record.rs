//! Logical serialized form of a sketch, plus the byte codec
//!
//! A sketch projects to a [`SketchRecord`]: mapping parameters, the dense
//! count arrays of both stores, and the scalar accumulators. The record is
//! the language-neutral contract - two implementations that agree on it
//! produce interchangeable sketches. The byte encoding here is one adapter
//! over that record (little-endian fixed-width fields, length-prefixed
//! arrays); wire envelopes like protobuf are thin external adapters over the
//! same record and are deliberately not part of this crate.

use crate::common::validation::{validate_byte_size, validate_min_size};
use crate::common::{Result, SketchError};
use crate::mapping::{IndexMapping, MappingVariant};
use crate::sketch::DDSketch;
use crate::store::{BinStore, StoreVariant};

/// Serialized form of an index mapping
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRecord {
    /// Which of the three mapping variants
    pub variant: MappingVariant,
    /// Bucket boundary ratio, full double precision
    pub gamma: f64,
    /// Constant added to every key before rounding
    pub index_offset: f64,
}

/// Serialized form of a bin store
///
/// Counts are a contiguous array covering `[offset, offset + counts.len())`;
/// bins a sparse store never touched appear as zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    /// Which of the three store variants
    pub variant: StoreVariant,
    /// Cap on live bins; 0 means unbounded
    pub bin_limit: u32,
    /// Key of the first entry in `counts`
    pub offset: i32,
    /// Per-key counts in ascending key order
    pub counts: Vec<f64>,
    /// Whether the low tail has folded into a sentinel bin
    pub is_collapsed_lo: bool,
    /// Whether the high tail has folded into a sentinel bin
    pub is_collapsed_hi: bool,
}

/// Serialized form of a whole sketch
#[derive(Debug, Clone, PartialEq)]
pub struct SketchRecord {
    /// The index mapping configuration
    pub mapping: MappingRecord,
    /// Store of positive values
    pub positive_store: StoreRecord,
    /// Store of negative value magnitudes
    pub negative_store: StoreRecord,
    /// Count of values folded into the zero bucket
    pub zero_count: f64,
    /// Weighted sum of all values
    pub sum: f64,
    /// Exact observed minimum (+inf when empty)
    pub min: f64,
    /// Exact observed maximum (-inf when empty)
    pub max: f64,
    /// Total count of values
    pub count: f64,
}

impl StoreRecord {
    fn from_store(store: &BinStore) -> Self {
        let (offset, counts) = match (store.min_key(), store.max_key()) {
            (Some(min_key), Some(max_key)) => {
                let span = (max_key as i64 - min_key as i64 + 1) as usize;
                let mut counts = vec![0.0; span];
                for (key, count) in store.bins() {
                    counts[(key as i64 - min_key as i64) as usize] = count;
                }
                (min_key, counts)
            }
            _ => (0, Vec::new()),
        };
        Self {
            variant: store.variant(),
            bin_limit: store.bin_limit().unwrap_or(0) as u32,
            offset,
            counts,
            is_collapsed_lo: store.is_collapsed_lo(),
            is_collapsed_hi: store.is_collapsed_hi(),
        }
    }

    fn to_store(&self) -> Result<BinStore> {
        if self.counts.len() as i64 + self.offset as i64 > i32::MAX as i64 {
            return Err(SketchError::DeserializationError(format!(
                "store spans past the key range: offset {} with {} counts",
                self.offset,
                self.counts.len()
            )));
        }
        let mut store = match self.variant {
            StoreVariant::Sparse => BinStore::sparse(),
            StoreVariant::CollapsingLowest => BinStore::collapsing_lowest(self.bin_limit as usize)?,
            StoreVariant::CollapsingHighest => {
                BinStore::collapsing_highest(self.bin_limit as usize)?
            }
        };
        for (i, &count) in self.counts.iter().enumerate() {
            if !(count.is_finite() && count >= 0.0) {
                return Err(SketchError::DeserializationError(format!(
                    "bin count must be finite and non-negative, got {}",
                    count
                )));
            }
            if count > 0.0 {
                store.add(self.offset + i as i32, count);
            }
        }
        match (&mut store, self.is_collapsed_lo, self.is_collapsed_hi) {
            (BinStore::CollapsingLowest(s), true, _) => s.mark_collapsed(),
            (BinStore::CollapsingHighest(s), _, true) => s.mark_collapsed(),
            _ => {}
        }
        Ok(store)
    }
}

impl SketchRecord {
    /// Projects a sketch to its logical record
    pub fn from_sketch(sketch: &DDSketch) -> Self {
        Self {
            mapping: MappingRecord {
                variant: sketch.mapping().variant(),
                gamma: sketch.mapping().gamma(),
                index_offset: sketch.mapping().index_offset(),
            },
            positive_store: StoreRecord::from_store(sketch.positive_store()),
            negative_store: StoreRecord::from_store(sketch.negative_store()),
            zero_count: sketch.zero_count(),
            sum: sketch.sum(),
            min: sketch.min().unwrap_or(f64::INFINITY),
            max: sketch.max().unwrap_or(f64::NEG_INFINITY),
            count: sketch.count(),
        }
    }

    /// Rebuilds a sketch from this record
    ///
    /// # Errors
    ///
    /// Returns `DeserializationError` or `InvalidParameter` when fields are
    /// inconsistent (bad gamma, negative counts, min above max).
    pub fn to_sketch(&self) -> Result<DDSketch> {
        let mapping = IndexMapping::from_parts(
            self.mapping.variant,
            self.mapping.gamma,
            self.mapping.index_offset,
        )?;
        let positive_store = self.positive_store.to_store()?;
        let negative_store = self.negative_store.to_store()?;

        if !(self.count.is_finite() && self.count >= 0.0)
            || !(self.zero_count.is_finite() && self.zero_count >= 0.0)
            || !self.sum.is_finite()
        {
            return Err(SketchError::DeserializationError(
                "count, zero_count and sum must be finite and non-negative".to_string(),
            ));
        }
        if self.count > 0.0 && !(self.min.is_finite() && self.max.is_finite() && self.min <= self.max)
        {
            return Err(SketchError::DeserializationError(format!(
                "non-empty sketch needs finite min <= max, got {} and {}",
                self.min, self.max
            )));
        }

        Ok(DDSketch::from_parts(
            mapping,
            positive_store,
            negative_store,
            self.zero_count,
            self.count,
            self.sum,
            self.min,
            self.max,
        ))
    }

    /// Encodes the record as little-endian bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            MIN_RECORD_SIZE + 8 * (self.positive_store.counts.len() + self.negative_store.counts.len()),
        );

        bytes.push(mapping_tag(self.mapping.variant));
        bytes.extend_from_slice(&self.mapping.gamma.to_le_bytes());
        bytes.extend_from_slice(&self.mapping.index_offset.to_le_bytes());

        bytes.extend_from_slice(&self.zero_count.to_le_bytes());
        bytes.extend_from_slice(&self.sum.to_le_bytes());
        bytes.extend_from_slice(&self.min.to_le_bytes());
        bytes.extend_from_slice(&self.max.to_le_bytes());
        bytes.extend_from_slice(&self.count.to_le_bytes());

        for store in [&self.positive_store, &self.negative_store] {
            bytes.push(store_tag(store.variant));
            bytes.extend_from_slice(&store.bin_limit.to_le_bytes());
            bytes.extend_from_slice(&store.offset.to_le_bytes());
            bytes.push(store.is_collapsed_lo as u8);
            bytes.push(store.is_collapsed_hi as u8);
            bytes.extend_from_slice(&(store.counts.len() as u64).to_le_bytes());
            for count in &store.counts {
                bytes.extend_from_slice(&count.to_le_bytes());
            }
        }

        bytes
    }

    /// Decodes a record from little-endian bytes
    ///
    /// # Errors
    ///
    /// Returns `DeserializationError` for truncated input, unknown variant
    /// tags, or oversized payloads.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_byte_size(bytes.len())?;
        validate_min_size(bytes.len(), MIN_RECORD_SIZE)?;
        let mut reader = ByteReader::new(bytes);

        let mapping = MappingRecord {
            variant: mapping_variant(reader.read_u8()?)?,
            gamma: reader.read_f64()?,
            index_offset: reader.read_f64()?,
        };
        let zero_count = reader.read_f64()?;
        let sum = reader.read_f64()?;
        let min = reader.read_f64()?;
        let max = reader.read_f64()?;
        let count = reader.read_f64()?;

        let positive_store = read_store(&mut reader)?;
        let negative_store = read_store(&mut reader)?;

        if !reader.is_exhausted() {
            return Err(SketchError::DeserializationError(format!(
                "{} trailing bytes after sketch record",
                reader.remaining()
            )));
        }

        Ok(Self {
            mapping,
            positive_store,
            negative_store,
            zero_count,
            sum,
            min,
            max,
            count,
        })
    }
}

/// Fixed-size portion of the encoding: mapping header, scalar block, and two
/// store headers with empty count arrays
const MIN_RECORD_SIZE: usize = (1 + 8 + 8) + 5 * 8 + 2 * (1 + 4 + 4 + 1 + 1 + 8);

fn mapping_tag(variant: MappingVariant) -> u8 {
    match variant {
        MappingVariant::Logarithmic => 0,
        MappingVariant::LinearlyInterpolated => 1,
        MappingVariant::CubicallyInterpolated => 2,
    }
}

fn mapping_variant(tag: u8) -> Result<MappingVariant> {
    match tag {
        0 => Ok(MappingVariant::Logarithmic),
        1 => Ok(MappingVariant::LinearlyInterpolated),
        2 => Ok(MappingVariant::CubicallyInterpolated),
        other => Err(SketchError::DeserializationError(format!(
            "unknown mapping variant tag {}",
            other
        ))),
    }
}

fn store_tag(variant: StoreVariant) -> u8 {
    match variant {
        StoreVariant::Sparse => 0,
        StoreVariant::CollapsingLowest => 1,
        StoreVariant::CollapsingHighest => 2,
    }
}

fn store_variant(tag: u8) -> Result<StoreVariant> {
    match tag {
        0 => Ok(StoreVariant::Sparse),
        1 => Ok(StoreVariant::CollapsingLowest),
        2 => Ok(StoreVariant::CollapsingHighest),
        other => Err(SketchError::DeserializationError(format!(
            "unknown store variant tag {}",
            other
        ))),
    }
}

fn read_store(reader: &mut ByteReader<'_>) -> Result<StoreRecord> {
    let variant = store_variant(reader.read_u8()?)?;
    let bin_limit = reader.read_u32()?;
    let offset = reader.read_i32()?;
    let is_collapsed_lo = reader.read_u8()? != 0;
    let is_collapsed_hi = reader.read_u8()? != 0;

    let len = reader.read_u64()? as usize;
    // A count array longer than the remaining input is corrupt; check before
    // allocating.
    if len.checked_mul(8).map_or(true, |b| b > reader.remaining()) {
        return Err(SketchError::DeserializationError(format!(
            "store claims {} bins but only {} bytes remain",
            len,
            reader.remaining()
        )));
    }
    let mut counts = Vec::with_capacity(len);
    for _ in 0..len {
        counts.push(reader.read_f64()?);
    }

    Ok(StoreRecord {
        variant,
        bin_limit,
        offset,
        counts,
        is_collapsed_lo,
        is_collapsed_hi,
    })
}

/// Bounds-checked little-endian reader over a byte slice
struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn is_exhausted(&self) -> bool {
        self.position == self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(SketchError::DeserializationError(format!(
                "unexpected end of input at byte {}",
                self.position
            )));
        }
        let slice = &self.bytes[self.position..self.position + n];
        self.position += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(i32::from_le_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sketch() -> DDSketch {
        let mut sketch = DDSketch::new(0.01).unwrap();
        for i in 1..=50 {
            sketch.add(i as f64).unwrap();
            sketch.add(-(i as f64) / 7.0).unwrap();
        }
        sketch.add(0.0).unwrap();
        sketch
    }

    #[test]
    fn test_record_round_trip() {
        let sketch = sample_sketch();
        let record = sketch.to_record();
        let rebuilt = DDSketch::from_record(&record).unwrap();

        assert_eq!(rebuilt.count(), sketch.count());
        assert_eq!(rebuilt.to_record(), record);
    }

    #[test]
    fn test_bytes_round_trip() {
        let record = sample_sketch().to_record();
        let bytes = record.to_bytes();
        let decoded = SketchRecord::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = sample_sketch().to_record().to_bytes();
        for cut in [0, 1, MIN_RECORD_SIZE - 1, bytes.len() - 1] {
            assert!(
                SketchRecord::from_bytes(&bytes[..cut]).is_err(),
                "accepted truncation to {} bytes",
                cut
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample_sketch().to_record().to_bytes();
        bytes.push(0);
        assert!(SketchRecord::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_unknown_tags_rejected() {
        let mut bytes = sample_sketch().to_record().to_bytes();
        bytes[0] = 9;
        assert!(SketchRecord::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut record = sample_sketch().to_record();
        record.positive_store.counts[0] = -1.0;
        assert!(record.to_sketch().is_err());
    }

    #[test]
    fn test_bogus_extremes_rejected() {
        let mut record = sample_sketch().to_record();
        record.min = 10.0;
        record.max = -10.0;
        assert!(record.to_sketch().is_err());
    }

    #[test]
    fn test_oversized_bin_claim_rejected() {
        let mut bytes = sample_sketch().to_record().to_bytes();
        // Corrupt the positive store's length prefix to claim 2^40 bins.
        let len_pos = (1 + 8 + 8) + 5 * 8 + (1 + 4 + 4 + 1 + 1);
        bytes[len_pos..len_pos + 8].copy_from_slice(&(1u64 << 40).to_le_bytes());
        assert!(SketchRecord::from_bytes(&bytes).is_err());
    }
}
