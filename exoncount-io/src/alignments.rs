//! Streaming alignment input over BAM and SAM files via noodles.
//!
//! Records are decoded through the format-agnostic `sam::alignment::Record` trait
//! and reduced to an [`AlignedRead`]: reference-aligned blocks split at `N`
//! operations, mapping quality, flags and two optional integer tags. Unmapped
//! records are skipped.
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use exoncount_core::models::{AlignedRead, ReadFlags};
use noodles::bam;
use noodles::bgzf;
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;
use noodles::sam::alignment::record::data::field::{Tag, Value};

use crate::consts::{BAM_EXTENSION, HIT_COUNT_TAG, SAM_EXTENSION};
use crate::error::{IoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentFormat {
    Bam,
    Sam,
}

impl AlignmentFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            BAM_EXTENSION => Ok(AlignmentFormat::Bam),
            SAM_EXTENSION => Ok(AlignmentFormat::Sam),
            _ => Err(IoError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Parse a two-character SAM tag such as `AS`.
pub fn parse_tag(tag: &str) -> Result<Tag> {
    match tag.as_bytes() {
        [a, b] => Ok(Tag::from([*a, *b])),
        _ => Err(IoError::InvalidTag(tag.to_string())),
    }
}

enum Inner {
    Bam(bam::io::Reader<bgzf::Reader<File>>),
    Sam(sam::io::Reader<BufReader<File>>),
}

///
/// Streams the mapped records of one alignment file as [`AlignedRead`]s.
///
/// Only one record is held in memory at a time. The iterator yields an error
/// for the first record that cannot be decoded; callers are expected to stop
/// there.
///
pub struct AlignmentReader {
    inner: Inner,
    header: sam::Header,
    reference_names: Vec<Arc<str>>,
    secondary_tag: Tag,
    hit_count_tag: Tag,
    bam_record: bam::Record,
    sam_record: sam::Record,
    records_read: u64,
}

impl AlignmentReader {
    ///
    /// Open `path` and read its header.
    ///
    /// # Arguments
    ///
    /// - path: a `.bam` or `.sam` file
    /// - secondary_tag: the integer tag tabulated as secondary quality (e.g. `AS`)
    ///
    pub fn open(path: &Path, secondary_tag: Tag) -> Result<Self> {
        let format = AlignmentFormat::from_path(path)?;
        let file = File::open(path)?;

        let (inner, header) = match format {
            AlignmentFormat::Bam => {
                let mut reader = bam::io::reader::Builder::default().build_from_reader(file);
                let header = reader.read_header().map_err(|source| IoError::Header {
                    path: path.to_path_buf(),
                    source,
                })?;
                (Inner::Bam(reader), header)
            }
            AlignmentFormat::Sam => {
                let mut reader = sam::io::Reader::new(BufReader::new(file));
                let header = reader.read_header().map_err(|source| IoError::Header {
                    path: path.to_path_buf(),
                    source,
                })?;
                (Inner::Sam(reader), header)
            }
        };

        let reference_names: Vec<Arc<str>> = header
            .reference_sequences()
            .keys()
            .map(|name| Arc::from(name.to_string()))
            .collect();

        Ok(AlignmentReader {
            inner,
            header,
            reference_names,
            secondary_tag,
            hit_count_tag: parse_tag(HIT_COUNT_TAG)?,
            bam_record: bam::Record::default(),
            sam_record: sam::Record::default(),
            records_read: 0,
        })
    }

    fn read_next(&mut self) -> Result<Option<AlignedRead>> {
        loop {
            let n = match &mut self.inner {
                Inner::Bam(r) => r.read_record(&mut self.bam_record),
                Inner::Sam(r) => r.read_record(&mut self.sam_record),
            }
            .map_err(|e| IoError::Alignment {
                record: self.records_read + 1,
                message: e.to_string(),
            })?;

            if n == 0 {
                return Ok(None);
            }
            self.records_read += 1;

            let record: &dyn sam::alignment::Record = match &self.inner {
                Inner::Bam(_) => &self.bam_record,
                Inner::Sam(_) => &self.sam_record,
            };

            let decoded = decode_alignment_record(
                record,
                &self.header,
                &self.reference_names,
                &self.secondary_tag,
                &self.hit_count_tag,
            )
            .map_err(|e| IoError::Alignment {
                record: self.records_read,
                message: e.to_string(),
            })?;

            if let Some(read) = decoded {
                return Ok(Some(read));
            }
        }
    }
}

impl Iterator for AlignmentReader {
    type Item = Result<AlignedRead>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

///
/// Reference sequence names declared in the header of an alignment file,
/// without reading any records.
///
pub fn sequence_names(path: &Path) -> Result<Vec<String>> {
    let format = AlignmentFormat::from_path(path)?;
    let file = File::open(path)?;
    let header_err = |source: io::Error| IoError::Header {
        path: PathBuf::from(path),
        source,
    };

    let header = match format {
        AlignmentFormat::Bam => bam::io::reader::Builder::default()
            .build_from_reader(file)
            .read_header()
            .map_err(header_err)?,
        AlignmentFormat::Sam => sam::io::Reader::new(BufReader::new(file))
            .read_header()
            .map_err(header_err)?,
    };

    Ok(header
        .reference_sequences()
        .keys()
        .map(|name| name.to_string())
        .collect())
}

// `None` for unmapped records
fn decode_alignment_record(
    rec: &dyn sam::alignment::Record,
    header: &sam::Header,
    reference_names: &[Arc<str>],
    secondary_tag: &Tag,
    hit_count_tag: &Tag,
) -> io::Result<Option<AlignedRead>> {
    let flags = rec.flags()?;
    if flags.is_unmapped() {
        return Ok(None);
    }

    let seqname = match rec.reference_sequence_id(header) {
        Some(id) => {
            let id = id?;
            reference_names.get(id).cloned().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("reference sequence id {} is not in the header", id),
                )
            })?
        }
        None => return Ok(None),
    };

    let start = match rec.alignment_start() {
        Some(pos) => to_u32(pos?.get() - 1)?,
        None => return Ok(None),
    };

    let mapq = match rec.mapping_quality() {
        Some(q) => q?.get(),
        None => 255,
    };

    let mut blocks = Vec::new();
    let mut gap_count = 0u32;
    let mut block_start = start;
    let mut cursor = start;
    for op in rec.cigar().iter() {
        let op = op?;
        let len = to_u32(op.len())?;
        match op.kind() {
            CigarKind::Match
            | CigarKind::SequenceMatch
            | CigarKind::SequenceMismatch
            | CigarKind::Deletion => cursor = checked_advance(cursor, len)?,
            CigarKind::Skip => {
                if cursor > block_start {
                    blocks.push((block_start, cursor));
                }
                gap_count += 1;
                cursor = checked_advance(cursor, len)?;
                block_start = cursor;
            }
            CigarKind::Insertion | CigarKind::SoftClip | CigarKind::HardClip | CigarKind::Pad => {}
        }
    }
    if cursor > block_start || blocks.is_empty() {
        blocks.push((block_start, cursor));
    }

    let data = rec.data();
    let secondary_quality = match data.get(secondary_tag) {
        Some(value) => integer_value(&value?),
        None => None,
    };
    let hits = match data.get(hit_count_tag) {
        Some(value) => integer_value(&value?).and_then(|n| u32::try_from(n).ok()),
        None => None,
    };

    let mut read = AlignedRead::new(seqname, blocks)
        .with_mapping_quality(mapq)
        .with_secondary_quality(secondary_quality)
        .with_hits(hits)
        .with_flags(ReadFlags {
            secondary: flags.is_secondary(),
            supplementary: flags.is_supplementary(),
            duplicate: flags.is_duplicate(),
        });
    read.gap_count = gap_count;

    Ok(Some(read))
}

// non-integer tag values are treated as absent
fn integer_value(value: &Value<'_>) -> Option<i64> {
    match value {
        Value::Int8(n) => Some(i64::from(*n)),
        Value::UInt8(n) => Some(i64::from(*n)),
        Value::Int16(n) => Some(i64::from(*n)),
        Value::UInt16(n) => Some(i64::from(*n)),
        Value::Int32(n) => Some(i64::from(*n)),
        Value::UInt32(n) => Some(i64::from(*n)),
        _ => None,
    }
}

fn to_u32(n: usize) -> io::Result<u32> {
    u32::try_from(n).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("coordinate {} does not fit in 32 bits", n),
        )
    })
}

fn checked_advance(pos: u32, len: u32) -> io::Result<u32> {
    pos.checked_add(len).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "alignment end overflows 32 bits")
    })
}
