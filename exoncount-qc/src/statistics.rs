use std::fmt::Display;
use std::str::FromStr;

use exoncount_core::models::AlignedRead;
use serde::{Deserialize, Serialize};

use crate::errors::QcError;
use crate::histogram::Histogram;
use crate::introns::CutPoints;

/// The four alignment quality metrics tabulated per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    GapCount,
    MappingQuality,
    WidthBin,
    SecondaryQuality,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::GapCount,
        Metric::MappingQuality,
        Metric::WidthBin,
        Metric::SecondaryQuality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::GapCount => "gap_count",
            Metric::MappingQuality => "mapping_quality",
            Metric::WidthBin => "width_bin",
            Metric::SecondaryQuality => "secondary_quality",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Metric {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| QcError::UnknownMetric(s.to_string()))
    }
}

///
/// Frequency tables for one sample's alignments.
///
/// Every observed read adds exactly one entry to `gap_count`, `mapping_quality`
/// and `width_bin`. `secondary_quality` only sees reads carrying the tag.
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentStatistics {
    pub reads: u64,
    pub gap_count: Histogram<u32>,
    pub mapping_quality: Histogram<u8>,
    pub width_bin: Histogram<usize>,
    pub secondary_quality: Histogram<i64>,
}

impl AlignmentStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, read: &AlignedRead, cut_points: &CutPoints) {
        self.reads += 1;
        self.gap_count.add(read.gap_count);
        self.mapping_quality.add(read.mapping_quality);
        self.width_bin.add(cut_points.bin_of(read.width()));
        if let Some(value) = read.secondary_quality {
            self.secondary_quality.add(value);
        }
    }

    ///
    /// `(value, frequency)` rows for one metric in ascending value order. Width
    /// bins are rendered with their interval label.
    ///
    pub fn frequencies(&self, metric: Metric, cut_points: &CutPoints) -> Vec<(String, u64)> {
        match metric {
            Metric::GapCount => render(&self.gap_count, |v| v.to_string()),
            Metric::MappingQuality => render(&self.mapping_quality, |v| v.to_string()),
            Metric::WidthBin => render(&self.width_bin, |bin| cut_points.label(*bin)),
            Metric::SecondaryQuality => render(&self.secondary_quality, |v| v.to_string()),
        }
    }

    pub fn total(&self, metric: Metric) -> u64 {
        match metric {
            Metric::GapCount => self.gap_count.total(),
            Metric::MappingQuality => self.mapping_quality.total(),
            Metric::WidthBin => self.width_bin.total(),
            Metric::SecondaryQuality => self.secondary_quality.total(),
        }
    }
}

fn render<K: Ord>(hist: &Histogram<K>, fmt: impl Fn(&K) -> String) -> Vec<(String, u64)> {
    hist.iter().map(|(k, n)| (fmt(k), n)).collect()
}
