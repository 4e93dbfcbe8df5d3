use std::sync::Arc;

/// The subset of SAM flags the read filter looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadFlags {
    pub secondary: bool,
    pub supplementary: bool,
    pub duplicate: bool,
}

///
/// One mapped alignment, reduced to what counting and QC need.
///
/// `blocks` are the reference-aligned pieces of the read as half-open `[start, end)`
/// intervals in ascending order; a spliced read has one block per exon-like piece.
/// Which sample a read came from is tracked by the worker reading it.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRead {
    pub seqname: Arc<str>,
    pub blocks: Vec<(u32, u32)>,
    pub mapping_quality: u8,
    pub gap_count: u32,
    pub secondary_quality: Option<i64>,
    pub hits: Option<u32>,
    pub flags: ReadFlags,
}

impl AlignedRead {
    /// A read with default metadata (MAPQ 255, no tags). The gap count is
    /// derived from the number of blocks.
    pub fn new(seqname: impl Into<Arc<str>>, blocks: Vec<(u32, u32)>) -> Self {
        let gap_count = blocks.len().saturating_sub(1) as u32;
        AlignedRead {
            seqname: seqname.into(),
            blocks,
            mapping_quality: 255,
            gap_count,
            secondary_quality: None,
            hits: None,
            flags: ReadFlags::default(),
        }
    }

    pub fn with_mapping_quality(mut self, mapq: u8) -> Self {
        self.mapping_quality = mapq;
        self
    }

    pub fn with_secondary_quality(mut self, value: Option<i64>) -> Self {
        self.secondary_quality = value;
        self
    }

    pub fn with_hits(mut self, hits: Option<u32>) -> Self {
        self.hits = hits;
        self
    }

    pub fn with_flags(mut self, flags: ReadFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Leftmost aligned reference position.
    pub fn start(&self) -> u32 {
        self.blocks.first().map(|b| b.0).unwrap_or(0)
    }

    /// One past the rightmost aligned reference position.
    pub fn end(&self) -> u32 {
        self.blocks.last().map(|b| b.1).unwrap_or(0)
    }

    /// Reference span of the alignment, gaps included.
    pub fn width(&self) -> u32 {
        self.end().saturating_sub(self.start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(vec![(150, 180)], 0, 30)]
    #[case(vec![(100, 150), (300, 350)], 1, 250)]
    #[case(vec![(0, 10), (20, 30), (90, 100)], 2, 100)]
    fn test_span_and_gaps(
        #[case] blocks: Vec<(u32, u32)>,
        #[case] gaps: u32,
        #[case] width: u32,
    ) {
        let read = AlignedRead::new("Chr1", blocks);
        assert_eq!(read.gap_count, gaps);
        assert_eq!(read.width(), width);
    }
}
