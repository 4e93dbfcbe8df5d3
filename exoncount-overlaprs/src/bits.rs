use num_traits::{PrimInt, Unsigned, identities::zero};

use super::Overlapper;
use exoncount_core::models::Interval;

/// A Binary Interval Search index for overlap queries on one sequence.
///
/// From the journal article: <https://academic.oup.com/bioinformatics/article/29/1/1/273289>
///
/// Intervals are kept sorted by start. A query binary-searches to the first
/// interval that could reach it (its start minus the longest stored interval)
/// and scans forward until intervals begin past the query end.
///
/// # Examples
///
/// ```
/// use exoncount_overlaprs::{Bits, Overlapper, Interval};
///
/// let exons = vec![
///     Interval { start: 100u32, end: 200, val: "G1" },
///     Interval { start: 300, end: 400, val: "G1" },
///     Interval { start: 380, end: 450, val: "G2" },
/// ];
///
/// let bits = Bits::build(exons);
///
/// let hits: Vec<&str> = bits.find_iter(390, 395).map(|iv| iv.val).collect();
/// assert_eq!(hits, vec!["G1", "G2"]);
/// assert!(bits.find(250, 260).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Bits<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    intervals: Vec<Interval<I, T>>,
    max_len: I,
}

impl<I, T> Overlapper<I, T> for Bits<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Build the index. The intervals are sorted by `(start, end)` on the way in.
    fn build(mut intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized,
    {
        intervals.sort();
        let max_len = intervals
            .iter()
            .map(|iv| iv.width())
            .max()
            .unwrap_or_else(zero::<I>);

        Bits { intervals, max_len }
    }

    #[inline]
    fn find(&self, start: I, stop: I) -> Vec<Interval<I, T>> {
        self.iter_find(start, stop).cloned().collect()
    }

    fn find_iter<'a>(
        &'a self,
        start: I,
        stop: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        Box::new(self.iter_find(start, stop))
    }
}

impl<I, T> Bits<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Number of intervals in the index.
    #[inline]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// All intervals, sorted by start.
    #[inline]
    pub fn intervals(&self) -> &[Interval<I, T>] {
        &self.intervals
    }

    /// Overlaps of `[start, stop)` as a concrete iterator type, for callers that
    /// want to avoid the boxed iterator of [`Overlapper::find_iter`].
    #[inline]
    pub fn iter_find(&self, start: I, stop: I) -> IterFind<'_, I, T> {
        IterFind {
            inner: self,
            off: Self::lower_bound(
                start.checked_sub(&self.max_len).unwrap_or_else(zero::<I>),
                &self.intervals,
            ),
            start,
            stop,
        }
    }

    /// First index whose interval start is not below `start`.
    ///
    /// Callers subtract the longest interval length from the query start before
    /// calling, otherwise overlapping intervals that begin earlier are missed.
    #[inline]
    fn lower_bound(start: I, intervals: &[Interval<I, T>]) -> usize {
        let mut size = intervals.len();
        let mut low = 0;

        while size > 0 {
            let half = size / 2;
            let other_half = size - half;
            let probe = low + half;
            let other_low = low + other_half;
            let v = &intervals[probe];
            size = half;
            low = if v.start < start { other_low } else { low }
        }
        low
    }
}

/// Iterator over the intervals of a [`Bits`] that overlap a query range.
#[derive(Debug)]
pub struct IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    inner: &'a Bits<I, T>,
    off: usize,
    start: I,
    stop: I,
}

impl<'a, I, T> Iterator for IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    type Item = &'a Interval<I, T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while self.off < self.inner.intervals.len() {
            let interval = &self.inner.intervals[self.off];
            self.off += 1;
            if interval.overlap(self.start, self.stop) {
                return Some(interval);
            } else if interval.start >= self.stop {
                break;
            }
        }
        None
    }
}
