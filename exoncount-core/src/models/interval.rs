use num_traits::{PrimInt, Unsigned, identities::zero};
use std::cmp::Ordering;

/// A half-open range `[start, end)` on a single sequence carrying a payload.
///
/// This is the element type of the overlap indexes: the payload is usually a
/// small integer (a gene index), so the sequence name is kept outside, on the
/// index that owns the interval.
#[derive(Eq, Debug, Clone)]
pub struct Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    pub start: I,
    pub end: I,
    pub val: T,
}

impl<I, T> Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    pub fn new(start: I, end: I, val: T) -> Self {
        Interval { start, end, val }
    }

    /// Number of positions covered, zero for empty or inverted intervals.
    #[inline]
    pub fn width(&self) -> I {
        self.end.checked_sub(&self.start).unwrap_or_else(zero::<I>)
    }

    /// Number of positions shared with `other`.
    #[inline]
    pub fn intersect(&self, other: &Interval<I, T>) -> I {
        self.end
            .min(other.end)
            .checked_sub(&self.start.max(other.start))
            .unwrap_or_else(zero::<I>)
    }

    /// True when `[start, end)` shares at least one position with this interval.
    #[inline]
    pub fn overlap(&self, start: I, end: I) -> bool {
        self.start < end && self.end > start
    }
}

impl<I, T> Ord for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        (self.start, self.end).cmp(&(other.start, other.end))
    }
}

impl<I, T> PartialOrd for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// equality ignores the payload so sorting and searching only look at coordinates
impl<I, T> PartialEq for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}
