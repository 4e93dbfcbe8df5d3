use num_traits::{PrimInt, Unsigned};

pub use exoncount_core::models::Interval;

/// An immutable index answering "which stored intervals overlap `[start, end)`?".
///
/// Implementations are built once and then shared read-only across sample
/// workers, hence the `Send + Sync` bound.
pub trait Overlapper<I, T>: Send + Sync
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized;

    fn find(&self, start: I, end: I) -> Vec<Interval<I, T>>;

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a>;

    /// True if at least one stored interval overlaps `[start, end)`.
    fn any_overlap(&self, start: I, end: I) -> bool {
        self.find_iter(start, end).next().is_some()
    }
}
