//! Lazy fixed-size batching over any iterator.

use std::iter::FusedIterator;

/// Returned by [`batched`] when the batch size is zero.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("batch size must be positive, got {0}")]
pub struct BatchSizeError(pub usize);

/// Iterator adapter yielding `Vec`s of up to `size` consecutive items.
///
/// Every batch is full except possibly the last one. The source is pulled
/// only as far as the batch being built.
#[derive(Debug, Clone)]
pub struct Batched<I> {
    iter: I,
    size: usize,
}

/// Group `iter` into batches of `size` items.
///
/// Fails before touching `iter` if `size` is zero.
pub fn batched<I>(iter: I, size: usize) -> Result<Batched<I::IntoIter>, BatchSizeError>
where
    I: IntoIterator,
{
    if size == 0 {
        return Err(BatchSizeError(size));
    }
    Ok(Batched {
        iter: iter.into_iter(),
        size,
    })
}

impl<I: Iterator> Iterator for Batched<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        // Capacity follows what the source yields, not `size`, which may be huge.
        let batch: Vec<I::Item> = self.iter.by_ref().take(self.size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.iter.size_hint();
        (lo.div_ceil(self.size), hi.map(|h| h.div_ceil(self.size)))
    }
}

impl<I: FusedIterator> FusedIterator for Batched<I> {}
