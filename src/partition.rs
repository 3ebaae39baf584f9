//! Row-band partitioning for the fill workers.

use core::num::NonZeroUsize;
use core::ops::Range;

/// Contiguous rows owned by one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowBand {
    pub worker: usize,
    pub rows: Range<usize>,
}

impl RowBand {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split `height` rows into exactly `workers` bands.
///
/// Worker `i` owns `[i*height/workers, (i+1)*height/workers)` (floor
/// division). The bands are ordered, disjoint and cover `0..height`; when
/// `height < workers` some of them are empty.
pub fn row_bands(height: usize, workers: NonZeroUsize) -> impl Iterator<Item = RowBand> {
    let n = workers.get() as u128;
    let h = height as u128;
    // i*height/n <= height, so the narrowing casts cannot truncate.
    let bound = move |i: u128| (i * h / n) as usize;
    (0..workers.get()).map(move |worker| RowBand {
        worker,
        rows: bound(worker as u128)..bound(worker as u128 + 1),
    })
}
