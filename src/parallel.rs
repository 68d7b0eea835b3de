//! Helpers for submitting contiguous chunks of a slice to an async worker
//! concurrently, while limiting the number of chunks in flight.

use futures::{stream, StreamExt};
use std::future::Future;
use std::num::NonZeroUsize;
use std::ops::Range;

/// Result of the worker for one chunk.
#[derive(Debug)]
pub struct ChunkOutcome<E> {
    /// Position of the chunk in the submitted slice.
    pub range: Range<usize>,
    pub result: Result<(), E>,
}

impl<E> ChunkOutcome<E> {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered, non-overlapping ranges covering `0..len`. All ranges have length
/// `chunk_size` except the last one, which may be shorter.
pub fn chunk_ranges(len: usize, chunk_size: NonZeroUsize) -> Vec<Range<usize>> {
    let chunk_size = chunk_size.get();
    (0..len)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(len))
        .collect()
}

/// Call `worker` on every chunk of `items`, with at most `n_workers` chunks
/// in flight at once (`0` means one per CPU).
///
/// Returns once every chunk is done. Outcomes are in chunk order, whatever
/// the order in which the workers completed. A worker error only marks its
/// own chunk as failed, while a panicking worker is not caught.
pub async fn chunk_parallel<'a, T, F, Fut, E>(
    items: &'a [T],
    chunk_size: NonZeroUsize,
    n_workers: usize,
    worker: F,
) -> Vec<ChunkOutcome<E>>
where
    F: Fn(&'a [T]) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let n_workers = if n_workers == 0 {
        num_cpus::get()
    } else {
        n_workers
    };
    let ranges = chunk_ranges(items.len(), chunk_size);
    log::debug!(
        "Submitting {} items in {} chunks to {} workers",
        items.len(),
        ranges.len(),
        n_workers
    );
    let worker = &worker;
    stream::iter(ranges)
        .map(|range| async move {
            let result = worker(&items[range.clone()]).await;
            ChunkOutcome { range, result }
        })
        .buffered(n_workers)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use rstest::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    fn nonzero(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[rstest]
    #[case(47, 15, vec![0..15, 15..30, 30..45, 45..47])]
    #[case(30, 15, vec![0..15, 15..30])]
    #[case(3, 15, vec![0..3])]
    #[case(0, 15, vec![])]
    fn test_chunk_ranges(
        #[case] len: usize,
        #[case] chunk_size: usize,
        #[case] expected: Vec<Range<usize>>,
    ) {
        assert_eq!(chunk_ranges(len, nonzero(chunk_size)), expected);
    }

    #[tokio::test]
    async fn test_outcomes_are_in_chunk_order() -> anyhow::Result<()> {
        let items: Vec<u64> = (0..10).collect();
        // earlier chunks sleep longer, so they complete last
        let execution = chunk_parallel(&items, nonzero(3), 4, |chunk| async move {
            sleep(Duration::from_millis(40 - chunk[0] * 4)).await;
            if chunk[0] == 3 {
                Err("nope")
            } else {
                Ok(())
            }
        });
        let outcomes = timeout(Duration::from_secs(1), execution)
            .await
            .context("Test timed out, the function is probably frozen.")?;
        let ranges: Vec<_> = outcomes.iter().map(|o| o.range.clone()).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..9, 9..10]);
        let success: Vec<_> = outcomes.iter().map(ChunkOutcome::success).collect();
        assert_eq!(success, vec![true, false, true, true]);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() -> anyhow::Result<()> {
        let items = vec![(); 20];
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (in_flight, peak) = (&in_flight, &peak);
        let execution = chunk_parallel(&items, nonzero(2), 3, move |_| async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(5)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, ()>(())
        });
        let outcomes = timeout(Duration::from_secs(1), execution)
            .await
            .context("Test timed out, the function is probably frozen.")?;
        assert_eq!(outcomes.len(), 10);
        assert!(outcomes.iter().all(ChunkOutcome::success));
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) > 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_default_workers() {
        let items = vec![1, 2, 3];
        let outcomes = chunk_parallel(&items, nonzero(1), 0, |_| async { Ok::<_, ()>(()) }).await;
        assert_eq!(outcomes.len(), 3);
    }
}
