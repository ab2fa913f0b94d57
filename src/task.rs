//! A one-shot task pool: run a callable `N` times concurrently, each over
//! a disjoint argument, and join before returning. No work-stealing queue
//! and no long-lived threads - a worker starts, runs its slab start to
//! finish, then exits.

use std::thread;

/// Runs `f` once per element of `args`, each on its own OS thread, and
/// blocks until every worker has finished. `f` must not assume any
/// ordering relative to the other invocations; the caller is responsible
/// for handing out disjoint argument records so no locking is needed
/// inside `f`.
///
/// When `args` has a single element, `f` runs inline on the calling
/// thread instead of spawning - this also makes `run(1)` and a direct
/// call to `f` produce identical results, which the transform engine's
/// determinism property relies on.
pub fn run_sharded<T, F>(args: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    match args {
        [] => {}
        [only] => f(only),
        many => {
            thread::scope(|scope| {
                for arg in many {
                    scope.spawn(|| f(arg));
                }
            });
        }
    }
}

/// Splits `pixel_count` into `task_count` slabs: the first `task_count -
/// 1` slabs each get `floor(pixel_count / task_count)` pixels, and the
/// last absorbs the remainder so the slab sizes sum to `pixel_count`
/// exactly. `task_count` is clamped to `pixel_count` (never zero slabs,
/// never more slabs than pixels).
#[must_use]
pub fn shard_ranges(pixel_count: usize, task_count: usize) -> Vec<(usize, usize)> {
    if pixel_count == 0 {
        return Vec::new();
    }
    let task_count = task_count.max(1).min(pixel_count);
    let base = pixel_count / task_count;
    let mut ranges = Vec::with_capacity(task_count);
    let mut start = 0;
    for i in 0..task_count {
        let len = if i + 1 == task_count { pixel_count - start } else { base };
        ranges.push((start, len));
        start += len;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn shard_ranges_sum_to_pixel_count() {
        for (count, tasks) in [(1_000_003, 1), (1_000_003, 3), (1_000_003, 7), (5, 100), (0, 4)] {
            let ranges = shard_ranges(count, tasks);
            let sum: usize = ranges.iter().map(|(_, len)| *len).sum();
            assert_eq!(count, sum, "count={count} tasks={tasks}");
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].0 + pair[0].1, pair[1].0);
            }
        }
    }

    #[test]
    fn task_count_clamped_to_pixel_count() {
        let ranges = shard_ranges(3, 100);
        assert_eq!(3, ranges.len());
    }

    #[test]
    fn single_task_runs_inline() {
        let mut args = [7i32];
        run_sharded(&mut args, |x| *x *= 2);
        assert_eq!([14], args);
    }

    #[test]
    fn run_sharded_covers_every_argument() {
        let counter = AtomicUsize::new(0);
        let mut args: Vec<usize> = (0..16).collect();
        run_sharded(&mut args, |x| {
            *x *= 10;
            counter.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(16, counter.load(Ordering::Relaxed));
        assert_eq!(vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150], args);
    }
}
