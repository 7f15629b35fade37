//! Splits a frame range into nearly-equal contiguous chunks, one per
//! worker.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameChunk {
    pub start: usize,
    pub end: usize,
}

impl FrameChunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

pub fn worker_count(override_count: Option<usize>) -> usize {
    override_count.unwrap_or_else(|| (num_cpus::get().saturating_sub(1)).max(1))
}

/// `total_frames` split into `worker_count` contiguous chunks; chunk `i`
/// starts at `i * ceil(total/worker_count)`. Trailing empty chunks are
/// dropped so short renders don't spawn idle workers.
pub fn split_frames(total_frames: usize, worker_count: usize) -> Vec<FrameChunk> {
    if total_frames == 0 || worker_count == 0 {
        return vec![];
    }
    let chunk_size = total_frames.div_ceil(worker_count);
    (0..worker_count)
        .map(|i| {
            let start = i * chunk_size;
            let end = (start + chunk_size).min(total_frames);
            FrameChunk { start, end }
        })
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_covers_every_frame_exactly_once() {
        let chunks = split_frames(100, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], FrameChunk { start: 0, end: 25 });
        assert_eq!(chunks[3], FrameChunk { start: 75, end: 100 });
    }

    #[test]
    fn uneven_split_has_no_gaps_or_overlaps() {
        let chunks = split_frames(101, 4);
        let mut expected_next = 0;
        for c in &chunks {
            assert_eq!(c.start, expected_next);
            expected_next = c.end;
        }
        assert_eq!(expected_next, 101);
    }

    #[test]
    fn fewer_frames_than_workers_drops_empty_chunks() {
        let chunks = split_frames(2, 8);
        assert_eq!(chunks.len(), 2);
        for c in &chunks {
            assert_eq!(c.len(), 1);
        }
    }

    #[test]
    fn zero_frames_yields_no_chunks() {
        assert!(split_frames(0, 4).is_empty());
    }

    #[test]
    fn worker_count_defaults_to_cpus_minus_one() {
        let wc = worker_count(None);
        assert!(wc >= 1);
    }

    #[test]
    fn worker_count_override_is_honored() {
        assert_eq!(worker_count(Some(3)), 3);
    }
}
