use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::ops::Range;

/// Contiguous half-open index range `[start, end)` over the file list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `files` into at most `pool_size` contiguous chunks covering every index once.
///
/// The worker count is `min(pool_size, files.len())`. Every chunk but the last holds
/// `files.len() / n` entries and the last one runs to the end of the list, absorbing the
/// remainder. An empty list yields no chunks.
pub fn partition<T>(files: &[T], pool_size: NonZeroUsize) -> Vec<Chunk> {
    let len = files.len();
    let workers = pool_size.get().min(len);
    if workers == 0 {
        return Vec::new();
    }

    let chunk_size = len / workers;
    (0..workers)
        .map(|i| Chunk {
            start: i * chunk_size,
            end: if i == workers - 1 {
                len
            } else {
                (i + 1) * chunk_size
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn assert_exact_cover(chunks: &[Chunk], len: usize) {
        let mut next = 0;
        for chunk in chunks {
            assert_eq!(chunk.start, next, "gap or overlap at {:?}", chunk);
            assert!(chunk.end > chunk.start, "empty chunk {:?}", chunk);
            next = chunk.end;
        }
        assert_eq!(next, len);
    }

    #[test]
    fn test_empty_list_yields_no_chunks() {
        let files: Vec<String> = vec![];
        assert!(partition(&files, pool(4)).is_empty());
    }

    #[test]
    fn test_fewer_files_than_workers() {
        let files = vec!["a", "b"];
        let chunks = partition(&files, pool(4));
        assert_eq!(chunks, vec![Chunk { start: 0, end: 1 }, Chunk { start: 1, end: 2 }]);
    }

    #[test]
    fn test_last_chunk_absorbs_remainder() {
        let files: Vec<usize> = (0..10).collect();
        let chunks = partition(&files, pool(4));
        assert_eq!(
            chunks,
            vec![
                Chunk { start: 0, end: 2 },
                Chunk { start: 2, end: 4 },
                Chunk { start: 4, end: 6 },
                Chunk { start: 6, end: 10 },
            ]
        );
        assert_eq!(chunks[3].len(), 4);
    }

    #[test]
    fn test_single_worker_takes_everything() {
        let files: Vec<usize> = (0..7).collect();
        assert_eq!(partition(&files, pool(1)), vec![Chunk { start: 0, end: 7 }]);
    }

    #[test]
    fn test_exact_cover_for_all_sizes() {
        for len in 1..=40 {
            let files: Vec<usize> = (0..len).collect();
            for n in 1..=9 {
                let chunks = partition(&files, pool(n));
                assert!(chunks.len() <= n);
                assert!(chunks.len() <= len);
                assert_eq!(chunks.len(), n.min(len));
                assert_exact_cover(&chunks, len);

                let covered: usize = chunks.iter().map(Chunk::len).sum();
                assert_eq!(covered, len);
            }
        }
    }

    #[test]
    fn test_chunk_range_slices_files() {
        let files = vec!["a", "b", "c", "d", "e"];
        let chunks = partition(&files, pool(2));
        let slices: Vec<&[&str]> = chunks.iter().map(|c| &files[c.range()]).collect();
        assert_eq!(slices, vec![&["a", "b"][..], &["c", "d", "e"][..]]);
    }
}
