use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{trace, warn};

use super::KeywordSet;
use crate::config::EncodingMode;
use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanStats;
use crate::results::KeywordMatches;

// Constants for file reading
const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Decodes bytes as UTF-8 according to the encoding mode
fn decode_bytes<'a>(
    bytes: &'a [u8],
    path: &Path,
    encoding_mode: EncodingMode,
) -> ScanResult<Cow<'a, str>> {
    match encoding_mode {
        EncodingMode::FailFast => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| ScanError::encoding_error(path, e)),
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            // Owned means at least one invalid sequence was replaced
            if let Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(cow)
        }
    }
}

fn open(path: &Path) -> ScanResult<File> {
    File::open(path).map_err(|e| ScanError::from_io(path, e))
}

/// Searches single files for a fixed set of keywords
#[derive(Debug, Clone, Copy)]
pub struct KeywordScanner<'a> {
    keywords: &'a KeywordSet,
    encoding_mode: EncodingMode,
}

impl<'a> KeywordScanner<'a> {
    pub fn new(keywords: &'a KeywordSet, encoding_mode: EncodingMode) -> Self {
        Self {
            keywords,
            encoding_mode,
        }
    }

    /// Scans `path`, logging and counting a failure instead of returning it.
    ///
    /// An unreadable or undecodable file yields an empty mapping so that the caller can
    /// carry on with the rest of its chunk.
    pub fn scan(&self, path: &Path, stats: &mut ScanStats) -> KeywordMatches {
        match self.scan_file(path) {
            Ok((matches, size)) => {
                stats.record_file(size);
                matches
            }
            Err(e) => {
                warn!("Error reading file {}: {}", path.display(), e);
                stats.record_failure();
                KeywordMatches::new()
            }
        }
    }

    /// Scans `path`, returning each matched keyword mapped to `[path]` and the file size
    pub fn scan_file(&self, path: &Path) -> ScanResult<(KeywordMatches, u64)> {
        trace!("Scanning file: {}", path.display());

        let size = match path.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => return Err(ScanError::from_io(path, e)),
        };

        let matches = if size < SMALL_FILE_THRESHOLD {
            let bytes = std::fs::read(path).map_err(|e| ScanError::from_io(path, e))?;
            self.match_bytes(&bytes, path)?
        } else if size >= LARGE_FILE_THRESHOLD {
            let file = open(path)?;
            // The map is read-only and dropped before this call returns
            let mmap = unsafe { Mmap::map(&file) }.map_err(ScanError::IoError)?;
            self.match_bytes(&mmap, path)?
        } else {
            let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, open(path)?);
            let mut bytes = Vec::with_capacity(size as usize);
            reader.read_to_end(&mut bytes).map_err(ScanError::IoError)?;
            self.match_bytes(&bytes, path)?
        };

        Ok((matches, size))
    }

    fn match_bytes(&self, bytes: &[u8], path: &Path) -> ScanResult<KeywordMatches> {
        let contents = decode_bytes(bytes, path, self.encoding_mode)?;
        Ok(self.match_text(&contents, path))
    }

    /// Case-sensitive substring test of every keyword against `contents`
    pub fn match_text(&self, contents: &str, path: &Path) -> KeywordMatches {
        let mut matches = KeywordMatches::new();
        for keyword in self.keywords.iter().filter(|k| contents.contains(*k)) {
            matches.insert(keyword, path);
        }
        matches
    }
}
