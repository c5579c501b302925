//! Fixed-size, overlapping character windows.
//!
//! Sizes are counted in Unicode scalar values, never bytes, so a window
//! never splits a multi-byte character.

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::Chunk;

/// Splits `text` into windows of at most `max_chars` characters where each
/// window re-includes the trailing `overlap` characters of the previous one.
///
/// Fails with a configuration error unless `max_chars > overlap`.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<String>> {
    if max_chars <= overlap {
        return Err(Error::config(format!(
            "max_chars ({max_chars}) must be greater than overlap ({overlap})"
        )));
    }
    // Byte offset of every char boundary, including the end of the text.
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let n = bounds.len() - 1;

    let mut chunks = Vec::with_capacity(expected_chunk_count(n, max_chars, overlap));
    let mut start = 0;
    while start < n {
        let end = (start + max_chars).min(n);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        if end == n {
            break;
        }
        start = end - overlap;
    }
    Ok(chunks)
}

/// Number of windows `chunk_text` produces for a text of `n` characters.
pub fn expected_chunk_count(n: usize, max_chars: usize, overlap: usize) -> usize {
    if n == 0 {
        0
    } else if n <= max_chars || max_chars <= overlap {
        1
    } else {
        (n - overlap).div_ceil(max_chars - overlap)
    }
}

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_chars: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        if max_chars <= overlap {
            return Err(Error::config(format!(
                "max_chars ({max_chars}) must be greater than overlap ({overlap})"
            )));
        }
        Ok(Self { max_chars, overlap })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> { Self::new(settings.max_chars, settings.overlap) }

    pub fn max_chars(&self) -> usize { self.max_chars }

    pub fn overlap(&self) -> usize { self.overlap }

    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // Parameters were validated in `new`, so chunk_text cannot fail here.
        chunk_text(text, self.max_chars, self.overlap)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self { Self { max_chars: 1000, overlap: 200 } }
}

/// Rebuilds the source text from consecutive windows by dropping the
/// overlapping prefix of every window after the first.
pub fn reassemble(chunks: &[String], overlap: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            out.push_str(chunk);
        } else {
            out.extend(chunk.chars().skip(overlap));
        }
    }
    out
}
