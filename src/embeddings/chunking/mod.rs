#[cfg(test)]
mod tests;

use tracing::debug;

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Separator between paragraphs, and between documents in the concatenated corpus
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split document text into retrievable chunks of at most `chunk_size` characters.
///
/// Paragraphs (separated by a blank line) that fit are kept verbatim. Longer
/// paragraphs are cut into consecutive `chunk_size`-character slices with no
/// regard for word or sentence boundaries. Whitespace-only pieces are dropped
/// and source order is preserved.
#[inline]
pub fn split_into_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();

    for paragraph in text.split(PARAGRAPH_SEPARATOR) {
        if paragraph.chars().count() <= chunk_size {
            chunks.push(paragraph.to_string());
        } else {
            chunks.extend(slice_paragraph(paragraph, chunk_size));
        }
    }

    chunks.retain(|chunk| !chunk.trim().is_empty());

    debug!(
        "Split {} chars into {} chunks (chunk size {})",
        text.len(),
        chunks.len(),
        chunk_size
    );

    chunks
}

/// Cut a paragraph at fixed character offsets; the last slice may be shorter
fn slice_paragraph(paragraph: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|slice| slice.iter().collect())
        .collect()
}

/// Character length, the unit chunk and context budgets are measured in
#[inline]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
