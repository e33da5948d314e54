
use tracing::debug;

use crate::embeddings::chunking::char_len;
use crate::search::ranking::ScoredChunk;

/// Upper bound on the assembled context, in characters
pub const DEFAULT_MAX_CONTEXT_LENGTH: usize = 30_000;

const CHUNK_SEPARATOR: &str = "\n\n";

/// Concatenate ranked chunks, best first, into a single context string.
///
/// Each chunk is followed by a blank line. Assembly stops at the first chunk
/// that would push the total past `max_chars`, so the result never exceeds it
/// and no chunk is ever truncated.
#[inline]
pub fn assemble_context(chunks: &[ScoredChunk<'_>], max_chars: usize) -> String {
    let mut context = String::new();
    let mut length = 0;
    let separator_len = char_len(CHUNK_SEPARATOR);

    for chunk in chunks {
        let addition = char_len(chunk.text) + separator_len;
        if length + addition > max_chars {
            debug!(
                "Context full at {} chars; skipping chunk {} and the rest",
                length, chunk.index
            );
            break;
        }
        context.push_str(chunk.text);
        context.push_str(CHUNK_SEPARATOR);
        length += addition;
    }

    context
}
