//! Plain-text retrieval helpers for agents and the CLI.

use crate::retriever::Retriever;
use docent_core::AppResult;

const SEARCH_SNIPPET_CHARS: usize = 500;
const SUMMARY_SNIPPET_CHARS: usize = 200;

/// Top-`k` chunks, each truncated and followed by its source.
pub async fn search_docs(retriever: &Retriever, query: &str, k: usize) -> AppResult<String> {
    let hits = retriever.retrieve(query, k).await?;
    Ok(hits
        .iter()
        .map(|hit| {
            format!(
                "{} (Source: {})",
                truncate_chars(&hit.text, SEARCH_SNIPPET_CHARS),
                hit.metadata.source
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// The beginning of each of the top-`k` chunks on one line.
pub async fn summarize_docs(retriever: &Retriever, query: &str, k: usize) -> AppResult<String> {
    let hits = retriever.retrieve(query, k).await?;
    let pieces: Vec<String> = hits
        .iter()
        .map(|hit| truncate_chars(&hit.text, SUMMARY_SNIPPET_CHARS))
        .collect();
    Ok(format!("Summary of top docs: {}", pieces.join(" | ")))
}

/// Number of indexed chunks, read from the index rather than estimated.
pub fn count_docs(retriever: &Retriever) -> String {
    format!("Number of documents indexed: {}", retriever.count())
}

/// Truncate to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exactly", 7), "exactly");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        // Multibyte characters are never split
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
    }
}
