//! Prompt assembly and citation mapping for the RAG query route.

use query_client::{SourceCitation, SourceType};
use retrieval::SearchHit;
use serde_json::Value;

/// Persona line passed as the system prompt.
pub const SYSTEM_PROMPT: &str = "You are VaultIQ, an AI assistant that helps answer questions \
    about IT management, documentation, and organizational knowledge.";

/// Returned verbatim when the index has nothing relevant.
pub const NO_RESULTS_ANSWER: &str = "I couldn't find any relevant information to answer your \
    question. Please try rephrasing or asking about a different topic.";

const SNIPPET_CHARS: usize = 200;

/// Builds the generation prompt from the retrieved context and the question.
pub fn build_prompt(query: &str, hits: &[SearchHit]) -> String {
    let context_text = hits
        .iter()
        .map(|hit| format!("Source: {} ({})\n{}", hit.title, hit.source, hit.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following context from various sources (Confluence, Slack, Jira, GitHub), \
please answer the user's question accurately and comprehensively.\n\n\
Context:\n{context_text}\n\n\
User Question: {query}\n\n\
Instructions:\n\
- Provide a clear, accurate answer based on the context provided\n\
- If the context doesn't contain enough information, acknowledge this and provide the best answer you can\n\
- Cite sources when making specific claims\n\
- Be concise but thorough\n\
- If there are conflicting pieces of information, acknowledge this\n\n\
Answer:"
    )
}

/// Maps search hits to wire citations. Hits with an unrecognized source tag
/// are dropped rather than failing the whole response.
pub fn map_citations(hits: &[SearchHit]) -> Vec<SourceCitation> {
    hits.iter()
        .filter_map(|hit| {
            let source_type = parse_source(&hit.source)?;
            let url = if hit.source_url.is_empty() {
                format!("Document from {}", hit.source)
            } else {
                hit.source_url.clone()
            };
            Some(SourceCitation {
                title: hit.title.clone(),
                url,
                source_type,
                relevance_score: hit.score,
                snippet: truncate_snippet(&hit.text),
            })
        })
        .collect()
}

fn parse_source(tag: &str) -> Option<SourceType> {
    serde_json::from_value(Value::String(tag.to_string())).ok()
}

fn truncate_snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_CHARS {
        let cut: String = text.chars().take(SNIPPET_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, source: &str, text: &str, score: f32) -> SearchHit {
        SearchHit {
            text: text.to_string(),
            title: title.to_string(),
            source: source.to_string(),
            source_url: "https://example.com/doc".to_string(),
            document_id: "doc-1".to_string(),
            score,
        }
    }

    #[test]
    fn prompt_embeds_every_hit_and_the_question() {
        let hits = vec![
            hit("Runbook", "confluence", "restart the pods", 0.9),
            hit("OPS-1: outage", "jira", "resolved by rollback", 0.8),
        ];
        let prompt = build_prompt("how do I recover?", &hits);
        assert!(prompt.contains("Source: Runbook (confluence)\nrestart the pods"));
        assert!(prompt.contains("Source: OPS-1: outage (jira)\nresolved by rollback"));
        assert!(prompt.contains("User Question: how do I recover?"));
    }

    #[test]
    fn long_snippets_are_truncated_with_ellipsis() {
        let hits = vec![hit("Long", "slack", &"x".repeat(300), 0.5)];
        let citations = map_citations(&hits);
        assert_eq!(citations[0].snippet.chars().count(), 203);
        assert!(citations[0].snippet.ends_with("..."));
    }

    #[test]
    fn short_snippets_are_kept_verbatim() {
        let hits = vec![hit("Short", "slack", "just enough", 0.5)];
        let citations = map_citations(&hits);
        assert_eq!(citations[0].snippet, "just enough");
    }

    #[test]
    fn missing_url_falls_back_to_source_label() {
        let mut h = hit("NoUrl", "github", "text", 0.5);
        h.source_url.clear();
        let citations = map_citations(&[h]);
        assert_eq!(citations[0].url, "Document from github");
    }

    #[test]
    fn unknown_source_tags_are_dropped() {
        let hits = vec![
            hit("Known", "jira", "text", 0.5),
            hit("Unknown", "sharepoint", "text", 0.4),
        ];
        let citations = map_citations(&hits);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].title, "Known");
    }
}
