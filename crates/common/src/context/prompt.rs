//! Generation prompt assembly

use crate::index::ScoredChunk;

const SEPARATOR: &str = "---------------------";

/// Fuse retrieved passages and the enriched query into one prompt.
///
/// Passages appear in ranking order, separated by blank lines.
pub fn build_prompt(enriched_query: &str, chunks: &[ScoredChunk]) -> String {
    let context = chunks
        .iter()
        .map(|c| c.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n{sep}\n{context}\n{sep}\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer: ",
        sep = SEPARATOR,
        context = context,
        query = enriched_query,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            source: "doc.txt".to_string(),
            text: text.to_string(),
            score,
        }
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt(
            "What is MQTT?",
            &[scored("MQTT is a protocol.", 0.9), scored("CoAP uses UDP.", 0.4)],
        );

        assert_eq!(
            prompt,
            "Context information is below.\n\
             ---------------------\n\
             MQTT is a protocol.\n\nCoAP uses UDP.\n\
             ---------------------\n\
             Given the context information and not prior knowledge, answer the query.\n\
             Query: What is MQTT?\n\
             Answer: "
        );
    }

    #[test]
    fn test_prompt_without_passages() {
        let prompt = build_prompt("q", &[]);
        assert!(prompt.contains("---------------------\n\n---------------------"));
        assert!(prompt.ends_with("Query: q\nAnswer: "));
    }

    #[test]
    fn test_enriched_query_kept_whole() {
        let enriched = "Given this conversation context:\nUser: hi\n\nNow answer: Explain CoAP";
        let prompt = build_prompt(enriched, &[scored("CoAP", 1.0)]);
        assert!(prompt.contains(enriched));
    }
}
