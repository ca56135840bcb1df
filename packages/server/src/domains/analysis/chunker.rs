//! Semantic chunker - splits page text into typed segments.
//!
//! Pure and deterministic. Paragraphs too short to matter are dropped, never
//! reported as errors.

use crate::common::{ChunkType, QueryPotential, SemanticChunk};

/// Only paragraphs longer than this become chunks.
const MIN_CHUNK_CHARS: usize = 100;

/// Headings are shorter than this.
const MAX_HEADING_CHARS: usize = 200;

/// Stored chunk content is cut to this many characters.
const MAX_CHUNK_CONTENT_CHARS: usize = 500;

const HEADING_MARKERS: &[&str] = &["How to", "What is", "Why"];

/// Split `content` into semantic chunks, led by a primary-topic chunk for `title`.
pub fn chunk(content: &str, title: &str) -> Vec<SemanticChunk> {
    let mut chunks = Vec::new();

    if !title.is_empty() {
        chunks.push(SemanticChunk {
            chunk_type: ChunkType::PrimaryTopic,
            content: title.to_string(),
            length: title.chars().count(),
            query_potential: QueryPotential::High,
        });
    }

    for paragraph in paragraphs(content) {
        let length = paragraph.chars().count();
        if length <= MIN_CHUNK_CHARS {
            continue;
        }

        let chunk_type = if length < MAX_HEADING_CHARS && looks_like_heading(paragraph) {
            ChunkType::Heading
        } else {
            ChunkType::Section
        };

        chunks.push(SemanticChunk {
            chunk_type,
            content: paragraph.chars().take(MAX_CHUNK_CONTENT_CHARS).collect(),
            length,
            query_potential: QueryPotential::from_length(length),
        });
    }

    chunks
}

/// Trimmed, non-empty paragraphs separated by blank lines.
fn paragraphs(content: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                out.push(content[s..end].trim());
            }
        } else {
            start.get_or_insert(line_start);
            end = offset;
        }
    }
    if let Some(s) = start {
        out.push(content[s..end].trim());
    }

    out
}

fn looks_like_heading(paragraph: &str) -> bool {
    HEADING_MARKERS.iter().any(|m| paragraph.contains(m)) || paragraph.ends_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_content_yields_only_the_title() {
        let chunks = chunk("Short.", "T");

        assert_eq!(
            chunks,
            vec![SemanticChunk {
                chunk_type: ChunkType::PrimaryTopic,
                content: "T".to_string(),
                length: 1,
                query_potential: QueryPotential::High,
            }]
        );
    }

    #[test]
    fn test_empty_title_emits_no_primary_topic() {
        let body = "x".repeat(120);
        let chunks = chunk(&body, "");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Section);
    }

    #[test]
    fn test_title_is_kept_as_given() {
        let chunks = chunk("Short.", "  Padded Title \n");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "  Padded Title \n");
        assert_eq!(chunks[0].length, 16);

        let blank = chunk("Short.", "   ");
        assert_eq!(blank.len(), 1);
        assert_eq!(blank[0].chunk_type, ChunkType::PrimaryTopic);
        assert_eq!(blank[0].length, 3);
    }

    #[test]
    fn test_mid_length_paragraphs_are_dropped() {
        let mid = "m".repeat(80);
        let long = "l".repeat(101);
        let content = format!("{}\n\n{}", mid, long);

        let chunks = chunk(&content, "");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].length, 101);
    }

    #[test]
    fn test_boundary_at_one_hundred_characters() {
        assert!(chunk(&"a".repeat(100), "").is_empty());
        assert_eq!(chunk(&"a".repeat(101), "").len(), 1);
    }

    #[test]
    fn test_heading_detection() {
        let question = format!("How to bake bread at home {}", "a".repeat(100));
        let colon = format!("{} ingredients you need:", "b".repeat(100));
        let long_question = format!("What is sourdough {}", "c".repeat(250));

        let content = [question.as_str(), colon.as_str(), long_question.as_str()].join("\n\n");
        let types: Vec<ChunkType> = chunk(&content, "").into_iter().map(|c| c.chunk_type).collect();

        assert_eq!(
            types,
            vec![ChunkType::Heading, ChunkType::Heading, ChunkType::Section]
        );
    }

    #[test]
    fn test_content_is_truncated_but_length_is_not() {
        let body = "z".repeat(750);
        let chunks = chunk(&body, "");

        assert_eq!(chunks[0].content.chars().count(), 500);
        assert_eq!(chunks[0].length, 750);
        assert_eq!(chunks[0].query_potential, QueryPotential::High);
    }

    #[test]
    fn test_query_potential_uses_untruncated_length() {
        let content = ["a".repeat(120), "b".repeat(200), "c".repeat(400)].join("\n\n");
        let potentials: Vec<QueryPotential> = chunk(&content, "")
            .into_iter()
            .map(|c| c.query_potential)
            .collect();

        assert_eq!(
            potentials,
            vec![QueryPotential::Low, QueryPotential::Medium, QueryPotential::High]
        );
    }

    #[test]
    fn test_splits_on_blank_lines_with_whitespace_and_crlf() {
        let a = "a".repeat(110);
        let b = "b".repeat(110);
        let content = format!("{}\r\n   \r\n{}\nstill b", a, b);

        let chunks = chunk(&content, "");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, a);
        assert!(chunks[1].content.ends_with("still b"));
    }

    #[test]
    fn test_is_deterministic() {
        let content = format!("{}\n\nWhy it matters: {}", "p".repeat(150), "q".repeat(90));
        assert_eq!(chunk(&content, "Title"), chunk(&content, "Title"));
    }
}
