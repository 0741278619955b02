//! # Content Metrics
//!
//! Mechanical signals derived from stage content. These are the only inputs
//! the evaluator reads besides the content itself.

use serde::{Deserialize, Serialize};

/// Counts derived from a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentMetrics {
    pub word_count: u32,
    /// Length in UTF-16 code units, the unit browser clients measure text in.
    pub character_count: u32,
    pub paragraph_count: u32,
}

impl ContentMetrics {
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        Self {
            word_count: word_count(content),
            character_count: saturating_u32(content.encode_utf16().count()),
            paragraph_count: paragraph_count(content),
        }
    }
}

/// Count words separated by runs of whitespace.
///
/// Empty and whitespace-only content counts as zero words.
#[must_use]
pub fn word_count(content: &str) -> u32 {
    saturating_u32(content.split_whitespace().count())
}

/// Count paragraphs: non-blank segments separated by one or more blank lines.
#[must_use]
pub fn paragraph_count(content: &str) -> u32 {
    let mut count = 0usize;
    let mut in_paragraph = false;

    for line in content.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            in_paragraph = true;
            count = count.saturating_add(1);
        }
    }

    saturating_u32(count)
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_has_zero_words() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t  "), 0);
    }

    #[test]
    fn words_split_on_whitespace_runs() {
        assert_eq!(word_count("word word word"), 3);
        assert_eq!(word_count("  leading   and\ttrailing \n"), 3);
    }

    #[test]
    fn paragraphs_need_blank_lines() {
        assert_eq!(paragraph_count(""), 0);
        assert_eq!(paragraph_count("one line"), 1);
        assert_eq!(paragraph_count("line one\nline two"), 1);
        assert_eq!(paragraph_count("first\n\nsecond"), 2);
        assert_eq!(paragraph_count("first\n\n\n  \nsecond\n\nthird\n"), 3);
    }

    #[test]
    fn character_count_uses_utf16_units() {
        let metrics = ContentMetrics::from_content("héllo");
        assert_eq!(metrics.character_count, 5);
        assert_eq!(metrics.word_count, 1);
        assert_eq!(metrics.paragraph_count, 1);

        // Astral characters take a surrogate pair.
        assert_eq!(ContentMetrics::from_content("a😀").character_count, 3);
    }
}
