//! Pure text classification used by the flush policy and the formatter.

use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s").expect("sentence break regex"));
static SENTENCE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]$").expect("sentence tail regex"));
static BARE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\n)[ \t]*\d+\.$").expect("ordinal regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("numbered regex"));
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*\s").expect("bullet regex"));
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s").expect("header regex"));

/// Shape of the buffered text, in flush precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    SentenceEnd,
    NumberedItem,
    BulletItem,
    Header,
    ParagraphBreak,
    Plain,
}

impl ChunkKind {
    pub fn is_boundary(self) -> bool {
        self != ChunkKind::Plain
    }
}

/// Classify a buffer. First matching rule wins.
///
/// A terminal `.`, `!` or `?` at the very end of the buffer counts as a
/// sentence end, except when the last line is a bare list ordinal such
/// as `"3."`.
pub fn classify(buffer: &str) -> ChunkKind {
    if ends_sentence(buffer) {
        return ChunkKind::SentenceEnd;
    }

    let lead = buffer.trim_start();
    if NUMBERED.is_match(lead) {
        ChunkKind::NumberedItem
    } else if BULLET.is_match(lead) {
        ChunkKind::BulletItem
    } else if HEADER.is_match(lead) {
        ChunkKind::Header
    } else if buffer.contains("\n\n") {
        ChunkKind::ParagraphBreak
    } else {
        ChunkKind::Plain
    }
}

fn ends_sentence(buffer: &str) -> bool {
    if SENTENCE_BREAK.is_match(buffer) {
        return true;
    }
    SENTENCE_TAIL.is_match(buffer) && !BARE_ORDINAL.is_match(buffer)
}

/// Leading block shape of flushed content, used to pick a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Numbered,
    Bullet,
    Header,
    Paragraph,
}

pub fn block_kind(content: &str) -> BlockKind {
    let content = content.trim();
    if NUMBERED.is_match(content) {
        BlockKind::Numbered
    } else if BULLET.is_match(content) {
        BlockKind::Bullet
    } else if HEADER.is_match(content) {
        BlockKind::Header
    } else {
        BlockKind::Paragraph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_end() {
        assert_eq!(classify("Hello world. Next"), ChunkKind::SentenceEnd);
        assert_eq!(classify("Really?"), ChunkKind::SentenceEnd);
        assert_eq!(classify("Hello world."), ChunkKind::SentenceEnd);
        assert_eq!(classify("version 1.5 is out"), ChunkKind::Plain);
    }

    #[test]
    fn test_bare_ordinal_waits_for_item_text() {
        assert_eq!(classify("3."), ChunkKind::Plain);
        assert_eq!(classify("  12."), ChunkKind::Plain);
        assert_eq!(classify("Plan:\n1."), ChunkKind::Plain);
        assert_eq!(classify("Eat oats\n  2."), ChunkKind::Plain);
        assert_eq!(classify("Step 2."), ChunkKind::SentenceEnd);
    }

    #[test]
    fn test_sentence_end_takes_precedence_over_numbered() {
        // "1. " itself is a period followed by whitespace
        assert_eq!(classify("1. Eat oats"), ChunkKind::SentenceEnd);
    }

    #[test]
    fn test_leading_shapes() {
        assert_eq!(classify("* Eat oats"), ChunkKind::BulletItem);
        assert_eq!(classify("  ## Weekly plan"), ChunkKind::Header);
        assert_eq!(classify("####### too deep"), ChunkKind::Plain);
        assert_eq!(classify("#hashtag"), ChunkKind::Plain);
    }

    #[test]
    fn test_paragraph_break() {
        assert_eq!(classify("first part\n\nsecond"), ChunkKind::ParagraphBreak);
        assert_eq!(classify("first part\nsecond"), ChunkKind::Plain);
    }

    #[test]
    fn test_total_over_edge_inputs() {
        assert_eq!(classify(""), ChunkKind::Plain);
        assert_eq!(classify("   "), ChunkKind::Plain);
        assert_eq!(classify("🔥🔥"), ChunkKind::Plain);
    }

    #[test]
    fn test_block_kind() {
        assert_eq!(block_kind("\n1. Eat oats\n"), BlockKind::Numbered);
        assert_eq!(block_kind("* Walk"), BlockKind::Bullet);
        assert_eq!(block_kind("# Plan"), BlockKind::Header);
        assert_eq!(block_kind("Just text."), BlockKind::Paragraph);
        assert_eq!(block_kind(""), BlockKind::Paragraph);
    }
}
