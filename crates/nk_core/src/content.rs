//! Plain-text article bodies.
//!
//! Editors write bodies one block per line: `## ` starts a subheading,
//! `> ` starts a quote, anything else is a paragraph. Blank lines are
//! dropped.

use crate::types::ContentBlock;

const SUBHEADING_PREFIX: &str = "## ";
const QUOTE_PREFIX: &str = "> ";

pub fn parse_full_content(text: &str) -> Vec<ContentBlock> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> ContentBlock {
    if let Some(rest) = line.strip_prefix(SUBHEADING_PREFIX) {
        ContentBlock::Subheading(rest.trim().to_string())
    } else if let Some(rest) = line.strip_prefix(QUOTE_PREFIX) {
        ContentBlock::Quote(rest.trim().to_string())
    } else {
        ContentBlock::Paragraph(line.trim().to_string())
    }
}

/// Inverse of [`parse_full_content`], used when an article is edited as text.
pub fn render_full_content(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            ContentBlock::Paragraph(s) => s.clone(),
            ContentBlock::Subheading(s) => format!("{}{}", SUBHEADING_PREFIX, s),
            ContentBlock::Quote(s) => format!("{}{}", QUOTE_PREFIX, s),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
