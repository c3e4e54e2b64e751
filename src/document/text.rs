//! Plain-text extraction and UTF-16 offset utilities.
//!
//! The checker reports offsets into the string produced by [`extract`], and
//! the host editor counts document positions in UTF-16 code units. The
//! extraction rules below keep both in step: every document position maps to
//! exactly one code unit of the extracted text.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A tag, or a run of text between tags.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(<[^>]+>)|([^<]+)").unwrap());

/// The only entities the host renderer emits for typed text that must be
/// folded back before checking.
static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&amp;|&nbsp;").unwrap());

/// Tags that open a line of the document.
const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
    "pre",
];

/// Convert rendered editor markup to the plain text sent to the checker.
///
/// - The first block-opening tag is dropped; the first line has no newline
///   before it.
/// - Every other block-opening tag becomes one space, standing in for the
///   newline that ends the previous line.
/// - Every `<img>` becomes one space, standing in for the embed.
/// - Every other tag, `<br>` included, contributes nothing.
/// - Text is copied verbatim except `&amp;` becomes `&` and `&nbsp;` becomes
///   a space.
///
/// No trimming or whitespace collapsing happens.
///
/// Any block kind counts, not only `<p>`: headings, list items and
/// paragraphs with attributes each end a document line too, and treating
/// them alike keeps every extracted offset equal to its document position.
pub fn extract(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut seen_first_block = false;

    for token in TOKEN.captures_iter(html) {
        if let Some(tag) = token.get(1) {
            let name = tag_name(tag.as_str());
            if name == "img" {
                output.push(' ');
            } else if BLOCK_TAGS.contains(&name.as_str()) {
                if seen_first_block {
                    output.push(' ');
                }
                seen_first_block = true;
            }
        } else if let Some(text) = token.get(2) {
            output.push_str(&ENTITY.replace_all(text.as_str(), |entity: &Captures| {
                match &entity[0] {
                    "&amp;" => "&",
                    _ => " ",
                }
            }));
        }
    }

    output
}

/// Lowercased element name of an opening tag; empty for closing tags,
/// comments and declarations.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 offset into a byte offset of `text`.
///
/// Returns None past the end of the text or inside a surrogate pair.
pub fn utf16_to_byte(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (i, c) in text.char_indices() {
        if units == offset {
            return Some(i);
        }
        if units > offset {
            return None;
        }
        units += c.len_utf16();
    }
    (units == offset).then_some(text.len())
}

/// The substring covered by a UTF-16 range.
pub fn utf16_slice(text: &str, range: Range<usize>) -> Option<&str> {
    let start = utf16_to_byte(text, range.start)?;
    let end = utf16_to_byte(text, range.end)?;
    text.get(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_paragraph() {
        assert_eq!(extract("<p>Helo wrld</p>"), "Helo wrld");
    }

    #[test]
    fn empty_content() {
        assert_eq!(extract(""), "");
        assert_eq!(extract("<p><br></p>"), "");
    }

    #[test]
    fn later_paragraphs_become_one_space() {
        assert_eq!(extract("<p>one</p><p>two</p><p>three</p>"), "one two three");
    }

    #[test]
    fn empty_lines_keep_offsets_aligned() {
        // "a\n\nb\n": b sits at offset 3 in the document
        let text = extract("<p>a</p><p><br></p><p>b</p>");
        assert_eq!(text, "a  b");
        assert_eq!(text.find('b'), Some(3));
    }

    #[test]
    fn only_first_block_is_dropped() {
        assert_eq!(extract("<h1>Title</h1><p>body</p>"), "Title body");
        assert_eq!(extract("<p class=\"ql-align-center\">a</p><p>b</p>"), "a b");
    }

    #[test]
    fn images_become_one_space() {
        assert_eq!(extract("<p>a<img src=\"x.png\">b</p>"), "a b");
    }

    #[test]
    fn inline_tags_contribute_nothing() {
        assert_eq!(
            extract("<p><strong>Helo</strong> <quill-lt-match data-offset=\"5\">wrld</quill-lt-match></p>"),
            "Helo wrld"
        );
    }

    #[test]
    fn unescapes_amp_and_nbsp_only() {
        assert_eq!(extract("<p>a &amp; b&nbsp;c &lt;d&gt;</p>"), "a & b c &lt;d&gt;");
        assert_eq!(extract("<p>&amp;&nbsp;&amp;</p>"), "& &");
    }

    #[test]
    fn escaped_entity_text_is_not_unescaped_twice() {
        // the user typed the literal text "&nbsp;"
        assert_eq!(extract("<p>&amp;nbsp;</p>"), "&nbsp;");
    }

    #[test]
    fn whitespace_is_preserved() {
        assert_eq!(extract("<p>  two  spaces  </p>"), "  two  spaces  ");
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = "<p>Helo &amp; wrld</p><p><br></p><p>x<img src=\"y\"></p>";
        assert_eq!(extract(html), extract(html));
    }

    #[test]
    fn utf16_offsets() {
        let text = "a😀b";
        assert_eq!(utf16_len(text), 4);
        assert_eq!(utf16_to_byte(text, 0), Some(0));
        assert_eq!(utf16_to_byte(text, 1), Some(1));
        assert_eq!(utf16_to_byte(text, 2), None);
        assert_eq!(utf16_to_byte(text, 3), Some(5));
        assert_eq!(utf16_to_byte(text, 4), Some(6));
        assert_eq!(utf16_to_byte(text, 5), None);
        assert_eq!(utf16_slice(text, 1..3), Some("😀"));
    }
}
