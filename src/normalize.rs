//! Text normalization.
//!
//! Turns raw user-supplied text into the list of non-empty text units that is
//! handed to the metrics extractor. Each unit becomes one row of the result
//! table.

use crate::models::Document;

/// Trim `text` and, when `split_by_line` is set, split it on line breaks.
///
/// Units that are empty after trimming (e.g. produced by consecutive line
/// breaks) are dropped. Surviving units keep their original order and their
/// internal whitespace; only a trailing `\r` from CRLF input is removed.
pub fn normalize(text: &str, split_by_line: bool) -> Vec<String> {
    let trimmed = text.trim();

    let units: Vec<&str> = if split_by_line {
        trimmed
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect()
    } else {
        vec![trimmed]
    };

    units
        .into_iter()
        .filter(|unit| !unit.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a [`Document`]'s text.
pub fn normalize_document(document: &Document, split_by_line: bool) -> Vec<String> {
    normalize(&document.text, split_by_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_dropped() {
        assert_eq!(normalize("Hello.\n\nWorld.", true), vec!["Hello.", "World."]);
    }

    #[test]
    fn test_no_split_returns_trimmed_text() {
        assert_eq!(
            normalize("  One line.\nTwo line.  \n", false),
            vec!["One line.\nTwo line."]
        );
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(normalize("", true).is_empty());
        assert!(normalize("", false).is_empty());
        assert!(normalize(" \n\t\n ", true).is_empty());
        assert!(normalize(" \n\t\n ", false).is_empty());
    }

    #[test]
    fn test_k_line_breaks_give_k_plus_one_units() {
        let text = "a\nb\nc\nd";
        let units = normalize(text, true);
        assert_eq!(units, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_whitespace_only_lines_dropped() {
        let units = normalize("first\n   \n\t\nsecond", true);
        assert_eq!(units, vec!["first", "second"]);
    }

    #[test]
    fn test_internal_whitespace_preserved() {
        let units = normalize("one  two\n  indented line", true);
        assert_eq!(units, vec!["one  two", "  indented line"]);
    }

    #[test]
    fn test_crlf_input() {
        let units = normalize("Hello.\r\n\r\nWorld.\r\n", true);
        assert_eq!(units, vec!["Hello.", "World."]);
    }

    #[test]
    fn test_no_unit_is_blank() {
        let samples = [
            "",
            "\n\n\n",
            "x\n\n\ny",
            "  a  \n \n b ",
            "\r\n \r\n",
            "single",
        ];
        for sample in samples {
            for split in [true, false] {
                for unit in normalize(sample, split) {
                    assert!(!unit.trim().is_empty(), "blank unit from {:?}", sample);
                }
            }
        }
    }

    #[test]
    fn test_normalize_document() {
        let doc = Document::labelled("a.txt", "One.\nTwo.");
        assert_eq!(normalize_document(&doc, true), vec!["One.", "Two."]);
        assert_eq!(normalize_document(&doc, false), vec!["One.\nTwo."]);
    }
}
