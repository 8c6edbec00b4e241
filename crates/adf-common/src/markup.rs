//! Symbol markup
//!
//! MGI nomenclature writes superscripted allele pieces with angle brackets:
//! `Pax6<Sey>`. The submission format wants HTML superscript tags instead.

use regex::Regex;
use std::sync::LazyLock;

static SUPERSCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]*)>").expect("valid superscript pattern"));

/// Rewrite every `<...>` span as `<sup>...</sup>`.
///
/// Unmatched single brackets are left as-is.
pub fn symbol_to_html(symbol: &str) -> String {
    SUPERSCRIPT_RE.replace_all(symbol, "<sup>$1</sup>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_superscript() {
        assert_eq!(symbol_to_html("Pax6<Sey>"), "Pax6<sup>Sey</sup>");
    }

    #[test]
    fn test_multiple_occurrences() {
        assert_eq!(
            symbol_to_html("Gt(ROSA)26Sor<tm1(cre)Ab>/Gt(ROSA)26Sor<tm2>"),
            "Gt(ROSA)26Sor<sup>tm1(cre)Ab</sup>/Gt(ROSA)26Sor<sup>tm2</sup>"
        );
    }

    #[test]
    fn test_plain_symbol_unchanged() {
        assert_eq!(symbol_to_html("Kit"), "Kit");
    }

    #[test]
    fn test_unmatched_bracket_left_alone() {
        assert_eq!(symbol_to_html("a<b"), "a<b");
        assert_eq!(symbol_to_html("a>b"), "a>b");
    }

    #[test]
    fn test_empty_brackets() {
        assert_eq!(symbol_to_html("X<>"), "X<sup></sup>");
    }

    #[test]
    fn test_pair_count_preserved() {
        let input = "a<1>b<2>c<3>";
        let out = symbol_to_html(input);
        assert_eq!(out.matches("<sup>").count(), 3);
        assert_eq!(out.matches("</sup>").count(), 3);
        assert_eq!(out, "a<sup>1</sup>b<sup>2</sup>c<sup>3</sup>");
    }
}
