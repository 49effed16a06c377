//! Text simplification passes applied before a salary string is classified.
//!
//! Each pass is a function `&str -> String` applied in sequence. The output
//! keeps digits, letters, whitespace and symbols, with separators removed
//! and the range word replaced by a hyphen.

use std::sync::LazyLock;

use regex::Regex;

/// Run all simplification passes on a raw salary description.
pub(crate) fn run_passes(raw: &str, range_re: &Regex) -> String {
    let mut result = raw.to_lowercase();

    result = canonicalize_range(&result, range_re);
    result = strip_fractions(&result);
    result = strip_grouping(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Range word to hyphen
// ---------------------------------------------------------------------------

/// "1500 do 2000" becomes "1500-2000".
fn canonicalize_range(text: &str, range_re: &Regex) -> String {
    range_re.replace_all(text, "-").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Decimal fractions
// ---------------------------------------------------------------------------

/// Drop a separator followed by exactly two digits ("1.500,00 eur" keeps
/// "1.500 eur"). Three-digit groups such as ".500" are left for pass 3.
fn strip_fractions(text: &str) -> String {
    static FRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[.,]\d{2}(\D|$)").expect("valid regex")
    });

    FRACTION_RE.replace_all(text, "$1").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Grouping separators
// ---------------------------------------------------------------------------

fn strip_grouping(text: &str) -> String {
    text.chars().filter(|c| *c != '.' && *c != ',').collect()
}

/// First run of ASCII digits in `text`, or 0 when there is none.
pub(crate) fn first_integer(text: &str) -> f64 {
    static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\d+").expect("valid regex")
    });

    DIGITS_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_re() -> Regex {
        Regex::new(r"\s+do\s+").expect("valid regex")
    }

    #[test]
    fn range_word_becomes_hyphen() {
        assert_eq!(run_passes("1500 DO 2000 EUR", &range_re()), "1500-2000 eur");
    }

    #[test]
    fn range_word_needs_surrounding_space() {
        // "dogovor" must not be split.
        assert_eq!(run_passes("po dogovoru", &range_re()), "po dogovoru");
    }

    #[test]
    fn fractions_and_grouping_removed() {
        assert_eq!(run_passes("1.500,00 € bruto", &range_re()), "1500 € bruto");
        assert_eq!(run_passes("2.500 eur", &range_re()), "2500 eur");
        assert_eq!(run_passes("2000.00", &range_re()), "2000");
        assert_eq!(run_passes("15,50 eur/uro", &range_re()), "15 eur/uro");
    }

    #[test]
    fn three_digit_group_is_not_a_fraction() {
        assert_eq!(strip_fractions("1.500.000"), "1.500.000");
    }

    #[test]
    fn first_integer_defaults_to_zero() {
        assert_eq!(first_integer("neto 2300 eur"), 2300.0);
        assert_eq!(first_integer("  "), 0.0);
        assert_eq!(first_integer("po dogovoru"), 0.0);
    }
}
