//! Salary-string normalization.
//!
//! Turns a free-text salary description from a posting detail page into a
//! monthly estimate and a derived yearly figure. The notation conventions
//! (range word, hourly marker, thousands-gross phrase, project marker) come
//! from [`SalaryRules`].

mod simplify;

use regex::Regex;
use tracing::trace;

use jobwatch_shared::{JobwatchError, Result, SalaryRules};

/// Months in a year, for the yearly figure.
const MONTHS_PER_YEAR: f64 = 12.0;

/// Hourly figures above this are already monthly amounts.
const HOURLY_GUARD: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Monthly and yearly figures for one salary description.
///
/// Both are `Some` or both are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SalaryEstimate {
    pub monthly: Option<f64>,
    pub yearly: Option<f64>,
}

/// How a simplified salary string was read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalaryFlags {
    pub hourly: bool,
    pub thousands_gross: bool,
    pub range: bool,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Salary normalizer bound to one set of notation rules.
#[derive(Debug, Clone)]
pub struct SalaryNormalizer {
    rules: SalaryRules,
    range_re: Regex,
    hourly_re: Regex,
    thousands_marker: String,
    project_marker: String,
}

impl SalaryNormalizer {
    /// Compile the matchers for `rules`.
    pub fn new(rules: SalaryRules) -> Result<Self> {
        let range_re = Regex::new(&format!(
            r"\s+{}\s+",
            regex::escape(&rules.range_word.to_lowercase())
        ))
        .map_err(|e| JobwatchError::config(format!("invalid salary.range_word: {e}")))?;

        let hourly_re = Regex::new(&format!(
            r"\b{}\b",
            regex::escape(&rules.hourly_marker.to_lowercase())
        ))
        .map_err(|e| JobwatchError::config(format!("invalid salary.hourly_marker: {e}")))?;

        if rules.ceiling_divisor <= 0.0 {
            return Err(JobwatchError::config("salary.ceiling_divisor must be positive"));
        }

        Ok(Self {
            thousands_marker: rules.thousands_marker.to_lowercase(),
            project_marker: rules.project_marker.to_lowercase(),
            rules,
            range_re,
            hourly_re,
        })
    }

    /// Estimate monthly pay from `raw`. Blank input yields `None`; text
    /// without digits yields `Some(0.0)`.
    pub fn normalize_monthly(&self, raw: &str) -> Option<f64> {
        if raw.trim().is_empty() {
            return None;
        }

        let simplified = simplify::run_passes(raw, &self.range_re);

        let (figure, range) = match simplified.split_once('-') {
            Some((left, right)) => (
                (simplify::first_integer(left) + simplify::first_integer(right)) / 2.0,
                true,
            ),
            None => (simplify::first_integer(&simplified), false),
        };

        let flags = SalaryFlags {
            hourly: self.hourly_re.is_match(&simplified),
            thousands_gross: simplified.contains(&self.thousands_marker)
                || simplified.trim_end().ends_with("k-"),
            range,
        };

        let mut monthly = if flags.hourly && figure > HOURLY_GUARD {
            figure
        } else if flags.hourly {
            figure * self.rules.hours_per_month
        } else if flags.thousands_gross {
            figure * 1000.0
        } else {
            figure
        };

        if monthly > self.rules.ceiling {
            monthly /= self.rules.ceiling_divisor;
        }

        trace!(raw, %simplified, ?flags, monthly, "normalized salary");
        Some(monthly)
    }

    /// Derive the yearly figure. Project engagements yield `0`.
    pub fn derive_yearly(&self, monthly: Option<f64>, raw: &str) -> Option<f64> {
        let monthly = monthly?;
        if raw.to_lowercase().contains(&self.project_marker) {
            Some(0.0)
        } else {
            Some(monthly * MONTHS_PER_YEAR)
        }
    }

    /// Monthly and yearly figures together; `None` input gives an empty estimate.
    pub fn estimate(&self, raw: Option<&str>) -> SalaryEstimate {
        let Some(raw) = raw else {
            return SalaryEstimate::default();
        };
        let monthly = self.normalize_monthly(raw);
        SalaryEstimate {
            monthly,
            yearly: self.derive_yearly(monthly, raw),
        }
    }
}

impl Default for SalaryNormalizer {
    fn default() -> Self {
        Self::new(SalaryRules::default()).expect("default salary rules compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> SalaryNormalizer {
        SalaryNormalizer::default()
    }

    #[test]
    fn plain_amount() {
        assert_eq!(normalizer().normalize_monthly("2500 eur"), Some(2500.0));
    }

    #[test]
    fn hourly_rate_is_scaled() {
        assert_eq!(normalizer().normalize_monthly("15 eur/uro"), Some(2520.0));
    }

    #[test]
    fn large_hourly_figure_is_already_monthly() {
        assert_eq!(normalizer().normalize_monthly("2500 eur/uro"), Some(2500.0));
    }

    #[test]
    fn euro_is_not_an_hourly_marker() {
        assert_eq!(normalizer().normalize_monthly("900 euro"), Some(900.0));
    }

    #[test]
    fn hyphen_range_is_averaged() {
        assert_eq!(normalizer().normalize_monthly("2000-3000"), Some(2500.0));
    }

    #[test]
    fn word_range_is_averaged() {
        assert_eq!(
            normalizer().normalize_monthly("1.800,00 do 2.200,00 EUR bruto"),
            Some(2000.0)
        );
    }

    #[test]
    fn thousands_gross_range() {
        assert_eq!(normalizer().normalize_monthly("20-25 k bruto"), Some(22500.0));
        assert_eq!(normalizer().normalize_monthly("30k-"), Some(15000.0));
    }

    #[test]
    fn inner_k_hyphen_is_not_thousands_gross() {
        // Only a trailing "k-" marks thousands; "20k-30k" stays as written.
        assert_eq!(normalizer().normalize_monthly("20k-30k"), Some(25.0));
    }

    #[test]
    fn hourly_range() {
        assert_eq!(
            normalizer().normalize_monthly("20 €/uro - 25 €/uro"),
            Some(22.5 * 168.0)
        );
    }

    #[test]
    fn ceiling_divides_stray_fraction_digits() {
        assert_eq!(normalizer().normalize_monthly("250000"), Some(2500.0));
    }

    #[test]
    fn blank_is_absent() {
        assert_eq!(normalizer().normalize_monthly(""), None);
        assert_eq!(normalizer().normalize_monthly("   "), None);
    }

    #[test]
    fn no_digits_is_zero() {
        assert_eq!(normalizer().normalize_monthly("po dogovoru"), Some(0.0));
        assert_eq!(normalizer().normalize_monthly("projekt"), Some(0.0));
        assert_eq!(normalizer().normalize_monthly("-"), Some(0.0));
    }

    #[test]
    fn never_negative() {
        for text in ["-", "- eur", "do", "k-", "eur/uro", "minus"] {
            let value = normalizer().normalize_monthly(text).expect("non-blank");
            assert!(value >= 0.0, "{text} gave {value}");
        }
    }

    #[test]
    fn yearly_is_twelve_months() {
        assert_eq!(
            normalizer().derive_yearly(Some(2500.0), "2500 eur mesečno"),
            Some(30000.0)
        );
    }

    #[test]
    fn yearly_for_project_is_zero() {
        let n = normalizer();
        assert_eq!(n.derive_yearly(Some(0.0), "projekt"), Some(0.0));
        assert_eq!(n.derive_yearly(Some(4000.0), "Projektno delo, 4000 eur"), Some(0.0));
    }

    #[test]
    fn yearly_requires_monthly() {
        assert_eq!(normalizer().derive_yearly(None, "2500 eur"), None);
    }

    #[test]
    fn estimate_keeps_fields_paired() {
        let n = normalizer();
        assert_eq!(n.estimate(None), SalaryEstimate::default());
        assert_eq!(
            n.estimate(Some("")),
            SalaryEstimate {
                monthly: None,
                yearly: None
            }
        );
        assert_eq!(
            n.estimate(Some("2000-3000")),
            SalaryEstimate {
                monthly: Some(2500.0),
                yearly: Some(30000.0)
            }
        );
    }

    #[test]
    fn custom_rules_apply() {
        let rules = SalaryRules {
            hours_per_month: 160.0,
            range_word: "to".into(),
            hourly_marker: "hour".into(),
            ..SalaryRules::default()
        };
        let n = SalaryNormalizer::new(rules).expect("valid rules");
        assert_eq!(n.normalize_monthly("10 eur/hour"), Some(1600.0));
        assert_eq!(n.normalize_monthly("1000 to 2000"), Some(1500.0));
    }

    #[test]
    fn rejects_non_positive_divisor() {
        let rules = SalaryRules {
            ceiling_divisor: 0.0,
            ..SalaryRules::default()
        };
        assert!(SalaryNormalizer::new(rules).is_err());
    }
}
