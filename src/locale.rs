use anyhow::{Result, anyhow};
use icu::collator::{Collator, CollatorOptions, Strength};
use icu::locid::{Locale as LanguageTag, locale};
use icu_provider::DataLocale;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Number formatting and text ordering for one display locale.
///
/// Configured explicitly (`display.locale`) so output does not depend on
/// the host environment.
#[derive(Clone)]
pub struct Locale {
    tag: String,
    grouping: &'static str,
    decimal: char,
    collator: Option<Arc<Collator>>,
}

/// Accent-sensitive, case-insensitive collation for `tag`.
fn collator_for(tag: &LanguageTag) -> Result<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    Collator::try_new(&DataLocale::from(tag), options)
        .map_err(|err| anyhow!("No collation data for {tag}: {err:?}"))
}

/// Shortest decimal form of `value`, so `1.005` rounds as written.
fn decimal_from(value: f64) -> Decimal {
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64_retain(value))
        .unwrap_or(Decimal::ZERO)
}

impl Locale {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Two fixed decimals with digit grouping, e.g. `1,234.50` for `en-US`.
    /// Ties round away from zero on the decimal form; non-finite input
    /// renders as zero.
    pub fn format_money(&self, value: f64) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        let rounded = decimal_from(value).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let text = format!("{:.2}", rounded.abs());
        let (digits, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * self.grouping.len());
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push_str(self.grouping);
            }
            grouped.push(ch);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
        format!("{sign}{grouped}{}{fraction}", self.decimal)
    }

    /// Locale collation ignoring case. Strings that collate equal are
    /// ordered by their original text so the result is total.
    pub fn collate(&self, a: &str, b: &str) -> Ordering {
        let primary = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        primary.then_with(|| a.cmp(b))
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale {
            tag: "en-US".to_string(),
            grouping: ",",
            decimal: '.',
            collator: collator_for(&locale!("en-US")).ok().map(Arc::new),
        }
    }
}

impl PartialEq for Locale {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Locale {}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locale")
            .field("tag", &self.tag)
            .field("grouping", &self.grouping)
            .field("decimal", &self.decimal)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (grouping, decimal) = match s {
            "en" | "en-US" | "en-GB" => (",", '.'),
            "de" | "de-DE" | "es" | "es-ES" => (".", ','),
            "fr" | "fr-FR" => ("\u{202f}", ','),
            other => return Err(anyhow!("Unsupported locale: {other}")),
        };
        let tag: LanguageTag = s
            .parse()
            .map_err(|err| anyhow!("Invalid locale tag {s}: {err:?}"))?;
        Ok(Locale {
            tag: s.to_string(),
            grouping,
            decimal,
            collator: Some(Arc::new(collator_for(&tag)?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(tag: &str) -> Locale {
        tag.parse().unwrap()
    }

    #[test]
    fn money_has_two_decimals() {
        let en = Locale::default();
        assert_eq!(en.format_money(5.0), "5.00");
        assert_eq!(en.format_money(0.5), "0.50");
        assert_eq!(en.format_money(0.0), "0.00");
    }

    #[test]
    fn money_groups_thousands() {
        let en = Locale::default();
        assert_eq!(en.format_money(1234.5), "1,234.50");
        assert_eq!(en.format_money(1234567.891), "1,234,567.89");
        assert_eq!(en.format_money(123.0), "123.00");
    }

    #[test]
    fn money_rounds_half_away_from_zero() {
        let en = Locale::default();
        assert_eq!(en.format_money(0.125), "0.13");
        assert_eq!(en.format_money(-0.125), "-0.13");
        assert_eq!(en.format_money(9.999), "10.00");
    }

    #[test]
    fn money_negative_and_non_finite() {
        let en = Locale::default();
        assert_eq!(en.format_money(-1234.5), "-1,234.50");
        assert_eq!(en.format_money(-0.001), "0.00");
        assert_eq!(en.format_money(f64::NAN), "0.00");
        assert_eq!(en.format_money(f64::INFINITY), "0.00");
    }

    #[test]
    fn money_follows_locale_separators() {
        assert_eq!(locale("de-DE").format_money(1234.5), "1.234,50");
        assert_eq!(locale("fr-FR").format_money(1234.5), "1\u{202f}234,50");
    }

    #[test]
    fn unknown_locale_is_rejected() {
        assert!("xx-YY".parse::<Locale>().is_err());
    }

    #[test]
    fn collation_ignores_case() {
        let en = Locale::default();
        assert_eq!(en.collate("apple", "Banana"), Ordering::Less);
        assert_eq!(en.collate("Zed", "alpha"), Ordering::Greater);
        assert_ne!(en.collate("acme", "Acme"), Ordering::Equal);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let en = Locale::default();
        assert_eq!(en.collate("émile", "zed"), Ordering::Less);
        assert_eq!(en.collate("Émile", "Emma"), Ordering::Less);
        assert_eq!(en.collate("emile", "émile"), Ordering::Less);

        let de = locale("de-DE");
        assert_eq!(de.collate("äpfel", "birne"), Ordering::Less);
        assert_eq!(de.collate("o'brien", "oliver"), Ordering::Less);
    }

    #[test]
    fn money_rounds_the_written_decimal() {
        let en = Locale::default();
        assert_eq!(en.format_money(1.005), "1.01");
        assert_eq!(en.format_money(0.285), "0.29");
        assert_eq!(en.format_money(-1.005), "-1.01");
        assert_eq!(en.format_money(1e21), "1,000,000,000,000,000,000,000.00");
    }
}
