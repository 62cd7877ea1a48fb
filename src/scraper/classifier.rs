//! Whole-page "is this offered for free" heuristics.
//!
//! Families are checked in a fixed order and the first hit wins:
//! phrases, structured data, currency zero, then price-word proximity.

use regex::Regex;
use std::sync::LazyLock;

const FREE_PHRASES: [&str; 4] = ["100% off", "free course", "enroll for free", "audit"];
const ZERO_CURRENCIES: [&str; 3] = ["$0", "£0", "€0"];

// Patterns run against lowercased text, so keys are matched lowercase.
static IS_PAID_FALSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']is_?paid["']\s*:\s*false"#).expect("hardcoded regex pattern is valid")
});

static AMOUNT_ZERO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']amount["']\s*:\s*0\b"#).expect("hardcoded regex pattern is valid")
});

static PRICE_AMOUNT_ZERO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']price["']\s*:\s*\{[^}]*["']amount["']\s*:\s*0\b"#)
        .expect("hardcoded regex pattern is valid")
});

// `.` excludes newlines, so the 80-char window stays on one line of markup.
static PRICE_NEAR_FREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(price|cost|paid|discount).{0,80}free").expect("hardcoded regex pattern is valid")
});

/// Which family of evidence matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeSignal {
    Phrase(&'static str),
    StructuredData,
    CurrencyZero(&'static str),
    PriceProximity,
}

pub fn detect_free_signal(text: &str) -> Option<FreeSignal> {
    if text.trim().is_empty() {
        return None;
    }
    let t = text.to_lowercase();

    if let Some(p) = FREE_PHRASES.iter().copied().find(|p| t.contains(p)) {
        return Some(FreeSignal::Phrase(p));
    }

    if IS_PAID_FALSE.is_match(&t) || AMOUNT_ZERO.is_match(&t) || PRICE_AMOUNT_ZERO.is_match(&t) {
        return Some(FreeSignal::StructuredData);
    }

    if let Some(c) = ZERO_CURRENCIES.iter().copied().find(|c| t.contains(c)) {
        return Some(FreeSignal::CurrencyZero(c));
    }

    if PRICE_NEAR_FREE.is_match(&t) {
        return Some(FreeSignal::PriceProximity);
    }

    None
}

pub fn is_free(text: &str) -> bool {
    detect_free_signal(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases_any_case() {
        assert!(is_free("Get it now: 100% OFF today"));
        assert!(is_free("A Free Course on Rust"));
        assert!(is_free("ENROLL FOR FREE"));
        assert!(is_free("You can Audit this class"));
        assert_eq!(detect_free_signal("100% off"), Some(FreeSignal::Phrase("100% off")));
    }

    #[test]
    fn test_is_paid_false_variants() {
        assert!(is_free(r#"{"isPaid": false}"#));
        assert!(is_free(r#"{"isPaid":false}"#));
        assert!(is_free(r#"{ "is_paid"  :   false }"#));
        assert!(is_free("{'isPaid': false}"));
        assert!(!is_free(r#"{"isPaid": true}"#));
    }

    #[test]
    fn test_amount_zero() {
        assert!(is_free(r#"{"price": {"amount": 0}}"#));
        assert!(is_free(r#"{"price": {"currency": "USD", "amount": 0, "x": 1}}"#));
        assert!(is_free(r#"{"amount":0}"#));
        assert!(!is_free(r#"{"amount": 19}"#));
        assert!(!is_free(r#"{"amount": 05}"#));
    }

    #[test]
    fn test_currency_zero() {
        assert_eq!(detect_free_signal("now $0"), Some(FreeSignal::CurrencyZero("$0")));
        assert!(is_free("£0 today"));
        assert!(is_free("€0 only"));
    }

    #[test]
    fn test_price_word_near_free() {
        assert_eq!(detect_free_signal("Price: Free"), Some(FreeSignal::PriceProximity));
        assert!(is_free("no cost, totally free"));
        // over-inclusive on purpose
        assert!(is_free("no discount, pay full price, free shipping on orders"));
        let far = format!("price{}free", " ".repeat(81));
        assert!(!is_free(&far));
    }

    #[test]
    fn test_no_signal() {
        assert!(!is_free(""));
        assert!(!is_free("   "));
        assert!(!is_free("Learn Python for $19.99"));
        assert!(!is_free("<html><body><h1>Advanced Rust</h1></body></html>"));
        assert!(!is_free("free shipping")); // no price word before it
    }
}
