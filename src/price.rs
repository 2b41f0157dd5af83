use std::sync::LazyLock;

use regex::Regex;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d[\d,]*(\.\d{1,2})?").unwrap());

/// Numeric value of a raw price string, for sorting only. `0.0` when nothing parses.
pub fn price_value(raw: &str) -> f64 {
    NUMBER_RE
        .find(raw)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rupees_with_separators() {
        assert_eq!(price_value("₹1,299.50"), 1299.50);
        assert_eq!(price_value("₹1,29,900"), 129900.0);
    }

    #[test]
    fn other_currencies() {
        assert_eq!(price_value("Rs. 45,000"), 45000.0);
        assert_eq!(price_value("$15"), 15.0);
        assert_eq!(price_value("USD 20.5"), 20.5);
    }

    #[test]
    fn sign_is_kept() {
        assert_eq!(price_value("-$5"), 5.0);
        assert_eq!(price_value("$-5.25"), -5.25);
    }

    #[test]
    fn unparsable_is_zero() {
        assert_eq!(price_value("N/A"), 0.0);
        assert_eq!(price_value(""), 0.0);
        assert_eq!(price_value("Rs. ,,,"), 0.0);
    }
}
