use std::sync::LazyLock;

use regex::Regex;

use super::query::SearchQuery;

/// Currency symbol or code followed by an amount, e.g. `₹1,299.50`, `Rs. 499`, `usd 20`.
pub static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(₹|Rs\.?|USD|EUR|£|\$)\s?[\d,]+(\.\d{1,2})?").unwrap()
});

/// First currency-tagged amount in `text`, if any.
pub fn find_price(text: &str) -> Option<&str> {
    CURRENCY_RE.find(text).map(|m| m.as_str())
}

/// A block is a candidate when it mentions every query term and carries a price.
pub fn is_candidate(block: &str, query: &SearchQuery) -> bool {
    query.covered_by(block) && CURRENCY_RE.is_match(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> SearchQuery {
        SearchQuery::parse("pixel 8").unwrap()
    }

    #[test]
    fn price_patterns() {
        assert_eq!(find_price("only ₹1,299.50 today"), Some("₹1,299.50"));
        assert_eq!(find_price("Rs. 45,000"), Some("Rs. 45,000"));
        assert_eq!(find_price("rs499"), Some("rs499"));
        assert_eq!(find_price("USD 20.5"), Some("USD 20.5"));
        assert_eq!(find_price("eur 9"), Some("eur 9"));
        assert_eq!(find_price("£3.999"), Some("£3.99"));
        assert_eq!(find_price("$15"), Some("$15"));
        assert_eq!(find_price("4999 only"), None);
        assert_eq!(find_price("Rs. free"), None);
    }

    #[test]
    fn accepts_terms_and_price() {
        assert!(is_candidate("Google Pixel 8 128GB\n₹52,999", &query()));
    }

    #[test]
    fn rejects_missing_term() {
        // "8" would still match inside "128GB"
        assert!(!is_candidate("Google Pixel 7 64GB\n₹52,999", &query()));
        assert!(is_candidate("Google Pixel 7 128GB\n₹52,999", &query()));
        assert!(!is_candidate("Google 8 128GB\n₹52,999", &query()));
    }

    #[test]
    fn rejects_missing_price() {
        assert!(!is_candidate("Google Pixel 8 128GB\n52,999", &query()));
    }

    #[test]
    fn rejects_both_missing() {
        assert!(!is_candidate("Nothing to see", &query()));
    }

    #[test]
    fn every_single_missing_term_rejects() {
        let q = SearchQuery::parse("sony wh 1000xm5 headphones").unwrap();
        let full = "Sony WH 1000XM5 Headphones $299";
        assert!(is_candidate(full, &q));
        for term in q.terms() {
            let block = full.to_lowercase().replace(term.as_str(), "");
            assert!(!is_candidate(&block, &q), "accepted without {term:?}: {block}");
        }
    }
}
