use serde::Deserialize;

use super::query::SearchQuery;

pub const UNKNOWN_STORE: &str = "Unknown";

/// Words that describe the listing rather than the seller.
const STOPWORDS: &[&str] = &["refurbished", "new", "sealed", "version", "get", "buy"];

/// How a source's records get their store label. Chosen per source in config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStrategy {
    /// Shopping-search results list many sellers; infer the seller from the text after the price.
    Aggregator,
    /// The site sells directly; use the first word of its label.
    #[default]
    SiteLabel,
}

impl StoreStrategy {
    pub fn resolve(&self, label: &str, block: &str, price: &str, query: &SearchQuery) -> String {
        let store = match self {
            StoreStrategy::Aggregator => store_after_price(block, price, query),
            StoreStrategy::SiteLabel => label.split_whitespace().next().map(str::to_string),
        };
        store.unwrap_or_else(|| UNKNOWN_STORE.to_string())
    }
}

fn store_after_price(block: &str, price: &str, query: &SearchQuery) -> Option<String> {
    let after = block.split_once(price).map_or(block, |(_, rest)| rest);
    let words: Vec<&str> = after.split_whitespace().collect();

    // "Seller & 3 more": the word before a standalone ampersand that has one.
    if let Some(i) = (1..words.len()).find(|&i| words[i] == "&") {
        return Some(words[i - 1].trim().to_string());
    }

    generic_store(&words, query)
}

/// Domain-looking word first, else up to two words starting with a letter.
fn generic_store(words: &[&str], query: &SearchQuery) -> Option<String> {
    let candidates: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| !query.is_term(w) && !STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    if let Some(domain) = candidates.iter().find(|w| {
        let lower = w.to_lowercase();
        lower.contains(".in") || lower.contains(".com")
    }) {
        return Some(domain.trim().to_string());
    }

    let named: Vec<&str> = candidates
        .iter()
        .copied()
        .filter(|w| w.chars().next().is_some_and(char::is_alphabetic))
        .take(2)
        .collect();
    if named.is_empty() {
        None
    } else {
        Some(named.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> SearchQuery {
        SearchQuery::parse(s).unwrap()
    }

    fn aggregator(block: &str, price: &str, query: &str) -> String {
        StoreStrategy::Aggregator.resolve("Google Shopping", block, price, &q(query))
    }

    #[test]
    fn ampersand_picks_preceding_word() {
        let block = "Sony Headphones 4999 TechMart & 2 more sells fast";
        assert_eq!(aggregator(block, "4999", "headphones"), "TechMart");
    }

    #[test]
    fn ampersand_right_after_price_does_not_count() {
        // Only text after the price is scanned, and a leading "&" has no predecessor,
        // so this falls through to the two-word fallback. Sellers listed this way
        // have always come back as "TechMart sells", not "TechMart".
        let block = "Sony Headphones 4999 & TechMart sells fast";
        assert_eq!(aggregator(block, "4999", "headphones"), "TechMart sells");
    }

    #[test]
    fn ampersand_before_seller_name() {
        let block = "Pixel 8 128GB\n₹52,999\nCroma & more\nFree delivery";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), "Croma");
    }

    #[test]
    fn leading_ampersand_is_skipped() {
        let block = "Pixel 8 ₹52,999 & Croma & more";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), "Croma");
    }

    #[test]
    fn only_leading_ampersand_falls_through() {
        let block = "Pixel 8 ₹52,999 & cartzone.in";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), "cartzone.in");
    }

    #[test]
    fn domain_fallback() {
        let block = "Pixel 8 ₹52,999 Sold by cartzone.in today";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), "cartzone.in");
    }

    #[test]
    fn domain_match_is_case_insensitive() {
        let block = "$99 NEW Deals.COM";
        assert_eq!(aggregator(block, "$99", "kettle"), "Deals.COM");
    }

    #[test]
    fn up_to_two_alphabetic_words() {
        let block = "Pixel 8 ₹52,999 Refurbished 4.5 Reliance Digital Store";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), "Reliance Digital");
    }

    #[test]
    fn single_alphabetic_word() {
        let block = "₹52,999 Pixel 8 Poorvika 4.2";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), "Poorvika");
    }

    #[test]
    fn query_terms_and_stopwords_removed() {
        let block = "₹52,999 Buy New PIXEL Sealed version Get Vijay Sales";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), "Vijay Sales");
    }

    #[test]
    fn unknown_when_nothing_left() {
        let block = "Pixel 8 ₹52,999 new sealed 8 (120) 4.5/5";
        assert_eq!(aggregator(block, "₹52,999", "pixel 8"), UNKNOWN_STORE);
        assert_eq!(aggregator("Pixel 8 ₹52,999", "₹52,999", "pixel 8"), UNKNOWN_STORE);
    }

    #[test]
    fn site_label_first_word() {
        let s = StoreStrategy::SiteLabel;
        assert_eq!(s.resolve("Amazon India", "x", "$1", &q("x")), "Amazon");
        assert_eq!(s.resolve("Flipkart", "x", "$1", &q("x")), "Flipkart");
        assert_eq!(s.resolve("  ", "x", "$1", &q("x")), UNKNOWN_STORE);
    }

    #[test]
    fn strategy_from_config_name() {
        #[derive(Deserialize)]
        struct Row {
            store: StoreStrategy,
        }
        let row: Row = serde_json::from_str(r#"{"store":"aggregator"}"#).unwrap();
        assert_eq!(row.store, StoreStrategy::Aggregator);
        let row: Row = serde_json::from_str(r#"{"store":"site_label"}"#).unwrap();
        assert_eq!(row.store, StoreStrategy::SiteLabel);
    }
}
