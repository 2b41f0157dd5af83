use url::form_urlencoded;

/// Lowercase search terms derived from the user's product string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// Split on whitespace and lowercase. Returns `None` when no terms remain.
    pub fn parse(input: &str) -> Option<Self> {
        let terms: Vec<String> = input
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(Self { terms })
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// True if every term occurs in `text`, ignoring case.
    pub fn covered_by(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.terms.iter().all(|t| lower.contains(t.as_str()))
    }

    /// Character length of the terms joined by single spaces.
    pub fn joined_len(&self) -> usize {
        let chars: usize = self.terms.iter().map(|t| t.chars().count()).sum();
        chars + self.terms.len().saturating_sub(1)
    }

    pub fn is_term(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.terms.iter().any(|t| *t == lower)
    }

    /// Terms form-encoded for a search URL query string (spaces become `+`).
    pub fn url_param(&self) -> String {
        form_urlencoded::byte_serialize(self.terms.join(" ").as_bytes()).collect()
    }
}
