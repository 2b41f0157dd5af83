use super::filter::find_price;
use super::query::SearchQuery;

/// Name and price lines picked out of one block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classified {
    pub name: Option<String>,
    pub price: Option<String>,
}

impl Classified {
    /// Both fields present, or nothing.
    pub fn complete(self) -> Option<(String, String)> {
        Some((self.name?, self.price?))
    }
}

/// Single pass over trimmed, non-empty lines.
///
/// Price is the first currency match on the first line that has one. Name is the *last*
/// line mentioning every query term that is longer than the bare query plus 3 chars;
/// each qualifying line overwrites the previous one.
pub fn classify_lines(block: &str, query: &SearchQuery) -> Classified {
    let min_name_len = query.joined_len() + 3;
    let mut out = Classified::default();

    for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if out.price.is_none() {
            out.price = find_price(line).map(str::to_string);
        }
        if query.covered_by(line) && line.chars().count() > min_name_len {
            out.name = Some(line.to_string());
        }
    }

    out
}
