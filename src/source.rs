use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::info;

use crate::settings::Settings;

static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());

/// Elements whose text never renders.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template"];

/// Yields one raw text block per structural page element, in document order.
pub trait TextBlockSource {
    fn text_blocks(&self) -> Vec<String>;
}

/// A parsed page whose blocks are the visible text of each `div`.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }
}

impl TextBlockSource for HtmlPage {
    /// Nested divs each produce their own block, outer before inner.
    fn text_blocks(&self) -> Vec<String> {
        self.document.select(&DIV).map(visible_text).collect()
    }
}

/// Descendant text nodes, trimmed, empties dropped, one per line.
fn visible_text(element: ElementRef) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| HIDDEN.contains(&e.name())))
                .unwrap_or(false);
            let trimmed = text.trim();
            (!hidden && !trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(&settings.user_agent)
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Fetch a page's HTML with a single GET.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let start = Instant::now();
    let html = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to fetch {}", url))?
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;
    info!(
        "Fetched {} ({} bytes in {}ms)",
        url,
        html.len(),
        start.elapsed().as_millis()
    );
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_block_per_div_outer_first() {
        let page = HtmlPage::parse(
            "<body><div>Phone <b>X</b><div>₹100</div></div><p>outside</p><div> </div></body>",
        );
        assert_eq!(page.text_blocks(), vec!["Phone\nX\n₹100", "₹100", ""]);
    }

    #[test]
    fn script_and_style_excluded() {
        let page = HtmlPage::parse(
            "<div>Deal<script>var price = '$1';</script>\
             <style>b{}</style><noscript>enable js</noscript></div>",
        );
        assert_eq!(page.text_blocks(), vec!["Deal"]);
    }

    #[test]
    fn entities_decoded_and_lines_trimmed() {
        let page = HtmlPage::parse("<div>\n   Croma &amp; more   \n<span>  ₹5  </span></div>");
        assert_eq!(page.text_blocks(), vec!["Croma & more\n₹5"]);
    }

    #[test]
    fn fixture_blocks_in_document_order() {
        let html = std::fs::read_to_string("tests/fixtures/google_shopping.html").unwrap();
        let blocks = HtmlPage::parse(&html).text_blocks();
        assert!(blocks[0].starts_with("Price: under"));
        assert_eq!(
            blocks[1],
            "Google Pixel 8 128GB Obsidian\n₹52,999\nCroma & more"
        );
        assert_eq!(blocks[2], "Google Pixel 8 128GB Obsidian");
        assert!(blocks.iter().all(|b| !b.contains("var pixel8")));
    }
}
