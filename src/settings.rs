use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::parser::query::SearchQuery;
use crate::parser::store::StoreStrategy;

const ENV_PREFIX: &str = "PRICE_SCOUT";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// A site or channel to search, with its store strategy fixed up front.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Source {
    pub label: String,
    /// Search URL; `{query}` is replaced by the terms joined with `+`.
    pub url: String,
    #[serde(default)]
    pub store: StoreStrategy,
}

impl Source {
    pub fn url_for(&self, query: &SearchQuery) -> String {
        self.url.replace("{query}", &query.url_param())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub sources: Vec<Source>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/prices.sqlite"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            sources: vec![
                Source {
                    label: "Amazon India".into(),
                    url: "https://www.amazon.in/s?k={query}".into(),
                    store: StoreStrategy::SiteLabel,
                },
                Source {
                    label: "Flipkart".into(),
                    url: "https://www.flipkart.com/search?q={query}".into(),
                    store: StoreStrategy::SiteLabel,
                },
                Source {
                    label: "Google Shopping".into(),
                    url: "https://www.google.com/search?tbm=shop&q={query}".into(),
                    store: StoreStrategy::Aggregator,
                },
            ],
        }
    }
}

impl Settings {
    /// Built-in defaults, overridden by the TOML file at `path` (if present) and then by
    /// `PRICE_SCOUT_*` environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Failed to load settings from {:?}", path))
    }

    /// Configured source by label, ignoring case.
    pub fn source(&self, label: &str) -> Option<&Source> {
        self.sources
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(label.trim()))
    }
}
