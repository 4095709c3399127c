use std::path::Path;

use anyhow::{anyhow, Context, Result};
use scraper::Selector;
use serde::Deserialize;

/// Tunables for a harvesting run. Everything here was tuned against observed
/// site structures and is expected to need adjustment per target site, so it
/// all lives in one overridable place instead of inline conditionals.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site origin used to absolutize root-relative comment links.
    pub origin: String,
    /// Path prefix the notice slug is appended to.
    pub notice_path_prefix: String,
    /// Literal phrase stripped from notice identifiers during slug
    /// normalization (matched case-insensitively via lowercasing).
    pub notice_prefix_phrase: String,
    /// Some site layouts drop the hyphen from the slug ("23-01" vs "2301").
    pub strip_slug_hyphens: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Extracted texts shorter than this are generic/disclaimer pages, not
    /// comment bodies. Skipped, never recorded.
    pub min_comment_len: usize,
    /// Texts starting with any of these phrases are site boilerplate.
    pub boilerplate_prefixes: Vec<String>,
    /// Candidate input-CSV column names for the notice identifier, tried in
    /// order. Both variants have been observed in the wild.
    pub id_columns: Vec<String>,
    /// Target sentence count for the per-notice combined summary.
    pub summary_sentences: usize,
    pub selectors: SelectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            origin: "https://www.finra.org".to_string(),
            notice_path_prefix: "/rules-guidance/notices".to_string(),
            notice_prefix_phrase: "regulatory notice".to_string(),
            strip_slug_hyphens: false,
            timeout_secs: 15,
            min_comment_len: 100,
            boilerplate_prefixes: vec!["For the Public".to_string()],
            id_columns: vec!["notice_title".to_string(), "notice_id".to_string()],
            summary_sentences: 3,
            selectors: SelectorConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with a TOML file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            None => Ok(Config::default()),
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                toml::from_str(&raw).with_context(|| format!("parsing config {}", p.display()))
            }
        }
    }

    pub fn notice_url(&self, slug: &str) -> String {
        format!("{}{}/{}", self.origin, self.notice_path_prefix, slug)
    }
}

/// Structural selectors for the two observed comment-list layouts plus the
/// comment-page prose landmark. Site-specific, hence configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub comment_table: String,
    pub table_row: String,
    pub table_cell: String,
    pub anchor: String,
    pub block_list: String,
    pub block_item: String,
    pub block_author: String,
    pub block_date: String,
    pub block_body: String,
    pub main_content: String,
    pub paragraph: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            comment_table: "div.table-responsive table".to_string(),
            table_row: "tbody tr".to_string(),
            table_cell: "td".to_string(),
            anchor: "a".to_string(),
            block_list: ".comment-list".to_string(),
            block_item: ".comment".to_string(),
            block_author: ".comment-author".to_string(),
            block_date: ".comment-date".to_string(),
            block_body: ".comment-body".to_string(),
            main_content: "main".to_string(),
            paragraph: "p".to_string(),
        }
    }
}

/// The selector strings compiled once at startup.
pub struct Selectors {
    pub comment_table: Selector,
    pub table_row: Selector,
    pub table_cell: Selector,
    pub anchor: Selector,
    pub block_list: Selector,
    pub block_item: Selector,
    pub block_author: Selector,
    pub block_date: Selector,
    pub block_body: Selector,
    pub main_content: Selector,
    pub paragraph: Selector,
}

fn compile(src: &str) -> Result<Selector> {
    Selector::parse(src).map_err(|e| anyhow!("invalid selector {src:?}: {e}"))
}

impl Selectors {
    pub fn compile(cfg: &SelectorConfig) -> Result<Selectors> {
        Ok(Selectors {
            comment_table: compile(&cfg.comment_table)?,
            table_row: compile(&cfg.table_row)?,
            table_cell: compile(&cfg.table_cell)?,
            anchor: compile(&cfg.anchor)?,
            block_list: compile(&cfg.block_list)?,
            block_item: compile(&cfg.block_item)?,
            block_author: compile(&cfg.block_author)?,
            block_date: compile(&cfg.block_date)?,
            block_body: compile(&cfg.block_body)?,
            main_content: compile(&cfg.main_content)?,
            paragraph: compile(&cfg.paragraph)?,
        })
    }
}
