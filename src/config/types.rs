use serde::Deserialize;

/// Configuration for one crawl job
///
/// The host of `base_url` defines the crawl scope: only links on exactly that
/// host are ever enqueued.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URL for the crawl (http or https)
    pub base_url: String,

    /// Maximum link depth from the seed (seed is depth 0)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of crawl workers and the cap on in-flight requests
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Minimum delay between request starts (milliseconds)
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,

    /// Upper bound for random jitter added to the interval (milliseconds)
    #[serde(default)]
    pub jitter_ms: u64,

    /// Optional wall-clock deadline for the whole job (milliseconds);
    /// on expiry the job is cancelled as if by the caller
    #[serde(default)]
    pub deadline_ms: Option<u64>,

    /// User-agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Classification rules (URL patterns and metadata keys)
    #[serde(default)]
    pub rules: ClassifyRules,
}

impl CrawlConfig {
    /// Creates a configuration with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_depth: default_max_depth(),
            parallelism: default_parallelism(),
            request_interval_ms: default_request_interval_ms(),
            jitter_ms: 0,
            deadline_ms: None,
            user_agent: default_user_agent(),
            rules: ClassifyRules::default(),
        }
    }
}

/// Rules driving article-vs-content classification
///
/// The pattern lists are matched against URL path segments; the metadata keys
/// are the page metadata entries checked for an explicit article declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRules {
    /// Path segments that mark a page as a listing (never an article)
    #[serde(default = "default_listing_patterns")]
    pub listing_patterns: Vec<String>,

    /// Path segments that suggest an article page
    #[serde(default = "default_article_patterns")]
    pub article_patterns: Vec<String>,

    /// Metadata keys whose value "article" is an explicit article signal
    #[serde(default = "default_article_meta_keys")]
    pub article_meta_keys: Vec<String>,

    /// CSS selectors counted as structural evidence of an article body
    #[serde(default = "default_evidence_selectors")]
    pub evidence_selectors: Vec<String>,
}

impl Default for ClassifyRules {
    fn default() -> Self {
        Self {
            listing_patterns: default_listing_patterns(),
            article_patterns: default_article_patterns(),
            article_meta_keys: default_article_meta_keys(),
            evidence_selectors: default_evidence_selectors(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_parallelism() -> usize {
    4
}

fn default_request_interval_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!("gleaner/{}", env!("CARGO_PKG_VERSION"))
}

fn default_listing_patterns() -> Vec<String> {
    [
        "category", "tag", "topic", "search", "archive", "author", "index", "feed", "rss",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_article_patterns() -> Vec<String> {
    ["article", "news", "story", "post"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_article_meta_keys() -> Vec<String> {
    ["og:type", "article:type"].iter().map(|s| s.to_string()).collect()
}

fn default_evidence_selectors() -> Vec<String> {
    ["time", "[rel=\"author\"]", ".byline", ".post-meta"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
