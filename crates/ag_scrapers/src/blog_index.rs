//! Finds the pages of a site that list its blog/news articles.

use crate::articles::{fetch_article, find_individual_article_links};
use crate::fetch::Fetcher;
use crate::html::{self, CLASSIFIER_NOISE};
use crate::logging::Logger;
use crate::urls::{
    canonicalize, domain_rule_excludes, first_segment_allowed, has_binary_extension,
    has_excluded_keyword, is_internal, is_shallow_index_path, locale_allowed, matched_keyword,
    site_root, strip_locale, COMMON_INDEX_PATHS, INDEX_TOKENS, MAX_INDEX_CANDIDATES,
};
use ag_core::{client_key, IndexDecision, PageAnalysis, PageType, SiteState};
use ag_inference::classify::{Classifier, MAX_LINK_ENTRIES};
use regex::Regex;
use scraper::Html;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use url::Url;

/// Articles sampled from a `RESOURCES_MIX` page to look for dates.
const RESOURCES_MIX_SAMPLE: usize = 5;

const FEED_SUFFIXES: &[&str] = &["feed", "rss", "rss.xml"];

fn sitemap_loc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<loc>(.*?)</loc>").expect("valid loc regex"))
}

/// Outcome of index discovery for one site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDiscovery {
    /// Accepted final URLs, unique by canonical form.
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    pub accepted_details: Vec<IndexDecision>,
    pub rejected_details: Vec<IndexDecision>,
    pub feed_urls: Vec<String>,
}

/// Links pulled from a homepage.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HomepageLinks {
    /// Keyword-matched section roots, in document order.
    pub sections: Vec<String>,
    /// `"anchor text -> url"` lines for the LLM shortlist.
    pub entries: Vec<String>,
}

/// Filters homepage anchors down to internal, allowed-locale content links.
pub fn scan_homepage(body: &str, base: &Url) -> HomepageLinks {
    let document = Html::parse_document(body);
    let mut links = HomepageLinks::default();

    for anchor in html::anchors(&document, base) {
        let url = anchor.url.as_str();
        if !locale_allowed(anchor.url.path())
            || !is_internal(base, &anchor.url)
            || has_binary_extension(url)
            || has_excluded_keyword(url)
        {
            continue;
        }

        if links.entries.len() < MAX_LINK_ENTRIES {
            let text = if anchor.text.is_empty() { "-" } else { anchor.text.as_str() };
            links.entries.push(format!("{} -> {}", text, url));
        }

        if matched_keyword(url, &anchor.text).is_some() && is_shallow_index_path(anchor.url.path()) {
            links.sections.push(url.to_string());
        }
    }
    links
}

/// Section roots listed in a sitemap body.
pub fn sitemap_sections(body: &str) -> Vec<String> {
    sitemap_loc_regex()
        .captures_iter(body)
        .map(|caps| caps[1].trim().to_string())
        .filter(|loc| {
            Url::parse(loc)
                .map(|u| is_shallow_index_path(u.path()))
                .unwrap_or(false)
        })
        .collect()
}

/// A section feed: after dropping `feed`/`rss` segments exactly one index token remains.
fn is_section_feed(url: &Url) -> bool {
    let segments: Vec<&str> = strip_locale(url.path())
        .into_iter()
        .filter(|s| !FEED_SUFFIXES.contains(s))
        .collect();
    matches!(segments.as_slice(), [one] if INDEX_TOKENS.contains(&one.to_lowercase().as_str()))
}

#[derive(Default)]
struct Candidates {
    seen: HashSet<String>,
    priority: Vec<String>,
    other: Vec<String>,
}

impl Candidates {
    fn push(&mut self, url: String, priority: bool) {
        if self.seen.insert(url.clone()) {
            if priority {
                self.priority.push(url);
            } else {
                self.other.push(url);
            }
        }
    }

    /// Blog sections go first.
    fn push_ranked(&mut self, url: String) {
        let priority = url.to_lowercase().contains("blog");
        self.push(url, priority);
    }

    fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn into_ordered(self) -> Vec<String> {
        let mut ordered: Vec<String> = self.priority.into_iter().chain(self.other).collect();
        ordered.truncate(MAX_INDEX_CANDIDATES);
        ordered
    }
}

#[derive(Debug, Clone)]
pub struct BlogIndexProcessor {
    fetcher: Fetcher,
    classifier: Classifier,
}

impl BlogIndexProcessor {
    pub fn new(fetcher: Fetcher, classifier: Classifier) -> Self {
        Self { fetcher, classifier }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Ordered candidate index URLs: homepage heuristics and the LLM shortlist,
    /// the sitemap when those found nothing, then the common section paths.
    pub async fn gather_candidates(&self, base: &Url, logger: &Logger) -> Vec<String> {
        let mut candidates = Candidates::default();

        let homepage = match self.fetcher.get_html(base.as_str()).await {
            Some(body) => scan_homepage(&body, base),
            None => {
                logger.warn("Homepage could not be fetched");
                HomepageLinks::default()
            }
        };
        for url in homepage.sections {
            candidates.push_ranked(url);
        }

        if !homepage.entries.is_empty() {
            for answer in self
                .classifier
                .shortlist_index_links(base.as_str(), &homepage.entries)
                .await
            {
                let Ok(url) = base.join(&answer) else {
                    continue;
                };
                if is_internal(base, &url) && is_shallow_index_path(url.path()) {
                    candidates.push_ranked(url.to_string());
                }
            }
        }

        if candidates.is_empty() {
            let found = self.discover_from_sitemap(base).await;
            logger.info(&format!("Sitemap fallback found {} sections", found.len()));
            for url in found {
                candidates.push_ranked(url);
            }
        }

        let root = site_root(base);
        for path in COMMON_INDEX_PATHS {
            let url = format!("{}{}", root, path);
            if has_excluded_keyword(&url) || has_binary_extension(&url) || !locale_allowed(path) {
                continue;
            }
            candidates.push(url, true);
        }

        candidates.into_ordered()
    }

    /// Section roots from `/sitemap.xml` and `/sitemap_index.xml`.
    pub async fn discover_from_sitemap(&self, base: &Url) -> Vec<String> {
        let root = site_root(base);
        let mut found = Vec::new();
        for path in ["/sitemap.xml", "/sitemap_index.xml"] {
            if let Some(body) = self.fetcher.get_html(&format!("{}{}", root, path)).await {
                for url in sitemap_sections(&body) {
                    if !found.contains(&url) {
                        found.push(url);
                    }
                }
            }
        }
        found
    }

    /// Section feeds (`/blog/feed`, `/news/rss`, ...) answering a `HEAD` probe.
    ///
    /// Site-wide feeds such as `/feed` are never probed.
    pub async fn discover_feeds(&self, base: &Url) -> Vec<String> {
        let root = site_root(base);
        let paths = INDEX_TOKENS
            .iter()
            .flat_map(|token| [format!("/{}/feed", token), format!("/{}/rss", token)]);

        let mut feeds = Vec::new();
        for path in paths {
            let candidate = format!("{}{}", root, path);
            let Ok(url) = Url::parse(&candidate) else {
                continue;
            };
            if is_section_feed(&url) && self.fetcher.probe(&candidate).await {
                feeds.push(candidate);
            }
        }
        feeds
    }

    /// Page type of `url` judged from its cleaned text.
    pub async fn analyze_page_type(&self, url: &str) -> PageAnalysis {
        let Some(body) = self.fetcher.get_html(url).await else {
            return PageAnalysis::other("empty_or_fetch_error");
        };
        let text = {
            let document = Html::parse_document(&body);
            html::visible_text(&document, CLASSIFIER_NOISE)
        };
        if text.trim().is_empty() {
            return PageAnalysis::other("empty_or_fetch_error");
        }
        self.classifier.classify_page(&text).await
    }

    /// Whether the first article linked from `url` carries a publish date.
    async fn sample_has_date(&self, url: &str, excluded: &HashSet<String>) -> bool {
        let links = find_individual_article_links(&self.fetcher, url, excluded, RESOURCES_MIX_SAMPLE).await;
        let Some(first) = links.first() else {
            return false;
        };
        fetch_article(&self.fetcher, first, None)
            .await
            .map_or(false, |article| article.publish_date.is_some())
    }

    /// Collects, validates and classifies candidate index pages for `base_url`.
    pub async fn find_blog_index_urls(&self, base_url: &str) -> IndexDiscovery {
        let logger = Logger::new().with_prefix(format!("[{}]", base_url));
        let mut discovery = IndexDiscovery::default();
        let base = match Url::parse(base_url) {
            Ok(base) => base,
            Err(e) => {
                logger.error(&format!("Invalid base URL: {}", e));
                return discovery;
            }
        };

        let candidates = self.gather_candidates(&base, &logger).await;
        logger.info(&format!(
            "Validating {} candidate index URLs (priority first)",
            candidates.len()
        ));

        let mut accepted_canonical = HashSet::new();
        for (i, candidate) in candidates.iter().enumerate() {
            if (i + 1) % 10 == 0 {
                logger.info(&format!("Processed {}/{} candidates", i + 1, candidates.len()));
            }
            let Ok(parsed) = Url::parse(candidate) else {
                continue;
            };
            if !first_segment_allowed(parsed.path()) {
                continue;
            }
            if domain_rule_excludes(&parsed) {
                discovery.rejected.push(candidate.clone());
                discovery.rejected_details.push(IndexDecision {
                    url: candidate.clone(),
                    analysis: PageAnalysis::other("domain_rule_excluded"),
                });
                continue;
            }

            let Some(final_url) = self.fetcher.resolve_final_url(candidate).await else {
                logger.debug(&format!("{} does not resolve", candidate));
                continue;
            };

            let mut analysis = self.analyze_page_type(&final_url).await;
            let accepted = match analysis.page_type {
                PageType::BlogIndex => true,
                PageType::ResourcesMix => {
                    let rejected: HashSet<String> = discovery.rejected.iter().cloned().collect();
                    let dated = self.sample_has_date(&final_url, &rejected).await;
                    if !dated {
                        analysis = PageAnalysis::new(PageType::ResourcesMix, "resources_mix_without_dates");
                    }
                    dated
                }
                _ => false,
            };

            if accepted {
                let canonical = canonicalize(&final_url);
                if accepted_canonical.insert(canonical.clone()) {
                    discovery.accepted.push(final_url);
                    discovery.accepted_details.push(IndexDecision { url: canonical, analysis });
                }
            } else {
                if !discovery.rejected.contains(candidate) {
                    discovery.rejected.push(candidate.clone());
                }
                discovery.rejected_details.push(IndexDecision {
                    url: candidate.clone(),
                    analysis,
                });
            }
        }

        discovery.feed_urls = self.discover_feeds(&base).await;
        discovery
    }

    /// Replaces the client's entry in `state` with a fresh discovery, keeping
    /// its date selector and article cursor. Returns the number of accepted indexes.
    pub async fn process_website(
        &self,
        base_url: &str,
        client_name: &str,
        state: &mut BTreeMap<String, SiteState>,
    ) -> usize {
        let key = client_key(client_name, base_url);
        let discovery = self.find_blog_index_urls(base_url).await;
        let previous = state.remove(&key).unwrap_or_default();

        let accepted = discovery.accepted.len();
        state.insert(
            key.clone(),
            SiteState {
                blog_index_urls: discovery.accepted.iter().map(|u| canonicalize(u)).collect(),
                rejected_index_urls: discovery.rejected,
                blog_index_details: discovery.accepted_details,
                rejected_index_details: discovery.rejected_details,
                feed_urls: discovery.feed_urls,
                date_selector: previous.date_selector,
                latest_article_date: previous.latest_article_date,
            },
        );
        tracing::info!("Selected {} blog index URLs for {}", accepted, key);
        accepted
    }
}
