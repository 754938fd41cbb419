//! Article link discovery on index pages and single-article extraction.

use crate::dates::extract_publish_date;
use crate::fetch::Fetcher;
use crate::html::{self, CODE_NOISE};
use crate::jsonld::extract_authors;
use crate::urls::{
    canonicalize, first_segment_allowed, has_binary_extension, is_internal, path_segments,
};
use ag_core::classification::truncate_chars;
use ag_core::ScrapedArticle;
use chrono::Utc;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

pub const DEFAULT_MAX_ARTICLES: usize = 100;
pub const MAX_CRAWL_DEPTH: usize = 2;
pub const ARTICLE_TEXT_LIMIT: usize = 200;

/// Links found on one index page.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageLinks {
    pub articles: Vec<String>,
    pub next_pages: Vec<Url>,
}

/// Pagination, category and tag listings.
///
/// `path` has no trailing slash; `index_depth` is the segment count of the
/// index the crawl started from.
pub fn is_index_like(path: &str, index_depth: usize) -> bool {
    let segments = path_segments(path);
    let contains_page = |seg: Option<&&str>| seg.map_or(false, |s| s.to_lowercase().contains("page"));
    let last = segments.last();
    let second_last = segments.len().checked_sub(2).and_then(|i| segments.get(i));

    contains_page(last)
        || contains_page(second_last)
        || path.ends_with("/category")
        || path.contains("/category/")
        || path.contains("/tag/")
        || (segments.len() >= 3 && segments[0] == "c" && contains_page(last))
        || (segments.len() == index_depth + 1
            && last.map_or(false, |s| s.chars().all(|c| c.is_ascii_digit())))
}

/// Visit key: canonical URL plus query, so `?page=2` is a distinct page.
fn page_key(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", canonicalize(url.as_str()), q),
        None => canonicalize(url.as_str()),
    }
}

/// Splits the links of one index page into article candidates and listing
/// pages worth following.
pub fn scan_index_page(
    body: &str,
    page_url: &Url,
    index_url: &Url,
    depth: usize,
    excluded: &HashSet<String>,
) -> PageLinks {
    let index_path = index_url.path().trim_end_matches('/');
    let index_depth = path_segments(index_path).len();
    let document = Html::parse_document(body);
    let mut links = PageLinks::default();

    for anchor in html::anchors(&document, page_url) {
        let link = anchor.url;
        if excluded.contains(&canonicalize(link.as_str()))
            || !is_internal(index_url, &link)
            || !first_segment_allowed(link.path())
            || has_binary_extension(link.path())
            || !link.path().starts_with(index_path)
        {
            continue;
        }

        let path = link.path().trim_end_matches('/');
        let depth_of_link = path_segments(path).len();
        let index_like = is_index_like(path, index_depth);

        if depth_of_link > index_depth && !index_like {
            links.articles.push(link.to_string());
        } else if index_like || (depth_of_link <= index_depth + 2 && depth < MAX_CRAWL_DEPTH) {
            links.next_pages.push(link);
        }
    }
    links
}

/// Walks an index and the listing pages it links to, collecting article URLs
/// in page order.
///
/// Only the first unvisited listing page of each page is followed, to a depth
/// of [`MAX_CRAWL_DEPTH`]. URLs in `excluded` (compared canonically) are skipped.
pub async fn find_individual_article_links(
    fetcher: &Fetcher,
    index_url: &str,
    excluded: &HashSet<String>,
    max_articles: usize,
) -> Vec<String> {
    let index = match Url::parse(index_url) {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!("Invalid index URL {}: {}", index_url, e);
            return Vec::new();
        }
    };
    let excluded: HashSet<String> = excluded.iter().map(|u| canonicalize(u)).collect();

    let mut visited = HashSet::new();
    let mut seen = HashSet::new();
    let mut articles = Vec::new();
    let mut current = Some(index.clone());
    let mut depth = 0;

    while let Some(page) = current.take() {
        if depth > MAX_CRAWL_DEPTH || articles.len() >= max_articles {
            break;
        }
        if !visited.insert(page_key(&page)) {
            break;
        }
        let Some(body) = fetcher.get_html(page.as_str()).await else {
            break;
        };

        let links = scan_index_page(&body, &page, &index, depth, &excluded);
        for article in links.articles {
            if seen.insert(canonicalize(&article)) {
                articles.push(article);
            }
        }
        current = links
            .next_pages
            .into_iter()
            .find(|next| !visited.contains(&page_key(next)));
        depth += 1;
    }

    articles.truncate(max_articles);
    articles
}

/// Builds a [`ScrapedArticle`] from a fetched page. `client_name` is left empty.
pub fn extract_article_data(url: &str, body: &str, date_selector: Option<&str>) -> ScrapedArticle {
    let document = Html::parse_document(body);
    let text = html::visible_text(&document, CODE_NOISE);
    let publish_date = extract_publish_date(&document, body, &text, date_selector);

    ScrapedArticle {
        url: url.to_string(),
        title: html::title(&document),
        authors: extract_authors(&document),
        text: truncate_chars(&text, ARTICLE_TEXT_LIMIT),
        publish_date,
        client_name: String::new(),
        scraped_at: Utc::now(),
    }
}

/// Fetches and extracts one article; `None` when the page can't be fetched.
pub async fn fetch_article(
    fetcher: &Fetcher,
    url: &str,
    date_selector: Option<&str>,
) -> Option<ScrapedArticle> {
    let body = fetcher.get_html(url).await?;
    Some(extract_article_data(url, &body, date_selector))
}
