//! URL tables and heuristics shared by index discovery and article crawling.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Words that mark a link as a possible content section.
pub const KEYWORDS: &[&str] = &[
    "blog",
    "news",
    "articles",
    "insights",
    "resources",
    "stories",
    "press",
    "events",
    "updates",
    "journal",
    "media",
    "publications",
];

/// Words that rule a link out entirely.
pub const EXCLUDE_KEYWORDS: &[&str] = &[
    "contact", "about", "login", "register", "privacy", "terms", "careers", "support", "faq",
    "cookies", "cart", "account",
];

pub const BINARY_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".doc", ".docx", ".xls", ".xlsx", ".zip", ".rar", ".mp4",
    ".avi", ".mov",
];

/// Section roots probed directly on every site.
pub const COMMON_INDEX_PATHS: &[&str] = &[
    "/blog",
    "/community-blog",
    "/resources",
    "/insights",
    "/newsroom",
    "/news",
    "/press",
    "/stories",
    "/updates",
    "/articles",
];

/// Single path segments accepted as a section index.
pub const INDEX_TOKENS: &[&str] = &[
    "blog",
    "community-blog",
    "resources",
    "insights",
    "news",
    "press",
    "stories",
    "updates",
    "articles",
    "c",
];

pub const ALLOWED_LOCALES: &[&str] = &["en", "ro"];

/// Known sites whose sections look like indexes but aren't.
pub const DOMAIN_EXCLUDE: &[(&str, &[&str])] = &[("uipath.com", &["/events", "/resources"])];

pub const MAX_INDEX_CANDIDATES: usize = 80;

fn locale_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/([a-z]{2})(/|$)").expect("valid locale regex"))
}

/// False for empty hrefs, in-page anchors and `mailto:`/`tel:`/`javascript:` links.
pub fn is_http_href(href: &str) -> bool {
    let href = href.trim().to_lowercase();
    !(href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:"))
}

/// Resolves `href` against `base`, keeping only http(s) targets.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    if !is_http_href(href) {
        return None;
    }
    let mut url = base.join(href.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

pub fn normalize_host(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Same host or a subdomain of it, ignoring a leading `www.`.
pub fn is_internal(base: &Url, candidate: &Url) -> bool {
    let (Some(base_host), Some(candidate_host)) = (base.host_str(), candidate.host_str()) else {
        return false;
    };
    let base_host = normalize_host(base_host);
    let candidate_host = normalize_host(candidate_host);
    candidate_host == base_host || candidate_host.ends_with(&format!(".{}", base_host))
}

/// `scheme://host[:port]`.
pub fn site_root(url: &Url) -> String {
    url.origin().ascii_serialization()
}

pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn is_locale_segment(segment: &str) -> bool {
    segment.len() == 2 && segment.chars().all(|c| c.is_ascii_alphabetic())
}

/// Path segments with a leading two-letter locale removed.
pub fn strip_locale(path: &str) -> Vec<&str> {
    let segments = path_segments(path);
    match segments.first() {
        Some(first) if is_locale_segment(first) => segments[1..].to_vec(),
        _ => segments,
    }
}

/// Rejects paths carrying a locale prefix other than the allowed ones.
pub fn locale_allowed(path: &str) -> bool {
    match locale_regex().captures(path) {
        Some(caps) => ALLOWED_LOCALES.contains(&&caps[1]),
        None => true,
    }
}

/// Like [`locale_allowed`] but case-insensitive on the first segment.
pub fn first_segment_allowed(path: &str) -> bool {
    match path_segments(path).first() {
        Some(first) if is_locale_segment(first) => {
            ALLOWED_LOCALES.contains(&first.to_lowercase().as_str())
        }
        _ => true,
    }
}

pub fn has_binary_extension(url: &str) -> bool {
    let lower = url.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn has_excluded_keyword(url: &str) -> bool {
    let lower = url.to_lowercase();
    EXCLUDE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// First keyword found in the URL or the anchor text.
pub fn matched_keyword(url: &str, anchor_text: &str) -> Option<&'static str> {
    let url = url.to_lowercase();
    let text = anchor_text.to_lowercase();
    KEYWORDS
        .iter()
        .copied()
        .find(|kw| url.contains(kw) || text.contains(kw))
}

/// A section root: one index token, or `/c/<category>`, after locale stripping.
pub fn is_shallow_index_path(path: &str) -> bool {
    let segments = strip_locale(path);
    match segments.as_slice() {
        [one] => INDEX_TOKENS.contains(&one.to_lowercase().as_str()),
        [first, _] => first.eq_ignore_ascii_case("c"),
        _ => false,
    }
}

/// Domain rule matching `url`, if any of its excluded paths prefix the path.
pub fn domain_rule_excludes(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = normalize_host(host);
    DOMAIN_EXCLUDE.iter().any(|(domain, paths)| {
        host.ends_with(domain) && paths.iter().any(|p| url.path().starts_with(p))
    })
}

/// Lower-cased `scheme://host[:port]` plus the path without trailing slash.
/// Query and fragment are dropped; unparsable input is returned unchanged.
pub fn canonicalize(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let trimmed = parsed.path().trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };
    format!("{}://{}{}{}", parsed.scheme(), host, port, path)
}
