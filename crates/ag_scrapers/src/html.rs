use crate::urls;
use scraper::{Html, Selector};
use url::Url;

/// Elements dropped before a page is shown to the classifier.
pub const CLASSIFIER_NOISE: &[&str] = &["script", "style", "nav", "footer", "header", "aside", "form"];
/// Elements dropped from the article body sent for date-selector inference.
pub const SELECTOR_NOISE: &[&str] = &["head", "script", "style", "nav", "footer", "header"];
/// Elements never worth reading as text.
pub const CODE_NOISE: &[&str] = &["script", "style", "noscript"];

#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub url: Url,
    /// Lower-cased, trimmed anchor text.
    pub text: String,
}

/// Creates a selector from a literal; panics only on a malformed constant.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {}: {:?}", css, e))
}

/// Text nodes outside `skip` elements, trimmed and joined with newlines.
pub fn visible_text(document: &Html, skip: &[&str]) -> String {
    let mut parts = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| skip.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    parts.join("\n")
}

/// Every `<a href>` resolving to an http(s) URL, in document order.
pub fn anchors(document: &Html, page_url: &Url) -> Vec<Anchor> {
    let a = selector("a[href]");
    document
        .select(&a)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let url = urls::resolve(page_url, href)?;
            let text = el.text().collect::<String>().trim().to_lowercase();
            Some(Anchor { url, text })
        })
        .collect()
}

/// `<title>` text, else the first `<h1>`.
pub fn title(document: &Html) -> String {
    let title = document
        .select(&selector("title"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    if !title.is_empty() {
        return title;
    }
    document
        .select(&selector("h1"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head><title> Acme Blog </title><style>.x{}</style></head>
          <body>
            <header><a href="/about">About</a></header>
            <nav><a href="/blog">Blog</a></nav>
            <main>
              <h1>Latest</h1>
              <p>First post</p>
              <a href="mailto:x@acme.com">Mail</a>
              <a href="https://acme.com/news#top"> News </a>
            </main>
            <script>var x = 1;</script>
            <footer>Copyright</footer>
          </body>
        </html>"#;

    #[test]
    fn test_visible_text_drops_noise() {
        let doc = Html::parse_document(PAGE);
        let text = visible_text(&doc, CLASSIFIER_NOISE);
        assert!(text.contains("First post"));
        assert!(text.contains("Acme Blog"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("About"));
    }

    #[test]
    fn test_anchors_resolve_and_filter() {
        let doc = Html::parse_document(PAGE);
        let base = Url::parse("https://acme.com/").unwrap();
        let found = anchors(&doc, &base);
        let urls: Vec<&str> = found.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://acme.com/about", "https://acme.com/blog", "https://acme.com/news"]
        );
        assert_eq!(found[2].text, "news");
    }

    #[test]
    fn test_title_fallback_to_h1() {
        let doc = Html::parse_document("<html><body><h1> Post </h1></body></html>");
        assert_eq!(title(&doc), "Post");
        let doc = Html::parse_document(PAGE);
        assert_eq!(title(&doc), "Acme Blog");
    }
}
