use crate::html::selector;
use scraper::Html;
use serde_json::Value;

fn author_names(author: &Value, names: &mut Vec<String>) {
    match author {
        Value::Array(items) => items.iter().for_each(|a| author_names(a, names)),
        Value::Object(obj) => {
            if let Some(name) = obj.get("name").and_then(Value::as_str) {
                names.push(name.trim().to_string());
            }
        }
        Value::String(s) => names.push(s.trim().to_string()),
        _ => {}
    }
}

/// Author names declared in `application/ld+json` blocks, including `@graph` entries.
pub fn extract_authors(document: &Html) -> Vec<String> {
    let mut authors = Vec::new();

    for script in document.select(&selector("script[type='application/ld+json']")) {
        let raw = script.text().collect::<String>();
        let Ok(json) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        let nodes: Vec<&Value> = match &json {
            Value::Array(items) => items.iter().collect(),
            Value::Object(obj) => match obj.get("@graph").and_then(Value::as_array) {
                Some(graph) => graph.iter().collect(),
                None => vec![&json],
            },
            _ => Vec::new(),
        };
        for node in nodes {
            if let Some(author) = node.get("author") {
                author_names(author, &mut authors);
            }
        }
    }

    authors.retain(|a| !a.is_empty());
    authors.dedup();
    authors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_authors() {
        let html = r#"<html><head>
            <script type="application/ld+json">
              {"@type": "BlogPosting", "author": [{"name": " Ana Pop "}, {"name": "Ion Ionescu"}]}
            </script>
            <script type="application/ld+json">
              {"@graph": [{"@type": "Article", "author": "Maria"}]}
            </script>
            <script type="application/ld+json">not json</script>
        </head></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract_authors(&doc), vec!["Ana Pop", "Ion Ionescu", "Maria"]);
    }

    #[test]
    fn test_no_metadata() {
        let doc = Html::parse_document("<html><body>plain</body></html>");
        assert!(extract_authors(&doc).is_empty());
    }
}
