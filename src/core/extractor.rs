use crate::domain::model::LinkSet;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 連結從 http(s):// 開始，到第一個 `"`、空白或 `<` 為止（不跨行）
    static ref LINK_REGEX: Regex = Regex::new(r#"https?://.*?[" <]"#).unwrap();
}

const IMAGE_SUFFIXES: [&str; 4] = [".png\"", ".jpg\"", ".jpeg\"", ".gif\""];
const INTERNAL_DOMAIN: &str = ".edx.org";

/// Scans an HTML blob for external links.
///
/// This is plain text scanning, not DOM parsing. Each match keeps its
/// terminator while the filters run, so an image link is only dropped when
/// it is immediately followed by a closing quote.
pub fn extract_links(html: &str) -> LinkSet {
    LINK_REGEX
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|candidate| is_external(candidate))
        .map(|candidate| candidate[..candidate.len() - 1].to_string())
        .collect()
}

fn is_external(candidate: &str) -> bool {
    let lowered = candidate.to_lowercase();
    let is_image = IMAGE_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix));
    !is_image && !lowered.contains(INTERNAL_DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(html: &str) -> Vec<String> {
        extract_links(html).into_iter().collect()
    }

    #[test]
    fn test_no_links() {
        assert!(extract_links("").is_empty());
        assert!(extract_links("I have no urls").is_empty());
        assert!(extract_links("<a href=\"/relative/path\">x</a> ftp://files.example.com ").is_empty());
    }

    #[test]
    fn test_terminators_are_discarded() {
        assert_eq!(
            links(r#"<span href="http://www.google.com">my site</span>"#),
            vec!["http://www.google.com"]
        );
        assert_eq!(links("see https://a.com/x now"), vec!["https://a.com/x"]);
        assert_eq!(links("<p>https://a.com/y</p>"), vec!["https://a.com/y"]);
    }

    #[test]
    fn test_link_without_terminator_is_ignored() {
        assert!(extract_links("trailing http://a.com").is_empty());
        assert!(extract_links("http://a.com\nnext line \"").is_empty());
    }

    #[test]
    fn test_image_links_followed_by_quote_are_excluded() {
        let html = r#"<img src="http://cdn.example.com/pic.PNG"><img src="https://x.com/a.jpeg">
            <img src="http://x.com/b.jpg"><img src="http://x.com/c.Gif">"#;
        assert!(extract_links(html).is_empty());
    }

    #[test]
    fn test_image_links_followed_by_space_or_tag_are_kept() {
        let html = "http://cdn.example.com/pic.png is here and <b>http://x.com/b.gif</b>";
        assert_eq!(
            links(html),
            vec!["http://cdn.example.com/pic.png", "http://x.com/b.gif"]
        );
    }

    #[test]
    fn test_internal_links_are_excluded() {
        let html = r#"<a href="https://courses.edx.org/courses/x">a</a>
            <a href="http://www.google.com/?next=https://studio.EDX.ORG/">b</a>
            <a href="https://example.com/">c</a>"#;
        assert_eq!(links(html), vec!["https://example.com/"]);
    }

    #[test]
    fn test_repeated_links_collapse() {
        let html = r#"<a href="http://a.com">1</a><a href="http://a.com">2</a><a href="http://a.com/">3</a>"#;
        assert_eq!(links(html), vec!["http://a.com", "http://a.com/"]);
    }
}
