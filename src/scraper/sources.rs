//! Per-platform listing extraction over a parsed catalog page.
//!
//! Known sources produce [`Candidate`]s (stages 1 and 2: anchor matching and
//! DOM-proximity free detection). Remote escalation needs the network and is
//! driven by the caller once the parsed document is gone.

use crate::models::{Candidate, Listing, LocalEvidence};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::cleaner::{escape_title, parse_leading_rating, parse_rating};
use super::dom::MarkupNode;

/// Ancestors inspected above the anchor, counting the parent as the first.
pub const MAX_ANCESTOR_DEPTH: usize = 4;

pub const MIN_RATING: f64 = 4.0;

const GENERIC_PATH_KEYS: [&str; 3] = ["/course/", "/learn/", "/specializations/"];

static LOOSE_FREE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s*0|100%\s*off|free").expect("hardcoded regex pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Udemy,
    Coursera,
    Udacity,
    Generic,
}

/// How a source exposes a rating next to its listing anchors.
#[derive(Debug, Clone, Copy)]
enum RatingBadge {
    /// `<span data-purpose="...">4.6</span>`, number only.
    DataPurpose(&'static str),
    /// `<span class="...">4.8 (1,234)</span>`, number first.
    Class(&'static str),
}

/// What one catalog page yielded.
#[derive(Debug)]
pub enum Extraction {
    /// Known source: candidates still subject to free/rating policy.
    Candidates(Vec<Candidate>),
    /// Generic fallback: every matching anchor, no filtering.
    Listings(Vec<Listing>),
}

impl Source {
    /// Substring match on the host, so subdomains route the same way.
    pub fn for_host(host: &str) -> Self {
        let host = host.to_lowercase();
        if host.contains("udemy.com") {
            Source::Udemy
        } else if host.contains("coursera.org") {
            Source::Coursera
        } else if host.contains("udacity.com") {
            Source::Udacity
        } else {
            Source::Generic
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Source::Udemy => "Udemy",
            Source::Coursera => "Coursera",
            Source::Udacity => "Udacity",
            Source::Generic => "generic",
        }
    }

    fn is_listing_href(self, href: &str) -> bool {
        match self {
            Source::Udemy | Source::Udacity => href.contains("/course/"),
            Source::Coursera => {
                href.starts_with("/learn/")
                    || href.contains("/professional-certificates/")
                    || href.contains("/specializations/")
            }
            Source::Generic => GENERIC_PATH_KEYS.iter().any(|k| href.contains(k)),
        }
    }

    fn local_phrases(self) -> &'static [&'static str] {
        match self {
            Source::Udemy => &["100% off", "free", "$0", "0.00", "free course", "enroll for free"],
            Source::Coursera => &["free", "audit", "enroll for free", "100% off", "$0"],
            Source::Udacity => &["free", "100% off", "$0"],
            Source::Generic => &[],
        }
    }

    fn rating_badge(self) -> Option<RatingBadge> {
        match self {
            Source::Udemy => Some(RatingBadge::DataPurpose("rating-number")),
            Source::Coursera => Some(RatingBadge::Class("ratings-text")),
            Source::Udacity | Source::Generic => None,
        }
    }

    /// Parse `html` and run the extractor for this source.
    ///
    /// `base` is `scheme://host[:port]/`; `host_label` names generic listings.
    pub fn extract_page(self, html: &str, base: &Url, host_label: &str) -> Extraction {
        let doc = Html::parse_document(html);
        let Ok(sel) = Selector::parse("a[href]") else {
            return Extraction::Candidates(Vec::new());
        };
        let anchors: Vec<_> = doc.select(&sel).collect();

        match self {
            Source::Generic => Extraction::Listings(generic_listings(anchors, base, host_label)),
            _ => Extraction::Candidates(self.candidates(anchors, base)),
        }
    }

    /// Stages 1 and 2 for a known source.
    pub fn candidates<N: MarkupNode>(
        self,
        anchors: impl IntoIterator<Item = N>,
        base: &Url,
    ) -> Vec<Candidate> {
        let mut out = Vec::new();

        for a in anchors {
            let Some(href) = a.attribute("href") else { continue };
            if !self.is_listing_href(&href) {
                continue;
            }
            let Ok(link) = base.join(&href) else { continue };

            out.push(Candidate {
                // Includes nested elements, so a title held only in an inner `div` is found.
                title: a.stripped_text(),
                link: link.to_string(),
                rating: self.rating_near(&a),
                local: self.local_evidence(&a),
            });
        }

        out
    }

    fn has_local_phrase(self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let t = text.to_lowercase();
        self.local_phrases().iter().any(|p| t.contains(p))
    }

    /// Anchor text, then parent text, then up to [`MAX_ANCESTOR_DEPTH`]
    /// ancestors starting at the parent with the looser regex as well.
    pub fn local_evidence<N: MarkupNode>(self, anchor: &N) -> LocalEvidence {
        if self.has_local_phrase(&anchor.text_content()) {
            return LocalEvidence::AnchorText;
        }

        let parent = anchor.parent_node();
        if let Some(p) = &parent {
            if self.has_local_phrase(&p.text_content()) {
                return LocalEvidence::ParentText;
            }
        }

        let mut ancestor = parent;
        for depth in 1..=MAX_ANCESTOR_DEPTH {
            let Some(node) = ancestor else { break };
            let text = node.text_content();
            if self.has_local_phrase(&text) || LOOSE_FREE.is_match(&text) {
                return LocalEvidence::Ancestor { depth };
            }
            ancestor = node.parent_node();
        }

        LocalEvidence::Inconclusive
    }

    /// Rating badge among the parent's descendants; unparseable → unknown.
    pub fn rating_near<N: MarkupNode>(self, anchor: &N) -> Option<f64> {
        let badge = self.rating_badge()?;
        let parent = anchor.parent_node()?;

        let found = parent
            .descendants_matching(&|n: &N| {
                n.tag_name() == "span"
                    && match badge {
                        RatingBadge::DataPurpose(v) => n.attribute("data-purpose").as_deref() == Some(v),
                        RatingBadge::Class(c) => n.has_class(c),
                    }
            })
            .into_iter()
            .next()?;

        match badge {
            RatingBadge::DataPurpose(_) => parse_rating(&found.stripped_text()),
            RatingBadge::Class(_) => parse_leading_rating(&found.text_content()),
        }
    }
}

/// Inclusion rule once free status is known.
pub fn passes_rating(rating: Option<f64>) -> bool {
    rating.is_none_or(|r| r >= MIN_RATING)
}

/// Coverage net for unknown catalogs: no free or rating checks.
pub fn generic_listings<N: MarkupNode>(
    anchors: impl IntoIterator<Item = N>,
    base: &Url,
    platform: &str,
) -> Vec<Listing> {
    let mut out = Vec::new();

    for a in anchors {
        let Some(href) = a.attribute("href") else { continue };
        let title = a.stripped_text();
        if title.is_empty() || !Source::Generic.is_listing_href(&href) {
            continue;
        }
        let Ok(link) = base.join(&href) else { continue };

        out.push(Listing {
            platform: platform.to_string(),
            title: escape_title(&title),
            link: link.to_string(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::dom::synthetic::Node;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn known(source: Source, html: &str) -> Vec<Candidate> {
        match source.extract_page(html, &base("https://www.udemy.com/"), "www.udemy.com") {
            Extraction::Candidates(c) => c,
            Extraction::Listings(_) => panic!("known source produced generic listings"),
        }
    }

    #[test]
    fn test_for_host_routing() {
        assert_eq!(Source::for_host("www.udemy.com"), Source::Udemy);
        assert_eq!(Source::for_host("business.UDEMY.com"), Source::Udemy);
        assert_eq!(Source::for_host("www.coursera.org"), Source::Coursera);
        assert_eq!(Source::for_host("udacity.com"), Source::Udacity);
        assert_eq!(Source::for_host("edx.org"), Source::Generic);
    }

    #[test]
    fn test_udemy_anchor_text_hit() {
        let c = known(
            Source::Udemy,
            r#"<html><body><div><a href="/course/python-101">Learn Python — 100% off</a></div></body></html>"#,
        );
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].title, "Learn Python — 100% off");
        assert_eq!(c[0].link, "https://www.udemy.com/course/python-101");
        assert_eq!(c[0].local, LocalEvidence::AnchorText);
        assert_eq!(c[0].rating, None);
    }

    #[test]
    fn test_udemy_parent_text_and_rating() {
        let c = known(
            Source::Udemy,
            r#"<div class="card">
                 <a href="/course/rust/">Rust</a>
                 <span data-purpose="rating-number">4.7</span>
                 <span>Free</span>
               </div>"#,
        );
        assert_eq!(c[0].local, LocalEvidence::ParentText);
        assert_eq!(c[0].rating, Some(4.7));
    }

    #[test]
    fn test_unparseable_rating_is_unknown() {
        let c = known(
            Source::Udemy,
            r#"<div><a href="/course/x/">X</a><span data-purpose="rating-number">n/a</span></div>"#,
        );
        assert_eq!(c[0].rating, None);
    }

    #[test]
    fn test_ancestor_walk_finds_badge_two_levels_up() {
        let html = r#"<section><p>$ 0</p><div><div><a href="/course/deep/">Deep</a></div></div></section>"#;
        let c = known(Source::Udacity, html);
        // parent and grandparent are silent, the section holds "$ 0"
        assert_eq!(c[0].local, LocalEvidence::Ancestor { depth: 3 });
    }

    #[test]
    fn test_inconclusive_without_indicator() {
        let c = known(
            Source::Udemy,
            r#"<html><body><div><a href="/course/python-101">Learn Python</a></div></body></html>"#,
        );
        assert_eq!(c[0].local, LocalEvidence::Inconclusive);
    }

    #[test]
    fn test_ancestor_walk_is_bounded() {
        // "free" sits five levels above the anchor's parent
        let leaf = Node::new("a")
            .attr("href", "/course/far")
            .child(Node::with_text("span", "Far"));
        let tree = Node::with_text("section", "free")
            .child(Node::new("div").child(Node::new("div").child(
                Node::new("div").child(Node::new("div").child(Node::new("div").child(leaf))),
            )));
        let anchors = tree.find_all("a");
        let c = Source::Udemy.candidates(anchors, &base("https://www.udemy.com/"));
        assert_eq!(c[0].local, LocalEvidence::Inconclusive);
        assert_eq!(c[0].title, "Far");
    }

    #[test]
    fn test_coursera_paths_and_rating() {
        let html = r#"<ul>
            <li><a href="/learn/ml">Machine Learning</a><span class="ratings-text">4.9 (200k)</span></li>
            <li><a href="/professional-certificates/google-it">Google IT</a></li>
            <li><a href="/specializations/python">Python</a></li>
            <li><a href="/articles/learn/">Article</a></li>
        </ul>"#;
        let c = match Source::Coursera.extract_page(html, &base("https://www.coursera.org/"), "www.coursera.org") {
            Extraction::Candidates(c) => c,
            _ => unreachable!(),
        };
        let links: Vec<_> = c.iter().map(|c| c.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://www.coursera.org/learn/ml",
                "https://www.coursera.org/professional-certificates/google-it",
                "https://www.coursera.org/specializations/python",
            ]
        );
        assert_eq!(c[0].rating, Some(4.9));
        assert_eq!(c[1].rating, None);
    }

    #[test]
    fn test_udacity_never_has_rating() {
        let c = known(
            Source::Udacity,
            r#"<div><a href="/course/ai">AI</a><span data-purpose="rating-number">2.0</span></div>"#,
        );
        assert_eq!(c[0].rating, None);
    }

    #[test]
    fn test_passes_rating() {
        assert!(passes_rating(None));
        assert!(passes_rating(Some(4.0)));
        assert!(!passes_rating(Some(3.9)));
    }

    #[test]
    fn test_generic_listings_accept_paid_and_skip_untitled() {
        let html = r#"<body>
            <a href="/course/a">Course A — $199</a>
            <a href="/learn/b"><img src="b.png"></a>
            <a href="/about">About</a>
            <a href="https://other.example/specializations/c">C &amp; D</a>
        </body>"#;
        match Source::Generic.extract_page(html, &base("https://example.com/"), "example.com") {
            Extraction::Listings(l) => {
                assert_eq!(l.len(), 2);
                assert_eq!(l[0].platform, "example.com");
                assert_eq!(l[0].link, "https://example.com/course/a");
                assert_eq!(l[1].link, "https://other.example/specializations/c");
                assert!(l[1].title.contains("&amp;"));
            }
            Extraction::Candidates(_) => panic!("generic source produced candidates"),
        }
    }
}
