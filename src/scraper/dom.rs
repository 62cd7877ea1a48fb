//! Minimal tree capability the listing extractors are written against.
//!
//! `scraper::ElementRef` implements it for real pages; tests can supply
//! hand-built trees.

use scraper::ElementRef;

pub trait MarkupNode: Sized {
    /// Text fragments of this node and all descendants, in document order.
    fn text_fragments(&self) -> Vec<String>;

    fn parent_node(&self) -> Option<Self>;

    fn attribute(&self, name: &str) -> Option<String>;

    fn tag_name(&self) -> String;

    /// Element descendants (excluding `self`) for which `pred` holds, in document order.
    fn descendants_matching(&self, pred: &dyn Fn(&Self) -> bool) -> Vec<Self>;

    /// All text joined with single spaces, untrimmed.
    fn text_content(&self) -> String {
        self.text_fragments().join(" ")
    }

    /// Trimmed, non-empty fragments concatenated without separator.
    fn stripped_text(&self) -> String {
        self.text_fragments()
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

impl<'a> MarkupNode for ElementRef<'a> {
    fn text_fragments(&self) -> Vec<String> {
        ElementRef::text(self).map(str::to_string).collect()
    }

    fn parent_node(&self) -> Option<Self> {
        // Document root is not an element, so wrap() ends the walk there.
        (**self).parent().and_then(ElementRef::wrap)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn tag_name(&self) -> String {
        self.value().name().to_string()
    }

    fn descendants_matching(&self, pred: &dyn Fn(&Self) -> bool) -> Vec<Self> {
        (**self)
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| pred(el))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::synthetic::Node;
    use super::*;
    use scraper::{Html, Selector};

    fn first_anchor(doc: &Html) -> ElementRef<'_> {
        let sel = Selector::parse("a").unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn test_element_ref_text_and_attributes() {
        let doc = Html::parse_document(
            r#"<div class="card big"><a href="/course/x"> Rust <b>Basics</b> </a></div>"#,
        );
        let a = first_anchor(&doc);
        assert_eq!(a.attribute("href").as_deref(), Some("/course/x"));
        assert_eq!(a.tag_name(), "a");
        assert_eq!(a.stripped_text(), "RustBasics");
        assert!(a.text_content().contains("Rust"));

        let parent = a.parent_node().unwrap();
        assert!(parent.has_class("card"));
        assert!(!parent.has_class("car"));
    }

    #[test]
    fn test_parent_walk_stops_at_document_root() {
        let doc = Html::parse_document(r#"<html><body><a href="/x">x</a></body></html>"#);
        let a = first_anchor(&doc);
        let body = a.parent_node().unwrap();
        let html = body.parent_node().unwrap();
        assert_eq!(html.tag_name(), "html");
        assert!(html.parent_node().is_none());
    }

    #[test]
    fn test_stripped_text_reaches_nested_div() {
        let doc = Html::parse_document(
            r#"<a href="/course/x"><img src="i.png"><div> Deep Learning </div></a>"#,
        );
        assert_eq!(first_anchor(&doc).stripped_text(), "Deep Learning");
    }

    #[test]
    fn test_stripped_text_on_synthetic_tree() {
        let a = Node::new("a").child(Node::new("span").child(Node::with_text("p", "Nested")));
        assert_eq!(a.stripped_text(), "Nested");

        let empty = Node::new("a").child(Node::new("img"));
        assert_eq!(empty.stripped_text(), "");
    }
}
