use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Text of the first `<body>`, with `<script>` and `<style>` subtrees left out.
/// Whitespace is kept exactly as the document has it.
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&BODY_SEL)
        .next()
        .map(collect_visible_text)
        .unwrap_or_default()
}

/// Recursively collect text, skipping non-visible elements.
fn collect_visible_text(el: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_visible_text(el, &mut text);
    text
}

fn push_visible_text(el: ElementRef<'_>, out: &mut String) {
    if matches!(el.value().name(), "script" | "style") {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&*text.text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_visible_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}
