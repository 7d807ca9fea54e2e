//! Style normalization: inline CSS to semantic markup.
//!
//! ## Why is normalization necessary?
//!
//! The inlining stage leaves the document drowning in `style` attributes —
//! converter-generated font stacks, margins, line heights — that a rich-text
//! editor's document model would either reject or mangle. Editors speak
//! semantic tags: `<strong>`, `<u>`, and colour spans. This stage pattern-
//! matches the three declarations the editor can represent, rewrites them as
//! wrapper tags, and throws the rest of the styling away along with `<head>`
//! and `<meta>` so what remains is a clean embeddable fragment.
//!
//! ## Wrap order
//!
//! Wraps apply bold → underline → colour, each wrapping the previous result,
//! so a bold underlined red run nests as
//! `<span style="color: red"><u><strong>…</strong></u></span>` — strong
//! innermost, span outermost. The order is fixed; editor round-tripping
//! depends on it.

use crate::dom;
use html5ever::local_name;
use kuchikiki::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)font-weight\s*:\s*(700|bold)").unwrap());
static RE_UNDERLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)text-decoration\s*:\s*underline").unwrap());
static RE_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)color\s*:\s*([^;]+)").unwrap());

/// Key facts extracted from one inline style string.
#[derive(Debug, PartialEq, Eq)]
pub struct StyleFacts {
    pub bold: bool,
    pub underline: bool,
    pub color: Option<String>,
}

/// Pattern-match the declarations the editor can represent.
pub fn extract_style_facts(style: &str) -> StyleFacts {
    StyleFacts {
        bold: RE_BOLD.is_match(style),
        underline: RE_UNDERLINE.is_match(style),
        color: RE_COLOR
            .captures(style)
            .map(|c| c[1].trim().to_string())
            .filter(|c| !c.is_empty()),
    }
}

/// Rewrite the document into a semantic fragment and serialize it.
///
/// Removes `<head>` and `<meta>`, converts bold/underline/colour inline
/// declarations to wrapper tags, strips every original `style` attribute,
/// and returns the `<body>` inner HTML (whole-document serialisation as a
/// fallback when no body exists).
pub fn normalize_document(doc: &NodeRef) -> String {
    detach_all(doc, "head");
    detach_all(doc, "meta");

    let styled: Vec<_> = match doc.select("[style]") {
        Ok(sel) => sel.collect(),
        Err(()) => Vec::new(),
    };

    for el in styled {
        let style = el
            .attributes
            .borrow()
            .get("style")
            .map(str::to_string)
            .unwrap_or_default();
        let facts = extract_style_facts(&style);

        let node = el.as_node();
        let children: Vec<NodeRef> = node.children().collect();

        // Empty elements have nothing to wrap, but their style attribute
        // still has to go.
        if !children.is_empty() {
            wrap_children(node, children, &facts);
        }

        el.attributes.borrow_mut().remove("style");
    }

    match doc.select_first("body") {
        Ok(body) => dom::inner_html(body.as_node()),
        Err(()) => dom::serialize_node(doc),
    }
}

/// Move `children` into nested semantic wrappers and re-attach the result.
///
/// No-op when no representable declaration was found.
fn wrap_children(node: &NodeRef, children: Vec<NodeRef>, facts: &StyleFacts) {
    if !facts.bold && !facts.underline && facts.color.is_none() {
        return;
    }

    let mut current = children;
    if facts.bold {
        current = vec![wrap(dom::make_element(local_name!("strong"), vec![]), current)];
    }
    if facts.underline {
        current = vec![wrap(dom::make_element(local_name!("u"), vec![]), current)];
    }
    if let Some(ref color) = facts.color {
        let span = dom::make_element(
            local_name!("span"),
            vec![dom::style_attr(format!("color: {color}"))],
        );
        current = vec![wrap(span, current)];
    }

    for wrapper in current {
        node.append(wrapper);
    }
}

/// Detach `nodes` from their parent and append them into `wrapper`.
fn wrap(wrapper: NodeRef, nodes: Vec<NodeRef>) -> NodeRef {
    for n in nodes {
        n.detach();
        wrapper.append(n);
    }
    wrapper
}

fn detach_all(doc: &NodeRef, selector: &str) {
    if let Ok(sel) = doc.select(selector) {
        for el in sel.collect::<Vec<_>>() {
            el.as_node().detach();
        }
    }
}
