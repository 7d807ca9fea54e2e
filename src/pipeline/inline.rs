//! Style inlining: fold stylesheet rules into per-element `style` attributes.
//!
//! ## Why inline at all?
//!
//! The fragment this pipeline produces is pasted into a rich-text editor
//! that keeps no reference to the converter's `styles.css`. Anything the
//! stylesheet expressed has to be written onto the elements themselves
//! before the stylesheet is thrown away, or the document loses its bold
//! runs and colours the moment it leaves the temp directory.
//!
//! The discovered stylesheet is embedded as a `<style>` block first, then
//! every embedded block is resolved: for each element, the declarations of
//! all matching rules are applied in (specificity, source order), with any
//! pre-existing inline declarations winning last — the same effective-value
//! rules a browser would use for these simple selectors. hwp5html emits
//! flat class selectors (`.HStyle0`, `.Section0 p`), so full cascade
//! machinery (inheritance, `!important`, media queries) is deliberately out
//! of scope; at-rules are skipped whole.

use crate::dom;
use html5ever::local_name;
use kuchikiki::traits::TendrilSink;
use kuchikiki::{NodeRef, Selectors, Specificity};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Parse `html` and, when a stylesheet is present, resolve it into inline
/// `style` attributes. Without CSS the document passes through unchanged
/// (modulo HTML5 parsing normalisation).
pub fn inline_document(html: &str, css: Option<&str>) -> NodeRef {
    let doc = kuchikiki::parse_html().one(html);

    if let Some(css) = css {
        embed_stylesheet(&doc, css);
    }

    let embedded = collect_embedded_css(&doc);
    if !embedded.is_empty() {
        apply_inline_styles(&doc, &embedded);
    }

    doc
}

/// Append the external stylesheet as an embedded `<style>` block in `<head>`.
fn embed_stylesheet(doc: &NodeRef, css: &str) {
    let style = dom::make_element(local_name!("style"), vec![]);
    style.append(NodeRef::new_text(css));
    if let Ok(head) = doc.select_first("head") {
        head.as_node().append(style);
    } else {
        // parse_html always synthesises a head; this is belt only.
        doc.append(style);
    }
}

/// Concatenated text of every `<style>` element, in document order.
fn collect_embedded_css(doc: &NodeRef) -> String {
    let mut css = String::new();
    if let Ok(styles) = doc.select("style") {
        for el in styles {
            css.push_str(&el.as_node().text_contents());
            css.push('\n');
        }
    }
    css.trim().to_string()
}

// ── Rule parsing ─────────────────────────────────────────────────────────

/// One parsed rule: a single compiled selector with its declarations.
/// Comma lists are split so each selector keeps its own specificity.
struct Rule {
    selector: Selectors,
    specificity: Specificity,
    order: usize,
    declarations: Vec<(String, String)>,
}

static RE_CSS_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Parse a stylesheet into matchable rules. Unparseable selectors and
/// at-rules are skipped, never fatal — a stylesheet this stage cannot read
/// should degrade to an unstyled import, not a failed one.
fn parse_rules(css: &str) -> Vec<Rule> {
    let css = RE_CSS_COMMENT.replace_all(css, "");
    let mut rules = Vec::new();
    let mut order = 0usize;
    let mut rest: &str = &css;

    while let Some(open) = rest.find('{') {
        let selector_text = rest[..open].trim().to_string();

        // Find the matching close brace; at-rules may nest.
        let mut depth = 1usize;
        let mut close = None;
        for (i, ch) in rest[open + 1..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + 1 + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else { break };

        if !selector_text.is_empty() && !selector_text.starts_with('@') {
            let declarations = parse_declarations(&rest[open + 1..close]);
            if !declarations.is_empty() {
                for sel in selector_text.split(',') {
                    let sel = sel.trim();
                    if sel.is_empty() {
                        continue;
                    }
                    match Selectors::compile(sel) {
                        // Split on commas above, so exactly one compiled selector.
                        Ok(selector) => {
                            let Some(specificity) = selector.0.first().map(|s| s.specificity())
                            else {
                                continue;
                            };
                            rules.push(Rule {
                                selector,
                                specificity,
                                order,
                                declarations: declarations.clone(),
                            });
                            order += 1;
                        }
                        Err(()) => debug!("skipping unsupported selector: {sel}"),
                    }
                }
            }
        }

        rest = &rest[close + 1..];
    }

    rules
}

/// Split a declaration block into trimmed (property, value) pairs.
pub(crate) fn parse_declarations(block: &str) -> Vec<(String, String)> {
    block
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_lowercase();
            let value = value.trim().to_string();
            (!prop.is_empty() && !value.is_empty()).then_some((prop, value))
        })
        .collect()
}

// ── Rule application ─────────────────────────────────────────────────────

/// Compute each element's effective declarations and write them onto its
/// `style` attribute.
fn apply_inline_styles(doc: &NodeRef, css: &str) {
    let rules = parse_rules(css);
    if rules.is_empty() {
        return;
    }

    let elements: Vec<_> = match doc.select("*") {
        Ok(sel) => sel.collect(),
        Err(()) => return,
    };

    for el in elements {
        let mut matched: Vec<&Rule> = rules.iter().filter(|r| r.selector.matches(&el)).collect();
        if matched.is_empty() {
            continue;
        }
        matched.sort_by_key(|r| (r.specificity, r.order));

        let mut merged: Vec<(String, String)> = Vec::new();
        for rule in matched {
            for (prop, value) in &rule.declarations {
                upsert(&mut merged, prop, value);
            }
        }

        // Existing inline declarations outrank every stylesheet rule.
        let existing = el.attributes.borrow().get("style").map(str::to_string);
        if let Some(existing) = existing {
            for (prop, value) in parse_declarations(&existing) {
                upsert(&mut merged, &prop, &value);
            }
        }

        let style = merged
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        el.attributes.borrow_mut().insert("style", style);
    }
}

/// Replace the value for `prop` in place, or append it.
fn upsert(decls: &mut Vec<(String, String)>, prop: &str, value: &str) {
    if let Some(slot) = decls.iter_mut().find(|(p, _)| p == prop) {
        slot.1 = value.to_string();
    } else {
        decls.push((prop.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_of(doc: &NodeRef, selector: &str) -> Option<String> {
        let el = doc.select_first(selector).ok()?;
        let attrs = el.attributes.borrow();
        attrs.get("style").map(str::to_string)
    }

    #[test]
    fn class_rule_becomes_inline_style() {
        let doc = inline_document(
            r#"<html><body><p class="HStyle0">text</p></body></html>"#,
            Some(".HStyle0 { font-weight: bold; color: red }"),
        );
        let style = style_of(&doc, "p").unwrap();
        assert!(style.contains("font-weight: bold"));
        assert!(style.contains("color: red"));
    }

    #[test]
    fn no_stylesheet_is_a_passthrough() {
        let doc = inline_document("<html><body><p>text</p></body></html>", None);
        assert_eq!(style_of(&doc, "p"), None);
    }

    #[test]
    fn inline_style_wins_over_rules() {
        let doc = inline_document(
            r#"<p class="a" style="color: blue">t</p>"#,
            Some(".a { color: red; font-weight: bold }"),
        );
        let style = style_of(&doc, "p").unwrap();
        assert!(style.contains("color: blue"));
        assert!(!style.contains("color: red"));
        assert!(style.contains("font-weight: bold"));
    }

    #[test]
    fn higher_specificity_wins_regardless_of_order() {
        let doc = inline_document(
            r#"<p id="x" class="a">t</p>"#,
            Some("#x { color: green } .a { color: red } p { color: blue }"),
        );
        let style = style_of(&doc, "p").unwrap();
        assert!(style.contains("color: green"), "got: {style}");
    }

    #[test]
    fn later_rule_wins_at_equal_specificity() {
        let doc = inline_document(
            r#"<p class="a">t</p>"#,
            Some(".a { color: red } .a { color: teal }"),
        );
        assert!(style_of(&doc, "p").unwrap().contains("color: teal"));
    }

    #[test]
    fn at_rules_and_comments_are_skipped() {
        let doc = inline_document(
            r#"<p class="a">t</p>"#,
            Some(
                "/* generated */ @media print { .a { color: black } } \
                 @charset \"utf-8\"; .a { color: red }",
            ),
        );
        assert!(style_of(&doc, "p").unwrap().contains("color: red"));
    }

    #[test]
    fn embedded_style_blocks_in_the_html_are_resolved_too() {
        let doc = inline_document(
            r#"<html><head><style>.a { color: red }</style></head><body><p class="a">t</p></body></html>"#,
            None,
        );
        assert!(style_of(&doc, "p").unwrap().contains("color: red"));
    }

    #[test]
    fn declaration_parsing_is_tolerant() {
        let decls = parse_declarations("color: red; ; broken ; font-weight:bold;");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string()),
                ("font-weight".to_string(), "bold".to_string())
            ]
        );
    }
}
