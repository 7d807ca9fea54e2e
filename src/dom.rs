//! Small shared helpers over the kuchikiki DOM.
//!
//! The inlining, image, and normalization stages all build elements and
//! serialize subtrees; the boilerplate (qualified names, namespaced
//! attribute keys, lossy UTF-8 collection) lives here so the stages read as
//! document transformations rather than html5ever plumbing.

use html5ever::{local_name, namespace_url, ns, LocalName, QualName};
use kuchikiki::{Attribute, ExpandedName, NodeRef};

/// Build an HTML element node with the given attributes.
pub(crate) fn make_element(name: LocalName, attrs: Vec<(ExpandedName, Attribute)>) -> NodeRef {
    NodeRef::new_element(QualName::new(None, ns!(html), name), attrs)
}

/// An un-namespaced attribute pair, ready for [`make_element`].
pub(crate) fn attr(name: LocalName, value: impl Into<String>) -> (ExpandedName, Attribute) {
    (
        ExpandedName::new(ns!(), name),
        Attribute {
            prefix: None,
            value: value.into(),
        },
    )
}

/// Serialize a node including itself.
pub(crate) fn serialize_node(node: &NodeRef) -> String {
    let mut buf = Vec::new();
    // Serialisation into a Vec cannot fail for valid UTF-8 trees.
    let _ = node.serialize(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serialize only the children of a node (its "inner HTML").
pub(crate) fn inner_html(node: &NodeRef) -> String {
    let mut buf = Vec::new();
    for child in node.children() {
        let _ = child.serialize(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Shorthand for the `style` attribute key.
pub(crate) fn style_attr(value: impl Into<String>) -> (ExpandedName, Attribute) {
    attr(local_name!("style"), value)
}
