//! XPath-style extraction over XML bodies.
//!
//! Only location paths are supported: child (`/`) and descendant (`//`) steps
//! over element names, `*`, `text()` and `@attr`, with position, attribute
//! and child-value predicates. Namespace prefixes are ignored, names match on
//! their local part.
mod document;
mod path;

use std::collections::BTreeSet;

use document::{Document, NodeKind, ROOT};
use path::{Axis, NodeTest, Predicate, Step};

use crate::error::ExtractError;

/// A compiled XML location path.
#[derive(Debug, Clone)]
pub struct XmlPath {
    steps: Vec<Step>,
}

/// A selected node: a tree node, or the n-th attribute of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NodeRef {
    Node(usize),
    Attribute(usize, usize),
}

impl XmlPath {
    pub fn compile(expr: &str) -> Result<Self, ExtractError> {
        let steps = path::compile(expr).map_err(|reason| ExtractError::XmlPath {
            expr: expr.to_owned(),
            reason,
        })?;
        Ok(Self { steps })
    }

    /// String content of every node matched in `body`, in document order.
    pub fn evaluate(&self, body: &[u8]) -> Result<Vec<String>, ExtractError> {
        let document = Document::parse(body)?;
        Ok(self
            .select(&document)
            .into_iter()
            .map(|node| string_value(&document, node))
            .collect())
    }

    fn select(&self, document: &Document) -> Vec<NodeRef> {
        let mut context = vec![NodeRef::Node(ROOT)];
        for step in &self.steps {
            // node ids are allocated in document order, so the set sorts and dedups
            let mut next = BTreeSet::new();
            for node in context {
                if let NodeRef::Node(id) = node {
                    apply_step(document, step, id, &mut next);
                }
            }
            context = next.into_iter().collect();
        }
        context
    }
}

fn apply_step(document: &Document, step: &Step, context: usize, out: &mut BTreeSet<NodeRef>) {
    let parents = match step.axis {
        Axis::Child => vec![context],
        Axis::Descendant => document.self_and_descendants(context),
    };
    for parent in parents {
        let mut candidates = candidates(document, &step.test, parent);
        for predicate in &step.predicates {
            candidates = filter(document, predicate, candidates);
        }
        out.extend(candidates);
    }
}

fn candidates(document: &Document, test: &NodeTest, parent: usize) -> Vec<NodeRef> {
    match test {
        NodeTest::Attribute(wanted) => document
            .attributes(parent)
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| name == wanted)
            .map(|(i, _)| NodeRef::Attribute(parent, i))
            .collect(),
        NodeTest::AnyAttribute => (0..document.attributes(parent).len())
            .map(|i| NodeRef::Attribute(parent, i))
            .collect(),
        _ => document
            .children(parent)
            .iter()
            .copied()
            .filter(|&id| matches_test(document, test, id))
            .map(NodeRef::Node)
            .collect(),
    }
}

fn matches_test(document: &Document, test: &NodeTest, id: usize) -> bool {
    match (test, document.kind(id)) {
        (NodeTest::Element(wanted), NodeKind::Element { name, .. }) => name == wanted,
        (NodeTest::AnyElement, NodeKind::Element { .. }) => true,
        (NodeTest::Text, NodeKind::Text(_)) => true,
        _ => false,
    }
}

fn filter(document: &Document, predicate: &Predicate, candidates: Vec<NodeRef>) -> Vec<NodeRef> {
    if let Predicate::Position(position) = predicate {
        return candidates.get(position - 1).copied().into_iter().collect();
    }
    candidates
        .into_iter()
        .filter(|&node| match node {
            NodeRef::Node(id) => matches_predicate(document, predicate, id),
            NodeRef::Attribute(..) => false,
        })
        .collect()
}

fn matches_predicate(document: &Document, predicate: &Predicate, id: usize) -> bool {
    let attribute = |wanted: &str| {
        document
            .attributes(id)
            .iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, value)| value.as_str())
    };
    let children = |wanted: &str| {
        document
            .children(id)
            .iter()
            .copied()
            .filter(move |&child| document.element_name(child) == Some(wanted))
            .collect::<Vec<_>>()
    };

    match predicate {
        Predicate::Position(_) => true,
        Predicate::HasAttribute(name) => attribute(name.as_str()).is_some(),
        Predicate::AttributeEquals(name, value) => {
            attribute(name.as_str()) == Some(value.as_str())
        }
        Predicate::HasChild(name) => !children(name.as_str()).is_empty(),
        Predicate::ChildEquals(name, value) => children(name.as_str())
            .into_iter()
            .any(|child| document.text_content(child) == *value),
    }
}

fn string_value(document: &Document, node: NodeRef) -> String {
    match node {
        NodeRef::Node(id) => document.text_content(id),
        NodeRef::Attribute(id, i) => document
            .attributes(id)
            .get(i)
            .map(|(_, value)| value.clone())
            .unwrap_or_default(),
    }
}
