use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::error::ExtractError;

/// Id of the document node; element and text ids follow in document order.
pub(crate) const ROOT: usize = 0;

/// A parsed XML body, stored as an arena of nodes in document order.
#[derive(Debug)]
pub(crate) struct Document {
    nodes: Vec<Node>,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<usize>,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Root,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

impl Document {
    pub(crate) fn parse(body: &[u8]) -> Result<Self, ExtractError> {
        let mut reader = Reader::from_reader(body);
        let mut buf = Vec::new();
        let mut document = Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                children: Vec::new(),
            }],
        };
        // ids of the currently open elements, the document node at the bottom
        let mut open = vec![ROOT];

        loop {
            let parent = open.last().copied().unwrap_or(ROOT);
            match reader.read_event_into(&mut buf).map_err(ExtractError::malformed_xml)? {
                Event::Start(start) => {
                    let id = document.push_element(parent, &start)?;
                    open.push(id);
                }
                Event::Empty(start) => {
                    document.push_element(parent, &start)?;
                }
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(ExtractError::malformed_xml("unexpected closing tag"));
                    }
                    open.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(ExtractError::malformed_xml)?;
                    document.push_text(parent, text.into_owned());
                }
                Event::CData(data) => {
                    let text = String::from_utf8(data.into_inner().into_owned())
                        .map_err(ExtractError::malformed_xml)?;
                    document.push_text(parent, text);
                }
                Event::Eof => break,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
            buf.clear();
        }

        if open.len() > 1 {
            return Err(ExtractError::malformed_xml("unclosed element at end of document"));
        }
        if !document.children(ROOT).iter().any(|&id| document.is_element(id)) {
            return Err(ExtractError::malformed_xml("document has no root element"));
        }
        Ok(document)
    }

    fn push_element(&mut self, parent: usize, start: &BytesStart<'_>) -> Result<usize, ExtractError> {
        let name = utf8(start.local_name().as_ref())?.to_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(ExtractError::malformed_xml)?;
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = utf8(attr.key.local_name().as_ref())?.to_owned();
            let value = attr
                .unescape_value()
                .map_err(ExtractError::malformed_xml)?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(self.push(parent, NodeKind::Element { name, attributes }))
    }

    /// Adjacent text and CDATA under one parent form a single text node.
    fn push_text(&mut self, parent: usize, text: String) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last].kind {
                existing.push_str(&text);
                return;
            }
        }
        self.push(parent, NodeKind::Text(text));
    }

    fn push(&mut self, parent: usize, kind: NodeKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub(crate) fn kind(&self, id: usize) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub(crate) fn children(&self, id: usize) -> &[usize] {
        &self.nodes[id].children
    }

    pub(crate) fn is_element(&self, id: usize) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    pub(crate) fn element_name(&self, id: usize) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub(crate) fn attributes(&self, id: usize) -> &[(String, String)] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// `id` followed by all of its descendants, in document order.
    pub(crate) fn self_and_descendants(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Concatenated text of the node and everything below it.
    pub(crate) fn text_content(&self, id: usize) -> String {
        let mut out = String::new();
        for node in self.self_and_descendants(id) {
            if let NodeKind::Text(text) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, ExtractError> {
    std::str::from_utf8(bytes).map_err(ExtractError::malformed_xml)
}
