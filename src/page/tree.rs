//! Arena-backed element tree implementing [`Document`].
//!
//! Nodes are never freed: removing a node only detaches it, so a [`NodeId`]
//! stays valid for the life of the tree.

use super::{Document, NodeId, PageError};
use crate::config::PageConfig;
use crate::markup::container_class;
use crate::sizing::TierList;
use crate::story::Story;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// In-memory page: a `body` root and everything below it.
#[derive(Debug, Clone)]
pub struct PageTree {
    nodes: Vec<Element>,
}

impl PageTree {
    /// Empty page whose `body` carries `body_class`.
    pub fn new(body_class: &str) -> Self {
        let mut body = Element::new("body");
        if !body_class.is_empty() {
            body.attributes
                .insert("class".to_string(), body_class.to_string());
        }
        Self { nodes: vec![body] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Create an element and attach it as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, PageError> {
        self.get(parent)?;
        let node = self.create_element(tag);
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.push(node);
        Ok(node)
    }

    /// Text content of an element (headings and captions).
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|e| e.text.as_str())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }

    /// Inline style property previously set with [`Document::set_style`].
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.nodes
            .get(node.0)
            .and_then(|e| e.styles.get(property))
            .map(String::as_str)
    }

    /// First attached element whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root()).into_iter().find(|&node| {
            self.nodes[node.0]
                .attributes
                .get("id")
                .is_some_and(|v| v == id)
        })
    }

    /// Build the same structure the story page renderer emits.
    ///
    /// ```text
    /// body.story
    /// ├── h1 (title)
    /// └── div#pic0.pic.size1600x1200
    ///     ├── noscript
    ///     │   └── img[src=...w800.jpg]
    ///     └── div.caption
    /// ```
    pub fn from_story(story: &Story, tiers: &TierList, page: &PageConfig) -> Self {
        let mut tree = Self::new(&page.story_class);
        let root = tree.root();

        let title = tree.attach(root, "h1");
        tree.put_text(title, &story.title);

        for (index, pic) in story.pics.iter().enumerate() {
            let container = tree.attach(root, "div");
            tree.put_attribute(container, "id", &Story::pic_id(index));
            tree.put_attribute(container, "class", &container_class(pic.dimensions(), "pic"));

            let noscript = tree.attach(container, "noscript");
            let img = tree.attach(noscript, "img");
            if let Some(largest) = tiers.largest() {
                let src = story.pic_url(pic, largest, &page.image_extension);
                tree.put_attribute(img, "src", &src);
            }
            tree.put_attribute(img, "alt", &pic.alt_text());

            if let Some(caption) = &pic.caption {
                let block = tree.attach(container, "div");
                tree.put_attribute(block, "class", "caption");
                tree.put_text(block, caption);
            }
        }
        tree
    }

    fn attach(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = NodeId(self.nodes.len());
        let mut element = Element::new(tag);
        element.parent = Some(parent);
        self.nodes.push(element);
        self.nodes[parent.0].children.push(node);
        node
    }

    fn put_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
    }

    fn put_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            out.push(node);
            // Reverse so the leftmost child is visited first
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    fn get(&self, node: NodeId) -> Result<&Element, PageError> {
        self.nodes.get(node.0).ok_or(PageError::UnknownNode(node))
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut Element, PageError> {
        self.nodes
            .get_mut(node.0)
            .ok_or(PageError::UnknownNode(node))
    }
}

impl Document for PageTree {
    fn root_class(&self) -> String {
        self.class_name(self.root())
    }

    fn images(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&node| self.nodes[node.0].tag == "img")
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|e| e.parent)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node.0).map(|e| e.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get(node.0)
            .and_then(|e| e.attributes.get(name))
            .cloned()
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), PageError> {
        self.get(child)?;
        let siblings = &mut self.get_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|&c| c == child)
            .ok_or(PageError::NotAChild { parent, child })?;
        siblings.remove(position);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: NodeId,
    ) -> Result<(), PageError> {
        if node == self.root() || self.get(node)?.parent.is_some() {
            return Err(PageError::AlreadyAttached(node));
        }
        let siblings = &mut self.get_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|&c| c == reference)
            .ok_or(PageError::NotAChild {
                parent,
                child: reference,
            })?;
        siblings.insert(position, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), PageError> {
        self.get_mut(node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), PageError> {
        self.get_mut(node)?
            .styles
            .insert(property.to_string(), value.to_string());
        Ok(())
    }
}
