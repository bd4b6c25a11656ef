//! A detached element tree built from selector shorthand.
//!
//! `el("h2.device-name#title", ["text"])` creates an `<h2>` with class
//! `device-name`, id `title` and one text child. An empty tag name defaults
//! to `div`. Trees are platform independent: the viewer converts them into
//! browser nodes and the CLI serializes them with [`Fragment::to_html`].

use std::fmt::Write;

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta", "wbr"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text_content(&self) -> String {
        match self {
            Node::Element(element) => element.text_content(),
            Node::Text(text) => text.clone(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_html(out),
            Node::Text(text) => out.push_str(&html_escape(text)),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Build an element from selector shorthand plus children.
pub fn el<I>(selector: &str, children: I) -> Element
where
    I: IntoIterator,
    I::Item: Into<Node>,
{
    let mut element = parse_selector(selector);
    element.children.extend(children.into_iter().map(Into::into));
    element
}

fn parse_selector(selector: &str) -> Element {
    const MARKERS: &[char] = &['.', '#', '['];

    let tag_end = selector.find(MARKERS).unwrap_or(selector.len());
    let tag = match &selector[..tag_end] {
        "" => "div",
        tag => tag,
    };
    let mut element = Element::new(tag);

    let mut rest = &selector[tag_end..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[marker.len_utf8()..];
        if marker == '[' {
            let end = body.find(']').unwrap_or(body.len());
            let (name, value) = match body[..end].split_once('=') {
                Some((name, value)) => (name, value.trim_matches(|c| c == '"' || c == '\'')),
                None => (&body[..end], ""),
            };
            if !name.trim().is_empty() {
                element.set_attribute(name.trim(), value);
            }
            rest = body.get(end + 1..).unwrap_or("");
            continue;
        }

        let end = body.find(MARKERS).unwrap_or(body.len());
        let token = &body[..end];
        if !token.is_empty() {
            if marker == '.' {
                element.classes.push(token.to_string());
            } else {
                element.id = Some(token.to_string());
            }
        }
        rest = &body[end..];
    }
    element
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Attributes other than `id` and `class`, in insertion order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    /// Set a `data-*` attribute; camelCase keys become kebab-case.
    pub fn set_data(&mut self, key: &str, value: &str) {
        let mut name = String::from("data-");
        for c in key.chars() {
            if c.is_ascii_uppercase() {
                name.push('-');
                name.push(c.to_ascii_lowercase());
            } else {
                name.push(c);
            }
        }
        self.set_attribute(&name, value);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    /// All descendants (including `self`) carrying `class`, in document order.
    pub fn find_all<'a>(&'a self, class: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_class(class, &mut found);
        found
    }

    fn collect_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        if self.has_class(class) {
            found.push(self);
        }
        for child in &self.children {
            if let Node::Element(element) = child {
                element.collect_class(class, found);
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = &self.id {
            let _ = write!(out, " id=\"{}\"", html_escape(id));
        }
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", html_escape(&self.classes.join(" ")));
        }
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"{}\"", html_escape(value));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// A list of sibling nodes with no parent element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.nodes.push(node.into());
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn text_content(&self) -> String {
        self.nodes.iter().map(Node::text_content).collect()
    }

    pub fn find_all<'a>(&'a self, class: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        for node in &self.nodes {
            if let Node::Element(element) = node {
                element.collect_class(class, &mut found);
            }
        }
        found
    }

    pub fn find_first<'a>(&'a self, class: &str) -> Option<&'a Element> {
        self.find_all(class).into_iter().next()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
