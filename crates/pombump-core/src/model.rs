//! POM document model backed by a retained XML tree.
//!
//! Parses a pom.xml into a generic element tree with quick-xml, keeping every
//! element in document order so that sections this tool does not understand
//! (parent, build, profiles, ...) survive a parse/marshal round trip. Typed
//! accessors expose the three sections the patch pipeline mutates:
//! `dependencies`, `dependencyManagement/dependencies` and `properties`.
//!
//! Comments are not retained by the model; the `comments` module re-inserts
//! them into the marshaled text.

use crate::error::{PombumpError, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::BTreeMap;
use std::path::Path;

/// One POM dependency. Empty `scope`/`type` means the POM default applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub scope: String,
    pub dep_type: String,
}

impl Dependency {
    /// Canonical identifier: "{groupId}:{artifactId}".
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

/// Which dependency list a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySection {
    Direct,
    Management,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn with_text(name: &str, text: &str) -> Self {
        let mut el = Self::new(name);
        el.children.push(XmlNode::Text(text.to_string()));
        el
    }

    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|n| match n {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|n| match n {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter_map(move |n| match n {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> {
        self.children.iter_mut().filter_map(move |n| match n {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Text content of this element (first text child, if any).
    fn text(&self) -> &str {
        self.children
            .iter()
            .find_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .unwrap_or("")
    }

    /// Appends text, merging with a trailing text node so that content
    /// split across parser events stays contiguous.
    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(existing)) = self.children.last_mut() {
            existing.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    /// Trims boundary whitespace from text children and drops the
    /// whitespace-only runs that sit between child elements.
    fn trim_text_children(&mut self) {
        for node in &mut self.children {
            if let XmlNode::Text(t) = node {
                let trimmed = t.trim();
                if trimmed.len() != t.len() {
                    *t = trimmed.to_string();
                }
            }
        }
        self.children
            .retain(|n| !matches!(n, XmlNode::Text(t) if t.is_empty()));
    }

    fn child_text(&self, name: &str) -> &str {
        self.child(name).map_or("", |c| c.text())
    }

    fn set_child_text(&mut self, name: &str, value: &str) {
        if let Some(child) = self.child_mut(name) {
            child.children = vec![XmlNode::Text(value.to_string())];
        } else {
            self.children
                .push(XmlNode::Element(XmlElement::with_text(name, value)));
        }
    }

    fn ensure_child(&mut self, name: &str) -> &mut XmlElement {
        let idx = self
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.name == name));
        let idx = match idx {
            Some(i) => i,
            None => {
                self.children.push(XmlNode::Element(XmlElement::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[idx] {
            XmlNode::Element(e) => e,
            XmlNode::Text(_) => unreachable!("ensure_child indexes an element node"),
        }
    }
}

/// A parsed POM document.
#[derive(Debug, Clone)]
pub struct Project {
    root: XmlElement,
    has_decl: bool,
}

impl std::str::FromStr for Project {
    type Err = PombumpError;

    fn from_str(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut has_decl = false;

        loop {
            match reader.read_event()? {
                Event::Decl(_) => has_decl = true,
                Event::Start(ref e) => {
                    let mut el = XmlElement::new(&String::from_utf8_lossy(e.name().as_ref()));
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| PombumpError::ParseError {
                            message: e.to_string(),
                        })?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| PombumpError::ParseError {
                                message: e.to_string(),
                            })?
                            .into_owned();
                        el.attributes.push((key, value));
                    }
                    stack.push(el);
                }
                Event::Empty(ref e) => {
                    let mut el = XmlElement::new(&String::from_utf8_lossy(e.name().as_ref()));
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| PombumpError::ParseError {
                            message: e.to_string(),
                        })?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| PombumpError::ParseError {
                                message: e.to_string(),
                            })?
                            .into_owned();
                        el.attributes.push((key, value));
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(el)),
                        None if root.is_none() => root = Some(el),
                        None => {}
                    }
                }
                Event::Text(ref e) => {
                    // Whitespace is kept here so that text split around
                    // entity references reassembles intact; boundary
                    // whitespace is trimmed when the element closes.
                    let text = match e.decode() {
                        Ok(cow) => {
                            let s = cow.into_owned();
                            quick_xml::escape::unescape(&s)
                                .map(|c| c.into_owned())
                                .unwrap_or(s)
                        }
                        Err(_) => String::from_utf8_lossy(e.as_ref()).to_string(),
                    };
                    if !text.is_empty()
                        && let Some(parent) = stack.last_mut()
                    {
                        parent.push_text(&text);
                    }
                }
                // An entity reference inside text: `a &amp;&amp; b` arrives
                // as Text("a "), two GeneralRefs, Text(" b"). Resolved and
                // merged back into one text node.
                Event::GeneralRef(ref e) => {
                    let name = e.decode().map_err(|e| PombumpError::ParseError {
                        message: e.to_string(),
                    })?;
                    let resolved = match e.resolve_char_ref().map_err(|e| {
                        PombumpError::ParseError {
                            message: e.to_string(),
                        }
                    })? {
                        Some(ch) => ch.to_string(),
                        None => quick_xml::escape::resolve_xml_entity(&name)
                            .map_or_else(|| format!("&{name};"), ToString::to_string),
                    };
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(&resolved);
                    }
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(&text);
                    }
                }
                Event::End(_) => {
                    if let Some(mut el) = stack.pop() {
                        el.trim_text_children();
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(XmlNode::Element(el)),
                            None => root = Some(el),
                        }
                    }
                }
                Event::Eof => break,
                // Comments, PIs and doctype are dropped; the comments module
                // restores comments after marshaling.
                _ => {}
            }
        }

        let root = root.ok_or_else(|| PombumpError::ParseError {
            message: "document has no root element".into(),
        })?;
        if root.name != "project" {
            return Err(PombumpError::ParseError {
                message: format!("root element is <{}>, expected <project>", root.name),
            });
        }

        Ok(Self { root, has_decl })
    }
}

impl Project {
    /// Parses the POM at `path`.
    pub fn parse(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PombumpError::NotFound {
                    path: path.display().to_string(),
                    source: e,
                }
            } else {
                PombumpError::Io(e)
            }
        })?;
        content.parse()
    }

    /// Direct dependencies, in document order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.root
            .child("dependencies")
            .map(collect_dependencies)
            .unwrap_or_default()
    }

    /// dependencyManagement entries, in document order.
    pub fn managed_dependencies(&self) -> Vec<Dependency> {
        self.root
            .child("dependencyManagement")
            .and_then(|dm| dm.child("dependencies"))
            .map(collect_dependencies)
            .unwrap_or_default()
    }

    /// The `<properties>` table.
    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        if let Some(section) = self.root.child("properties") {
            for node in &section.children {
                if let XmlNode::Element(e) = node {
                    props.insert(e.name.clone(), e.text().to_string());
                }
            }
        }
        props
    }

    /// Overwrites the version of every `(groupId, artifactId)` match in the
    /// given section, leaving scope and type untouched. Returns the number of
    /// entries updated.
    pub fn update_dependency_version(
        &mut self,
        section: DependencySection,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> usize {
        let container = match section {
            DependencySection::Direct => self.root.child_mut("dependencies"),
            DependencySection::Management => self
                .root
                .child_mut("dependencyManagement")
                .and_then(|dm| dm.child_mut("dependencies")),
        };
        let Some(container) = container else {
            return 0;
        };

        let mut updated = 0;
        for dep in container.children_named_mut("dependency") {
            if dep.child_text("groupId") == group_id && dep.child_text("artifactId") == artifact_id
            {
                dep.set_child_text("version", version);
                updated += 1;
            }
        }
        updated
    }

    /// Appends a new entry to `dependencyManagement/dependencies`, creating
    /// the containers if absent.
    pub fn add_managed_dependency(&mut self, dep: &Dependency) {
        let container = self
            .root
            .ensure_child("dependencyManagement")
            .ensure_child("dependencies");

        let mut el = XmlElement::new("dependency");
        el.children.push(XmlNode::Element(XmlElement::with_text(
            "groupId",
            &dep.group_id,
        )));
        el.children.push(XmlNode::Element(XmlElement::with_text(
            "artifactId",
            &dep.artifact_id,
        )));
        el.children.push(XmlNode::Element(XmlElement::with_text(
            "version",
            &dep.version,
        )));
        if !dep.dep_type.is_empty() {
            el.children.push(XmlNode::Element(XmlElement::with_text(
                "type",
                &dep.dep_type,
            )));
        }
        if !dep.scope.is_empty() {
            el.children.push(XmlNode::Element(XmlElement::with_text(
                "scope", &dep.scope,
            )));
        }
        container.children.push(XmlNode::Element(el));
    }

    /// Creates or replaces a `<properties>` entry.
    pub fn set_property(&mut self, name: &str, value: &str) {
        self.root
            .ensure_child("properties")
            .set_child_text(name, value);
    }

    /// Serializes the document as pretty-printed XML, one tag per line.
    pub fn marshal(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        if self.has_decl {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(|e| PombumpError::SerializeError(e.to_string()))?;
        }
        write_element(&mut writer, &self.root)?;
        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }
}

fn collect_dependencies(container: &XmlElement) -> Vec<Dependency> {
    container
        .children_named("dependency")
        .map(|el| Dependency {
            group_id: el.child_text("groupId").to_string(),
            artifact_id: el.child_text("artifactId").to_string(),
            version: el.child_text("version").to_string(),
            scope: el.child_text("scope").to_string(),
            dep_type: el.child_text("type").to_string(),
        })
        .collect()
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, el: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| PombumpError::SerializeError(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| PombumpError::SerializeError(e.to_string()))?;
    for child in &el.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(|e| PombumpError::SerializeError(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(|e| PombumpError::SerializeError(e.to_string()))?;
    Ok(())
}
