use std::collections::HashMap;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) disabled: bool,
}

/// Flat-arena document tree. Nodes are never freed; identity is the
/// arena index, which stays valid for the lifetime of the page.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let disabled = attrs.contains_key("disabled");
        let element = Element {
            tag_name,
            attrs,
            value,
            disabled,
        };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = self
            .element(id)
            .and_then(|element| element.attrs.get("id").cloned())
        {
            self.id_index.insert(id_attr, id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        &self.nodes[node_id.0].children
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attrs.get(name).cloned())
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id)
            .map(|element| element.disabled)
            .unwrap_or(false)
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        self.element(node_id)
            .map(|element| element.value.clone())
            .ok_or_else(|| Error::Dom("value target is not an element".into()))
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("value target is not an element".into()))?;
        element.value = value.to_string();
        Ok(())
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node_id, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        match &self.nodes[node_id.0].node_type {
            NodeType::Text(text) => out.push_str(text),
            _ => {
                for child in &self.nodes[node_id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Document-order walk of all element nodes.
    pub(crate) fn elements_in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Nearest `<form>` ancestor, the element itself included.
    pub(crate) fn owning_form(&self, node_id: NodeId) -> Option<NodeId> {
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            if self
                .tag_name(node)
                .is_some_and(|tag| tag.eq_ignore_ascii_case("form"))
            {
                return Some(node);
            }
            cursor = self.parent(node);
        }
        None
    }

    /// Named, enabled controls inside a form, in document order, as
    /// they would be serialized into a submission body.
    pub(crate) fn form_fields(&self, form: NodeId) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        let mut stack: Vec<NodeId> = self.children(form).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if let Some(element) = self.element(node) {
                let tag = element.tag_name.to_ascii_lowercase();
                if matches!(tag.as_str(), "input" | "textarea" | "select") && !element.disabled {
                    if let Some(name) = element.attrs.get("name") {
                        if !name.is_empty() {
                            fields.push((name.clone(), element.value.clone()));
                        }
                    }
                }
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        fields
    }

    pub(crate) fn style_get(&self, node_id: NodeId, property: &str) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::Dom("style target is not an element".into()))?;
        let name = js_prop_to_css_name(property);
        let decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        Ok(decls
            .iter()
            .find(|(prop, _)| prop == &name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default())
    }

    pub(crate) fn style_set(&mut self, node_id: NodeId, property: &str, value: &str) -> Result<()> {
        let name = js_prop_to_css_name(property);
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("style target is not an element".into()))?;

        let mut decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        if let Some(pos) = decls.iter().position(|(prop, _)| prop == &name) {
            if value.is_empty() {
                decls.remove(pos);
            } else {
                decls[pos].1 = value.to_string();
            }
        } else if !value.is_empty() {
            decls.push((name, value.to_string()));
        }

        if decls.is_empty() {
            element.attrs.remove("style");
        } else {
            element
                .attrs
                .insert("style".to_string(), serialize_style_declarations(&decls));
        }

        Ok(())
    }
}

fn js_prop_to_css_name(prop: &str) -> String {
    if prop.contains('-') {
        return prop.to_ascii_lowercase();
    }
    let mut out = String::new();
    for ch in prop.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn parse_style_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };

    let mut start = 0usize;
    let mut i = 0usize;
    let bytes = style_attr.as_bytes();
    let mut paren_depth = 0isize;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let ch = bytes[i];
        match (quote, ch) {
            (Some(_), b'\\') => {
                if i + 1 < bytes.len() {
                    i += 2;
                    continue;
                }
            }
            (Some(q), _) if ch == q => {
                quote = None;
            }
            (Some(_), _) => {}
            (None, b'\'') | (None, b'"') => {
                quote = Some(ch);
            }
            (None, b'(') => paren_depth += 1,
            (None, b')') => paren_depth = paren_depth.saturating_sub(1),
            (None, b';') if paren_depth == 0 => {
                let decl = &style_attr[start..i];
                push_style_declaration(decl, &mut out);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    let decl = &style_attr[start..];
    push_style_declaration(decl, &mut out);

    out
}

fn push_style_declaration(raw_decl: &str, out: &mut Vec<(String, String)>) {
    let decl = raw_decl.trim();
    if decl.is_empty() {
        return;
    }

    let Some(colon) = decl.find(':') else {
        return;
    };

    let name = decl[..colon].trim().to_ascii_lowercase();
    if name.is_empty() {
        return;
    }

    let value = decl[colon + 1..].trim().to_string();

    if let Some(pos) = out.iter().position(|(existing, _)| existing == &name) {
        out[pos].1 = value;
    } else {
        out.push((name, value));
    }
}

fn serialize_style_declarations(decls: &[(String, String)]) -> String {
    let mut out = String::new();
    for (idx, (name, value)) in decls.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with_style(style: Option<&str>) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let mut attrs = HashMap::new();
        if let Some(style) = style {
            attrs.insert("style".to_string(), style.to_string());
        }
        let root = dom.root;
        let node = dom.create_element(root, "div".to_string(), attrs);
        (dom, node)
    }

    #[test]
    fn style_get_reads_inline_declaration() -> Result<()> {
        let (dom, node) = element_with_style(Some("display: none; color: red;"));
        assert_eq!(dom.style_get(node, "display")?, "none");
        assert_eq!(dom.style_get(node, "color")?, "red");
        assert_eq!(dom.style_get(node, "width")?, "");
        Ok(())
    }

    #[test]
    fn style_set_overwrites_without_duplicating() -> Result<()> {
        let (mut dom, node) = element_with_style(Some("display: none;"));
        dom.style_set(node, "display", "block")?;
        assert_eq!(dom.attr(node, "style").as_deref(), Some("display: block;"));
        Ok(())
    }

    #[test]
    fn style_set_empty_value_drops_attribute_when_last() -> Result<()> {
        let (mut dom, node) = element_with_style(Some("display: none;"));
        dom.style_set(node, "display", "")?;
        assert_eq!(dom.attr(node, "style"), None);
        Ok(())
    }

    #[test]
    fn camel_case_property_maps_to_kebab() -> Result<()> {
        let (mut dom, node) = element_with_style(None);
        dom.style_set(node, "backgroundColor", "green")?;
        assert_eq!(dom.style_get(node, "background-color")?, "green");
        Ok(())
    }

    #[test]
    fn quoted_semicolon_does_not_split_declarations() -> Result<()> {
        let (dom, node) =
            element_with_style(Some("background: url('a;b.png'); display: block;"));
        assert_eq!(dom.style_get(node, "display")?, "block");
        assert_eq!(dom.style_get(node, "background")?, "url('a;b.png')");
        Ok(())
    }

    #[test]
    fn form_fields_skip_unnamed_and_disabled_controls() {
        let mut dom = Dom::new();
        let root = dom.root;
        let form = dom.create_element(root, "form".to_string(), HashMap::new());
        let mut named = HashMap::new();
        named.insert("name".to_string(), "drink".to_string());
        named.insert("value".to_string(), "Pils".to_string());
        dom.create_element(form, "input".to_string(), named);
        dom.create_element(form, "input".to_string(), HashMap::new());
        let mut disabled = HashMap::new();
        disabled.insert("name".to_string(), "hidden".to_string());
        disabled.insert("disabled".to_string(), String::new());
        dom.create_element(form, "input".to_string(), disabled);

        assert_eq!(
            dom.form_fields(form),
            vec![("drink".to_string(), "Pils".to_string())]
        );
    }
}
