//! XSD schema parser.
//!
//! Reads an XSD document with roxmltree and builds the internal model.
//! Covers the subset needed for generation: top-level elements, named and
//! inline types, sequence/all/choice content, attributes, restriction
//! facets, and simpleContent/complexContent extension. Element and type
//! references resolve against the named tables with a depth guard, so
//! recursive schemas terminate.

use super::model::{
    AttributeUse, ContentModel, XsdAttribute, XsdComplexType, XsdElement, XsdSchema,
    XsdSimpleType,
};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

// Recursive type definitions bottom out here instead of recursing
// forever; the cut-off node becomes a plain string leaf.
const MAX_TYPE_DEPTH: u32 = 32;

#[derive(Debug, Error)]
pub enum XsdParseError {
    #[error("XSD file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read XSD file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid XML in XSD document: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("not an XSD schema document (root element is <{0}>)")]
    NotASchema(String),
}

/// Per-path facts used by the meta-file scaffold.
#[derive(Debug, Clone)]
pub struct FieldPathInfo {
    pub path: String,
    pub min_occurs: u32,
    pub max_occurs: Option<u32>,
    pub nillable: bool,
    pub enumeration: Option<Vec<String>>,
    pub pattern: Option<String>,
}

/// Parses an XSD file into the internal schema model.
pub fn parse_xsd(xsd_path: impl AsRef<Path>) -> Result<XsdSchema, XsdParseError> {
    let xsd_path = xsd_path.as_ref();
    if !xsd_path.exists() {
        return Err(XsdParseError::NotFound(xsd_path.to_path_buf()));
    }
    let text = std::fs::read_to_string(xsd_path)?;
    parse_xsd_str(&text)
}

/// Parses an XSD document held in memory.
pub fn parse_xsd_str(text: &str) -> Result<XsdSchema, XsdParseError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if !is_xs(&root, "schema") {
        return Err(XsdParseError::NotASchema(
            root.tag_name().name().to_string(),
        ));
    }

    let ctx = ParseCtx::collect(&root);

    let mut schema = XsdSchema {
        target_namespace: root.attribute("targetNamespace").map(str::to_string),
        element_form_default: root
            .attribute("elementFormDefault")
            .unwrap_or("unqualified")
            .to_string(),
        ..XsdSchema::default()
    };

    for node in root.children().filter(|n| is_xs(n, "element")) {
        schema.root_elements.push(ctx.parse_element(&node, "", 0));
    }

    for (name, node) in &ctx.simple_types {
        schema
            .named_simple_types
            .insert(name.clone(), ctx.parse_simple_type(node, 0));
    }
    for (name, node) in &ctx.complex_types {
        schema
            .named_complex_types
            .insert(name.clone(), ctx.parse_named_complex(name, node));
    }

    Ok(schema)
}

/// Top-level declarations by local name, for reference resolution.
struct ParseCtx<'a, 'input> {
    simple_types: HashMap<String, Node<'a, 'input>>,
    complex_types: HashMap<String, Node<'a, 'input>>,
    top_elements: HashMap<String, Node<'a, 'input>>,
}

impl<'a, 'input> ParseCtx<'a, 'input> {
    fn collect(schema_root: &Node<'a, 'input>) -> Self {
        let mut ctx = Self {
            simple_types: HashMap::new(),
            complex_types: HashMap::new(),
            top_elements: HashMap::new(),
        };
        for node in schema_root.children().filter(Node::is_element) {
            let Some(name) = node.attribute("name") else {
                continue;
            };
            if is_xs(&node, "simpleType") {
                ctx.simple_types.insert(name.to_string(), node);
            } else if is_xs(&node, "complexType") {
                ctx.complex_types.insert(name.to_string(), node);
            } else if is_xs(&node, "element") {
                ctx.top_elements.insert(name.to_string(), node);
            }
        }
        ctx
    }

    fn parse_element(&self, node: &Node<'a, 'input>, parent_path: &str, depth: u32) -> XsdElement {
        // Occurrence constraints belong to the reference site; the rest
        // of the declaration comes from the target.
        if let Some(reference) = node.attribute("ref") {
            let target = self.top_elements.get(local_name(reference));
            if let Some(target) = target {
                let mut element = self.parse_element(target, parent_path, depth);
                element.min_occurs = parse_occurs(node.attribute("minOccurs")).unwrap_or(Some(1)).unwrap_or(1);
                element.max_occurs = parse_occurs(node.attribute("maxOccurs")).unwrap_or(Some(1));
                return element;
            }
        }

        let name = node.attribute("name").unwrap_or("unknown");
        let full_path = format!("{parent_path}/{name}");
        let mut element = XsdElement::new(name, full_path);
        element.min_occurs = parse_occurs(node.attribute("minOccurs"))
            .unwrap_or(Some(1))
            .unwrap_or(1);
        element.max_occurs = parse_occurs(node.attribute("maxOccurs")).unwrap_or(Some(1));
        element.nillable = node.attribute("nillable") == Some("true");

        if depth > MAX_TYPE_DEPTH {
            element.type_def = Some(XsdSimpleType::default());
            return element;
        }

        if let Some(type_name) = node.attribute("type") {
            let local = local_name(type_name);
            if let Some(ct) = self.complex_types.get(local) {
                self.apply_complex(&mut element, ct, depth);
            } else {
                element.type_def = Some(self.resolve_simple(type_name, depth));
            }
        } else if let Some(inline) = find_xs_child(node, "complexType") {
            self.apply_complex(&mut element, &inline, depth);
        } else if let Some(inline) = find_xs_child(node, "simpleType") {
            element.type_def = Some(self.parse_simple_type(&inline, depth));
        } else {
            element.type_def = Some(XsdSimpleType::default());
        }

        if element.is_leaf() && element.type_def.is_none() {
            element.type_def = Some(XsdSimpleType::default());
        }

        element
    }

    fn apply_complex(&self, element: &mut XsdElement, ct_node: &Node<'a, 'input>, depth: u32) {
        for child in ct_node.children().filter(is_xs_element) {
            let name = child.tag_name().name();
            match name {
                "attribute" => element.attributes.push(self.parse_attribute(&child, depth)),
                "sequence" | "all" | "choice" => {
                    element.content_model = content_model(name);
                    element
                        .children
                        .extend(self.parse_particles(&child, &element.full_path, depth));
                }
                "simpleContent" => {
                    // Text content typed by the extension base, plus the
                    // extension's own attributes.
                    if let Some(ext) = find_xs_child(&child, "extension")
                        .or_else(|| find_xs_child(&child, "restriction"))
                    {
                        if let Some(base) = ext.attribute("base") {
                            element.type_def = Some(self.resolve_simple(base, depth));
                        }
                        for attr in ext.children().filter(|n| is_xs(n, "attribute")) {
                            element.attributes.push(self.parse_attribute(&attr, depth));
                        }
                    }
                }
                "complexContent" => {
                    if let Some(ext) = find_xs_child(&child, "extension")
                        .or_else(|| find_xs_child(&child, "restriction"))
                    {
                        if let Some(base) = ext.attribute("base") {
                            if let Some(base_ct) = self.complex_types.get(local_name(base)) {
                                if depth < MAX_TYPE_DEPTH {
                                    self.apply_complex(element, base_ct, depth + 1);
                                }
                            }
                        }
                        self.apply_complex(element, &ext, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_particles(
        &self,
        group: &Node<'a, 'input>,
        parent_path: &str,
        depth: u32,
    ) -> Vec<XsdElement> {
        let mut children = Vec::new();
        for item in group.children().filter(is_xs_element) {
            match item.tag_name().name() {
                "element" => children.push(self.parse_element(&item, parent_path, depth + 1)),
                // Nested groups flatten into the parent's child list.
                "sequence" | "all" | "choice" => {
                    children.extend(self.parse_particles(&item, parent_path, depth))
                }
                _ => {}
            }
        }
        children
    }

    fn parse_attribute(&self, node: &Node<'a, 'input>, depth: u32) -> XsdAttribute {
        let mut attribute = XsdAttribute::new(node.attribute("name").unwrap_or("unknown"));
        attribute.usage = if node.attribute("use") == Some("required") {
            AttributeUse::Required
        } else {
            AttributeUse::Optional
        };
        attribute.default = node.attribute("default").map(str::to_string);
        attribute.fixed = node.attribute("fixed").map(str::to_string);

        if let Some(type_name) = node.attribute("type") {
            attribute.type_def = self.resolve_simple(type_name, depth);
        } else if let Some(inline) = find_xs_child(node, "simpleType") {
            attribute.type_def = self.parse_simple_type(&inline, depth);
        }
        attribute
    }

    fn resolve_simple(&self, type_name: &str, depth: u32) -> XsdSimpleType {
        let local = local_name(type_name);
        if depth <= MAX_TYPE_DEPTH {
            if let Some(node) = self.simple_types.get(local) {
                return self.parse_simple_type(node, depth + 1);
            }
        }
        XsdSimpleType::with_base(local)
    }

    fn parse_simple_type(&self, node: &Node<'a, 'input>, depth: u32) -> XsdSimpleType {
        let name = node.attribute("name").map(str::to_string);

        if let Some(restriction) = find_xs_child(node, "restriction") {
            // Start from the base so derived restrictions inherit its
            // facets, then apply the local ones on top.
            let mut simple = match restriction.attribute("base") {
                Some(base) => self.resolve_simple(base, depth),
                None => XsdSimpleType::default(),
            };
            simple.name = name;
            self.apply_facets(&mut simple, &restriction);
            return simple;
        }

        if let Some(list) = find_xs_child(node, "list") {
            if let Some(item) = list.attribute("itemType") {
                let mut simple = self.resolve_simple(item, depth);
                simple.name = name;
                return simple;
            }
        }

        if let Some(union) = find_xs_child(node, "union") {
            if let Some(members) = union.attribute("memberTypes") {
                if let Some(first) = members.split_whitespace().next() {
                    let mut simple = self.resolve_simple(first, depth);
                    simple.name = name;
                    return simple;
                }
            }
            if let Some(inline) = find_xs_child(&union, "simpleType") {
                let mut simple = self.parse_simple_type(&inline, depth);
                simple.name = name;
                return simple;
            }
        }

        XsdSimpleType {
            name,
            ..XsdSimpleType::default()
        }
    }

    fn apply_facets(&self, simple: &mut XsdSimpleType, restriction: &Node) {
        let mut enumeration: Vec<String> = Vec::new();

        for facet in restriction.children().filter(is_xs_element) {
            let value = facet.attribute("value").unwrap_or("");
            match facet.tag_name().name() {
                "enumeration" => enumeration.push(value.to_string()),
                "pattern" => {
                    if simple.pattern.is_none() {
                        simple.pattern = Some(value.to_string());
                    }
                }
                "minInclusive" => simple.min_value = value.parse().ok(),
                "maxInclusive" => simple.max_value = value.parse().ok(),
                // Exclusive bounds folded into inclusive ones.
                "minExclusive" => simple.min_value = value.parse::<f64>().ok().map(exclusive_min),
                "maxExclusive" => simple.max_value = value.parse::<f64>().ok().map(exclusive_max),
                "minLength" => simple.min_length = value.parse().ok(),
                "maxLength" => simple.max_length = value.parse().ok(),
                "length" => {
                    simple.min_length = value.parse().ok();
                    simple.max_length = value.parse().ok();
                }
                "totalDigits" => simple.total_digits = value.parse().ok(),
                "fractionDigits" => simple.fraction_digits = value.parse().ok(),
                _ => {}
            }
        }

        if !enumeration.is_empty() {
            simple.enumeration = Some(enumeration);
        }
    }

    fn parse_named_complex(&self, name: &str, node: &Node<'a, 'input>) -> XsdComplexType {
        let mut carrier = XsdElement::new(name, "");
        self.apply_complex(&mut carrier, node, 0);
        XsdComplexType {
            name: name.to_string(),
            children: carrier.children,
            attributes: carrier.attributes,
            content_model: carrier.content_model,
            mixed: node.attribute("mixed") == Some("true"),
        }
    }
}

/// Extracts every leaf and attribute path from a schema, for meta-file
/// scaffolding.
pub fn extract_field_paths(schema: &XsdSchema) -> Vec<FieldPathInfo> {
    let mut paths = Vec::new();
    for root in &schema.root_elements {
        extract_paths_recursive(root, &mut paths);
    }
    paths
}

fn extract_paths_recursive(element: &XsdElement, paths: &mut Vec<FieldPathInfo>) {
    if element.is_leaf() {
        paths.push(FieldPathInfo {
            path: element.full_path.clone(),
            min_occurs: element.min_occurs,
            max_occurs: element.max_occurs,
            nillable: element.nillable,
            enumeration: element
                .type_def
                .as_ref()
                .and_then(|t| t.enumeration.clone()),
            pattern: element.type_def.as_ref().and_then(|t| t.pattern.clone()),
        });
    }

    for attribute in &element.attributes {
        paths.push(FieldPathInfo {
            path: format!("{}/@{}", element.full_path, attribute.name),
            min_occurs: u32::from(attribute.usage == AttributeUse::Required),
            max_occurs: Some(1),
            nillable: false,
            enumeration: attribute.type_def.enumeration.clone(),
            pattern: attribute.type_def.pattern.clone(),
        });
    }

    for child in &element.children {
        extract_paths_recursive(child, paths);
    }
}

fn is_xs(node: &Node, name: &str) -> bool {
    is_xs_element(node) && node.tag_name().name() == name
}

fn is_xs_element(node: &Node) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(XS_NAMESPACE)
}

fn find_xs_child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_xs(n, name))
}

fn local_name(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

fn content_model(token: &str) -> ContentModel {
    match token {
        "all" => ContentModel::All,
        "choice" => ContentModel::Choice,
        _ => ContentModel::Sequence,
    }
}

/// `minOccurs`/`maxOccurs` attribute: `Ok(None)` is unbounded, outer
/// `None` means the attribute was absent.
#[allow(clippy::option_option)]
fn parse_occurs(value: Option<&str>) -> Option<Option<u32>> {
    match value {
        None => None,
        Some("unbounded") => Some(None),
        Some(v) => Some(Some(v.parse().unwrap_or(1))),
    }
}

fn exclusive_min(v: f64) -> f64 {
    if v.fract() == 0.0 {
        v + 1.0
    } else {
        v
    }
}

fn exclusive_max(v: f64) -> f64 {
    if v.fract() == 0.0 {
        v - 1.0
    } else {
        v
    }
}
