//! XML document generation from an XSD schema model.
//!
//! The emitter builds an owned node tree by recursive descent, then
//! serializes it with quick-xml. Validation runs against the parsed
//! schema model itself: structure, occurrence bounds, enumeration
//! membership, lexical checks, and nillable/nil consistency.

use crate::generation::distributions::{DistributionConfig, DistributionEngine};
use crate::generation::values::{ValueRegistry, XsdValueGenerator};
use crate::meta::MetaConfig;
use crate::xsd::model::{
    AttributeUse, ContentModel, XsdAttribute, XsdElement, XsdSchema, XsdSimpleType,
};
use crate::xsd::parser::{parse_xsd, XsdParseError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

// Internal knob for "emit the declared default instead of a fresh value".
const USE_DEFAULT_GATE: &str = "_use_default";

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("schema has no root elements")]
    NoRootElement,

    #[error("failed to generate root element")]
    RootNotEmitted,

    #[error(transparent)]
    Parse(#[from] XsdParseError),

    #[error("failed to serialize generated XML: {0}")]
    Serialize(#[from] quick_xml::Error),

    #[error("generated XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("generated XML failed validation:\n{}", .0.join("\n"))]
    Validation(Vec<String>),
}

/// One generated element: name, attributes, text or children, and the
/// nil marker.
#[derive(Debug, Clone, Default)]
pub struct GenNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<GenNode>,
    pub nil: bool,
}

impl GenNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn nil(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nil: true,
            ..Self::default()
        }
    }

    fn contains_nil(&self) -> bool {
        self.nil || self.children.iter().any(GenNode::contains_nil)
    }
}

/// Generates random but schema-conforming XML documents.
pub struct XmlGenerator {
    schema: XsdSchema,
    /// Effective semantic type per path: field overrides win over the
    /// semanticTypes map.
    semantic_types: BTreeMap<String, String>,
    distribution: DistributionEngine,
    registry: ValueRegistry,
    xsd_values: XsdValueGenerator,
}

impl XmlGenerator {
    pub fn new(
        schema: XsdSchema,
        meta: Option<&MetaConfig>,
        distribution: Option<DistributionConfig>,
        seed: Option<u64>,
    ) -> Self {
        let mut config = distribution.unwrap_or_default();
        if seed.is_some() {
            config.seed = seed;
        }

        let mut semantic_types = BTreeMap::new();
        if let Some(meta) = meta {
            for (path, token) in &meta.generation.semantic_types {
                if let Some(token) = token {
                    semantic_types.insert(path.clone(), token.clone());
                }
            }
            for (path, override_) in &meta.generation.field_overrides {
                if let Some(token) = &override_.semantic_type {
                    semantic_types.insert(path.clone(), token.clone());
                }
            }
        }

        let seed = config.seed;
        Self {
            schema,
            semantic_types,
            distribution: DistributionEngine::new(config),
            registry: ValueRegistry::new(seed),
            xsd_values: XsdValueGenerator::new(seed),
        }
    }

    /// Generates one document tree rooted at the schema's first root
    /// element.
    pub fn generate(&mut self) -> Result<GenNode, GeneratorError> {
        let root_def = self
            .schema
            .primary_root()
            .cloned()
            .ok_or(GeneratorError::NoRootElement)?;
        self.emit_element(&root_def)
            .ok_or(GeneratorError::RootNotEmitted)
    }

    /// Generates one document and serializes it with a standard prologue.
    /// The `xsi` namespace is bound on the root only when some element
    /// actually carries `xsi:nil`.
    pub fn generate_string(&mut self, pretty: bool) -> Result<String, GeneratorError> {
        let root = self.generate()?;
        serialize(&root, pretty)
    }

    fn emit_element(&mut self, def: &XsdElement) -> Option<GenNode> {
        if def.is_optional() && !self.distribution.should_include_optional(&def.full_path) {
            return None;
        }

        if def.nillable && self.distribution.should_be_null(&def.full_path) {
            return Some(GenNode::nil(def.name.clone()));
        }

        let mut node = GenNode::new(def.name.clone());

        for attr_def in &def.attributes {
            if let Some(value) = self.attribute_value(attr_def, &def.full_path) {
                node.attributes.push((attr_def.name.clone(), value));
            }
        }

        if def.is_leaf() {
            node.text = Some(self.text_value(def));
        } else {
            for child_def in &def.children {
                let count = self.distribution.repeat_count(
                    &child_def.full_path,
                    child_def.min_occurs,
                    child_def.max_occurs,
                );
                for _ in 0..count {
                    if let Some(child) = self.emit_element(child_def) {
                        node.children.push(child);
                    }
                }
            }

            // An optional container whose children all stayed away would
            // read as an empty leaf downstream; suppress it entirely.
            if node.children.is_empty() && def.is_optional() {
                return None;
            }
        }

        Some(node)
    }

    fn attribute_value(&mut self, attr_def: &XsdAttribute, parent_path: &str) -> Option<String> {
        if attr_def.usage != AttributeUse::Required {
            let attr_path = format!("{}/@{}", parent_path, attr_def.name);
            if !self.distribution.should_include_optional(&attr_path) {
                return None;
            }
        }

        if let Some(fixed) = &attr_def.fixed {
            return Some(fixed.clone());
        }

        if let Some(default) = &attr_def.default {
            if self.distribution.should_include_optional(USE_DEFAULT_GATE) {
                return Some(default.clone());
            }
        }

        Some(self.xsd_values.generate(Some(&attr_def.type_def)))
    }

    fn text_value(&mut self, def: &XsdElement) -> String {
        let path = &def.full_path;

        // Empty strings only for plain, non-enumerated string types: the
        // empty string is never a member of an enum domain.
        if let Some(type_def) = &def.type_def {
            let is_enum = type_def.enumeration.is_some();
            if !is_enum
                && type_def.base_type.eq_ignore_ascii_case("string")
                && self.distribution.should_be_empty(path)
            {
                return String::new();
            }
        }

        if let Some(token) = self.semantic_types.get(path) {
            return self.registry.generate(token);
        }

        self.xsd_values.generate(def.type_def.as_ref())
    }
}

fn serialize(root: &GenNode, pretty: bool) -> Result<String, GeneratorError> {
    let mut buffer = Vec::new();
    if pretty {
        let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);
        write_document(&mut writer, root)?;
    } else {
        let mut writer = Writer::new(&mut buffer);
        write_document(&mut writer, root)?;
    }
    Ok(String::from_utf8(buffer)?)
}

fn write_document<W: Write>(writer: &mut Writer<W>, root: &GenNode) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_node(writer, root, root.contains_nil())
}

fn write_node<W: Write>(
    writer: &mut Writer<W>,
    node: &GenNode,
    bind_xsi: bool,
) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new(node.name.as_str());
    if bind_xsi {
        start.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    }
    for (name, value) in &node.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }
    if node.nil {
        start.push_attribute(("xsi:nil", "true"));
    }

    let text = node.text.as_deref().unwrap_or("");
    if node.children.is_empty() && text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child, false)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}

/// Validates generated documents against the schema model they came
/// from: structure, occurrence bounds, enumerations, lexical value
/// checks, nil consistency, and required attributes.
pub struct XmlValidator {
    schema: XsdSchema,
}

impl XmlValidator {
    pub fn new(schema: XsdSchema) -> Self {
        Self { schema }
    }

    pub fn from_xsd_file(xsd_path: impl AsRef<Path>) -> Result<Self, XsdParseError> {
        Ok(Self::new(parse_xsd(xsd_path)?))
    }

    /// Returns whether the document is valid, with one message per
    /// violation.
    pub fn validate(&self, xml: &str) -> (bool, Vec<String>) {
        let document = match roxmltree::Document::parse(xml) {
            Ok(document) => document,
            Err(err) => return (false, vec![format!("not well-formed XML: {err}")]),
        };

        let root = document.root_element();
        let root_name = root.tag_name().name();
        let Some(root_def) = self
            .schema
            .root_elements
            .iter()
            .find(|e| e.name == root_name)
        else {
            return (
                false,
                vec![format!("unexpected root element <{root_name}>")],
            );
        };

        let mut errors = Vec::new();
        validate_element(&root, root_def, &mut errors);
        (errors.is_empty(), errors)
    }

    pub fn is_valid(&self, xml: &str) -> bool {
        self.validate(xml).0
    }
}

fn validate_element(node: &roxmltree::Node, def: &XsdElement, errors: &mut Vec<String>) {
    let path = &def.full_path;

    if node.attribute((XSI_NAMESPACE, "nil")) == Some("true") {
        if !def.nillable {
            errors.push(format!("{path}: xsi:nil on a non-nillable element"));
        }
        if node.children().any(|c| c.is_element()) || text_of(node).is_some() {
            errors.push(format!("{path}: nil element must be empty"));
        }
        return;
    }

    validate_attributes(node, def, errors);

    let element_children: Vec<roxmltree::Node> =
        node.children().filter(|c| c.is_element()).collect();

    if def.is_leaf() {
        if !element_children.is_empty() {
            errors.push(format!("{path}: unexpected child elements in a leaf"));
        }
        validate_text(text_of(node).unwrap_or(""), def.type_def.as_ref(), path, errors);
        return;
    }

    // Occurrence counts per declared child, plus order for sequences.
    let mut last_declared_index = 0usize;
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for child in &element_children {
        let child_name = child.tag_name().name();
        match def.children.iter().position(|c| c.name == child_name) {
            Some(index) => {
                if def.content_model == ContentModel::Sequence && index < last_declared_index {
                    errors.push(format!(
                        "{path}: child <{child_name}> out of sequence order"
                    ));
                }
                last_declared_index = last_declared_index.max(index);
                *counts.entry(def.children[index].name.as_str()).or_default() += 1;
                validate_element(child, &def.children[index], errors);
            }
            None => errors.push(format!("{path}: undeclared child <{child_name}>")),
        }
    }

    for child_def in &def.children {
        let count = counts.get(child_def.name.as_str()).copied().unwrap_or(0);
        if count < child_def.min_occurs {
            errors.push(format!(
                "{}: occurs {count} times, minOccurs is {}",
                child_def.full_path, child_def.min_occurs
            ));
        }
        if let Some(max) = child_def.max_occurs {
            if count > max {
                errors.push(format!(
                    "{}: occurs {count} times, maxOccurs is {max}",
                    child_def.full_path
                ));
            }
        }
    }
}

fn validate_attributes(node: &roxmltree::Node, def: &XsdElement, errors: &mut Vec<String>) {
    let path = &def.full_path;

    for attr_def in &def.attributes {
        let value = node.attribute(attr_def.name.as_str());
        match value {
            None => {
                if attr_def.usage == AttributeUse::Required {
                    errors.push(format!("{path}: missing required attribute {}", attr_def.name));
                }
            }
            Some(value) => {
                if let Some(fixed) = &attr_def.fixed {
                    if value != fixed {
                        errors.push(format!(
                            "{path}/@{}: expected fixed value {fixed:?}, got {value:?}",
                            attr_def.name
                        ));
                    }
                }
                validate_text(
                    value,
                    Some(&attr_def.type_def),
                    &format!("{path}/@{}", attr_def.name),
                    errors,
                );
            }
        }
    }

    for attr in node.attributes() {
        if attr.namespace() == Some(XSI_NAMESPACE) {
            continue;
        }
        if !def.attributes.iter().any(|a| a.name == attr.name()) {
            errors.push(format!("{path}: undeclared attribute {}", attr.name()));
        }
    }
}

fn validate_text(
    text: &str,
    type_def: Option<&XsdSimpleType>,
    path: &str,
    errors: &mut Vec<String>,
) {
    let Some(type_def) = type_def else {
        return;
    };

    if let Some(values) = &type_def.enumeration {
        if !values.iter().any(|v| v == text) {
            errors.push(format!("{path}: {text:?} is not in the enumeration"));
        }
        return;
    }

    let base = type_def.base_type.to_ascii_lowercase();
    let ok = match base.as_str() {
        "boolean" => matches!(text, "true" | "false" | "1" | "0"),
        "integer" | "int" | "long" | "short" | "byte" | "nonnegativeinteger"
        | "positiveinteger" => text.parse::<i64>().is_ok(),
        "decimal" | "float" | "double" => text.parse::<f64>().is_ok(),
        "date" => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
        "datetime" => chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok(),
        _ => true,
    };
    if !ok {
        errors.push(format!("{path}: {text:?} is not a valid {base}"));
    }
}

fn text_of<'a>(node: &'a roxmltree::Node) -> Option<&'a str> {
    node.text().filter(|t| !t.trim().is_empty())
}

/// Parses an XSD, generates one document, and optionally validates it.
pub fn generate_xml_from_xsd(
    xsd_path: impl AsRef<Path>,
    meta: Option<&MetaConfig>,
    seed: Option<u64>,
    validate: bool,
) -> Result<String, GeneratorError> {
    let schema = parse_xsd(xsd_path)?;

    let distribution = meta.map(|m| DistributionConfig::from_meta(&m.generation));
    let mut generator = XmlGenerator::new(schema.clone(), meta, distribution, seed);
    let xml = generator.generate_string(true)?;

    if validate {
        let (is_valid, errors) = XmlValidator::new(schema).validate(&xml);
        if !is_valid {
            return Err(GeneratorError::Validation(errors));
        }
    }

    Ok(xml)
}
