//! Internal schema model for XML generation.
//!
//! A simplified view of an XSD schema: just the structural and constraint
//! information needed to generate valid instances. Built once by the
//! parser, read-only afterwards.

use std::collections::HashMap;

/// Content model of a complex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentModel {
    #[default]
    Sequence,
    All,
    Choice,
}

/// Attribute requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    Required,
    #[default]
    Optional,
}

/// An XSD simple type with optional restriction facets.
#[derive(Debug, Clone)]
pub struct XsdSimpleType {
    pub name: Option<String>,
    /// Primitive token such as `string`, `integer`, `decimal`, `date`,
    /// `dateTime`, `boolean`.
    pub base_type: String,
    /// When present, authoritative: generated values come from this list.
    pub enumeration: Option<Vec<String>>,
    pub pattern: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
}

impl Default for XsdSimpleType {
    fn default() -> Self {
        Self {
            name: None,
            base_type: "string".to_string(),
            enumeration: None,
            pattern: None,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            total_digits: None,
            fraction_digits: None,
        }
    }
}

impl XsdSimpleType {
    pub fn with_base(base_type: impl Into<String>) -> Self {
        Self {
            base_type: base_type.into(),
            ..Self::default()
        }
    }
}

/// An XML attribute definition.
#[derive(Debug, Clone)]
pub struct XsdAttribute {
    pub name: String,
    pub type_def: XsdSimpleType,
    pub usage: AttributeUse,
    pub default: Option<String>,
    /// When set, emitted unconditionally.
    pub fixed: Option<String>,
}

impl XsdAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_def: XsdSimpleType::default(),
            usage: AttributeUse::Optional,
            default: None,
            fixed: None,
        }
    }
}

/// An XML element definition.
///
/// Leaves carry a `type_def` for their text content; a non-leaf may still
/// carry one when the XSD extends a simple type (simpleContent).
#[derive(Debug, Clone)]
pub struct XsdElement {
    pub name: String,
    pub min_occurs: u32,
    /// `None` means unbounded.
    pub max_occurs: Option<u32>,
    pub nillable: bool,
    pub type_def: Option<XsdSimpleType>,
    pub children: Vec<XsdElement>,
    pub attributes: Vec<XsdAttribute>,
    pub content_model: ContentModel,
    /// XPath-like path from the document root, e.g. `/Order/Lines/Line`.
    pub full_path: String,
}

impl XsdElement {
    pub fn new(name: impl Into<String>, full_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_occurs: 1,
            max_occurs: Some(1),
            nillable: false,
            type_def: None,
            children: Vec::new(),
            attributes: Vec::new(),
            content_model: ContentModel::default(),
            full_path: full_path.into(),
        }
    }

    /// True when this element has no child elements (text content only).
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when this element may be omitted.
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }

    /// True when this element may occur more than once.
    pub fn is_repeating(&self) -> bool {
        self.max_occurs.map_or(true, |max| max > 1)
    }
}

/// A named complex type, reusable across elements. Kept for reference
/// lookups; child paths are rooted at the type itself.
#[derive(Debug, Clone, Default)]
pub struct XsdComplexType {
    pub name: String,
    pub children: Vec<XsdElement>,
    pub attributes: Vec<XsdAttribute>,
    pub content_model: ContentModel,
    pub mixed: bool,
}

/// A complete parsed schema.
#[derive(Debug, Clone, Default)]
pub struct XsdSchema {
    pub root_elements: Vec<XsdElement>,
    pub named_simple_types: HashMap<String, XsdSimpleType>,
    pub named_complex_types: HashMap<String, XsdComplexType>,
    pub target_namespace: Option<String>,
    pub element_form_default: String,
}

impl XsdSchema {
    /// The first root element, the one generation starts from.
    pub fn primary_root(&self) -> Option<&XsdElement> {
        self.root_elements.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_element_properties() {
        let mut element = XsdElement::new("Item", "/Order/Item");
        assert!(element.is_leaf());
        assert!(!element.is_optional());
        assert!(!element.is_repeating());

        element.min_occurs = 0;
        element.max_occurs = None;
        assert!(element.is_optional());
        assert!(element.is_repeating());

        element.max_occurs = Some(5);
        assert!(element.is_repeating());

        element.children.push(XsdElement::new("Sub", "/Order/Item/Sub"));
        assert!(!element.is_leaf());
    }
}
