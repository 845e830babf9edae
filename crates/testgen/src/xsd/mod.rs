//! XSD schema model and parser.

pub mod model;
pub mod parser;

pub use model::{
    AttributeUse, ContentModel, XsdAttribute, XsdComplexType, XsdElement, XsdSchema,
    XsdSimpleType,
};
pub use parser::{extract_field_paths, parse_xsd, parse_xsd_str, FieldPathInfo, XsdParseError};
