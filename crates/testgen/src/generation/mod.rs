//! XML generation: distributions, value production, and the emitter.

pub mod distributions;
pub mod generator;
pub mod values;

pub use distributions::{DistributionConfig, DistributionEngine, DistributionOverride, MAX_REPEAT};
pub use generator::{generate_xml_from_xsd, GenNode, GeneratorError, XmlGenerator, XmlValidator};
pub use values::{ValueRegistry, XsdValueGenerator, NAMED_KINDS};
