//! Test data generator for the Ceremony Field Catalog.
//!
//! Fabricates random but schema-valid XML instances from XSD schemas to
//! drive coverage of the field-observation pipeline. A lane pairs an XSD
//! with a `.meta.yaml` file that names the catalog context and tunes
//! generation (fill rates, repeat ranges, semantic types).
//!
//! ## Modules
//!
//! - [`xsd`]: schema model and XSD parser
//! - [`meta`]: meta-file configuration and scaffolding
//! - [`generation`]: distributions, value production, emitter, validator
//! - [`client`]: synchronous-style catalog API client with retry
//! - [`runner`]: lane discovery and orchestration
//!
//! ## Usage
//!
//! ```no_run
//! use ceremony_testgen::generation::generate_xml_from_xsd;
//! use ceremony_testgen::meta::load_meta_config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let meta = load_meta_config("lanes/deposits/dda.meta.yaml")?;
//! let xml = generate_xml_from_xsd("lanes/deposits/dda.xsd", Some(&meta), Some(42), true)?;
//! println!("{xml}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod generation;
pub mod meta;
pub mod runner;
pub mod xsd;

pub use client::{SubmissionResult, TestGenApiClient};
pub use generation::{
    generate_xml_from_xsd, DistributionConfig, DistributionEngine, GeneratorError, ValueRegistry,
    XmlGenerator, XmlValidator, XsdValueGenerator,
};
pub use meta::{generate_meta_template, load_meta_config, MetaConfig, MetaError};
pub use runner::{LaneResult, RunResult, RunnerOptions, TestLane, TestLaneRunner};
pub use xsd::{extract_field_paths, parse_xsd, parse_xsd_str, XsdParseError, XsdSchema};
