//! Meta-file configuration.
//!
//! A `.meta.yaml` file pairs with an XSD schema and provides context
//! identity (contextId, metadata keys), generation tuning (fill rates,
//! repeat ranges), semantic type bindings, and per-field overrides.

use crate::xsd::parser::FieldPathInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("meta file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read meta file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid meta file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("meta file must have context.contextId")]
    MissingContextId,
}

/// A required-metadata entry: a fixed value, or a list to pick from per
/// generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    One(String),
    Many(Vec<String>),
}

/// Context identity section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextConfig {
    pub context_id: String,
    pub display_name: String,
    pub description: String,
    pub required_metadata: BTreeMap<String, MetadataValue>,
    pub optional_metadata: BTreeMap<String, Vec<String>>,
}

/// Default generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationDefaults {
    pub optional_field_fill_rate: f64,
    pub null_rate: f64,
    pub empty_rate: f64,
    pub repeat_range: (u32, u32),
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            optional_field_fill_rate: 0.7,
            null_rate: 0.05,
            empty_rate: 0.03,
            repeat_range: (1, 3),
        }
    }
}

/// Override settings for one field path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldOverride {
    pub fill_rate: Option<f64>,
    pub repeat_range: Option<(u32, u32)>,
    pub semantic_type: Option<String>,
}

/// Generation section: defaults, semantic type bindings, overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub defaults: GenerationDefaults,
    /// Path to semantic type token; `null` marks an unbound path.
    pub semantic_types: BTreeMap<String, Option<String>>,
    pub field_overrides: BTreeMap<String, FieldOverride>,
}

/// Complete meta file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaConfig {
    pub context: ContextConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Sibling XSD this meta file belongs to; set by the loader.
    #[serde(skip)]
    pub source_xsd: Option<PathBuf>,
}

/// Loads and validates a `.meta.yaml` file.
pub fn load_meta_config(meta_path: impl AsRef<Path>) -> Result<MetaConfig, MetaError> {
    let meta_path = meta_path.as_ref();
    if !meta_path.exists() {
        return Err(MetaError::NotFound(meta_path.to_path_buf()));
    }

    let text = std::fs::read_to_string(meta_path)?;
    let mut config: MetaConfig = serde_yaml::from_str(&text)?;

    if config.context.context_id.trim().is_empty() {
        return Err(MetaError::MissingContextId);
    }

    config.source_xsd = Some(sibling_xsd_path(meta_path));
    Ok(config)
}

/// `lane.meta.yaml` → `lane.xsd` in the same directory.
fn sibling_xsd_path(meta_path: &Path) -> PathBuf {
    let file_name = meta_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(".meta.yaml")
        .unwrap_or_else(|| file_name.trim_end_matches(".yaml"));
    meta_path.with_file_name(format!("{stem}.xsd"))
}

/// Builds a scaffold meta file from extracted field paths.
///
/// The output is assembled by hand rather than through serde: the
/// comments (enum values, override hints, semantic type catalog) are part
/// of the scaffold's value.
pub fn generate_meta_template(
    field_paths: &[FieldPathInfo],
    xsd_filename: &str,
    context_id: Option<&str>,
) -> String {
    let mut lines = vec![
        format!("# Auto-generated from: {xsd_filename}"),
        "# TODO: Fill in context details and customize semantic types".to_string(),
        String::new(),
        "context:".to_string(),
        format!("  contextId: \"{}\"  # TODO: Set context ID", context_id.unwrap_or("")),
        "  displayName: \"\"  # TODO: Set display name".to_string(),
        "  description: \"\"  # TODO: Add description".to_string(),
        "  requiredMetadata: {}  # TODO: Add required metadata key-value pairs".to_string(),
        "  optionalMetadata: {}  # TODO: Add optional metadata with possible values".to_string(),
        String::new(),
        "generation:".to_string(),
        "  defaults:".to_string(),
        "    optionalFieldFillRate: 0.7".to_string(),
        "    nullRate: 0.05".to_string(),
        "    emptyRate: 0.03".to_string(),
        "    repeatRange: [1, 3]".to_string(),
        String::new(),
        "  # All field paths from XSD - set semantic types for realistic data".to_string(),
        "  # Options: person.first_name, person.last_name, address.street, address.city,".to_string(),
        "  #          address.state_abbr, address.zipcode, phone_number, email, ssn,".to_string(),
        "  #          decimal(min,max,decimals), date.past, date.future, pattern:TEMPLATE".to_string(),
        "  semanticTypes:".to_string(),
    ];

    for info in field_paths {
        match &info.enumeration {
            Some(values) => {
                let mut listed = values.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
                if values.len() > 5 {
                    listed.push_str(", ...");
                }
                lines.push(format!("    \"{}\": null  # Has enum: [{listed}]", info.path));
            }
            None => lines.push(format!("    \"{}\": null", info.path)),
        }
    }

    lines.push(String::new());
    lines.push("  # Optional/repeating fields - customize fill rates and repeat ranges".to_string());
    lines.push("  fieldOverrides:".to_string());

    for info in field_paths {
        if info.min_occurs == 0 {
            lines.push(format!("    \"{}\":  # minOccurs=0", info.path));
            lines.push("      fillRate: 0.7".to_string());
        } else if info.max_occurs.map_or(true, |max| max > 1) {
            let max = info
                .max_occurs
                .map_or("unbounded".to_string(), |m| m.to_string());
            lines.push(format!("    \"{}\":  # maxOccurs={max}", info.path));
            lines.push("      repeatRange: [1, 5]".to_string());
        }
    }

    lines.push(String::new());
    lines.join("\n")
}
