//! XML field extraction.
//!
//! Walks an XML tree depth-first and aggregates leaf and attribute
//! occurrences into per-path observations. Every entry point absorbs
//! failures: malformed input yields an empty vector, never an error.

use crate::observation::{FieldStatistics, Metadata, Observation, ValueClass};
use roxmltree::{Document, Node};
use std::collections::HashMap;

pub(crate) const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Extracts per-path observations from XML documents.
///
/// `honor_xsi_nil` controls whether `xsi:nil="true"` on a leaf is counted
/// as a null sighting, distinct from empty. Both the fire-and-forget
/// engine and the testgen client run with it enabled.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    honor_xsi_nil: bool,
}

impl Default for Extractor {
    fn default() -> Self {
        Self { honor_xsi_nil: true }
    }
}

/// Per-path tallies in first-sighting order. The worker batches in this
/// order, so it has to be stable across the walk.
#[derive(Default)]
struct StatsTable {
    order: Vec<String>,
    stats: HashMap<String, FieldStatistics>,
}

impl StatsTable {
    fn record(&mut self, path: &str, class: ValueClass) {
        if !self.stats.contains_key(path) {
            self.order.push(path.to_string());
        }
        self.stats.entry(path.to_string()).or_default().record(class);
    }

    fn into_observations(mut self, metadata: &Metadata) -> Vec<Observation> {
        self.order
            .drain(..)
            .filter_map(|path| {
                self.stats
                    .remove(&path)
                    .map(|stats| stats.into_observation(path, metadata))
            })
            .collect()
    }
}

impl Extractor {
    pub fn new(honor_xsi_nil: bool) -> Self {
        Self { honor_xsi_nil }
    }

    /// Extracts observations from raw bytes. Invalid UTF-8 or XML yields
    /// an empty vector.
    pub fn from_bytes(&self, xml: &[u8], metadata: &Metadata) -> Vec<Observation> {
        match std::str::from_utf8(xml) {
            Ok(text) => self.from_str(text, metadata),
            Err(_) => Vec::new(),
        }
    }

    /// Extracts observations from an XML string. Malformed XML yields an
    /// empty vector.
    pub fn from_str(&self, xml: &str, metadata: &Metadata) -> Vec<Observation> {
        match Document::parse(xml) {
            Ok(doc) => self.from_document(&doc, metadata),
            Err(_) => Vec::new(),
        }
    }

    /// Extracts observations from an already-parsed document.
    pub fn from_document(&self, doc: &Document, metadata: &Metadata) -> Vec<Observation> {
        let mut table = StatsTable::default();
        // Explicit work stack: document nesting depth must not become
        // call-stack depth.
        let mut work: Vec<(Node, String)> = vec![(doc.root_element(), String::new())];

        while let Some((node, parent_path)) = work.pop() {
            let path = format!("{}/{}", parent_path, node.tag_name().name());

            let children: Vec<Node> = node.children().filter(|c| c.is_element()).collect();
            if children.is_empty() {
                table.record(&path, self.classify_leaf(&node));
            }

            for attr in node.attributes() {
                if attr.namespace() == Some(XSI_NAMESPACE) {
                    continue;
                }
                let attr_path = format!("{}/@{}", path, attr.name());
                table.record(&attr_path, classify_text(Some(attr.value())));
            }

            for child in children.into_iter().rev() {
                work.push((child, path.clone()));
            }
        }

        table.into_observations(metadata)
    }

    fn classify_leaf(&self, node: &Node) -> ValueClass {
        if self.honor_xsi_nil && node.attribute((XSI_NAMESPACE, "nil")) == Some("true") {
            return ValueClass::Null;
        }
        classify_text(node.text())
    }
}

fn classify_text(text: Option<&str>) -> ValueClass {
    match text {
        Some(t) if !t.trim().is_empty() => ValueClass::Present,
        _ => ValueClass::Empty,
    }
}
