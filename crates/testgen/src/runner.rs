//! Test lane orchestration.
//!
//! Discovers lanes (an XSD with a sibling `.meta.yaml`), generates XML
//! documents per lane, validates them, optionally writes them to disk,
//! and submits the extracted observations to the catalog API.

use crate::client::TestGenApiClient;
use crate::generation::{DistributionConfig, XmlGenerator, XmlValidator};
use crate::meta::{load_meta_config, MetaConfig, MetadataValue};
use crate::xsd::parse_xsd;
use anyhow::Context;
use ceremony_catalog_sdk::Metadata;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One unit of generator work: an XSD plus its meta file.
#[derive(Debug, Clone)]
pub struct TestLane {
    pub name: String,
    pub xsd_path: PathBuf,
    pub meta_path: PathBuf,
}

impl TestLane {
    /// Lane name qualified by its parent directory, e.g.
    /// `deposits/dda_fulfillment`.
    pub fn full_name(&self) -> String {
        let parent = self
            .xsd_path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or("");
        format!("{parent}/{}", self.name)
    }
}

/// Result of running one lane.
#[derive(Debug, Clone)]
pub struct LaneResult {
    pub lane_name: String,
    pub total_generated: usize,
    pub total_submitted: usize,
    pub total_observations: usize,
    pub errors: Vec<String>,
}

impl LaneResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.total_generated > 0
    }

    fn failed(lane_name: String, errors: Vec<String>) -> Self {
        Self {
            lane_name,
            total_generated: 0,
            total_submitted: 0,
            total_observations: 0,
            errors,
        }
    }
}

/// Result of a whole run.
#[derive(Debug)]
pub struct RunResult {
    pub lanes_run: usize,
    pub lanes_succeeded: usize,
    pub total_xmls_generated: usize,
    pub total_observations_submitted: usize,
    pub lane_results: Vec<LaneResult>,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.lanes_run > 0 && self.lanes_succeeded == self.lanes_run
    }
}

/// Runner options; defaults match the CLI contract.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub api_url: String,
    pub count: usize,
    pub dry_run: bool,
    pub output_dir: Option<PathBuf>,
    pub fill_rate_override: Option<f64>,
    pub seed: Option<u64>,
    pub progress: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            count: 10,
            dry_run: false,
            output_dir: None,
            fill_rate_override: None,
            seed: None,
            progress: false,
        }
    }
}

/// Runs test lanes: generate, validate, save, submit.
pub struct TestLaneRunner {
    lanes_dir: PathBuf,
    options: RunnerOptions,
    rng: StdRng,
}

impl TestLaneRunner {
    pub fn new(lanes_dir: impl Into<PathBuf>, options: RunnerOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            lanes_dir: lanes_dir.into(),
            options,
            rng,
        }
    }

    /// Finds every XSD under the lanes directory with a sibling
    /// `<name>.meta.yaml`, sorted by qualified name.
    pub fn discover_lanes(&self) -> anyhow::Result<Vec<TestLane>> {
        let pattern = self.lanes_dir.join("**").join("*.xsd");
        let pattern = pattern
            .to_str()
            .context("lanes directory path is not valid UTF-8")?;

        let mut lanes = Vec::new();
        for entry in glob::glob(pattern).context("invalid lane search pattern")? {
            let xsd_path = entry.context("failed to read lane directory entry")?;
            let meta_path = xsd_path.with_extension("meta.yaml");
            if !meta_path.exists() {
                continue;
            }
            let name = xsd_path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            lanes.push(TestLane {
                name,
                xsd_path,
                meta_path,
            });
        }

        lanes.sort_by_key(TestLane::full_name);
        Ok(lanes)
    }

    /// Runs every discovered lane.
    pub async fn run_all_lanes(&mut self) -> anyhow::Result<RunResult> {
        let lanes = self.discover_lanes()?;
        if lanes.is_empty() {
            info!("No test lanes found in directory");
        } else {
            info!("Discovered {} test lane(s)", lanes.len());
        }
        let result = self.run_lanes_inner(lanes).await;
        self.log_summary(&result);
        Ok(result)
    }

    /// Runs lanes selected by name (substring match against the
    /// qualified name, duplicates removed).
    pub async fn run_selected_lanes(&mut self, lane_names: &[String]) -> anyhow::Result<RunResult> {
        let all_lanes = self.discover_lanes()?;

        let mut selected = Vec::new();
        for name in lane_names {
            let matched: Vec<&TestLane> = all_lanes
                .iter()
                .filter(|l| l.full_name().contains(name.as_str()) || &l.name == name)
                .collect();
            if matched.is_empty() {
                warn!("No lane matching '{name}'");
            }
            selected.extend(matched.into_iter().cloned());
        }

        let mut seen = HashSet::new();
        let unique: Vec<TestLane> = selected
            .into_iter()
            .filter(|lane| seen.insert(lane.full_name()))
            .collect();

        if unique.is_empty() {
            info!("No matching test lanes found");
        } else {
            info!("Running {} test lane(s)", unique.len());
        }

        let result = self.run_lanes_inner(unique).await;
        self.log_summary(&result);
        Ok(result)
    }

    async fn run_lanes_inner(&mut self, lanes: Vec<TestLane>) -> RunResult {
        let api_client = if self.options.dry_run {
            None
        } else {
            match TestGenApiClient::new(&self.options.api_url) {
                Ok(client) => {
                    if !client.health_check().await {
                        warn!("API at {} may not be reachable", self.options.api_url);
                    }
                    Some(client)
                }
                Err(err) => {
                    warn!("failed to build API client: {err:?}");
                    None
                }
            }
        };

        let mut lane_results = Vec::new();
        let mut total_generated = 0;
        let mut total_observations = 0;

        for lane in &lanes {
            let result = self.run_lane(lane, api_client.as_ref()).await;
            total_generated += result.total_generated;
            total_observations += result.total_observations;
            lane_results.push(result);
        }

        RunResult {
            lanes_run: lanes.len(),
            lanes_succeeded: lane_results.iter().filter(|r| r.success()).count(),
            total_xmls_generated: total_generated,
            total_observations_submitted: total_observations,
            lane_results,
        }
    }

    async fn run_lane(&mut self, lane: &TestLane, api_client: Option<&TestGenApiClient>) -> LaneResult {
        let lane_name = lane.full_name();
        info!("Running lane: {lane_name}");
        let mut errors: Vec<String> = Vec::new();
        let mut generated_count = 0;
        let mut submitted_count = 0;
        let mut observation_count = 0;

        let meta_config = match load_meta_config(&lane.meta_path) {
            Ok(config) => config,
            Err(err) => return LaneResult::failed(lane_name, vec![err.to_string()]),
        };

        if let Some(client) = api_client {
            if let Err(err) = client.ensure_context_exists(&meta_config.context).await {
                return LaneResult::failed(lane_name, vec![format!("Failed to ensure context: {err}")]);
            }
            debug!("Context '{}' ready", meta_config.context.context_id);
        }

        let schema = match parse_xsd(&lane.xsd_path) {
            Ok(schema) => schema,
            Err(err) => return LaneResult::failed(lane_name, vec![err.to_string()]),
        };
        debug!("Parsed XSD with {} root element(s)", schema.root_elements.len());

        let mut distribution = DistributionConfig::from_meta(&meta_config.generation);
        if let Some(fill_rate) = self.options.fill_rate_override {
            distribution.optional_field_fill_rate = fill_rate;
        }
        if self.options.seed.is_some() {
            distribution.seed = self.options.seed;
        }

        let validator = XmlValidator::new(schema.clone());
        let mut generator = XmlGenerator::new(
            schema,
            Some(&meta_config),
            Some(distribution),
            self.options.seed,
        );

        let bar = self.progress_bar(&lane_name);
        for index in 0..self.options.count {
            let metadata = self.document_metadata(&meta_config);

            let xml = match generator.generate_string(true) {
                Ok(xml) => xml,
                Err(err) => {
                    errors.push(format!("XML {} generation failed: {err}", index + 1));
                    continue;
                }
            };
            generated_count += 1;

            let (is_valid, validation_errors) = validator.validate(&xml);
            if !is_valid {
                errors.push(format!(
                    "XML {} failed validation: {}",
                    index + 1,
                    validation_errors
                        .first()
                        .map(String::as_str)
                        .unwrap_or("unknown")
                ));
                continue;
            }

            if let Err(err) = self.save_xml(lane, index, &xml) {
                errors.push(format!("XML {} save failed: {err}", index + 1));
            }

            match api_client {
                Some(client) => {
                    let result = client
                        .submit_xml_observations(&meta_config.context.context_id, &xml, &metadata)
                        .await;
                    if result.success {
                        submitted_count += 1;
                        observation_count += result.observation_count;
                    } else {
                        errors.push(format!(
                            "XML {} submission failed: {}",
                            index + 1,
                            result.error_message.as_deref().unwrap_or("unknown")
                        ));
                    }
                }
                // Dry run counts generation as submission.
                None => submitted_count += 1,
            }

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        info!("  Generated: {generated_count}, Submitted: {submitted_count}");

        LaneResult {
            lane_name,
            total_generated: generated_count,
            total_submitted: submitted_count,
            total_observations: observation_count,
            errors,
        }
    }

    /// Resolves required metadata (fixed or picked from a list) and adds
    /// one random value per optional metadata key.
    fn document_metadata(&mut self, meta_config: &MetaConfig) -> Metadata {
        let mut metadata = Metadata::new();
        for (key, value) in &meta_config.context.required_metadata {
            let resolved = match value {
                MetadataValue::One(v) => v.clone(),
                MetadataValue::Many(values) if !values.is_empty() => {
                    values[self.rng.gen_range(0..values.len())].clone()
                }
                MetadataValue::Many(_) => continue,
            };
            metadata.insert(key.clone(), resolved);
        }
        for (key, values) in &meta_config.context.optional_metadata {
            if !values.is_empty() {
                let value = values[self.rng.gen_range(0..values.len())].clone();
                metadata.insert(key.clone(), value);
            }
        }
        metadata
    }

    fn save_xml(&self, lane: &TestLane, index: usize, xml: &str) -> anyhow::Result<()> {
        let Some(output_dir) = &self.options.output_dir else {
            return Ok(());
        };
        let lane_dir = output_dir.join(lane.full_name());
        std::fs::create_dir_all(&lane_dir)
            .with_context(|| format!("failed to create {}", lane_dir.display()))?;
        let file_path = lane_dir.join(format!("{}_{:04}.xml", lane.name, index + 1));
        std::fs::write(&file_path, xml)
            .with_context(|| format!("failed to write {}", file_path.display()))?;
        Ok(())
    }

    fn progress_bar(&self, lane_name: &str) -> Option<ProgressBar> {
        if !self.options.progress {
            return None;
        }
        let bar = ProgressBar::new(self.options.count as u64);
        if let Ok(style) =
            ProgressStyle::with_template("  {msg} [{bar:30}] {pos}/{len}")
        {
            bar.set_style(style);
        }
        bar.set_message(format!("Generating {lane_name}"));
        Some(bar)
    }

    fn log_summary(&self, result: &RunResult) {
        info!("Summary:");
        info!("  Lanes run: {}", result.lanes_run);
        info!("  Lanes succeeded: {}", result.lanes_succeeded);
        info!("  XMLs generated: {}", result.total_xmls_generated);
        if !self.options.dry_run {
            info!(
                "  Observations submitted: {}",
                result.total_observations_submitted
            );
        }

        let all_errors: Vec<String> = result
            .lane_results
            .iter()
            .flat_map(|lane| {
                lane.errors
                    .iter()
                    .map(move |e| format!("  [{}] {e}", lane.lane_name))
            })
            .collect();

        if !all_errors.is_empty() {
            warn!("Errors:");
            for error in all_errors.iter().take(10) {
                warn!("{error}");
            }
            if all_errors.len() > 10 {
                warn!("  ... and {} more errors", all_errors.len() - 10);
            }
        }
    }
}
