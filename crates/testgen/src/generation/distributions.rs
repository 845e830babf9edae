//! Randomness controls for XML generation: fill rates for optional
//! fields, nil and empty-string rates, and repeat counts.

use crate::meta::GenerationConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Hard ceiling on repeat counts regardless of configuration.
pub const MAX_REPEAT: u32 = 20;

/// Per-field override of the distribution defaults.
#[derive(Debug, Clone, Default)]
pub struct DistributionOverride {
    pub fill_rate: Option<f64>,
    pub null_rate: Option<f64>,
    pub empty_rate: Option<f64>,
    pub repeat_range: Option<(u32, u32)>,
}

/// Configuration for the random distributions. All rates are in [0, 1].
#[derive(Debug, Clone)]
pub struct DistributionConfig {
    /// Probability that an optional field (minOccurs=0) is included.
    pub optional_field_fill_rate: f64,
    /// Probability that a nillable field is nil.
    pub null_rate: f64,
    /// Probability that a plain string field is empty.
    pub empty_rate: f64,
    /// Default inclusive range for repeating elements.
    pub repeat_range: (u32, u32),
    pub field_overrides: HashMap<String, DistributionOverride>,
    /// Seed for reproducible generation.
    pub seed: Option<u64>,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            optional_field_fill_rate: 0.7,
            null_rate: 0.05,
            empty_rate: 0.03,
            repeat_range: (1, 3),
            field_overrides: HashMap::new(),
            seed: None,
        }
    }
}

impl DistributionConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Lifts the generation section of a meta file.
    pub fn from_meta(generation: &GenerationConfig) -> Self {
        let defaults = &generation.defaults;
        let field_overrides = generation
            .field_overrides
            .iter()
            .map(|(path, o)| {
                (
                    path.clone(),
                    DistributionOverride {
                        fill_rate: o.fill_rate,
                        repeat_range: o.repeat_range,
                        ..DistributionOverride::default()
                    },
                )
            })
            .collect();

        Self {
            optional_field_fill_rate: defaults.optional_field_fill_rate,
            null_rate: defaults.null_rate,
            empty_rate: defaults.empty_rate,
            repeat_range: defaults.repeat_range,
            field_overrides,
            seed: None,
        }
    }
}

/// Answers the yes/no and count questions of generation. Overrides are
/// consulted before defaults.
#[derive(Debug)]
pub struct DistributionEngine {
    config: DistributionConfig,
    rng: StdRng,
}

impl DistributionEngine {
    pub fn new(config: DistributionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Should an optional field at this path be generated?
    pub fn should_include_optional(&mut self, field_path: &str) -> bool {
        let rate = self
            .override_for(field_path)
            .and_then(|o| o.fill_rate)
            .unwrap_or(self.config.optional_field_fill_rate);
        self.rng.gen::<f64>() < rate
    }

    /// Should a nillable field at this path be nil? Only consulted for
    /// nillable elements.
    pub fn should_be_null(&mut self, field_path: &str) -> bool {
        let rate = self
            .override_for(field_path)
            .and_then(|o| o.null_rate)
            .unwrap_or(self.config.null_rate);
        self.rng.gen::<f64>() < rate
    }

    /// Should a string field at this path be the empty string? Callers
    /// suppress this for enumerated types.
    pub fn should_be_empty(&mut self, field_path: &str) -> bool {
        let rate = self
            .override_for(field_path)
            .and_then(|o| o.empty_rate)
            .unwrap_or(self.config.empty_rate);
        self.rng.gen::<f64>() < rate
    }

    /// How many times should a repeating element occur? The configured
    /// range is intersected with the XSD occurrence constraints; both
    /// bounds are clamped to [`MAX_REPEAT`] and normalized so min <= max.
    pub fn repeat_count(
        &mut self,
        field_path: &str,
        min_occurs: u32,
        max_occurs: Option<u32>,
    ) -> u32 {
        let (repeat_min, repeat_max) = self
            .override_for(field_path)
            .and_then(|o| o.repeat_range)
            .unwrap_or(self.config.repeat_range);

        let (mut effective_min, mut effective_max) = match max_occurs {
            None => (min_occurs.max(repeat_min), repeat_max),
            Some(0) => (min_occurs.max(1), repeat_max),
            Some(max) => (min_occurs.max(1), max.min(repeat_max)),
        };

        effective_min = effective_min.min(MAX_REPEAT);
        effective_max = effective_max.min(MAX_REPEAT);
        if effective_min > effective_max {
            effective_max = effective_min;
        }

        self.rng.gen_range(effective_min..=effective_max)
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn override_for(&self, field_path: &str) -> Option<&DistributionOverride> {
        self.config.field_overrides.get(field_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{FieldOverride, GenerationConfig, GenerationDefaults};

    #[test]
    fn defaults() {
        let config = DistributionConfig::default();
        assert_eq!(config.optional_field_fill_rate, 0.7);
        assert_eq!(config.null_rate, 0.05);
        assert_eq!(config.empty_rate, 0.03);
        assert_eq!(config.repeat_range, (1, 3));
    }

    #[test]
    fn fill_rate_extremes_are_deterministic() {
        let mut always = DistributionEngine::new(DistributionConfig {
            optional_field_fill_rate: 1.0,
            ..DistributionConfig::default()
        });
        let mut never = DistributionEngine::new(DistributionConfig {
            optional_field_fill_rate: 0.0,
            ..DistributionConfig::default()
        });

        for _ in 0..100 {
            assert!(always.should_include_optional("/a"));
            assert!(!never.should_include_optional("/a"));
        }
    }

    #[test]
    fn field_override_wins_over_default() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "/special".to_string(),
            DistributionOverride {
                fill_rate: Some(0.0),
                ..DistributionOverride::default()
            },
        );
        let mut engine = DistributionEngine::new(DistributionConfig {
            optional_field_fill_rate: 1.0,
            field_overrides: overrides,
            ..DistributionConfig::default()
        });

        for _ in 0..50 {
            assert!(!engine.should_include_optional("/special"));
            assert!(engine.should_include_optional("/other"));
        }
    }

    #[test]
    fn repeat_count_respects_bounds() {
        let mut engine = DistributionEngine::new(DistributionConfig {
            repeat_range: (2, 5),
            ..DistributionConfig::default()
        });

        for _ in 0..200 {
            let count = engine.repeat_count("/items/item", 1, Some(10));
            assert!((1..=5).contains(&count));
        }
    }

    #[test]
    fn repeat_count_unbounded_uses_configured_range() {
        let mut engine = DistributionEngine::new(DistributionConfig {
            repeat_range: (2, 5),
            ..DistributionConfig::default()
        });

        for _ in 0..200 {
            let count = engine.repeat_count("/items/item", 0, None);
            assert!((2..=5).contains(&count));
        }
    }

    #[test]
    fn repeat_count_honors_xsd_min_occurs() {
        let mut engine = DistributionEngine::new(DistributionConfig {
            repeat_range: (1, 3),
            ..DistributionConfig::default()
        });

        // XSD demands at least 5; the configured max of 3 must lose.
        for _ in 0..50 {
            let count = engine.repeat_count("/items/item", 5, None);
            assert_eq!(count, 5);
        }
    }

    #[test]
    fn repeat_count_clamps_to_twenty() {
        let mut engine = DistributionEngine::new(DistributionConfig {
            repeat_range: (50, 80),
            ..DistributionConfig::default()
        });

        for _ in 0..50 {
            assert_eq!(engine.repeat_count("/items/item", 0, None), MAX_REPEAT);
        }
    }

    #[test]
    fn same_seed_same_decisions() {
        let run = || {
            let mut engine = DistributionEngine::new(DistributionConfig::seeded(42));
            (0..50)
                .map(|i| {
                    (
                        engine.should_include_optional(&format!("/f{i}")),
                        engine.repeat_count(&format!("/r{i}"), 0, None),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn from_meta_lifts_defaults_and_overrides() {
        let mut generation = GenerationConfig {
            defaults: GenerationDefaults {
                optional_field_fill_rate: 0.4,
                null_rate: 0.2,
                empty_rate: 0.1,
                repeat_range: (3, 6),
            },
            ..GenerationConfig::default()
        };
        generation.field_overrides.insert(
            "/a".to_string(),
            FieldOverride {
                fill_rate: Some(0.9),
                repeat_range: Some((1, 2)),
                semantic_type: None,
            },
        );

        let config = DistributionConfig::from_meta(&generation);
        assert_eq!(config.optional_field_fill_rate, 0.4);
        assert_eq!(config.repeat_range, (3, 6));
        let o = config.field_overrides.get("/a").unwrap();
        assert_eq!(o.fill_rate, Some(0.9));
        assert_eq!(o.repeat_range, Some((1, 2)));
    }
}
