use crate::composite::CompositeMutator;
use crate::error::MutationError;
use crate::injector::{ByteInjector, DEFAULT_INJECTION_FREQUENCY, DEFAULT_MAX_SPAN};
use crate::mutator::{Mutator, entropy_rng};
use crate::swapper::{DEFAULT_MAX_SPAN_LENGTH, DEFAULT_SWAP_PROBABILITY, SpanSwapper};
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct InjectorSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_injection_frequency")]
    pub injection_frequency: f64,
    #[serde(default = "default_max_span")]
    pub max_span: usize,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            injection_frequency: default_injection_frequency(),
            max_span: default_max_span(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct SwapperSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_swap_probability")]
    pub swap_probability: f64,
    #[serde(default = "default_max_span_length")]
    pub max_span_length: usize,
}

impl Default for SwapperSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            swap_probability: default_swap_probability(),
            max_span_length: default_max_span_length(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct CompositeSettings {
    /// Falls back to the number of enabled children.
    pub max_transforms: Option<usize>,
}

fn default_enabled() -> bool {
    true
}
fn default_injection_frequency() -> f64 {
    DEFAULT_INJECTION_FREQUENCY
}
fn default_max_span() -> usize {
    DEFAULT_MAX_SPAN
}
fn default_swap_probability() -> f64 {
    DEFAULT_SWAP_PROBABILITY
}
fn default_max_span_length() -> usize {
    DEFAULT_MAX_SPAN_LENGTH
}

/// Top-level mutation settings, usually read from a TOML file.
///
/// ```toml
/// seed = 1234
///
/// [injector]
/// injection-frequency = 0.05
/// max-span = 64
///
/// [swapper]
/// enabled = false
///
/// [composite]
/// max-transforms = 3
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct ManglerConfig {
    /// When set, every mutator receives a generator derived from this seed.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub injector: InjectorSettings,
    #[serde(default)]
    pub swapper: SwapperSettings,
    #[serde(default)]
    pub composite: CompositeSettings,
}

impl ManglerConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, MutationError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| MutationError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, MutationError> {
        toml::from_str(content).map_err(|e| MutationError::Config(e.to_string()))
    }

    /// Validates the settings and assembles the top-level composite mutator.
    ///
    /// Child generators are drawn from a master ChaCha8 stream seeded with `seed`
    /// when one is configured, so the same file reproduces the same outputs.
    pub fn build(&self) -> Result<CompositeMutator, MutationError> {
        let mut seeder = self.seed.map(ChaCha8Rng::seed_from_u64);
        let mut children: Vec<Box<dyn Mutator>> = Vec::new();

        if self.injector.enabled {
            children.push(Box::new(ByteInjector::with_rng(
                self.injector.injection_frequency,
                self.injector.max_span,
                next_rng(&mut seeder)?,
            )?));
        }
        if self.swapper.enabled {
            children.push(Box::new(SpanSwapper::with_rng(
                self.swapper.swap_probability,
                self.swapper.max_span_length,
                next_rng(&mut seeder)?,
            )?));
        }

        let max_transforms = self.composite.max_transforms.unwrap_or(children.len());
        Ok(CompositeMutator::with_rng(
            children,
            max_transforms,
            next_rng(&mut seeder)?,
        ))
    }
}

fn next_rng(seeder: &mut Option<ChaCha8Rng>) -> Result<ChaCha8Rng, MutationError> {
    match seeder {
        Some(master) => Ok(ChaCha8Rng::from_rng(master)),
        None => entropy_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ManglerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ManglerConfig::default());
        assert_eq!(config.injector.injection_frequency, 0.1);
        assert_eq!(config.injector.max_span, 100);
        assert_eq!(config.swapper.swap_probability, 0.1);
        assert_eq!(config.swapper.max_span_length, 10_000);
        assert!(config.injector.enabled && config.swapper.enabled);
        assert_eq!(config.composite.max_transforms, None);
    }

    #[test]
    fn parses_kebab_case_sections() {
        let config = ManglerConfig::from_toml_str(
            r#"
            seed = 42

            [injector]
            injection-frequency = 0.25
            max-span = 8

            [swapper]
            enabled = false

            [composite]
            max-transforms = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.injector.injection_frequency, 0.25);
        assert_eq!(config.injector.max_span, 8);
        assert!(!config.swapper.enabled);
        assert_eq!(config.swapper.max_span_length, 10_000);
        assert_eq!(config.composite.max_transforms, Some(4));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = ManglerConfig::from_toml_str("[injector]\nfrequency = 0.5\n");
        assert!(matches!(result, Err(MutationError::Config(_))));
    }

    #[test]
    fn load_from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[swapper]\nswap-probability = 0.5").unwrap();
        let config = ManglerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.swapper.swap_probability, 0.5);
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ManglerConfig::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(MutationError::Io(_))));
    }

    #[test]
    fn build_wires_enabled_children() {
        let config = ManglerConfig {
            seed: Some(1),
            ..Default::default()
        };
        let composite = config.build().unwrap();
        assert_eq!(composite.child_names(), vec!["ByteInjector", "SpanSwapper"]);
        assert_eq!(composite.max_transforms(), 2);

        let mut only_swapper = config.clone();
        only_swapper.injector.enabled = false;
        only_swapper.composite.max_transforms = Some(5);
        let composite = only_swapper.build().unwrap();
        assert_eq!(composite.child_names(), vec!["SpanSwapper"]);
        assert_eq!(composite.max_transforms(), 5);
    }

    #[test]
    fn build_rejects_invalid_parameters() {
        let mut config = ManglerConfig::default();
        config.swapper.swap_probability = 2.0;
        assert!(matches!(
            config.build(),
            Err(MutationError::InvalidConfiguration { parameter: "swap_probability", .. })
        ));

        let mut config = ManglerConfig::default();
        config.injector.max_span = 0;
        assert!(matches!(
            config.build(),
            Err(MutationError::InvalidConfiguration { parameter: "max_span", .. })
        ));
    }

    #[test]
    fn seeded_builds_are_reproducible() {
        let config = ManglerConfig {
            seed: Some(2024),
            ..Default::default()
        };
        let input: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        let mut first = config.build().unwrap();
        let mut second = config.build().unwrap();
        for _ in 0..10 {
            assert_eq!(first.transform(&input).unwrap(), second.transform(&input).unwrap());
        }
    }
}
