use std::path::Path;

use serde::{Deserialize, Serialize};

use pagediff_diff::DiffAlgorithm;
use pagediff_types::{FileKind, WordPolicy};

use crate::error::{EngineError, EngineResult};

/// When and how often word counts are sampled instead of counted exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordSampling {
    /// Count words in every `every`-th unit only.
    pub every: u32,
    /// Documents with fewer units are always counted exactly.
    pub min_units: u32,
}

impl Default for WordSampling {
    fn default() -> Self {
        Self {
            every: 10,
            min_units: 200,
        }
    }
}

impl WordSampling {
    /// The word policy for a document cut into `units` units.
    pub fn policy_for(&self, units: u32) -> WordPolicy {
        if self.every > 1 && units >= self.min_units {
            WordPolicy::Sampled { every: self.every }
        } else {
            WordPolicy::Exact
        }
    }
}

/// Configuration for the comparison engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lines per unit for documents without natural pages.
    pub text_unit_lines: usize,
    /// Lines per unit for page-oriented documents that arrive unpaginated.
    pub page_unit_lines: usize,
    /// Maximum concurrent unit diffs. `None` uses every available core.
    pub workers: Option<usize>,
    /// Line alignment algorithm.
    pub algorithm: DiffAlgorithm,
    pub word_sampling: WordSampling,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            text_unit_lines: 500,
            page_unit_lines: 80,
            workers: None,
            algorithm: DiffAlgorithm::Myers,
            word_sampling: WordSampling::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| EngineError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.text_unit_lines == 0 {
            return Err(EngineError::invalid_config("text_unit_lines must be at least 1"));
        }
        if self.page_unit_lines == 0 {
            return Err(EngineError::invalid_config("page_unit_lines must be at least 1"));
        }
        if self.workers == Some(0) {
            return Err(EngineError::invalid_config("workers must be at least 1"));
        }
        if self.word_sampling.every == 0 {
            return Err(EngineError::invalid_config(
                "word_sampling.every must be at least 1",
            ));
        }
        Ok(())
    }

    /// Default unit size for a document of `kind`.
    pub fn unit_lines_for(&self, kind: FileKind) -> usize {
        if kind.is_paginated() {
            self.page_unit_lines
        } else {
            self.text_unit_lines
        }
    }

    /// Configured worker count, or the machine's available parallelism.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
