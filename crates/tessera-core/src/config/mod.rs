//! Configuration with layered resolution: compiled defaults, then a TOML file,
//! then `TESSERA_*` environment variables, then validation.

pub mod defaults;
mod judge_config;
mod marks_config;
mod observability_config;
mod spatial_config;
mod storage_config;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use judge_config::JudgeConfig;
pub use marks_config::MarksConfig;
pub use observability_config::ObservabilityConfig;
pub use spatial_config::{
    AxisRange, AxisWeights, DomainSchema, KeywordHint, RiskyPattern, Severity, SpatialConfig,
};
pub use storage_config::StorageConfig;

use crate::constants::MAX_ATTEMPTS_CEILING;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    pub storage: StorageConfig,
    pub spatial: SpatialConfig,
    pub judge: JudgeConfig,
    pub marks: MarksConfig,
    pub observability: ObservabilityConfig,
}

impl TesseraConfig {
    /// Resolve configuration from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parse a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `TESSERA_*` overrides. Unparseable values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("TESSERA_CONTAINER_PATH") {
            self.storage.container_path = val;
        }
        if let Some(val) = lookup("TESSERA_DOMAIN_CODE") {
            self.storage.domain_code = val;
        }
        if let Some(v) = lookup("TESSERA_HOT_CACHE_CAPACITY").and_then(|v| v.parse().ok()) {
            self.storage.hot_cache_capacity = v;
        }
        if let Some(v) = lookup("TESSERA_FSYNC_ON_WRITE").and_then(|v| v.parse().ok()) {
            self.storage.fsync_on_write = v;
        }
        if let Some(v) = lookup("TESSERA_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.judge.max_attempts = v;
        }
        if let Some(v) = lookup("TESSERA_COMPLEXITY_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.judge.complexity_threshold = v;
        }
        if let Some(v) = lookup("TESSERA_GENERATION_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.judge.generation_timeout_ms = v;
        }
        if let Some(v) = lookup("TESSERA_WORKER_POOL_SIZE").and_then(|v| v.parse().ok()) {
            self.judge.worker_pool_size = v;
        }
        if let Some(val) = lookup("TESSERA_LOG_LEVEL") {
            self.observability.log_level = val;
        }
        if let Some(v) = lookup("TESSERA_JSON_LOGS").and_then(|v| v.parse().ok()) {
            self.observability.json_logs = v;
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.container_path.trim().is_empty() {
            return Err(invalid("storage.container_path", "must not be empty"));
        }
        if self.storage.domain_code.is_empty() || self.storage.domain_code.len() > u16::MAX as usize {
            return Err(invalid("storage.domain_code", "must be 1..=65535 bytes"));
        }
        if !(-7..=22).contains(&self.storage.compression_level) {
            return Err(invalid("storage.compression_level", "must be between -7 and 22"));
        }
        if self.storage.max_tile_bytes == 0 || self.storage.max_tile_bytes > u32::MAX as usize {
            return Err(invalid("storage.max_tile_bytes", "must be in 1..=u32::MAX"));
        }

        self.validate_spatial()?;

        let judge = &self.judge;
        if judge.max_attempts == 0 || judge.max_attempts > MAX_ATTEMPTS_CEILING {
            return Err(invalid(
                "judge.max_attempts",
                &format!("must be between 1 and {MAX_ATTEMPTS_CEILING}"),
            ));
        }
        for (field, value) in [
            ("judge.complexity_threshold", judge.complexity_threshold),
            ("judge.pass_threshold", judge.pass_threshold),
            ("judge.min_factual", judge.min_factual),
            ("judge.min_consistency", judge.min_consistency),
            ("judge.factual_weight", judge.factual_weight),
            ("judge.consistency_weight", judge.consistency_weight),
            ("judge.max_hallucination_risk", judge.max_hallucination_risk),
            ("judge.neutral_factual", judge.neutral_factual),
            ("marks.community_confidence", self.marks.community_confidence),
            ("marks.expert_confidence", self.marks.expert_confidence),
            ("marks.multi_expert_confidence", self.marks.multi_expert_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must be between 0.0 and 1.0"));
            }
        }
        if (judge.factual_weight + judge.consistency_weight - 1.0).abs() > 1e-9 {
            return Err(invalid(
                "judge.factual_weight",
                "factual_weight + consistency_weight must equal 1.0",
            ));
        }
        if judge.generation_timeout_ms == 0 {
            return Err(invalid("judge.generation_timeout_ms", "must be greater than 0"));
        }
        if judge.retrieval_k == 0 {
            return Err(invalid("judge.retrieval_k", "must be greater than 0"));
        }
        if judge.max_chunks == 0 {
            return Err(invalid("judge.max_chunks", "must be greater than 0"));
        }
        if judge.worker_pool_size == 0 {
            return Err(invalid("judge.worker_pool_size", "must be greater than 0"));
        }
        if self.marks.multi_expert_quorum < 2 {
            return Err(invalid("marks.multi_expert_quorum", "must be at least 2"));
        }
        if !(self.marks.community_confidence <= self.marks.expert_confidence
            && self.marks.expert_confidence <= self.marks.multi_expert_confidence)
        {
            return Err(invalid(
                "marks",
                "confidence floors must be non-decreasing from community to multi_expert",
            ));
        }
        Ok(())
    }

    fn validate_spatial(&self) -> Result<(), ConfigError> {
        let spatial = &self.spatial;
        if spatial.cells_per_axis == 0 || spatial.cells_per_axis > 1024 {
            return Err(invalid("spatial.cells_per_axis", "must be between 1 and 1024"));
        }
        if spatial.coarse_factor == 0 {
            return Err(invalid("spatial.coarse_factor", "must be greater than 0"));
        }
        if !spatial.low_certainty_penalty.is_finite() || spatial.low_certainty_penalty < 0.0 {
            return Err(invalid("spatial.low_certainty_penalty", "must be finite and >= 0"));
        }
        if spatial.domains.is_empty() {
            return Err(invalid("spatial.domains", "at least one domain must be declared"));
        }
        let mut seen = HashSet::new();
        for domain in &spatial.domains {
            if domain.code.trim().is_empty() {
                return Err(invalid("spatial.domains.code", "must not be empty"));
            }
            if !seen.insert(domain.code.as_str()) {
                return Err(invalid(
                    "spatial.domains.code",
                    &format!("duplicate domain '{}'", domain.code),
                ));
            }
            for axis in crate::tile::Axis::ALL {
                let range = domain.range(axis);
                if !(range.min.is_finite() && range.max.is_finite() && range.min < range.max) {
                    return Err(invalid(
                        &format!("spatial.domains.{}.{}_range", domain.code, axis.name()),
                        "min must be finite and strictly less than max",
                    ));
                }
            }
            for pattern in &domain.risky_patterns {
                if regex::Regex::new(&pattern.pattern).is_err() {
                    return Err(invalid(
                        &format!("spatial.domains.{}.risky_patterns", domain.code),
                        &format!("invalid regex '{}'", pattern.pattern),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}
