//! Query configuration that every pipeline carries from its root.
//!
//! A pipeline's config is fixed when its source is wrapped and inherited by
//! every pipeline chained from it. There is no process-wide default.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound accepted for `buffer_capacity_hint` (elements).
pub const MAX_BUFFER_CAPACITY_HINT: usize = 1 << 24;

/// How grouping, join and set operators bucket keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStrategy {
    /// Hash-bucket when the equality adapter supplies a hash, scan otherwise.
    #[default]
    Auto,
    /// Always scan representatives with the equality predicate.
    Scan,
}

impl std::str::FromStr for BucketStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BucketStrategy::Auto),
            "scan" => Ok(BucketStrategy::Scan),
            other => Err(Error::Config(format!("unknown bucketing strategy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Fail with `NonTerminating` instead of warning when a draining operator
    /// or terminal sits on an input that reports itself unbounded.
    pub strict_bounds: bool,

    pub bucketing: BucketStrategy,

    /// Initial capacity for order/reverse/group buffers.
    pub buffer_capacity_hint: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            strict_bounds: false,
            bucketing: BucketStrategy::Auto,
            buffer_capacity_hint: 0,
        }
    }
}

impl QueryConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LAZYSEQ_STRICT_BOUNDS`: `true`/`false`
    /// - `LAZYSEQ_BUCKETING`: `auto`/`scan`
    /// - `LAZYSEQ_BUFFER_CAPACITY_HINT`: element count
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`QueryConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(s) = lookup("LAZYSEQ_STRICT_BOUNDS") {
            cfg.strict_bounds = s.trim().parse::<bool>().map_err(|_| {
                Error::Config(format!("LAZYSEQ_STRICT_BOUNDS: expected true/false, got '{s}'"))
            })?;
        }

        if let Some(s) = lookup("LAZYSEQ_BUCKETING") {
            cfg.bucketing = s.parse()?;
        }

        if let Some(s) = lookup("LAZYSEQ_BUFFER_CAPACITY_HINT") {
            cfg.buffer_capacity_hint = s.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("LAZYSEQ_BUFFER_CAPACITY_HINT: not a count: '{s}'"))
            })?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity_hint > MAX_BUFFER_CAPACITY_HINT {
            return Err(Error::Config(format!(
                "buffer_capacity_hint {} exceeds {}",
                self.buffer_capacity_hint, MAX_BUFFER_CAPACITY_HINT
            )));
        }
        Ok(())
    }

    pub fn with_strict_bounds(mut self, strict: bool) -> Self {
        self.strict_bounds = strict;
        self
    }

    pub fn with_bucketing(mut self, bucketing: BucketStrategy) -> Self {
        self.bucketing = bucketing;
        self
    }

    pub fn with_buffer_capacity_hint(mut self, elements: usize) -> Self {
        self.buffer_capacity_hint = elements;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let cfg = QueryConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, QueryConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let cfg = QueryConfig::from_lookup(lookup_from(&[
            ("LAZYSEQ_STRICT_BOUNDS", "true"),
            ("LAZYSEQ_BUCKETING", "Scan"),
            ("LAZYSEQ_BUFFER_CAPACITY_HINT", "128"),
        ]))
        .unwrap();
        assert!(cfg.strict_bounds);
        assert_eq!(cfg.bucketing, BucketStrategy::Scan);
        assert_eq!(cfg.buffer_capacity_hint, 128);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = QueryConfig::from_lookup(lookup_from(&[("LAZYSEQ_BUCKETING", "sorted")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = QueryConfig::from_lookup(lookup_from(&[("LAZYSEQ_STRICT_BOUNDS", "yes")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_caps_capacity_hint() {
        let cfg = QueryConfig::default().with_buffer_capacity_hint(MAX_BUFFER_CAPACITY_HINT + 1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip_uses_snake_case() {
        let cfg = QueryConfig::default().with_bucketing(BucketStrategy::Scan);
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"scan\""));
        let back: QueryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
