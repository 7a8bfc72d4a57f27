use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

/// Heuristics the gap filler may use after BLEU group extension fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapFillHeuristic {
    /// Commit a 1-to-1 pair at the head of the gap when BLEU confirms it.
    Bleu1to1,
    /// Hand a balanced remaining gap to the length-based aligner.
    Galechurch,
}

impl GapFillHeuristic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bleu1to1 => "bleu1to1",
            Self::Galechurch => "galechurch",
        }
    }
}

impl std::str::FromStr for GapFillHeuristic {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bleu1to1" => Ok(Self::Bleu1to1),
            "galechurch" => Ok(Self::Galechurch),
            other => Err(AlignmentError::config(format!(
                "unknown gap-filling heuristic '{other}' (expected bleu1to1 or galechurch)"
            ))),
        }
    }
}

/// Article-level alignment parameters, immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignerConfig {
    pub ngram_order: usize,
    pub max_alternatives: usize,
    pub n_to_1: usize,
    pub gap_fill_heuristics: BTreeSet<GapFillHeuristic>,
    pub workers: usize,
    pub gale_church_only: bool,
    pub no_translation_override: bool,
    pub end_of_article_marker: String,
}

impl AlignerConfig {
    pub const DEFAULT_NGRAM_ORDER: usize = 2;
    pub const DEFAULT_MAX_ALTERNATIVES: usize = 3;
    pub const DEFAULT_N_TO_1: usize = 2;
    pub const DEFAULT_WORKERS: usize = 4;
    pub const DEFAULT_MARKER: &'static str = ".EOA";

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse aligner config", e))
    }

    pub fn uses(&self, heuristic: GapFillHeuristic) -> bool {
        self.gap_fill_heuristics.contains(&heuristic)
    }

    /// Capacity of the bounded task queue between producer and workers.
    pub fn queue_capacity(&self) -> usize {
        self.workers + 1
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.ngram_order == 0 {
            return Err(AlignmentError::config("ngram_order must be >= 1"));
        }
        if self.max_alternatives == 0 {
            return Err(AlignmentError::config("max_alternatives must be >= 1"));
        }
        if self.n_to_1 == 0 {
            return Err(AlignmentError::config("n_to_1 must be >= 1"));
        }
        if self.workers == 0 {
            return Err(AlignmentError::config("workers must be >= 1"));
        }
        if self.end_of_article_marker.trim().is_empty() {
            return Err(AlignmentError::config(
                "end_of_article_marker must not be empty",
            ));
        }
        Ok(())
    }

    /// Checks that the translation inputs make a run possible at all.
    pub fn validate_inputs(
        &self,
        source_to_target: usize,
        target_to_source: usize,
    ) -> Result<(), AlignmentError> {
        self.validate()?;
        if source_to_target == 0
            && target_to_source == 0
            && !self.no_translation_override
            && !self.gale_church_only
        {
            return Err(AlignmentError::config(
                "no translation available: BLEU scores can be computed between the source \
                 and target text directly, but this usually aligns poorly; enable \
                 no_translation_override or gale_church_only if that is intended",
            ));
        }
        Ok(())
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            ngram_order: Self::DEFAULT_NGRAM_ORDER,
            max_alternatives: Self::DEFAULT_MAX_ALTERNATIVES,
            n_to_1: Self::DEFAULT_N_TO_1,
            gap_fill_heuristics: [GapFillHeuristic::Bleu1to1, GapFillHeuristic::Galechurch]
                .into_iter()
                .collect(),
            workers: Self::DEFAULT_WORKERS,
            gale_church_only: false,
            no_translation_override: false,
            end_of_article_marker: Self::DEFAULT_MARKER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligner_config_default() {
        let config = AlignerConfig::default();
        assert_eq!(config.ngram_order, 2);
        assert_eq!(config.max_alternatives, 3);
        assert_eq!(config.n_to_1, 2);
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity(), 5);
        assert!(config.uses(GapFillHeuristic::Bleu1to1));
        assert!(config.uses(GapFillHeuristic::Galechurch));
        assert_eq!(config.end_of_article_marker, ".EOA");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "ngram_order": 4, "gap_fill_heuristics": ["galechurch"] }"#;
        let config: AlignerConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.ngram_order, 4);
        assert_eq!(config.max_alternatives, 3);
        assert!(!config.uses(GapFillHeuristic::Bleu1to1));
        assert!(config.uses(GapFillHeuristic::Galechurch));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{ "ngrams": 4 }"#;
        assert!(serde_json::from_str::<AlignerConfig>(json).is_err());
    }

    #[test]
    fn missing_translation_is_a_config_error() {
        let config = AlignerConfig::default();
        let err = config.validate_inputs(0, 0).unwrap_err();
        assert!(matches!(err, AlignmentError::Config { .. }));
        assert!(config.validate_inputs(1, 0).is_ok());
        assert!(config.validate_inputs(0, 1).is_ok());

        let override_config = AlignerConfig {
            no_translation_override: true,
            ..AlignerConfig::default()
        };
        assert!(override_config.validate_inputs(0, 0).is_ok());

        let gc_config = AlignerConfig {
            gale_church_only: true,
            ..AlignerConfig::default()
        };
        assert!(gc_config.validate_inputs(0, 0).is_ok());
    }

    #[test]
    fn zero_parameters_are_rejected() {
        for config in [
            AlignerConfig {
                ngram_order: 0,
                ..AlignerConfig::default()
            },
            AlignerConfig {
                max_alternatives: 0,
                ..AlignerConfig::default()
            },
            AlignerConfig {
                workers: 0,
                ..AlignerConfig::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn heuristic_parses_from_cli_names() {
        assert_eq!(
            "bleu1to1".parse::<GapFillHeuristic>().unwrap(),
            GapFillHeuristic::Bleu1to1
        );
        assert!("fuzzy".parse::<GapFillHeuristic>().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aligner.json");
        std::fs::write(&path, r#"{ "workers": 2 }"#).expect("write config");
        let config = AlignerConfig::load(&path).expect("load config");
        assert_eq!(config.workers, 2);
        assert!(AlignerConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
