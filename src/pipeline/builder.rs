use crate::alignment::bleu::BleuScorer;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{GaleChurchAligner, MonotonicPathFinder};
use crate::pipeline::runtime::{SentenceAligner, SentenceAlignerParts};
use crate::pipeline::traits::{LengthAligner, PathFinder, SimilarityScorer};

pub struct SentenceAlignerBuilder {
    config: AlignerConfig,
    scorer: Option<Box<dyn SimilarityScorer>>,
    path_finder: Option<Box<dyn PathFinder>>,
    length_aligner: Option<Box<dyn LengthAligner>>,
}

impl SentenceAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            scorer: None,
            path_finder: None,
            length_aligner: None,
        }
    }

    pub fn with_scorer(mut self, scorer: Box<dyn SimilarityScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_path_finder(mut self, path_finder: Box<dyn PathFinder>) -> Self {
        self.path_finder = Some(path_finder);
        self
    }

    pub fn with_length_aligner(mut self, length_aligner: Box<dyn LengthAligner>) -> Self {
        self.length_aligner = Some(length_aligner);
        self
    }

    pub fn build(self) -> Result<SentenceAligner, AlignmentError> {
        self.config.validate()?;
        let (ngram_order, max_alternatives) =
            (self.config.ngram_order, self.config.max_alternatives);

        Ok(SentenceAligner::from_parts(SentenceAlignerParts {
            config: self.config,
            scorer: self
                .scorer
                .unwrap_or_else(|| Box::new(BleuScorer::new(ngram_order, max_alternatives))),
            path_finder: self
                .path_finder
                .unwrap_or_else(|| Box::new(MonotonicPathFinder)),
            length_aligner: self
                .length_aligner
                .unwrap_or_else(|| Box::new(GaleChurchAligner)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlignTag, Article, ScoreCandidate, ScoreTable};

    /// Scores every pair of equal index as a perfect match.
    struct DiagonalScorer;

    impl SimilarityScorer for DiagonalScorer {
        fn score_sentences(&self, tests: &[&str], references: &[&str]) -> ScoreTable {
            (0..tests.len())
                .map(|i| {
                    if i < references.len() {
                        vec![ScoreCandidate {
                            score: 1.0,
                            target: i,
                            correct: vec![1],
                        }]
                    } else {
                        Vec::new()
                    }
                })
                .collect()
        }
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = AlignerConfig {
            ngram_order: 0,
            ..AlignerConfig::default()
        };
        assert!(SentenceAlignerBuilder::new(config).build().is_err());
    }

    #[test]
    fn builder_defaults_use_config() {
        let aligner = SentenceAlignerBuilder::new(AlignerConfig::default())
            .build()
            .expect("build should succeed");
        assert_eq!(aligner.config().ngram_order, AlignerConfig::DEFAULT_NGRAM_ORDER);
    }

    #[test]
    fn custom_scorer_is_used() {
        let aligner = SentenceAlignerBuilder::new(AlignerConfig::default())
            .with_scorer(Box::new(DiagonalScorer))
            .build()
            .expect("build should succeed");
        let article = Article::new(
            vec!["x".into(), "y".into()],
            vec!["p".into(), "q".into()],
        )
        .with_source_to_target(vec!["u".into(), "v".into()]);
        let out = aligner.align_article(0, &article).expect("aligned");
        assert_eq!(out.multialign.len(), 2);
        assert!(out.multialign.iter().all(|p| p.tag == AlignTag::Bleu));
    }
}
