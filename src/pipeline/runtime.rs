use crate::alignment::combine::{combine_directions, intersect_runs};
use crate::alignment::gale_church::sentence_length;
use crate::alignment::gap_filler::GapFiller;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::traits::{LengthAligner, PathFinder, SimilarityScorer};
use crate::types::{
    sort_multialign, AlignTag, AlignmentPair, Article, ArticleAlignment, Multialign, WorkingState,
};

/// Aligns one article at a time. Holds no per-article state, so one instance
/// is shared by every worker.
pub struct SentenceAligner {
    config: AlignerConfig,
    scorer: Box<dyn SimilarityScorer>,
    path_finder: Box<dyn PathFinder>,
    length_aligner: Box<dyn LengthAligner>,
}

pub(crate) struct SentenceAlignerParts {
    pub config: AlignerConfig,
    pub scorer: Box<dyn SimilarityScorer>,
    pub path_finder: Box<dyn PathFinder>,
    pub length_aligner: Box<dyn LengthAligner>,
}

impl SentenceAligner {
    pub(crate) fn from_parts(parts: SentenceAlignerParts) -> Self {
        Self {
            config: parts.config,
            scorer: parts.scorer,
            path_finder: parts.path_finder,
            length_aligner: parts.length_aligner,
        }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Aligns both directions of `article` and combines them.
    ///
    /// An article with an empty side yields an empty alignment.
    pub fn align_article(
        &self,
        index: usize,
        article: &Article,
    ) -> Result<ArticleAlignment, AlignmentError> {
        if article.is_degenerate() {
            tracing::warn!(
                article = index,
                source_len = article.source.len(),
                target_len = article.target.len(),
                "article is empty, skipping"
            );
            return Ok(ArticleAlignment {
                index,
                article: article.clone(),
                multialign: Multialign::new(),
                last_run: WorkingState::default(),
            });
        }
        check_translation_lengths(index, article)?;
        tracing::debug!(
            article = index,
            source_len = article.source.len(),
            target_len = article.target.len(),
            "processing article"
        );

        let mut last_run = WorkingState::default();
        let mut forward = Vec::with_capacity(article.source_to_target.len());
        for (file, translation) in article.source_to_target.iter().enumerate() {
            tracing::debug!(article = index, file, "aligning source-to-target translation");
            last_run = self.align_direction(translation, &article.target);
            forward.push(last_run.multialign.clone());
        }

        let mut backward = Vec::with_capacity(article.target_to_source.len());
        for (file, translation) in article.target_to_source.iter().enumerate() {
            tracing::debug!(article = index, file, "aligning target-to-source translation");
            last_run = self.align_direction(translation, &article.source);
            backward.push(last_run.multialign.clone());
        }

        if forward.is_empty() && backward.is_empty() {
            if !(self.config.no_translation_override || self.config.gale_church_only) {
                return Err(AlignmentError::config("no translation available"));
            }
            last_run = self.align_direction(&article.source, &article.target);
            forward.push(last_run.multialign.clone());
        }

        let forward = intersect_runs(forward);
        let backward = intersect_runs(backward);
        let mut multialign = combine_directions(forward, backward);
        sort_multialign(&mut multialign);

        log_statistics(index, article, &last_run, &multialign);
        Ok(ArticleAlignment {
            index,
            article: article.clone(),
            multialign,
            last_run,
        })
    }

    /// One alignment run of `translations` (a machine translation of one
    /// side) against the sentences of the other side.
    pub fn align_direction(&self, translations: &[String], targets: &[String]) -> WorkingState {
        if self.config.gale_church_only {
            let source_lengths: Vec<usize> =
                translations.iter().map(|s| sentence_length(s)).collect();
            let target_lengths: Vec<usize> = targets.iter().map(|s| sentence_length(s)).collect();
            let mut multialign: Multialign = self
                .length_aligner
                .align_lengths(&source_lengths, &target_lengths)
                .into_iter()
                .filter(|(src, tgt)| !src.is_empty() && !tgt.is_empty())
                .map(|(src, tgt)| AlignmentPair::new(src, tgt, AlignTag::GaleChurch))
                .collect();
            sort_multialign(&mut multialign);
            return WorkingState {
                multialign,
                ..WorkingState::default()
            };
        }

        let tests: Vec<&str> = translations.iter().map(String::as_str).collect();
        let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
        let scores = self.scorer.score_sentences(&tests, &refs);
        let bleu_path = self.path_finder.find_path(&scores, tests.len(), refs.len());
        tracing::debug!(matches = bleu_path.len(), "best 1-to-1 path found");

        let multialign = GapFiller::new(
            &self.config,
            self.scorer.as_ref(),
            self.length_aligner.as_ref(),
            translations,
            targets,
        )
        .fill(&bleu_path);

        WorkingState {
            scores,
            bleu_path,
            multialign,
        }
    }
}

fn check_translation_lengths(index: usize, article: &Article) -> Result<(), AlignmentError> {
    let sides = [
        ("source", article.source.len(), &article.source_to_target),
        ("target", article.target.len(), &article.target_to_source),
    ];
    for (side, expected, translations) in sides {
        if let Some(bad) = translations.iter().find(|t| t.len() != expected) {
            return Err(AlignmentError::invalid_input(format!(
                "article {index}: translation of the {side} side has {} sentences, expected {expected}",
                bad.len()
            )));
        }
    }
    Ok(())
}

fn log_statistics(index: usize, article: &Article, run: &WorkingState, multialign: &Multialign) {
    let source_len = article.source.len();
    let target_len = article.target.len();
    let source_aligned: usize = multialign.iter().map(|p| p.source.len()).sum();
    let target_aligned: usize = multialign.iter().map(|p| p.target.len()).sum();
    let percent = |n: usize, total: usize| 100.0 * n as f64 / total.max(1) as f64;

    tracing::debug!(
        article = index,
        bleu_aligned = run.bleu_path.len(),
        source_len,
        bleu_percent = percent(run.bleu_path.len(), source_len),
        "source sentences aligned by BLEU"
    );
    tracing::debug!(
        article = index,
        source_aligned,
        source_len,
        source_percent = percent(source_aligned, source_len),
        target_aligned,
        target_len,
        target_percent = percent(target_aligned, target_len),
        "coverage after gap filling"
    );

    if tracing::enabled!(tracing::Level::TRACE) {
        for source_id in 0..source_len {
            match run.bleu_path.iter().find(|(s, _)| *s == source_id) {
                Some(&(_, matched)) => {
                    tracing::trace!(article = index, source_id, matched, "bleu match")
                }
                None => {
                    let best = run
                        .scores
                        .get(source_id)
                        .and_then(|c| c.first())
                        .map(|c| c.target);
                    tracing::trace!(
                        article = index,
                        source_id,
                        best_candidate = ?best,
                        "unaligned by bleu"
                    );
                }
            }
        }
    }
}
