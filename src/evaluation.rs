//! Precision and recall of computed alignments against a gold standard.
//!
//! A pair is a strict hit when the exact same groups appear on the other
//! side. It is a lax hit when some pair on the other side overlaps it on
//! both the source and the target side.

use std::collections::{BTreeMap, HashSet};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::error::AlignmentError;
use crate::pipeline::traits::AlignmentSink;
use crate::types::{AlignTag, AlignmentPair, ArticleAlignment};

pub type GoldPair = (Vec<usize>, Vec<usize>);
/// Gold pairs of one article.
pub type GoldArticle = Vec<GoldPair>;

/// Reads `[[ [[src...],[tgt...]], ... ], ...]`, one list per article.
pub fn load_gold(path: &Path) -> Result<Vec<GoldArticle>, AlignmentError> {
    let data =
        std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read gold alignment", e))?;
    serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse gold alignment", e))
}

/// Strict and lax hit/miss counts. For recall the misses are false
/// negatives, for precision false positives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairCounts {
    pub hits_strict: usize,
    pub misses_strict: usize,
    pub hits_lax: usize,
    pub misses_lax: usize,
}

impl PairCounts {
    pub fn strict_ratio(&self) -> f64 {
        ratio(self.hits_strict, self.misses_strict)
    }

    pub fn lax_ratio(&self) -> f64 {
        ratio(self.hits_lax, self.misses_lax)
    }

    fn record(&mut self, exact: bool, overlaps: bool) {
        if exact {
            self.hits_strict += 1;
            self.hits_lax += 1;
        } else if overlaps {
            self.misses_strict += 1;
            self.hits_lax += 1;
        } else {
            self.misses_strict += 1;
            self.misses_lax += 1;
        }
    }
}

impl AddAssign for PairCounts {
    fn add_assign(&mut self, other: Self) {
        self.hits_strict += other.hits_strict;
        self.misses_strict += other.misses_strict;
        self.hits_lax += other.hits_lax;
        self.misses_lax += other.misses_lax;
    }
}

fn ratio(hits: usize, misses: usize) -> f64 {
    if hits + misses == 0 {
        0.0
    } else {
        hits as f64 / (hits + misses) as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn overlaps(a: (&[usize], &[usize]), b: (&[usize], &[usize])) -> bool {
    let intersects = |x: &[usize], y: &[usize]| x.iter().any(|i| y.contains(i));
    intersects(a.0, b.0) && intersects(a.1, b.1)
}

/// Gold pairs found by `test`. Gold pairs with an empty side are ignored.
pub fn recall(gold: &[GoldPair], test: &[AlignmentPair]) -> PairCounts {
    let found: HashSet<(&[usize], &[usize])> = test
        .iter()
        .map(|p| (p.source.as_slice(), p.target.as_slice()))
        .collect();
    let mut counts = PairCounts::default();
    for (source, target) in gold {
        if source.is_empty() || target.is_empty() {
            continue;
        }
        let key = (source.as_slice(), target.as_slice());
        let exact = found.contains(&key);
        let lax = !exact && found.iter().any(|&pair| overlaps(key, pair));
        if !exact && !lax {
            tracing::trace!(source_group = ?source, target_group = ?target, "gold pair not found");
        }
        counts.record(exact, lax);
    }
    counts
}

/// Test pairs confirmed by `gold`. Pairs with both sides empty are ignored.
pub fn precision<'a, I>(gold: &[GoldPair], test: I) -> PairCounts
where
    I: IntoIterator<Item = &'a AlignmentPair>,
{
    let mut counts = PairCounts::default();
    for pair in test {
        if pair.source.is_empty() && pair.target.is_empty() {
            continue;
        }
        let key = (pair.source.as_slice(), pair.target.as_slice());
        let exact = gold.iter().any(|(s, t)| s == &pair.source && t == &pair.target);
        let lax = !exact
            && gold
                .iter()
                .any(|(s, t)| overlaps(key, (s.as_slice(), t.as_slice())));
        if !exact && !lax {
            tracing::trace!(source_group = ?pair.source, target_group = ?pair.target, "false positive");
        }
        counts.record(exact, lax);
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArticleEvaluation {
    pub recall: PairCounts,
    pub precision: PairCounts,
}

/// Scores one article and logs per-tag precision and gold shape
/// frequencies.
pub fn evaluate_article(index: usize, test: &[AlignmentPair], gold: &[GoldPair]) -> ArticleEvaluation {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let mut shapes: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for (source, target) in gold {
            *shapes.entry((source.len(), target.len())).or_default() += 1;
        }
        let mut shapes: Vec<_> = shapes.into_iter().collect();
        shapes.sort_by(|a, b| b.1.cmp(&a.1));
        for ((source_len, target_len), count) in shapes {
            tracing::debug!(
                article = index,
                shape = %format!("{source_len}-{target_len}"),
                count,
                share = count as f64 / gold.len() as f64,
                "gold alignment frequency"
            );
        }

        let tags: Vec<AlignTag> = {
            let mut tags: Vec<AlignTag> = test.iter().map(|p| p.tag).collect();
            tags.sort();
            tags.dedup();
            tags
        };
        for tag in tags {
            let of_tag: Vec<&AlignmentPair> = test.iter().filter(|p| p.tag == tag).collect();
            let counts = precision(gold, of_tag.iter().copied());
            tracing::debug!(
                article = index,
                tag = %tag,
                pairs = of_tag.len(),
                precision_strict = counts.strict_ratio(),
                precision_lax = counts.lax_ratio(),
                "precision by alignment type"
            );
        }
    }

    let evaluation = ArticleEvaluation {
        recall: recall(gold, test),
        precision: precision(gold, test),
    };
    tracing::debug!(
        article = index,
        gold_pairs = gold.len(),
        test_pairs = test.len(),
        recall_strict = evaluation.recall.strict_ratio(),
        recall_lax = evaluation.recall.lax_ratio(),
        precision_strict = evaluation.precision.strict_ratio(),
        precision_lax = evaluation.precision.lax_ratio(),
        "article evaluated"
    );
    evaluation
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub generated_at: String,
    pub articles: usize,
    pub recall: PairCounts,
    pub precision: PairCounts,
    pub recall_strict: f64,
    pub recall_lax: f64,
    pub precision_strict: f64,
    pub precision_lax: f64,
    pub f1_strict: f64,
    pub f1_lax: f64,
}

impl EvaluationReport {
    pub fn from_counts(articles: usize, recall: PairCounts, precision: PairCounts) -> Self {
        let (recall_strict, recall_lax) = (recall.strict_ratio(), recall.lax_ratio());
        let (precision_strict, precision_lax) = (precision.strict_ratio(), precision.lax_ratio());
        Self {
            generated_at: Utc::now().to_rfc3339(),
            articles,
            recall,
            precision,
            recall_strict,
            recall_lax,
            precision_strict,
            precision_lax,
            f1_strict: f1(precision_strict, recall_strict),
            f1_lax: f1(precision_lax, recall_lax),
        }
    }
}

/// Sink that evaluates every article against its gold alignment and
/// builds the corpus report on finish.
pub struct GoldEvaluator {
    gold: Vec<GoldArticle>,
    report_path: Option<PathBuf>,
    articles: usize,
    recall: PairCounts,
    precision: PairCounts,
    report: Option<EvaluationReport>,
}

impl GoldEvaluator {
    pub fn new(gold: Vec<GoldArticle>) -> Self {
        Self {
            gold,
            report_path: None,
            articles: 0,
            recall: PairCounts::default(),
            precision: PairCounts::default(),
            report: None,
        }
    }

    /// Also write the final report as JSON.
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Available once the run has finished.
    pub fn report(&self) -> Option<&EvaluationReport> {
        self.report.as_ref()
    }
}

impl AlignmentSink for GoldEvaluator {
    fn emit(&mut self, alignment: &ArticleAlignment) -> Result<(), AlignmentError> {
        let Some(gold) = self.gold.get(alignment.index) else {
            tracing::warn!(article = alignment.index, "no gold alignment for article, not evaluated");
            return Ok(());
        };
        let evaluation = evaluate_article(alignment.index, &alignment.multialign, gold);
        self.recall += evaluation.recall;
        self.precision += evaluation.precision;
        self.articles += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AlignmentError> {
        let report = EvaluationReport::from_counts(self.articles, self.recall, self.precision);
        tracing::info!(
            articles = report.articles,
            recall_strict = report.recall_strict,
            recall_lax = report.recall_lax,
            precision_strict = report.precision_strict,
            precision_lax = report.precision_lax,
            f1_strict = report.f1_strict,
            f1_lax = report.f1_lax,
            "evaluation finished"
        );
        if let Some(path) = &self.report_path {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| AlignmentError::json("serialize evaluation report", e))?;
            std::fs::write(path, json)
                .map_err(|e| AlignmentError::io("write evaluation report", e))?;
        }
        self.report = Some(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Article, WorkingState};

    fn pair(source: &[usize], target: &[usize], tag: AlignTag) -> AlignmentPair {
        AlignmentPair::new(source.to_vec(), target.to_vec(), tag)
    }

    fn gold() -> Vec<GoldPair> {
        vec![
            (vec![0], vec![0]),
            (vec![1, 2], vec![1]),
            (vec![3], vec![2]),
            (vec![4], vec![]),
        ]
    }

    #[test]
    fn recall_counts_strict_and_lax() {
        let test = vec![
            pair(&[0], &[0], AlignTag::Bleu),
            pair(&[1], &[1], AlignTag::Bleu),
        ];
        let counts = recall(&gold(), &test);
        assert_eq!(
            counts,
            PairCounts {
                hits_strict: 1,
                misses_strict: 2,
                hits_lax: 2,
                misses_lax: 1,
            }
        );
    }

    #[test]
    fn precision_counts_strict_and_lax() {
        let test = vec![
            pair(&[0], &[0], AlignTag::Bleu),
            pair(&[2], &[1], AlignTag::GapFiller),
            pair(&[5], &[5], AlignTag::GaleChurch),
            pair(&[], &[], AlignTag::Bleu),
        ];
        let counts = precision(&gold(), &test);
        assert_eq!(
            counts,
            PairCounts {
                hits_strict: 1,
                misses_strict: 2,
                hits_lax: 2,
                misses_lax: 1,
            }
        );
        assert!((counts.strict_ratio() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn report_combines_precision_and_recall() {
        let counts = PairCounts {
            hits_strict: 1,
            misses_strict: 1,
            hits_lax: 2,
            misses_lax: 0,
        };
        let report = EvaluationReport::from_counts(1, counts, counts);
        assert_eq!(report.f1_strict, 0.5);
        assert_eq!(report.f1_lax, 1.0);
        let empty = EvaluationReport::from_counts(0, PairCounts::default(), PairCounts::default());
        assert_eq!(empty.f1_strict, 0.0);
    }

    #[test]
    fn evaluator_sink_accumulates_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("eval.json");
        let mut evaluator = GoldEvaluator::new(vec![gold()]).with_report_path(&report_path);
        let aligned = ArticleAlignment {
            index: 0,
            article: Article::default(),
            multialign: vec![pair(&[0], &[0], AlignTag::Bleu), pair(&[3], &[2], AlignTag::Bleu)],
            last_run: WorkingState::default(),
        };
        evaluator.emit(&aligned).unwrap();
        // No gold for the second article.
        evaluator.emit(&ArticleAlignment { index: 1, ..aligned }).unwrap();
        evaluator.finish().unwrap();

        let report = evaluator.report().expect("report after finish");
        assert_eq!(report.articles, 1);
        assert_eq!(report.precision_strict, 1.0);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(written["articles"], 1);
        assert!(written["generated_at"].is_string());
    }

    #[test]
    fn gold_file_parses_nested_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold.json");
        std::fs::write(&path, "[[[[0],[0]],[[1,2],[1]]],[]]").unwrap();
        let gold = load_gold(&path).unwrap();
        assert_eq!(gold.len(), 2);
        assert_eq!(gold[0][1], (vec![1, 2], vec![1]));
        assert!(gold[1].is_empty());
    }
}
