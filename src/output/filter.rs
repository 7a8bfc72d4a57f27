use std::str::FromStr;

use crate::alignment::bleu::{corpus_bleu, symmetric_corpus_bleu};
use crate::error::AlignmentError;
use crate::output::render::RenderedLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Every aligned line pair is scored on its own.
    Sentences,
    /// Every article is scored as a whole.
    Articles,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sentences => "sentences",
            Self::Articles => "articles",
        }
    }
}

impl FromStr for FilterMode {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sentences" => Ok(Self::Sentences),
            "articles" => Ok(Self::Articles),
            other => Err(AlignmentError::config(format!(
                "unknown filter mode '{other}' (expected sentences or articles)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub mode: FilterMode,
    /// Percentage of lines, best scored first, that count as good.
    pub threshold: f64,
    /// Reject units whose source already scores better against the target
    /// than their translation does (source and target share a language).
    pub filterlang: bool,
    pub ngram_order: usize,
}

impl FilterOptions {
    pub const DEFAULT_THRESHOLD: f64 = 90.0;

    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            threshold: Self::DEFAULT_THRESHOLD,
            filterlang: false,
            ngram_order: crate::config::AlignerConfig::DEFAULT_NGRAM_ORDER,
        }
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(AlignmentError::config(format!(
                "filter threshold must be within 0..=100, got {}",
                self.threshold
            )));
        }
        if self.ngram_order == 0 {
            return Err(AlignmentError::config("filter ngram_order must be >= 1"));
        }
        Ok(())
    }
}

/// Output line pair as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub source: String,
    pub target: String,
}

impl From<&RenderedLine> for OutputLine {
    fn from(line: &RenderedLine) -> Self {
        Self {
            source: line.source_out.clone(),
            target: line.target_out.clone(),
        }
    }
}

#[derive(Debug)]
struct ScoredUnit {
    score: f64,
    lines: Vec<OutputLine>,
}

#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub good: Vec<OutputLine>,
    pub bad: Vec<OutputLine>,
    /// Line-weighted mean score; `None` when nothing was scored.
    pub average_score: Option<f64>,
}

/// Collects scored units over the whole corpus and splits them into good
/// and bad output once every article has been seen.
#[derive(Debug)]
pub struct BleuFilter {
    options: FilterOptions,
    units: Vec<ScoredUnit>,
}

impl BleuFilter {
    pub fn new(options: FilterOptions) -> Self {
        Self {
            options,
            units: Vec::new(),
        }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Scores the rendered lines of one article and returns the lines
    /// rejected right away by the language check. Placeholder lines are not
    /// scored and are not kept.
    pub fn add_article(&mut self, lines: &[RenderedLine]) -> Vec<OutputLine> {
        let aligned: Vec<&RenderedLine> = lines.iter().filter(|l| l.aligned).collect();
        if aligned.is_empty() {
            return Vec::new();
        }
        match self.options.mode {
            FilterMode::Sentences => {
                let mut rejected = Vec::new();
                for line in aligned {
                    let unit = [line];
                    match self.score_unit(&unit) {
                        Some(score) => self.units.push(ScoredUnit {
                            score,
                            lines: vec![OutputLine::from(line)],
                        }),
                        None => rejected.push(OutputLine::from(line)),
                    }
                }
                rejected
            }
            FilterMode::Articles => {
                let lines: Vec<OutputLine> = aligned.iter().map(|l| OutputLine::from(*l)).collect();
                match self.score_unit(&aligned) {
                    Some(score) => {
                        self.units.push(ScoredUnit { score, lines });
                        Vec::new()
                    }
                    None => lines,
                }
            }
        }
    }

    /// `None` when the language check rejects the unit.
    fn score_unit(&self, lines: &[&RenderedLine]) -> Option<f64> {
        let order = self.options.ngram_order;
        let sources: Vec<&str> = lines.iter().map(|l| l.source.as_str()).collect();
        let translations: Vec<&str> = lines.iter().map(|l| l.translation.as_str()).collect();
        let targets: Vec<&str> = lines.iter().map(|l| l.target.as_str()).collect();

        let translation_score = corpus_bleu(&translations, &targets, order);
        let source_score = corpus_bleu(&sources, &targets, order);
        tracing::trace!(translation_score, source_score, lines = lines.len(), "filter unit scored");
        if self.options.filterlang && source_score > translation_score {
            return None;
        }
        Some(symmetric_corpus_bleu(&translations, &targets, order))
    }

    /// Keeps the best units until their line count exceeds the threshold
    /// percentage of all lines. Output keeps the input order.
    pub fn finish(self) -> FilterOutcome {
        let total: usize = self.units.iter().map(|u| u.lines.len()).sum();
        if total == 0 {
            return FilterOutcome::default();
        }
        let weighted: f64 = self
            .units
            .iter()
            .map(|u| u.score * u.lines.len() as f64)
            .sum();
        let average_score = weighted / total as f64;

        let mut ranked: Vec<usize> = (0..self.units.len()).collect();
        ranked.sort_by(|&a, &b| self.units[b].score.total_cmp(&self.units[a].score));

        let good_length = total as f64 * self.options.threshold / 100.0;
        let mut is_bad = vec![false; self.units.len()];
        let mut cumulative = 0usize;
        for (rank, &unit) in ranked.iter().enumerate() {
            cumulative += self.units[unit].lines.len();
            if cumulative as f64 > good_length {
                for &rejected in &ranked[rank + 1..] {
                    is_bad[rejected] = true;
                }
                break;
            }
        }

        let rejected_units = is_bad.iter().filter(|b| **b).count();
        tracing::info!(
            mode = self.options.mode.as_str(),
            average_score,
            units = self.units.len(),
            rejected_units,
            "filter finished"
        );

        let mut outcome = FilterOutcome {
            average_score: Some(average_score),
            ..FilterOutcome::default()
        };
        for (unit, bad) in self.units.into_iter().zip(is_bad) {
            if bad {
                outcome.bad.extend(unit.lines);
            } else {
                outcome.good.extend(unit.lines);
            }
        }
        outcome
    }
}
