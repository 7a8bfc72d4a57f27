//! Turns the sparse 1-to-1 BLEU path into full coverage.
//!
//! Every stretch of unaligned sentences between two accepted pairs (and
//! before the first / after the last) is a gap. A gap is resolved by growing
//! its neighbouring groups, by committing BLEU-confirmed 1-to-1 pairs, or by
//! handing the rest to the length-based aligner.

use std::collections::{HashMap, HashSet};

use crate::alignment::gale_church::sentence_length;
use crate::config::{AlignerConfig, GapFillHeuristic};
use crate::pipeline::traits::{LengthAligner, SimilarityScorer};
use crate::types::{sort_multialign, AlignMethod, AlignTag, AlignmentPair, Multialign};

#[cfg(test)]
mod tests;

/// A source group and a target group, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Group {
    source: Vec<usize>,
    target: Vec<usize>,
}

impl Group {
    fn single(source: usize, target: usize) -> Self {
        Self {
            source: vec![source],
            target: vec![target],
        }
    }
}

/// Best match of an evaluated source group, with target ids resolved.
#[derive(Debug, Clone)]
struct GroupCandidate {
    score: f64,
    target: Vec<usize>,
    correct: Vec<u32>,
}

type GroupScores = HashMap<Vec<usize>, Vec<GroupCandidate>>;

/// Ids plus concatenated text of one entry of a gap's evaluation set.
type EvalEntry = (Vec<usize>, String);

pub struct GapFiller<'a> {
    config: &'a AlignerConfig,
    scorer: &'a dyn SimilarityScorer,
    length_aligner: &'a dyn LengthAligner,
    translations: &'a [String],
    targets: &'a [String],
    bleu_path: HashSet<(usize, usize)>,
    multialign: Multialign,
}

impl<'a> GapFiller<'a> {
    pub fn new(
        config: &'a AlignerConfig,
        scorer: &'a dyn SimilarityScorer,
        length_aligner: &'a dyn LengthAligner,
        translations: &'a [String],
        targets: &'a [String],
    ) -> Self {
        Self {
            config,
            scorer,
            length_aligner,
            translations,
            targets,
            bleu_path: HashSet::new(),
            multialign: Multialign::new(),
        }
    }

    /// Resolves every gap around `path` and returns the sorted alignment.
    pub fn fill(mut self, path: &[(usize, usize)]) -> Multialign {
        self.bleu_path = path.iter().copied().collect();
        let mut last = Group::default();

        for &(src, tgt) in path {
            let source_start = last.source.last().map_or(0, |&s| s + 1);
            let target_start = last.target.last().map_or(0, |&t| t + 1);
            let source_gap: Vec<usize> = (source_start..src).collect();
            let target_gap: Vec<usize> = (target_start..tgt).collect();

            if source_gap.is_empty() && target_gap.is_empty() {
                self.add(&last, None);
                last = Group::single(src, tgt);
            } else {
                last = self.fill_gap(source_gap, target_gap, last, Group::single(src, tgt));
            }
        }

        let source_start = path.last().map_or(0, |&(s, _)| s + 1);
        let target_start = path.last().map_or(0, |&(_, t)| t + 1);
        let source_gap: Vec<usize> = (source_start..self.translations.len()).collect();
        let target_gap: Vec<usize> = (target_start..self.targets.len()).collect();
        if !source_gap.is_empty() || !target_gap.is_empty() {
            last = self.fill_gap(source_gap, target_gap, last, Group::default());
        }
        self.add(&last, None);

        sort_multialign(&mut self.multialign);
        self.multialign
    }

    fn add(&mut self, group: &Group, method: Option<AlignMethod>) {
        if group.source.is_empty() || group.target.is_empty() {
            return;
        }
        let method = method.unwrap_or_else(|| {
            let on_path = matches!(
                (group.source.as_slice(), group.target.as_slice()),
                ([s], [t]) if self.bleu_path.contains(&(*s, *t))
            );
            if on_path {
                AlignMethod::Bleu
            } else {
                AlignMethod::GapFiller
            }
        });
        self.multialign.push(AlignmentPair::new(
            group.source.clone(),
            group.target.clone(),
            AlignTag::from(method),
        ));
    }

    fn already_added(&self, group: &Group) -> bool {
        self.multialign
            .iter()
            .any(|p| p.source == group.source && p.target == group.target)
    }

    /// Resolves one gap. The pre-gap group is committed here; the post-gap
    /// group, possibly grown, is handed back to become the next pre-gap group.
    fn fill_gap(
        &mut self,
        mut source_gap: Vec<usize>,
        mut target_gap: Vec<usize>,
        mut pregap: Group,
        mut postgap: Group,
    ) -> Group {
        let n_to_1 = self.config.n_to_1;
        let bleu1to1 = self.config.uses(GapFillHeuristic::Bleu1to1);
        let scores = if n_to_1 > 1 || bleu1to1 {
            self.score_gap(&source_gap, &target_gap, &pregap, &postgap)
        } else {
            GroupScores::new()
        };

        while !source_gap.is_empty() || !target_gap.is_empty() {
            if !source_gap.is_empty() && n_to_1 > 1 {
                let old = best_candidate(&scores, &pregap.source);
                if let (Some(old), Some(&next)) = (old, source_gap.first()) {
                    let mut combined = pregap.source.clone();
                    combined.push(next);
                    if let Some(new) = best_candidate(&scores, &combined) {
                        if improves(new, old) && new.target == pregap.target {
                            tracing::trace!(source_group = ?combined, "grew pre-gap source group");
                            pregap.source = combined;
                            source_gap.remove(0);
                            continue;
                        }
                    }
                }

                let old = best_candidate(&scores, &postgap.source);
                if let (Some(old), Some(&prev)) = (old, source_gap.last()) {
                    let mut combined = vec![prev];
                    combined.extend_from_slice(&postgap.source);
                    if let Some(new) = best_candidate(&scores, &combined) {
                        if improves(new, old) && new.target == postgap.target {
                            tracing::trace!(source_group = ?combined, "grew post-gap source group");
                            postgap.source = combined;
                            source_gap.pop();
                            continue;
                        }
                    }
                }
            }

            if !target_gap.is_empty() && n_to_1 > 1 {
                if let Some(new) = best_candidate(&scores, &pregap.source) {
                    if new.target != pregap.target
                        && new.target != postgap.target
                        && extends_forward(&pregap.target, &new.target, &target_gap)
                    {
                        tracing::trace!(target_group = ?new.target, "grew pre-gap target group");
                        let added = new.target.len() - pregap.target.len();
                        pregap.target = new.target.clone();
                        target_gap = target_gap.split_off(added);
                        continue;
                    }
                }

                if let Some(new) = best_candidate(&scores, &postgap.source) {
                    if new.target != postgap.target
                        && new.target != pregap.target
                        && extends_backward(&postgap.target, &new.target, &target_gap)
                    {
                        tracing::trace!(target_group = ?new.target, "grew post-gap target group");
                        let added = new.target.len() - postgap.target.len();
                        postgap.target = new.target.clone();
                        target_gap.truncate(target_gap.len() - added);
                        continue;
                    }
                }
            }

            if let (Some(&src), Some(&tgt)) = (source_gap.first(), target_gap.first()) {
                let confirmed =
                    best_candidate(&scores, &[src]).is_some_and(|c| c.target == [tgt]);
                if bleu1to1 && confirmed {
                    tracing::trace!(source_id = src, target_id = tgt, "bleu-confirmed 1-to-1 pair");
                    self.add(&pregap, None);
                    pregap = Group::single(src, tgt);
                    source_gap.remove(0);
                    target_gap.remove(0);
                    continue;
                }

                if self.config.uses(GapFillHeuristic::Galechurch)
                    && balanced(source_gap.len(), target_gap.len())
                {
                    self.align_by_length(&source_gap, &target_gap);
                    break;
                }
            }
            break;
        }

        if !self.already_added(&pregap) {
            self.add(&pregap, None);
        }
        postgap
    }

    fn align_by_length(&mut self, source_gap: &[usize], target_gap: &[usize]) {
        let source_lengths: Vec<usize> = source_gap
            .iter()
            .map(|&i| sentence_length(&self.translations[i]))
            .collect();
        let target_lengths: Vec<usize> = target_gap
            .iter()
            .map(|&j| sentence_length(&self.targets[j]))
            .collect();

        let groups = self
            .length_aligner
            .align_lengths(&source_lengths, &target_lengths);
        tracing::trace!(
            sources = source_gap.len(),
            targets = target_gap.len(),
            groups = groups.len(),
            "length-based alignment of remaining gap"
        );
        for (src, tgt) in groups {
            let group = Group {
                source: src.iter().filter_map(|&o| source_gap.get(o).copied()).collect(),
                target: tgt.iter().filter_map(|&o| target_gap.get(o).copied()).collect(),
            };
            self.add(&group, Some(AlignMethod::GaleChurch));
        }
    }

    /// Scores the gap's evaluation set: both neighbouring groups, the
    /// windowed gap sentences and all adjacent concatenations up to `n_to_1`.
    fn score_gap(
        &self,
        source_gap: &[usize],
        target_gap: &[usize],
        pregap: &Group,
        postgap: &Group,
    ) -> GroupScores {
        let window = if self.config.uses(GapFillHeuristic::Bleu1to1) {
            10 + self.config.n_to_1
        } else {
            self.config.n_to_1
        };

        let sources = evaluation_set(
            self.translations,
            &pregap.source,
            source_gap,
            &postgap.source,
            window,
            self.config.n_to_1,
        );
        let targets = evaluation_set(
            self.targets,
            &pregap.target,
            target_gap,
            &postgap.target,
            window,
            self.config.n_to_1,
        );

        let tests: Vec<&str> = sources.iter().map(|(_, text)| text.as_str()).collect();
        let refs: Vec<&str> = targets.iter().map(|(_, text)| text.as_str()).collect();
        let table = self.scorer.score_sentences(&tests, &refs);

        let mut scores = GroupScores::new();
        for ((ids, _), candidates) in sources.into_iter().zip(table) {
            let resolved = candidates
                .into_iter()
                .filter_map(|c| {
                    Some(GroupCandidate {
                        score: c.score,
                        target: targets.get(c.target)?.0.clone(),
                        correct: c.correct,
                    })
                })
                .collect();
            scores.insert(ids, resolved);
        }
        scores
    }
}

/// Pre-gap group, windowed gap sentences and post-gap group, followed by
/// every run of `2..=n_to_1` adjacent entries of that base list.
fn evaluation_set(
    sentences: &[String],
    pregap: &[usize],
    gap: &[usize],
    postgap: &[usize],
    window: usize,
    n_to_1: usize,
) -> Vec<EvalEntry> {
    let join = |ids: &[usize]| -> String {
        ids.iter()
            .filter_map(|&i| sentences.get(i).map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut base: Vec<EvalEntry> = vec![(pregap.to_vec(), join(pregap))];
    base.extend(
        gap.iter()
            .enumerate()
            .filter(|&(i, _)| i < window || gap.len() - i <= window)
            .map(|(_, &id)| (vec![id], join(&[id]))),
    );
    base.push((postgap.to_vec(), join(postgap)));

    let mut all = base.clone();
    for n in 2..=n_to_1 {
        all.extend(base.windows(n).map(|run| {
            let ids = run.iter().flat_map(|(ids, _)| ids.iter().copied()).collect();
            let text = run
                .iter()
                .map(|(_, text)| text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            (ids, text)
        }));
    }
    all
}

fn best_candidate<'s>(scores: &'s GroupScores, ids: &[usize]) -> Option<&'s GroupCandidate> {
    scores.get(ids).and_then(|candidates| candidates.first())
}

/// Strictly better score and strictly more matched n-grams, compared order
/// by order from unigrams up.
fn improves(new: &GroupCandidate, old: &GroupCandidate) -> bool {
    new.score > old.score && new.correct > old.correct
}

/// `new` is `old` followed by a non-empty prefix of the gap.
fn extends_forward(old: &[usize], new: &[usize], gap: &[usize]) -> bool {
    !old.is_empty()
        && new.len() > old.len()
        && new.starts_with(old)
        && gap.starts_with(&new[old.len()..])
}

/// `new` is a non-empty suffix of the gap followed by `old`.
fn extends_backward(old: &[usize], new: &[usize], gap: &[usize]) -> bool {
    !old.is_empty()
        && new.len() > old.len()
        && new.ends_with(old)
        && gap.ends_with(&new[..new.len() - old.len()])
}

/// Remaining gap is small, or its sides differ by less than a factor two.
fn balanced(source: usize, target: usize) -> bool {
    let (longer, shorter) = (source.max(target), source.min(target));
    longer < 4 || (shorter > 0 && (longer as f64) / (shorter as f64) < 2.0)
}
