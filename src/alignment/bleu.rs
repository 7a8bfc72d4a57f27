use std::collections::HashMap;

use crate::alignment::normalize::normalize;
use crate::types::{ScoreCandidate, ScoreTable};

type Ngram = Vec<u32>;

/// Token ids shared by every sentence scored in one batch.
#[derive(Default)]
struct Vocabulary {
    ids: HashMap<String, u32>,
}

impl Vocabulary {
    fn intern(&mut self, tokens: Vec<String>) -> Vec<u32> {
        tokens
            .into_iter()
            .map(|tok| {
                let next = self.ids.len() as u32;
                *self.ids.entry(tok).or_insert(next)
            })
            .collect()
    }
}

/// N-gram counts of one sentence, grouped by order (index 0 = unigrams).
struct CookedSentence {
    len: usize,
    counts: Vec<HashMap<Ngram, u32>>,
}

impl CookedSentence {
    fn new(ids: &[u32], order: usize) -> Self {
        let mut counts = vec![HashMap::new(); order];
        for (k, by_order) in counts.iter_mut().enumerate() {
            let n = k + 1;
            if ids.len() < n {
                continue;
            }
            for window in ids.windows(n) {
                *by_order.entry(window.to_vec()).or_insert(0) += 1;
            }
        }
        Self {
            len: ids.len(),
            counts,
        }
    }
}

/// Clipped matches per order between two cooked sentences. `None` when the
/// highest order has no match: lower orders cannot lift a zero score.
fn clipped_matches(test: &CookedSentence, reference: &CookedSentence) -> Option<Vec<u32>> {
    let order = test.counts.len();
    let top = order.checked_sub(1)?;
    let mut correct = vec![0u32; order];

    for k in std::iter::once(top).chain(0..top) {
        let (test_counts, ref_counts) = (&test.counts[k], &reference.counts[k]);
        for (ngram, &count) in test_counts {
            if let Some(&ref_count) = ref_counts.get(ngram) {
                correct[k] += count.min(ref_count);
            }
        }
        if k == top && correct[k] == 0 {
            return None;
        }
    }
    Some(correct)
}

/// Unsmoothed sentence BLEU of a hypothesis of `guess_len` tokens against
/// a reference of `ref_len` tokens, given the clipped match counts.
fn directional_bleu(correct: &[u32], guess_len: usize, ref_len: usize) -> f64 {
    if guess_len == 0 || correct.is_empty() {
        return 0.0;
    }
    let order = correct.len();
    let mut log_bleu = 0.0;
    for (k, &c) in correct.iter().enumerate() {
        let guess = guess_len.saturating_sub(k);
        if c == 0 || guess == 0 {
            return 0.0;
        }
        log_bleu += (c as f64).ln() - (guess as f64).ln();
    }
    log_bleu /= order as f64;
    log_bleu += (1.0 - ref_len as f64 / guess_len as f64).min(0.0);
    log_bleu.exp()
}

/// Harmonic mean of the two directional scores; symmetric in its inputs.
fn symmetric_score(correct: &[u32], test_len: usize, ref_len: usize) -> f64 {
    let forward = directional_bleu(correct, test_len, ref_len);
    if forward <= 0.0 {
        return 0.0;
    }
    let backward = directional_bleu(correct, ref_len, test_len);
    if backward <= 0.0 {
        return 0.0;
    }
    2.0 * forward * backward / (forward + backward)
}

/// Symmetric BLEU similarity between sentences.
#[derive(Debug, Clone)]
pub struct BleuScorer {
    pub ngram_order: usize,
    pub max_alternatives: usize,
}

impl BleuScorer {
    pub fn new(ngram_order: usize, max_alternatives: usize) -> Self {
        Self {
            ngram_order: ngram_order.max(1),
            max_alternatives: max_alternatives.max(1),
        }
    }

    /// Similarity of a single pair, in [0, 1].
    pub fn score(&self, test: &str, reference: &str) -> f64 {
        let mut vocab = Vocabulary::default();
        let test = CookedSentence::new(&vocab.intern(normalize(test)), self.ngram_order);
        let reference =
            CookedSentence::new(&vocab.intern(normalize(reference)), self.ngram_order);
        clipped_matches(&test, &reference)
            .map(|correct| symmetric_score(&correct, test.len, reference.len))
            .unwrap_or(0.0)
    }

    /// Scores every test sentence against every reference and keeps the best
    /// `max_alternatives` candidates per test sentence. Ties keep reference
    /// order.
    pub fn evaluate(&self, tests: &[&str], references: &[&str]) -> ScoreTable {
        let mut vocab = Vocabulary::default();
        let cooked_refs: Vec<CookedSentence> = references
            .iter()
            .map(|r| CookedSentence::new(&vocab.intern(normalize(r)), self.ngram_order))
            .collect();

        tests
            .iter()
            .map(|t| {
                let cooked = CookedSentence::new(&vocab.intern(normalize(t)), self.ngram_order);
                let mut candidates: Vec<ScoreCandidate> = cooked_refs
                    .iter()
                    .enumerate()
                    .filter_map(|(target, reference)| {
                        let correct = clipped_matches(&cooked, reference)?;
                        let score = symmetric_score(&correct, cooked.len, reference.len);
                        (score > 0.0).then_some(ScoreCandidate {
                            score,
                            target,
                            correct,
                        })
                    })
                    .collect();
                candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
                candidates.truncate(self.max_alternatives);
                candidates
            })
            .collect()
    }
}

/// Corpus-level sufficient statistics for classic BLEU.
#[derive(Debug, Clone, Default, PartialEq)]
struct CorpusStats {
    test_len: usize,
    ref_len: usize,
    guess: Vec<usize>,
    correct: Vec<u32>,
}

/// Classic BLEU over a set of (hypothesis, reference) lines, with the
/// brevity penalty computed on summed lengths. Zero when any order has no
/// match at all.
pub fn corpus_bleu(tests: &[&str], references: &[&str], ngram_order: usize) -> f64 {
    let order = ngram_order.max(1);
    let mut stats = CorpusStats {
        guess: vec![0; order],
        correct: vec![0; order],
        ..CorpusStats::default()
    };
    let mut vocab = Vocabulary::default();

    for (test, reference) in tests.iter().zip(references) {
        let test = CookedSentence::new(&vocab.intern(normalize(test)), order);
        let reference = CookedSentence::new(&vocab.intern(normalize(reference)), order);
        stats.test_len += test.len;
        stats.ref_len += reference.len;
        for k in 0..order {
            stats.guess[k] += test.len.saturating_sub(k);
            for (ngram, &count) in &test.counts[k] {
                if let Some(&ref_count) = reference.counts[k].get(ngram) {
                    stats.correct[k] += count.min(ref_count);
                }
            }
        }
    }

    if stats.test_len == 0 {
        return 0.0;
    }
    let mut log_bleu = 0.0;
    for k in 0..order {
        if stats.correct[k] == 0 || stats.guess[k] == 0 {
            return 0.0;
        }
        log_bleu += (stats.correct[k] as f64).ln() - (stats.guess[k] as f64).ln();
    }
    log_bleu /= order as f64;
    log_bleu += (1.0 - stats.ref_len as f64 / stats.test_len as f64).min(0.0);
    log_bleu.exp()
}

/// Harmonic mean of corpus BLEU in both directions.
pub fn symmetric_corpus_bleu(tests: &[&str], references: &[&str], ngram_order: usize) -> f64 {
    let forward = corpus_bleu(tests, references, ngram_order);
    if forward <= 0.0 {
        return 0.0;
    }
    let backward = corpus_bleu(references, tests, ngram_order);
    if backward <= 0.0 {
        return 0.0;
    }
    2.0 * forward * backward / (forward + backward)
}
