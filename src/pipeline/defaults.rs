use crate::alignment::bleu::BleuScorer;
use crate::alignment::gale_church::align_lengths;
use crate::alignment::path_finder::find_best_path;
use crate::pipeline::traits::{LengthAligner, PathFinder, SimilarityScorer};
use crate::types::ScoreTable;

impl SimilarityScorer for BleuScorer {
    fn score_sentences(&self, tests: &[&str], references: &[&str]) -> ScoreTable {
        self.evaluate(tests, references)
    }
}

pub struct MonotonicPathFinder;

impl PathFinder for MonotonicPathFinder {
    fn find_path(
        &self,
        scores: &ScoreTable,
        test_len: usize,
        ref_len: usize,
    ) -> Vec<(usize, usize)> {
        find_best_path(scores, test_len, ref_len)
    }
}

pub struct GaleChurchAligner;

impl LengthAligner for GaleChurchAligner {
    fn align_lengths(&self, source: &[usize], target: &[usize]) -> Vec<(Vec<usize>, Vec<usize>)> {
        align_lengths(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bleu_scorer_score_sentences() {
        let scorer = BleuScorer::new(2, 3);
        let table = scorer.score_sentences(&["the cat sat"], &["a dog", "the cat sat"]);
        assert_eq!(table, scorer.evaluate(&["the cat sat"], &["a dog", "the cat sat"]));
        assert_eq!(table[0][0].target, 1);
    }

    #[test]
    fn monotonic_path_finder_find_path() {
        let scorer = BleuScorer::new(2, 3);
        let tests = ["the cat sat down", "a dog ran home"];
        let table = scorer.evaluate(&tests, &tests);
        let path = MonotonicPathFinder.find_path(&table, 2, 2);
        assert_eq!(path, find_best_path(&table, 2, 2));
        assert_eq!(path, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn gale_church_aligner_align_lengths() {
        let groups = GaleChurchAligner.align_lengths(&[20, 30], &[21, 29]);
        assert_eq!(groups, align_lengths(&[20, 30], &[21, 29]));
        assert_eq!(groups.len(), 2);
    }
}
