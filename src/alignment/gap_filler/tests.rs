use std::collections::BTreeSet;

use super::{balanced, evaluation_set, extends_backward, extends_forward, GapFiller};
use crate::alignment::bleu::BleuScorer;
use crate::alignment::path_finder::find_best_path;
use crate::config::{AlignerConfig, GapFillHeuristic};
use crate::pipeline::defaults::GaleChurchAligner;
use crate::pipeline::traits::SimilarityScorer;
use crate::types::{AlignTag, Multialign};

fn lines(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

fn run(config: &AlignerConfig, translations: &[String], targets: &[String]) -> Multialign {
    let scorer = BleuScorer::new(config.ngram_order, config.max_alternatives);
    let tests: Vec<&str> = translations.iter().map(String::as_str).collect();
    let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
    let path = find_best_path(
        &scorer.score_sentences(&tests, &refs),
        tests.len(),
        refs.len(),
    );
    GapFiller::new(config, &scorer, &GaleChurchAligner, translations, targets).fill(&path)
}

fn run_with_path(
    config: &AlignerConfig,
    translations: &[String],
    targets: &[String],
    path: &[(usize, usize)],
) -> Multialign {
    let scorer = BleuScorer::new(config.ngram_order, config.max_alternatives);
    GapFiller::new(config, &scorer, &GaleChurchAligner, translations, targets).fill(path)
}

fn groups(multialign: &Multialign) -> Vec<(Vec<usize>, Vec<usize>, AlignTag)> {
    multialign
        .iter()
        .map(|p| (p.source.clone(), p.target.clone(), p.tag))
        .collect()
}

#[test]
fn word_for_word_translation_is_all_bleu() {
    let text = lines(&[
        "the cat sat on the mat",
        "a dog ran in the park",
        "birds sing in the morning",
    ]);
    let result = run(&AlignerConfig::default(), &text, &text);
    assert_eq!(
        groups(&result),
        vec![
            (vec![0], vec![0], AlignTag::Bleu),
            (vec![1], vec![1], AlignTag::Bleu),
            (vec![2], vec![2], AlignTag::Bleu),
        ]
    );
}

#[test]
fn split_translation_grows_into_two_to_one() {
    let translations = lines(&["the cat sat on the mat", "and the dog ran in the park"]);
    let targets = lines(&["the cat sat on the mat and the dog ran in the park"]);
    let result = run(&AlignerConfig::default(), &translations, &targets);
    assert_eq!(
        groups(&result),
        vec![(vec![0, 1], vec![0], AlignTag::GapFiller)]
    );
}

#[test]
fn merged_translation_grows_into_one_to_two() {
    let translations = lines(&["the cat sat on the mat and the dog ran in the park"]);
    let targets = lines(&["the cat sat on the mat", "and the dog ran in the park"]);
    let result = run(&AlignerConfig::default(), &translations, &targets);
    assert_eq!(
        groups(&result),
        vec![(vec![0], vec![0, 1], AlignTag::GapFiller)]
    );
}

#[test]
fn bleu_confirmed_pairs_fill_a_gap_one_by_one() {
    let text = lines(&["the cat sat on the mat", "a dog ran in the park"]);
    let result = run_with_path(&AlignerConfig::default(), &text, &text, &[]);
    assert_eq!(
        groups(&result),
        vec![
            (vec![0], vec![0], AlignTag::GapFiller),
            (vec![1], vec![1], AlignTag::GapFiller),
        ]
    );
}

#[test]
fn balanced_gap_without_overlap_goes_to_gale_church() {
    let translations = lines(&["aaaa bbbb cccc", "dddd eeee"]);
    let targets = lines(&["xxxx yyyy zzzz", "wwww vvvv"]);
    let result = run(&AlignerConfig::default(), &translations, &targets);
    assert_eq!(
        groups(&result),
        vec![
            (vec![0], vec![0], AlignTag::GaleChurch),
            (vec![1], vec![1], AlignTag::GaleChurch),
        ]
    );
}

#[test]
fn unbalanced_gap_is_left_unaligned() {
    let translations = lines(&["nothing in common here"]);
    let targets = lines(&["uno dos", "tres cuatro", "cinco seis", "siete ocho", "nueve diez"]);
    let result = run(&AlignerConfig::default(), &translations, &targets);
    assert!(result.is_empty());
}

#[test]
fn gale_church_disabled_leaves_gap_unaligned() {
    let config = AlignerConfig {
        gap_fill_heuristics: BTreeSet::from([GapFillHeuristic::Bleu1to1]),
        ..AlignerConfig::default()
    };
    let translations = lines(&["aaaa bbbb cccc", "dddd eeee"]);
    let targets = lines(&["xxxx yyyy zzzz", "wwww vvvv"]);
    assert!(run(&config, &translations, &targets).is_empty());
}

#[test]
fn length_only_configuration_skips_scoring() {
    let config = AlignerConfig {
        n_to_1: 1,
        gap_fill_heuristics: BTreeSet::from([GapFillHeuristic::Galechurch]),
        ..AlignerConfig::default()
    };
    let text = lines(&["the cat sat on the mat", "a dog ran in the park"]);
    let result = run_with_path(&config, &text, &text, &[]);
    assert_eq!(
        groups(&result),
        vec![
            (vec![0], vec![0], AlignTag::GaleChurch),
            (vec![1], vec![1], AlignTag::GaleChurch),
        ]
    );
}

#[test]
fn anchors_around_a_gap_are_kept_as_bleu() {
    let translations = lines(&[
        "the cat sat on the mat",
        "qqqq wwww",
        "birds sing in the morning",
    ]);
    let targets = lines(&[
        "the cat sat on the mat",
        "zzzz yyyy",
        "birds sing in the morning",
    ]);
    let result = run(&AlignerConfig::default(), &translations, &targets);
    assert_eq!(
        groups(&result),
        vec![
            (vec![0], vec![0], AlignTag::Bleu),
            (vec![1], vec![1], AlignTag::GaleChurch),
            (vec![2], vec![2], AlignTag::Bleu),
        ]
    );
}

#[test]
fn no_index_is_assigned_twice() {
    let translations = lines(&[
        "the cat sat on the mat",
        "and the dog ran in the park",
        "it was a sunny day",
        "nothing else happened",
    ]);
    let targets = lines(&[
        "the cat sat on the mat and the dog ran in the park",
        "it was a sunny day",
        "later it rained a lot",
    ]);
    let result = run(&AlignerConfig::default(), &translations, &targets);
    let mut seen_source = BTreeSet::new();
    let mut seen_target = BTreeSet::new();
    for pair in &result {
        for &s in &pair.source {
            assert!(seen_source.insert(s), "source {s} used twice");
        }
        for &t in &pair.target {
            assert!(seen_target.insert(t), "target {t} used twice");
        }
    }
}

#[test]
fn evaluation_set_windows_long_gaps() {
    let sentences: Vec<String> = (0..40).map(|i| format!("s{i}")).collect();
    let gap: Vec<usize> = (5..35).collect();
    let set = evaluation_set(&sentences, &[4], &gap, &[35], 3, 1);
    let ids: Vec<Vec<usize>> = set.into_iter().map(|(ids, _)| ids).collect();
    assert_eq!(
        ids,
        vec![
            vec![4],
            vec![5],
            vec![6],
            vec![7],
            vec![32],
            vec![33],
            vec![34],
            vec![35]
        ]
    );
}

#[test]
fn evaluation_set_adds_adjacent_concatenations() {
    let sentences = lines(&["a", "b", "c", "d"]);
    let set = evaluation_set(&sentences, &[0], &[1, 2], &[3], 12, 2);
    assert_eq!(set.len(), 4 + 3);
    assert_eq!(set[4], (vec![0, 1], "a b".to_string()));
    assert_eq!(set[5], (vec![1, 2], "b c".to_string()));
    assert_eq!(set[6], (vec![2, 3], "c d".to_string()));
}

#[test]
fn evaluation_set_with_empty_neighbours() {
    let sentences = lines(&["a", "b"]);
    let set = evaluation_set(&sentences, &[], &[0, 1], &[], 12, 2);
    assert_eq!(set[0], (vec![], String::new()));
    assert_eq!(set[3], (vec![], String::new()));
    assert_eq!(set[4], (vec![0], " a".to_string()));
}

#[test]
fn balanced_gap_rule() {
    assert!(balanced(3, 1));
    assert!(balanced(5, 3));
    assert!(!balanced(6, 2));
    assert!(!balanced(4, 2));
    assert!(!balanced(5, 1));
}

#[test]
fn target_extension_must_take_adjacent_gap_sentences() {
    assert!(extends_forward(&[3], &[3, 4], &[4, 5]));
    assert!(!extends_forward(&[3], &[3, 5], &[4, 5]));
    assert!(!extends_forward(&[], &[4], &[4, 5]));
    assert!(extends_backward(&[6], &[5, 6], &[4, 5]));
    assert!(!extends_backward(&[6], &[4, 6], &[4, 5]));
    assert!(!extends_backward(&[6], &[6], &[4, 5]));
}
