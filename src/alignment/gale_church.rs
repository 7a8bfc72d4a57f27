//! Length-based sentence alignment after Gale & Church (1993).
//!
//! Only sentence lengths in characters are used. Each cell of the dynamic
//! program picks the most probable of six alignment shapes, assuming the
//! target/source length ratio is normally distributed around 1.

use std::collections::{BTreeMap, BTreeSet};

/// Number of (source, target) sentences consumed by one alignment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Shape {
    pub source: usize,
    pub target: usize,
}

impl Shape {
    const fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }
}

/// Shapes in evaluation order; a later shape replaces the running best only
/// when strictly more probable.
pub const SHAPES: [(Shape, f64); 6] = [
    (Shape::new(2, 2), 0.011),
    (Shape::new(2, 1), 0.089),
    (Shape::new(1, 2), 0.089),
    (Shape::new(1, 1), 0.89),
    (Shape::new(1, 0), 0.0099),
    (Shape::new(0, 1), 0.0099),
];

pub const MEAN_CHARACTERS: f64 = 1.0;
pub const VARIANCE_CHARACTERS: f64 = 6.8;

/// Complementary error function, Numerical Recipes polynomial fit.
fn erfcc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let r = t
        * (-z * z - 1.265_512_23
            + t * (1.000_023_68
                + t * (0.374_091_96
                    + t * (0.096_784_18
                        + t * (-0.186_288_06
                            + t * (0.278_868_07
                                + t * (-1.135_203_98
                                    + t * (1.488_515_87
                                        + t * (-0.822_152_23 + t * 0.170_872_77)))))))))
            .exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

/// Area under the standard normal distribution from -inf to `x`.
fn norm_cdf(x: f64) -> f64 {
    1.0 - 0.5 * erfcc(x / std::f64::consts::SQRT_2)
}

/// Probability that the last `shape` sentences ending at `(i, j)` align.
fn shape_probability(
    i: usize,
    j: usize,
    source: &[usize],
    target: &[usize],
    shape: Shape,
    prior: f64,
) -> f64 {
    let l_s: usize = (0..shape.source).map(|o| source[i - o]).sum();
    let l_t: usize = (0..shape.target).map(|o| target[j - o]).sum();
    let (l_s, l_t) = (l_s as f64, l_t as f64);

    let m = (l_s + l_t / MEAN_CHARACTERS) / 2.0;
    if m <= 0.0 {
        return 0.0;
    }
    let delta = (l_t - l_s * MEAN_CHARACTERS) / (m * VARIANCE_CHARACTERS).sqrt();
    2.0 * (1.0 - norm_cdf(delta.abs())) * prior
}

/// Unit links `(source offset, target offset)` of the most probable
/// alignment of one block. Sentences aligned by a 1-0 or 0-1 step have no
/// link.
pub fn align_blocks(source: &[usize], target: &[usize]) -> BTreeSet<(usize, usize)> {
    let (n, m) = (source.len(), target.len());
    if n == 0 || m == 0 {
        return BTreeSet::new();
    }

    // Rows hold column j at index j + 2, so j - 2 never underflows.
    // rows[0] = i - 2, rows[1] = i - 1, rows[2] = i.
    let width = m + 2;
    let mut rows = [vec![0.0f64; width], vec![0.0f64; width], vec![0.0f64; width]];
    rows[1][1] = 1.0;
    rows[1][2] = 1.0;
    rows[2][1] = 1.0;
    let mut backlinks = vec![Shape::new(1, 1); n * m];

    for i in 0..n {
        for j in 0..m {
            let mut best: Option<(f64, Shape)> = None;
            for &(shape, prior) in &SHAPES {
                let prev = rows[2 - shape.source][j + 2 - shape.target];
                if prev <= 0.0 {
                    continue;
                }
                let p = prev * shape_probability(i, j, source, target, shape, prior);
                if best.map_or(true, |(b, _)| p > b) {
                    best = Some((p, shape));
                }
            }
            let (value, shape) = best.unwrap_or((0.0, Shape::new(1, 1)));
            backlinks[i * m + j] = shape;
            rows[2][j + 2] = value;
        }
        rows.rotate_left(1);
        rows[2].iter_mut().for_each(|v| *v = 0.0);
    }

    let mut links = BTreeSet::new();
    let (mut i, mut j) = (n as isize - 1, m as isize - 1);
    while i >= 0 && j >= 0 {
        let shape = backlinks[i as usize * m + j as usize];
        for a in 0..shape.source as isize {
            for b in 0..shape.target as isize {
                links.insert(((i - a) as usize, (j - b) as usize));
            }
        }
        i -= shape.source as isize;
        j -= shape.target as isize;
    }
    links
}

/// Aligns one block and merges unit links into groups: sentences connected
/// through links end up in one `(source offsets, target offsets)` pair.
/// Groups are sorted by their source offsets.
pub fn align_lengths(source: &[usize], target: &[usize]) -> Vec<(Vec<usize>, Vec<usize>)> {
    let links = align_blocks(source, target);
    let n = source.len();
    let mut parent: Vec<usize> = (0..n + target.len()).collect();

    fn root(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for &(i, j) in &links {
        let (a, b) = (root(&mut parent, i), root(&mut parent, n + j));
        if a != b {
            parent[b.max(a)] = a.min(b);
        }
    }

    let mut groups: BTreeMap<usize, (BTreeSet<usize>, BTreeSet<usize>)> = BTreeMap::new();
    for &(i, j) in &links {
        let group = groups.entry(root(&mut parent, i)).or_default();
        group.0.insert(i);
        group.1.insert(j);
    }

    let mut out: Vec<(Vec<usize>, Vec<usize>)> = groups
        .into_values()
        .map(|(s, t)| (s.into_iter().collect(), t.into_iter().collect()))
        .collect();
    out.sort();
    out
}

/// Length in characters of a sentence as the aligner sees it.
pub fn sentence_length(sentence: &str) -> usize {
    sentence.trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn norm_cdf_is_centered() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!(norm_cdf(5.0) > 0.999);
        assert!(norm_cdf(-5.0) < 0.001);
    }

    #[test]
    fn equal_lengths_align_one_to_one() {
        let lengths = [40, 55, 23, 61];
        let groups = align_lengths(&lengths, &lengths);
        let expected: Vec<(Vec<usize>, Vec<usize>)> =
            (0..4).map(|i| (vec![i], vec![i])).collect();
        assert_eq!(groups, expected);
    }

    #[test]
    fn split_sentence_becomes_two_to_one() {
        let groups = align_lengths(&[50, 48, 100], &[99, 101]);
        assert_eq!(groups, vec![(vec![0, 1], vec![0]), (vec![2], vec![1])]);
    }

    #[test]
    fn merged_target_becomes_one_to_two() {
        let groups = align_lengths(&[80, 30], &[41, 40, 31]);
        assert_eq!(groups, vec![(vec![0], vec![0, 1]), (vec![1], vec![2])]);
    }

    #[test]
    fn empty_side_gives_no_links() {
        assert!(align_lengths(&[], &[10, 20]).is_empty());
        assert!(align_lengths(&[10], &[]).is_empty());
        assert!(align_blocks(&[], &[]).is_empty());
    }

    #[test]
    fn zero_length_sentences_do_not_panic() {
        let groups = align_lengths(&[0, 0], &[0]);
        for (s, t) in &groups {
            assert!(s.iter().all(|&i| i < 2));
            assert!(t.iter().all(|&j| j < 1));
        }
    }

    #[test]
    fn single_pair_aligns() {
        assert_eq!(align_lengths(&[10], &[12]), vec![(vec![0], vec![0])]);
    }

    #[test]
    fn sentence_length_counts_trimmed_chars() {
        assert_eq!(sentence_length("  héllo "), 5);
        assert_eq!(sentence_length(""), 0);
    }

    proptest! {
        #[test]
        fn alignment_is_deterministic_and_monotonic(
            source in proptest::collection::vec(1usize..200, 0..8),
            target in proptest::collection::vec(1usize..200, 0..8),
        ) {
            let first = align_lengths(&source, &target);
            prop_assert_eq!(&first, &align_lengths(&source, &target));
            for pair in first.windows(2) {
                prop_assert!(pair[0].0.last() < pair[1].0.first());
                prop_assert!(pair[0].1.last() < pair[1].1.first());
            }
        }
    }
}
