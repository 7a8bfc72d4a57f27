use crate::types::ScoreTable;

/// Backpointer of one path-finder cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    SkipSource,
    SkipTarget,
    Match,
}

/// Best strictly monotonic 1-to-1 path through the score table.
///
/// Only candidates listed for a source sentence are eligible as matches.
/// Moves are tried as skip-source, skip-target, then match, and a later move
/// wins only with a strictly higher cumulative score.
pub fn find_best_path(scores: &ScoreTable, test_len: usize, ref_len: usize) -> Vec<(usize, usize)> {
    if test_len == 0 || ref_len == 0 {
        return Vec::new();
    }

    let width = ref_len + 1;
    let mut matrix = vec![0.0f64; (test_len + 1) * width];
    let mut pointers = vec![Step::SkipSource; test_len * ref_len];
    let mut row_scores: Vec<Option<f64>> = vec![None; ref_len];

    for i in 0..test_len {
        row_scores.iter_mut().for_each(|s| *s = None);
        for candidate in scores.get(i).map(Vec::as_slice).unwrap_or_default() {
            if let Some(slot) = row_scores.get_mut(candidate.target) {
                *slot = Some(candidate.score);
            }
        }

        for j in 0..ref_len {
            let mut best = matrix[i * width + j + 1];
            let mut step = Step::SkipSource;

            let left = matrix[(i + 1) * width + j];
            if left > best {
                best = left;
                step = Step::SkipTarget;
            }

            if let Some(score) = row_scores[j] {
                let diagonal = score + matrix[i * width + j];
                if diagonal > best {
                    best = diagonal;
                    step = Step::Match;
                }
            }

            matrix[(i + 1) * width + j + 1] = best;
            pointers[i * ref_len + j] = step;
        }
    }

    let mut path = Vec::new();
    let (mut i, mut j) = (test_len, ref_len);
    while i > 0 && j > 0 {
        match pointers[(i - 1) * ref_len + (j - 1)] {
            Step::SkipSource => i -= 1,
            Step::SkipTarget => j -= 1,
            Step::Match => {
                path.push((i - 1, j - 1));
                i -= 1;
                j -= 1;
            }
        }
    }
    path.reverse();
    path
}
