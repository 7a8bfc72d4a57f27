use crate::types::{sort_multialign, AlignTag, AlignmentPair, Multialign};

/// Keeps the pairs found identically (groups and tag) by every run.
/// A single run is returned as is.
pub fn intersect_runs(mut runs: Vec<Multialign>) -> Multialign {
    if runs.len() <= 1 {
        return runs.pop().unwrap_or_default();
    }
    let first = runs.remove(0);
    let mut kept: Multialign = first
        .into_iter()
        .filter(|pair| runs.iter().all(|run| run.contains(pair)))
        .collect();
    sort_multialign(&mut kept);
    kept.dedup();
    kept
}

/// Merges a source-to-target and a target-to-source alignment.
///
/// With both present, a forward pair survives only if its mirror was found
/// backwards; the result is tagged with both provenances. With only one
/// present, that one is used, mirrored back into source/target order when
/// it came from the target side.
pub fn combine_directions(forward: Multialign, backward: Multialign) -> Multialign {
    match (forward.is_empty(), backward.is_empty()) {
        (false, false) => forward
            .iter()
            .filter_map(|pair| {
                let mirror = backward
                    .iter()
                    .find(|b| b.source == pair.target && b.target == pair.source)?;
                let tag = AlignTag::Intersect {
                    forward: pair.tag.method(),
                    backward: mirror.tag.method(),
                };
                Some(AlignmentPair::new(
                    pair.source.clone(),
                    pair.target.clone(),
                    tag,
                ))
            })
            .collect(),
        (false, true) => forward,
        (true, false) => {
            let mut mirrored: Multialign = backward.iter().map(AlignmentPair::mirrored).collect();
            sort_multialign(&mut mirrored);
            mirrored
        }
        (true, true) => Multialign::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlignMethod;

    fn pair(source: &[usize], target: &[usize], tag: AlignTag) -> AlignmentPair {
        AlignmentPair::new(source.to_vec(), target.to_vec(), tag)
    }

    #[test]
    fn intersecting_a_run_with_itself_is_identity() {
        let run = vec![
            pair(&[0], &[0], AlignTag::Bleu),
            pair(&[1, 2], &[1], AlignTag::GapFiller),
        ];
        assert_eq!(intersect_runs(vec![run.clone(), run.clone()]), run);
        assert_eq!(intersect_runs(vec![run.clone()]), run);
        assert!(intersect_runs(Vec::new()).is_empty());
    }

    #[test]
    fn intersection_requires_matching_tags() {
        let a = vec![
            pair(&[0], &[0], AlignTag::Bleu),
            pair(&[1], &[1], AlignTag::Bleu),
        ];
        let b = vec![
            pair(&[0], &[0], AlignTag::Bleu),
            pair(&[1], &[1], AlignTag::GaleChurch),
        ];
        assert_eq!(
            intersect_runs(vec![a, b]),
            vec![pair(&[0], &[0], AlignTag::Bleu)]
        );
    }

    #[test]
    fn both_directions_keep_only_mirrored_pairs() {
        let forward = vec![
            pair(&[0], &[0], AlignTag::Bleu),
            pair(&[1], &[1], AlignTag::Bleu),
            pair(&[2, 3], &[2], AlignTag::GapFiller),
        ];
        let backward = vec![
            pair(&[0], &[0], AlignTag::Bleu),
            pair(&[1], &[2], AlignTag::Bleu),
            pair(&[2], &[2, 3], AlignTag::GaleChurch),
        ];
        let combined = combine_directions(forward, backward);
        assert_eq!(
            combined,
            vec![
                pair(
                    &[0],
                    &[0],
                    AlignTag::Intersect {
                        forward: AlignMethod::Bleu,
                        backward: AlignMethod::Bleu
                    }
                ),
                pair(
                    &[2, 3],
                    &[2],
                    AlignTag::Intersect {
                        forward: AlignMethod::GapFiller,
                        backward: AlignMethod::GaleChurch
                    }
                ),
            ]
        );
        assert_eq!(combined[1].tag.to_string(), "INTERSECT: GAPFILLER - GALECHURCH");
    }

    #[test]
    fn backward_only_is_mirrored() {
        let backward = vec![pair(&[0], &[0, 1], AlignTag::GapFiller)];
        assert_eq!(
            combine_directions(Vec::new(), backward),
            vec![pair(&[0, 1], &[0], AlignTag::GapFiller)]
        );
    }

    #[test]
    fn forward_only_is_unchanged() {
        let forward = vec![pair(&[0], &[0], AlignTag::Bleu)];
        assert_eq!(combine_directions(forward.clone(), Vec::new()), forward);
        assert!(combine_directions(Vec::new(), Vec::new()).is_empty());
    }
}
