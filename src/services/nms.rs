use crate::models::detection::Candidate;

/// Greedy non-maximum suppression.
///
/// Candidates are sorted by score descending (the sort is stable, so equal
/// scores keep their insertion order) and the best remaining box suppresses
/// every later box overlapping it by more than `iou_threshold`. Running the
/// result through again yields the same set.
pub fn suppress(candidates: Vec<Candidate>, iou_threshold: f64) -> Vec<Candidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let mut sorted = candidates;
    sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut active = vec![true; sorted.len()];
    let mut selected = Vec::new();

    for i in 0..sorted.len() {
        if !active[i] {
            continue;
        }
        for j in (i + 1)..sorted.len() {
            if active[j] && sorted[i].bbox.iou(&sorted[j].bbox) > iou_threshold {
                active[j] = false;
            }
        }
        selected.push(sorted[i].clone());
    }

    selected
}
