use crate::config::DedupOrder;
use crate::models::CandidateSquare;

/// Drop candidates whose box lies inside an already-accepted box.
///
/// Single left-to-right sweep: a square can only be removed by one accepted
/// earlier in the sequence, so the result depends on input order. Use
/// [`DedupOrder::AreaDescending`] to let the largest boxes win instead.
pub fn remove_contained(candidates: Vec<CandidateSquare>, order: DedupOrder) -> Vec<CandidateSquare> {
    let mut candidates = candidates;
    if order == DedupOrder::AreaDescending {
        candidates.sort_by(|a, b| b.bounding_box.area().cmp(&a.bounding_box.area()));
    }

    let mut accepted: Vec<CandidateSquare> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let contained = accepted
            .iter()
            .any(|kept| kept.bounding_box.contains(&candidate.bounding_box));
        if !contained {
            accepted.push(candidate);
        }
    }
    accepted
}
