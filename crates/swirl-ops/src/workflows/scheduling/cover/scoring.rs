use super::domain::ReplacementCandidate;

const WANTS_MORE_HOURS_BONUS: f32 = 10.0;
const RELIABILITY_WEIGHT: f32 = 2.0;

/// Composite heuristic balancing track record against travel burden.
pub fn composite_score(candidate: &ReplacementCandidate) -> f32 {
    let hours_bonus = if candidate.wants_more_hours {
        WANTS_MORE_HOURS_BONUS
    } else {
        0.0
    };

    candidate.reliability * RELIABILITY_WEIGHT + hours_bonus - candidate.distance
}

fn meets_hard_requirements(candidate: &ReplacementCandidate) -> bool {
    candidate.has_required_skills
        && candidate.speaks_required_languages
        && candidate.currently_available
}

/// Rank cover candidates best-first.
///
/// Candidates missing required skills or languages, or currently
/// unavailable, are excluded outright rather than penalized. The sort is
/// stable: equal composite scores keep their input order, so repeated calls
/// over the same roster produce the same cascade.
pub fn rank_candidates(candidates: Vec<ReplacementCandidate>) -> Vec<ReplacementCandidate> {
    let mut ranked: Vec<ReplacementCandidate> = candidates
        .into_iter()
        .filter(meets_hard_requirements)
        .collect();

    ranked.sort_by(|a, b| composite_score(b).total_cmp(&composite_score(a)));
    ranked
}
