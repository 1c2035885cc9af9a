//! Filter engine: pure visibility computation over the candidate set.
//! No I/O; the session calls this on every filter mutation. Filter
//! changes never re-run discovery.

use shared::{Candidate, FilterState, ACCESSIBILITY_TAG};

/// Compute the visible subset. A candidate is visible iff every active
/// predicate group passes; a group with no active entries imposes no
/// constraint. Input order is preserved.
pub fn visible(candidates: &[Candidate], filters: &FilterState) -> Vec<Candidate> {
    if filters.is_empty() {
        return candidates.to_vec();
    }

    let active_types: Vec<&str> = filters
        .type_filters
        .iter()
        .filter(|&(_, &on)| on)
        .map(|(tag, _)| tag.as_str())
        .collect();
    let active_prices: Vec<u8> = filters
        .price_filters
        .iter()
        .filter(|&(_, &on)| on)
        .map(|(&tier, _)| tier)
        .collect();

    candidates
        .iter()
        .filter(|candidate| {
            passes_types(candidate, &active_types)
                && passes_prices(candidate, &active_prices)
                && (!filters.accessibility_only || candidate.has_tag(ACCESSIBILITY_TAG))
                && (!filters.favorites_only || candidate.is_favorite)
        })
        .cloned()
        .collect()
}

fn passes_types(candidate: &Candidate, active: &[&str]) -> bool {
    active.is_empty() || active.iter().any(|tag| candidate.has_tag(tag))
}

fn passes_prices(candidate: &Candidate, active: &[u8]) -> bool {
    if active.is_empty() {
        return true;
    }
    match candidate.price_level {
        Some(tier) => active.contains(&tier),
        None => false,
    }
}
