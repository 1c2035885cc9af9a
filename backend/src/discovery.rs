//! Candidate discovery: nearby search around the locality center plus a
//! per-candidate detail enrichment pass. Enrichment failures degrade the
//! individual candidate, never the batch.

use shared::{Candidate, Coordinate};

use crate::error::DiscoveryError;
use crate::providers::{PlaceProvider, PlaceSummary};

pub const DEFAULT_RADIUS_M: u32 = 5000;
pub const DEFAULT_CATEGORY: &str = "restaurant";

const DETAIL_FIELDS: [&str; 4] = ["name", "formatted_address", "rating", "opening_hours"];

/// Discover venues around `center`. Returns the full unfiltered set in
/// provider order; visibility is decided later by the filter engine.
pub async fn discover_candidates(
    provider: &dyn PlaceProvider,
    center: Coordinate,
    radius_m: u32,
    category: &str,
) -> Result<Vec<Candidate>, DiscoveryError> {
    let search = provider.nearby_search(center, radius_m, category).await?;
    if !search.status.is_ok() {
        return Err(DiscoveryError::Provider(search.status));
    }

    let mut candidates = Vec::with_capacity(search.results.len());
    for summary in search.results {
        candidates.push(enrich(provider, summary).await);
    }

    tracing::info!(count = candidates.len(), category, "discovered candidates");
    Ok(candidates)
}

/// Merge detail attributes over the search summary. Any failure keeps
/// the base fields from the search step.
async fn enrich(provider: &dyn PlaceProvider, summary: PlaceSummary) -> Candidate {
    let mut candidate = base_candidate(summary);

    match provider.place_details(&candidate.id, &DETAIL_FIELDS).await {
        Ok(details) if details.status.is_ok() => {
            if let Some(detail) = details.detail {
                if let Some(name) = detail.name {
                    candidate.name = name;
                }
                if let Some(address) = detail.formatted_address {
                    candidate.vicinity = address;
                }
                if detail.rating.is_some() {
                    candidate.rating = detail.rating;
                }
            }
        }
        Ok(details) => {
            tracing::warn!(
                id = %candidate.id,
                status = %details.status,
                "detail enrichment rejected, keeping base fields"
            );
        }
        Err(err) => {
            tracing::warn!(
                id = %candidate.id,
                error = %err,
                "detail enrichment failed, keeping base fields"
            );
        }
    }

    candidate
}

fn base_candidate(summary: PlaceSummary) -> Candidate {
    Candidate {
        id: summary.id,
        name: summary.name,
        vicinity: summary.vicinity,
        coordinate: summary.coordinate,
        price_level: summary.price_level,
        type_tags: summary.type_tags.into_iter().collect(),
        rating: summary.rating,
        photo_ref: summary.photo_ref,
        is_favorite: false,
    }
}
