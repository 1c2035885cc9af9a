//! Discovery session: the single owned "current candidate set + filter
//! state + selection" triple, mutated only through the transition
//! functions below. A generation counter stamps each calculation and a
//! selection epoch stamps each selection, so late-arriving provider
//! completions for superseded state are discarded instead of installed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::{
    Candidate, Coordinate, DistanceInfo, FilterState, Locality, PlacesSnapshot, Review,
    ReviewsState, SelectionSnapshot, TravelMode,
};

use crate::filter;

/// Initial focal point before any calculation has run.
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 37.7749,
    lon: -122.4194,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    NoSelection,
    Selected {
        candidate_id: String,
        reviews: ReviewsState,
    },
}

#[derive(Debug, Default)]
pub struct DiscoverySession {
    origin: Option<String>,
    midpoint: Option<Coordinate>,
    locality: Option<Locality>,
    candidates: Vec<Candidate>,
    filters: FilterState,
    distances: HashMap<String, DistanceInfo>,
    travel_mode: Option<TravelMode>,
    selection: Selection,
    meeting_time: Option<DateTime<Utc>>,
    generation: u64,
    selection_epoch: u64,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new calculation: clears the previous route-derived state
    /// wholesale and bumps the generation, invalidating any pending or
    /// in-flight work tied to the old candidate set.
    pub fn begin_calculation(&mut self, origin: String) -> u64 {
        self.generation += 1;
        self.origin = Some(origin);
        self.midpoint = None;
        self.locality = None;
        self.candidates.clear();
        self.distances.clear();
        self.selection = Selection::NoSelection;
        self.generation
    }

    /// Install the results of one calculate action. Returns false (and
    /// installs nothing) if a newer calculation has started since
    /// `generation` was issued.
    pub fn complete_calculation(
        &mut self,
        generation: u64,
        midpoint: Coordinate,
        locality: Locality,
        candidates: Vec<Candidate>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale calculation dropped");
            return false;
        }
        self.midpoint = Some(midpoint);
        self.locality = Some(locality);
        self.candidates = candidates;
        self.distances.clear();
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn midpoint(&self) -> Option<Coordinate> {
        self.midpoint
    }

    pub fn locality(&self) -> Option<&Locality> {
        self.locality.as_ref()
    }

    /// Map focal point: resolved locality center, else the default.
    pub fn center(&self) -> Coordinate {
        self.locality
            .as_ref()
            .map(|locality| locality.center)
            .unwrap_or(DEFAULT_CENTER)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn travel_mode(&self) -> Option<TravelMode> {
        self.travel_mode
    }

    pub fn set_travel_mode(&mut self, mode: TravelMode) {
        self.travel_mode = Some(mode);
    }

    pub fn meeting_time(&self) -> Option<DateTime<Utc>> {
        self.meeting_time
    }

    pub fn set_meeting_time(&mut self, time: Option<DateTime<Utc>>) {
        self.meeting_time = time;
    }

    /// Recompute visibility from the full set and the current filters.
    pub fn visible(&self) -> Vec<Candidate> {
        filter::visible(&self.candidates, &self.filters)
    }

    /// Toggle favorite status; returns the new status, or None for an
    /// unknown id. Never removes the candidate from the full set.
    pub fn toggle_favorite(&mut self, candidate_id: &str) -> Option<bool> {
        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.id == candidate_id)?;
        candidate.is_favorite = !candidate.is_favorite;
        Some(candidate.is_favorite)
    }

    /// Select a candidate, discarding any prior selection and its
    /// reviews. Returns the new selection epoch to stamp the review
    /// fetch with, or None for an unknown id.
    pub fn select(&mut self, candidate_id: &str) -> Option<u64> {
        if !self.candidates.iter().any(|c| c.id == candidate_id) {
            return None;
        }
        self.selection_epoch += 1;
        self.selection = Selection::Selected {
            candidate_id: candidate_id.to_string(),
            reviews: ReviewsState::Pending,
        };
        Some(self.selection_epoch)
    }

    pub fn clear_selection(&mut self) {
        self.selection_epoch += 1;
        self.selection = Selection::NoSelection;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        match &self.selection {
            Selection::Selected { candidate_id, .. } => {
                self.candidates.iter().find(|c| &c.id == candidate_id)
            }
            Selection::NoSelection => None,
        }
    }

    /// Install fetched reviews if the selection they belong to is still
    /// current. Zero reviews resolves to `Empty`, never an error.
    pub fn install_reviews(&mut self, epoch: u64, reviews: Vec<Review>) -> bool {
        if epoch != self.selection_epoch {
            tracing::debug!(epoch, current = self.selection_epoch, "stale review fetch dropped");
            return false;
        }
        if let Selection::Selected { reviews: slot, .. } = &mut self.selection {
            *slot = if reviews.is_empty() {
                ReviewsState::Empty
            } else {
                ReviewsState::Loaded(reviews)
            };
            true
        } else {
            false
        }
    }

    pub fn distances(&self) -> &HashMap<String, DistanceInfo> {
        &self.distances
    }

    /// Install a distance annotation batch unless a newer calculation
    /// has replaced the candidate set it was computed for.
    pub fn install_distances(
        &mut self,
        generation: u64,
        distances: HashMap<String, DistanceInfo>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale annotation dropped");
            return false;
        }
        self.distances = distances;
        true
    }

    pub fn snapshot(&self) -> PlacesSnapshot {
        let selection = match &self.selection {
            Selection::Selected {
                candidate_id,
                reviews,
            } => Some(SelectionSnapshot {
                candidate_id: candidate_id.clone(),
                reviews: reviews.clone(),
            }),
            Selection::NoSelection => None,
        };

        PlacesSnapshot {
            candidates: self.candidates.clone(),
            visible: self.visible(),
            distances: self.distances.clone(),
            selection,
            travel_mode: self.travel_mode,
        }
    }
}
