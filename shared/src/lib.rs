use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const METERS_PER_MILE: f64 = 1609.34;

/// Type tag carried by venues with step-free entry, used by the
/// accessibility filter group.
pub const ACCESSIBILITY_TAG: &str = "wheelchair_accessible_entrance";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

/// Nearest named place to a midpoint, with the provider's canonical
/// center for that place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub display_name: String,
    pub center: Coordinate,
}

/// A discovered venue. Identity key is `id`, unique within one discovery
/// result and stable across filter re-application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub vicinity: String,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub type_tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Candidate {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.type_tags.contains(tag)
    }
}

/// User-selected predicates. Pure data; owns no candidates and is
/// orthogonal to discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub type_filters: BTreeMap<String, bool>,
    #[serde(default)]
    pub price_filters: BTreeMap<u8, bool>,
    #[serde(default)]
    pub accessibility_only: bool,
    #[serde(default)]
    pub favorites_only: bool,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        !self.type_filters.values().any(|&v| v)
            && !self.price_filters.values().any(|&v| v)
            && !self.accessibility_only
            && !self.favorites_only
    }
}

/// Travel distance/duration from the origin to one candidate. Derived,
/// best-known state; may lag behind the visible set between
/// recomputation cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceInfo {
    pub candidate_id: String,
    pub meters: u32,
    pub duration_text: String,
}

impl DistanceInfo {
    pub fn miles(&self) -> f64 {
        f64::from(self.meters) / METERS_PER_MILE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author_name: String,
    pub rating: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "reviews")]
pub enum ReviewsState {
    Pending,
    Loaded(Vec<Review>),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub candidate_id: String,
    pub reviews: ReviewsState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingPointRequest {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingPointResponse {
    pub midpoint: Coordinate,
    pub locality: Locality,
    pub candidates: Vec<Candidate>,
}

/// Everything a render layer needs to draw the list: full candidate set,
/// visible subset, best-known distances, and the current selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesSnapshot {
    pub candidates: Vec<Candidate>,
    pub visible: Vec<Candidate>,
    pub distances: HashMap<String, DistanceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_mode: Option<TravelMode>,
}

/// Payload read by the friend-invite collaborator; opaque to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_candidate: Option<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

/// Display label for a 0-4 price tier.
pub fn price_label(level: u8) -> &'static str {
    match level {
        0 => "Free",
        1 => "$",
        2 => "$$",
        3 => "$$$",
        4 => "$$$$",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_state_reports_empty() {
        let filters = FilterState::default();
        assert!(filters.is_empty());
    }

    #[test]
    fn filter_state_with_disabled_entries_is_still_empty() {
        let mut filters = FilterState::default();
        filters.type_filters.insert("cafe".into(), false);
        filters.price_filters.insert(2, false);
        assert!(filters.is_empty());
    }

    #[test]
    fn filter_state_with_active_entry_is_not_empty() {
        let mut filters = FilterState::default();
        filters.type_filters.insert("cafe".into(), true);
        assert!(!filters.is_empty());
    }

    #[test]
    fn price_labels_match_tiers() {
        assert_eq!(price_label(0), "Free");
        assert_eq!(price_label(1), "$");
        assert_eq!(price_label(4), "$$$$");
        assert_eq!(price_label(9), "");
    }

    #[test]
    fn distance_info_converts_to_miles() {
        let info = DistanceInfo {
            candidate_id: "p1".into(),
            meters: 1609,
            duration_text: "3 mins".into(),
        };
        assert!((info.miles() - 1.0).abs() < 0.01);
    }
}
