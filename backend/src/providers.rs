//! Provider seams for the external services the core depends on:
//! routing, geocoding, place search/details, and distance matrices.
//!
//! The orchestration code only ever sees these traits; the production
//! implementation lives in [`http`], and tests substitute canned
//! providers.

pub mod http;

use std::fmt;

use async_trait::async_trait;
use shared::{Coordinate, Review, TravelMode};
use thiserror::Error;

/// Status word echoed by every provider response. Anything other than
/// `Ok` is surfaced to the stage error for that call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    NotFound,
    Other(String),
}

impl ProviderStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "OK" => ProviderStatus::Ok,
            "ZERO_RESULTS" => ProviderStatus::ZeroResults,
            "OVER_QUERY_LIMIT" => ProviderStatus::OverQueryLimit,
            "REQUEST_DENIED" => ProviderStatus::RequestDenied,
            "INVALID_REQUEST" => ProviderStatus::InvalidRequest,
            "NOT_FOUND" => ProviderStatus::NotFound,
            other => ProviderStatus::Other(other.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == ProviderStatus::Ok
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderStatus::Ok => "OK",
            ProviderStatus::ZeroResults => "ZERO_RESULTS",
            ProviderStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            ProviderStatus::RequestDenied => "REQUEST_DENIED",
            ProviderStatus::InvalidRequest => "INVALID_REQUEST",
            ProviderStatus::NotFound => "NOT_FOUND",
            ProviderStatus::Other(raw) => raw,
        };
        f.write_str(s)
    }
}

/// Transport or payload failure before a provider status could be read.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected provider payload: {0}")]
    Payload(String),
}

#[derive(Debug, Clone)]
pub struct RouteAlternative {
    pub encoded_path: String,
}

#[derive(Debug, Clone)]
pub struct RouteAlternatives {
    pub status: ProviderStatus,
    pub alternatives: Vec<RouteAlternative>,
}

#[derive(Debug, Clone)]
pub struct GeocodeHit {
    pub formatted_address: String,
    pub type_tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReverseGeocode {
    pub status: ProviderStatus,
    pub results: Vec<GeocodeHit>,
}

#[derive(Debug, Clone)]
pub struct GeocodeCenter {
    pub center: Coordinate,
}

#[derive(Debug, Clone)]
pub struct ForwardGeocode {
    pub status: ProviderStatus,
    pub results: Vec<GeocodeCenter>,
}

/// Base fields returned by a nearby search, before detail enrichment.
#[derive(Debug, Clone)]
pub struct PlaceSummary {
    pub id: String,
    pub name: String,
    pub vicinity: String,
    pub coordinate: Coordinate,
    pub price_level: Option<u8>,
    pub type_tags: Vec<String>,
    pub rating: Option<f64>,
    pub photo_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NearbySearch {
    pub status: ProviderStatus,
    pub results: Vec<PlaceSummary>,
}

/// Detail attributes fetched per candidate during enrichment.
#[derive(Debug, Clone, Default)]
pub struct PlaceDetail {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub open_now: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PlaceDetails {
    pub status: ProviderStatus,
    pub detail: Option<PlaceDetail>,
}

#[derive(Debug, Clone)]
pub struct PlaceReviews {
    pub status: ProviderStatus,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, Default)]
pub struct MatrixElement {
    pub meters: Option<u32>,
    pub duration_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MatrixRow {
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    pub status: ProviderStatus,
    pub rows: Vec<MatrixRow>,
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<RouteAlternatives, ProviderError>;
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn reverse_geocode(&self, point: Coordinate) -> Result<ReverseGeocode, ProviderError>;

    async fn forward_geocode(&self, address: &str) -> Result<ForwardGeocode, ProviderError>;
}

#[async_trait]
pub trait PlaceProvider: Send + Sync {
    async fn nearby_search(
        &self,
        center: Coordinate,
        radius_m: u32,
        category: &str,
    ) -> Result<NearbySearch, ProviderError>;

    async fn place_details(
        &self,
        id: &str,
        fields: &[&str],
    ) -> Result<PlaceDetails, ProviderError>;

    async fn place_reviews(&self, id: &str) -> Result<PlaceReviews, ProviderError>;
}

#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// One origin, N destination strings. Implementations must preserve
    /// destination order in the returned row elements.
    async fn distance_matrix(
        &self,
        origin: &str,
        destinations: &[String],
        mode: TravelMode,
    ) -> Result<DistanceMatrix, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(ProviderStatus::parse("OK"), ProviderStatus::Ok);
        assert_eq!(
            ProviderStatus::parse("ZERO_RESULTS"),
            ProviderStatus::ZeroResults
        );
        assert_eq!(
            ProviderStatus::parse("REQUEST_DENIED"),
            ProviderStatus::RequestDenied
        );
    }

    #[test]
    fn unknown_status_is_preserved_verbatim() {
        let status = ProviderStatus::parse("MAX_ELEMENTS_EXCEEDED");
        assert_eq!(
            status,
            ProviderStatus::Other("MAX_ELEMENTS_EXCEEDED".into())
        );
        assert_eq!(status.to_string(), "MAX_ELEMENTS_EXCEEDED");
    }

    #[test]
    fn only_ok_is_ok() {
        assert!(ProviderStatus::Ok.is_ok());
        assert!(!ProviderStatus::ZeroResults.is_ok());
        assert!(!ProviderStatus::Other("OKAY".into()).is_ok());
    }
}
