use thiserror::Error;

use crate::polyline::PolylineError;
use crate::providers::{ProviderError, ProviderStatus};

/// Route & midpoint resolution failures. Terminal for the calculation;
/// never retried.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("routing provider returned status {0}")]
    Provider(ProviderStatus),
    #[error("routing provider returned {returned} route alternative(s), need at least 2")]
    InsufficientAlternatives { returned: usize },
    #[error("chosen route alternative decodes to an empty path")]
    EmptyPath,
    #[error("failed to decode route polyline: {0}")]
    Polyline(#[from] PolylineError),
    #[error("routing request failed: {0}")]
    Transport(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding provider returned status {0}")]
    Provider(ProviderStatus),
    #[error("no locality found near the midpoint")]
    NoLocalityFound,
    #[error("locality {0:?} has no canonical center point")]
    NoCenterPoint(String),
    #[error("geocoding request failed: {0}")]
    Transport(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("place search provider returned status {0}")]
    Provider(ProviderStatus),
    #[error("place search request failed: {0}")]
    Transport(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("distance provider returned status {0}")]
    Provider(ProviderStatus),
    #[error("distance matrix response has no rows")]
    EmptyMatrix,
    #[error("distance matrix request failed: {0}")]
    Transport(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum ReviewFetchError {
    #[error("reviews provider returned status {0}")]
    Provider(ProviderStatus),
    #[error("review request failed: {0}")]
    Transport(#[from] ProviderError),
}
