//! Route & midpoint resolution: ask the routing provider for driving
//! alternatives, decode the chosen alternative's polyline, and take the
//! point at the middle index of the path.

use shared::{Coordinate, TravelMode};

use crate::error::RouteError;
use crate::polyline;
use crate::providers::RoutingProvider;

/// Which route alternative the midpoint is derived from.
///
/// The upstream behaviour this replaces indexed alternative 1
/// unconditionally and crashed on single-route responses, so the choice
/// is explicit here. `RequireSecond` treats fewer than two alternatives
/// as an error; `PreferSecond` falls back to the only route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlternativePolicy {
    #[default]
    RequireSecond,
    PreferSecond,
}

/// Resolve the meeting midpoint between two free-form locations.
///
/// Routing mode is fixed to driving. Provider status other than OK is
/// terminal for the calculation and is not retried.
pub async fn resolve_midpoint(
    provider: &dyn RoutingProvider,
    origin: &str,
    destination: &str,
    policy: AlternativePolicy,
) -> Result<Coordinate, RouteError> {
    let response = provider
        .route(origin, destination, TravelMode::Driving)
        .await?;

    if !response.status.is_ok() {
        return Err(RouteError::Provider(response.status));
    }

    let returned = response.alternatives.len();
    let alternative = match policy {
        AlternativePolicy::RequireSecond => response.alternatives.get(1),
        AlternativePolicy::PreferSecond => {
            response.alternatives.get(1).or(response.alternatives.first())
        }
    }
    .ok_or(RouteError::InsufficientAlternatives { returned })?;

    let path = polyline::decode(&alternative.encoded_path)?;
    if path.is_empty() {
        return Err(RouteError::EmptyPath);
    }

    let midpoint = path[path.len() / 2];
    tracing::debug!(
        points = path.len(),
        lat = midpoint.lat,
        lon = midpoint.lon,
        "derived route midpoint"
    );
    Ok(midpoint)
}
