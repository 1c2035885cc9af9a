//! Nearest-locality resolution: reverse geocode the midpoint, find the
//! first hit tagged `locality`, then forward geocode that address so the
//! session centers on the provider's canonical point for the place
//! rather than the raw midpoint.

use shared::{Coordinate, Locality};

use crate::error::GeocodeError;
use crate::providers::GeocodingProvider;

const LOCALITY_TAG: &str = "locality";

pub async fn resolve_locality(
    provider: &dyn GeocodingProvider,
    point: Coordinate,
) -> Result<Locality, GeocodeError> {
    let reverse = provider.reverse_geocode(point).await?;
    if !reverse.status.is_ok() {
        return Err(GeocodeError::Provider(reverse.status));
    }

    let hit = reverse
        .results
        .iter()
        .find(|hit| hit.type_tags.iter().any(|tag| tag == LOCALITY_TAG))
        .ok_or(GeocodeError::NoLocalityFound)?;

    let forward = provider.forward_geocode(&hit.formatted_address).await?;
    if !forward.status.is_ok() {
        return Err(GeocodeError::Provider(forward.status));
    }

    let center = forward
        .results
        .first()
        .map(|result| result.center)
        .ok_or_else(|| GeocodeError::NoCenterPoint(hit.formatted_address.clone()))?;

    tracing::debug!(locality = %hit.formatted_address, "resolved nearest locality");
    Ok(Locality {
        display_name: hit.formatted_address.clone(),
        center,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::providers::{
        ForwardGeocode, GeocodeCenter, GeocodeHit, ProviderError, ProviderStatus, ReverseGeocode,
    };

    struct FixedGeocoder {
        reverse: ReverseGeocode,
        forward: ForwardGeocode,
    }

    #[async_trait]
    impl GeocodingProvider for FixedGeocoder {
        async fn reverse_geocode(
            &self,
            _point: Coordinate,
        ) -> Result<ReverseGeocode, ProviderError> {
            Ok(self.reverse.clone())
        }

        async fn forward_geocode(
            &self,
            _address: &str,
        ) -> Result<ForwardGeocode, ProviderError> {
            Ok(self.forward.clone())
        }
    }

    fn hit(address: &str, tags: &[&str]) -> GeocodeHit {
        GeocodeHit {
            formatted_address: address.to_string(),
            type_tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn picks_first_locality_hit_and_uses_canonical_center() {
        let provider = FixedGeocoder {
            reverse: ReverseGeocode {
                status: ProviderStatus::Ok,
                results: vec![
                    hit("12 Oak St, Davis, CA", &["street_address"]),
                    hit("Davis, CA, USA", &["locality", "political"]),
                    hit("Yolo County, CA, USA", &["locality"]),
                ],
            },
            forward: ForwardGeocode {
                status: ProviderStatus::Ok,
                results: vec![GeocodeCenter {
                    center: Coordinate::new(38.5449, -121.7405),
                }],
            },
        };

        let locality = resolve_locality(&provider, Coordinate::new(38.54, -121.74))
            .await
            .unwrap();
        assert_eq!(locality.display_name, "Davis, CA, USA");
        assert_eq!(locality.center, Coordinate::new(38.5449, -121.7405));
    }

    #[tokio::test]
    async fn no_locality_tag_is_terminal() {
        let provider = FixedGeocoder {
            reverse: ReverseGeocode {
                status: ProviderStatus::Ok,
                results: vec![hit("somewhere", &["route"]), hit("elsewhere", &["premise"])],
            },
            forward: ForwardGeocode {
                status: ProviderStatus::Ok,
                results: vec![],
            },
        };

        let err = resolve_locality(&provider, Coordinate::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::NoLocalityFound));
    }

    #[tokio::test]
    async fn reverse_status_error_propagates() {
        let provider = FixedGeocoder {
            reverse: ReverseGeocode {
                status: ProviderStatus::OverQueryLimit,
                results: vec![],
            },
            forward: ForwardGeocode {
                status: ProviderStatus::Ok,
                results: vec![],
            },
        };

        let err = resolve_locality(&provider, Coordinate::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GeocodeError::Provider(ProviderStatus::OverQueryLimit)
        ));
    }

    #[tokio::test]
    async fn forward_with_no_results_reports_missing_center() {
        let provider = FixedGeocoder {
            reverse: ReverseGeocode {
                status: ProviderStatus::Ok,
                results: vec![hit("Davis, CA, USA", &["locality"])],
            },
            forward: ForwardGeocode {
                status: ProviderStatus::Ok,
                results: vec![],
            },
        };

        let err = resolve_locality(&provider, Coordinate::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::NoCenterPoint(name) if name == "Davis, CA, USA"));
    }
}
