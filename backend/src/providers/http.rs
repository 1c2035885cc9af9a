//! reqwest-backed implementation of the provider traits against a
//! Google-Maps-style JSON web service.

use async_trait::async_trait;
use serde::Deserialize;
use shared::{Coordinate, Review, TravelMode};

use super::{
    DistanceMatrix, DistanceProvider, ForwardGeocode, GeocodeCenter, GeocodeHit,
    GeocodingProvider, MatrixElement, MatrixRow, NearbySearch, PlaceDetail, PlaceDetails,
    PlaceProvider, PlaceReviews, PlaceSummary, ProviderError, ProviderStatus, ReverseGeocode,
    RouteAlternative, RouteAlternatives, RoutingProvider,
};

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Single client implementing all four provider seams. One instance is
/// shared across the app; `reqwest::Client` pools connections internally.
pub struct HttpMapsProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpMapsProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!(
            "{}/{}/json",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        );
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Payload(format!(
                "{} responded with http status {}",
                endpoint,
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RoutingProvider for HttpMapsProvider {
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<RouteAlternatives, ProviderError> {
        let dto: DirectionsDto = self
            .get_json(
                "directions",
                &[
                    ("origin", origin.to_string()),
                    ("destination", destination.to_string()),
                    ("mode", mode.as_str().to_string()),
                    ("alternatives", "true".to_string()),
                ],
            )
            .await?;

        Ok(RouteAlternatives {
            status: ProviderStatus::parse(&dto.status),
            alternatives: dto
                .routes
                .into_iter()
                .map(|route| RouteAlternative {
                    encoded_path: route.overview_polyline.points,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl GeocodingProvider for HttpMapsProvider {
    async fn reverse_geocode(&self, point: Coordinate) -> Result<ReverseGeocode, ProviderError> {
        let dto: GeocodeDto = self
            .get_json(
                "geocode",
                &[("latlng", format!("{},{}", point.lat, point.lon))],
            )
            .await?;

        Ok(ReverseGeocode {
            status: ProviderStatus::parse(&dto.status),
            results: dto
                .results
                .into_iter()
                .map(|hit| GeocodeHit {
                    formatted_address: hit.formatted_address,
                    type_tags: hit.types,
                })
                .collect(),
        })
    }

    async fn forward_geocode(&self, address: &str) -> Result<ForwardGeocode, ProviderError> {
        let dto: GeocodeDto = self
            .get_json("geocode", &[("address", address.to_string())])
            .await?;

        Ok(ForwardGeocode {
            status: ProviderStatus::parse(&dto.status),
            results: dto
                .results
                .into_iter()
                .filter_map(|hit| hit.geometry)
                .map(|geometry| GeocodeCenter {
                    center: geometry.location.into_coordinate(),
                })
                .collect(),
        })
    }
}

#[async_trait]
impl PlaceProvider for HttpMapsProvider {
    async fn nearby_search(
        &self,
        center: Coordinate,
        radius_m: u32,
        category: &str,
    ) -> Result<NearbySearch, ProviderError> {
        let dto: NearbySearchDto = self
            .get_json(
                "place/nearbysearch",
                &[
                    ("location", format!("{},{}", center.lat, center.lon)),
                    ("radius", radius_m.to_string()),
                    ("type", category.to_string()),
                ],
            )
            .await?;

        Ok(NearbySearch {
            status: ProviderStatus::parse(&dto.status),
            results: dto
                .results
                .into_iter()
                .map(PlaceDto::into_summary)
                .collect(),
        })
    }

    async fn place_details(
        &self,
        id: &str,
        fields: &[&str],
    ) -> Result<PlaceDetails, ProviderError> {
        let dto: PlaceDetailsDto = self
            .get_json(
                "place/details",
                &[
                    ("place_id", id.to_string()),
                    ("fields", fields.join(",")),
                ],
            )
            .await?;

        Ok(PlaceDetails {
            status: ProviderStatus::parse(&dto.status),
            detail: dto.result.map(|result| PlaceDetail {
                name: result.name,
                formatted_address: result.formatted_address,
                rating: result.rating,
                open_now: result.opening_hours.and_then(|hours| hours.open_now),
            }),
        })
    }

    async fn place_reviews(&self, id: &str) -> Result<PlaceReviews, ProviderError> {
        let dto: PlaceDetailsDto = self
            .get_json(
                "place/details",
                &[
                    ("place_id", id.to_string()),
                    ("fields", "reviews".to_string()),
                ],
            )
            .await?;

        let reviews = dto
            .result
            .and_then(|result| result.reviews)
            .unwrap_or_default()
            .into_iter()
            .map(|review| Review {
                author_name: review.author_name,
                rating: review.rating,
                text: review.text,
            })
            .collect();

        Ok(PlaceReviews {
            status: ProviderStatus::parse(&dto.status),
            reviews,
        })
    }
}

#[async_trait]
impl DistanceProvider for HttpMapsProvider {
    async fn distance_matrix(
        &self,
        origin: &str,
        destinations: &[String],
        mode: TravelMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        let dto: DistanceMatrixDto = self
            .get_json(
                "distancematrix",
                &[
                    ("origins", origin.to_string()),
                    ("destinations", destinations.join("|")),
                    ("mode", mode.as_str().to_string()),
                ],
            )
            .await?;

        Ok(DistanceMatrix {
            status: ProviderStatus::parse(&dto.status),
            rows: dto
                .rows
                .into_iter()
                .map(|row| MatrixRow {
                    elements: row
                        .elements
                        .into_iter()
                        .map(|element| MatrixElement {
                            meters: element.distance.map(|d| d.value),
                            duration_text: element.duration.map(|d| d.text),
                        })
                        .collect(),
                })
                .collect(),
        })
    }
}

// Wire DTOs. Field names follow the upstream JSON schema.

#[derive(Debug, Deserialize)]
struct DirectionsDto {
    status: String,
    #[serde(default)]
    routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize)]
struct RouteDto {
    overview_polyline: OverviewPolylineDto,
}

#[derive(Debug, Deserialize)]
struct OverviewPolylineDto {
    points: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeDto {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResultDto>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResultDto {
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    types: Vec<String>,
    geometry: Option<GeometryDto>,
}

#[derive(Debug, Deserialize)]
struct GeometryDto {
    location: LocationDto,
}

#[derive(Debug, Deserialize)]
struct LocationDto {
    lat: f64,
    lng: f64,
}

impl LocationDto {
    fn into_coordinate(self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lng,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NearbySearchDto {
    status: String,
    #[serde(default)]
    results: Vec<PlaceDto>,
}

#[derive(Debug, Deserialize)]
struct PlaceDto {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    vicinity: String,
    geometry: Option<GeometryDto>,
    price_level: Option<u8>,
    #[serde(default)]
    types: Vec<String>,
    rating: Option<f64>,
    #[serde(default)]
    photos: Vec<PhotoDto>,
}

impl PlaceDto {
    fn into_summary(self) -> PlaceSummary {
        PlaceSummary {
            id: self.place_id,
            name: self.name,
            vicinity: self.vicinity,
            coordinate: self
                .geometry
                .map(|geometry| geometry.location.into_coordinate())
                .unwrap_or(Coordinate { lat: 0.0, lon: 0.0 }),
            price_level: self.price_level,
            type_tags: self.types,
            rating: self.rating,
            photo_ref: self
                .photos
                .into_iter()
                .next()
                .map(|photo| photo.photo_reference),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PhotoDto {
    photo_reference: String,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsDto {
    status: String,
    result: Option<PlaceDetailDto>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailDto {
    name: Option<String>,
    formatted_address: Option<String>,
    rating: Option<f64>,
    opening_hours: Option<OpeningHoursDto>,
    reviews: Option<Vec<ReviewDto>>,
}

#[derive(Debug, Deserialize)]
struct OpeningHoursDto {
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ReviewDto {
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixDto {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRowDto>,
}

#[derive(Debug, Deserialize)]
struct MatrixRowDto {
    #[serde(default)]
    elements: Vec<MatrixElementDto>,
}

#[derive(Debug, Deserialize)]
struct MatrixElementDto {
    distance: Option<ValueDto>,
    duration: Option<TextDto>,
}

#[derive(Debug, Deserialize)]
struct ValueDto {
    value: u32,
}

#[derive(Debug, Deserialize)]
struct TextDto {
    text: String,
}
