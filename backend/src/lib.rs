pub mod discovery;
pub mod distance;
pub mod error;
pub mod filter;
pub mod locality;
pub mod midpoint;
pub mod polyline;
pub mod providers;
pub mod session;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{
    ApiError, FilterState, InvitePayload, MeetingPointRequest, MeetingPointResponse,
    PlacesSnapshot, ReviewsState, TravelMode,
};
use tokio::sync::Mutex;

use crate::distance::AnnotationScheduler;
use crate::error::{DiscoveryError, GeocodeError, RouteError};
use crate::midpoint::AlternativePolicy;
use crate::providers::{
    DistanceProvider, GeocodingProvider, PlaceProvider, ProviderStatus, RoutingProvider,
};
use crate::session::{DiscoverySession, Selection};

/// The external services the orchestrator talks to. One concrete client
/// may implement several seams (the HTTP provider implements all four).
pub struct Providers {
    pub routing: Arc<dyn RoutingProvider>,
    pub geocoding: Arc<dyn GeocodingProvider>,
    pub places: Arc<dyn PlaceProvider>,
    pub distance: Arc<dyn DistanceProvider>,
}

#[derive(Debug, Clone, Copy)]
pub struct DiscoverySettings {
    pub radius_m: u32,
    pub alternative_policy: AlternativePolicy,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            radius_m: discovery::DEFAULT_RADIUS_M,
            alternative_policy: AlternativePolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<Providers>,
    pub session: Arc<Mutex<DiscoverySession>>,
    pub scheduler: Arc<AnnotationScheduler>,
    pub settings: DiscoverySettings,
}

impl AppState {
    pub fn new(providers: Providers, settings: DiscoverySettings) -> Self {
        Self {
            providers: Arc::new(providers),
            session: Arc::new(Mutex::new(DiscoverySession::new())),
            scheduler: Arc::new(AnnotationScheduler::new()),
            settings,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/meeting-point", post(calculate_meeting_point))
        .route("/api/places", get(get_places))
        .route("/api/filters", put(put_filters))
        .route("/api/travel-mode", put(put_travel_mode))
        .route("/api/meeting-time", put(put_meeting_time))
        .route("/api/places/:id/favorite", post(toggle_favorite))
        .route("/api/places/:id/select", post(select_place))
        .route("/api/places/:id/reviews", get(get_reviews))
        .route("/api/selection", delete(clear_selection))
        .route("/api/invite-payload", get(get_invite_payload))
        .with_state(state)
}

/// POST /api/meeting-point - run one calculate action: route midpoint,
/// nearest locality, then candidate discovery, strictly in that order.
async fn calculate_meeting_point(
    State(state): State<AppState>,
    Json(req): Json<MeetingPointRequest>,
) -> Result<Json<MeetingPointResponse>, (StatusCode, Json<ApiError>)> {
    let generation = state
        .session
        .lock()
        .await
        .begin_calculation(req.origin.clone());

    let midpoint = midpoint::resolve_midpoint(
        state.providers.routing.as_ref(),
        &req.origin,
        &req.destination,
        state.settings.alternative_policy,
    )
    .await
    .map_err(route_error)?;

    let locality = locality::resolve_locality(state.providers.geocoding.as_ref(), midpoint)
        .await
        .map_err(geocode_error)?;

    let candidates = discovery::discover_candidates(
        state.providers.places.as_ref(),
        locality.center,
        state.settings.radius_m,
        discovery::DEFAULT_CATEGORY,
    )
    .await
    .map_err(discovery_error)?;

    let mut session = state.session.lock().await;
    if !session.complete_calculation(generation, midpoint, locality.clone(), candidates.clone()) {
        return Err((
            StatusCode::CONFLICT,
            Json(ApiError {
                message: "superseded by a newer calculation".into(),
            }),
        ));
    }
    drop(session);

    schedule_annotation(&state);

    Ok(Json(MeetingPointResponse {
        midpoint,
        locality,
        candidates,
    }))
}

/// GET /api/places - snapshot for the render layer.
async fn get_places(State(state): State<AppState>) -> Json<PlacesSnapshot> {
    Json(state.session.lock().await.snapshot())
}

/// PUT /api/filters - replace the filter state and recompute visibility.
async fn put_filters(
    State(state): State<AppState>,
    Json(filters): Json<FilterState>,
) -> Json<PlacesSnapshot> {
    let snapshot = {
        let mut session = state.session.lock().await;
        session.set_filters(filters);
        session.snapshot()
    };
    schedule_annotation(&state);
    Json(snapshot)
}

#[derive(Debug, Deserialize)]
struct TravelModeRequest {
    travel_mode: TravelMode,
}

/// PUT /api/travel-mode - change how distances are computed.
async fn put_travel_mode(
    State(state): State<AppState>,
    Json(req): Json<TravelModeRequest>,
) -> Json<PlacesSnapshot> {
    let snapshot = {
        let mut session = state.session.lock().await;
        session.set_travel_mode(req.travel_mode);
        session.snapshot()
    };
    schedule_annotation(&state);
    Json(snapshot)
}

#[derive(Debug, Deserialize)]
struct MeetingTimeRequest {
    meeting_time: Option<DateTime<Utc>>,
}

/// PUT /api/meeting-time - set or clear the planned meeting time.
async fn put_meeting_time(
    State(state): State<AppState>,
    Json(req): Json<MeetingTimeRequest>,
) -> StatusCode {
    state.session.lock().await.set_meeting_time(req.meeting_time);
    StatusCode::NO_CONTENT
}

/// POST /api/places/:id/favorite - toggle; visibility changes only on
/// the next filter computation, the candidate itself stays put.
async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlacesSnapshot>, (StatusCode, Json<ApiError>)> {
    let snapshot = {
        let mut session = state.session.lock().await;
        if session.toggle_favorite(&id).is_none() {
            return Err(not_found(&id));
        }
        session.snapshot()
    };
    schedule_annotation(&state);
    Ok(Json(snapshot))
}

/// POST /api/places/:id/select - select a candidate and lazily fetch
/// its reviews. A failed or empty fetch resolves the selection to an
/// empty review list, never an error.
async fn select_place(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlacesSnapshot>, (StatusCode, Json<ApiError>)> {
    let epoch = {
        let mut session = state.session.lock().await;
        match session.select(&id) {
            Some(epoch) => epoch,
            None => return Err(not_found(&id)),
        }
    };

    let reviews = match state.providers.places.place_reviews(&id).await {
        Ok(response) if response.status.is_ok() => {
            if response.reviews.is_empty() {
                tracing::info!(id = %id, "no reviews found for this place");
            }
            response.reviews
        }
        Ok(response) => {
            tracing::warn!(id = %id, status = %response.status, "review fetch rejected");
            vec![]
        }
        Err(err) => {
            tracing::warn!(id = %id, error = %err, "review fetch failed");
            vec![]
        }
    };

    let mut session = state.session.lock().await;
    session.install_reviews(epoch, reviews);
    Ok(Json(session.snapshot()))
}

/// GET /api/places/:id/reviews - review state for the selected place.
async fn get_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewsState>, (StatusCode, Json<ApiError>)> {
    let session = state.session.lock().await;
    match session.selection() {
        Selection::Selected {
            candidate_id,
            reviews,
        } if *candidate_id == id => Ok(Json(reviews.clone())),
        _ => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                message: format!("place {id} is not selected"),
            }),
        )),
    }
}

/// DELETE /api/selection - back to NoSelection, discarding reviews.
async fn clear_selection(State(state): State<AppState>) -> StatusCode {
    state.session.lock().await.clear_selection();
    StatusCode::NO_CONTENT
}

/// GET /api/invite-payload - read by the friend-invite collaborator.
async fn get_invite_payload(State(state): State<AppState>) -> Json<InvitePayload> {
    let session = state.session.lock().await;
    Json(InvitePayload {
        selected_candidate: session.selected_candidate().cloned(),
        meeting_time: session.meeting_time(),
    })
}

/// Queue a debounced distance annotation for the current visible set.
/// The scheduler aborts any pending timer; the generation check in the
/// session drops completions for superseded candidate sets.
pub fn schedule_annotation(state: &AppState) {
    let scheduler = Arc::clone(&state.scheduler);
    let state = state.clone();
    scheduler.schedule(async move {
        let (visible, origin, mode, generation) = {
            let session = state.session.lock().await;
            let Some(origin) = session.origin().map(str::to_string) else {
                return;
            };
            let Some(mode) = session.travel_mode() else {
                return;
            };
            let visible = session.visible();
            if visible.is_empty() {
                return;
            }
            (visible, origin, mode, session.generation())
        };

        match distance::annotate(state.providers.distance.as_ref(), &visible, &origin, mode).await
        {
            Ok(distances) => {
                state
                    .session
                    .lock()
                    .await
                    .install_distances(generation, distances);
            }
            Err(err) => {
                // Prior distances stay displayed rather than clearing.
                tracing::warn!(error = %err, "distance annotation failed, keeping previous data");
            }
        }
    });
}

fn not_found(id: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            message: format!("no candidate with id {id}"),
        }),
    )
}

fn route_error(err: RouteError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        RouteError::Provider(ProviderStatus::ZeroResults) => StatusCode::NOT_FOUND,
        RouteError::InsufficientAlternatives { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, error_body(err))
}

fn geocode_error(err: GeocodeError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        GeocodeError::NoLocalityFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, error_body(err))
}

fn discovery_error(err: DiscoveryError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        DiscoveryError::Provider(ProviderStatus::ZeroResults) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, error_body(err))
}

fn error_body(err: impl std::fmt::Display) -> Json<ApiError> {
    Json(ApiError {
        message: err.to_string(),
    })
}
