//! Distance annotation: one batched distance-matrix call for the
//! currently visible candidates, scheduled behind a trailing debounce so
//! rapid filter changes coalesce into a single provider call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use shared::{Candidate, DistanceInfo, TravelMode};
use tokio::task::JoinHandle;

use crate::error::DistanceError;
use crate::providers::DistanceProvider;

pub const DEBOUNCE: Duration = Duration::from_millis(1000);

/// Annotate the visible set with travel distance/duration from the
/// origin. Callers must apply the skip conditions (empty visible set,
/// unset origin, unset travel mode) before invoking; this function
/// always issues exactly one provider call.
///
/// The provider preserves destination order, so row elements pair with
/// `visible` by index; the result map is keyed by candidate id so later
/// reordering cannot mis-attribute entries. Missing fields default to
/// 0 m and an empty duration.
pub async fn annotate(
    provider: &dyn DistanceProvider,
    visible: &[Candidate],
    origin: &str,
    mode: TravelMode,
) -> Result<HashMap<String, DistanceInfo>, DistanceError> {
    let destinations: Vec<String> = visible.iter().map(|c| c.vicinity.clone()).collect();
    let matrix = provider.distance_matrix(origin, &destinations, mode).await?;

    if !matrix.status.is_ok() {
        return Err(DistanceError::Provider(matrix.status));
    }
    let row = matrix.rows.first().ok_or(DistanceError::EmptyMatrix)?;

    let mut distances = HashMap::with_capacity(visible.len());
    for (candidate, element) in visible.iter().zip(&row.elements) {
        distances.insert(
            candidate.id.clone(),
            DistanceInfo {
                candidate_id: candidate.id.clone(),
                meters: element.meters.unwrap_or(0),
                duration_text: element.duration_text.clone().unwrap_or_default(),
            },
        );
    }

    tracing::debug!(count = distances.len(), mode = mode.as_str(), "annotated distances");
    Ok(distances)
}

/// Single outstanding timer slot with replace-on-reschedule semantics:
/// scheduling a new task atomically aborts the pending one, so after
/// 1000 ms of quiescence only the latest task fires.
///
/// Aborting cancels the timer, not any network call a previous fire may
/// have started; stale completions are discarded by the session's
/// generation check instead.
pub struct AnnotationScheduler {
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl AnnotationScheduler {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE).await;
            task.await;
        });

        let mut slot = self.slot.lock().expect("scheduler slot poisoned");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}

impl Default for AnnotationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use shared::Coordinate;

    use super::*;
    use crate::providers::{DistanceMatrix, MatrixElement, MatrixRow, ProviderError, ProviderStatus};

    struct CountingMatrix {
        calls: AtomicUsize,
        elements: Vec<MatrixElement>,
    }

    #[async_trait]
    impl DistanceProvider for CountingMatrix {
        async fn distance_matrix(
            &self,
            _origin: &str,
            destinations: &[String],
            _mode: TravelMode,
        ) -> Result<DistanceMatrix, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(destinations.len(), self.elements.len());
            Ok(DistanceMatrix {
                status: ProviderStatus::Ok,
                rows: vec![MatrixRow {
                    elements: self.elements.clone(),
                }],
            })
        }
    }

    fn candidate(id: &str, vicinity: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: id.to_string(),
            vicinity: vicinity.to_string(),
            coordinate: Coordinate::new(0.0, 0.0),
            price_level: None,
            type_tags: Default::default(),
            rating: None,
            photo_ref: None,
            is_favorite: false,
        }
    }

    fn element(meters: Option<u32>, duration: Option<&str>) -> MatrixElement {
        MatrixElement {
            meters,
            duration_text: duration.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn results_are_keyed_by_candidate_id_in_order() {
        let provider = CountingMatrix {
            calls: AtomicUsize::new(0),
            elements: vec![
                element(Some(1200), Some("4 mins")),
                element(Some(3400), Some("11 mins")),
            ],
        };
        let visible = vec![candidate("p1", "1 Main St"), candidate("p2", "2 Oak St")];

        let distances = annotate(&provider, &visible, "Davis, CA", TravelMode::Driving)
            .await
            .unwrap();

        assert_eq!(distances["p1"].meters, 1200);
        assert_eq!(distances["p1"].duration_text, "4 mins");
        assert_eq!(distances["p2"].meters, 3400);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_fields_default_to_zero_and_empty() {
        let provider = CountingMatrix {
            calls: AtomicUsize::new(0),
            elements: vec![element(None, None)],
        };
        let visible = vec![candidate("p1", "1 Main St")];

        let distances = annotate(&provider, &visible, "Davis, CA", TravelMode::Walking)
            .await
            .unwrap();
        assert_eq!(distances["p1"].meters, 0);
        assert_eq!(distances["p1"].duration_text, "");
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        struct Denied;

        #[async_trait]
        impl DistanceProvider for Denied {
            async fn distance_matrix(
                &self,
                _origin: &str,
                _destinations: &[String],
                _mode: TravelMode,
            ) -> Result<DistanceMatrix, ProviderError> {
                Ok(DistanceMatrix {
                    status: ProviderStatus::RequestDenied,
                    rows: vec![],
                })
            }
        }

        let visible = vec![candidate("p1", "1 Main St")];
        let err = annotate(&Denied, &visible, "Davis, CA", TravelMode::Driving)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DistanceError::Provider(ProviderStatus::RequestDenied)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_reschedules_fire_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let scheduler = AnnotationScheduler::new();

        for _ in 0..5 {
            let fired = Arc::clone(&fired);
            scheduler.schedule(async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        tokio::time::advance(DEBOUNCE).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quiescent_schedules_each_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let scheduler = AnnotationScheduler::new();

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            scheduler.schedule(async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            tokio::task::yield_now().await;
            tokio::time::advance(DEBOUNCE + Duration::from_millis(10)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_the_debounce_elapses() {
        let fired = Arc::new(AtomicUsize::new(0));
        let scheduler = AnnotationScheduler::new();

        let fired_clone = Arc::clone(&fired);
        scheduler.schedule(async move {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_millis(999)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
