//! Memoized unit-of-measure catalog.
//!
//! A single slot holds the last successful list. Concurrent callers that
//! arrive while a fetch is running await the same shared future instead of
//! issuing their own request.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::UnitMeasure;

pub const CACHE_HIT_MESSAGE: &str = "cache";
const FETCHED_MESSAGE: &str = "Unidades de medida obtenidas exitosamente";
const FETCH_FAILED_MESSAGE: &str = "Error al obtener unidades de medida";

/// `GET /unidad-medida` body before entry validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUnitMeasures {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitMeasuresResult {
    pub success: bool,
    pub data: Vec<UnitMeasure>,
    pub message: String,
}

#[async_trait]
pub trait UnitMeasureFetcher: Send + Sync {
    async fn fetch_unit_measures(&self) -> Result<RawUnitMeasures>;
}

type InFlight = Shared<BoxFuture<'static, UnitMeasuresResult>>;

/// Only the fetch whose id is still stored in `in_flight` may write back.
#[derive(Default)]
struct CacheState {
    data: Option<Vec<UnitMeasure>>,
    last_error: Option<String>,
    in_flight: Option<(u64, InFlight)>,
    next_fetch_id: u64,
}

#[derive(Clone)]
pub struct UnitMeasureCache {
    fetcher: Arc<dyn UnitMeasureFetcher>,
    state: Arc<Mutex<CacheState>>,
}

impl UnitMeasureCache {
    pub fn new(fetcher: Arc<dyn UnitMeasureFetcher>) -> Self {
        Self {
            fetcher,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Return the catalog, fetching it when needed. Never fails: errors
    /// come back as `success: false` with an empty list.
    pub async fn get(&self, force_refresh: bool) -> UnitMeasuresResult {
        let pending = {
            let mut state = self.state.lock().await;

            if !force_refresh {
                if let Some(data) = state.data.as_ref().filter(|d| !d.is_empty()) {
                    tracing::debug!(count = data.len(), "Unit measures cache hit");
                    return UnitMeasuresResult {
                        success: true,
                        data: data.clone(),
                        message: CACHE_HIT_MESSAGE.to_string(),
                    };
                }
                if let Some((_, in_flight)) = state.in_flight.as_ref() {
                    tracing::debug!("Joining in-flight unit measures request");
                    in_flight.clone()
                } else {
                    self.start_fetch(&mut state)
                }
            } else {
                self.start_fetch(&mut state)
            }
        };

        pending.await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    /// Drop the cached list, the last error and any in-flight handle.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.data = None;
        state.last_error = None;
        state.in_flight = None;
        tracing::debug!("Unit measures cache cleared");
    }

    fn start_fetch(&self, state: &mut CacheState) -> InFlight {
        let fetcher = Arc::clone(&self.fetcher);
        let shared_state = Arc::clone(&self.state);
        let fetch_id = state.next_fetch_id;
        state.next_fetch_id += 1;

        let future = async move {
            let outcome = fetcher.fetch_unit_measures().await;
            let mut state = shared_state.lock().await;
            let current = matches!(&state.in_flight, Some((id, _)) if *id == fetch_id);
            if current {
                state.in_flight = None;
            }

            match outcome {
                Ok(raw) => {
                    let result = normalize(raw);
                    if current {
                        state.data = Some(result.data.clone());
                        state.last_error = None;
                    }
                    tracing::debug!(count = result.data.len(), "Unit measures fetched");
                    result
                }
                Err(e) => {
                    let message = match e.to_string() {
                        m if m.trim().is_empty() => FETCH_FAILED_MESSAGE.to_string(),
                        m => m,
                    };
                    tracing::warn!(error = %message, "Unit measures fetch failed");
                    if current {
                        state.last_error = Some(message.clone());
                    }
                    UnitMeasuresResult {
                        success: false,
                        data: Vec::new(),
                        message,
                    }
                }
            }
        }
        .boxed()
        .shared();

        state.in_flight = Some((fetch_id, future.clone()));
        future
    }
}

fn normalize(raw: RawUnitMeasures) -> UnitMeasuresResult {
    let entries = match raw.data {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    };
    let data: Vec<UnitMeasure> = entries.iter().filter_map(UnitMeasure::from_raw).collect();
    if data.len() != entries.len() {
        tracing::warn!(
            dropped = entries.len() - data.len(),
            "Discarded malformed unit measure entries"
        );
    }

    UnitMeasuresResult {
        success: raw.success.unwrap_or(!data.is_empty()),
        message: raw.message.unwrap_or_else(|| FETCHED_MESSAGE.to_string()),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingFetcher {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingFetcher {
        fn new(delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UnitMeasureFetcher for CountingFetcher {
        async fn fetch_unit_measures(&self) -> Result<RawUnitMeasures> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ConsoleError::Server("boom".into()));
            }
            Ok(RawUnitMeasures {
                success: Some(true),
                message: Some("ok".into()),
                data: Some(json!([
                    {"id": 1, "nombre": "Kilogramo", "abreviatura": "kg", "descripcion": "", "activo": 1},
                    {"id": 2, "nombre": "Libra", "abreviatura": "lb", "descripcion": "", "activo": true},
                    {"id": "3", "nombre": "Roto", "abreviatura": "x", "descripcion": "", "activo": 1}
                ])),
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let fetcher = CountingFetcher::new(Duration::from_millis(50), false);
        let cache = UnitMeasureCache::new(fetcher.clone());

        let (a, b, c) = tokio::join!(cache.get(false), cache.get(false), cache.get(false));

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.data.len(), 2);
        assert!(a.success);
    }

    #[tokio::test]
    async fn test_second_call_is_cache_hit() {
        let fetcher = CountingFetcher::new(Duration::ZERO, false);
        let cache = UnitMeasureCache::new(fetcher.clone());

        let first = cache.get(false).await;
        assert_eq!(first.message, "ok");
        let second = cache.get(false).await;
        assert_eq!(second.message, CACHE_HIT_MESSAGE);
        assert_eq!(second.data, first.data);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let fetcher = CountingFetcher::new(Duration::ZERO, false);
        let cache = UnitMeasureCache::new(fetcher.clone());

        cache.get(false).await;
        let refreshed = cache.get(true).await;
        assert_eq!(fetcher.calls(), 2);
        assert_ne!(refreshed.message, CACHE_HIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_raised() {
        let fetcher = CountingFetcher::new(Duration::ZERO, true);
        let cache = UnitMeasureCache::new(fetcher.clone());

        let result = cache.get(false).await;
        assert!(!result.success);
        assert!(result.data.is_empty());
        assert!(result.message.contains("boom"));
        assert!(cache.last_error().await.is_some());

        // nothing cached, so the next call fetches again
        cache.get(false).await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let fetcher = CountingFetcher::new(Duration::ZERO, false);
        let cache = UnitMeasureCache::new(fetcher.clone());

        cache.get(false).await;
        cache.clear().await;
        let result = cache.get(false).await;
        assert_eq!(fetcher.calls(), 2);
        assert_ne!(result.message, CACHE_HIT_MESSAGE);
    }

    struct ScriptedFetcher {
        calls: AtomicUsize,
        script: Vec<(Duration, &'static str)>,
    }

    #[async_trait]
    impl UnitMeasureFetcher for ScriptedFetcher {
        async fn fetch_unit_measures(&self) -> Result<RawUnitMeasures> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, nombre) = self.script[call.min(self.script.len() - 1)];
            tokio::time::sleep(delay).await;
            Ok(RawUnitMeasures {
                success: Some(true),
                message: Some(nombre.to_string()),
                data: Some(json!([
                    {"id": 1, "nombre": nombre, "abreviatura": "u", "descripcion": "", "activo": 1}
                ])),
            })
        }
    }

    #[tokio::test]
    async fn test_superseded_fetch_does_not_overwrite_newer_one() {
        let fetcher = Arc::new(ScriptedFetcher {
            calls: AtomicUsize::new(0),
            script: vec![
                (Duration::from_millis(100), "Viejo"),
                (Duration::from_millis(200), "Nuevo"),
            ],
        });
        let cache = UnitMeasureCache::new(fetcher.clone());

        let stale = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get(false).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fresh = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get(true).await }
        });

        // the first fetch has finished; the forced one is still running
        tokio::time::sleep(Duration::from_millis(140)).await;
        let joined = cache.get(false).await;

        assert_eq!(stale.await.unwrap().data[0].nombre, "Viejo");
        assert_eq!(fresh.await.unwrap().data[0].nombre, "Nuevo");
        assert_eq!(joined.data[0].nombre, "Nuevo");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        let cached = cache.get(false).await;
        assert_eq!(cached.message, CACHE_HIT_MESSAGE);
        assert_eq!(cached.data[0].nombre, "Nuevo");
    }

    #[test]
    fn test_normalize_defaults() {
        let result = normalize(RawUnitMeasures {
            success: None,
            message: None,
            data: Some(json!("not a list")),
        });
        assert!(!result.success);
        assert!(result.data.is_empty());
        assert_eq!(result.message, FETCHED_MESSAGE);
    }
}
