//! Debounced product name search backing the invoice line editor.
//!
//! Each keystroke cancels the pending debounce of the previous one. Issued
//! requests are numbered; a response is applied only while its number is
//! still the latest, so slow answers to older queries are dropped.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::SearchSettings;
use crate::error::Result;
use crate::models::Product;

pub const SEARCH_ERROR_MESSAGE: &str = "Error al buscar";

#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn search_products(&self, search: &str, limit: u32) -> Result<Vec<Product>>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub options: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Too short to search; options were cleared.
    Suppressed,
    /// A newer keystroke arrived during the debounce window.
    Cancelled,
    /// The response arrived after a newer request was issued.
    Stale,
    Applied(Vec<Product>),
    Failed(String),
}

pub struct ProductSearch {
    lookup: Arc<dyn ProductLookup>,
    debounce: Duration,
    min_chars: usize,
    page_size: u32,
    sequence: AtomicU64,
    pending: Mutex<Option<CancellationToken>>,
    state: Mutex<SearchState>,
}

impl ProductSearch {
    pub fn new(lookup: Arc<dyn ProductLookup>, settings: &SearchSettings) -> Self {
        Self {
            lookup,
            debounce: Duration::from_millis(settings.debounce_ms),
            min_chars: settings.min_chars,
            page_size: settings.page_size,
            sequence: AtomicU64::new(0),
            pending: Mutex::new(None),
            state: Mutex::new(SearchState::default()),
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    fn update_state(&self, apply: impl FnOnce(&mut SearchState)) {
        if let Ok(mut state) = self.state.lock() {
            apply(&mut state);
        }
    }

    fn is_latest(&self, id: u64) -> bool {
        self.sequence.load(AtomicOrdering::SeqCst) == id
    }

    /// Handle one edit of the search box.
    pub async fn on_input(&self, query: &str) -> SearchOutcome {
        let token = CancellationToken::new();
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(token.clone()) {
                previous.cancel();
            }
        }
        self.update_state(|state| state.error = None);

        let normalized = query.trim().to_string();
        let significant = normalized.chars().filter(|c| !c.is_whitespace()).count();
        if significant < self.min_chars {
            // invalidate any request still in flight for a longer query
            self.sequence.fetch_add(1, AtomicOrdering::SeqCst);
            self.update_state(|state| {
                state.options.clear();
                state.loading = false;
            });
            return SearchOutcome::Suppressed;
        }

        tokio::select! {
            _ = token.cancelled() => return SearchOutcome::Cancelled,
            _ = tokio::time::sleep(self.debounce) => {}
        }

        let id = self.sequence.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        self.update_state(|state| state.loading = true);
        tracing::debug!(request = id, query = %normalized, "Searching products");

        let result = self.lookup.search_products(&normalized, self.page_size).await;
        if !self.is_latest(id) {
            tracing::debug!(request = id, "Discarding stale product search response");
            return SearchOutcome::Stale;
        }

        match result {
            Ok(products) => {
                let ranked = rank_products(products, &normalized);
                self.update_state(|state| {
                    state.options = ranked.clone();
                    state.loading = false;
                });
                SearchOutcome::Applied(ranked)
            }
            Err(e) => {
                let message = match e.user_message() {
                    m if m.trim().is_empty() => SEARCH_ERROR_MESSAGE.to_string(),
                    m => m,
                };
                tracing::warn!(request = id, error = %e, "Product search failed");
                self.update_state(|state| {
                    state.options.clear();
                    state.error = Some(message.clone());
                    state.loading = false;
                });
                SearchOutcome::Failed(message)
            }
        }
    }
}

/// Prefix matches first, then substring matches, then the rest; ties are
/// alphabetical. Comparison is case-insensitive.
pub fn rank_products(mut products: Vec<Product>, query: &str) -> Vec<Product> {
    let needle = query.trim().to_lowercase();
    products.sort_by_cached_key(|p| {
        let name = p.nombre.to_lowercase();
        let tier = if name.starts_with(&needle) {
            0u8
        } else if name.contains(&needle) {
            1
        } else {
            2
        };
        (tier, name)
    });
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn product(nombre: &str) -> Product {
        serde_json::from_value(json!({"id": 1, "nombre": nombre})).unwrap()
    }

    fn settings() -> SearchSettings {
        SearchSettings {
            debounce_ms: 300,
            min_chars: 3,
            page_size: 10,
        }
    }

    /// Answers after a per-query delay; "falla" fails.
    struct ScriptedLookup {
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedLookup {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ProductLookup for ScriptedLookup {
        async fn search_products(&self, search: &str, limit: u32) -> Result<Vec<Product>> {
            assert_eq!(limit, 10);
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.queries.lock().unwrap().push(search.to_string());
            let delay = if search == "lech" { 500 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if search == "falla" {
                return Err(ConsoleError::Rejected("Servicio no disponible".into()));
            }
            Ok(vec![product("Yogur de leche"), product(&format!("{} entera", search))])
        }
    }

    #[test]
    fn test_rank_products() {
        let ranked = rank_products(
            vec![
                product("Queso"),
                product("Dulce de leche"),
                product("Leche entera"),
                product("Arroz"),
                product("leche deslactosada"),
            ],
            "Leche",
        );
        let names: Vec<&str> = ranked.iter().map(|p| p.nombre.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "leche deslactosada",
                "Leche entera",
                "Dulce de leche",
                "Arroz",
                "Queso"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_queries_issue_no_request() {
        let lookup = ScriptedLookup::new();
        let search = ProductSearch::new(lookup.clone(), &settings());

        assert_eq!(search.on_input("le").await, SearchOutcome::Suppressed);
        assert_eq!(search.on_input(" l e ").await, SearchOutcome::Suppressed);
        assert_eq!(lookup.calls.load(AtomicOrdering::SeqCst), 0);
        assert!(search.state().options.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_is_trimmed_and_ranked() {
        let lookup = ScriptedLookup::new();
        let search = ProductSearch::new(lookup.clone(), &settings());

        match search.on_input("  leche ").await {
            SearchOutcome::Applied(options) => {
                assert_eq!(options[0].nombre, "leche entera");
                assert_eq!(options[1].nombre, "Yogur de leche");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(lookup.queries.lock().unwrap().as_slice(), ["leche"]);
        assert!(!search.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_keystroke_cancels_debounce() {
        let lookup = ScriptedLookup::new();
        let search = Arc::new(ProductSearch::new(lookup.clone(), &settings()));

        let first = {
            let search = Arc::clone(&search);
            tokio::spawn(async move { search.on_input("lec").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = search.on_input("leche").await;

        assert_eq!(first.await.unwrap(), SearchOutcome::Cancelled);
        assert!(matches!(second, SearchOutcome::Applied(_)));
        assert_eq!(lookup.calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let lookup = ScriptedLookup::new();
        let search = Arc::new(ProductSearch::new(lookup.clone(), &settings()));

        // "lech" is issued at 300ms and answers at 800ms
        let slow = {
            let search = Arc::clone(&search);
            tokio::spawn(async move { search.on_input("lech").await })
        };
        tokio::time::sleep(Duration::from_millis(350)).await;
        // "leche" is issued at 650ms and answers at 660ms
        let fast = search.on_input("leche").await;

        assert!(matches!(fast, SearchOutcome::Applied(_)));
        assert_eq!(slow.await.unwrap(), SearchOutcome::Stale);
        assert_eq!(search.state().options[0].nombre, "leche entera");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_error_and_clears_options() {
        let lookup = ScriptedLookup::new();
        let search = ProductSearch::new(lookup, &settings());

        search.on_input("leche").await;
        let outcome = search.on_input("falla").await;

        assert_eq!(
            outcome,
            SearchOutcome::Failed("Servicio no disponible".to_string())
        );
        let state = search.state();
        assert!(state.options.is_empty());
        assert_eq!(state.error.as_deref(), Some("Servicio no disponible"));
    }
}
