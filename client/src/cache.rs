//! Short-TTL, single-flight consistency cache over ledger reads.
//!
//! Contract: a get either returns a payload fetched within the last TTL, or
//! joins exactly one underlying fetch shared by every caller that arrives
//! before it completes. The slot lock is held only to inspect or install the
//! in-flight future, never across the fetch itself. Fetch failures degrade to
//! the last good payload when one exists; they only surface when the slot has
//! never been filled.

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use lastkey_types::{Address, PlayerRecord, RawEventRecord, RoundSnapshot};

use crate::http::HttpLedger;

/// How many raw events one window fetch requests.
const EVENT_WINDOW: usize = 100;

/// Error type for cache reads. Upstream failures are carried as rendered
/// messages so one failure can be handed to every waiter of a shared fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("ledger fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("ledger fetch failed: {0}")]
    Upstream(String),
}

impl CacheError {
    fn upstream(err: impl std::fmt::Display) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// TTL and fetch-timeout tuning shared by all cache slots.
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, CacheError>>>;

struct Slot<T> {
    value: Option<(T, Instant)>,
    inflight: Option<(u64, SharedFetch<T>)>,
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            inflight: None,
            generation: 0,
        }
    }
}

/// One single-flight cache slot.
pub struct SingleFlight<T: Clone> {
    slot: Mutex<Slot<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Read through the slot: fresh value, shared in-flight fetch, or a new
    /// fetch wrapped in the configured timeout.
    pub async fn get_with<F, Fut>(&self, config: CacheConfig, fetch: F) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        let (generation, shared) = {
            let mut slot = self.slot.lock().await;
            if let Some((value, fetched_at)) = &slot.value {
                if fetched_at.elapsed() < config.ttl {
                    return Ok(value.clone());
                }
            }
            match &slot.inflight {
                Some((generation, shared)) => (*generation, shared.clone()),
                None => {
                    slot.generation += 1;
                    let generation = slot.generation;
                    let timeout = config.fetch_timeout;
                    let fut = fetch();
                    let shared = async move {
                        match tokio::time::timeout(timeout, fut).await {
                            Ok(result) => result,
                            Err(_) => Err(CacheError::Timeout(timeout)),
                        }
                    }
                    .boxed()
                    .shared();
                    slot.inflight = Some((generation, shared.clone()));
                    (generation, shared)
                }
            }
        };

        let result = shared.await;

        let mut slot = self.slot.lock().await;
        // only the fetch that is still current transitions the slot; late
        // waiters of an older generation must not clobber a newer value
        if slot
            .inflight
            .as_ref()
            .is_some_and(|(inflight_generation, _)| *inflight_generation == generation)
        {
            slot.inflight = None;
            if let Ok(value) = &result {
                slot.value = Some((value.clone(), Instant::now()));
            }
        }
        match result {
            Ok(value) => Ok(value),
            Err(err) => match &slot.value {
                Some((value, _)) => {
                    warn!(%err, "serving stale cached value after fetch failure");
                    Ok(value.clone())
                }
                None => Err(err),
            },
        }
    }

    /// Inspect the resident value, regardless of freshness.
    pub async fn peek<R>(&self, inspect: impl FnOnce(&T) -> R) -> Option<R> {
        let slot = self.slot.lock().await;
        slot.value.as_ref().map(|(value, _)| inspect(value))
    }

    /// Drop the resident value; the next get fetches.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.value = None;
    }
}

#[derive(Clone)]
struct RoundRoster {
    round: u64,
    players: Vec<PlayerRecord>,
}

/// Read-through cache over the three ledger read resources: the current
/// round snapshot, the per-round roster, and the recent event window.
pub struct LedgerCache {
    ledger: HttpLedger,
    config: CacheConfig,
    round: SingleFlight<Option<RoundSnapshot>>,
    roster: SingleFlight<RoundRoster>,
    events: SingleFlight<Vec<RawEventRecord>>,
}

impl LedgerCache {
    pub fn new(ledger: HttpLedger, config: CacheConfig) -> Self {
        Self {
            ledger,
            config,
            round: SingleFlight::new(),
            roster: SingleFlight::new(),
            events: SingleFlight::new(),
        }
    }

    /// The current round snapshot, at most one TTL stale.
    pub async fn round(&self) -> Result<Option<RoundSnapshot>, CacheError> {
        let ledger = self.ledger.clone();
        self.round
            .get_with(self.config, move || async move {
                ledger.current_round().await.map_err(CacheError::upstream)
            })
            .await
    }

    /// A player record read. Uncached: per-address fan-out would defeat the
    /// keyed slots, and callers resolve players one at a time.
    pub async fn player(&self, address: &Address) -> Result<Option<PlayerRecord>, CacheError> {
        self.ledger
            .player(address)
            .await
            .map_err(CacheError::upstream)
    }

    /// The roster for `round`. A round change re-keys the slot.
    pub async fn roster(&self, round: u64) -> Result<Vec<PlayerRecord>, CacheError> {
        let cached_round = self.roster.peek(|roster| roster.round).await;
        if cached_round.is_some_and(|cached| cached != round) {
            self.roster.invalidate().await;
        }
        let ledger = self.ledger.clone();
        let roster = self
            .roster
            .get_with(self.config, move || async move {
                let players = ledger.players(round).await.map_err(CacheError::upstream)?;
                Ok(RoundRoster { round, players })
            })
            .await?;
        Ok(roster.players)
    }

    /// The recent raw event window.
    pub async fn events(&self) -> Result<Vec<RawEventRecord>, CacheError> {
        let ledger = self.ledger.clone();
        self.events
            .get_with(self.config, move || async move {
                ledger
                    .recent_events(EVENT_WINDOW)
                    .await
                    .map_err(CacheError::upstream)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use lastkey_types::RoundConfig;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(ttl: Duration) -> CacheConfig {
        CacheConfig {
            ttl,
            fetch_timeout: Duration::from_secs(1),
        }
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: u64,
    ) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<u64, CacheError>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let cache = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let config = config(Duration::from_secs(5));

        let (a, b) = tokio::join!(
            cache.get_with(config, counting_fetch(&calls, 42)),
            cache.get_with(config, counting_fetch(&calls, 42)),
        );
        assert_eq!(a.unwrap(), 42);
        assert_eq!(b.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // within the TTL: served from the slot, still one fetch
        let c = cache.get_with(config, counting_fetch(&calls, 42)).await;
        assert_eq!(c.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_ttl_refetches() {
        let cache = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let config = config(Duration::ZERO);

        cache
            .get_with(config, counting_fetch(&calls, 1))
            .await
            .unwrap();
        let second = cache
            .get_with(config, counting_fetch(&calls, 2))
            .await
            .unwrap();
        assert_eq!(second, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_failure_serves_stale_value() {
        let cache = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let config = config(Duration::ZERO);

        cache
            .get_with(config, counting_fetch(&calls, 7))
            .await
            .unwrap();

        let degraded = cache
            .get_with(config, || async {
                Err::<u64, _>(CacheError::Upstream("boom".to_string()))
            })
            .await;
        assert_eq!(degraded.unwrap(), 7);

        // the stale payload was not evicted; a later healthy fetch replaces it
        let recovered = cache
            .get_with(config, counting_fetch(&calls, 8))
            .await
            .unwrap();
        assert_eq!(recovered, 8);
    }

    #[tokio::test]
    async fn fetch_failure_without_prior_value_surfaces() {
        let cache: SingleFlight<u64> = SingleFlight::new();
        let err = cache
            .get_with(config(Duration::ZERO), || async {
                Err(CacheError::Upstream("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert_eq!(err, CacheError::Upstream("boom".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_fetch_times_out() {
        let cache: SingleFlight<u64> = SingleFlight::new();
        let err = cache
            .get_with(config(Duration::from_secs(3)), || {
                futures::future::pending::<Result<u64, CacheError>>()
            })
            .await
            .unwrap_err();
        assert_eq!(err, CacheError::Timeout(Duration::from_secs(1)));
    }

    fn sample_snapshot() -> RoundSnapshot {
        RoundSnapshot {
            round: 2,
            pot_lamports: 1_000,
            timer_end: 9_000,
            round_start: 0,
            last_buyer: Address::system(),
            total_keys: 5,
            total_players: 1,
            active: true,
            winner_claimed: false,
            total_dividend_pool: 450,
            next_round_pot: 70,
            winner_pot: 480,
            config: RoundConfig::default(),
        }
    }

    #[tokio::test]
    async fn ledger_cache_collapses_concurrent_round_reads() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/v0/round/current",
                get({
                    let hits = Arc::clone(&hits);
                    move || {
                        let hits = Arc::clone(&hits);
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Json(sample_snapshot())
                        }
                    }
                }),
            );
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap();
        });

        let ledger = HttpLedger::new(&base_url).unwrap();
        let cache = LedgerCache::new(ledger, CacheConfig::default());
        let (a, b) = tokio::join!(cache.round(), cache.round());
        assert_eq!(a.unwrap(), Some(sample_snapshot()));
        assert_eq!(b.unwrap(), Some(sample_snapshot()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        handle.abort();
    }
}
