//! Polling notifier: watches the current round through the consistency cache
//! and posts edge-triggered notifications to an outbound webhook channel.
//!
//! Exactly one `SessionState` lives here. Running a second notifier against
//! the same channels requires its own process (and its own session), or
//! milestone and drama dedup will double-fire.

use std::time::Duration;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, info, warn};

use lastkey_client::{CacheConfig, HttpLedger, LedgerCache};
use lastkey_engine::{SessionState, TriggerConfig, TriggerEngine, TriggerEvent, TriggerKind};
use lastkey_types::constants::LAMPORTS_PER_SOL;

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
struct NotifierConfig {
    poll_ms: u64,
    ledger_url: String,
    webhook_url: Option<String>,
    milestones_sol: Vec<u64>,
    drama_secs: i64,
}

impl NotifierConfig {
    fn from_env() -> Self {
        Self {
            poll_ms: read_u64("NOTIFIER_POLL_MS", 5_000),
            ledger_url: std::env::var("NOTIFIER_LEDGER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            webhook_url: std::env::var("NOTIFIER_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            milestones_sol: read_u64_list("NOTIFIER_MILESTONES_SOL", &[10, 50, 100, 500, 1_000]),
            drama_secs: read_u64("NOTIFIER_DRAMA_SECS", 60) as i64,
        }
    }
}

fn read_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_u64_list(key: &str, fallback: &[u64]) -> Vec<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .split(',')
            .filter_map(|part| part.trim().parse::<u64>().ok())
            .collect(),
        Err(_) => fallback.to_vec(),
    }
}

fn sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

fn render(event: &TriggerEvent) -> String {
    match &event.kind {
        TriggerKind::PotMilestone {
            threshold_lamports,
            pot_lamports,
        } => format!(
            "The round {} pot just passed {:.0} SOL — now {:.2} SOL and climbing.",
            event.round,
            sol(*threshold_lamports),
            sol(*pot_lamports)
        ),
        TriggerKind::TimerDrama { remaining_secs } => format!(
            "{remaining_secs}s left in round {}. One key resets the clock.",
            event.round
        ),
        TriggerKind::RoundStarted { pot_lamports } => format!(
            "Round {} is live with {:.2} SOL already in the pot.",
            event.round,
            sol(*pot_lamports)
        ),
        TriggerKind::RoundEnded {
            winner,
            pot_lamports,
        } => format!(
            "Round {} is over. Last buyer {} takes the prize from a {:.2} SOL pot.",
            event.round,
            winner,
            sol(*pot_lamports)
        ),
    }
}

fn jittered_backoff(rng: &mut impl RngCore, backoff: Duration) -> Duration {
    let backoff_ms = backoff.as_millis() as u64;
    if backoff_ms <= 1 {
        return backoff;
    }

    // "Equal jitter": delay is in [backoff/2, backoff].
    let half_ms = backoff_ms / 2;
    let jitter_ms = rng.gen_range(0..=half_ms);
    Duration::from_millis(half_ms.saturating_add(jitter_ms))
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

async fn post_event(
    http: &reqwest::Client,
    webhook_url: Option<&str>,
    session: &mut SessionState,
    event: &TriggerEvent,
) {
    let text = render(event);
    info!(round = event.round, priority = ?event.priority, %text, "trigger fired");
    session.record_post("log");

    let Some(url) = webhook_url else {
        return;
    };
    let payload = serde_json::json!({
        "text": text,
        "event": event,
    });
    match http.post(url).json(&payload).send().await {
        Ok(response) if response.status().is_success() => {
            session.record_post("webhook");
        }
        Ok(response) => {
            warn!(status = %response.status(), "webhook rejected notification");
        }
        Err(err) => {
            warn!(%err, "webhook post failed");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = NotifierConfig::from_env();
    let ledger =
        HttpLedger::new(&config.ledger_url).context("invalid NOTIFIER_LEDGER_URL")?;
    let cache = LedgerCache::new(ledger, CacheConfig::default());
    let engine = TriggerEngine::new(TriggerConfig::new(
        config
            .milestones_sol
            .iter()
            .map(|sol| sol.saturating_mul(LAMPORTS_PER_SOL))
            .collect(),
        config.drama_secs,
    ));
    let mut session = SessionState::new();
    let http = reqwest::Client::new();
    let mut rng = StdRng::from_entropy();

    info!(
        poll_ms = config.poll_ms,
        ledger = %config.ledger_url,
        webhook = config.webhook_url.is_some(),
        "notifier started"
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(config.poll_ms.max(250)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            _ = ticker.tick() => {}
        }

        match cache.round().await {
            Ok(Some(snapshot)) => {
                let events = engine.evaluate(&snapshot, &mut session, unix_now());
                for event in &events {
                    post_event(&http, config.webhook_url.as_deref(), &mut session, event)
                        .await;
                }
            }
            Ok(None) => {
                debug!("no round initialized yet");
            }
            Err(err) => {
                warn!(%err, "poll failed");
                tokio::time::sleep(jittered_backoff(&mut rng, POLL_ERROR_BACKOFF)).await;
            }
        }
    }

    info!(
        log_posts = session.posts("log"),
        webhook_posts = session.posts("webhook"),
        "notifier stopped"
    );
    Ok(())
}
