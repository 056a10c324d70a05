//! # engine::feed
//!
//! **Feed Aggregator** — เจ้าของ instrument map เพียงคนเดียว
//!
//! ## Lifecycle
//! ```text
//! connect(symbols) ──► disconnect() (prior session)
//!                  ──► generation += 1
//!                  ──► spawn synthetic timer   (every tick_interval)
//!                  ──► spawn live leg          (if any live symbol)
//!
//! tick ──► lock core ──► stale generation? → stop
//!                    ──► compute all updates from one read
//!                    ──► merge → sink.on_update → maybe sink.on_alert
//!
//! disconnect() ──► generation += 1 ──► abort + join both tasks
//! ```
//!
//! Sink callbacks run while the core lock is held, so once `disconnect()` has
//! taken the lock and bumped the generation no callback of the old session can
//! fire.

use std::{ops::Range, sync::Arc, time::Duration};

use chrono::Utc;
use futures_util::StreamExt;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    engine::{
        catalog::{self, FeedMode},
        generator,
        ledger::Quotes,
        live::LiveConnector,
    },
    models::{Alert, AlertLog, AlertSide, Instrument, InstrumentUpdate},
};

/// Alert notional (quote currency) per source.
const SYNTHETIC_ALERT_NOTIONAL: Range<f64> = 100_000.0..1_100_000.0;
const LIVE_ALERT_NOTIONAL: Range<f64> = 50_000.0..550_000.0;

// ─── Sink ─────────────────────────────────────────────────────────────────────

/// Receives everything the feed produces. Called from the feed's tasks with
/// the core lock held; implementations must not block.
pub trait FeedSink: Send + Sync {
    fn on_update(&self, updates: &[InstrumentUpdate]);
    fn on_alert(&self, alert: &Alert);
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub mode:                 FeedMode,
    pub tick_interval:        Duration,
    pub history_capacity:     usize,
    pub alert_capacity:       usize,
    pub alert_prob_synthetic: f64,
    pub alert_prob_live:      f64,
    /// Synthetic prices never drop below `seed × price_floor_ratio`.
    pub price_floor_ratio:    f64,
    /// Fixed RNG seed. `None` = seeded from OS entropy.
    pub seed:                 Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode:                 FeedMode::Live,
            tick_interval:        Duration::from_millis(1_000),
            history_capacity:     20,
            alert_capacity:       20,
            alert_prob_synthetic: 0.015,
            alert_prob_live:      0.005,
            price_floor_ratio:    0.01,
            seed:                 None,
        }
    }
}

// ─── Snapshots ────────────────────────────────────────────────────────────────

/// Point-in-time copy of the instrument map.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub instruments: Vec<Instrument>,
}

impl MarketSnapshot {
    pub fn get(&self, id: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id() == id)
    }
}

impl Quotes for MarketSnapshot {
    fn price_of(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).map(|i| i.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedStatus {
    pub mode:       FeedMode,
    pub active:     bool,
    pub live:       Vec<String>,
    pub synthetic:  Vec<String>,
    pub generation: u64,
}

// ─── Core (guarded state) ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Source {
    Synthetic,
    Live,
}

enum FrameOutcome {
    Applied,
    Dropped,
    Stale,
}

struct FeedCore {
    config:      FeedConfig,
    mode:        FeedMode,
    instruments: Vec<Instrument>,
    rng:         Box<dyn RngCore + Send>,
    alerts:      AlertLog,
    active:      bool,
    generation:  u64,
    live:        Vec<String>,
    synthetic:   Vec<String>,
}

impl FeedCore {
    fn new(mut config: FeedConfig) -> Self {
        config.alert_prob_synthetic = config.alert_prob_synthetic.clamp(0.0, 1.0);
        config.alert_prob_live      = config.alert_prob_live.clamp(0.0, 1.0);

        let rng: Box<dyn RngCore + Send> = match config.seed {
            Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
            None       => Box::new(ChaCha8Rng::from_entropy()),
        };

        Self {
            mode:        config.mode,
            instruments: catalog::build_instruments(config.history_capacity, config.mode),
            alerts:      AlertLog::new(config.alert_capacity),
            rng,
            active:      false,
            generation:  0,
            live:        Vec::new(),
            synthetic:   Vec::new(),
            config,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active && self.generation == generation
    }

    /// Random-walk every synthetic instrument from the same prior state, then
    /// merge the results.
    fn synthetic_tick(&mut self) -> Vec<InstrumentUpdate> {
        let FeedCore { config, mode, instruments, rng, synthetic, .. } = self;

        let mut updates: Vec<InstrumentUpdate> = synthetic
            .iter()
            .filter_map(|id| {
                let instrument = instruments.iter().find(|i| i.id() == id)?;
                if !instrument.is_priced() {
                    return None;
                }
                let entry = catalog::lookup(id)?;
                Some(generator::synthetic_update(
                    id,
                    instrument.price,
                    entry.seed(*mode),
                    entry.volatility,
                    config.price_floor_ratio,
                    rng.as_mut(),
                ))
            })
            .collect();

        for update in &mut updates {
            if let Some(instrument) = instruments.iter_mut().find(|i| i.id() == update.id) {
                *instrument = instrument.merged(update);
                update.history = Some(instrument.history.to_vec());
            }
        }
        updates
    }

    fn live_frame(&mut self, text: &str) -> Option<InstrumentUpdate> {
        let Some(mut update) = generator::parse_ticker(text) else {
            debug!(frame = %truncate(text), "🗑️ [FEED] Dropped malformed live frame");
            return None;
        };
        let Some(instrument) = self.instruments.iter_mut().find(|i| i.id() == update.id) else {
            debug!(symbol = %update.id, "🗑️ [FEED] Dropped frame for unknown instrument");
            return None;
        };

        *instrument = instrument.merged(&update);
        update.history = Some(instrument.history.to_vec());
        Some(update)
    }

    /// One coin flip per tick. On success picks an instrument of this tick, a
    /// side and a notional.
    fn draw_alert(&mut self, updates: &[InstrumentUpdate], source: Source) -> Option<Alert> {
        let (probability, notional) = match source {
            Source::Synthetic => (self.config.alert_prob_synthetic, SYNTHETIC_ALERT_NOTIONAL),
            Source::Live      => (self.config.alert_prob_live, LIVE_ALERT_NOTIONAL),
        };
        if updates.is_empty() || !self.rng.gen_bool(probability) {
            return None;
        }

        let picked = &updates[self.rng.gen_range(0..updates.len())];
        let side   = if self.rng.gen_bool(0.5) { AlertSide::Buy } else { AlertSide::Sell };
        let size   = self.rng.gen_range(notional).round();

        let alert = Alert {
            id:        Uuid::new_v4(),
            symbol:    picked.id.clone(),
            side,
            size,
            timestamp: Utc::now(),
        };
        info!(symbol = %alert.symbol, side = ?alert.side, size = alert.size, "🐋 [FEED] Large trade alert");
        self.alerts.push(alert.clone());
        Some(alert)
    }

    fn status(&self) -> FeedStatus {
        FeedStatus {
            mode:       self.mode,
            active:     self.active,
            live:       self.live.clone(),
            synthetic:  self.synthetic.clone(),
            generation: self.generation,
        }
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(120) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ─── Shared (what the spawned tasks hold) ─────────────────────────────────────

struct Shared {
    core: Mutex<FeedCore>,
    sink: Arc<dyn FeedSink>,
}

impl Shared {
    /// `false` once the session that spawned the caller is gone.
    async fn synthetic_tick(&self, generation: u64) -> bool {
        let mut core = self.core.lock().await;
        if !core.is_current(generation) {
            return false;
        }

        let updates = core.synthetic_tick();
        if !updates.is_empty() {
            self.sink.on_update(&updates);
        }
        if let Some(alert) = core.draw_alert(&updates, Source::Synthetic) {
            self.sink.on_alert(&alert);
        }
        true
    }

    async fn live_frame(&self, generation: u64, text: &str) -> FrameOutcome {
        let mut core = self.core.lock().await;
        if !core.is_current(generation) {
            return FrameOutcome::Stale;
        }

        let Some(update) = core.live_frame(text) else {
            return FrameOutcome::Dropped;
        };
        let updates = std::slice::from_ref(&update);
        self.sink.on_update(updates);
        if let Some(alert) = core.draw_alert(updates, Source::Live) {
            self.sink.on_alert(&alert);
        }
        FrameOutcome::Applied
    }

    async fn live_leg_lost(&self, generation: u64) {
        let mut core = self.core.lock().await;
        if core.generation == generation {
            core.live.clear();
        }
    }
}

// ─── Aggregator ───────────────────────────────────────────────────────────────

pub struct FeedAggregator {
    shared:    Arc<Shared>,
    connector: Arc<dyn LiveConnector>,
    /// Also serializes connect / disconnect / set_mode.
    tasks:     Mutex<Vec<JoinHandle<()>>>,
}

impl FeedAggregator {
    pub fn new(config: FeedConfig, sink: Arc<dyn FeedSink>, connector: Arc<dyn LiveConnector>) -> Self {
        Self {
            shared: Arc::new(Shared { core: Mutex::new(FeedCore::new(config)), sink }),
            connector,
            tasks: Mutex::new(Vec::new()),
        }
    }

    // ─── Lifecycle ────────────────────────────────────────────────────────────

    /// Start a session for `symbols`, replacing any previous one.
    ///
    /// Unknown symbols are skipped. If no synthetic symbol remains, the
    /// mode's default synthetic list is ticked instead.
    pub async fn connect(&self, symbols: &[String]) -> FeedStatus {
        let mut tasks = self.tasks.lock().await;
        self.stop(&mut tasks).await;

        let (status, period) = {
            let mut core = self.shared.core.lock().await;
            let mode = core.mode;

            let mut live      = Vec::new();
            let mut synthetic = Vec::new();
            for symbol in symbols {
                let id = symbol.trim().to_uppercase();
                if catalog::lookup(&id).is_none() {
                    debug!(symbol = %id, "❓ [FEED] Ignoring unknown symbol");
                    continue;
                }
                let bucket = if catalog::is_live_symbol(&id, mode) { &mut live } else { &mut synthetic };
                if !bucket.contains(&id) {
                    bucket.push(id);
                }
            }
            if synthetic.is_empty() {
                synthetic = catalog::default_synthetic(mode);
            }

            core.generation += 1;
            core.active    = true;
            core.live      = live;
            core.synthetic = synthetic;
            (core.status(), core.config.tick_interval)
        };

        tasks.push(self.spawn_timer(status.generation, period));
        if !status.live.is_empty() {
            tasks.push(self.spawn_live(status.generation, status.live.clone()));
        }

        info!(
            mode       = ?status.mode,
            live       = status.live.len(),
            synthetic  = status.synthetic.len(),
            generation = status.generation,
            "📡 [FEED] Connected"
        );
        status
    }

    /// Stop the live leg and the timer. Safe to call in any state.
    pub async fn disconnect(&self) {
        let mut tasks = self.tasks.lock().await;
        self.stop(&mut tasks).await;
    }

    /// Switch mode: ends the session and rebuilds every instrument from the
    /// catalog. The caller reconnects.
    pub async fn set_mode(&self, mode: FeedMode) {
        let mut tasks = self.tasks.lock().await;
        self.stop(&mut tasks).await;

        let mut core = self.shared.core.lock().await;
        core.mode        = mode;
        core.instruments = catalog::build_instruments(core.config.history_capacity, mode);
        info!(mode = ?mode, "🔀 [FEED] Mode switched, instruments rebuilt");
    }

    async fn stop(&self, tasks: &mut Vec<JoinHandle<()>>) {
        {
            let mut core = self.shared.core.lock().await;
            let was_active = core.active;
            core.active = false;
            core.generation += 1;
            core.live.clear();
            core.synthetic.clear();
            if was_active {
                info!(generation = core.generation, "🔌 [FEED] Disconnected");
            }
        }

        for handle in tasks.drain(..) {
            handle.abort();
            // Joining makes sure the live stream (and its socket) is dropped
            // before we return.
            let _ = handle.await;
        }
    }

    fn spawn_timer(&self, generation: u64, period: Duration) -> JoinHandle<()> {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !shared.synthetic_tick(generation).await {
                    break;
                }
            }
        })
    }

    fn spawn_live(&self, generation: u64, symbols: Vec<String>) -> JoinHandle<()> {
        let shared    = self.shared.clone();
        let connector = self.connector.clone();
        tokio::spawn(async move {
            let mut frames = match connector.open(&symbols).await {
                Ok(frames) => frames,
                Err(e) => {
                    warn!(error = %e, "⚠️ [FEED] Live leg failed to connect, synthetic ticking continues");
                    shared.live_leg_lost(generation).await;
                    return;
                }
            };

            while let Some(frame) = frames.next().await {
                let text = match frame {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "⚠️ [FEED] Live leg lost, synthetic ticking continues");
                        break;
                    }
                };
                if let FrameOutcome::Stale = shared.live_frame(generation, &text).await {
                    return;
                }
            }
            shared.live_leg_lost(generation).await;
            debug!(generation, "[FEED] Live task finished");
        })
    }

    // ─── Readers ──────────────────────────────────────────────────────────────

    pub async fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot { instruments: self.shared.core.lock().await.instruments.clone() }
    }

    pub async fn instrument(&self, id: &str) -> Option<Instrument> {
        let core = self.shared.core.lock().await;
        core.instruments.iter().find(|i| i.id() == id).cloned()
    }

    pub async fn recent_alerts(&self) -> Vec<Alert> {
        self.shared.core.lock().await.alerts.snapshot()
    }

    pub async fn status(&self) -> FeedStatus {
        self.shared.core.lock().await.status()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::live::{FeedError, FrameStream};
    use crate::models::Trend;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    };

    #[derive(Default)]
    struct CollectingSink {
        batches: StdMutex<Vec<Vec<InstrumentUpdate>>>,
        alerts:  StdMutex<Vec<Alert>>,
    }

    impl CollectingSink {
        fn batches(&self) -> Vec<Vec<InstrumentUpdate>> {
            self.batches.lock().unwrap().clone()
        }
        fn alerts(&self) -> Vec<Alert> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl FeedSink for CollectingSink {
        fn on_update(&self, updates: &[InstrumentUpdate]) {
            self.batches.lock().unwrap().push(updates.to_vec());
        }
        fn on_alert(&self, alert: &Alert) {
            self.alerts.lock().unwrap().push(alert.clone());
        }
    }

    /// Counts how many live sessions were opened and how many are still alive.
    struct Counted(Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct FakeConnector {
        frames:   Vec<Result<String, String>>,
        /// Keep the stream open after the scripted frames.
        hold:     bool,
        opened:   AtomicUsize,
        alive:    Arc<AtomicUsize>,
    }

    impl FakeConnector {
        fn new(frames: Vec<Result<String, String>>, hold: bool) -> Arc<Self> {
            Arc::new(Self { frames, hold, opened: AtomicUsize::new(0), alive: Arc::new(AtomicUsize::new(0)) })
        }
    }

    #[async_trait]
    impl LiveConnector for FakeConnector {
        async fn open(&self, _symbols: &[String]) -> Result<FrameStream, FeedError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            self.alive.fetch_add(1, Ordering::SeqCst);
            let guard = Counted(self.alive.clone());

            let scripted = stream::iter(
                self.frames
                    .clone()
                    .into_iter()
                    .map(|f| f.map_err(FeedError::Closed))
                    .collect::<Vec<_>>(),
            );
            let tail = if self.hold {
                stream::pending::<Result<String, FeedError>>().boxed()
            } else {
                stream::empty::<Result<String, FeedError>>().boxed()
            };
            Ok(scripted
                .chain(tail)
                .map(move |frame| {
                    let _alive = &guard;
                    frame
                })
                .boxed())
        }
    }

    fn btc_frame(price: &str, change: &str) -> String {
        format!(r#"{{"e":"24hrTicker","s":"BTCUSDT","c":"{price}","P":"{change}","h":"96000.00"}}"#)
    }

    fn config(mode: FeedMode, seed: u64) -> FeedConfig {
        FeedConfig { mode, seed: Some(seed), alert_prob_synthetic: 0.0, alert_prob_live: 0.0, ..FeedConfig::default() }
    }

    fn feed(config: FeedConfig, connector: Arc<FakeConnector>) -> (FeedAggregator, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::default());
        (FeedAggregator::new(config, sink.clone(), connector), sink)
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthetic_timer_ticks_once_per_period() {
        let (feed, sink) = feed(config(FeedMode::Simulation, 1), FakeConnector::new(vec![], true));
        feed.connect(&symbols(&["TSLA", "EURUSD"])).await;

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let batches = sink.batches();
        assert_eq!(batches.len(), 3);
        for batch in &batches {
            let ids: Vec<_> = batch.iter().map(|u| u.id.as_str()).collect();
            assert_eq!(ids, vec!["TSLA", "EURUSD"]);
            assert!(batch.iter().all(|u| u.history.as_ref().map(Vec::len) == Some(20)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_seed_same_sequence() {
        let run = |seed| async move {
            let (feed, sink) = feed(config(FeedMode::Simulation, seed), FakeConnector::new(vec![], true));
            feed.connect(&[]).await;
            tokio::time::sleep(Duration::from_millis(5_500)).await;
            feed.disconnect().await;
            sink.batches()
        };

        let a = run(99).await;
        let b = run(99).await;
        assert_eq!(a.len(), 5);
        assert_eq!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_request_uses_default_synthetic() {
        let (feed, _sink) = feed(config(FeedMode::Live, 1), FakeConnector::new(vec![], true));
        let status = feed.connect(&symbols(&["BTCUSDT", "NOPE"])).await;

        assert_eq!(status.live, vec!["BTCUSDT"]);
        assert_eq!(status.synthetic, catalog::default_synthetic(FeedMode::Live));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_callbacks_after_disconnect() {
        let (feed, sink) = feed(config(FeedMode::Simulation, 2), FakeConnector::new(vec![], true));
        feed.connect(&[]).await;
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        feed.disconnect().await;
        let seen = sink.batches().len();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen, 1);
        assert_eq!(sink.batches().len(), seen);
        assert!(!feed.status().await.active);

        // twice is fine
        feed.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_keeps_one_live_connection() {
        let connector = FakeConnector::new(vec![], true);
        let (feed, _sink) = feed(config(FeedMode::Live, 3), connector.clone());

        for _ in 0..3 {
            feed.connect(&symbols(&["BTCUSDT", "ETHUSDT"])).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(connector.opened.load(Ordering::SeqCst), 3);
        assert_eq!(connector.alive.load(Ordering::SeqCst), 1);

        feed.disconnect().await;
        assert_eq!(connector.alive.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_frames_update_instruments() {
        let connector = FakeConnector::new(
            vec![Ok("garbage".into()), Ok(btc_frame("94850.00", "2.4"))],
            true,
        );
        let (feed, sink) = feed(config(FeedMode::Live, 4), connector);
        feed.connect(&symbols(&["BTCUSDT"])).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let btc = feed.instrument("BTCUSDT").await.unwrap();
        assert_eq!(btc.price, 94_850.0);
        assert_eq!(btc.trend, Trend::Bullish);
        assert_eq!(btc.history.last(), Some(94_850.0));

        let live_batches: Vec<_> = sink.batches().into_iter().filter(|b| b[0].id == "BTCUSDT").collect();
        assert_eq!(live_batches.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_loss_does_not_stop_synthetic() {
        let connector = FakeConnector::new(vec![Err("reset by peer".into())], false);
        let (feed, sink) = feed(config(FeedMode::Live, 5), connector.clone());
        feed.connect(&symbols(&["BTCUSDT", "TSLA"])).await;

        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert_eq!(connector.alive.load(Ordering::SeqCst), 0);
        assert_eq!(sink.batches().len(), 2);
        let status = feed.status().await;
        assert!(status.active);
        assert!(status.live.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_every_tick_when_certain() {
        let cfg = FeedConfig { alert_prob_synthetic: 1.0, alert_capacity: 2, ..config(FeedMode::Simulation, 6) };
        let (feed, sink) = feed(cfg, FakeConnector::new(vec![], true));
        feed.connect(&symbols(&["AAPL"])).await;

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let alerts = sink.alerts();
        assert_eq!(alerts.len(), 3);
        for alert in &alerts {
            assert_eq!(alert.symbol, "AAPL");
            assert!(SYNTHETIC_ALERT_NOTIONAL.start <= alert.size && alert.size <= SYNTHETIC_ALERT_NOTIONAL.end);
        }
        assert_eq!(feed.recent_alerts().await, alerts[1..].to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_mode_rebuilds_instruments() {
        let (feed, _sink) = feed(config(FeedMode::Simulation, 7), FakeConnector::new(vec![], true));
        feed.connect(&symbols(&["NVDA"])).await;
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_ne!(feed.instrument("NVDA").await.unwrap().price, 135.40);

        feed.set_mode(FeedMode::Live).await;

        let status = feed.status().await;
        assert_eq!(status.mode, FeedMode::Live);
        assert!(!status.active);
        let nvda = feed.instrument("NVDA").await.unwrap();
        assert_eq!(nvda.price, 135.40);
        assert!(nvda.history.to_vec().iter().all(|p| *p == 135.40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_ticks_live_only_coins() {
        let (feed, sink) = feed(config(FeedMode::Live, 9), FakeConnector::new(vec![], true));
        feed.set_mode(FeedMode::Simulation).await;
        let status = feed.connect(&symbols(&["BNBUSDT"])).await;
        assert_eq!(status.synthetic, vec!["BNBUSDT"]);

        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert_eq!(sink.batches().len(), 1);
        assert!(feed.snapshot().await.price_of("BNBUSDT").unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_snapshot_serves_as_quotes() {
        let (feed, _sink) = feed(config(FeedMode::Live, 8), FakeConnector::new(vec![], true));
        let snapshot = feed.snapshot().await;
        assert_eq!(snapshot.price_of("BTCUSDT"), Some(94_850.0));
        assert_eq!(snapshot.price_of("BNBUSDT"), Some(0.0));
        assert_eq!(snapshot.price_of("DOGEUSDT"), None);
    }
}
