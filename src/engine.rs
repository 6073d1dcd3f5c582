//! The DCA decision engine.
//!
//! One evaluation cycle walks the configured assets in order and, per
//! asset: fetches prices, computes RSI, selects the tightest allocation
//! bracket, checks the ledger's daily gate, and hands the split amount to
//! the executor. The engine itself is stateless across cycles - every
//! temporal decision is a fresh query against the ledger, so a process
//! restart cannot desynchronize the daily throttle.

use crate::config::{AllocationRule, AssetWeight, Config};
use crate::exchange::MarketData;
use crate::executor::{ExecutionResult, TradeExecutor};
use crate::indicators;
use crate::ledger::{Ledger, TradeRecord};
use crate::logger::{self, LogTag};
use crate::notifications::{EventSink, Notification};
use crate::types::{PriceBook, SignalStrength};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

/// Immutable snapshot of the strategy parameters for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub assets: Vec<AssetWeight>,
    pub allocation_rules: Vec<AllocationRule>,
    pub rsi_period: usize,
    pub lookback: usize,
    pub min_trade_amount: f64,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        let dca = &config.dca;
        Self {
            assets: dca.assets.clone(),
            allocation_rules: dca.allocation_rules.clone(),
            rsi_period: dca.rsi_period,
            lookback: dca.lookback,
            min_trade_amount: dca.min_trade_amount,
            max_retries: dca.max_retries,
            retry_delay: Duration::from_secs(dca.retry_delay_secs),
        }
    }
}

/// Observable engine state, per evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Evaluating,
    Throttled,
    NoOpportunity,
    Executing,
}

/// Terminal outcome of evaluating a single asset in a cycle.
#[derive(Debug)]
pub enum AssetOutcome {
    /// No rule fired: insufficient data, RSI above every threshold, or the
    /// split spend fell below the configured minimum.
    NoOpportunity { rsi: Option<f64>, detail: String },
    /// A rule fired but the portfolio already bought today.
    Throttled { rsi: f64, price: f64, amount: f64 },
    /// Filled and durably recorded.
    Executed { record: TradeRecord },
    /// The venue (or a pre-flight check) declined. Final.
    Rejected { amount: f64, reason: String },
    /// Transport retries exhausted, or the ledger write failed after a
    /// fill. No capital is recorded as committed.
    Failed { amount: f64, cause: String },
    /// The price fetch itself failed; the asset is skipped this cycle.
    DataUnavailable { cause: String },
}

fn state_for(outcome: &AssetOutcome) -> EngineState {
    match outcome {
        AssetOutcome::NoOpportunity { .. } | AssetOutcome::DataUnavailable { .. } => {
            EngineState::NoOpportunity
        }
        AssetOutcome::Throttled { .. } => EngineState::Throttled,
        AssetOutcome::Executed { .. }
        | AssetOutcome::Rejected { .. }
        | AssetOutcome::Failed { .. } => EngineState::Executing,
    }
}

/// Among the rules whose threshold lies strictly above the RSI, pick the
/// one with the smallest threshold (the tightest bracket). Rules are
/// validated at startup to be sorted by ascending threshold, so the first
/// match wins. An RSI exactly on a threshold does not select that rule.
pub fn select_rule(rules: &[AllocationRule], rsi: f64) -> Option<&AllocationRule> {
    rules.iter().find(|rule| rsi < rule.threshold)
}

pub struct DcaEngine {
    settings: EngineSettings,
    market: Arc<dyn MarketData>,
    executor: Box<dyn TradeExecutor>,
    events: Arc<dyn EventSink>,
    ledger: Arc<RwLock<Ledger>>,
    price_book: PriceBook,
    state: Mutex<EngineState>,
}

impl DcaEngine {
    pub fn new(
        settings: EngineSettings,
        market: Arc<dyn MarketData>,
        executor: Box<dyn TradeExecutor>,
        events: Arc<dyn EventSink>,
        ledger: Arc<RwLock<Ledger>>,
        price_book: PriceBook,
    ) -> Self {
        Self {
            settings,
            market,
            executor,
            events,
            ledger,
            price_book,
            state: Mutex::new(EngineState::Idle),
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().expect("engine state lock poisoned")
    }

    fn set_state(&self, state: EngineState) {
        *self.state.lock().expect("engine state lock poisoned") = state;
    }

    /// Run one full evaluation cycle over all configured assets.
    ///
    /// Assets are evaluated strictly in configured order; the daily gate is
    /// re-checked per asset, so the first fill of the day throttles every
    /// later asset in the same cycle. Exactly one notification is emitted
    /// per asset outcome.
    pub async fn run_cycle(&self) -> Vec<(String, AssetOutcome)> {
        self.set_state(EngineState::Evaluating);
        logger::info(LogTag::Engine, "=== DCA evaluation cycle start ===");

        let mut outcomes = Vec::with_capacity(self.settings.assets.len());

        for asset in &self.settings.assets {
            let outcome = self.evaluate_asset(asset).await;
            self.set_state(state_for(&outcome));
            self.report(&asset.symbol, &outcome).await;
            outcomes.push((asset.symbol.clone(), outcome));
        }

        self.set_state(EngineState::Idle);
        logger::info(LogTag::Engine, "=== DCA evaluation cycle end ===");
        outcomes
    }

    async fn evaluate_asset(&self, asset: &AssetWeight) -> AssetOutcome {
        let samples = match self
            .market
            .recent_closes(&asset.symbol, self.settings.lookback)
            .await
        {
            Ok(samples) => samples,
            Err(e) => {
                logger::warning(
                    LogTag::Engine,
                    &format!("{}: price fetch failed: {}", asset.symbol, e),
                );
                return AssetOutcome::DataUnavailable {
                    cause: e.to_string(),
                };
            }
        };

        let Some(last) = samples.last() else {
            return AssetOutcome::NoOpportunity {
                rsi: None,
                detail: "venue returned an empty price series".to_string(),
            };
        };
        let price = last.close;
        self.price_book.record(&asset.symbol, price);

        let snapshot = indicators::rsi_snapshot(&asset.symbol, &samples, self.settings.rsi_period);
        let Some(rsi) = snapshot.rsi else {
            logger::info(
                LogTag::Indicator,
                &format!(
                    "{}: insufficient history for RSI ({} closes, need {})",
                    asset.symbol,
                    samples.len(),
                    self.settings.rsi_period + 1
                ),
            );
            return AssetOutcome::NoOpportunity {
                rsi: None,
                detail: format!(
                    "insufficient price history ({} closes, need {})",
                    samples.len(),
                    self.settings.rsi_period + 1
                ),
            };
        };

        logger::info(
            LogTag::Engine,
            &format!(
                "{}: price={:.2} RSI={:.1} signal={}",
                asset.symbol,
                price,
                rsi,
                SignalStrength::from_rsi(rsi)
            ),
        );

        let Some(rule) = select_rule(&self.settings.allocation_rules, rsi) else {
            return AssetOutcome::NoOpportunity {
                rsi: Some(rsi),
                detail: format!("RSI {:.1} is above every buy threshold", rsi),
            };
        };

        let amount = rule.amount * asset.weight;

        // the gate is consulted before any capital is committed; cycles are
        // serialized, so check-then-act is safe without extra locking
        if self.ledger.read().await.has_trade_today(Utc::now()) {
            logger::info(
                LogTag::Engine,
                &format!(
                    "{}: signal at RSI {:.1} but a purchase already happened today",
                    asset.symbol, rsi
                ),
            );
            return AssetOutcome::Throttled { rsi, price, amount };
        }

        if amount < self.settings.min_trade_amount {
            return AssetOutcome::NoOpportunity {
                rsi: Some(rsi),
                detail: format!(
                    "split spend {:.2} is below the minimum trade amount {:.2}",
                    amount, self.settings.min_trade_amount
                ),
            };
        }

        match self.execute_with_retry(&asset.symbol, amount).await {
            ExecutionResult::Filled { price, quantity } => {
                let record = TradeRecord::new(
                    &asset.symbol,
                    amount,
                    quantity,
                    price,
                    rsi,
                    self.executor.mode(),
                );

                let mut ledger = self.ledger.write().await;
                match ledger.append(record.clone()) {
                    Ok(()) => {
                        logger::info(
                            LogTag::Ledger,
                            &format!(
                                "recorded {} buy: {:.2} -> {:.8} @ {:.2}",
                                asset.symbol, amount, quantity, price
                            ),
                        );
                        AssetOutcome::Executed { record }
                    }
                    Err(e) => {
                        // the fill happened but could not be recorded; this
                        // must not be announced as a successful trade
                        logger::error(
                            LogTag::Ledger,
                            &format!("ledger write failed after fill: {:#}", e),
                        );
                        AssetOutcome::Failed {
                            amount,
                            cause: format!("ledger write failed: {}", e),
                        }
                    }
                }
            }
            ExecutionResult::Rejected { reason } => {
                logger::warning(
                    LogTag::Engine,
                    &format!("{}: order rejected: {}", asset.symbol, reason),
                );
                AssetOutcome::Rejected { amount, reason }
            }
            ExecutionResult::NetworkFailure { cause } => {
                logger::error(
                    LogTag::Engine,
                    &format!("{}: retries exhausted: {}", asset.symbol, cause),
                );
                AssetOutcome::Failed { amount, cause }
            }
        }
    }

    /// Invoke the executor, retrying transport failures with exponential
    /// backoff. Rejections and fills pass through untouched.
    async fn execute_with_retry(&self, asset: &str, amount: f64) -> ExecutionResult {
        let mut attempt: u32 = 0;

        loop {
            let result = self.executor.execute(asset, amount).await;

            let ExecutionResult::NetworkFailure { cause } = &result else {
                return result;
            };

            if attempt >= self.settings.max_retries {
                return result;
            }

            attempt += 1;
            let delay = self.settings.retry_delay * 2u32.saturating_pow(attempt - 1);
            logger::warning(
                LogTag::Engine,
                &format!(
                    "{}: network failure ({}), retry {}/{} in {:?}",
                    asset, cause, attempt, self.settings.max_retries, delay
                ),
            );
            sleep(delay).await;
        }
    }

    /// Emit the single notification matching an asset's terminal outcome.
    async fn report(&self, asset: &str, outcome: &AssetOutcome) {
        let notification = match outcome {
            AssetOutcome::NoOpportunity { detail, .. } => Notification::NoOpportunity {
                asset: asset.to_string(),
                detail: detail.clone(),
            },
            AssetOutcome::Throttled { rsi, price, amount } => Notification::Opportunity {
                asset: asset.to_string(),
                rsi: *rsi,
                price: *price,
                amount: *amount,
            },
            AssetOutcome::Executed { record } => Notification::TradeExecuted {
                asset: record.asset.clone(),
                amount: record.fiat_amount,
                price: record.price,
                quantity: record.quantity,
                rsi: record.rsi,
                mode: record.mode,
            },
            AssetOutcome::Rejected { amount, reason } => Notification::OrderRejected {
                asset: asset.to_string(),
                amount: *amount,
                reason: reason.clone(),
            },
            AssetOutcome::Failed { amount, cause } => Notification::ExecutionFailed {
                asset: asset.to_string(),
                amount: *amount,
                cause: cause.clone(),
            },
            AssetOutcome::DataUnavailable { cause } => Notification::MarketDataUnavailable {
                asset: asset.to_string(),
                cause: cause.clone(),
            },
        };

        self.events.send(notification).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::ExchangeError;
    use crate::executor::SimulatedExecutor;
    use crate::notifications::NotifyLevel;
    use crate::types::{PriceSample, TradeMode};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet, VecDeque};

    // ---- fakes ------------------------------------------------------------

    struct StubMarket {
        series: HashMap<String, Vec<PriceSample>>,
        failing: HashSet<String>,
    }

    impl StubMarket {
        fn new() -> Self {
            Self {
                series: HashMap::new(),
                failing: HashSet::new(),
            }
        }

        fn with_series(mut self, asset: &str, samples: Vec<PriceSample>) -> Self {
            self.series.insert(asset.to_string(), samples);
            self
        }

        fn with_failure(mut self, asset: &str) -> Self {
            self.failing.insert(asset.to_string());
            self
        }
    }

    #[async_trait]
    impl MarketData for StubMarket {
        async fn recent_closes(
            &self,
            asset: &str,
            _lookback: usize,
        ) -> Result<Vec<PriceSample>, ExchangeError> {
            if self.failing.contains(asset) {
                return Err(ExchangeError::Transport("connection reset".to_string()));
            }
            Ok(self.series.get(asset).cloned().unwrap_or_default())
        }
    }

    /// Replays a scripted sequence of results; once the script is empty
    /// every further call fills at a fixed price.
    #[derive(Clone)]
    struct ScriptedExecutor {
        script: Arc<Mutex<VecDeque<ExecutionResult>>>,
        calls: Arc<Mutex<Vec<(String, f64)>>>,
    }

    impl ScriptedExecutor {
        fn new(script: Vec<ExecutionResult>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into_iter().collect())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn calls(&self) -> Vec<(String, f64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TradeExecutor for ScriptedExecutor {
        fn mode(&self) -> TradeMode {
            TradeMode::Simulated
        }

        async fn execute(&self, asset: &str, fiat_amount: f64) -> ExecutionResult {
            self.calls
                .lock()
                .unwrap()
                .push((asset.to_string(), fiat_amount));

            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ExecutionResult::Filled {
                    price: 50_000.0,
                    quantity: fiat_amount / 50_000.0,
                })
        }
    }

    #[derive(Clone, Default)]
    struct CapturingSink {
        events: Arc<Mutex<Vec<Notification>>>,
    }

    impl CapturingSink {
        fn levels(&self) -> Vec<NotifyLevel> {
            self.events.lock().unwrap().iter().map(|n| n.level()).collect()
        }

        fn count(&self) -> usize {
            self.events.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EventSink for CapturingSink {
        async fn send(&self, notification: Notification) {
            self.events.lock().unwrap().push(notification);
        }
    }

    // ---- helpers ----------------------------------------------------------

    fn rule(threshold: f64, amount: f64) -> AllocationRule {
        AllocationRule { threshold, amount }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            assets: vec![
                AssetWeight {
                    symbol: "BTC".to_string(),
                    weight: 0.7,
                },
                AssetWeight {
                    symbol: "ETH".to_string(),
                    weight: 0.3,
                },
            ],
            allocation_rules: vec![rule(30.0, 40.0), rule(40.0, 25.0), rule(50.0, 15.0)],
            rsi_period: 14,
            lookback: 100,
            min_trade_amount: 1.0,
            max_retries: 3,
            retry_delay: Duration::ZERO,
        }
    }

    /// Monotonically falling closes: RSI is 0, the tightest bracket fires.
    fn falling_series(asset: &str, n: usize, start: f64) -> Vec<PriceSample> {
        (0..n)
            .map(|i| {
                PriceSample::new(
                    asset,
                    Utc::now() - chrono::Duration::hours(4 * (n - i) as i64),
                    start - i as f64,
                )
            })
            .collect()
    }

    /// Monotonically rising closes: RSI is 100, nothing fires.
    fn rising_series(asset: &str, n: usize, start: f64) -> Vec<PriceSample> {
        (0..n)
            .map(|i| {
                PriceSample::new(
                    asset,
                    Utc::now() - chrono::Duration::hours(4 * (n - i) as i64),
                    start + i as f64,
                )
            })
            .collect()
    }

    fn load_ledger(dir: &tempfile::TempDir) -> Arc<RwLock<Ledger>> {
        Arc::new(RwLock::new(
            Ledger::load(dir.path().join("trades.json")).unwrap(),
        ))
    }

    struct Harness {
        engine: DcaEngine,
        executor: ScriptedExecutor,
        sink: CapturingSink,
        ledger: Arc<RwLock<Ledger>>,
    }

    fn harness(market: StubMarket, script: Vec<ExecutionResult>, dir: &tempfile::TempDir) -> Harness {
        let executor = ScriptedExecutor::new(script);
        let sink = CapturingSink::default();
        let ledger = load_ledger(dir);

        let engine = DcaEngine::new(
            settings(),
            Arc::new(market),
            Box::new(executor.clone()),
            Arc::new(sink.clone()),
            ledger.clone(),
            PriceBook::new(),
        );

        Harness {
            engine,
            executor,
            sink,
            ledger,
        }
    }

    // ---- rule selection ---------------------------------------------------

    #[test]
    fn tightest_qualifying_bracket_wins() {
        let rules = vec![rule(30.0, 40.0), rule(40.0, 25.0), rule(50.0, 15.0)];

        assert_eq!(select_rule(&rules, 29.0).unwrap().amount, 40.0);
        assert_eq!(select_rule(&rules, 38.1).unwrap().amount, 25.0);
        assert_eq!(select_rule(&rules, 45.2).unwrap().amount, 15.0);
        assert!(select_rule(&rules, 52.0).is_none());
    }

    #[test]
    fn boundary_rsi_does_not_select_its_own_threshold() {
        let rules = vec![rule(30.0, 40.0), rule(40.0, 25.0), rule(50.0, 15.0)];

        // exactly on a threshold the comparison is strict, so the next
        // bracket (or none) applies
        assert_eq!(select_rule(&rules, 30.0).unwrap().amount, 25.0);
        assert_eq!(select_rule(&rules, 40.0).unwrap().amount, 15.0);
        assert!(select_rule(&rules, 50.0).is_none());
    }

    // ---- cycle behavior ---------------------------------------------------

    #[tokio::test]
    async fn first_fill_of_the_day_throttles_later_assets_in_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let market = StubMarket::new()
            .with_series("BTC", falling_series("BTC", 20, 50_000.0))
            .with_series("ETH", falling_series("ETH", 20, 3_000.0));
        let h = harness(market, vec![], &dir);

        let outcomes = h.engine.run_cycle().await;

        assert!(matches!(outcomes[0].1, AssetOutcome::Executed { .. }));
        assert!(matches!(outcomes[1].1, AssetOutcome::Throttled { .. }));

        // only the first asset reached the executor, with the weighted split
        assert_eq!(h.executor.calls(), vec![("BTC".to_string(), 28.0)]);

        let ledger = h.ledger.read().await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.records()[0].asset, "BTC");
        assert_eq!(ledger.records()[0].fiat_amount, 28.0);

        assert_eq!(h.sink.levels(), vec![NotifyLevel::Trade, NotifyLevel::Opportunity]);
        assert_eq!(h.engine.state(), EngineState::Idle);
    }

    #[tokio::test]
    async fn existing_trade_today_throttles_every_asset() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut ledger = Ledger::load(dir.path().join("trades.json")).unwrap();
            ledger
                .append(TradeRecord::new("BTC", 28.0, 0.0005, 50_000.0, 22.0, TradeMode::Simulated))
                .unwrap();
        }

        let market = StubMarket::new()
            .with_series("BTC", falling_series("BTC", 20, 50_000.0))
            .with_series("ETH", falling_series("ETH", 20, 3_000.0));
        let h = harness(market, vec![], &dir);

        let outcomes = h.engine.run_cycle().await;

        assert!(matches!(outcomes[0].1, AssetOutcome::Throttled { .. }));
        assert!(matches!(outcomes[1].1, AssetOutcome::Throttled { .. }));
        // the gate closes before any capital is committed
        assert_eq!(h.executor.call_count(), 0);
        // missed opportunities are still reported, once each
        assert_eq!(
            h.sink.levels(),
            vec![NotifyLevel::Opportunity, NotifyLevel::Opportunity]
        );
    }

    #[tokio::test]
    async fn insufficient_history_skips_without_executing() {
        let dir = tempfile::tempdir().unwrap();
        let market = StubMarket::new()
            .with_series("BTC", falling_series("BTC", 10, 50_000.0))
            .with_series("ETH", falling_series("ETH", 5, 3_000.0));
        let h = harness(market, vec![], &dir);

        let outcomes = h.engine.run_cycle().await;

        for (_, outcome) in &outcomes {
            assert!(matches!(outcome, AssetOutcome::NoOpportunity { rsi: None, .. }));
        }
        assert_eq!(h.executor.call_count(), 0);
        assert_eq!(h.sink.levels(), vec![NotifyLevel::Info, NotifyLevel::Info]);
    }

    #[tokio::test]
    async fn overbought_market_yields_no_opportunity() {
        let dir = tempfile::tempdir().unwrap();
        let market = StubMarket::new()
            .with_series("BTC", rising_series("BTC", 20, 50_000.0))
            .with_series("ETH", rising_series("ETH", 20, 3_000.0));
        let h = harness(market, vec![], &dir);

        let outcomes = h.engine.run_cycle().await;

        for (_, outcome) in &outcomes {
            match outcome {
                AssetOutcome::NoOpportunity { rsi: Some(rsi), .. } => assert_eq!(*rsi, 100.0),
                other => panic!("expected no-opportunity, got {:?}", other),
            }
        }
        assert_eq!(h.executor.call_count(), 0);
        assert!(h.ledger.read().await.is_empty());
    }

    #[tokio::test]
    async fn one_failing_feed_does_not_abort_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let market = StubMarket::new()
            .with_failure("BTC")
            .with_series("ETH", falling_series("ETH", 20, 3_000.0));
        let h = harness(market, vec![], &dir);

        let outcomes = h.engine.run_cycle().await;

        assert!(matches!(outcomes[0].1, AssetOutcome::DataUnavailable { .. }));
        assert!(matches!(outcomes[1].1, AssetOutcome::Executed { .. }));
        // ETH still trades its 30% split of the tightest bracket
        assert_eq!(h.executor.calls(), vec![("ETH".to_string(), 12.0)]);
        assert_eq!(h.sink.levels(), vec![NotifyLevel::Warning, NotifyLevel::Trade]);
    }

    #[tokio::test]
    async fn transient_network_failures_are_retried_until_fill() {
        let dir = tempfile::tempdir().unwrap();
        let market =
            StubMarket::new().with_series("BTC", falling_series("BTC", 20, 50_000.0));
        let script = vec![
            ExecutionResult::NetworkFailure {
                cause: "timeout".to_string(),
            },
            ExecutionResult::NetworkFailure {
                cause: "timeout".to_string(),
            },
            ExecutionResult::Filled {
                price: 49_000.0,
                quantity: 28.0 / 49_000.0,
            },
        ];

        let mut h = harness(market, script, &dir);
        h.engine.settings.assets.truncate(1);

        let outcomes = h.engine.run_cycle().await;

        assert!(matches!(outcomes[0].1, AssetOutcome::Executed { .. }));
        assert_eq!(h.executor.call_count(), 3);
        assert_eq!(h.ledger.read().await.len(), 1);
        assert_eq!(h.sink.levels(), vec![NotifyLevel::Trade]);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_without_ledger_write() {
        let dir = tempfile::tempdir().unwrap();
        let market =
            StubMarket::new().with_series("BTC", falling_series("BTC", 20, 50_000.0));
        let script = (0..10)
            .map(|_| ExecutionResult::NetworkFailure {
                cause: "unreachable".to_string(),
            })
            .collect();

        let mut h = harness(market, script, &dir);
        h.engine.settings.assets.truncate(1);

        let outcomes = h.engine.run_cycle().await;

        assert!(matches!(outcomes[0].1, AssetOutcome::Failed { .. }));
        // initial attempt plus max_retries
        assert_eq!(h.executor.call_count(), 1 + settings().max_retries as usize);
        assert!(h.ledger.read().await.is_empty());
        assert_eq!(h.sink.levels(), vec![NotifyLevel::Error]);
    }

    #[tokio::test]
    async fn venue_rejection_is_final_and_warned() {
        let dir = tempfile::tempdir().unwrap();
        let market =
            StubMarket::new().with_series("BTC", falling_series("BTC", 20, 50_000.0));
        let script = vec![ExecutionResult::Rejected {
            reason: "insufficient balance".to_string(),
        }];

        let mut h = harness(market, script, &dir);
        h.engine.settings.assets.truncate(1);

        let outcomes = h.engine.run_cycle().await;

        assert!(matches!(outcomes[0].1, AssetOutcome::Rejected { .. }));
        assert_eq!(h.executor.call_count(), 1); // no retry on rejection
        assert!(h.ledger.read().await.is_empty());
        assert_eq!(h.sink.levels(), vec![NotifyLevel::Warning]);
    }

    #[tokio::test]
    async fn ledger_write_failure_is_an_error_not_a_trade() {
        let dir = tempfile::tempdir().unwrap();
        // a ledger whose parent directory does not exist: loads empty,
        // every append fails
        let ledger = Arc::new(RwLock::new(
            Ledger::load(dir.path().join("missing").join("trades.json")).unwrap(),
        ));

        let executor = ScriptedExecutor::new(vec![]);
        let sink = CapturingSink::default();
        let market =
            StubMarket::new().with_series("BTC", falling_series("BTC", 20, 50_000.0));

        let mut s = settings();
        s.assets.truncate(1);
        let engine = DcaEngine::new(
            s,
            Arc::new(market),
            Box::new(executor.clone()),
            Arc::new(sink.clone()),
            ledger.clone(),
            PriceBook::new(),
        );

        let outcomes = engine.run_cycle().await;

        assert!(matches!(outcomes[0].1, AssetOutcome::Failed { .. }));
        assert!(ledger.read().await.is_empty());
        assert_eq!(sink.levels(), vec![NotifyLevel::Error]);
    }

    #[tokio::test]
    async fn simulated_executor_fills_from_the_fetched_price() {
        let dir = tempfile::tempdir().unwrap();
        let series = falling_series("BTC", 20, 50_000.0);
        let last_close = series.last().unwrap().close;
        let market = StubMarket::new().with_series("BTC", series);

        let book = PriceBook::new();
        let sink = CapturingSink::default();
        let ledger = load_ledger(&dir);

        let mut s = settings();
        s.assets.truncate(1);
        let engine = DcaEngine::new(
            s,
            Arc::new(market),
            Box::new(SimulatedExecutor::new(book.clone())),
            Arc::new(sink.clone()),
            ledger.clone(),
            book,
        );

        let outcomes = engine.run_cycle().await;

        match &outcomes[0].1 {
            AssetOutcome::Executed { record } => {
                assert_eq!(record.price, last_close);
                assert_eq!(record.mode, TradeMode::Simulated);
                assert!((record.quantity - 28.0 / last_close).abs() < 1e-12);
            }
            other => panic!("expected execution, got {:?}", other),
        }
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn every_asset_outcome_produces_exactly_one_event() {
        let dir = tempfile::tempdir().unwrap();
        let market = StubMarket::new()
            .with_failure("BTC")
            .with_series("ETH", rising_series("ETH", 20, 3_000.0));
        let h = harness(market, vec![], &dir);

        let outcomes = h.engine.run_cycle().await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(h.sink.count(), outcomes.len());
    }
}
