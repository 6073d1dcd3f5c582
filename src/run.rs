//! Bot lifecycle: initialization, the evaluation loop, graceful shutdown.

use crate::arguments;
use crate::config;
use crate::engine::{DcaEngine, EngineSettings};
use crate::exchange::{BinanceClient, MarketData};
use crate::executor;
use crate::ledger::Ledger;
use crate::logger::{self, LogTag};
use crate::notifications::{EventSink, Notification, WebhookNotifier};
use crate::paths;
use crate::scheduler;
use crate::shutdown;
use crate::types::{PriceBook, TradeMode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Full bot run: load and validate configuration, wire the components,
/// drive the scheduler until shutdown, then say goodbye.
pub async fn run_bot() -> Result<(), String> {
    // 1. Configuration
    let config_path = arguments::get_config_override()
        .unwrap_or_else(|| paths::get_config_path().to_string_lossy().into_owned());

    if !config::is_config_initialized() {
        config::load_config_from_path(&config_path)?;
    }

    let mut cfg = config::get_config_clone();

    if arguments::is_simulate_forced() && cfg.mode != TradeMode::Simulated {
        logger::warning(
            LogTag::System,
            "--simulate flag set: overriding configured mode, no orders will leave this machine",
        );
        cfg.mode = TradeMode::Simulated;
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            logger::error(LogTag::Config, error);
        }
        return Err(format!("configuration invalid ({} problems)", errors.len()));
    }

    logger::info(
        LogTag::Config,
        &format!(
            "configuration loaded: mode={} assets={} interval={}s",
            cfg.mode,
            cfg.dca.assets.len(),
            cfg.dca.check_interval_secs
        ),
    );

    // 2. Ledger
    let ledger_path = if cfg.ledger_file.is_empty() {
        paths::get_ledger_path()
    } else {
        PathBuf::from(&cfg.ledger_file)
    };

    let ledger =
        Ledger::load(&ledger_path).map_err(|e| format!("failed to load ledger: {:#}", e))?;
    logger::info(
        LogTag::Ledger,
        &format!(
            "ledger loaded: {} trades, {:.2} deployed ({})",
            ledger.len(),
            ledger.total_deployed(),
            ledger_path.display()
        ),
    );
    let ledger = Arc::new(RwLock::new(ledger));

    // 3. Market data feed. Price history always comes from the public live
    // endpoint: simulated and paper runs decide on real market conditions.
    let timeout = Duration::from_secs(cfg.exchange.request_timeout_secs);
    let market: Arc<dyn MarketData> = Arc::new(
        BinanceClient::new(
            &cfg.exchange.live_url,
            &cfg.exchange.quote_currency,
            &cfg.dca.timeframe,
            timeout,
        )
        .map_err(|e| format!("failed to build market data client: {}", e))?,
    );

    // 4. Executor for the configured mode
    let price_book = PriceBook::new();
    let trade_executor = executor::build_executor(&cfg, price_book.clone())
        .map_err(|e| format!("failed to build executor: {}", e))?;
    logger::info(
        LogTag::Executor,
        &format!("executor ready ({} mode)", trade_executor.mode()),
    );

    // 5. Notifications
    let events: Arc<dyn EventSink> = Arc::new(
        WebhookNotifier::from_config(&cfg)
            .map_err(|e| format!("failed to build notifier: {}", e))?,
    );

    // 6. Shutdown handling
    shutdown::install_shutdown_handlers()
        .map_err(|e| format!("failed to install shutdown handlers: {}", e))?;

    // 7. Decision engine
    let engine = Arc::new(DcaEngine::new(
        EngineSettings::from_config(&cfg),
        market,
        trade_executor,
        events.clone(),
        ledger.clone(),
        price_book,
    ));

    // 8. Announce and run
    let asset_summary = cfg
        .dca
        .assets
        .iter()
        .map(|a| format!("{} {:.0}%", a.symbol, a.weight * 100.0))
        .collect::<Vec<_>>()
        .join(" / ");

    events
        .send(Notification::BotStarted {
            mode: cfg.mode,
            asset_summary,
            check_interval_secs: cfg.dca.check_interval_secs,
        })
        .await;

    let report_task = tokio::spawn(scheduler::run_daily_report_loop(
        ledger.clone(),
        events.clone(),
        cfg.notifications.daily_report_hour,
    ));

    if cfg.dca.enabled {
        let interval = Duration::from_secs(config::with_config(|c| c.dca.check_interval_secs));
        scheduler::run_dca_loop(engine, interval).await;
    } else {
        logger::warning(
            LogTag::System,
            "DCA strategy disabled in config - idling until shutdown",
        );
        while !shutdown::sleep_interruptible(Duration::from_secs(1)).await {}
    }

    // 9. Graceful exit: make sure the report loop winds down too
    shutdown::request_shutdown();
    let _ = report_task.await;

    events
        .send(Notification::BotStopped {
            reason: "shutdown requested".to_string(),
        })
        .await;

    logger::info(LogTag::System, "shut down cleanly");
    Ok(())
}
