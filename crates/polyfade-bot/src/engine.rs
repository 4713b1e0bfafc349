//! The decision engine.
//!
//! A single-consumer event loop: price ticks, settlement pushes, and rebuy
//! timers all arrive as `EngineEvent`s on one channel, and a fixed-interval
//! control tick re-checks risk exits and emits status lines. All shared
//! mutable state sits behind one mutex; decisions are made and committed
//! under that lock, while order submission happens outside it with an
//! entry-in-flight marker preventing a second concurrent entry.
//!
//! Tick pipeline order is fixed: risk exit, then the priority
//! initial-inventory buy, then saved-target checks, then the spike-fade
//! entry. No failure is allowed to escape the tick path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use polyfade_core::{OrderSide, Price, TokenId, Usd};
use polyfade_detector::SpikeDetector;
use polyfade_executor::{OrderExecutor, OrderOutcome, OrderRequest};
use polyfade_feed::{PriceHistory, PriceSample, PriceSource};
use polyfade_persistence::{BotState, LoadOutcome, StateStore};
use polyfade_position::{
    Position, RebuyPolicy, TargetAction, TargetReason, TargetTracker, TradeTarget,
};
use polyfade_risk::{ExitEvaluator, TradingHaltLatch};
use polyfade_settlement::{SettlementEvent, SettlementStatus, SettlementTracker};
use polyfade_telemetry::SessionStats;

use crate::config::AppConfig;
use crate::error::AppResult;

/// Channel capacity for engine events.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Events consumed by the decision loop.
#[derive(Debug)]
pub enum EngineEvent {
    /// A new price observation from the stream or backup source.
    Tick {
        /// The observed price.
        price: Price,
    },
    /// Settlement push from the venue's user channel.
    Settlement(SettlementEvent),
    /// An immediate-rebuy delay elapsed; re-enter at the current price.
    RebuyDue,
}

/// Snapshot of engine state for status queries and tests.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    /// Most recent observed price.
    pub last_price: Option<Price>,
    /// The open position, if any.
    pub position: Option<Position>,
    /// The live (non-triggered) target, if any.
    pub current_target: Option<TradeTarget>,
    /// Whether the priority first buy has completed.
    pub initial_inventory_acquired: bool,
    /// Whether the halt latch is tripped.
    pub halted: bool,
    /// Session counters.
    pub stats: SessionStats,
}

/// Shared mutable state, guarded by a single mutex.
struct EngineState {
    history: PriceHistory,
    position: Option<Position>,
    targets: TargetTracker,
    last_price: Option<Price>,
    last_signal_time: Option<DateTime<Utc>>,
    last_exit_time: Option<DateTime<Utc>>,
    initial_inventory_acquired: bool,
    entry_in_flight: bool,
    stats: SessionStats,
}

/// Decision taken by a tick, executed after the lock is released.
enum TickAction {
    None,
    RiskExit(String),
    TargetSell,
    TargetBuy,
    InitialBuy,
    FadeEntry(OrderSide, String),
}

/// The monitoring-and-decision engine for one outcome token.
pub struct Engine {
    config: AppConfig,
    token: TokenId,
    state: Mutex<EngineState>,
    detector: SpikeDetector,
    exits: ExitEvaluator,
    rebuy: RebuyPolicy,
    halt: Arc<TradingHaltLatch>,
    settlement: Arc<SettlementTracker>,
    executor: Arc<dyn OrderExecutor>,
    store: StateStore,
    price_source: Option<Arc<dyn PriceSource>>,
    events_tx: mpsc::Sender<EngineEvent>,
}

impl Engine {
    /// Create an engine, restoring any persisted state for the configured
    /// token.
    ///
    /// Returns the engine plus the sender/receiver pair for its event
    /// channel; hand the receiver to [`Engine::run`] and clone the sender
    /// into feed bridges.
    pub fn new(
        config: AppConfig,
        executor: Arc<dyn OrderExecutor>,
        price_source: Option<Arc<dyn PriceSource>>,
    ) -> AppResult<(
        Arc<Self>,
        mpsc::Sender<EngineEvent>,
        mpsc::Receiver<EngineEvent>,
    )> {
        config.validate()?;

        let token = TokenId::new(config.token_id.clone());
        let store = StateStore::new(config.state_file.clone());

        let mut state = EngineState {
            history: PriceHistory::new(config.price_history_size),
            position: None,
            targets: TargetTracker::new(),
            last_price: None,
            last_signal_time: None,
            last_exit_time: None,
            initial_inventory_acquired: false,
            entry_in_flight: false,
            stats: SessionStats::default(),
        };

        match store.load(&token)? {
            LoadOutcome::Restored(saved) => {
                state.position = saved.open_position;
                state.targets.restore(saved.current_target);
                state.initial_inventory_acquired = saved.initial_inventory_acquired;
                state.stats.realized_pnl = saved.realized_pnl;
                state.stats.total_trades = saved.total_trades;
                state.stats.winning_trades = saved.winning_trades;
            }
            LoadOutcome::Fresh => {}
        }

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Arc::new(Self {
            detector: SpikeDetector::new(config.detector.clone()),
            exits: ExitEvaluator::new(config.risk.clone()),
            rebuy: config.rebuy.policy(),
            halt: Arc::new(TradingHaltLatch::new()),
            settlement: Arc::new(SettlementTracker::new()),
            executor,
            store,
            price_source,
            events_tx: events_tx.clone(),
            state: Mutex::new(state),
            token,
            config,
        });

        Ok((engine, events_tx, events_rx))
    }

    /// The halt latch, for operator inspection and reset.
    pub fn halt_latch(&self) -> &Arc<TradingHaltLatch> {
        &self.halt
    }

    /// The settlement tracker shared with fallback timers.
    pub fn settlement_tracker(&self) -> &Arc<SettlementTracker> {
        &self.settlement
    }

    /// Consistent snapshot of the engine state.
    pub fn status(&self) -> EngineStatus {
        let st = self.state.lock();
        EngineStatus {
            last_price: st.last_price,
            position: st.position.clone(),
            current_target: st.targets.current().cloned(),
            initial_inventory_acquired: st.initial_inventory_acquired,
            halted: self.halt.is_halted(),
            stats: st.stats.clone(),
        }
    }

    /// Run the decision loop until the channel closes or `shutdown` fires.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<EngineEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            token = %self.token.short(),
            dry_run = self.config.dry_run,
            spike_threshold_pct = %self.config.detector.spike_threshold_pct,
            take_profit_pct = %self.config.risk.take_profit_pct,
            stop_loss_pct = %self.config.risk.stop_loss_pct,
            max_hold_seconds = self.config.risk.max_hold_seconds,
            rebuy = ?self.rebuy,
            "Engine starting"
        );

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.control_interval_seconds.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut iteration: u64 = 0;
        let rest_every = (self.config.rest_poll_interval_seconds
            / self.config.control_interval_seconds.max(1))
        .max(1);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping engine");
                        break;
                    }
                }
                event = events.recv() => {
                    match event {
                        Some(event) => self.process_event(event).await,
                        None => {
                            info!("Event channel closed, stopping engine");
                            break;
                        }
                    }
                }
                _ = interval.tick() => {
                    iteration += 1;
                    self.control_tick(iteration, iteration % rest_every == 0).await;
                }
            }
        }

        self.persist();
    }

    /// Dispatch one event. Never panics; failures are logged and absorbed
    /// so the ingestion path cannot die.
    pub async fn process_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::Tick { price } => self.handle_tick(price).await,
            EngineEvent::Settlement(event) => self.handle_settlement(event),
            EngineEvent::RebuyDue => self.handle_rebuy_due().await,
        }
    }

    // ========================================================================
    // Tick handling
    // ========================================================================

    async fn handle_tick(&self, price: Price) {
        if !price.is_positive() {
            debug!(%price, "Ignoring non-positive price");
            return;
        }
        let now = Utc::now();

        let action = {
            let mut st = self.state.lock();
            st.stats.prices_seen += 1;
            st.last_price = Some(price);
            st.history.push(PriceSample::new(now, price));

            let (spike_pct, spike_stats) = self.detector.compute(price, &st.history, now);

            if st.stats.prices_seen % 100 == 0 {
                info!(
                    %price,
                    spike_pct = %spike_pct,
                    history = st.history.len(),
                    volatility_cv = %spike_stats.volatility_cv,
                    "Tick"
                );
            }

            self.decide(&mut st, price, spike_pct, &spike_stats, now)
        };

        match action {
            TickAction::None => {}
            TickAction::RiskExit(reason) => {
                self.attempt_exit(&reason, price, false).await;
            }
            TickAction::TargetSell => {
                self.attempt_exit("target_hit", price, true).await;
            }
            TickAction::InitialBuy => {
                self.attempt_entry(OrderSide::Buy, price, "initial_inventory", false)
                    .await;
            }
            TickAction::TargetBuy => {
                self.attempt_entry(OrderSide::Buy, price, "target_hit", true)
                    .await;
            }
            TickAction::FadeEntry(side, reason) => {
                self.attempt_entry(side, price, &reason, false).await;
            }
        }
    }

    /// Decide what this tick should do. Runs entirely under the state lock.
    fn decide(
        &self,
        st: &mut EngineState,
        price: Price,
        spike_pct: Decimal,
        spike_stats: &polyfade_detector::SpikeStats,
        now: DateTime<Utc>,
    ) -> TickAction {
        // Risk exits always come first.
        if let Some(pos) = &st.position {
            if let Some(reason) = self.exits.check(pos, price, now) {
                return TickAction::RiskExit(reason.to_string());
            }
            // A live sell target closes the position when crossed.
            if let Some(target) = st.targets.current() {
                if target.action == TargetAction::Sell && target.is_satisfied_by(price) {
                    return TickAction::TargetSell;
                }
            }
            return TickAction::None;
        }

        if st.entry_in_flight || self.halt.is_halted() {
            return TickAction::None;
        }

        // Priority transition: force the first buy before any target or
        // spike logic, once cooldowns permit.
        if !st.initial_inventory_acquired && self.cooldown_ok(st, now) {
            return TickAction::InitialBuy;
        }

        // Saved buy target (wait-for-drop rebuy and restored cycles).
        if let Some(target) = st.targets.current() {
            if target.action == TargetAction::Buy
                && target.is_satisfied_by(price)
                && self.settlement_delay_ok(st, now)
            {
                return TickAction::TargetBuy;
            }
        }

        // Spike-fade override. Disabled under the immediate rebuy policy to
        // avoid colliding with the buy/sell/rebuy cycle.
        if self.rebuy.is_immediate() {
            return TickAction::None;
        }
        if !self.cooldown_ok(st, now) {
            return TickAction::None;
        }

        let threshold = self.config.detector.spike_threshold_pct;
        if spike_pct.abs() < threshold {
            return TickAction::None;
        }
        st.stats.spikes_detected += 1;

        if spike_stats.volatility_filtered {
            info!(
                spike_pct = %spike_pct,
                reason = spike_stats
                    .volatility_reason
                    .as_deref()
                    .unwrap_or("high CV"),
                "Spike ignored: volatility filtered"
            );
            return TickAction::None;
        }
        if spike_pct.abs() < self.config.detector.min_spike_strength {
            return TickAction::None;
        }

        // Fade: sell into the pump, buy into the dump.
        let (side, direction) = if spike_pct > Decimal::ZERO {
            (OrderSide::Sell, "up")
        } else {
            (OrderSide::Buy, "down")
        };
        let reason = format!(
            "spike_{direction}_{:.2}%_window_{}s",
            spike_pct.abs(),
            spike_stats.window_seconds.unwrap_or(0)
        );
        TickAction::FadeEntry(side, reason)
    }

    fn cooldown_ok(&self, st: &EngineState, now: DateTime<Utc>) -> bool {
        if let Some(last) = st.last_signal_time {
            if (now - last).num_seconds() < self.config.cooldown_seconds {
                return false;
            }
        }
        self.settlement_delay_ok(st, now)
    }

    /// Balance/allowance state is stale right after an exit; hold off.
    fn settlement_delay_ok(&self, st: &EngineState, now: DateTime<Utc>) -> bool {
        if let Some(last_exit) = st.last_exit_time {
            let elapsed = (now - last_exit).num_milliseconds() as f64 / 1000.0;
            if elapsed < self.config.settlement_delay_seconds {
                return false;
            }
        }
        true
    }

    // ========================================================================
    // Entry / exit execution
    // ========================================================================

    /// Submit an entry order and commit the result.
    ///
    /// The entry-in-flight marker is set under the lock before the
    /// executor call so no second entry can start while this one is
    /// outstanding. On failure nothing changes: no cooldown, no target,
    /// no position.
    async fn attempt_entry(
        &self,
        side: OrderSide,
        price: Price,
        reason: &str,
        consume_target: bool,
    ) -> bool {
        {
            let mut st = self.state.lock();
            if st.position.is_some() || st.entry_in_flight || self.halt.is_halted() {
                return false;
            }
            st.entry_in_flight = true;
        }

        let amount = Usd::new(self.config.default_trade_size_usd);
        info!(%side, %amount, %price, reason, "Attempting entry");

        let outcome = self
            .executor
            .place_market_order(OrderRequest::new(self.token.clone(), side, amount))
            .await;

        let filled_order = {
            let mut st = self.state.lock();
            st.entry_in_flight = false;
            match outcome {
                OrderOutcome::Filled(fill) => {
                    let entry_price = fill.fill_price.unwrap_or(price);
                    let now = Utc::now();

                    if consume_target {
                        st.targets.check(price);
                    }

                    st.position = Some(Position::open(
                        side,
                        entry_price,
                        now,
                        amount,
                        Some(fill.order_id.clone()),
                    ));
                    st.last_signal_time = Some(now);

                    if side == OrderSide::Buy {
                        st.initial_inventory_acquired = true;
                        st.targets.set(TradeTarget::sell_above(
                            entry_price,
                            self.config.risk.take_profit_pct,
                            TargetReason::AfterBuy,
                        ));
                    }

                    info!(
                        %side,
                        entry_price = %entry_price,
                        order_id = %fill.order_id.short(),
                        reason,
                        "Position opened"
                    );
                    Some(fill.order_id)
                }
                OrderOutcome::Failed(failure) => {
                    warn!(
                        reason_code = %failure.kind,
                        detail = %failure.detail,
                        "Entry skipped, state unchanged"
                    );
                    None
                }
            }
        };

        match filled_order {
            Some(order_id) => {
                self.settlement.register(order_id.clone());
                self.settlement.start_fallback_timer(
                    order_id,
                    Duration::from_secs_f64(self.config.settlement_timeout_seconds.max(0.0)),
                );
                self.persist();
                true
            }
            None => false,
        }
    }

    /// Submit an exit order and commit the result.
    ///
    /// Deferred (not abandoned) while the entry trade is unsettled or the
    /// sellable balance is not positive; the next tick retries. On a
    /// committed exit the rebuy policy runs, strictly after the commit.
    async fn attempt_exit(&self, reason: &str, price: Price, from_target: bool) -> bool {
        let (exit_side, amount, entry_order) = {
            let mut st = self.state.lock();
            let Some(pos) = st.position.as_mut() else {
                return false;
            };

            if pos.pending_settlement {
                // The fallback timer resolves the tracker independently;
                // pick the flip up here if it has fired.
                let settled = pos
                    .entry_order_id
                    .as_ref()
                    .map(|oid| self.settlement.is_settled(oid))
                    .unwrap_or(true);
                if settled {
                    pos.pending_settlement = false;
                } else {
                    warn!(reason, "Exit deferred: entry trade not settled yet");
                    return false;
                }
            }

            (
                pos.side.opposite(),
                pos.amount_usd,
                pos.entry_order_id.clone(),
            )
        };

        // Selling needs transactable shares; check outside the lock.
        if exit_side == OrderSide::Sell {
            let balance = self.executor.token_balance(&self.token).await;
            if balance <= Decimal::ZERO {
                warn!(reason, %balance, "Exit deferred: token balance not positive");
                return false;
            }
        }

        info!(reason, side = %exit_side, %price, "Attempting exit");

        let outcome = self
            .executor
            .place_market_order(OrderRequest::new(self.token.clone(), exit_side, amount))
            .await;

        let (committed, halt_reason) = {
            let mut st = self.state.lock();
            match outcome {
                OrderOutcome::Filled(fill) => {
                    let Some(pos) = st.position.take() else {
                        return false;
                    };
                    let exit_price = fill.fill_price.unwrap_or(price);
                    let now = Utc::now();

                    if let Some(pnl) = pos.pnl(exit_price) {
                        st.stats.record_round_trip(pnl.usd);
                        info!(
                            reason,
                            side = %exit_side,
                            exit_price = %exit_price,
                            pnl_pct = %pnl.pct,
                            pnl_usd = %pnl.usd,
                            held_seconds = pos.held_seconds(now),
                            order_id = %fill.order_id.short(),
                            "Position closed"
                        );
                    }

                    if from_target {
                        st.targets.check(price);
                    }

                    st.last_exit_time = Some(now);
                    st.last_signal_time = Some(now);

                    let halt_reason = self
                        .config
                        .limits
                        .breach(Usd::new(st.stats.realized_pnl), st.stats.total_trades);

                    // Rebuy is sequenced strictly after the exit commit.
                    if halt_reason.is_none() {
                        if let RebuyPolicy::WaitForDrop { drop_pct } = self.rebuy {
                            st.targets.set(TradeTarget::buy_below(
                                exit_price,
                                drop_pct,
                                TargetReason::RebuyDrop,
                            ));
                        }
                    }

                    (true, halt_reason)
                }
                OrderOutcome::Failed(failure) => {
                    warn!(
                        reason_code = %failure.kind,
                        detail = %failure.detail,
                        "Exit order failed, will retry on a later tick"
                    );
                    (false, None)
                }
            }
        };

        if !committed {
            return false;
        }

        if let Some(entry_order) = entry_order {
            self.settlement.cleanup(&entry_order);
        }

        match halt_reason {
            Some(halt_reason) => self.halt.trip(halt_reason),
            None => {
                if let RebuyPolicy::Immediate { delay_seconds } = self.rebuy {
                    self.schedule_rebuy(delay_seconds);
                }
            }
        }

        self.persist();
        true
    }

    fn schedule_rebuy(&self, delay_seconds: u64) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_seconds)).await;
            if tx.send(EngineEvent::RebuyDue).await.is_err() {
                debug!("Engine channel closed, dropping rebuy");
            }
        });
    }

    async fn handle_rebuy_due(&self) {
        let price = {
            let st = self.state.lock();
            if st.position.is_some() || st.entry_in_flight {
                debug!("Rebuy due but a position is already open or in flight");
                return;
            }
            st.last_price
        };
        let Some(price) = price else {
            warn!("Rebuy due but no price has been observed yet");
            return;
        };
        if self.halt.is_halted() {
            return;
        }
        self.attempt_entry(OrderSide::Buy, price, "rebuy_immediate", false)
            .await;
    }

    // ========================================================================
    // Settlement handling
    // ========================================================================

    fn handle_settlement(&self, event: SettlementEvent) {
        if event.is_terminal_success() {
            self.settlement
                .confirm(&event.order_id, SettlementStatus::Confirmed);
        } else if event.is_failure() {
            self.settlement
                .confirm(&event.order_id, SettlementStatus::Failed);
        } else {
            debug!(
                order_id = %event.order_id.short(),
                status = %event.status,
                "Non-terminal settlement status"
            );
            return;
        }

        let changed = {
            let mut st = self.state.lock();
            match st.position.as_mut() {
                Some(pos)
                    if pos.pending_settlement
                        && pos.entry_order_id.as_ref() == Some(&event.order_id)
                        && self.settlement.is_settled(&event.order_id) =>
                {
                    pos.pending_settlement = false;
                    true
                }
                _ => false,
            }
        };

        if changed {
            info!(order_id = %event.order_id.short(), "Entry settled, exits unblocked");
            self.persist();
        }
    }

    // ========================================================================
    // Control loop
    // ========================================================================

    async fn control_tick(&self, iteration: u64, rest_poll_due: bool) {
        if rest_poll_due {
            if let Some(source) = &self.price_source {
                match source.get_price().await {
                    Ok(price) => {
                        debug!(%price, "Backup price sample");
                        self.handle_tick(price).await;
                    }
                    Err(e) => warn!(error = %e, "Backup price fetch failed"),
                }
            }
        } else {
            // Re-check risk exits even when the stream is quiet.
            let due = {
                let st = self.state.lock();
                match (&st.position, st.last_price) {
                    (Some(pos), Some(price)) => self
                        .exits
                        .check(pos, price, Utc::now())
                        .map(|reason| (reason.to_string(), price)),
                    _ => None,
                }
            };
            if let Some((reason, price)) = due {
                self.attempt_exit(&reason, price, false).await;
            }
        }

        if iteration % self.config.status_log_iterations.max(1) == 0 {
            self.log_status();
        }
    }

    fn log_status(&self) {
        let st = self.state.lock();
        st.stats.log_summary();

        match (&st.position, st.last_price) {
            (Some(pos), Some(price)) => {
                if let Some(pnl) = pos.pnl(price) {
                    info!(
                        side = %pos.side,
                        entry_price = %pos.entry_price,
                        current_price = %price,
                        pnl_pct = %pnl.pct,
                        pending_settlement = pos.pending_settlement,
                        held_seconds = pos.held_seconds(Utc::now()),
                        "Open position"
                    );
                }
            }
            _ => {
                if let (Some(target), Some(price)) = (st.targets.current(), st.last_price) {
                    info!(
                        action = %target.action,
                        target_price = %target.price,
                        distance_pct = %target.distance_pct(price),
                        "Waiting on target"
                    );
                }
            }
        }

        if self.halt.is_halted() {
            warn!(reason = ?self.halt.reason(), "Trading is halted");
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Best-effort snapshot write; failures are logged, never fatal.
    fn persist(&self) {
        let snapshot = {
            let st = self.state.lock();
            BotState {
                open_position: st.position.clone(),
                realized_pnl: st.stats.realized_pnl,
                total_trades: st.stats.total_trades,
                winning_trades: st.stats.winning_trades,
                initial_inventory_acquired: st.initial_inventory_acquired,
                instrument_id: self.token.clone(),
                current_target: st.targets.current().cloned(),
            }
        };

        if let Err(e) = self.store.save(&snapshot) {
            error!(error = %e, "Failed to persist state");
        }
    }
}

// ============================================================================
// Transport bridges
// ============================================================================

/// Bridge a streaming price feed into the engine's event channel.
///
/// The returned task runs until the feed or the engine channel closes, then
/// disconnects the feed.
pub fn spawn_price_feed_bridge(
    feed: Arc<dyn polyfade_feed::PriceFeed>,
    events_tx: mpsc::Sender<EngineEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let (price_tx, mut price_rx) = mpsc::channel::<Price>(256);
        if let Err(e) = feed.subscribe(price_tx).await {
            warn!(error = %e, "Price feed subscription failed");
            return;
        }
        while let Some(price) = price_rx.recv().await {
            if events_tx.send(EngineEvent::Tick { price }).await.is_err() {
                break;
            }
        }
        if let Err(e) = feed.disconnect().await {
            debug!(error = %e, "Price feed disconnect failed");
        }
    })
}

/// Bridge the venue's settlement push channel into the engine's event
/// channel.
pub fn spawn_settlement_bridge(
    channel: Arc<dyn polyfade_settlement::SettlementChannel>,
    events_tx: mpsc::Sender<EngineEvent>,
) -> tokio::task::JoinHandle<()> {
    let (push_tx, mut push_rx) = mpsc::channel::<SettlementEvent>(64);
    channel.subscribe(push_tx);
    tokio::spawn(async move {
        while let Some(event) = push_rx.recv().await {
            if events_tx
                .send(EngineEvent::Settlement(event))
                .await
                .is_err()
            {
                break;
            }
        }
    })
}
