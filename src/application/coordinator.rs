use crate::domain::chart::{ChartBackend, RangeToken};
use crate::domain::indicators::{IndicatorFlags, IndicatorKind};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{HistoryPeriod, MarketDataRepository, Ticker};
use crate::log_info;

use super::chart_session::{ChartSessionController, LoadOutcome, SessionPhase};
use super::overlay_manager::{OverlayBinding, OverlayManager};

/// Owns the detail chart session and its overlays.
///
/// Overlays are detached before the session tears its chart down and are
/// attached again only once the new chart is rendered.
pub struct ChartCoordinator<R, B: ChartBackend> {
    session: ChartSessionController<R, B>,
    overlays: OverlayManager<R, B>,
}

impl<R, B: ChartBackend> Clone for ChartCoordinator<R, B> {
    fn clone(&self) -> Self {
        Self { session: self.session.clone(), overlays: self.overlays.clone() }
    }
}

impl<R: MarketDataRepository, B: ChartBackend> ChartCoordinator<R, B> {
    pub fn new(session: ChartSessionController<R, B>, overlays: OverlayManager<R, B>) -> Self {
        log_info!(LogComponent::Application("ChartCoordinator"), "Creating detail chart coordinator");
        Self { session, overlays }
    }

    pub fn session(&self) -> &ChartSessionController<R, B> {
        &self.session
    }

    pub fn overlays(&self) -> &OverlayManager<R, B> {
        &self.overlays
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn indicator_flags(&self) -> IndicatorFlags {
        self.overlays.flags()
    }

    pub async fn select_instrument(&self, ticker: Ticker) -> LoadOutcome {
        self.overlays.detach();
        let outcome = self.session.select_instrument(ticker).await;
        self.reattach(&outcome).await;
        outcome
    }

    pub async fn set_period(&self, period: HistoryPeriod) -> LoadOutcome {
        self.overlays.detach();
        let outcome = self.session.set_period(period).await;
        self.reattach(&outcome).await;
        outcome
    }

    pub async fn retry(&self) -> LoadOutcome {
        self.overlays.detach();
        let outcome = self.session.retry().await;
        self.reattach(&outcome).await;
        outcome
    }

    /// Re-filter in place; overlays keep their own timestamps
    pub fn set_range(&self, range: RangeToken) {
        self.session.set_range(range);
    }

    pub async fn toggle_indicator(&self, kind: IndicatorKind) -> bool {
        self.overlays.toggle(kind).await
    }

    pub fn teardown(&self) {
        self.overlays.detach();
        self.session.teardown();
    }

    async fn reattach(&self, outcome: &LoadOutcome) {
        let LoadOutcome::Rendered(stamp) = outcome else {
            return;
        };
        let Some(chart) = self.session.chart() else {
            return;
        };
        self.overlays
            .attach(OverlayBinding::new(stamp.ticker().clone(), stamp.period(), chart))
            .await;
    }
}
