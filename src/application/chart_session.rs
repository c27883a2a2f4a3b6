//! Lifecycle of one chart bound to one instrument at a time.
//!
//! A selection tears the previous chart down, shows a loading placeholder and
//! stamps a request. Completions whose stamp is no longer current are
//! dropped, so the chart always shows the latest selection no matter in which
//! order the responses arrive.

use std::cell::RefCell;
use std::rc::Rc;

use derive_more::Display;

use crate::domain::chart::{
    ChartBackend, ChartLayout, ChartOptions, ContainerId, FilteredSeries, PaneSize, Placeholder,
    RangeToken, SeriesData, filter_history,
};
use crate::domain::errors::{RenderingError, RenderingResult, RepositoryResult};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{HistoryPeriod, MarketDataRepository, PriceHistory, Ticker};
use crate::{log_debug, log_info, log_warn};

const COMPONENT: LogComponent = LogComponent::Application("ChartSession");

/// Identity of one load: generation plus the `(ticker, period)` it targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStamp {
    generation: u64,
    ticker: Ticker,
    period: HistoryPeriod,
}

impl RequestStamp {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn period(&self) -> HistoryPeriod {
        self.period
    }

    /// Log context naming what the load asked for
    pub fn log_context(&self) -> String {
        format!("ticker={} period={}", self.ticker, self.period)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionPhase {
    #[display(fmt = "Idle")]
    Empty,
    #[display(fmt = "Loading")]
    Loading,
    #[display(fmt = "Rendered")]
    Rendered,
    #[display(fmt = "No data")]
    NoData,
    #[display(fmt = "Error: {}", _0)]
    Error(String),
}

impl SessionPhase {
    pub fn is_rendered(&self) -> bool {
        matches!(self, SessionPhase::Rendered)
    }
}

/// How a load ended, as seen by the caller that started it
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Rendered(RequestStamp),
    NoData,
    Failed(String),
    /// A newer selection started before this one completed
    Superseded,
    /// Nothing to reload
    NothingSelected,
}

/// Where and how a session draws
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub container: ContainerId,
    pub layout: ChartLayout,
    /// Fixed chart height; `None` follows the container
    pub fixed_height: Option<u32>,
    pub range: RangeToken,
    pub period: HistoryPeriod,
}

impl SessionSettings {
    pub fn summary(container: ContainerId) -> Self {
        Self {
            container,
            layout: ChartLayout::Summary,
            fixed_height: None,
            range: ChartLayout::Summary.default_range(),
            period: HistoryPeriod::default(),
        }
    }

    pub fn detail(container: ContainerId, height: u32) -> Self {
        Self {
            container,
            layout: ChartLayout::Detail,
            fixed_height: Some(height),
            range: ChartLayout::Detail.default_range(),
            period: HistoryPeriod::default(),
        }
    }

    pub fn with_range(mut self, range: RangeToken) -> Self {
        self.range = range;
        self
    }

    pub fn with_period(mut self, period: HistoryPeriod) -> Self {
        self.period = period;
        self
    }
}

/// Backend handles of the chart currently on screen
struct LiveChart<B: ChartBackend> {
    chart: B::Chart,
    candles: Option<B::Series>,
    volumes: Option<B::Series>,
    observer: Option<B::Observer>,
}

impl<B: ChartBackend> LiveChart<B> {
    fn new(chart: B::Chart) -> Self {
        Self { chart, candles: None, volumes: None, observer: None }
    }

    fn show(&self, backend: &B, series: &FilteredSeries) {
        if let Some(candles) = &self.candles {
            backend.set_series_data(candles, SeriesData::Candles(&series.bars));
        }
        if let Some(volumes) = &self.volumes {
            backend.set_series_data(volumes, SeriesData::Volumes(&series.volumes));
        }
        backend.fit_content(&self.chart);
    }

    /// Observer first, then series, then the chart itself
    fn release(mut self, backend: &B) {
        if let Some(observer) = self.observer.take() {
            backend.disconnect(observer);
        }
        if let Some(volumes) = self.volumes.take() {
            backend.remove_series(&self.chart, volumes);
        }
        if let Some(candles) = self.candles.take() {
            backend.remove_series(&self.chart, candles);
        }
        backend.remove_chart(self.chart);
    }
}

struct SessionState<B: ChartBackend> {
    settings: SessionSettings,
    phase: SessionPhase,
    ticker: Option<Ticker>,
    history: PriceHistory,
    generation: u64,
    pending: Option<RequestStamp>,
    live: Option<LiveChart<B>>,
}

/// Drives one chart container. Cloning yields another handle to the same
/// session, which is how async completions get back to it.
pub struct ChartSessionController<R, B: ChartBackend> {
    repository: Rc<R>,
    backend: Rc<B>,
    state: Rc<RefCell<SessionState<B>>>,
}

impl<R, B: ChartBackend> Clone for ChartSessionController<R, B> {
    fn clone(&self) -> Self {
        Self {
            repository: Rc::clone(&self.repository),
            backend: Rc::clone(&self.backend),
            state: Rc::clone(&self.state),
        }
    }
}

impl<R: MarketDataRepository, B: ChartBackend> ChartSessionController<R, B> {
    pub fn new(repository: Rc<R>, backend: Rc<B>, settings: SessionSettings) -> Self {
        get_logger().debug(
            COMPONENT,
            &format!("New {:?} session on {}", settings.layout, settings.container),
        );

        Self {
            repository,
            backend,
            state: Rc::new(RefCell::new(SessionState {
                settings,
                phase: SessionPhase::Empty,
                ticker: None,
                history: PriceHistory::default(),
                generation: 0,
                pending: None,
                live: None,
            })),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase.clone()
    }

    pub fn ticker(&self) -> Option<Ticker> {
        self.state.borrow().ticker.clone()
    }

    pub fn range(&self) -> RangeToken {
        self.state.borrow().settings.range
    }

    pub fn period(&self) -> HistoryPeriod {
        self.state.borrow().settings.period
    }

    pub fn layout(&self) -> ChartLayout {
        self.state.borrow().settings.layout
    }

    /// Handle of the live chart, if any
    pub fn chart(&self) -> Option<B::Chart> {
        self.state.borrow().live.as_ref().map(|live| live.chart.clone())
    }

    /// Number of bars currently resident (unfiltered)
    pub fn history_len(&self) -> usize {
        self.state.borrow().history.len()
    }

    /// Bind the chart to `ticker` and load its history with the active period
    pub async fn select_instrument(&self, ticker: Ticker) -> LoadOutcome {
        let period = self.period();
        self.load(ticker, period).await
    }

    /// Change the display window. Re-filters the resident history in place
    /// when a chart is live; never fetches.
    pub fn set_range(&self, range: RangeToken) {
        let mut state = self.state.borrow_mut();
        state.settings.range = range;

        if !state.phase.is_rendered() {
            return;
        }

        let filtered = filter_history(&state.history, range);
        log_debug!(COMPONENT, "Range {} keeps {} of {} bars", range, filtered.bars.len(), state.history.len());
        if let Some(live) = &state.live {
            live.show(&self.backend, &filtered);
        }
    }

    /// Change the fetch period and reload the current instrument with it
    pub async fn set_period(&self, period: HistoryPeriod) -> LoadOutcome {
        let ticker = {
            let mut state = self.state.borrow_mut();
            state.settings.period = period;
            state.ticker.clone()
        };

        match ticker {
            Some(ticker) => self.load(ticker, period).await,
            None => LoadOutcome::NothingSelected,
        }
    }

    /// Reload the current instrument
    pub async fn retry(&self) -> LoadOutcome {
        let target = {
            let state = self.state.borrow();
            state.ticker.clone().map(|ticker| (ticker, state.settings.period))
        };

        match target {
            Some((ticker, period)) => self.load(ticker, period).await,
            None => LoadOutcome::NothingSelected,
        }
    }

    /// Release every handle and return to `Empty`. Pending loads become stale.
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(live) = state.live.take() {
            live.release(&self.backend);
        }
        state.generation = state.generation.wrapping_add(1);
        state.pending = None;
        state.ticker = None;
        state.history = PriceHistory::default();
        state.phase = SessionPhase::Empty;
        self.backend.clear_container(&state.settings.container);
    }

    async fn load(&self, ticker: Ticker, period: HistoryPeriod) -> LoadOutcome {
        let stamp = self.begin_load(ticker, period);
        let result = self.repository.fetch_price_history(&stamp.ticker, stamp.period).await;
        self.complete_load(stamp, result)
    }

    fn begin_load(&self, ticker: Ticker, period: HistoryPeriod) -> RequestStamp {
        let mut state = self.state.borrow_mut();
        if let Some(live) = state.live.take() {
            live.release(&self.backend);
        }

        state.generation = state.generation.wrapping_add(1);
        let stamp = RequestStamp { generation: state.generation, ticker: ticker.clone(), period };
        state.pending = Some(stamp.clone());
        state.ticker = Some(ticker);
        state.history = PriceHistory::default();
        state.phase = SessionPhase::Loading;
        self.backend.show_placeholder(&state.settings.container, &Placeholder::Loading);

        log_debug!(COMPONENT, "Loading {} ({}) as generation {}", stamp.ticker, period, stamp.generation);
        stamp
    }

    fn complete_load(&self, stamp: RequestStamp, result: RepositoryResult<PriceHistory>) -> LoadOutcome {
        let mut state = self.state.borrow_mut();
        if state.pending.as_ref() != Some(&stamp) {
            log_debug!(
                COMPONENT,
                "Dropping stale response for {} (generation {})",
                stamp.ticker,
                stamp.generation
            );
            return LoadOutcome::Superseded;
        }
        state.pending = None;

        match result {
            Err(err) => {
                log_warn!(
                    COMPONENT,
                    context = stamp.log_context();
                    "Failed to load {}: {}",
                    stamp.ticker,
                    err
                );
                self.fail(&mut state, err.to_string())
            }
            Ok(history) if history.is_empty() => {
                log_info!(COMPONENT, "{} returned no candles", stamp.ticker);
                state.phase = SessionPhase::NoData;
                self.backend.show_placeholder(&state.settings.container, &Placeholder::NoData);
                LoadOutcome::NoData
            }
            Ok(history) => match self.mount(&state, &history) {
                Ok(live) => {
                    log_debug!(COMPONENT, "Rendered {} bars of {}", history.len(), stamp.ticker);
                    state.live = Some(live);
                    state.history = history;
                    state.phase = SessionPhase::Rendered;
                    LoadOutcome::Rendered(stamp)
                }
                Err(err) => {
                    log_warn!(
                        COMPONENT,
                        context = stamp.log_context();
                        "Failed to draw {}: {}",
                        stamp.ticker,
                        err
                    );
                    self.fail(&mut state, err.to_string())
                }
            },
        }
    }

    fn fail(&self, state: &mut SessionState<B>, message: String) -> LoadOutcome {
        self.backend
            .show_placeholder(&state.settings.container, &Placeholder::Error(message.clone()));
        state.phase = SessionPhase::Error(message.clone());
        LoadOutcome::Failed(message)
    }

    /// Create the chart and its series for `history`. Nothing is left behind
    /// on failure.
    fn mount(&self, state: &SessionState<B>, history: &PriceHistory) -> RenderingResult<LiveChart<B>> {
        let settings = &state.settings;
        let size = self
            .backend
            .container_size(&settings.container)
            .ok_or_else(|| RenderingError::ContainerNotFound(settings.container.as_str().to_string()))?
            .with_height(settings.fixed_height);

        self.backend.clear_container(&settings.container);
        let chart = self
            .backend
            .create_chart(&settings.container, &ChartOptions { surface: settings.layout.surface(), size })?;

        let mut live = LiveChart::new(chart);
        if let Err(err) = self.add_series(&mut live, settings.layout) {
            live.release(&self.backend);
            return Err(err);
        }

        live.show(&self.backend, &filter_history(history, settings.range));
        live.observer = self.observe(&settings.container, state.generation, settings.fixed_height);
        Ok(live)
    }

    fn add_series(&self, live: &mut LiveChart<B>, layout: ChartLayout) -> RenderingResult<()> {
        live.candles = Some(self.backend.add_series(&live.chart, layout.candle_style())?);
        if let Some(style) = layout.volume_style() {
            live.volumes = Some(self.backend.add_series(&live.chart, style)?);
        }
        Ok(())
    }

    /// Keep the chart sized to its container while `generation` is current
    fn observe(
        &self,
        container: &ContainerId,
        generation: u64,
        fixed_height: Option<u32>,
    ) -> Option<B::Observer> {
        let state = Rc::downgrade(&self.state);
        let backend = Rc::downgrade(&self.backend);

        let on_resize = Box::new(move |size: PaneSize| {
            let (Some(state), Some(backend)) = (state.upgrade(), backend.upgrade()) else {
                return;
            };
            let Ok(state) = state.try_borrow() else {
                return;
            };
            if state.generation != generation {
                return;
            }
            if let Some(live) = &state.live {
                backend.resize(&live.chart, size.with_height(fixed_height));
            }
        });

        match self.backend.observe_resize(container, on_resize) {
            Ok(observer) => Some(observer),
            Err(err) => {
                log_warn!(COMPONENT, "Chart on {} will not follow resizes: {}", container, err);
                None
            }
        }
    }
}
