//! Indicator overlays on the detail chart.
//!
//! Flags are process-wide and survive rebinding; the dataset and every drawn
//! handle belong to the current binding and are dropped with it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::domain::chart::{
    ChartBackend, ChartOptions, ChartSurface, ContainerId, PaneSize, SeriesData, SeriesStyle,
};
use crate::domain::errors::RenderingResult;
use crate::domain::indicators::{
    BAND_MIDDLE_COLOR, BAND_OUTER_COLOR, HISTOGRAM_POSITIVE_COLOR, IndicatorDataset, IndicatorFlags,
    IndicatorKind, MACD_HISTOGRAM_MARGIN, MACD_LINE_COLOR, MACD_SIGNAL_COLOR, OSCILLATOR_A_COLOR,
    OSCILLATOR_OVERBOUGHT, OSCILLATOR_OVERSOLD, OVERBOUGHT_COLOR, OVERSOLD_COLOR, RESISTANCE_COLOR,
    SUPPORT_COLOR, flat_line, span_of,
};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{HistoryPeriod, MarketDataRepository, TimedValue, Ticker};
use crate::{log_debug, log_warn};

const COMPONENT: LogComponent = LogComponent::Application("Overlays");

/// Containers and height of the oscillator sub-panes
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorPanes {
    pub oscillator_a: ContainerId,
    pub oscillator_b: ContainerId,
    pub height: u32,
}

/// The price chart overlays are drawn on, and the data it shows
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBinding<C> {
    pub ticker: Ticker,
    pub period: HistoryPeriod,
    pub chart: C,
}

impl<C> OverlayBinding<C> {
    pub fn new(ticker: Ticker, period: HistoryPeriod, chart: C) -> Self {
        Self { ticker, period, chart }
    }
}

enum OverlayHandle<B: ChartBackend> {
    /// Series living on the price chart
    OnPrice(Vec<B::Series>),
    /// A chart of its own in a sub-pane container
    Pane { container: ContainerId, chart: B::Chart, series: Vec<B::Series> },
}

struct DrawContext<'a, B: ChartBackend> {
    backend: &'a B,
    chart: &'a B::Chart,
    panes: &'a OscillatorPanes,
}

type RenderFn<B> =
    fn(&DrawContext<'_, B>, &IndicatorDataset) -> RenderingResult<Option<OverlayHandle<B>>>;
type DestroyFn<B> = fn(&B, &<B as ChartBackend>::Chart, OverlayHandle<B>);

struct OverlayOps<B: ChartBackend> {
    render: RenderFn<B>,
    destroy: DestroyFn<B>,
}

fn overlay_ops<B: ChartBackend>(kind: IndicatorKind) -> OverlayOps<B> {
    match kind {
        IndicatorKind::Bands => OverlayOps { render: render_bands::<B>, destroy: remove_from_price::<B> },
        IndicatorKind::SupportResistance => {
            OverlayOps { render: render_levels::<B>, destroy: remove_from_price::<B> }
        }
        IndicatorKind::OscillatorA => {
            OverlayOps { render: render_oscillator_a::<B>, destroy: remove_pane::<B> }
        }
        IndicatorKind::OscillatorB => {
            OverlayOps { render: render_oscillator_b::<B>, destroy: remove_pane::<B> }
        }
    }
}

/// Add every series to `chart`. On failure the ones already added are removed.
fn draw_series<B: ChartBackend>(
    backend: &B,
    chart: &B::Chart,
    series: &[(SeriesStyle, SeriesData<'_>)],
) -> RenderingResult<Vec<B::Series>> {
    let mut drawn = Vec::with_capacity(series.len());
    for (style, data) in series {
        match backend.add_series(chart, *style) {
            Ok(handle) => {
                backend.set_series_data(&handle, *data);
                drawn.push(handle);
            }
            Err(err) => {
                for handle in drawn {
                    backend.remove_series(chart, handle);
                }
                return Err(err);
            }
        }
    }
    Ok(drawn)
}

fn draw_pane<B: ChartBackend>(
    ctx: &DrawContext<'_, B>,
    container: &ContainerId,
    series: &[(SeriesStyle, SeriesData<'_>)],
) -> RenderingResult<Option<OverlayHandle<B>>> {
    let backend = ctx.backend;
    backend.set_container_visible(container, true);
    backend.clear_container(container);

    let width = backend.container_size(container).map(|size| size.width).unwrap_or_default();
    let options = ChartOptions { surface: ChartSurface::Oscillator, size: PaneSize::new(width, ctx.panes.height) };
    let chart = match backend.create_chart(container, &options) {
        Ok(chart) => chart,
        Err(err) => {
            backend.set_container_visible(container, false);
            return Err(err);
        }
    };

    match draw_series(backend, &chart, series) {
        Ok(drawn) => {
            backend.fit_content(&chart);
            Ok(Some(OverlayHandle::Pane { container: container.clone(), chart, series: drawn }))
        }
        Err(err) => {
            backend.remove_chart(chart);
            backend.set_container_visible(container, false);
            Err(err)
        }
    }
}

fn render_bands<B: ChartBackend>(
    ctx: &DrawContext<'_, B>,
    data: &IndicatorDataset,
) -> RenderingResult<Option<OverlayHandle<B>>> {
    let bands = &data.bands;
    if bands.is_empty() {
        return Ok(None);
    }

    let outer = SeriesStyle::Line { color: BAND_OUTER_COLOR, dashed: false };
    let middle = SeriesStyle::Line { color: BAND_MIDDLE_COLOR, dashed: true };
    let series = [
        (outer, SeriesData::Line(&bands.upper)),
        (middle, SeriesData::Line(&bands.middle)),
        (outer, SeriesData::Line(&bands.lower)),
    ];
    draw_series(ctx.backend, ctx.chart, &series).map(|drawn| Some(OverlayHandle::OnPrice(drawn)))
}

fn render_levels<B: ChartBackend>(
    ctx: &DrawContext<'_, B>,
    data: &IndicatorDataset,
) -> RenderingResult<Option<OverlayHandle<B>>> {
    let Some(span) = data.time_span() else {
        return Ok(None);
    };

    let lines: Vec<(&'static str, [TimedValue; 2])> = data
        .levels
        .support
        .iter()
        .map(|level| (SUPPORT_COLOR, flat_line(span, *level)))
        .chain(data.levels.resistance.iter().map(|level| (RESISTANCE_COLOR, flat_line(span, *level))))
        .collect();
    if lines.is_empty() {
        return Ok(None);
    }

    let series: Vec<_> = lines
        .iter()
        .map(|(color, points)| {
            (SeriesStyle::Line { color: *color, dashed: true }, SeriesData::Line(points.as_slice()))
        })
        .collect();
    draw_series(ctx.backend, ctx.chart, &series).map(|drawn| Some(OverlayHandle::OnPrice(drawn)))
}

fn render_oscillator_a<B: ChartBackend>(
    ctx: &DrawContext<'_, B>,
    data: &IndicatorDataset,
) -> RenderingResult<Option<OverlayHandle<B>>> {
    let points = &data.oscillator_a;
    let thresholds = span_of(points)
        .map(|span| (flat_line(span, OSCILLATOR_OVERBOUGHT), flat_line(span, OSCILLATOR_OVERSOLD)));

    let mut series = vec![(SeriesStyle::Line { color: OSCILLATOR_A_COLOR, dashed: false }, SeriesData::Line(points))];
    if let Some((overbought, oversold)) = &thresholds {
        series.push((SeriesStyle::Line { color: OVERBOUGHT_COLOR, dashed: true }, SeriesData::Line(overbought)));
        series.push((SeriesStyle::Line { color: OVERSOLD_COLOR, dashed: true }, SeriesData::Line(oversold)));
    }
    draw_pane(ctx, &ctx.panes.oscillator_a, &series)
}

fn render_oscillator_b<B: ChartBackend>(
    ctx: &DrawContext<'_, B>,
    data: &IndicatorDataset,
) -> RenderingResult<Option<OverlayHandle<B>>> {
    let macd = &data.oscillator_b;
    let histogram = macd.colored_histogram();
    let series = [
        (SeriesStyle::Line { color: MACD_LINE_COLOR, dashed: false }, SeriesData::Line(&macd.macd_line)),
        (SeriesStyle::Line { color: MACD_SIGNAL_COLOR, dashed: false }, SeriesData::Line(&macd.signal_line)),
        (
            SeriesStyle::Histogram { color: HISTOGRAM_POSITIVE_COLOR, margin_top: MACD_HISTOGRAM_MARGIN },
            SeriesData::Histogram(&histogram),
        ),
    ];
    draw_pane(ctx, &ctx.panes.oscillator_b, &series)
}

fn remove_from_price<B: ChartBackend>(backend: &B, price_chart: &B::Chart, handle: OverlayHandle<B>) {
    match handle {
        OverlayHandle::OnPrice(series) => {
            for series in series {
                backend.remove_series(price_chart, series);
            }
        }
        pane @ OverlayHandle::Pane { .. } => remove_pane(backend, price_chart, pane),
    }
}

fn remove_pane<B: ChartBackend>(backend: &B, price_chart: &B::Chart, handle: OverlayHandle<B>) {
    match handle {
        OverlayHandle::Pane { container, chart, series } => {
            for series in series {
                backend.remove_series(&chart, series);
            }
            backend.remove_chart(chart);
            backend.clear_container(&container);
            backend.set_container_visible(&container, false);
        }
        on_price @ OverlayHandle::OnPrice(_) => remove_from_price(backend, price_chart, on_price),
    }
}

/// Identity of one indicator fetch
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchTicket {
    epoch: u64,
    ticker: Ticker,
    period: HistoryPeriod,
}

impl FetchTicket {
    fn log_context(&self) -> String {
        format!("ticker={} period={}", self.ticker, self.period)
    }
}

struct Attached<B: ChartBackend> {
    binding: OverlayBinding<B::Chart>,
    drawn: HashMap<IndicatorKind, OverlayHandle<B>>,
}

impl<B: ChartBackend> Attached<B> {
    fn release(self, backend: &B) {
        let chart = self.binding.chart;
        for (kind, handle) in self.drawn {
            (overlay_ops::<B>(kind).destroy)(backend, &chart, handle);
        }
    }
}

struct OverlayState<B: ChartBackend> {
    flags: IndicatorFlags,
    epoch: u64,
    attached: Option<Attached<B>>,
    dataset: Option<IndicatorDataset>,
    in_flight: Option<FetchTicket>,
}

/// Toggles and draws indicator overlays for whatever chart is attached
pub struct OverlayManager<R, B: ChartBackend> {
    repository: Rc<R>,
    backend: Rc<B>,
    panes: Rc<OscillatorPanes>,
    state: Rc<RefCell<OverlayState<B>>>,
}

impl<R, B: ChartBackend> Clone for OverlayManager<R, B> {
    fn clone(&self) -> Self {
        Self {
            repository: Rc::clone(&self.repository),
            backend: Rc::clone(&self.backend),
            panes: Rc::clone(&self.panes),
            state: Rc::clone(&self.state),
        }
    }
}

impl<R: MarketDataRepository, B: ChartBackend> OverlayManager<R, B> {
    pub fn new(repository: Rc<R>, backend: Rc<B>, panes: OscillatorPanes) -> Self {
        Self {
            repository,
            backend,
            panes: Rc::new(panes),
            state: Rc::new(RefCell::new(OverlayState {
                flags: IndicatorFlags::default(),
                epoch: 0,
                attached: None,
                dataset: None,
                in_flight: None,
            })),
        }
    }

    pub fn flags(&self) -> IndicatorFlags {
        self.state.borrow().flags
    }

    /// Whether `kind` currently has backend handles
    pub fn is_rendered(&self, kind: IndicatorKind) -> bool {
        self.state
            .borrow()
            .attached
            .as_ref()
            .is_some_and(|attached| attached.drawn.contains_key(&kind))
    }

    pub fn has_dataset(&self) -> bool {
        self.state.borrow().dataset.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.state.borrow().in_flight.is_some()
    }

    /// Flip `kind` and return its new state.
    ///
    /// Turning on draws right away when the dataset is resident, otherwise
    /// after the (single) fetch for the current binding resolves. Turning
    /// off removes the overlay immediately.
    pub async fn toggle(&self, kind: IndicatorKind) -> bool {
        let ticket = {
            let mut state = self.state.borrow_mut();
            let on = state.flags.toggle(kind);
            log_debug!(COMPONENT, "{} {}", kind.label(), if on { "on" } else { "off" });

            if !on {
                self.destroy(&mut state, kind);
                return false;
            }
            if state.attached.is_none() || state.in_flight.is_some() {
                return true;
            }
            if state.dataset.is_some() {
                self.render(&mut state, kind);
                return true;
            }
            match self.start_fetch(&mut state) {
                Some(ticket) => ticket,
                None => return true,
            }
        };

        self.fetch_and_render(ticket).await;
        true
    }

    /// Drop the binding: destroy every drawn overlay while its chart is still
    /// alive, discard the dataset and invalidate any fetch in flight.
    pub fn detach(&self) {
        let mut state = self.state.borrow_mut();
        self.reset(&mut state);
    }

    /// Bind to a freshly rendered chart and redraw every active overlay
    pub async fn attach(&self, binding: OverlayBinding<B::Chart>) {
        let ticket = {
            let mut state = self.state.borrow_mut();
            self.reset(&mut state);
            get_logger().debug(
                COMPONENT,
                &format!("Attached to {} ({})", binding.ticker, binding.period),
            );
            state.attached = Some(Attached { binding, drawn: HashMap::new() });

            if !state.flags.any() {
                return;
            }
            self.start_fetch(&mut state)
        };

        if let Some(ticket) = ticket {
            self.fetch_and_render(ticket).await;
        }
    }

    fn reset(&self, state: &mut OverlayState<B>) {
        state.epoch = state.epoch.wrapping_add(1);
        state.in_flight = None;
        state.dataset = None;
        if let Some(attached) = state.attached.take() {
            attached.release(self.backend.as_ref());
        }
    }

    fn start_fetch(&self, state: &mut OverlayState<B>) -> Option<FetchTicket> {
        let binding = &state.attached.as_ref()?.binding;
        let ticket = FetchTicket {
            epoch: state.epoch,
            ticker: binding.ticker.clone(),
            period: binding.period,
        };
        state.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    async fn fetch_and_render(&self, ticket: FetchTicket) {
        let result = self.repository.fetch_indicators(&ticket.ticker, ticket.period).await;

        let mut state = self.state.borrow_mut();
        if state.in_flight.as_ref() != Some(&ticket) {
            log_debug!(COMPONENT, "Dropping stale indicators for {}", ticket.ticker);
            return;
        }
        state.in_flight = None;

        match result {
            Ok(dataset) => {
                state.dataset = Some(dataset);
                let pending: Vec<IndicatorKind> = state
                    .flags
                    .active()
                    .filter(|kind| !state.attached.as_ref().is_some_and(|a| a.drawn.contains_key(kind)))
                    .collect();
                for kind in pending {
                    self.render(&mut state, kind);
                }
            }
            Err(err) => {
                log_warn!(
                    COMPONENT,
                    context = ticket.log_context();
                    "Indicators for {} unavailable: {}",
                    ticket.ticker,
                    err
                );
            }
        }
    }

    fn render(&self, state: &mut OverlayState<B>, kind: IndicatorKind) {
        let (Some(attached), Some(dataset)) = (state.attached.as_mut(), state.dataset.as_ref()) else {
            return;
        };

        let ctx = DrawContext {
            backend: self.backend.as_ref(),
            chart: &attached.binding.chart,
            panes: self.panes.as_ref(),
        };
        match (overlay_ops::<B>(kind).render)(&ctx, dataset) {
            Ok(Some(handle)) => {
                attached.drawn.insert(kind, handle);
            }
            Ok(None) => {
                log_debug!(COMPONENT, "Nothing to draw for {}", kind.label());
            }
            Err(err) => {
                log_warn!(COMPONENT, "Failed to draw {}: {}", kind.label(), err);
            }
        }
    }

    fn destroy(&self, state: &mut OverlayState<B>, kind: IndicatorKind) {
        let Some(attached) = state.attached.as_mut() else {
            return;
        };
        if let Some(handle) = attached.drawn.remove(&kind) {
            (overlay_ops::<B>(kind).destroy)(self.backend.as_ref(), &attached.binding.chart, handle);
        }
    }
}
