#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use dashboard_charts_wasm::domain::chart::{
    ChartBackend, ChartOptions, ChartSurface, ContainerId, PaneSize, Placeholder, SeriesData,
    SeriesStyle,
};
use dashboard_charts_wasm::domain::errors::{
    InfrastructureError, RenderingError, RenderingResult, RepositoryError, RepositoryResult,
};
use dashboard_charts_wasm::domain::indicators::IndicatorDataset;
use dashboard_charts_wasm::domain::market_data::{
    HistoryPeriod, MarketDataRepository, PriceBar, PriceHistory, Ticker, TimedValue, Timestamp,
    Volume,
};

pub const DAY: i64 = 86_400;
pub const START: i64 = 1_700_006_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeChart(pub u64);

#[derive(Debug, PartialEq, Eq)]
pub struct FakeSeries(pub u64);

#[derive(Debug, PartialEq, Eq)]
pub struct FakeObserver(pub u64);

#[derive(Debug, Clone)]
pub struct ChartRecord {
    pub container: ContainerId,
    pub surface: ChartSurface,
    pub size: PaneSize,
}

#[derive(Debug, Clone)]
pub struct SeriesRecord {
    pub chart: u64,
    pub style: SeriesStyle,
    pub points: usize,
}

struct ObserverRecord {
    id: u64,
    container: ContainerId,
    connected: bool,
    callback: Rc<dyn Fn(PaneSize)>,
}

#[derive(Default)]
struct BackendState {
    next_id: u64,
    containers: HashMap<ContainerId, PaneSize>,
    charts: HashMap<u64, ChartRecord>,
    series: HashMap<u64, SeriesRecord>,
    observers: Vec<ObserverRecord>,
    placeholders: HashMap<ContainerId, Placeholder>,
    visible: HashMap<ContainerId, bool>,
    resizes: Vec<(u64, PaneSize)>,
    charts_created: usize,
    violations: Vec<String>,
    fail_series: bool,
    fail_observer: bool,
}

impl BackendState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory chart library that records misuse instead of crashing
#[derive(Default)]
pub struct FakeBackend {
    state: RefCell<BackendState>,
}

impl FakeBackend {
    pub fn with_containers(ids: &[&str]) -> Self {
        let backend = Self::default();
        for id in ids {
            backend.add_container(id, 800, 400);
        }
        backend
    }

    pub fn add_container(&self, id: &str, width: u32, height: u32) {
        self.state.borrow_mut().containers.insert(ContainerId::new(id), PaneSize::new(width, height));
    }

    pub fn fail_series(&self, fail: bool) {
        self.state.borrow_mut().fail_series = fail;
    }

    pub fn fail_observer(&self, fail: bool) {
        self.state.borrow_mut().fail_observer = fail;
    }

    pub fn live_charts(&self) -> Vec<(FakeChart, ChartRecord)> {
        let mut charts: Vec<_> = self
            .state
            .borrow()
            .charts
            .iter()
            .map(|(id, record)| (FakeChart(*id), record.clone()))
            .collect();
        charts.sort_by_key(|(chart, _)| chart.0);
        charts
    }

    pub fn charts_in(&self, container: &str) -> Vec<FakeChart> {
        self.live_charts()
            .into_iter()
            .filter(|(_, record)| record.container.as_str() == container)
            .map(|(chart, _)| chart)
            .collect()
    }

    pub fn series_on(&self, chart: FakeChart) -> Vec<SeriesRecord> {
        let state = self.state.borrow();
        let mut ids: Vec<_> = state.series.iter().filter(|(_, s)| s.chart == chart.0).map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| state.series[&id].clone()).collect()
    }

    pub fn live_series_count(&self) -> usize {
        self.state.borrow().series.len()
    }

    pub fn connected_observers(&self) -> usize {
        self.state.borrow().observers.iter().filter(|o| o.connected).count()
    }

    pub fn placeholder(&self, container: &str) -> Option<Placeholder> {
        self.state.borrow().placeholders.get(&ContainerId::new(container)).cloned()
    }

    pub fn is_visible(&self, container: &str) -> Option<bool> {
        self.state.borrow().visible.get(&ContainerId::new(container)).copied()
    }

    pub fn resizes(&self) -> Vec<(u64, PaneSize)> {
        self.state.borrow().resizes.clone()
    }

    pub fn charts_created(&self) -> usize {
        self.state.borrow().charts_created
    }

    pub fn violations(&self) -> Vec<String> {
        self.state.borrow().violations.clone()
    }

    /// Deliver a size change to the observers still connected on `container`
    pub fn fire_resize(&self, container: &str, size: PaneSize) {
        self.fire(container, size, false);
    }

    /// Deliver a size change to every observer ever installed on `container`,
    /// including disconnected ones, as a late browser callback would
    pub fn fire_stale_resize(&self, container: &str, size: PaneSize) {
        self.fire(container, size, true);
    }

    fn fire(&self, container: &str, size: PaneSize, include_disconnected: bool) {
        let callbacks: Vec<Rc<dyn Fn(PaneSize)>> = self
            .state
            .borrow()
            .observers
            .iter()
            .filter(|o| o.container.as_str() == container && (o.connected || include_disconnected))
            .map(|o| Rc::clone(&o.callback))
            .collect();
        for callback in callbacks {
            callback(size);
        }
    }
}

impl ChartBackend for FakeBackend {
    type Chart = FakeChart;
    type Series = FakeSeries;
    type Observer = FakeObserver;

    fn container_size(&self, container: &ContainerId) -> Option<PaneSize> {
        self.state.borrow().containers.get(container).copied()
    }

    fn create_chart(&self, container: &ContainerId, options: &ChartOptions) -> RenderingResult<FakeChart> {
        let mut state = self.state.borrow_mut();
        if !state.containers.contains_key(container) {
            return Err(RenderingError::ContainerNotFound(container.as_str().to_string()));
        }
        let id = state.next();
        state.charts_created += 1;
        state.placeholders.remove(container);
        state.charts.insert(
            id,
            ChartRecord { container: container.clone(), surface: options.surface, size: options.size },
        );
        Ok(FakeChart(id))
    }

    fn remove_chart(&self, chart: FakeChart) {
        let mut state = self.state.borrow_mut();
        if state.charts.remove(&chart.0).is_none() {
            state.violations.push(format!("chart {} removed twice", chart.0));
        }
        if state.series.values().any(|s| s.chart == chart.0) {
            state.violations.push(format!("chart {} removed with live series", chart.0));
        }
    }

    fn add_series(&self, chart: &FakeChart, style: SeriesStyle) -> RenderingResult<FakeSeries> {
        let mut state = self.state.borrow_mut();
        if state.fail_series {
            return Err(RenderingError::SeriesCreationFailed("scripted failure".to_string()));
        }
        if !state.charts.contains_key(&chart.0) {
            state.violations.push(format!("series added to dead chart {}", chart.0));
        }
        let id = state.next();
        state.series.insert(id, SeriesRecord { chart: chart.0, style, points: 0 });
        Ok(FakeSeries(id))
    }

    fn remove_series(&self, chart: &FakeChart, series: FakeSeries) {
        let mut state = self.state.borrow_mut();
        if !state.charts.contains_key(&chart.0) {
            state.violations.push(format!("series {} removed after chart {}", series.0, chart.0));
        }
        match state.series.remove(&series.0) {
            Some(record) if record.chart != chart.0 => {
                state.violations.push(format!("series {} removed from the wrong chart", series.0));
            }
            Some(_) => {}
            None => state.violations.push(format!("series {} removed twice", series.0)),
        }
    }

    fn set_series_data(&self, series: &FakeSeries, data: SeriesData<'_>) {
        let mut state = self.state.borrow_mut();
        match state.series.get_mut(&series.0) {
            Some(record) => record.points = data.len(),
            None => state.violations.push(format!("data pushed to dead series {}", series.0)),
        }
    }

    fn fit_content(&self, chart: &FakeChart) {
        let mut state = self.state.borrow_mut();
        if !state.charts.contains_key(&chart.0) {
            state.violations.push(format!("fit on dead chart {}", chart.0));
        }
    }

    fn resize(&self, chart: &FakeChart, size: PaneSize) {
        let mut state = self.state.borrow_mut();
        if !state.charts.contains_key(&chart.0) {
            state.violations.push(format!("resize on dead chart {}", chart.0));
        }
        state.resizes.push((chart.0, size));
    }

    fn observe_resize(
        &self,
        container: &ContainerId,
        on_resize: Box<dyn Fn(PaneSize)>,
    ) -> RenderingResult<FakeObserver> {
        let mut state = self.state.borrow_mut();
        if state.fail_observer {
            return Err(RenderingError::ObserverFailed("scripted failure".to_string()));
        }
        let id = state.next();
        state.observers.push(ObserverRecord {
            id,
            container: container.clone(),
            connected: true,
            callback: Rc::from(on_resize),
        });
        Ok(FakeObserver(id))
    }

    fn disconnect(&self, observer: FakeObserver) {
        let mut state = self.state.borrow_mut();
        match state.observers.iter_mut().find(|o| o.id == observer.0) {
            Some(record) if record.connected => record.connected = false,
            _ => state.violations.push(format!("observer {} disconnected twice", observer.0)),
        }
    }

    fn show_placeholder(&self, container: &ContainerId, placeholder: &Placeholder) {
        let mut state = self.state.borrow_mut();
        if state.charts.values().any(|c| &c.container == container) {
            state.violations.push(format!("placeholder over live chart in {container}"));
        }
        state.placeholders.insert(container.clone(), placeholder.clone());
    }

    fn clear_container(&self, container: &ContainerId) {
        self.state.borrow_mut().placeholders.remove(container);
    }

    fn set_container_visible(&self, container: &ContainerId, visible: bool) {
        self.state.borrow_mut().visible.insert(container.clone(), visible);
    }
}

struct Pending<T> {
    ticker: Ticker,
    period: HistoryPeriod,
    reply: Option<oneshot::Sender<RepositoryResult<T>>>,
}

/// Repository whose answers are delivered by the test, in any order
#[derive(Default)]
pub struct ScriptedRepository {
    prices: RefCell<Vec<Pending<PriceHistory>>>,
    indicators: RefCell<Vec<Pending<IndicatorDataset>>>,
}

impl ScriptedRepository {
    pub fn price_calls(&self) -> Vec<(String, HistoryPeriod)> {
        self.prices.borrow().iter().map(|p| (p.ticker.to_string(), p.period)).collect()
    }

    pub fn indicator_calls(&self) -> Vec<(String, HistoryPeriod)> {
        self.indicators.borrow().iter().map(|p| (p.ticker.to_string(), p.period)).collect()
    }

    pub fn answer_price(&self, call: usize, result: RepositoryResult<PriceHistory>) {
        let reply = self.prices.borrow_mut()[call].reply.take().expect("price call already answered");
        let _ = reply.send(result);
    }

    pub fn answer_indicators(&self, call: usize, result: RepositoryResult<IndicatorDataset>) {
        let reply = self.indicators.borrow_mut()[call]
            .reply
            .take()
            .expect("indicator call already answered");
        let _ = reply.send(result);
    }
}

fn dropped() -> InfrastructureError {
    RepositoryError::Upstream("request dropped".to_string()).into()
}

impl MarketDataRepository for ScriptedRepository {
    async fn fetch_price_history(&self, ticker: &Ticker, period: HistoryPeriod) -> RepositoryResult<PriceHistory> {
        let (reply, answer) = oneshot::channel();
        self.prices.borrow_mut().push(Pending { ticker: ticker.clone(), period, reply: Some(reply) });
        answer.await.unwrap_or_else(|_| Err(dropped()))
    }

    async fn fetch_indicators(
        &self,
        ticker: &Ticker,
        period: HistoryPeriod,
    ) -> RepositoryResult<IndicatorDataset> {
        let (reply, answer) = oneshot::channel();
        self.indicators.borrow_mut().push(Pending { ticker: ticker.clone(), period, reply: Some(reply) });
        answer.await.unwrap_or_else(|_| Err(dropped()))
    }
}

/// Single-threaded executor that lets a test interleave several loads
pub struct Driver {
    pool: LocalPool,
    spawner: LocalSpawner,
}

impl Driver {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self { pool, spawner }
    }

    /// Start `future` and run it until it waits on the repository
    pub fn start<T: 'static>(&mut self, future: impl Future<Output = T> + 'static) -> Rc<RefCell<Option<T>>> {
        let slot = Rc::new(RefCell::new(None));
        let out = Rc::clone(&slot);
        self.spawner
            .spawn_local(async move {
                let value = future.await;
                *out.borrow_mut() = Some(value);
            })
            .expect("spawn on local pool");
        self.settle();
        slot
    }

    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }
}

pub fn ticker(symbol: &str) -> Ticker {
    Ticker::new(symbol).expect("valid ticker")
}

/// `count` daily candles ending `START + (count - 1) * DAY`
pub fn daily_history(count: usize) -> PriceHistory {
    PriceHistory::from_candles((0..count).map(|i| {
        let time = Timestamp::from_secs(START + i as i64 * DAY);
        let open = 100.0 + i as f64;
        (PriceBar::new(time, open, open + 2.0, open - 1.0, open + 1.0), Volume::new(1_000.0))
    }))
}

pub fn line(count: usize, value: f64) -> Vec<TimedValue> {
    (0..count)
        .map(|i| TimedValue::new(Timestamp::from_secs(START + i as i64 * DAY), value))
        .collect()
}

pub fn full_dataset(count: usize) -> IndicatorDataset {
    let mut dataset = IndicatorDataset::default();
    dataset.bands.upper = line(count, 110.0);
    dataset.bands.middle = line(count, 105.0);
    dataset.bands.lower = line(count, 100.0);
    dataset.levels.support = vec![98.0, 95.0];
    dataset.levels.resistance = vec![115.0];
    dataset.oscillator_a = line(count, 55.0);
    dataset.oscillator_b.macd_line = line(count, 1.0);
    dataset.oscillator_b.signal_line = line(count, 0.5);
    dataset.oscillator_b.histogram = line(count, 0.5);
    dataset
}

pub fn upstream(message: &str) -> InfrastructureError {
    RepositoryError::Upstream(message.to_string()).into()
}
