use std::fmt::Display;
use std::rc::Rc;

use js_sys::Promise;
use leptos::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::app::ChartControls;
use crate::application::{
    ChartCoordinator, ChartSessionController, LoadOutcome, OverlayManager, SessionPhase,
};
use crate::config::DashboardConfig;
use crate::domain::{
    chart::RangeToken,
    errors::{AppError, DomainError},
    indicators::IndicatorKind,
    logging::{LogComponent, install_logger},
    market_data::{HistoryPeriod, Ticker},
};
use crate::global_state::{
    detail_period, detail_phase, detail_range, indicator_flags, selected_ticker, summary_phase,
    summary_range, summary_ticker,
};
use crate::infrastructure::{ConsoleLogger, DashboardHttpClient, LightweightChartsBackend};
use crate::log_warn;

pub type BrowserCoordinator = ChartCoordinator<DashboardHttpClient, LightweightChartsBackend>;
pub type BrowserSession = ChartSessionController<DashboardHttpClient, LightweightChartsBackend>;

fn js_error(error: impl Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_ticker(ticker: &str) -> Result<Ticker, JsValue> {
    Ticker::new(ticker).map_err(|e| js_error(AppError::from(e)))
}

fn parse_range(token: &str) -> Result<RangeToken, JsValue> {
    token
        .parse::<RangeToken>()
        .map_err(|_| js_error(AppError::from(DomainError::InvalidRange(token.to_string()))))
}

/// Value the returned promises resolve to
pub fn outcome_label(outcome: &LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Rendered(_) => "rendered",
        LoadOutcome::NoData => "no-data",
        LoadOutcome::Failed(_) => "error",
        LoadOutcome::Superseded => "superseded",
        LoadOutcome::NothingSelected => "idle",
    }
}

fn publish_detail(detail: &BrowserCoordinator) {
    let session = detail.session();
    selected_ticker().set(session.ticker().map(|ticker| ticker.to_string()));
    detail_phase().set(session.phase());
    detail_range().set(session.range());
    detail_period().set(session.period());
    indicator_flags().set(detail.indicator_flags());
}

fn publish_summary(summary: &BrowserSession) {
    summary_ticker().set(summary.ticker().map(|ticker| ticker.to_string()));
    summary_phase().set(summary.phase());
    summary_range().set(summary.range());
}

/// Chart subsystem handle for page scripts
#[wasm_bindgen]
pub struct DashboardCharts {
    detail: BrowserCoordinator,
    summary: BrowserSession,
}

#[wasm_bindgen]
impl DashboardCharts {
    /// `config` is an optional plain object, see `DashboardConfig`.
    ///
    /// The console logger is process-wide: the first instance installs it at
    /// its `logLevel` and later instances keep that level, logging a warning
    /// that names the level they ignored.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> DashboardCharts {
        let parsed = DashboardConfig::try_from_js(&config);
        let config = parsed.clone().unwrap_or_default();
        install_logger(Box::new(ConsoleLogger::new(config.log_level)), config.log_level);
        if let Err(err) = parsed {
            log_warn!(LogComponent::Presentation("DashboardCharts"), "{err}; using defaults");
        }

        let repository = Rc::new(DashboardHttpClient::new(config.api_base_url.clone()));
        let backend = Rc::new(LightweightChartsBackend::new());

        let session = ChartSessionController::new(
            Rc::clone(&repository),
            Rc::clone(&backend),
            config.detail_settings(),
        );
        let overlays = OverlayManager::new(
            Rc::clone(&repository),
            Rc::clone(&backend),
            config.oscillator_panes(),
        );
        let summary = ChartSessionController::new(repository, backend, config.summary_settings());

        let charts = DashboardCharts { detail: ChartCoordinator::new(session, overlays), summary };
        publish_detail(&charts.detail);
        publish_summary(&charts.summary);
        charts
    }

    /// Load `ticker` into the detail chart
    #[wasm_bindgen(js_name = selectInstrument)]
    pub fn select_instrument(&self, ticker: String) -> Result<Promise, JsValue> {
        let ticker = parse_ticker(&ticker)?;
        let detail = self.detail.clone();
        selected_ticker().set(Some(ticker.to_string()));
        detail_phase().set(SessionPhase::Loading);

        Ok(future_to_promise(async move {
            let outcome = detail.select_instrument(ticker).await;
            publish_detail(&detail);
            Ok(JsValue::from_str(outcome_label(&outcome)))
        }))
    }

    #[wasm_bindgen(js_name = setRange)]
    pub fn set_range(&self, token: String) -> Result<(), JsValue> {
        let range = parse_range(&token)?;
        self.detail.set_range(range);
        publish_detail(&self.detail);
        Ok(())
    }

    /// Unknown periods fall back to `1y`
    #[wasm_bindgen(js_name = setPeriod)]
    pub fn set_period(&self, period: String) -> Promise {
        let period = HistoryPeriod::parse_or_default(&period);
        let detail = self.detail.clone();
        detail_period().set(period);

        future_to_promise(async move {
            let outcome = detail.set_period(period).await;
            publish_detail(&detail);
            Ok(JsValue::from_str(outcome_label(&outcome)))
        })
    }

    /// Resolves to the new state of the toggle
    #[wasm_bindgen(js_name = toggle)]
    pub fn toggle_indicator(&self, kind: String) -> Result<Promise, JsValue> {
        let kind = kind
            .parse::<IndicatorKind>()
            .map_err(|_| js_error(format!("Unknown indicator: {kind}")))?;
        let detail = self.detail.clone();
        indicator_flags().update(|flags| {
            flags.toggle(kind);
        });

        Ok(future_to_promise(async move {
            let on = detail.toggle_indicator(kind).await;
            publish_detail(&detail);
            Ok(JsValue::from_bool(on))
        }))
    }

    pub fn retry(&self) -> Promise {
        let detail = self.detail.clone();
        future_to_promise(async move {
            let outcome = detail.retry().await;
            publish_detail(&detail);
            Ok(JsValue::from_str(outcome_label(&outcome)))
        })
    }

    #[wasm_bindgen(js_name = selectSummaryInstrument)]
    pub fn select_summary_instrument(&self, ticker: String) -> Result<Promise, JsValue> {
        let ticker = parse_ticker(&ticker)?;
        let summary = self.summary.clone();
        summary_phase().set(SessionPhase::Loading);

        Ok(future_to_promise(async move {
            let outcome = summary.select_instrument(ticker).await;
            publish_summary(&summary);
            Ok(JsValue::from_str(outcome_label(&outcome)))
        }))
    }

    #[wasm_bindgen(js_name = setSummaryRange)]
    pub fn set_summary_range(&self, token: String) -> Result<(), JsValue> {
        let range = parse_range(&token)?;
        self.summary.set_range(range);
        publish_summary(&self.summary);
        Ok(())
    }

    /// Mount the detail chart control bar into `element_id`
    #[wasm_bindgen(js_name = mountControls)]
    pub fn mount_controls(&self, element_id: String) -> Result<(), JsValue> {
        let parent = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(&element_id))
            .and_then(|element| element.dyn_into::<web_sys::HtmlElement>().ok())
            .ok_or_else(|| js_error(format!("Element '{element_id}' not found")))?;

        let detail = self.detail.clone();
        let on_range = Callback::new({
            let detail = detail.clone();
            move |range: RangeToken| {
                detail.set_range(range);
                publish_detail(&detail);
            }
        });
        let on_period = Callback::new({
            let detail = detail.clone();
            move |period: HistoryPeriod| {
                let detail = detail.clone();
                detail_period().set(period);
                spawn_local(async move {
                    detail.set_period(period).await;
                    publish_detail(&detail);
                });
            }
        });
        let on_toggle = Callback::new({
            let detail = detail.clone();
            move |kind: IndicatorKind| {
                let detail = detail.clone();
                indicator_flags().update(|flags| {
                    flags.toggle(kind);
                });
                spawn_local(async move {
                    detail.toggle_indicator(kind).await;
                    publish_detail(&detail);
                });
            }
        });
        let on_retry = Callback::new(move |_: ()| {
            let detail = detail.clone();
            spawn_local(async move {
                detail.retry().await;
                publish_detail(&detail);
            });
        });

        mount_to(parent, move || {
            view! {
                <ChartControls on_range=on_range on_period=on_period on_toggle=on_toggle on_retry=on_retry/>
            }
        });
        Ok(())
    }

    /// Release both charts and every overlay
    pub fn teardown(&self) {
        self.detail.teardown();
        self.summary.teardown();
        publish_detail(&self.detail);
        publish_summary(&self.summary);
    }
}
