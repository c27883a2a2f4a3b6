//! `ChartBackend` over the LightweightCharts JS library.

use gloo::utils::format::JsValueSerdeExt;
use serde::Serialize;
use serde_json::{Value, json};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, ResizeObserver, ResizeObserverEntry};

use crate::domain::chart::{
    ChartBackend, ChartOptions, ChartSurface, ContainerId, PaneSize, Placeholder, SeriesData,
    SeriesStyle,
};
use crate::domain::errors::{RenderingError, RenderingResult};
use crate::domain::logging::{LogComponent, get_logger};

const GRID_COLOR: &str = "#2a2a2a";

#[wasm_bindgen]
extern "C" {
    /// `IChartApi`
    #[derive(Debug, Clone)]
    pub type ChartApi;

    /// `ISeriesApi`
    #[derive(Debug, Clone)]
    pub type SeriesApi;

    type TimeScaleApi;

    type PriceScaleApi;

    #[wasm_bindgen(catch, js_namespace = LightweightCharts, js_name = createChart)]
    fn create_chart(container: &HtmlElement, options: &JsValue) -> Result<ChartApi, JsValue>;

    #[wasm_bindgen(method, catch, js_name = addCandlestickSeries)]
    fn add_candlestick_series(this: &ChartApi, options: &JsValue) -> Result<SeriesApi, JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLineSeries)]
    fn add_line_series(this: &ChartApi, options: &JsValue) -> Result<SeriesApi, JsValue>;

    #[wasm_bindgen(method, catch, js_name = addHistogramSeries)]
    fn add_histogram_series(this: &ChartApi, options: &JsValue) -> Result<SeriesApi, JsValue>;

    #[wasm_bindgen(method, js_name = removeSeries)]
    fn remove_series(this: &ChartApi, series: &SeriesApi);

    #[wasm_bindgen(method)]
    fn remove(this: &ChartApi);

    #[wasm_bindgen(method, js_name = applyOptions)]
    fn apply_options(this: &ChartApi, options: &JsValue);

    #[wasm_bindgen(method, js_name = timeScale)]
    fn time_scale(this: &ChartApi) -> TimeScaleApi;

    #[wasm_bindgen(method, js_name = priceScale)]
    fn price_scale(this: &ChartApi, id: &str) -> PriceScaleApi;

    #[wasm_bindgen(method, js_name = fitContent)]
    fn fit_content(this: &TimeScaleApi);

    #[wasm_bindgen(method, js_name = applyOptions)]
    fn apply_options(this: &PriceScaleApi, options: &JsValue);

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &SeriesApi, data: &JsValue);
}

/// Live `ResizeObserver` and the closure it calls
pub struct ResizeHandle {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

/// Chart options for each surface
pub fn chart_options_json(options: &ChartOptions) -> Value {
    let size = options.size;
    match options.surface {
        ChartSurface::Summary => json!({
            "layout": { "background": { "color": "#121212" }, "textColor": "#D1D5DB" },
            "grid": { "vertLines": { "color": GRID_COLOR }, "horzLines": { "color": GRID_COLOR } },
            "width": size.width,
            "height": size.height,
            "timeScale": { "timeVisible": true, "secondsVisible": false },
            "handleScroll": false,
            "handleScale": false,
        }),
        ChartSurface::Detail => json!({
            "layout": { "background": { "color": "#1a1a1a" }, "textColor": "#999" },
            "grid": { "vertLines": { "color": GRID_COLOR }, "horzLines": { "color": GRID_COLOR } },
            "width": size.width,
            "height": size.height,
            "timeScale": { "borderColor": GRID_COLOR, "timeVisible": true, "rightOffset": 5 },
            "rightPriceScale": { "borderColor": GRID_COLOR },
        }),
        ChartSurface::Oscillator => json!({
            "layout": { "background": { "color": "#1a1a1a" }, "textColor": "#666" },
            "grid": { "vertLines": { "color": GRID_COLOR }, "horzLines": { "color": GRID_COLOR } },
            "width": size.width,
            "height": size.height,
            "timeScale": { "visible": false },
            "rightPriceScale": {
                "borderColor": GRID_COLOR,
                "scaleMargins": { "top": 0.1, "bottom": 0.1 },
            },
        }),
    }
}

/// Series options for a style
pub fn series_options_json(style: &SeriesStyle) -> Value {
    match *style {
        SeriesStyle::Candlestick { up, down } => json!({
            "upColor": up,
            "downColor": down,
            "borderUpColor": up,
            "borderDownColor": down,
            "wickUpColor": up,
            "wickDownColor": down,
        }),
        SeriesStyle::Line { color, dashed: false } => json!({ "color": color, "lineWidth": 1 }),
        // lineStyle 2 is LightweightCharts' dashed style
        SeriesStyle::Line { color, dashed: true } => {
            json!({ "color": color, "lineWidth": 1, "lineStyle": 2 })
        }
        SeriesStyle::Histogram { color, .. } => json!({
            "color": color,
            "priceFormat": { "type": "volume" },
            "priceScaleId": "",
        }),
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    JsValue::from_serde(value).map_err(|e| e.to_string())
}

fn js_error(error: JsValue) -> String {
    error.as_string().unwrap_or_else(|| format!("{error:?}"))
}

fn element(container: &ContainerId) -> Option<HtmlElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(container.as_str())?
        .dyn_into::<HtmlElement>()
        .ok()
}

/// Browser chart backend
#[derive(Debug, Default, Clone, Copy)]
pub struct LightweightChartsBackend;

impl LightweightChartsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ChartBackend for LightweightChartsBackend {
    type Chart = ChartApi;
    type Series = SeriesApi;
    type Observer = ResizeHandle;

    fn container_size(&self, container: &ContainerId) -> Option<PaneSize> {
        let element = element(container)?;
        Some(PaneSize::new(element.client_width().max(0) as u32, element.client_height().max(0) as u32))
    }

    fn create_chart(&self, container: &ContainerId, options: &ChartOptions) -> RenderingResult<ChartApi> {
        let element = element(container)
            .ok_or_else(|| RenderingError::ContainerNotFound(container.as_str().to_string()))?;
        let options = to_js(&chart_options_json(options)).map_err(RenderingError::ChartCreationFailed)?;
        create_chart(&element, &options).map_err(|e| RenderingError::ChartCreationFailed(js_error(e)))
    }

    fn remove_chart(&self, chart: ChartApi) {
        chart.remove();
    }

    fn add_series(&self, chart: &ChartApi, style: SeriesStyle) -> RenderingResult<SeriesApi> {
        let options = to_js(&series_options_json(&style)).map_err(RenderingError::SeriesCreationFailed)?;
        let series = match style {
            SeriesStyle::Candlestick { .. } => chart.add_candlestick_series(&options),
            SeriesStyle::Line { .. } => chart.add_line_series(&options),
            SeriesStyle::Histogram { .. } => chart.add_histogram_series(&options),
        }
        .map_err(|e| RenderingError::SeriesCreationFailed(js_error(e)))?;

        if let SeriesStyle::Histogram { margin_top, .. } = style {
            let margins = json!({ "scaleMargins": { "top": margin_top, "bottom": 0 } });
            if let Ok(margins) = to_js(&margins) {
                chart.price_scale("").apply_options(&margins);
            }
        }
        Ok(series)
    }

    fn remove_series(&self, chart: &ChartApi, series: SeriesApi) {
        chart.remove_series(&series);
    }

    fn set_series_data(&self, series: &SeriesApi, data: SeriesData<'_>) {
        let js = match data {
            SeriesData::Candles(bars) => to_js(bars),
            SeriesData::Volumes(bars) => to_js(bars),
            SeriesData::Line(points) => to_js(points),
            SeriesData::Histogram(bars) => to_js(bars),
        };
        match js {
            Ok(js) => series.set_data(&js),
            Err(e) => get_logger().warn(
                LogComponent::Infrastructure("LightweightCharts"),
                &format!("Failed to serialize {} points: {e}", data.len()),
            ),
        }
    }

    fn fit_content(&self, chart: &ChartApi) {
        chart.time_scale().fit_content();
    }

    fn resize(&self, chart: &ChartApi, size: PaneSize) {
        if let Ok(options) = to_js(&json!({ "width": size.width, "height": size.height })) {
            chart.apply_options(&options);
        }
    }

    fn observe_resize(
        &self,
        container: &ContainerId,
        on_resize: Box<dyn Fn(PaneSize)>,
    ) -> RenderingResult<ResizeHandle> {
        let element = element(container)
            .ok_or_else(|| RenderingError::ContainerNotFound(container.as_str().to_string()))?;

        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            if let Ok(entry) = entries.get(0).dyn_into::<ResizeObserverEntry>() {
                let rect = entry.content_rect();
                on_resize(PaneSize::new(rect.width().max(0.0) as u32, rect.height().max(0.0) as u32));
            }
        });

        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| RenderingError::ObserverFailed(js_error(e)))?;
        observer.observe(&element);

        Ok(ResizeHandle { observer, _callback: callback })
    }

    fn disconnect(&self, handle: ResizeHandle) {
        handle.observer.disconnect();
    }

    fn show_placeholder(&self, container: &ContainerId, placeholder: &Placeholder) {
        let Some(element) = element(container) else {
            return;
        };
        element.set_inner_html("");

        let Some(document) = element.owner_document() else {
            return;
        };
        if let Ok(message) = document.create_element("div") {
            let tone = if placeholder.is_error() { "text-red-500" } else { "text-gray-500" };
            message.set_class_name(&format!("absolute inset-0 flex items-center justify-center {tone}"));
            message.set_text_content(Some(&placeholder.message()));
            let _ = element.append_child(&message);
        }
    }

    fn clear_container(&self, container: &ContainerId) {
        if let Some(element) = element(container) {
            element.set_inner_html("");
        }
    }

    fn set_container_visible(&self, container: &ContainerId, visible: bool) {
        let Some(element) = element(container) else {
            return;
        };
        let classes = element.class_list();
        let result = if visible { classes.remove_1("hidden") } else { classes.add_1("hidden") };
        if let Err(e) = result {
            get_logger().warn(
                LogComponent::Infrastructure("LightweightCharts"),
                &format!("Failed to toggle {container}: {}", js_error(e)),
            );
        }
    }
}
