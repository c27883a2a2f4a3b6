use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use super::range_filter::RangeToken;

pub const CANDLE_UP_COLOR: &str = "#22c55e";
pub const CANDLE_DOWN_COLOR: &str = "#ef4444";
pub const SUMMARY_UP_COLOR: &str = "#EF4444";
pub const SUMMARY_DOWN_COLOR: &str = "#3B82F6";
pub const VOLUME_COLOR: &str = "#26a69a";

/// DOM id of the element that hosts a chart
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[display(fmt = "#{}", _0)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Pixel dimensions of a chart pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaneSize {
    pub width: u32,
    pub height: u32,
}

impl PaneSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn with_height(self, height: Option<u32>) -> Self {
        Self { width: self.width, height: height.unwrap_or(self.height) }
    }
}

/// Visual flavour of a chart instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSurface {
    /// Dark, non-interactive overview chart
    Summary,
    /// Main instrument chart that hosts price overlays
    Detail,
    /// Compact sub-pane under the detail chart, time axis hidden
    Oscillator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub surface: ChartSurface,
    pub size: PaneSize,
}

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesStyle {
    Candlestick { up: &'static str, down: &'static str },
    Line { color: &'static str, dashed: bool },
    /// Histogram on its own overlay price scale, pushed down by `margin_top`
    Histogram { color: &'static str, margin_top: f64 },
}

/// Which flavour of chart a session drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartLayout {
    /// Candles and volume, filtered by the selected range
    #[default]
    Summary,
    /// Candles only, shown as fetched; hosts indicator overlays
    Detail,
}

impl ChartLayout {
    pub fn surface(&self) -> ChartSurface {
        match self {
            ChartLayout::Summary => ChartSurface::Summary,
            ChartLayout::Detail => ChartSurface::Detail,
        }
    }

    pub fn default_range(&self) -> RangeToken {
        match self {
            ChartLayout::Summary => RangeToken::OneYear,
            ChartLayout::Detail => RangeToken::All,
        }
    }

    pub fn candle_style(&self) -> SeriesStyle {
        match self {
            ChartLayout::Summary => SeriesStyle::Candlestick {
                up: SUMMARY_UP_COLOR,
                down: SUMMARY_DOWN_COLOR,
            },
            ChartLayout::Detail => SeriesStyle::Candlestick {
                up: CANDLE_UP_COLOR,
                down: CANDLE_DOWN_COLOR,
            },
        }
    }

    /// `None` when the layout draws no volume pane
    pub fn volume_style(&self) -> Option<SeriesStyle> {
        match self {
            ChartLayout::Summary => Some(SeriesStyle::Histogram { color: VOLUME_COLOR, margin_top: 0.8 }),
            ChartLayout::Detail => None,
        }
    }
}

/// What a container shows while no chart is live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    NoData,
    Error(String),
}

impl Placeholder {
    pub fn message(&self) -> String {
        match self {
            Placeholder::Loading => "Loading chart...".to_string(),
            Placeholder::NoData => "No price data".to_string(),
            Placeholder::Error(msg) => format!("Error: {msg}"),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Placeholder::Error(_))
    }
}
