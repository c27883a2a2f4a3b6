pub use super::value_objects::{Price, Timestamp, Volume};
use serde::{Deserialize, Serialize};

/// Volume bar color for sessions that closed at or above the open
pub const VOLUME_UP_COLOR: &str = "rgba(239, 68, 68, 0.5)";
/// Volume bar color for sessions that closed below the open
pub const VOLUME_DOWN_COLOR: &str = "rgba(59, 130, 246, 0.5)";

/// Domain entity - one OHLC candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

impl PriceBar {
    pub fn new(time: Timestamp, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open: Price::new(open),
            high: Price::new(high),
            low: Price::new(low),
            close: Price::new(close),
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

/// Domain entity - one volume histogram bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeBar {
    pub time: Timestamp,
    pub value: Volume,
    pub color: &'static str,
}

impl VolumeBar {
    /// Color follows the direction of the candle at the same index
    pub fn for_bar(bar: &PriceBar, volume: Volume) -> Self {
        Self {
            time: bar.time,
            value: volume,
            color: if bar.is_bullish() { VOLUME_UP_COLOR } else { VOLUME_DOWN_COLOR },
        }
    }
}

/// A single `(time, value)` point of a line series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub time: Timestamp,
    pub value: f64,
}

impl TimedValue {
    pub fn new(time: Timestamp, value: f64) -> Self {
        Self { time, value }
    }
}

/// A histogram point with its own color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBar {
    pub time: Timestamp,
    pub value: f64,
    pub color: &'static str,
}

/// Full price and volume history of one instrument, in time order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    bars: Vec<PriceBar>,
    volumes: Vec<VolumeBar>,
}

impl PriceHistory {
    /// Build from candles paired with their traded volume
    pub fn from_candles(candles: impl IntoIterator<Item = (PriceBar, Volume)>) -> Self {
        let (bars, volumes) = candles
            .into_iter()
            .map(|(bar, volume)| (bar, VolumeBar::for_bar(&bar, volume)))
            .unzip();
        Self { bars, volumes }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn volumes(&self) -> &[VolumeBar] {
        &self.volumes
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}
