//! Technical indicator overlays: kinds, toggle state and the fetched dataset.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::domain::market_data::{HistogramBar, TimedValue, Timestamp};

pub const OSCILLATOR_OVERBOUGHT: f64 = 70.0;
pub const OSCILLATOR_OVERSOLD: f64 = 30.0;
pub const HISTOGRAM_POSITIVE_COLOR: &str = "#22c55e";
pub const HISTOGRAM_NEGATIVE_COLOR: &str = "#ef4444";

pub const BAND_OUTER_COLOR: &str = "rgba(147, 51, 234, 0.5)";
pub const BAND_MIDDLE_COLOR: &str = "rgba(147, 51, 234, 0.8)";
pub const SUPPORT_COLOR: &str = "#22c55e";
pub const RESISTANCE_COLOR: &str = "#ef4444";
pub const OSCILLATOR_A_COLOR: &str = "#22c55e";
pub const OVERBOUGHT_COLOR: &str = "#ef4444";
pub const OVERSOLD_COLOR: &str = "#22c55e";
pub const MACD_LINE_COLOR: &str = "#3b82f6";
pub const MACD_SIGNAL_COLOR: &str = "#f59e0b";
/// Top margin of the MACD histogram's overlay price scale
pub const MACD_HISTOGRAM_MARGIN: f64 = 0.7;

/// Overlay that can be toggled on the detail chart
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, EnumString, AsRefStr, Serialize,
    Deserialize,
)]
pub enum IndicatorKind {
    /// Bollinger bands on the price pane
    #[strum(serialize = "bb")]
    #[serde(rename = "bb")]
    Bands,

    /// Horizontal support and resistance levels on the price pane
    #[strum(serialize = "sr")]
    #[serde(rename = "sr")]
    SupportResistance,

    /// RSI sub-pane
    #[strum(serialize = "rsi")]
    #[serde(rename = "rsi")]
    OscillatorA,

    /// MACD sub-pane
    #[strum(serialize = "macd")]
    #[serde(rename = "macd")]
    OscillatorB,
}

impl IndicatorKind {
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Bands => "BB",
            IndicatorKind::SupportResistance => "S/R",
            IndicatorKind::OscillatorA => "RSI",
            IndicatorKind::OscillatorB => "MACD",
        }
    }
}

/// The four user toggles. Survive ticker and period switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndicatorFlags {
    pub bands: bool,
    pub support_resistance: bool,
    pub oscillator_a: bool,
    pub oscillator_b: bool,
}

impl IndicatorFlags {
    pub fn is_on(&self, kind: IndicatorKind) -> bool {
        match kind {
            IndicatorKind::Bands => self.bands,
            IndicatorKind::SupportResistance => self.support_resistance,
            IndicatorKind::OscillatorA => self.oscillator_a,
            IndicatorKind::OscillatorB => self.oscillator_b,
        }
    }

    /// Flip one flag and return its new value
    pub fn toggle(&mut self, kind: IndicatorKind) -> bool {
        let flag = match kind {
            IndicatorKind::Bands => &mut self.bands,
            IndicatorKind::SupportResistance => &mut self.support_resistance,
            IndicatorKind::OscillatorA => &mut self.oscillator_a,
            IndicatorKind::OscillatorB => &mut self.oscillator_b,
        };
        *flag = !*flag;
        *flag
    }

    pub fn any(&self) -> bool {
        self.bands || self.support_resistance || self.oscillator_a || self.oscillator_b
    }

    pub fn active(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        use strum::IntoEnumIterator;
        IndicatorKind::iter().filter(|kind| self.is_on(*kind))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandSeries {
    pub upper: Vec<TimedValue>,
    pub middle: Vec<TimedValue>,
    pub lower: Vec<TimedValue>,
}

impl BandSeries {
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty() && self.middle.is_empty() && self.lower.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportResistance {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd_line: Vec<TimedValue>,
    pub signal_line: Vec<TimedValue>,
    pub histogram: Vec<TimedValue>,
}

impl MacdSeries {
    /// Histogram points colored by sign
    pub fn colored_histogram(&self) -> Vec<HistogramBar> {
        self.histogram
            .iter()
            .map(|point| HistogramBar {
                time: point.time,
                value: point.value,
                color: if point.value >= 0.0 {
                    HISTOGRAM_POSITIVE_COLOR
                } else {
                    HISTOGRAM_NEGATIVE_COLOR
                },
            })
            .collect()
    }
}

/// Indicator bundle for one `(ticker, period)` pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorDataset {
    pub bands: BandSeries,
    pub levels: SupportResistance,
    pub oscillator_a: Vec<TimedValue>,
    pub oscillator_b: MacdSeries,
}

impl IndicatorDataset {
    /// First and last timestamp the dataset covers.
    ///
    /// Taken from the RSI series, then the band middle line, then the MACD
    /// line, whichever is non-empty first.
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        [&self.oscillator_a, &self.bands.middle, &self.oscillator_b.macd_line]
            .into_iter()
            .find_map(|series| span_of(series))
    }
}

/// First and last timestamp of a series
pub fn span_of(series: &[TimedValue]) -> Option<(Timestamp, Timestamp)> {
    Some((series.first()?.time, series.last()?.time))
}

/// Two-point flat line across `span`
pub fn flat_line(span: (Timestamp, Timestamp), level: f64) -> [TimedValue; 2] {
    [TimedValue::new(span.0, level), TimedValue::new(span.1, level)]
}
