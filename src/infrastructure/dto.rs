//! Wire format of the dashboard backend.
//!
//! Every section is optional and `null` is treated as absent; missing series
//! become empty ones. An `error` field always wins over any data next to it.

use serde::Deserialize;

use crate::domain::errors::RepositoryError;
use crate::domain::indicators::{BandSeries, IndicatorDataset, MacdSeries, SupportResistance};
use crate::domain::market_data::{PriceBar, PriceHistory, TimedValue, Timestamp, Volume};

/// One item of `candles` / `price_history`
#[derive(Debug, Clone, Deserialize)]
pub struct CandleDto {
    pub time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl CandleDto {
    pub fn into_domain(self) -> (PriceBar, Volume) {
        let bar = PriceBar::new(self.time, self.open, self.high, self.low, self.close);
        (bar, Volume::new(self.volume.unwrap_or_default()))
    }
}

/// `GET /api/us/stock-chart/{ticker}`
#[derive(Debug, Default, Deserialize)]
pub struct StockChartResponse {
    #[serde(default)]
    pub candles: Option<Vec<CandleDto>>,
    #[serde(default)]
    pub price_history: Option<Vec<CandleDto>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StockChartResponse {
    /// `candles` takes precedence over `price_history` whenever it is present,
    /// even if empty.
    pub fn into_domain(self) -> Result<PriceHistory, RepositoryError> {
        if let Some(error) = self.error {
            return Err(RepositoryError::Upstream(error));
        }

        let candles = self.candles.or(self.price_history).unwrap_or_default();
        Ok(PriceHistory::from_candles(candles.into_iter().map(CandleDto::into_domain)))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointDto {
    pub time: Timestamp,
    pub value: f64,
}

impl From<PointDto> for TimedValue {
    fn from(point: PointDto) -> Self {
        TimedValue::new(point.time, point.value)
    }
}

fn points(series: Option<Vec<PointDto>>) -> Vec<TimedValue> {
    series.unwrap_or_default().into_iter().map(TimedValue::from).collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct BollingerDto {
    #[serde(default)]
    pub upper: Option<Vec<PointDto>>,
    #[serde(default)]
    pub middle: Option<Vec<PointDto>>,
    #[serde(default)]
    pub lower: Option<Vec<PointDto>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupportResistanceDto {
    #[serde(default)]
    pub support: Option<Vec<f64>>,
    #[serde(default)]
    pub resistance: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MacdDto {
    #[serde(default)]
    pub macd_line: Option<Vec<PointDto>>,
    #[serde(default)]
    pub signal_line: Option<Vec<PointDto>>,
    #[serde(default)]
    pub histogram: Option<Vec<PointDto>>,
}

/// `GET /api/us/technical-indicators/{ticker}`
#[derive(Debug, Default, Deserialize)]
pub struct TechnicalIndicatorsResponse {
    #[serde(default)]
    pub bollinger: Option<BollingerDto>,
    #[serde(default)]
    pub support_resistance: Option<SupportResistanceDto>,
    #[serde(default)]
    pub rsi: Option<Vec<PointDto>>,
    #[serde(default)]
    pub macd: Option<MacdDto>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TechnicalIndicatorsResponse {
    pub fn into_domain(self) -> Result<IndicatorDataset, RepositoryError> {
        if let Some(error) = self.error {
            return Err(RepositoryError::Upstream(error));
        }

        let bollinger = self.bollinger.unwrap_or_default();
        let levels = self.support_resistance.unwrap_or_default();
        let macd = self.macd.unwrap_or_default();

        Ok(IndicatorDataset {
            bands: BandSeries {
                upper: points(bollinger.upper),
                middle: points(bollinger.middle),
                lower: points(bollinger.lower),
            },
            levels: SupportResistance {
                support: levels.support.unwrap_or_default(),
                resistance: levels.resistance.unwrap_or_default(),
            },
            oscillator_a: points(self.rsi),
            oscillator_b: MacdSeries {
                macd_line: points(macd.macd_line),
                signal_line: points(macd.signal_line),
                histogram: points(macd.histogram),
            },
        })
    }
}

/// Body of a failed response, if the backend said why
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{VOLUME_DOWN_COLOR, VOLUME_UP_COLOR};

    fn parse_chart(json: &str) -> Result<PriceHistory, RepositoryError> {
        serde_json::from_str::<StockChartResponse>(json).unwrap().into_domain()
    }

    #[test]
    fn candles_map_to_bars_and_colored_volumes() {
        let history = parse_chart(
            r#"{"ticker":"AAPL","period":"1y","candles":[
                {"time":1700000000,"open":10,"high":12,"low":9,"close":11,"volume":500},
                {"time":1700086400,"open":11,"high":11.5,"low":10,"close":10.5}
            ]}"#,
        )
        .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.bars()[1].close.value(), 10.5);
        assert_eq!(history.volumes()[0].color, VOLUME_UP_COLOR);
        assert_eq!(history.volumes()[1].color, VOLUME_DOWN_COLOR);
        assert_eq!(history.volumes()[1].value.value(), 0.0);
    }

    #[test]
    fn price_history_is_used_when_candles_are_absent() {
        let history = parse_chart(
            r#"{"price_history":[{"time":"2024-01-02","open":1,"high":1,"low":1,"close":1,"volume":null}]}"#,
        )
        .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.bars()[0].time, Timestamp::parse_business_day("2024-01-02").unwrap());
    }

    #[test]
    fn empty_candles_win_over_price_history() {
        let history = parse_chart(
            r#"{"candles":[],"price_history":[{"time":1,"open":1,"high":1,"low":1,"close":1}]}"#,
        )
        .unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn error_field_is_an_upstream_error() {
        let err = parse_chart(r#"{"error":"No data found for ZZZZ"}"#).unwrap_err();
        assert_eq!(err, RepositoryError::Upstream("No data found for ZZZZ".to_string()));
    }

    #[test]
    fn indicator_sections_default_to_empty() {
        let dataset = serde_json::from_str::<TechnicalIndicatorsResponse>(
            r#"{"ticker":"AAPL","rsi":[{"time":1,"value":55.2}],"macd":null,
                "support_resistance":{"support":[101.5]}}"#,
        )
        .unwrap()
        .into_domain()
        .unwrap();

        assert_eq!(dataset.oscillator_a.len(), 1);
        assert!(dataset.bands.is_empty());
        assert!(dataset.oscillator_b.histogram.is_empty());
        assert_eq!(dataset.levels.support, vec![101.5]);
        assert!(dataset.levels.resistance.is_empty());
    }
}
