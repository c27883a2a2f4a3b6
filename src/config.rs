use gloo::utils::format::JsValueSerdeExt;
use serde::Deserialize;
use wasm_bindgen::JsValue;

use crate::application::{OscillatorPanes, SessionSettings};
use crate::domain::chart::{ContainerId, RangeToken};
use crate::domain::errors::ApplicationError;
use crate::domain::logging::LogLevel;
use crate::domain::market_data::HistoryPeriod;

/// Page wiring for the chart subsystem. Every field is optional on the JS side;
/// a missing, malformed or invalid object falls back to the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Prefix for API requests; empty means same origin
    pub api_base_url: String,
    pub summary_container: String,
    pub detail_container: String,
    pub oscillator_a_container: String,
    pub oscillator_b_container: String,
    pub detail_height: u32,
    pub oscillator_height: u32,
    pub summary_range: RangeToken,
    pub period: HistoryPeriod,
    pub log_level: LogLevel,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            summary_container: "summary-chart-container".to_string(),
            detail_container: "us-stock-chart".to_string(),
            oscillator_a_container: "us-rsi-chart".to_string(),
            oscillator_b_container: "us-macd-chart".to_string(),
            detail_height: 300,
            oscillator_height: 80,
            summary_range: RangeToken::default(),
            period: HistoryPeriod::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl DashboardConfig {
    /// Read the config object handed over by the page. `undefined` and
    /// `null` mean "all defaults".
    pub fn try_from_js(value: &JsValue) -> Result<Self, ApplicationError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }

        let config = value
            .into_serde::<Self>()
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        let containers = [
            &self.summary_container,
            &self.detail_container,
            &self.oscillator_a_container,
            &self.oscillator_b_container,
        ];
        if containers.iter().any(|id| id.trim().is_empty()) {
            return Err(ApplicationError::Configuration("container ids must not be empty".to_string()));
        }
        if self.detail_height == 0 || self.oscillator_height == 0 {
            return Err(ApplicationError::Configuration("chart heights must be positive".to_string()));
        }
        Ok(())
    }

    pub fn summary_settings(&self) -> SessionSettings {
        SessionSettings::summary(ContainerId::new(&self.summary_container)).with_range(self.summary_range)
    }

    pub fn detail_settings(&self) -> SessionSettings {
        SessionSettings::detail(ContainerId::new(&self.detail_container), self.detail_height)
            .with_period(self.period)
    }

    pub fn oscillator_panes(&self) -> OscillatorPanes {
        OscillatorPanes {
            oscillator_a: ContainerId::new(&self.oscillator_a_container),
            oscillator_b: ContainerId::new(&self.oscillator_b_container),
            height: self.oscillator_height,
        }
    }
}
