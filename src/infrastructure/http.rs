use gloo_net::http::Request;
use serde::de::DeserializeOwned;

use crate::domain::{
    errors::{InfrastructureError, NetworkError, RepositoryError, RepositoryResult},
    indicators::IndicatorDataset,
    logging::{LogComponent, get_logger},
    market_data::{HistoryPeriod, MarketDataRepository, PriceHistory, Ticker},
};

use super::dto::{ErrorBody, StockChartResponse, TechnicalIndicatorsResponse};
use crate::log_info;

/// HTTP client for the dashboard backend
#[derive(Debug, Clone)]
pub struct DashboardHttpClient {
    base_url: String,
}

impl Default for DashboardHttpClient {
    fn default() -> Self {
        Self::new("")
    }
}

impl DashboardHttpClient {
    /// `base_url` may be empty for same-origin requests
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn stock_chart_url(&self, ticker: &Ticker, period: HistoryPeriod) -> String {
        format!("{}/api/us/stock-chart/{}?period={}", self.base_url, ticker.value(), period.as_query())
    }

    pub fn indicators_url(&self, ticker: &Ticker, period: HistoryPeriod) -> String {
        format!(
            "{}/api/us/technical-indicators/{}?period={}",
            self.base_url,
            ticker.value(),
            period.as_query()
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> RepositoryResult<T> {
        get_logger().debug(LogComponent::Infrastructure("DashboardHttpClient"), &format!("GET {url}"));

        let response = Request::get(url).send().await.map_err(|e| {
            NetworkError::HttpRequestFailed(format!("Failed to send request: {e:?}"))
        })?;

        if !response.ok() {
            let status = response.status();
            let text = response.status_text();
            // The backend reports missing tickers as 404 with an `error` body
            if let Ok(ErrorBody { error: Some(message) }) = response.json::<ErrorBody>().await {
                return Err(RepositoryError::Upstream(message).into());
            }
            return Err(NetworkError::HttpStatus { status, text }.into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RepositoryError::ParseError(format!("Failed to parse JSON: {e}")).into())
    }
}

impl MarketDataRepository for DashboardHttpClient {
    async fn fetch_price_history(
        &self,
        ticker: &Ticker,
        period: HistoryPeriod,
    ) -> RepositoryResult<PriceHistory> {
        let body: StockChartResponse = self.get_json(&self.stock_chart_url(ticker, period)).await?;
        let history = body.into_domain().map_err(InfrastructureError::from)?;

        log_info!(
            LogComponent::Infrastructure("DashboardHttpClient"),
            "Loaded {} candles for {} ({})",
            history.len(),
            ticker,
            period
        );
        Ok(history)
    }

    async fn fetch_indicators(
        &self,
        ticker: &Ticker,
        period: HistoryPeriod,
    ) -> RepositoryResult<IndicatorDataset> {
        let body: TechnicalIndicatorsResponse = self.get_json(&self.indicators_url(ticker, period)).await?;
        body.into_domain().map_err(InfrastructureError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_carry_ticker_and_period() {
        let client = DashboardHttpClient::new("http://localhost:5000/");
        let ticker = Ticker::new("aapl").unwrap();

        assert_eq!(
            client.stock_chart_url(&ticker, HistoryPeriod::SixMonths),
            "http://localhost:5000/api/us/stock-chart/AAPL?period=6mo"
        );
        assert_eq!(
            client.indicators_url(&ticker, HistoryPeriod::default()),
            "http://localhost:5000/api/us/technical-indicators/AAPL?period=1y"
        );
    }

    #[test]
    fn default_client_uses_relative_urls() {
        let client = DashboardHttpClient::default();
        assert_eq!(
            client.stock_chart_url(&Ticker::from("msft"), HistoryPeriod::Max),
            "/api/us/stock-chart/MSFT?period=max"
        );
    }
}
