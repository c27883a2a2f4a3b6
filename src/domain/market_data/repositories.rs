use crate::domain::errors::RepositoryResult;
use crate::domain::indicators::IndicatorDataset;
use crate::domain::market_data::{HistoryPeriod, PriceHistory, Ticker};

/// Source of chart data.
///
/// An explicit `error` payload from the backend is an `Err`; a well-formed
/// answer with zero candles is an empty `PriceHistory`.
#[allow(async_fn_in_trait)]
pub trait MarketDataRepository {
    /// Full candle history of one instrument for the requested period
    async fn fetch_price_history(
        &self,
        ticker: &Ticker,
        period: HistoryPeriod,
    ) -> RepositoryResult<PriceHistory>;

    /// Technical indicator bundle for the same `(ticker, period)` pair
    async fn fetch_indicators(
        &self,
        ticker: &Ticker,
        period: HistoryPeriod,
    ) -> RepositoryResult<IndicatorDataset>;
}
