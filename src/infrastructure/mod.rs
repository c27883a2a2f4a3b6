pub mod dto;
pub mod http;
pub mod lightweight_charts;
pub mod services;

pub use http::DashboardHttpClient;
pub use lightweight_charts::LightweightChartsBackend;
pub use services::{BrowserTimeProvider, ConsoleLogger};
