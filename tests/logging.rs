mod common;

use std::rc::Rc;
use std::sync::{Mutex, Once};

use common::*;
use dashboard_charts_wasm::application::{ChartSessionController, SessionSettings};
use dashboard_charts_wasm::domain::chart::ContainerId;
use dashboard_charts_wasm::domain::logging::{LogEntry, LogLevel, Logger, install_logger};
use dashboard_charts_wasm::domain::market_data::PriceHistory;

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
static INSTALL: Once = Once::new();

struct CapturingLogger;

impl Logger for CapturingLogger {
    fn log(&self, entry: LogEntry) {
        let mut line = format!("{} {} | {}", entry.level, entry.component, entry.message);
        if let Some(context) = &entry.context {
            line.push_str(" | ");
            line.push_str(context);
        }
        if let Ok(mut lines) = CAPTURED.lock() {
            lines.push(line);
        }
    }
}

/// Tests share one process-wide logger; each one filters by what it logged.
fn capture() {
    INSTALL.call_once(|| {
        assert!(install_logger(Box::new(CapturingLogger), LogLevel::Trace));
    });
}

fn captured_containing(needle: &str) -> Vec<String> {
    CAPTURED.lock().unwrap().iter().filter(|line| line.contains(needle)).cloned().collect()
}

fn summary_session(
    repository: &Rc<ScriptedRepository>,
) -> ChartSessionController<ScriptedRepository, FakeBackend> {
    let backend = Rc::new(FakeBackend::with_containers(&["summary"]));
    ChartSessionController::new(
        Rc::clone(repository),
        backend,
        SessionSettings::summary(ContainerId::new("summary")),
    )
}

#[test]
fn failed_loads_warn_with_ticker_and_period() {
    capture();
    let repository = Rc::new(ScriptedRepository::default());
    let session = summary_session(&repository);
    let mut driver = Driver::new();

    let s = session.clone();
    driver.start(async move { s.select_instrument(ticker("AAPL")).await });
    repository.answer_price(0, Err(upstream("Ticker not found")));
    driver.settle();

    assert_eq!(
        captured_containing("Failed to load AAPL"),
        vec![
            " WARN APP:ChartSession | Failed to load AAPL: Repository: Ticker not found | ticker=AAPL period=1y"
                .to_string()
        ]
    );
}

#[test]
fn empty_history_is_logged_at_info() {
    capture();
    let repository = Rc::new(ScriptedRepository::default());
    let session = summary_session(&repository);
    let mut driver = Driver::new();

    let s = session.clone();
    driver.start(async move { s.select_instrument(ticker("MSFT")).await });
    repository.answer_price(0, Ok(PriceHistory::default()));
    driver.settle();

    assert_eq!(
        captured_containing("MSFT returned no candles"),
        vec![" INFO APP:ChartSession | MSFT returned no candles".to_string()]
    );
}

#[test]
fn second_install_keeps_the_first_logger_and_warns() {
    capture();

    assert!(!install_logger(Box::new(CapturingLogger), LogLevel::Error));
    assert_eq!(
        captured_containing("Error level ignored"),
        vec![" WARN DOM:Logging | Logger already installed; Error level ignored".to_string()]
    );
    assert_eq!(captured_containing("logging at Trace level").len(), 1);
}
