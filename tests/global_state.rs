use leptos::*;

use dashboard_charts_wasm::application::SessionPhase;
use dashboard_charts_wasm::domain::chart::RangeToken;
use dashboard_charts_wasm::domain::indicators::IndicatorKind;
use dashboard_charts_wasm::global_state::{detail_phase, detail_range, indicator_flags, selected_ticker, summary_range};

#[test]
fn signals_start_idle_and_update() {
    assert_eq!(selected_ticker().get_untracked(), None);
    assert_eq!(detail_phase().get_untracked(), SessionPhase::Empty);
    assert_eq!(detail_range().get_untracked(), RangeToken::All);
    assert_eq!(summary_range().get_untracked(), RangeToken::OneYear);

    selected_ticker().set(Some("AAPL".to_string()));
    indicator_flags().update(|flags| {
        flags.toggle(IndicatorKind::Bands);
    });

    assert_eq!(selected_ticker().get_untracked().as_deref(), Some("AAPL"));
    assert!(indicator_flags().get_untracked().bands);
}
