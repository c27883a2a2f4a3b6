use leptos::*;
use strum::IntoEnumIterator;

use crate::application::SessionPhase;
use crate::domain::chart::RangeToken;
use crate::domain::indicators::IndicatorKind;
use crate::domain::market_data::HistoryPeriod;
use crate::global_state::{detail_period, detail_phase, detail_range, indicator_flags, selected_ticker};

/// Text under the detail chart
pub fn status_line(ticker: Option<&str>, phase: &SessionPhase) -> String {
    match ticker {
        Some(ticker) => format!("{ticker}: {phase}"),
        None => "Select an instrument".to_string(),
    }
}

/// Range, period and indicator buttons for the detail chart
#[component]
pub fn ChartControls(
    on_range: Callback<RangeToken>,
    on_period: Callback<HistoryPeriod>,
    on_toggle: Callback<IndicatorKind>,
    on_retry: Callback<()>,
) -> impl IntoView {
    let range = detail_range();
    let period = detail_period();
    let flags = indicator_flags();
    let phase = detail_phase();
    let ticker = selected_ticker();

    let can_retry = move || matches!(phase.get(), SessionPhase::Error(_) | SessionPhase::NoData);

    view! {
        <div class="chart-controls flex flex-wrap items-center gap-2 text-xs">
            <div class="range-buttons flex gap-1">
                {RangeToken::iter()
                    .map(|token| view! {
                        <button
                            class="px-2 py-1 rounded"
                            class:active=move || range.get() == token
                            on:click=move |_| on_range.call(token)
                        >
                            {token.to_string()}
                        </button>
                    })
                    .collect_view()}
            </div>

            <div class="period-buttons flex gap-1">
                {HistoryPeriod::iter()
                    .map(|value| view! {
                        <button
                            class="px-2 py-1 rounded"
                            class:active=move || period.get() == value
                            on:click=move |_| on_period.call(value)
                        >
                            {value.to_string()}
                        </button>
                    })
                    .collect_view()}
            </div>

            <div class="indicator-toggles flex gap-1">
                {IndicatorKind::iter()
                    .map(|kind| view! {
                        <button
                            id=format!("toggle-{kind}")
                            class="px-2 py-1 rounded"
                            class:active=move || flags.get().is_on(kind)
                            on:click=move |_| on_toggle.call(kind)
                        >
                            {kind.label()}
                        </button>
                    })
                    .collect_view()}
            </div>

            <span class="chart-status text-gray-400">
                {move || status_line(ticker.get().as_deref(), &phase.get())}
            </span>

            <Show when=can_retry>
                <button class="px-2 py-1 rounded bg-gray-700" on:click=move |_| on_retry.call(())>
                    "Retry"
                </button>
            </Show>
        </div>
    }
}
