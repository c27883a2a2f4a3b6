use leptos::*;
use once_cell::sync::OnceCell;

use crate::application::SessionPhase;
use crate::domain::chart::RangeToken;
use crate::domain::indicators::IndicatorFlags;
use crate::domain::market_data::HistoryPeriod;

/// Selection state mirrored for the control bar
pub struct Globals {
    pub selected_ticker: RwSignal<Option<String>>,
    pub detail_phase: RwSignal<SessionPhase>,
    pub detail_range: RwSignal<RangeToken>,
    pub detail_period: RwSignal<HistoryPeriod>,
    pub indicator_flags: RwSignal<IndicatorFlags>,
    pub summary_ticker: RwSignal<Option<String>>,
    pub summary_phase: RwSignal<SessionPhase>,
    pub summary_range: RwSignal<RangeToken>,
}

static GLOBALS: OnceCell<Globals> = OnceCell::new();

pub fn globals() -> &'static Globals {
    GLOBALS.get_or_init(|| Globals {
        selected_ticker: create_rw_signal(None),
        detail_phase: create_rw_signal(SessionPhase::Empty),
        detail_range: create_rw_signal(RangeToken::All),
        detail_period: create_rw_signal(HistoryPeriod::default()),
        indicator_flags: create_rw_signal(IndicatorFlags::default()),
        summary_ticker: create_rw_signal(None),
        summary_phase: create_rw_signal(SessionPhase::Empty),
        summary_range: create_rw_signal(RangeToken::default()),
    })
}

crate::global_signals! {
    pub selected_ticker => selected_ticker: Option<String>,
    pub detail_phase => detail_phase: SessionPhase,
    pub detail_range => detail_range: RangeToken,
    pub detail_period => detail_period: HistoryPeriod,
    pub indicator_flags => indicator_flags: IndicatorFlags,
    pub summary_ticker => summary_ticker: Option<String>,
    pub summary_phase => summary_phase: SessionPhase,
    pub summary_range => summary_range: RangeToken,
}
