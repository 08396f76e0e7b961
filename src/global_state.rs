use leptos::*;
use once_cell::sync::OnceCell;

use crate::domain::market_data::{Symbol, TimeInterval};

/// Default instrument shown on first load.
pub const DEFAULT_SYMBOL: &str = "THYAO.IS";

pub struct Globals {
    pub current_symbol: RwSignal<Symbol>,
    pub current_interval: RwSignal<TimeInterval>,
    pub is_loading: RwSignal<bool>,
    pub status: RwSignal<String>,
    pub candle_count: RwSignal<usize>,
}

static GLOBALS: OnceCell<Globals> = OnceCell::new();

pub fn globals() -> &'static Globals {
    GLOBALS.get_or_init(|| Globals {
        current_symbol: create_rw_signal(Symbol::from(DEFAULT_SYMBOL)),
        current_interval: create_rw_signal(TimeInterval::default()),
        is_loading: create_rw_signal(false),
        status: create_rw_signal(String::new()),
        candle_count: create_rw_signal(0),
    })
}

crate::global_signals! {
    pub current_symbol => current_symbol: Symbol,
    pub current_interval => current_interval: TimeInterval,
    pub is_loading => is_loading: bool,
    pub status => status: String,
    pub candle_count => candle_count: usize,
}
