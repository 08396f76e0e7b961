use leptos::*;
use std::rc::Rc;

use crate::{
    application::LoadMarketDataUseCase,
    domain::{
        errors::AppError,
        logging::{LogComponent, get_logger},
        market_data::{MarketSnapshot, Symbol},
    },
    global_state::{candle_count, current_interval, current_symbol, is_loading, status},
    infrastructure::{ApiClient, ApiConfig},
    presentation::ChartView,
};

/// 🦀 Главный компонент терминала на Leptos
#[component]
pub fn App() -> impl IntoView {
    let api = Rc::new(ApiClient::new(ApiConfig::default()));
    let load_market = Rc::new(LoadMarketDataUseCase::new(api.clone()));
    let snapshot = create_rw_signal(None::<Rc<MarketSnapshot>>);

    // Every symbol or interval change starts a new request; the previous one
    // is aborted inside the use case.
    create_effect(move |_| {
        let symbol = current_symbol().get();
        let interval = current_interval().get();
        is_loading().set(true);
        status().set(format!("⏳ Loading {} ({})...", symbol.display_name(), interval));
        let request = load_market.execute(&symbol, interval);
        spawn_local(async move {
            match request.await {
                Ok(data) => {
                    candle_count().set(data.candles.len());
                    status().set(format!("✅ {} bars", data.candles.len()));
                    snapshot.set(Some(Rc::new(data)));
                    is_loading().set(false);
                }
                Err(AppError::Aborted) => {}
                Err(e) => {
                    get_logger().error(LogComponent::Presentation("App"), &format!("❌ Market data failed: {}", e));
                    candle_count().set(0);
                    status().set(format!("❌ {}", e));
                    snapshot.set(None);
                    is_loading().set(false);
                }
            }
        });
    });

    let is_empty = move || !is_loading().get() && snapshot.with(|s| s.as_ref().is_none_or(|s| s.is_empty()));

    view! {
        <style>
            {r#"
            .terminal-app {
                font-family: 'SF Pro Display', -apple-system, BlinkMacSystemFont, sans-serif;
                background: #131722;
                min-height: 100vh;
                padding: 12px;
                color: #d1d4dc;
                box-sizing: border-box;
            }

            .header {
                display: flex;
                align-items: center;
                gap: 24px;
                margin-bottom: 8px;
            }

            .symbol-input {
                background: #1e222d;
                color: white;
                border: 1px solid #2a2e39;
                border-radius: 4px;
                padding: 6px 10px;
                font-size: 14px;
                text-transform: uppercase;
                width: 120px;
            }

            .status {
                color: #72c685;
                font-size: 13px;
            }

            .toolbar {
                display: flex;
                flex-wrap: wrap;
                gap: 12px;
                margin-bottom: 8px;
            }

            .toolbar-group {
                display: flex;
                flex-wrap: wrap;
                gap: 4px;
            }

            .toolbar-btn {
                background: #2a2e39;
                color: #d1d4dc;
                border: none;
                padding: 4px 8px;
                border-radius: 4px;
                cursor: pointer;
                font-size: 12px;
            }

            .toolbar-btn.active {
                background: #2962ff;
                color: white;
            }

            .toolbar-btn.danger:hover {
                background: #ef5350;
            }

            .chart-stack {
                position: relative;
            }

            .pane-host {
                width: 100%;
                height: calc(100vh - 140px);
                display: flex;
                flex-direction: column;
            }

            .drawing-overlay {
                position: absolute;
                top: 0;
                left: 0;
                z-index: 5;
            }

            .legend {
                position: absolute;
                top: 6px;
                left: 8px;
                z-index: 6;
                gap: 10px;
                flex-wrap: wrap;
                font-size: 12px;
                font-family: 'Courier New', monospace;
                pointer-events: none;
            }

            .drawing-menu {
                position: fixed;
                z-index: 1000;
                display: flex;
                flex-direction: column;
                background: #1e222d;
                border: 1px solid #2a2e39;
                border-radius: 6px;
                box-shadow: 0 4px 12px rgba(0, 0, 0, 0.5);
            }

            .drawing-menu-item {
                background: none;
                border: none;
                color: #d1d4dc;
                padding: 6px 16px;
                text-align: left;
                cursor: pointer;
            }

            .drawing-menu-item.danger {
                color: #ef5350;
            }

            .empty-state {
                position: absolute;
                top: 40%;
                width: 100%;
                text-align: center;
                color: #787b86;
                z-index: 4;
            }
            "#}
        </style>
        <div class="terminal-app">
            <Header />
            <div class="chart-stack">
                <ChartView api=api symbol=current_symbol() snapshot=snapshot />
                <Show when=is_empty>
                    <div class="empty-state">"📭 No data for this instrument"</div>
                </Show>
            </div>
        </div>
    }
}

/// 📊 Заголовок: поиск инструмента и статус загрузки
#[component]
fn Header() -> impl IntoView {
    let on_change = move |ev: web_sys::Event| match Symbol::new(event_target_value(&ev)) {
        Ok(symbol) => current_symbol().set(symbol.normalized()),
        Err(e) => status().set(format!("❌ {}", e)),
    };

    view! {
        <div class="header">
            <input
                class="symbol-input"
                prop:value=move || current_symbol().get().value().to_string()
                on:change=on_change
            />
            <span>{move || current_symbol().get().display_name().to_string()}</span>
            <span class="status">
                {move || if is_loading().get() { "⏳".to_string() } else { format!("{} bars", candle_count().get()) }}
            </span>
            <span class="status">{move || status().get()}</span>
        </div>
    }
}
