use std::cell::RefCell;
use std::rc::Rc;

use leptos::html::Div;
use leptos::*;
use strum::IntoEnumIterator;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::overlay_view::{DrawingOverlay, SharedCoordinator, SharedOverlay};
use crate::application::{ChartCoordinator, LoadDrawingsUseCase};
use crate::domain::chart::legend::HoverReadout;
use crate::domain::chart::{ChartSettings, IndicatorId, PaneId, PaneLayout, SettingsStore, VisibilityConfig};
use crate::domain::drawing::{AnnotationOverlay, DrawingKind};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{MarketSnapshot, Symbol, TimeInterval};
use crate::global_state::{current_interval, status};
use crate::infrastructure::{
    AnimationFrameScheduler, ApiClient, LightweightPaneFactory, LocalSettingsStore, RemoteDrawingStore,
};
use crate::time_utils::{format_price, format_time_key};

struct ResizeWatch {
    observer: web_sys::ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

fn build_coordinator(host: web_sys::HtmlElement, hover: RwSignal<HoverReadout>, revision: RwSignal<u64>) -> ChartCoordinator {
    let mut chart = ChartCoordinator::new(
        Rc::new(LightweightPaneFactory::new(host)),
        Rc::new(AnimationFrameScheduler::new()),
    );
    chart.set_hover_sink(Rc::new(move |_pane: PaneId, readout: HoverReadout| hover.set(readout)));
    chart.set_range_listener(Rc::new(move || revision.update(|r| *r = r.wrapping_add(1))));
    chart
}

fn host_element(host: &HtmlElement<Div>) -> web_sys::HtmlElement {
    let div: &web_sys::HtmlDivElement = host;
    div.clone().into()
}

fn host_size(host: &web_sys::HtmlElement) -> (f64, f64) {
    (host.client_width() as f64, host.client_height() as f64)
}

/// 📊 Дашборд: панели, тулбар, легенда и слой построений.
#[component]
pub fn ChartView(
    api: Rc<ApiClient>,
    #[prop(into)] symbol: Signal<Symbol>,
    #[prop(into)] snapshot: Signal<Option<Rc<MarketSnapshot>>>,
) -> impl IntoView {
    let settings = Rc::new(LocalSettingsStore::new());
    let visibility = create_rw_signal(settings.load_or_default().visibility);
    let revision = create_rw_signal(0u64);
    let hover = create_rw_signal(HoverReadout::default());
    let layout = create_rw_signal(None::<PaneLayout>);
    let host_ref = create_node_ref::<Div>();
    let resize_watch = store_value(None::<ResizeWatch>);
    let bump = move || revision.update(|r| *r = r.wrapping_add(1));

    let coordinator: SharedCoordinator = Rc::new(RefCell::new(None));
    let overlay: SharedOverlay =
        Rc::new(RefCell::new(AnnotationOverlay::new(Rc::new(RemoteDrawingStore::new(api.clone())))));

    // Persist toggles, skipping the initial load.
    create_effect(move |previous: Option<()>| {
        let config = visibility.get();
        if previous.is_some() {
            if let Err(e) = settings.save(&ChartSettings { visibility: config }) {
                get_logger().warn(LogComponent::Presentation("ChartView"), &format!("⚠️ Settings not saved: {}", e));
            }
        }
    });

    let load_drawings = Rc::new(LoadDrawingsUseCase::new(api));
    create_effect({
        let overlay = overlay.clone();
        move |_| {
            let symbol = symbol.get();
            let load = load_drawings.execute(&overlay, &symbol);
            bump();
            spawn_local(async move {
                if load.await {
                    bump();
                }
            });
        }
    });

    create_effect({
        let coordinator = coordinator.clone();
        move |_| {
            let snapshot = snapshot.get();
            let config = visibility.get();
            let Some(host) = host_ref.get() else {
                return;
            };
            let host = host_element(&host);
            let (width, height) = host_size(&host);
            let Ok(mut slot) = coordinator.try_borrow_mut() else {
                return;
            };
            let chart = slot.get_or_insert_with(|| build_coordinator(host.clone(), hover, revision));
            hover.set(HoverReadout::default());
            match snapshot {
                Some(snapshot) => {
                    if let Err(e) = chart.rebuild(snapshot, &config, width, height) {
                        get_logger().error(LogComponent::Presentation("ChartView"), &format!("❌ Chart build failed: {}", e));
                        status().set(format!("❌ {}", e));
                    }
                }
                None => chart.teardown(),
            }
            layout.set(chart.layout());
            drop(slot);
            bump();
        }
    });

    create_effect({
        let coordinator = coordinator.clone();
        move |_| {
            let Some(host) = host_ref.get() else {
                return;
            };
            if resize_watch.with_value(|w| w.is_some()) {
                return;
            }
            let host = host_element(&host);
            let observed = host.clone();
            let coordinator = coordinator.clone();
            let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
                let (width, height) = host_size(&observed);
                let Ok(mut slot) = coordinator.try_borrow_mut() else {
                    return;
                };
                if let Some(chart) = slot.as_mut() {
                    if chart.resize(width, height) {
                        layout.set(chart.layout());
                    }
                }
                drop(slot);
                bump();
            });
            match web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref()) {
                Ok(observer) => {
                    observer.observe(&host);
                    resize_watch.set_value(Some(ResizeWatch { observer, _callback: callback }));
                }
                Err(e) => {
                    get_logger().warn(
                        LogComponent::Presentation("ChartView"),
                        &format!("⚠️ ResizeObserver unavailable: {:?}", e),
                    );
                }
            }
        }
    });

    on_cleanup({
        let coordinator = coordinator.clone();
        move || {
            resize_watch.with_value(|w| {
                if let Some(w) = w {
                    w.observer.disconnect();
                }
            });
            if let Ok(mut slot) = coordinator.try_borrow_mut() {
                slot.take();
            }
        }
    });

    let toolbar_overlay = overlay.clone();
    let overlay_width = Signal::derive(move || layout.get().map(|l| l.width).unwrap_or(0.0));
    let overlay_height = Signal::derive(move || layout.get().map(|l| l.height_of(PaneId::PRIMARY)).unwrap_or(0.0));

    view! {
        <div class="chart-view">
            <Toolbar visibility=visibility overlay=toolbar_overlay revision=revision />
            <div class="chart-stack">
                <div class="pane-host" node_ref=host_ref></div>
                <Legend hover=hover />
                <DrawingOverlay
                    overlay=overlay
                    coordinator=coordinator
                    revision=revision
                    width=overlay_width
                    height=overlay_height
                />
            </div>
        </div>
    }
}

#[component]
fn Toolbar(visibility: RwSignal<VisibilityConfig>, overlay: SharedOverlay, revision: RwSignal<u64>) -> impl IntoView {
    let bump = move || revision.update(|r| *r = r.wrapping_add(1));

    let intervals = TimeInterval::all()
        .into_iter()
        .map(|interval| {
            view! {
                <button
                    class="toolbar-btn"
                    class:active=move || current_interval().get() == interval
                    on:click=move |_| current_interval().set(interval)
                >
                    {interval.label()}
                </button>
            }
        })
        .collect_view();

    let indicators = IndicatorId::iter()
        .map(|id| {
            view! {
                <button
                    class="toolbar-btn"
                    class:active=move || visibility.with(|v| v.is_visible(id))
                    on:click=move |_| visibility.update(|v| v.toggle(id))
                >
                    {id.label()}
                </button>
            }
        })
        .collect_view();

    let tools = DrawingKind::all()
        .into_iter()
        .map(|kind| {
            let armed = {
                let overlay = overlay.clone();
                move || {
                    revision.track();
                    overlay.try_borrow().map(|o| o.is_drawing_mode() && o.tool() == kind).unwrap_or(false)
                }
            };
            let on_click = {
                let overlay = overlay.clone();
                move |_: web_sys::MouseEvent| {
                    if let Ok(mut o) = overlay.try_borrow_mut() {
                        o.toggle_tool(kind);
                    }
                    bump();
                }
            };
            view! {
                <button class="toolbar-btn" class:active=armed on:click=on_click>
                    {kind.label()}
                </button>
            }
        })
        .collect_view();

    let on_clear = move |_: web_sys::MouseEvent| {
        if let Ok(mut o) = overlay.try_borrow_mut() {
            let event = o.clear_all();
            get_logger().info(LogComponent::Presentation("Toolbar"), &format!("🧹 {:?}", event));
        }
        bump();
    };

    view! {
        <div class="toolbar">
            <div class="toolbar-group">{intervals}</div>
            <div class="toolbar-group">{indicators}</div>
            <div class="toolbar-group">
                {tools}
                <button class="toolbar-btn danger" on:click=on_clear>"Clear all"</button>
            </div>
        </div>
    }
}

/// Crosshair readout for the hovered bar
#[component]
fn Legend(hover: RwSignal<HoverReadout>) -> impl IntoView {
    let header = move || {
        hover.with(|h| match (h.time, h.price) {
            (Some(time), Some(price)) => format!("{}  {}", format_time_key(time), format_price(price)),
            (Some(time), None) => format_time_key(time),
            _ => String::new(),
        })
    };
    let values = move || {
        hover.with(|h| {
            h.values
                .iter()
                .filter_map(|v| v.value.map(|value| (v.label, value)))
                .map(|(label, value)| {
                    view! {
                        <span class="legend-value">{label}": "{format_price(value)}</span>
                    }
                })
                .collect_view()
        })
    };
    let pattern = move || {
        hover.with(|h| {
            h.pattern.as_ref().map(|p| match p.confidence {
                Some(confidence) => format!("🤖 {} ({:.0}%)", p.label, confidence),
                None => format!("🤖 {}", p.label),
            })
        })
    };

    view! {
        <div class="legend" style:display=move || if hover.with(|h| h.time.is_some()) { "flex" } else { "none" }>
            <span class="legend-header">{header}</span>
            {values}
            <span class="legend-pattern">{pattern}</span>
        </div>
    }
}
