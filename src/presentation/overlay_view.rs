use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::MouseEvent;

use crate::application::ChartCoordinator;
use crate::domain::chart::{CoordinateAdapter, PixelPoint};
use crate::domain::drawing::overlay::{HANDLE_RADIUS_PX, LABEL_FONT_PX};
use crate::domain::drawing::{AnnotationOverlay, DragState, PointerButton, ScenePrimitive, ShapeScene};
use crate::domain::events::DrawingEvent;
use crate::domain::logging::{LogComponent, get_logger};
use crate::event_utils::PointerReleaseListener;

pub type SharedCoordinator = Rc<RefCell<Option<ChartCoordinator>>>;
pub type SharedOverlay = Rc<RefCell<AnnotationOverlay>>;

/// Invisible stroke that widens the clickable area of thin lines.
const HIT_STROKE_PX: f64 = 20.0;

/// Run `f` against the primary pane's anchor-series adapter. `None` while
/// the chart is not built or is being rebuilt.
pub fn with_primary_adapter<R>(
    coordinator: &SharedCoordinator,
    f: impl FnOnce(&CoordinateAdapter<'_>) -> R,
) -> Option<R> {
    let slot = coordinator.try_borrow().ok()?;
    let primary = slot.as_ref()?.primary()?;
    let adapter = CoordinateAdapter::new(primary.pane.coordinate_space(), primary.anchor?);
    Some(f(&adapter))
}

/// Pointer position relative to the element the listener is attached to.
fn local_point(ev: &MouseEvent) -> Option<PixelPoint> {
    let target = ev.current_target()?.dyn_into::<web_sys::Element>().ok()?;
    let rect = target.get_bounding_client_rect();
    Some(PixelPoint::new(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

fn log_drawing_event(event: &DrawingEvent) {
    get_logger().info(LogComponent::Presentation("DrawingOverlay"), &format!("✏️ {:?}", event));
}

/// 🖊️ SVG-слой построений поверх основной панели.
///
/// Transparent to the pointer unless a tool is armed or a gesture is in
/// progress; existing shapes always accept a press so they can be dragged.
#[component]
pub fn DrawingOverlay(
    overlay: SharedOverlay,
    coordinator: SharedCoordinator,
    revision: RwSignal<u64>,
    #[prop(into)] width: Signal<f64>,
    #[prop(into)] height: Signal<f64>,
) -> impl IntoView {
    let bump = move || revision.update(|r| *r = r.wrapping_add(1));

    let on_mousedown = {
        let overlay = overlay.clone();
        let coordinator = coordinator.clone();
        move |ev: MouseEvent| {
            let Some(at) = local_point(&ev) else {
                return;
            };
            let button = PointerButton::from_dom(ev.button());
            let started = with_primary_adapter(&coordinator, |adapter| {
                overlay.try_borrow_mut().map(|mut o| o.pointer_down(adapter, at, button)).unwrap_or(false)
            })
            .unwrap_or(false);
            if started {
                ev.prevent_default();
                ev.stop_propagation();
            }
            bump();
        }
    };

    let on_mousemove = {
        let overlay = overlay.clone();
        let coordinator = coordinator.clone();
        move |ev: MouseEvent| {
            let Some(at) = local_point(&ev) else {
                return;
            };
            let moved = with_primary_adapter(&coordinator, |adapter| {
                overlay.try_borrow_mut().map(|mut o| o.pointer_move(adapter, at)).unwrap_or(false)
            })
            .unwrap_or(false);
            if moved {
                bump();
            }
        }
    };

    let on_contextmenu = {
        let overlay = overlay.clone();
        let coordinator = coordinator.clone();
        move |ev: MouseEvent| {
            let Some(at) = local_point(&ev) else {
                return;
            };
            let client = PixelPoint::new(ev.client_x() as f64, ev.client_y() as f64);
            let menu = with_primary_adapter(&coordinator, |adapter| {
                overlay.try_borrow_mut().ok().and_then(|mut o| o.open_context_menu(adapter, at, client))
            })
            .flatten();
            if menu.is_some() {
                ev.prevent_default();
                bump();
            }
        }
    };

    // Released anywhere in the window, so a drag that leaves the chart still ends.
    let release = {
        let overlay = overlay.clone();
        PointerReleaseListener::attach(move |_ev: MouseEvent| {
            let Ok(mut o) = overlay.try_borrow_mut() else {
                return;
            };
            if matches!(o.drag_state(), DragState::Idle) {
                return;
            }
            if let Some(event) = o.pointer_up() {
                log_drawing_event(&event);
            }
            drop(o);
            bump();
        })
    };
    if release.is_none() {
        get_logger().warn(LogComponent::Presentation("DrawingOverlay"), "⚠️ Window mouseup listener unavailable");
    }
    on_cleanup(move || drop(release));

    let capturing = {
        let overlay = overlay.clone();
        move || {
            revision.track();
            overlay.try_borrow().map(|o| o.is_capturing()).unwrap_or(false)
        }
    };
    let drawing_mode = {
        let overlay = overlay.clone();
        move || {
            revision.track();
            overlay.try_borrow().map(|o| o.is_drawing_mode()).unwrap_or(false)
        }
    };

    let scenes = {
        let overlay = overlay.clone();
        let coordinator = coordinator.clone();
        move || {
            revision.track();
            let width = width.get();
            with_primary_adapter(&coordinator, |adapter| {
                overlay.try_borrow().map(|o| o.render(adapter, width)).unwrap_or_default()
            })
            .unwrap_or_default()
        }
    };

    let menu = {
        let overlay = overlay.clone();
        move || {
            revision.track();
            let menu = overlay.try_borrow().ok()?.context_menu()?;
            let on_delete = {
                let overlay = overlay.clone();
                move |_: MouseEvent| {
                    if let Ok(mut o) = overlay.try_borrow_mut() {
                        if let Some(event) = o.delete(menu.id) {
                            log_drawing_event(&event);
                        }
                    }
                    bump();
                }
            };
            let on_cancel = {
                let overlay = overlay.clone();
                move |_: MouseEvent| {
                    if let Ok(mut o) = overlay.try_borrow_mut() {
                        o.cancel_context_menu();
                    }
                    bump();
                }
            };
            Some(view! {
                <div
                    class="drawing-menu"
                    style:left=format!("{}px", menu.position.x)
                    style:top=format!("{}px", menu.position.y)
                >
                    <button class="drawing-menu-item danger" on:click=on_delete>"Sil"</button>
                    <button class="drawing-menu-item" on:click=on_cancel>"Vazgeç"</button>
                </div>
            })
        }
    };

    view! {
        <svg
            class="drawing-overlay"
            width=move || width.get()
            height=move || height.get()
            style:pointer-events=move || if capturing() { "all" } else { "none" }
            style:cursor=move || if drawing_mode() { "crosshair" } else { "default" }
            on:mousedown=on_mousedown
            on:mousemove=on_mousemove
            on:contextmenu=on_contextmenu
        >
            {move || scenes().into_iter().map(shape_view).collect_view()}
        </svg>
        {menu}
    }
}

fn shape_view(scene: ShapeScene) -> View {
    let ShapeScene { color, opacity, ghost, primitives, .. } = scene;
    let pointer = if ghost { "none" } else { "visiblePainted" };
    let children = primitives.into_iter().map(|p| primitive_view(&color, ghost, p)).collect_view();
    view! { <g opacity=opacity style:pointer-events=pointer>{children}</g> }.into_view()
}

fn primitive_view(color: &str, ghost: bool, primitive: ScenePrimitive) -> View {
    match primitive {
        ScenePrimitive::Line { from, to, width, dash, opacity } => {
            let hit = (!ghost).then(|| {
                view! {
                    <line
                        x1=from.x y1=from.y x2=to.x y2=to.y
                        stroke="transparent"
                        stroke-width=HIT_STROKE_PX
                        style:cursor="move"
                    />
                }
            });
            view! {
                <line
                    x1=from.x y1=from.y x2=to.x y2=to.y
                    stroke=color.to_string()
                    stroke-width=width
                    stroke-dasharray=dash.unwrap_or("none")
                    opacity=opacity
                />
                {hit}
            }
            .into_view()
        }
        ScenePrimitive::Rect { min, max, fill } => view! {
            <rect
                x=min.x y=min.y
                width=max.x - min.x
                height=max.y - min.y
                fill=fill
                stroke=color.to_string()
                stroke-width=1.0
                style:cursor="move"
            />
        }
        .into_view(),
        ScenePrimitive::Handle { center, .. } => view! {
            <circle
                cx=center.x cy=center.y
                r=HANDLE_RADIUS_PX
                fill="#ffffff"
                stroke=color.to_string()
                stroke-width=2.0
                style:cursor="pointer"
            />
        }
        .into_view(),
        ScenePrimitive::Label { at, text } => view! {
            <text x=at.x y=at.y fill=color.to_string() font-size=LABEL_FONT_PX style:pointer-events="none">
                {text}
            </text>
        }
        .into_view(),
    }
}
