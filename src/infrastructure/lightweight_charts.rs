//! Bindings to the `LightweightCharts` browser global and the pane
//! implementation built on them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo::utils::format::JsValueSerdeExt;
use js_sys::Function;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::domain::chart::composition::{SeriesBlueprint, SeriesData, SeriesKind};
use crate::domain::chart::{ChartPane, CoordinateSpace, LogicalRange, PaneFactory, PaneId, PixelPoint, SeriesId};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::events::{CrosshairMove, PaneEvent, PaneEventHandler, PaneEventKind, SubscriptionToken};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::TimeKey;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = LightweightCharts, js_name = createChart, catch)]
    fn create_chart(container: &HtmlElement, options: &JsValue) -> Result<ChartApi, JsValue>;

    type ChartApi;

    #[wasm_bindgen(method, js_name = addCandlestickSeries, catch)]
    fn add_candlestick_series(this: &ChartApi, options: &JsValue) -> Result<SeriesApi, JsValue>;
    #[wasm_bindgen(method, js_name = addLineSeries, catch)]
    fn add_line_series(this: &ChartApi, options: &JsValue) -> Result<SeriesApi, JsValue>;
    #[wasm_bindgen(method, js_name = addHistogramSeries, catch)]
    fn add_histogram_series(this: &ChartApi, options: &JsValue) -> Result<SeriesApi, JsValue>;
    #[wasm_bindgen(method, js_name = timeScale)]
    fn time_scale(this: &ChartApi) -> TimeScaleApi;
    #[wasm_bindgen(method)]
    fn resize(this: &ChartApi, width: f64, height: f64);
    #[wasm_bindgen(method, js_name = applyOptions)]
    fn apply_options(this: &ChartApi, options: &JsValue);
    #[wasm_bindgen(method)]
    fn remove(this: &ChartApi);
    #[wasm_bindgen(method, js_name = subscribeCrosshairMove)]
    fn subscribe_crosshair_move(this: &ChartApi, handler: &Function);
    #[wasm_bindgen(method, js_name = unsubscribeCrosshairMove)]
    fn unsubscribe_crosshair_move(this: &ChartApi, handler: &Function);
    #[wasm_bindgen(method, js_name = setCrosshairPosition)]
    fn set_crosshair_position(this: &ChartApi, price: f64, time: &JsValue, series: &SeriesApi);
    #[wasm_bindgen(method, js_name = clearCrosshairPosition)]
    fn clear_crosshair_position(this: &ChartApi);

    type TimeScaleApi;

    #[wasm_bindgen(method, js_name = timeToCoordinate)]
    fn time_to_coordinate(this: &TimeScaleApi, time: &JsValue) -> JsValue;
    #[wasm_bindgen(method, js_name = coordinateToTime)]
    fn coordinate_to_time(this: &TimeScaleApi, x: f64) -> JsValue;
    #[wasm_bindgen(method, js_name = fitContent)]
    fn fit_content(this: &TimeScaleApi);
    #[wasm_bindgen(method, js_name = getVisibleLogicalRange)]
    fn get_visible_logical_range(this: &TimeScaleApi) -> JsValue;
    #[wasm_bindgen(method, js_name = setVisibleLogicalRange)]
    fn set_visible_logical_range(this: &TimeScaleApi, range: &JsValue);
    #[wasm_bindgen(method, js_name = subscribeVisibleLogicalRangeChange)]
    fn subscribe_visible_logical_range_change(this: &TimeScaleApi, handler: &Function);
    #[wasm_bindgen(method, js_name = unsubscribeVisibleLogicalRangeChange)]
    fn unsubscribe_visible_logical_range_change(this: &TimeScaleApi, handler: &Function);

    type SeriesApi;

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &SeriesApi, data: &JsValue);
    #[wasm_bindgen(method, js_name = setMarkers)]
    fn set_markers(this: &SeriesApi, markers: &JsValue);
    #[wasm_bindgen(method, js_name = createPriceLine)]
    fn create_price_line(this: &SeriesApi, options: &JsValue) -> JsValue;
    #[wasm_bindgen(method, js_name = priceToCoordinate)]
    fn price_to_coordinate(this: &SeriesApi, price: f64) -> JsValue;
    #[wasm_bindgen(method, js_name = coordinateToPrice)]
    fn coordinate_to_price(this: &SeriesApi, y: f64) -> JsValue;
}

/// Shape of the crosshair-move parameter we read.
#[derive(Deserialize)]
struct CrosshairParam {
    #[serde(default)]
    time: Option<TimeKey>,
    #[serde(default)]
    point: Option<PixelPoint>,
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> AppResult<JsValue> {
    JsValue::from_serde(value).map_err(|e| AppError::RenderingError(e.to_string()))
}

fn js_error(context: &str, error: JsValue) -> AppError {
    AppError::RenderingError(format!("{}: {:?}", context, error))
}

fn chart_options(width: f64, height: f64, show_time_axis: bool) -> serde_json::Value {
    json!({
        "width": width,
        "height": height,
        "layout": { "background": { "type": "solid", "color": "#131722" }, "textColor": "#d1d4dc" },
        "grid": { "vertLines": { "color": "#1e222d" }, "horzLines": { "color": "#1e222d" } },
        "crosshair": { "mode": 0 },
        "rightPriceScale": { "borderColor": "#2a2e39" },
        "timeScale": { "borderColor": "#2a2e39", "timeVisible": true, "visible": show_time_axis },
    })
}

struct Subscription {
    kind: PaneEventKind,
    callback: Closure<dyn Fn(JsValue)>,
}

/// One chart instance in its own container div
pub struct LightweightPane {
    id: PaneId,
    chart: ChartApi,
    container: HtmlElement,
    series: RefCell<Vec<SeriesApi>>,
    subscriptions: RefCell<HashMap<SubscriptionToken, Subscription>>,
    next_token: Cell<u64>,
    removed: Cell<bool>,
}

impl LightweightPane {
    fn with_series<R>(&self, series: SeriesId, f: impl FnOnce(&SeriesApi) -> R) -> Option<R> {
        self.series.borrow().get(series.0 as usize).map(f)
    }

    fn detach_callback(&self, subscription: &Subscription) {
        let function: &Function = subscription.callback.as_ref().unchecked_ref();
        match subscription.kind {
            PaneEventKind::VisibleRangeChanged => {
                self.chart.time_scale().unsubscribe_visible_logical_range_change(function)
            }
            PaneEventKind::CrosshairMoved => self.chart.unsubscribe_crosshair_move(function),
        }
    }
}

impl CoordinateSpace for LightweightPane {
    fn time_to_coordinate(&self, time: TimeKey) -> Option<f64> {
        let time = JsValue::from_serde(&time).ok()?;
        self.chart.time_scale().time_to_coordinate(&time).as_f64()
    }

    fn coordinate_to_time(&self, x: f64) -> Option<TimeKey> {
        let time = self.chart.time_scale().coordinate_to_time(x);
        if time.is_null() || time.is_undefined() {
            return None;
        }
        time.into_serde::<TimeKey>().ok()
    }

    fn price_to_coordinate(&self, series: SeriesId, price: f64) -> Option<f64> {
        self.with_series(series, |s| s.price_to_coordinate(price).as_f64()).flatten()
    }

    fn coordinate_to_price(&self, series: SeriesId, y: f64) -> Option<f64> {
        self.with_series(series, |s| s.coordinate_to_price(y).as_f64()).flatten()
    }
}

impl ChartPane for LightweightPane {
    fn id(&self) -> PaneId {
        self.id
    }

    fn coordinate_space(&self) -> &dyn CoordinateSpace {
        self
    }

    fn add_series(&self, blueprint: &SeriesBlueprint) -> AppResult<SeriesId> {
        let options = to_js(&blueprint.style)?;
        let series = match blueprint.kind {
            SeriesKind::Candlestick => self.chart.add_candlestick_series(&options),
            SeriesKind::Line => self.chart.add_line_series(&options),
            SeriesKind::Histogram => self.chart.add_histogram_series(&options),
        }
        .map_err(|e| js_error("add series", e))?;

        let data = match &blueprint.data {
            SeriesData::Candles(candles) => to_js(candles)?,
            SeriesData::Line(points) => to_js(points)?,
            SeriesData::Histogram(bars) => to_js(bars)?,
        };
        series.set_data(&data);
        for line in &blueprint.price_lines {
            series.create_price_line(&to_js(line)?);
        }
        if !blueprint.markers.is_empty() {
            series.set_markers(&to_js(&blueprint.markers)?);
        }

        let mut all = self.series.borrow_mut();
        all.push(series);
        Ok(SeriesId((all.len() - 1) as u32))
    }

    fn resize(&self, width: f64, height: f64) {
        self.chart.resize(width, height);
    }

    fn set_time_axis_visible(&self, visible: bool) {
        if let Ok(options) = to_js(&json!({ "timeScale": { "visible": visible } })) {
            self.chart.apply_options(&options);
        }
    }

    fn fit_content(&self) {
        self.chart.time_scale().fit_content();
    }

    fn visible_logical_range(&self) -> Option<LogicalRange> {
        let range = self.chart.time_scale().get_visible_logical_range();
        if range.is_null() || range.is_undefined() {
            return None;
        }
        range.into_serde::<LogicalRange>().ok()
    }

    fn set_visible_logical_range(&self, range: LogicalRange) {
        if let Ok(range) = to_js(&range) {
            self.chart.time_scale().set_visible_logical_range(&range);
        }
    }

    fn set_crosshair_position(&self, time: TimeKey, anchor: SeriesId) {
        let Ok(time) = JsValue::from_serde(&time) else {
            return;
        };
        self.with_series(anchor, |series| self.chart.set_crosshair_position(0.0, &time, series));
    }

    fn clear_crosshair_position(&self) {
        self.chart.clear_crosshair_position();
    }

    fn subscribe(&self, kind: PaneEventKind, handler: PaneEventHandler) -> SubscriptionToken {
        let callback: Closure<dyn Fn(JsValue)> = match kind {
            PaneEventKind::VisibleRangeChanged => Closure::wrap(Box::new(move |range: JsValue| {
                handler(PaneEvent::VisibleRangeChanged(range.into_serde::<LogicalRange>().ok()));
            }) as Box<dyn Fn(JsValue)>),
            PaneEventKind::CrosshairMoved => Closure::wrap(Box::new(move |param: JsValue| {
                let movement = param
                    .into_serde::<CrosshairParam>()
                    .map(|p| CrosshairMove { time: p.time, point: p.point })
                    .unwrap_or_else(|_| CrosshairMove::left());
                handler(PaneEvent::CrosshairMoved(movement));
            }) as Box<dyn Fn(JsValue)>),
        };

        let function: &Function = callback.as_ref().unchecked_ref();
        match kind {
            PaneEventKind::VisibleRangeChanged => self.chart.time_scale().subscribe_visible_logical_range_change(function),
            PaneEventKind::CrosshairMoved => self.chart.subscribe_crosshair_move(function),
        }

        let token = SubscriptionToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.subscriptions.borrow_mut().insert(token, Subscription { kind, callback });
        token
    }

    fn unsubscribe(&self, _kind: PaneEventKind, token: SubscriptionToken) {
        let removed = self.subscriptions.borrow_mut().remove(&token);
        if let Some(subscription) = removed {
            self.detach_callback(&subscription);
        }
    }

    fn remove(&self) {
        if self.removed.replace(true) {
            return;
        }
        let subscriptions: Vec<Subscription> = self.subscriptions.borrow_mut().drain().map(|(_, s)| s).collect();
        for subscription in &subscriptions {
            self.detach_callback(subscription);
        }
        self.chart.remove();
        self.container.remove();
    }
}

/// Builds panes as stacked divs inside `host`
pub struct LightweightPaneFactory {
    host: HtmlElement,
}

impl LightweightPaneFactory {
    pub fn new(host: HtmlElement) -> Self {
        Self { host }
    }
}

impl PaneFactory for LightweightPaneFactory {
    fn create_pane(&self, id: PaneId, width: f64, height: f64, show_time_axis: bool) -> AppResult<Rc<dyn ChartPane>> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| AppError::RenderingError("Document not available".to_string()))?;
        let container: HtmlElement = document
            .create_element("div")
            .map_err(|e| js_error("create pane container", e))?
            .dyn_into()
            .map_err(|e| js_error("pane container is not an HtmlElement", e.into()))?;
        container.set_class_name("chart-pane");
        container.set_attribute("data-pane", &id.0.to_string()).map_err(|e| js_error("tag pane", e))?;
        self.host.append_child(&container).map_err(|e| js_error("attach pane", e))?;

        let chart = match create_chart(&container, &to_js(&chart_options(width, height, show_time_axis))?) {
            Ok(chart) => chart,
            Err(e) => {
                container.remove();
                return Err(js_error("createChart", e));
            }
        };

        get_logger().debug(
            LogComponent::Infrastructure("LightweightPaneFactory"),
            &format!("🚀 Created {} ({}x{})", id, width, height),
        );

        Ok(Rc::new(LightweightPane {
            id,
            chart,
            container,
            series: RefCell::new(Vec::new()),
            subscriptions: RefCell::new(HashMap::new()),
            next_token: Cell::new(1),
            removed: Cell::new(false),
        }))
    }
}
