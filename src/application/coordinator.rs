use std::rc::Rc;

use crate::domain::chart::composition::{PaneComposer, PaneRole};
use crate::domain::chart::legend::{HoverReadout, LegendResolver};
use crate::domain::chart::sync::{CrosshairObserver, FrameScheduler, PaneSyncEngine};
use crate::domain::chart::{
    ChartPane, LayoutManager, PaneFactory, PaneId, PaneLayout, SeriesId, SyncTarget, VisibilityConfig,
};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::events::{CrosshairMove, PaneEvent, PaneEventKind, SubscriptionToken};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::MarketSnapshot;

/// Receives the legend readout for every crosshair move on any pane.
pub type HoverSink = Rc<dyn Fn(PaneId, HoverReadout)>;

/// A constructed pane and the series it carries
#[derive(Clone)]
pub struct LivePane {
    pub role: PaneRole,
    pub pane: Rc<dyn ChartPane>,
    /// Created series in blueprint order; `None` where creation failed.
    pub series: Vec<Option<SeriesId>>,
    pub anchor: Option<SeriesId>,
}

impl LivePane {
    pub fn id(&self) -> PaneId {
        self.pane.id()
    }
}

/// Глобальный координатор графика: единственный владелец панелей.
///
/// Every `rebuild` runs the teardown path first, so subscriptions and pane
/// handles never outlive the data they were built for.
pub struct ChartCoordinator {
    factory: Rc<dyn PaneFactory>,
    composer: PaneComposer,
    sync: PaneSyncEngine,
    layout: LayoutManager,
    panes: Vec<LivePane>,
    secondary_visibility: Vec<bool>,
    hover_sink: Option<HoverSink>,
    range_listener: Option<Rc<dyn Fn()>>,
    range_subscription: Option<(Rc<dyn ChartPane>, SubscriptionToken)>,
}

impl ChartCoordinator {
    pub fn new(factory: Rc<dyn PaneFactory>, scheduler: Rc<dyn FrameScheduler>) -> Self {
        get_logger().info(LogComponent::Application("ChartCoordinator"), "Creating new chart coordinator");
        Self {
            factory,
            composer: PaneComposer::default(),
            sync: PaneSyncEngine::new(scheduler),
            layout: LayoutManager::new(),
            panes: Vec::new(),
            secondary_visibility: Vec::new(),
            hover_sink: None,
            range_listener: None,
            range_subscription: None,
        }
    }

    pub fn with_composer(mut self, composer: PaneComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn set_hover_sink(&mut self, sink: HoverSink) {
        self.hover_sink = Some(sink);
    }

    /// Called whenever the primary pane scrolls or zooms, e.g. to redraw
    /// pixel-space overlays.
    pub fn set_range_listener(&mut self, listener: Rc<dyn Fn()>) {
        self.range_listener = Some(listener);
    }

    pub fn panes(&self) -> &[LivePane] {
        &self.panes
    }

    pub fn primary(&self) -> Option<&LivePane> {
        self.panes.iter().find(|p| p.role == PaneRole::Primary)
    }

    pub fn sync_engine(&self) -> &PaneSyncEngine {
        &self.sync
    }

    pub fn layout(&self) -> Option<PaneLayout> {
        self.layout.current()
    }

    /// Tear down, then build one pane per blueprint. Returns the number of
    /// live panes. Secondary panes that fail to build are skipped; the
    /// primary pane failing aborts the rebuild.
    pub fn rebuild(
        &mut self,
        snapshot: Rc<MarketSnapshot>,
        visibility: &VisibilityConfig,
        width: f64,
        height: f64,
    ) -> AppResult<usize> {
        self.teardown();
        if snapshot.is_empty() {
            get_logger().info(LogComponent::Application("ChartCoordinator"), "Empty snapshot, no panes built");
            return Ok(0);
        }

        self.secondary_visibility = visibility.secondary_visibility();
        let layout = self.layout.update(width, height, &self.secondary_visibility).ok_or_else(|| {
            AppError::RenderingError("layout unavailable".to_string())
        })?;

        for blueprint in self.composer.compose(&snapshot, visibility) {
            let pane = match self.factory.create_pane(
                blueprint.id,
                layout.width,
                layout.height_of(blueprint.id),
                layout.shows_time_axis(blueprint.id),
            ) {
                Ok(pane) => pane,
                Err(e) if blueprint.role == PaneRole::Primary => {
                    get_logger().error(
                        LogComponent::Application("ChartCoordinator"),
                        &format!("❌ Primary pane failed: {}", e),
                    );
                    self.teardown();
                    return Err(e);
                }
                Err(e) => {
                    get_logger().warn(
                        LogComponent::Application("ChartCoordinator"),
                        &format!("⚠️ Skipping {} pane: {}", blueprint.title(), e),
                    );
                    continue;
                }
            };

            let series: Vec<Option<SeriesId>> = blueprint
                .series
                .iter()
                .map(|s| match pane.add_series(s) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        get_logger().warn(
                            LogComponent::Application("ChartCoordinator"),
                            &format!("⚠️ Series skipped on {}: {}", blueprint.title(), e),
                        );
                        None
                    }
                })
                .collect();
            let anchor = series.get(blueprint.anchor).copied().flatten().or_else(|| series.iter().flatten().next().copied());
            self.panes.push(LivePane { role: blueprint.role, pane, series, anchor });
        }

        if let Some(primary) = self.primary() {
            primary.pane.fit_content();
        }
        self.listen_to_primary_range();

        self.sync.set_crosshair_observer(self.legend_observer(snapshot, visibility.clone()));
        self.sync.attach(self.panes.iter().map(|p| SyncTarget::new(p.pane.clone(), p.anchor)).collect());

        get_logger().info(
            LogComponent::Application("ChartCoordinator"),
            &format!("✅ Built {} panes ({}x{})", self.panes.len(), layout.width, height),
        );
        Ok(self.panes.len())
    }

    /// Re-apply the layout after a container resize. Returns whether any
    /// pane was resized.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if self.panes.is_empty() {
            return false;
        }
        let Some(layout) = self.layout.update(width, height, &self.secondary_visibility) else {
            return false;
        };
        for live in &self.panes {
            let id = live.id();
            live.pane.resize(layout.width, layout.height_of(id));
            live.pane.set_time_axis_visible(layout.shows_time_axis(id));
        }
        true
    }

    /// Unsubscribe everything, then dispose every pane. Idempotent.
    pub fn teardown(&mut self) {
        if let Some((pane, token)) = self.range_subscription.take() {
            pane.unsubscribe(PaneEventKind::VisibleRangeChanged, token);
        }
        self.sync.detach();
        for live in self.panes.drain(..) {
            live.pane.remove();
        }
        self.layout.invalidate();
    }

    fn listen_to_primary_range(&mut self) {
        let (Some(listener), Some(primary)) = (self.range_listener.clone(), self.primary()) else {
            return;
        };
        let pane = primary.pane.clone();
        let token = pane.subscribe(
            PaneEventKind::VisibleRangeChanged,
            Rc::new(move |event: PaneEvent| {
                if let PaneEvent::VisibleRangeChanged(Some(_)) = event {
                    listener();
                }
            }),
        );
        self.range_subscription = Some((pane, token));
    }

    fn legend_observer(&self, snapshot: Rc<MarketSnapshot>, visibility: VisibilityConfig) -> CrosshairObserver {
        let resolver = LegendResolver::new(snapshot, visibility);
        let sink = self.hover_sink.clone();
        Rc::new(move |pane: PaneId, movement: &CrosshairMove| {
            if let Some(sink) = &sink {
                let time = movement.point.and(movement.time);
                sink(pane, resolver.resolve(time, None));
            }
        })
    }
}

impl Drop for ChartCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
