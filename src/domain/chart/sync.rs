use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::pane::SyncTarget;
use super::value_objects::{LogicalRange, PaneId};
use crate::domain::events::{CrosshairMove, PaneEvent, PaneEventHandler, PaneEventKind, SubscriptionToken};
use crate::domain::logging::LogComponent;
use crate::{log_debug, log_warn};

/// Cooperative "next frame" scheduling.
pub trait FrameScheduler {
    /// Run `task` once at the next frame boundary.
    fn request_frame(&self, task: Box<dyn FnOnce()>);
}

/// Scheduler driven by hand; frames run only when `run_frame` is called.
#[derive(Default)]
pub struct ManualFrameScheduler {
    queue: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run every task queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let tasks = std::mem::take(&mut *self.queue.borrow_mut());
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push(task);
    }
}

/// Called on every crosshair move of any pane, before propagation.
pub type CrosshairObserver = Rc<dyn Fn(PaneId, &CrosshairMove)>;

struct SyncState {
    panes: RefCell<Vec<SyncTarget>>,
    subscriptions: RefCell<HashMap<(PaneId, PaneEventKind), SubscriptionToken>>,
    syncing_range: Cell<bool>,
    syncing_crosshair: Cell<bool>,
    pending_range: Cell<Option<(PaneId, LogicalRange)>>,
    last_applied: Cell<Option<LogicalRange>>,
    frame_requested: Cell<bool>,
    scheduler: Rc<dyn FrameScheduler>,
    observer: RefCell<Option<CrosshairObserver>>,
}

/// Keeps the visible range and crosshair of every pane in lock-step.
///
/// One re-entrancy guard per propagation kind is held while a broadcast is
/// applied; notifications arriving under the guard are echoes and dropped.
/// Range changes are coalesced and applied once per frame.
pub struct PaneSyncEngine {
    state: Rc<SyncState>,
}

impl PaneSyncEngine {
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            state: Rc::new(SyncState {
                panes: RefCell::new(Vec::new()),
                subscriptions: RefCell::new(HashMap::new()),
                syncing_range: Cell::new(false),
                syncing_crosshair: Cell::new(false),
                pending_range: Cell::new(None),
                last_applied: Cell::new(None),
                frame_requested: Cell::new(false),
                scheduler,
                observer: RefCell::new(None),
            }),
        }
    }

    pub fn set_crosshair_observer(&self, observer: CrosshairObserver) {
        *self.state.observer.borrow_mut() = Some(observer);
    }

    pub fn pane_count(&self) -> usize {
        self.state.panes.borrow().len()
    }

    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.borrow().len()
    }

    pub fn is_range_pending(&self) -> bool {
        self.state.frame_requested.get()
    }

    /// Wire a fresh set of panes. The first target is the primary pane whose
    /// current range is pushed to the others before any subscription exists.
    pub fn attach(&self, targets: Vec<SyncTarget>) {
        self.detach();
        if targets.is_empty() {
            return;
        }
        *self.state.panes.borrow_mut() = targets;

        self.lock_initial_range();

        let ids: Vec<PaneId> = self.state.panes.borrow().iter().map(SyncTarget::id).collect();
        let multi_pane = ids.len() > 1;
        for id in ids {
            if multi_pane {
                self.subscribe(id, PaneEventKind::VisibleRangeChanged);
            }
            self.subscribe(id, PaneEventKind::CrosshairMoved);
        }

        log_debug!(
            LogComponent::Domain("PaneSyncEngine"),
            "🔗 Synced {} panes with {} subscriptions",
            self.pane_count(),
            self.subscription_count()
        );
    }

    /// Unsubscribe everything and forget the panes. Safe to call repeatedly.
    pub fn detach(&self) {
        let subscriptions: Vec<_> = self.state.subscriptions.borrow_mut().drain().collect();
        let panes = std::mem::take(&mut *self.state.panes.borrow_mut());
        for ((pane_id, kind), token) in subscriptions {
            match panes.iter().find(|t| t.id() == pane_id) {
                Some(target) => target.pane.unsubscribe(kind, token),
                None => {
                    log_warn!(LogComponent::Domain("PaneSyncEngine"), "Subscription on unknown {}", pane_id);
                }
            }
        }
        self.state.pending_range.set(None);
        self.state.last_applied.set(None);
        self.state.syncing_range.set(false);
        self.state.syncing_crosshair.set(false);
    }

    fn lock_initial_range(&self) {
        let panes = self.state.panes.borrow();
        let Some(primary) = panes.first() else {
            return;
        };
        let Some(range) = primary.pane.visible_logical_range().filter(LogicalRange::is_valid) else {
            return;
        };
        self.state.syncing_range.set(true);
        for target in panes.iter().skip(1) {
            target.pane.set_visible_logical_range(range);
        }
        self.state.syncing_range.set(false);
        self.state.last_applied.set(Some(range));
    }

    fn subscribe(&self, pane_id: PaneId, kind: PaneEventKind) {
        let weak: Weak<SyncState> = Rc::downgrade(&self.state);
        let handler: PaneEventHandler = Rc::new(move |event: PaneEvent| {
            if let Some(state) = weak.upgrade() {
                SyncState::handle(&state, pane_id, event);
            }
        });
        let token = {
            let panes = self.state.panes.borrow();
            let Some(target) = panes.iter().find(|t| t.id() == pane_id) else {
                return;
            };
            target.pane.subscribe(kind, handler)
        };
        self.state.subscriptions.borrow_mut().insert((pane_id, kind), token);
    }
}

impl Drop for PaneSyncEngine {
    fn drop(&mut self) {
        self.detach();
    }
}

impl SyncState {
    fn handle(state: &Rc<SyncState>, source: PaneId, event: PaneEvent) {
        match event {
            PaneEvent::VisibleRangeChanged(range) => Self::on_range(state, source, range),
            PaneEvent::CrosshairMoved(movement) => state.on_crosshair(source, &movement),
        }
    }

    fn on_range(state: &Rc<SyncState>, source: PaneId, range: Option<LogicalRange>) {
        let Some(range) = range.filter(LogicalRange::is_valid) else {
            return;
        };
        if state.syncing_range.get() || state.last_applied.get() == Some(range) {
            return;
        }
        state.pending_range.set(Some((source, range)));
        if state.frame_requested.replace(true) {
            return;
        }
        let weak = Rc::downgrade(state);
        state.scheduler.request_frame(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.flush_range();
            }
        }));
    }

    fn flush_range(&self) {
        self.frame_requested.set(false);
        let Some((source, range)) = self.pending_range.take() else {
            return;
        };
        let targets: Vec<SyncTarget> = self.panes.borrow().iter().filter(|t| t.id() != source).cloned().collect();
        self.syncing_range.set(true);
        self.last_applied.set(Some(range));
        for target in targets {
            target.pane.set_visible_logical_range(range);
        }
        self.syncing_range.set(false);
    }

    fn on_crosshair(&self, source: PaneId, movement: &CrosshairMove) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            observer(source, movement);
        }

        if self.syncing_crosshair.get() {
            return;
        }
        let targets: Vec<SyncTarget> = self.panes.borrow().iter().filter(|t| t.id() != source).cloned().collect();
        self.syncing_crosshair.set(true);
        match (movement.point, movement.time) {
            (Some(_), Some(time)) => {
                for target in targets {
                    if let Some(anchor) = target.anchor {
                        target.pane.set_crosshair_position(time, anchor);
                    }
                }
            }
            _ => {
                for target in targets {
                    target.pane.clear_crosshair_position();
                }
            }
        }
        self.syncing_crosshair.set(false);
    }
}
