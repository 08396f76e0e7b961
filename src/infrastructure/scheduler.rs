use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::render::{AnimationFrame, request_animation_frame};

use crate::domain::chart::FrameScheduler;

#[derive(Default)]
struct FrameQueue {
    tasks: RefCell<Vec<Box<dyn FnOnce()>>>,
    frame: RefCell<Option<AnimationFrame>>,
}

/// `requestAnimationFrame`-backed scheduler. All tasks requested before the
/// next paint share one browser callback.
#[derive(Clone, Default)]
pub struct AnimationFrameScheduler {
    queue: Rc<FrameQueue>,
}

impl AnimationFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(queue: Weak<FrameQueue>) {
        let Some(queue) = queue.upgrade() else {
            return;
        };
        let _fired = queue.frame.borrow_mut().take();
        let tasks = std::mem::take(&mut *queue.tasks.borrow_mut());
        for task in tasks {
            task();
        }
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&self, task: Box<dyn FnOnce()>) {
        self.queue.tasks.borrow_mut().push(task);
        if self.queue.frame.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.queue);
        let frame = request_animation_frame(move |_timestamp| Self::run(weak));
        *self.queue.frame.borrow_mut() = Some(frame);
    }
}
