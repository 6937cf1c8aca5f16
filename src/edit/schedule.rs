use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

pub type DeferredTask = Box<dyn FnOnce() + 'static>;

/// Runs a task on the next turn of the host event loop, never inline.
pub trait TaskScheduler {
    fn schedule(&mut self, task: DeferredTask);
}

impl TaskScheduler for gpui::App {
    fn schedule(&mut self, task: DeferredTask) {
        self.defer(move |_| task());
    }
}

/// Next-tick queue owned by an edit session.
///
/// Tasks run in FIFO order when the host drains the queue. Tasks scheduled
/// while draining wait for the following drain.
#[derive(Clone, Default)]
pub struct DeferredQueue {
    tasks: Rc<RefCell<VecDeque<DeferredTask>>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn run_pending(&self) -> usize {
        let batch = std::mem::take(&mut *self.tasks.borrow_mut());
        let count = batch.len();
        for task in batch {
            task();
        }
        if count > 0 {
            tracing::trace!(count, "ran deferred tasks");
        }
        count
    }

    pub fn defer_into(&self, cx: &mut gpui::App) {
        if self.pending() == 0 {
            return;
        }
        let queue = self.clone();
        cx.defer(move |_| {
            queue.run_pending();
        });
    }
}

impl TaskScheduler for DeferredQueue {
    fn schedule(&mut self, task: DeferredTask) {
        self.tasks.borrow_mut().push_back(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn tasks_wait_for_the_next_drain() {
        let mut queue = DeferredQueue::new();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            queue.schedule(Box::new(move || hits.set(hits.get() + 1)));
        }
        assert_eq!(hits.get(), 0);
        assert_eq!(queue.pending(), 1);

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn tasks_scheduled_while_draining_run_on_the_following_turn() {
        let queue = DeferredQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        {
            let mut inner_queue = queue.clone();
            let order = order.clone();
            queue.clone().schedule(Box::new(move || {
                order.borrow_mut().push("outer");
                let order = order.clone();
                inner_queue.schedule(Box::new(move || order.borrow_mut().push("inner")));
            }));
        }

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*order.borrow(), vec!["outer"]);
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    }
}
