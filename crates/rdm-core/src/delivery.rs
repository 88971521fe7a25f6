//! Delivery contexts for listener callbacks.
//!
//! A request never invokes its listeners on the thread that triggered the
//! transition; it hands a closure to an [`EventDelivery`] and the delivery
//! context runs it. Which context that is (a worker task, the caller's
//! thread in tests) is an injected capability, not a global.

/// Capability to run a listener fan-out on the designated delivery context.
///
/// Implementations must preserve dispatch order: closures handed to
/// `dispatch` run in the order they were handed over.
pub trait EventDelivery: Send + Sync {
    fn dispatch(&self, event: Box<dyn FnOnce() + Send>);
}

/// Runs events immediately on the dispatching thread.
///
/// Deterministic; used by tests and by callers that want listener
/// callbacks inline with the transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDelivery;

impl EventDelivery for InlineDelivery {
    fn dispatch(&self, event: Box<dyn FnOnce() + Send>) {
        event();
    }
}

/// Runs events in order on a dedicated tokio task.
///
/// Events from all requests sharing this delivery funnel through one
/// unbounded channel, so per-request ordering follows dispatch order.
pub struct WorkerDelivery {
    tx: tokio::sync::mpsc::UnboundedSender<Box<dyn FnOnce() + Send>>,
}

impl WorkerDelivery {
    /// Spawns the consumer task on the current runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Box<dyn FnOnce() + Send>>();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                event();
            }
        });
        Self { tx }
    }
}

impl EventDelivery for WorkerDelivery {
    fn dispatch(&self, event: Box<dyn FnOnce() + Send>) {
        // Send fails only after the runtime shut the worker down; events
        // are dropped then, matching a process on its way out.
        let _ = self.tx.send(event);
    }
}
