//! Ambient correlation key
//!
//! The query engine is opaque: it cannot be handed a correlation key, so the
//! key travels beside it. Two carriers exist:
//!
//! - a thread-scoped slot, set by [`enter`] and restored when the returned
//!   [`CorrelationGuard`] drops;
//! - a `correlation_id` field on a `tracing` span (see [`span`]), which the
//!   capture layer reads from the event's span scope.
//!
//! Neither carrier expires on its own. Whoever enters a key owns its teardown.

use std::cell::RefCell;
use std::marker::PhantomData;

use tracing::Span;

/// Span field name carrying the correlation key
pub const CORRELATION_FIELD: &str = "correlation_id";

thread_local! {
    static ACTIVE_KEY: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Restores the previously active key on drop
///
/// Not `Send`: the guard must drop on the thread that entered it.
#[derive(Debug)]
#[must_use = "the correlation key is cleared as soon as the guard drops"]
pub struct CorrelationGuard {
    previous: Option<String>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for CorrelationGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = ACTIVE_KEY.try_with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Make `key` the active correlation key on this thread
pub fn enter(key: &str) -> CorrelationGuard {
    let previous = ACTIVE_KEY.with(|slot| slot.replace(Some(key.to_string())));
    CorrelationGuard {
        previous,
        _not_send: PhantomData,
    }
}

/// The correlation key active on this thread, if any
pub fn current() -> Option<String> {
    ACTIVE_KEY.try_with(|slot| slot.borrow().clone()).ok().flatten()
}

/// Wrap `f` so it runs with the caller's key active on whatever thread calls it
///
/// Use this when handing work to a worker thread whose logging should land in
/// the caller's capture window.
pub fn propagate<F, R>(f: F) -> impl FnOnce() -> R + Send
where
    F: FnOnce() -> R + Send,
{
    let key = current();
    move || {
        let _guard = key.as_deref().map(enter);
        f()
    }
}

/// A span tagged with `key` for span-based propagation
pub fn span(key: &str) -> Span {
    tracing::debug_span!("query_investigation", correlation_id = %key)
}
