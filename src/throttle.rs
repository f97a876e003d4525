use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

/// Window length used by the submission controller.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThrottleState {
    Idle,
    Armed,
}

/// Throttle runs at most one call of the wrapped function per window.
///
/// The first call while idle arms a timer and the function runs with that
/// call's arguments once the delay has elapsed. Calls made while armed are
/// dropped, not queued. The guard returns to idle as the wrapped function
/// is invoked, so the next call opens a fresh window even if that
/// invocation panics.
pub struct Throttle<A> {
    delay: Duration,
    state: Arc<Mutex<ThrottleState>>,
    func: Arc<dyn Fn(A) + Send + Sync>,
}

/// wraps `func` in a single-slot throttle with the given window.
pub fn throttle<A, F>(delay: Duration, func: F) -> Throttle<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Throttle {
        delay,
        state: Arc::new(Mutex::new(ThrottleState::Idle)),
        func: Arc::new(func),
    }
}

fn lock(state: &Mutex<ThrottleState>) -> MutexGuard<'_, ThrottleState> {
    // the guarded value is a plain enum, a poisoned lock still holds a valid state
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<A: Send + 'static> Throttle<A> {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> ThrottleState {
        *lock(&self.state)
    }

    /// Returns true when this call armed a new window, false when it was dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call(&self, args: A) -> bool {
        {
            let mut state = lock(&self.state);
            if *state == ThrottleState::Armed {
                tracing::trace!("throttle armed, dropping call");
                return false;
            }
            *state = ThrottleState::Armed;
        }

        let delay = self.delay;
        let state = Arc::clone(&self.state);
        let func = Arc::clone(&self.func);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            *lock(&state) = ThrottleState::Idle;
            func(args);
        });
        tracing::trace!("throttle armed for {:?}", delay);
        true
    }
}

impl<A> std::fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("delay", &self.delay)
            .field("state", &*lock(&self.state))
            .finish()
    }
}
