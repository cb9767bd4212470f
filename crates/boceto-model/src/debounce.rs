//! Debounced commit scheduling for history recording and autosave.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// A cancellable scheduled commit keyed by the latest submitted value.
///
/// [`submit()`](Self::submit) replaces any pending value and restarts the
/// quiescence window; only the value still pending when the window elapses
/// with no further submissions is handed to the commit callback, so a burst
/// of edits coalesces into one commit. The callback runs on a dedicated
/// worker thread, never on the submitting thread.
///
/// Dropping the debouncer flushes a pending value before shutting the worker
/// down, so a scheduled autosave is never silently lost.
pub struct Debouncer<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    window: Duration,
    worker: Option<JoinHandle<()>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    signal: Condvar,
}

struct State<T> {
    pending: Option<(T, Instant)>,
    shutdown: bool,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawns the worker. `commit` receives each value that survives its
    /// quiescence window.
    pub fn new<F>(window: Duration, mut commit: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                pending: None,
                shutdown: false,
            }),
            signal: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::spawn(move || {
            let mut state = worker_shared.state.lock().unwrap();
            loop {
                match &state.pending {
                    None if state.shutdown => return,
                    None => {
                        state = worker_shared.signal.wait(state).unwrap();
                    }
                    Some((_, deadline)) => {
                        let now = Instant::now();
                        // Shutdown flushes immediately.
                        if now >= *deadline || state.shutdown {
                            let (value, _) = state.pending.take().unwrap();
                            drop(state);
                            commit(value);
                            state = worker_shared.state.lock().unwrap();
                            // Wake any flush() waiting for the commit.
                            worker_shared.signal.notify_all();
                        } else {
                            let timeout = *deadline - now;
                            state = worker_shared.signal.wait_timeout(state, timeout).unwrap().0;
                        }
                    }
                }
            }
        });

        Self {
            shared,
            window,
            worker: Some(worker),
        }
    }

    /// Schedules `value` for commit after the quiescence window, replacing
    /// and rescheduling any previously pending value.
    pub fn submit(&self, value: T) {
        let mut state = self.shared.state.lock().unwrap();
        state.pending = Some((value, Instant::now() + self.window));
        self.shared.signal.notify_all();
    }

    /// Commits any pending value immediately and waits for it to finish.
    pub fn flush(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if let Some((_, deadline)) = &mut state.pending {
            *deadline = Instant::now();
            self.shared.signal.notify_all();
            while state.pending.is_some() {
                state = self.shared.signal.wait(state).unwrap();
            }
        }
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
            self.shared.signal.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
