use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::trace;

use super::{reduce, Action, WalletState};

const EVENT_CAPACITY: usize = 64;

/// Holds the wallet state and broadcasts every applied action.
///
/// The state lock is never held across an `.await`.
pub struct WalletStore {
    state: Mutex<WalletState>,
    events: broadcast::Sender<Action>,
}

impl Default for WalletStore {
    fn default() -> Self {
        Self::new(WalletState::default())
    }
}

impl WalletStore {
    pub fn new(initial: WalletState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(initial),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WalletState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, guard: &mut MutexGuard<'_, WalletState>, action: &Action) {
        let current = std::mem::take(&mut **guard);
        **guard = reduce(current, action);
    }

    fn publish(&self, action: Action) {
        trace!(?action, "action applied");
        // No subscribers is fine.
        let _ = self.events.send(action);
    }

    pub fn dispatch(&self, action: Action) {
        {
            let mut guard = self.lock();
            self.apply(&mut guard, &action);
        }
        self.publish(action);
    }

    /// Atomically checks the loading flag and, when clear, dispatches
    /// [`Action::LoadingStarted`]. Returns false if a refresh is already in
    /// flight; nothing is dispatched in that case.
    pub fn try_begin_loading(&self) -> bool {
        {
            let mut guard = self.lock();
            if guard.is_loading() {
                return false;
            }
            self.apply(&mut guard, &Action::LoadingStarted);
        }
        self.publish(Action::LoadingStarted);
        true
    }

    pub fn snapshot(&self) -> WalletState {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.events.subscribe()
    }
}
