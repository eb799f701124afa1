//! Centralized view state

use tokio::sync::{RwLock, watch};

/// State container with change notifications
///
/// Holds the latest view a peer rendered; subscribers see every update.
pub struct StateContainer<T> {
    /// Current state
    state: RwLock<T>,
    /// State change sender
    tx: watch::Sender<T>,
    /// State change receiver (clone for subscribers)
    rx: watch::Receiver<T>,
}

impl<T: Clone + Default> StateContainer<T> {
    /// Create a container holding the default state
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(T::default())
    }

    /// Reset to the default state
    pub async fn reset(&self) {
        self.set(T::default()).await;
    }
}

impl<T: Clone> StateContainer<T> {
    /// Create a container holding `initial`
    #[must_use]
    pub fn with_state(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial.clone());
        Self {
            state: RwLock::new(initial),
            tx,
            rx,
        }
    }

    /// Get current state
    pub async fn get(&self) -> T {
        self.state.read().await.clone()
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }

    /// Replace the state
    pub async fn set(&self, value: T) {
        self.update(|s| *s = value).await;
    }

    /// Update state with a function
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.state.write().await;
        f(&mut state);
        let _ = self.tx.send(state.clone());
    }
}

impl<T: Clone + Default> Default for StateContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}
