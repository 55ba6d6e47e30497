use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Other,
}

type Listener = Arc<dyn Fn(Key) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

/// Window-wide key listeners. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct KeyboardHub {
    registry: Arc<Registry>,
}

/// Keeps a listener registered until dropped.
pub struct KeyListenerGuard {
    id: u64,
    registry: Arc<Registry>,
}

impl Drop for KeyListenerGuard {
    fn drop(&mut self) {
        self.registry
            .listeners
            .lock()
            .retain(|(id, _)| *id != self.id);
        debug!("Key listener {} removed", self.id);
    }
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<F>(&self, listener: F) -> KeyListenerGuard
    where
        F: Fn(Key) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);
        self.registry.listeners.lock().push((id, listener));
        debug!("Key listener {id} added");
        KeyListenerGuard {
            id,
            registry: self.registry.clone(),
        }
    }

    /// Delivers `key` to every listener registered at the time of the call.
    /// Listeners may drop their own guard while handling it.
    pub fn dispatch(&self, key: Key) {
        let listeners: Vec<Listener> = self
            .registry
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(key);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.listeners.lock().len()
    }
}
