// Delivers backend events to subscribers from a dedicated thread
// Keeps listener code off the real-time audio callback

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use wavdeck_core::{AudioError, BackendEvent, BackendListener, Result, SubscriptionId};

type Listeners = Arc<Mutex<Vec<(SubscriptionId, Arc<dyn BackendListener>)>>>;

/// Subscriber registry plus the thread that fans events out to it
pub struct Notifier {
    listeners: Listeners,
    sender: Mutex<Option<mpsc::Sender<BackendEvent>>>,
    next_subscription: AtomicU64,
    handle: Option<thread::JoinHandle<()>>,
}

impl Notifier {
    pub fn new() -> Result<Self> {
        let listeners: Listeners = Arc::new(Mutex::new(Vec::new()));
        let (sender, receiver) = mpsc::channel::<BackendEvent>();

        let thread_listeners = listeners.clone();
        let handle = thread::Builder::new()
            .name("wavdeck-notifier".to_string())
            .spawn(move || {
                log::debug!("Notifier thread started");
                while let Ok(event) = receiver.recv() {
                    let snapshot: Vec<_> = thread_listeners
                        .lock()
                        .iter()
                        .map(|(_, listener)| listener.clone())
                        .collect();
                    for listener in snapshot {
                        listener.on_backend_event(event.clone());
                    }
                }
                log::debug!("Notifier thread exited");
            })
            .map_err(|e| AudioError::PlaybackError(format!("Failed to spawn notifier: {}", e)))?;

        Ok(Self {
            listeners,
            sender: Mutex::new(Some(sender)),
            next_subscription: AtomicU64::new(1),
            handle: Some(handle),
        })
    }

    /// Sender for producers on other threads (stream callbacks)
    pub fn sender(&self) -> Result<mpsc::Sender<BackendEvent>> {
        self.sender
            .lock()
            .clone()
            .ok_or_else(|| AudioError::PlaybackError("Notifier is shut down".to_string()))
    }

    pub fn post(&self, event: BackendEvent) {
        if let Some(sender) = self.sender.lock().as_ref() {
            if sender.send(event).is_err() {
                log::warn!("Notifier thread is gone, dropping event");
            }
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn BackendListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().retain(|(existing, _)| *existing != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Stop accepting events and wait for the thread once every sender is gone.
    /// Senders cloned into streams must be dropped first.
    pub fn shutdown(&mut self) {
        self.sender.lock().take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("Notifier thread panicked");
            }
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}
