//! Single-thread affinity for the preview controller.
//!
//! The controller and every camera/view object it owns are created, used and
//! dropped on one dedicated thread. Other threads hand work over as closures
//! through a queue and may wait for the closure's result.

use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

use crate::errors::OverlayError;

type Job<C> = Box<dyn FnOnce(&mut C) + Send>;

enum Message<C> {
    Run(Job<C>),
    Shutdown,
}

/// Cloneable handle for posting work to a [`UiThread`].
pub struct UiHandle<C> {
    sender: mpsc::UnboundedSender<Message<C>>,
}

impl<C> Clone for UiHandle<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<C: 'static> UiHandle<C> {
    /// Queues `job` without waiting for it.
    pub fn post<F>(&self, job: F) -> Result<(), OverlayError>
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.sender
            .send(Message::Run(Box::new(job)))
            .map_err(|_| OverlayError::UiThread("UI thread has stopped".to_string()))
    }

    /// Runs `job` on the UI thread and awaits its result.
    pub async fn call<F, T>(&self, job: F) -> Result<T, OverlayError>
    where
        F: FnOnce(&mut C) -> T + Send + 'static,
        T: Send + 'static,
    {
        let rx = self.enqueue(job)?;
        rx.await
            .map_err(|_| OverlayError::UiThread("UI job dropped before completing".to_string()))
    }

    /// Blocking variant of [`Self::call`] for synchronous callers. Must not be
    /// used from the UI thread itself or from inside an async runtime.
    pub fn call_blocking<F, T>(&self, job: F) -> Result<T, OverlayError>
    where
        F: FnOnce(&mut C) -> T + Send + 'static,
        T: Send + 'static,
    {
        let rx = self.enqueue(job)?;
        rx.blocking_recv()
            .map_err(|_| OverlayError::UiThread("UI job dropped before completing".to_string()))
    }

    fn enqueue<F, T>(&self, job: F) -> Result<oneshot::Receiver<T>, OverlayError>
    where
        F: FnOnce(&mut C) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.post(move |context| {
            let _ = tx.send(job(context));
        })?;
        Ok(rx)
    }
}

/// Owns the UI thread. Dropping it runs the jobs already queued, then stops
/// the thread; handles still alive afterwards get [`OverlayError::UiThread`].
pub struct UiThread<C> {
    handle: Option<UiHandle<C>>,
    thread: Option<JoinHandle<()>>,
}

impl<C: 'static> UiThread<C> {
    /// Spawns the thread and builds its context there with `factory`.
    /// `on_exit` runs on the thread after the queue closes.
    pub fn spawn<F, X>(name: &str, factory: F, on_exit: X) -> Result<Self, OverlayError>
    where
        F: FnOnce() -> C + Send + 'static,
        X: FnOnce(&mut C) + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Message<C>>();
        let thread_name = name.to_string();
        let thread = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut context = factory();
                log::debug!("UI thread '{}' started", thread_name);
                while let Some(Message::Run(job)) = receiver.blocking_recv() {
                    job(&mut context);
                }
                on_exit(&mut context);
                log::debug!("UI thread '{}' stopped", thread_name);
            })
            .map_err(|e| OverlayError::UiThread(format!("Failed to spawn UI thread: {}", e)))?;

        Ok(Self {
            handle: Some(UiHandle { sender }),
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> UiHandle<C> {
        // Only `Drop` clears the handle.
        match &self.handle {
            Some(handle) => handle.clone(),
            None => unreachable!("UI thread handle taken before drop"),
        }
    }

    pub fn post<F>(&self, job: F) -> Result<(), OverlayError>
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.handle().post(job)
    }

    pub async fn call<F, T>(&self, job: F) -> Result<T, OverlayError>
    where
        F: FnOnce(&mut C) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.handle().call(job).await
    }

    pub fn call_blocking<F, T>(&self, job: F) -> Result<T, OverlayError>
    where
        F: FnOnce(&mut C) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.handle().call_blocking(job)
    }
}

impl<C> Drop for UiThread<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.sender.send(Message::Shutdown);
        }
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == std::thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                log::error!("UI thread panicked");
            }
        }
    }
}
