//! Event Dispatcher
//!
//! 受信イベントを登録済みのハンドラーへ配信します。
//!
//! - `new_message` 用のブロードキャスト集合（同じハンドラーの二重登録は無視）
//! - イベント名ごとの名前付きリスナー
//!
//! 各ハンドラーの呼び出しは個別に隔離され、`Err` を返しても panic しても
//! 残りのハンドラーへの配信は続きます。

use std::{
    collections::HashMap,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, PoisonError},
};

use serde_json::Value;

use crate::error::HandlerError;

pub type HandlerResult = Result<(), HandlerError>;

/// Shared subscriber callback. Identity is the `Arc` allocation.
pub type Handler = Arc<dyn Fn(&Value) -> HandlerResult + Send + Sync>;

/// Wrap a closure into a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Value) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Result of invoking one handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Delivered,
    Failed(HandlerError),
}

impl HandlerOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, HandlerOutcome::Delivered)
    }
}

#[derive(Default)]
struct Registry {
    broadcast: Vec<Handler>,
    named: HashMap<String, Vec<Handler>>,
}

#[derive(Default)]
pub struct EventDispatcher {
    registry: Mutex<Registry>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a broadcast handler. Returns `false` if it was already registered.
    pub fn on_new_message(&self, handler: Handler) -> bool {
        let mut registry = self.registry();
        if registry.broadcast.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        registry.broadcast.push(handler);
        true
    }

    /// Remove one broadcast handler, or all of them with `None`
    pub fn off_new_message(&self, handler: Option<&Handler>) {
        let mut registry = self.registry();
        match handler {
            Some(handler) => registry.broadcast.retain(|h| !Arc::ptr_eq(h, handler)),
            None => registry.broadcast.clear(),
        }
    }

    pub fn on(&self, event: &str, handler: Handler) {
        self.registry()
            .named
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    /// Remove one listener of `event`, or every listener of `event` with `None`
    pub fn off(&self, event: &str, handler: Option<&Handler>) {
        let mut registry = self.registry();
        match handler {
            Some(handler) => {
                if let Some(handlers) = registry.named.get_mut(event) {
                    handlers.retain(|h| !Arc::ptr_eq(h, handler));
                    if handlers.is_empty() {
                        registry.named.remove(event);
                    }
                }
            }
            None => {
                registry.named.remove(event);
            }
        }
    }

    /// Drop every registration
    pub fn clear(&self) {
        let mut registry = self.registry();
        registry.broadcast.clear();
        registry.named.clear();
    }

    pub fn new_message_handler_count(&self) -> usize {
        self.registry().broadcast.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.registry().named.get(event).map_or(0, Vec::len)
    }

    /// Deliver a `new_message` payload to every broadcast handler in registration order
    pub fn dispatch_new_message(&self, payload: &Value) -> Vec<HandlerOutcome> {
        let handlers = self.registry().broadcast.clone();
        invoke_all("new_message", &handlers, payload)
    }

    /// Deliver `payload` to the named listeners of `event`
    pub fn dispatch_event(&self, event: &str, payload: &Value) -> Vec<HandlerOutcome> {
        let handlers = self
            .registry()
            .named
            .get(event)
            .cloned()
            .unwrap_or_default();
        invoke_all(event, &handlers, payload)
    }
}

// Handlers run outside the registry lock so they may (un)register themselves.
fn invoke_all(event: &str, handlers: &[Handler], payload: &Value) -> Vec<HandlerOutcome> {
    handlers
        .iter()
        .map(|handler| {
            let outcome = invoke(handler, payload);
            if let HandlerOutcome::Failed(e) = &outcome {
                tracing::warn!("Handler for '{}' failed: {}", event, e);
            }
            outcome
        })
        .collect()
}

fn invoke(handler: &Handler, payload: &Value) -> HandlerOutcome {
    match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
        Ok(Ok(())) => HandlerOutcome::Delivered,
        Ok(Err(e)) => HandlerOutcome::Failed(e),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            HandlerOutcome::Failed(HandlerError::Panicked(message))
        }
    }
}
