//! Realtime socket client: connection state machine, reconnection controller
//! and event dispatcher.

mod config;
mod dispatcher;
mod reconnect;
mod service;
mod state;
mod transport;

pub use config::{DEFAULT_URL, SocketConfig};
pub use dispatcher::{EventDispatcher, Handler, HandlerOutcome, HandlerResult, handler};
pub use reconnect::{ReconnectDecision, ReconnectPolicy};
pub use service::SocketService;
pub use state::ConnectionState;
pub use transport::{Connector, TransportEvent, TransportLink, WebSocketConnector};
