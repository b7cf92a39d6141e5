pub mod http_handler;
pub mod tracing_log;
pub mod websocket;

/// Re-export commonly used types from adapters
pub use http_handler::dispatch;
pub use tracing_log::TracingActionLog;
pub use websocket::{Flow, WebSocketHandler};
