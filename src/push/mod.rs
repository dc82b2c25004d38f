pub mod encryption;
pub mod push_handlers;
pub mod push_models;
pub mod push_transport;
pub mod vapid;

pub use push_models::PushPayload;
pub use push_transport::{FailureKind, PushError, PushTransport, WebPushTransport};
