pub mod notification_dispatcher;
pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_service;

pub use notification_dispatcher::{DispatchSettings, NotificationDispatcher};
pub use notification_dto::{DispatchOutcome, TestPushResponse, VapidPublicKeyResponse};
pub use notification_service::start_notification_service;
