pub mod subscription_dto;
pub mod subscription_handlers;
pub mod subscription_models;
pub mod subscription_repository;

pub use subscription_models::{NewPushSubscription, PushSubscription};
pub use subscription_repository::{PgSubscriptionRepository, Registration, SubscriptionStore};
