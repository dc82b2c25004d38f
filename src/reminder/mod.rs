pub mod reminder_models;
pub mod reminder_repository;

pub use reminder_models::{Reminder, ReminderStatus};
pub use reminder_repository::{PgReminderRepository, ReminderStore};
