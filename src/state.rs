use anyhow::{ensure, Context};
use std::{str::FromStr, sync::Arc};

use crate::{
    error::{AppError, Result},
    notification::{DispatchSettings, NotificationDispatcher},
    push::PushTransport,
    reminder::ReminderStore,
    subscription::SubscriptionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub reminder_store: Arc<dyn ReminderStore>,
    pub subscription_store: Arc<dyn SubscriptionStore>,
    /// `None` while VAPID keys are unconfigured.
    pub push_transport: Option<Arc<dyn PushTransport>>,
}

impl AppState {
    pub fn dispatcher(&self) -> Result<NotificationDispatcher> {
        let transport = self.push_transport.clone().ok_or_else(|| {
            AppError::Configuration("VAPID keys are not configured".to_string())
        })?;

        Ok(NotificationDispatcher::new(
            self.reminder_store.clone(),
            self.subscription_store.clone(),
            transport,
            self.config.dispatch_settings(),
        ))
    }
}

/// Upper bound for `NOTIFICATION_CHECK_MINUTES`: one day.
const MAX_CHECK_WINDOW_MINUTES: i64 = 1440;

#[derive(Debug, Clone)]
pub struct Config {
    pub job_api_secret: Option<String>,
    pub check_window_minutes: i64,
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
    pub vapid_subject: String,
    pub push_ttl_seconds: u32,
    pub push_timeout_seconds: u64,
    pub notification_cron: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Blank values count as unset.
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let check_window_minutes: i64 =
            parse_or(var("NOTIFICATION_CHECK_MINUTES"), "NOTIFICATION_CHECK_MINUTES", 5)?;
        ensure!(
            (1..=MAX_CHECK_WINDOW_MINUTES).contains(&check_window_minutes),
            "NOTIFICATION_CHECK_MINUTES must be between 1 and {}, got {}",
            MAX_CHECK_WINDOW_MINUTES,
            check_window_minutes
        );

        Ok(Self {
            job_api_secret: var("JOB_API_SECRET"),
            check_window_minutes,
            vapid_public_key: var("VAPID_PUBLIC_KEY").or_else(|| var("NEXT_PUBLIC_VAPID_PUBLIC_KEY")),
            vapid_private_key: var("VAPID_PRIVATE_KEY"),
            vapid_subject: var("VAPID_SUBJECT")
                .unwrap_or_else(|| "mailto:test@example.com".to_string()),
            push_ttl_seconds: parse_or(var("PUSH_TTL_SECONDS"), "PUSH_TTL_SECONDS", 2_419_200)?,
            push_timeout_seconds: parse_or(var("PUSH_TIMEOUT_SECONDS"), "PUSH_TIMEOUT_SECONDS", 10)?,
            notification_cron: var("NOTIFICATION_CRON"),
        })
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings::new(self.check_window_minutes)
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", name, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.job_api_secret, None);
        assert_eq!(config.check_window_minutes, 5);
        assert_eq!(config.vapid_subject, "mailto:test@example.com");
        assert_eq!(config.push_ttl_seconds, 2_419_200);
        assert_eq!(config.push_timeout_seconds, 10);
        assert!(config.vapid_public_key.is_none());
        assert!(config.notification_cron.is_none());
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            ("JOB_API_SECRET", "s3cret"),
            ("NOTIFICATION_CHECK_MINUTES", "15"),
            ("NEXT_PUBLIC_VAPID_PUBLIC_KEY", "pub"),
            ("VAPID_PRIVATE_KEY", "priv"),
            ("NOTIFICATION_CRON", "0 * * * * *"),
        ])
        .unwrap();

        assert_eq!(config.job_api_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.check_window_minutes, 15);
        assert_eq!(config.vapid_public_key.as_deref(), Some("pub"));
        assert_eq!(config.vapid_private_key.as_deref(), Some("priv"));
        assert_eq!(config.notification_cron.as_deref(), Some("0 * * * * *"));
    }

    #[test]
    fn test_blank_secret_is_unset() {
        let config = config_from(&[("JOB_API_SECRET", "  ")]).unwrap();
        assert_eq!(config.job_api_secret, None);
    }

    #[test]
    fn test_rejects_non_numeric_window() {
        let err = config_from(&[("NOTIFICATION_CHECK_MINUTES", "five")]).unwrap_err();
        assert!(err.to_string().contains("NOTIFICATION_CHECK_MINUTES"));
    }

    #[test]
    fn test_rejects_out_of_range_window() {
        for raw in ["0", "-5", "1441", "9223372036854775807"] {
            let err = config_from(&[("NOTIFICATION_CHECK_MINUTES", raw)]).unwrap_err();
            assert!(
                err.to_string().contains("NOTIFICATION_CHECK_MINUTES"),
                "accepted {}",
                raw
            );
        }

        let config = config_from(&[("NOTIFICATION_CHECK_MINUTES", "1440")]).unwrap();
        assert_eq!(config.dispatch_settings().check_window, chrono::Duration::days(1));
    }
}
