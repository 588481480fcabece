//! Typed view over the persisted automation settings rows.

use crate::{RecordStore, Result};

/// Settings keys as stored in the keyed settings table.
pub mod keys {
    pub const RETRY_ATTEMPTS: &str = "retryAttempts";
    pub const RATE_LIMIT_PER_MINUTE: &str = "rateLimitPerMinute";
    pub const LOG_RETENTION_DAYS: &str = "logRetentionDays";
    pub const ENABLE_AUTOMATION: &str = "enableAutomation";
    pub const AUTO_START_ON_LOAD: &str = "autoStartOnLoad";
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_rate_limit_per_minute() -> u32 {
    30
}

const fn default_log_retention_days() -> u32 {
    90
}

/// Operator-tunable automation settings, persisted in the record store so
/// every scheduler instance over the same queue sees the same values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationSettings {
    /// Maximum delivery attempts before a job goes terminal `Failed`
    pub retry_attempts: u32,
    /// Outbound send budget per minute, per scheduler instance
    pub rate_limit_per_minute: u32,
    /// Audit log retention window in days
    pub log_retention_days: u32,
    /// Master switch for the automation loop
    pub enable_automation: bool,
    /// Start the loop as soon as the application comes up
    pub auto_start_on_load: bool,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            log_retention_days: default_log_retention_days(),
            enable_automation: true,
            auto_start_on_load: false,
        }
    }
}

impl AutomationSettings {
    /// Load settings from the store, falling back to defaults for missing
    /// or unparseable rows.
    pub async fn load(store: &dyn RecordStore) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            retry_attempts: parse_or(
                store.get_setting(keys::RETRY_ATTEMPTS).await?,
                defaults.retry_attempts,
            ),
            rate_limit_per_minute: parse_or(
                store.get_setting(keys::RATE_LIMIT_PER_MINUTE).await?,
                defaults.rate_limit_per_minute,
            ),
            log_retention_days: parse_or(
                store.get_setting(keys::LOG_RETENTION_DAYS).await?,
                defaults.log_retention_days,
            ),
            enable_automation: parse_or(
                store.get_setting(keys::ENABLE_AUTOMATION).await?,
                defaults.enable_automation,
            ),
            auto_start_on_load: parse_or(
                store.get_setting(keys::AUTO_START_ON_LOAD).await?,
                defaults.auto_start_on_load,
            ),
        })
    }

    /// Persist all settings rows
    pub async fn save(&self, store: &dyn RecordStore) -> Result<()> {
        store
            .put_setting(keys::RETRY_ATTEMPTS, &self.retry_attempts.to_string())
            .await?;
        store
            .put_setting(
                keys::RATE_LIMIT_PER_MINUTE,
                &self.rate_limit_per_minute.to_string(),
            )
            .await?;
        store
            .put_setting(
                keys::LOG_RETENTION_DAYS,
                &self.log_retention_days.to_string(),
            )
            .await?;
        store
            .put_setting(keys::ENABLE_AUTOMATION, &self.enable_automation.to_string())
            .await?;
        store
            .put_setting(
                keys::AUTO_START_ON_LOAD,
                &self.auto_start_on_load.to_string(),
            )
            .await?;

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryRecordStore;

    #[test]
    fn defaults() {
        let settings = AutomationSettings::default();
        assert_eq!(settings.retry_attempts, 3);
        assert_eq!(settings.rate_limit_per_minute, 30);
        assert_eq!(settings.log_retention_days, 90);
        assert!(settings.enable_automation);
        assert!(!settings.auto_start_on_load);
    }

    #[tokio::test]
    async fn load_falls_back_on_missing_rows() {
        let store = MemoryRecordStore::new();
        let settings = AutomationSettings::load(&store).await.unwrap();
        assert_eq!(settings, AutomationSettings::default());
    }

    #[tokio::test]
    async fn load_falls_back_on_garbage_rows() {
        let store = MemoryRecordStore::new();
        store
            .put_setting(keys::RETRY_ATTEMPTS, "not-a-number")
            .await
            .unwrap();

        let settings = AutomationSettings::load(&store).await.unwrap();
        assert_eq!(settings.retry_attempts, 3);
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let store = MemoryRecordStore::new();
        let settings = AutomationSettings {
            retry_attempts: 5,
            rate_limit_per_minute: 120,
            log_retention_days: 30,
            enable_automation: false,
            auto_start_on_load: true,
        };

        settings.save(&store).await.unwrap();
        let loaded = AutomationSettings::load(&store).await.unwrap();
        assert_eq!(loaded, settings);
    }
}
