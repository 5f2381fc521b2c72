use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    #[serde(default)]
    pub ad_units: u64,
    #[serde(default)]
    pub custom_targeting_keys: u64,
    #[serde(default)]
    pub custom_targeting_values: u64,
    #[serde(default)]
    pub orders: u64,
}

/// A GAM inventory/order sync job (SPEC_FULL §4.8). At most one job per
/// `(tenant_id, sync_type)` may be `running` at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub sync_id: String,
    pub tenant_id: String,
    pub sync_type: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: SyncSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SyncJob {
    pub fn is_stale(&self, now: DateTime<Utc>, max_age_hours: i64) -> bool {
        match self.completed_at {
            Some(completed) => (now - completed).num_hours() >= max_age_hours,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job(completed_at: Option<DateTime<Utc>>) -> SyncJob {
        SyncJob {
            sync_id: "sync_1".into(),
            tenant_id: "acme".into(),
            sync_type: "inventory".into(),
            status: SyncStatus::Completed,
            started_at: Utc::now() - Duration::hours(30),
            completed_at,
            summary: SyncSummary::default(),
            error_message: None,
        }
    }

    #[test]
    fn running_job_is_never_stale() {
        assert!(!job(None).is_stale(Utc::now(), 24));
    }

    #[test]
    fn completed_job_becomes_stale_after_max_age() {
        let now = Utc::now();
        let completed = job(Some(now - Duration::hours(25)));
        assert!(completed.is_stale(now, 24));

        let fresh = job(Some(now - Duration::hours(1)));
        assert!(!fresh.is_stale(now, 24));
    }
}
