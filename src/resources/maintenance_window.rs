use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::timewindow;

pub(crate) fn maintenance_path(team_id: &str) -> String {
    format!("{}maintenance/", team_path(team_id))
}

/// Times are wall clock values (`YYYY-MM-DD HH:MM`) in `timezone`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindowConfig {
    pub team_id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_until: Option<String>,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceWindowRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub time_zone: String,
    pub repeat_interval: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_until: Option<String>,
    pub services: Vec<ServiceRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRef {
    pub service: String,
}

impl MaintenanceWindowConfig {
    fn to_record(&self) -> Result<MaintenanceWindowRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        if self.timezone.is_empty() {
            return Err(ProviderError::validation("timezone", "must not be empty"));
        }
        validate::min_items("services", &self.services, 1)?;
        for service in &self.services {
            validate::uuid("services", service)?;
        }
        if let Some(interval) = self.repeat_interval.filter(|i| *i <= 0) {
            return Err(ProviderError::validation(
                "repeat_interval",
                format!("must be greater than 0, got {}", interval),
            ));
        }

        let repeat_until = match self.repeat_until.as_deref() {
            Some(until) => {
                validate::required("repeat_until", until)?;
                Some(timewindow::to_utc(until, &self.timezone)?)
            }
            None => None,
        };

        Ok(MaintenanceWindowRecord {
            unique_id: String::new(),
            name: self.name.clone(),
            start_time: timewindow::to_utc(&self.start_time, &self.timezone)?,
            end_time: timewindow::to_utc(&self.end_time, &self.timezone)?,
            time_zone: self.timezone.clone(),
            repeat_interval: self.repeat_interval.unwrap_or_default(),
            repeat_until,
            services: self
                .services
                .iter()
                .map(|service| ServiceRef {
                    service: service.clone(),
                })
                .collect(),
        })
    }

    pub(crate) fn from_record(team_id: &str, record: MaintenanceWindowRecord) -> Self {
        let mut config = Self {
            team_id: team_id.to_string(),
            ..Self::default()
        };
        config.apply(record);
        config
    }

    fn apply(&mut self, record: MaintenanceWindowRecord) {
        let tz = record.time_zone;

        // The window bounds move together or not at all.
        let start = timewindow::from_utc_lenient("start_time", &record.start_time, &tz);
        let end = timewindow::from_utc_lenient("end_time", &record.end_time, &tz);
        if let (Some(start), Some(end)) = (start, end) {
            self.start_time = start;
            self.end_time = end;
        }
        if let Some(until) = record
            .repeat_until
            .filter(|u| !u.is_empty())
            .and_then(|u| timewindow::from_utc_lenient("repeat_until", &u, &tz))
        {
            self.repeat_until = Some(until);
        }

        self.name = record.name;
        self.repeat_interval = (record.repeat_interval > 0).then_some(record.repeat_interval);
        self.services = record.services.into_iter().map(|s| s.service).collect();
        self.timezone = tz;
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", maintenance_path(&self.team_id), id)
    }
}

pub struct MaintenanceWindowResource;

#[async_trait]
impl Resource for MaintenanceWindowResource {
    type Config = MaintenanceWindowConfig;
    const KIND: &'static str = "zenduty_maintenance_window";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "maintenance_id"];

    async fn create(
        client: &ZendutyClient,
        config: &mut MaintenanceWindowConfig,
    ) -> Result<String> {
        let payload = config.to_record()?;
        let created: MaintenanceWindowRecord = client
            .post(&maintenance_path(&config.team_id), &payload)
            .await?;
        Ok(created.unique_id)
    }

    async fn read(
        client: &ZendutyClient,
        id: &str,
        config: &mut MaintenanceWindowConfig,
    ) -> Result<()> {
        validate::uuid("team_id", &config.team_id)?;
        let record: MaintenanceWindowRecord = client.get(&config.path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut MaintenanceWindowConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let _: MaintenanceWindowRecord = client.put(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(
        client: &ZendutyClient,
        id: &str,
        config: &MaintenanceWindowConfig,
    ) -> Result<()> {
        validate::uuid("team_id", &config.team_id)?;
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut MaintenanceWindowConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}
