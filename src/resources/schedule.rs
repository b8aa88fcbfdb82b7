//! On-call schedules: rotation layers with optional daily or weekly
//! restrictions, plus one-off overrides.
//!
//! Every wall-clock field is interpreted in the schedule's `time_zone` and
//! travels to the API as UTC. On read, a timestamp that cannot be converted
//! leaves its field unset; the rest of the schedule is still refreshed.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::timewindow;

const MIN_SHIFT: i64 = 3600;
const MAX_SHIFT: i64 = 365 * 24 * 3600;
const DAY: i64 = 24 * 3600;
const WEEK: i64 = 7 * DAY;

const RESTRICTION_NONE: i64 = 0;
const RESTRICTION_DAILY: i64 = 1;
const RESTRICTION_WEEKLY: i64 = 2;

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]|0[0-9]|1[0-9]|2[0-3]):([0-9]|[0-5][0-9]):([0-9]|[0-5][0-9])$")
        .expect("time-of-day pattern is valid")
});

pub(crate) fn schedules_path(team_id: &str) -> String {
    format!("{}schedules/", team_path(team_id))
}

fn schedule_path(team_id: &str, schedule_id: &str) -> String {
    format!("{}{}/", schedules_path(team_id), schedule_id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub team_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub time_zone: String,
    #[serde(default)]
    pub layers: Vec<ScheduleLayer>,
    #[serde(default)]
    pub overrides: Vec<ScheduleOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLayer {
    pub name: String,
    /// Seconds
    pub shift_length: i64,
    pub rotation_start_time: Option<String>,
    pub rotation_end_time: Option<String>,
    pub users: Vec<String>,
    #[serde(default)]
    pub restriction_type: i64,
    #[serde(default)]
    pub restrictions: Vec<LayerRestriction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerRestriction {
    pub duration: i64,
    pub start_day_of_week: i64,
    pub start_time_of_day: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOverride {
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub user: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub team: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub time_zone: String,
    pub layers: Vec<LayerRecord>,
    pub overrides: Vec<OverrideRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerRecord {
    pub name: String,
    pub shift_length: i64,
    pub rotation_start_time: String,
    pub rotation_end_time: String,
    pub users: Vec<LayerUser>,
    pub restriction_type: i64,
    pub restrictions: Vec<LayerRestriction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerUser {
    pub user: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideRecord {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub user: String,
}

impl ScheduleConfig {
    fn to_record(&self) -> Result<ScheduleRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        validate::required("time_zone", &self.time_zone)?;
        timewindow::resolve_timezone(&self.time_zone)?;

        let layers = self
            .layers
            .iter()
            .map(|layer| layer.to_record(&self.time_zone))
            .collect::<Result<Vec<_>>>()?;
        let overrides = self
            .overrides
            .iter()
            .map(|o| o.to_record(&self.time_zone))
            .collect::<Result<Vec<_>>>()?;

        Ok(ScheduleRecord {
            unique_id: String::new(),
            team: self.team_id.clone(),
            name: self.name.clone(),
            summary: self.summary.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            time_zone: self.time_zone.clone(),
            layers,
            overrides,
        })
    }

    pub(crate) fn from_record(team_id: &str, record: ScheduleRecord) -> Self {
        let mut config = Self {
            team_id: team_id.to_string(),
            ..Self::default()
        };
        config.apply(record);
        config
    }

    fn apply(&mut self, record: ScheduleRecord) {
        let zone = record.time_zone;
        self.name = record.name;
        self.summary = validate::non_empty(record.summary);
        self.description = validate::non_empty(record.description);
        if !record.team.is_empty() {
            self.team_id = record.team;
        }
        self.layers = record
            .layers
            .into_iter()
            .enumerate()
            .map(|(i, layer)| ScheduleLayer::from_record(i, layer, &zone))
            .collect();
        self.overrides = record
            .overrides
            .into_iter()
            .enumerate()
            .map(|(i, o)| ScheduleOverride::from_record(i, o, &zone))
            .collect();
        self.time_zone = zone;
    }
}

impl ScheduleLayer {
    fn to_record(&self, zone: &str) -> Result<LayerRecord> {
        validate::required("layers.name", &self.name)?;
        validate::range("layers.shift_length", self.shift_length, MIN_SHIFT, MAX_SHIFT)?;
        validate::min_items("layers.users", &self.users, 1)?;
        validate::range("layers.restriction_type", self.restriction_type, 0, 2)?;

        let restrictions = self
            .restrictions
            .iter()
            .map(|r| r.normalized(self.restriction_type))
            .collect::<Result<Vec<_>>>()?;

        Ok(LayerRecord {
            name: self.name.clone(),
            shift_length: self.shift_length,
            rotation_start_time: required_time(
                "layers.rotation_start_time",
                self.rotation_start_time.as_deref(),
                zone,
            )?,
            rotation_end_time: required_time(
                "layers.rotation_end_time",
                self.rotation_end_time.as_deref(),
                zone,
            )?,
            users: self
                .users
                .iter()
                .map(|user| LayerUser { user: user.clone() })
                .collect(),
            restriction_type: self.restriction_type,
            restrictions,
        })
    }

    fn from_record(index: usize, record: LayerRecord, zone: &str) -> Self {
        let name = if record.name.trim().is_empty() {
            format!("Layer-{}", index + 1)
        } else {
            record.name
        };
        Self {
            name,
            shift_length: record.shift_length,
            rotation_start_time: timewindow::from_utc_lenient(
                "rotation_start_time",
                &record.rotation_start_time,
                zone,
            ),
            rotation_end_time: timewindow::from_utc_lenient(
                "rotation_end_time",
                &record.rotation_end_time,
                zone,
            ),
            users: record.users.into_iter().map(|u| u.user).collect(),
            restriction_type: record.restriction_type,
            restrictions: record
                .restrictions
                .into_iter()
                .map(|mut r| {
                    if r.duration == 0 {
                        r.duration = 1;
                    }
                    r
                })
                .collect(),
        }
    }
}

impl LayerRestriction {
    /// Check against the layer's restriction type. Daily restrictions always
    /// start on day 7.
    fn normalized(&self, restriction_type: i64) -> Result<LayerRestriction> {
        if restriction_type == RESTRICTION_NONE {
            return Err(ProviderError::validation(
                "layers.restrictions",
                "restriction_type must be daily (1) or weekly (2) to add restrictions",
            ));
        }
        validate::range("layers.restrictions.duration", self.duration, 1, WEEK)?;
        if restriction_type == RESTRICTION_DAILY && self.duration >= DAY {
            return Err(ProviderError::validation(
                "layers.restrictions.duration",
                "must be less than 86400 for a daily restriction",
            ));
        }
        if restriction_type == RESTRICTION_WEEKLY && self.duration >= WEEK {
            return Err(ProviderError::validation(
                "layers.restrictions.duration",
                "must be less than 604800 for a weekly restriction",
            ));
        }
        validate::range("layers.restrictions.start_day_of_week", self.start_day_of_week, 1, 7)?;
        if !TIME_OF_DAY.is_match(&self.start_time_of_day) {
            return Err(ProviderError::InvalidTimeFormat {
                value: self.start_time_of_day.clone(),
                expected: "HH:MM:SS",
            });
        }

        Ok(LayerRestriction {
            duration: self.duration,
            start_day_of_week: if restriction_type == RESTRICTION_DAILY {
                7
            } else {
                self.start_day_of_week
            },
            start_time_of_day: self.start_time_of_day.clone(),
        })
    }
}

impl ScheduleOverride {
    fn to_record(&self, zone: &str) -> Result<OverrideRecord> {
        validate::required("overrides.user", &self.user)?;
        Ok(OverrideRecord {
            name: self.name.clone(),
            start_time: required_time("overrides.start_time", self.start_time.as_deref(), zone)?,
            end_time: required_time("overrides.end_time", self.end_time.as_deref(), zone)?,
            user: self.user.clone(),
        })
    }

    fn from_record(index: usize, record: OverrideRecord, zone: &str) -> Self {
        let name = if record.name.trim().is_empty() {
            format!("Override-{}", index + 1)
        } else {
            record.name
        };
        Self {
            name,
            start_time: timewindow::from_utc_lenient("start_time", &record.start_time, zone),
            end_time: timewindow::from_utc_lenient("end_time", &record.end_time, zone),
            user: record.user,
        }
    }
}

fn required_time(field: &str, value: Option<&str>, zone: &str) -> Result<String> {
    let value = value.ok_or_else(|| ProviderError::validation(field, "is required"))?;
    timewindow::to_utc(value, zone)
}

pub struct ScheduleResource;

#[async_trait]
impl Resource for ScheduleResource {
    type Config = ScheduleConfig;
    const KIND: &'static str = "zenduty_schedules";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "schedule_id"];

    async fn create(client: &ZendutyClient, config: &mut ScheduleConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: ScheduleRecord = client.post(&schedules_path(&config.team_id), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut ScheduleConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        let record: ScheduleRecord = client.get(&schedule_path(&config.team_id, id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut ScheduleConfig) -> Result<()> {
        let mut payload = config.to_record()?;
        payload.unique_id = id.to_string();
        let _: ScheduleRecord = client
            .patch(&schedule_path(&config.team_id, id), &payload)
            .await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &ScheduleConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        client.delete(&schedule_path(&config.team_id, id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut ScheduleConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::resources::{self, ResourceState};
    use serde_json::json;
    use std::sync::Arc;

    const TEAM: &str = "11111111-1111-4111-8111-111111111111";

    fn layer() -> ScheduleLayer {
        ScheduleLayer {
            name: "Primary".to_string(),
            shift_length: 7 * DAY,
            rotation_start_time: Some("2024-01-15 09:00".to_string()),
            rotation_end_time: Some("2025-01-15 09:00".to_string()),
            users: vec!["jdoe".to_string()],
            restriction_type: 0,
            restrictions: vec![],
        }
    }

    fn config() -> ScheduleConfig {
        ScheduleConfig {
            team_id: TEAM.to_string(),
            name: "On-call".to_string(),
            time_zone: "Asia/Kolkata".to_string(),
            layers: vec![layer()],
            overrides: vec![ScheduleOverride {
                name: "Holiday".to_string(),
                start_time: Some("2024-12-25 00:00".to_string()),
                end_time: Some("2024-12-26 00:00".to_string()),
                user: "asmith".to_string(),
            }],
            ..ScheduleConfig::default()
        }
    }

    #[test]
    fn test_times_sent_as_utc() {
        let record = config().to_record().unwrap();
        assert_eq!(record.layers[0].rotation_start_time, "2024-01-15T03:30:00Z");
        assert_eq!(record.overrides[0].start_time, "2024-12-24T18:30:00Z");
    }

    #[test]
    fn test_unknown_time_zone() {
        let mut cfg = config();
        cfg.time_zone = "Moon/Crater".to_string();
        assert!(matches!(cfg.to_record(), Err(ProviderError::UnknownTimezone(_))));
    }

    #[test]
    fn test_bad_override_time() {
        let mut cfg = config();
        cfg.overrides[0].end_time = Some("tomorrow".to_string());
        assert!(matches!(
            cfg.to_record(),
            Err(ProviderError::InvalidTimeFormat { .. })
        ));
    }

    #[test]
    fn test_restrictions_need_a_type() {
        let mut cfg = config();
        cfg.layers[0].restrictions = vec![LayerRestriction {
            duration: 3600,
            start_day_of_week: 1,
            start_time_of_day: "09:00:00".to_string(),
        }];
        assert!(cfg.to_record().is_err());

        cfg.layers[0].restriction_type = RESTRICTION_DAILY;
        let record = cfg.to_record().unwrap();
        assert_eq!(record.layers[0].restrictions[0].start_day_of_week, 7);
    }

    #[test]
    fn test_restriction_duration_limits() {
        let mut cfg = config();
        cfg.layers[0].restriction_type = RESTRICTION_DAILY;
        cfg.layers[0].restrictions = vec![LayerRestriction {
            duration: DAY,
            start_day_of_week: 1,
            start_time_of_day: "09:00:00".to_string(),
        }];
        assert!(cfg.to_record().is_err());

        cfg.layers[0].restriction_type = RESTRICTION_WEEKLY;
        assert!(cfg.to_record().is_ok());

        cfg.layers[0].restrictions[0].start_time_of_day = "25:00:00".to_string();
        assert!(cfg.to_record().is_err());
    }

    #[test]
    fn test_shift_length_and_users() {
        let mut cfg = config();
        cfg.layers[0].shift_length = 60;
        assert!(cfg.to_record().is_err());

        let mut cfg = config();
        cfg.layers[0].users.clear();
        assert!(cfg.to_record().is_err());
    }

    #[tokio::test]
    async fn test_read_tolerates_bad_timestamp_and_fills_defaults() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));
        let id = "22222222-2222-4222-9222-222222222222";

        api.seed(
            &schedule_path(TEAM, id),
            json!({
                "unique_id": id,
                "team": TEAM,
                "name": "On-call",
                "time_zone": "Asia/Kolkata",
                "layers": [{
                    "name": "",
                    "shift_length": 86400,
                    "rotation_start_time": "garbage",
                    "rotation_end_time": "2025-01-15T03:30:00Z",
                    "users": [{"user": "jdoe"}],
                    "restriction_type": 1,
                    "restrictions": [{"duration": 0, "start_day_of_week": 7, "start_time_of_day": "09:00:00"}]
                }],
                "overrides": [{
                    "name": "",
                    "start_time": "2024-12-24T18:30:00.000Z",
                    "end_time": "2024-12-25T18:30:00Z",
                    "user": "asmith"
                }]
            }),
        );

        let mut state = ResourceState {
            id: Some(id.to_string()),
            config: ScheduleConfig {
                team_id: TEAM.to_string(),
                ..ScheduleConfig::default()
            },
        };
        resources::read::<ScheduleResource>(&client, &mut state).await.unwrap();

        let layer = &state.config.layers[0];
        assert_eq!(layer.name, "Layer-1");
        assert_eq!(layer.rotation_start_time, None);
        assert_eq!(layer.rotation_end_time.as_deref(), Some("2025-01-15 09:00"));
        assert_eq!(layer.restrictions[0].duration, 1);
        assert_eq!(layer.users, vec!["jdoe"]);

        let over = &state.config.overrides[0];
        assert_eq!(over.name, "Override-1");
        assert_eq!(over.start_time.as_deref(), Some("2024-12-25 00:00"));
        assert_eq!(state.config.name, "On-call");
    }

    #[tokio::test]
    async fn test_read_of_deleted_schedule_clears_handle() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let mut state = ResourceState::new(config());
        resources::create::<ScheduleResource>(&client, &mut state).await.unwrap();
        let id = state.id.clone().unwrap();
        api.remove(&schedule_path(TEAM, &id));

        resources::read::<ScheduleResource>(&client, &mut state).await.unwrap();
        assert!(state.id.is_none());
        assert_eq!(client.metrics().snapshot().handles_cleared, 1);
    }
}
