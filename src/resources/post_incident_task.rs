use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;
use crate::timewindow;

// Due dates carry no zone of their own and are taken as UTC.
const DUE_TIMEZONE: &str = "UTC";

fn tasks_path(team_id: &str) -> String {
    format!("{}postincidenttasks/", team_path(team_id))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostIncidentTaskConfig {
    pub team_id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// 0 open, 1 in progress, 2 done
    #[serde(default)]
    pub status: i64,
    /// `YYYY-MM-DD HH:MM`, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_in_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostIncidentTaskRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub team: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub assigned_to: String,
    pub status: i64,
    pub due_in_time: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
}

impl PostIncidentTaskConfig {
    fn to_record(&self) -> Result<PostIncidentTaskRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("title", &self.title)?;
        validate::required("description", &self.description)?;
        validate::range("status", self.status, 0, 2)?;

        let due_in_time = match self.due_in_time.as_deref().filter(|d| !d.is_empty()) {
            Some(due) => Some(timewindow::to_utc(due, DUE_TIMEZONE)?),
            None => None,
        };

        Ok(PostIncidentTaskRecord {
            unique_id: String::new(),
            team: self.team_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            assigned_to: self.assigned_to.clone().unwrap_or_default(),
            status: self.status,
            due_in_time,
            creation_date: String::new(),
        })
    }

    fn apply(&mut self, record: PostIncidentTaskRecord) {
        self.title = record.title;
        self.description = record.description;
        self.assigned_to = validate::non_empty(record.assigned_to);
        self.status = record.status;
        if let Some(due) = record.due_in_time {
            // Unparseable values are kept as the API returned them.
            self.due_in_time = Some(timewindow::from_utc(&due, DUE_TIMEZONE).unwrap_or(due));
        }
        self.creation_date = validate::non_empty(record.creation_date);
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", tasks_path(&self.team_id), id)
    }
}

pub struct PostIncidentTaskResource;

#[async_trait]
impl Resource for PostIncidentTaskResource {
    type Config = PostIncidentTaskConfig;
    const KIND: &'static str = "zenduty_post_incident_tasks";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "task_id"];

    async fn create(
        client: &ZendutyClient,
        config: &mut PostIncidentTaskConfig,
    ) -> Result<String> {
        let payload = config.to_record()?;
        let created: PostIncidentTaskRecord =
            client.post(&tasks_path(&config.team_id), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(
        client: &ZendutyClient,
        id: &str,
        config: &mut PostIncidentTaskConfig,
    ) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        let record: PostIncidentTaskRecord = client.get(&config.path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut PostIncidentTaskConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let _: PostIncidentTaskRecord = client.put(&config.path(id), &payload).await?;
        Self::read(client, id, config).await
    }

    async fn delete(
        client: &ZendutyClient,
        id: &str,
        config: &PostIncidentTaskConfig,
    ) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut PostIncidentTaskConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::error::ProviderError;
    use crate::resources::{self, ResourceState};
    use serde_json::json;
    use std::sync::Arc;

    fn config() -> PostIncidentTaskConfig {
        PostIncidentTaskConfig {
            team_id: "11111111-1111-4111-8111-111111111111".to_string(),
            title: "Write postmortem".to_string(),
            description: "Root cause and follow ups".to_string(),
            due_in_time: Some("2024-02-01 17:00".to_string()),
            ..PostIncidentTaskConfig::default()
        }
    }

    #[test]
    fn test_due_time_is_utc() {
        let record = config().to_record().unwrap();
        assert_eq!(record.due_in_time.as_deref(), Some("2024-02-01T17:00:00Z"));
    }

    #[test]
    fn test_bad_due_time() {
        let mut cfg = config();
        cfg.due_in_time = Some("tomorrow".to_string());
        assert!(matches!(
            cfg.to_record(),
            Err(ProviderError::InvalidTimeFormat { .. })
        ));
    }

    #[test]
    fn test_status_bounds() {
        let mut cfg = config();
        cfg.status = 3;
        assert!(cfg.to_record().is_err());
    }

    #[tokio::test]
    async fn test_update_refreshes() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let mut state = ResourceState::new(config());
        resources::create::<PostIncidentTaskResource>(&client, &mut state)
            .await
            .unwrap();

        state.config.status = 2;
        resources::update::<PostIncidentTaskResource>(&client, &mut state)
            .await
            .unwrap();
        assert_eq!(state.config.status, 2);
        assert_eq!(state.config.due_in_time.as_deref(), Some("2024-02-01 17:00"));
    }

    #[test]
    fn test_unparseable_due_time_kept_raw() {
        let mut cfg = config();
        cfg.apply(
            serde_json::from_value(json!({
                "title": "t",
                "description": "d",
                "due_in_time": "2024-02-01T17:00:00+05:30",
            }))
            .unwrap(),
        );
        assert_eq!(
            cfg.due_in_time.as_deref(),
            Some("2024-02-01T17:00:00+05:30")
        );
    }
}
