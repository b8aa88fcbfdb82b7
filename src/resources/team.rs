use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::retry::retry;

pub(crate) const TEAMS_PATH: &str = "/api/account/teams/";

pub(crate) fn team_path(team_id: &str) -> String {
    format!("{}{}/", TEAMS_PATH, team_id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
}

impl TeamConfig {
    fn to_record(&self) -> Result<TeamRecord> {
        validate::required("name", &self.name)?;
        Ok(TeamRecord {
            unique_id: String::new(),
            name: self.name.clone(),
        })
    }

    fn apply(&mut self, record: TeamRecord) {
        self.name = record.name;
    }
}

pub struct TeamResource;

#[async_trait]
impl Resource for TeamResource {
    type Config = TeamConfig;
    const KIND: &'static str = "zenduty_teams";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id"];

    /// Team creation can briefly fail right after an account is provisioned,
    /// so it is retried under the client's policy.
    async fn create(client: &ZendutyClient, config: &mut TeamConfig) -> Result<String> {
        let payload = config.to_record()?;
        let payload = &payload;
        let mut attempt = 0u32;

        let created: TeamRecord = retry(client.retry_policy(), "create team", move || {
            attempt += 1;
            if attempt > 1 {
                client.metrics().retry();
            }
            client.post(TEAMS_PATH, payload)
        })
        .await
        .map_err(ProviderError::from)?;

        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut TeamConfig) -> Result<()> {
        let record: TeamRecord = client.get(&team_path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut TeamConfig) -> Result<()> {
        let mut payload = config.to_record()?;
        payload.unique_id = id.to_string();
        let _: TeamRecord = client.patch(&team_path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, _config: &TeamConfig) -> Result<()> {
        client.delete(&team_path(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::resources::{self, ResourceState};
    use crate::retry::RetryPolicy;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(api: &InMemoryApi) -> ZendutyClient {
        ZendutyClient::new(Arc::new(api.clone())).with_retry_policy(RetryPolicy {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            max_elapsed: Duration::from_millis(500),
            multiplier: 2.0,
        })
    }

    #[tokio::test]
    async fn test_create_retries_transient_failures() {
        let api = InMemoryApi::new();
        let client = client(&api);
        api.fail_next(503, 2);

        let mut state = ResourceState::new(TeamConfig {
            name: "SRE".to_string(),
        });
        resources::create::<TeamResource>(&client, &mut state).await.unwrap();

        let id = state.id.clone().unwrap();
        assert!(api.object(&team_path(&id)).is_some());
        assert_eq!(client.metrics().snapshot().retries, 2);
    }

    #[tokio::test]
    async fn test_update_is_not_retried() {
        let api = InMemoryApi::new();
        let client = client(&api);

        let mut state = ResourceState::new(TeamConfig {
            name: "SRE".to_string(),
        });
        resources::create::<TeamResource>(&client, &mut state).await.unwrap();

        api.fail_next(503, 1);
        state.config.name = "Platform".to_string();
        let err = resources::update::<TeamResource>(&client, &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RemoteApi(_)));
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_request() {
        let api = InMemoryApi::new();
        let client = client(&api);

        let mut state = ResourceState::new(TeamConfig::default());
        let err = resources::create::<TeamResource>(&client, &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_read_refreshes_name() {
        let api = InMemoryApi::new();
        let client = client(&api);

        let mut state = ResourceState::new(TeamConfig {
            name: "SRE".to_string(),
        });
        resources::create::<TeamResource>(&client, &mut state).await.unwrap();
        let path = team_path(state.id.as_deref().unwrap());
        let mut remote = api.object(&path).unwrap();
        remote["name"] = "Renamed".into();
        api.seed(&path, remote);

        resources::read::<TeamResource>(&client, &mut state).await.unwrap();
        assert_eq!(state.config.name, "Renamed");
    }
}
