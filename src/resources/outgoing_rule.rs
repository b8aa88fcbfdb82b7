use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::integration::integration_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

fn outgoing_rules_path(team_id: &str, service_id: &str, integration_id: &str) -> String {
    format!(
        "{}outgoing_rules/",
        integration_path(team_id, service_id, integration_id)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingRuleConfig {
    pub team_id: String,
    pub service_id: String,
    pub integration_id: String,
    pub rule_json: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for OutgoingRuleConfig {
    fn default() -> Self {
        Self {
            team_id: String::new(),
            service_id: String::new(),
            integration_id: String::new(),
            rule_json: String::new(),
            enabled: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingRuleRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub rule_json: String,
    pub enabled: bool,
}

impl OutgoingRuleConfig {
    fn to_record(&self) -> Result<OutgoingRuleRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::uuid("service_id", &self.service_id)?;
        validate::uuid("integration_id", &self.integration_id)?;
        validate::required("rule_json", &self.rule_json)?;
        validate::json_object("rule_json", &self.rule_json)?;

        Ok(OutgoingRuleRecord {
            unique_id: String::new(),
            rule_json: self.rule_json.clone(),
            enabled: self.enabled,
        })
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", self.collection(), id)
    }

    fn collection(&self) -> String {
        outgoing_rules_path(&self.team_id, &self.service_id, &self.integration_id)
    }
}

pub struct OutgoingRuleResource;

#[async_trait]
impl Resource for OutgoingRuleResource {
    type Config = OutgoingRuleConfig;
    const KIND: &'static str = "zenduty_outgoing_rules";
    const IMPORT_FIELDS: &'static [&'static str] =
        &["team_id", "service_id", "integration_id", "outgoing_rule_id"];

    async fn create(client: &ZendutyClient, config: &mut OutgoingRuleConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: OutgoingRuleRecord = client.post(&config.collection(), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut OutgoingRuleConfig) -> Result<()> {
        let record: OutgoingRuleRecord = client.get(&config.path(id)).await?;
        config.rule_json = record.rule_json;
        config.enabled = record.enabled;
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut OutgoingRuleConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let _: OutgoingRuleRecord = client.put(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &OutgoingRuleConfig) -> Result<()> {
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut OutgoingRuleConfig) {
        if let [team_id, service_id, integration_id] = scope {
            config.team_id = team_id.clone();
            config.service_id = service_id.clone();
            config.integration_id = integration_id.clone();
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

    const TEAM: &str = "11111111-1111-4111-8111-111111111111";
    const SERVICE: &str = "22222222-2222-4222-9222-222222222222";
    const INTEGRATION: &str = "33333333-3333-4333-a333-333333333333";

    fn config() -> OutgoingRuleConfig {
        serde_json::from_value(json!({
            "team_id": TEAM,
            "service_id": SERVICE,
            "integration_id": INTEGRATION,
            "rule_json": r#"{"webhook":"https://hooks.example.com/zd"}"#,
        }))
        .unwrap()
    }

    #[test]
    fn test_enabled_by_default() {
        assert!(config().enabled);
    }

    #[test]
    fn test_rule_json_checks() {
        let mut cfg = config();
        cfg.rule_json = String::new();
        assert!(matches!(
            cfg.to_record(),
            Err(ProviderError::Validation { ref field, .. }) if field == "rule_json"
        ));
        cfg.rule_json = "\"just a string\"".to_string();
        assert!(cfg.to_record().is_err());
    }

    #[test]
    fn test_import_rejects_bad_rule_id() {
        let err = OutgoingRuleResource::import(&format!(
            "{}/{}/{}/not-a-uuid",
            TEAM, SERVICE, INTEGRATION
        ))
        .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidUuid { position: Some(3), .. }));
    }

    #[tokio::test]
    async fn test_disable_and_refresh() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let mut state = ResourceState::new(config());
        resources::create::<OutgoingRuleResource>(&client, &mut state)
            .await
            .unwrap();

        state.config.enabled = false;
        resources::update::<OutgoingRuleResource>(&client, &mut state)
            .await
            .unwrap();

        state.config.enabled = true;
        resources::read::<OutgoingRuleResource>(&client, &mut state)
            .await
            .unwrap();
        assert!(!state.config.enabled);
    }
}
