use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::integration::integration_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::ident;

// Action types whose value lands in a dedicated field of the API payload.
const ACTION_SUPPRESS: i64 = 3;
const ACTION_ESCALATION_POLICY: i64 = 4;
const ACTION_ASSIGN_USER: i64 = 6;
const ACTION_ROLE: i64 = 11;
const ACTION_SLA: i64 = 14;
const ACTION_TEAM_PRIORITY: i64 = 15;

const ACTION_SEVERITY: i64 = 1;
const ACTION_URGENCY: i64 = 7;
const UUID_VALUED: &[i64] = &[4, 12, 13, 14, 15];

pub(crate) fn alert_rules_path(team_id: &str, service_id: &str, integration_id: &str) -> String {
    format!(
        "{}transformers/",
        integration_path(team_id, service_id, integration_id)
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRuleConfig {
    pub team_id: String,
    pub service_id: String,
    pub integration_id: String,
    pub description: String,
    pub rule_json: String,
    #[serde(default)]
    pub actions: Vec<AlertAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertAction {
    pub action_type: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRuleRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub description: String,
    pub rule_json: String,
    pub actions: Vec<AlertActionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertActionRecord {
    pub action_type: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub escalation_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub assigned_to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sla: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub team_priority: String,
}

impl AlertAction {
    fn to_record(&self) -> Result<AlertActionRecord> {
        let action_type = self.action_type;
        validate::range("actions.action_type", action_type, 1, 15)?;

        let value = self.value.clone().unwrap_or_default();
        if action_type != ACTION_SUPPRESS && value.is_empty() {
            return Err(ProviderError::validation("actions.value", "is required"));
        }
        if UUID_VALUED.contains(&action_type) {
            ident::require_uuid("actions.value", &value)?;
        }
        if action_type == ACTION_URGENCY && value != "0" && value != "1" {
            return Err(ProviderError::validation(
                "actions.value",
                "incident urgency must be 0 or 1",
            ));
        }
        if action_type == ACTION_SEVERITY {
            let severity: i64 = value.parse().map_err(|_| {
                ProviderError::validation("actions.value", format!("{:?} is not a number", value))
            })?;
            validate::range("actions.value", severity, 0, 5)?;
        }

        let mut record = AlertActionRecord {
            action_type,
            ..AlertActionRecord::default()
        };
        match action_type {
            ACTION_SUPPRESS => {}
            ACTION_ESCALATION_POLICY => record.escalation_policy = value,
            ACTION_ASSIGN_USER => record.assigned_to = value,
            ACTION_SLA => record.sla = value,
            ACTION_TEAM_PRIORITY => record.team_priority = value,
            ACTION_ROLE => {
                let key = self.key.clone().unwrap_or_default();
                validate::required("actions.key", &key)?;
                ident::require_uuid("actions.key", &key)?;
                record.key = key;
                record.value = value;
            }
            _ => record.value = value,
        }
        Ok(record)
    }

    fn from_record(record: AlertActionRecord) -> Self {
        let value = match record.action_type {
            ACTION_SUPPRESS => None,
            ACTION_ESCALATION_POLICY => Some(record.escalation_policy),
            ACTION_ASSIGN_USER => Some(record.assigned_to),
            ACTION_SLA => Some(record.sla),
            ACTION_TEAM_PRIORITY => Some(record.team_priority),
            _ => Some(record.value),
        };
        let key = (record.action_type == ACTION_ROLE).then_some(record.key);
        Self {
            action_type: record.action_type,
            key,
            value,
        }
    }
}

impl AlertRuleConfig {
    fn to_record(&self) -> Result<AlertRuleRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::uuid("service_id", &self.service_id)?;
        validate::uuid("integration_id", &self.integration_id)?;
        validate::required("description", &self.description)?;
        validate::required("rule_json", &self.rule_json)?;
        validate::json_object("rule_json", &self.rule_json)?;

        let actions = self
            .actions
            .iter()
            .map(AlertAction::to_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(AlertRuleRecord {
            unique_id: String::new(),
            description: self.description.clone(),
            rule_json: self.rule_json.clone(),
            actions,
        })
    }

    fn apply(&mut self, record: AlertRuleRecord) {
        self.description = record.description;
        self.rule_json = record.rule_json;
        self.actions = record.actions.into_iter().map(AlertAction::from_record).collect();
    }

    fn collection(&self) -> String {
        alert_rules_path(&self.team_id, &self.service_id, &self.integration_id)
    }
}

pub struct AlertRuleResource;

#[async_trait]
impl Resource for AlertRuleResource {
    type Config = AlertRuleConfig;
    const KIND: &'static str = "zenduty_alertrules";
    const IMPORT_FIELDS: &'static [&'static str] =
        &["team_id", "service_id", "integration_id", "alert_rule_id"];

    async fn create(client: &ZendutyClient, config: &mut AlertRuleConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: AlertRuleRecord = client.post(&config.collection(), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut AlertRuleConfig) -> Result<()> {
        let path = format!("{}{}/", config.collection(), id);
        let record: AlertRuleRecord = client.get(&path).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut AlertRuleConfig) -> Result<()> {
        let payload = config.to_record()?;
        let path = format!("{}{}/", config.collection(), id);
        let _: AlertRuleRecord = client.put(&path, &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &AlertRuleConfig) -> Result<()> {
        client
            .delete(&format!("{}{}/", config.collection(), id))
            .await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut AlertRuleConfig) {
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
    use crate::resources::{self, ResourceState};
    use std::sync::Arc;

    const TEAM: &str = "11111111-1111-4111-8111-111111111111";
    const SERVICE: &str = "22222222-2222-4222-9222-222222222222";
    const INTEGRATION: &str = "33333333-3333-4333-a333-333333333333";
    const EP: &str = "44444444-4444-4444-b444-444444444444";

    fn action(action_type: i64, key: Option<&str>, value: Option<&str>) -> AlertAction {
        AlertAction {
            action_type,
            key: key.map(str::to_string),
            value: value.map(str::to_string),
        }
    }

    fn config(actions: Vec<AlertAction>) -> AlertRuleConfig {
        AlertRuleConfig {
            team_id: TEAM.to_string(),
            service_id: SERVICE.to_string(),
            integration_id: INTEGRATION.to_string(),
            description: "route disk alerts".to_string(),
            rule_json: r#"{"conditions":[{"key":"payload.disk","op":"gt","value":90}]}"#.to_string(),
            actions,
        }
    }

    #[test]
    fn test_value_routing() {
        let record = config(vec![
            action(4, None, Some(EP)),
            action(3, None, None),
            action(11, Some(EP), Some("owner")),
            action(1, None, Some("2")),
        ])
        .to_record()
        .unwrap();

        assert_eq!(record.actions[0].escalation_policy, EP);
        assert_eq!(record.actions[0].value, "");
        assert_eq!(record.actions[1].value, "");
        assert_eq!(record.actions[2].key, EP);
        assert_eq!(record.actions[3].value, "2");
    }

    #[test]
    fn test_action_rules() {
        // value required except for suppress
        assert!(config(vec![action(2, None, None)]).to_record().is_err());
        // uuid-valued types
        assert!(matches!(
            config(vec![action(14, None, Some("gold"))]).to_record(),
            Err(ProviderError::InvalidUuid { .. })
        ));
        // urgency
        assert!(config(vec![action(7, None, Some("2"))]).to_record().is_err());
        // severity
        assert!(config(vec![action(1, None, Some("6"))]).to_record().is_err());
        assert!(config(vec![action(1, None, Some("high"))]).to_record().is_err());
        // role needs a uuid key
        assert!(config(vec![action(11, None, Some("x"))]).to_record().is_err());
        // out of range
        assert!(config(vec![action(16, None, Some("x"))]).to_record().is_err());
    }

    #[test]
    fn test_rule_json_must_be_object() {
        let mut cfg = config(vec![]);
        cfg.rule_json = "[]".to_string();
        assert!(cfg.to_record().is_err());
    }

    #[test]
    fn test_import_four_segments() {
        let rule = "55555555-5555-4555-8555-555555555555";
        let state =
            AlertRuleResource::import(&format!("{}/{}/{}/{}", TEAM, SERVICE, INTEGRATION, rule))
                .unwrap();
        assert_eq!(state.id.as_deref(), Some(rule));
        assert_eq!(state.config.integration_id, INTEGRATION);
    }

    #[tokio::test]
    async fn test_round_trip_through_api() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));
        let actions = vec![
            action(4, None, Some(EP)),
            action(3, None, None),
            action(11, Some(EP), Some("owner")),
        ];

        let mut state = ResourceState::new(config(actions.clone()));
        resources::create::<AlertRuleResource>(&client, &mut state).await.unwrap();
        state.config.actions.clear();
        resources::read::<AlertRuleResource>(&client, &mut state).await.unwrap();

        assert_eq!(state.config.actions, actions);
    }
}
