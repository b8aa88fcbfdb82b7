use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::router::router_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};

const ROUTE_TO_INTEGRATION: i64 = 0;

pub(crate) fn rules_path(router_id: &str) -> String {
    format!("{}rulesets/", router_path(router_id))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingRuleConfig {
    pub router_id: String,
    pub name: String,
    pub rule_json: String,
    #[serde(default)]
    pub actions: Vec<RoutingAction>,
}

/// Action 0 routes matching events to `integration`, action 1 suppresses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingAction {
    pub action_type: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingRuleRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub rule_json: String,
    pub actions: Vec<RoutingActionRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingActionRecord {
    pub action_type: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub integration: String,
    /// Responses expand the integration into an object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_object: Option<IntegrationRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationRef {
    pub unique_id: String,
}

impl RoutingRuleConfig {
    fn to_record(&self) -> Result<RoutingRuleRecord> {
        validate::required("router_id", &self.router_id)?;
        validate::required("name", &self.name)?;
        validate::required("rule_json", &self.rule_json)?;
        validate::json_object("rule_json", &self.rule_json)?;

        let actions = self
            .actions
            .iter()
            .map(|action| {
                validate::range("actions.action_type", action.action_type, 0, 1)?;
                let integration = action.integration.clone().unwrap_or_default();
                if action.action_type == ROUTE_TO_INTEGRATION && integration.is_empty() {
                    return Err(ProviderError::validation(
                        "actions.integration",
                        "required when routing to an integration",
                    ));
                }
                Ok(RoutingActionRecord {
                    action_type: action.action_type,
                    integration,
                    integration_object: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RoutingRuleRecord {
            unique_id: String::new(),
            name: self.name.clone(),
            rule_json: self.rule_json.clone(),
            actions,
        })
    }

    fn apply(&mut self, record: RoutingRuleRecord) {
        self.name = record.name;
        self.rule_json = record.rule_json;
        self.actions = record
            .actions
            .into_iter()
            .map(|action| {
                let integration = action
                    .integration_object
                    .map(|obj| obj.unique_id)
                    .unwrap_or(action.integration);
                RoutingAction {
                    action_type: action.action_type,
                    integration: validate::non_empty(integration),
                }
            })
            .collect();
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", rules_path(&self.router_id), id)
    }
}

pub struct RoutingRuleResource;

#[async_trait]
impl Resource for RoutingRuleResource {
    type Config = RoutingRuleConfig;
    const KIND: &'static str = "zenduty_globalrouting_rule";
    const IMPORT_FIELDS: &'static [&'static str] = &["router_id", "rule_id"];

    async fn create(client: &ZendutyClient, config: &mut RoutingRuleConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: RoutingRuleRecord =
            client.post(&rules_path(&config.router_id), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut RoutingRuleConfig) -> Result<()> {
        let record: RoutingRuleRecord = client.get(&config.path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut RoutingRuleConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let _: RoutingRuleRecord = client.put(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &RoutingRuleConfig) -> Result<()> {
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut RoutingRuleConfig) {
        if let [router_id] = scope {
            config.router_id = router_id.clone();
        }
    }
}
