use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};

pub(crate) fn policies_path(team_id: &str) -> String {
    format!("{}escalation_policies/", team_path(team_id))
}

pub(crate) fn policy_path(team_id: &str, policy_id: &str) -> String {
    format!("{}{}/", policies_path(team_id), policy_id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscalationPolicyConfig {
    pub team_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<EscalationRule>,
    #[serde(default)]
    pub repeat_policy: i64,
    #[serde(default)]
    pub move_to_next: bool,
}

/// One escalation step. Delays are minutes from incident creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationRule {
    pub delay: i64,
    pub targets: Vec<EscalationTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationTarget {
    pub target_type: i64,
    pub target_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationPolicyRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub team: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub rules: Vec<EscalationRule>,
    pub repeat_policy: i64,
    pub move_to_next: bool,
}

impl EscalationPolicyConfig {
    fn to_record(&self) -> Result<EscalationPolicyRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        validate::not_blank("description", self.description.as_deref())?;
        validate::range("repeat_policy", self.repeat_policy, 0, 10)?;
        check_delays(&self.rules)?;

        Ok(EscalationPolicyRecord {
            unique_id: String::new(),
            team: self.team_id.clone(),
            name: self.name.clone(),
            summary: self.summary.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            rules: self.rules.clone(),
            repeat_policy: self.repeat_policy,
            move_to_next: self.move_to_next,
        })
    }

    fn apply(&mut self, record: EscalationPolicyRecord) {
        if !record.team.is_empty() {
            self.team_id = record.team;
        }
        self.name = record.name;
        self.summary = validate::non_empty(record.summary);
        self.description = validate::non_empty(record.description);
        self.rules = record.rules;
        self.repeat_policy = record.repeat_policy;
        self.move_to_next = record.move_to_next;
    }
}

fn check_delays(rules: &[EscalationRule]) -> Result<()> {
    for pair in rules.windows(2) {
        if pair[1].delay < pair[0].delay {
            return Err(ProviderError::validation(
                "rules.delay",
                format!(
                    "delay {} must not be less than the previous rule's delay {}",
                    pair[1].delay, pair[0].delay
                ),
            ));
        }
    }
    Ok(())
}

pub struct EscalationPolicyResource;

#[async_trait]
impl Resource for EscalationPolicyResource {
    type Config = EscalationPolicyConfig;
    const KIND: &'static str = "zenduty_esp";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "esp_id"];

    async fn create(client: &ZendutyClient, config: &mut EscalationPolicyConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: EscalationPolicyRecord =
            client.post(&policies_path(&config.team_id), &payload).await?;
        let id = created.unique_id;

        // Rule ordering and defaults are decided server side.
        Self::read(client, &id, config).await?;
        Ok(id)
    }

    async fn read(
        client: &ZendutyClient,
        id: &str,
        config: &mut EscalationPolicyConfig,
    ) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        let record: EscalationPolicyRecord =
            client.get(&policy_path(&config.team_id, id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut EscalationPolicyConfig,
    ) -> Result<()> {
        let mut payload = config.to_record()?;
        payload.unique_id = id.to_string();
        let _: EscalationPolicyRecord = client
            .put(&policy_path(&config.team_id, id), &payload)
            .await?;
        Ok(())
    }

    async fn delete(
        client: &ZendutyClient,
        id: &str,
        config: &EscalationPolicyConfig,
    ) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        client.delete(&policy_path(&config.team_id, id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut EscalationPolicyConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}
