use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceState, validate};
use crate::client::ZendutyClient;
use crate::error::Result;
use crate::ident;

fn rules_path(username: &str) -> String {
    format!("/api/account/users/{}/notification_rules/", username)
}

/// Per user rule: notify through `contact` after `delay` minutes for
/// incidents of the given urgency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRuleConfig {
    pub username: String,
    pub contact: String,
    pub urgency: i64,
    pub delay: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationRuleRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub contact: String,
    pub urgency: i64,
    pub start_delay: i64,
}

impl NotificationRuleConfig {
    fn to_record(&self) -> Result<NotificationRuleRecord> {
        validate::required("username", &self.username)?;
        validate::uuid("contact", &self.contact)?;
        validate::range("urgency", self.urgency, 0, 1)?;
        Ok(NotificationRuleRecord {
            unique_id: String::new(),
            contact: self.contact.clone(),
            urgency: self.urgency,
            start_delay: self.delay,
        })
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", rules_path(&self.username), id)
    }
}

pub struct NotificationRuleResource;

#[async_trait]
impl Resource for NotificationRuleResource {
    type Config = NotificationRuleConfig;
    const KIND: &'static str = "zenduty_notification_rules";
    const IMPORT_FIELDS: &'static [&'static str] = &["username", "notification_rule_id"];

    async fn create(client: &ZendutyClient, config: &mut NotificationRuleConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: NotificationRuleRecord =
            client.post(&rules_path(&config.username), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(
        client: &ZendutyClient,
        id: &str,
        config: &mut NotificationRuleConfig,
    ) -> Result<()> {
        let record: NotificationRuleRecord = client.get(&config.path(id)).await?;
        config.contact = record.contact;
        config.urgency = record.urgency;
        config.delay = record.start_delay;
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut NotificationRuleConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let _: NotificationRuleRecord = client.put(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(
        client: &ZendutyClient,
        id: &str,
        config: &NotificationRuleConfig,
    ) -> Result<()> {
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    /// Usernames are free form, only the rule id is checked.
    fn import(id: &str) -> Result<ResourceState<NotificationRuleConfig>> {
        let segments = ident::split(id, Self::IMPORT_FIELDS)?;
        ident::require_uuid(Self::IMPORT_FIELDS[1], &segments[1])?;
        Ok(ResourceState {
            id: Some(segments[1].clone()),
            config: NotificationRuleConfig {
                username: segments[0].clone(),
                ..NotificationRuleConfig::default()
            },
        })
    }
}
