use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Condition, ObjectMeta, SecretKeySelector};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfigReference {
    pub name: String,
}

/// Configurable fields of an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointParameters {
    /// Optional endpoint id. Falls back to a random UUID when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Argo CD account the token is minted for.
    pub account: String,

    /// Secret receiving the minted token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_secret_to_ref: Option<SecretKeySelector>,
}

impl EndpointParameters {
    pub fn id_or_generate(&self) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<ProviderConfigReference>,

    pub for_provider: EndpointParameters,
}

/// Observed state. Only the readiness condition is ever written; the token
/// itself lives in the secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl EndpointStatus {
    pub fn condition(&self, kind: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }

    /// Replace the condition of the same type. An equivalent condition keeps
    /// its original transition time.
    pub fn set_condition(&mut self, condition: Condition) {
        match self.conditions.iter_mut().find(|c| c.kind == condition.kind) {
            Some(existing) if existing.equivalent(&condition) => {}
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
    }
}

/// Declarative request to hold an Argo CD account token in a secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub metadata: ObjectMeta,
    pub spec: EndpointSpec,

    #[serde(default)]
    pub status: EndpointStatus,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec: EndpointSpec {
                provider_config_ref: None,
                for_provider: EndpointParameters {
                    id: None,
                    account: account.into(),
                    write_secret_to_ref: None,
                },
            },
            status: EndpointStatus::default(),
        }
    }

    pub fn with_provider_config(mut self, name: impl Into<String>) -> Self {
        self.spec.provider_config_ref = Some(ProviderConfigReference { name: name.into() });
        self
    }

    pub fn with_secret_ref(mut self, secret_ref: SecretKeySelector) -> Self {
        self.spec.for_provider.write_secret_to_ref = Some(secret_ref);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn account(&self) -> &str {
        &self.spec.for_provider.account
    }

    pub fn secret_ref(&self) -> Option<&SecretKeySelector> {
        self.spec.for_provider.write_secret_to_ref.as_ref()
    }

    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.status.set_condition(condition);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::{ConditionReason, ConditionStatus, READY_CONDITION};

    #[test]
    fn parses_endpoint_document() {
        let json = r#"{
            "metadata": { "name": "team-a" },
            "spec": {
                "providerConfigRef": { "name": "argocd" },
                "forProvider": {
                    "account": "team-a",
                    "writeSecretToRef": { "namespace": "x", "name": "tok-a", "key": "bearer" }
                }
            }
        }"#;

        let endpoint: Endpoint = serde_json::from_str(json).unwrap();
        assert_eq!(endpoint.account(), "team-a");
        assert_eq!(
            endpoint.secret_ref(),
            Some(&SecretKeySelector::new("x", "tok-a", "bearer"))
        );
        assert!(endpoint.status.conditions.is_empty());
        assert!(!endpoint.is_being_deleted());
    }

    #[test]
    fn id_falls_back_to_uuid() {
        let mut params = EndpointParameters::default();
        let generated = params.id_or_generate();
        assert!(Uuid::parse_str(&generated).is_ok());

        params.id = Some("  ".to_string());
        assert!(Uuid::parse_str(&params.id_or_generate()).is_ok());

        params.id = Some("ep-1".to_string());
        assert_eq!(params.id_or_generate(), "ep-1");
    }

    #[test]
    fn set_condition_keeps_transition_time_when_unchanged() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::minutes(5);

        let mut status = EndpointStatus::default();
        status.set_condition(Condition::available(t0));
        status.set_condition(Condition::available(t1));

        let ready = status.condition(READY_CONDITION).unwrap();
        assert_eq!(ready.last_transition_time, t0);
        assert_eq!(status.conditions.len(), 1);

        status.set_condition(Condition::deleting(t1));
        let ready = status.condition(READY_CONDITION).unwrap();
        assert_eq!(ready.reason, ConditionReason::Deleting);
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.last_transition_time, t1);
    }
}
