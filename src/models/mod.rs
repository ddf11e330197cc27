mod condition;
mod endpoint;
mod meta;
mod provider_config;
mod secret;

pub use condition::{Condition, ConditionReason, ConditionStatus, READY_CONDITION};
pub use endpoint::{
    Endpoint, EndpointParameters, EndpointSpec, EndpointStatus, ProviderConfigReference,
};
pub use meta::ObjectMeta;
pub use provider_config::{
    CredentialsSource, ProviderConfig, ProviderConfigSpec, ProviderCredentials,
};
pub use secret::{Secret, SecretKeySelector};
