//! Azure Resource Manager resource IDs

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static ARM_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^/(?i:subscriptions)/([^/]+)/(?i:resourceGroups)/([^/]+)/(?i:providers)/([^/]+)/([^/]+)/([^/]+)$",
    )
    .expect("ARM ID pattern is valid")
});

/// Provider namespace and type segment of an ARM resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmType {
    pub namespace: &'static str,
    pub type_segment: &'static str,
}

impl std::fmt::Display for ArmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.type_segment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("{0:?} is not a valid Azure resource ID")]
    Malformed(String),

    #[error("expected a {expected} ID, got {actual}")]
    WrongType { expected: ArmType, actual: String },
}

/// Parsed ARM resource ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureResourceId {
    pub arm_type: ArmType,
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl AzureResourceId {
    pub fn new(
        arm_type: ArmType,
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            arm_type,
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }

    /// Parse an ID, requiring it to be of `arm_type`.
    ///
    /// Static segments and the provider namespace compare case-insensitively.
    pub fn parse(arm_type: ArmType, id: &str) -> Result<Self, IdParseError> {
        let caps = ARM_ID
            .captures(id)
            .ok_or_else(|| IdParseError::Malformed(id.to_string()))?;

        let namespace = &caps[3];
        let type_segment = &caps[4];
        if !namespace.eq_ignore_ascii_case(arm_type.namespace)
            || !type_segment.eq_ignore_ascii_case(arm_type.type_segment)
        {
            return Err(IdParseError::WrongType {
                expected: arm_type,
                actual: format!("{}/{}", namespace, type_segment),
            });
        }

        Ok(Self::new(arm_type, &caps[1], &caps[2], &caps[5]))
    }
}

impl std::fmt::Display for AzureResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.subscription_id,
            self.resource_group,
            self.arm_type.namespace,
            self.arm_type.type_segment,
            self.name
        )
    }
}
