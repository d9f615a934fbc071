//! Dial targets

use crate::domain::shared::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Kind of endpoint a dial target points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Phone,
}

/// Where to route a new call leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialTarget {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk: Option<String>,
}

impl DialTarget {
    /// Plain phone destination, routed by the runtime's default carrier
    pub fn phone(number: impl Into<String>) -> Result<Self> {
        let number = number.into();
        if number.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "dial target number must not be empty".to_string(),
            ));
        }

        Ok(Self {
            target_type: TargetType::Phone,
            number,
            trunk: None,
        })
    }

    /// Route through a named outbound trunk
    pub fn via_trunk(mut self, trunk: impl Into<String>) -> Self {
        self.trunk = Some(trunk.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phone_target_serialization() {
        let target = DialTarget::phone("+15551230000").unwrap();
        assert_eq!(
            serde_json::to_value(&target).unwrap(),
            json!({"type": "phone", "number": "+15551230000"})
        );

        let trunked = target.via_trunk("Retell-jambonz-hosted");
        assert_eq!(
            serde_json::to_value(&trunked).unwrap(),
            json!({"type": "phone", "number": "+15551230000", "trunk": "Retell-jambonz-hosted"})
        );
    }

    #[test]
    fn test_empty_number_rejected() {
        assert!(matches!(
            DialTarget::phone(""),
            Err(DomainError::ValidationError(_))
        ));
    }
}
