//! Grant Application Service submission shapes
//!
//! Every field is optional and left out of the JSON when absent. The payload
//! mirrors only what the journey state actually holds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Submission payload for the Grant Application Service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPayload {
    /// Single Business Identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbi: Option<Value>,
    /// Firm Reference Number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frn: Option<Value>,
    /// Customer Reference Number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<Value>,
    /// Defra identity id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defra_id: Option<Value>,
    /// Grant scheme code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Value>,
    /// Scheme year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    /// Applicant confirmed their land details are current
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_checked_land_is_up_to_date: Option<Value>,
    /// One entry per selected action on the chosen parcel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_applications: Option<Vec<ActionApplication>>,
}

impl GasPayload {
    /// Whether the payload carries any field at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single land-management action applied for on a parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionApplication {
    /// Parcel identifier within the sheet
    pub parcel_id: String,
    /// Ordnance Survey sheet identifier
    pub sheet_id: String,
    /// Action code
    pub code: String,
    /// Requested quantity, when the user gave one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_for: Option<AppliedFor>,
}

/// Quantity requested for an action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedFor {
    /// Unit of measure, trimmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Parsed quantity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

impl AppliedFor {
    /// Whether neither unit nor quantity is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unit.is_none() && self.quantity.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_not_serialized() {
        let payload = GasPayload {
            sbi: Some(json!("106284736")),
            ..GasPayload::default()
        };
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({ "sbi": "106284736" }));
    }

    #[test]
    fn field_names_are_camel_case() {
        let payload = GasPayload {
            defra_id: Some(json!("abc")),
            has_checked_land_is_up_to_date: Some(json!(true)),
            action_applications: Some(vec![ActionApplication {
                parcel_id: "9238".to_string(),
                sheet_id: "SX0679".to_string(),
                code: "CMOR1".to_string(),
                applied_for: None,
            }]),
            ..GasPayload::default()
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "defraId": "abc",
                "hasCheckedLandIsUpToDate": true,
                "actionApplications": [
                    { "parcelId": "9238", "sheetId": "SX0679", "code": "CMOR1" }
                ]
            })
        );
    }

    #[test]
    fn empty_payload() {
        assert!(GasPayload::default().is_empty());
        assert!(AppliedFor::default().is_empty());
    }
}
