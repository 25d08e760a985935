//! Journey state to GAS payload mapping
//!
//! Pure and deterministic. Only keys present and non-null in the state reach
//! the payload; nothing is defaulted.

use crate::payload::{ActionApplication, AppliedFor, GasPayload};
use crate::state::{keys, FormState};
use serde_json::{Map, Value};

/// Map accumulated journey answers to the GAS submission payload
///
/// `actionApplications` is only produced when both `landParcel` and
/// `actionsObj` are present; otherwise the key is absent from the payload.
#[must_use]
pub fn state_to_gas_payload(state: &FormState) -> GasPayload {
    let copy = |key: &str| state.get_present(key).cloned();

    let action_applications = match (
        state.get_present(keys::LAND_PARCEL).and_then(Value::as_str),
        state.get_present(keys::ACTIONS_OBJ).and_then(Value::as_object),
    ) {
        (Some(land_parcel), Some(actions)) => Some(map_actions(land_parcel, actions)),
        _ => None,
    };

    GasPayload {
        sbi: copy(keys::SBI),
        frn: copy(keys::FRN),
        crn: copy(keys::CRN),
        defra_id: copy(keys::DEFRA_ID),
        scheme: copy(keys::SCHEME),
        year: copy(keys::YEAR),
        has_checked_land_is_up_to_date: copy(keys::HAS_CHECKED_LAND_IS_UP_TO_DATE),
        action_applications,
    }
}

fn map_actions(land_parcel: &str, actions: &Map<String, Value>) -> Vec<ActionApplication> {
    let (sheet_id, parcel_id) = split_land_parcel(land_parcel);

    actions
        .iter()
        .map(|(code, data)| ActionApplication {
            parcel_id: parcel_id.to_string(),
            sheet_id: sheet_id.to_string(),
            code: code.clone(),
            applied_for: applied_for(data),
        })
        .collect()
}

fn applied_for(data: &Value) -> Option<AppliedFor> {
    let unit = data
        .get("unit")
        .and_then(Value::as_str)
        .map(|u| u.trim().to_string());
    let quantity = data.get("value").and_then(parse_quantity);

    let applied = AppliedFor { unit, quantity };
    (!applied.is_empty()).then_some(applied)
}

/// Split a `"sheetId-parcelId"` key into its two identifiers
///
/// Segments past the second are ignored; a key without a separator yields an
/// empty parcel id.
#[must_use]
pub fn split_land_parcel(land_parcel: &str) -> (&str, &str) {
    let mut parts = land_parcel.split('-');
    let sheet_id = parts.next().unwrap_or_default();
    let parcel_id = parts.next().unwrap_or_default();
    (sheet_id, parcel_id)
}

/// Parse an action quantity
///
/// Numbers are taken as-is; strings are trimmed and parsed. Anything else,
/// or a non-finite result, yields `None`.
#[must_use]
pub fn parse_quantity(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|q| q.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state(value: Value) -> FormState {
        FormState::from_value(value).unwrap()
    }

    #[test]
    fn maps_single_action_with_trimmed_unit() {
        let payload = state_to_gas_payload(&state(json!({
            "landParcel": "1-2",
            "actionsObj": { "CODE1": { "value": "10.5", "unit": " ha " } }
        })));

        assert_eq!(
            payload.action_applications,
            Some(vec![ActionApplication {
                code: "CODE1".to_string(),
                sheet_id: "1".to_string(),
                parcel_id: "2".to_string(),
                applied_for: Some(AppliedFor {
                    unit: Some("ha".to_string()),
                    quantity: Some(10.5),
                }),
            }])
        );
    }

    #[test]
    fn unparseable_value_leaves_quantity_absent() {
        let payload = state_to_gas_payload(&state(json!({
            "landParcel": "SX0679-9238",
            "actionsObj": { "CMOR1": { "value": "abc", "unit": "ha" } }
        })));

        let applied = payload.action_applications.unwrap()[0].applied_for.clone();
        assert_eq!(
            applied,
            Some(AppliedFor {
                unit: Some("ha".to_string()),
                quantity: None,
            })
        );
    }

    #[test]
    fn applied_for_omitted_when_empty() {
        let payload = state_to_gas_payload(&state(json!({
            "landParcel": "SX0679-9238",
            "actionsObj": {
                "CMOR1": { "value": "abc" },
                "UPL1": {},
                "UPL2": { "value": null, "unit": null }
            }
        })));

        let applications = payload.action_applications.unwrap();
        assert_eq!(applications.len(), 3);
        assert!(applications.iter().all(|a| a.applied_for.is_none()));
    }

    #[test]
    fn numeric_values_are_accepted() {
        let payload = state_to_gas_payload(&state(json!({
            "landParcel": "SX0679-9238",
            "actionsObj": { "CMOR1": { "value": 3 } }
        })));

        let applied = payload.action_applications.unwrap()[0]
            .applied_for
            .clone()
            .unwrap();
        assert_eq!(applied.quantity, Some(3.0));
        assert_eq!(applied.unit, None);
    }

    #[test]
    fn actions_keep_insertion_order() {
        let payload = state_to_gas_payload(&state(json!({
            "landParcel": "SX0679-9238",
            "actionsObj": { "UPL3": {}, "CMOR1": {}, "AB1": {} }
        })));

        let codes: Vec<String> = payload
            .action_applications
            .unwrap()
            .into_iter()
            .map(|a| a.code)
            .collect();
        assert_eq!(codes, vec!["UPL3", "CMOR1", "AB1"]);
    }

    #[test]
    fn no_action_applications_without_parcel_or_actions() {
        let only_parcel = state_to_gas_payload(&state(json!({ "landParcel": "1-2" })));
        assert_eq!(only_parcel.action_applications, None);

        let only_actions =
            state_to_gas_payload(&state(json!({ "actionsObj": { "CMOR1": {} } })));
        assert_eq!(only_actions.action_applications, None);

        let null_parcel = state_to_gas_payload(&state(json!({
            "landParcel": null,
            "actionsObj": { "CMOR1": {} }
        })));
        assert!(!serde_json::to_value(null_parcel)
            .unwrap()
            .as_object()
            .unwrap()
            .contains_key("actionApplications"));
    }

    #[test]
    fn copies_only_present_scalars() {
        let payload = state_to_gas_payload(&state(json!({
            "sbi": "106284736",
            "crn": null,
            "scheme": "SFI",
            "year": 2025,
            "hasCheckedLandIsUpToDate": false,
            "unrelated": "ignored"
        })));

        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({
                "sbi": "106284736",
                "scheme": "SFI",
                "year": 2025,
                "hasCheckedLandIsUpToDate": false
            })
        );
    }

    #[test]
    fn split_land_parcel_edge_cases() {
        assert_eq!(split_land_parcel("SX0679-9238"), ("SX0679", "9238"));
        assert_eq!(split_land_parcel("SX0679"), ("SX0679", ""));
        assert_eq!(split_land_parcel("a-b-c"), ("a", "b"));
    }

    #[test]
    fn parse_quantity_rejects_non_finite() {
        assert_eq!(parse_quantity(&json!(" 2.25 ")), Some(2.25));
        assert_eq!(parse_quantity(&json!("NaN")), None);
        assert_eq!(parse_quantity(&json!("inf")), None);
        assert_eq!(parse_quantity(&json!(true)), None);
    }
}
