use grants_state::{
    state_to_gas_payload, update_visited_sections, FormState, VisitedSections,
    MAX_VISITED_SECTIONS,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn section_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{0,3}", 0..700)
}

proptest! {
    #[test]
    fn prop_visited_sections_bounded_and_unique(ids in section_ids()) {
        let sections = ids
            .iter()
            .fold(Vec::new(), |acc, id| update_visited_sections(Some(acc), Some(id)));

        prop_assert!(sections.len() <= MAX_VISITED_SECTIONS);
        let mut sorted = sections.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), sections.len());
        prop_assert!(sections.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn prop_last_new_id_is_kept(ids in section_ids(), extra in "[A-Z]{4}") {
        let mut visited: VisitedSections = ids.into_iter().collect();
        visited.record(&extra);
        prop_assert_eq!(visited.as_slice().last(), Some(&extra));
    }

    #[test]
    fn prop_no_action_applications_without_both_keys(
        include_parcel in any::<bool>(),
        include_actions in any::<bool>(),
        sbi in proptest::option::of("[0-9]{9}"),
    ) {
        prop_assume!(!(include_parcel && include_actions));

        let mut state = FormState::new();
        if include_parcel {
            state.insert("landParcel", json!("SX0679-9238"));
        }
        if include_actions {
            state.insert("actionsObj", json!({ "CMOR1": { "value": "1" } }));
        }
        if let Some(sbi) = sbi {
            state.insert("sbi", Value::String(sbi));
        }

        let value = serde_json::to_value(state_to_gas_payload(&state)).unwrap();
        prop_assert!(value.get("actionApplications").is_none());
    }

    #[test]
    fn prop_one_application_per_action(codes in prop::collection::btree_set("[A-Z]{2,4}[0-9]", 0..20)) {
        let actions: serde_json::Map<String, Value> = codes
            .iter()
            .map(|c| (c.clone(), json!({ "value": "1.5", "unit": "ha" })))
            .collect();

        let mut state = FormState::new();
        state.insert("landParcel", json!("SX0679-9238"));
        state.insert("actionsObj", Value::Object(actions));

        let applications = state_to_gas_payload(&state).action_applications.unwrap();
        prop_assert_eq!(applications.len(), codes.len());
        prop_assert!(applications.iter().all(|a| a.sheet_id == "SX0679" && a.parcel_id == "9238"));
    }
}
