use grants_forms::{FormDefinition, FormRegistry, FormsEngine, PageResponse, PageServices};
use grants_services::{
    AppError, ErrorKind, Identity, MockGrantApplicationService, MockLandGrantsApi, ParcelAction,
    ParcelDetails, Session, SessionId, SubmissionReceipt,
};
use grants_test_utils::{INFO_FORM_YAML, LAND_GRANTS_FORM_YAML};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn registry() -> FormRegistry {
    let mut registry = FormRegistry::new();
    registry
        .register(FormDefinition::from_yaml(LAND_GRANTS_FORM_YAML).unwrap())
        .unwrap();
    registry
        .register(FormDefinition::from_yaml(INFO_FORM_YAML).unwrap())
        .unwrap();
    registry
}

fn engine(gas: MockGrantApplicationService, land_grants: MockLandGrantsApi) -> FormsEngine {
    FormsEngine::new(
        registry(),
        PageServices {
            gas: Arc::new(gas),
            land_grants: Arc::new(land_grants),
        },
    )
}

fn session() -> Session {
    Session::new(
        SessionId::new(),
        Identity {
            sbi: Some("106284736".to_string()),
            crn: Some("1100014934".to_string()),
            ..Identity::default()
        },
    )
}

fn posted(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn parcel() -> ParcelDetails {
    ParcelDetails {
        parcel_id: "9238".to_string(),
        sheet_id: "SX0679".to_string(),
        size: None,
        actions: vec![ParcelAction {
            code: "CMOR1".to_string(),
            description: "Assess moorland".to_string(),
            available_area: None,
        }],
    }
}

fn redirect(response: &PageResponse) -> &str {
    response.location().expect("expected a redirect")
}

async fn answer_land_questions(engine: &FormsEngine, session: &mut Session) {
    let slug = "farm-payments";
    let response = engine
        .post(session, slug, "check-land-details", &posted(&[("hasCheckedLandIsUpToDate", "yes")]))
        .await
        .unwrap();
    assert_eq!(redirect(&response), "/farm-payments/select-land-parcel");

    let response = engine
        .post(session, slug, "select-land-parcel", &posted(&[("landParcel", "SX0679-9238")]))
        .await
        .unwrap();
    assert_eq!(redirect(&response), "/farm-payments/select-actions");

    let response = engine
        .post(
            session,
            slug,
            "select-actions",
            &posted(&[
                ("actionsObj", "CMOR1"),
                ("actionsObj.CMOR1.value", "4.53"),
                ("actionsObj.CMOR1.unit", "ha"),
                ("actionsObj", "UPL1"),
                ("actionsObj.UPL1.value", "2"),
                ("actionsObj.UPL1.unit", "ha"),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(redirect(&response), "/farm-payments/check-answers");
}

#[tokio::test]
async fn full_land_journey_submits_once() {
    let mut gas = MockGrantApplicationService::new();
    gas.expect_submit()
        .withf(|payload| {
            let value = serde_json::to_value(payload).unwrap();
            value["sbi"] == json!("106284736")
                && value["scheme"] == json!("SFI")
                && value["year"] == json!(2025)
                && value["hasCheckedLandIsUpToDate"] == json!(true)
                && value["actionApplications"][1]
                    == json!({
                        "parcelId": "9238",
                        "sheetId": "SX0679",
                        "code": "UPL1",
                        "appliedFor": { "unit": "ha", "quantity": 2.0 }
                    })
        })
        .times(1)
        .returning(|_| {
            Ok(SubmissionReceipt {
                reference: "ABC-DEF-123".to_string(),
                status: 200,
                response: None,
            })
        });
    let engine = engine(gas, MockLandGrantsApi::new());
    let mut session = session();

    assert_eq!(engine.start_path("farm-payments").unwrap(), "/farm-payments/start");
    answer_land_questions(&engine, &mut session).await;

    let journey = session.journey("farm-payments").unwrap();
    assert_eq!(
        journey.visited_sections.as_slice(),
        ["land-details", "land-parcel", "actions"]
    );

    let response = engine
        .post(&mut session, "farm-payments", "check-answers", &[])
        .await
        .unwrap();
    assert_eq!(redirect(&response), "/farm-payments/confirmation");

    let journey = session.journey("farm-payments").unwrap();
    assert!(journey.is_submitted());
    assert!(journey.answers.is_empty());

    match engine
        .get(&mut session, "farm-payments", "confirmation")
        .await
        .unwrap()
    {
        PageResponse::Render { status, view } => {
            assert_eq!(status, 200);
            assert_eq!(view.view, "confirmation-page");
            assert_eq!(view.model["reference"], json!("ABC-DEF-123"));
            assert_eq!(view.back_link, None);
        }
        other => panic!("expected render, got {other:?}"),
    }

    let response = engine
        .get(&mut session, "farm-payments", "select-actions")
        .await
        .unwrap();
    assert_eq!(redirect(&response), "/farm-payments/confirmation");
}

#[tokio::test]
async fn journey_is_seeded_with_identity_and_metadata() {
    let engine = engine(MockGrantApplicationService::new(), MockLandGrantsApi::new());
    let mut session = session();

    engine.get(&mut session, "farm-payments", "start").await.unwrap();

    let answers = &session.journey("farm-payments").unwrap().answers;
    assert_eq!(answers.get_str("sbi"), Some("106284736"));
    assert_eq!(answers.get_str("crn"), Some("1100014934"));
    assert_eq!(answers.get_str("scheme"), Some("SFI"));
    assert_eq!(answers.get("year"), Some(&json!(2025)));
}

#[tokio::test]
async fn question_page_loads_selected_parcel() {
    let mut land_grants = MockLandGrantsApi::new();
    land_grants
        .expect_fetch_parcel()
        .withf(|sheet_id, parcel_id| sheet_id == "SX0679" && parcel_id == "9238")
        .times(1)
        .returning(|_, _| Ok(parcel()));
    let engine = engine(MockGrantApplicationService::new(), land_grants);
    let mut session = session();
    session
        .journey_mut("farm-payments")
        .answers
        .insert("landParcel", json!("SX0679-9238"));

    match engine
        .get(&mut session, "farm-payments", "select-actions")
        .await
        .unwrap()
    {
        PageResponse::Render { view, .. } => {
            assert_eq!(view.model["parcel"]["sheetId"], json!("SX0679"));
            assert_eq!(view.model["parcel"]["actions"][0]["code"], json!("CMOR1"));
            assert_eq!(view.back_link.as_deref(), Some("/farm-payments/select-land-parcel"));
        }
        other => panic!("expected render, got {other:?}"),
    }
}

#[tokio::test]
async fn parcel_lookup_failure_propagates() {
    let mut land_grants = MockLandGrantsApi::new();
    land_grants
        .expect_fetch_parcel()
        .returning(|_, _| Err(AppError::backend("BACKEND_ERROR_STATUS", "land grants unavailable")));
    let engine = engine(MockGrantApplicationService::new(), land_grants);
    let mut session = session();
    session
        .journey_mut("farm-payments")
        .answers
        .insert("landParcel", json!("SX0679-9238"));

    let err = engine
        .get(&mut session, "farm-payments", "select-actions")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn invalid_answers_render_errors() {
    let engine = engine(MockGrantApplicationService::new(), MockLandGrantsApi::new());
    let mut session = session();

    match engine
        .post(&mut session, "farm-payments", "check-land-details", &posted(&[("hasCheckedLandIsUpToDate", "maybe")]))
        .await
        .unwrap()
    {
        PageResponse::Render { status, view } => {
            assert_eq!(status, 400);
            assert_eq!(view.errors[0].field, "hasCheckedLandIsUpToDate");
        }
        other => panic!("expected render, got {other:?}"),
    }
    assert!(session
        .journey("farm-payments")
        .unwrap()
        .visited_sections
        .is_empty());
}

#[tokio::test]
async fn summary_sends_back_to_unanswered_page() {
    let mut gas = MockGrantApplicationService::new();
    gas.expect_submit().never();
    let engine = engine(gas, MockLandGrantsApi::new());
    let mut session = session();

    engine
        .post(&mut session, "farm-payments", "check-land-details", &posted(&[("hasCheckedLandIsUpToDate", "no")]))
        .await
        .unwrap();
    let response = engine
        .post(&mut session, "farm-payments", "check-answers", &[])
        .await
        .unwrap();

    assert_eq!(redirect(&response), "/farm-payments/select-land-parcel");
}

#[tokio::test]
async fn failed_submission_keeps_answers() {
    let mut gas = MockGrantApplicationService::new();
    gas.expect_submit()
        .returning(|_| Err(AppError::backend("BACKEND_ERROR_STATUS", "gas unavailable")));
    let engine = engine(gas, MockLandGrantsApi::new());
    let mut session = session();
    answer_land_questions(&engine, &mut session).await;

    let err = engine
        .post(&mut session, "farm-payments", "check-answers", &[])
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 502);
    let journey = session.journey("farm-payments").unwrap();
    assert!(!journey.is_submitted());
    assert_eq!(journey.answers.get_str("landParcel"), Some("SX0679-9238"));
}

#[tokio::test]
async fn summary_view_includes_mapped_payload() {
    let engine = engine(MockGrantApplicationService::new(), MockLandGrantsApi::new());
    let mut session = session();
    answer_land_questions(&engine, &mut session).await;

    match engine
        .get(&mut session, "farm-payments", "check-answers")
        .await
        .unwrap()
    {
        PageResponse::Render { view, .. } => {
            assert_eq!(view.view, "check-answers-page");
            assert_eq!(
                view.model["payload"]["actionApplications"][0]["code"],
                json!("CMOR1")
            );
            assert_eq!(view.model["rows"][1]["changeLink"], json!("/farm-payments/select-land-parcel"));
        }
        other => panic!("expected render, got {other:?}"),
    }
}

#[tokio::test]
async fn status_page_before_submission_redirects_to_start() {
    let engine = engine(MockGrantApplicationService::new(), MockLandGrantsApi::new());
    let mut session = session();

    let response = engine
        .get(&mut session, "farm-payments", "confirmation")
        .await
        .unwrap();

    assert_eq!(redirect(&response), "/farm-payments/start");
}

#[tokio::test]
async fn status_page_rejects_post() {
    let engine = engine(MockGrantApplicationService::new(), MockLandGrantsApi::new());
    let mut session = session();

    let err = engine
        .post(&mut session, "farm-payments", "confirmation", &[])
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 405);
}

#[tokio::test]
async fn generic_page_follows_explicit_next() {
    let engine = engine(MockGrantApplicationService::new(), MockLandGrantsApi::new());
    let mut session = session();

    let response = engine
        .post(&mut session, "eligibility", "start", &[])
        .await
        .unwrap();

    assert_eq!(redirect(&response), "/eligibility/farm-size");
}

#[tokio::test]
async fn unknown_form_and_page_are_not_found() {
    let engine = engine(MockGrantApplicationService::new(), MockLandGrantsApi::new());
    let mut session = session();

    let err = engine.get(&mut session, "nope", "start").await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert!(engine.start_path("nope").is_err());

    let err = engine
        .get(&mut session, "farm-payments", "nope")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.context().get("page"), Some(&json!("nope")));
}
