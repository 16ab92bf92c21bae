// ==========================================
// 阶段数据装载集成测试（后端模式）
// ==========================================
// 测试目标: 过期结果丢弃、读取失败不改存储、裸数组包装、保存与重算
// ==========================================

mod test_helpers;

use serde_json::json;
use std::sync::Arc;

use xml_planning_editor::api::{
    fetch_capacity_sum_up, fetch_forecast, fetch_warehouse_stock, import_document, ApiRoutes,
    FetchError, HydrationOutcome, PlanningBackend, StageHydrator,
};
use xml_planning_editor::app::AppState;
use xml_planning_editor::config::{ConfigManager, WorkflowConfig};
use xml_planning_editor::domain::{HydrationMode, StageKey, StagePayload};
use xml_planning_editor::engine::WorkflowStore;
use xml_planning_editor::importer::PlanningDocument;
use xml_planning_editor::{logging, Forecast};
use test_helpers::{program_payload, MockBackend, SAMPLE_RESULTS_XML};

fn program_json(sales: &str) -> serde_json::Value {
    json!([{ "id": "P1", "name": "P1", "periods": { "5": { "sales": sales, "production": sales } } }])
}

fn backend_hydrator(store: Arc<WorkflowStore>, backend: Arc<MockBackend>) -> StageHydrator {
    logging::init_test();
    StageHydrator::with_backend(store, backend, Forecast::default(), 5)
}

fn backend_state(backend: Arc<MockBackend>) -> AppState {
    let config = ConfigManager::in_memory().unwrap();
    let workflow_config = WorkflowConfig {
        hydration_mode: HydrationMode::Backend,
        ..WorkflowConfig::default()
    };
    let backend: Arc<dyn PlanningBackend> = backend;
    AppState::with_parts(config, workflow_config, Some(backend)).unwrap()
}

#[tokio::test]
async fn test_bare_array_program_is_wrapped() {
    let store = WorkflowStore::shared();
    let backend = MockBackend::new();
    backend.respond(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM, program_json("200"));

    let hydrator = backend_hydrator(store.clone(), backend);
    let outcome = hydrator.hydrate(StageKey::ProductionProgram).await.unwrap();

    assert_eq!(outcome, HydrationOutcome::Applied);
    assert_eq!(
        store.get(StageKey::ProductionProgram),
        Some(program_payload("200", "200"))
    );
}

#[tokio::test]
async fn test_fetch_error_leaves_prior_payload() {
    let store = WorkflowStore::shared();
    store.set(StageKey::ProductionProgram, program_payload("1", "1"));
    let backend = MockBackend::new();
    backend.fail(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM, 500);

    let hydrator = backend_hydrator(store.clone(), backend);
    let err = hydrator.hydrate(StageKey::ProductionProgram).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert_eq!(
        store.get(StageKey::ProductionProgram),
        Some(program_payload("1", "1"))
    );
}

#[tokio::test]
async fn test_malformed_response_is_decode_error() {
    let store = WorkflowStore::shared();
    let backend = MockBackend::new();
    backend.respond(ApiRoutes::PRODUCTION_ORDERS, json!({ "orders": [{ "id": 1 }] }));

    let hydrator = backend_hydrator(store.clone(), backend);
    let err = hydrator.hydrate(StageKey::ProductionPlanning).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }));
    assert!(!store.contains(StageKey::ProductionPlanning));
}

#[tokio::test]
async fn test_navigation_during_fetch_discards_result() {
    let store = WorkflowStore::shared();
    let backend = MockBackend::new();
    backend.respond(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM, program_json("200"));
    let gate = backend.gate(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM);

    let hydrator = backend_hydrator(store.clone(), backend);
    let navigate = async {
        gate.entered.notified().await;
        store.set_step(1);
        gate.release.notify_one();
    };

    let (outcome, ()) = tokio::join!(hydrator.hydrate(StageKey::ProductionProgram), navigate);

    assert_eq!(outcome.unwrap(), HydrationOutcome::Discarded);
    assert!(!store.contains(StageKey::ProductionProgram));
}

#[tokio::test]
async fn test_newer_fetch_wins_over_older_fetch() {
    let store = WorkflowStore::shared();
    let backend = MockBackend::new();
    backend.respond(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM, program_json("100"));
    let gate = backend.gate(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM);

    let hydrator = backend_hydrator(store.clone(), backend.clone());
    let newer = async {
        gate.entered.notified().await;
        backend.respond(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM, program_json("300"));
        let outcome = hydrator.hydrate(StageKey::ProductionProgram).await;
        gate.release.notify_one();
        outcome
    };

    let (older, newer) = tokio::join!(hydrator.hydrate(StageKey::ProductionProgram), newer);

    assert_eq!(newer.unwrap(), HydrationOutcome::Applied);
    assert_eq!(older.unwrap(), HydrationOutcome::Discarded);
    assert_eq!(
        store.get(StageKey::ProductionProgram),
        Some(program_payload("300", "300"))
    );
    assert_eq!(backend.get_count(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM), 2);
}

#[tokio::test]
async fn test_app_state_turns_fetch_errors_into_notices() {
    let backend = MockBackend::new();
    backend.fail(ApiRoutes::MATERIAL_PLAN, 503);
    let state = backend_state(backend);

    assert_eq!(state.hydrate_stage(StageKey::MaterialPlanning).await, None);
    let notices = state.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].stage, Some(StageKey::MaterialPlanning));
    assert!(notices[0].message.contains("/material_plan"));

    // 提示不影响工作流
    assert_eq!(state.engine.step(), 0);
    assert!(state.engine.last_error().is_none());

    assert!(state.dismiss_notice(notices[0].id));
    assert!(state.notices().is_empty());
}

#[tokio::test]
async fn test_hydrate_all_reports_per_stage() {
    let backend = MockBackend::new();
    backend.respond(ApiRoutes::SALE_AND_PRODUCTION_PROGRAM, program_json("200"));
    backend.respond(ApiRoutes::MATERIAL_PLAN, json!({ "items": [] }));
    backend.respond(ApiRoutes::CAPACITY_PLAN, json!({}));
    backend.respond(ApiRoutes::PROCUREMENT_PLANNING, json!({ "items": null }));
    backend.respond(ApiRoutes::PRODUCTION_ORDERS, json!({ "orders": [] }));
    let state = backend_state(backend);

    let results = state.hydrate_all().await;

    assert_eq!(results.len(), 6);
    let failed: Vec<_> = results
        .iter()
        .filter(|(_, outcome)| outcome.is_none())
        .map(|(stage, _)| *stage)
        .collect();
    assert_eq!(failed, vec![StageKey::Results]);
    assert_eq!(state.notices().len(), 1);
    assert!(state.store.contains(StageKey::CapacityPlanning));
}

#[tokio::test]
async fn test_save_and_refresh_results() {
    let backend = MockBackend::new();
    backend.respond(
        ApiRoutes::RESULTS,
        json!({
            "productionProgram": [{ "id": "1", "article": "P1", "pn": 200, "pnplusOne": 0, "pnplusTwo": 0, "pnplusThree": 0 }],
            "orders": [],
            "productionPlanning": [],
            "capacityPlanning": []
        }),
    );
    let state = backend_state(backend.clone());
    state.store.set(StageKey::ProductionProgram, program_payload("200", "200"));

    assert!(state.save_current_stage().await);
    let posted = backend.posted();
    assert_eq!(posted[0].0, "/sale_and_production_program");
    assert_eq!(posted[0].1["products"][0]["id"], "P1");

    assert_eq!(state.refresh_results().await, Some(HydrationOutcome::Applied));
    let posted = backend.posted();
    assert_eq!(posted.len(), 2);
    assert_eq!(posted[1].0, "/results/refresh");
    assert!(matches!(
        state.store.get(StageKey::Results),
        Some(StagePayload::Results(_))
    ));
}

#[tokio::test]
async fn test_document_upload_and_reference_data() {
    let backend = MockBackend::new();
    backend.respond(
        ApiRoutes::WAREHOUSE_STOCK,
        json!({
            "articles": [{ "id": "1", "amount": "80", "startAmount": "100", "pct": "80.0", "price": "156.13", "stockValue": "12490.40" }],
            "totalStockValue": "12490.40"
        }),
    );
    backend.respond(ApiRoutes::CAPACITY_PLAN_SUM_UP, json!({ "total": 5280 }));

    let stock = fetch_warehouse_stock(backend.as_ref()).await.unwrap();
    assert_eq!(stock.amount_of("1"), Some("80"));
    assert_eq!(
        fetch_capacity_sum_up(backend.as_ref()).await.unwrap()["total"],
        5280
    );
    assert!(matches!(
        fetch_forecast(backend.as_ref()).await,
        Err(FetchError::Status { status: 404, .. })
    ));

    let document = PlanningDocument::parse(SAMPLE_RESULTS_XML).unwrap();
    import_document(backend.as_ref(), &document).await.unwrap();
    let posted = backend.posted();
    assert_eq!(posted[0].0, "/import");
    assert_eq!(posted[0].1["name"], "results");
}
