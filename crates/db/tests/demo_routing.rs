use serde_json::json;

use ticketroute_core::config::CursorStore;
use ticketroute_core::domain::evaluation::{NoAssignmentReason, TraceStrategy};
use ticketroute_core::{
    Actor, ContractVersionId, CreateRuleInput, EvaluationContext, EvaluationOutcome,
    RoutingService, TimeWindow,
};
use ticketroute_db::fixtures::{
    DemoDataset, DEMO_BUILDING_ID, DEMO_COMPANY_ID, DEMO_CONTRACT_VERSION_ID, DEMO_LOCATION_ID,
    DEMO_SITE_ID, DEMO_VENDOR, TEAM_NIGHT, TEAM_NORTH, TEAM_SOUTH,
};
use ticketroute_db::{
    connect_with_settings, migrations, sql_routing_ports, sql_strategy_registry, DbPool,
};

async fn seeded_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    DemoDataset::load(&pool).await.expect("seed demo data");
    pool
}

fn service(pool: &DbPool, cursor_store: CursorStore) -> RoutingService {
    RoutingService::new(sql_routing_ports(pool), sql_strategy_registry(pool, cursor_store))
}

fn demo_context(category_id: &str, time_window: TimeWindow) -> EvaluationContext {
    EvaluationContext {
        company_id: DEMO_COMPANY_ID.to_string(),
        site_id: DEMO_SITE_ID.to_string(),
        contract_version_id: ContractVersionId(DEMO_CONTRACT_VERSION_ID.to_string()),
        category_id: category_id.to_string(),
        building_id: Some(DEMO_BUILDING_ID.to_string()),
        location_id: Some(DEMO_LOCATION_ID.to_string()),
        asset_kind: None,
        time_window,
        tags: None,
        priority: None,
    }
}

fn member() -> Actor {
    Actor::new("dispatcher-1", Some(DEMO_COMPANY_ID))
}

fn assignee(outcome: &EvaluationOutcome) -> Option<&str> {
    match outcome {
        EvaluationOutcome::Assigned { assignee_id, .. } => Some(assignee_id.as_str()),
        EvaluationOutcome::NoAssignment { .. } => None,
    }
}

#[tokio::test]
async fn business_hours_hvac_goes_to_least_loaded_team() {
    let pool = seeded_pool().await;

    let result = service(&pool, CursorStore::Memory)
        .evaluate(&member(), &demo_context("cat-hvac", TimeWindow::Business))
        .await
        .expect("evaluate");

    assert_eq!(assignee(&result.outcome), Some(TEAM_SOUTH));
    assert_eq!(result.tiebreaker_trace.len(), 1);
    assert_eq!(result.tiebreaker_trace[0].strategy, TraceStrategy::LeastLoad);
}

#[tokio::test]
async fn after_hours_hvac_runs_default_chain_between_night_team_and_vendor() {
    let pool = seeded_pool().await;

    let result = service(&pool, CursorStore::Memory)
        .evaluate(&member(), &demo_context("cat-hvac", TimeWindow::AfterHours))
        .await
        .expect("evaluate");

    // least_load ties at 0 and sorts by id; nearest then prefers the team over the vendor.
    assert_eq!(assignee(&result.outcome), Some(TEAM_NIGHT));
    let steps: Vec<TraceStrategy> =
        result.tiebreaker_trace.iter().map(|entry| entry.strategy).collect();
    assert_eq!(
        steps,
        vec![
            TraceStrategy::DefaultChain,
            TraceStrategy::LeastLoad,
            TraceStrategy::Nearest,
            TraceStrategy::RoundRobin,
        ]
    );
    let nearest = result.tiebreaker_trace[2].scores.as_ref().expect("nearest scores");
    assert_eq!(nearest[1].candidate_id, DEMO_VENDOR);
}

#[tokio::test]
async fn excluded_category_is_scope_violation() {
    let pool = seeded_pool().await;

    let result = service(&pool, CursorStore::Memory)
        .evaluate(&member(), &demo_context("cat-elevator", TimeWindow::Business))
        .await
        .expect("evaluate");

    assert_eq!(
        result.outcome,
        EvaluationOutcome::NoAssignment { reason: NoAssignmentReason::ScopeViolation }
    );
}

#[tokio::test]
async fn database_cursor_rotates_across_service_instances() {
    let pool = seeded_pool().await;
    let ctx = demo_context("cat-plumbing", TimeWindow::Business);

    let mut winners = Vec::new();
    for _ in 0..3 {
        // A fresh service each time stands in for separate processes.
        let result = service(&pool, CursorStore::Database)
            .evaluate(&member(), &ctx)
            .await
            .expect("evaluate");
        winners.push(assignee(&result.outcome).map(str::to_owned));
    }

    assert_eq!(
        winners,
        vec![
            Some(TEAM_NORTH.to_string()),
            Some(TEAM_SOUTH.to_string()),
            Some(TEAM_NORTH.to_string()),
        ]
    );
}

#[tokio::test]
async fn rules_created_through_service_take_precedence_by_priority() {
    let pool = seeded_pool().await;
    let service = service(&pool, CursorStore::Memory);

    service
        .create_rule(
            &member(),
            CreateRuleInput {
                contract_version_id: ContractVersionId(DEMO_CONTRACT_VERSION_ID.to_string()),
                priority: Some(0),
                condition: json!({ "categoryId": "cat-plumbing" }),
                action: json!({ "assign": { "type": "vendor", "externalVendorId": DEMO_VENDOR } }),
            },
        )
        .await
        .expect("create rule");

    let result = service
        .evaluate(&member(), &demo_context("cat-plumbing", TimeWindow::Business))
        .await
        .expect("evaluate");
    assert_eq!(assignee(&result.outcome), Some(DEMO_VENDOR));
    assert!(result.tiebreaker_trace.is_empty());

    let listed = service
        .list_rules(&member(), &ContractVersionId(DEMO_CONTRACT_VERSION_ID.to_string()))
        .await
        .expect("list");
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0].priority, 0);

    let foreign = service
        .list_rules(
            &Actor::new("intruder", Some("company-other")),
            &ContractVersionId(DEMO_CONTRACT_VERSION_ID.to_string()),
        )
        .await
        .expect("list fails closed");
    assert!(foreign.is_empty());
}
