//! Integration tests for the purchase saga.

use std::sync::Arc;
use std::time::Duration;

use remote::testing::{FaultInjectingCaller, ScriptedCaller};
use remote::{HttpRemoteCaller, Method, RemoteCaller, RemoteOutcome, RetryPolicy};
use saga::{
    Endpoints, SagaContext, SagaCoordinator, SagaError, SagaState, StepError, purchase_steps,
    stock_preflight,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYMENTS: &str = "http://pay/payments";
const PURCHASES: &str = "http://buy/purchases";
const STOCK: &str = "http://stock/stocks";
const CATALOG: &str = "http://catalog/products";

fn endpoints() -> Endpoints {
    Endpoints {
        payments: PAYMENTS.to_string(),
        purchases: PURCHASES.to_string(),
        stock: STOCK.to_string(),
        catalog: CATALOG.to_string(),
    }
}

fn context() -> SagaContext {
    SagaContext::from_value(json!({
        "payment": {"product_id": 3, "price": 1500, "payment_method": "card"},
        "purchase": {"product_id": 3, "address": "Main St 1"},
        "stock": {"product_id": 3, "quantity": 2, "in_out": "out"}
    }))
    .unwrap()
}

fn created(id: u64) -> RemoteOutcome {
    RemoteOutcome::Success(json!({"message": "Created", "data": {"id": id}}))
}

/// Every collaborator succeeds, including compensations.
fn happy_caller() -> ScriptedCaller {
    let caller = ScriptedCaller::new();
    caller
        .always(Method::POST, PAYMENTS, created(11))
        .always(Method::POST, PURCHASES, created(22))
        .always(
            Method::POST,
            "http://stock/stocks/reserve",
            RemoteOutcome::Success(json!({"data": {"product_id": 3, "quantity": 8}})),
        )
        .always(
            Method::POST,
            "http://pay/payments/11/compensation",
            RemoteOutcome::Success(json!({})),
        )
        .always(
            Method::DELETE,
            "http://buy/purchases/22",
            RemoteOutcome::Success(json!({})),
        )
        .always(
            Method::POST,
            "http://stock/stocks/restore",
            RemoteOutcome::Success(json!({})),
        );
    caller
}

async fn run_with(caller: Arc<dyn RemoteCaller>) -> saga::SagaRun {
    let steps = purchase_steps(&endpoints(), caller);
    SagaCoordinator::new()
        .run(&context(), &steps, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_happy_path() {
    let caller = happy_caller();
    let run = run_with(Arc::new(caller.clone())).await;

    assert_eq!(run.state(), SagaState::Succeeded);
    let result = run.result();
    assert_eq!(result.status_code, 201);
    assert_eq!(result.message, "OK");
    assert_eq!(result.data["resource_ids"], json!(["11", "22", "3"]));
    assert_eq!(caller.calls().len(), 3);
}

#[tokio::test]
async fn test_purchase_failure_reverses_payment() {
    let caller = happy_caller();
    caller.on(Method::POST, PURCHASES, RemoteOutcome::Conflict);

    let run = run_with(Arc::new(caller.clone())).await;

    assert_eq!(run.state(), SagaState::Compensated);
    assert_eq!(run.result().status_code, 500);
    assert_eq!(run.result().message, "Error during saga execution");
    assert!(
        run.result().data["error"]
            .as_str()
            .unwrap()
            .contains("create_purchase")
    );
    assert_eq!(
        caller.call_count(Method::POST, "http://pay/payments/11/compensation"),
        1
    );
    assert_eq!(caller.call_count(Method::POST, "http://stock/stocks/reserve"), 0);
}

#[tokio::test]
async fn test_stock_failure_compensates_in_reverse_order() {
    let caller = happy_caller();
    caller.on(
        Method::POST,
        "http://stock/stocks/reserve",
        RemoteOutcome::Conflict,
    );

    let run = run_with(Arc::new(caller.clone())).await;

    assert_eq!(run.state(), SagaState::Compensated);
    let urls: Vec<String> = caller.calls().into_iter().map(|c| c.url).collect();
    assert_eq!(
        urls,
        vec![
            PAYMENTS.to_string(),
            PURCHASES.to_string(),
            "http://stock/stocks/reserve".to_string(),
            "http://buy/purchases/22".to_string(),
            "http://pay/payments/11/compensation".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_compensation_failure_continues_and_reports() {
    let caller = happy_caller();
    caller
        .on(
            Method::POST,
            "http://stock/stocks/reserve",
            RemoteOutcome::ServerFailure { status: 503 },
        )
        .on(
            Method::DELETE,
            "http://buy/purchases/22",
            RemoteOutcome::ServerFailure { status: 500 },
        );

    let run = run_with(Arc::new(caller.clone())).await;

    assert_eq!(run.state(), SagaState::CompensationFailed);
    assert_eq!(run.result().status_code, 500);
    assert_eq!(run.compensations().len(), 2);
    assert!(!run.compensations()[0].succeeded());
    assert!(run.compensations()[1].succeeded());
    assert_eq!(
        caller.call_count(Method::POST, "http://pay/payments/11/compensation"),
        1
    );
}

#[tokio::test]
async fn test_already_deleted_resource_counts_as_compensated() {
    let caller = happy_caller();
    caller
        .on(
            Method::POST,
            "http://stock/stocks/reserve",
            RemoteOutcome::Conflict,
        )
        .on(Method::DELETE, "http://buy/purchases/22", RemoteOutcome::NotFound);

    let run = run_with(Arc::new(caller)).await;

    assert_eq!(run.state(), SagaState::Compensated);
}

#[tokio::test]
async fn test_missing_domain_fails_before_any_side_effect() {
    let caller = happy_caller();
    let steps = purchase_steps(&endpoints(), Arc::new(caller.clone()));
    let context = SagaContext::from_value(json!({"purchase": {}, "stock": {}})).unwrap();

    let run = SagaCoordinator::new()
        .run(&context, &steps, &CancellationToken::new())
        .await;

    assert!(matches!(
        run.failure(),
        Some(SagaError::StepFailed {
            source: StepError::MissingDomain(_),
            ..
        })
    ));
    assert!(caller.calls().is_empty());
}

#[tokio::test]
async fn test_preflight_rejects_without_side_effects() {
    let caller = happy_caller();
    caller.on(
        Method::GET,
        "http://catalog/products/3",
        RemoteOutcome::Success(json!({"data": {"id": 3, "stock": 1}})),
    );
    let caller: Arc<dyn RemoteCaller> = Arc::new(caller);
    let steps = purchase_steps(&endpoints(), caller.clone());
    let coordinator =
        SagaCoordinator::new().with_preflight(Arc::new(stock_preflight(&endpoints(), caller)));

    let run = coordinator
        .run(&context(), &steps, &CancellationToken::new())
        .await;

    assert_eq!(run.state(), SagaState::Rejected);
    assert_eq!(run.result().status_code, 409);
    assert_eq!(run.completed_steps(), 0);
}

/// With randomly failing collaborators, every step that completed with an
/// identifier is compensated exactly once, in reverse order, and nothing
/// else is.
#[tokio::test]
async fn test_random_failures_compensate_exactly_the_completed_steps() {
    for _ in 0..200 {
        let inner = happy_caller();
        let caller = FaultInjectingCaller::new(
            inner.clone(),
            0.3,
            RemoteOutcome::ServerFailure { status: 500 },
        );

        let run = run_with(Arc::new(caller)).await;

        let completed = run.completed_steps();
        match run.state() {
            SagaState::Succeeded => assert_eq!(completed, 3),
            SagaState::Compensated | SagaState::CompensationFailed => {
                assert!(completed < 3);
                let indices: Vec<usize> = run.compensations().iter().map(|c| c.index).collect();
                let expected: Vec<usize> = (0..completed).rev().collect();
                assert_eq!(indices, expected);
                assert_eq!(run.result().status_code, 500);
            }
            other => panic!("unexpected terminal state {other}"),
        }
        assert!(run.state().is_terminal());
    }
}

#[tokio::test]
async fn test_end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 5}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/purchases"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 6}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/stocks/reserve"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "Insufficient stock"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/purchases/6"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/5/compensation"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let endpoints = Endpoints {
        payments: format!("{}/payments", server.uri()),
        purchases: format!("{}/purchases", server.uri()),
        stock: format!("{}/stocks", server.uri()),
        catalog: format!("{}/products", server.uri()),
    };
    let caller = HttpRemoteCaller::new(
        RetryPolicy::default()
            .with_delay(Duration::from_millis(10))
            .with_timeout(Duration::from_millis(500)),
    )
    .unwrap();
    let steps = purchase_steps(&endpoints, Arc::new(caller));

    let run = SagaCoordinator::new()
        .run(&context(), &steps, &CancellationToken::new())
        .await;

    assert_eq!(run.state(), SagaState::Compensated);
    assert_eq!(run.result().status_code, 500);
}

#[tokio::test]
async fn test_cancellation_mid_step_still_compensates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 5}})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/purchases"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/5/compensation"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let endpoints = Endpoints {
        payments: format!("{}/payments", server.uri()),
        purchases: format!("{}/purchases", server.uri()),
        stock: format!("{}/stocks", server.uri()),
        catalog: format!("{}/products", server.uri()),
    };
    let caller = HttpRemoteCaller::new(RetryPolicy::default()).unwrap();
    let steps = purchase_steps(&endpoints, Arc::new(caller));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let run = SagaCoordinator::new()
        .run(&context(), &steps, &cancel)
        .await;

    assert_eq!(run.state(), SagaState::Compensated);
    assert!(matches!(
        run.failure(),
        Some(SagaError::StepFailed {
            source: StepError::Cancelled,
            ..
        })
    ));
}

#[tokio::test]
async fn test_deadline_bounds_the_forward_phase() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"data": {"id": 5}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let endpoints = Endpoints {
        payments: format!("{}/payments", server.uri()),
        purchases: format!("{}/purchases", server.uri()),
        stock: format!("{}/stocks", server.uri()),
        catalog: format!("{}/products", server.uri()),
    };
    let steps = purchase_steps(
        &endpoints,
        Arc::new(HttpRemoteCaller::new(RetryPolicy::default()).unwrap()),
    );

    let run = SagaCoordinator::new()
        .with_deadline(Duration::from_millis(200))
        .run(&context(), &steps, &CancellationToken::new())
        .await;

    assert!(matches!(
        run.failure(),
        Some(SagaError::StepFailed {
            source: StepError::DeadlineExceeded,
            ..
        })
    ));
    assert_eq!(run.completed_steps(), 0);
}
