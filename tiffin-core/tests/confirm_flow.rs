//! End-to-end tests of the reconciliation flow against an in-process stub
//! gateway and an in-memory SQLite pool.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use kanau::processor::Processor;
use tiffin_core::checkout::{CheckoutError, Coordinator, OrderDraft, UserContext};
use tiffin_core::entities::order_records::{GetOrderById, OrderItem};
use tiffin_core::entities::payment_records::GetPaymentByMerchantTransactionId;
use tiffin_core::entities::{OrderStatus, PaymentState};
use tiffin_core::framework::{DatabaseProcessor, MIGRATOR};
use tiffin_core::gateway::{GatewayClient, GatewayConfig, checksum};
use url::Url;

/// What the stub gateway reports and records.
struct StubGateway {
    /// Gateway code returned by the status endpoint.
    status_code: Mutex<String>,
    /// Last `(base64_payload, x_verify_header)` received by the pay endpoint.
    last_pay_request: Mutex<Option<(String, String)>>,
}

impl StubGateway {
    fn new(status_code: &str) -> Arc<Self> {
        Arc::new(Self {
            status_code: Mutex::new(status_code.to_owned()),
            last_pay_request: Mutex::new(None),
        })
    }
}

async fn stub_pay(
    State(stub): State<Arc<StubGateway>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let encoded = body["request"].as_str().unwrap_or_default().to_owned();
    let x_verify = headers
        .get(checksum::CHECKSUM_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    *stub.last_pay_request.lock().unwrap() = Some((encoded, x_verify));

    Json(json!({
        "success": true,
        "code": "PAYMENT_INITIATED",
        "data": {
            "instrumentResponse": {
                "redirectInfo": { "url": "https://gateway.test/pay/page/123" }
            }
        }
    }))
}

async fn stub_status(
    State(stub): State<Arc<StubGateway>>,
    Path((_merchant_id, merchant_transaction_id)): Path<(String, String)>,
) -> Json<serde_json::Value> {
    let code = stub.status_code.lock().unwrap().clone();
    if code == "PAYMENT_SUCCESS" {
        Json(json!({
            "success": true,
            "code": code,
            "data": {
                "merchantTransactionId": merchant_transaction_id,
                "transactionId": "GTX1",
                "amount": 49900,
                "state": "COMPLETED",
                "paymentInstrument": { "type": "UPI", "utr": "405554491450" }
            }
        }))
    } else {
        Json(json!({ "success": false, "code": code }))
    }
}

async fn spawn_stub(stub: Arc<StubGateway>) -> Url {
    let router = Router::new()
        .route("/pg/v1/pay", post(stub_pay))
        .route("/pg/v1/status/{merchant_id}/{mtid}", get(stub_status))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

async fn coordinator(stub: Arc<StubGateway>, pool: SqlitePool) -> Coordinator {
    let host_url = spawn_stub(stub).await;
    let gateway = GatewayClient::new(GatewayConfig {
        host_url,
        merchant_id: "MERCHANT1".into(),
        salt_key: "test-salt".into(),
        salt_index: 1,
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    Coordinator::new(gateway, pool, Url::parse("https://shop.test").unwrap())
}

fn draft() -> OrderDraft {
    OrderDraft {
        user_id: "user-1".into(),
        items: vec![
            OrderItem {
                item_id: "i1".into(),
                shop_id: "shop-a".into(),
                name: "Masala Dosa".into(),
                quantity: 2,
                base_price: 15000,
                final_price: 12000,
                applied_offer: Some("DOSA20".into()),
            },
            OrderItem {
                item_id: "i2".into(),
                shop_id: "shop-a".into(),
                name: "Filter Coffee".into(),
                quantity: 1,
                base_price: 2500,
                final_price: 2500,
                applied_offer: None,
            },
        ],
        cart_total: 26500,
        total_items: 2,
        original_quantity: 3,
        total_savings: 6000,
    }
}

async fn payment_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM payment_records")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn order_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM order_records")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn confirm_twice_yields_one_payment_and_one_order() {
    let pool = test_pool().await;
    let coordinator = coordinator(StubGateway::new("PAYMENT_SUCCESS"), pool.clone()).await;

    let first = coordinator.confirm("txn-1", draft()).await.unwrap();
    let second = coordinator.confirm("txn-1", draft()).await.unwrap();

    assert_eq!(first.order_id, second.order_id);
    assert_eq!(first.status, OrderStatus::Pending);
    assert_eq!(payment_count(&pool).await, 1);
    assert_eq!(order_count(&pool).await, 1);
}

#[tokio::test]
async fn concurrent_confirms_create_exactly_one_order() {
    let pool = test_pool().await;
    let coordinator =
        Arc::new(coordinator(StubGateway::new("PAYMENT_SUCCESS"), pool.clone()).await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator.confirm("txn-race", draft()).await
        }));
    }

    let mut order_ids = Vec::new();
    for handle in handles {
        let order = handle.await.unwrap().unwrap();
        order_ids.push(order.order_id);
    }

    assert!(order_ids.iter().all(|id| *id == order_ids[0]));
    assert_eq!(payment_count(&pool).await, 1);
    assert_eq!(order_count(&pool).await, 1);
}

#[tokio::test]
async fn pending_gateway_code_persists_nothing() {
    let pool = test_pool().await;
    let coordinator = coordinator(StubGateway::new("PAYMENT_PENDING"), pool.clone()).await;

    let err = coordinator.confirm("txn-pending", draft()).await.unwrap_err();
    match err {
        CheckoutError::PaymentNotCompleted { code } => assert_eq!(code, "PAYMENT_PENDING"),
        other => panic!("expected PaymentNotCompleted, got {other:?}"),
    }

    assert_eq!(payment_count(&pool).await, 0);
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn mismatched_cart_total_is_rejected_after_payment() {
    let pool = test_pool().await;
    let coordinator = coordinator(StubGateway::new("PAYMENT_SUCCESS"), pool.clone()).await;

    let mut bad = draft();
    bad.cart_total = 999;

    let err = coordinator.confirm("txn-bad-total", bad).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderPayloadMismatch { .. }));

    // The money arrived and is on record; the order was not created.
    assert_eq!(payment_count(&pool).await, 1);
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn empty_cart_is_rejected_after_payment() {
    let pool = test_pool().await;
    let coordinator = coordinator(StubGateway::new("PAYMENT_SUCCESS"), pool.clone()).await;

    let mut bad = draft();
    bad.items.clear();
    bad.cart_total = 0;

    let err = coordinator.confirm("txn-empty", bad).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderPayloadMismatch { .. }));
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn pickup_transition_is_one_way_and_idempotent() {
    let pool = test_pool().await;
    let coordinator = coordinator(StubGateway::new("PAYMENT_SUCCESS"), pool.clone()).await;

    let order = coordinator.confirm("txn-pickup", draft()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let collected = coordinator.update_pickup_status(order.order_id).await.unwrap();
    assert_eq!(collected.status, OrderStatus::Collected);

    let again = coordinator.update_pickup_status(order.order_id).await.unwrap();
    assert_eq!(again.status, OrderStatus::Collected);
    assert_eq!(again.order_id, order.order_id);
}

#[tokio::test]
async fn unknown_order_pickup_is_an_error() {
    let pool = test_pool().await;
    let coordinator = coordinator(StubGateway::new("PAYMENT_SUCCESS"), pool).await;

    let err = coordinator
        .update_pickup_status(uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::UnknownOrder));
}

#[tokio::test]
async fn initiate_writes_nothing_and_signs_minor_units() {
    let pool = test_pool().await;
    let stub = StubGateway::new("PAYMENT_SUCCESS");
    let coordinator = coordinator(stub.clone(), pool.clone()).await;

    // 499.00 rupees on the API becomes 49900 paise in the signed payload.
    let initiated = coordinator
        .initiate(
            Decimal::new(49900, 2),
            UserContext {
                user_id: "user-1".into(),
                mobile_number: Some("9999999999".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(initiated.redirect_url, "https://gateway.test/pay/page/123");
    assert_eq!(payment_count(&pool).await, 0);
    assert_eq!(order_count(&pool).await, 0);

    let (encoded, x_verify) = stub.last_pay_request.lock().unwrap().clone().unwrap();
    let decoded = fast32::base64::RFC4648.decode_str(&encoded).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&decoded).unwrap();

    assert_eq!(payload["amount"], 49900);
    assert_eq!(payload["merchantId"], "MERCHANT1");
    assert_eq!(payload["merchantUserId"], "user-1");
    assert_eq!(
        payload["merchantTransactionId"],
        initiated.merchant_transaction_id.as_str()
    );
    assert_eq!(
        payload["redirectUrl"],
        format!(
            "https://shop.test/payment/validate/{}",
            initiated.merchant_transaction_id
        )
    );

    // The header must be the checksum of the exact base64 string on the wire.
    assert_eq!(
        x_verify,
        checksum::sign_payload(&encoded, "/pg/v1/pay", "test-salt", 1)
    );
}

#[tokio::test]
async fn scenario_full_checkout_round_trip() {
    let pool = test_pool().await;
    let stub = StubGateway::new("PAYMENT_SUCCESS");
    let coordinator = coordinator(stub, pool.clone()).await;

    let initiated = coordinator
        .initiate(
            Decimal::from(265),
            UserContext {
                user_id: "user-1".into(),
                mobile_number: None,
            },
        )
        .await
        .unwrap();

    // Browser goes to the gateway page, comes back, client confirms twice.
    let first = coordinator
        .confirm(&initiated.merchant_transaction_id, draft())
        .await
        .unwrap();
    let second = coordinator
        .confirm(&initiated.merchant_transaction_id, draft())
        .await
        .unwrap();

    assert_eq!(first.order_id, second.order_id);

    let db = DatabaseProcessor { pool: pool.clone() };
    let payment = db
        .process(GetPaymentByMerchantTransactionId {
            merchant_transaction_id: initiated.merchant_transaction_id.clone(),
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(payment.state, PaymentState::Success);
    assert_eq!(payment.gateway_transaction_id, "GTX1");
    assert_eq!(payment.amount_minor_units, 49900);

    let looked_up = db
        .process(GetOrderById {
            order_id: first.order_id,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(looked_up.transaction_id, initiated.merchant_transaction_id);
    assert_eq!(looked_up.cart_total, 26500);

    assert_eq!(payment_count(&pool).await, 1);
    assert_eq!(order_count(&pool).await, 1);
}
