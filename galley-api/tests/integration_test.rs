use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use galley_api::{app, AppState};
use galley_catalog::{InMemoryCatalog, PricingConfig};
use galley_core::money;
use galley_order::{PickupLedger, WorkItem};
use galley_shared::{ComponentKind, FulfillmentStatus};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const MENU: &str = r#"[
    {
        "name": "Burger",
        "category": "mains",
        "base_price": 200,
        "kitchen": "Grill",
        "spicy": { "enabled": true, "price": 20 },
        "addons": [{ "name": "Fries", "base_price": 20, "kitchen": "Fryer" }],
        "combos": [
            { "name": "Cola", "base_price": 40, "kitchen": "Bar", "size": { "enabled": true, "small_price": 30, "large_price": 50 } }
        ]
    },
    { "name": "Lassi", "category": "drinks", "base_price": 80, "kitchen": "Bar" }
]"#;

fn test_app() -> Router {
    let catalog = InMemoryCatalog::from_json_str(MENU).unwrap();
    let state = AppState::new(
        Arc::new(catalog),
        PricingConfig::default(),
        money::from_f64(0.10).unwrap(),
        Arc::new(PickupLedger::new()),
        None,
    )
    .unwrap();
    app(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn burger_selection() -> Value {
    json!({
        "menu_item": "Burger",
        "quantity": 2,
        "spicy": true,
        "addons": { "Fries": { "quantity": 3 } },
        "combos": { "Cola": { "quantity": 1 } }
    })
}

async fn place_burger_order(app: &Router) -> (Uuid, Vec<WorkItem>) {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/orders",
        Some(json!({
            "customer_name": "Asha",
            "order_type": "Dine In",
            "table_number": "4",
            "selections": [burger_selection()]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let order_id: Uuid = serde_json::from_value(body["order_id"].clone()).unwrap();
    let work_items: Vec<WorkItem> = serde_json::from_value(body["work_items"].clone()).unwrap();
    (order_id, work_items)
}

fn key_of(items: &[WorkItem], kind: ComponentKind) -> String {
    items.iter().find(|w| w.kind() == kind).unwrap().id.storage_key()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_quote_prices_and_merges_lines() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/cart/quote",
        Some(json!({
            "selections": [
                { "menu_item": "Lassi" },
                burger_selection(),
                { "menu_item": "Lassi", "quantity": 3 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let lines = body["lines"].as_array().unwrap();
    // the second Lassi replaces the first
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["quantity"], 3);
    assert_eq!(body["breakdowns"].as_array().unwrap().len(), 2);

    // 240 + 540 = 780, VAT 78
    assert_eq!(body["totals"]["subtotal"].as_f64(), Some(780.0));
    assert_eq!(body["totals"]["vat"].as_f64(), Some(78.0));
    assert_eq!(body["totals"]["grand_total"].as_f64(), Some(858.0));
}

#[tokio::test]
async fn test_quote_rejects_unknown_item() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/cart/quote",
        Some(json!({ "selections": [{ "menu_item": "Pizza" }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Pizza"));
}

#[tokio::test]
async fn test_place_order_validation() {
    let app = test_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/orders",
        Some(json!({ "customer_name": "Asha", "order_type": "Take Away", "selections": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/orders",
        Some(json!({ "customer_name": "  ", "order_type": "Take Away", "selections": [{ "menu_item": "Lassi" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_flow_through_kitchens() {
    let app = test_app();
    let (order_id, work_items) = place_burger_order(&app).await;
    assert_eq!(work_items.len(), 3);
    assert!(work_items.iter().all(|w| w.status == FulfillmentStatus::Pending));

    let (_, body) = send(&app, Method::GET, "/v1/kitchens", None).await;
    assert_eq!(body["kitchens"], json!(["Grill", "Fryer", "Bar"]));
    assert_eq!(body["default"], "Grill");

    let (_, body) = send(&app, Method::GET, "/v1/kitchens/Fryer/orders", None).await;
    let views = body.as_array().unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["work_items"].as_array().unwrap().len(), 1);
    assert_eq!(views[0]["meta"]["customer_name"], "Asha");

    // Grill: prepare, then pick up
    let main_key = key_of(&work_items, ComponentKind::Main);
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/work-items/prepared",
        Some(json!({ "work_item": main_key })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Prepared");

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/work-items/picked-up",
        Some(json!({ "work_item": main_key })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], main_key);
    assert_eq!(body["customer_name"], "Asha");

    // picking up twice is a conflict, not a second record
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/work-items/picked-up",
        Some(json!({ "work_item": main_key })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, Method::GET, "/v1/pickups?kitchen=Grill", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&app, Method::GET, "/v1/pickups?window=all&kitchen=Bar", None).await;
    assert!(body.as_array().unwrap().is_empty());

    // Fryer: whole line prepared, then bulk pickup
    let line_id = work_items[0].id.cart_line_id;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/kitchens/Fryer/lines/{}/prepared", line_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (_, body) = send(
        &app,
        Method::POST,
        "/v1/kitchens/Fryer/bulk-pickup",
        Some(json!({ "order_ids": [order_id, Uuid::new_v4()] })),
    )
    .await;
    assert_eq!(body["updated"], 1);

    // Bar has not prepared the combo yet
    let (_, body) = send(
        &app,
        Method::POST,
        "/v1/kitchens/Bar/bulk-pickup",
        Some(json!({ "order_ids": [order_id] })),
    )
    .await;
    assert_eq!(body["updated"], 0);

    let (_, body) = send(&app, Method::GET, &format!("/v1/orders/{}/work-items", order_id), None).await;
    assert_eq!(body["complete"], false);

    let combo_key = key_of(&work_items, ComponentKind::Combo);
    for path in ["/v1/work-items/preparing", "/v1/work-items/prepared", "/v1/work-items/picked-up"] {
        let (status, _) = send(&app, Method::POST, path, Some(json!({ "work_item": combo_key }))).await;
        assert_eq!(status, StatusCode::OK, "{}", path);
    }

    let (_, body) = send(&app, Method::GET, &format!("/v1/orders/{}/work-items", order_id), None).await;
    assert_eq!(body["complete"], true);

    let (_, body) = send(&app, Method::GET, "/v1/kitchens", None).await;
    assert_eq!(body["kitchens"], json!([]));
    assert_eq!(body["default"], Value::Null);
}

#[tokio::test]
async fn test_transition_errors() {
    let app = test_app();
    let (order_id, work_items) = place_burger_order(&app).await;

    // pending items cannot be picked up
    let combo_key = key_of(&work_items, ComponentKind::Combo);
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/work-items/picked-up",
        Some(json!({ "work_item": combo_key })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let unknown = format!("{}:main:Burger", Uuid::new_v4());
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/work-items/prepared",
        Some(json!({ "work_item": unknown })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/work-items/prepared",
        Some(json!({ "work_item": "not-a-key" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, &format!("/v1/orders/{}/work-items", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // nothing on this line goes to the Pastry station
    let line_id = work_items[0].id.cart_line_id;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/kitchens/Pastry/lines/{}/prepared", line_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &format!("/v1/orders/{}/work-items", order_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["work_items"][0]["id"]["cart_line_id"], json!(line_id));
}

#[tokio::test]
async fn test_metrics_count_orders_and_rejections() {
    let app = test_app();
    let (_, work_items) = place_burger_order(&app).await;

    let combo_key = key_of(&work_items, ComponentKind::Combo);
    send(
        &app,
        Method::POST,
        "/v1/work-items/picked-up",
        Some(json!({ "work_item": combo_key })),
    )
    .await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("galley_orders_placed_total 1"));
    assert!(text.contains("galley_rejected_transitions_total 1"));
    assert!(text.contains("galley_pending_sync 0"));
}
