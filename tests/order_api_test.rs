use anyhow::Result;
use httpmock::prelude::*;
use restaurant_client::domain::ports::OrderApi;
use restaurant_client::{Cart, Checkout, HttpOrderApi, OrderError};
use rust_decimal_macros::dec;

fn menu_body() -> serde_json::Value {
    serde_json::json!([
        {"id": 1, "name": "Veggie Burger", "description": "Patty with fresh veggies", "price": 6.49, "category": "burger"},
        {"id": 2, "name": "French Fries", "description": "Crispy golden fries", "price": 2.99, "category": "sides"}
    ])
}

#[tokio::test]
async fn test_end_to_end_checkout_clears_cart() {
    let server = MockServer::start();

    let menu_mock = server.mock(|when, then| {
        when.method(GET).path("/api/menu");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(menu_body());
    });

    let order_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/orders")
            .json_body(serde_json::json!({
                "customerName": "Asha",
                "customerPhone": "9876543210",
                "items": [
                    {"menuItemId": 1, "quantity": 2},
                    {"menuItemId": 2, "quantity": 1}
                ]
            }));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "orderId": "a1b2c3",
                "status": "RECEIVED",
                "total": 15.97,
                "paymentToken": "SIMULATED_PAYMENT_TOKEN_a1b2c3"
            }));
    });

    let api = HttpOrderApi::new(&server.url("/api")).unwrap();
    let checkout = Checkout::new(api);

    let menu = checkout.fetch_menu(None).await.unwrap();
    let mut cart = Cart::new();
    cart.add_item(&menu, "1").unwrap();
    cart.add_item(&menu, 2).unwrap();
    cart.add_item(&menu, 1).unwrap();
    assert_eq!(cart.total(), dec!(15.97));

    let receipt = checkout
        .submit_order(" Asha ", "9876543210", &cart)
        .await
        .unwrap();
    cart.clear();

    menu_mock.assert();
    order_mock.assert();
    assert_eq!(receipt.order_id, "a1b2c3");
    assert_eq!(receipt.status, "RECEIVED");
    assert_eq!(receipt.payment_token, "SIMULATED_PAYMENT_TOKEN_a1b2c3");
    assert_eq!(receipt.total, Some(dec!(15.97)));
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_menu_category_filter_sent_as_query() {
    let server = MockServer::start();
    let menu_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/menu")
            .query_param("category", "burger");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"id": 1, "name": "Veggie Burger", "description": "", "price": 6.49, "category": "burger"}
            ]));
    });

    let api = HttpOrderApi::new(&server.url("/api")).unwrap();
    let menu = api.fetch_menu(Some("burger")).await.unwrap();

    menu_mock.assert();
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0].price, dec!(6.49));
}

#[tokio::test]
async fn test_rejected_order_uses_server_message() {
    let server = MockServer::start();
    let order_mock = server.mock(|when, then| {
        when.method(POST).path("/api/orders");
        then.status(400)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"error": "Unknown menu item: 42"}));
    });

    let checkout = Checkout::new(HttpOrderApi::new(&server.url("/api")).unwrap());
    let cart = Cart::new();

    let err = checkout
        .submit_order("Asha", "999", &cart)
        .await
        .unwrap_err();

    order_mock.assert();
    assert!(matches!(err, OrderError::SubmissionError { ref message } if message == "Unknown menu item: 42"));
}

#[tokio::test]
async fn test_rejected_order_without_body_uses_fallback() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/orders");
        then.status(500).body("Internal Server Error");
    });

    let checkout = Checkout::new(HttpOrderApi::new(&server.url("/api")).unwrap());
    let err = checkout
        .submit_order("Asha", "999", &Cart::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::SubmissionError { ref message } if message == "unknown error"));
}

#[tokio::test]
async fn test_unreachable_server_is_a_submission_error() {
    let checkout = Checkout::new(HttpOrderApi::new("http://127.0.0.1:9/api").unwrap());
    let err = checkout
        .submit_order("Asha", "999", &Cart::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::SubmissionError { ref message } if message.starts_with("could not reach the server")));
}

#[tokio::test]
async fn test_menu_failure_is_not_a_submission_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/menu");
        then.status(503)
            .json_body(serde_json::json!({"error": "Kitchen closed"}));
    });

    let checkout = Checkout::new(HttpOrderApi::new(&server.url("/api")).unwrap());
    let err = checkout.fetch_menu(None).await.unwrap_err();

    assert!(matches!(err, OrderError::RequestError { ref message } if message == "Kitchen closed"));
}

#[tokio::test]
async fn test_validation_failure_makes_no_request() {
    let server = MockServer::start();
    let order_mock = server.mock(|when, then| {
        when.method(POST).path("/api/orders");
        then.status(200);
    });

    let checkout = Checkout::new(HttpOrderApi::new(&server.url("/api")).unwrap());
    let err = checkout
        .submit_order("", "999", &Cart::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::ValidationError { .. }));
    order_mock.assert_hits(0);
}

#[tokio::test]
async fn test_fetch_order_details_and_not_found() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/orders/a1b2c3");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "id": "a1b2c3",
                "createdAt": "2024-05-01T12:00:00Z",
                "customerName": "Asha",
                "customerPhone": "999",
                "totalAmount": 12.98,
                "status": "PREPARING",
                "deliveryLat": null,
                "deliveryLng": null,
                "etaSeconds": null,
                "items": [
                    {"id": 10, "menuItemId": 1, "name": "Veggie Burger", "quantity": 2, "unitPrice": 6.49}
                ]
            }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/orders/missing");
        then.status(404);
    });

    let api = HttpOrderApi::new(&server.url("/api"))?;

    let order = api.fetch_order("a1b2c3").await?;
    assert_eq!(order.status, "PREPARING");
    assert_eq!(order.total_amount, dec!(12.98));
    assert_eq!(order.items[0].unit_price, dec!(6.49));
    assert_eq!(order.eta_seconds, None);

    let err = api.fetch_order("missing").await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound { ref id } if id == "missing"));
    Ok(())
}

#[tokio::test]
async fn test_pay_order_success_and_failure() {
    let server = MockServer::start();
    let paid = server.mock(|when, then| {
        when.method(POST)
            .path("/api/orders/ok/pay")
            .json_body(serde_json::json!({"paymentToken": "SIMULATED_PAYMENT_TOKEN_ok"}));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"status": "PAID"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/orders/declined/pay");
        then.status(400)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"error": "Payment failed"}));
    });

    let checkout = Checkout::new(HttpOrderApi::new(&server.url("/api")).unwrap());

    let receipt = checkout
        .pay_order("ok", "SIMULATED_PAYMENT_TOKEN_ok")
        .await
        .unwrap();
    paid.assert();
    assert_eq!(receipt.status, "PAID");

    let err = checkout.pay_order("declined", "tok").await.unwrap_err();
    assert_eq!(err.user_friendly_message(), "Error: Payment failed");
}

#[tokio::test]
async fn test_delivery_location_returns_eta() -> Result<()> {
    let server = MockServer::start();
    let locate = server.mock(|when, then| {
        when.method(POST)
            .path("/api/orders/a1b2c3/track")
            .json_body(serde_json::json!({"lat": 12.9352, "lng": 77.6245}));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"etaSeconds": 720}));
    });

    let checkout = Checkout::new(HttpOrderApi::new(&server.url("/api"))?);
    let eta = checkout
        .set_delivery_location("a1b2c3", 12.9352, 77.6245)
        .await?;

    locate.assert();
    assert_eq!(eta.eta_seconds, 720);
    Ok(())
}
