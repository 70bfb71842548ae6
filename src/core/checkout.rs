use crate::core::cart::Cart;
use crate::domain::model::{
    DeliveryEta, DeliveryLocation, MenuItem, OrderDetails, OrderReceipt, OrderSubmission,
    PaymentReceipt,
};
use crate::domain::ports::OrderApi;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range};

/// Builds the order request from the cart after checking the customer fields.
pub fn build_submission(
    customer_name: &str,
    customer_phone: &str,
    cart: &Cart,
) -> Result<OrderSubmission> {
    let customer_name = validate_non_empty_string("customer_name", customer_name)?;
    let customer_phone = validate_non_empty_string("customer_phone", customer_phone)?;

    Ok(OrderSubmission {
        customer_name: customer_name.to_string(),
        customer_phone: customer_phone.to_string(),
        items: cart.to_order_items(),
    })
}

/// Checkout path over an [`OrderApi`]: menu, order placement, payment and
/// delivery details.
pub struct Checkout<A: OrderApi> {
    api: A,
}

impl<A: OrderApi> Checkout<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn fetch_menu(&self, category: Option<&str>) -> Result<Vec<MenuItem>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let menu = self.api.fetch_menu(category).await?;
        tracing::debug!("Fetched {} menu items", menu.len());
        Ok(menu)
    }

    /// Places the order. The cart is only read; the caller clears it once
    /// this returns `Ok`.
    pub async fn submit_order(
        &self,
        customer_name: &str,
        customer_phone: &str,
        cart: &Cart,
    ) -> Result<OrderReceipt> {
        let submission = build_submission(customer_name, customer_phone, cart)?;

        tracing::info!(
            "Submitting order with {} line(s) for {}",
            submission.items.len(),
            submission.customer_name
        );
        let receipt = self.api.submit_order(&submission).await.map_err(|e| {
            tracing::warn!("Order submission failed: {}", e);
            e
        })?;
        tracing::info!("Order {} placed ({})", receipt.order_id, receipt.status);

        Ok(receipt)
    }

    pub async fn fetch_order(&self, order_id: &str) -> Result<OrderDetails> {
        let order_id = validate_non_empty_string("order_id", order_id)?;
        self.api.fetch_order(order_id).await
    }

    pub async fn pay_order(&self, order_id: &str, payment_token: &str) -> Result<PaymentReceipt> {
        let order_id = validate_non_empty_string("order_id", order_id)?;
        let payment_token = validate_non_empty_string("payment_token", payment_token)?;

        let receipt = self.api.pay_order(order_id, payment_token).await?;
        tracing::info!("Payment for order {}: {}", order_id, receipt.status);
        Ok(receipt)
    }

    pub async fn set_delivery_location(
        &self,
        order_id: &str,
        lat: f64,
        lng: f64,
    ) -> Result<DeliveryEta> {
        let order_id = validate_non_empty_string("order_id", order_id)?;
        validate_range("lat", lat, -90.0, 90.0)?;
        validate_range("lng", lng, -180.0, 180.0)?;

        let eta = self
            .api
            .set_delivery_location(order_id, DeliveryLocation { lat, lng })
            .await?;
        tracing::info!("Order {} ETA {}s", order_id, eta.eta_seconds);
        Ok(eta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MenuItemId, OrderItem};
    use crate::utils::error::OrderError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    /// Records every call; answers are scripted per test.
    #[derive(Clone, Default)]
    struct MockApi {
        calls: Arc<Mutex<Vec<String>>>,
        submitted: Arc<Mutex<Vec<OrderSubmission>>>,
        reject_with: Option<String>,
    }

    impl MockApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderApi for MockApi {
        async fn fetch_menu(&self, category: Option<&str>) -> Result<Vec<MenuItem>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("menu:{}", category.unwrap_or("*")));
            Ok(vec![])
        }

        async fn submit_order(&self, submission: &OrderSubmission) -> Result<OrderReceipt> {
            self.calls.lock().unwrap().push("submit".to_string());
            self.submitted.lock().unwrap().push(submission.clone());
            if let Some(message) = &self.reject_with {
                return Err(OrderError::SubmissionError {
                    message: message.clone(),
                });
            }
            Ok(OrderReceipt {
                order_id: "ord-1".to_string(),
                status: "RECEIVED".to_string(),
                payment_token: "SIMULATED_PAYMENT_TOKEN_ord-1".to_string(),
                total: Some(dec!(30.00)),
            })
        }

        async fn fetch_order(&self, order_id: &str) -> Result<OrderDetails> {
            self.calls.lock().unwrap().push(format!("fetch:{}", order_id));
            Err(OrderError::NotFound {
                id: order_id.to_string(),
            })
        }

        async fn pay_order(&self, order_id: &str, payment_token: &str) -> Result<PaymentReceipt> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("pay:{}:{}", order_id, payment_token));
            Ok(PaymentReceipt {
                status: "PAID".to_string(),
            })
        }

        async fn set_delivery_location(
            &self,
            order_id: &str,
            location: DeliveryLocation,
        ) -> Result<DeliveryEta> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("locate:{}:{}:{}", order_id, location.lat, location.lng));
            Ok(DeliveryEta { eta_seconds: 900 })
        }
    }

    fn tea_cart() -> Cart {
        let catalog = vec![MenuItem {
            id: MenuItemId::from(1),
            name: "Tea".to_string(),
            description: String::new(),
            price: dec!(10.00),
            category: None,
        }];
        let mut cart = Cart::new();
        for _ in 0..3 {
            cart.add_item(&catalog, 1).unwrap();
        }
        cart
    }

    #[tokio::test]
    async fn test_empty_name_fails_before_network() {
        let api = MockApi::default();
        let checkout = Checkout::new(api.clone());
        let cart = tea_cart();

        let err = checkout.submit_order("", "999", &cart).await.unwrap_err();

        assert!(matches!(err, OrderError::ValidationError { ref field, .. } if field == "customer_name"));
        assert!(api.calls().is_empty());
        assert_eq!(cart.total(), dec!(30.00));
    }

    #[tokio::test]
    async fn test_whitespace_phone_fails_before_network() {
        let api = MockApi::default();
        let checkout = Checkout::new(api.clone());

        let err = checkout
            .submit_order("Asha", "   ", &tea_cart())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::ValidationError { ref field, .. } if field == "customer_phone"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submission_trims_fields_and_uses_cart_lines() {
        let api = MockApi::default();
        let checkout = Checkout::new(api.clone());

        let receipt = checkout
            .submit_order("  Asha ", " 999 ", &tea_cart())
            .await
            .unwrap();

        assert_eq!(receipt.order_id, "ord-1");
        let submitted = api.submitted.lock().unwrap().clone();
        assert_eq!(
            submitted,
            vec![OrderSubmission {
                customer_name: "Asha".to_string(),
                customer_phone: "999".to_string(),
                items: vec![OrderItem {
                    menu_item_id: MenuItemId::from(1),
                    quantity: 3
                }],
            }]
        );
    }

    #[tokio::test]
    async fn test_rejected_order_surfaces_server_message_and_keeps_cart() {
        let api = MockApi {
            reject_with: Some("Unknown menu item: 42".to_string()),
            ..MockApi::default()
        };
        let checkout = Checkout::new(api);
        let cart = tea_cart();

        let err = checkout.submit_order("Asha", "999", &cart).await.unwrap_err();

        assert_eq!(err.user_friendly_message(), "Error: Unknown menu item: 42");
        assert_eq!(cart.snapshot()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_blank_category_fetches_whole_menu() {
        let api = MockApi::default();
        let checkout = Checkout::new(api.clone());

        checkout.fetch_menu(Some("  ")).await.unwrap();
        checkout.fetch_menu(Some("burger")).await.unwrap();

        assert_eq!(api.calls(), vec!["menu:*", "menu:burger"]);
    }

    #[tokio::test]
    async fn test_pay_requires_token() {
        let api = MockApi::default();
        let checkout = Checkout::new(api.clone());

        assert!(checkout.pay_order("ord-1", "").await.is_err());
        assert!(api.calls().is_empty());

        let receipt = checkout.pay_order("ord-1", "tok").await.unwrap();
        assert_eq!(receipt.status, "PAID");
        assert_eq!(api.calls(), vec!["pay:ord-1:tok"]);
    }

    #[tokio::test]
    async fn test_delivery_location_range_checked_locally() {
        let api = MockApi::default();
        let checkout = Checkout::new(api.clone());

        assert!(checkout.set_delivery_location("ord-1", 95.0, 10.0).await.is_err());
        assert!(checkout.set_delivery_location("ord-1", 10.0, -181.0).await.is_err());
        assert!(api.calls().is_empty());

        let eta = checkout
            .set_delivery_location("ord-1", 12.97, 77.59)
            .await
            .unwrap();
        assert_eq!(eta.eta_seconds, 900);
    }

    #[tokio::test]
    async fn test_fetch_order_passes_not_found_through() {
        let checkout = Checkout::new(MockApi::default());
        let err = checkout.fetch_order("missing").await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound { .. }));
    }
}
