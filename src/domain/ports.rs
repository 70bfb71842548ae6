use crate::domain::model::{
    DeliveryEta, DeliveryLocation, EventFrame, MenuItem, OrderDetails, OrderReceipt,
    OrderSubmission, PaymentReceipt,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Raw server-push frames for one order, in arrival order.
pub type EventFrameStream = Pin<Box<dyn Stream<Item = Result<EventFrame>> + Send>>;

/// Request/response endpoints of the ordering service.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn fetch_menu(&self, category: Option<&str>) -> Result<Vec<MenuItem>>;
    async fn submit_order(&self, submission: &OrderSubmission) -> Result<OrderReceipt>;
    async fn fetch_order(&self, order_id: &str) -> Result<OrderDetails>;
    async fn pay_order(&self, order_id: &str, payment_token: &str) -> Result<PaymentReceipt>;
    async fn set_delivery_location(
        &self,
        order_id: &str,
        location: DeliveryLocation,
    ) -> Result<DeliveryEta>;
}

/// Opens the per-order event stream. Resolving the future means the
/// connection is established; dropping the stream releases it.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn open_event_stream(&self, order_id: &str) -> Result<EventFrameStream>;
}
