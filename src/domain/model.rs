use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Menu item identifier.
///
/// The server may hand out numeric or text ids while the view layer usually
/// passes them back as text, so `1`, `1.0` and `"1"` all name the same item.
/// Equality and hashing use the canonical text; serialization writes the id
/// back in the JSON kind it arrived in.
#[derive(Debug, Clone)]
pub struct MenuItemId {
    key: String,
    number: Option<serde_json::Number>,
}

impl MenuItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            key: id.into(),
            number: None,
        }
    }

    pub fn from_number(number: serde_json::Number) -> Self {
        Self {
            key: canonical_number(&number),
            number: Some(number),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn is_numeric(&self) -> bool {
        self.number.is_some()
    }
}

// Integral floats collapse to their integer text, so `1.0` keys like `1`.
fn canonical_number(number: &serde_json::Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => number.to_string(),
    }
}

impl PartialEq for MenuItemId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MenuItemId {}

impl Hash for MenuItemId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<&str> for MenuItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MenuItemId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<i64> for MenuItemId {
    fn from(id: i64) -> Self {
        Self::from_number(id.into())
    }
}

impl From<u64> for MenuItemId {
    fn from(id: u64) -> Self {
        Self::from_number(id.into())
    }
}

impl From<i32> for MenuItemId {
    fn from(id: i32) -> Self {
        Self::from_number(id.into())
    }
}

impl From<u32> for MenuItemId {
    fn from(id: u32) -> Self {
        Self::from_number(id.into())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for MenuItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self::from_number(n),
            RawId::Text(s) => Self::new(s),
        })
    }
}

impl Serialize for MenuItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.number {
            Some(number) => number.serialize(serializer),
            None => serializer.serialize_str(&self.key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: MenuItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
}

/// Successful `POST /orders` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: String,
    pub status: String,
    pub payment_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Server-side view of a placed order (`GET /orders/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub status: String,
    pub total_amount: Decimal,
    #[serde(default)]
    pub items: Vec<OrderedItem>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub delivery_lat: Option<f64>,
    #[serde(default)]
    pub delivery_lng: Option<f64>,
    #[serde(default)]
    pub eta_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEta {
    pub eta_seconds: u64,
}

/// Lifecycle stages the kitchen reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Received,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVED" => Ok(OrderStatus::Received),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "READY" => Ok(OrderStatus::Ready),
            "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `status` event. Extra fields such as `orderId` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    pub timestamp: String,
}

impl StatusUpdate {
    pub fn display_line(&self) -> String {
        format!("Status: {} {}", self.status, self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    Status(StatusUpdate),
    Notification(String),
}

/// One dispatched `text/event-stream` message, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    pub event: String,
    pub data: String,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    ClientRequested,
    /// A newer session took over the tracker.
    Replaced,
    ServerClosed,
    TransportError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closed(CloseReason),
}

impl SessionState {
    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Status,
    Notification,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
}
