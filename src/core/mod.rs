pub mod cart;
pub mod checkout;
pub mod tracker;

pub use crate::domain::model::{CartLine, MenuItem, MenuItemId, OrderEvent, SessionState};
pub use crate::domain::ports::{EventTransport, OrderApi};
pub use crate::utils::error::Result;
