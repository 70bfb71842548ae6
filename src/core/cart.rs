use crate::domain::model::{CartLine, MenuItem, MenuItemId, OrderItem};
use crate::utils::error::{OrderError, Result};
use rust_decimal::Decimal;

/// Selected menu items and their quantities, in order of first add.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `id` from `catalog` and returns the line's new quantity.
    ///
    /// An id missing from the catalog fails with [`OrderError::NotFound`] and
    /// leaves the cart untouched.
    pub fn add_item(&mut self, catalog: &[MenuItem], id: impl Into<MenuItemId>) -> Result<u32> {
        let id = id.into();
        let item = catalog
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| OrderError::NotFound {
                id: id.to_string(),
            })?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.id == item.id) {
            line.quantity += 1;
            tracing::debug!("Cart line {} now x{}", line.name, line.quantity);
            return Ok(line.quantity);
        }

        tracing::debug!("Cart line {} added", item.name);
        self.lines.push(CartLine {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: 1,
        });
        Ok(1)
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn snapshot(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                menu_item_id: line.id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    /// Empties the cart. Call only once the server has accepted the order.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Fixed two-decimal rendering used for every displayed amount.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
