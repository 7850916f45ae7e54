//! Order Models
//!
//! An order is an immutable snapshot of a checkout. Line items copy
//! product name/description/price at creation time so later catalog
//! edits never alter order history.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Order ID type
pub type OrderId = RecordId;

/// Order lifecycle status
///
/// Happy path walks the ordinals upward; CANCELLED/REFUNDED/FAILED are
/// side exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "SHIPPED")]
    Shipped,
    #[serde(rename = "OUT_FOR_DELIVERY")]
    OutForDelivery,
    #[serde(rename = "DELIVERED")]
    Delivered,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    #[serde(rename = "REFUNDED")]
    Refunded,
    #[serde(rename = "FAILED")]
    Failed,
}

impl OrderStatus {
    /// Position in the happy-path sequence; side exits sort last
    pub fn ordinal(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Processing => 2,
            OrderStatus::Shipped => 3,
            OrderStatus::OutForDelivery => 4,
            OrderStatus::Delivered => 5,
            OrderStatus::Cancelled => 6,
            OrderStatus::Refunded => 7,
            OrderStatus::Failed => 8,
        }
    }

    /// Cancellation window closes once the order ships
    pub fn is_cancellable(&self) -> bool {
        self.ordinal() < OrderStatus::Shipped.ordinal()
    }
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "REFUNDED")]
    Refunded,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

/// Embedded postal address (denormalized onto the order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub landmark: Option<String>,
    pub contact_number: Option<String>,
    pub recipient_name: Option<String>,
}

/// Order aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<OrderId>,
    /// "ORD-<year>-<3 digits>"
    pub order_number: String,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Sum of line totals
    pub total_amount: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub shipping_charge: f64,
    /// total_amount + shipping_charge
    pub final_amount: f64,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: Option<String>,
    /// External payment-gateway id
    pub payment_id: Option<String>,
    pub transaction_id: Option<String>,
    /// Fulfilling SHG Didi, once assigned
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub assigned_shg: Option<RecordId>,
    /// Delivery agent, once assigned
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub delivery_boy: Option<RecordId>,
    /// Optimistic-lock counter; bumped on every conditional update
    pub version: i64,
    pub order_date: i64,
    pub updated_at: i64,
}

impl Order {
    /// Explicit constructor stamping timestamps and lifecycle defaults
    pub fn new(
        order_number: String,
        user: RecordId,
        shipping_address: Address,
        billing_address: Address,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: None,
            order_number,
            user,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_amount: 0.0,
            discount_amount: 0.0,
            tax_amount: 0.0,
            shipping_charge: 0.0,
            final_amount: 0.0,
            shipping_address,
            billing_address,
            payment_method: None,
            payment_id: None,
            transaction_id: None,
            assigned_shg: None,
            delivery_boy: None,
            version: 0,
            order_date: now,
            updated_at: now,
        }
    }
}

/// Immutable order line snapshot, copied from the originating cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub order_id: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    /// Snapshot fields — duplicated so later catalog edits don't alter history
    pub product_name: String,
    pub product_description: Option<String>,
    pub price_at_add: f64,
    pub quantity: i32,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub oil_type: Option<String>,
    pub customization_notes: Option<String>,
    /// price_at_add × quantity
    pub total_price: f64,
}

/// Checkout request
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreateRequest {
    pub shipping_address: Address,
    /// Defaults to the shipping address when absent
    pub billing_address: Option<Address>,
    pub payment_method: Option<String>,
    /// External payment-gateway reference; the payment callbacks look
    /// orders up by this id
    pub payment_id: Option<String>,
    pub shipping_charge: Option<f64>,
}

/// Status patch request (admin)
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Assignment request
#[derive(Debug, Clone, Deserialize)]
pub struct AssignOrderRequest {
    /// "user:xxxx"
    pub user_id: String,
}

/// Payment webhook payloads
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSuccessRequest {
    pub payment_id: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentFailureRequest {
    pub payment_id: String,
    pub error_message: Option<String>,
}

/// Order view: order plus its line items
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordinals_are_monotonic_on_happy_path() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
    }

    #[test]
    fn test_cancellation_window() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::OutForDelivery.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");
        let status: OrderStatus = serde_json::from_str("\"REFUNDED\"").unwrap();
        assert_eq!(status, OrderStatus::Refunded);
    }
}
