//! Order Repository
//!
//! Converts carts into immutable order snapshots and walks them through
//! the status lifecycle. Every line is re-validated against current
//! stock before anything is written; stock decrements are guarded and
//! compensated inline if one fails mid-way. Status transitions are
//! conditional on the optimistic version counter.

use chrono::{Datelike, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id_for};
use super::{CartRepository, ProductRepository};
use crate::db::models::{
    Order, OrderCreateRequest, OrderItem, OrderStatus, OrderView, PaymentStatus, User,
};
use crate::pricing::{line_total, to_f64};
use shared::Role;

const ORDER_TABLE: &str = "orders";

/// Bounded retries for the collision-prone order number format
const ORDER_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn product_repo(&self) -> ProductRepository {
        ProductRepository::new(self.base.db().clone())
    }

    fn cart_repo(&self) -> CartRepository {
        CartRepository::new(self.base.db().clone())
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// "ORD-<year>-<3 digits>", retried on collision; the random suffix
    /// gives only 1000 values per year so a duplicate check is mandatory
    async fn generate_unique_order_number(&self) -> RepoResult<String> {
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let candidate = format!(
                "ORD-{}-{:03}",
                Utc::now().year(),
                rand::thread_rng().gen_range(0..1000)
            );
            if self.find_by_order_number(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        // The 3-digit space is exhausted or unlucky; widen with millis
        Ok(format!(
            "ORD-{}-{}",
            Utc::now().year(),
            Utc::now().timestamp_millis()
        ))
    }

    /// Convert the caller's cart into an order
    ///
    /// Validates every line against current stock before any mutation,
    /// snapshots line items, decrements stock per line (restoring the
    /// already-applied decrements if a guard fails mid-way) and clears
    /// the cart on success.
    pub async fn create_from_cart(
        &self,
        user: &RecordId,
        request: OrderCreateRequest,
        default_shipping: f64,
    ) -> RepoResult<OrderView> {
        let cart_repo = self.cart_repo();
        let product_repo = self.product_repo();

        let cart = cart_repo.get_or_create(user).await?;
        let cart_id = cart
            .id
            .ok_or_else(|| RepoError::Database("Cart row without id".to_string()))?;
        let lines = cart_repo.items(&cart_id).await?;

        if lines.is_empty() {
            return Err(RepoError::BusinessRule("Cart is empty".to_string()));
        }

        // Re-check stock for every line before touching anything; this
        // catches races since add-to-cart time
        let mut products = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = product_repo
                .find_by_id(&line.product.to_string())
                .await?
                .ok_or_else(|| {
                    RepoError::NotFound(format!("Product {} not found", line.product))
                })?;
            if product.stock < line.quantity {
                return Err(RepoError::BusinessRule(format!(
                    "Insufficient stock for product: {} (requested {}, available {})",
                    product.name, line.quantity, product.stock
                )));
            }
            products.push(product);
        }

        let total: Decimal = lines
            .iter()
            .map(|l| line_total(l.price_at_add, l.quantity))
            .sum();
        let shipping = request.shipping_charge.unwrap_or(default_shipping);
        let final_amount = total + crate::pricing::to_decimal(shipping);

        let order_number = self.generate_unique_order_number().await?;
        let billing = request
            .billing_address
            .unwrap_or_else(|| request.shipping_address.clone());

        let mut order = Order::new(
            order_number,
            user.clone(),
            request.shipping_address,
            billing,
        );
        order.payment_method = request.payment_method;
        order.payment_id = request.payment_id;
        order.total_amount = to_f64(total);
        order.shipping_charge = shipping;
        order.final_amount = to_f64(final_amount);

        let created = self.insert_order(order).await?;
        let order_id = created
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Order row without id".to_string()))?;

        // Freeze one snapshot line per cart line
        let mut items = Vec::with_capacity(lines.len());
        for (line, product) in lines.iter().zip(&products) {
            let item = OrderItem {
                id: None,
                order_id: order_id.clone(),
                product: line.product.clone(),
                product_name: product.name.clone(),
                product_description: product.description.clone(),
                price_at_add: line.price_at_add,
                quantity: line.quantity,
                ingredients: product.ingredients.clone(),
                oil_type: product.oil_type.clone(),
                customization_notes: line.customization_notes.clone(),
                total_price: to_f64(line_total(line.price_at_add, line.quantity)),
            };
            items.push(self.insert_order_item(item).await?);
        }

        // Guarded decrements; compensate and unwind on mid-way failure
        let mut decremented: Vec<(String, i32)> = Vec::new();
        for line in &lines {
            let product_key = line.product.to_string();
            match product_repo
                .decrease_inventory(&product_key, line.quantity)
                .await
            {
                Ok(_) => decremented.push((product_key, line.quantity)),
                Err(e) => {
                    for (pid, qty) in &decremented {
                        if let Err(restore_err) = product_repo.increase_inventory(pid, *qty).await {
                            tracing::error!(
                                product = %pid,
                                error = %restore_err,
                                "Failed to restore inventory while unwinding order creation"
                            );
                        }
                    }
                    self.delete_order_cascade(&order_id).await?;
                    return Err(e);
                }
            }
        }

        cart_repo.clear(user).await?;

        tracing::info!(
            order_number = %created.order_number,
            user = %user,
            final_amount = created.final_amount,
            "Order created"
        );

        Ok(OrderView {
            order: created,
            items,
        })
    }

    async fn insert_order(&self, order: Order) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE orders SET
                    order_number = $order_number,
                    user = $user,
                    status = $status,
                    payment_status = $payment_status,
                    total_amount = $total_amount,
                    discount_amount = $discount_amount,
                    tax_amount = $tax_amount,
                    shipping_charge = $shipping_charge,
                    final_amount = $final_amount,
                    shipping_address = $shipping_address,
                    billing_address = $billing_address,
                    payment_method = $payment_method,
                    payment_id = $payment_id,
                    transaction_id = $transaction_id,
                    assigned_shg = $assigned_shg,
                    delivery_boy = $delivery_boy,
                    version = 0,
                    order_date = $order_date,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("order_number", order.order_number))
            .bind(("user", order.user))
            .bind(("status", order.status))
            .bind(("payment_status", order.payment_status))
            .bind(("total_amount", order.total_amount))
            .bind(("discount_amount", order.discount_amount))
            .bind(("tax_amount", order.tax_amount))
            .bind(("shipping_charge", order.shipping_charge))
            .bind(("final_amount", order.final_amount))
            .bind(("shipping_address", order.shipping_address))
            .bind(("billing_address", order.billing_address))
            .bind(("payment_method", order.payment_method))
            .bind(("payment_id", order.payment_id))
            .bind(("transaction_id", order.transaction_id))
            .bind(("assigned_shg", order.assigned_shg))
            .bind(("delivery_boy", order.delivery_boy))
            .bind(("order_date", order.order_date))
            .bind(("updated_at", order.updated_at))
            .await?;

        let created: Option<Order> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    async fn insert_order_item(&self, item: OrderItem) -> RepoResult<OrderItem> {
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE order_item SET
                    order_id = $order_id,
                    product = $product,
                    product_name = $product_name,
                    product_description = $product_description,
                    price_at_add = $price_at_add,
                    quantity = $quantity,
                    ingredients = $ingredients,
                    oil_type = $oil_type,
                    customization_notes = $customization_notes,
                    total_price = $total_price
                RETURN AFTER"#,
            )
            .bind(("order_id", item.order_id))
            .bind(("product", item.product))
            .bind(("product_name", item.product_name))
            .bind(("product_description", item.product_description))
            .bind(("price_at_add", item.price_at_add))
            .bind(("quantity", item.quantity as i64))
            .bind(("ingredients", item.ingredients))
            .bind(("oil_type", item.oil_type))
            .bind(("customization_notes", item.customization_notes))
            .bind(("total_price", item.total_price))
            .await?;

        let created: Option<OrderItem> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create order item".to_string()))
    }

    async fn delete_order_cascade(&self, order_id: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE order_item WHERE order_id = $order")
            .bind(("order", order_id.clone()))
            .await?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", order_id.clone()))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let thing = parse_record_id_for(ORDER_TABLE, id)?;
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    pub async fn find_by_order_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let number = order_number.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE order_number = $number LIMIT 1")
            .bind(("number", number))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Line items of an order
    pub async fn items(&self, order_id: &RecordId) -> RepoResult<Vec<OrderItem>> {
        let items: Vec<OrderItem> = self
            .base
            .db()
            .query("SELECT * FROM order_item WHERE order_id = $order")
            .bind(("order", order_id.clone()))
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Order plus its line items
    pub async fn view(&self, id: &str) -> RepoResult<OrderView> {
        let order = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;
        let order_id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Order row without id".to_string()))?;
        let items = self.items(&order_id).await?;
        Ok(OrderView { order, items })
    }

    /// Caller's orders, newest first
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE user = $user ORDER BY order_date DESC")
            .bind(("user", user.clone()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Page of the caller's orders (1-based page)
    pub async fn find_by_user_page(
        &self,
        user: &RecordId,
        page: u32,
        per_page: u32,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let start = page.saturating_sub(1) * per_page;
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM orders WHERE user = $user ORDER BY order_date DESC LIMIT $limit START $start",
            )
            .query("SELECT count() FROM orders WHERE user = $user GROUP ALL")
            .bind(("user", user.clone()))
            .bind(("limit", per_page as i64))
            .bind(("start", start as i64))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        Ok((orders, counts.first().map(|c| c.count).unwrap_or(0)))
    }

    /// All orders, newest first (admin)
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders ORDER BY order_date DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Page of all orders (admin, 1-based page)
    pub async fn find_all_page(&self, page: u32, per_page: u32) -> RepoResult<(Vec<Order>, u64)> {
        let start = page.saturating_sub(1) * per_page;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM orders ORDER BY order_date DESC LIMIT $limit START $start")
            .query("SELECT count() FROM orders GROUP ALL")
            .bind(("limit", per_page as i64))
            .bind(("start", start as i64))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        Ok((orders, counts.first().map(|c| c.count).unwrap_or(0)))
    }

    pub async fn find_by_status(&self, status: OrderStatus) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE status = $status ORDER BY order_date DESC")
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders assigned to an SHG Didi
    pub async fn find_assigned_to_shg(&self, user: &RecordId) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE assigned_shg = $user ORDER BY order_date DESC")
            .bind(("user", user.clone()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders assigned to a delivery agent
    pub async fn find_assigned_to_delivery(&self, user: &RecordId) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE delivery_boy = $user ORDER BY order_date DESC")
            .bind(("user", user.clone()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Version-guarded single-order update; empty result means the read
    /// version lost a race and the caller must retry
    fn guarded_update<'a>(
        &'a self,
        order: &Order,
        set_clause: &str,
    ) -> RepoResult<surrealdb::method::Query<'a, Db>> {
        let thing = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Order row without id".to_string()))?;
        let query_str = format!(
            "UPDATE $thing SET {set_clause}, updated_at = $now, version = version + 1 WHERE version = $version RETURN AFTER"
        );
        Ok(self
            .base
            .db()
            .query(query_str)
            .bind(("thing", thing))
            .bind(("now", Utc::now().timestamp()))
            .bind(("version", order.version)))
    }

    fn conflict() -> RepoError {
        RepoError::Conflict("Order was modified concurrently, please retry".to_string())
    }

    /// Direct status write (admin operation)
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let order = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;

        let mut result = self
            .guarded_update(&order, "status = $status")?
            .bind(("status", status))
            .await?;
        result.take::<Option<Order>>(0)?.ok_or_else(Self::conflict)
    }

    /// Cancel an order
    ///
    /// Only the owning user may cancel, and only before the order has
    /// shipped. Every line's inventory is restored after the status
    /// flips to CANCELLED / REFUNDED.
    pub async fn cancel(&self, id: &str, caller: &RecordId) -> RepoResult<Order> {
        let order = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))?;

        if order.user != *caller {
            return Err(RepoError::BusinessRule(
                "Not authorized to cancel this order".to_string(),
            ));
        }
        if !order.status.is_cancellable() {
            return Err(RepoError::BusinessRule(
                "Cannot cancel order after it has been shipped".to_string(),
            ));
        }

        let mut result = self
            .guarded_update(&order, "status = $status, payment_status = $payment_status")?
            .bind(("status", OrderStatus::Cancelled))
            .bind(("payment_status", PaymentStatus::Refunded))
            .await?;
        let updated: Order = result.take::<Option<Order>>(0)?.ok_or_else(Self::conflict)?;

        self.restore_inventory(&updated).await?;

        tracing::info!(order_number = %updated.order_number, "Order cancelled");
        Ok(updated)
    }

    /// Restore stock for every line of an order; a line whose product
    /// has since been deleted is skipped
    async fn restore_inventory(&self, order: &Order) -> RepoResult<()> {
        let order_id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Order row without id".to_string()))?;
        let product_repo = self.product_repo();

        for item in self.items(&order_id).await? {
            match product_repo
                .increase_inventory(&item.product.to_string(), item.quantity)
                .await
            {
                Ok(_) => {}
                Err(RepoError::NotFound(_)) => {
                    tracing::warn!(
                        product = %item.product,
                        "Product missing during inventory restore, skipping"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> RepoResult<Order> {
        let pid = payment_id.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE payment_id = $pid LIMIT 1")
            .bind(("pid", pid))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders.into_iter().next().ok_or_else(|| {
            RepoError::NotFound(format!("Order not found for payment ID: {}", payment_id))
        })
    }

    /// Payment-gateway success callback: CONFIRMED / SUCCESS
    pub async fn payment_success(
        &self,
        payment_id: &str,
        transaction_id: &str,
    ) -> RepoResult<Order> {
        let order = self.find_by_payment_id(payment_id).await?;

        let mut result = self
            .guarded_update(
                &order,
                "status = $status, payment_status = $payment_status, transaction_id = $transaction_id",
            )?
            .bind(("status", OrderStatus::Confirmed))
            .bind(("payment_status", PaymentStatus::Success))
            .bind(("transaction_id", transaction_id.to_string()))
            .await?;
        let updated: Order = result.take::<Option<Order>>(0)?.ok_or_else(Self::conflict)?;

        tracing::info!(order_number = %updated.order_number, "Payment succeeded");
        Ok(updated)
    }

    /// Payment-gateway failure callback: FAILED on both tracks, with
    /// inventory restored — a failed payment is treated like a
    /// cancellation
    pub async fn payment_failure(&self, payment_id: &str) -> RepoResult<Order> {
        let order = self.find_by_payment_id(payment_id).await?;

        let mut result = self
            .guarded_update(&order, "status = $status, payment_status = $payment_status")?
            .bind(("status", OrderStatus::Failed))
            .bind(("payment_status", PaymentStatus::Failed))
            .await?;
        let updated: Order = result.take::<Option<Order>>(0)?.ok_or_else(Self::conflict)?;

        self.restore_inventory(&updated).await?;

        tracing::warn!(order_number = %updated.order_number, "Payment failed, inventory restored");
        Ok(updated)
    }

    /// Assign an order to an SHG Didi for fulfilment
    ///
    /// The target user's role must be SHG_DIDI. Assignment force-moves
    /// the status to PROCESSING regardless of its current value.
    pub async fn assign_to_shg(&self, order_id: &str, shg_user_id: &str) -> RepoResult<Order> {
        let shg = self.load_user_with_role(shg_user_id, Role::ShgDidi).await?;
        self.assign(order_id, "assigned_shg", shg, OrderStatus::Processing)
            .await
    }

    /// Assign an order to a delivery agent
    ///
    /// The target user's role must be DELIVERY_BOY. Assignment
    /// force-moves the status to OUT_FOR_DELIVERY.
    pub async fn assign_to_delivery(
        &self,
        order_id: &str,
        delivery_user_id: &str,
    ) -> RepoResult<Order> {
        let agent = self
            .load_user_with_role(delivery_user_id, Role::DeliveryBoy)
            .await?;
        self.assign(order_id, "delivery_boy", agent, OrderStatus::OutForDelivery)
            .await
    }

    async fn load_user_with_role(&self, user_id: &str, expected: Role) -> RepoResult<RecordId> {
        let thing = parse_record_id_for("user", user_id)?;
        let user: Option<User> = self.base.db().select(thing.clone()).await?;
        let user =
            user.ok_or_else(|| RepoError::NotFound(format!("User {} not found", user_id)))?;
        if user.role != expected {
            return Err(RepoError::BusinessRule(format!(
                "User is not a {}",
                expected
            )));
        }
        Ok(thing)
    }

    async fn assign(
        &self,
        order_id: &str,
        field: &str,
        assignee: RecordId,
        forced_status: OrderStatus,
    ) -> RepoResult<Order> {
        let order = self
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))?;

        let set_clause = format!("{field} = $assignee, status = $status");
        let mut result = self
            .guarded_update(&order, &set_clause)?
            .bind(("assignee", assignee))
            .bind(("status", forced_status))
            .await?;
        let updated: Order = result.take::<Option<Order>>(0)?.ok_or_else(Self::conflict)?;

        tracing::info!(
            order_number = %updated.order_number,
            assignee_field = field,
            "Order assigned"
        );
        Ok(updated)
    }
}
