//! End-to-end order lifecycle tests against an in-memory database:
//! cart → order → inventory movement → cancellation / payment
//! callbacks / assignment.

use surrealdb::engine::local::{Db, Mem};
use surrealdb::{RecordId, Surreal};

use market_server::db::models::{
    Address, CartItemAdd, OrderCreateRequest, OrderStatus, PaymentStatus, ProductCreate,
};
use market_server::db::repository::{
    CartRepository, OrderRepository, ProductRepository, RepoError, UserRepository,
};
use shared::client::SignupRequest;

const SHIPPING: f64 = 40.0;

async fn test_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    db
}

fn customer(key: &str) -> RecordId {
    RecordId::from_table_key("user", key)
}

fn address() -> Address {
    Address {
        street_address: "12 Gomti Nagar".to_string(),
        city: "Lucknow".to_string(),
        state: "UP".to_string(),
        postal_code: "226010".to_string(),
        country: "India".to_string(),
        landmark: None,
        contact_number: Some("+911234567890".to_string()),
        recipient_name: Some("Asha".to_string()),
    }
}

fn checkout() -> OrderCreateRequest {
    OrderCreateRequest {
        shipping_address: address(),
        billing_address: None,
        payment_method: Some("UPI".to_string()),
        payment_id: None,
        shipping_charge: Some(SHIPPING),
    }
}

async fn seed_product(db: &Surreal<Db>, name: &str, price: f64, stock: i32) -> String {
    ProductRepository::new(db.clone())
        .create(
            ProductCreate {
                name: name.to_string(),
                category: "Achar".to_string(),
                price,
                stock,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap()
        .id
        .unwrap()
        .to_string()
}

async fn add_to_cart(db: &Surreal<Db>, user: &RecordId, product: &str, qty: i32) {
    CartRepository::new(db.clone())
        .add_item(
            user,
            CartItemAdd {
                product_id: product.to_string(),
                quantity: qty,
                customization_notes: None,
            },
        )
        .await
        .unwrap();
}

async fn stock_of(db: &Surreal<Db>, product: &str) -> i32 {
    ProductRepository::new(db.clone())
        .find_by_id(product)
        .await
        .unwrap()
        .unwrap()
        .stock
}

#[tokio::test]
async fn create_then_cancel_restores_inventory() {
    let db = test_db().await;
    let user = customer("asha");
    let product = seed_product(&db, "Mango Achar", 150.0, 5).await;
    add_to_cart(&db, &user, &product, 3).await;

    let orders = OrderRepository::new(db.clone());
    let view = orders.create_from_cart(&user, checkout(), SHIPPING).await.unwrap();

    assert_eq!(view.order.status, OrderStatus::Pending);
    assert_eq!(view.order.payment_status, PaymentStatus::Pending);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.order.total_amount, 450.0);
    assert_eq!(view.order.final_amount, 490.0);
    assert_eq!(stock_of(&db, &product).await, 2);

    let order_id = view.order.id.as_ref().unwrap().to_string();
    let cancelled = orders.cancel(&order_id, &user).await.unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
    assert_eq!(stock_of(&db, &product).await, 5);
}

#[tokio::test]
async fn empty_cart_cannot_checkout() {
    let db = test_db().await;
    let user = customer("asha");

    let err = OrderRepository::new(db)
        .create_from_cart(&user, checkout(), SHIPPING)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::BusinessRule(_)));
}

#[tokio::test]
async fn insufficient_stock_on_any_line_leaves_nothing_mutated() {
    let db = test_db().await;
    let user = customer("asha");
    let plenty = seed_product(&db, "Mango Achar", 100.0, 10).await;
    let scarce = seed_product(&db, "Lemon Achar", 80.0, 5).await;

    add_to_cart(&db, &user, &plenty, 2).await;
    add_to_cart(&db, &user, &scarce, 5).await;

    // The race: someone buys up the scarce product after it entered the cart
    ProductRepository::new(db.clone())
        .decrease_inventory(&scarce, 4)
        .await
        .unwrap();

    let orders = OrderRepository::new(db.clone());
    let err = orders
        .create_from_cart(&user, checkout(), SHIPPING)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::BusinessRule(_)));

    // No partial mutation: stock untouched, no orders, cart intact
    assert_eq!(stock_of(&db, &plenty).await, 10);
    assert_eq!(stock_of(&db, &scarce).await, 1);
    assert!(orders.find_by_user(&user).await.unwrap().is_empty());

    let cart_view = CartRepository::new(db).view(&user).await.unwrap();
    assert_eq!(cart_view.items.len(), 2);
}

#[tokio::test]
async fn cart_is_cleared_after_checkout() {
    let db = test_db().await;
    let user = customer("asha");
    let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
    add_to_cart(&db, &user, &product, 2).await;

    OrderRepository::new(db.clone())
        .create_from_cart(&user, checkout(), SHIPPING)
        .await
        .unwrap();

    let cart_view = CartRepository::new(db).view(&user).await.unwrap();
    assert!(cart_view.items.is_empty());
    assert_eq!(cart_view.total, 0.0);
}

#[tokio::test]
async fn cancellation_window_closes_at_shipped() {
    let db = test_db().await;
    let user = customer("asha");
    let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
    add_to_cart(&db, &user, &product, 2).await;

    let orders = OrderRepository::new(db.clone());
    let view = orders.create_from_cart(&user, checkout(), SHIPPING).await.unwrap();
    let order_id = view.order.id.as_ref().unwrap().to_string();

    orders
        .update_status(&order_id, OrderStatus::Shipped)
        .await
        .unwrap();

    let err = orders.cancel(&order_id, &user).await.unwrap_err();
    assert!(matches!(err, RepoError::BusinessRule(_)));
    // Inventory stays committed to the shipped order
    assert_eq!(stock_of(&db, &product).await, 8);
}

#[tokio::test]
async fn only_the_owner_may_cancel() {
    let db = test_db().await;
    let owner = customer("asha");
    let stranger = customer("mallory");
    let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
    add_to_cart(&db, &owner, &product, 1).await;

    let orders = OrderRepository::new(db);
    let view = orders.create_from_cart(&owner, checkout(), SHIPPING).await.unwrap();
    let order_id = view.order.id.as_ref().unwrap().to_string();

    let err = orders.cancel(&order_id, &stranger).await.unwrap_err();
    assert!(matches!(err, RepoError::BusinessRule(_)));
}

#[tokio::test]
async fn payment_callbacks_drive_the_lifecycle() {
    let db = test_db().await;
    let user = customer("asha");
    let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
    add_to_cart(&db, &user, &product, 4).await;

    let orders = OrderRepository::new(db.clone());
    let mut request = checkout();
    request.payment_id = Some("pay_789".to_string());
    orders.create_from_cart(&user, request, SHIPPING).await.unwrap();
    assert_eq!(stock_of(&db, &product).await, 6);

    let confirmed = orders.payment_success("pay_789", "txn_001").await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.payment_status, PaymentStatus::Success);
    assert_eq!(confirmed.transaction_id.as_deref(), Some("txn_001"));

    // A later failure report flips the order and hands the stock back
    let failed = orders.payment_failure("pay_789").await.unwrap();
    assert_eq!(failed.status, OrderStatus::Failed);
    assert_eq!(failed.payment_status, PaymentStatus::Failed);
    assert_eq!(stock_of(&db, &product).await, 10);
}

#[tokio::test]
async fn unknown_payment_id_is_not_found() {
    let db = test_db().await;
    let err = OrderRepository::new(db)
        .payment_success("pay_unknown", "txn")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn assignment_validates_roles_and_forces_status() {
    let db = test_db().await;
    let buyer = customer("asha");
    let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
    add_to_cart(&db, &buyer, &product, 1).await;

    // Real user rows so role checks have something to look at
    let users = UserRepository::new(db.clone());
    let didi = users
        .signup(
            SignupRequest {
                name: "Sita Devi".to_string(),
                email: "sita@example.com".to_string(),
                password: "pickle-secret-1".to_string(),
                role: "SHG_DIDI".to_string(),
                phone_number: None,
                dob: None,
                address: None,
                profile_pic: None,
            },
            15,
        )
        .await
        .unwrap();
    let runner = users
        .signup(
            SignupRequest {
                name: "Ram".to_string(),
                email: "ram@example.com".to_string(),
                password: "pickle-secret-2".to_string(),
                role: "DELIVERY_BOY".to_string(),
                phone_number: None,
                dob: None,
                address: None,
                profile_pic: None,
            },
            15,
        )
        .await
        .unwrap();

    let didi_id = didi.id.unwrap().to_string();
    let runner_id = runner.id.unwrap().to_string();

    let orders = OrderRepository::new(db);
    let view = orders.create_from_cart(&buyer, checkout(), SHIPPING).await.unwrap();
    let order_id = view.order.id.as_ref().unwrap().to_string();

    // Wrong role is rejected
    let err = orders.assign_to_shg(&order_id, &runner_id).await.unwrap_err();
    assert!(matches!(err, RepoError::BusinessRule(_)));

    let processing = orders.assign_to_shg(&order_id, &didi_id).await.unwrap();
    assert_eq!(processing.status, OrderStatus::Processing);
    assert!(processing.assigned_shg.is_some());

    let out = orders.assign_to_delivery(&order_id, &runner_id).await.unwrap();
    assert_eq!(out.status, OrderStatus::OutForDelivery);
    assert!(out.delivery_boy.is_some());

    // Assigned-order queries see them
    let didi_rid: RecordId = didi_id.parse().unwrap();
    assert_eq!(orders.find_assigned_to_shg(&didi_rid).await.unwrap().len(), 1);
}

#[tokio::test]
async fn order_number_shape_and_version_bump() {
    let db = test_db().await;
    let user = customer("asha");
    let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
    add_to_cart(&db, &user, &product, 1).await;

    let orders = OrderRepository::new(db);
    let view = orders.create_from_cart(&user, checkout(), SHIPPING).await.unwrap();

    let number = &view.order.order_number;
    assert!(number.starts_with("ORD-"), "got {number}");
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert!(parts[1].parse::<i32>().is_ok());
    assert!(parts[2].parse::<u32>().is_ok());

    assert_eq!(view.order.version, 0);
    let order_id = view.order.id.as_ref().unwrap().to_string();
    let updated = orders
        .update_status(&order_id, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(updated.version, 1);
}

#[tokio::test]
async fn order_items_snapshot_survives_catalog_edits() {
    let db = test_db().await;
    let user = customer("asha");
    let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
    add_to_cart(&db, &user, &product, 2).await;

    let orders = OrderRepository::new(db.clone());
    let view = orders.create_from_cart(&user, checkout(), SHIPPING).await.unwrap();
    let order_id = view.order.id.as_ref().unwrap().to_string();

    // Rename and reprice the product after checkout
    ProductRepository::new(db)
        .update(
            &product,
            market_server::db::models::ProductUpdate {
                name: Some("Premium Mango Achar".to_string()),
                price: Some(999.0),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let fresh = orders.view(&order_id).await.unwrap();
    assert_eq!(fresh.items[0].product_name, "Mango Achar");
    assert_eq!(fresh.items[0].price_at_add, 100.0);
    assert_eq!(fresh.items[0].total_price, 200.0);
}
