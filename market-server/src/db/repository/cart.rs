//! Cart Repository
//!
//! Per-user cart maintenance. A product appears at most once per cart;
//! its price is captured at first insertion and never recalculated by
//! later catalog changes.

use chrono::Utc;
use rust_decimal::Decimal;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id_for};
use crate::db::models::{Cart, CartItem, CartItemAdd, CartView};
use crate::pricing::{line_total, to_f64};

const CART_TABLE: &str = "cart";
const CART_ITEM_TABLE: &str = "cart_item";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Return the user's cart, creating an empty one if absent
    pub async fn get_or_create(&self, user: &RecordId) -> RepoResult<Cart> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE user = $user LIMIT 1")
            .bind(("user", user.clone()))
            .await?;
        let carts: Vec<Cart> = result.take(0)?;
        if let Some(cart) = carts.into_iter().next() {
            return Ok(cart);
        }

        let fresh = Cart::new(user.clone());
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE cart SET
                    user = $user,
                    created_at = $created_at,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("user", fresh.user))
            .bind(("created_at", fresh.created_at))
            .bind(("updated_at", fresh.updated_at))
            .await?;
        let created: Option<Cart> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create cart".to_string()))
    }

    /// All lines of a cart
    pub async fn items(&self, cart_id: &RecordId) -> RepoResult<Vec<CartItem>> {
        let items: Vec<CartItem> = self
            .base
            .db()
            .query("SELECT * FROM cart_item WHERE cart = $cart ORDER BY added_at")
            .bind(("cart", cart_id.clone()))
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Add a product to the user's cart
    ///
    /// The product must exist, be available and have enough stock for
    /// the requested quantity. An existing line for the same product is
    /// incremented rather than duplicated; its frozen price is kept.
    pub async fn add_item(&self, user: &RecordId, data: CartItemAdd) -> RepoResult<CartView> {
        if data.quantity <= 0 {
            return Err(RepoError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let product_id = parse_record_id_for("product", &data.product_id)?;
        let product: Option<crate::db::models::Product> =
            self.base.db().select(product_id.clone()).await?;
        let product = product
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", data.product_id)))?;

        if !product.is_available {
            return Err(RepoError::BusinessRule(format!(
                "Product not available: {}",
                product.name
            )));
        }
        if product.stock < data.quantity {
            return Err(RepoError::BusinessRule(format!(
                "Insufficient stock for product: {} (requested {}, available {})",
                product.name, data.quantity, product.stock
            )));
        }

        let cart = self.get_or_create(user).await?;
        let cart_id = cart
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Cart row without id".to_string()))?;

        let mut result = self
            .base
            .db()
            .query("SELECT * FROM cart_item WHERE cart = $cart AND product = $product LIMIT 1")
            .bind(("cart", cart_id.clone()))
            .bind(("product", product_id.clone()))
            .await?;
        let existing: Vec<CartItem> = result.take(0)?;

        match existing.into_iter().next() {
            Some(line) => {
                let line_id = line
                    .id
                    .ok_or_else(|| RepoError::Database("Cart line without id".to_string()))?;
                // Quantity increments; price_at_add stays frozen
                self.base
                    .db()
                    .query("UPDATE $thing SET quantity = quantity + $qty")
                    .bind(("thing", line_id))
                    .bind(("qty", data.quantity as i64))
                    .await?;
            }
            None => {
                self.base
                    .db()
                    .query(
                        r#"CREATE cart_item SET
                            cart = $cart,
                            product = $product,
                            quantity = $quantity,
                            price_at_add = $price_at_add,
                            customization_notes = $notes,
                            added_at = $added_at"#,
                    )
                    .bind(("cart", cart_id.clone()))
                    .bind(("product", product_id))
                    .bind(("quantity", data.quantity as i64))
                    .bind(("price_at_add", product.price))
                    .bind(("notes", data.customization_notes))
                    .bind(("added_at", Utc::now().timestamp()))
                    .await?;
            }
        }

        self.touch(&cart_id).await?;
        self.view(user).await
    }

    /// Change a line's quantity (stock re-validated)
    pub async fn update_item_quantity(
        &self,
        user: &RecordId,
        item_id: &str,
        quantity: i32,
    ) -> RepoResult<CartView> {
        if quantity <= 0 {
            return Err(RepoError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let line = self.owned_line(user, item_id).await?;

        let product: Option<crate::db::models::Product> =
            self.base.db().select(line.product.clone()).await?;
        let product = product
            .ok_or_else(|| RepoError::NotFound("Product no longer exists".to_string()))?;
        if product.stock < quantity {
            return Err(RepoError::BusinessRule(format!(
                "Insufficient stock for product: {} (requested {}, available {})",
                product.name, quantity, product.stock
            )));
        }

        let line_id = line
            .id
            .ok_or_else(|| RepoError::Database("Cart line without id".to_string()))?;
        self.base
            .db()
            .query("UPDATE $thing SET quantity = $qty")
            .bind(("thing", line_id))
            .bind(("qty", quantity as i64))
            .await?;

        self.touch(&line.cart).await?;
        self.view(user).await
    }

    /// Remove one line
    pub async fn remove_item(&self, user: &RecordId, item_id: &str) -> RepoResult<CartView> {
        let line = self.owned_line(user, item_id).await?;
        let line_id = line
            .id
            .ok_or_else(|| RepoError::Database("Cart line without id".to_string()))?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", line_id))
            .await?;

        self.touch(&line.cart).await?;
        self.view(user).await
    }

    /// Drop every line of the user's cart
    pub async fn clear(&self, user: &RecordId) -> RepoResult<CartView> {
        let cart = self.get_or_create(user).await?;
        let cart_id = cart
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Cart row without id".to_string()))?;

        self.base
            .db()
            .query("DELETE cart_item WHERE cart = $cart")
            .bind(("cart", cart_id.clone()))
            .await?;

        self.touch(&cart_id).await?;
        self.view(user).await
    }

    /// Cart total: Σ price_at_add × quantity over all lines
    pub async fn total(&self, user: &RecordId) -> RepoResult<f64> {
        let cart = self.get_or_create(user).await?;
        let cart_id = cart
            .id
            .ok_or_else(|| RepoError::Database("Cart row without id".to_string()))?;
        let items = self.items(&cart_id).await?;

        let total: Decimal = items
            .iter()
            .map(|i| line_total(i.price_at_add, i.quantity))
            .sum();
        Ok(to_f64(total))
    }

    /// Full cart view: lines, quantity count and total
    pub async fn view(&self, user: &RecordId) -> RepoResult<CartView> {
        let cart = self.get_or_create(user).await?;
        let cart_id = cart
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Cart row without id".to_string()))?;
        let items = self.items(&cart_id).await?;

        let items_count = items.iter().map(|i| i.quantity).sum();
        let total: Decimal = items
            .iter()
            .map(|i| line_total(i.price_at_add, i.quantity))
            .sum();

        Ok(CartView {
            cart,
            items,
            items_count,
            total: to_f64(total),
        })
    }

    /// Fold another cart's lines into the caller's cart
    ///
    /// Shared products sum quantities (keeping the caller's frozen
    /// price); unique lines are copied with their own frozen price.
    /// Used when an anonymous/session cart is adopted after login.
    pub async fn merge(&self, user: &RecordId, other_cart_id: &str) -> RepoResult<CartView> {
        let other_id = parse_record_id_for(CART_TABLE, other_cart_id)?;
        let other: Option<Cart> = self.base.db().select(other_id.clone()).await?;
        other.ok_or_else(|| RepoError::NotFound(format!("Cart {} not found", other_cart_id)))?;

        let own = self.get_or_create(user).await?;
        let own_id = own
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Cart row without id".to_string()))?;
        if own_id == other_id {
            return self.view(user).await;
        }

        let own_items = self.items(&own_id).await?;
        let other_items = self.items(&other_id).await?;

        for incoming in other_items {
            let existing = own_items.iter().find(|i| i.product == incoming.product);
            match existing {
                Some(line) => {
                    let line_id = line.id.clone().ok_or_else(|| {
                        RepoError::Database("Cart line without id".to_string())
                    })?;
                    self.base
                        .db()
                        .query("UPDATE $thing SET quantity = quantity + $qty")
                        .bind(("thing", line_id))
                        .bind(("qty", incoming.quantity as i64))
                        .await?;
                }
                None => {
                    self.base
                        .db()
                        .query(
                            r#"CREATE cart_item SET
                                cart = $cart,
                                product = $product,
                                quantity = $quantity,
                                price_at_add = $price_at_add,
                                customization_notes = $notes,
                                added_at = $added_at"#,
                        )
                        .bind(("cart", own_id.clone()))
                        .bind(("product", incoming.product))
                        .bind(("quantity", incoming.quantity as i64))
                        .bind(("price_at_add", incoming.price_at_add))
                        .bind(("notes", incoming.customization_notes))
                        .bind(("added_at", Utc::now().timestamp()))
                        .await?;
                }
            }
        }

        self.touch(&own_id).await?;
        self.view(user).await
    }

    /// Load a cart line and prove it belongs to the caller's cart
    async fn owned_line(&self, user: &RecordId, item_id: &str) -> RepoResult<CartItem> {
        let line_id = parse_record_id_for(CART_ITEM_TABLE, item_id)?;
        let line: Option<CartItem> = self.base.db().select(line_id).await?;
        let line =
            line.ok_or_else(|| RepoError::NotFound(format!("Cart item {} not found", item_id)))?;

        let cart = self.get_or_create(user).await?;
        let cart_id = cart
            .id
            .ok_or_else(|| RepoError::Database("Cart row without id".to_string()))?;
        if line.cart != cart_id {
            return Err(RepoError::NotFound(format!(
                "Cart item {} not found",
                item_id
            )));
        }
        Ok(line)
    }

    async fn touch(&self, cart_id: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing SET updated_at = $now")
            .bind(("thing", cart_id.clone()))
            .bind(("now", Utc::now().timestamp()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ProductCreate;
    use crate::db::repository::ProductRepository;
    use surrealdb::engine::local::Mem;

    async fn test_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        db
    }

    fn user_id(key: &str) -> RecordId {
        RecordId::from_table_key("user", key)
    }

    async fn seed_product(db: &Surreal<Db>, name: &str, price: f64, stock: i32) -> String {
        let repo = ProductRepository::new(db.clone());
        let created = repo
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
            .unwrap();
        created.id.unwrap().to_string()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_db().await;
        let repo = CartRepository::new(db);
        let user = user_id("u1");

        let first = repo.get_or_create(&user).await.unwrap();
        let second = repo.get_or_create(&user).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_add_same_product_increments_line() {
        let db = test_db().await;
        let product = seed_product(&db, "Mango Achar", 150.0, 10).await;
        let repo = CartRepository::new(db);
        let user = user_id("u1");

        repo.add_item(
            &user,
            CartItemAdd {
                product_id: product.clone(),
                quantity: 2,
                customization_notes: None,
            },
        )
        .await
        .unwrap();
        let view = repo
            .add_item(
                &user,
                CartItemAdd {
                    product_id: product,
                    quantity: 3,
                    customization_notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
        assert_eq!(view.total, 750.0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_line_untouched() {
        let db = test_db().await;
        let product = seed_product(&db, "Mango Achar", 100.0, 5).await;
        let repo = CartRepository::new(db);
        let user = user_id("u1");

        repo.add_item(
            &user,
            CartItemAdd {
                product_id: product.clone(),
                quantity: 3,
                customization_notes: None,
            },
        )
        .await
        .unwrap();

        let err = repo
            .add_item(
                &user,
                CartItemAdd {
                    product_id: product,
                    quantity: 10,
                    customization_notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::BusinessRule(_)));

        let view = repo.view(&user).await.unwrap();
        assert_eq!(view.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_total_is_immune_to_later_price_changes() {
        let db = test_db().await;
        let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
        let product_repo = ProductRepository::new(db.clone());
        let repo = CartRepository::new(db);
        let user = user_id("u1");

        repo.add_item(
            &user,
            CartItemAdd {
                product_id: product.clone(),
                quantity: 2,
                customization_notes: None,
            },
        )
        .await
        .unwrap();

        // Catalog price doubles after the line was frozen
        product_repo
            .update(
                &product,
                crate::db::models::ProductUpdate {
                    price: Some(200.0),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(repo.total(&user).await.unwrap(), 200.0);
    }

    #[tokio::test]
    async fn test_update_quantity_rejects_non_positive() {
        let db = test_db().await;
        let product = seed_product(&db, "Mango Achar", 100.0, 10).await;
        let repo = CartRepository::new(db);
        let user = user_id("u1");

        let view = repo
            .add_item(
                &user,
                CartItemAdd {
                    product_id: product,
                    quantity: 1,
                    customization_notes: None,
                },
            )
            .await
            .unwrap();
        let item_id = view.items[0].id.as_ref().unwrap().to_string();

        assert!(repo.update_item_quantity(&user, &item_id, 0).await.is_err());
        assert!(repo.update_item_quantity(&user, &item_id, -2).await.is_err());
        let view = repo.update_item_quantity(&user, &item_id, 4).await.unwrap();
        assert_eq!(view.items[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let db = test_db().await;
        let p1 = seed_product(&db, "Mango Achar", 100.0, 10).await;
        let p2 = seed_product(&db, "Lemon Achar", 80.0, 10).await;
        let repo = CartRepository::new(db);
        let user = user_id("u1");

        for p in [p1, p2] {
            repo.add_item(
                &user,
                CartItemAdd {
                    product_id: p,
                    quantity: 1,
                    customization_notes: None,
                },
            )
            .await
            .unwrap();
        }

        let view = repo.clear(&user).await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total, 0.0);
    }

    #[tokio::test]
    async fn test_merge_sums_shared_and_copies_unique() {
        let db = test_db().await;
        let shared_product = seed_product(&db, "Mango Achar", 100.0, 20).await;
        let unique_product = seed_product(&db, "Lemon Achar", 80.0, 20).await;
        let repo = CartRepository::new(db);
        let owner = user_id("owner");
        let guest = user_id("guest");

        repo.add_item(
            &owner,
            CartItemAdd {
                product_id: shared_product.clone(),
                quantity: 2,
                customization_notes: None,
            },
        )
        .await
        .unwrap();

        repo.add_item(
            &guest,
            CartItemAdd {
                product_id: shared_product,
                quantity: 3,
                customization_notes: None,
            },
        )
        .await
        .unwrap();
        let guest_view = repo
            .add_item(
                &guest,
                CartItemAdd {
                    product_id: unique_product,
                    quantity: 1,
                    customization_notes: None,
                },
            )
            .await
            .unwrap();

        let guest_cart_id = guest_view.cart.id.unwrap().to_string();
        let merged = repo.merge(&owner, &guest_cart_id).await.unwrap();

        assert_eq!(merged.items.len(), 2);
        assert_eq!(merged.items_count, 6);
        // 5 × 100 + 1 × 80
        assert_eq!(merged.total, 580.0);
    }
}
