//! Product Repository
//!
//! Catalog CRUD plus the inventory guards: stock can never go
//! negative, and availability tracks stock and expiry on every write.

use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id_for};
use crate::db::models::{Product, ProductCreate, ProductUpdate};

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all products
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find a page of products (1-based page)
    pub async fn find_page(&self, page: u32, per_page: u32) -> RepoResult<(Vec<Product>, u64)> {
        let start = page.saturating_sub(1) * per_page;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY name LIMIT $limit START $start")
            .query("SELECT count() FROM product GROUP ALL")
            .bind(("limit", per_page as i64))
            .bind(("start", start as i64))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);
        Ok((products, total))
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let thing = parse_record_id_for(PRODUCT_TABLE, id)?;
        let product: Option<Product> = self.base.db().select(thing).await?;
        Ok(product)
    }

    /// Find products by category, case-insensitive
    pub async fn find_by_category(&self, category: &str) -> RepoResult<Vec<Product>> {
        let needle = category.to_lowercase();
        let products: Vec<Product> = self
            .base
            .db()
            .query(
                "SELECT * FROM product WHERE string::lowercase(category) = $category ORDER BY name",
            )
            .bind(("category", needle))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find available products only
    pub async fn find_available(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_available = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find products with at least the given discount percentage
    pub async fn find_discounted(&self, min_discount: f64) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE discount >= $min ORDER BY discount DESC")
            .bind(("min", min_discount))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate, image: Option<String>) -> RepoResult<Product> {
        if data.price < 0.0 {
            return Err(RepoError::Validation("price must be non-negative".into()));
        }
        if data.stock < 0 {
            return Err(RepoError::Validation("stock must be non-negative".into()));
        }

        let mut product = Product::from_create(data, image);
        product
            .validate_and_sync(Utc::now().date_naive())
            .map_err(RepoError::Validation)?;

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE product SET
                    name = $name,
                    category = $category,
                    description = $description,
                    brand = $brand,
                    price = $price,
                    stock = $stock,
                    is_available = $is_available,
                    discount = $discount,
                    expiry_date = $expiry_date,
                    manufacturing_date = $manufacturing_date,
                    image = $image,
                    qr_code = $qr_code,
                    amount = $amount,
                    oil_type = $oil_type,
                    ingredients = $ingredients,
                    is_customizable = $is_customizable,
                    created_at = $created_at,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("name", product.name))
            .bind(("category", product.category))
            .bind(("description", product.description))
            .bind(("brand", product.brand))
            .bind(("price", product.price))
            .bind(("stock", product.stock))
            .bind(("is_available", product.is_available))
            .bind(("discount", product.discount))
            .bind(("expiry_date", product.expiry_date))
            .bind(("manufacturing_date", product.manufacturing_date))
            .bind(("image", product.image))
            .bind(("qr_code", product.qr_code))
            .bind(("amount", product.amount))
            .bind(("oil_type", product.oil_type))
            .bind(("ingredients", product.ingredients))
            .bind(("is_customizable", product.is_customizable))
            .bind(("created_at", product.created_at))
            .bind(("updated_at", product.updated_at))
            .await?;

        let created: Option<Product> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product; the merged record is re-validated before the write
    pub async fn update(
        &self,
        id: &str,
        data: ProductUpdate,
        image: Option<String>,
    ) -> RepoResult<Product> {
        let thing = parse_record_id_for(PRODUCT_TABLE, id)?;
        let mut merged = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        if let Some(v) = data.name {
            merged.name = v;
        }
        if let Some(v) = data.category {
            merged.category = v;
        }
        if let Some(v) = data.description {
            merged.description = Some(v);
        }
        if let Some(v) = data.brand {
            merged.brand = Some(v);
        }
        if let Some(v) = data.price {
            if v < 0.0 {
                return Err(RepoError::Validation("price must be non-negative".into()));
            }
            merged.price = v;
        }
        if let Some(v) = data.stock {
            if v < 0 {
                return Err(RepoError::Validation("stock must be non-negative".into()));
            }
            merged.stock = v;
        }
        if let Some(v) = data.available {
            merged.is_available = v;
        }
        if let Some(v) = data.discount {
            merged.discount = v;
        }
        if let Some(v) = data.expiry_date {
            merged.expiry_date = Some(v);
        }
        if let Some(v) = data.manufacturing_date {
            merged.manufacturing_date = Some(v);
        }
        if let Some(v) = data.qr_code {
            merged.qr_code = Some(v);
        }
        if let Some(v) = data.amount {
            merged.amount = Some(v);
        }
        if let Some(v) = data.oil_type {
            merged.oil_type = Some(v);
        }
        if let Some(v) = data.ingredients {
            merged.ingredients = v;
        }
        if let Some(v) = data.is_customizable {
            merged.is_customizable = v;
        }
        if let Some(v) = image {
            merged.image = Some(v);
        }

        merged
            .validate_and_sync(Utc::now().date_naive())
            .map_err(RepoError::Validation)?;
        merged.updated_at = Utc::now().timestamp();

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name,
                    category = $category,
                    description = $description,
                    brand = $brand,
                    price = $price,
                    stock = $stock,
                    is_available = $is_available,
                    discount = $discount,
                    expiry_date = $expiry_date,
                    manufacturing_date = $manufacturing_date,
                    image = $image,
                    qr_code = $qr_code,
                    amount = $amount,
                    oil_type = $oil_type,
                    ingredients = $ingredients,
                    is_customizable = $is_customizable,
                    updated_at = $updated_at
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", merged.name))
            .bind(("category", merged.category))
            .bind(("description", merged.description))
            .bind(("brand", merged.brand))
            .bind(("price", merged.price))
            .bind(("stock", merged.stock))
            .bind(("is_available", merged.is_available))
            .bind(("discount", merged.discount))
            .bind(("expiry_date", merged.expiry_date))
            .bind(("manufacturing_date", merged.manufacturing_date))
            .bind(("image", merged.image))
            .bind(("qr_code", merged.qr_code))
            .bind(("amount", merged.amount))
            .bind(("oil_type", merged.oil_type))
            .bind(("ingredients", merged.ingredients))
            .bind(("is_customizable", merged.is_customizable))
            .bind(("updated_at", merged.updated_at))
            .await?;

        result
            .take::<Option<Product>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Adjust stock by a signed delta; the result must stay non-negative
    pub async fn update_stock(&self, id: &str, delta: i32) -> RepoResult<Product> {
        let product = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        let new_stock = product.stock + delta;
        if new_stock < 0 {
            return Err(RepoError::BusinessRule(
                "Stock quantity cannot be negative".to_string(),
            ));
        }

        if delta < 0 {
            self.decrease_inventory(id, -delta).await
        } else {
            self.increase_inventory(id, delta).await
        }
    }

    /// Flip the availability flag
    pub async fn toggle_availability(&self, id: &str) -> RepoResult<Product> {
        let thing = parse_record_id_for(PRODUCT_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET is_available = !is_available, updated_at = $now RETURN AFTER",
            )
            .bind(("thing", thing))
            .bind(("now", Utc::now().timestamp()))
            .await?;
        result
            .take::<Option<Product>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Guarded stock decrement
    ///
    /// Fails without touching the row when `qty` exceeds current stock;
    /// exact depletion to zero flips availability false. The guard runs
    /// inside the database so concurrent decrements cannot drive stock
    /// negative.
    pub async fn decrease_inventory(&self, id: &str, qty: i32) -> RepoResult<Product> {
        if qty <= 0 {
            return Err(RepoError::Validation("quantity must be positive".into()));
        }
        let thing = parse_record_id_for(PRODUCT_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    is_available = (stock - $qty) > 0,
                    stock = stock - $qty,
                    updated_at = $now
                WHERE stock >= $qty
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("qty", qty as i64))
            .bind(("now", Utc::now().timestamp()))
            .await?;

        let updated: Option<Product> = result.take(0)?;
        match updated {
            Some(product) => Ok(product),
            None => {
                // Distinguish a missing row from an insufficient-stock guard
                let product = self
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;
                Err(RepoError::BusinessRule(format!(
                    "Insufficient stock for product: {} (requested {}, available {})",
                    product.name, qty, product.stock
                )))
            }
        }
    }

    /// Stock restore; availability returns as soon as stock is positive
    pub async fn increase_inventory(&self, id: &str, qty: i32) -> RepoResult<Product> {
        if qty < 0 {
            return Err(RepoError::Validation("quantity must be non-negative".into()));
        }
        let thing = parse_record_id_for(PRODUCT_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    is_available = (stock + $qty) > 0,
                    stock = stock + $qty,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("qty", qty as i64))
            .bind(("now", Utc::now().timestamp()))
            .await?;

        result
            .take::<Option<Product>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Hard delete a product
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let thing = parse_record_id_for(PRODUCT_TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ProductCreate;
    use surrealdb::engine::local::Mem;

    async fn test_repo() -> ProductRepository {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        ProductRepository::new(db)
    }

    fn achar(stock: i32) -> ProductCreate {
        ProductCreate {
            name: "Mango Achar".to_string(),
            category: "Achar".to_string(),
            price: 150.0,
            stock,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = test_repo().await;
        let created = repo.create(achar(5), None).await.unwrap();
        let id = created.id.as_ref().unwrap().to_string();

        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.name, "Mango Achar");
        assert_eq!(found.stock, 5);
        assert!(found.is_available);
    }

    #[tokio::test]
    async fn test_decrease_beyond_stock_fails_and_leaves_stock_unchanged() {
        let repo = test_repo().await;
        let created = repo.create(achar(5), None).await.unwrap();
        let id = created.id.as_ref().unwrap().to_string();

        let err = repo.decrease_inventory(&id, 6).await.unwrap_err();
        assert!(matches!(err, RepoError::BusinessRule(_)));

        let after = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(after.stock, 5);
        assert!(after.is_available);
    }

    #[tokio::test]
    async fn test_exact_depletion_flips_availability() {
        let repo = test_repo().await;
        let created = repo.create(achar(3), None).await.unwrap();
        let id = created.id.as_ref().unwrap().to_string();

        let after = repo.decrease_inventory(&id, 3).await.unwrap();
        assert_eq!(after.stock, 0);
        assert!(!after.is_available);

        let restored = repo.increase_inventory(&id, 2).await.unwrap();
        assert_eq!(restored.stock, 2);
        assert!(restored.is_available);
    }

    #[tokio::test]
    async fn test_stock_never_negative_across_sequences() {
        let repo = test_repo().await;
        let created = repo.create(achar(4), None).await.unwrap();
        let id = created.id.as_ref().unwrap().to_string();

        repo.decrease_inventory(&id, 2).await.unwrap();
        repo.increase_inventory(&id, 1).await.unwrap();
        repo.decrease_inventory(&id, 3).await.unwrap();
        assert!(repo.decrease_inventory(&id, 1).await.is_err());

        let after = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(after.stock, 0);
    }

    #[tokio::test]
    async fn test_expiry_before_manufacture_rejected_on_create() {
        let repo = test_repo().await;
        let mut data = achar(5);
        data.manufacturing_date = Some("2026-06-01".to_string());
        data.expiry_date = Some("2026-01-01".to_string());
        assert!(matches!(
            repo.create(data, None).await,
            Err(RepoError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_past_expiry_forces_unavailable_on_write() {
        let repo = test_repo().await;
        let mut data = achar(5);
        data.manufacturing_date = Some("2020-01-01".to_string());
        data.expiry_date = Some("2020-06-01".to_string());
        let created = repo.create(data, None).await.unwrap();
        assert!(!created.is_available);
    }

    #[tokio::test]
    async fn test_category_filter_is_case_insensitive() {
        let repo = test_repo().await;
        repo.create(achar(5), None).await.unwrap();

        let found = repo.find_by_category("aChAr").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo.find_by_category("papad").await.unwrap().is_empty());
    }
}
