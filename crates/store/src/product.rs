use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    sqlx::{FromRow, QueryBuilder, Sqlite},
    uuid::Uuid,
};

use crate::{db::Store, error::StoreError};

// ── Models ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
}

impl ProductSort {
    fn order_clause(self) -> &'static str {
        match self {
            Self::PriceAsc => "price ASC",
            Self::PriceDesc => "price DESC",
            Self::Newest => "created_at DESC",
        }
    }
}

/// Listing parameters, straight off the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    #[serde(default)]
    pub sort: ProductSort,
    /// Category filter.
    pub filter: Option<String>,
    /// Case-insensitive title substring match.
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
}

#[derive(FromRow)]
struct ProductRow {
    id: String,
    title: String,
    description: String,
    price: f64,
    category: String,
    images: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            category: row.category,
            images: serde_json::from_str(&row.images)?,
            created_at: row.created_at,
        })
    }
}

// ── Queries ──────────────────────────────────────────────────────────────────

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

impl Store {
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            price: new.price,
            category: new.category,
            images: new.images,
            created_at: Utc::now(),
        };
        let images_json = serde_json::to_string(&product.images)?;

        sqlx::query(
            "INSERT INTO products (id, title, description, price, category, images, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&images_json)
        .bind(product.created_at)
        .execute(self.pool())
        .await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn product_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(Product::try_from).transpose()
    }

    /// Paged listing with optional category filter and title substring match.
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, StoreError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let skip = query.skip.unwrap_or(0);

        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
        let mut select: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM products WHERE 1=1");

        for builder in [&mut count, &mut select] {
            if let Some(category) = query.filter.as_deref().filter(|s| !s.is_empty()) {
                builder.push(" AND category = ").push_bind(category.to_owned());
            }
            if let Some(title) = query.title.as_deref().filter(|s| !s.is_empty()) {
                builder
                    .push(" AND title LIKE ")
                    .push_bind(format!("%{title}%"));
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        select
            .push(" ORDER BY ")
            .push(query.sort.order_clause())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(skip);

        let rows: Vec<ProductRow> = select
            .build_query_as()
            .fetch_all(self.pool())
            .await?;
        let items = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductPage { items, total })
    }
}
