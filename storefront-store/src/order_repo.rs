use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use storefront_core::{OrderRepository, StoreError};
use storefront_shared::{
    Address, Money, Order, OrderDraft, OrderLineItem, OrderStatus, ProductPrice,
};

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct PriceRow {
    id: i64,
    price_minor: i64,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    country: String,
    region: String,
    city: String,
    street: String,
    house: String,
    flat: String,
    postal_index: String,
    cost_minor: i64,
    status: String,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i64,
    product_id: i64,
    quantity: i32,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLineItem>) -> Result<Order, StoreError> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            created_at: self.created_at,
            address: Address {
                country: self.country,
                region: self.region,
                city: self.city,
                street: self.street,
                house: self.house,
                flat: self.flat,
                index: self.postal_index,
            },
            cost: Money::from_minor(self.cost_minor),
            status: self.status.parse::<OrderStatus>()?,
            items,
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn select_prices(&self, product_ids: &[i64]) -> Result<Vec<ProductPrice>, StoreError> {
        let rows: Vec<PriceRow> = sqlx::query_as(
            "SELECT id, price_minor FROM products WHERE id = ANY($1)",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductPrice {
                product_id: row.id,
                price: Money::from_minor(row.price_minor),
            })
            .collect())
    }

    async fn put_order(&self, order: &OrderDraft) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO orders (
                user_id, created_at, country, region, city, street, house, flat,
                postal_index, cost_minor, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(order.user_id)
        .bind(order.created_at)
        .bind(&order.address.country)
        .bind(&order.address.region)
        .bind(&order.address.city)
        .bind(&order.address.street)
        .bind(&order.address.house)
        .bind(&order.address.flat)
        .bind(&order.address.index)
        .bind(order.cost.minor())
        .bind(order.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(position as i32)
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order_id)
    }

    async fn get_all_orders(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let order_rows: Vec<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, created_at, country, region, city, street, house, flat,
                   postal_index, cost_minor, status
            FROM orders
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if order_rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i64> = order_rows.iter().map(|row| row.id).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT order_id, product_id, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<i64, Vec<OrderLineItem>> = HashMap::new();
        for item in item_rows {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderLineItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
        }

        order_rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}
