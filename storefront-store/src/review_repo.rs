use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use storefront_core::{ReviewRepository, StoreError, StoreFault};
use storefront_shared::{RatingBucket, RatingDistribution, RatingUpdate, Review};

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    user_id: i64,
    user_name: String,
    product_id: i64,
    rating: i32,
    content: String,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            user_id: row.user_id,
            user_name: row.user_name,
            product_id: row.product_id,
            rating: row.rating,
            content: row.content,
        }
    }
}

// One row per rating value. A product without reviews yields a single row
// with NULL rating, so the version is read in the same statement.
#[derive(sqlx::FromRow)]
struct BucketRow {
    rating_version: i64,
    rating: Option<i32>,
    count: i64,
}

const SELECT_REVIEW: &str = r#"
    SELECT r.user_id, u.name AS user_name, r.product_id, r.rating, r.content
    FROM reviews r
    JOIN users u ON u.id = r.user_id
"#;

/// Store the new aggregate, but only if no other review write on the product
/// happened since `update.expected_version` was read.
async fn apply_rating(
    tx: &mut Transaction<'_, Postgres>,
    update: &RatingUpdate,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET rating = $2, rating_version = rating_version + 1
        WHERE id = $1 AND rating_version = $3
        "#,
    )
    .bind(update.product_id)
    .bind(update.rating)
    .bind(update.expected_version)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Box::new(StoreFault::ConcurrentUpdate(update.product_id)));
    }
    Ok(())
}

fn review_write_error(product_id: i64, err: sqlx::Error) -> StoreError {
    match &err {
        // Another request inserted the same (user, product) review first.
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Box::new(StoreFault::ConcurrentUpdate(product_id))
        }
        sqlx::Error::Database(db) if db.constraint() == Some("reviews_product_id_fkey") => {
            Box::new(StoreFault::UnknownProduct(product_id))
        }
        _ => Box::new(err),
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn get_review_by_user_and_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<Review>, StoreError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "{} WHERE r.user_id = $1 AND r.product_id = $2",
            SELECT_REVIEW
        ))
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Review::from))
    }

    async fn get_all_ratings_of_product(
        &self,
        product_id: i64,
    ) -> Result<RatingDistribution, StoreError> {
        let rows: Vec<BucketRow> = sqlx::query_as(
            r#"
            SELECT p.rating_version, r.rating, COUNT(r.rating) AS count
            FROM products p
            LEFT JOIN reviews r ON r.product_id = p.id
            WHERE p.id = $1
            GROUP BY p.rating_version, r.rating
            ORDER BY r.rating
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        let version = rows
            .first()
            .map(|row| row.rating_version)
            .ok_or(StoreFault::UnknownProduct(product_id))?;

        let buckets = rows
            .into_iter()
            .filter_map(|row| {
                row.rating.map(|rating| RatingBucket {
                    rating,
                    count: row.count,
                })
            })
            .collect();

        Ok(RatingDistribution {
            product_id,
            buckets,
            version,
        })
    }

    async fn add_review(&self, review: &Review, update: RatingUpdate) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO reviews (user_id, product_id, rating, content)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(review.user_id)
        .bind(review.product_id)
        .bind(review.rating)
        .bind(&review.content)
        .execute(&mut *tx)
        .await
        .map_err(|e| review_write_error(review.product_id, e))?;

        apply_rating(&mut tx, &update).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_review(&self, review: &Review, update: RatingUpdate) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET rating = $3, content = $4
            WHERE user_id = $1 AND product_id = $2
            "#,
        )
        .bind(review.user_id)
        .bind(review.product_id)
        .bind(review.rating)
        .bind(&review.content)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Box::new(StoreFault::ConcurrentUpdate(review.product_id)));
        }

        apply_rating(&mut tx, &update).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_review(
        &self,
        user_id: i64,
        product_id: i64,
        update: RatingUpdate,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM reviews WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Box::new(StoreFault::ConcurrentUpdate(product_id)));
        }

        apply_rating(&mut tx, &update).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_reviews_by_product_id(&self, product_id: i64) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "{} WHERE r.product_id = $1 ORDER BY r.user_id",
            SELECT_REVIEW
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn get_reviews_by_user(&self, user_name: &str) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "{} WHERE u.name = $1 ORDER BY r.product_id",
            SELECT_REVIEW
        ))
        .bind(user_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }
}
