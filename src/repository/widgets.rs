use crate::{
    db::{DbPool, bounded},
    error::AppResult,
    models::Widget,
};

pub async fn get_widget(pool: &DbPool, id: i64) -> AppResult<Widget> {
    bounded(
        sqlx::query_as::<_, Widget>(
            r#"
            SELECT id, name, description, inventory_level, price, COALESCE(image, '') AS image,
                   is_recurring, plan_id, created_at, updated_at
            FROM widgets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool),
    )
    .await
}
