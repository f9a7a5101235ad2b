use widget_checkout::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    password,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    let admin_id = ensure_admin(&pool, "admin@example.com", "password").await?;
    seed_widgets(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, plain: &str) -> anyhow::Result<i64> {
    let hash = password::hash(plain)?;

    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO users (first_name, last_name, email, password)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind("Admin")
    .bind("User")
    .bind(email)
    .bind(hash)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (i64,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured admin {email}");
    Ok(user_id)
}

async fn seed_widgets(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let widgets = vec![
        ("Widget", "A very nice widget.", 1000, 10, false, ""),
        ("Bronze Plan", "Get three widgets for the price of two every month", 2000, 1000, true, "price_bronze"),
    ];

    for (name, description, price, inventory, recurring, plan_id) in widgets {
        sqlx::query(
            r#"
            INSERT INTO widgets (name, description, inventory_level, price, is_recurring, plan_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(inventory)
        .bind(price as i64)
        .bind(recurring)
        .bind(plan_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded widgets");
    Ok(())
}
