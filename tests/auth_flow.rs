use std::sync::Mutex;

use async_trait::async_trait;
use widget_checkout::{
    db::{DbPool, create_pool, orm_from_pool, run_migrations},
    dto::auth::{AuthenticateRequest, ForgotPasswordRequest, ResetPasswordRequest},
    encryption::Encryptor,
    error::{AppError, AppResult},
    mailer::{Mailer, Message},
    repository::users,
    services::{auth_service, password_service},
    signer::UrlSigner,
};

const SECRET: &str = "abcdefghijklmnopqrstuvwxyz012345";

#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<Message>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: Message) -> AppResult<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[tokio::test]
async fn credentials_tokens_and_user_deletion() -> anyhow::Result<()> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("Skipping test: set TEST_DATABASE_URL to run integration flow tests.");
        return Ok(());
    };

    let pool = setup_pool(&database_url).await?;
    let orm = orm_from_pool(&pool);

    let legacy_hash = bcrypt::hash("legacy-pw", 4)?;
    let legacy_id = insert_user(&pool, "legacy@example.com", &legacy_hash).await?;
    let modern_id = insert_user(
        &pool,
        "modern@example.com",
        &widget_checkout::password::hash("modern-pw")?,
    )
    .await?;

    assert_eq!(users::authenticate(&pool, "legacy@example.com", "legacy-pw").await?, legacy_id);
    assert_eq!(users::authenticate(&pool, "Modern@Example.com", "modern-pw").await?, modern_id);
    assert!(matches!(
        users::authenticate(&pool, "legacy@example.com", "nope").await,
        Err(AppError::IncorrectPassword)
    ));
    assert!(matches!(
        users::authenticate(&pool, "modern@example.com", "legacy-pw").await,
        Err(AppError::IncorrectPassword)
    ));
    assert!(matches!(
        users::authenticate(&pool, "ghost@example.com", "legacy-pw").await,
        Err(AppError::IncorrectPassword)
    ));

    let token = auth_service::issue_token(
        &pool,
        &orm,
        AuthenticateRequest {
            email: "legacy@example.com".into(),
            password: "legacy-pw".into(),
        },
    )
    .await?;
    let owner = auth_service::user_for_bearer(&pool, &token.token).await?;
    assert_eq!(owner.id, legacy_id);

    // Forgot password mails a signed link that the landing page accepts.
    let mailer = CapturingMailer::default();
    let signer = UrlSigner::new(SECRET);
    let encryptor = Encryptor::new(SECRET);
    password_service::forgot_password(
        &pool,
        &mailer,
        &signer,
        "http://localhost:4000",
        ForgotPasswordRequest {
            email: "legacy@example.com".into(),
        },
    )
    .await?;
    let message = mailer.sent.lock().unwrap().pop().expect("reset mail");
    assert_eq!(message.to, "legacy@example.com");
    let link = message.body.split_whitespace().last().unwrap().to_string();
    let view = password_service::reset_form(&signer, &encryptor, &link, "legacy@example.com")?;

    let unknown = password_service::forgot_password(
        &pool,
        &mailer,
        &signer,
        "http://localhost:4000",
        ForgotPasswordRequest {
            email: "nobody@example.com".into(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    // Reset the legacy user's password through the encrypted form value.
    password_service::reset_password(
        &pool,
        &encryptor,
        ResetPasswordRequest {
            email: view.email,
            password: "brand-new-pw".into(),
        },
    )
    .await?;
    assert_eq!(users::authenticate(&pool, "legacy@example.com", "brand-new-pw").await?, legacy_id);

    users::delete_user(&pool, legacy_id).await?;
    let (tokens_left,): (i64,) = sqlx::query_as("SELECT count(*) FROM tokens WHERE user_id = $1")
        .bind(legacy_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(tokens_left, 0);
    assert!(matches!(users::get_one_user(&orm, legacy_id).await, Err(AppError::NotFound)));
    assert!(matches!(
        auth_service::user_for_bearer(&pool, &token.token).await,
        Err(AppError::Unauthorized)
    ));
    assert!(matches!(users::delete_user(&pool, legacy_id).await, Err(AppError::NotFound)));

    Ok(())
}

async fn setup_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    sqlx::query("TRUNCATE TABLE tokens, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await?;
    Ok(pool)
}

async fn insert_user(pool: &DbPool, email: &str, hash: &str) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (first_name, last_name, email, password) VALUES ('Test', 'User', $1, $2) RETURNING id",
    )
    .bind(email)
    .bind(hash)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
