//! Forgot/reset password flow built on signed links and an encrypted email.

use url::Url;

use crate::{
    db::DbPool,
    dto::auth::{ForgotPasswordRequest, ResetPasswordRequest, ResetPasswordView},
    encryption::Encryptor,
    error::{AppError, AppResult},
    mailer::{Mailer, Message},
    repository::users,
    signer::UrlSigner,
};

/// Reset links stop working after this many minutes.
pub const RESET_LINK_MINUTES: i64 = 60;

pub fn reset_link(front_end: &str, email: &str) -> AppResult<String> {
    let mut url = Url::parse(&format!("{front_end}/reset-password"))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid FRONT_END: {e}")))?;
    url.query_pairs_mut().append_pair("email", email);
    Ok(url.to_string())
}

pub async fn forgot_password(
    pool: &DbPool,
    mailer: &dyn Mailer,
    signer: &UrlSigner,
    front_end: &str,
    payload: ForgotPasswordRequest,
) -> AppResult<()> {
    let user = match users::get_user_by_email(pool, &payload.email).await {
        Ok(user) => user,
        Err(AppError::NotFound) => {
            return Err(AppError::BadRequest("no matching email found".into()));
        }
        Err(err) => return Err(err),
    };

    let link = signer.sign(&reset_link(front_end, &user.email)?);
    mailer
        .send(Message {
            to: user.email,
            subject: "Password reset request".into(),
            body: format!("Use this link to choose a new password: {link}"),
        })
        .await?;
    tracing::info!(user_id = user.id, "password reset link sent");
    Ok(())
}

/// Check the landing URL of a reset link and seal the email for the form.
pub fn reset_form(
    signer: &UrlSigner,
    encryptor: &Encryptor,
    full_url: &str,
    email: &str,
) -> AppResult<ResetPasswordView> {
    if !signer.verify(full_url) {
        tracing::warn!(url = %full_url, "invalid URL - tampering detected");
        return Err(AppError::InvalidSignature);
    }
    if signer.is_expired(full_url, RESET_LINK_MINUTES) {
        tracing::warn!(url = %full_url, "reset link expired");
        return Err(AppError::LinkExpired);
    }

    Ok(ResetPasswordView {
        email: encryptor.encrypt(email)?,
    })
}

pub async fn reset_password(
    pool: &DbPool,
    encryptor: &Encryptor,
    payload: ResetPasswordRequest,
) -> AppResult<()> {
    if payload.password.len() < 6 {
        return Err(AppError::BadRequest("password must be at least 6 characters".into()));
    }
    let email = encryptor.decrypt(&payload.email)?;
    let user = users::get_user_by_email(pool, &email).await?;
    let hash = crate::password::hash(&payload.password)?;
    users::update_password_for_user(pool, user.id, &hash).await?;
    tracing::info!(user_id = user.id, "password reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    const SECRET: &str = "abcdefghijklmnopqrstuvwxyz012345";

    #[test]
    fn link_escapes_the_email() {
        let link = reset_link("http://localhost:4000", "a+b@example.com").unwrap();
        assert_eq!(
            link,
            "http://localhost:4000/reset-password?email=a%2Bb%40example.com"
        );
    }

    #[test]
    fn valid_link_yields_encrypted_email() {
        let signer = UrlSigner::new(SECRET);
        let encryptor = Encryptor::new(SECRET);
        let signed = signer.sign(&reset_link("http://localhost:4000", "ada@example.com").unwrap());

        let view = reset_form(&signer, &encryptor, &signed, "ada@example.com").unwrap();
        assert_ne!(view.email, "ada@example.com");
        assert_eq!(encryptor.decrypt(&view.email).unwrap(), "ada@example.com");
    }

    #[test]
    fn tampered_link_is_rejected() {
        let signer = UrlSigner::new(SECRET);
        let signed = signer.sign(&reset_link("http://localhost:4000", "ada@example.com").unwrap());
        let tampered = signed.replace("ada%40", "eve%40");

        let err = reset_form(&signer, &Encryptor::new(SECRET), &tampered, "eve@example.com")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSignature));
    }

    #[test]
    fn old_link_is_expired() {
        let signer = UrlSigner::new(SECRET);
        let link = reset_link("http://localhost:4000", "ada@example.com").unwrap();
        let signed = signer.sign_at(&link, Utc::now() - Duration::minutes(RESET_LINK_MINUTES + 1));

        let err = reset_form(&signer, &Encryptor::new(SECRET), &signed, "ada@example.com")
            .unwrap_err();
        assert!(matches!(err, AppError::LinkExpired));
    }
}
