use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::error::{AppError, AppResult};

/// Hash a new password as an argon2 PHC string.
pub fn hash(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hashed = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hashed)
}

/// Compare a password with a stored hash. Accepts argon2 PHC strings and
/// legacy `$2a$`/`$2b$`/`$2y$` bcrypt hashes.
pub fn verify(password: &str, stored: &str) -> AppResult<bool> {
    if stored.starts_with("$2") {
        return bcrypt::verify(password, stored)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid bcrypt hash: {e}")));
    }

    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
