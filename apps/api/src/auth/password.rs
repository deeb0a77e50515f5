use crate::auth::AuthError;

pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_with_cost(password, bcrypt::DEFAULT_COST).await
}

async fn hash_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// `false` for a wrong password; `Err` only when the stored hash is unusable.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}
