use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{User, UserResponse};

/// User service
pub struct UserService;

impl UserService {
    /// Get user by ID
    pub async fn get_user(db: &Database, user_id: &str) -> Result<User> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Get user profile
    pub async fn get_profile(db: &Database, user_id: &str) -> Result<UserResponse> {
        let user = Self::get_user(db, user_id).await?;
        Ok(UserResponse::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegisterRequest;
    use crate::services::AuthService;

    #[tokio::test]
    async fn test_get_profile() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        db.run_migrations().await.unwrap();

        let created = AuthService::register(
            &db,
            RegisterRequest {
                name: "Rex".to_string(),
                email: "rex@pups.dog".to_string(),
                password: "secret1".to_string(),
                password_confirm: "secret1".to_string(),
            },
        )
        .await
        .unwrap();

        let profile = UserService::get_profile(&db, &created.id).await.unwrap();
        assert_eq!(profile.name, "Rex");
        assert_eq!(profile.updated_at, created.created_at);

        let missing = UserService::get_profile(&db, "nobody").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
