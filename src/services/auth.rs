use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Claims, LoginRequest, LoginResponse, RegisterRequest, User, UserResponse};

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Register a new user
    pub async fn register(db: &Database, req: RegisterRequest) -> Result<UserResponse> {
        let email = req.email.trim().to_lowercase();

        // Validate email
        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }

        if req.password != req.password_confirm {
            return Err(AppError::BadRequest(
                "Passwords do not match - Please try again.".to_string(),
            ));
        }

        // Validate password
        if req.password.len() < 6 {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(db.pool())
            .await?;

        if existing.is_some() {
            return Err(AppError::Conflict("Username already taken.".to_string()));
        }

        let password_hash = Self::hash_password(&req.password)?;

        let user_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, token_version, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(&email)
        .bind(req.name.trim())
        .bind(&password_hash)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_one(db.pool())
            .await?;

        tracing::info!("Registered user {}", user.email);
        Ok(UserResponse::from(user))
    }

    /// Login user
    pub async fn login(db: &Database, config: &Config, req: LoginRequest) -> Result<LoginResponse> {
        let email = req.email.trim().to_lowercase();

        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "Username not found - Please check and try again.".to_string(),
                )
            })?;

        if !Self::verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Incorrect password - Please try again.".to_string(),
            ));
        }

        let access_token = Self::generate_access_token(&user, config)?;

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: config.jwt.access_token_expire_minutes * 60,
            user: UserResponse::from(user),
        })
    }

    /// Logout invalidates every token issued so far
    pub async fn logout(db: &Database, user_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE users SET token_version = token_version + 1, updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(user_id)
        .execute(db.pool())
        .await?;

        Ok(())
    }

    fn generate_access_token(user: &User, config: &Config) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::minutes(config.jwt.access_token_expire_minutes as i64);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            ver: user.token_version,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Validate JWT token
    pub fn validate_token(token: &str, config: &Config) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(token_data.claims)
    }

    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
