use crate::auth::jwt::{generate_refresh_token, hash_token, JwtKeys};
use crate::auth::password::{hash_password, verify_password};
use crate::config::BootstrapUser;
use crate::domain::models::RefreshTokenRecord;
use crate::errors::{ApiError, ApiResult};
use crate::storage::traits::{RefreshTokenStorage, UserStorage};
use chrono::{Duration, Utc};
use shared::{LoginRequest, LoginResponse, RefreshResponse, Role, UserInfo};
use std::sync::Arc;
use tracing::{info, warn};

/// Login, token refresh and logout
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStorage>,
    refresh_tokens: Arc<dyn RefreshTokenStorage>,
    jwt: JwtKeys,
    refresh_lifetime: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStorage>,
        refresh_tokens: Arc<dyn RefreshTokenStorage>,
        jwt: JwtKeys,
        refresh_token_days: i64,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
            refresh_lifetime: Duration::days(refresh_token_days),
        }
    }

    /// Create the configured accounts, only when no user exists yet
    pub async fn bootstrap_users(&self, accounts: &[BootstrapUser]) -> anyhow::Result<usize> {
        if self.users.count_users().await? > 0 {
            return Ok(0);
        }

        let mut created = 0;
        for account in accounts {
            if account.role == Role::Employee && account.worker.is_none() {
                warn!("Skipping employee {} without a worker column", account.username);
                continue;
            }
            let password_hash = hash_password(&account.password)?;
            self.users
                .create_user(&account.username, &password_hash, account.role, account.worker)
                .await?;
            info!("Created {} account {}", account.role.as_str(), account.username);
            created += 1;
        }
        Ok(created)
    }

    pub async fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        let rejected = || ApiError::Unauthorized("Invalid username or password".to_string());

        let user = self
            .users
            .find_by_username(request.username.trim())
            .await?
            .ok_or_else(rejected)?;

        if !verify_password(&request.password, &user.password_hash)? {
            warn!("Failed login for {}", user.username);
            return Err(rejected());
        }

        let access_token = self.jwt.generate_access_token(&user)?;
        let refresh_token = generate_refresh_token();
        self.refresh_tokens
            .store_token(&RefreshTokenRecord {
                token_hash: hash_token(&refresh_token),
                user_id: user.id,
                expires_at: Utc::now() + self.refresh_lifetime,
                revoked: false,
            })
            .await?;

        info!("User {} logged in", user.username);
        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: user.info(),
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        let expired = || ApiError::Unauthorized("Refresh token is invalid or expired".to_string());

        let record = self
            .refresh_tokens
            .find_token(&hash_token(refresh_token))
            .await?
            .filter(|r| r.is_usable(Utc::now()))
            .ok_or_else(expired)?;

        let user = self.users.get_user(record.user_id).await?.ok_or_else(expired)?;

        Ok(RefreshResponse {
            access_token: self.jwt.generate_access_token(&user)?,
        })
    }

    /// Revoke a refresh token; unknown tokens are ignored
    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        self.refresh_tokens.revoke_token(&hash_token(refresh_token)).await?;
        Ok(())
    }

    pub async fn current_user(&self, user_id: i64) -> ApiResult<UserInfo> {
        self.users
            .get_user(user_id)
            .await?
            .map(|u| u.info())
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))
    }
}
