use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::{self, Claims};

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_algorithm: String,
}

impl AuthConfig {
    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self { jwt_secret: cfg.jwt_secret.clone(), token_ttl_hours: cfg.token_ttl_hours, password_algorithm: "argon2".into() }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    pub fn config(&self) -> &AuthConfig { &self.cfg }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string())
    }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: "0123456789abcdef".into(), token_ttl_hours: 1, password_algorithm: "argon2".into() });
    /// let input = RegisterInput { email: "owner@example.com".into(), name: "Owner".into(), password: "Secret123".into(), business_name: Some("Cool Air".into()) };
    /// let user = tokio_test::block_on(svc.register(input, None)).unwrap();
    /// assert_eq!(user.role, "owner");
    /// ```
    #[instrument(skip(self, input, inviter), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput, inviter: Option<&Claims>) -> Result<AuthUser, AuthError> {
        if !input.email.contains('@') {
            return Err(AuthError::Validation("email is invalid".into()));
        }
        if input.name.trim().is_empty() {
            return Err(AuthError::Validation("name is required".into()));
        }
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let (business_id, role) = match inviter {
            Some(claims) if claims.is_owner() => (claims.bid, models::user::ROLE_STAFF),
            Some(_) => return Err(AuthError::Forbidden),
            None => {
                let name = input
                    .business_name
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .ok_or_else(|| AuthError::Validation("businessName is required".into()))?;
                (self.repo.create_business(name).await?, models::user::ROLE_OWNER)
            }
        };

        let user = self.repo.create_user(business_id, &input.email, &input.name, role).await?;
        let hash = self.hash_password(&input.password)?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, business_id = %user.business_id, role = %user.role, "user_registered");
        Ok(user)
    }

    /// 启动时确保平台管理员账号存在；已存在则只更新密码
    pub async fn ensure_platform_admin(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = match self.repo.find_user_by_email(email).await? {
            Some(u) => u,
            None => {
                let bid = self.repo.create_business("Platform").await?;
                self.repo.create_user(bid, email, "Platform Admin", models::user::ROLE_PLATFORM_ADMIN).await?
            }
        };
        if user.role != models::user::ROLE_PLATFORM_ADMIN {
            return Err(AuthError::Conflict);
        }
        let hash = self.hash_password(password)?;
        self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, "platform_admin_ready");
        Ok(user)
    }

    /// Authenticate a user and issue a session token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig { jwt_secret: "0123456789abcdef".into(), token_ttl_hours: 1, password_algorithm: "argon2".into() });
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into(), business_name: Some("Biz".into()) }, None));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let (token, expires_at) = token::issue(&self.cfg.jwt_secret, &user, self.cfg.token_ttl_hours)?;
        info!(user_id = %user.id, business_id = %user.business_id, "user_logged_in");
        Ok(AuthSession { user, token, expires_at })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        token::verify(&self.cfg.jwt_secret, token)
    }

    pub async fn current_user(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(claims.uid).await?.ok_or(AuthError::NotFound)
    }
}
