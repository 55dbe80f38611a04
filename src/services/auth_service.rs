//! 认证服务：注册、登录

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    error::AppError,
    models::{account::*, auth::*},
    repository::AccountRepository,
};
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountRepository>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            accounts,
            jwt_service,
            hasher: Arc::new(PasswordHasher::new()),
        }
    }

    /// 注册账户
    ///
    /// 邮箱按原样存储，唯一性由存储层保证。
    pub async fn register(&self, req: RegisterRequest) -> Result<AccountResponse, AppError> {
        req.validate()?;

        // 预检查只是为了避免无意义的哈希计算，并发注册由存储层兜底
        if self.accounts.find_by_email(&req.email).await?.is_some() {
            tracing::debug!("Registration rejected: email already taken");
            return Err(AppError::AccountExists);
        }

        let password_hash = self.hash_password(req.password).await?;

        let account = self
            .accounts
            .create(NewAccount {
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
            })
            .await?;

        tracing::info!(account_id = %account.id, "Account registered");
        metrics::counter!("accounts_registered_total").increment(1);

        Ok(account.into())
    }

    /// 用户登录
    ///
    /// 邮箱不存在与密码错误返回同一个错误，耗时也保持一致。
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let account = self.accounts.find_by_email(&req.email).await?;

        let hasher = self.hasher.clone();
        let stored_hash = account.as_ref().map(|a| a.password_hash.clone());
        let password = req.password;
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

        let account = match account {
            Some(account) if verified => account,
            _ => {
                tracing::info!("Login failed");
                metrics::counter!("login_failures_total").increment(1);
                return Err(AppError::InvalidCredentials);
            }
        };

        let token = self.jwt_service.issue(account.id)?;

        tracing::info!(account_id = %account.id, "Login succeeded");
        Ok(LoginResponse { token })
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryAccountRepository;
    use chrono::Duration;

    fn service() -> (AuthService, Arc<JwtService>) {
        let jwt = Arc::new(
            JwtService::new("test_secret_key_32_characters_long!", Duration::days(7)).unwrap(),
        );
        let accounts = Arc::new(InMemoryAccountRepository::new());
        (AuthService::new(accounts, jwt.clone()), jwt)
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, jwt) = service();

        let account = service.register(register_request("a@x.io", "pw123")).await.unwrap();
        assert_eq!(account.email, "a@x.io");

        let login = service
            .login(LoginRequest { email: "a@x.io".to_string(), password: "pw123".to_string() })
            .await
            .unwrap();
        assert_eq!(jwt.verify(&login.token).unwrap(), account.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, _) = service();

        service.register(register_request("a@x.io", "pw123")).await.unwrap();
        let err = service.register(register_request("a@x.io", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::AccountExists));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let (service, _) = service();
        let err = service.register(register_request("not-an-email", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service();
        service.register(register_request("a@x.io", "pw123")).await.unwrap();

        let wrong_password = service
            .login(LoginRequest { email: "a@x.io".to_string(), password: "nope".to_string() })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginRequest { email: "b@x.io".to_string(), password: "pw123".to_string() })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.user_message(), unknown_email.user_message());
    }
}
