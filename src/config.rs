use crate::errors::{ApiError, ApiResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    pub static_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> ApiResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "4000")
            .parse::<u16>()
            .map_err(|e| ApiError::Config(format!("SERVER_PORT: {e}")))?;

        let token_expiry_days = env_var_or("TOKEN_EXPIRY_DAYS", "7")
            .parse::<i64>()
            .map_err(|e| ApiError::Config(format!("TOKEN_EXPIRY_DAYS: {e}")))?;
        if token_expiry_days <= 0 {
            return Err(ApiError::Config(
                "TOKEN_EXPIRY_DAYS must be positive".into(),
            ));
        }

        let jwt_secret = env_var("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            return Err(ApiError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            server_port,
            data_dir: PathBuf::from(env_var_or("DATA_DIR", "data")),
            jwt_secret,
            token_expiry_days,
            static_dir: PathBuf::from(env_var_or("STATIC_DIR", "web/dist")),
        })
    }
}

fn env_var(key: &str) -> ApiResult<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("missing env var: {key}")))
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
