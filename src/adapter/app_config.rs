use crate::adapter::database_config::{env_or, ConfigError};

/// アプリケーション全体の設定
/// データベース以外の設定を環境変数から読み取る
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    /// 従業員トークンの署名鍵
    pub jwt_admin_secret: String,
    /// 顧客トークンの署名鍵
    pub jwt_user_secret: String,
    /// トークンの有効期間（秒）
    pub jwt_ttl_seconds: u64,
    /// 支払い待ち注文を自動キャンセルするまでの時間（分）
    pub order_timeout_minutes: i64,
    /// タイムアウト巡回の間隔（秒）
    pub sweep_interval_seconds: u64,
}

impl AppConfig {
    /// 環境変数から設定を読み取る
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            server_port: env_or("SERVER_PORT", 8080)?,
            jwt_admin_secret: env_or("JWT_ADMIN_SECRET", "sky-admin-secret".to_string())?,
            jwt_user_secret: env_or("JWT_USER_SECRET", "sky-user-secret".to_string())?,
            jwt_ttl_seconds: env_or("JWT_TTL_SECONDS", 7200)?,
            order_timeout_minutes: env_or("ORDER_TIMEOUT_MINUTES", 15)?,
            sweep_interval_seconds: env_or("SWEEP_INTERVAL_SECONDS", 60)?,
        };

        if config.order_timeout_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "ORDER_TIMEOUT_MINUTES must be positive".to_string(),
            ));
        }
        if config.sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "SWEEP_INTERVAL_SECONDS must be positive".to_string(),
            ));
        }
        Ok(config)
    }
}

// テスト間の環境変数の競合を防ぐためのロック
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const KEYS: [&str; 6] = [
        "SERVER_PORT",
        "JWT_ADMIN_SECRET",
        "JWT_USER_SECRET",
        "JWT_TTL_SECONDS",
        "ORDER_TIMEOUT_MINUTES",
        "SWEEP_INTERVAL_SECONDS",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.jwt_ttl_seconds, 7200);
        assert_eq!(config.order_timeout_minutes, 15);
        assert_eq!(config.sweep_interval_seconds, 60);
        assert_ne!(config.jwt_admin_secret, config.jwt_user_secret);
    }

    #[test]
    fn test_overrides() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();
        env::set_var("SERVER_PORT", "9090");
        env::set_var("JWT_ADMIN_SECRET", "a");
        env::set_var("ORDER_TIMEOUT_MINUTES", "30");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.server_port, 9090);
        assert_eq!(config.jwt_admin_secret, "a");
        assert_eq!(config.order_timeout_minutes, 30);

        clear();
    }

    #[test]
    fn test_invalid_values() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();

        env::set_var("JWT_TTL_SECONDS", "two hours");
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::InvalidValue(_))
        ));
        clear();

        env::set_var("ORDER_TIMEOUT_MINUTES", "0");
        assert!(AppConfig::from_env().is_err());
        clear();
    }
}
