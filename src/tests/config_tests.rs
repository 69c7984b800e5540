#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use crate::config::{self, AppConfig};

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.database.url, "sqlite://data/recipe-api.db");
        assert_eq!(cfg.auth.min_password_length, 5);
        assert_eq!(cfg.rate_limit.token_max_requests, 20);
        assert_eq!(cfg.rate_limit.create_user_max_requests, 10);
        assert_eq!(cfg.security.as_ref().and_then(|s| s.enable_hsts), Some(false));
        assert!(config::validate(&cfg).is_ok());

        let params = cfg.auth.argon2_params();
        assert_eq!(params.memory_kib, 19456);
        assert_eq!(params.iterations, 2);
        assert_eq!(params.parallelism, 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        let err = config::validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("invalid server.port"));

        let mut cfg = AppConfig::default();
        cfg.database.max_connections = 0;
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.database.url = "  ".into();
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.auth.min_password_length = 0;
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.auth.argon2_parallelism = 4;
        cfg.auth.argon2_memory_kib = 16;
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.rate_limit.token_window_seconds = 0;
        let err = config::validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("rate_limit.token"));
    }

    // Environment mutations are process-wide, so all layering checks live in one test.
    #[test]
    fn test_load_layers_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[server]\nport = 9100\n\n[auth]\nmin_password_length = 8\n").unwrap();

        env::set_var("RECIPE_API_CONFIG", &path);
        let cfg = config::load().unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.auth.min_password_length, 8);
        assert_eq!(cfg.server.host, "127.0.0.1");

        env::set_var("RECIPE_API__SERVER__PORT", "9200");
        let cfg = config::load().unwrap();
        assert_eq!(cfg.server.port, 9200);

        env::set_var("RECIPE_API__SERVER__PORT", "0");
        let result = config::load();
        assert!(result.unwrap_err().to_string().contains("invalid server.port"));

        env::remove_var("RECIPE_API__SERVER__PORT");
        env::remove_var("RECIPE_API_CONFIG");
    }

    #[test]
    fn test_ensure_sqlite_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("db.sqlite");
        let url = format!("sqlite://{}?mode=rwc", nested.display());

        config::ensure_sqlite_parent_dir(&url).unwrap();

        assert!(nested.parent().unwrap().is_dir());
        assert!(config::ensure_sqlite_parent_dir("sqlite::memory:").is_ok());
    }
}
