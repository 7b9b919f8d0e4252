#[cfg(test)]
pub mod test {
    use serde::{Deserialize, Serialize};

    /// A typical nested application config, shared across module tests.
    #[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone)]
    #[serde(default)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub database: DatabaseConfig,
        pub tags: Vec<String>,
    }

    #[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone)]
    #[serde(default)]
    pub struct DatabaseConfig {
        pub url: Option<String>,
        pub pool_size: u32,
    }

    /// Line-format flavored fixture exercising nested name prefixes.
    #[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone)]
    #[serde(default)]
    pub struct AppConfig {
        pub simple_c: String,
        pub simple_e: i64,
        pub debug: bool,
        pub example_type: String,
        pub database: DbConfig,
    }

    #[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone)]
    #[serde(default)]
    pub struct DbConfig {
        pub user: String,
        pub server_port: String,
        pub pooling_max: i64,
    }

    #[test]
    fn fixtures_default_to_zero_values() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 0);
        assert_eq!(config.database.url, None);
        let app = AppConfig::default();
        assert_eq!(app.example_type, "");
        assert_eq!(app.database.pooling_max, 0);
    }
}
