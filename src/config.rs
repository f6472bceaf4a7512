use serde::Deserialize;

/// Site configuration file, read from the working directory.
pub const CONFIG_FILE: &str = "hvac.toml";

/// Overrides `[admin] api_token`.
pub const ENV_ADMIN_TOKEN: &str = "HVAC_ADMIN_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// "sqlite" (default) or "mock"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Primary binding. Unset leaves the environment binding
    /// (`HVAC_DATABASE_PATH`) and then the in-memory mock to the resolver.
    #[serde(default)]
    pub path: Option<String>,
    /// Secondary binding, tried when the primary cannot be opened
    #[serde(default)]
    pub secondary_path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: default_backend(),
            path: None,
            secondary_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token required by the admin API. Unset means admin routes are closed.
    #[serde(default)]
    pub api_token: Option<String>,
}

fn default_backend() -> String {
    "sqlite".to_string()
}

impl Config {
    /// Load `hvac.toml` (defaults when missing or unparsable) and apply
    /// environment overrides.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: &str) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid {}: {}", path, e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };
        if let Ok(token) = std::env::var(ENV_ADMIN_TOKEN) {
            if !token.trim().is_empty() {
                config.admin.api_token = Some(token);
            }
        }
        config
    }

    pub fn from_toml_str(s: &str) -> Result<Self, String> {
        toml::from_str(s).map_err(|e| e.to_string())
    }

    pub fn wants_mock(&self) -> bool {
        self.database.backend.eq_ignore_ascii_case("mock")
    }

    /// Every SQLite path a binding may open.
    pub fn sqlite_paths(&self) -> Vec<&str> {
        if self.wants_mock() {
            return Vec::new();
        }
        self.database
            .path
            .iter()
            .chain(self.database.secondary_path.iter())
            .map(|s| s.as_str())
            .collect()
    }
}
