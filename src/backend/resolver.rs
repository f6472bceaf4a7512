use std::sync::{Arc, OnceLock};

use log::{info, warn};

use super::mock::MockBackend;
use super::QueryBackend;
use crate::config::Config;

/// Environment variable naming a SQLite file for the environment binding.
pub const ENV_DATABASE_PATH: &str = "HVAC_DATABASE_PATH";

/// Opens a backend binding on first use.
pub type Opener = Box<dyn Fn() -> Result<Arc<dyn QueryBackend>, String> + Send + Sync>;

/// Where a resolved backend came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSlot {
    /// Registered explicitly by the composition root (API routes, tests).
    Registered,
    Primary,
    Secondary,
    Environment,
    Mock,
}

impl BindingSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingSlot::Registered => "registered",
            BindingSlot::Primary => "primary",
            BindingSlot::Secondary => "secondary",
            BindingSlot::Environment => "environment",
            BindingSlot::Mock => "mock",
        }
    }
}

/// Locates the active query backend once and hands out the same instance
/// for the rest of the resolver's lifetime.
pub struct BackendResolver {
    registered: Option<Arc<dyn QueryBackend>>,
    primary: Option<Opener>,
    secondary: Option<Opener>,
    environment: Option<Opener>,
    resolved: OnceLock<(BindingSlot, Arc<dyn QueryBackend>)>,
    mock: OnceLock<Arc<MockBackend>>,
}

impl Default for BackendResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendResolver {
    /// A resolver with no bindings at all.
    pub fn new() -> Self {
        BackendResolver {
            registered: None,
            primary: None,
            secondary: None,
            environment: None,
            resolved: OnceLock::new(),
            mock: OnceLock::new(),
        }
    }

    /// Bindings from `hvac.toml` plus the `HVAC_DATABASE_PATH` environment
    /// binding. `backend = "mock"` leaves every slot empty.
    pub fn from_config(config: &Config) -> Self {
        let mut resolver = Self::new();
        if config.wants_mock() {
            info!("Database backend set to mock; no bindings will be opened");
            return resolver;
        }
        if let Some(path) = config.database.path.clone() {
            resolver = resolver.with_primary(super::sqlite::opener(path));
        }
        if let Some(path) = config.database.secondary_path.clone() {
            resolver = resolver.with_secondary(super::sqlite::opener(path));
        }
        resolver.with_environment(Box::new(|| match std::env::var(ENV_DATABASE_PATH) {
            Ok(path) if !path.trim().is_empty() => (super::sqlite::opener(path))(),
            _ => Err(format!("{} not set", ENV_DATABASE_PATH)),
        }))
    }

    pub fn register(mut self, backend: Arc<dyn QueryBackend>) -> Self {
        self.registered = Some(backend);
        self
    }

    pub fn with_primary(mut self, opener: Opener) -> Self {
        self.primary = Some(opener);
        self
    }

    pub fn with_secondary(mut self, opener: Opener) -> Self {
        self.secondary = Some(opener);
        self
    }

    pub fn with_environment(mut self, opener: Opener) -> Self {
        self.environment = Some(opener);
        self
    }

    /// First available backend: registered, primary, secondary, environment.
    /// `None` means the database is unavailable. Once a backend is found it
    /// is cached; an unsuccessful resolution is retried on the next call.
    pub fn resolve(&self) -> Option<Arc<dyn QueryBackend>> {
        if let Some((_, backend)) = self.resolved.get() {
            return Some(backend.clone());
        }
        let found = self.find()?;
        // A concurrent caller may have won the race; everyone gets the winner.
        let _ = self.resolved.set(found);
        self.resolved.get().map(|(_, backend)| backend.clone())
    }

    /// Like `resolve`, but installs the in-memory mock when nothing else
    /// is available.
    pub fn resolve_or_mock(&self) -> Arc<dyn QueryBackend> {
        if let Some(backend) = self.resolve() {
            return backend;
        }
        warn!("No database binding available; falling back to the in-memory mock backend");
        let mock: Arc<dyn QueryBackend> = self.mock();
        let _ = self.resolved.set((BindingSlot::Mock, mock));
        self.resolved
            .get()
            .map(|(_, backend)| backend.clone())
            .unwrap_or_else(|| self.mock())
    }

    /// The lazily constructed mock singleton.
    pub fn mock(&self) -> Arc<MockBackend> {
        self.mock.get_or_init(|| Arc::new(MockBackend::new())).clone()
    }

    /// Which slot the cached backend came from, if resolved.
    pub fn resolved_slot(&self) -> Option<BindingSlot> {
        self.resolved.get().map(|(slot, _)| *slot)
    }

    fn find(&self) -> Option<(BindingSlot, Arc<dyn QueryBackend>)> {
        if let Some(backend) = &self.registered {
            return Some((BindingSlot::Registered, backend.clone()));
        }
        let candidates = [
            (BindingSlot::Primary, &self.primary),
            (BindingSlot::Secondary, &self.secondary),
            (BindingSlot::Environment, &self.environment),
        ];
        for (slot, opener) in candidates {
            let Some(open) = opener else { continue };
            match open() {
                Ok(backend) => {
                    info!("Resolved {} database binding ({})", slot.as_str(), backend.name());
                    return Some((slot, backend));
                }
                Err(e) => warn!("Skipping {} database binding: {}", slot.as_str(), e),
            }
        }
        None
    }
}
