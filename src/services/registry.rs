use crate::config::toml_config::AppConfig;
use crate::domain::model::Table;
use crate::utils::error::{Result, ThoughtError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;

/// Action names accept `-` in place of `_`.
pub fn sanitize_name(name: &str) -> String {
    name.trim().replace('-', "_")
}

/// Free-form `key=value` options handed to an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionArgs {
    values: BTreeMap<String, String>,
}

impl ActionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Parses `key=value` pairs.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    args.values
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => {
                    return Err(ThoughtError::ValidationError {
                        message: format!("expected key=value, got '{}'", pair),
                    })
                }
            }
        }
        Ok(args)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<Table>> + Send + 'a>>;

/// An action bound to a concrete integration type.
pub type Action<S> = for<'a> fn(&'a S, &'a ActionArgs) -> ActionFuture<'a>;

/// Explicit action name → function map for one integration.
pub struct ActionTable<S> {
    service: &'static str,
    actions: BTreeMap<String, Action<S>>,
}

impl<S> ActionTable<S> {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            actions: BTreeMap::new(),
        }
    }

    pub fn register(mut self, name: &str, action: Action<S>) -> Self {
        self.actions.insert(sanitize_name(name), action);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    pub fn resolve(&self, name: &str) -> Result<Action<S>> {
        self.actions
            .get(&sanitize_name(name))
            .copied()
            .ok_or_else(|| ThoughtError::UnknownAction {
                service: self.service.to_string(),
                action: name.to_string(),
                available: self.names(),
            })
    }
}

#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn actions(&self) -> Vec<String>;

    /// Must succeed before `call`.
    async fn authorize(&mut self) -> Result<()>;

    async fn call(&self, action: &str, args: &ActionArgs) -> Result<Table>;
}

pub type ServiceFactory = fn(&AppConfig) -> Result<Box<dyn Service>>;

/// Known integrations by name.
pub struct Registry {
    services: HashMap<String, ServiceFactory>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registry with every built-in integration.
    pub fn new() -> Self {
        Self::empty().with_service(
            crate::services::instapaper::SERVICE_NAME,
            crate::services::instapaper::build,
        )
    }

    pub fn with_service(mut self, name: &str, factory: ServiceFactory) -> Self {
        self.services.insert(sanitize_name(name), factory);
        self
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create(&self, name: &str, config: &AppConfig) -> Result<Box<dyn Service>> {
        let factory = self
            .services
            .get(&sanitize_name(name))
            .ok_or_else(|| ThoughtError::ServiceNotRegistered {
                service: name.to_string(),
                available: self.names(),
            })?;
        factory(config)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
