//! Engine builder with typestate pattern.

use std::marker::PhantomData;
use std::sync::Arc;

use super::JsonApi;
use crate::Result;
use crate::config::EngineConfig;
use crate::permission::CheckRegistry;
use crate::schema::SchemaRegistry;
use crate::store::{DataStore, InMemoryStore};

/// Marker type: schema not yet provided.
pub struct NoSchema;

/// Marker type: schema has been provided.
pub struct HasSchema;

/// Builder for creating [`JsonApi`] instances.
///
/// Uses the typestate pattern so a schema is provided before `build()`
/// is callable.
///
/// ## Optional Configuration
///
/// - `checks()`: named checks referenced by permission expressions
/// - `config()`: engine configuration
/// - `store()`: a custom [`DataStore`]; defaults to an [`InMemoryStore`]
///
/// ## Example
///
/// ```rust
/// use jsonapi_graph::{EngineConfig, IdStrategy, JsonApi};
/// use jsonapi_graph::permission::CheckRegistry;
/// use jsonapi_graph::schema::{SchemaRegistry, TypeSchema};
///
/// let schema = SchemaRegistry::builder().register(TypeSchema::new("tractor")).build().unwrap();
/// let api = JsonApi::builder()
///     .schema(schema)
///     .checks(CheckRegistry::new().with_check_fn("is staff", |p, _| p.has_role("staff")))
///     .config(EngineConfig::builder().id_strategy(IdStrategy::Uuid).build())
///     .build()
///     .unwrap();
/// assert_eq!(api.schema().len(), 1);
/// ```
pub struct JsonApiBuilder<SchemaState> {
    schema: Option<Arc<SchemaRegistry>>,
    checks: CheckRegistry,
    config: EngineConfig,
    store: Option<Arc<dyn DataStore>>,
    _schema_state: PhantomData<SchemaState>,
}

impl JsonApiBuilder<NoSchema> {
    /// Creates a new engine builder.
    pub fn new() -> Self {
        Self {
            schema: None,
            checks: CheckRegistry::new(),
            config: EngineConfig::default(),
            store: None,
            _schema_state: PhantomData,
        }
    }

    /// Sets the schema registry.
    pub fn schema(self, schema: impl Into<Arc<SchemaRegistry>>) -> JsonApiBuilder<HasSchema> {
        JsonApiBuilder {
            schema: Some(schema.into()),
            checks: self.checks,
            config: self.config,
            store: self.store,
            _schema_state: PhantomData,
        }
    }
}

impl Default for JsonApiBuilder<NoSchema> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> JsonApiBuilder<S> {
    /// Sets the check registry used to compile permission expressions.
    #[must_use]
    pub fn checks(mut self, checks: CheckRegistry) -> Self {
        self.checks = checks;
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `store` instead of the bundled in-memory store.
    ///
    /// The store must maintain the inverses declared in the schema it is
    /// given here.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.store = Some(store);
        self
    }
}

impl JsonApiBuilder<HasSchema> {
    /// Validates the configuration, compiles every permission expression,
    /// and builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`](crate::ErrorKind::Configuration)
    /// for invalid configuration or malformed permission expressions.
    pub fn build(self) -> Result<JsonApi> {
        let Some(schema) = self.schema else {
            return Err(crate::Error::configuration("no schema registry provided"));
        };

        if let Err(error) = self.config.validate() {
            tracing::warn!(error = %error, "invalid engine configuration");
            return Err(error);
        }

        let permissions = match schema.compile_permissions(&self.checks) {
            Ok(permissions) => permissions,
            Err(error) => {
                tracing::warn!(error = %error, "failed to compile permission expressions");
                return Err(error);
            },
        };

        let store = match self.store {
            Some(store) => store,
            None => Arc::new(InMemoryStore::with_id_strategy(schema.clone(), self.config.id_strategy)),
        };

        tracing::debug!(
            types = schema.len(),
            rules = permissions.rule_count(),
            id_strategy = %self.config.id_strategy,
            "engine built"
        );
        Ok(JsonApi { schema, permissions, store, config: self.config })
    }
}
