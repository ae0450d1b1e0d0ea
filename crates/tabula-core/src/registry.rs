//! Table registry.
//!
//! The registry owns every table of a store and resolves them by name.
//! Tables keep a weak handle on it so foreign keys can reach the tables
//! they link without holding them alive.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tabula_common::{
    StoreConfig, TabulaError, TabulaResult, DEFAULT_CHANNEL, FOREIGN_KEY_TABLE_PREFIX,
    INDEX_TABLE_PREFIX,
};
use tracing::{debug, info, warn};

use crate::persistence::{JsonFileChannel, PersistenceChannel};
use crate::table::Table;

/// Permission to destroy a table.
///
/// Only the registry mints tokens, so `Table::destroy` cannot be reached
/// from outside it.
#[derive(Debug)]
pub struct DestroyToken {
    _private: (),
}

impl DestroyToken {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

#[derive(Debug)]
struct RegistryInner {
    config: StoreConfig,
    tables: RwLock<HashMap<String, Arc<Table>>>,
    channels: RwLock<HashMap<String, Arc<dyn PersistenceChannel>>>,
}

/// The set of tables of a store.
///
/// Cloning a registry is cheap; clones share the same tables.
///
/// # Example
///
/// ```rust
/// use tabula_core::{Column, TableRegistry};
/// use tabula_common::StoreConfig;
///
/// let registry = TableRegistry::new(StoreConfig::default()).unwrap();
/// let user = registry.create_table("user", 100).unwrap();
/// user.add_column(Column::string("name", 64)).unwrap();
/// user.create().unwrap();
///
/// assert!(registry.has_table("user"));
/// ```
#[derive(Debug, Clone)]
pub struct TableRegistry {
    inner: Arc<RegistryInner>,
}

impl TableRegistry {
    /// Creates an empty registry.
    ///
    /// The default persistence channel writes JSON files under the
    /// configured data directory.
    pub fn new(config: StoreConfig) -> TabulaResult<Self> {
        config.validate()?;
        let default: Arc<dyn PersistenceChannel> = Arc::new(JsonFileChannel::new(config.data_dir()));
        let mut channels = HashMap::new();
        channels.insert(DEFAULT_CHANNEL.to_string(), default);

        Ok(Self {
            inner: Arc::new(RegistryInner {
                config,
                tables: RwLock::new(HashMap::new()),
                channels: RwLock::new(channels),
            }),
        })
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Returns a weak handle on this registry.
    pub fn resolver(&self) -> TableResolver {
        TableResolver {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Creates and registers an empty table.
    pub fn create_table(&self, name: &str, max_rows: usize) -> TabulaResult<Arc<Table>> {
        let mut tables = self.inner.tables.write();
        if tables.contains_key(name) {
            return Err(TabulaError::TableExists {
                table: name.to_string(),
            });
        }
        let table = Arc::new(Table::new(name, max_rows));
        table.bind(self.resolver());
        tables.insert(name.to_string(), Arc::clone(&table));
        debug!(table = name, max_rows, "table registered");
        Ok(table)
    }

    /// Returns a table by name.
    pub fn get_table(&self, name: &str) -> TabulaResult<Arc<Table>> {
        self.inner
            .tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TabulaError::TableNotFound {
                table: name.to_string(),
            })
    }

    /// Returns true if a table is registered under `name`.
    pub fn has_table(&self, name: &str) -> bool {
        self.inner.tables.read().contains_key(name)
    }

    /// Returns the names of the registered tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Destroys a table and the adjacency tables of its foreign keys.
    ///
    /// Backing tables of indexes and foreign keys cannot be destroyed
    /// directly.
    pub fn destroy(&self, name: &str) -> TabulaResult<()> {
        if name.starts_with(INDEX_TABLE_PREFIX) || name.starts_with(FOREIGN_KEY_TABLE_PREFIX) {
            return Err(TabulaError::ForbiddenAction {
                action: format!("destroying backing table '{name}'"),
            });
        }

        let table = self
            .inner
            .tables
            .write()
            .remove(name)
            .ok_or_else(|| TabulaError::TableNotFound {
                table: name.to_string(),
            })?;

        for adjacency in table.destroy(DestroyToken::new()) {
            if let Some(backing) = self.inner.tables.write().remove(&adjacency) {
                backing.destroy(DestroyToken::new());
            }
        }
        info!(table = name, "table destroyed");
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Registers a persistence channel.
    pub fn set_channel(&self, name: &str, channel: Arc<dyn PersistenceChannel>) {
        self.inner
            .channels
            .write()
            .insert(name.to_string(), channel);
    }

    /// Replaces the default persistence channel.
    pub fn set_default_channel(&self, channel: Arc<dyn PersistenceChannel>) {
        self.set_channel(DEFAULT_CHANNEL, channel);
    }

    /// Returns a persistence channel by name.
    pub fn channel(&self, name: &str) -> TabulaResult<Arc<dyn PersistenceChannel>> {
        self.inner
            .channels
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TabulaError::ChannelNotFound {
                channel: name.to_string(),
            })
    }

    /// Writes a table through a channel, the default one if `None`.
    pub fn persist(&self, name: &str, channel: Option<&str>) -> TabulaResult<()> {
        let table = self.get_table(name)?;
        let channel_name = channel.unwrap_or(DEFAULT_CHANNEL);
        self.channel(channel_name)?.persist(name, &table)?;
        info!(table = name, channel = channel_name, rows = table.len(), "table persisted");
        Ok(())
    }

    /// Loads a table through a channel and registers it.
    ///
    /// A table already registered under the same name is replaced.
    pub fn load(&self, name: &str, channel: Option<&str>) -> TabulaResult<Arc<Table>> {
        let channel_name = channel.unwrap_or(DEFAULT_CHANNEL);
        let table = Arc::new(self.channel(channel_name)?.load(name)?);
        table.bind(self.resolver());

        if self
            .inner
            .tables
            .write()
            .insert(name.to_string(), Arc::clone(&table))
            .is_some()
        {
            warn!(table = name, "loaded table replaces a registered one");
        }
        info!(table = name, channel = channel_name, rows = table.len(), "table loaded");
        Ok(table)
    }
}

/// Weak handle on a registry, held by tables and foreign keys.
#[derive(Debug, Clone)]
pub struct TableResolver {
    inner: Weak<RegistryInner>,
}

impl TableResolver {
    /// Returns the registry, if it is still alive.
    pub fn registry(&self) -> TabulaResult<TableRegistry> {
        self.inner
            .upgrade()
            .map(|inner| TableRegistry { inner })
            .ok_or_else(|| TabulaError::configuration("table registry was dropped"))
    }

    /// Resolves a table by name.
    pub fn resolve(&self, name: &str) -> TabulaResult<Arc<Table>> {
        self.registry()?.get_table(name)
    }
}
