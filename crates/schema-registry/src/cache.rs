//! Parsed-schema cache.
//!
//! Maps registry schema ids to parsed Avro schemas. Entries never change
//! once inserted. The cache has a single owner (one consumption run at a
//! time); it is not shared between threads.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use apache_avro::Schema;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};
use crate::registry::{topic_subjects, SchemaRegistry, SchemaType};

/// Fetch schema `id` and parse it as Avro.
pub fn fetch_parsed_schema<R: SchemaRegistry + ?Sized>(registry: &R, id: u32) -> Result<Schema> {
    let registered = registry.schema_by_id(id)?;
    if registered.schema_type != SchemaType::Avro {
        return Err(RegistryError::UnsupportedSchemaType {
            schema_id: id,
            schema_type: registered.schema_type.to_string(),
        });
    }
    Schema::parse_str(&registered.schema).map_err(|e| RegistryError::InvalidSchema {
        schema_id: id,
        source: Box::new(e),
    })
}

/// All Avro schemas registered under the key and value subjects of `topic`.
///
/// Subjects or versions the registry reports as not found are skipped.
/// Any other registry error is returned.
pub fn schemas_for_topic<R: SchemaRegistry + ?Sized>(
    registry: &R,
    topic: &str,
) -> Result<HashMap<u32, Schema>> {
    let mut schemas = HashMap::new();

    for subject in topic_subjects(topic) {
        match collect_subject(registry, &subject, &mut schemas) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!("No schemas for subject {subject}: {e}");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(schemas)
}

fn collect_subject<R: SchemaRegistry + ?Sized>(
    registry: &R,
    subject: &str,
    schemas: &mut HashMap<u32, Schema>,
) -> Result<()> {
    for version in registry.subject_versions(subject)? {
        let subject_version = registry.subject_version(subject, version)?;
        if schemas.contains_key(&subject_version.id) {
            continue;
        }
        match fetch_parsed_schema(registry, subject_version.id) {
            Ok(schema) => {
                schemas.insert(subject_version.id, schema);
            }
            Err(RegistryError::UnsupportedSchemaType {
                schema_id,
                schema_type,
            }) => {
                warn!("Skipping {schema_type} schema {schema_id} registered under {subject}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[derive(Debug, Default, Clone)]
pub struct SchemaCache {
    schemas: HashMap<u32, Schema>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.schemas.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&Schema> {
        self.schemas.get(&id)
    }

    /// Insert a parsed schema. An existing entry for `id` is kept.
    pub fn insert(&mut self, id: u32, schema: Schema) {
        self.schemas.entry(id).or_insert(schema);
    }

    /// Return the schema for `id`, fetching and parsing it on first use.
    pub fn get_or_fetch<R: SchemaRegistry + ?Sized>(
        &mut self,
        id: u32,
        registry: &R,
    ) -> Result<&Schema> {
        match self.schemas.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!("Schema {id} not cached, fetching from registry");
                let schema = fetch_parsed_schema(registry, id)?;
                Ok(entry.insert(schema))
            }
        }
    }

    /// Load every schema registered for `topic` before consumption starts.
    ///
    /// Returns the number of schemas found for the topic.
    pub fn prewarm_topic<R: SchemaRegistry + ?Sized>(
        &mut self,
        topic: &str,
        registry: &R,
    ) -> Result<usize> {
        let schemas = schemas_for_topic(registry, topic)?;
        let found = schemas.len();
        for (id, schema) in schemas {
            self.insert(id, schema);
        }
        info!("Cached {found} registry schemas for topic {topic}");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRegistry;
    use crate::registry::{RegisteredSchema, SubjectVersion};
    use std::cell::Cell;

    const INT_SCHEMA: &str = r#""int""#;
    const RECORD_SCHEMA: &str =
        r#"{"type":"record","name":"R","fields":[{"name":"a","type":"string"}]}"#;

    /// Counts `schema_by_id` calls to observe memoization.
    struct CountingRegistry {
        inner: InMemoryRegistry,
        fetches: Cell<usize>,
    }

    impl SchemaRegistry for CountingRegistry {
        fn schema_by_id(&self, id: u32) -> Result<RegisteredSchema> {
            self.fetches.set(self.fetches.get() + 1);
            self.inner.schema_by_id(id)
        }

        fn subject_versions(&self, subject: &str) -> Result<Vec<u32>> {
            self.inner.subject_versions(subject)
        }

        fn subject_version(&self, subject: &str, version: u32) -> Result<SubjectVersion> {
            self.inner.subject_version(subject, version)
        }
    }

    #[test]
    fn test_get_or_fetch_memoizes() {
        let mut inner = InMemoryRegistry::new();
        let id = inner.register("t-value", RECORD_SCHEMA);
        let registry = CountingRegistry {
            inner,
            fetches: Cell::new(0),
        };

        let mut cache = SchemaCache::new();
        cache.get_or_fetch(id, &registry).unwrap();
        cache.get_or_fetch(id, &registry).unwrap();

        assert_eq!(registry.fetches.get(), 1);
        assert!(cache.contains(id));
    }

    #[test]
    fn test_get_or_fetch_unknown_id_fails() {
        let registry = InMemoryRegistry::new();
        let mut cache = SchemaCache::new();
        assert!(cache.get_or_fetch(12, &registry).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_fetch_rejects_unparseable_schema() {
        let mut registry = InMemoryRegistry::new();
        let id = registry.register("t-value", "{not avro");
        let mut cache = SchemaCache::new();
        let err = cache.get_or_fetch(id, &registry).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn test_prewarm_collects_key_and_value_subjects() {
        let mut registry = InMemoryRegistry::new();
        let key_id = registry.register("orders-key", INT_SCHEMA);
        let v1 = registry.register("orders-value", RECORD_SCHEMA);
        let v2 = registry.register(
            "orders-value",
            r#"{"type":"record","name":"R","fields":[{"name":"b","type":"long"}]}"#,
        );
        registry.register("other-value", r#""string""#);

        let mut cache = SchemaCache::new();
        let found = cache.prewarm_topic("orders", &registry).unwrap();

        assert_eq!(found, 3);
        assert!(cache.contains(key_id));
        assert!(cache.contains(v1));
        assert!(cache.contains(v2));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_prewarm_swallows_missing_subjects() {
        let registry = InMemoryRegistry::new();
        let mut cache = SchemaCache::new();
        assert_eq!(cache.prewarm_topic("nothing", &registry).unwrap(), 0);
    }

    #[test]
    fn test_prewarm_propagates_other_errors() {
        let mut registry = InMemoryRegistry::new();
        registry.register("orders-value", RECORD_SCHEMA);
        registry.fail_subject("orders-key", 500, 50001);

        let mut cache = SchemaCache::new();
        let err = cache.prewarm_topic("orders", &registry).unwrap_err();
        assert_eq!(err.error_code(), Some(50001));
    }

    #[test]
    fn test_prewarm_skips_non_avro_schemas() {
        let mut registry = InMemoryRegistry::new();
        registry.register_typed("orders-key", r#"{"type":"string"}"#, SchemaType::Json);
        let value_id = registry.register("orders-value", RECORD_SCHEMA);

        let schemas = schemas_for_topic(&registry, "orders").unwrap();
        assert_eq!(schemas.len(), 1);
        assert!(schemas.contains_key(&value_id));
    }
}
