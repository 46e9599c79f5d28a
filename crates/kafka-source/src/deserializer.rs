//! Deserializer dispatch for the engine.

use kafka_types::{
    deserialize_framed_avro, deserialize_framed_json, deserialize_json, deserialize_str, Decoded,
    DeserializationError, DeserializationKind, PayloadDeserializer,
};
use schema_registry::{SchemaCache, SchemaRegistry};

/// Decodes payloads, resolving Avro schemas through the run's cache.
pub struct Deserializers<'a, R: SchemaRegistry + ?Sized> {
    cache: &'a mut SchemaCache,
    registry: &'a R,
}

impl<'a, R: SchemaRegistry + ?Sized> Deserializers<'a, R> {
    pub fn new(cache: &'a mut SchemaCache, registry: &'a R) -> Self {
        Self { cache, registry }
    }
}

impl<R: SchemaRegistry + ?Sized> PayloadDeserializer for Deserializers<'_, R> {
    fn deserialize(
        &mut self,
        kind: DeserializationKind,
        data: &[u8],
    ) -> Result<Decoded, DeserializationError> {
        match kind {
            DeserializationKind::RawString => deserialize_str(data),
            DeserializationKind::PlainJson => deserialize_json(data),
            DeserializationKind::RegistryFramedJson => deserialize_framed_json(data),
            DeserializationKind::RegistryFramedAvro => {
                let cache = &mut *self.cache;
                let registry = self.registry;
                deserialize_framed_avro(data, move |schema_id| {
                    cache.get_or_fetch(schema_id, registry).map_err(|e| {
                        DeserializationError::SchemaResolution {
                            schema_id,
                            source: Box::new(e),
                        }
                    })
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::types::Value;
    use apache_avro::{to_avro_datum, Schema};
    use kafka_types::encode_frame;
    use schema_registry::InMemoryRegistry;

    const SCHEMA: &str = r#"{"type":"record","name":"R","fields":[{"name":"n","type":"long"}]}"#;

    #[test]
    fn test_avro_schema_fetched_lazily() {
        let mut registry = InMemoryRegistry::new();
        let id = registry.register("t-value", SCHEMA);
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let value = Value::Record(vec![("n".into(), Value::Long(3))]);
        let datum = to_avro_datum(&schema, value).unwrap();
        let payload = encode_frame(id, &datum);

        let mut cache = SchemaCache::new();
        let decoded = Deserializers::new(&mut cache, &registry)
            .deserialize(DeserializationKind::RegistryFramedAvro, &payload)
            .unwrap();

        assert_eq!(decoded.text, r#"{"n":3}"#);
        assert_eq!(decoded.schema_id, Some(id));
        assert!(cache.contains(id));
    }

    #[test]
    fn test_unknown_schema_id_is_resolution_error() {
        let registry = InMemoryRegistry::new();
        let mut cache = SchemaCache::new();
        let err = Deserializers::new(&mut cache, &registry)
            .deserialize(DeserializationKind::RegistryFramedAvro, &encode_frame(99, &[0]))
            .unwrap_err();
        assert!(matches!(
            err,
            DeserializationError::SchemaResolution { schema_id: 99, .. }
        ));
    }

    #[test]
    fn test_text_kinds_need_no_registry() {
        let registry = InMemoryRegistry::new();
        let mut cache = SchemaCache::new();
        let mut deserializers = Deserializers::new(&mut cache, &registry);

        let raw = deserializers
            .deserialize(DeserializationKind::RawString, b"hello")
            .unwrap();
        assert_eq!(raw.text, "hello");

        let json = deserializers
            .deserialize(DeserializationKind::PlainJson, br#"{ "a" : 1 }"#)
            .unwrap();
        assert_eq!(json.text, r#"{"a":1}"#);

        let framed = deserializers
            .deserialize(
                DeserializationKind::RegistryFramedJson,
                &encode_frame(4, br#"[1, 2]"#),
            )
            .unwrap();
        assert_eq!(framed.text, "[1,2]");
        assert_eq!(framed.schema_id, Some(4));
    }
}
