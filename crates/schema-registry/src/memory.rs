//! In-memory registry.
//!
//! Behaves like the REST registry for the calls the consumer makes,
//! including the not-found error codes. Used for tests and offline runs.

use std::collections::HashMap;

use crate::error::{parse_error, RegistryError, Result};
use crate::registry::{RegisteredSchema, SchemaRegistry, SchemaType, SubjectVersion};

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    schemas: HashMap<u32, RegisteredSchema>,
    /// subject -> schema ids, index = version - 1
    subjects: HashMap<String, Vec<u32>>,
    /// subject -> (status, error code) returned by `subject_versions`
    failures: HashMap<String, (u16, u32)>,
    next_id: u32,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an Avro schema under `subject` and return its id.
    ///
    /// Identical schema text reuses the existing id, as the registry does.
    pub fn register(&mut self, subject: &str, schema: &str) -> u32 {
        self.register_typed(subject, schema, SchemaType::Avro)
    }

    pub fn register_typed(&mut self, subject: &str, schema: &str, schema_type: SchemaType) -> u32 {
        let existing = self
            .schemas
            .iter()
            .find(|(_, s)| s.schema == schema && s.schema_type == schema_type)
            .map(|(id, _)| *id);

        let id = match existing {
            Some(id) => id,
            None => {
                self.next_id += 1;
                let id = self.next_id;
                self.schemas.insert(
                    id,
                    RegisteredSchema {
                        schema: schema.to_string(),
                        schema_type,
                    },
                );
                id
            }
        };

        let versions = self.subjects.entry(subject.to_string()).or_default();
        if !versions.contains(&id) {
            versions.push(id);
        }
        id
    }

    /// Make `subject_versions(subject)` fail with the given status and code.
    pub fn fail_subject(&mut self, subject: &str, status: u16, error_code: u32) {
        self.failures
            .insert(subject.to_string(), (status, error_code));
    }
}

fn subject_not_found(subject: &str) -> RegistryError {
    RegistryError::SubjectNotFound(format!("Subject '{subject}' not found"))
}

impl SchemaRegistry for InMemoryRegistry {
    fn schema_by_id(&self, id: u32) -> Result<RegisteredSchema> {
        self.schemas
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::Api {
                status: 404,
                error_code: Some(40403),
                message: format!("Schema {id} not found"),
            })
    }

    fn subject_versions(&self, subject: &str) -> Result<Vec<u32>> {
        if let Some((status, error_code)) = self.failures.get(subject) {
            return Err(parse_error(
                *status,
                &format!(r#"{{"error_code":{error_code},"message":"injected failure"}}"#),
            ));
        }
        let ids = self
            .subjects
            .get(subject)
            .ok_or_else(|| subject_not_found(subject))?;
        Ok((1..=ids.len() as u32).collect())
    }

    fn subject_version(&self, subject: &str, version: u32) -> Result<SubjectVersion> {
        let ids = self
            .subjects
            .get(subject)
            .ok_or_else(|| subject_not_found(subject))?;
        let id = version
            .checked_sub(1)
            .and_then(|index| ids.get(index as usize))
            .ok_or_else(|| RegistryError::VersionNotFound(format!("Version {version} not found")))?;
        Ok(SubjectVersion {
            subject: subject.to_string(),
            version,
            id: *id,
        })
    }
}
