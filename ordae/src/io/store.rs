//! Persona storage collaborator.
//!
//! The [`PersonaStore`] trait decouples the executor from the storage backend
//! (currently a PostgREST-style HTTP API, see [`crate::io::rest_store`]). When
//! no backend is configured the loop runs against [`OfflineStore`] and writes
//! personas as local files instead.

use anyhow::{Result, anyhow};
use tracing::{debug, instrument};

use crate::core::catalog::Organization;
use crate::core::persona::PersonaRecord;

/// Abstraction over persona storage backends.
///
/// Every method may fail; callers treat failures as collaborator
/// unavailability and degrade rather than abort.
pub trait PersonaStore {
    /// Whether the backend is reachable at all. When `false`, callers skip it.
    fn is_connected(&self) -> bool;

    /// Store id of the organization whose catalog id is `id`.
    fn find_organization(&self, id: &str) -> Result<Option<String>>;

    fn organization_exists(&self, id: &str) -> Result<bool> {
        Ok(self.find_organization(id)?.is_some())
    }

    /// Create the organization and return its store id.
    fn create_organization(&self, org: &Organization) -> Result<String>;

    /// Whether a persona with this composite key is already stored.
    fn persona_exists(&self, key: &str) -> Result<bool>;

    /// Insert a persona row and return its store id.
    fn create_persona(
        &self,
        record: &PersonaRecord,
        owner_tag: &str,
        organization_id: &str,
    ) -> Result<String>;
}

/// Backend used when no store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

impl PersonaStore for OfflineStore {
    fn is_connected(&self) -> bool {
        false
    }

    fn find_organization(&self, _id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn create_organization(&self, org: &Organization) -> Result<String> {
        Err(anyhow!("persona store not connected; cannot create {}", org.id))
    }

    fn persona_exists(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    fn create_persona(
        &self,
        record: &PersonaRecord,
        _owner_tag: &str,
        _organization_id: &str,
    ) -> Result<String> {
        Err(anyhow!("persona store not connected; cannot create {}", record.id))
    }
}

/// Resolve the store id of `org`, creating the organization when absent.
#[instrument(skip_all, fields(org = %org.id))]
pub fn ensure_organization<S: PersonaStore + ?Sized>(store: &S, org: &Organization) -> Result<String> {
    if let Some(id) = store.find_organization(&org.id)? {
        debug!(store_id = %id, "organization already stored");
        return Ok(id);
    }
    let id = store.create_organization(org)?;
    debug!(store_id = %id, "created organization");
    Ok(id)
}
