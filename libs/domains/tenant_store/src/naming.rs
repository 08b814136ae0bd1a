//! Tenant-scoped collection naming.
//!
//! Every collection a tenant touches is addressed by a [`CollectionKey`] of the
//! form `tenant_<tenant>_<name>`. Tenant ids may contain `_`; collection names
//! may not, so the name is always the text after the last `_` and the mapping
//! from `(tenant, name)` to key is injective.

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{TenantStoreError, TenantStoreResult};

/// Prefix shared by every tenant-owned collection key.
pub const KEY_PREFIX: &str = "tenant_";

/// Separator between the tenant and the collection name.
pub const SEPARATOR: char = '_';

/// Longest key accepted (Qdrant's collection name limit).
pub const MAX_KEY_LEN: usize = 255;

/// Characters that backends refuse in collection names.
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

fn check_chars(kind: &str, value: &str) -> TenantStoreResult<()> {
    if value.is_empty() {
        return Err(TenantStoreError::InvalidIdentifier(format!(
            "{} must not be empty",
            kind
        )));
    }

    if let Some(c) = value
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN.contains(c))
    {
        return Err(TenantStoreError::InvalidIdentifier(format!(
            "{} '{}' contains forbidden character {:?}",
            kind, value, c
        )));
    }

    Ok(())
}

/// Opaque tenant identifier, used only as a namespace key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(value: impl Into<String>) -> TenantStoreResult<Self> {
        let value = value.into();
        check_chars("Tenant id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical collection name within a tenant. Never contains [`SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(value: impl Into<String>) -> TenantStoreResult<Self> {
        let value = value.into();
        check_chars("Collection name", &value)?;

        if value.contains(SEPARATOR) {
            return Err(TenantStoreError::InvalidIdentifier(format!(
                "Collection name '{}' must not contain '{}'",
                value, SEPARATOR
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend collection identifier derived from a tenant and a collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CollectionKey(String);

impl CollectionKey {
    pub fn new(tenant: &TenantId, name: &CollectionName) -> TenantStoreResult<Self> {
        let key = format!("{}{}{}{}", KEY_PREFIX, tenant, SEPARATOR, name);

        if key.len() > MAX_KEY_LEN {
            return Err(TenantStoreError::InvalidIdentifier(format!(
                "Collection key for tenant '{}' and collection '{}' exceeds {} bytes",
                tenant, name, MAX_KEY_LEN
            )));
        }

        Ok(Self(key))
    }

    /// Split a key back into the tenant and collection name it was built from.
    pub fn parse(key: &str) -> TenantStoreResult<(TenantId, CollectionName)> {
        let invalid = || TenantStoreError::InvalidIdentifier(format!("'{}' is not a tenant key", key));

        let rest = key.strip_prefix(KEY_PREFIX).ok_or_else(invalid)?;
        let (tenant, name) = rest.rsplit_once(SEPARATOR).ok_or_else(invalid)?;

        Ok((TenantId::new(tenant)?, CollectionName::new(name)?))
    }

    /// Whether this key was derived from `tenant`.
    pub fn belongs_to(&self, tenant: &TenantId) -> bool {
        Self::parse(&self.0)
            .map(|(owner, _)| &owner == tenant)
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CollectionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the collection key for `tenant`/`name`, validating both inputs.
pub fn compose(tenant: &str, name: &str) -> TenantStoreResult<CollectionKey> {
    CollectionKey::new(&TenantId::new(tenant)?, &CollectionName::new(name)?)
}
