//! Tenant identifiers.
//!
//! A tenant names one customer schema in the shared MySQL server. Every
//! table reference is prefixed with the tenant identifier, so the
//! identifier is validated before any SQL is composed. The same gate is
//! applied to values read back from the `origin:{hostname}` KV mapping.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static TENANT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z][a-z0-9_]{0,63}$").expect("tenant pattern compiles"));

/// A validated tenant identifier.
///
/// Construction goes through [`Tenant::parse`], which enforces
/// `^[a-z][a-z0-9_]{0,63}$`. The identifier is immutable for the life of a
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Tenant(String);

impl Tenant {
    /// Validate and wrap a tenant identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        if TENANT_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::InvalidTenant(raw.to_string()))
        }
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify a table name with this tenant's schema prefix.
    ///
    /// The tenant has already passed the identifier gate, so the result is
    /// safe to splice into SQL.
    pub fn qualify(&self, table: &str) -> String {
        format!("{}.{}", self.0, table)
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tenant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Tenant {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Tenant::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse the value stored under `origin:{hostname}`.
///
/// Values have the shape `{tenant}.{rootDomain}`; only the leading tenant
/// segment is kept, and it must pass the tenant gate.
pub fn parse_origin_value(value: &str) -> Result<Tenant> {
    let segment = value
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidOrigin(value.to_string()))?;
    Tenant::parse(segment).map_err(|_| Error::InvalidOrigin(value.to_string()))
}
