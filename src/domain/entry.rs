use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One scheduled uid. `(uid, region)` is unique within a tenant.
///
/// Wire names match the state file the bot has always written: `server` for
/// the region, and older files may lack `last_liked_at` / provenance
/// entirely; those deserialize as `None` and get filled in on the next
/// successful like or add.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEntry {
    pub uid: String,
    #[serde(rename = "server")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_liked_at: Option<i64>, // epoch seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<i64>,
}

/// Everything one tenant owns: an ordered auto-like list plus channel
/// configuration consumed by the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantState {
    #[serde(
        default,
        rename = "auto_like_channel",
        skip_serializing_if = "Option::is_none"
    )]
    pub notify_channel: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_channels: Vec<u64>,
    #[serde(default, rename = "auto_like_list")]
    pub entries: Vec<LikeEntry>,
}

impl TenantState {
    pub fn contains(&self, region: &str, uid: &str) -> bool {
        self.entry(region, uid).is_some()
    }

    pub fn entry(&self, region: &str, uid: &str) -> Option<&LikeEntry> {
        self.entries
            .iter()
            .find(|e| e.region == region && e.uid == uid)
    }

    pub fn entry_mut(&mut self, region: &str, uid: &str) -> Option<&mut LikeEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.region == region && e.uid == uid)
    }

    /// Remove `(uid, region)`; returns whether it was present.
    pub fn remove_entry(&mut self, region: &str, uid: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !(e.region == region && e.uid == uid));
        self.entries.len() != before
    }
}

/// The whole store at one instant, keyed by tenant id. BTreeMap so sweeps
/// visit tenants in a stable order; entries keep insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub servers: BTreeMap<String, TenantState>,
}

impl Snapshot {
    pub fn tenant(&self, tenant: &str) -> Option<&TenantState> {
        self.servers.get(tenant)
    }

    pub fn tenant_mut(&mut self, tenant: &str) -> &mut TenantState {
        self.servers.entry(tenant.to_string()).or_default()
    }
}
