//! Storage traits.

use notifier_core::{Device, Target, TargetKey};

use crate::StoreError;

/// Filter selecting target documents.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetFilter {
    /// Exact document key.
    Key(TargetKey),
    /// Any target in the tenant whose device sequence contains the id.
    DeviceInApp { app_id: String, device_id: String },
    /// Targets in the tenant subscribed to the topic, minus excluded users.
    TopicInApp {
        app_id: String,
        topic: String,
        exclude_users: Vec<String>,
    },
    /// Every target in the tenant.
    App { app_id: String },
}

/// Single-document mutation. Each variant is atomic at the document level;
/// nothing here spans documents or operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetMutation {
    /// Append a device to the end of the sequence.
    PushDevice(Device),
    /// Replace the device at a sequence position, keeping the position.
    SetDeviceAt { index: usize, device: Device },
    /// Remove the device with the given id, if present.
    PullDevice { device_id: String },
    /// Union topics into the set; duplicates are absorbed.
    AddTopics(Vec<String>),
    /// Remove each listed topic, if present.
    PullTopics(Vec<String>),
}

/// Target document store.
///
/// `update_one` and `update_many` return the number of matched documents;
/// a conditional update against an absent key matches zero and is not an
/// error.
#[trait_variant::make(Send)]
pub trait TargetStore: Send + Sync {
    async fn find_one(&self, filter: &TargetFilter) -> Result<Option<Target>, StoreError>;

    async fn insert_one(&self, target: Target) -> Result<(), StoreError>;

    async fn update_one(
        &self,
        key: &TargetKey,
        mutation: &TargetMutation,
    ) -> Result<u64, StoreError>;

    async fn update_many(
        &self,
        filter: &TargetFilter,
        mutation: &TargetMutation,
    ) -> Result<u64, StoreError>;

    /// All matching targets, in a deterministic store order.
    async fn find(&self, filter: &TargetFilter) -> Result<Vec<Target>, StoreError>;
}

/// A tenant's persisted delivery credential.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantCredential {
    pub app_id: String,
    pub credential: Vec<u8>,
}

/// Persisted tenant delivery credentials, reloaded at startup and on
/// provisioning.
#[trait_variant::make(Send)]
pub trait CredentialStore: Send + Sync {
    async fn upsert_credential(&self, app_id: &str, credential: &[u8]) -> Result<(), StoreError>;

    async fn delete_credential(&self, app_id: &str) -> Result<(), StoreError>;

    async fn find_credential(&self, app_id: &str) -> Result<Option<TenantCredential>, StoreError>;

    async fn list_credentials(&self) -> Result<Vec<TenantCredential>, StoreError>;
}

/// Combined storage trait.
pub trait Storage: TargetStore + CredentialStore {}

impl<T> Storage for T where T: TargetStore + CredentialStore {}
