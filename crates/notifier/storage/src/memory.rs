//! In-memory storage implementation.
//!
//! A document map behind a lock, with the same single-document mutation
//! semantics as the SQLite backend. Deterministic iteration order (keyed by
//! document id) so fan-out results are stable.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use notifier_core::{Target, TargetKey};

use crate::{
    CredentialStore, StoreError, TargetFilter, TargetMutation, TargetStore, TenantCredential,
};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    targets: Arc<RwLock<BTreeMap<String, Target>>>,
    credentials: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(target: &Target, filter: &TargetFilter) -> bool {
    match filter {
        TargetFilter::Key(key) => target.id == key.doc_id(),
        TargetFilter::DeviceInApp { app_id, device_id } => {
            target.app_id == *app_id && target.device_index(device_id).is_some()
        }
        TargetFilter::TopicInApp {
            app_id,
            topic,
            exclude_users,
        } => {
            target.app_id == *app_id
                && target.has_topic(topic)
                && !exclude_users.contains(&target.user_id)
        }
        TargetFilter::App { app_id } => target.app_id == *app_id,
    }
}

fn apply(target: &mut Target, mutation: &TargetMutation) {
    match mutation {
        TargetMutation::PushDevice(device) => target.devices.push(device.clone()),
        TargetMutation::SetDeviceAt { index, device } => {
            if let Some(slot) = target.devices.get_mut(*index) {
                *slot = device.clone();
            }
        }
        TargetMutation::PullDevice { device_id } => {
            target.devices.retain(|d| d.device_id != *device_id);
        }
        TargetMutation::AddTopics(topics) => {
            for topic in topics {
                if !target.has_topic(topic) {
                    target.topics.push(topic.clone());
                }
            }
        }
        TargetMutation::PullTopics(topics) => {
            target.topics.retain(|t| !topics.contains(t));
        }
    }
}

impl TargetStore for InMemoryStore {
    async fn find_one(&self, filter: &TargetFilter) -> Result<Option<Target>, StoreError> {
        let targets = self
            .targets
            .read()
            .map_err(|_| StoreError::new("target map poisoned"))?;
        Ok(targets.values().find(|t| matches(t, filter)).cloned())
    }

    async fn insert_one(&self, target: Target) -> Result<(), StoreError> {
        let mut targets = self
            .targets
            .write()
            .map_err(|_| StoreError::new("target map poisoned"))?;
        if targets.contains_key(&target.id) {
            return Err(StoreError::new(format!(
                "duplicate key: target {} already exists",
                target.id
            )));
        }
        targets.insert(target.id.clone(), target);
        Ok(())
    }

    async fn update_one(
        &self,
        key: &TargetKey,
        mutation: &TargetMutation,
    ) -> Result<u64, StoreError> {
        let mut targets = self
            .targets
            .write()
            .map_err(|_| StoreError::new("target map poisoned"))?;
        match targets.get_mut(&key.doc_id()) {
            Some(target) => {
                apply(target, mutation);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_many(
        &self,
        filter: &TargetFilter,
        mutation: &TargetMutation,
    ) -> Result<u64, StoreError> {
        let mut targets = self
            .targets
            .write()
            .map_err(|_| StoreError::new("target map poisoned"))?;
        let mut matched = 0;
        for target in targets.values_mut().filter(|t| matches(t, filter)) {
            apply(target, mutation);
            matched += 1;
        }
        Ok(matched)
    }

    async fn find(&self, filter: &TargetFilter) -> Result<Vec<Target>, StoreError> {
        let targets = self
            .targets
            .read()
            .map_err(|_| StoreError::new("target map poisoned"))?;
        Ok(targets
            .values()
            .filter(|t| matches(t, filter))
            .cloned()
            .collect())
    }
}

impl CredentialStore for InMemoryStore {
    async fn upsert_credential(&self, app_id: &str, credential: &[u8]) -> Result<(), StoreError> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|_| StoreError::new("credential map poisoned"))?;
        credentials.insert(app_id.to_string(), credential.to_vec());
        Ok(())
    }

    async fn delete_credential(&self, app_id: &str) -> Result<(), StoreError> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|_| StoreError::new("credential map poisoned"))?;
        credentials.remove(app_id);
        Ok(())
    }

    async fn find_credential(&self, app_id: &str) -> Result<Option<TenantCredential>, StoreError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|_| StoreError::new("credential map poisoned"))?;
        Ok(credentials.get(app_id).map(|blob| TenantCredential {
            app_id: app_id.to_string(),
            credential: blob.clone(),
        }))
    }

    async fn list_credentials(&self) -> Result<Vec<TenantCredential>, StoreError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|_| StoreError::new("credential map poisoned"))?;
        Ok(credentials
            .iter()
            .map(|(app_id, blob)| TenantCredential {
                app_id: app_id.clone(),
                credential: blob.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_core::Device;

    fn device(id: &str, token: &str) -> Device {
        Device {
            device_id: id.into(),
            register_token: token.into(),
            model: "m".into(),
            platform: "p".into(),
        }
    }

    async fn seeded(store: &InMemoryStore, user: &str, app: &str) -> TargetKey {
        let key = TargetKey::new(user, app);
        store
            .insert_one(Target::with_device(&key, device("d1", "t1")))
            .await
            .unwrap();
        key
    }

    #[tokio::test]
    async fn test_update_one_against_absent_key_matches_zero() {
        let store = InMemoryStore::new();
        let matched = store
            .update_one(
                &TargetKey::new("ghost", "a1"),
                &TargetMutation::AddTopics(vec!["news".into()]),
            )
            .await
            .unwrap();
        assert_eq!(matched, 0);
        assert!(
            store
                .find_one(&TargetFilter::Key(TargetKey::new("ghost", "a1")))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_set_device_at_preserves_position() {
        let store = InMemoryStore::new();
        let key = seeded(&store, "u1", "a1").await;
        store
            .update_one(&key, &TargetMutation::PushDevice(device("d2", "t2")))
            .await
            .unwrap();
        store
            .update_one(
                &key,
                &TargetMutation::SetDeviceAt {
                    index: 0,
                    device: device("d1", "t1b"),
                },
            )
            .await
            .unwrap();

        let target = store
            .find_one(&TargetFilter::Key(key))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target.devices.len(), 2);
        assert_eq!(target.devices[0].register_token, "t1b");
        assert_eq!(target.devices[1].register_token, "t2");
    }

    #[tokio::test]
    async fn test_add_topics_absorbs_duplicates() {
        let store = InMemoryStore::new();
        let key = seeded(&store, "u1", "a1").await;
        store
            .update_one(
                &key,
                &TargetMutation::AddTopics(vec!["news".into(), "news".into()]),
            )
            .await
            .unwrap();
        store
            .update_one(&key, &TargetMutation::AddTopics(vec!["news".into()]))
            .await
            .unwrap();

        let target = store
            .find_one(&TargetFilter::Key(key))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target.topics, vec!["news".to_string()]);
    }

    #[tokio::test]
    async fn test_topic_filter_excludes_users() {
        let store = InMemoryStore::new();
        for user in ["u1", "u2"] {
            let key = seeded(&store, user, "a1").await;
            store
                .update_one(&key, &TargetMutation::AddTopics(vec!["news".into()]))
                .await
                .unwrap();
        }

        let filter = TargetFilter::TopicInApp {
            app_id: "a1".into(),
            topic: "news".into(),
            exclude_users: vec!["u1".into()],
        };
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user_id, "u2");

        let all_excluded = TargetFilter::TopicInApp {
            app_id: "a1".into(),
            topic: "news".into(),
            exclude_users: vec!["u1".into(), "u2".into()],
        };
        assert!(store.find(&all_excluded).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tenant_wide_topic_removal() {
        let store = InMemoryStore::new();
        for user in ["u1", "u2"] {
            let key = seeded(&store, user, "a1").await;
            store
                .update_one(
                    &key,
                    &TargetMutation::AddTopics(vec!["news".into(), "sport".into()]),
                )
                .await
                .unwrap();
        }

        let matched = store
            .update_many(
                &TargetFilter::App {
                    app_id: "a1".into(),
                },
                &TargetMutation::PullTopics(vec!["news".into()]),
            )
            .await
            .unwrap();
        assert_eq!(matched, 2);

        for user in ["u1", "u2"] {
            let target = store
                .find_one(&TargetFilter::Key(TargetKey::new(user, "a1")))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(target.topics, vec!["sport".to_string()]);
        }
    }
}
