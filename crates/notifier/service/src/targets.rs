//! Target registry: device and topic mutations plus token-resolution
//! queries over the target store.

use notifier_core::{Device, Target, TargetKey, TopicList};
use notifier_storage::{StoreError, TargetFilter, TargetMutation, TargetStore};

/// A device registration request.
#[derive(Debug, Clone)]
pub struct DeviceRegistration {
    pub device_id: String,
    pub token: String,
    pub model: String,
    pub platform: String,
}

impl DeviceRegistration {
    fn into_device(self) -> Device {
        Device {
            device_id: self.device_id,
            register_token: self.token,
            model: self.model,
            platform: self.platform,
        }
    }
}

/// Device/topic mutation logic and token-resolution queries, keyed by
/// `(userId, appId)`.
#[derive(Clone)]
pub struct TargetRegistry<S> {
    store: S,
}

impl<S: TargetStore> TargetRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a device, creating the target on first registration.
    ///
    /// A new device id is appended, preserving the order of earlier
    /// registrations; an existing device id is replaced at its position.
    /// Absence of a target is a valid precondition, never an error.
    pub async fn upsert_device(
        &self,
        user_id: &str,
        app_id: &str,
        registration: DeviceRegistration,
    ) -> Result<Device, StoreError> {
        let key = TargetKey::new(user_id, app_id);
        let device = registration.into_device();

        match self.store.find_one(&TargetFilter::Key(key.clone())).await? {
            None => {
                tracing::debug!(user_id, app_id, device_id = %device.device_id, "creating target");
                self.store
                    .insert_one(Target::with_device(&key, device.clone()))
                    .await?;
            }
            Some(target) => match target.device_index(&device.device_id) {
                None => {
                    tracing::debug!(user_id, app_id, device_id = %device.device_id, "appending device");
                    self.store
                        .update_one(&key, &TargetMutation::PushDevice(device.clone()))
                        .await?;
                }
                Some(index) => {
                    tracing::debug!(user_id, app_id, device_id = %device.device_id, "replacing device");
                    self.store
                        .update_one(
                            &key,
                            &TargetMutation::SetDeviceAt {
                                index,
                                device: device.clone(),
                            },
                        )
                        .await?;
                }
            },
        }

        Ok(device)
    }

    /// Remove a device by id. A missing target or device is a no-op success;
    /// deletion never creates anything.
    pub async fn delete_device(
        &self,
        user_id: &str,
        app_id: &str,
        device_id: &str,
    ) -> Result<(), StoreError> {
        let key = TargetKey::new(user_id, app_id);
        self.store
            .update_one(
                &key,
                &TargetMutation::PullDevice {
                    device_id: device_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    /// The target owning a device within a tenant, or `None`. The match is
    /// by device-sequence membership; callers scan the returned sequence for
    /// the exact token.
    pub async fn find_token_by_device(
        &self,
        device_id: &str,
        app_id: &str,
    ) -> Result<Option<Target>, StoreError> {
        self.store
            .find_one(&TargetFilter::DeviceInApp {
                app_id: app_id.to_string(),
                device_id: device_id.to_string(),
            })
            .await
    }

    /// A user's target with its device tokens, or `None`.
    pub async fn find_tokens_by_user(
        &self,
        user_id: &str,
        app_id: &str,
    ) -> Result<Option<Target>, StoreError> {
        self.store
            .find_one(&TargetFilter::Key(TargetKey::new(user_id, app_id)))
            .await
    }

    /// Every target in the tenant subscribed to a topic, minus excluded
    /// users. An empty result is not an error.
    pub async fn find_tokens_by_topic(
        &self,
        topic: &str,
        app_id: &str,
        exclude_users: Vec<String>,
    ) -> Result<Vec<Target>, StoreError> {
        self.store
            .find(&TargetFilter::TopicInApp {
                app_id: app_id.to_string(),
                topic: topic.to_string(),
                exclude_users,
            })
            .await
    }

    /// Add topics to a user's set; duplicates across the union are absorbed.
    /// Returns `false` when no target exists for the key (the conditional
    /// update matched zero documents), `true` otherwise.
    pub async fn add_topics(
        &self,
        user_id: &str,
        app_id: &str,
        topics: TopicList,
    ) -> Result<bool, StoreError> {
        let key = TargetKey::new(user_id, app_id);
        let matched = self
            .store
            .update_one(&key, &TargetMutation::AddTopics(topics.into_vec()))
            .await?;
        Ok(matched > 0)
    }

    /// Remove topics from a user's set; silent success when the target or
    /// any topic is absent.
    pub async fn remove_topics_from_user(
        &self,
        user_id: &str,
        app_id: &str,
        topics: TopicList,
    ) -> Result<(), StoreError> {
        let key = TargetKey::new(user_id, app_id);
        self.store
            .update_one(&key, &TargetMutation::PullTopics(topics.into_vec()))
            .await?;
        Ok(())
    }

    /// Tenant-wide removal of topics from every target.
    pub async fn remove_topics_from_all_users(
        &self,
        app_id: &str,
        topics: TopicList,
    ) -> Result<(), StoreError> {
        self.store
            .update_many(
                &TargetFilter::App {
                    app_id: app_id.to_string(),
                },
                &TargetMutation::PullTopics(topics.into_vec()),
            )
            .await?;
        Ok(())
    }

    /// A user's topics, empty when the target is absent.
    pub async fn find_topics_by_user(
        &self,
        user_id: &str,
        app_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let target = self
            .store
            .find_one(&TargetFilter::Key(TargetKey::new(user_id, app_id)))
            .await?;
        Ok(target.map(|t| t.topics).unwrap_or_default())
    }
}
