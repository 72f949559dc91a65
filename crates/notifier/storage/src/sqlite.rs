//! SQLite storage implementation.
//!
//! The target document is decomposed into `targets`, `devices` (ordered by an
//! explicit position column) and `topics` (composite primary key, so topic
//! membership is a set). Each store operation runs in one transaction;
//! nothing spans documents.

use diesel::dsl::max;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;

use notifier_core::{Device, Target, TargetKey};

use crate::models::*;
use crate::schema::{devices, push_credentials, targets, topics};
use crate::{
    CredentialStore, StoreError, TargetFilter, TargetMutation, TargetStore, TenantCredential,
};

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
type PooledConn = diesel::r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-based storage.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage from a database URL.
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder().max_size(10).build(manager)?;

        Ok(Self { pool })
    }

    /// Run migrations.
    pub fn run_migrations(&self) -> Result<(), StoreError> {
        use diesel_migrations::MigrationHarness as _;

        let mut conn = self.pool.get()?;
        conn.run_pending_migrations(crate::MIGRATIONS)
            .map_err(|e| StoreError::new(format!("migration failed: {e}")))?;

        Ok(())
    }

    fn conn(&self) -> Result<PooledConn, StoreError> {
        Ok(self.pool.get()?)
    }
}

fn filter_ids(conn: &mut SqliteConnection, filter: &TargetFilter) -> QueryResult<Vec<String>> {
    match filter {
        TargetFilter::Key(key) => targets::table
            .filter(targets::id.eq(key.doc_id()))
            .select(targets::id)
            .load(conn),
        TargetFilter::DeviceInApp { app_id, device_id } => devices::table
            .inner_join(targets::table)
            .filter(targets::app_id.eq(app_id))
            .filter(devices::device_id.eq(device_id))
            .select(targets::id)
            .distinct()
            .order(targets::id.asc())
            .load(conn),
        TargetFilter::TopicInApp {
            app_id,
            topic,
            exclude_users,
        } => topics::table
            .inner_join(targets::table)
            .filter(targets::app_id.eq(app_id))
            .filter(topics::topic.eq(topic))
            .filter(targets::user_id.ne_all(exclude_users))
            .select(targets::id)
            .order(targets::id.asc())
            .load(conn),
        TargetFilter::App { app_id } => targets::table
            .filter(targets::app_id.eq(app_id))
            .select(targets::id)
            .order(targets::id.asc())
            .load(conn),
    }
}

fn load_target(conn: &mut SqliteConnection, target_id: &str) -> QueryResult<Option<Target>> {
    let row: Option<TargetRow> = targets::table
        .find(target_id)
        .first(conn)
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let device_rows: Vec<DeviceRow> = devices::table
        .filter(devices::target_id.eq(target_id))
        .order(devices::position.asc())
        .load(conn)?;

    let topic_list: Vec<String> = topics::table
        .filter(topics::target_id.eq(target_id))
        .select(topics::topic)
        .load(conn)?;

    Ok(Some(Target {
        id: row.id,
        user_id: row.user_id,
        app_id: row.app_id,
        devices: device_rows
            .into_iter()
            .map(|d| Device {
                device_id: d.device_id,
                register_token: d.register_token,
                model: d.model,
                platform: d.platform,
            })
            .collect(),
        topics: topic_list,
        emails: serde_json::from_str(&row.emails).unwrap_or_default(),
        sms: serde_json::from_str(&row.sms).unwrap_or_default(),
    }))
}

fn apply_mutation(
    conn: &mut SqliteConnection,
    target_id: &str,
    mutation: &TargetMutation,
) -> QueryResult<()> {
    match mutation {
        TargetMutation::PushDevice(device) => {
            let tail: Option<i32> = devices::table
                .filter(devices::target_id.eq(target_id))
                .select(max(devices::position))
                .first(conn)?;
            let new_device = NewDevice {
                target_id,
                position: tail.map_or(0, |p| p + 1),
                device_id: &device.device_id,
                register_token: &device.register_token,
                model: &device.model,
                platform: &device.platform,
            };
            diesel::insert_into(devices::table)
                .values(&new_device)
                .execute(conn)?;
        }
        TargetMutation::SetDeviceAt { index, device } => {
            // Positions may have holes after deletions; resolve the ordinal
            // index against the stored order.
            let positions: Vec<i32> = devices::table
                .filter(devices::target_id.eq(target_id))
                .order(devices::position.asc())
                .select(devices::position)
                .load(conn)?;
            if let Some(&position) = positions.get(*index) {
                diesel::update(
                    devices::table
                        .filter(devices::target_id.eq(target_id))
                        .filter(devices::position.eq(position)),
                )
                .set((
                    devices::device_id.eq(&device.device_id),
                    devices::register_token.eq(&device.register_token),
                    devices::model.eq(&device.model),
                    devices::platform.eq(&device.platform),
                ))
                .execute(conn)?;
            }
        }
        TargetMutation::PullDevice { device_id } => {
            diesel::delete(
                devices::table
                    .filter(devices::target_id.eq(target_id))
                    .filter(devices::device_id.eq(device_id)),
            )
            .execute(conn)?;
        }
        TargetMutation::AddTopics(topic_list) => {
            // SQLite cannot express a batch insert combined with ON CONFLICT in
            // a single diesel statement; insert each row individually, which is
            // behaviorally identical (insert-or-ignore per topic).
            for topic in topic_list.iter() {
                let row = NewTopic { target_id, topic };
                diesel::insert_into(topics::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }
        }
        TargetMutation::PullTopics(topic_list) => {
            diesel::delete(
                topics::table
                    .filter(topics::target_id.eq(target_id))
                    .filter(topics::topic.eq_any(topic_list)),
            )
            .execute(conn)?;
        }
    }

    let now = chrono::Utc::now().naive_utc();
    diesel::update(targets::table.find(target_id))
        .set(targets::updated_at.eq(now))
        .execute(conn)?;

    Ok(())
}

impl TargetStore for SqliteStorage {
    async fn find_one(&self, filter: &TargetFilter) -> Result<Option<Target>, StoreError> {
        let mut conn = self.conn()?;

        let ids = filter_ids(&mut conn, filter)?;
        match ids.first() {
            Some(id) => Ok(load_target(&mut conn, id)?),
            None => Ok(None),
        }
    }

    async fn insert_one(&self, target: Target) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let now = chrono::Utc::now().naive_utc();

        let emails = serde_json::to_string(&target.emails)
            .map_err(|e| StoreError::new(e.to_string()))?;
        let sms =
            serde_json::to_string(&target.sms).map_err(|e| StoreError::new(e.to_string()))?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let new_target = NewTarget {
                id: &target.id,
                user_id: &target.user_id,
                app_id: &target.app_id,
                emails: &emails,
                sms: &sms,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(targets::table)
                .values(&new_target)
                .execute(conn)?;

            for (position, device) in target.devices.iter().enumerate() {
                let new_device = NewDevice {
                    target_id: &target.id,
                    position: position as i32,
                    device_id: &device.device_id,
                    register_token: &device.register_token,
                    model: &device.model,
                    platform: &device.platform,
                };
                diesel::insert_into(devices::table)
                    .values(&new_device)
                    .execute(conn)?;
            }

            // SQLite cannot express a batch insert combined with ON CONFLICT in
            // a single diesel statement; insert each row individually, which is
            // behaviorally identical (insert-or-ignore per topic).
            for topic in target.topics.iter() {
                let row = NewTopic {
                    target_id: &target.id,
                    topic,
                };
                diesel::insert_into(topics::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }

            Ok(())
        })?;

        Ok(())
    }

    async fn update_one(
        &self,
        key: &TargetKey,
        mutation: &TargetMutation,
    ) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;
        let doc_id = key.doc_id();

        let matched = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let found: i64 = targets::table
                .filter(targets::id.eq(&doc_id))
                .count()
                .get_result(conn)?;
            if found == 0 {
                return Ok(0);
            }

            apply_mutation(conn, &doc_id, mutation)?;
            Ok(1)
        })?;

        Ok(matched)
    }

    async fn update_many(
        &self,
        filter: &TargetFilter,
        mutation: &TargetMutation,
    ) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;

        let matched = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let ids = filter_ids(conn, filter)?;
            for id in &ids {
                apply_mutation(conn, id, mutation)?;
            }
            Ok(ids.len() as u64)
        })?;

        Ok(matched)
    }

    async fn find(&self, filter: &TargetFilter) -> Result<Vec<Target>, StoreError> {
        let mut conn = self.conn()?;

        let ids = filter_ids(&mut conn, filter)?;
        let mut found = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(target) = load_target(&mut conn, id)? {
                found.push(target);
            }
        }

        Ok(found)
    }
}

impl CredentialStore for SqliteStorage {
    async fn upsert_credential(&self, app_id: &str, credential: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let now = chrono::Utc::now().naive_utc();

        let new_credential = NewCredential {
            app_id,
            credential,
            created_at: now,
        };

        diesel::insert_into(push_credentials::table)
            .values(&new_credential)
            .on_conflict(push_credentials::app_id)
            .do_update()
            .set(push_credentials::credential.eq(credential))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete_credential(&self, app_id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;

        diesel::delete(push_credentials::table.filter(push_credentials::app_id.eq(app_id)))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_credential(&self, app_id: &str) -> Result<Option<TenantCredential>, StoreError> {
        let mut conn = self.conn()?;

        let row: Option<CredentialRow> = push_credentials::table
            .find(app_id)
            .first(&mut conn)
            .optional()?;

        Ok(row.map(|r| TenantCredential {
            app_id: r.app_id,
            credential: r.credential,
        }))
    }

    async fn list_credentials(&self) -> Result<Vec<TenantCredential>, StoreError> {
        let mut conn = self.conn()?;

        let rows: Vec<CredentialRow> = push_credentials::table.load(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|r| TenantCredential {
                app_id: r.app_id,
                credential: r.credential,
            })
            .collect())
    }
}
