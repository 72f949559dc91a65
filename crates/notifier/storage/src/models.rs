//! Database models.

use diesel::prelude::*;

use crate::schema::{devices, push_credentials, targets, topics};

/// Target record.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = targets)]
pub struct TargetRow {
    pub id: String,
    pub user_id: String,
    pub app_id: String,
    pub emails: String,
    pub sms: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// New target for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = targets)]
pub struct NewTarget<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub app_id: &'a str,
    pub emails: &'a str,
    pub sms: &'a str,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// Device record, one row per entry in a target's device sequence.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = devices)]
pub struct DeviceRow {
    pub id: i32,
    pub target_id: String,
    pub position: i32,
    pub device_id: String,
    pub register_token: String,
    pub model: String,
    pub platform: String,
}

/// New device for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = devices)]
pub struct NewDevice<'a> {
    pub target_id: &'a str,
    pub position: i32,
    pub device_id: &'a str,
    pub register_token: &'a str,
    pub model: &'a str,
    pub platform: &'a str,
}

/// Topic membership row; the composite primary key gives set semantics.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = topics)]
pub struct NewTopic<'a> {
    pub target_id: &'a str,
    pub topic: &'a str,
}

/// Tenant credential record.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = push_credentials, primary_key(app_id))]
pub struct CredentialRow {
    pub app_id: String,
    pub credential: Vec<u8>,
    pub created_at: chrono::NaiveDateTime,
}

/// New tenant credential for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = push_credentials)]
pub struct NewCredential<'a> {
    pub app_id: &'a str,
    pub credential: &'a [u8],
    pub created_at: chrono::NaiveDateTime,
}
