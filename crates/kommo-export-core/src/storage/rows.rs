//! Row mapping for every persisted record kind.

use chrono::DateTime;
use rusqlite::types::Value as SqlValue;

use crate::model::{
    Company, Contact, Event, FieldValue, Lead, LossReason, Pipeline, Status, Task, User,
};

/// A record that can be merged into its table by primary key.
///
/// `COLUMNS[0]` is the key; `values()` returns one value per column, in order.
pub trait Upsert {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<SqlValue>;
}

/// `INSERT ... ON CONFLICT(id) DO UPDATE` for `R`.
pub fn upsert_sql<R: Upsert>() -> String {
    let columns = R::COLUMNS.join(", ");
    let placeholders = (1..=R::COLUMNS.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = R::COLUMNS[1..]
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({columns}) VALUES ({placeholders})
         ON CONFLICT({key}) DO UPDATE SET {updates}",
        table = R::TABLE,
        key = R::COLUMNS[0],
    )
}

/// Unix seconds -> RFC 3339 UTC text.
fn ts(secs: i64) -> SqlValue {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| SqlValue::Text(dt.to_rfc3339()))
        .unwrap_or(SqlValue::Null)
}

/// Like [`ts`], with `None` and `0` both stored as NULL.
fn opt_ts(secs: Option<i64>) -> SqlValue {
    match secs {
        Some(s) if s != 0 => ts(s),
        _ => SqlValue::Null,
    }
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn opt_text(s: &Option<String>) -> SqlValue {
    s.clone().into()
}

impl Upsert for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "lang"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            text(&self.name),
            text(&self.email),
            text(&self.lang),
        ]
    }
}

impl Upsert for Pipeline {
    const TABLE: &'static str = "pipelines";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "sort",
        "is_main",
        "is_unsorted_on",
        "is_archive",
        "account_id",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            text(&self.name),
            self.sort.into(),
            self.is_main.into(),
            self.is_unsorted_on.into(),
            self.is_archive.into(),
            self.account_id.into(),
        ]
    }
}

impl Upsert for Status {
    const TABLE: &'static str = "statuses";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "sort",
        "is_editable",
        "pipeline_id",
        "color",
        "type",
        "account_id",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            text(&self.name),
            self.sort.into(),
            self.is_editable.into(),
            self.pipeline_id.into(),
            text(&self.color),
            self.status_type.into(),
            self.account_id.into(),
        ]
    }
}

impl Upsert for Company {
    const TABLE: &'static str = "companies";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "responsible_user_id",
        "group_id",
        "created_by",
        "updated_by",
        "created_at",
        "updated_at",
        "account_id",
        "closest_task_at",
        "is_deleted",
        "tag_id",
        "tag_name",
        "phone",
        "broker",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            text(&self.name),
            self.responsible_user_id.into(),
            self.group_id.into(),
            self.created_by.into(),
            self.updated_by.into(),
            ts(self.created_at),
            ts(self.updated_at),
            self.account_id.into(),
            opt_ts(self.closest_task_at),
            self.is_deleted.into(),
            self.tag_id.into(),
            opt_text(&self.tag_name),
            opt_text(&self.phone),
            opt_text(&self.broker),
        ]
    }
}

impl Upsert for Contact {
    const TABLE: &'static str = "contacts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "first_name",
        "last_name",
        "responsible_user_id",
        "group_id",
        "created_by",
        "updated_by",
        "created_at",
        "updated_at",
        "closest_task_at",
        "is_deleted",
        "is_unsorted",
        "account_id",
        "phone",
        "email",
        "position",
        "company_name",
        "company_id",
        "tag_id",
        "tag_name",
        "apartment",
        "was_in_bali",
        "geography",
        "language",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            text(&self.name),
            opt_text(&self.first_name),
            opt_text(&self.last_name),
            self.responsible_user_id.into(),
            self.group_id.into(),
            self.created_by.into(),
            self.updated_by.into(),
            ts(self.created_at),
            ts(self.updated_at),
            opt_ts(self.closest_task_at),
            self.is_deleted.into(),
            self.is_unsorted.into(),
            self.account_id.into(),
            opt_text(&self.phone),
            opt_text(&self.email),
            opt_text(&self.position),
            opt_text(&self.company_name),
            self.company_id.into(),
            self.tag_id.into(),
            opt_text(&self.tag_name),
            opt_text(&self.apartment),
            opt_text(&self.was_in_bali),
            opt_text(&self.geography),
            opt_text(&self.language),
        ]
    }
}

impl Upsert for LossReason {
    const TABLE: &'static str = "loss_reasons";
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "sort", "created_at", "updated_at", "account_id"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            text(&self.name),
            self.sort.into(),
            opt_ts(self.created_at),
            opt_ts(self.updated_at),
            self.account_id.into(),
        ]
    }
}

impl Upsert for Lead {
    const TABLE: &'static str = "leads";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "price",
        "responsible_user_id",
        "group_id",
        "status_id",
        "pipeline_id",
        "loss_reason_id",
        "created_by",
        "updated_by",
        "created_at",
        "updated_at",
        "closed_at",
        "closest_task_at",
        "is_deleted",
        "score",
        "account_id",
        "labor_cost",
        "source",
        "payment_type",
        "readiness_to_buy",
        "object_type",
        "purchase_purpose",
        "meeting_format",
        "meeting_scheduled_at",
        "zoom_link",
        "deposit_date",
        "meeting_conducted_date",
        "deal_date",
        "payment_method",
        "down_payment_percent",
        "apartment_number",
        "apartment_cost",
        "apartment_status",
        "comment",
        "referrer",
        "tag_name",
        "tag_id",
        "company_id",
        "contact_id",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            text(&self.name),
            self.price.into(),
            self.responsible_user_id.into(),
            self.group_id.into(),
            self.status_id.into(),
            self.pipeline_id.into(),
            self.loss_reason_id.into(),
            self.created_by.into(),
            self.updated_by.into(),
            ts(self.created_at),
            ts(self.updated_at),
            opt_ts(self.closed_at),
            opt_ts(self.closest_task_at),
            self.is_deleted.into(),
            self.score.into(),
            self.account_id.into(),
            self.labor_cost.into(),
            opt_text(&self.source),
            opt_text(&self.payment_type),
            opt_text(&self.readiness_to_buy),
            opt_text(&self.object_type),
            opt_text(&self.purchase_purpose),
            opt_text(&self.meeting_format),
            opt_ts(self.meeting_scheduled_at),
            opt_text(&self.zoom_link),
            opt_ts(self.deposit_date),
            opt_ts(self.meeting_conducted_date),
            opt_ts(self.deal_date),
            opt_text(&self.payment_method),
            self.down_payment_percent.into(),
            opt_text(&self.apartment_number),
            self.apartment_cost.into(),
            opt_text(&self.apartment_status),
            opt_text(&self.comment),
            opt_text(&self.referrer),
            opt_text(&self.tag_name),
            self.tag_id.into(),
            self.company_id.into(),
            self.contact_id.into(),
        ]
    }
}

impl Upsert for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "created_by",
        "updated_by",
        "created_at",
        "updated_at",
        "responsible_user_id",
        "group_id",
        "entity_id",
        "entity_type",
        "duration",
        "is_completed",
        "task_type_id",
        "text",
        "result",
        "complete_till",
        "account_id",
    ];

    fn values(&self) -> Vec<SqlValue> {
        let (entity_type, entity_id) = self.entity.as_columns();
        vec![
            self.id.into(),
            self.created_by.into(),
            self.updated_by.into(),
            ts(self.created_at),
            ts(self.updated_at),
            self.responsible_user_id.into(),
            self.group_id.into(),
            entity_id.into(),
            entity_type.map(str::to_string).into(),
            self.duration.into(),
            self.is_completed.into(),
            self.task_type_id.into(),
            text(&self.text),
            self.result.as_ref().map(|r| r.to_string()).into(),
            ts(self.complete_till),
            self.account_id.into(),
        ]
    }
}

fn field_value_columns(v: &FieldValue) -> [SqlValue; 4] {
    [
        v.field_id.into(),
        v.field_type.into(),
        v.enum_id.into(),
        opt_text(&v.text),
    ]
}

impl Upsert for Event {
    const TABLE: &'static str = "events";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "type",
        "entity_id",
        "entity_type",
        "created_by",
        "created_at",
        "account_id",
        "value_after_field_id",
        "value_after_field_type",
        "value_after_enum_id",
        "value_after_text",
        "value_before_field_id",
        "value_before_field_type",
        "value_before_enum_id",
        "value_before_text",
    ];

    fn values(&self) -> Vec<SqlValue> {
        let (entity_type, entity_id) = self.entity.as_columns();
        let mut values = vec![
            text(&self.id),
            text(&self.event_type),
            entity_id.into(),
            entity_type.map(str::to_string).into(),
            self.created_by.into(),
            ts(self.created_at),
            self.account_id.into(),
        ];
        values.extend(field_value_columns(&self.value_after));
        values.extend(field_value_columns(&self.value_before));
        values
    }
}
