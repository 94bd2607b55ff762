//! Domain records decoded from the CRM wire format.
//!
//! Timestamps are unix seconds as delivered by the API; conversion to
//! calendar time happens at the storage boundary.

use serde::{Deserialize, Serialize};

/// Polymorphic parent of a task or event.
///
/// The wire format carries two nullable fields (`entity_type`, `entity_id`).
/// A half-set pair cannot be represented here: decoding maps it to
/// [`EntityRef::None`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityRef {
    #[default]
    None,
    Lead(i64),
    Contact(i64),
    /// Any other kind (companies, customers, ...). Never reconciled.
    Other { kind: String, id: i64 },
}

impl EntityRef {
    pub const LEADS: &'static str = "leads";
    pub const CONTACTS: &'static str = "contacts";

    /// Build a reference from the two wire fields.
    pub fn from_wire(kind: Option<&str>, id: Option<i64>) -> Self {
        match (kind, id) {
            (Some(Self::LEADS), Some(id)) => EntityRef::Lead(id),
            (Some(Self::CONTACTS), Some(id)) => EntityRef::Contact(id),
            (Some(kind), Some(id)) => EntityRef::Other {
                kind: kind.to_string(),
                id,
            },
            _ => EntityRef::None,
        }
    }

    /// The `(entity_type, entity_id)` column pair.
    pub fn as_columns(&self) -> (Option<&str>, Option<i64>) {
        match self {
            EntityRef::None => (None, None),
            EntityRef::Lead(id) => (Some(Self::LEADS), Some(*id)),
            EntityRef::Contact(id) => (Some(Self::CONTACTS), Some(*id)),
            EntityRef::Other { kind, id } => (Some(kind.as_str()), Some(*id)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, EntityRef::None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub sort: i64,
    pub is_editable: bool,
    pub pipeline_id: i64,
    pub color: String,
    pub status_type: i64,
    pub account_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: i64,
    pub name: String,
    pub sort: i64,
    pub is_main: bool,
    pub is_unsorted_on: bool,
    pub is_archive: bool,
    pub account_id: i64,
    /// Ordered as delivered; persisted separately.
    pub statuses: Vec<Status>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub responsible_user_id: i64,
    pub group_id: i64,
    pub created_by: i64,
    pub updated_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub account_id: i64,
    pub closest_task_at: Option<i64>,
    pub is_deleted: bool,
    pub tag_id: Option<i64>,
    pub tag_name: Option<String>,
    pub phone: Option<String>,
    pub broker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub responsible_user_id: i64,
    pub group_id: i64,
    pub created_by: i64,
    pub updated_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub closest_task_at: Option<i64>,
    pub is_deleted: bool,
    pub is_unsorted: bool,
    pub account_id: i64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub tag_name: Option<String>,
    pub apartment: Option<String>,
    pub was_in_bali: Option<String>,
    pub geography: Option<String>,
    pub language: Option<String>,
}

/// Loss reason embedded in a lead. Shared across many leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossReason {
    pub id: i64,
    pub name: String,
    pub sort: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub account_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub responsible_user_id: i64,
    pub group_id: i64,
    pub status_id: i64,
    pub pipeline_id: i64,
    pub loss_reason_id: Option<i64>,
    pub created_by: i64,
    pub updated_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub closed_at: Option<i64>,
    pub closest_task_at: Option<i64>,
    pub is_deleted: bool,
    pub score: Option<f64>,
    pub account_id: i64,
    pub labor_cost: Option<f64>,
    pub source: Option<String>,
    pub payment_type: Option<String>,
    pub readiness_to_buy: Option<String>,
    pub object_type: Option<String>,
    pub purchase_purpose: Option<String>,
    pub meeting_format: Option<String>,
    pub meeting_scheduled_at: Option<i64>,
    pub zoom_link: Option<String>,
    pub deposit_date: Option<i64>,
    pub meeting_conducted_date: Option<i64>,
    pub deal_date: Option<i64>,
    pub payment_method: Option<String>,
    pub down_payment_percent: Option<f64>,
    pub apartment_number: Option<String>,
    pub apartment_cost: Option<f64>,
    pub apartment_status: Option<String>,
    pub comment: Option<String>,
    pub referrer: Option<String>,
    pub tag_name: Option<String>,
    pub tag_id: Option<i64>,
    pub company_id: Option<i64>,
    pub contact_id: Option<i64>,
    /// Embedded loss reason; persisted as its own record, not a lead column.
    pub loss_reason: Option<LossReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub created_by: i64,
    pub updated_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub responsible_user_id: i64,
    pub group_id: i64,
    pub entity: EntityRef,
    pub duration: i64,
    pub is_completed: bool,
    pub task_type_id: i64,
    pub text: String,
    /// Raw `result` object, `None` when the API sent an empty one.
    pub result: Option<serde_json::Value>,
    pub complete_till: i64,
    pub account_id: i64,
}

/// Snapshot of a custom field value on one side of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field_id: Option<i64>,
    pub field_type: Option<i64>,
    pub enum_id: Option<i64>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub entity: EntityRef,
    pub created_by: i64,
    pub created_at: i64,
    pub account_id: i64,
    pub value_after: FieldValue,
    pub value_before: FieldValue,
}
