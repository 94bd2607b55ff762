//! Wire JSON -> domain record mapping, one [`Decode`] impl per entity kind.
//!
//! Required fields that are missing or mistyped are a [`DecodeError`];
//! embedded structures (tags, companies, contacts, custom fields) are
//! flattened to the first relevant element.

use std::collections::HashMap;

use chrono::DateTime;
use serde_json::Value;

use crate::api::Resource;
use crate::error::DecodeError;
use crate::model::{
    Company, Contact, EntityRef, Event, FieldValue, Lead, LossReason, Pipeline, Status, Task, User,
};

/// A domain record that can be decoded from one element of a page's
/// `_embedded.<key>` array.
pub trait Decode: Sized {
    const RESOURCE: Resource;

    fn decode(raw: &Value) -> Result<Self, DecodeError>;
}

/// Typed accessors over one wire object.
struct Fields<'a> {
    raw: &'a Value,
    resource: &'static str,
}

impl<'a> Fields<'a> {
    fn new(raw: &'a Value, resource: &'static str) -> Self {
        Self { raw, resource }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.raw.get(field).filter(|v| !v.is_null())
    }

    fn missing(&self, field: &str) -> DecodeError {
        DecodeError::MissingField {
            resource: self.resource,
            field: field.to_string(),
        }
    }

    fn invalid(&self, field: &str, expected: &str) -> DecodeError {
        DecodeError::InvalidField {
            resource: self.resource,
            field: field.to_string(),
            message: format!("expected {expected}"),
        }
    }

    fn i64(&self, field: &str) -> Result<i64, DecodeError> {
        self.opt_i64(field)?.ok_or_else(|| self.missing(field))
    }

    fn opt_i64(&self, field: &str) -> Result<Option<i64>, DecodeError> {
        match self.present(field) {
            None => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| self.invalid(field, "integer")),
        }
    }

    /// Unix seconds that chrono can represent.
    fn timestamp(&self, field: &str) -> Result<i64, DecodeError> {
        self.opt_timestamp(field)?.ok_or_else(|| self.missing(field))
    }

    fn opt_timestamp(&self, field: &str) -> Result<Option<i64>, DecodeError> {
        match self.opt_i64(field)? {
            Some(secs) if !is_representable(secs) => {
                Err(self.invalid(field, "unix timestamp in range"))
            }
            other => Ok(other),
        }
    }

    fn opt_f64(&self, field: &str) -> Result<Option<f64>, DecodeError> {
        match self.present(field) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| self.invalid(field, "number")),
        }
    }

    fn string(&self, field: &str) -> Result<String, DecodeError> {
        self.opt_string(field)?.ok_or_else(|| self.missing(field))
    }

    fn opt_string(&self, field: &str) -> Result<Option<String>, DecodeError> {
        match self.present(field) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.invalid(field, "string")),
        }
    }

    fn bool(&self, field: &str) -> Result<bool, DecodeError> {
        match self.present(field) {
            None => Err(self.missing(field)),
            Some(v) => v.as_bool().ok_or_else(|| self.invalid(field, "boolean")),
        }
    }

    /// First element of `_embedded.<key>`, if any.
    fn first_embedded(&self, key: &str) -> Option<&'a Value> {
        self.raw
            .get("_embedded")
            .and_then(|e| e.get(key))
            .and_then(Value::as_array)
            .and_then(|items| items.first())
    }
}

fn is_representable(secs: i64) -> bool {
    DateTime::from_timestamp(secs, 0).is_some()
}

/// Flattened `custom_fields_values`: field name -> first scalar value.
///
/// Object-valued entries are skipped. `PHONE` and `EMAIL` field codes are
/// additionally exposed under the `phone` / `email` keys.
#[derive(Debug, Default)]
struct CustomFields(HashMap<String, Value>);

impl CustomFields {
    const PHONE: &'static str = "phone";
    const EMAIL: &'static str = "email";

    fn from_raw(raw: &Value) -> Self {
        let mut map = HashMap::new();
        let Some(fields) = raw.get("custom_fields_values").and_then(Value::as_array) else {
            return Self(map);
        };

        for field in fields {
            let first = field
                .get("values")
                .and_then(Value::as_array)
                .and_then(|values| values.first())
                .and_then(|v| v.get("value"))
                .filter(|v| !v.is_null());
            let Some(value) = first else { continue };

            match field.get("field_code").and_then(Value::as_str) {
                Some("PHONE") => {
                    map.insert(Self::PHONE.to_string(), value.clone());
                }
                Some("EMAIL") => {
                    map.insert(Self::EMAIL.to_string(), value.clone());
                }
                _ => {}
            }

            if value.is_object() {
                continue;
            }
            if let Some(name) = field.get("field_name").and_then(Value::as_str) {
                map.insert(name.to_string(), value.clone());
            }
        }
        Self(map)
    }

    fn text(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse().ok(),
            _ => None,
        }
    }

    fn timestamp(&self, name: &str) -> Option<i64> {
        let secs = match self.0.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }?;
        is_representable(secs).then_some(secs)
    }
}

/// Lead custom fields, by their display names in the account.
mod lead_fields {
    pub const SOURCE: &str = "Источник";
    pub const PAYMENT_TYPE: &str = "Оплата";
    pub const READINESS_TO_BUY: &str = "Готовность купить";
    pub const OBJECT_TYPE: &str = "Тип объекта";
    pub const PURCHASE_PURPOSE: &str = "Цель покупки";
    pub const MEETING_FORMAT: &str = "Формат встречи";
    pub const MEETING_SCHEDULED_AT: &str = "Дата и время запланированной встречи";
    pub const ZOOM_LINK: &str = "Ссылка на зум встречу";
    pub const DEPOSIT_DATE: &str = "Дата задатка";
    pub const MEETING_CONDUCTED_DATE: &str = "Дата проведённой встречи";
    pub const DEAL_DATE: &str = "Дата сделки";
    pub const PAYMENT_METHOD: &str = "Способ оплаты";
    pub const DOWN_PAYMENT_PERCENT: &str = "Размер ПВ, %";
    pub const APARTMENT_NUMBER: &str = "Апартамент";
    pub const APARTMENT_COST: &str = "Стоимость апартамента";
    pub const APARTMENT_STATUS: &str = "Статус апартамента";
    pub const COMMENT: &str = "Комментарий";
    pub const REFERRER: &str = "referrer";
}

mod contact_fields {
    pub const POSITION: &str = "Position";
    pub const APARTMENT: &str = "Апартамент";
    pub const WAS_IN_BALI: &str = "Был на Бали";
    pub const GEOGRAPHY: &str = "География";
    pub const LANGUAGE: &str = "Язык";
}

mod company_fields {
    pub const BROKER: &str = "Брокер";
}

fn first_tag(f: &Fields<'_>) -> (Option<i64>, Option<String>) {
    match f.first_embedded("tags") {
        Some(tag) => (
            tag.get("id").and_then(Value::as_i64),
            tag.get("name").and_then(Value::as_str).map(String::from),
        ),
        None => (None, None),
    }
}

impl Decode for User {
    const RESOURCE: Resource = Resource::Users;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(raw, Self::RESOURCE.name());
        Ok(User {
            id: f.i64("id")?,
            name: f.string("name")?,
            email: f.string("email")?,
            lang: f.string("lang")?,
        })
    }
}

fn decode_status(raw: &Value) -> Result<Status, DecodeError> {
    let f = Fields::new(raw, "statuses");
    Ok(Status {
        id: f.i64("id")?,
        name: f.string("name")?,
        sort: f.i64("sort")?,
        is_editable: f.bool("is_editable")?,
        pipeline_id: f.i64("pipeline_id")?,
        color: f.string("color")?,
        status_type: f.i64("type")?,
        account_id: f.i64("account_id")?,
    })
}

impl Decode for Pipeline {
    const RESOURCE: Resource = Resource::Pipelines;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(raw, Self::RESOURCE.name());
        let statuses = raw
            .get("_embedded")
            .and_then(|e| e.get("statuses"))
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_status).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();

        Ok(Pipeline {
            id: f.i64("id")?,
            name: f.string("name")?,
            sort: f.i64("sort")?,
            is_main: f.bool("is_main")?,
            is_unsorted_on: f.bool("is_unsorted_on")?,
            is_archive: f.bool("is_archive")?,
            account_id: f.i64("account_id")?,
            statuses,
        })
    }
}

impl Decode for Company {
    const RESOURCE: Resource = Resource::Companies;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(raw, Self::RESOURCE.name());
        let custom = CustomFields::from_raw(raw);
        let (tag_id, tag_name) = first_tag(&f);

        Ok(Company {
            id: f.i64("id")?,
            name: f.string("name")?,
            responsible_user_id: f.i64("responsible_user_id")?,
            group_id: f.i64("group_id")?,
            created_by: f.i64("created_by")?,
            updated_by: f.i64("updated_by")?,
            created_at: f.timestamp("created_at")?,
            updated_at: f.timestamp("updated_at")?,
            account_id: f.i64("account_id")?,
            closest_task_at: f.opt_timestamp("closest_task_at")?,
            is_deleted: f.bool("is_deleted")?,
            tag_id,
            tag_name,
            phone: custom.text(CustomFields::PHONE),
            broker: custom.text(company_fields::BROKER),
        })
    }
}

impl Decode for Contact {
    const RESOURCE: Resource = Resource::Contacts;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(raw, Self::RESOURCE.name());
        let custom = CustomFields::from_raw(raw);
        let (tag_id, tag_name) = first_tag(&f);
        let company = f.first_embedded("companies");

        Ok(Contact {
            id: f.i64("id")?,
            name: f.string("name")?,
            first_name: f.opt_string("first_name")?,
            last_name: f.opt_string("last_name")?,
            responsible_user_id: f.i64("responsible_user_id")?,
            group_id: f.i64("group_id")?,
            created_by: f.i64("created_by")?,
            updated_by: f.i64("updated_by")?,
            created_at: f.timestamp("created_at")?,
            updated_at: f.timestamp("updated_at")?,
            closest_task_at: f.opt_timestamp("closest_task_at")?,
            is_deleted: f.bool("is_deleted")?,
            is_unsorted: f.bool("is_unsorted")?,
            account_id: f.i64("account_id")?,
            phone: custom.text(CustomFields::PHONE),
            email: custom.text(CustomFields::EMAIL),
            position: custom.text(contact_fields::POSITION),
            company_name: company
                .and_then(|c| c.get("name"))
                .and_then(Value::as_str)
                .map(String::from),
            company_id: company.and_then(|c| c.get("id")).and_then(Value::as_i64),
            tag_id,
            tag_name,
            apartment: custom.text(contact_fields::APARTMENT),
            was_in_bali: custom.text(contact_fields::WAS_IN_BALI),
            geography: custom.text(contact_fields::GEOGRAPHY),
            language: custom.text(contact_fields::LANGUAGE),
        })
    }
}

/// Decode `_embedded.loss_reason[0]`, taking `account_id` from the lead.
fn embedded_loss_reason(
    f: &Fields<'_>,
    account_id: i64,
) -> Result<Option<LossReason>, DecodeError> {
    let Some(raw) = f.first_embedded("loss_reason") else {
        return Ok(None);
    };
    let lr = Fields::new(raw, "loss_reasons");
    Ok(Some(LossReason {
        id: lr.i64("id")?,
        name: lr.string("name")?,
        sort: lr.opt_i64("sort")?,
        created_at: lr.opt_timestamp("created_at")?,
        updated_at: lr.opt_timestamp("updated_at")?,
        account_id,
    }))
}

impl Decode for Lead {
    const RESOURCE: Resource = Resource::Leads;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        use lead_fields as lf;

        let f = Fields::new(raw, Self::RESOURCE.name());
        let custom = CustomFields::from_raw(raw);
        let (tag_id, tag_name) = first_tag(&f);
        let account_id = f.i64("account_id")?;

        let company_id = f
            .first_embedded("companies")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64);
        let contact_id = f
            .first_embedded("contacts")
            .filter(|c| c.get("is_main").and_then(Value::as_bool).unwrap_or(false))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64);

        Ok(Lead {
            id: f.i64("id")?,
            name: f.string("name")?,
            price: f.opt_i64("price")?.unwrap_or(0),
            responsible_user_id: f.i64("responsible_user_id")?,
            group_id: f.i64("group_id")?,
            status_id: f.i64("status_id")?,
            pipeline_id: f.i64("pipeline_id")?,
            loss_reason_id: f.opt_i64("loss_reason_id")?,
            created_by: f.i64("created_by")?,
            updated_by: f.i64("updated_by")?,
            created_at: f.timestamp("created_at")?,
            updated_at: f.timestamp("updated_at")?,
            closed_at: f.opt_timestamp("closed_at")?,
            closest_task_at: f.opt_timestamp("closest_task_at")?,
            is_deleted: f.bool("is_deleted")?,
            score: f.opt_f64("score")?,
            account_id,
            labor_cost: f.opt_f64("labor_cost")?,
            source: custom.text(lf::SOURCE),
            payment_type: custom.text(lf::PAYMENT_TYPE),
            readiness_to_buy: custom.text(lf::READINESS_TO_BUY),
            object_type: custom.text(lf::OBJECT_TYPE),
            purchase_purpose: custom.text(lf::PURCHASE_PURPOSE),
            meeting_format: custom.text(lf::MEETING_FORMAT),
            meeting_scheduled_at: custom.timestamp(lf::MEETING_SCHEDULED_AT),
            zoom_link: custom.text(lf::ZOOM_LINK),
            deposit_date: custom.timestamp(lf::DEPOSIT_DATE),
            meeting_conducted_date: custom.timestamp(lf::MEETING_CONDUCTED_DATE),
            deal_date: custom.timestamp(lf::DEAL_DATE),
            payment_method: custom.text(lf::PAYMENT_METHOD),
            down_payment_percent: custom.number(lf::DOWN_PAYMENT_PERCENT),
            apartment_number: custom.text(lf::APARTMENT_NUMBER),
            apartment_cost: custom.number(lf::APARTMENT_COST),
            apartment_status: custom.text(lf::APARTMENT_STATUS),
            comment: custom.text(lf::COMMENT),
            referrer: custom.text(lf::REFERRER),
            tag_name,
            tag_id,
            company_id,
            contact_id,
            loss_reason: embedded_loss_reason(&f, account_id)?,
        })
    }
}

fn entity_ref(f: &Fields<'_>) -> Result<EntityRef, DecodeError> {
    let kind = f.opt_string("entity_type")?;
    let id = f.opt_i64("entity_id")?;
    Ok(EntityRef::from_wire(kind.as_deref(), id))
}

impl Decode for Task {
    const RESOURCE: Resource = Resource::Tasks;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(raw, Self::RESOURCE.name());
        let result = f.present("result").filter(|v| match v {
            Value::Object(o) => !o.is_empty(),
            Value::Array(a) => !a.is_empty(),
            _ => true,
        });

        Ok(Task {
            id: f.i64("id")?,
            created_by: f.i64("created_by")?,
            updated_by: f.i64("updated_by")?,
            created_at: f.timestamp("created_at")?,
            updated_at: f.timestamp("updated_at")?,
            responsible_user_id: f.i64("responsible_user_id")?,
            group_id: f.i64("group_id")?,
            entity: entity_ref(&f)?,
            duration: f.opt_i64("duration")?.unwrap_or(0),
            is_completed: f.bool("is_completed")?,
            task_type_id: f.i64("task_type_id")?,
            text: f.opt_string("text")?.unwrap_or_default(),
            result: result.cloned(),
            complete_till: f.timestamp("complete_till")?,
            account_id: f.i64("account_id")?,
        })
    }
}

/// `value_after` / `value_before`: first element's `custom_field_value`.
fn field_value(raw: &Value, side: &str) -> FieldValue {
    let Some(cfv) = raw
        .get(side)
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("custom_field_value"))
        .filter(|v| v.is_object())
    else {
        return FieldValue::default();
    };

    FieldValue {
        field_id: cfv.get("field_id").and_then(Value::as_i64),
        field_type: cfv.get("field_type").and_then(Value::as_i64),
        enum_id: cfv.get("enum_id").and_then(Value::as_i64),
        text: cfv.get("text").and_then(Value::as_str).map(String::from),
    }
}

impl Decode for Event {
    const RESOURCE: Resource = Resource::Events;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let f = Fields::new(raw, Self::RESOURCE.name());
        Ok(Event {
            id: f.string("id")?,
            event_type: f.string("type")?,
            entity: entity_ref(&f)?,
            created_by: f.i64("created_by")?,
            created_at: f.timestamp("created_at")?,
            account_id: f.i64("account_id")?,
            value_after: field_value(raw, "value_after"),
            value_before: field_value(raw, "value_before"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead_json() -> Value {
        json!({
            "id": 101,
            "name": "Villa deal",
            "price": 250000,
            "responsible_user_id": 5,
            "group_id": 0,
            "status_id": 143,
            "pipeline_id": 9,
            "loss_reason_id": 77,
            "created_by": 5,
            "updated_by": 5,
            "created_at": 1700000000,
            "updated_at": 1700000500,
            "closed_at": null,
            "closest_task_at": null,
            "is_deleted": false,
            "score": null,
            "account_id": 3000,
            "labor_cost": null,
            "custom_fields_values": [
                { "field_name": "Источник", "field_code": null, "values": [{ "value": "Instagram" }] },
                { "field_name": "Размер ПВ, %", "field_code": null, "values": [{ "value": "30" }] },
                { "field_name": "Дата сделки", "field_code": null, "values": [{ "value": 1700100000 }] },
                { "field_name": "Комментарий", "field_code": null, "values": [{ "value": { "nested": true } }] }
            ],
            "_embedded": {
                "tags": [{ "id": 4, "name": "hot" }],
                "companies": [{ "id": 12 }],
                "contacts": [{ "id": 55, "is_main": true }],
                "loss_reason": [{ "id": 77, "name": "Too expensive", "sort": 1, "created_at": 1690000000, "updated_at": 1690000000 }]
            }
        })
    }

    #[test]
    fn lead_flattens_embedded_structures() {
        let lead = Lead::decode(&lead_json()).unwrap();
        assert_eq!(lead.id, 101);
        assert_eq!(lead.source.as_deref(), Some("Instagram"));
        assert_eq!(lead.down_payment_percent, Some(30.0));
        assert_eq!(lead.deal_date, Some(1_700_100_000));
        assert_eq!(lead.comment, None);
        assert_eq!(lead.tag_id, Some(4));
        assert_eq!(lead.tag_name.as_deref(), Some("hot"));
        assert_eq!(lead.company_id, Some(12));
        assert_eq!(lead.contact_id, Some(55));

        let lr = lead.loss_reason.unwrap();
        assert_eq!(lr.id, 77);
        assert_eq!(lr.account_id, 3000);
    }

    #[test]
    fn lead_contact_requires_main_flag() {
        let mut raw = lead_json();
        raw["_embedded"]["contacts"] = json!([{ "id": 55, "is_main": false }]);
        assert_eq!(Lead::decode(&raw).unwrap().contact_id, None);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let mut raw = lead_json();
        raw.as_object_mut().unwrap().remove("status_id");
        let err = Lead::decode(&raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingField { resource: "leads", ref field } if field == "status_id"
        ));
    }

    #[test]
    fn mistyped_field_is_an_error() {
        let mut raw = lead_json();
        raw["id"] = json!("101");
        assert!(matches!(
            Lead::decode(&raw).unwrap_err(),
            DecodeError::InvalidField { .. }
        ));
    }

    #[test]
    fn out_of_range_timestamp_names_the_field() {
        let mut raw = lead_json();
        raw["created_at"] = json!(i64::MAX);
        let err = Lead::decode(&raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidField { resource: "leads", ref field, .. } if field == "created_at"
        ));
    }

    #[test]
    fn out_of_range_custom_date_is_dropped() {
        let mut raw = lead_json();
        raw["custom_fields_values"][2]["values"][0]["value"] = json!(i64::MAX);
        assert_eq!(Lead::decode(&raw).unwrap().deal_date, None);
    }

    #[test]
    fn contact_picks_phone_and_email_codes() {
        let raw = json!({
            "id": 55, "name": "Ann Lee", "first_name": "Ann", "last_name": "Lee",
            "responsible_user_id": 5, "group_id": 0, "created_by": 5, "updated_by": 5,
            "created_at": 1700000000, "updated_at": 1700000000,
            "is_deleted": false, "is_unsorted": false, "account_id": 3000,
            "custom_fields_values": [
                { "field_name": "Phone", "field_code": "PHONE", "values": [{ "value": "+6281234" }] },
                { "field_name": "Email", "field_code": "EMAIL", "values": [{ "value": "ann@example.com" }] },
                { "field_name": "Язык", "field_code": null, "values": [{ "value": "EN" }] }
            ],
            "_embedded": { "companies": [{ "id": 12, "name": "Acme" }], "tags": [] }
        });
        let contact = Contact::decode(&raw).unwrap();
        assert_eq!(contact.phone.as_deref(), Some("+6281234"));
        assert_eq!(contact.email.as_deref(), Some("ann@example.com"));
        assert_eq!(contact.language.as_deref(), Some("EN"));
        assert_eq!(contact.company_name.as_deref(), Some("Acme"));
        assert_eq!(contact.tag_id, None);
    }

    #[test]
    fn task_reference_and_empty_result() {
        let raw = json!({
            "id": 1, "created_by": 5, "updated_by": 5, "created_at": 1700000000,
            "updated_at": 1700000000, "responsible_user_id": 5, "group_id": 0,
            "entity_id": 999, "entity_type": "leads", "duration": 0,
            "is_completed": false, "task_type_id": 1, "text": "Call",
            "result": {}, "complete_till": 1700086400, "account_id": 3000
        });
        let task = Task::decode(&raw).unwrap();
        assert_eq!(task.entity, EntityRef::Lead(999));
        assert_eq!(task.result, None);
    }

    #[test]
    fn event_reads_custom_field_values() {
        let raw = json!({
            "id": "01h8x", "type": "custom_field_value_changed",
            "entity_id": 101, "entity_type": "leads",
            "created_by": 5, "created_at": 1700000000, "account_id": 3000,
            "value_after": [{ "custom_field_value": { "field_id": 9, "field_type": 4, "enum_id": 3, "text": "Zoom" } }],
            "value_before": []
        });
        let event = Event::decode(&raw).unwrap();
        assert_eq!(event.entity, EntityRef::Lead(101));
        assert_eq!(event.value_after.field_id, Some(9));
        assert_eq!(event.value_after.text.as_deref(), Some("Zoom"));
        assert_eq!(event.value_before, FieldValue::default());
    }

    #[test]
    fn pipeline_keeps_status_order() {
        let raw = json!({
            "id": 9, "name": "Sales", "sort": 1, "is_main": true,
            "is_unsorted_on": true, "is_archive": false, "account_id": 3000,
            "_embedded": { "statuses": [
                { "id": 2, "name": "New", "sort": 10, "is_editable": true, "pipeline_id": 9, "color": "#99ccff", "type": 1, "account_id": 3000 },
                { "id": 1, "name": "Won", "sort": 20, "is_editable": false, "pipeline_id": 9, "color": "#ccff66", "type": 0, "account_id": 3000 }
            ]}
        });
        let pipeline = Pipeline::decode(&raw).unwrap();
        let ids: Vec<i64> = pipeline.statuses.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
