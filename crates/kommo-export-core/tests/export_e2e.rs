//! E2E tests for a full export run.
//!
//! A mockito server stands in for the CRM API, tokens live in a temp file
//! and records land in a temp SQLite database.

use kommo_export_core::auth::{FileTokenStore, OAuthTokens, TokenStore};
use kommo_export_core::storage::TokenStoreKind;
use kommo_export_core::{run_from_config, Config, ExportDb, ExportError, Stage};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    server: ServerGuard,
    dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let server = mockito::Server::new();
        let dir = TempDir::new().unwrap();

        let token_path = dir.path().join("token.json");
        FileTokenStore::new(&token_path)
            .save(&OAuthTokens {
                access_token: "e2e-token".into(),
                refresh_token: Some("e2e-refresh".into()),
                expires_at: Some(chrono::Utc::now().timestamp() + 3600),
                token_type: "Bearer".into(),
            })
            .unwrap();

        let mut config = Config::default();
        config.kommo.subdomain = "acme".into();
        config.kommo.integration_id = "integration".into();
        config.kommo.secret_key = "secret".into();
        config.kommo.redirect_url = "https://example.com/cb".into();
        config.kommo.base_url = Some(format!("{}/", server.url()));
        config.auth.token_store = TokenStoreKind::File;
        config.auth.token_path = Some(token_path);
        config.database.path = Some(dir.path().join("kommo.db"));

        Self {
            server,
            dir,
            config,
        }
    }

    /// Serve `records` as the single page of `resource`.
    fn page(&mut self, resource: &str, path: &str, records: Vec<Value>) -> Mock {
        self.server
            .mock("GET", path)
            .match_header("authorization", "Bearer e2e-token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/hal+json")
            .with_body(json!({ "_page": 1, "_embedded": { resource: records } }).to_string())
            .create()
    }

    fn db(&self) -> ExportDb {
        ExportDb::open(&self.dir.path().join("kommo.db")).unwrap()
    }
}

fn query_i64(db: &ExportDb, sql: &str) -> i64 {
    db.conn().query_row(sql, [], |r| r.get(0)).unwrap()
}

fn user(id: i64) -> Value {
    json!({ "id": id, "name": "Manager", "email": "m@example.com", "lang": "en" })
}

fn pipeline() -> Value {
    json!({
        "id": 1, "name": "Sales", "sort": 1, "is_main": true,
        "is_unsorted_on": false, "is_archive": false, "account_id": 30,
        "_embedded": { "statuses": [
            { "id": 142, "name": "Won", "sort": 10000, "is_editable": false,
              "pipeline_id": 1, "color": "#CCFF66", "type": 0, "account_id": 30 },
            { "id": 143, "name": "Lost", "sort": 11000, "is_editable": false,
              "pipeline_id": 1, "color": "#D5D8DB", "type": 0, "account_id": 30 }
        ]}
    })
}

fn contact(id: i64) -> Value {
    json!({
        "id": id, "name": format!("Contact {id}"), "responsible_user_id": 1, "group_id": 0,
        "created_by": 1, "updated_by": 1, "created_at": 1700000000, "updated_at": 1700000000,
        "is_deleted": false, "is_unsorted": false, "account_id": 30,
        "custom_fields_values": [
            { "field_name": "Телефон", "field_code": "PHONE", "values": [{ "value": "+100" }] }
        ]
    })
}

fn lead(id: i64, loss_reason: Option<i64>) -> Value {
    let mut raw = json!({
        "id": id, "name": format!("Lead {id}"), "price": 1000,
        "responsible_user_id": 1, "group_id": 0, "status_id": 143, "pipeline_id": 1,
        "created_by": 1, "updated_by": 1, "created_at": 1700000000, "updated_at": 1700000000,
        "is_deleted": false, "account_id": 30,
        "_embedded": { "tags": [], "companies": [], "contacts": [{ "id": 7, "is_main": true }] }
    });
    if let Some(lr) = loss_reason {
        raw["loss_reason_id"] = json!(lr);
        raw["_embedded"]["loss_reason"] =
            json!([{ "id": lr, "name": "Too expensive", "sort": 1 }]);
    }
    raw
}

fn task(id: i64, entity_type: &str, entity_id: i64) -> Value {
    json!({
        "id": id, "created_by": 1, "updated_by": 1,
        "created_at": 1700000000, "updated_at": 1700000000,
        "responsible_user_id": 1, "group_id": 0,
        "entity_type": entity_type, "entity_id": entity_id,
        "duration": 0, "is_completed": false, "task_type_id": 1, "text": "Follow up",
        "result": { "text": "done" }, "complete_till": 1700086400, "account_id": 30
    })
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn full_run_dedups_loss_reasons_and_clears_dangling_tasks() {
    let mut fx = Fixture::new();
    let _users = fx.page("users", "/api/v4/users", vec![user(1)]);
    let _pipelines = fx.page("pipelines", "/api/v4/leads/pipelines", vec![pipeline()]);
    let _companies = fx.page("companies", "/api/v4/companies", vec![]);
    let _contacts = fx.page("contacts", "/api/v4/contacts", vec![contact(7)]);
    let _leads = fx.page(
        "leads",
        "/api/v4/leads",
        vec![lead(1, Some(77)), lead(2, None)],
    );
    let _tasks = fx.page(
        "tasks",
        "/api/v4/tasks",
        vec![task(10, "leads", 1), task(11, "leads", 999), task(12, "contacts", 7)],
    );
    let _events = fx.page("events", "/api/v4/events", vec![]);

    let summary = run_from_config(&fx.config).unwrap();
    assert_eq!(summary.leads, 2);
    assert_eq!(summary.loss_reasons, 1);
    assert_eq!(summary.statuses, 2);
    assert_eq!(summary.tasks, 3);
    assert_eq!(summary.tasks_cleared, 1);

    let db = fx.db();
    assert_eq!(db.count("loss_reasons").unwrap(), 1);
    assert_eq!(db.count("tasks").unwrap(), 3);
    assert_eq!(
        query_i64(&db, "SELECT COUNT(*) FROM tasks WHERE entity_id IS NULL"),
        1
    );
    assert_eq!(
        query_i64(&db, "SELECT id FROM tasks WHERE entity_type IS NULL"),
        11
    );
    assert_eq!(
        query_i64(&db, "SELECT contact_id FROM leads WHERE id = 1"),
        7
    );
    let phone: String = db
        .conn()
        .query_row("SELECT phone FROM contacts WHERE id = 7", [], |r| r.get(0))
        .unwrap();
    assert_eq!(phone, "+100");
}

#[test]
fn rerun_is_idempotent() {
    let mut fx = Fixture::new();
    let _contacts = fx.page("contacts", "/api/v4/contacts", vec![contact(7)]);
    let _leads = fx.page("leads", "/api/v4/leads", vec![lead(1, Some(77))]);

    run_from_config(&fx.config).unwrap();
    run_from_config(&fx.config).unwrap();

    let db = fx.db();
    assert_eq!(db.count("leads").unwrap(), 1);
    assert_eq!(db.count("loss_reasons").unwrap(), 1);
    assert_eq!(db.count("contacts").unwrap(), 1);
}

#[test]
fn pagination_follows_pages_until_short_page() {
    let mut fx = Fixture::new();
    fx.config.export.page_size = 2;

    let pages: Vec<Mock> = [
        vec![contact(1), contact(2)],
        vec![contact(3), contact(4)],
        vec![contact(5)],
    ]
    .into_iter()
    .enumerate()
    .map(|(i, records)| {
        fx.server
            .mock("GET", "/api/v4/contacts")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), (i + 1).to_string()),
                Matcher::UrlEncoded("limit".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "_embedded": { "contacts": records } }).to_string())
            .expect(1)
            .create()
    })
    .collect();

    let summary = run_from_config(&fx.config).unwrap();
    assert_eq!(summary.contacts, 5);
    for page in &pages {
        page.assert();
    }
}

#[test]
fn fatal_error_keeps_earlier_stages() {
    let mut fx = Fixture::new();
    let _users = fx.page("users", "/api/v4/users", vec![user(1), user(2)]);
    let _contacts = fx.page("contacts", "/api/v4/contacts", vec![contact(7)]);
    let _leads = fx
        .server
        .mock("GET", "/api/v4/leads")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"_embedded": {"leads": [{"id": 1"#)
        .create();

    let err = run_from_config(&fx.config).unwrap_err();
    assert!(matches!(
        err,
        ExportError::Stage {
            stage: Stage::Leads,
            ..
        }
    ));

    let db = fx.db();
    assert_eq!(db.count("users").unwrap(), 2);
    assert_eq!(db.count("contacts").unwrap(), 1);
    assert_eq!(db.count("leads").unwrap(), 0);
}

#[test]
fn missing_credentials_fail_before_any_request() {
    let mut fx = Fixture::new();
    std::fs::remove_file(fx.dir.path().join("token.json")).unwrap();
    let users = fx
        .server
        .mock("GET", "/api/v4/users")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    let err = run_from_config(&fx.config).unwrap_err();
    assert!(err.to_string().contains("Not authenticated"), "{err}");
    users.assert();
}
