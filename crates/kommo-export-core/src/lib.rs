//! # kommo-export Core Library
//!
//! This library exports a Kommo CRM account (users, pipelines, companies,
//! contacts, leads, tasks, events) into a SQLite database. The
//! `kommo-export` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **API**: Blocking client plus a lazy, single-pass page iterator that
//!   stops at the first short page
//! - **Decoding**: One [`Decode`] impl per record kind, flattening tags,
//!   embedded relations and custom fields
//! - **Reconciliation**: Task and event parent references are cleared when
//!   the parent lead or contact was not part of the run
//! - **Storage**: SQLite upsert by primary key, one transaction per batch,
//!   plus TOML configuration
//! - **Auth**: Refreshable OAuth tokens in a file or the OS keyring
//!
//! ## Key Components
//!
//! - [`Exporter`]: Stage-ordered export run
//! - [`KommoClient`]: Paginated CRM API access
//! - [`AuthoritativeIds`]: Reference reconciliation
//! - [`ExportDb`]: Batch persistence
//! - [`Config`]: Exporter configuration management

pub mod api;
pub mod auth;
pub mod batch;
pub mod decode;
pub mod error;
pub mod export;
pub mod model;
pub mod reconcile;
pub mod storage;

pub use api::{fetch_all, KommoClient, PageSource, Pages, Resource};
pub use auth::{CredentialProvider, StaticCredential, TokenManager};
pub use batch::{upsert_in_batches, BatchError};
pub use decode::Decode;
pub use error::{ApiError, ConfigError, DatabaseError, DecodeError, ExportError, OAuthError};
pub use export::{run_from_config, ExportOptions, ExportSummary, Exporter, Stage};
pub use model::{
    Company, Contact, EntityRef, Event, FieldValue, Lead, LossReason, Pipeline, Status, Task, User,
};
pub use reconcile::{reconcile, reconcile_in_place, AuthoritativeIds, Referencing};
pub use storage::{Config, ExportDb, UpsertSink};
