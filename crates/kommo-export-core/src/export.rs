//! Export run orchestration.
//!
//! Stages run strictly in [`Stage::ORDER`]. Leads and contacts fetched early
//! form the [`AuthoritativeIds`] that task and event references are checked
//! against. The first fatal error aborts the run; batches committed by earlier
//! stages stay in the store.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{error, info};

use crate::api::{fetch_all, KommoClient, PageSource, DEFAULT_PAGE_SIZE};
use crate::auth;
use crate::batch::upsert_in_batches;
use crate::decode::Decode;
use crate::error::{ExportError, Result};
use crate::model::{Company, Contact, Event, Lead, LossReason, Pipeline, Status, Task, User};
use crate::reconcile::{reconcile_in_place, AuthoritativeIds};
use crate::storage::{Config, ExportConfig, ExportDb, Upsert, UpsertSink};

/// One step of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Users,
    Pipelines,
    Companies,
    Contacts,
    Leads,
    Tasks,
    Events,
}

impl Stage {
    /// Execution order. Later stages depend on ids collected by earlier ones.
    pub const ORDER: [Stage; 7] = [
        Stage::Users,
        Stage::Pipelines,
        Stage::Companies,
        Stage::Contacts,
        Stage::Leads,
        Stage::Tasks,
        Stage::Events,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Users => "users",
            Stage::Pipelines => "pipelines",
            Stage::Companies => "companies",
            Stage::Contacts => "contacts",
            Stage::Leads => "leads",
            Stage::Tasks => "tasks",
            Stage::Events => "events",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Paging and batching sizes for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub page_size: u32,
    pub batch_size: usize,
    pub event_batch_size: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: 100,
            event_batch_size: 50,
        }
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(cfg: &ExportConfig) -> Self {
        Self {
            page_size: cfg.page_size,
            batch_size: cfg.batch_size,
            event_batch_size: cfg.event_batch_size,
        }
    }
}

/// Record counts of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub users: usize,
    pub pipelines: usize,
    pub statuses: usize,
    pub companies: usize,
    pub contacts: usize,
    pub leads: usize,
    pub loss_reasons: usize,
    pub tasks: usize,
    pub tasks_cleared: usize,
    pub events: usize,
    pub events_cleared: usize,
    pub duration: Duration,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "users:        {}", self.users)?;
        writeln!(f, "pipelines:    {} ({} statuses)", self.pipelines, self.statuses)?;
        writeln!(f, "companies:    {}", self.companies)?;
        writeln!(f, "contacts:     {}", self.contacts)?;
        writeln!(f, "leads:        {} ({} loss reasons)", self.leads, self.loss_reasons)?;
        writeln!(
            f,
            "tasks:        {} ({} references cleared)",
            self.tasks, self.tasks_cleared
        )?;
        writeln!(
            f,
            "events:       {} ({} references cleared)",
            self.events, self.events_cleared
        )?;
        write!(f, "duration:     {:.1}s", self.duration.as_secs_f64())
    }
}

/// Distinct loss reasons embedded in `leads`, first occurrence wins.
pub fn unique_loss_reasons(leads: &[Lead]) -> Vec<LossReason> {
    let mut unique: IndexMap<i64, LossReason> = IndexMap::new();
    for reason in leads.iter().filter_map(|lead| lead.loss_reason.as_ref()) {
        unique.entry(reason.id).or_insert_with(|| reason.clone());
    }
    unique.into_values().collect()
}

/// Runs every stage against one page source and one sink.
pub struct Exporter<'a, P: PageSource + ?Sized, S: UpsertSink> {
    source: &'a P,
    sink: &'a mut S,
    options: ExportOptions,
}

impl<'a, P: PageSource + ?Sized, S: UpsertSink> Exporter<'a, P, S> {
    pub fn new(source: &'a P, sink: &'a mut S, options: ExportOptions) -> Self {
        Self {
            source,
            sink,
            options,
        }
    }

    /// Execute the whole run.
    ///
    /// # Errors
    /// The first fatal error, wrapped in [`ExportError::Stage`].
    pub fn run(&mut self) -> Result<ExportSummary> {
        let started = Instant::now();
        let mut summary = ExportSummary::default();

        if let Err(e) = self.run_stages(&mut summary) {
            error!(error = %e, "export aborted");
            return Err(e);
        }

        summary.duration = started.elapsed();
        info!(
            elapsed_ms = summary.duration.as_millis() as u64,
            "export finished"
        );
        Ok(summary)
    }

    fn run_stages(&mut self, summary: &mut ExportSummary) -> Result<()> {
        let mut ids = AuthoritativeIds::default();
        for stage in Stage::ORDER {
            self.run_stage(stage, &mut ids, summary)?;
        }
        Ok(())
    }

    /// Fetch and persist one stage. The contacts and leads stages record
    /// their ids in `ids` for the tasks and events stages.
    fn run_stage(
        &mut self,
        stage: Stage,
        ids: &mut AuthoritativeIds,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let batch = self.options.batch_size;
        match stage {
            Stage::Users => {
                let users = self.fetch::<User>(stage)?;
                summary.users = self.persist(stage, &users, batch)?;
            }
            Stage::Pipelines => {
                let pipelines = self.fetch::<Pipeline>(stage)?;
                summary.pipelines = self.persist(stage, &pipelines, batch)?;
                let statuses: Vec<Status> = pipelines
                    .iter()
                    .flat_map(|p| p.statuses.iter().cloned())
                    .collect();
                summary.statuses = self.persist(stage, &statuses, batch)?;
            }
            Stage::Companies => {
                let companies = self.fetch::<Company>(stage)?;
                summary.companies = self.persist(stage, &companies, batch)?;
            }
            Stage::Contacts => {
                let contacts = self.fetch::<Contact>(stage)?;
                summary.contacts = self.persist(stage, &contacts, batch)?;
                ids.record_contacts(&contacts);
            }
            Stage::Leads => {
                let leads = self.fetch::<Lead>(stage)?;
                let loss_reasons = unique_loss_reasons(&leads);
                info!(unique = loss_reasons.len(), "loss reasons found");
                summary.loss_reasons = self.persist(stage, &loss_reasons, batch)?;
                summary.leads = self.persist(stage, &leads, batch)?;
                ids.record_leads(&leads);
            }
            Stage::Tasks => {
                let mut tasks = self.fetch::<Task>(stage)?;
                summary.tasks_cleared = reconcile_in_place(&mut tasks, ids);
                info!(%stage, cleared = summary.tasks_cleared, "dangling references cleared");
                summary.tasks = self.persist(stage, &tasks, batch)?;
            }
            Stage::Events => {
                let mut events = self.fetch::<Event>(stage)?;
                summary.events_cleared = reconcile_in_place(&mut events, ids);
                info!(%stage, cleared = summary.events_cleared, "dangling references cleared");
                summary.events = self.persist(stage, &events, self.options.event_batch_size)?;
            }
        }
        Ok(())
    }

    /// Drain every page of `D` into memory.
    fn fetch<D: Decode>(&self, stage: Stage) -> Result<Vec<D>> {
        info!(%stage, "stage started");
        let mut records = Vec::new();
        for record in fetch_all::<P, D>(self.source, self.options.page_size) {
            match record {
                Ok(record) => records.push(record),
                Err(e) => return Err(e.in_stage(stage, records.len())),
            }
        }
        info!(%stage, fetched = records.len(), "records fetched");
        Ok(records)
    }

    fn persist<R: Upsert>(
        &mut self,
        stage: Stage,
        records: &[R],
        batch_size: usize,
    ) -> Result<usize> {
        let written = upsert_in_batches(&mut *self.sink, records, batch_size)
            .map_err(|e| ExportError::from(e.source).in_stage(stage, e.written))?;
        info!(%stage, table = R::TABLE, written, "records exported");
        Ok(written)
    }
}

/// Build the client, credential provider and store from `config` and run a
/// full export.
///
/// # Errors
/// Configuration, credential, storage or stage failures.
pub fn run_from_config(config: &Config) -> Result<ExportSummary> {
    config.validate()?;
    let credentials = auth::provider_from_config(config)?;
    let client = KommoClient::new(
        &config.base_url()?,
        Arc::clone(&credentials),
        Duration::from_secs(config.export.request_timeout_secs),
    )?;
    let db_path = config.database_path()?;
    info!(db = %db_path.display(), base_url = %client.base_url(), "starting export");
    let mut db = ExportDb::open(&db_path)?;

    Exporter::new(&client, &mut db, ExportOptions::from(&config.export)).run()
}
