//! Reference reconciliation for tasks and events.
//!
//! Tasks and events are fetched independently of leads and contacts, so their
//! polymorphic parent may be missing from the current run (deleted, filtered,
//! or created after the lead pages were read). Before persisting, every
//! reference to a lead or contact that is not in the run's
//! [`AuthoritativeIds`] is cleared. Records are never dropped.
//!
//! Identifier `0` is not a valid entity id in the CRM and is treated the same
//! as a missing id.

use std::collections::HashSet;

use crate::model::{Contact, EntityRef, Event, Lead, Task};

/// Identifiers of the primary entities fetched in the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritativeIds {
    pub leads: HashSet<i64>,
    pub contacts: HashSet<i64>,
}

impl AuthoritativeIds {
    pub fn new(leads: HashSet<i64>, contacts: HashSet<i64>) -> Self {
        Self { leads, contacts }
    }

    /// Remember the leads fetched by the leads stage.
    pub fn record_leads(&mut self, leads: &[Lead]) {
        self.leads.extend(leads.iter().map(|l| l.id));
    }

    /// Remember the contacts fetched by the contacts stage.
    pub fn record_contacts(&mut self, contacts: &[Contact]) {
        self.contacts.extend(contacts.iter().map(|c| c.id));
    }

    /// Whether `reference` points at an entity known to this run.
    ///
    /// References of other kinds, and the empty reference, are always kept.
    pub fn keeps(&self, reference: &EntityRef) -> bool {
        match reference {
            EntityRef::Lead(id) => is_valid_id(*id) && self.leads.contains(id),
            EntityRef::Contact(id) => is_valid_id(*id) && self.contacts.contains(id),
            EntityRef::None | EntityRef::Other { .. } => true,
        }
    }
}

fn is_valid_id(id: i64) -> bool {
    id != 0
}

/// A record carrying a polymorphic parent reference.
pub trait Referencing {
    fn entity_ref(&self) -> &EntityRef;
    fn entity_ref_mut(&mut self) -> &mut EntityRef;
}

impl Referencing for Task {
    fn entity_ref(&self) -> &EntityRef {
        &self.entity
    }
    fn entity_ref_mut(&mut self) -> &mut EntityRef {
        &mut self.entity
    }
}

impl Referencing for Event {
    fn entity_ref(&self) -> &EntityRef {
        &self.entity
    }
    fn entity_ref_mut(&mut self) -> &mut EntityRef {
        &mut self.entity
    }
}

/// Clear dangling references in place. Returns how many were cleared.
pub fn reconcile_in_place<R: Referencing>(records: &mut [R], ids: &AuthoritativeIds) -> usize {
    let mut cleared = 0;
    for record in records.iter_mut() {
        if !ids.keeps(record.entity_ref()) {
            *record.entity_ref_mut() = EntityRef::None;
            cleared += 1;
        }
    }
    cleared
}

/// Same cardinality and order as the input; only references change.
pub fn reconcile<R: Referencing>(mut records: Vec<R>, ids: &AuthoritativeIds) -> Vec<R> {
    reconcile_in_place(&mut records, ids);
    records
}
