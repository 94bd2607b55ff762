//! CRM API resources exported by a run.

use std::fmt;

/// One paginated collection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Pipelines,
    Companies,
    Contacts,
    Leads,
    Tasks,
    Events,
}

impl Resource {
    /// Short plural name, also the `_embedded` key of a page body.
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Pipelines => "pipelines",
            Resource::Companies => "companies",
            Resource::Contacts => "contacts",
            Resource::Leads => "leads",
            Resource::Tasks => "tasks",
            Resource::Events => "events",
        }
    }

    /// Path relative to the account base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Users => "api/v4/users",
            Resource::Pipelines => "api/v4/leads/pipelines",
            Resource::Companies => "api/v4/companies",
            Resource::Contacts => "api/v4/contacts",
            Resource::Leads => "api/v4/leads",
            Resource::Tasks => "api/v4/tasks",
            Resource::Events => "api/v4/events",
        }
    }

    pub fn embedded_key(&self) -> &'static str {
        self.name()
    }

    /// Related data the API only embeds on request.
    pub fn with_param(&self) -> Option<&'static str> {
        match self {
            Resource::Users => Some("roles,groups"),
            Resource::Leads => Some("loss_reason,contacts"),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
