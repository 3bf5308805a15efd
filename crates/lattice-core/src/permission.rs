//! Actor abilities and column-level permissions
//!
//! An [`Ability`] is the resolved permission scope of one (actor, role)
//! pair: given an action and a set of candidate columns it answers which
//! subset the actor may touch. Policy families are modeled as enum
//! variants selected at resolution time rather than conditionals at every
//! call site.

use std::collections::{BTreeSet, HashMap};

use crate::backend::Record;

/// What the actor wants to do with a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
}

/// The requesting principal: an opaque id plus the roles it carries
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub id: Option<String>,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Per-column allow lists for the rule-table policy family
#[derive(Debug, Clone, Default)]
pub struct ColumnRules {
    readable: BTreeSet<String>,
    writable: BTreeSet<String>,
}

impl ColumnRules {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn readable(mut self, column: impl Into<String>) -> Self {
        self.readable.insert(column.into());
        self
    }

    #[must_use]
    pub fn writable(mut self, column: impl Into<String>) -> Self {
        self.writable.insert(column.into());
        self
    }

    #[must_use]
    pub fn read_write(self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.readable(column.clone()).writable(column)
    }

    fn allows(&self, column: &str, action: Action) -> bool {
        match action {
            Action::Read => self.readable.contains(column),
            Action::Write => self.writable.contains(column),
        }
    }
}

/// Resolved permission scope for one (actor, role) pair
#[derive(Debug, Clone)]
pub enum Ability {
    /// Every column, both actions
    AllowAll,
    /// No column, either action
    DenyAll,
    /// Explicit per-column rules
    Rules(ColumnRules),
}

impl Ability {
    pub fn allows(&self, column: &str, action: Action) -> bool {
        match self {
            Self::AllowAll => true,
            Self::DenyAll => false,
            Self::Rules(rules) => rules.allows(column, action),
        }
    }

    /// The subset of `columns` this ability permits for `action`,
    /// preserving input order
    pub fn filter_columns<'a, I>(&self, columns: I, action: Action) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        columns
            .into_iter()
            .filter(|c| self.allows(c, action))
            .map(str::to_string)
            .collect()
    }

    /// A copy of `record` keeping only permitted columns. An empty result
    /// on a read means the caller must report the record as absent.
    pub fn filter_record(&self, record: &Record, action: Action) -> Record {
        record
            .iter()
            .filter(|(k, _)| self.allows(k, action))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Resolves an actor's requested role to an ability
pub trait PermissionProvider: Send + Sync {
    fn resolve(&self, actor: &Actor, role: Option<&str>) -> Ability;
}

/// Provider that grants every actor full access. Useful for open tables
/// and tests.
pub struct OpenAccess;

impl PermissionProvider for OpenAccess {
    fn resolve(&self, _actor: &Actor, _role: Option<&str>) -> Ability {
        Ability::AllowAll
    }
}

/// Role-table policy: named roles map to abilities; anything else degrades
/// to the fallback ability instead of erroring
pub struct RoleTable {
    roles: HashMap<String, Ability>,
    fallback: Ability,
}

impl RoleTable {
    pub fn new(fallback: Ability) -> Self {
        Self {
            roles: HashMap::new(),
            fallback,
        }
    }

    #[must_use]
    pub fn role(mut self, name: impl Into<String>, ability: Ability) -> Self {
        self.roles.insert(name.into(), ability);
        self
    }
}

impl PermissionProvider for RoleTable {
    fn resolve(&self, actor: &Actor, role: Option<&str>) -> Ability {
        match role {
            // Requesting a role the actor does not carry degrades to the
            // fallback: existence of the role's scope is not revealed.
            Some(name) if actor.has_role(name) => self
                .roles
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
            _ => self.fallback.clone(),
        }
    }
}
