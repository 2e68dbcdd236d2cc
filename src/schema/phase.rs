//! Execution phases for assembled schema statements.
//!
//! Statements are grouped into bands that run in a dependency-safe order:
//! extensions install first, then types, tables, column alterations,
//! functions, indexes, triggers, and finally policies and grants. The
//! declaration order of the enum IS the execution order; `Ord` is derived
//! from it, so sorting by phase never needs numeric phase codes.

use std::fmt;

/// Execution band for a statement in the assembled schema.
///
/// Column alterations sit between table creation and function creation:
/// functions routinely reference columns added by later migrations, so
/// those additions must land before any function body is compiled.
/// `Other` is the catch-all and always runs last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Extensions,
    Types,
    Tables,
    ColumnAlterations,
    Functions,
    Indexes,
    Triggers,
    Policies,
    Other,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 9] = [
        Phase::Extensions,
        Phase::Types,
        Phase::Tables,
        Phase::ColumnAlterations,
        Phase::Functions,
        Phase::Indexes,
        Phase::Triggers,
        Phase::Policies,
        Phase::Other,
    ];

    /// Title used in phase separators, the output banner, and the
    /// distribution summary.
    pub fn title(self) -> &'static str {
        match self {
            Phase::Extensions => "Extensions",
            Phase::Types => "Types/Domains",
            Phase::Tables => "Tables",
            Phase::ColumnAlterations => "ALTER TABLE columns",
            Phase::Functions => "Functions",
            Phase::Indexes => "Indexes",
            Phase::Triggers => "Triggers",
            Phase::Policies => "Policies/RLS/Grants",
            Phase::Other => "Other (ALTER TABLE, INSERT, etc.)",
        }
    }

    /// 1-based position in execution order, for banners and summaries.
    pub fn number(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}
