//! Statement classification.
//!
//! Assigns each statement to an execution phase by inspecting its first
//! non-blank, non-comment line, upper-cased. Rules apply in a fixed
//! priority order and the first match wins; a statement no rule claims
//! lands in the catch-all phase, which runs last.

use std::sync::LazyLock;

use regex::Regex;

use super::phase::Phase;

static CREATE_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CREATE\s+(TYPE|DOMAIN)").unwrap());

static CREATE_TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CREATE\s+TABLE").unwrap());

/// Classifies a statement into its execution phase.
///
/// Two rules scan the whole body rather than the first line alone:
/// column alterations and row-level-security toggles both usually carry
/// the deciding keywords after a line break.
pub fn classify(sql: &str) -> Phase {
    let Some(first_line) = sql
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("--"))
    else {
        return Phase::Other;
    };
    let first = first_line.to_uppercase();

    if first.contains("CREATE EXTENSION") {
        return Phase::Extensions;
    }
    if CREATE_TYPE_RE.is_match(&first) {
        return Phase::Types;
    }
    if CREATE_TABLE_RE.is_match(&first) {
        return Phase::Tables;
    }
    if first.contains("ALTER TABLE") && alters_columns(sql) {
        return Phase::ColumnAlterations;
    }
    if first.contains("FUNCTION") && (first.contains("CREATE") || first.contains("DROP")) {
        return Phase::Functions;
    }
    if first.contains("CREATE") && first.contains("INDEX") {
        return Phase::Indexes;
    }
    if first.contains("TRIGGER") && (first.contains("CREATE") || first.contains("DROP")) {
        return Phase::Triggers;
    }
    if first.contains("ALTER TABLE") && enables_row_level_security(sql) {
        return Phase::Policies;
    }
    if ["CREATE POLICY", "DROP POLICY", "GRANT", "REVOKE"]
        .iter()
        .any(|kw| first.contains(kw))
    {
        return Phase::Policies;
    }

    Phase::Other
}

fn alters_columns(sql: &str) -> bool {
    let body = sql.to_uppercase();
    body.contains("ADD COLUMN") || body.contains("ALTER COLUMN") || body.contains("DROP COLUMN")
}

fn enables_row_level_security(sql: &str) -> bool {
    sql.to_uppercase().contains("ENABLE ROW LEVEL SECURITY")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_extension_is_phase_one() {
        assert_eq!(
            classify("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";"),
            Phase::Extensions
        );
    }

    #[test]
    fn types_and_domains() {
        assert_eq!(
            classify("CREATE TYPE shipment_status AS ENUM ('pending', 'shipped');"),
            Phase::Types
        );
        assert_eq!(
            classify("CREATE DOMAIN sales_order AS text CHECK (VALUE ~ '^[0-9]+$');"),
            Phase::Types
        );
    }

    #[test]
    fn create_table_is_tables() {
        assert_eq!(
            classify("CREATE TABLE cargos (\n  id uuid PRIMARY KEY\n);"),
            Phase::Tables
        );
        assert_eq!(
            classify("CREATE TABLE IF NOT EXISTS cargos (id uuid);"),
            Phase::Tables
        );
    }

    #[test]
    fn alter_table_column_changes() {
        assert_eq!(
            classify("ALTER TABLE cargos ADD COLUMN ship_date timestamptz;"),
            Phase::ColumnAlterations
        );
        assert_eq!(
            classify("ALTER TABLE cargos\n  ALTER COLUMN ship_date SET NOT NULL;"),
            Phase::ColumnAlterations
        );
        assert_eq!(
            classify("ALTER TABLE cargos DROP COLUMN legacy_code;"),
            Phase::ColumnAlterations
        );
    }

    #[test]
    fn column_keyword_on_later_line_still_matches() {
        let sql = "ALTER TABLE processed_shipments\n  ADD COLUMN IF NOT EXISTS carrier text,\n  ADD COLUMN IF NOT EXISTS eta timestamptz;";
        assert_eq!(classify(sql), Phase::ColumnAlterations);
    }

    #[test]
    fn functions_created_or_dropped() {
        assert_eq!(
            classify("CREATE OR REPLACE FUNCTION touch_updated_at() RETURNS trigger AS $$ BEGIN END; $$ LANGUAGE plpgsql;"),
            Phase::Functions
        );
        assert_eq!(
            classify("DROP FUNCTION IF EXISTS touch_updated_at();"),
            Phase::Functions
        );
    }

    #[test]
    fn indexes() {
        assert_eq!(
            classify("CREATE INDEX idx_cargos_ship_date ON cargos (ship_date);"),
            Phase::Indexes
        );
        assert_eq!(
            classify("CREATE UNIQUE INDEX idx_so ON cargo_sales_orders (sales_order);"),
            Phase::Indexes
        );
    }

    #[test]
    fn triggers_created_or_dropped() {
        assert_eq!(
            classify("CREATE TRIGGER trg_touch BEFORE UPDATE ON cargos FOR EACH ROW EXECUTE FUNCTION touch_updated_at();"),
            Phase::Triggers
        );
        assert_eq!(
            classify("DROP TRIGGER IF EXISTS trg_touch ON cargos;"),
            Phase::Triggers
        );
    }

    #[test]
    fn row_level_security_is_policies() {
        assert_eq!(
            classify("ALTER TABLE cargos ENABLE ROW LEVEL SECURITY;"),
            Phase::Policies
        );
        // Deciding keywords split across lines.
        assert_eq!(
            classify("ALTER TABLE cargos\n  ENABLE ROW LEVEL SECURITY;"),
            Phase::Policies
        );
    }

    #[test]
    fn policies_and_grants() {
        assert_eq!(
            classify("CREATE POLICY cargo_read ON cargos FOR SELECT USING (true);"),
            Phase::Policies
        );
        assert_eq!(classify("DROP POLICY cargo_read ON cargos;"), Phase::Policies);
        assert_eq!(
            classify("GRANT SELECT ON cargos TO authenticated;"),
            Phase::Policies
        );
        assert_eq!(
            classify("REVOKE ALL ON cargos FROM anon;"),
            Phase::Policies
        );
    }

    #[test]
    fn classifies_on_first_significant_line() {
        let sql = "-- grant read access to the reporting role\nGRANT SELECT ON cargos TO reporter;";
        assert_eq!(classify(sql), Phase::Policies);
    }

    #[test]
    fn catch_all_for_everything_else() {
        assert_eq!(
            classify("INSERT INTO user_roles (name) VALUES ('admin');"),
            Phase::Other
        );
        assert_eq!(
            classify("ALTER TABLE cargos ADD CONSTRAINT fk_customer FOREIGN KEY (customer_id) REFERENCES customers(id);"),
            Phase::Other
        );
        assert_eq!(classify("UPDATE cargos SET status = 'active';"), Phase::Other);
    }

    #[test]
    fn comment_only_text_is_catch_all() {
        assert_eq!(classify("-- nothing here\n-- at all"), Phase::Other);
        assert_eq!(classify(""), Phase::Other);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("create extension pgcrypto;"), Phase::Extensions);
        assert_eq!(classify("create table t (id int);"), Phase::Tables);
        assert_eq!(
            classify("alter table t add column c text;"),
            Phase::ColumnAlterations
        );
    }

    #[test]
    fn alter_table_does_not_match_create_table_rule() {
        // Anchored rule: ALTER TABLE with no column change falls through
        // to the catch-all, never to Tables.
        assert_eq!(
            classify("ALTER TABLE cargos SET SCHEMA archive;"),
            Phase::Other
        );
    }

    #[test]
    fn rule_order_prefers_column_changes_over_function_mention() {
        // First line happens to contain CREATE and FUNCTION as
        // substrings; the column rule is checked first and wins.
        let sql = "ALTER TABLE audits ADD COLUMN created_by_function text;";
        assert_eq!(classify(sql), Phase::ColumnAlterations);
    }
}
