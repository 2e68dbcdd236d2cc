//! Ordering and emission of classified statements.
//!
//! Statements sort by `(phase, source_order)` and render into a single
//! transactional script: fixed banner, `BEGIN;`, phase-separated
//! statement blocks, `COMMIT;`. The output is a pure function of the
//! statement list, so regenerating from unchanged migrations produces
//! a byte-identical file.

use std::collections::BTreeMap;

use super::Statement;
use super::phase::Phase;

/// Stable sort by phase, ties broken by original source order.
pub fn sort_statements(statements: &mut [Statement]) {
    statements.sort_by_key(|s| (s.phase, s.source_order));
}

/// Statement counts per phase, iterated in execution order. Phases
/// with no statements are absent.
pub fn distribution(statements: &[Statement]) -> BTreeMap<Phase, usize> {
    let mut counts = BTreeMap::new();
    for stmt in statements {
        *counts.entry(stmt.phase).or_insert(0usize) += 1;
    }
    counts
}

/// Renders sorted statements into the final deployable script. A phase
/// separator is inserted whenever the running phase changes, so the
/// input must already be ordered by [`sort_statements`].
pub fn render(statements: &[Statement]) -> String {
    let mut lines: Vec<String> = Vec::new();
    push_banner(&mut lines);

    let mut current: Option<Phase> = None;
    for stmt in statements {
        if current != Some(stmt.phase) {
            current = Some(stmt.phase);
            lines.push(String::new());
            lines.push(rule_line());
            lines.push(format!(
                "-- PHASE {}: {}",
                stmt.phase.number(),
                stmt.phase.title().to_uppercase()
            ));
            lines.push(rule_line());
            lines.push(String::new());
        }

        lines.push(stmt.text.clone());
        if !stmt.text.ends_with(';') {
            lines.push(";".to_string());
        }
        lines.push(String::new());
    }

    lines.push(String::new());
    lines.push("COMMIT;".to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn push_banner(lines: &mut Vec<String>) {
    lines.push("-- Full Schema Migration (Properly Ordered)".to_string());
    lines.push(rule_line());
    lines.push("--".to_string());
    lines.push("-- Execution order:".to_string());
    for phase in Phase::ALL {
        lines.push(format!("--   {}. {}", phase.number(), phase.title()));
    }
    lines.push(rule_line());
    lines.push(String::new());
    lines.push("BEGIN;".to_string());
    lines.push(String::new());
}

fn rule_line() -> String {
    format!("-- {}", "=".repeat(77))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(text: &str, phase: Phase, source_order: usize) -> Statement {
        Statement {
            text: text.to_string(),
            phase,
            source_order,
        }
    }

    #[test]
    fn sorts_by_phase_then_source_order() {
        let mut stmts = vec![
            stmt("CREATE TRIGGER trg ...;", Phase::Triggers, 2),
            stmt("CREATE INDEX idx ...;", Phase::Indexes, 1),
            stmt("ALTER TABLE t ADD COLUMN x int;", Phase::ColumnAlterations, 0),
        ];
        sort_statements(&mut stmts);
        assert_eq!(stmts[0].phase, Phase::ColumnAlterations);
        assert_eq!(stmts[1].phase, Phase::Indexes);
        assert_eq!(stmts[2].phase, Phase::Triggers);
    }

    #[test]
    fn ordering_law_holds_for_every_pair() {
        let mut stmts = vec![
            stmt("G;", Phase::Policies, 0),
            stmt("T1;", Phase::Tables, 1),
            stmt("F;", Phase::Functions, 2),
            stmt("T2;", Phase::Tables, 3),
            stmt("E;", Phase::Extensions, 4),
        ];
        sort_statements(&mut stmts);
        for a in 0..stmts.len() {
            for b in (a + 1)..stmts.len() {
                let (first, second) = (&stmts[a], &stmts[b]);
                let key_ordered = first.phase < second.phase
                    || (first.phase == second.phase && first.source_order < second.source_order);
                assert!(
                    key_ordered,
                    "{:?}#{} must precede {:?}#{}",
                    first.phase, first.source_order, second.phase, second.source_order
                );
            }
        }
    }

    #[test]
    fn source_order_is_preserved_within_a_phase() {
        let mut stmts = vec![
            stmt("CREATE TABLE b (id int);", Phase::Tables, 5),
            stmt("CREATE TABLE a (id int);", Phase::Tables, 3),
            stmt("CREATE TABLE c (id int);", Phase::Tables, 9),
        ];
        sort_statements(&mut stmts);
        let orders: Vec<usize> = stmts.iter().map(|s| s.source_order).collect();
        assert_eq!(orders, vec![3, 5, 9]);
    }

    #[test]
    fn render_wraps_in_transaction() {
        let stmts = vec![stmt("CREATE TABLE t (id int);", Phase::Tables, 0)];
        let script = render(&stmts);
        assert!(script.starts_with("-- Full Schema Migration (Properly Ordered)"));
        let begin = script.find("BEGIN;").unwrap();
        let stmt_pos = script.find("CREATE TABLE t").unwrap();
        let commit = script.find("COMMIT;").unwrap();
        assert!(begin < stmt_pos && stmt_pos < commit);
        assert!(script.ends_with("COMMIT;\n"));
    }

    #[test]
    fn render_emits_one_separator_per_phase_change() {
        let mut stmts = vec![
            stmt("CREATE TABLE a (id int);", Phase::Tables, 0),
            stmt("CREATE TABLE b (id int);", Phase::Tables, 1),
            stmt("CREATE INDEX i ON a(id);", Phase::Indexes, 2),
        ];
        sort_statements(&mut stmts);
        let script = render(&stmts);
        assert_eq!(script.matches("-- PHASE 3: TABLES").count(), 1);
        assert_eq!(script.matches("-- PHASE 6: INDEXES").count(), 1);
        assert_eq!(script.matches("-- PHASE").count(), 2);
    }

    #[test]
    fn render_appends_missing_terminator() {
        let stmts = vec![stmt("INSERT INTO t VALUES (1)", Phase::Other, 0)];
        let script = render(&stmts);
        assert!(script.contains("INSERT INTO t VALUES (1)\n;"));
    }

    #[test]
    fn render_keeps_existing_terminator() {
        let stmts = vec![stmt("INSERT INTO t VALUES (1);", Phase::Other, 0)];
        let script = render(&stmts);
        assert!(script.contains("INSERT INTO t VALUES (1);\n"));
        assert!(!script.contains("INSERT INTO t VALUES (1);\n;"));
    }

    #[test]
    fn banner_lists_every_phase() {
        let script = render(&[]);
        for phase in Phase::ALL {
            assert!(
                script.contains(&format!("--   {}. {}", phase.number(), phase.title())),
                "banner must list {}",
                phase.title()
            );
        }
    }

    #[test]
    fn render_is_deterministic() {
        let stmts = vec![
            stmt("CREATE TABLE t (id int);", Phase::Tables, 0),
            stmt("GRANT SELECT ON t TO anon;", Phase::Policies, 1),
        ];
        assert_eq!(render(&stmts), render(&stmts));
    }

    #[test]
    fn distribution_counts_per_phase() {
        let stmts = vec![
            stmt("CREATE TABLE a (id int);", Phase::Tables, 0),
            stmt("CREATE TABLE b (id int);", Phase::Tables, 1),
            stmt("GRANT SELECT ON a TO anon;", Phase::Policies, 2),
        ];
        let counts = distribution(&stmts);
        assert_eq!(counts.get(&Phase::Tables), Some(&2));
        assert_eq!(counts.get(&Phase::Policies), Some(&1));
        assert_eq!(counts.get(&Phase::Extensions), None);
        // BTreeMap iterates phases in execution order.
        let phases: Vec<Phase> = counts.keys().copied().collect();
        assert_eq!(phases, vec![Phase::Tables, Phase::Policies]);
    }
}
