//! SQL statement splitter.
//!
//! Partitions concatenated migration text into individual statements,
//! tracking block comments, `--` line comments, and dollar-quoted
//! literals so that terminators inside them never end a statement.
//! Dollar quoting is tracked with a stack of open tags, so sequential
//! and nested distinct tags (`$outer$ .. $inner$ .. $inner$ .. $outer$`)
//! both work. Terminators inside plain `'..'` string literals are not
//! protected; migration sources are self-authored and avoid them.
//! Unbalanced tags are not diagnosed and split incorrectly.

/// Scanner state that survives across lines.
#[derive(Debug, Default)]
struct ScanState {
    /// Open dollar-quote tags, innermost last. A `$tag$` token pushes;
    /// a token equal to the innermost tag pops; any other token while a
    /// literal is open is a nested literal and pushes on top.
    open_tags: Vec<String>,
    /// Inside a `/* .. */` block. Blocks do not nest; the first `*/`
    /// closes.
    in_block_comment: bool,
}

/// Splits raw SQL text into trimmed statement texts, source order
/// preserved. A terminator ends the statement at that character, so a
/// line carrying several statements yields several entries. Fragments
/// whose lines are all blank or `--` comments are dropped; trailing
/// text without a terminator is kept.
pub fn split_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::default();

    for line in content.lines() {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];

            if state.in_block_comment {
                if ch == '*' && chars.get(i + 1) == Some(&'/') {
                    current.push_str("*/");
                    i += 2;
                    state.in_block_comment = false;
                } else {
                    current.push(ch);
                    i += 1;
                }
                continue;
            }

            if !state.open_tags.is_empty() {
                // Inside a dollar-quoted literal only delimiter tokens
                // matter; terminators and comment markers are text.
                if ch == '$' {
                    if let Some(tag) = parse_dollar_tag(&chars, i) {
                        i += tag.chars().count();
                        let closes = state.open_tags.last() == Some(&tag);
                        current.push_str(&tag);
                        if closes {
                            state.open_tags.pop();
                        } else {
                            state.open_tags.push(tag);
                        }
                        continue;
                    }
                }
                current.push(ch);
                i += 1;
                continue;
            }

            match ch {
                '-' if chars.get(i + 1) == Some(&'-') => {
                    // Line comment: rest of the line is inert but stays
                    // part of the statement text.
                    current.extend(&chars[i..]);
                    break;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    current.push_str("/*");
                    i += 2;
                    state.in_block_comment = true;
                }
                '$' => {
                    if let Some(tag) = parse_dollar_tag(&chars, i) {
                        i += tag.chars().count();
                        current.push_str(&tag);
                        state.open_tags.push(tag);
                    } else {
                        current.push('$');
                        i += 1;
                    }
                }
                ';' => {
                    current.push(';');
                    i += 1;
                    flush(&mut current, &mut statements);
                }
                _ => {
                    current.push(ch);
                    i += 1;
                }
            }
        }

        current.push('\n');
    }

    flush(&mut current, &mut statements);
    statements
}

/// Parses a `$tag$` delimiter starting at `i`, which must index a `$`.
/// Tags are a possibly-empty run of alphanumerics or underscores
/// between two dollar signs, so `$$`, `$fn$` and `$body_1$` all match
/// while a positional parameter like `$1` (no closing `$`) does not.
fn parse_dollar_tag(chars: &[char], i: usize) -> Option<String> {
    let mut j = i + 1;
    while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
        j += 1;
    }
    if j < chars.len() && chars[j] == '$' {
        Some(chars[i..=j].iter().collect())
    } else {
        None
    }
}

fn flush(current: &mut String, statements: &mut Vec<String>) {
    let text = current.trim();
    if !text.is_empty() && !comment_only(text) {
        statements.push(text.to_string());
    }
    current.clear();
}

/// True when every line is blank or a `--` comment. Such fragments are
/// dropped rather than emitted as statements.
fn comment_only(text: &str) -> bool {
    text.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with("--")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_simple_terminators() {
        let input = "CREATE EXTENSION \"uuid-ossp\";\nCREATE TABLE t (id int);\n";
        let stmts = split_statements(input);
        assert_eq!(
            stmts,
            vec!["CREATE EXTENSION \"uuid-ossp\";", "CREATE TABLE t (id int);"]
        );
    }

    #[test]
    fn function_body_dollar_quote_is_one_statement() {
        let input = "CREATE FUNCTION f() RETURNS void AS $$ BEGIN END; $$ LANGUAGE plpgsql;";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0], input);
    }

    #[test]
    fn splits_several_statements_on_one_line() {
        let input = "ALTER TABLE t ADD COLUMN x int; CREATE INDEX idx ON t(x); CREATE TRIGGER trg AFTER INSERT ON t EXECUTE FUNCTION f();";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0], "ALTER TABLE t ADD COLUMN x int;");
        assert_eq!(stmts[1], "CREATE INDEX idx ON t(x);");
        assert!(stmts[2].starts_with("CREATE TRIGGER trg"));
    }

    #[test]
    fn tagged_dollar_quote_protects_terminators() {
        let input = "CREATE FUNCTION f() RETURNS trigger AS $fn$\nBEGIN\n  NEW.updated_at = NOW();\n  RETURN NEW;\nEND;\n$fn$ LANGUAGE plpgsql;";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn nested_distinct_tags_stay_one_statement() {
        let input = "CREATE FUNCTION wrap() RETURNS void AS $outer$\nBEGIN\n  EXECUTE $inner$ UPDATE t SET x = 1; $inner$;\nEND;\n$outer$ LANGUAGE plpgsql;";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains("$inner$"));
    }

    #[test]
    fn sequential_dollar_quotes_split_between() {
        let input = "SELECT $a$x; y$a$;\nSELECT $b$p; q$b$;";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "SELECT $a$x; y$a$;");
        assert_eq!(stmts[1], "SELECT $b$p; q$b$;");
    }

    #[test]
    fn block_comment_terminator_does_not_split() {
        let input = "CREATE TABLE t (\n  /* legacy; kept for imports */\n  id int\n);";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains("legacy; kept"));
    }

    #[test]
    fn multiline_block_comment_protects_terminators() {
        let input = "/* first;\nsecond;\nthird */\nCREATE TABLE t (id int);";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].starts_with("/* first;"));
    }

    #[test]
    fn line_comment_terminator_does_not_split() {
        let input = "CREATE TABLE t (\n  id int, -- key;\n  name text\n);";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains("-- key;"));
    }

    #[test]
    fn line_comment_inside_dollar_quote_is_literal() {
        // The double dash is literal text inside the quoted body, so
        // the closing tag later on the same line must still be seen.
        let input = "SELECT $$ -- not a comment $$;\nSELECT 2;";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn comment_only_input_yields_nothing() {
        let input = "-- header\n\n-- another comment\n   \n-- end\n";
        assert!(split_statements(input).is_empty());
    }

    #[test]
    fn trailing_comment_only_text_is_dropped() {
        let input = "SELECT 1;\n-- trailing note\n\n-- more\n";
        let stmts = split_statements(input);
        assert_eq!(stmts, vec!["SELECT 1;"]);
    }

    #[test]
    fn leading_comment_attaches_to_next_statement() {
        let input = "SELECT 1;\n-- audit grant\nGRANT SELECT ON t TO reporter;";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1], "-- audit grant\nGRANT SELECT ON t TO reporter;");
    }

    #[test]
    fn trailing_statement_without_terminator_is_kept() {
        let input = "CREATE TABLE a (id int);\nINSERT INTO a VALUES (1)";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1], "INSERT INTO a VALUES (1)");
    }

    #[test]
    fn positional_parameter_is_not_a_tag() {
        let input = "PREPARE q AS SELECT * FROM t WHERE id = $1;\nEXECUTE q(7);";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn agrees_with_naive_split_on_plain_input() {
        let input = "CREATE TABLE a (id int);\nCREATE TABLE b (\n  id int,\n  a_id int\n);\nINSERT INTO a VALUES (1);\n";
        let naive: Vec<String> = input
            .split(';')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(|piece| format!("{piece};"))
            .collect();
        assert_eq!(split_statements(input), naive);
    }

    #[test]
    fn statement_texts_are_verbatim_slices_of_input() {
        let input = "CREATE TABLE t (\n  id int\n);\n\nCREATE INDEX i ON t(id);\n";
        let stmts = split_statements(input);
        assert_eq!(stmts.len(), 2);
        for stmt in &stmts {
            assert!(input.contains(stmt.as_str()));
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_statements("").is_empty());
        assert!(split_statements("   \n \n").is_empty());
    }
}
