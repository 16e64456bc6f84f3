//! Condition-tree compilation and raw-fragment quoting.

use crate::condition::ConditionNode;
use crate::params::Params;
use crate::quote::Quoter;

/// Reserved words that are never treated as column references.
const KEYWORDS: &[&str] = &[
    "AND", "OR", "NOT", "NULL", "IS", "IN", "EXISTS", "LIKE", "BETWEEN", "ON", "TRUE", "FALSE",
    "AS",
];

/// Heuristic quoting of raw WHERE/HAVING/ON fragments.
///
/// Conditions are stored as raw SQL, so arbitrary expressions cannot be
/// parsed reliably. Instead:
///  - only simple identifiers are quoted: `col` or `t.col`
///  - tokens containing a `:` placeholder, numeric literals, pre-quoted
///    tokens and function heads (`name(...`) are left alone
///  - a fragment containing `SELECT` already holds a compiled subquery and is
///    returned as-is
///
/// This is not a SQL parser and does not try to be one. Fragments with
/// unusual operator spacing or non-ASCII identifiers may be quoted
/// incorrectly; that is an accepted limitation.
#[derive(Clone, Copy, Debug)]
pub struct FragmentQuoter {
    quoter: Quoter,
}

impl FragmentQuoter {
    pub fn new(quoter: Quoter) -> Self {
        Self { quoter }
    }

    pub fn quote(&self, sql: &str) -> String {
        let sql = sql.trim();
        if sql.is_empty() {
            return String::new();
        }

        if contains_select_keyword(sql) {
            return sql.to_string();
        }

        let mut out = String::with_capacity(sql.len());
        for token in split_preserving_whitespace(sql) {
            if token.chars().all(char::is_whitespace) {
                out.push_str(token);
                continue;
            }

            out.push_str(&self.quote_token(token));
        }
        out
    }

    fn quote_token(&self, token: &str) -> String {
        // Placeholders, or tokens carrying one (:id, :in_1, :between_2).
        if token.contains(':') {
            return token.to_string();
        }

        if is_numeric_literal(token) {
            return token.to_string();
        }

        // Already quoted.
        if (token.starts_with('`') && token.ends_with('`'))
            || (token.starts_with('"') && token.ends_with('"'))
        {
            return token.to_string();
        }

        // Function heads: COUNT(*), SUM(col). The callee name is never
        // quoted and its arguments are opaque.
        if is_function_call(token) {
            return token.to_string();
        }

        if is_bare_ident(token) {
            let upper = token.to_ascii_uppercase();
            if KEYWORDS.contains(&upper.as_str()) {
                return token.to_string();
            }
            return self.quoter.dotted(token);
        }

        token.to_string()
    }
}

fn contains_select_keyword(sql: &str) -> bool {
    split_preserving_whitespace(sql)
        .any(|t| t.trim_matches(|c| c == '(' || c == ')').eq_ignore_ascii_case("SELECT"))
}

/// Whitespace tokenization that keeps the separators, so the fragment is
/// reassembled byte-for-byte around the quoted tokens.
fn split_preserving_whitespace(sql: &str) -> impl Iterator<Item = &str> {
    let mut rest = sql;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let first_is_ws = rest.chars().next().is_some_and(char::is_whitespace);
        let split_at = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != first_is_ws)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(split_at);
        rest = tail;
        Some(token)
    })
}

fn is_numeric_literal(token: &str) -> bool {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for ch in token.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

fn is_function_call(token: &str) -> bool {
    let Some(open) = token.find('(') else {
        return false;
    };
    let head = &token[..open];
    !head.is_empty() && is_ident_segment(head)
}

/// `a` or `a.b`
fn is_bare_ident(token: &str) -> bool {
    let mut segments = token.split('.');
    let (Some(first), second, third) = (segments.next(), segments.next(), segments.next()) else {
        return false;
    };
    if third.is_some() {
        return false;
    }
    if !is_ident_segment(first) {
        return false;
    }
    match second {
        Some(seg) => is_ident_segment(seg),
        None => true,
    }
}

fn is_ident_segment(seg: &str) -> bool {
    let mut chars = seg.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Flattens a condition tree to SQL with correct parenthesization and
/// boolean connectors.
#[derive(Clone, Copy, Debug)]
pub struct ConditionTreeCompiler {
    fragment_quoter: FragmentQuoter,
}

impl ConditionTreeCompiler {
    pub fn new(fragment_quoter: FragmentQuoter) -> Self {
        Self { fragment_quoter }
    }

    /// Render a node list.
    ///
    /// Each leaf renders as `(<fragment>)`, each group as its children joined
    /// by their connectors, wrapped in one pair of parentheses. The first
    /// rendered node in any list carries no leading connector. Parameters
    /// bubble up by key union.
    pub fn compile(&self, nodes: &[ConditionNode]) -> (String, Params) {
        let mut sql = String::new();
        let mut params = Params::new();
        let mut rendered = 0usize;

        for node in nodes {
            match node {
                ConditionNode::Leaf {
                    connector,
                    fragment,
                    params: leaf_params,
                } => {
                    let quoted = self.fragment_quoter.quote(fragment);
                    if quoted.is_empty() {
                        continue;
                    }
                    if rendered > 0 {
                        sql.push(' ');
                        sql.push_str(connector.as_sql());
                        sql.push(' ');
                    }
                    sql.push('(');
                    sql.push_str(&quoted);
                    sql.push(')');
                    params.merge(leaf_params.clone());
                    rendered += 1;
                }
                ConditionNode::Group { connector, children } => {
                    let (group_sql, group_params) = self.compile(children);
                    if group_sql.is_empty() {
                        continue;
                    }
                    if rendered > 0 {
                        sql.push(' ');
                        sql.push_str(connector.as_sql());
                        sql.push(' ');
                    }
                    sql.push('(');
                    sql.push_str(&group_sql);
                    sql.push(')');
                    params.merge(group_params);
                    rendered += 1;
                }
            }
        }

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{ConditionTree, Connector};
    use crate::params;
    use crate::quote::QuoteStyle;

    fn fragment_quoter() -> FragmentQuoter {
        FragmentQuoter::new(Quoter::new(QuoteStyle::Ansi))
    }

    fn compiler() -> ConditionTreeCompiler {
        ConditionTreeCompiler::new(fragment_quoter())
    }

    #[test]
    fn quotes_bare_identifiers() {
        assert_eq!(fragment_quoter().quote("id = :id"), r#""id" = :id"#);
        assert_eq!(fragment_quoter().quote("u.age > :age"), r#""u"."age" > :age"#);
    }

    #[test]
    fn leaves_keywords_alone() {
        assert_eq!(
            fragment_quoter().quote("deleted_at IS NOT NULL"),
            r#""deleted_at" IS NOT NULL"#
        );
    }

    #[test]
    fn leaves_functions_alone() {
        assert_eq!(fragment_quoter().quote("COUNT(*) > :min"), "COUNT(*) > :min");
        assert_eq!(fragment_quoter().quote("LOWER(name) = :n"), "LOWER(name) = :n");
    }

    #[test]
    fn leaves_numbers_alone() {
        assert_eq!(fragment_quoter().quote("age > 18"), r#""age" > 18"#);
        assert_eq!(fragment_quoter().quote("price > 9.5"), r#""price" > 9.5"#);
    }

    #[test]
    fn leaves_pre_quoted_alone() {
        assert_eq!(fragment_quoter().quote(r#""id" = :id"#), r#""id" = :id"#);
    }

    #[test]
    fn subquery_fragment_passes_through() {
        let sql = "id IN (SELECT user_id FROM orders)";
        assert_eq!(fragment_quoter().quote(sql), sql);
    }

    #[test]
    fn compiles_leaves_with_connectors() {
        let mut tree = ConditionTree::new();
        tree.push_leaf(Connector::And, "id = :id", params! { "id" => 10 });
        tree.push_leaf(Connector::And, "name = :name", params! { "name" => "Alice" });

        let (sql, params) = compiler().compile(tree.nodes());
        assert_eq!(sql, r#"("id" = :id) AND ("name" = :name)"#);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn first_connector_is_ignored() {
        let mut tree = ConditionTree::new();
        tree.push_leaf(Connector::Or, "a = 1", Params::new());
        tree.push_leaf(Connector::Or, "b = 2", Params::new());

        let (sql, _) = compiler().compile(tree.nodes());
        assert_eq!(sql, r#"("a" = 1) OR ("b" = 2)"#);
    }

    #[test]
    fn groups_are_parenthesized() {
        let mut tree = ConditionTree::new();
        tree.push_leaf(Connector::And, "a = 1", Params::new());
        tree.begin_group(Connector::And);
        tree.push_leaf(Connector::And, "b = 2", Params::new());
        tree.push_leaf(Connector::Or, "c = 3", Params::new());
        tree.end_group();

        let (sql, _) = compiler().compile(tree.nodes());
        assert_eq!(sql, r#"("a" = 1) AND (("b" = 2) OR ("c" = 3))"#);
    }

    #[test]
    fn group_params_bubble_up() {
        let mut tree = ConditionTree::new();
        tree.begin_group(Connector::And);
        tree.push_leaf(Connector::And, "x = :x", params! { "x" => 1 });
        tree.begin_group(Connector::Or);
        tree.push_leaf(Connector::And, "y = :y", params! { "y" => 2 });
        tree.end_group();
        tree.end_group();

        let (_, params) = compiler().compile(tree.nodes());
        assert!(params.contains_key("x"));
        assert!(params.contains_key("y"));
    }
}
