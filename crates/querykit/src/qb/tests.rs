//! Cross-builder scenarios: placeholder round-trips, grouping shapes,
//! dialect parity.

use std::collections::BTreeSet;

use crate::compiler::CompiledQuery;
use crate::dialect::Dialect;
use crate::params;
use crate::qb::{QueryFactory, Subquery};

/// Placeholder names appearing in SQL text (single-quoted literals skipped).
fn placeholder_names(sql: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut chars = sql.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            if ch == '\'' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '\'' => in_string = true,
            ':' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '_' || next.is_ascii_alphanumeric() {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !name.is_empty() {
                    names.insert(name);
                }
            }
            _ => {}
        }
    }
    names
}

fn assert_round_trip(compiled: &CompiledQuery) {
    let in_sql = placeholder_names(&compiled.sql);
    let in_params: BTreeSet<String> = compiled.params.keys().map(String::from).collect();
    assert_eq!(
        in_sql, in_params,
        "placeholder set diverged from parameter keys for: {}",
        compiled.sql
    );
}

fn query() -> QueryFactory {
    QueryFactory::new(Dialect::Postgres)
}

#[test]
fn where_in_generates_one_placeholder_per_value() {
    let compiled = query()
        .select(&[])
        .from("users")
        .where_in("id", vec![10, 20, 30])
        .compile();

    assert_eq!(
        compiled.sql,
        r#"SELECT * FROM "users" WHERE ("id" IN (:in_1, :in_2, :in_3))"#
    );
    assert_eq!(compiled.params.len(), 3);
    assert_eq!(compiled.params.get("in_1"), Some(&crate::Value::Int(10)));
    assert_eq!(compiled.params.get("in_2"), Some(&crate::Value::Int(20)));
    assert_eq!(compiled.params.get("in_3"), Some(&crate::Value::Int(30)));
    assert_round_trip(&compiled);
}

#[test]
fn empty_in_lists_compile_to_constant_predicates() {
    let compiled = query()
        .select(&[])
        .from("users")
        .where_in("id", Vec::<i64>::new())
        .compile();
    assert_eq!(compiled.sql, r#"SELECT * FROM "users" WHERE (1 = 0)"#);
    assert!(compiled.params.is_empty());

    let compiled = query()
        .select(&[])
        .from("users")
        .where_not_in("id", Vec::<i64>::new())
        .compile();
    assert_eq!(compiled.sql, r#"SELECT * FROM "users" WHERE (1 = 1)"#);
}

#[test]
fn grouping_matches_nesting_exactly() {
    let compiled = query()
        .select(&[])
        .from("t")
        .and_where("a = 1", params! {})
        .and_where_group(|q| {
            q.and_where("b = 2", params! {})
                .or_where("c = 3", params! {})
        })
        .compile();

    assert_eq!(
        compiled.sql,
        r#"SELECT * FROM "t" WHERE ("a" = 1) AND (("b" = 2) OR ("c" = 3))"#
    );
}

#[test]
fn grouping_composes_to_depth_three() {
    let compiled = query()
        .select(&[])
        .from("t")
        .and_where("a = 1", params! {})
        .or_where_group(|q| {
            q.and_where("b = 2", params! {})
                .and_where_group(|q| {
                    q.and_where("c = 3", params! {})
                        .or_where("d = 4", params! {})
                })
        })
        .compile();

    assert_eq!(
        compiled.sql,
        r#"SELECT * FROM "t" WHERE ("a" = 1) OR (("b" = 2) AND (("c" = 3) OR ("d" = 4)))"#
    );
}

#[test]
fn dialects_differ_only_in_quoting() {
    fn build(factory: QueryFactory) -> CompiledQuery {
        factory
            .select(&["u.id", "u.name"])
            .from("users u")
            .left_join("orders o", "o.user_id = u.id")
            .and_where("u.age > :age", params! { "age" => 30 })
            .where_in("u.role", vec!["admin", "staff"])
            .group_by(&["u.id"])
            .having("COUNT(*) > :min", params! { "min" => 1 })
            .order_by_desc("u.created_at")
            .limit(10)
            .offset(5)
            .compile()
    }

    let pg = build(QueryFactory::new(Dialect::Postgres));
    let lite = build(QueryFactory::new(Dialect::Sqlite));
    let maria = build(QueryFactory::new(Dialect::MariaDb));

    // ANSI dialects render identically.
    assert_eq!(pg.sql, lite.sql);
    // The backtick dialect differs only in the quote character.
    assert_eq!(maria.sql, pg.sql.replace('"', "`"));
    // Parameter maps are identical across all three.
    assert_eq!(pg.params, lite.params);
    assert_eq!(pg.params, maria.params);

    assert_round_trip(&pg);
    assert_round_trip(&maria);
}

#[test]
fn update_scenario_round_trips() {
    let compiled = query()
        .update("articles")
        .set("title", "Updated")
        .and_where("id = :id", params! { "id" => 1 })
        .compile();

    assert_eq!(
        compiled.sql,
        r#"UPDATE "articles" SET "title" = :v_1 WHERE ("id" = :id)"#
    );
    assert_eq!(compiled.params.get("v_1"), Some(&crate::Value::Text("Updated".into())));
    assert_eq!(compiled.params.get("id"), Some(&crate::Value::Int(1)));
    assert_round_trip(&compiled);
}

#[test]
fn complex_select_round_trips() {
    let archived = query()
        .select(&["id"])
        .from("archived_users")
        .and_where("removed_at > :cutoff", params! { "cutoff" => "2023-01-01" });

    let compiled = query()
        .select(&["id"])
        .from("users")
        .where_between("age", 18, 65)
        .where_like("email", "%@example.com")
        .where_in_subquery(
            "id",
            Subquery::build(|q| {
                q.select(&["user_id"])
                    .from("orders")
                    .and_where("status = :st", params! { "st" => "paid" })
            }),
        )
        .union(archived)
        .limit(50)
        .compile();

    assert_round_trip(&compiled);
    assert!(compiled.sql.starts_with("SELECT * FROM ("));
}

#[test]
fn insert_round_trips() {
    let compiled = query()
        .insert("users")
        .set("name", "Alice")
        .set("age", 30)
        .compile();
    assert_round_trip(&compiled);
}

#[test]
fn delete_round_trips() {
    let compiled = query()
        .delete("users")
        .where_not_in("state", vec!["active", "pending"])
        .or_where("banned_at IS NOT NULL", params! {})
        .compile();
    assert_round_trip(&compiled);
}

#[test]
fn counter_is_shared_across_helper_kinds() {
    let compiled = query()
        .select(&[])
        .from("t")
        .where_in("a", vec![1, 2])
        .where_between("b", 3, 4)
        .where_like("c", "%x%")
        .compile();

    // in_1, in_2, then between_3/between_4, then like_5: one counter, never
    // reset mid-statement.
    assert_eq!(
        compiled.sql,
        r#"SELECT * FROM "t" WHERE ("a" IN (:in_1, :in_2)) AND ("b" BETWEEN :between_3 AND :between_4) AND ("c" LIKE :like_5)"#
    );
    assert_round_trip(&compiled);
}

#[test]
fn table_prefix_applies_to_all_statement_kinds() {
    let q = QueryFactory::with_prefix(Dialect::Postgres, "app_");

    assert!(q.select(&[]).from("users").compile().sql.contains(r#""app_users""#));
    assert!(q.insert("users").set("a", 1).compile().sql.contains(r#""app_users""#));
    assert!(q.update("users").set("a", 1).compile().sql.contains(r#""app_users""#));
    assert!(q.delete("users").compile().sql.contains(r#""app_users""#));
}

#[test]
fn raw_from_skips_prefix() {
    let q = QueryFactory::with_prefix(Dialect::Postgres, "app_");
    let compiled = q.select(&[]).from_raw("users u").compile();
    assert_eq!(compiled.sql, "SELECT * FROM users u");
}
