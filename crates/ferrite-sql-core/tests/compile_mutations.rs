//! INSERT / UPDATE / DELETE / CREATE INDEX compilation.

mod common;

use ferrite_sql_core::{
    ColumnAccess, Compiler, DeleteQuery, DerivedSource, Expr, GenericDialect, IndexQuery,
    InsertQuery, OnConflict, PostgresDialect, Query, QueryError, SelectQuery, SqliteDialect,
    SqlValue, UpdateQuery,
};

fn compile(query: impl Into<Query>) -> (String, Vec<SqlValue>) {
    Compiler::new(&GenericDialect).compile(query).unwrap()
}

fn compile_sqlite(query: impl Into<Query>) -> (String, Vec<SqlValue>) {
    Compiler::new(&SqliteDialect).compile(query).unwrap()
}

#[test]
fn test_update_targets_render_bare_and_qualified() {
    let sample = common::sample();
    let query = UpdateQuery::new(&sample)
        .set("counter", sample.col("counter") + 1)
        .where_clause(sample.col("id").eq(3));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "UPDATE \"sample\" SET \"counter\" = (\"sample\".\"counter\" + ?) \
         WHERE (\"sample\".\"id\" = ?)"
    );
    assert_eq!(params, vec![SqlValue::Int(1), SqlValue::Int(3)]);
}

#[test]
fn test_update_coerces_assigned_literals() {
    let sample = common::sample();
    let query = UpdateQuery::new(&sample).set("value", Expr::from("2.5"));
    let (sql, params) = compile(query);
    assert_eq!(sql, "UPDATE \"sample\" SET \"value\" = ?");
    assert_eq!(params, vec![SqlValue::Float(2.5)]);
}

#[test]
fn test_update_without_assignments_is_an_error() {
    let users = common::users();
    let query = UpdateQuery::new(&users).where_clause(users.col("id").eq(1));
    let err = Compiler::new(&GenericDialect).compile(query).unwrap_err();
    assert!(matches!(err, QueryError::EmptyMutation(_)));
}

#[test]
fn test_update_with_subquery_predicate() {
    let users = common::users();
    let tweets = common::tweets();
    let inner = SelectQuery::new(&tweets)
        .columns(vec![tweets.col("user_id")])
        .where_clause(tweets.col("content").like("%meow%"));
    let query = UpdateQuery::new(&users)
        .set("username", Expr::from("cat"))
        .where_clause(users.col("id").in_(inner));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "UPDATE \"users\" SET \"username\" = ? WHERE (\"users\".\"id\" IN \
         (SELECT \"t1\".\"user_id\" FROM \"tweet\" AS \"t1\" WHERE (\"t1\".\"content\" LIKE ?)))"
    );
    assert_eq!(
        params,
        vec![
            SqlValue::Text("cat".into()),
            SqlValue::Text("%meow%".into())
        ]
    );
}

#[test]
fn test_update_from_plain_table() {
    let users = common::users();
    let tweets = common::tweets();
    let query = UpdateQuery::new(&users)
        .set("username", tweets.col("content"))
        .from(&tweets)
        .where_clause(users.col("id").eq(tweets.col("user_id")));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "UPDATE \"users\" SET \"username\" = \"t1\".\"content\" \
         FROM \"tweet\" AS \"t1\" WHERE (\"users\".\"id\" = \"t1\".\"user_id\")"
    );
    assert!(params.is_empty());
}

#[test]
fn test_update_from_values_list() {
    let users = common::users();
    let rows = vec![
        vec![SqlValue::Int(1), SqlValue::Text("u1-x".into())],
        vec![SqlValue::Int(2), SqlValue::Text("u2-x".into())],
    ];
    let vals = DerivedSource::values(rows, "tmp", &["id", "username"]);
    let query = UpdateQuery::new(&users)
        .set("username", vals.col("username"))
        .from(&vals)
        .where_clause(users.col("id").eq(vals.col("id")));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "UPDATE \"users\" SET \"username\" = \"tmp\".\"username\" \
         FROM (VALUES (?, ?), (?, ?)) AS \"tmp\"(\"id\", \"username\") \
         WHERE (\"users\".\"id\" = \"tmp\".\"id\")"
    );
    assert_eq!(
        params,
        vec![
            SqlValue::Int(1),
            SqlValue::Text("u1-x".into()),
            SqlValue::Int(2),
            SqlValue::Text("u2-x".into()),
        ]
    );
}

#[test]
fn test_delete_with_same_table_subquery() {
    let users = common::users();
    let inner = SelectQuery::new(&users)
        .columns(vec![users.col("id")])
        .where_clause(users.col("username").eq("huey"));
    let query = DeleteQuery::new(&users).where_clause(users.col("id").in_(inner));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "DELETE FROM \"users\" WHERE (\"users\".\"id\" IN \
         (SELECT \"t1\".\"id\" FROM \"users\" AS \"t1\" WHERE (\"t1\".\"username\" = ?)))"
    );
    assert_eq!(params, vec![SqlValue::Text("huey".into())]);
}

#[test]
fn test_insert_single_row() {
    let users = common::users();
    let query = InsertQuery::row(&users, vec![("username", Expr::from("huey"))]);
    let (sql, params) = compile(query);
    assert_eq!(sql, "INSERT INTO \"users\" (\"username\") VALUES (?)");
    assert_eq!(params, vec![SqlValue::Text("huey".into())]);
}

#[test]
fn test_insert_many_fills_defaults() {
    let sample = common::sample();
    let query = InsertQuery::rows(
        &sample,
        vec![
            vec![("counter", Expr::from(1))],
            vec![("counter", Expr::from(2)), ("value", Expr::from(2.0))],
        ],
    );
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "INSERT INTO \"sample\" (\"counter\", \"value\") VALUES (?, ?), (?, ?)"
    );
    assert_eq!(
        params,
        vec![
            SqlValue::Int(1),
            SqlValue::Float(1.0),
            SqlValue::Int(2),
            SqlValue::Float(2.0)
        ]
    );
}

#[test]
fn test_insert_from_query() {
    let users = common::users();
    let tweets = common::tweets();
    let source = SelectQuery::new(&tweets).columns(vec![tweets.col("content")]);
    let query = InsertQuery::from_query(&users, &["username"], source);
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "INSERT INTO \"users\" (\"username\") \
         SELECT \"t1\".\"content\" FROM \"tweet\" AS \"t1\""
    );
    assert!(params.is_empty());
}

#[test]
fn test_insert_defaults() {
    let users = common::users();
    let (sql, params) = compile(InsertQuery::defaults(&users));
    assert_eq!(sql, "INSERT INTO \"users\" DEFAULT VALUES");
    assert!(params.is_empty());
}

#[test]
fn test_insert_or_replace() {
    let users = common::users();
    let query = InsertQuery::row(&users, vec![("username", Expr::from("huey"))]).replace();
    let (sql, _) = compile_sqlite(query);
    assert_eq!(
        sql,
        "INSERT OR REPLACE INTO \"users\" (\"username\") VALUES (?)"
    );
}

#[test]
fn test_on_conflict_update_clause_layout() {
    let sample = common::sample();
    let query = InsertQuery::row(
        &sample,
        vec![("counter", Expr::from(0)), ("value", Expr::from(2.0))],
    )
    .on_conflict(
        OnConflict::update()
            .targets(vec![sample.col("counter")])
            .conflict_where(sample.col("counter").gt(1))
            .set("value", sample.col("value") + 1.0)
            .update_where(sample.col("value").lt(10)),
    );
    let (sql, params) = compile_sqlite(query);
    assert_eq!(
        sql,
        "INSERT INTO \"sample\" (\"counter\", \"value\") VALUES (?, ?) \
         ON CONFLICT (\"counter\") WHERE (\"counter\" > ?) \
         DO UPDATE SET \"value\" = (\"sample\".\"value\" + ?) \
         WHERE (\"sample\".\"value\" < ?)"
    );
    assert_eq!(
        params,
        vec![
            SqlValue::Int(0),
            SqlValue::Float(2.0),
            SqlValue::Int(1),
            SqlValue::Float(1.0),
            SqlValue::Float(10.0)
        ]
    );
}

#[test]
fn test_on_conflict_update_without_assignments_is_an_error() {
    let users = common::users();
    let query = InsertQuery::row(&users, vec![("username", Expr::from("huey"))])
        .on_conflict(OnConflict::update());
    let err = Compiler::new(&SqliteDialect).compile(query).unwrap_err();
    assert!(matches!(err, QueryError::EmptyMutation(_)));
}

#[test]
fn test_on_conflict_preserve_uses_excluded() {
    let sample = common::sample();
    let query = InsertQuery::row(
        &sample,
        vec![("counter", Expr::from(0)), ("value", Expr::from(2.0))],
    )
    .on_conflict(
        OnConflict::update()
            .targets(vec![sample.col("counter")])
            .preserve("value"),
    );
    let (sql, _) = compile_sqlite(query);
    assert_eq!(
        sql,
        "INSERT INTO \"sample\" (\"counter\", \"value\") VALUES (?, ?) \
         ON CONFLICT (\"counter\") DO UPDATE SET \"value\" = EXCLUDED.\"value\""
    );
}

#[test]
fn test_on_conflict_requires_dialect_support() {
    let users = common::users();
    let query = InsertQuery::row(&users, vec![("username", Expr::from("huey"))])
        .on_conflict(OnConflict::do_nothing());
    let err = Compiler::new(&GenericDialect).compile(query).unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedFeature { .. }));
}

#[test]
fn test_insert_returns_the_key_by_default_on_postgres() {
    let users = common::users();
    let query = InsertQuery::row(&users, vec![("username", Expr::from("huey"))]);
    let (sql, _) = Compiler::new(&PostgresDialect).compile(query).unwrap();
    assert_eq!(
        sql,
        "INSERT INTO \"users\" (\"username\") VALUES (?) RETURNING \"users\".\"id\""
    );
}

#[test]
fn test_empty_returning_disables_the_default() {
    let users = common::users();
    let query =
        InsertQuery::row(&users, vec![("username", Expr::from("huey"))]).returning(Vec::new());
    let (sql, _) = Compiler::new(&PostgresDialect).compile(query).unwrap();
    assert_eq!(sql, "INSERT INTO \"users\" (\"username\") VALUES (?)");
}

#[test]
fn test_returning_is_dropped_without_support() {
    let users = common::users();
    let query = DeleteQuery::new(&users)
        .where_clause(users.col("id").eq(1))
        .returning(vec![users.col("username")]);
    let (sql, _) = compile_sqlite(query);
    assert_eq!(sql, "DELETE FROM \"users\" WHERE (\"users\".\"id\" = ?)");
}

#[test]
fn test_create_index_with_partial_predicate() {
    let sample = common::sample();
    let query = IndexQuery::new(&sample, vec![sample.col("counter"), sample.col("value").desc()])
        .where_clause(sample.col("counter").gt(0));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "CREATE INDEX IF NOT EXISTS \"sample_counter_value\" ON \"sample\" \
         (\"counter\", \"value\" DESC) WHERE (\"counter\" > ?)"
    );
    assert_eq!(params, vec![SqlValue::Int(0)]);
}

#[test]
fn test_create_unique_index_with_override_name() {
    let users = common::users();
    let query = IndexQuery::new(&users, vec![users.col("username")])
        .unique()
        .name("users_username_uniq");
    let (sql, _) = compile(query);
    assert_eq!(
        sql,
        "CREATE UNIQUE INDEX IF NOT EXISTS \"users_username_uniq\" ON \"users\" (\"username\")"
    );
}
