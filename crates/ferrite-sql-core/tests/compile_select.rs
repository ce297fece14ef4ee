//! SELECT compilation: projections, joins, aliases, subqueries.

mod common;

use ferrite_sql_core::{
    ColumnAccess, Compiler, DerivedSource, Expr, GenericDialect, JoinKind, Query, QueryError,
    SelectQuery, SqlValue, TableAlias,
};

fn compile(query: impl Into<Query>) -> (String, Vec<SqlValue>) {
    Compiler::new(&GenericDialect).compile(query).unwrap()
}

#[test]
fn test_select_all_columns_with_predicate() {
    let users = common::users();
    let query = SelectQuery::new(&users).where_clause(users.col("username").eq("huey"));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"id\", \"t1\".\"username\" FROM \"users\" AS \"t1\" \
         WHERE (\"t1\".\"username\" = ?)"
    );
    assert_eq!(params, vec![SqlValue::Text("huey".into())]);
}

#[test]
fn test_projection_ordering_and_paging() {
    let users = common::users();
    let query = SelectQuery::new(&users)
        .columns(vec![users.col("username")])
        .order_by(vec![users.col("username").desc()])
        .limit(10)
        .offset(2);
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"username\" FROM \"users\" AS \"t1\" \
         ORDER BY \"t1\".\"username\" DESC LIMIT ? OFFSET ?"
    );
    assert_eq!(params, vec![SqlValue::Int(10), SqlValue::Int(2)]);
}

#[test]
fn test_offset_without_limit_pads_the_limit() {
    let users = common::users();
    let query = SelectQuery::new(&users)
        .columns(vec![users.col("id")])
        .offset(3);
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"id\" FROM \"users\" AS \"t1\" LIMIT ? OFFSET ?"
    );
    assert_eq!(params, vec![SqlValue::Int(-1), SqlValue::Int(3)]);
}

#[test]
fn test_join_resolved_from_the_schema() {
    let users = common::users();
    let tweets = common::tweets();
    let query = SelectQuery::new(&tweets)
        .join(&users)
        .unwrap()
        .where_clause(users.col("username").eq("huey"));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"id\", \"t1\".\"user_id\", \"t1\".\"content\", \"t1\".\"timestamp\" \
         FROM \"tweet\" AS \"t1\" \
         INNER JOIN \"users\" AS \"t2\" ON (\"t1\".\"user_id\" = \"t2\".\"id\") \
         WHERE (\"t2\".\"username\" = ?)"
    );
    assert_eq!(params, vec![SqlValue::Text("huey".into())]);
}

#[test]
fn test_switch_hangs_the_next_join_off_the_first_source() {
    let users = common::users();
    let tweets = common::tweets();
    let favorites = common::favorites();
    let query = SelectQuery::new(&users)
        .columns(vec![users.col("username")])
        .join(&tweets)
        .unwrap()
        .switch(&users)
        .unwrap()
        .join(&favorites)
        .unwrap();
    let (sql, _) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"username\" FROM \"users\" AS \"t1\" \
         INNER JOIN \"tweet\" AS \"t2\" ON (\"t2\".\"user_id\" = \"t1\".\"id\") \
         INNER JOIN \"favorite\" AS \"t3\" ON (\"t3\".\"user_id\" = \"t1\".\"id\")"
    );
}

#[test]
fn test_ambiguous_join_is_rejected() {
    let users = common::users();
    let relationships = common::relationships();
    let err = SelectQuery::new(&relationships).join(&users).unwrap_err();
    assert!(matches!(
        err,
        QueryError::JoinResolution { candidates: 2, .. }
    ));
}

#[test]
fn test_explicit_alias_renders_verbatim() {
    let users = common::users();
    let tweets = common::tweets();
    let author = TableAlias::new(&users, "author");
    let query = SelectQuery::new(&tweets)
        .columns(vec![tweets.col("content"), author.col("username")])
        .join_on(
            &author,
            JoinKind::LeftOuter,
            tweets.col("user_id").eq(author.col("id")),
        )
        .unwrap();
    let (sql, _) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"content\", \"author\".\"username\" FROM \"tweet\" AS \"t1\" \
         LEFT OUTER JOIN \"users\" AS \"author\" ON (\"t1\".\"user_id\" = \"author\".\"id\")"
    );
}

#[test]
fn test_predicate_subquery_numbers_after_the_outer_sources() {
    let users = common::users();
    let tweets = common::tweets();
    let inner = SelectQuery::new(&users)
        .columns(vec![users.col("id")])
        .where_clause(users.col("username").eq("huey"));
    let query = SelectQuery::new(&tweets)
        .columns(vec![tweets.col("content")])
        .where_clause(tweets.col("user_id").in_(inner));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"content\" FROM \"tweet\" AS \"t1\" \
         WHERE (\"t1\".\"user_id\" IN \
         (SELECT \"t2\".\"id\" FROM \"users\" AS \"t2\" WHERE (\"t2\".\"username\" = ?)))"
    );
    assert_eq!(params, vec![SqlValue::Text("huey".into())]);
}

#[test]
fn test_same_table_subquery_gets_its_own_alias() {
    let users = common::users();
    let inner = SelectQuery::new(&users).columns(vec![users.col("id")]);
    let query = SelectQuery::new(&users)
        .columns(vec![users.col("username")])
        .where_clause(users.col("id").in_(inner));
    let (sql, _) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"username\" FROM \"users\" AS \"t1\" \
         WHERE (\"t1\".\"id\" IN (SELECT \"t2\".\"id\" FROM \"users\" AS \"t2\"))"
    );
}

#[test]
fn test_group_by_having_with_aggregate() {
    let tweets = common::tweets();
    let query = SelectQuery::new(&tweets)
        .columns(vec![tweets.col("user_id"), Expr::count_rows().alias("ct")])
        .group_by(vec![tweets.col("user_id")])
        .having(Expr::count_rows().gt(5));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"user_id\", COUNT(1) AS \"ct\" FROM \"tweet\" AS \"t1\" \
         GROUP BY \"t1\".\"user_id\" HAVING (COUNT(1) > ?)"
    );
    assert_eq!(params, vec![SqlValue::Int(5)]);
}

#[test]
fn test_exists_subquery_supplies_the_call_parentheses() {
    let users = common::users();
    let tweets = common::tweets();
    let inner = SelectQuery::new(&tweets)
        .columns(vec![Expr::raw("1", Vec::new())])
        .where_clause(tweets.col("user_id").eq(users.col("id")));
    let query = SelectQuery::new(&users)
        .columns(vec![users.col("username")])
        .where_clause(Expr::function("EXISTS", vec![inner.into()]));
    let (sql, _) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"username\" FROM \"users\" AS \"t1\" \
         WHERE EXISTS(SELECT 1 FROM \"tweet\" AS \"t2\" WHERE (\"t2\".\"user_id\" = \"t1\".\"id\"))"
    );
}

#[test]
fn test_is_null_binds_a_null_parameter() {
    let category = common::category();
    let query = SelectQuery::new(&category)
        .columns(vec![category.col("name")])
        .where_clause(category.col("parent_id").is_null(true));
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"t1\".\"name\" FROM \"category\" AS \"t1\" \
         WHERE (\"t1\".\"parent_id\" IS ?)"
    );
    assert_eq!(params, vec![SqlValue::Null]);
}

#[test]
fn test_literals_coerce_to_the_column_type() {
    let sample = common::sample();
    let query = SelectQuery::new(&sample)
        .columns(vec![sample.col("id")])
        .where_clause(sample.col("counter").eq("42"));
    let (_, params) = compile(query);
    assert_eq!(params, vec![SqlValue::Int(42)]);
}

#[test]
fn test_values_list_as_a_row_source() {
    let rows = vec![
        vec![SqlValue::Int(1), SqlValue::Text("huey".into())],
        vec![SqlValue::Int(2), SqlValue::Text("mickey".into())],
    ];
    let vals = DerivedSource::values(rows, "v", &["id", "username"]);
    let query = SelectQuery::new(&vals);
    let (sql, params) = compile(query);
    assert_eq!(
        sql,
        "SELECT \"v\".\"id\", \"v\".\"username\" FROM \
         (VALUES (?, ?), (?, ?)) AS \"v\"(\"id\", \"username\")"
    );
    assert_eq!(params.len(), 4);
}

#[test]
fn test_distinct() {
    let tweets = common::tweets();
    let query = SelectQuery::new(&tweets)
        .columns(vec![tweets.col("user_id")])
        .distinct();
    let (sql, _) = compile(query);
    assert_eq!(
        sql,
        "SELECT DISTINCT \"t1\".\"user_id\" FROM \"tweet\" AS \"t1\""
    );
}

#[test]
fn test_empty_projection_compiles_verbatim() {
    let users = common::users();
    let query = SelectQuery::new(&users).columns(Vec::new());
    let (sql, params) = compile(query);
    assert_eq!(sql, "SELECT  FROM \"users\" AS \"t1\"");
    assert!(params.is_empty());
}
