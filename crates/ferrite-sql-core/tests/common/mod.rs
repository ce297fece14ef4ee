//! Shared table fixtures.
#![allow(dead_code)]

use std::sync::Arc;

use ferrite_sql_core::{Column, ForeignKey, SqlValue, Table};

pub fn users() -> Arc<Table> {
    Table::build("users")
        .auto_primary_key("id")
        .column(Column::text("username"))
        .finish()
        .unwrap()
}

pub fn tweets() -> Arc<Table> {
    Table::build("tweet")
        .auto_primary_key("id")
        .column(Column::integer("user_id"))
        .column(Column::text("content"))
        .column(Column::integer("timestamp"))
        .foreign_key(ForeignKey::new("user_id", "users", "user").backref("tweets"))
        .finish()
        .unwrap()
}

pub fn sample() -> Arc<Table> {
    Table::build("sample")
        .auto_primary_key("id")
        .column(Column::integer("counter"))
        .column(Column::float("value").with_default(Arc::new(|| SqlValue::Float(1.0))))
        .finish()
        .unwrap()
}

pub fn favorites() -> Arc<Table> {
    Table::build("favorite")
        .auto_primary_key("id")
        .column(Column::integer("user_id"))
        .column(Column::integer("tweet_id"))
        .foreign_key(ForeignKey::new("user_id", "users", "user").backref("favorites"))
        .foreign_key(ForeignKey::new("tweet_id", "tweet", "tweet").backref("favorites"))
        .finish()
        .unwrap()
}

pub fn relationships() -> Arc<Table> {
    Table::build("relationship")
        .auto_primary_key("id")
        .column(Column::integer("from_user_id"))
        .column(Column::integer("to_user_id"))
        .foreign_key(ForeignKey::new("from_user_id", "users", "from_user").backref("following"))
        .foreign_key(ForeignKey::new("to_user_id", "users", "to_user").backref("followers"))
        .finish()
        .unwrap()
}

pub fn category() -> Arc<Table> {
    Table::build("category")
        .column(Column::text("name"))
        .column(Column::text("parent_id"))
        .primary_key("name")
        .foreign_key(ForeignKey::new("parent_id", "category", "parent").backref("children"))
        .finish()
        .unwrap()
}
