//! Shared registries.
#![allow(dead_code)]

use ferrite_orm::Registry;
use ferrite_sql_core::{Column, ForeignKey, Table};

/// users <- tweet <- favorite, favorite also references users.
pub fn social() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            Table::build("users")
                .auto_primary_key("id")
                .column(Column::text("username"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("tweet")
                .auto_primary_key("id")
                .column(Column::integer("user_id"))
                .column(Column::text("content"))
                .foreign_key(ForeignKey::new("user_id", "users", "user").backref("tweets"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("favorite")
                .auto_primary_key("id")
                .column(Column::integer("user_id"))
                .column(Column::integer("tweet_id"))
                .foreign_key(ForeignKey::new("user_id", "users", "user").backref("favorites"))
                .foreign_key(ForeignKey::new("tweet_id", "tweet", "tweet").backref("favorites"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
}

/// A self-referential category tree.
pub fn categories() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            Table::build("category")
                .column(Column::text("name"))
                .column(Column::text("parent_id"))
                .primary_key("name")
                .foreign_key(
                    ForeignKey::new("parent_id", "category", "parent").backref("children"),
                )
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
}

/// a <- b <- c <- d, where b references a non-key column of a.
pub fn chain() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            Table::build("a")
                .auto_primary_key("id")
                .column(Column::text("key"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("b")
                .auto_primary_key("id")
                .column(Column::text("a_id"))
                .foreign_key(ForeignKey::new("a_id", "a", "a").target_column("key"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("c")
                .auto_primary_key("id")
                .column(Column::integer("b_id"))
                .foreign_key(ForeignKey::new("b_id", "b", "b"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("d")
                .auto_primary_key("id")
                .column(Column::integer("c_id"))
                .foreign_key(ForeignKey::new("c_id", "c", "c"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
}

/// One relationship table holding two foreign keys into users.
pub fn relationships() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            Table::build("users")
                .auto_primary_key("id")
                .column(Column::text("username"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("relationship")
                .auto_primary_key("id")
                .column(Column::integer("from_user_id"))
                .column(Column::integer("to_user_id"))
                .foreign_key(
                    ForeignKey::new("from_user_id", "users", "from_user").backref("following"),
                )
                .foreign_key(
                    ForeignKey::new("to_user_id", "users", "to_user").backref("followers"),
                )
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
}

/// org <- team and org <- project, with task referencing both.
pub fn diamond() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            Table::build("org")
                .auto_primary_key("id")
                .column(Column::text("name"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("team")
                .auto_primary_key("id")
                .column(Column::integer("org_id"))
                .foreign_key(ForeignKey::new("org_id", "org", "org"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("project")
                .auto_primary_key("id")
                .column(Column::integer("org_id"))
                .foreign_key(ForeignKey::new("org_id", "org", "org"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            Table::build("task")
                .auto_primary_key("id")
                .column(Column::integer("team_id"))
                .column(Column::integer("project_id"))
                .foreign_key(ForeignKey::new("team_id", "team", "team"))
                .foreign_key(ForeignKey::new("project_id", "project", "project"))
                .finish()
                .unwrap(),
        )
        .unwrap();
    registry
}
