//! Translates optional filter criteria into a parameterized `SELECT`.
//!
//! Values never end up in the SQL text. Every value goes through
//! [`QueryBuilder::bind`], which hands back the next `$n` placeholder, so the
//! parameter list is always in placeholder order.

use super::{Priority, Status, ValidationError};
use chrono::NaiveDate;
use sea_orm::{DbBackend, Statement, Value};

pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_OFFSET: u64 = 0;

const SELECT_TODOS: &str =
    "SELECT id, title, description, due_date, tags, priority, status, overdue FROM todos";

/// Offset/limit window over the ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

/// Criteria for listing todos. Every field is optional; an empty filter
/// selects the whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    /// Matches todos carrying at least one of these tags. Blank tags are ignored.
    pub tags: Vec<String>,
    /// Raw status value, checked against [`Status`] when the query is built.
    pub status: Option<String>,
    /// Raw priority value, checked against [`Priority`] when the query is built.
    pub priority: Option<String>,
    /// `None` leaves the overdue flag unconstrained; `Some(false)` selects todos
    /// that are explicitly not overdue.
    pub overdue: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub pagination: Option<Pagination>,
}

impl TodoFilter {
    /// Builds the `SELECT` statement for this filter.
    ///
    /// Fails with [`ValidationError::InvalidField`] when the status or priority
    /// is not a known member, before any SQL is produced.
    pub fn to_statement(&self) -> Result<Statement, ValidationError> {
        let mut query = QueryBuilder::default();

        let tag_conditions: Vec<String> = self
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(|tag| format!("{} = ANY(tags)", query.bind(tag)))
            .collect();
        if !tag_conditions.is_empty() {
            query.push_condition(format!("({})", tag_conditions.join(" OR ")));
        }

        if let Some(status) = non_blank(&self.status) {
            let status: Status = status.parse()?;
            let placeholder = query.bind(status.as_str());
            query.push_condition(format!("status = {placeholder}"));
        }

        if let Some(priority) = non_blank(&self.priority) {
            let priority: Priority = priority.parse()?;
            let placeholder = query.bind(priority.as_str());
            query.push_condition(format!("priority = {placeholder}"));
        }

        if let Some(overdue) = self.overdue {
            let placeholder = query.bind(overdue);
            query.push_condition(format!("overdue = {placeholder}"));
        }

        if let Some(due_date) = self.due_date {
            let placeholder = query.bind(due_date);
            query.push_condition(format!("due_date = {placeholder}"));
        }

        Ok(query.build(self.pagination))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// Collects conditions and their bound values for a `todos` query.
#[derive(Debug, Default)]
struct QueryBuilder {
    conditions: Vec<String>,
    values: Vec<Value>,
}

impl QueryBuilder {
    /// Records a value and returns the placeholder that refers to it.
    fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    fn push_condition(&mut self, condition: String) {
        self.conditions.push(condition);
    }

    fn build(mut self, pagination: Option<Pagination>) -> Statement {
        let mut sql = String::from(SELECT_TODOS);
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY id");
        if let Some(pagination) = pagination {
            let limit = self.bind(to_i64(pagination.limit));
            let offset = self.bind(to_i64(pagination.offset));
            sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
        }
        Statement::from_sql_and_values(DbBackend::Postgres, sql, self.values)
    }
}

// Postgres has no unsigned integers; anything past i64::MAX is "no limit" anyway.
fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Values;

    fn values(values: Vec<Value>) -> Option<Values> {
        Some(Values(values))
    }

    #[test]
    fn empty_filter_selects_everything() {
        let statement = TodoFilter::default().to_statement().unwrap();

        assert_eq!(
            statement.sql,
            "SELECT id, title, description, due_date, tags, priority, status, overdue FROM todos ORDER BY id"
        );
        assert_eq!(statement.values, values(vec![]));
    }

    #[test]
    fn can_group_tags_with_or() {
        let filter = TodoFilter {
            tags: vec!["api".to_string(), "backend".to_string()],
            ..Default::default()
        };

        let statement = filter.to_statement().unwrap();

        assert_eq!(
            statement.sql,
            format!("{SELECT_TODOS} WHERE ($1 = ANY(tags) OR $2 = ANY(tags)) ORDER BY id")
        );
        assert_eq!(
            statement.values,
            values(vec![Value::from("api"), Value::from("backend")])
        );
    }

    #[test]
    fn blank_tags_produce_no_condition() {
        let filter = TodoFilter {
            tags: vec!["".to_string(), "   ".to_string()],
            ..Default::default()
        };

        let statement = filter.to_statement().unwrap();

        assert_eq!(statement.sql, format!("{SELECT_TODOS} ORDER BY id"));
        assert_eq!(statement.values, values(vec![]));
    }

    #[test]
    fn blank_tags_do_not_consume_placeholders() {
        let filter = TodoFilter {
            tags: vec!["".to_string(), " home ".to_string()],
            status: Some("planned".to_string()),
            ..Default::default()
        };

        let statement = filter.to_statement().unwrap();

        assert_eq!(
            statement.sql,
            format!("{SELECT_TODOS} WHERE ($1 = ANY(tags)) AND status = $2 ORDER BY id")
        );
        assert_eq!(
            statement.values,
            values(vec![Value::from("home"), Value::from("planned")])
        );
    }

    #[test]
    fn can_number_placeholders_across_every_condition() {
        let due_date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let filter = TodoFilter {
            tags: vec!["api".to_string()],
            status: Some("in_progress".to_string()),
            priority: Some("urgent".to_string()),
            overdue: Some(true),
            due_date: Some(due_date),
            pagination: Some(Pagination {
                limit: 5,
                offset: 10,
            }),
        };

        let statement = filter.to_statement().unwrap();

        assert_eq!(
            statement.sql,
            format!(
                "{SELECT_TODOS} WHERE ($1 = ANY(tags)) AND status = $2 AND priority = $3 \
                 AND overdue = $4 AND due_date = $5 ORDER BY id LIMIT $6 OFFSET $7"
            )
        );
        assert_eq!(
            statement.values,
            values(vec![
                Value::from("api"),
                Value::from("in_progress"),
                Value::from("urgent"),
                Value::from(true),
                Value::from(due_date),
                Value::from(5i64),
                Value::from(10i64),
            ])
        );
    }

    #[test]
    fn overdue_false_is_a_condition() {
        let filter = TodoFilter {
            overdue: Some(false),
            ..Default::default()
        };

        let statement = filter.to_statement().unwrap();

        assert_eq!(
            statement.sql,
            format!("{SELECT_TODOS} WHERE overdue = $1 ORDER BY id")
        );
        assert_eq!(statement.values, values(vec![Value::from(false)]));
    }

    #[test]
    fn overdue_none_is_not_a_condition() {
        let statement = TodoFilter::default().to_statement().unwrap();
        assert!(!statement.sql.contains("overdue ="));
    }

    #[test]
    fn can_reject_invalid_status_before_building() {
        let filter = TodoFilter {
            status: Some("done".to_string()),
            ..Default::default()
        };

        assert_eq!(
            filter.to_statement().unwrap_err(),
            ValidationError::InvalidField {
                field: "Status",
                value: "done".to_string(),
            }
        );
    }

    #[test]
    fn can_reject_invalid_priority_before_building() {
        let filter = TodoFilter {
            priority: Some("critical".to_string()),
            ..Default::default()
        };

        assert_eq!(
            filter.to_statement().unwrap_err(),
            ValidationError::InvalidField {
                field: "Priority",
                value: "critical".to_string(),
            }
        );
    }

    #[test]
    fn empty_status_and_priority_are_ignored() {
        let filter = TodoFilter {
            status: Some(String::new()),
            priority: Some(" ".to_string()),
            ..Default::default()
        };

        let statement = filter.to_statement().unwrap();

        assert_eq!(statement.sql, format!("{SELECT_TODOS} ORDER BY id"));
    }

    #[test]
    fn pagination_follows_condition_placeholders() {
        let filter = TodoFilter {
            priority: Some("low".to_string()),
            pagination: Some(Pagination::default()),
            ..Default::default()
        };

        let statement = filter.to_statement().unwrap();

        assert_eq!(
            statement.sql,
            format!("{SELECT_TODOS} WHERE priority = $1 ORDER BY id LIMIT $2 OFFSET $3")
        );
        assert_eq!(
            statement.values,
            values(vec![
                Value::from("low"),
                Value::from(DEFAULT_LIMIT as i64),
                Value::from(DEFAULT_OFFSET as i64),
            ])
        );
    }

    #[test]
    fn can_build_listing_query_for_overdue_tagged_page() {
        let filter = TodoFilter {
            tags: vec!["home".to_string(), "garden".to_string()],
            overdue: Some(true),
            pagination: Some(Pagination {
                limit: 20,
                offset: 0,
            }),
            ..Default::default()
        };

        let statement = filter.to_statement().unwrap();

        insta::assert_snapshot!(
            statement.sql,
            @"SELECT id, title, description, due_date, tags, priority, status, overdue FROM todos WHERE ($1 = ANY(tags) OR $2 = ANY(tags)) AND overdue = $3 ORDER BY id LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn oversized_limit_saturates() {
        assert_eq!(to_i64(u64::MAX), i64::MAX);
        assert_eq!(to_i64(42), 42);
    }
}
