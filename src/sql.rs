//! Small helper for building parameterized queries with conditional filters.

use crate::error::AppError;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub enum BindValue {
    Uuid(Uuid),
    Str(String),
    I64(i64),
}

impl From<Uuid> for BindValue {
    fn from(v: Uuid) -> Self {
        BindValue::Uuid(v)
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Str(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Str(v.to_string())
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::I64(v)
    }
}

/// SQL text plus ordered parameters. Filters are appended as `AND col = $n`
/// in encounter order; the base query supplies its own WHERE clause.
pub struct QueryBuf {
    pub sql: String,
    params: Vec<BindValue>,
}

impl QueryBuf {
    pub fn new(base: impl Into<String>) -> Self {
        QueryBuf {
            sql: base.into(),
            params: Vec::new(),
        }
    }

    pub fn push_param(&mut self, value: impl Into<BindValue>) -> usize {
        self.params.push(value.into());
        self.params.len()
    }

    /// Append `AND <column> = $n` binding `value`. `column` must be a fixed
    /// identifier, never request input.
    pub fn and_eq(&mut self, column: &str, value: impl Into<BindValue>) {
        let n = self.push_param(value);
        self.sql.push_str(&format!(" AND {} = ${}", column, n));
    }

    pub fn push_sql(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    /// Append `LIMIT $n OFFSET $m`.
    pub fn limit_offset(&mut self, limit: u32, offset: u32) {
        let l = self.push_param(limit as i64);
        let o = self.push_param(offset as i64);
        self.sql.push_str(&format!(" LIMIT ${} OFFSET ${}", l, o));
    }

    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %self.sql, "query");
        let mut query = sqlx::query_as::<_, T>(&self.sql);
        for p in &self.params {
            query = match p {
                BindValue::Uuid(v) => query.bind(*v),
                BindValue::Str(v) => query.bind(v.clone()),
                BindValue::I64(v) => query.bind(*v),
            };
        }
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn fetch_optional<T>(&self, pool: &PgPool) -> Result<Option<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %self.sql, "query");
        let mut query = sqlx::query_as::<_, T>(&self.sql);
        for p in &self.params {
            query = match p {
                BindValue::Uuid(v) => query.bind(*v),
                BindValue::Str(v) => query.bind(v.clone()),
                BindValue::I64(v) => query.bind(*v),
            };
        }
        Ok(query.fetch_optional(pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_number_in_encounter_order() {
        let mut q = QueryBuf::new("SELECT * FROM contributions WHERE tenant_id = $1");
        q.push_param(Uuid::nil());
        q.and_eq("status", "draft");
        q.and_eq("contribution_month", "2025-06");
        q.limit_offset(100, 0);
        assert_eq!(
            q.sql,
            "SELECT * FROM contributions WHERE tenant_id = $1 AND status = $2 AND contribution_month = $3 LIMIT $4 OFFSET $5"
        );
    }
}
