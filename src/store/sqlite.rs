//! [LedgerStore] backed by the application's SQLite database.

use rusqlite::{Connection, params_from_iter, types::Value};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::{Category, Color, NewCategory, create_category},
    money::{decimal_from_cents, decimal_to_cents},
    store::{CategoryTotalRow, DateRange, LedgerStore, TransactionQuery},
    transaction::{
        DEFAULT_ORDER, Transaction, TransactionKind, map_transaction_row, select_transactions,
    },
};

impl LedgerStore for Connection {
    fn query_transactions(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let (where_clause, mut query_parameters) = build_where_clause(user_id, query)?;
        let mut query_string = format!(
            "{} {where_clause} {DEFAULT_ORDER}",
            select_transactions(kind)
        );

        if let Some(limit) = query.limit {
            query_string.push_str(&format!(" LIMIT ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Integer(i64::from(limit)));
        }

        self.prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), map_transaction_row)?
            .map(|transaction_result| transaction_result.map_err(Error::from))
            .collect()
    }

    fn sum_amounts(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<Decimal, Error> {
        let (where_clause, query_parameters) = build_where_clause(user_id, query)?;
        let query_string = format!(
            "SELECT COALESCE(SUM(t.amount), 0) FROM {table} t {where_clause}",
            table = kind.table()
        );

        let cents: i64 = self.query_row(
            &query_string,
            params_from_iter(query_parameters.iter()),
            |row| row.get(0),
        )?;

        Ok(decimal_from_cents(cents))
    }

    fn sum_by_month(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<(Date, Decimal)>, Error> {
        let (where_clause, query_parameters) =
            build_where_clause(user_id, &TransactionQuery::in_range(range))?;
        let query_string = format!(
            "SELECT strftime('%Y-%m-01', t.date) AS month, SUM(t.amount)
            FROM {table} t {where_clause}
            GROUP BY month
            ORDER BY month ASC",
            table = kind.table()
        );

        self.prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), |row| {
                let month: Date = row.get(0)?;
                let cents: i64 = row.get(1)?;

                Ok((month, decimal_from_cents(cents)))
            })?
            .map(|row_result| row_result.map_err(Error::from))
            .collect()
    }

    fn sum_by_category(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<CategoryTotalRow>, Error> {
        let (where_clause, query_parameters) =
            build_where_clause(user_id, &TransactionQuery::in_range(range))?;
        let query_string = format!(
            "SELECT t.category_id, c.name, c.color, SUM(t.amount)
            FROM {table} t
            LEFT JOIN category c ON c.id = t.category_id
            {where_clause}
            GROUP BY t.category_id",
            table = kind.table()
        );

        self.prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), |row| {
                let color: Option<String> = row.get(2)?;
                let cents: i64 = row.get(3)?;

                Ok(CategoryTotalRow {
                    category_id: row.get(0)?,
                    name: row.get(1)?,
                    color: color.map(|color| Color::new_unchecked(&color)),
                    total: decimal_from_cents(cents),
                })
            })?
            .map(|row_result| row_result.map_err(Error::from))
            .collect()
    }

    fn category_names(&self, user_id: UserID) -> Result<Vec<String>, Error> {
        self.prepare("SELECT name FROM category WHERE user_id = ?1")?
            .query_map([user_id.as_i64()], |row| row.get(0))?
            .map(|name_result| name_result.map_err(Error::from))
            .collect()
    }

    fn insert_category(&self, user_id: UserID, category: NewCategory) -> Result<Category, Error> {
        create_category(user_id, category, self)
    }
}

/// Build the WHERE clause and its parameters for `query`.
///
/// The clause refers to the transaction table by the alias `t`.
fn build_where_clause(
    user_id: UserID,
    query: &TransactionQuery,
) -> Result<(String, Vec<Value>), Error> {
    let mut where_clause_parts = vec!["t.user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    if let Some(search) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty())
    {
        let index = query_parameters.len() + 1;
        where_clause_parts.push(format!(
            "(t.title LIKE ?{index} ESCAPE '\\' OR t.description LIKE ?{index} ESCAPE '\\')"
        ));
        query_parameters.push(Value::Text(format!("%{}%", escape_like_pattern(search))));
    }

    if let Some(category_id) = query.category_id {
        where_clause_parts.push(format!("t.category_id = ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Integer(category_id));
    }

    if let Some(start) = query.date_range.start {
        where_clause_parts.push(format!("t.date >= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(start.to_string()));
    }

    if let Some(end) = query.date_range.end {
        where_clause_parts.push(format!("t.date <= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(end.to_string()));
    }

    if let Some(amount_min) = query.amount_min {
        where_clause_parts.push(format!("t.amount >= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Integer(decimal_to_cents(amount_min)?));
    }

    if let Some(amount_max) = query.amount_max {
        where_clause_parts.push(format!("t.amount <= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Integer(decimal_to_cents(amount_max)?));
    }

    Ok((
        String::from("WHERE ") + &where_clause_parts.join(" AND "),
        query_parameters,
    ))
}

/// Escape the LIKE wildcards in `text` so that it is matched literally.
fn escape_like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
