// Query Runner
// Runs the fixed report queries against the loaded table and prints each one
// (SQL text, then the rows) to the configured writer.

use crate::db::BankStore;
use crate::error::EtlError;
use rusqlite::types::Value;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// The three report queries, in the order they run:
/// full dump, GBP average, names of the first five loaded rows.
/// The table name is quoted the same way `BankStore` quotes it, so keyword
/// names such as `order` resolve to the stored table.
pub fn fixed_queries(table_name: &str) -> [String; 3] {
    [
        format!("SELECT * FROM \"{table_name}\""),
        format!("SELECT AVG(MC_GBP_Billion) FROM \"{table_name}\""),
        format!("SELECT Name from \"{table_name}\" LIMIT 5"),
    ]
}

// ============================================================================
// RESULT SET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub sql: String,
    pub columns: Vec<String>,
    #[serde(serialize_with = "serialize_rows")]
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First cell as a number, for aggregate queries
    pub fn scalar_f64(&self) -> Option<f64> {
        match self.rows.first()?.first()? {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text values of one column, in row order
    pub fn column_text(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| match row.get(index) {
                Some(Value::Text(s)) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => format!("{v:?}"),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn serialize_rows<S: serde::Serializer>(rows: &[Vec<Value>], serializer: S) -> Result<S::Ok, S::Error> {
    let json: Vec<Vec<serde_json::Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Value::Null => serde_json::Value::Null,
                    Value::Integer(v) => serde_json::json!(v),
                    Value::Real(v) => serde_json::json!(v),
                    Value::Text(s) => serde_json::json!(s),
                    Value::Blob(b) => serde_json::json!(b),
                })
                .collect()
        })
        .collect();
    json.serialize(serializer)
}

/// Right-aligned grid with a leading row index, one line per row
impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(render_cell).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (name, &width) in self.columns.iter().zip(&widths) {
            write!(f, "  {name:>width$}")?;
        }
        writeln!(f)?;

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{i:>index_width$}")?;
            for (cell, &width) in row.iter().zip(&widths) {
                write!(f, "  {cell:>width$}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

// ============================================================================
// RUNNER
// ============================================================================

pub struct QueryRunner<W: Write> {
    out: W,
}

impl<W: Write> QueryRunner<W> {
    pub fn new(out: W) -> Self {
        QueryRunner { out }
    }

    /// Execute `sql`, print it and its result, and hand the rows back
    pub fn run_query(&mut self, sql: &str, store: &BankStore) -> Result<ResultSet, EtlError> {
        let result = execute(sql, store)?;

        write!(self.out, "{sql}\n{result}")
            .and_then(|_| self.out.flush())
            .map_err(|e| EtlError::io_at("run queries", "cannot write query output", e))?;

        Ok(result)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Execute without printing
pub fn execute(sql: &str, store: &BankStore) -> Result<ResultSet, EtlError> {
    let conn = store.connection();
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| EtlError::storage(format!("cannot prepare '{sql}'"), e))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt
        .query([])
        .map_err(|e| EtlError::storage(format!("query '{sql}' failed"), e))?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(row.get::<_, Value>(i)?);
        }
        rows.push(values);
    }

    Ok(ResultSet {
        sql: sql.to_string(),
        columns,
        rows,
    })
}
