// Relational Sink
// SQLite store holding one replaceable table of bank rows.
//
// BankStore owns the connection: `close()` is the explicit success-path close,
// and on any early return the connection is released when the store drops.

use crate::error::EtlError;
use crate::model::{BankRecord, BankTable};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

pub struct BankStore {
    conn: Connection,
}

impl BankStore {
    /// Open (or create) a file-backed store in WAL mode
    pub fn open(path: &Path) -> Result<Self, EtlError> {
        let conn = Connection::open(path).map_err(|e| {
            EtlError::storage(format!("cannot open database {}", path.display()), e)
        })?;

        // Enable WAL mode for crash recovery
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(path = %path.display(), journal_mode = %mode, "database opened");

        Ok(BankStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, EtlError> {
        let conn = Connection::open_in_memory()?;
        Ok(BankStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace `table_name` with the rows of `table`, in table order.
    ///
    /// Drop, create and insert run in one transaction; readers see either the
    /// previous table or the complete new one. `table_name` must already be a
    /// validated identifier.
    pub fn write_table(&mut self, table: &BankTable, table_name: &str) -> Result<usize, EtlError> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table_name}\";
             CREATE TABLE \"{table_name}\" (
                \"Name\" TEXT,
                \"MC_USD_Billion\" REAL,
                \"MC_GBP_Billion\" REAL,
                \"MC_EUR_Billion\" REAL,
                \"MC_INR_Billion\" REAL
             );"
        ))
        .map_err(|e| EtlError::storage(format!("cannot create table {table_name}"), e))?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{table_name}\" (
                    \"Name\", \"MC_USD_Billion\", \"MC_GBP_Billion\", \"MC_EUR_Billion\", \"MC_INR_Billion\"
                 ) VALUES (?1, ?2, ?3, ?4, ?5)"
            ))?;

            for record in table {
                stmt.execute(params![
                    record.name,
                    record.mc_usd_billion,
                    record.mc_gbp_billion,
                    record.mc_eur_billion,
                    record.mc_inr_billion,
                ])
                .map_err(|e| {
                    EtlError::storage(format!("insert of '{}' into {table_name} failed", record.name), e)
                })?;
                inserted += 1;
            }
        }

        tx.commit()
            .map_err(|e| EtlError::storage(format!("commit of {table_name} failed"), e))?;

        debug!(table = table_name, rows = inserted, "table replaced");
        Ok(inserted)
    }

    pub fn row_count(&self, table_name: &str) -> Result<i64, EtlError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{table_name}\""),
            [],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// Read the stored table back in insertion order
    pub fn load_table(&self, table_name: &str) -> Result<BankTable, EtlError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT \"Name\", \"MC_USD_Billion\", \"MC_GBP_Billion\", \"MC_EUR_Billion\", \"MC_INR_Billion\"
             FROM \"{table_name}\"
             ORDER BY rowid"
        ))?;

        let records = stmt
            .query_map([], |row| {
                Ok(BankRecord {
                    name: row.get(0)?,
                    mc_usd_billion: row.get(1)?,
                    mc_gbp_billion: row.get(2)?,
                    mc_eur_billion: row.get(3)?,
                    mc_inr_billion: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BankTable::from(records))
    }

    /// Close on the success path so close errors are reported
    pub fn close(self) -> Result<(), EtlError> {
        self.conn
            .close()
            .map_err(|(_, e)| EtlError::storage("failed to close database", e))
    }
}
