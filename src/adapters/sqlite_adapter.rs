//! SQLite data adapter.
//!
//! Instrument prices live in `prices`, macro indicator values in `macro`.
//! Both tables share the `(symbol, date, value)` layout.

use crate::domain::error::DcaError;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesTable {
    Prices,
    Macro,
}

impl SeriesTable {
    fn name(self) -> &'static str {
        match self {
            SeriesTable::Prices => "prices",
            SeriesTable::Macro => "macro",
        }
    }
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err(e: r2d2::Error) -> DcaError {
    DcaError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> DcaError {
    DcaError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DcaError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DcaError::Database {
        reason: format!("invalid date '{}': {}", s, e),
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DcaError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| DcaError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, DcaError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, DcaError> {
        self.pool.get().map_err(db_err)
    }

    pub fn initialize_schema(&self) -> Result<(), DcaError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (symbol, date)
            );
            CREATE TABLE IF NOT EXISTS macro (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (symbol, date)
            );",
        )
        .map_err(query_err)
    }

    pub fn insert_series(
        &self,
        table: SeriesTable,
        symbol: &str,
        series: &PriceSeries,
    ) -> Result<(), DcaError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let sql = format!(
            "INSERT OR REPLACE INTO {} (symbol, date, value) VALUES (?1, ?2, ?3)",
            table.name()
        );
        for point in series.points() {
            tx.execute(
                &sql,
                params![symbol, point.date.format("%Y-%m-%d").to_string(), point.value],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }

    fn fetch(
        &self,
        table: SeriesTable,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT date, value FROM {}
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
            table.name()
        );

        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(
                params![
                    symbol,
                    start_date.format("%Y-%m-%d").to_string(),
                    end_date.format("%Y-%m-%d").to_string()
                ],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )
            .map_err(query_err)?;

        let mut points = Vec::new();
        for row in rows {
            let (date_str, value) = row.map_err(query_err)?;
            points.push(PricePoint {
                date: parse_date(&date_str)?,
                value,
            });
        }

        Ok(PriceSeries::new(points))
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_price_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        self.fetch(SeriesTable::Prices, ticker, start_date, end_date)
    }

    fn fetch_macro_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, DcaError> {
        self.fetch(SeriesTable::Macro, code, start_date, end_date)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        let conn = self.conn()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM prices WHERE symbol = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => {
                Ok(Some((parse_date(&min)?, parse_date(&max)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
