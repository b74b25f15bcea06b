use crate::model::{Bar, MarketSeries, StorageError};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, params};

/// Persists fetched series so a rerun inside the freshness window can skip
/// the network entirely. One row per bar, one fetch-log row per cache key.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS series_bars (
                cache_key TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                PRIMARY KEY (cache_key, date)
            );

            CREATE TABLE IF NOT EXISTS fetch_log (
                cache_key TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                interval TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self { conn })
    }

    /// Replaces the stored series for a key wholesale and records the
    /// fetch time. A series is always written as one consistent snapshot.
    pub fn save_series(
        &self,
        key: &str,
        series: &MarketSeries,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM series_bars WHERE cache_key = ?1", params![key])?;

        let mut stmt = self.conn.prepare(
            "INSERT INTO series_bars (cache_key, date, open, high, low, close, volume)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for bar in series.bars() {
            stmt.execute(params![
                key,
                bar.date.to_string(),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume,
            ])?;
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO fetch_log (cache_key, symbol, interval, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key,
                series.symbol(),
                series.interval(),
                fetched_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Loads the stored series for a key together with its fetch time,
    /// or `None` when the key was never persisted.
    pub fn load_series(
        &self,
        key: &str,
    ) -> Result<Option<(MarketSeries, DateTime<Utc>)>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT symbol, interval, fetched_at FROM fetch_log WHERE cache_key = ?1")?;
        let mut rows = stmt.query(params![key])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let symbol: String = row.get(0)?;
        let interval: String = row.get(1)?;
        let fetched_at_str: String = row.get(2)?;
        let fetched_at: DateTime<Utc> = fetched_at_str
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("fetched_at: {}", e)))?;

        let mut stmt = self.conn.prepare(
            "SELECT date, open, high, low, close, volume
             FROM series_bars WHERE cache_key = ?1 ORDER BY date ASC",
        )?;
        let bar_rows = stmt.query_map(params![key], |row| {
            let date_str: String = row.get(0)?;
            Ok((
                date_str,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
            ))
        })?;

        let mut bars = Vec::new();
        for bar_row in bar_rows {
            let (date_str, open, high, low, close, volume) = bar_row?;
            let date: NaiveDate = date_str
                .parse()
                .map_err(|e| StorageError::Corrupt(format!("bar date: {}", e)))?;
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        let series = MarketSeries::new(&symbol, &interval, bars)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        Ok(Some((series, fetched_at)))
    }
}
