//! SQLite-backed gazetteer.
//!
//! The `cities` table is populated once from reference data and only read
//! during pipeline runs, so lookups never contend with writers.

use std::collections::HashSet;
use std::path::Path;

use projection::QuantizedKey;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::city::City;
use crate::{GazetteerError, GazetteerResult};

/// SQLite caps bound parameters per statement, so key sets are chunked.
const KEYS_PER_QUERY: usize = 500;

const CREATE_CITIES: &str = r#"
    CREATE TABLE IF NOT EXISTS cities (
        id TEXT PRIMARY KEY,
        country TEXT NOT NULL,
        name TEXT NOT NULL,
        name_en TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        xy TEXT NOT NULL
    )
"#;

type CityRow = (i64, String, String, String, String, f64, f64, String);

/// Persisted city store queried by grid key.
#[derive(Clone)]
pub struct Gazetteer {
    pool: SqlitePool,
}

impl Gazetteer {
    /// Open or create the gazetteer database at the given path.
    pub async fn open(path: &Path) -> GazetteerResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::create_schema(&pool).await?;

        info!(path = %path.display(), "Opened gazetteer database");

        Ok(Self { pool })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_memory() -> GazetteerResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::create_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> GazetteerResult<()> {
        sqlx::query(CREATE_CITIES).execute(pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cities_xy ON cities(xy)")
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Insert a city unless one with the same id exists.
    ///
    /// Returns whether a row was written.
    pub async fn insert(&self, city: &City) -> GazetteerResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO cities (id, country, name, name_en, latitude, longitude, xy)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&city.id)
        .bind(&city.country)
        .bind(&city.name)
        .bind(&city.name_en)
        .bind(city.latitude)
        .bind(city.longitude)
        .bind(city.key.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert many cities in one transaction. Returns the number written.
    pub async fn insert_many(&self, cities: &[City]) -> GazetteerResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for city in cities {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO cities (id, country, name, name_en, latitude, longitude, xy)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&city.id)
            .bind(&city.country)
            .bind(&city.name)
            .bind(&city.name_en)
            .bind(city.latitude)
            .bind(city.longitude)
            .bind(city.key.to_string())
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }

        tx.commit().await?;

        info!(
            offered = cities.len(),
            inserted = inserted,
            "Imported cities into gazetteer"
        );
        Ok(inserted)
    }

    pub async fn count(&self) -> GazetteerResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cities")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// All cities whose key is in `keys`, in storage order.
    pub async fn find_by_keys(&self, keys: &[QuantizedKey]) -> GazetteerResult<Vec<City>> {
        let unique: Vec<String> = keys
            .iter()
            .map(|k| k.to_string())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut rows: Vec<CityRow> = Vec::new();
        for chunk in unique.chunks(KEYS_PER_QUERY) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT rowid, id, country, name, name_en, latitude, longitude, xy \
                 FROM cities WHERE xy IN ({})",
                placeholders
            );
            let mut query = sqlx::query_as::<_, CityRow>(&sql);
            for key in chunk {
                query = query.bind(key);
            }
            rows.extend(query.fetch_all(&self.pool).await?);
        }

        rows.sort_by_key(|row| row.0);
        debug!(keys = unique.len(), cities = rows.len(), "Gazetteer key lookup");

        rows.into_iter().map(row_to_city).collect()
    }

    /// The `limit` cities nearest to a point by squared degree distance.
    pub async fn closest(
        &self,
        latitude: f64,
        longitude: f64,
        limit: u32,
    ) -> GazetteerResult<Vec<City>> {
        let rows = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT rowid, id, country, name, name_en, latitude, longitude, xy
            FROM cities
            ORDER BY (latitude - ?1) * (latitude - ?1) + (longitude - ?2) * (longitude - ?2), rowid
            LIMIT ?3
            "#,
        )
        .bind(latitude)
        .bind(longitude)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_city).collect()
    }
}

fn row_to_city(row: CityRow) -> GazetteerResult<City> {
    let (_, id, country, name, name_en, latitude, longitude, xy) = row;
    let key = xy
        .parse::<QuantizedKey>()
        .map_err(|e| GazetteerError::InvalidRecord(format!("city {}: {}", id, e)))?;
    Ok(City {
        id,
        country,
        name,
        name_en,
        latitude,
        longitude,
        key,
    })
}
