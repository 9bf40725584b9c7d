use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

/// Схема БД. Вложенные документы автомобиля развёрнуты в колонки,
/// массивы (images/features/tags) хранятся как JSON.
const SCHEMA: &[(&str, &str)] = &[
    (
        "a001_car",
        r#"
        CREATE TABLE IF NOT EXISTS a001_car (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            brand TEXT NOT NULL,
            model TEXT NOT NULL,
            year INTEGER NOT NULL,
            price REAL NOT NULL,
            original_price REAL,
            discount_percentage REAL NOT NULL DEFAULT 0,
            lease_monthly REAL,
            lease_deposit REAL,
            lease_term INTEGER,
            description TEXT NOT NULL,
            images TEXT NOT NULL DEFAULT '[]',
            spec_engine TEXT,
            spec_fuel_type TEXT,
            spec_transmission TEXT,
            spec_doors INTEGER,
            spec_seats INTEGER,
            spec_mileage INTEGER,
            spec_co2_emissions INTEGER,
            spec_top_speed INTEGER,
            spec_acceleration REAL,
            category TEXT NOT NULL,
            condition TEXT NOT NULL,
            availability TEXT NOT NULL DEFAULT 'Available',
            dealer_name TEXT NOT NULL,
            dealer_location TEXT NOT NULL,
            dealer_phone TEXT,
            dealer_email TEXT,
            features TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            average_rating REAL NOT NULL DEFAULT 0,
            review_count INTEGER NOT NULL DEFAULT 0,
            views INTEGER NOT NULL DEFAULT 0,
            is_featured INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "a001_car indexes",
        r#"
        CREATE INDEX IF NOT EXISTS idx_a001_car_brand ON a001_car (brand);
        CREATE INDEX IF NOT EXISTS idx_a001_car_category ON a001_car (category);
        CREATE INDEX IF NOT EXISTS idx_a001_car_price ON a001_car (price);
        CREATE INDEX IF NOT EXISTS idx_a001_car_is_active ON a001_car (is_active);
        CREATE INDEX IF NOT EXISTS idx_a001_car_created_at ON a001_car (created_at);
        "#,
    ),
    (
        "a002_review",
        r#"
        CREATE TABLE IF NOT EXISTS a002_review (
            id TEXT PRIMARY KEY NOT NULL,
            car_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            text TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            is_verified INTEGER NOT NULL DEFAULT 0,
            helpful_count INTEGER NOT NULL DEFAULT 0,
            report_count INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "a002_review indexes",
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS ux_a002_review_car_user ON a002_review (car_id, user_id);
        CREATE INDEX IF NOT EXISTS idx_a002_review_car_id ON a002_review (car_id);
        CREATE INDEX IF NOT EXISTS idx_a002_review_is_active ON a002_review (is_active);
        CREATE INDEX IF NOT EXISTS idx_a002_review_created_at ON a002_review (created_at);
        "#,
    ),
];

/// Open (or create) the SQLite database file and bootstrap the schema
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Connecting to database: {}", absolute_path.display());
    let mut options = ConnectOptions::new(db_url);
    options.sqlx_logging(false);
    let conn = Database::connect(options).await?;

    bootstrap_schema(&conn).await?;
    Ok(conn)
}

/// Create tables and indexes that do not exist yet
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for (name, sql) in SCHEMA {
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            conn.execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                statement.to_string(),
            ))
            .await
            .map_err(|e| anyhow::anyhow!("schema bootstrap failed for {}: {}", name, e))?;
        }
        tracing::debug!("Schema ready: {}", name);
    }
    Ok(())
}

/// In-memory database with the full schema; one pooled connection keeps it alive.
#[cfg(test)]
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let conn = connect_in_memory().await.unwrap();
        bootstrap_schema(&conn).await.unwrap();

        let tables = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name".to_string(),
            ))
            .await
            .unwrap();
        let names: Vec<String> = tables
            .iter()
            .map(|row| row.try_get::<String>("", "name").unwrap())
            .collect();
        assert!(names.contains(&"a001_car".to_string()));
        assert!(names.contains(&"a002_review".to_string()));
    }
}
