use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::{
    collections::{HashMap, HashSet},
    fmt,
};
use tracing::{info, instrument, warn};

use super::CURRENT_SCHEMA;

/// Default expressions SQLite refuses in `ALTER TABLE ... ADD COLUMN`.
const NON_CONSTANT_DEFAULTS: [&str; 3] = ["CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME"];

#[derive(Debug, Clone)]
pub struct TableInfo {
    pub sql: String,
}

#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

impl ColumnInfo {
    fn has_constant_default(&self) -> bool {
        match &self.default_value {
            Some(default) => {
                let upper = default.trim().to_ascii_uppercase();
                !NON_CONSTANT_DEFAULTS.contains(&upper.as_str()) && !upper.starts_with('(')
            }
            None => false,
        }
    }

    /// Statements that add this column to `table` and fill it for existing rows.
    ///
    /// SQLite only accepts constant defaults on an added column, so anything
    /// else is added bare and then backfilled with an `UPDATE`.
    fn add_statements(&self, table: &str) -> Result<Vec<String>, MigrationError> {
        if self.primary_key {
            return Err(MigrationError {
                message: format!(
                    "Cannot add primary key column {} to existing table {}",
                    self.name, table
                ),
            });
        }

        let mut definition = format!("{} {}", quote_ident(&self.name), self.data_type);

        if self.has_constant_default() {
            if self.not_null {
                definition.push_str(" NOT NULL");
            }
            if let Some(default) = &self.default_value {
                definition.push_str(&format!(" DEFAULT {}", default));
            }
            return Ok(vec![format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_ident(table),
                definition
            )]);
        }

        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table),
            definition
        )];

        if let Some(default) = &self.default_value {
            statements.push(format!(
                "UPDATE {table} SET {column} = {default} WHERE {column} IS NULL",
                table = quote_ident(table),
                column = quote_ident(&self.name),
                default = default
            ));
        }

        Ok(statements)
    }
}

#[derive(Debug)]
pub struct MigrationError {
    message: String,
}

impl From<sqlx::Error> for MigrationError {
    fn from(error: sqlx::Error) -> Self {
        MigrationError {
            message: format!("Migration error: {}", error),
        }
    }
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MigrationError {}

#[derive(Debug, Default)]
pub struct TableColumnChanges {
    pub table_name: String,
    pub added_columns: Vec<ColumnInfo>,
    pub extra_columns: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ChangesNeeded {
    pub new_tables: Vec<String>,
    pub modified_tables: Vec<TableColumnChanges>,
    pub new_indices: Vec<String>,
    pub current_version: i64,
    pub target_version: i64,
}

impl ChangesNeeded {
    pub fn has_any_changes(&self) -> bool {
        !self.new_tables.is_empty()
            || self
                .modified_tables
                .iter()
                .any(|t| !t.added_columns.is_empty())
            || !self.new_indices.is_empty()
            || self.current_version < self.target_version
    }
}

/// Additive-only migrator.
///
/// Builds the target schema in a pristine in-memory database and brings the
/// live database up to it by creating tables and indexes and adding columns.
/// Nothing is ever dropped; extra live columns are reported and kept.
pub struct SchemaManager {
    pool: Pool<Sqlite>,
    target_schema: String,
    schema_changes_made: u32,
}

impl SchemaManager {
    pub fn new(pool: Pool<Sqlite>, target_schema: &str) -> Self {
        Self {
            pool,
            target_schema: target_schema.to_string(),
            schema_changes_made: 0,
        }
    }

    async fn pristine_pool(&self) -> Result<SqlitePool, MigrationError> {
        // Each in-memory connection is its own database, so keep exactly one
        let pristine_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        if !self.target_schema.trim().is_empty() {
            sqlx::raw_sql(&self.target_schema)
                .execute(&pristine_pool)
                .await
                .map_err(|e| MigrationError {
                    message: format!("Failed to create pristine schema: {}", e),
                })?;
        }
        Ok(pristine_pool)
    }

    pub async fn get_changes(&self) -> Result<ChangesNeeded, MigrationError> {
        let pristine_pool = self.pristine_pool().await?;
        let mut tx = self.pool.begin().await?;
        let changes = analyze_changes(&mut tx, &pristine_pool).await?;
        tx.rollback().await?;
        Ok(changes)
    }

    /// Returns whether any schema change was applied.
    #[instrument(skip(self))]
    pub async fn migrate(&mut self) -> Result<bool, MigrationError> {
        info!("Checking database schema");

        let pristine_pool = self.pristine_pool().await?;
        let mut tx = self.pool.begin().await?;

        let changes = analyze_changes(&mut tx, &pristine_pool).await?;

        for table in &changes.modified_tables {
            if !table.extra_columns.is_empty() {
                warn!(
                    table = %table.table_name,
                    columns = ?table.extra_columns,
                    "Keeping columns that are not part of the current schema"
                );
            }
        }

        if !changes.has_any_changes() {
            tx.commit().await?;
            info!("No schema changes needed");
            return Ok(false);
        }

        match self.apply_changes(&mut tx, &pristine_pool, &changes).await {
            Ok(()) => {
                tx.commit().await?;
                info!(
                    "Migration completed. Schema changes made: {}",
                    self.schema_changes_made
                );
                Ok(self.schema_changes_made > 0)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    #[instrument(skip(self, tx, pristine_pool, changes))]
    async fn apply_changes(
        &mut self,
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        pristine_pool: &SqlitePool,
        changes: &ChangesNeeded,
    ) -> Result<(), MigrationError> {
        let target_tables = get_tables(pristine_pool).await?;
        for table_name in &changes.new_tables {
            if let Some(table_info) = target_tables.get(table_name) {
                self.execute_schema_change(
                    &format!("Create new table {}", table_name),
                    &table_info.sql,
                    &mut **tx,
                )
                .await?;
            }
        }

        for table in &changes.modified_tables {
            for column in &table.added_columns {
                for statement in column.add_statements(&table.table_name)? {
                    self.execute_schema_change(
                        &format!("Add column {} to {}", column.name, table.table_name),
                        &statement,
                        &mut **tx,
                    )
                    .await?;
                }
            }
        }

        // Indexes last, they may cover columns added above
        let target_indices = get_indices(pristine_pool).await?;
        for index_name in &changes.new_indices {
            if let Some(index_info) = target_indices.get(index_name) {
                self.execute_schema_change(
                    &format!("Create new index {}", index_name),
                    &index_info.sql,
                    &mut **tx,
                )
                .await?;
            }
        }

        if changes.current_version < changes.target_version {
            let pragma_sql = format!("PRAGMA user_version = {}", changes.target_version);
            self.execute_schema_change(
                &format!("Set user_version to {}", changes.target_version),
                &pragma_sql,
                &mut **tx,
            )
            .await?;
        }

        Ok(())
    }

    #[instrument(skip(self, executor))]
    async fn execute_schema_change(
        &mut self,
        description: &str,
        sql: &str,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<(), MigrationError> {
        info!("Database migration: {} with SQL:\n{}", description, sql);
        sqlx::query(sql).execute(executor).await?;
        self.schema_changes_made += 1;
        Ok(())
    }
}

#[instrument(skip_all)]
async fn analyze_changes(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    pristine_pool: &SqlitePool,
) -> Result<ChangesNeeded, MigrationError> {
    let mut changes = ChangesNeeded::default();

    let current_tables = get_tables(&mut **tx).await?;
    let target_tables = get_tables(pristine_pool).await?;

    let mut target_table_names: Vec<_> = target_tables.keys().cloned().collect();
    target_table_names.sort();

    for table_name in target_table_names {
        if !current_tables.contains_key(&table_name) {
            changes.new_tables.push(table_name);
            continue;
        }

        let current_columns = get_table_columns(&mut **tx, &table_name).await?;
        let target_columns = get_table_columns(pristine_pool, &table_name).await?;

        let current_names: HashSet<_> = current_columns.iter().map(|c| c.name.as_str()).collect();
        let target_names: HashSet<_> = target_columns.iter().map(|c| c.name.as_str()).collect();

        let added_columns: Vec<ColumnInfo> = target_columns
            .iter()
            .filter(|c| !current_names.contains(c.name.as_str()))
            .cloned()
            .collect();

        let extra_columns: Vec<String> = current_columns
            .iter()
            .filter(|c| !target_names.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();

        if !added_columns.is_empty() || !extra_columns.is_empty() {
            changes.modified_tables.push(TableColumnChanges {
                table_name,
                added_columns,
                extra_columns,
            });
        }
    }

    let current_indices = get_indices(&mut **tx).await?;
    let target_indices = get_indices(pristine_pool).await?;

    let mut new_indices: Vec<String> = target_indices
        .keys()
        .filter(|name| !current_indices.contains_key(*name))
        .cloned()
        .collect();
    new_indices.sort();
    changes.new_indices = new_indices;

    changes.current_version = sqlx::query("PRAGMA user_version")
        .fetch_one(&mut **tx)
        .await?
        .get::<i64, _>(0);
    changes.target_version = sqlx::query("PRAGMA user_version")
        .fetch_one(pristine_pool)
        .await?
        .get::<i64, _>(0);

    Ok(changes)
}

async fn get_tables(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
) -> Result<HashMap<String, TableInfo>, MigrationError> {
    let rows = sqlx::query(
        "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.get::<String, _>("name"),
                TableInfo {
                    sql: row.get::<String, _>("sql"),
                },
            )
        })
        .collect())
}

async fn get_indices(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
) -> Result<HashMap<String, IndexInfo>, MigrationError> {
    // Automatic indexes (UNIQUE, PRIMARY KEY) have no sql and come with their table
    let rows = sqlx::query(
        "SELECT name, sql FROM sqlite_master WHERE type = 'index' AND sql IS NOT NULL",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.get::<String, _>("name"),
                IndexInfo {
                    sql: row.get::<String, _>("sql"),
                },
            )
        })
        .collect())
}

pub async fn get_table_columns(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    table_name: &str,
) -> Result<Vec<ColumnInfo>, MigrationError> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(table_name)))
        .fetch_all(executor)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ColumnInfo {
            name: row.get::<String, _>("name"),
            data_type: row.get::<String, _>("type"),
            not_null: row.get::<i64, _>("notnull") != 0,
            default_value: row.get::<Option<String>, _>("dflt_value"),
            primary_key: row.get::<i64, _>("pk") != 0,
        })
        .collect())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[instrument(skip_all)]
pub async fn migrate_database(
    pool: Pool<Sqlite>,
    target_schema: &str,
) -> Result<bool, MigrationError> {
    let mut manager = SchemaManager::new(pool, target_schema);
    manager.migrate().await
}

/// Brings the achievements store (and the credential tables it references) up
/// to the current schema. Safe to call any number of times.
pub async fn ensure_achievements_schema(pool: &Pool<Sqlite>) -> Result<bool, MigrationError> {
    migrate_database(pool.clone(), CURRENT_SCHEMA).await
}
