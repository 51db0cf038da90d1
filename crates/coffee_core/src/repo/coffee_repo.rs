//! Coffee repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the CRUD surface over `t_coffee` plus lookup by name.
//! - Route the `price` column through the conversion registry on every
//!   read and write.
//!
//! # Invariants
//! - Write paths call `Coffee::validate()` and convert the price before any
//!   SQL mutation, so a rejected price leaves the table untouched.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Multi-row results are ordered by `id ASC`.
//! - Batch writes run inside a savepoint, so they nest in a transaction the
//!   caller already holds on the borrowed connection.
//! - An update never rewrites `create_time`.
//!
//! # See also
//! - `crate::convert` for the price converters.
//! - `crate::db::migrations` for the `t_coffee` schema.

use crate::convert::{ConversionError, ConversionRegistry};
use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::coffee::{Coffee, CoffeeId, CoffeeValidationError};
use crate::money::Money;
use chrono::{Local, NaiveDateTime};
use log::{debug, warn};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::any::type_name;
use std::collections::BTreeSet;

const COFFEE_TABLE: &str = "t_coffee";
const COFFEE_COLUMNS: &[&str] = &["id", "name", "price", "create_time", "update_time"];
const COFFEE_SELECT_SQL: &str = "SELECT
    id,
    name,
    price,
    create_time,
    update_time
FROM t_coffee";
const BATCH_SAVEPOINT: &str = "coffee_batch";
// SQLite's historical `SQLITE_MAX_VARIABLE_NUMBER`; builds may allow more.
const MAX_IDS_PER_STATEMENT: usize = 999;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] CoffeeValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("coffee not found: {0}")]
    NotFound(CoffeeId),
    #[error("coffee has no id; it was never saved")]
    MissingId,
    #[error("invalid persisted coffee data: {0}")]
    InvalidData(String),
    #[error(
        "connection schema version {actual_version} is behind required {expected_version}; open it with db::open_db"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("conversion registry has no converter for `{from}` -> `{to}`")]
    MissingConverter {
        from: &'static str,
        to: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for coffee records.
pub trait CoffeeRepository {
    /// Inserts when `id` is `None`, otherwise updates the existing row.
    /// Returns the stored record, including the assigned id.
    fn save(&self, coffee: &Coffee) -> RepoResult<Coffee>;
    /// Saves every record atomically; nothing is kept on failure.
    /// Runs as a savepoint, so it may be called inside an open transaction.
    fn save_all(&self, coffees: &[Coffee]) -> RepoResult<Vec<Coffee>>;
    fn find_by_id(&self, id: CoffeeId) -> RepoResult<Option<Coffee>>;
    fn exists_by_id(&self, id: CoffeeId) -> RepoResult<bool>;
    fn find_all(&self) -> RepoResult<Vec<Coffee>>;
    /// Ids without a row are skipped.
    fn find_all_by_id(&self, ids: &[CoffeeId]) -> RepoResult<Vec<Coffee>>;
    fn count(&self) -> RepoResult<u64>;
    /// Deleting an absent id is a no-op.
    fn delete_by_id(&self, id: CoffeeId) -> RepoResult<()>;
    fn delete(&self, coffee: &Coffee) -> RepoResult<()>;
    /// Deletes every listed row atomically; absent ids are ignored.
    fn delete_all_by_id(&self, ids: &[CoffeeId]) -> RepoResult<()>;
    fn delete_all(&self) -> RepoResult<()>;
    /// Exact, case-sensitive name match.
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Coffee>>;
}

/// SQLite-backed coffee repository.
pub struct SqliteCoffeeRepository<'conn> {
    conn: &'conn Connection,
    conversions: &'conn ConversionRegistry,
}

impl<'conn> SqliteCoffeeRepository<'conn> {
    /// Binds a migrated connection and a registry holding both money
    /// directions.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    /// - `MissingConverter` when a money direction is not registered.
    pub fn try_new(
        conn: &'conn Connection,
        conversions: &'conn ConversionRegistry,
    ) -> RepoResult<Self> {
        ensure_schema(conn)?;
        ensure_money_converters(conversions)?;
        Ok(Self { conn, conversions })
    }

    fn insert(&self, coffee: &Coffee) -> RepoResult<Coffee> {
        coffee.validate()?;
        let price = self.conversions.write_money(coffee.price)?;

        self.conn.execute(
            "INSERT INTO t_coffee (
                name,
                price,
                create_time,
                update_time
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                coffee.name.as_str(),
                price,
                coffee.create_time,
                coffee.update_time,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("event=coffee_insert module=repo status=ok id={id}");
        Ok(Coffee {
            id: Some(id),
            ..coffee.clone()
        })
    }

    fn update(&self, id: CoffeeId, coffee: &Coffee) -> RepoResult<Coffee> {
        coffee.validate()?;
        let price = self.conversions.write_money(coffee.price)?;
        let update_time = Local::now().naive_local();

        let create_time = self
            .conn
            .query_row(
                "UPDATE t_coffee
                 SET
                    name = ?1,
                    price = ?2,
                    update_time = ?3
                 WHERE id = ?4
                 RETURNING create_time;",
                params![coffee.name.as_str(), price, update_time, id],
                |row| row.get::<_, NaiveDateTime>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))?;

        debug!("event=coffee_update module=repo status=ok id={id}");
        Ok(Coffee {
            id: Some(id),
            create_time,
            update_time,
            ..coffee.clone()
        })
    }

    /// Runs `op` inside a savepoint, rolling back to it when `op` fails.
    fn in_savepoint<T>(&self, op: impl FnOnce() -> RepoResult<T>) -> RepoResult<T> {
        self.conn
            .execute_batch(&format!("SAVEPOINT {BATCH_SAVEPOINT};"))?;

        let result = op().and_then(|value| {
            self.conn
                .execute_batch(&format!("RELEASE {BATCH_SAVEPOINT};"))?;
            Ok(value)
        });

        if result.is_err() {
            if let Err(rollback_err) = self.conn.execute_batch(&format!(
                "ROLLBACK TO {BATCH_SAVEPOINT}; RELEASE {BATCH_SAVEPOINT};"
            )) {
                warn!(
                    "event=coffee_batch_rollback module=repo status=error error={rollback_err}"
                );
            }
        }
        result
    }

    fn query_coffees(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Coffee>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut coffees = Vec::new();

        while let Some(row) = rows.next()? {
            coffees.push(self.parse_coffee_row(row)?);
        }

        Ok(coffees)
    }

    fn parse_coffee_row(&self, row: &Row<'_>) -> RepoResult<Coffee> {
        let id: CoffeeId = row.get("id")?;
        let raw_price: i64 = row.get("price")?;

        let coffee = Coffee {
            id: Some(id),
            name: row.get("name")?,
            price: self.conversions.read_money(raw_price)?,
            create_time: row.get("create_time")?,
            update_time: row.get("update_time")?,
        };

        coffee.validate().map_err(|err| {
            RepoError::InvalidData(format!("{err} (t_coffee.id = {id})"))
        })?;
        Ok(coffee)
    }
}

impl CoffeeRepository for SqliteCoffeeRepository<'_> {
    fn save(&self, coffee: &Coffee) -> RepoResult<Coffee> {
        match coffee.id {
            Some(id) => self.update(id, coffee),
            None => self.insert(coffee),
        }
    }

    fn save_all(&self, coffees: &[Coffee]) -> RepoResult<Vec<Coffee>> {
        self.in_savepoint(|| {
            coffees
                .iter()
                .map(|coffee| self.save(coffee))
                .collect::<RepoResult<Vec<_>>>()
        })
        .map_err(|err| {
            warn!(
                "event=coffee_save_all module=repo status=error batch_size={} error={err}",
                coffees.len()
            );
            err
        })
    }

    fn find_by_id(&self, id: CoffeeId) -> RepoResult<Option<Coffee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COFFEE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.parse_coffee_row(row)?)),
            None => Ok(None),
        }
    }

    fn exists_by_id(&self, id: CoffeeId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM t_coffee WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_all(&self) -> RepoResult<Vec<Coffee>> {
        self.query_coffees(&format!("{COFFEE_SELECT_SQL} ORDER BY id ASC;"), [])
    }

    fn find_all_by_id(&self, ids: &[CoffeeId]) -> RepoResult<Vec<Coffee>> {
        // Chunks of sorted, distinct ids keep the concatenation in `id ASC`.
        let mut coffees = Vec::new();
        for chunk in distinct_ids(ids).chunks(MAX_IDS_PER_STATEMENT) {
            coffees.extend(self.query_coffees(
                &format!(
                    "{COFFEE_SELECT_SQL} WHERE id IN ({}) ORDER BY id ASC;",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk),
            )?);
        }
        Ok(coffees)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM t_coffee;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn delete_by_id(&self, id: CoffeeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM t_coffee WHERE id = ?1;", [id])?;
        debug!("event=coffee_delete module=repo status=ok id={id} changed={changed}");
        Ok(())
    }

    fn delete(&self, coffee: &Coffee) -> RepoResult<()> {
        let id = coffee.id.ok_or(RepoError::MissingId)?;
        self.delete_by_id(id)
    }

    fn delete_all_by_id(&self, ids: &[CoffeeId]) -> RepoResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let ids = distinct_ids(ids);
        let changed = self.in_savepoint(|| {
            let mut changed = 0;
            for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
                changed += self.conn.execute(
                    &format!(
                        "DELETE FROM t_coffee WHERE id IN ({});",
                        placeholders(chunk.len())
                    ),
                    params_from_iter(chunk),
                )?;
            }
            Ok(changed)
        })?;
        debug!(
            "event=coffee_delete module=repo status=ok requested={} changed={changed}",
            ids.len()
        );
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM t_coffee;", [])?;
        debug!("event=coffee_delete_all module=repo status=ok changed={changed}");
        Ok(())
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Coffee>> {
        self.query_coffees(
            &format!("{COFFEE_SELECT_SQL} WHERE name = ?1 ORDER BY id ASC;"),
            [name],
        )
    }
}

fn ensure_schema(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [COFFEE_TABLE],
        |row| row.get(0),
    )?;
    if table_exists != 1 {
        return Err(RepoError::MissingRequiredTable(COFFEE_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([COFFEE_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(missing) = COFFEE_COLUMNS
        .iter()
        .find(|column| !columns.iter().any(|existing| existing == *column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: COFFEE_TABLE,
            column: *missing,
        });
    }

    Ok(())
}

fn ensure_money_converters(conversions: &ConversionRegistry) -> RepoResult<()> {
    if !conversions.contains::<i64, Money>() {
        return Err(RepoError::MissingConverter {
            from: type_name::<i64>(),
            to: type_name::<Money>(),
        });
    }
    if !conversions.contains::<Money, i64>() {
        return Err(RepoError::MissingConverter {
            from: type_name::<Money>(),
            to: type_name::<i64>(),
        });
    }
    Ok(())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn distinct_ids(ids: &[CoffeeId]) -> Vec<CoffeeId> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{distinct_ids, placeholders};

    #[test]
    fn placeholders_are_comma_separated() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn distinct_ids_are_sorted_and_deduplicated() {
        assert_eq!(distinct_ids(&[5, 1, 5, -2, 1]), vec![-2, 1, 5]);
        assert!(distinct_ids(&[]).is_empty());
    }
}
