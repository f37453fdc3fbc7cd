use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{CartItem, InventoryItem, ItemId};

/// SQLite-backed inventory and cart collections.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts `items` only when the catalog is still empty. Returns how many
    /// rows were written.
    pub async fn seed_inventory(&self, items: &[InventoryItem]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(0);
        }
        for item in items {
            sqlx::query("INSERT INTO inventory (id, content) VALUES (?, ?)")
                .bind(item.id.0)
                .bind(&item.content)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to seed inventory item {}", item.id))?;
        }
        tx.commit().await?;
        Ok(items.len())
    }

    pub async fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query("SELECT id, content FROM inventory ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| -> Result<InventoryItem> {
                Ok(InventoryItem {
                    id: ItemId(row.try_get("id")?),
                    content: row.try_get("content")?,
                })
            })
            .collect()
    }

    pub async fn list_cart(&self) -> Result<Vec<CartItem>> {
        let rows = sqlx::query("SELECT item_id, content, amount FROM cart ORDER BY position")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(cart_item_from_row).collect()
    }

    /// Returns `None` when the id is already in the cart.
    pub async fn insert_cart_item(&self, item: &CartItem) -> Result<Option<CartItem>> {
        let row = sqlx::query(
            "INSERT INTO cart (item_id, content, amount) VALUES (?, ?, ?)
             ON CONFLICT(item_id) DO NOTHING
             RETURNING item_id, content, amount",
        )
        .bind(item.id.0)
        .bind(&item.content)
        .bind(i64::from(item.amount))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(cart_item_from_row).transpose()
    }

    /// Returns `None` when the id is not in the cart.
    pub async fn update_cart_amount(&self, id: ItemId, amount: u32) -> Result<Option<CartItem>> {
        let row = sqlx::query(
            "UPDATE cart SET amount = ? WHERE item_id = ?
             RETURNING item_id, content, amount",
        )
        .bind(i64::from(amount))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(cart_item_from_row).transpose()
    }

    /// Returns `false` when the id was not in the cart.
    pub async fn delete_cart_item(&self, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart WHERE item_id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn cart_item_from_row(row: &SqliteRow) -> Result<CartItem> {
    let amount: i64 = row.try_get("amount")?;
    Ok(CartItem {
        id: ItemId(row.try_get("item_id")?),
        content: row.try_get("content")?,
        amount: u32::try_from(amount)
            .with_context(|| format!("stored cart amount {amount} out of range"))?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
