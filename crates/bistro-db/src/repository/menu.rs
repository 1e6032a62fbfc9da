//! # Menu Repository
//!
//! Database operations for menu items and their recipe entries.
//!
//! ## Recipes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Menu Item ↔ Recipe ↔ Stock                             │
//! │                                                                         │
//! │  menu_items            recipe_entries              stock_items         │
//! │  ┌──────────────┐      ┌───────────────────┐      ┌───────────────┐   │
//! │  │ Classic      │◄─────│ 250 milli (0.25)  │─────►│ Ground Beef   │   │
//! │  │ Burger       │◄─────│ 1000 milli (1.0)  │─────►│ Burger Bun    │   │
//! │  └──────────────┘      └───────────────────┘      └───────────────┘   │
//! │                                                                         │
//! │  A menu item with NO recipe entries has no inventory backing:          │
//! │  the consumption engine skips it (sodas from the fountain, etc.)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recipes are replaced wholesale (`replace_recipe`), never patched entry
//! by entry - the admin SPA edits the full ingredient list in one screen.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use bistro_core::{MenuItem, RecipeEntry};

const MENU_COLUMNS: &str =
    "id, name, category, price_cents, tax_rate_bps, is_active, created_at, updated_at";

/// Repository for menu item and recipe operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Menu items
    // -------------------------------------------------------------------------

    /// Inserts a new menu item.
    pub async fn insert(&self, item: &MenuItem) -> DbResult<()> {
        debug!(name = %item.name, "Inserting menu item");

        sqlx::query(
            "INSERT INTO menu_items (id, name, category, price_cents, tax_rate_bps, \
                                     is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.tax_rate_bps)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a menu item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menu_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active menu items ordered by category, then name.
    pub async fn list_active(&self) -> DbResult<Vec<MenuItem>> {
        let items = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menu_items WHERE is_active = 1 ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Updates a menu item's mutable fields.
    pub async fn update(&self, item: &MenuItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating menu item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE menu_items SET \
                name = ?2, category = ?3, price_cents = ?4, tax_rate_bps = ?5, \
                is_active = ?6, updated_at = ?7 \
             WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.tax_rate_bps)
        .bind(item.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", &item.id));
        }

        Ok(())
    }

    /// Soft-deletes a menu item.
    ///
    /// ## Why Soft Delete?
    /// Historical order lines still reference this item (their snapshot
    /// columns carry the sale-time name and price regardless).
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting menu item");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE menu_items SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Recipe entries
    // -------------------------------------------------------------------------

    /// Gets the recipe entries for a menu item.
    ///
    /// An empty Vec means the item has no inventory backing.
    pub async fn get_recipe(&self, menu_item_id: &str) -> DbResult<Vec<RecipeEntry>> {
        let entries = sqlx::query_as::<_, RecipeEntry>(
            "SELECT id, menu_item_id, stock_item_id, qty_per_unit_milli \
             FROM recipe_entries WHERE menu_item_id = ?1 ORDER BY stock_item_id",
        )
        .bind(menu_item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Replaces a menu item's recipe wholesale, in one transaction.
    ///
    /// ## Arguments
    /// * `entries` - (stock_item_id, qty_per_unit_milli) pairs; an empty
    ///   slice removes the recipe entirely
    ///
    /// ## Returns
    /// The freshly inserted entries.
    pub async fn replace_recipe(
        &self,
        menu_item_id: &str,
        entries: &[(String, i64)],
    ) -> DbResult<Vec<RecipeEntry>> {
        debug!(menu_item_id = %menu_item_id, count = entries.len(), "Replacing recipe");

        // The menu item must exist; catching it here gives a clean 404
        // instead of an FK violation from the insert below.
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items WHERE id = ?1")
            .bind(menu_item_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(DbError::not_found("Menu item", menu_item_id));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM recipe_entries WHERE menu_item_id = ?1")
            .bind(menu_item_id)
            .execute(&mut *tx)
            .await?;

        let mut inserted = Vec::with_capacity(entries.len());
        for (stock_item_id, qty_per_unit_milli) in entries {
            let entry = RecipeEntry {
                id: generate_id(),
                menu_item_id: menu_item_id.to_string(),
                stock_item_id: stock_item_id.clone(),
                qty_per_unit_milli: *qty_per_unit_milli,
            };

            sqlx::query(
                "INSERT INTO recipe_entries (id, menu_item_id, stock_item_id, qty_per_unit_milli) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&entry.id)
            .bind(&entry.menu_item_id)
            .bind(&entry.stock_item_id)
            .bind(entry.qty_per_unit_milli)
            .execute(&mut *tx)
            .await?;

            inserted.push(entry);
        }

        tx.commit().await?;

        Ok(inserted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::stock::tests::insert_stock_item;

    pub(crate) async fn insert_menu_item(db: &Database, name: &str, price_cents: i64) -> MenuItem {
        let now = Utc::now();
        let item = MenuItem {
            id: generate_id(),
            name: name.to_string(),
            category: "general".to_string(),
            price_cents,
            tax_rate_bps: 825,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.menu().insert(&item).await.unwrap();
        item
    }

    #[tokio::test]
    async fn test_menu_item_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut item = insert_menu_item(&db, "Classic Burger", 1099).await;
        assert_eq!(db.menu().list_active().await.unwrap().len(), 1);

        item.price_cents = 1199;
        db.menu().update(&item).await.unwrap();
        let updated = db.menu().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(updated.price_cents, 1199);

        db.menu().soft_delete(&item.id).await.unwrap();
        assert!(db.menu().list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_recipe_wholesale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let burger = insert_menu_item(&db, "Classic Burger", 1099).await;
        let beef = insert_stock_item(&db, "Ground Beef", "lb", 10, 450).await;
        let bun = insert_stock_item(&db, "Burger Bun", "pcs", 24, 35).await;

        // 0.25 lb beef + 1 bun per burger
        let entries = vec![(beef.id.clone(), 250), (bun.id.clone(), 1000)];
        let recipe = db.menu().replace_recipe(&burger.id, &entries).await.unwrap();
        assert_eq!(recipe.len(), 2);

        // Replacing again drops the old rows first
        let entries = vec![(bun.id.clone(), 2000)];
        let recipe = db.menu().replace_recipe(&burger.id, &entries).await.unwrap();
        assert_eq!(recipe.len(), 1);
        assert_eq!(recipe[0].qty_per_unit_milli, 2000);

        // Empty slice clears the recipe
        db.menu().replace_recipe(&burger.id, &[]).await.unwrap();
        assert!(db.menu().get_recipe(&burger.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_recipe_unknown_item() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.menu().replace_recipe("missing", &[]).await;
        assert!(matches!(err, Err(DbError::NotFound { .. })));
    }
}
