//! Encounters and treasures: create, read and delete only.

use async_trait::async_trait;
use sqlx::types::Json;

use super::rows::{EncounterRow, TreasureRow};
use super::PgStore;
use crate::auth::Scope;
use crate::database::manager::DatabaseError;
use crate::database::store::{EncounterStore, Listing, TreasureStore};
use crate::models::{Encounter, EncounterDraft, Id, Page, Treasure, TreasureDraft};

const ENCOUNTER_COLUMNS: &str =
    "id, owner_id, theme, difficulty, total_xp, player_level, player_count, monsters, created_at";
const TREASURE_COLUMNS: &str = "id, owner_id, name, level, total_value, hoards, created_at";

#[async_trait]
impl EncounterStore for PgStore {
    async fn insert_encounter(&self, owner_id: Id, draft: EncounterDraft) -> Result<Encounter, DatabaseError> {
        let e = Encounter::from_draft(owner_id, draft);
        let sql = format!(
            "INSERT INTO encounters (owner_id, theme, difficulty, total_xp, player_level, player_count, monsters) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            ENCOUNTER_COLUMNS
        );
        let row = sqlx::query_as::<_, EncounterRow>(&sql)
            .bind(e.owner_id)
            .bind(&e.theme)
            .bind(e.difficulty.as_str())
            .bind(e.total_xp)
            .bind(e.player_level)
            .bind(e.player_count)
            .bind(Json(&e.monsters))
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn encounter(&self, id: Id, scope: Scope) -> Result<Option<Encounter>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM encounters WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)",
            ENCOUNTER_COLUMNS
        );
        sqlx::query_as::<_, EncounterRow>(&sql)
            .bind(id)
            .bind(scope.owner())
            .fetch_optional(&self.pool)
            .await?
            .map(Encounter::try_from)
            .transpose()
    }

    async fn list_encounters(&self, owner_id: Id, page: Page) -> Result<Listing<Encounter>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM encounters WHERE owner_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            ENCOUNTER_COLUMNS
        );
        let encounters = sqlx::query_as::<_, EncounterRow>(&sql)
            .bind(owner_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Encounter::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM encounters WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((encounters, count))
    }

    async fn delete_encounter(&self, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM encounters WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)")
            .bind(id)
            .bind(scope.owner())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TreasureStore for PgStore {
    async fn insert_treasure(&self, owner_id: Id, draft: TreasureDraft) -> Result<Treasure, DatabaseError> {
        let t = Treasure::from_draft(owner_id, draft);
        let sql = format!(
            "INSERT INTO treasures (owner_id, name, level, total_value, hoards) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TREASURE_COLUMNS
        );
        let row = sqlx::query_as::<_, TreasureRow>(&sql)
            .bind(t.owner_id)
            .bind(&t.name)
            .bind(t.level)
            .bind(t.total_value)
            .bind(Json(&t.hoards))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn treasure(&self, id: Id, scope: Scope) -> Result<Option<Treasure>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM treasures WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)",
            TREASURE_COLUMNS
        );
        let row = sqlx::query_as::<_, TreasureRow>(&sql)
            .bind(id)
            .bind(scope.owner())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Treasure::from))
    }

    async fn list_treasures(&self, owner_id: Id, page: Page) -> Result<Listing<Treasure>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM treasures WHERE owner_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            TREASURE_COLUMNS
        );
        let rows = sqlx::query_as::<_, TreasureRow>(&sql)
            .bind(owner_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM treasures WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((rows.into_iter().map(Treasure::from).collect(), count))
    }

    async fn delete_treasure(&self, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM treasures WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)")
            .bind(id)
            .bind(scope.owner())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
