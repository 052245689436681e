use async_trait::async_trait;
use sqlx::types::Json;

use super::rows::{CharacterRow, CHARACTER_COLUMNS};
use super::PgStore;
use crate::auth::Scope;
use crate::database::manager::DatabaseError;
use crate::database::store::{CharacterStore, Listing};
use crate::models::{Character, CharacterChanges, CharacterDraft, CharacterKind, Id, Page};

#[async_trait]
impl CharacterStore for PgStore {
    async fn insert_character(
        &self,
        kind: CharacterKind,
        owner_id: Id,
        draft: CharacterDraft,
    ) -> Result<Character, DatabaseError> {
        let c = Character::from_draft(kind, owner_id, draft);
        let sql = format!(
            "INSERT INTO {} (owner_id, name, description, level, race, class, background, alignment, \
             attributes, abilities, equipment, hp, ac, spells) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING {}",
            kind.table(),
            CHARACTER_COLUMNS
        );
        let row = sqlx::query_as::<_, CharacterRow>(&sql)
            .bind(c.owner_id)
            .bind(&c.name)
            .bind(&c.description)
            .bind(c.level)
            .bind(&c.race)
            .bind(&c.class)
            .bind(&c.background)
            .bind(&c.alignment)
            .bind(Json(&c.attributes))
            .bind(Json(&c.abilities))
            .bind(Json(&c.equipment))
            .bind(c.hp)
            .bind(c.ac)
            .bind(c.spells.as_ref().map(Json))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into_character(kind))
    }

    async fn character(&self, kind: CharacterKind, id: Id, scope: Scope) -> Result<Option<Character>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)",
            CHARACTER_COLUMNS,
            kind.table()
        );
        let row = sqlx::query_as::<_, CharacterRow>(&sql)
            .bind(id)
            .bind(scope.owner())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_character(kind)))
    }

    async fn list_characters(
        &self,
        kind: CharacterKind,
        owner_id: Id,
        page: Page,
    ) -> Result<Listing<Character>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            CHARACTER_COLUMNS,
            kind.table()
        );
        let rows = sqlx::query_as::<_, CharacterRow>(&sql)
            .bind(owner_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        let count_sql = format!("SELECT COUNT(*) FROM {} WHERE owner_id = $1", kind.table());
        let count: i64 = sqlx::query_scalar(&count_sql).bind(owner_id).fetch_one(&self.pool).await?;
        Ok((rows.into_iter().map(|r| r.into_character(kind)).collect(), count))
    }

    async fn update_character(
        &self,
        kind: CharacterKind,
        id: Id,
        scope: Scope,
        changes: CharacterChanges,
    ) -> Result<Option<Character>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {} FROM {} WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2) FOR UPDATE",
            CHARACTER_COLUMNS,
            kind.table()
        );
        let Some(row) = sqlx::query_as::<_, CharacterRow>(&select)
            .bind(id)
            .bind(scope.owner())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut c = row.into_character(kind);
        changes.apply(&mut c);

        let update = format!(
            "UPDATE {} SET name = $2, description = $3, level = $4, race = $5, class = $6, background = $7, \
             alignment = $8, attributes = $9, abilities = $10, equipment = $11, hp = $12, ac = $13, spells = $14, \
             updated_at = $15 WHERE id = $1 RETURNING {}",
            kind.table(),
            CHARACTER_COLUMNS
        );
        let row = sqlx::query_as::<_, CharacterRow>(&update)
            .bind(c.id)
            .bind(&c.name)
            .bind(&c.description)
            .bind(c.level)
            .bind(&c.race)
            .bind(&c.class)
            .bind(&c.background)
            .bind(&c.alignment)
            .bind(Json(&c.attributes))
            .bind(Json(&c.abilities))
            .bind(Json(&c.equipment))
            .bind(c.hp)
            .bind(c.ac)
            .bind(c.spells.as_ref().map(Json))
            .bind(c.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(row.into_character(kind)))
    }

    async fn delete_character(&self, kind: CharacterKind, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let delete = format!(
            "DELETE FROM {} WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)",
            kind.table()
        );
        let deleted = sqlx::query(&delete)
            .bind(id)
            .bind(scope.owner())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }

        // Instances outlive their source and keep their last synced template.
        sqlx::query(
            "UPDATE campaign_characters SET source_character_id = NULL \
             WHERE source_kind = $1 AND source_character_id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
