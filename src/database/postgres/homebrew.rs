use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};

use super::rows::{HomebrewRow, HOMEBREW_SELECT};
use super::PgStore;
use crate::auth::Scope;
use crate::database::manager::DatabaseError;
use crate::database::store::{HomebrewStore, Listing};
use crate::models::{Homebrew, HomebrewContent, HomebrewKind, Id, Page};

async fn fetch_homebrew(tx: &mut Transaction<'_, Postgres>, id: Id) -> Result<Homebrew, DatabaseError> {
    let sql = format!("{} WHERE h.id = $1", HOMEBREW_SELECT);
    sqlx::query_as::<_, HomebrewRow>(&sql)
        .bind(id)
        .fetch_one(&mut **tx)
        .await?
        .try_into()
}

fn collect(rows: Vec<HomebrewRow>) -> Result<Vec<Homebrew>, DatabaseError> {
    rows.into_iter().map(Homebrew::try_from).collect()
}

#[async_trait]
impl HomebrewStore for PgStore {
    async fn insert_homebrew(&self, owner_id: Id, content: HomebrewContent) -> Result<Homebrew, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let id: Id = sqlx::query_scalar(
            "INSERT INTO homebrew (kind, owner_id, name, description, is_public, details) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(content.details.kind().as_str())
        .bind(owner_id)
        .bind(&content.name)
        .bind(&content.description)
        .bind(content.is_public)
        .bind(Json(&content.details))
        .fetch_one(&mut *tx)
        .await?;

        let homebrew = fetch_homebrew(&mut tx, id).await?;
        tx.commit().await?;
        Ok(homebrew)
    }

    async fn homebrew(&self, kind: HomebrewKind, id: Id, viewer: Scope) -> Result<Option<Homebrew>, DatabaseError> {
        let sql = format!(
            "{} WHERE h.id = $1 AND h.kind = $2 AND (h.is_public OR $3::bigint IS NULL OR h.owner_id = $3)",
            HOMEBREW_SELECT
        );
        sqlx::query_as::<_, HomebrewRow>(&sql)
            .bind(id)
            .bind(kind.as_str())
            .bind(viewer.owner())
            .fetch_optional(&self.pool)
            .await?
            .map(Homebrew::try_from)
            .transpose()
    }

    async fn list_homebrew(
        &self,
        kind: HomebrewKind,
        viewer_id: Id,
        page: Page,
    ) -> Result<Listing<Homebrew>, DatabaseError> {
        let sql = format!(
            "{} WHERE h.kind = $1 AND (h.is_public OR h.owner_id = $2) ORDER BY h.id LIMIT $3 OFFSET $4",
            HOMEBREW_SELECT
        );
        let rows = sqlx::query_as::<_, HomebrewRow>(&sql)
            .bind(kind.as_str())
            .bind(viewer_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM homebrew WHERE kind = $1 AND (is_public OR owner_id = $2)")
                .bind(kind.as_str())
                .bind(viewer_id)
                .fetch_one(&self.pool)
                .await?;
        Ok((collect(rows)?, count))
    }

    async fn update_homebrew(
        &self,
        kind: HomebrewKind,
        id: Id,
        scope: Scope,
        content: HomebrewContent,
    ) -> Result<Option<Homebrew>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<Id> = sqlx::query_scalar(
            "UPDATE homebrew SET name = $4, description = $5, is_public = $6, details = $7, updated_at = now() \
             WHERE id = $1 AND kind = $2 AND ($3::bigint IS NULL OR owner_id = $3) RETURNING id",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(scope.owner())
        .bind(&content.name)
        .bind(&content.description)
        .bind(content.is_public)
        .bind(Json(&content.details))
        .fetch_optional(&mut *tx)
        .await?;
        let Some(id) = updated else {
            return Ok(None);
        };

        let homebrew = fetch_homebrew(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(homebrew))
    }

    async fn delete_homebrew(&self, kind: HomebrewKind, id: Id, scope: Scope) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM homebrew WHERE id = $1 AND kind = $2 AND ($3::bigint IS NULL OR owner_id = $3)",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(scope.owner())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_favorite(&self, id: Id, user_id: Id, favorite: bool) -> Result<(), DatabaseError> {
        let sql = if favorite {
            "INSERT INTO homebrew_favorites (homebrew_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        } else {
            "DELETE FROM homebrew_favorites WHERE homebrew_id = $1 AND user_id = $2"
        };
        sqlx::query(sql).bind(id).bind(user_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn favorite_homebrew(
        &self,
        kind: HomebrewKind,
        user_id: Id,
        page: Page,
    ) -> Result<Listing<Homebrew>, DatabaseError> {
        let visible = "h.kind = $1 AND (h.is_public OR h.owner_id = $2)";
        let sql = format!(
            "{} JOIN homebrew_favorites fav ON fav.homebrew_id = h.id AND fav.user_id = $2 \
             WHERE {} ORDER BY fav.created_at DESC, h.id LIMIT $3 OFFSET $4",
            HOMEBREW_SELECT, visible
        );
        let rows = sqlx::query_as::<_, HomebrewRow>(&sql)
            .bind(kind.as_str())
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        let count_sql = format!(
            "SELECT COUNT(*) FROM homebrew h \
             JOIN homebrew_favorites fav ON fav.homebrew_id = h.id AND fav.user_id = $2 WHERE {}",
            visible
        );
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(kind.as_str())
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((collect(rows)?, count))
    }

    async fn set_rating(&self, id: Id, user_id: Id, rating: Option<i32>) -> Result<(), DatabaseError> {
        match rating {
            Some(rating) => {
                sqlx::query(
                    "INSERT INTO homebrew_ratings (homebrew_id, user_id, rating) VALUES ($1, $2, $3) \
                     ON CONFLICT (user_id, homebrew_id) DO UPDATE SET rating = EXCLUDED.rating, updated_at = now()",
                )
                .bind(id)
                .bind(user_id)
                .bind(rating)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM homebrew_ratings WHERE homebrew_id = $1 AND user_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }
}
