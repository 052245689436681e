use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use super::rows::{CampaignRow, MemberRow, CAMPAIGN_SELECT, MEMBER_SELECT};
use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::store::{CampaignStore, Listing};
use crate::models::{
    Campaign, CampaignChanges, CampaignDraft, CampaignStatus, Id, JoinOutcome, Member, MembershipRole, Page,
};

async fn fetch_campaign(tx: &mut Transaction<'_, Postgres>, id: Id) -> Result<Campaign, DatabaseError> {
    let sql = format!("{} WHERE c.id = $1", CAMPAIGN_SELECT);
    sqlx::query_as::<_, CampaignRow>(&sql)
        .bind(id)
        .fetch_one(&mut **tx)
        .await?
        .try_into()
}

#[async_trait]
impl CampaignStore for PgStore {
    async fn create_campaign(
        &self,
        dm_id: Id,
        draft: CampaignDraft,
        invite_code: &str,
    ) -> Result<Campaign, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let max_players = draft.max_players();
        let id: Id = sqlx::query_scalar(
            "INSERT INTO campaigns (dm_id, name, description, allow_homebrew, max_players, invite_code) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(dm_id)
        .bind(draft.name.trim())
        .bind(&draft.description)
        .bind(draft.allow_homebrew)
        .bind(max_players)
        .bind(invite_code)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO campaign_memberships (campaign_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(dm_id)
            .bind(MembershipRole::Dm.as_str())
            .execute(&mut *tx)
            .await?;

        let campaign = fetch_campaign(&mut tx, id).await?;
        tx.commit().await?;
        Ok(campaign)
    }

    async fn campaign(&self, id: Id) -> Result<Option<Campaign>, DatabaseError> {
        let sql = format!("{} WHERE c.id = $1", CAMPAIGN_SELECT);
        sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Campaign::try_from)
            .transpose()
    }

    async fn campaigns_for_member(&self, user_id: Id, page: Page) -> Result<Listing<Campaign>, DatabaseError> {
        let sql = format!(
            "{} WHERE c.id IN (SELECT campaign_id FROM campaign_memberships WHERE user_id = $1) \
             ORDER BY c.updated_at DESC, c.id LIMIT $2 OFFSET $3",
            CAMPAIGN_SELECT
        );
        let campaigns = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Campaign::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM campaign_memberships WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((campaigns, count))
    }

    async fn membership(&self, campaign_id: Id, user_id: Id) -> Result<Option<Member>, DatabaseError> {
        let sql = format!("{} WHERE m.campaign_id = $1 AND m.user_id = $2", MEMBER_SELECT);
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(campaign_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    async fn members(&self, campaign_id: Id) -> Result<Vec<Member>, DatabaseError> {
        let sql = format!(
            "{} WHERE m.campaign_id = $1 ORDER BY (m.role = 'dm') DESC, m.joined_at, m.user_id",
            MEMBER_SELECT
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(campaign_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Member::try_from)
            .collect()
    }

    async fn update_campaign(&self, id: Id, changes: CampaignChanges) -> Result<Option<Campaign>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<Id> = sqlx::query_scalar(
            "UPDATE campaigns SET name = COALESCE($2, name), description = COALESCE($3, description), \
             status = COALESCE($4, status), allow_homebrew = COALESCE($5, allow_homebrew), \
             max_players = COALESCE($6, max_players), current_session = COALESCE($7, current_session), \
             updated_at = now() WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.description)
        .bind(changes.status.map(CampaignStatus::as_str))
        .bind(changes.allow_homebrew)
        .bind(changes.max_players)
        .bind(changes.current_session)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = updated else {
            return Ok(None);
        };
        let campaign = fetch_campaign(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(campaign))
    }

    async fn delete_campaign(&self, id: Id) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_invite_code(&self, id: Id, invite_code: &str) -> Result<Option<Campaign>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Id> = sqlx::query_scalar("SELECT id FROM campaigns WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query("UPDATE campaigns SET invite_code = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(invite_code)
            .execute(&mut *tx)
            .await?;

        let campaign = fetch_campaign(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(campaign))
    }

    async fn join_campaign(&self, invite_code: &str, user_id: Id) -> Result<JoinOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(Id, String, i32)> =
            sqlx::query_as("SELECT id, status, max_players FROM campaigns WHERE invite_code = $1 FOR UPDATE")
                .bind(invite_code)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((campaign_id, status, max_players)) = locked else {
            return Ok(JoinOutcome::UnknownCode);
        };

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM campaign_memberships WHERE campaign_id = $1 AND user_id = $2)",
        )
        .bind(campaign_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Ok(JoinOutcome::AlreadyMember);
        }

        let status: CampaignStatus = status.parse().map_err(DatabaseError::InvalidData)?;
        if status == CampaignStatus::Finished {
            return Ok(JoinOutcome::Finished);
        }

        let players: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM campaign_memberships WHERE campaign_id = $1 AND role = $2")
                .bind(campaign_id)
                .bind(MembershipRole::Player.as_str())
                .fetch_one(&mut *tx)
                .await?;
        if players >= i64::from(max_players) {
            return Ok(JoinOutcome::Full);
        }

        sqlx::query("INSERT INTO campaign_memberships (campaign_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(campaign_id)
            .bind(user_id)
            .bind(MembershipRole::Player.as_str())
            .execute(&mut *tx)
            .await?;

        let campaign = fetch_campaign(&mut tx, campaign_id).await?;
        tx.commit().await?;
        Ok(JoinOutcome::Joined(campaign))
    }

    async fn leave_campaign(&self, campaign_id: Id, user_id: Id) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM campaign_memberships WHERE campaign_id = $1 AND user_id = $2 AND role = $3",
        )
        .bind(campaign_id)
        .bind(user_id)
        .bind(MembershipRole::Player.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if removed == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM campaign_characters WHERE campaign_id = $1 AND owner_id = $2")
            .bind(campaign_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
