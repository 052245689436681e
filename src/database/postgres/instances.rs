use async_trait::async_trait;
use sqlx::types::Json;

use super::rows::{AvailableRow, InstanceRow, INSTANCE_COLUMNS};
use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::store::CampaignCharacterStore;
use crate::models::{AvailableCharacter, CampaignCharacter, Id, InstanceEdit};

#[async_trait]
impl CampaignCharacterStore for PgStore {
    async fn available_characters(
        &self,
        campaign_id: Id,
        owner_id: Id,
    ) -> Result<Vec<AvailableCharacter>, DatabaseError> {
        sqlx::query_as::<_, AvailableRow>(
            "SELECT id, 'pc' AS kind, name, level, race, class FROM pcs p WHERE owner_id = $2 AND NOT EXISTS \
               (SELECT 1 FROM campaign_characters cc WHERE cc.campaign_id = $1 \
                AND cc.source_kind = 'pc' AND cc.source_character_id = p.id) \
             UNION ALL \
             SELECT id, 'npc' AS kind, name, level, race, class FROM npcs n WHERE owner_id = $2 AND NOT EXISTS \
               (SELECT 1 FROM campaign_characters cc WHERE cc.campaign_id = $1 \
                AND cc.source_kind = 'npc' AND cc.source_character_id = n.id) \
             ORDER BY kind DESC, id",
        )
        .bind(campaign_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AvailableCharacter::try_from)
        .collect()
    }

    async fn insert_instance(&self, i: CampaignCharacter) -> Result<CampaignCharacter, DatabaseError> {
        let t = &i.template;
        let sql = format!(
            "INSERT INTO campaign_characters (campaign_id, owner_id, source_kind, source_character_id, name, race, \
             class, level, background, attributes, abilities, equipment, hp, ac, spells, current_hp, temp_hp, xp, \
             conditions, session_notes, inventory_added, inventory_removed, last_synced_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, \
             $21, $22, $23) RETURNING {}",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, InstanceRow>(&sql)
            .bind(i.campaign_id)
            .bind(i.owner_id)
            .bind(i.source_kind.as_str())
            .bind(i.source_character_id)
            .bind(&t.name)
            .bind(&t.race)
            .bind(&t.class)
            .bind(t.level)
            .bind(&t.background)
            .bind(Json(&t.attributes))
            .bind(Json(&t.abilities))
            .bind(Json(&t.equipment))
            .bind(t.hp)
            .bind(t.ac)
            .bind(t.spells.as_ref().map(Json))
            .bind(i.current_hp)
            .bind(i.temp_hp)
            .bind(i.xp)
            .bind(Json(&i.conditions))
            .bind(&i.session_notes)
            .bind(Json(&i.inventory_added))
            .bind(Json(&i.inventory_removed))
            .bind(i.last_synced_at)
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn instances(&self, campaign_id: Id) -> Result<Vec<CampaignCharacter>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM campaign_characters WHERE campaign_id = $1 ORDER BY id",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, InstanceRow>(&sql)
            .bind(campaign_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CampaignCharacter::try_from)
            .collect()
    }

    async fn instance(&self, campaign_id: Id, id: Id) -> Result<Option<CampaignCharacter>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM campaign_characters WHERE campaign_id = $1 AND id = $2",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, InstanceRow>(&sql)
            .bind(campaign_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(CampaignCharacter::try_from)
            .transpose()
    }

    async fn edit_instance(
        &self,
        campaign_id: Id,
        id: Id,
        edit: InstanceEdit,
    ) -> Result<Option<CampaignCharacter>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {} FROM campaign_characters WHERE campaign_id = $1 AND id = $2 FOR UPDATE",
            INSTANCE_COLUMNS
        );
        let Some(row) = sqlx::query_as::<_, InstanceRow>(&select)
            .bind(campaign_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut i = CampaignCharacter::try_from(row)?;
        edit.apply(&mut i);
        let t = &i.template;

        let update = format!(
            "UPDATE campaign_characters SET name = $2, race = $3, class = $4, level = $5, background = $6, \
             attributes = $7, abilities = $8, equipment = $9, hp = $10, ac = $11, spells = $12, current_hp = $13, \
             temp_hp = $14, xp = $15, conditions = $16, session_notes = $17, inventory_added = $18, \
             inventory_removed = $19, last_synced_at = $20 WHERE id = $1 RETURNING {}",
            INSTANCE_COLUMNS
        );
        let updated = sqlx::query_as::<_, InstanceRow>(&update)
            .bind(i.id)
            .bind(&t.name)
            .bind(&t.race)
            .bind(&t.class)
            .bind(t.level)
            .bind(&t.background)
            .bind(Json(&t.attributes))
            .bind(Json(&t.abilities))
            .bind(Json(&t.equipment))
            .bind(t.hp)
            .bind(t.ac)
            .bind(t.spells.as_ref().map(Json))
            .bind(i.current_hp)
            .bind(i.temp_hp)
            .bind(i.xp)
            .bind(Json(&i.conditions))
            .bind(&i.session_notes)
            .bind(Json(&i.inventory_added))
            .bind(Json(&i.inventory_removed))
            .bind(i.last_synced_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated.try_into()?))
    }

    async fn delete_instance(&self, campaign_id: Id, id: Id) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM campaign_characters WHERE campaign_id = $1 AND id = $2")
            .bind(campaign_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
