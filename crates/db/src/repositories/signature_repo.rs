//! Repository for the `signatures` table.

use sigcraft_core::signature::Signature;
use sigcraft_core::types::{DbId, SignatureId};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::signature::SignatureRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, template_id, personal_info, images, social_media, \
    animation_type, element_animations, element_positions, tag, created_at, updated_at";

/// Provides CRUD operations for signatures.
pub struct SignatureRepo;

impl SignatureRepo {
    /// Insert a fully built record, returning the stored row.
    pub async fn create(pool: &PgPool, signature: &Signature) -> Result<Signature, sqlx::Error> {
        let query = format!(
            "INSERT INTO signatures
                (id, owner_id, template_id, personal_info, images, social_media,
                 animation_type, element_animations, element_positions, tag,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SignatureRow>(&query)
            .bind(signature.id)
            .bind(signature.owner_id)
            .bind(&signature.template_id)
            .bind(Json(&signature.personal_info))
            .bind(Json(&signature.images))
            .bind(Json(&signature.social_media))
            .bind(signature.animation_type.map(|t| t.name()))
            .bind(Json(&signature.element_animations))
            .bind(Json(&signature.element_positions))
            .bind(signature.tag.name())
            .bind(signature.created_at)
            .bind(signature.updated_at)
            .fetch_one(pool)
            .await?;
        Ok(row.into())
    }

    /// Find a signature by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: SignatureId,
    ) -> Result<Option<Signature>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM signatures WHERE id = $1");
        let row = sqlx::query_as::<_, SignatureRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Signature::from))
    }

    /// List signatures, most recently updated first. `None` lists every
    /// owner's records.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: Option<DbId>,
    ) -> Result<Vec<Signature>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM signatures
             WHERE ($1::BIGINT IS NULL OR owner_id = $1)
             ORDER BY updated_at DESC, id"
        );
        let rows = sqlx::query_as::<_, SignatureRow>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Signature::from).collect())
    }

    /// Overwrite every mutable column from an already patched record.
    ///
    /// Returns `None` if no row with the record's id exists.
    pub async fn update(
        pool: &PgPool,
        signature: &Signature,
    ) -> Result<Option<Signature>, sqlx::Error> {
        let query = format!(
            "UPDATE signatures SET
                template_id = $2,
                personal_info = $3,
                images = $4,
                social_media = $5,
                animation_type = $6,
                element_animations = $7,
                element_positions = $8,
                tag = $9,
                updated_at = $10
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SignatureRow>(&query)
            .bind(signature.id)
            .bind(&signature.template_id)
            .bind(Json(&signature.personal_info))
            .bind(Json(&signature.images))
            .bind(Json(&signature.social_media))
            .bind(signature.animation_type.map(|t| t.name()))
            .bind(Json(&signature.element_animations))
            .bind(Json(&signature.element_positions))
            .bind(signature.tag.name())
            .bind(signature.updated_at)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Signature::from))
    }

    /// Delete a signature. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: SignatureId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM signatures WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
