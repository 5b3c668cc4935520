//! Row mapping for the `signatures` table.
//!
//! Nested sections live in JSONB columns; [`SignatureRow`] decodes them
//! through `sqlx::types::Json` and converts into the domain
//! [`Signature`].

use sigcraft_core::signature::{
    AnimationType, ElementAnimations, ElementPositions, Images, PersonalInfo, Signature,
    SignatureTag, SocialMedia,
};
use sigcraft_core::types::{DbId, SignatureId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `signatures` table.
#[derive(Debug, Clone, FromRow)]
pub struct SignatureRow {
    pub id: SignatureId,
    pub owner_id: Option<DbId>,
    pub template_id: String,
    pub personal_info: Json<PersonalInfo>,
    pub images: Json<Images>,
    pub social_media: Json<SocialMedia>,
    pub animation_type: Option<String>,
    pub element_animations: Json<ElementAnimations>,
    pub element_positions: Json<ElementPositions>,
    pub tag: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SignatureRow> for Signature {
    fn from(row: SignatureRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            template_id: row.template_id,
            personal_info: row.personal_info.0,
            images: row.images.0,
            social_media: row.social_media.0,
            animation_type: row.animation_type.as_deref().and_then(AnimationType::from_name),
            element_animations: row.element_animations.0,
            element_positions: row.element_positions.0,
            tag: SignatureTag::from_name(&row.tag),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
