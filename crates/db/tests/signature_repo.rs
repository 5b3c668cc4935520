//! Integration tests for the signature repository against a real database.

use chrono::{Duration, Utc};
use sigcraft_core::signature::{
    AnimationType, ElementAnimation, ImageRef, NewSignature, PersonalInfo, Signature,
    SignaturePatch, SignatureTag, SocialMedia,
};
use sigcraft_db::repositories::SignatureRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_signature(owner_id: Option<i64>, name: &str) -> Signature {
    let input = NewSignature {
        owner_id,
        template_id: "sales-professional".into(),
        personal_info: PersonalInfo {
            name: name.to_string(),
            title: "Engineer".into(),
            company: "Apex".into(),
            email: "dev@apex.test".into(),
            phone: None,
            website: Some("apex.test".into()),
        },
        ..NewSignature::default()
    };
    Signature::new(uuid::Uuid::now_v7(), input, Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bootstrap_health_check(pool: PgPool) {
    sigcraft_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_find_round_trips_nested_sections(pool: PgPool) {
    let mut signature = new_signature(Some(1), "Ada");
    signature.images.headshot = Some(ImageRef::StoredRef("uploads/ada.png".into()));
    signature.images.headshot_size = 150;
    signature.social_media = SocialMedia {
        linkedin: Some("https://linkedin.com/in/ada".into()),
        ..SocialMedia::default()
    };
    signature.animation_type = Some(AnimationType::CrossDissolve);

    let created = SignatureRepo::create(&pool, &signature).await.unwrap();
    assert_eq!(created.id, signature.id);

    let found = SignatureRepo::find_by_id(&pool, signature.id)
        .await
        .unwrap()
        .expect("signature should exist");
    assert_eq!(found.template_id, "sales-professional");
    assert_eq!(found.personal_info, signature.personal_info);
    assert_eq!(found.images.headshot, Some(ImageRef::StoredRef("uploads/ada.png".into())));
    assert_eq!(found.images.headshot_size, 150);
    assert_eq!(found.social_media, signature.social_media);
    assert_eq!(found.animation_type, Some(AnimationType::CrossDissolve));
    assert_eq!(found.tag, SignatureTag::Static);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_missing_returns_none(pool: PgPool) {
    let found = SignatureRepo::find_by_id(&pool, uuid::Uuid::now_v7()).await.unwrap();
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_persists_patch_and_recomputed_tag(pool: PgPool) {
    let mut signature = new_signature(Some(1), "Grace");
    SignatureRepo::create(&pool, &signature).await.unwrap();

    let mut animations = signature.element_animations;
    animations.headshot = ElementAnimation::Pulse;
    let later = signature.updated_at + Duration::seconds(5);
    signature.apply(
        SignaturePatch {
            template_id: Some("modern".into()),
            element_animations: Some(animations),
            ..SignaturePatch::default()
        },
        later,
    );

    let updated = SignatureRepo::update(&pool, &signature)
        .await
        .unwrap()
        .expect("signature should exist");
    assert_eq!(updated.template_id, "modern");
    assert_eq!(updated.tag, SignatureTag::Dynamic);
    assert_eq!(updated.element_animations.headshot, ElementAnimation::Pulse);
    assert!(updated.updated_at > updated.created_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_returns_none(pool: PgPool) {
    let signature = new_signature(None, "Nobody");
    let updated = SignatureRepo::update(&pool, &signature).await.unwrap();
    assert!(updated.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_owner(pool: PgPool) {
    for (owner, name) in [(Some(1), "A"), (Some(1), "B"), (Some(2), "C"), (None, "D")] {
        SignatureRepo::create(&pool, &new_signature(owner, name)).await.unwrap();
    }

    let owned = SignatureRepo::list_by_owner(&pool, Some(1)).await.unwrap();
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().all(|s| s.owner_id == Some(1)));

    let all = SignatureRepo::list_by_owner(&pool, None).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete(pool: PgPool) {
    let signature = new_signature(Some(3), "Temp");
    SignatureRepo::create(&pool, &signature).await.unwrap();

    assert!(SignatureRepo::delete(&pool, signature.id).await.unwrap());
    assert!(!SignatureRepo::delete(&pool, signature.id).await.unwrap());
    assert!(SignatureRepo::find_by_id(&pool, signature.id).await.unwrap().is_none());
}
