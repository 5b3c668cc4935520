//! End-to-end export tests against in-memory assets and raster storage.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat, Rgba, RgbaImage};
use sigcraft_core::animation::FrameConfig;
use sigcraft_core::error::CoreError;
use sigcraft_core::signature::{
    ElementAnimation, ImageRef, NewSignature, PersonalInfo, Position, Signature, SocialMedia,
    SocialPlatform, TemplateId,
};
use sigcraft_pipeline::assets::{AssetError, AssetFetcher, MemoryAssets, MemoryRasterStore, RasterStore};
use sigcraft_pipeline::bake::SocialBakeMode;
use sigcraft_pipeline::raster::SurfacePool;
use sigcraft_pipeline::table;
use sigcraft_pipeline::templates::icon_url;
use sigcraft_pipeline::{EmailClient, ExportConfig, ExportError, ExportStrategy, Exporter};

const ICON_BASE: &str = "https://icons.test";
const HEADSHOT_URL: &str = "https://cdn.test/me.png";
const LOGO_URL: &str = "https://cdn.test/logo.png";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba(color))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn assets() -> MemoryAssets {
    let mut assets = MemoryAssets::new()
        .with(HEADSHOT_URL, png(64, 64, [220, 20, 20, 255]))
        .with(LOGO_URL, png(120, 40, [20, 20, 220, 255]));
    for variant in ["color", "light"] {
        for platform in SocialPlatform::ALL {
            assets.insert(icon_url(ICON_BASE, variant, platform), png(16, 16, [30, 30, 30, 255]));
        }
    }
    assets
}

fn config(social_mode: SocialBakeMode) -> ExportConfig {
    ExportConfig {
        base_url: "https://app.test".to_string(),
        icon_base_url: ICON_BASE.to_string(),
        frames: FrameConfig::clamped(4, 100),
        timeout: Duration::from_secs(10),
        social_mode,
    }
}

struct Harness {
    exporter: Exporter,
    pool: Arc<SurfacePool>,
    store: Arc<MemoryRasterStore>,
}

fn harness_with(
    config: ExportConfig,
    pool: Arc<SurfacePool>,
    fetcher: Arc<dyn AssetFetcher>,
    store: Arc<dyn RasterStore>,
    memory: Arc<MemoryRasterStore>,
) -> Harness {
    Harness {
        exporter: Exporter::new(config, Arc::clone(&pool), fetcher, store),
        pool,
        store: memory,
    }
}

fn harness(social_mode: SocialBakeMode) -> Harness {
    let store = Arc::new(MemoryRasterStore::new("https://rasters.test/generated"));
    harness_with(
        config(social_mode),
        Arc::new(SurfacePool::new(2, Duration::from_secs(2))),
        Arc::new(assets()),
        store.clone(),
        store,
    )
}

fn info() -> PersonalInfo {
    PersonalInfo {
        name: "Jordan Smith".into(),
        title: "Account Executive".into(),
        company: "Apex Solutions".into(),
        email: "jordan@apex.test".into(),
        phone: Some("+1 555 0100".into()),
        website: Some("apex.test".into()),
    }
}

fn all_social() -> SocialMedia {
    SocialMedia {
        linkedin: Some("https://linkedin.com/in/jordan".into()),
        twitter: Some("https://twitter.com/jordan".into()),
        instagram: Some("https://instagram.com/jordan".into()),
        youtube: Some("https://youtube.com/@jordan".into()),
        tiktok: Some("https://tiktok.com/@jordan".into()),
    }
}

fn signature(template: TemplateId, edit: impl FnOnce(&mut NewSignature)) -> Signature {
    let mut input = NewSignature {
        template_id: template.name().to_string(),
        personal_info: info(),
        ..NewSignature::default()
    };
    edit(&mut input);
    Signature::new(uuid::Uuid::now_v7(), input, Utc::now())
}

fn with_images(input: &mut NewSignature) {
    input.images.headshot = Some(ImageRef::DirectUrl(HEADSHOT_URL.into()));
    input.images.logo = Some(ImageRef::DirectUrl(LOGO_URL.into()));
}

fn top_level_tables(html: &str) -> usize {
    match table::extract(html) {
        Ok(_) => 1,
        Err(table::TableError::TopLevelCount { found }) => found,
        Err(e) => panic!("unparseable export: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Static exports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn minimal_text_only_export_has_no_images() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Minimal, |input| {
        input.personal_info.phone = None;
        input.personal_info.website = None;
        input.personal_info.company = "APEX SOLUTIONS".into();
    });

    let out = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();

    assert_eq!(out.strategy, ExportStrategy::Static);
    assert!(out.raster_urls.is_empty());
    assert!(out.html.starts_with("<table"));
    assert!(out.html.contains("Jordan Smith"));
    assert!(out.html.contains("Account Executive"));
    assert!(out.html.contains("APEX SOLUTIONS"));
    assert!(!out.html.contains("<img"));
    assert!(!out.html.contains("tel:"));
    assert!(out.validation.valid, "{:?}", out.validation.issues);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn sales_professional_scales_headshot_and_orders_sidebar() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::SalesProfessional, |input| {
        with_images(input);
        input.images.headshot_size = 150;
        input.social_media = all_social();
    });

    let out = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();

    assert_eq!(out.strategy, ExportStrategy::Static);
    assert!(out.html.contains(&format!("src=\"{HEADSHOT_URL}\"")));
    assert!(out.html.contains("width=\"210\""));

    let positions: Vec<usize> = [
        SocialPlatform::Twitter,
        SocialPlatform::Linkedin,
        SocialPlatform::Instagram,
        SocialPlatform::Youtube,
        SocialPlatform::Tiktok,
    ]
    .into_iter()
    .map(|p| out.html.find(&icon_url(ICON_BASE, "light", p)).unwrap())
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(top_level_tables(&out.html), 1);
}

#[tokio::test]
async fn absent_optional_fields_produce_no_rows() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Professional, |input| {
        input.personal_info.phone = None;
        input.personal_info.website = Some("   ".into());
    });

    let out = h.exporter.export_inline(&sig).unwrap();

    assert!(!out.html.contains("tel:"));
    assert!(!out.html.contains(">W<"));
    assert!(out.html.contains("mailto:jordan@apex.test"));
    assert!(!out.html.contains("<img"));
}

#[tokio::test]
async fn modern_inline_export_reports_absolute_positioning() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Modern, with_images);

    let out = h.exporter.export_inline(&sig).unwrap();

    assert!(!out.html.is_empty());
    assert!(!out.validation.valid);
    assert!(out
        .validation
        .issues
        .iter()
        .any(|issue| issue.contains("absolute positioning")));
}

#[tokio::test]
async fn every_template_exports_a_single_table() {
    let h = harness(SocialBakeMode::PerIcon);
    for template in TemplateId::ALL {
        let sig = signature(template, |input| {
            with_images(input);
            input.social_media = all_social();
        });

        let inline = h.exporter.export_inline(&sig).unwrap();
        assert_eq!(top_level_tables(&inline.html), 1, "{}", template.name());
        assert!(!inline.html.contains("<style"), "{}", template.name());
        assert!(!inline.html.contains("data-element"), "{}", template.name());

        let markup = h.exporter.export_markup(&sig).unwrap();
        assert!(markup.mjml.starts_with("<mjml"), "{}", template.name());
        assert!(
            !markup
                .validation
                .issues
                .iter()
                .any(|issue| issue.contains("top-level table")),
            "{}: {:?}",
            template.name(),
            markup.validation.issues
        );
    }
}

#[tokio::test]
async fn inline_export_is_deterministic() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Creative, |input| {
        with_images(input);
        input.social_media = all_social();
    });

    let first = h.exporter.export_inline(&sig).unwrap();
    let second = h.exporter.export_inline(&sig).unwrap();
    assert_eq!(first.html, second.html);
}

#[tokio::test]
async fn inline_export_ignores_animations() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Professional, |input| {
        with_images(input);
        input.element_animations.headshot = ElementAnimation::Pulse;
    });

    let out = h.exporter.export_inline(&sig).unwrap();
    assert!(out.html.contains(&format!("src=\"{HEADSHOT_URL}\"")));
    assert!(!out.html.contains(".gif"));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn missing_required_fields_fail_before_rendering() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Professional, |input| {
        input.personal_info.email = String::new();
        input.personal_info.title = " ".into();
    });

    let err = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap_err();
    assert_matches!(
        err,
        ExportError::Core(CoreError::MissingRequiredField { ref fields }) if fields == &vec!["title", "email"]
    );
    assert_eq!(err.stage(), "validate");
    assert_matches!(h.exporter.export_inline(&sig), Err(ExportError::Core(_)));
    assert_matches!(h.exporter.export_markup(&sig), Err(ExportError::Core(_)));
}

#[tokio::test]
async fn unknown_template_falls_back_to_default_layout() {
    let h = harness(SocialBakeMode::PerIcon);
    let mut sig = signature(TemplateId::Professional, |_| {});
    sig.template_id = "retro".into();

    let out = h.exporter.export_inline(&sig).unwrap();
    assert!(out.html.contains("Jordan Smith"));
    assert_eq!(top_level_tables(&out.html), 1);
}

// ---------------------------------------------------------------------------
// Animated exports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_the_animated_headshot_is_baked() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Professional, |input| {
        with_images(input);
        input.social_media = all_social();
        input.element_animations.headshot = ElementAnimation::Pulse;
    });

    let out = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();

    assert_eq!(out.strategy, ExportStrategy::Animated);
    assert_eq!(out.raster_urls.keys().collect::<Vec<_>>(), vec!["headshot"]);
    let gif_url = &out.raster_urls["headshot"];
    assert!(gif_url.ends_with(".gif"));
    assert!(out.html.contains(gif_url.as_str()));
    assert!(!out.html.contains(&format!("src=\"{HEADSHOT_URL}\"")));

    // Logo and icons stay static.
    assert!(out.html.contains(&format!("src=\"{LOGO_URL}\"")));
    for platform in SocialPlatform::ALL {
        assert!(out.html.contains(&icon_url(ICON_BASE, "color", platform)));
    }
    assert!(!out.html.contains("sig-anim"));
    assert_eq!(top_level_tables(&out.html), 1);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn repeated_animated_exports_reuse_raster_urls() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Minimal, |input| {
        with_images(input);
        input.element_animations.logo = ElementAnimation::FadeIn;
    });

    let first = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();
    let second = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();

    assert_eq!(first.raster_urls, second.raster_urls);
    assert_eq!(first.html, second.html);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn animated_element_without_content_is_skipped() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Professional, |input| {
        input.element_animations.logo = ElementAnimation::ZoomIn;
    });

    let out = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();
    assert_eq!(out.strategy, ExportStrategy::Animated);
    assert!(out.raster_urls.is_empty());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn per_icon_baking_keeps_every_profile_link() {
    let h = harness(SocialBakeMode::PerIcon);
    let social = all_social();
    let sig = signature(TemplateId::Professional, |input| {
        input.social_media = social.clone();
        input.element_animations.social_icons = ElementAnimation::StickOn;
    });

    let out = h.exporter.export(&sig, EmailClient::AppleMail).await.unwrap();

    assert_eq!(out.raster_urls.len(), 5);
    for platform in SocialPlatform::ALL {
        let key = format!("socialIcons.{}", platform.name());
        let url = &out.raster_urls[&key];
        assert!(out.html.contains(url.as_str()), "{key}");
        assert!(out.html.contains(social.url(platform).unwrap()), "{key}");
    }
    assert!(!out.html.contains("data-platform"));
}

#[tokio::test]
async fn flattened_social_cluster_drops_links() {
    let h = harness(SocialBakeMode::Flatten);
    let social = all_social();
    let sig = signature(TemplateId::Professional, |input| {
        input.social_media = social.clone();
        input.element_animations.social_icons = ElementAnimation::TestSweep;
    });

    let out = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();

    assert_eq!(out.raster_urls.keys().collect::<Vec<_>>(), vec!["socialIcons"]);
    for platform in SocialPlatform::ALL {
        assert!(!out.html.contains(social.url(platform).unwrap()));
    }
    assert_eq!(top_level_tables(&out.html), 1);
}

#[tokio::test]
async fn outlook_gif_opens_on_the_settled_frame() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Professional, |input| {
        with_images(input);
        input.element_animations.headshot = ElementAnimation::FadeIn;
    });

    let first_frame = |client| {
        let h = &h;
        let sig = &sig;
        async move {
            let out = h.exporter.export(sig, client).await.unwrap();
            let url = out.raster_urls["headshot"].clone();
            let key = url.trim_start_matches("https://rasters.test/generated/").to_string();
            let stored = h.store.get(&key).unwrap();
            assert_eq!(stored.content_type, "image/gif");
            let frames = GifDecoder::new(Cursor::new(stored.bytes))
                .unwrap()
                .into_frames()
                .collect_frames()
                .unwrap();
            let buffer = frames[0].buffer().clone();
            *buffer.get_pixel(buffer.width() / 2, buffer.height() / 2)
        }
    };

    // Fade-in starts fully transparent over the white backdrop.
    let gmail = first_frame(EmailClient::Gmail).await;
    assert!(gmail.0[1] > 200, "{gmail:?}");

    let outlook = first_frame(EmailClient::Outlook).await;
    assert!(outlook.0[0] > 180, "{outlook:?}");
    assert!(outlook.0[1] < 80, "{outlook:?}");
}

#[tokio::test]
async fn stale_tag_does_not_decide_strategy() {
    let h = harness(SocialBakeMode::PerIcon);
    let mut sig = signature(TemplateId::Professional, with_images);
    sig.tag = sigcraft_core::signature::SignatureTag::Dynamic;

    let out = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();
    assert_eq!(out.strategy, ExportStrategy::Static);
}

// ---------------------------------------------------------------------------
// Failures and resource release
// ---------------------------------------------------------------------------

struct FailingStore;

#[async_trait]
impl RasterStore for FailingStore {
    async fn put(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String, AssetError> {
        Err(AssetError::Store {
            key: key.to_string(),
            reason: "bucket unavailable".into(),
        })
    }
}

struct SlowStore(Duration);

#[async_trait]
impl RasterStore for SlowStore {
    async fn put(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String, AssetError> {
        tokio::time::sleep(self.0).await;
        Ok(format!("https://slow.test/{key}"))
    }
}

struct SlowFetcher(Duration);

#[async_trait]
impl AssetFetcher for SlowFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        tokio::time::sleep(self.0).await;
        assets().fetch(url).await
    }
}

fn animated_headshot() -> Signature {
    signature(TemplateId::Professional, |input| {
        with_images(input);
        input.element_animations.headshot = ElementAnimation::Pulse;
    })
}

#[tokio::test]
async fn missing_source_image_is_a_fetch_error() {
    let store = Arc::new(MemoryRasterStore::new("https://rasters.test"));
    let h = harness_with(
        config(SocialBakeMode::PerIcon),
        Arc::new(SurfacePool::new(1, Duration::from_secs(1))),
        Arc::new(MemoryAssets::new()),
        store.clone(),
        store,
    );

    let err = h.exporter.export(&animated_headshot(), EmailClient::Gmail).await.unwrap_err();
    assert_matches!(err, ExportError::AssetFetch { ref element, .. } if element == "headshot");
    assert_eq!(h.pool.available(), 1);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn storage_failure_releases_the_surface() {
    let h = harness_with(
        config(SocialBakeMode::PerIcon),
        Arc::new(SurfacePool::new(1, Duration::from_secs(1))),
        Arc::new(assets()),
        Arc::new(FailingStore),
        Arc::new(MemoryRasterStore::new("https://unused.test")),
    );

    let err = h.exporter.export(&animated_headshot(), EmailClient::Gmail).await.unwrap_err();
    assert_matches!(err, ExportError::Storage(_));
    assert_eq!(err.stage(), "store");
    assert_eq!(h.pool.available(), 1);
}

#[tokio::test]
async fn slow_fetch_times_out() {
    let store = Arc::new(MemoryRasterStore::new("https://rasters.test"));
    let mut cfg = config(SocialBakeMode::PerIcon);
    cfg.timeout = Duration::from_millis(50);
    let h = harness_with(
        cfg,
        Arc::new(SurfacePool::new(1, Duration::from_secs(1))),
        Arc::new(SlowFetcher(Duration::from_millis(500))),
        store.clone(),
        store,
    );

    let err = h.exporter.export(&animated_headshot(), EmailClient::Gmail).await.unwrap_err();
    assert_matches!(err, ExportError::Timeout(d) if d == Duration::from_millis(50));
    assert_eq!(h.pool.available(), 1);
}

#[tokio::test]
async fn timeout_after_rendering_leaves_no_surface_held() {
    let mut cfg = config(SocialBakeMode::PerIcon);
    cfg.timeout = Duration::from_secs(1);
    let h = harness_with(
        cfg,
        Arc::new(SurfacePool::new(1, Duration::from_secs(1))),
        Arc::new(assets()),
        Arc::new(SlowStore(Duration::from_secs(5))),
        Arc::new(MemoryRasterStore::new("https://unused.test")),
    );

    let err = h.exporter.export(&animated_headshot(), EmailClient::Gmail).await.unwrap_err();
    assert_matches!(err, ExportError::Timeout(_));
    assert_eq!(h.pool.available(), 1);
}

#[tokio::test]
async fn exhausted_pool_is_a_surface_error() {
    let store = Arc::new(MemoryRasterStore::new("https://rasters.test"));
    let h = harness_with(
        config(SocialBakeMode::PerIcon),
        Arc::new(SurfacePool::new(1, Duration::from_millis(20))),
        Arc::new(assets()),
        store.clone(),
        store,
    );

    let held = h.pool.acquire().await.unwrap();
    let err = h.exporter.export(&animated_headshot(), EmailClient::Gmail).await.unwrap_err();
    assert_matches!(err, ExportError::RenderingSurface(_));
    assert_eq!(err.stage(), "render");

    drop(held);
    assert_eq!(h.pool.available(), 1);
    h.exporter.export(&animated_headshot(), EmailClient::Gmail).await.unwrap();
    assert_eq!(h.pool.available(), 1);
}

// ---------------------------------------------------------------------------
// Element positions
// ---------------------------------------------------------------------------

const MOVED: &str = "transform: translate(4px, -2px) scale(1.5)";

#[tokio::test]
async fn moved_name_is_transformed_on_every_path() {
    let h = harness(SocialBakeMode::PerIcon);
    for template in TemplateId::ALL {
        let sig = signature(template, |input| {
            with_images(input);
            input.element_positions.name = Position { x: 4.0, y: -2.0, scale: 1.5 };
        });

        let preview = h.exporter.preview(&sig);
        let exported = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();
        let inline = h.exporter.export_inline(&sig).unwrap();
        let markup = h.exporter.export_markup(&sig).unwrap();

        assert!(preview.contains(MOVED), "{template:?} preview");
        assert!(exported.html.contains(MOVED), "{template:?} export");
        assert!(inline.html.contains(MOVED), "{template:?} inline");
        assert!(markup.mjml.contains(MOVED), "{template:?} mjml");
        assert!(markup.html.contains(MOVED), "{template:?} markup html");
    }
}

#[tokio::test]
async fn moved_images_and_icons_survive_markup_export() {
    let h = harness(SocialBakeMode::PerIcon);
    let moved = Position { x: 4.0, y: -2.0, scale: 1.5 };
    let sig = signature(TemplateId::SalesProfessional, |input| {
        with_images(input);
        input.social_media = all_social();
        input.element_positions.headshot = moved;
        input.element_positions.logo = moved;
        input.element_positions.social = moved;
    });

    let inline = h.exporter.export_inline(&sig).unwrap();
    let markup = h.exporter.export_markup(&sig).unwrap();

    assert_eq!(inline.html.matches(MOVED).count(), 3);
    assert_eq!(markup.html.matches(MOVED).count(), 3);
    assert_eq!(top_level_tables(&markup.html), 1);
    for platform in SocialPlatform::ALL {
        assert!(markup.html.contains(&icon_url(ICON_BASE, "light", platform))
            || markup.html.contains(&icon_url(ICON_BASE, "color", platform)));
    }
    assert!(markup.html.contains("https://linkedin.com/in/jordan"));
    assert!(!markup.html.contains("data-platform"));
}

#[tokio::test]
async fn default_positions_emit_no_transform() {
    let h = harness(SocialBakeMode::PerIcon);
    for template in TemplateId::ALL {
        let sig = signature(template, |input| {
            with_images(input);
            input.social_media = all_social();
        });

        let exported = h.exporter.export(&sig, EmailClient::Gmail).await.unwrap();
        let inline = h.exporter.export_inline(&sig).unwrap();
        let markup = h.exporter.export_markup(&sig).unwrap();

        assert!(!exported.html.contains("translate("), "{template:?} export");
        assert!(!inline.html.contains("translate("), "{template:?} inline");
        assert!(!markup.html.contains("translate("), "{template:?} markup");
        assert!(!markup.mjml.contains("translate("), "{template:?} mjml");
    }
}

#[tokio::test]
async fn markup_logo_matches_inline_height() {
    let h = harness(SocialBakeMode::PerIcon);
    let sig = signature(TemplateId::Minimal, |input| {
        with_images(input);
        input.images.logo_size = 150;
    });

    let inline = h.exporter.export_inline(&sig).unwrap();
    let markup = h.exporter.export_markup(&sig).unwrap();

    let px = sigcraft_pipeline::templates::Layout::Minimal.geometry().logo_px(150);
    let sized = format!("height=\"{px}\"");
    assert!(inline.html.contains(&sized));
    assert!(markup.html.contains(&sized), "{}", markup.html);
    assert!(markup.html.contains(">E</td>"));
}
