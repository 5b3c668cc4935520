//! The signature record and its value types.
//!
//! A [`Signature`] is pure data. The export pipeline consumes it read-only;
//! only [`Signature::apply`] mutates it, and that path always refreshes the
//! cached [`SignatureTag`] and `updated_at`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, SignatureId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest accepted headshot/logo size, in percent of the template base.
pub const IMAGE_SIZE_MIN: u32 = 50;

/// Largest accepted headshot/logo size, in percent of the template base.
pub const IMAGE_SIZE_MAX: u32 = 200;

/// Headshot/logo size used when the record does not specify one.
pub const DEFAULT_IMAGE_SIZE: u32 = 100;

/// Upper bound for `backgroundOpacity` (percent).
pub const BACKGROUND_OPACITY_MAX: u32 = 100;

/// Background opacity used when the record does not specify one.
pub const DEFAULT_BACKGROUND_OPACITY: u32 = 20;

/// Template assigned to new signatures that do not pick one.
pub const DEFAULT_TEMPLATE: &str = "professional";

fn default_image_size() -> u32 {
    DEFAULT_IMAGE_SIZE
}

fn default_background_opacity() -> u32 {
    DEFAULT_BACKGROUND_OPACITY
}

fn default_template_name() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// Clamp a headshot/logo percentage into `IMAGE_SIZE_MIN..=IMAGE_SIZE_MAX`.
pub fn clamp_image_size(percent: u32) -> u32 {
    percent.clamp(IMAGE_SIZE_MIN, IMAGE_SIZE_MAX)
}

/// Clamp a background opacity percentage into `0..=BACKGROUND_OPACITY_MAX`.
pub fn clamp_background_opacity(percent: u32) -> u32 {
    percent.min(BACKGROUND_OPACITY_MAX)
}

/// Trim an optional string, treating blank values as absent.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// The closed set of template identifiers a signature may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateId {
    Professional,
    Modern,
    Minimal,
    Creative,
    SalesProfessional,
}

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::Professional,
        TemplateId::Modern,
        TemplateId::Minimal,
        TemplateId::Creative,
        TemplateId::SalesProfessional,
    ];

    /// Parse the stored `templateId` string.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "professional" => Ok(Self::Professional),
            "modern" => Ok(Self::Modern),
            "minimal" => Ok(Self::Minimal),
            "creative" => Ok(Self::Creative),
            "sales-professional" => Ok(Self::SalesProfessional),
            other => Err(CoreError::InvalidTemplate(other.to_string())),
        }
    }

    /// Wire/database name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Modern => "modern",
            Self::Minimal => "minimal",
            Self::Creative => "creative",
            Self::SalesProfessional => "sales-professional",
        }
    }
}

// ---------------------------------------------------------------------------
// Personal info
// ---------------------------------------------------------------------------

/// Contact details shown in the signature body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    #[validate(length(max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub company: String,
    #[serde(default)]
    #[validate(length(max = 254))]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub website: Option<String>,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// A stored image reference.
///
/// Records arrive either as a plain string or as an object carrying a
/// `url`, `path` or `objectPath`. Both shapes collapse into this variant
/// once, at deserialization time, so nothing downstream has to guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Already an absolute URL (`http`, `https` or `data:`).
    DirectUrl(String),
    /// A path relative to the asset server; needs resolving.
    StoredRef(String),
}

impl ImageRef {
    /// Classify a raw reference. Blank input yields `None`.
    pub fn classify(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
        {
            Some(Self::DirectUrl(raw.to_string()))
        } else {
            Some(Self::StoredRef(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DirectUrl(s) | Self::StoredRef(s) => s,
        }
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Accepted wire shapes for an image field.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawImageRef {
    Plain(String),
    Object {
        #[serde(default, alias = "src")]
        url: Option<String>,
        #[serde(default)]
        path: Option<String>,
        #[serde(default, rename = "objectPath")]
        object_path: Option<String>,
    },
}

impl RawImageRef {
    fn into_ref(self) -> Option<ImageRef> {
        match self {
            Self::Plain(s) => ImageRef::classify(&s),
            Self::Object {
                url,
                path,
                object_path,
            } => {
                if let Some(url) = url.as_deref().and_then(ImageRef::classify) {
                    return Some(url);
                }
                path.or(object_path)
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| ImageRef::StoredRef(s.to_string()))
            }
        }
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawImageRef::deserialize(deserializer)?
            .into_ref()
            .ok_or_else(|| serde::de::Error::custom("empty image reference"))
    }
}

fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<Option<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawImageRef> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(RawImageRef::into_ref))
}

/// Image references and their sizing knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Images {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_image_ref"
    )]
    pub headshot: Option<ImageRef>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_image_ref"
    )]
    pub logo: Option<ImageRef>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_image_ref"
    )]
    pub background: Option<ImageRef>,
    #[serde(default = "default_image_size")]
    #[validate(range(min = 50, max = 200))]
    pub headshot_size: u32,
    #[serde(default = "default_image_size")]
    #[validate(range(min = 50, max = 200))]
    pub logo_size: u32,
    #[serde(default = "default_background_opacity")]
    #[validate(range(max = 100))]
    pub background_opacity: u32,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            headshot: None,
            logo: None,
            background: None,
            headshot_size: DEFAULT_IMAGE_SIZE,
            logo_size: DEFAULT_IMAGE_SIZE,
            background_opacity: DEFAULT_BACKGROUND_OPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Social media
// ---------------------------------------------------------------------------

/// Supported social platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Linkedin,
    Twitter,
    Instagram,
    Youtube,
    Tiktok,
}

impl SocialPlatform {
    /// Canonical platform order used unless a template overrides it.
    pub const ALL: [SocialPlatform; 5] = [
        SocialPlatform::Linkedin,
        SocialPlatform::Twitter,
        SocialPlatform::Instagram,
        SocialPlatform::Youtube,
        SocialPlatform::Tiktok,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
        }
    }

    /// Human-readable label, used for `alt`/`title` text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Linkedin => "LinkedIn",
            Self::Twitter => "X (Twitter)",
            Self::Instagram => "Instagram",
            Self::Youtube => "YouTube",
            Self::Tiktok => "TikTok",
        }
    }

    /// Brand colour as `#rrggbb`.
    pub fn brand_color(self) -> &'static str {
        match self {
            Self::Linkedin => "#0a66c2",
            Self::Twitter => "#000000",
            Self::Instagram => "#e1306c",
            Self::Youtube => "#ff0000",
            Self::Tiktok => "#010101",
        }
    }
}

/// Profile URLs per platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SocialMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub tiktok: Option<String>,
}

impl SocialMedia {
    /// The non-blank URL for `platform`, if any.
    pub fn url(&self, platform: SocialPlatform) -> Option<&str> {
        let value = match platform {
            SocialPlatform::Linkedin => &self.linkedin,
            SocialPlatform::Twitter => &self.twitter,
            SocialPlatform::Instagram => &self.instagram,
            SocialPlatform::Youtube => &self.youtube,
            SocialPlatform::Tiktok => &self.tiktok,
        };
        non_blank(value)
    }

    /// Platforms with a URL, in the given order.
    pub fn present_in(&self, order: &[SocialPlatform]) -> Vec<(SocialPlatform, &str)> {
        order
            .iter()
            .filter_map(|&p| self.url(p).map(|url| (p, url)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        SocialPlatform::ALL.iter().all(|&p| self.url(p).is_none())
    }
}

// ---------------------------------------------------------------------------
// Animations
// ---------------------------------------------------------------------------

/// Legacy signature-wide animation. Carried on the record but superseded by
/// [`ElementAnimations`]; export never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationType {
    FadeIn,
    Pulse,
    CrossDissolve,
}

impl AnimationType {
    pub fn name(self) -> &'static str {
        match self {
            Self::FadeIn => "fade-in",
            Self::Pulse => "pulse",
            Self::CrossDissolve => "cross-dissolve",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fade-in" => Some(Self::FadeIn),
            "pulse" => Some(Self::Pulse),
            "cross-dissolve" => Some(Self::CrossDissolve),
            _ => None,
        }
    }
}

/// Motion effect applied to a single element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementAnimation {
    #[default]
    None,
    FadeIn,
    Pulse,
    CrossDissolve,
    BlockReveal,
    ZoomIn,
    TestSweep,
    StickOn,
}

impl ElementAnimation {
    pub fn is_active(self) -> bool {
        self != Self::None
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FadeIn => "fade-in",
            Self::Pulse => "pulse",
            Self::CrossDissolve => "cross-dissolve",
            Self::BlockReveal => "block-reveal",
            Self::ZoomIn => "zoom-in",
            Self::TestSweep => "test-sweep",
            Self::StickOn => "stick-on",
        }
    }
}

/// Elements that can carry an [`ElementAnimation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnimatedElement {
    Headshot,
    Logo,
    SocialIcons,
}

impl AnimatedElement {
    pub const ALL: [AnimatedElement; 3] = [
        AnimatedElement::Headshot,
        AnimatedElement::Logo,
        AnimatedElement::SocialIcons,
    ];

    /// Key used in `elementAnimations`, markup markers and raster URL maps.
    pub fn key(self) -> &'static str {
        match self {
            Self::Headshot => "headshot",
            Self::Logo => "logo",
            Self::SocialIcons => "socialIcons",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.key() == key)
    }
}

/// Per-element animation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAnimations {
    #[serde(default)]
    pub headshot: ElementAnimation,
    #[serde(default)]
    pub logo: ElementAnimation,
    #[serde(default)]
    pub social_icons: ElementAnimation,
}

impl ElementAnimations {
    pub fn get(&self, element: AnimatedElement) -> ElementAnimation {
        match element {
            AnimatedElement::Headshot => self.headshot,
            AnimatedElement::Logo => self.logo,
            AnimatedElement::SocialIcons => self.social_icons,
        }
    }

    /// Elements whose animation is not `none`, in [`AnimatedElement::ALL`] order.
    pub fn active(&self) -> Vec<(AnimatedElement, ElementAnimation)> {
        AnimatedElement::ALL
            .into_iter()
            .map(|e| (e, self.get(e)))
            .filter(|(_, a)| a.is_active())
            .collect()
    }

    pub fn any_active(&self) -> bool {
        AnimatedElement::ALL
            .into_iter()
            .any(|e| self.get(e).is_active())
    }
}

// ---------------------------------------------------------------------------
// Element positions
// ---------------------------------------------------------------------------

/// Offset and scale applied to an element during layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "Position::default_scale")]
    pub scale: f32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Position {
    fn default_scale() -> f32 {
        1.0
    }

    pub fn is_default(&self) -> bool {
        self.x.abs() < f32::EPSILON
            && self.y.abs() < f32::EPSILON
            && (self.scale - 1.0).abs() < f32::EPSILON
    }

    /// CSS transform value, or `None` when the position is the identity.
    pub fn transform(&self) -> Option<String> {
        if self.is_default() {
            return None;
        }
        Some(format!(
            "translate({}px, {}px) scale({})",
            self.x, self.y, self.scale
        ))
    }
}

/// Per-element positioning offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPositions {
    #[serde(default)]
    pub logo: Position,
    #[serde(default)]
    pub headshot: Position,
    #[serde(default)]
    pub name: Position,
    #[serde(default)]
    pub company: Position,
    #[serde(default)]
    pub contact: Position,
    #[serde(default)]
    pub social: Position,
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Cached classification: `dynamic` iff any element animation is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureTag {
    #[default]
    Static,
    Dynamic,
}

impl SignatureTag {
    pub fn name(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }

    pub fn from_name(name: &str) -> Self {
        if name == "dynamic" {
            Self::Dynamic
        } else {
            Self::Static
        }
    }
}

/// The root signature entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: SignatureId,
    pub owner_id: Option<DbId>,
    pub template_id: String,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub social_media: SocialMedia,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_type: Option<AnimationType>,
    #[serde(default)]
    pub element_animations: ElementAnimations,
    #[serde(default)]
    pub element_positions: ElementPositions,
    #[serde(default)]
    pub tag: SignatureTag,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Signature {
    /// Build a fresh record from a creation payload.
    pub fn new(id: SignatureId, input: NewSignature, now: Timestamp) -> Self {
        let mut signature = Self {
            id,
            owner_id: input.owner_id,
            template_id: input.template_id,
            personal_info: input.personal_info,
            images: input.images,
            social_media: input.social_media,
            animation_type: input.animation_type,
            element_animations: input.element_animations,
            element_positions: input.element_positions,
            tag: SignatureTag::Static,
            created_at: now,
            updated_at: now,
        };
        signature.tag = signature.computed_tag();
        signature
    }

    /// Parse `template_id`; unknown values surface as
    /// [`CoreError::InvalidTemplate`] so callers can fall back.
    pub fn template(&self) -> Result<TemplateId, CoreError> {
        TemplateId::from_name(&self.template_id)
    }

    /// Recomputed from `element_animations`; never reads the cached `tag`.
    pub fn has_active_animation(&self) -> bool {
        self.element_animations.any_active()
    }

    pub fn computed_tag(&self) -> SignatureTag {
        if self.has_active_animation() {
            SignatureTag::Dynamic
        } else {
            SignatureTag::Static
        }
    }

    /// True when the cached `tag` disagrees with the animations.
    pub fn tag_is_stale(&self) -> bool {
        self.tag != self.computed_tag()
    }

    /// Names of required personal-info fields that are blank.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let info = &self.personal_info;
        [
            ("name", &info.name),
            ("title", &info.title),
            ("company", &info.company),
            ("email", &info.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Fail fast when a required field is blank.
    pub fn ensure_complete(&self) -> Result<(), CoreError> {
        let fields = self.missing_required_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingRequiredField { fields })
        }
    }

    /// Apply a partial update, bumping `updated_at` and refreshing `tag`.
    pub fn apply(&mut self, patch: SignaturePatch, now: Timestamp) {
        if let Some(template_id) = patch.template_id {
            self.template_id = template_id;
        }
        if let Some(info) = patch.personal_info {
            self.personal_info = info;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(social) = patch.social_media {
            self.social_media = social;
        }
        if let Some(animation_type) = patch.animation_type {
            self.animation_type = Some(animation_type);
        }
        if let Some(animations) = patch.element_animations {
            self.element_animations = animations;
        }
        if let Some(positions) = patch.element_positions {
            self.element_positions = positions;
        }
        self.tag = self.computed_tag();
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Input DTOs
// ---------------------------------------------------------------------------

/// Payload for creating a signature. The builder pre-fills defaults, so
/// every section is optional on the wire.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSignature {
    #[serde(default)]
    pub owner_id: Option<DbId>,
    #[serde(default = "default_template_name")]
    pub template_id: String,
    #[serde(default)]
    #[validate(nested)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    #[validate(nested)]
    pub images: Images,
    #[serde(default)]
    #[validate(nested)]
    pub social_media: SocialMedia,
    #[serde(default)]
    pub animation_type: Option<AnimationType>,
    #[serde(default)]
    pub element_animations: ElementAnimations,
    #[serde(default)]
    pub element_positions: ElementPositions,
}

impl Default for NewSignature {
    fn default() -> Self {
        Self {
            owner_id: None,
            template_id: default_template_name(),
            personal_info: PersonalInfo::default(),
            images: Images::default(),
            social_media: SocialMedia::default(),
            animation_type: None,
            element_animations: ElementAnimations::default(),
            element_positions: ElementPositions::default(),
        }
    }
}

impl NewSignature {
    /// Input validation: field ranges and a known template.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        TemplateId::from_name(&self.template_id)
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(())
    }
}

/// Partial update; each present section replaces the stored one.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePatch {
    pub template_id: Option<String>,
    #[validate(nested)]
    pub personal_info: Option<PersonalInfo>,
    #[validate(nested)]
    pub images: Option<Images>,
    #[validate(nested)]
    pub social_media: Option<SocialMedia>,
    pub animation_type: Option<AnimationType>,
    pub element_animations: Option<ElementAnimations>,
    pub element_positions: Option<ElementPositions>,
}

impl SignaturePatch {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if let Some(template_id) = &self.template_id {
            TemplateId::from_name(template_id)
                .map_err(|e| CoreError::Validation(e.to_string()))?;
        }
        Ok(())
    }
}
