//! Image URL resolution.
//!
//! Converts stored image references into absolute URLs that work inside a
//! standalone HTML document. Resolution never fails loudly: anything that
//! cannot be turned into a usable URL resolves to `None`, and the layout
//! omits that image entirely.

use crate::signature::{
    clamp_background_opacity, clamp_image_size, ImageRef, Images,
};

/// Route that serves user uploads.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Route that serves assets attached through the builder.
pub const ATTACHED_ASSETS_PREFIX: &str = "/attached_assets/";

/// Route that serves object-storage entities.
pub const OBJECTS_PREFIX: &str = "/objects/";

/// Build-tool alias for attached assets. Only the basename survives.
pub const ASSET_ALIAS_PREFIX: &str = "@assets/";

/// Storage-relative prefixes, matched anywhere in the path so that leaked
/// filesystem segments in front of them are dropped.
const STORAGE_PREFIXES: &[&str] = &[UPLOADS_PREFIX, ATTACHED_ASSETS_PREFIX, OBJECTS_PREFIX];

/// Resolve `image_path` against `base_url`.
///
/// - Absolute `http(s)://` and `data:` URLs are returned unchanged.
/// - Storage-relative paths are rewritten to `{base_url}{path}`.
/// - `@assets/...` aliases keep only their basename.
/// - Anything else is treated as a bare upload filename.
/// - Blank input resolves to `None`.
pub fn resolve(image_path: &str, base_url: &str) -> Option<String> {
    let path = image_path.trim();
    if path.is_empty() {
        return None;
    }

    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:") {
        return Some(path.to_string());
    }
    if let Some(rest) = path.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }

    let base = base_url.trim().trim_end_matches('/');
    let path = path.replace('\\', "/");

    if let Some(alias) = path.find(ASSET_ALIAS_PREFIX) {
        let file = basename(&path[alias + ASSET_ALIAS_PREFIX.len()..])?;
        return Some(format!("{base}{ATTACHED_ASSETS_PREFIX}{file}"));
    }

    for prefix in STORAGE_PREFIXES {
        if let Some(idx) = path.find(prefix) {
            let rest = path[idx + prefix.len()..].trim_start_matches('/');
            if rest.is_empty() {
                return None;
            }
            return Some(format!("{base}{prefix}{rest}"));
        }
    }

    // Prefix without a leading slash ("uploads/x.png").
    for prefix in STORAGE_PREFIXES {
        if let Some(rest) = path.strip_prefix(&prefix[1..]) {
            if rest.is_empty() {
                return None;
            }
            return Some(format!("{base}{prefix}{rest}"));
        }
    }

    let file = basename(&path)?;
    Some(format!("{base}{UPLOADS_PREFIX}{file}"))
}

/// Resolve an [`ImageRef`]; direct URLs bypass the base entirely.
pub fn resolve_ref(image: &ImageRef, base_url: &str) -> Option<String> {
    match image {
        ImageRef::DirectUrl(url) => resolve(url, base_url),
        ImageRef::StoredRef(path) => resolve(path, base_url),
    }
}

fn basename(path: &str) -> Option<&str> {
    path.rsplit('/').find(|segment| !segment.is_empty())
}

/// Image fields after resolution and clamping. This is the only image
/// shape layout generators ever see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImages {
    pub headshot: Option<String>,
    pub logo: Option<String>,
    pub background: Option<String>,
    /// Clamped to `50..=200`.
    pub headshot_size: u32,
    /// Clamped to `50..=200`.
    pub logo_size: u32,
    /// Clamped to `0..=100`.
    pub background_opacity: u32,
}

/// Outcome of resolving a signature's images.
#[derive(Debug, Clone)]
pub struct ImageResolution {
    pub images: ResolvedImages,
    /// Fields that held a reference but could not be resolved.
    pub unresolved: Vec<&'static str>,
}

/// Resolve every image field and clamp the sizing knobs.
pub fn resolve_images(images: &Images, base_url: &str) -> ImageResolution {
    let mut unresolved = Vec::new();
    let mut field = |name: &'static str, image: &Option<ImageRef>| -> Option<String> {
        let image = image.as_ref()?;
        let resolved = resolve_ref(image, base_url);
        if resolved.is_none() {
            unresolved.push(name);
        }
        resolved
    };

    let headshot = field("headshot", &images.headshot);
    let logo = field("logo", &images.logo);
    let background = field("background", &images.background);

    ImageResolution {
        images: ResolvedImages {
            headshot,
            logo,
            background,
            headshot_size: clamp_image_size(images.headshot_size),
            logo_size: clamp_image_size(images.logo_size),
            background_opacity: clamp_background_opacity(images.background_opacity),
        },
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://sig.example.com/";

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            resolve("https://cdn.example.com/a.png", BASE).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(
            resolve("http://cdn.example.com/a.png", BASE).as_deref(),
            Some("http://cdn.example.com/a.png")
        );
    }

    #[test]
    fn protocol_relative_urls_get_https() {
        assert_eq!(
            resolve("//cdn.example.com/a.png", BASE).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn upload_paths_are_prefixed_with_base() {
        assert_eq!(
            resolve("/uploads/headshot-1.png", BASE).as_deref(),
            Some("https://sig.example.com/uploads/headshot-1.png")
        );
    }

    #[test]
    fn filesystem_segments_before_prefix_are_stripped() {
        assert_eq!(
            resolve("/home/runner/app/uploads/me.jpg", BASE).as_deref(),
            Some("https://sig.example.com/uploads/me.jpg")
        );
        assert_eq!(
            resolve("/srv/data/objects/abc/def.png", BASE).as_deref(),
            Some("https://sig.example.com/objects/abc/def.png")
        );
    }

    #[test]
    fn asset_alias_keeps_basename_only() {
        assert_eq!(
            resolve("@assets/brand/logos/logo_1712.png", BASE).as_deref(),
            Some("https://sig.example.com/attached_assets/logo_1712.png")
        );
    }

    #[test]
    fn bare_filename_goes_to_uploads() {
        assert_eq!(
            resolve("photo.png", BASE).as_deref(),
            Some("https://sig.example.com/uploads/photo.png")
        );
        assert_eq!(
            resolve("uploads/photo.png", BASE).as_deref(),
            Some("https://sig.example.com/uploads/photo.png")
        );
    }

    #[test]
    fn empty_input_resolves_to_none() {
        assert_eq!(resolve("", BASE), None);
        assert_eq!(resolve("   ", BASE), None);
        assert_eq!(resolve("/uploads/", BASE), None);
    }

    #[test]
    fn resolve_images_clamps_and_reports_unresolved() {
        let images = Images {
            headshot: Some(ImageRef::StoredRef("/uploads/me.png".into())),
            logo: Some(ImageRef::StoredRef("/objects/".into())),
            background: None,
            headshot_size: 500,
            logo_size: 20,
            background_opacity: 150,
        };

        let resolution = resolve_images(&images, BASE);

        assert_eq!(
            resolution.images.headshot.as_deref(),
            Some("https://sig.example.com/uploads/me.png")
        );
        assert_eq!(resolution.images.logo, None);
        assert_eq!(resolution.images.background, None);
        assert_eq!(resolution.images.headshot_size, 200);
        assert_eq!(resolution.images.logo_size, 50);
        assert_eq!(resolution.images.background_opacity, 100);
        assert_eq!(resolution.unresolved, vec!["logo"]);
    }
}
