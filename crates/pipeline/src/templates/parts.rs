//! Markup fragments shared by every layout.

use sigcraft_core::signature::{AnimatedElement, Position, SocialPlatform};

use super::{Geometry, LayoutContext, RenderMode};
use crate::html::{escape_attr, escape_text};

/// Attribute naming the animatable element a container wraps.
pub const ELEMENT_MARKER: &str = "data-element";

/// Attribute carrying the active animation name.
pub const ANIMATION_MARKER: &str = "data-animation";

/// Attribute identifying which platform a social link points to.
pub const PLATFORM_MARKER: &str = "data-platform";

/// Class prefix used for preview-only animation hooks.
pub const ANIMATION_CLASS_PREFIX: &str = "sig-anim";

const BASE_CSS: &str = "\
.sig-root { border-collapse: collapse; font-family: Arial, Helvetica, sans-serif; font-size: 13px; line-height: 1.4; }
.sig-root td { vertical-align: top; }
.sig-root img { display: block; border: 0; outline: none; text-decoration: none; }
.sig-root a { text-decoration: none; }
.sig-name { font-size: 18px; font-weight: bold; margin: 0; }
.sig-title { font-size: 13px; margin: 0 0 2px 0; }
.sig-company { font-size: 13px; font-weight: bold; margin: 0 0 8px 0; }
.sig-placeholder { opacity: 0.6; letter-spacing: 2px; }
.sig-placeholder-sub { display: block; font-size: 10px; font-weight: normal; letter-spacing: 1px; }
.sig-contact { border-collapse: collapse; }
.sig-contact td { padding: 1px 0; font-size: 12px; }
.sig-contact-label { padding-right: 6px; font-weight: bold; }
.sig-social { border-collapse: collapse; }
.sig-social-link { display: inline-block; }
";

/// Keyframes and hook classes for the live preview. Never part of an
/// export: the inliner would otherwise carry `animation` onto elements.
const PREVIEW_KEYFRAMES: &str = "\
@keyframes sig-fade-in { from { opacity: 0; } to { opacity: 1; } }
@keyframes sig-pulse { 0%, 100% { transform: scale(1); opacity: 1; } 50% { transform: scale(1.05); opacity: 0.8; } }
@keyframes sig-cross-dissolve { 0% { opacity: 0; } 25% { opacity: 0.3; } 50% { opacity: 0.7; } 75% { opacity: 0.9; } 100% { opacity: 1; } }
@keyframes sig-zoom-in { from { transform: scale(0.6); opacity: 0; } to { transform: scale(1); opacity: 1; } }
@keyframes sig-block-reveal { from { clip-path: inset(0 100% 0 0); } to { clip-path: inset(0 0 0 0); } }
@keyframes sig-test-sweep { 0%, 100% { filter: brightness(1); } 50% { filter: brightness(1.35); } }
@keyframes sig-stick-on { 0% { transform: scale(1.4) rotate(-8deg); opacity: 0; } 60% { transform: scale(0.92) rotate(0deg); opacity: 1; } 80% { transform: scale(1.04); } 100% { transform: scale(1); } }
.sig-anim-fade-in { animation: sig-fade-in 2.4s ease-out infinite; }
.sig-anim-pulse { animation: sig-pulse 2.4s ease-in-out infinite; }
.sig-anim-cross-dissolve { animation: sig-cross-dissolve 2.4s linear infinite; }
.sig-anim-zoom-in { animation: sig-zoom-in 2.4s ease-out infinite; }
.sig-anim-block-reveal { animation: sig-block-reveal 2.4s ease-in-out infinite; }
.sig-anim-test-sweep { animation: sig-test-sweep 2.4s linear infinite; }
.sig-anim-stick-on { animation: sig-stick-on 2.4s ease-out infinite; }
";

/// Wrap a layout body in a standalone document.
pub(crate) fn document(layout_css: &str, body: &str, mode: RenderMode) -> String {
    let keyframes = match mode {
        RenderMode::Preview => PREVIEW_KEYFRAMES,
        RenderMode::Export => "",
    };
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\" /><title>Email signature</title>\
         <style>\n{BASE_CSS}{layout_css}{keyframes}</style></head><body>\n{body}\n</body></html>\n"
    )
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Marker attributes for an animatable container.
pub(crate) fn marker(ctx: &LayoutContext<'_>, element: AnimatedElement) -> String {
    let animation = ctx.animations.get(element);
    let mut attrs = format!(" {ELEMENT_MARKER}=\"{}\"", element.key());
    if animation.is_active() {
        attrs.push_str(&format!(" {ANIMATION_MARKER}=\"{}\"", animation.name()));
    }
    attrs
}

/// Extra classes that hook the preview keyframes; empty for export.
pub(crate) fn anim_class(ctx: &LayoutContext<'_>, element: AnimatedElement) -> String {
    let animation = ctx.animations.get(element);
    if ctx.mode == RenderMode::Preview && animation.is_active() {
        format!(" {ANIMATION_CLASS_PREFIX} {ANIMATION_CLASS_PREFIX}-{}", animation.name())
    } else {
        String::new()
    }
}

/// `transform` declaration for a non-identity position.
pub(crate) fn transform(position: &Position) -> Option<String> {
    position.transform().map(|t| format!("transform: {t}"))
}

/// ` style="..."` from the present declarations, or nothing.
pub(crate) fn style_attr<I>(declarations: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    let joined = declarations
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("; ");
    if joined.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_attr(&joined))
    }
}

pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

pub(crate) fn website_href(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url.trim_start_matches('/'))
    }
}

pub(crate) fn website_label(url: &str) -> &str {
    let trimmed = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    trimmed.trim_end_matches('/')
}

fn tel_href(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    format!("tel:{digits}")
}

/// Static icon for `platform` under the configured icon base.
pub fn icon_url(base: &str, variant: &str, platform: SocialPlatform) -> String {
    format!(
        "{}/{variant}/{}.png",
        base.trim_end_matches('/'),
        platform.name()
    )
}

// ---------------------------------------------------------------------------
// Text blocks
// ---------------------------------------------------------------------------

pub(crate) fn name_line(ctx: &LayoutContext<'_>) -> String {
    let Some(name) = non_blank(&ctx.info.name) else {
        return String::new();
    };
    format!(
        "<div class=\"sig-name\"{}>{}</div>",
        style_attr([transform(&ctx.positions.name)]),
        escape_text(name)
    )
}

pub(crate) fn title_line(ctx: &LayoutContext<'_>) -> String {
    match non_blank(&ctx.info.title) {
        Some(title) => format!(
            "<div class=\"sig-title\">{}</div>",
            escape_text(title)
        ),
        None => String::new(),
    }
}

/// Company name, or the layout placeholder when blank.
pub(crate) fn company_line(ctx: &LayoutContext<'_>, geometry: &Geometry) -> String {
    let style = style_attr([transform(&ctx.positions.company)]);
    match non_blank(&ctx.info.company) {
        Some(company) => format!(
            "<div class=\"sig-company\"{style}>{}</div>",
            escape_text(company)
        ),
        None => format!(
            "<div class=\"sig-company sig-placeholder\"{style}>{}\
             <span class=\"sig-placeholder-sub\">{}</span></div>",
            escape_text(geometry.placeholder.title),
            escape_text(geometry.placeholder.subtitle)
        ),
    }
}

/// Phone, email and website rows. Absent fields produce no row; no
/// fields at all produce no table.
pub(crate) fn contact_block(ctx: &LayoutContext<'_>) -> Option<String> {
    let mut rows = Vec::new();
    let row = |label: &str, href: String, text: &str| {
        format!(
            "<tr><td class=\"sig-contact-label\">{}</td>\
             <td class=\"sig-contact-value\"><a class=\"sig-link\" href=\"{}\">{}</a></td></tr>",
            escape_text(label),
            escape_attr(&href),
            escape_text(text)
        )
    };

    if let Some(phone) = ctx.info.phone.as_deref().and_then(non_blank) {
        rows.push(row("T", tel_href(phone), phone));
    }
    if let Some(email) = non_blank(&ctx.info.email) {
        rows.push(row("E", format!("mailto:{email}"), email));
    }
    if let Some(website) = ctx.info.website.as_deref().and_then(non_blank) {
        rows.push(row("W", website_href(website), website_label(website)));
    }
    if rows.is_empty() {
        return None;
    }

    Some(format!(
        "<table class=\"sig-contact\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"{}>{}</table>",
        style_attr([transform(&ctx.positions.contact)]),
        rows.concat()
    ))
}

// ---------------------------------------------------------------------------
// Animatable elements
// ---------------------------------------------------------------------------

/// One linked icon cell for the social cluster.
pub(crate) fn social_cell(
    geometry: &Geometry,
    platform: SocialPlatform,
    href: &str,
    img_src: &str,
    is_last: bool,
) -> String {
    let gap = if is_last { 0 } else { geometry.icon_gap };
    let padding = if geometry.social_vertical {
        format!("padding: 0 0 {gap}px 0")
    } else {
        format!("padding: 0 {gap}px 0 0")
    };
    let size = geometry.icon_size;
    format!(
        "<td class=\"sig-social-cell\" style=\"{padding}\">\
         <a class=\"sig-social-link\" href=\"{}\" target=\"_blank\" {PLATFORM_MARKER}=\"{}\">\
         <img class=\"sig-social-icon\" src=\"{}\" alt=\"{}\" width=\"{size}\" height=\"{size}\" border=\"0\" \
         style=\"width: {size}px; height: {size}px\" /></a></td>",
        escape_attr(href),
        platform.name(),
        escape_attr(img_src),
        escape_attr(platform.label())
    )
}

/// Arrange cells into rows following the layout orientation.
pub(crate) fn social_rows(geometry: &Geometry, cells: &[String]) -> String {
    if geometry.social_vertical {
        cells.iter().map(|cell| format!("<tr>{cell}</tr>")).collect()
    } else {
        format!("<tr>{}</tr>", cells.concat())
    }
}

/// The social icon cluster, in the layout's platform order. `None` when
/// no platform has a URL.
pub(crate) fn social_cluster(ctx: &LayoutContext<'_>, geometry: &Geometry) -> Option<String> {
    let present = ctx.social.present_in(&geometry.social_order);
    if present.is_empty() {
        return None;
    }

    let cells: Vec<String> = present
        .iter()
        .enumerate()
        .map(|(idx, (platform, url))| {
            let src = icon_url(ctx.icon_base_url, geometry.icon_variant, *platform);
            social_cell(geometry, *platform, &website_href(url), &src, idx + 1 == present.len())
        })
        .collect();

    Some(format!(
        "<table class=\"sig-social{}\"{} cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"{}>{}</table>",
        anim_class(ctx, AnimatedElement::SocialIcons),
        marker(ctx, AnimatedElement::SocialIcons),
        style_attr([transform(&ctx.positions.social)]),
        social_rows(geometry, &cells)
    ))
}

/// Sized headshot `<img>`, shaped per layout. `None` without an image.
pub(crate) fn headshot_img(ctx: &LayoutContext<'_>, geometry: &Geometry, class: &str) -> Option<String> {
    let src = ctx.images.headshot.as_deref()?;
    let px = geometry.headshot_px(ctx.images.headshot_size);
    let alt = non_blank(&ctx.info.name).unwrap_or("Headshot");
    Some(format!(
        "<img class=\"{class}\" src=\"{}\" alt=\"{}\" width=\"{px}\" height=\"{px}\" border=\"0\"{} />",
        escape_attr(src),
        escape_attr(alt),
        style_attr([
            Some(format!("width: {px}px; height: {px}px")),
            Some(geometry.headshot_shape.css().to_string()),
            transform(&ctx.positions.headshot),
        ])
    ))
}

/// Logo `<img>`, linked to the website when one is set.
pub(crate) fn logo_img(ctx: &LayoutContext<'_>, geometry: &Geometry, class: &str) -> Option<String> {
    let src = ctx.images.logo.as_deref()?;
    let px = geometry.logo_px(ctx.images.logo_size);
    let alt = non_blank(&ctx.info.company).unwrap_or("Logo");
    let img = format!(
        "<img class=\"{class}\" src=\"{}\" alt=\"{}\" height=\"{px}\" border=\"0\"{} />",
        escape_attr(src),
        escape_attr(alt),
        style_attr([
            Some(format!(
                "height: {px}px; width: auto; max-width: {}px",
                geometry.logo_max_width
            )),
            transform(&ctx.positions.logo),
        ])
    );
    Some(match ctx.info.website.as_deref().and_then(non_blank) {
        Some(website) => format!(
            "<a href=\"{}\" target=\"_blank\">{img}</a>",
            escape_attr(&website_href(website))
        ),
        None => img,
    })
}

/// Percent-encode the characters that would end a quoted CSS `url()`.
pub(crate) fn css_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '\'' => out.push_str("%27"),
            '"' => out.push_str("%22"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '\\' => out.push_str("%5C"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Background declarations for layouts that honour a background image.
/// The overlay colour is laid over the image at `1 - opacity`.
pub(crate) fn background_style(ctx: &LayoutContext<'_>, overlay: (u8, u8, u8)) -> Option<String> {
    let url = css_url(ctx.images.background.as_deref()?);
    let alpha = 1.0 - ctx.images.background_opacity as f32 / 100.0;
    let (r, g, b) = overlay;
    Some(format!(
        "background-image: linear-gradient(rgba({r}, {g}, {b}, {alpha:.2}), rgba({r}, {g}, {b}, {alpha:.2})), url('{url}'); \
         background-size: cover; background-position: center"
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sigcraft_core::images::ResolvedImages;
    use sigcraft_core::signature::{NewSignature, Signature};

    use super::*;

    #[test]
    fn css_url_encodes_delimiters() {
        assert_eq!(
            css_url("https://cdn.example.com/o'brien(1).png"),
            "https://cdn.example.com/o%27brien%281%29.png"
        );
        assert_eq!(css_url("https://cdn.example.com/a\\b\"c.png"), "https://cdn.example.com/a%5Cb%22c.png");
        assert_eq!(css_url("https://cdn.example.com/plain.png"), "https://cdn.example.com/plain.png");
    }

    #[test]
    fn background_url_cannot_close_the_declaration() {
        let signature = Signature::new(uuid::Uuid::nil(), NewSignature::default(), Utc::now());
        let images = ResolvedImages {
            headshot: None,
            logo: None,
            background: Some("https://cdn.example.com/x');color:red;('.png".into()),
            headshot_size: 100,
            logo_size: 100,
            background_opacity: 40,
        };
        let ctx = LayoutContext::new(&signature, &images, "https://icons.example.com", RenderMode::Export);

        let style = background_style(&ctx, (255, 255, 255)).unwrap();
        assert!(style.contains("url('https://cdn.example.com/x%27%29;color:red;%28%27.png')"), "{style}");
        assert!(style.contains("rgba(255, 255, 255, 0.60)"));
    }

    #[test]
    fn identity_position_has_no_transform() {
        assert_eq!(transform(&Position::default()), None);
        let moved = Position { x: 4.0, y: -2.0, scale: 1.5 };
        assert_eq!(transform(&moved).as_deref(), Some("transform: translate(4px, -2px) scale(1.5)"));
    }
}
