//! MJML documents per layout.
//!
//! Mirrors the HTML layouts column for column using the same
//! [`Geometry`](crate::templates::Geometry). Shapes MJML cannot express
//! (the angled sales portrait, the modern glow ring) degrade to plain
//! rectangles or circles. Anything MJML components cannot carry (element
//! transforms, height-sized logos) is emitted as `mj-raw` markup.

use sigcraft_core::signature::{Position, SocialPlatform};

use crate::html::{escape_attr, escape_text};
use crate::templates::parts::{
    icon_url, non_blank, social_cell, social_rows, style_attr, transform, website_href,
    website_label,
};
use crate::templates::{
    Geometry, HeadshotShape, Layout, LayoutContext, MINIMAL_WIDTH, SIDEBAR_WIDTH,
};

const FONT_NAME: &str = "Inter";
const FONT_HREF: &str = "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap";
const FONT_STACK: &str = "Inter, Arial, Helvetica, sans-serif";

fn body_width(layout: Layout) -> u32 {
    match layout {
        Layout::SalesProfessional => 560,
        Layout::Modern => 540,
        Layout::Minimal => MINIMAL_WIDTH,
        Layout::Default => 520,
    }
}

fn attr(name: &str, value: &str) -> String {
    format!(" {name}=\"{}\"", escape_attr(value))
}

fn text(content: &str, attrs: &[(&str, &str)]) -> String {
    let attrs: String = attrs.iter().map(|(k, v)| attr(k, v)).collect();
    format!("<mj-text{attrs}>{content}</mj-text>")
}

fn raw(content: &str) -> String {
    format!("<mj-raw>{content}</mj-raw>")
}

/// Wrap `content` in a transformed block when `position` is not the identity.
fn positioned(content: String, position: &Position) -> String {
    match transform(position) {
        Some(declaration) => format!("<div{}>{content}</div>", style_attr([Some(declaration)])),
        None => content,
    }
}

const TABLE_ATTRS: &str = "cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"";

fn details(ctx: &LayoutContext<'_>, geometry: &Geometry) -> String {
    let palette = &geometry.palette;
    let mut out = String::new();

    if let Some(name) = non_blank(&ctx.info.name) {
        out.push_str(&text(
            &positioned(escape_text(name), &ctx.positions.name),
            &[("font-size", "18px"), ("font-weight", "700"), ("color", palette.text)],
        ));
    }
    if let Some(title) = non_blank(&ctx.info.title) {
        out.push_str(&text(
            &escape_text(title),
            &[("color", palette.accent), ("padding", "2px 0 0 0")],
        ));
    }
    let company = match non_blank(&ctx.info.company) {
        Some(company) => escape_text(company),
        None => format!(
            "{}<br />{}",
            escape_text(geometry.placeholder.title),
            escape_text(geometry.placeholder.subtitle)
        ),
    };
    out.push_str(&text(
        &positioned(company, &ctx.positions.company),
        &[("font-weight", "600"), ("color", palette.muted), ("padding", "2px 0 8px 0")],
    ));

    if let Some(contact) = contact(ctx, geometry) {
        out.push_str(&text(&contact, &[("font-size", "12px")]));
    }
    out
}

/// Labelled phone, email and website rows, as in the HTML layouts.
fn contact(ctx: &LayoutContext<'_>, geometry: &Geometry) -> Option<String> {
    let palette = &geometry.palette;
    let row = |label: &str, href: String, value: &str| {
        format!(
            "<tr><td style=\"padding: 1px 6px 1px 0; font-weight: bold; color: {}\">{label}</td>\
             <td style=\"padding: 1px 0\"><a href=\"{}\" style=\"color: {}; text-decoration: none\">{}</a></td></tr>",
            palette.muted,
            escape_attr(&href),
            palette.text,
            escape_text(value)
        )
    };

    let mut rows = Vec::new();
    if let Some(phone) = ctx.info.phone.as_deref().and_then(non_blank) {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
        rows.push(row("T", format!("tel:{digits}"), phone));
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
        "<table {TABLE_ATTRS} style=\"border-collapse: collapse\"{}>{}</table>",
        style_attr([transform(&ctx.positions.contact)]),
        rows.concat()
    ))
}

fn social(ctx: &LayoutContext<'_>, geometry: &Geometry, vertical: bool) -> Option<String> {
    let present: Vec<(SocialPlatform, &str)> = ctx.social.present_in(&geometry.social_order);
    if present.is_empty() {
        return None;
    }
    if let Some(declaration) = transform(&ctx.positions.social) {
        return Some(positioned_social(ctx, geometry, &present, vertical, declaration));
    }
    let elements: String = present
        .iter()
        .map(|(platform, url)| {
            format!(
                "<mj-social-element{}{}{}{}></mj-social-element>",
                attr("name", platform.name()),
                attr("href", &website_href(url)),
                attr("src", &icon_url(ctx.icon_base_url, geometry.icon_variant, *platform)),
                attr("alt", platform.label())
            )
        })
        .collect();
    Some(format!(
        "<mj-social{}{}{}{}{}>{elements}</mj-social>",
        attr("mode", if vertical { "vertical" } else { "horizontal" }),
        attr("icon-size", &format!("{}px", geometry.icon_size)),
        attr("inner-padding", &format!("0 {}px {}px 0", geometry.icon_gap / 2, geometry.icon_gap / 2)),
        attr("align", if vertical { "center" } else { "left" }),
        attr("padding", if vertical { "14px 0" } else { "8px 0 0 0" })
    ))
}

/// The icon cluster as raw table markup, carrying the social transform.
fn positioned_social(
    ctx: &LayoutContext<'_>,
    geometry: &Geometry,
    present: &[(SocialPlatform, &str)],
    vertical: bool,
    declaration: String,
) -> String {
    let cells: Vec<String> = present
        .iter()
        .enumerate()
        .map(|(idx, (platform, url))| {
            let src = icon_url(ctx.icon_base_url, geometry.icon_variant, *platform);
            social_cell(geometry, *platform, &website_href(url), &src, idx + 1 == present.len())
        })
        .collect();
    let padding = if vertical { "padding: 14px 0" } else { "padding: 8px 0 0 0" };
    let align = if vertical { " align=\"center\"" } else { "" };
    raw(&format!(
        "<div style=\"{padding}\"><table {TABLE_ATTRS}{align}{}>{}</table></div>",
        style_attr([Some("border-collapse: collapse".to_string()), Some(declaration)]),
        social_rows(geometry, &cells)
    ))
}

fn headshot(ctx: &LayoutContext<'_>, geometry: &Geometry, centered: bool) -> Option<(u32, String)> {
    let src = ctx.images.headshot.as_deref()?;
    let px = geometry.headshot_px(ctx.images.headshot_size);
    let radius = match geometry.headshot_shape {
        HeadshotShape::Circle => "50%",
        HeadshotShape::RoundedSquare => "8px",
        HeadshotShape::Angled => "0",
    };
    let alt = non_blank(&ctx.info.name).unwrap_or("Headshot");
    if let Some(declaration) = transform(&ctx.positions.headshot) {
        let img = format!(
            "<img src=\"{}\" alt=\"{}\" width=\"{px}\" height=\"{px}\" border=\"0\"{} />",
            escape_attr(src),
            escape_attr(alt),
            style_attr([
                Some(format!("display: block; width: {px}px; height: {px}px; border-radius: {radius}")),
                centered.then(|| "margin: 0 auto".to_string()),
                Some(declaration),
            ])
        );
        return Some((px, raw(&img)));
    }
    Some((
        px,
        format!(
            "<mj-image{}{}{}{}{}{} />",
            attr("src", src),
            attr("alt", alt),
            attr("width", &format!("{px}px")),
            attr("height", &format!("{px}px")),
            attr("border-radius", radius),
            attr("padding", "0")
        ),
    ))
}

/// Logo sized by height like the HTML layouts. `mj-image` always fixes
/// the width, so the logo is raw markup.
fn logo(ctx: &LayoutContext<'_>, geometry: &Geometry, centered: bool) -> Option<String> {
    let src = ctx.images.logo.as_deref()?;
    let px = geometry.logo_px(ctx.images.logo_size);
    let img = format!(
        "<img src=\"{}\" alt=\"{}\" height=\"{px}\" border=\"0\"{} />",
        escape_attr(src),
        escape_attr(non_blank(&ctx.info.company).unwrap_or("Logo")),
        style_attr([
            Some(format!(
                "display: block; height: {px}px; width: auto; max-width: {}px",
                geometry.logo_max_width
            )),
            centered.then(|| "margin: 0 auto".to_string()),
            transform(&ctx.positions.logo),
        ])
    );
    let linked = match ctx.info.website.as_deref().and_then(non_blank) {
        Some(website) => format!(
            "<a href=\"{}\" target=\"_blank\">{img}</a>",
            escape_attr(&website_href(website))
        ),
        None => img,
    };
    Some(raw(&format!("<div style=\"padding-top: 10px\">{linked}</div>")))
}

fn column(width: Option<u32>, attrs: &[(&str, &str)], content: &str) -> String {
    let width = width.map(|w| attr("width", &format!("{w}px"))).unwrap_or_default();
    let attrs: String = attrs.iter().map(|(k, v)| attr(k, v)).collect();
    format!("<mj-column{width}{attrs}>{content}</mj-column>")
}

fn section(ctx: &LayoutContext<'_>, layout: Layout, geometry: &Geometry) -> String {
    let palette = &geometry.palette;
    let mut columns = String::new();

    match layout {
        Layout::SalesProfessional => {
            if let Some(icons) = social(ctx, geometry, true) {
                columns.push_str(&column(
                    Some(SIDEBAR_WIDTH),
                    &[("background-color", geometry.social_backdrop)],
                    &icons,
                ));
            }
            let mut main = logo(ctx, geometry, false).unwrap_or_default();
            main.push_str(&details(ctx, geometry));
            columns.push_str(&column(None, &[("padding", "16px 20px")], &main));
            if let Some((px, image)) = headshot(ctx, geometry, false) {
                columns.push_str(&column(Some(px), &[], &image));
            }
        }
        Layout::Modern | Layout::Default => {
            if let Some((px, image)) = headshot(ctx, geometry, false) {
                let padding = if layout == Layout::Modern { 20 } else { 16 };
                let padding_attr = format!("{padding}px");
                columns.push_str(&column(
                    Some(px + padding * 2),
                    &[("padding", padding_attr.as_str())],
                    &image,
                ));
            }
            let mut main = details(ctx, geometry);
            if let Some(icons) = social(ctx, geometry, false) {
                main.push_str(&icons);
            }
            if let Some(logo) = logo(ctx, geometry, false) {
                main.push_str(&logo);
            }
            columns.push_str(&column(None, &[("padding", "16px 16px 16px 0")], &main));
        }
        Layout::Minimal => {
            let mut main = details(ctx, geometry);
            if let Some(icons) = social(ctx, geometry, false) {
                main.push_str(&icons);
            }
            columns.push_str(&column(None, &[("width", "60%"), ("padding", "12px 16px 12px 0")], &main));

            let mut brand = headshot(ctx, geometry, true)
                .map(|(_, image)| image)
                .unwrap_or_default();
            match logo(ctx, geometry, true) {
                Some(logo) => brand.push_str(&logo),
                None => brand.push_str(&text(
                    &format!(
                        "<span style=\"font-size: 22px; font-weight: 700; letter-spacing: 6px\">{}</span><br />\
                         <span style=\"font-size: 10px; letter-spacing: 4px; color: {}\">{}</span>",
                        escape_text(geometry.placeholder.title),
                        palette.muted,
                        escape_text(geometry.placeholder.subtitle)
                    ),
                    &[("align", "center"), ("color", palette.text), ("padding", "10px 0")],
                )),
            }
            let border = format!("1px solid {}", palette.divider);
            columns.push_str(&column(
                None,
                &[
                    ("width", "40%"),
                    ("padding", "12px 0 12px 16px"),
                    ("border-left", border.as_str()),
                ],
                &brand,
            ));
        }
    }

    format!(
        "<mj-section{}{}>{columns}</mj-section>",
        attr("padding", "0"),
        attr("background-color", palette.background)
    )
}

/// Build the MJML source for `layout`.
pub fn build_mjml(layout: Layout, ctx: &LayoutContext<'_>) -> String {
    let geometry = layout.geometry();
    let width = body_width(layout);
    format!(
        "<mjml>\n  <mj-head>\n    <mj-title>Email signature</mj-title>\n    <mj-font{}{} />\n    \
         <mj-attributes>\n      <mj-all{} />\n      <mj-text{}{}{}{} />\n      <mj-image{} />\n    \
         </mj-attributes>\n  </mj-head>\n  <mj-body{}>\n    {}\n  </mj-body>\n</mjml>\n",
        attr("name", FONT_NAME),
        attr("href", FONT_HREF),
        attr("font-family", FONT_STACK),
        attr("font-size", "13px"),
        attr("line-height", "1.5"),
        attr("color", geometry.palette.text),
        attr("padding", "0"),
        attr("padding", "0"),
        attr("width", &format!("{width}px")),
        section(ctx, layout, geometry)
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sigcraft_core::images::ResolvedImages;
    use sigcraft_core::signature::{NewSignature, PersonalInfo, Signature};

    use super::*;
    use crate::templates::RenderMode;

    fn signature() -> Signature {
        let input = NewSignature {
            personal_info: PersonalInfo {
                name: "Ada Lovelace".into(),
                title: "Analyst".into(),
                company: "Engines Ltd".into(),
                email: "ada@example.com".into(),
                phone: Some("+44 20 0000".into()),
                website: Some("example.com".into()),
            },
            ..NewSignature::default()
        };
        Signature::new(uuid::Uuid::nil(), input, Utc::now())
    }

    fn images() -> ResolvedImages {
        ResolvedImages {
            headshot: Some("https://cdn.example.com/me.png".into()),
            logo: Some("https://cdn.example.com/logo.png".into()),
            background: None,
            headshot_size: 100,
            logo_size: 100,
            background_opacity: 20,
        }
    }

    fn build(layout: Layout, signature: &Signature) -> String {
        let images = images();
        let ctx = LayoutContext::new(signature, &images, "https://icons.example.com", RenderMode::Export);
        build_mjml(layout, &ctx)
    }

    #[test]
    fn identity_positions_emit_no_transform() {
        let signature = signature();
        for layout in [Layout::SalesProfessional, Layout::Modern, Layout::Minimal, Layout::Default] {
            assert!(!build(layout, &signature).contains("translate("), "{layout:?}");
        }
    }

    #[test]
    fn every_position_is_carried() {
        let mut signature = signature();
        let moved = Position { x: 4.0, y: -2.0, scale: 1.5 };
        let positions = &mut signature.element_positions;
        positions.name = moved;
        positions.company = moved;
        positions.contact = moved;
        positions.headshot = moved;
        positions.logo = moved;
        positions.social = moved;
        signature.social_media.linkedin = Some("https://linkedin.com/in/ada".into());

        let mjml = build(Layout::Modern, &signature);
        assert_eq!(mjml.matches("transform: translate(4px, -2px) scale(1.5)").count(), 6, "{mjml}");
        assert!(!mjml.contains("<mj-social"));
    }

    #[test]
    fn logo_is_sized_by_height() {
        let signature = signature();
        let mjml = build(Layout::Default, &signature);
        let px = Layout::Default.geometry().logo_px(100);
        assert!(mjml.contains(&format!("height=\"{px}\"")), "{mjml}");
        assert!(mjml.contains(&format!("height: {px}px; width: auto")));
    }

    #[test]
    fn contact_rows_carry_labels() {
        let mjml = build(Layout::Minimal, &signature());
        for label in ["T", "E", "W"] {
            assert!(mjml.contains(&format!(">{label}</td>")), "{label}");
        }
        assert!(mjml.contains("href=\"tel:+44200000\""));
        assert!(mjml.contains("href=\"mailto:ada@example.com\""));
    }
}
