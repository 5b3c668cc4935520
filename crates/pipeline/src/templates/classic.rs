//! The default layout used by `professional` and `creative`: headshot on
//! the left, details on the right.

use sigcraft_core::signature::AnimatedElement;

use super::parts::{
    anim_class, background_style, company_line, contact_block, headshot_img, logo_img, marker,
    name_line, social_cluster, style_attr, title_line,
};
use super::{Geometry, HeadshotShape, LayoutContext, Palette, Placeholder, DEFAULT_SOCIAL_ORDER};

pub(super) const GEOMETRY: Geometry = Geometry {
    headshot_base: 80,
    logo_base: 48,
    logo_max_width: 160,
    headshot_shape: HeadshotShape::Circle,
    headshot_glow: false,
    icon_size: 20,
    icon_gap: 6,
    social_vertical: false,
    social_order: DEFAULT_SOCIAL_ORDER,
    icon_variant: "color",
    placeholder: Placeholder {
        title: "COMPANY",
        subtitle: "Company name",
    },
    palette: Palette {
        background: "#ffffff",
        text: "#1f2937",
        muted: "#6b7280",
        accent: "#2563eb",
        divider: "#e5e7eb",
    },
    headshot_backdrop: "#ffffff",
    logo_backdrop: "#ffffff",
    social_backdrop: "#ffffff",
};

pub(super) const CSS: &str = "\
.sig-classic { background-color: #ffffff; color: #1f2937; }
.sig-classic-headshot { padding: 4px 16px 4px 0; border-right: 2px solid #2563eb; }
.sig-classic-details { padding: 4px 0 4px 16px; }
.sig-classic .sig-name { color: #1f2937; }
.sig-classic .sig-title { color: #6b7280; }
.sig-classic .sig-company { color: #2563eb; }
.sig-classic .sig-contact-label { color: #2563eb; }
.sig-classic .sig-link { color: #1f2937; }
.sig-classic-social { padding-top: 8px; }
.sig-classic-logo { padding-top: 10px; }
";

pub(super) fn body(ctx: &LayoutContext<'_>, geometry: &Geometry) -> String {
    let mut row = String::new();

    if let Some(headshot) = headshot_img(ctx, geometry, "sig-headshot") {
        let px = geometry.headshot_px(ctx.images.headshot_size);
        row.push_str(&format!(
            "<td class=\"sig-classic-headshot{}\" width=\"{px}\"{}>{headshot}</td>",
            anim_class(ctx, AnimatedElement::Headshot),
            marker(ctx, AnimatedElement::Headshot)
        ));
    }

    row.push_str("<td class=\"sig-classic-details\">");
    row.push_str(&name_line(ctx));
    row.push_str(&title_line(ctx));
    row.push_str(&company_line(ctx, geometry));
    if let Some(contact) = contact_block(ctx) {
        row.push_str(&contact);
    }
    if let Some(social) = social_cluster(ctx, geometry) {
        row.push_str(&format!("<div class=\"sig-classic-social\">{social}</div>"));
    }
    if let Some(logo) = logo_img(ctx, geometry, "sig-logo") {
        row.push_str(&format!(
            "<div class=\"sig-classic-logo{}\"{}>{logo}</div>",
            anim_class(ctx, AnimatedElement::Logo),
            marker(ctx, AnimatedElement::Logo)
        ));
    }
    row.push_str("</td>");

    format!(
        "<table class=\"sig-root sig-classic\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"{}><tr>{row}</tr></table>",
        style_attr([background_style(ctx, (255, 255, 255))])
    )
}
