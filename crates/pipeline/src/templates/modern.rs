//! Modern: dark gradient card with a glowing circular portrait.

use sigcraft_core::signature::AnimatedElement;

use super::parts::{
    anim_class, background_style, company_line, contact_block, headshot_img, logo_img, marker,
    name_line, social_cluster, style_attr, title_line,
};
use super::{Geometry, HeadshotShape, LayoutContext, Palette, Placeholder, DEFAULT_SOCIAL_ORDER};

/// Padding around the portrait, leaving room for the ring.
const PORTRAIT_PADDING: u32 = 20;

pub(super) const GEOMETRY: Geometry = Geometry {
    headshot_base: 110,
    logo_base: 44,
    logo_max_width: 160,
    headshot_shape: HeadshotShape::Circle,
    headshot_glow: true,
    icon_size: 20,
    icon_gap: 8,
    social_vertical: false,
    social_order: DEFAULT_SOCIAL_ORDER,
    icon_variant: "light",
    placeholder: Placeholder {
        title: "TECHSPACE",
        subtitle: "Innovation Hub",
    },
    palette: Palette {
        background: "#0f172a",
        text: "#f8fafc",
        muted: "#94a3b8",
        accent: "#22d3ee",
        divider: "#334155",
    },
    headshot_backdrop: "#0f172a",
    logo_backdrop: "#131a3a",
    social_backdrop: "#131a3a",
};

pub(super) const CSS: &str = "\
.sig-modern { background-color: #0f172a; background-image: linear-gradient(135deg, #0f172a 0%, #1e1b4b 100%); color: #f8fafc; }
.sig-modern-portrait { padding: 20px; }
.sig-modern-frame { position: relative; }
.sig-modern-ring { position: absolute; top: -6px; left: -6px; right: -6px; bottom: -6px; border: 2px solid #22d3ee; border-radius: 50%; opacity: 0.6; }
.sig-modern-headshot { box-shadow: 0 0 18px rgba(34, 211, 238, 0.55); }
.sig-modern-details { position: relative; padding: 20px 24px 20px 4px; }
.sig-modern-orb { position: absolute; top: 0; right: 0; width: 64px; height: 64px; border-radius: 50%; background-color: #22d3ee; opacity: 0.12; }
.sig-modern .sig-name { color: #f8fafc; }
.sig-modern .sig-title { color: #22d3ee; }
.sig-modern .sig-company { color: #cbd5e1; }
.sig-modern .sig-contact-label { color: #22d3ee; }
.sig-modern .sig-link { color: #e2e8f0; }
.sig-modern-social { padding-top: 10px; }
.sig-modern-logo { padding-top: 12px; }
";

pub(super) fn body(ctx: &LayoutContext<'_>, geometry: &Geometry) -> String {
    let mut row = String::new();

    if let Some(headshot) = headshot_img(ctx, geometry, "sig-modern-headshot") {
        let px = geometry.headshot_px(ctx.images.headshot_size);
        row.push_str(&format!(
            "<td class=\"sig-modern-portrait\" width=\"{}\">\
             <div class=\"sig-modern-frame{}\"{} style=\"width: {px}px; height: {px}px\">\
             <div class=\"sig-modern-ring\"></div>{headshot}</div></td>",
            px + PORTRAIT_PADDING * 2,
            anim_class(ctx, AnimatedElement::Headshot),
            marker(ctx, AnimatedElement::Headshot)
        ));
    }

    row.push_str("<td class=\"sig-modern-details\"><div class=\"sig-modern-orb\"></div>");
    row.push_str(&name_line(ctx));
    row.push_str(&title_line(ctx));
    row.push_str(&company_line(ctx, geometry));
    if let Some(contact) = contact_block(ctx) {
        row.push_str(&contact);
    }
    if let Some(social) = social_cluster(ctx, geometry) {
        row.push_str(&format!("<div class=\"sig-modern-social\">{social}</div>"));
    }
    if let Some(logo) = logo_img(ctx, geometry, "sig-logo") {
        row.push_str(&format!(
            "<div class=\"sig-modern-logo{}\"{}>{logo}</div>",
            anim_class(ctx, AnimatedElement::Logo),
            marker(ctx, AnimatedElement::Logo)
        ));
    }
    row.push_str("</td>");

    format!(
        "<table class=\"sig-root sig-modern\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"{}><tr>{row}</tr></table>",
        style_attr([background_style(ctx, (15, 23, 42))])
    )
}
