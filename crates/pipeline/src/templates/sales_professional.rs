//! Sales-professional: dark social sidebar, details column, angled
//! portrait on the right.

use sigcraft_core::signature::{AnimatedElement, SocialPlatform};

use super::parts::{
    anim_class, company_line, contact_block, headshot_img, logo_img, marker, name_line,
    social_cluster, title_line,
};
use super::{Geometry, HeadshotShape, LayoutContext, Palette, Placeholder};

/// Width of the social sidebar column.
pub const SIDEBAR_WIDTH: u32 = 48;

pub(super) const GEOMETRY: Geometry = Geometry {
    headshot_base: 140,
    logo_base: 56,
    logo_max_width: 180,
    headshot_shape: HeadshotShape::Angled,
    headshot_glow: false,
    icon_size: 22,
    icon_gap: 10,
    social_vertical: true,
    social_order: [
        SocialPlatform::Twitter,
        SocialPlatform::Linkedin,
        SocialPlatform::Instagram,
        SocialPlatform::Youtube,
        SocialPlatform::Tiktok,
    ],
    icon_variant: "light",
    placeholder: Placeholder {
        title: "COMPANY",
        subtitle: "Your company",
    },
    palette: Palette {
        background: "#ffffff",
        text: "#111827",
        muted: "#6b7280",
        accent: "#f97316",
        divider: "#e5e7eb",
    },
    headshot_backdrop: "#ffffff",
    logo_backdrop: "#ffffff",
    social_backdrop: "#1e293b",
};

pub(super) const CSS: &str = "\
.sig-sales { background-color: #ffffff; }
.sig-sales-sidebar { background-color: #1e293b; padding: 14px 0; text-align: center; }
.sig-sales-sidebar .sig-social { margin: 0 auto; }
.sig-sales-main { padding: 16px 20px; color: #111827; }
.sig-sales .sig-name { color: #111827; }
.sig-sales .sig-title { color: #f97316; font-size: 11px; letter-spacing: 1px; text-transform: uppercase; }
.sig-sales .sig-company { color: #1e293b; }
.sig-sales-rule { width: 40px; height: 3px; background-color: #f97316; margin: 0 0 8px 0; font-size: 1px; line-height: 3px; }
.sig-sales .sig-contact-label { color: #f97316; }
.sig-sales .sig-link { color: #374151; }
.sig-sales-logo { margin: 0 0 10px 0; }
";

pub(super) fn body(ctx: &LayoutContext<'_>, geometry: &Geometry) -> String {
    let mut row = String::new();

    if let Some(social) = social_cluster(ctx, geometry) {
        row.push_str(&format!(
            "<td class=\"sig-sales-sidebar\" width=\"{SIDEBAR_WIDTH}\" align=\"center\">{social}</td>"
        ));
    }

    row.push_str("<td class=\"sig-sales-main\">");
    if let Some(logo) = logo_img(ctx, geometry, "sig-logo") {
        row.push_str(&format!(
            "<div class=\"sig-sales-logo{}\"{}>{logo}</div>",
            anim_class(ctx, AnimatedElement::Logo),
            marker(ctx, AnimatedElement::Logo)
        ));
    }
    row.push_str(&name_line(ctx));
    row.push_str(&title_line(ctx));
    row.push_str(&company_line(ctx, geometry));
    row.push_str("<div class=\"sig-sales-rule\"></div>");
    if let Some(contact) = contact_block(ctx) {
        row.push_str(&contact);
    }
    row.push_str("</td>");

    if let Some(headshot) = headshot_img(ctx, geometry, "sig-headshot") {
        let px = geometry.headshot_px(ctx.images.headshot_size);
        row.push_str(&format!(
            "<td class=\"sig-sales-headshot{}\" width=\"{px}\"{}>{headshot}</td>",
            anim_class(ctx, AnimatedElement::Headshot),
            marker(ctx, AnimatedElement::Headshot)
        ));
    }

    format!(
        "<table class=\"sig-root sig-sales\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"><tr>{row}</tr></table>"
    )
}
