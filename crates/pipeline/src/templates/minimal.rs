//! Minimal: 60/40 split, details left and brand block right.

use sigcraft_core::signature::AnimatedElement;

use super::parts::{
    anim_class, company_line, contact_block, headshot_img, logo_img, marker, name_line,
    social_cluster, title_line,
};
use super::{Geometry, HeadshotShape, LayoutContext, Palette, Placeholder, DEFAULT_SOCIAL_ORDER};
use crate::html::escape_text;

pub const WIDTH: u32 = 480;
pub const DETAILS_WIDTH: u32 = WIDTH * 60 / 100;
pub const BRAND_WIDTH: u32 = WIDTH - DETAILS_WIDTH;

pub(super) const GEOMETRY: Geometry = Geometry {
    headshot_base: 64,
    logo_base: 40,
    logo_max_width: 150,
    headshot_shape: HeadshotShape::RoundedSquare,
    headshot_glow: false,
    icon_size: 18,
    icon_gap: 8,
    social_vertical: false,
    social_order: DEFAULT_SOCIAL_ORDER,
    icon_variant: "color",
    placeholder: Placeholder {
        title: "APEX",
        subtitle: "SOLUTIONS",
    },
    palette: Palette {
        background: "#ffffff",
        text: "#111827",
        muted: "#6b7280",
        accent: "#111827",
        divider: "#e5e7eb",
    },
    headshot_backdrop: "#ffffff",
    logo_backdrop: "#ffffff",
    social_backdrop: "#ffffff",
};

pub(super) const CSS: &str = "\
.sig-minimal { background-color: #ffffff; color: #111827; }
.sig-minimal-details { padding: 12px 16px 12px 0; }
.sig-minimal .sig-name { font-size: 17px; color: #111827; }
.sig-minimal .sig-title { color: #6b7280; }
.sig-minimal .sig-company { color: #111827; letter-spacing: 1px; }
.sig-minimal .sig-contact-label { color: #9ca3af; font-weight: normal; }
.sig-minimal .sig-link { color: #111827; }
.sig-minimal-social { padding-top: 8px; }
.sig-minimal-brand { padding: 12px 0 12px 16px; border-left: 1px solid #e5e7eb; text-align: center; }
.sig-minimal-headshot { margin: 0 auto 10px auto; }
.sig-minimal-wordmark { padding: 10px 0; }
.sig-minimal-wordmark-title { font-size: 22px; font-weight: bold; letter-spacing: 6px; color: #111827; }
.sig-minimal-wordmark-sub { font-size: 10px; letter-spacing: 4px; color: #6b7280; }
";

fn wordmark(geometry: &Geometry) -> String {
    format!(
        "<div class=\"sig-minimal-wordmark\"><div class=\"sig-minimal-wordmark-title\">{}</div>\
         <div class=\"sig-minimal-wordmark-sub\">{}</div></div>",
        escape_text(geometry.placeholder.title),
        escape_text(geometry.placeholder.subtitle)
    )
}

pub(super) fn body(ctx: &LayoutContext<'_>, geometry: &Geometry) -> String {
    let mut details = String::new();
    details.push_str(&name_line(ctx));
    details.push_str(&title_line(ctx));
    details.push_str(&company_line(ctx, geometry));
    if let Some(contact) = contact_block(ctx) {
        details.push_str(&contact);
    }
    if let Some(social) = social_cluster(ctx, geometry) {
        details.push_str(&format!("<div class=\"sig-minimal-social\">{social}</div>"));
    }

    let mut brand = String::new();
    if let Some(headshot) = headshot_img(ctx, geometry, "sig-headshot") {
        brand.push_str(&format!(
            "<div class=\"sig-minimal-headshot{}\"{}>{headshot}</div>",
            anim_class(ctx, AnimatedElement::Headshot),
            marker(ctx, AnimatedElement::Headshot)
        ));
    }
    match logo_img(ctx, geometry, "sig-logo") {
        Some(logo) => brand.push_str(&format!(
            "<div class=\"sig-minimal-logo{}\"{}>{logo}</div>",
            anim_class(ctx, AnimatedElement::Logo),
            marker(ctx, AnimatedElement::Logo)
        )),
        None => brand.push_str(&wordmark(geometry)),
    }

    format!(
        "<table class=\"sig-root sig-minimal\" width=\"{WIDTH}\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"><tr>\
         <td class=\"sig-minimal-details\" width=\"{DETAILS_WIDTH}\">{details}</td>\
         <td class=\"sig-minimal-brand\" width=\"{BRAND_WIDTH}\" align=\"center\">{brand}</td>\
         </tr></table>"
    )
}
