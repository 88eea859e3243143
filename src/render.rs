//! Template Renderer
//!
//! `(TemplateDescriptor, Theme, RenderId) -> VectorDocument`. Pure and
//! infallible. Theme values are inserted as opaque strings.

use tracing::debug;

use crate::document::{Element, VectorDocument, SVG_NAMESPACE};
use crate::ids::RenderId;
use crate::templates::{TemplateDescriptor, TemplateId, BANNER_SAFE_AREA};
use crate::theme::Theme;

const FONT_FAMILY: &str = "Vazirmatn, sans-serif";
const GUIDE_COLOR: &str = "#ffd166";
const GUIDE_CAPTION: &str = "Safe area visible on every device";

/// Render with an explicitly supplied id.
pub fn render(template: &TemplateDescriptor, theme: &Theme, id: RenderId) -> VectorDocument {
    let gradient_id = id.gradient_id(template.resource_suffix);
    let mut resource_ids = vec![gradient_id.clone()];

    let [w, h] = template.canvas_size;
    let root = Element::new("svg")
        .attr("xmlns", SVG_NAMESPACE)
        .attr("viewBox", format!("0 0 {} {}", w, h));

    let root = match template.id {
        TemplateId::Profile => {
            let glow_id = id.filter_id("glow");
            resource_ids.push(glow_id.clone());
            profile(root, theme, &gradient_id, &glow_id)
        }
        TemplateId::Banner => banner(root, template, theme, &gradient_id),
        TemplateId::Watermark => watermark(root, theme, &gradient_id),
    };

    debug!(template = %template.id, render_id = %id, "rendered template");
    VectorDocument::new(template.id, template.canvas_size, id, resource_ids, root)
}

/// Render with a freshly issued id.
pub fn render_fresh(template: &TemplateDescriptor, theme: &Theme) -> VectorDocument {
    render(template, theme, RenderId::new())
}

fn gradient(id: &str, theme: &Theme) -> Element {
    let [start, end] = theme.gradient_stops();
    Element::new("linearGradient")
        .attr("id", id)
        .attr("x1", 0)
        .attr("y1", 0)
        .attr("x2", 1)
        .attr("y2", 1)
        .child(Element::new("stop").attr("offset", "0%").attr("stop-color", start))
        .child(Element::new("stop").attr("offset", "100%").attr("stop-color", end))
}

fn text(x: impl std::fmt::Display, y: impl std::fmt::Display, fill: &str, weight: u32, size: u32, content: &str) -> Element {
    Element::new("text")
        .attr("x", x)
        .attr("y", y)
        .attr("text-anchor", "middle")
        .attr("fill", fill)
        .attr("font-family", FONT_FAMILY)
        .attr("font-weight", weight)
        .attr("font-size", size)
        .text(content)
}

fn url(id: &str) -> String {
    format!("url(#{})", id)
}

fn profile(root: Element, theme: &Theme, gradient_id: &str, glow_id: &str) -> Element {
    let glow = Element::new("filter")
        .attr("id", glow_id)
        .attr("x", "-50%")
        .attr("y", "-50%")
        .attr("width", "200%")
        .attr("height", "200%")
        .child(Element::new("feGaussianBlur").attr("stdDeviation", 18).attr("result", "b"))
        .child(
            Element::new("feMerge")
                .child(Element::new("feMergeNode").attr("in", "b"))
                .child(Element::new("feMergeNode").attr("in", "SourceGraphic")),
        );

    let ring = |r: u32, stroke: &str| {
        Element::new("circle")
            .attr("r", r)
            .attr("fill", "none")
            .attr("stroke", stroke)
            .attr("stroke-opacity", "0.25")
            .attr("stroke-width", 4)
    };

    root.child(Element::new("defs").child(gradient(gradient_id, theme)).child(glow))
        .child(
            Element::new("rect")
                .attr("width", 800)
                .attr("height", 800)
                .attr("rx", 64)
                .attr("fill", &theme.background_color),
        )
        .child(
            Element::new("g")
                .attr("transform", "translate(400,400)")
                .child(
                    Element::new("circle")
                        .attr("r", 220)
                        .attr("fill", url(gradient_id))
                        .attr("filter", url(glow_id))
                        .attr("opacity", "0.9"),
                )
                .child(ring(320, theme.secondary_color.as_str()))
                .child(ring(140, theme.primary_color.as_str())),
        )
        .child(
            Element::new("g")
                .attr("transform", "translate(400,470)")
                .child(text(0, 0, "#ffffff", 800, 56, &theme.title)),
        )
        .child(
            Element::new("g")
                .attr("transform", "translate(400,540)")
                .child(text(0, 0, "#cfd8e3", 400, 28, &theme.subtitle)),
        )
}

fn banner(root: Element, template: &TemplateDescriptor, theme: &Theme, gradient_id: &str) -> Element {
    let blob = |cx: i32, cy: i32, r: u32| {
        Element::new("circle")
            .attr("cx", cx)
            .attr("cy", cy)
            .attr("r", r)
            .attr("fill", url(gradient_id))
    };

    let root = root
        .child(Element::new("defs").child(gradient(gradient_id, theme)))
        .child(
            Element::new("rect")
                .attr("width", 2048)
                .attr("height", 1152)
                .attr("fill", &theme.background_color),
        )
        .child(
            Element::new("g")
                .attr("opacity", "0.20")
                .child(blob(1600, -80, 520))
                .child(blob(280, 400, 360)),
        )
        .child(
            Element::new("g").attr("opacity", "0.12").child(
                Element::new("path")
                    .attr("d", "M0 1020 C 300 960, 420 1120, 780 1070 S 1320 980, 2048 1080 L 2048 1152 L 0 1152 Z")
                    .attr("fill", &theme.secondary_color),
            ),
        )
        .child(
            Element::new("g")
                .attr("opacity", "0.9")
                .child(text(1024, 560, "#fff", 800, 96, &theme.title))
                .child(text(1024, 640, "#e6e9ef", 400, 40, &theme.subtitle)),
        );

    if theme.show_guides && template.supports_guides {
        root.child(guide_overlay(template.canvas_size))
    } else {
        root
    }
}

/// Dashed safe-area rectangle centered on the canvas, with a caption above it.
fn guide_overlay(canvas: [u32; 2]) -> Element {
    let [safe_w, safe_h] = BANNER_SAFE_AREA;
    let x = (canvas[0] as f64 - safe_w as f64) / 2.0;
    let y = (canvas[1] as f64 - safe_h as f64) / 2.0;

    Element::new("g")
        .attr("data-guide", "true")
        .child(
            Element::new("rect")
                .attr("x", x)
                .attr("y", y)
                .attr("width", safe_w)
                .attr("height", safe_h)
                .attr("fill", "none")
                .attr("stroke", GUIDE_COLOR)
                .attr("stroke-dasharray", "10,10")
                .attr("stroke-width", 3),
        )
        .child(
            Element::new("text")
                .attr("x", canvas[0] as f64 / 2.0)
                .attr("y", y - 16.0)
                .attr("text-anchor", "middle")
                .attr("fill", GUIDE_COLOR)
                .attr("font-size", 24)
                .text(GUIDE_CAPTION),
        )
}

fn watermark(root: Element, theme: &Theme, gradient_id: &str) -> Element {
    root.child(Element::new("defs").child(gradient(gradient_id, theme)))
        .child(
            Element::new("rect")
                .attr("width", 300)
                .attr("height", 300)
                .attr("rx", 28)
                .attr("fill", "#000")
                .attr("fill-opacity", "0.0"),
        )
        .child(
            Element::new("g")
                .attr("transform", "translate(150,150)")
                .child(
                    Element::new("circle")
                        .attr("r", 90)
                        .attr("fill", url(gradient_id))
                        .attr("opacity", "0.95"),
                )
                .child(text(0, 10, "#ffffff", 900, 44, &theme.monogram())),
        )
}
