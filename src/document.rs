//! Vector Documents - Resolved SVG Scene Graph
//!
//! A document is built once by the renderer and is read-only afterwards.
//! Serialization always goes through quick-xml so text and attribute values
//! are escaped, whatever the user typed into the form.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;

use crate::error::ExportResult;
use crate::hashing::sha256_hex;
use crate::ids::RenderId;
use crate::templates::TemplateId;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attrs: vec![], children: vec![] }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.attrs.push((key.into(), value.to_string()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Depth-first walk over this element and its descendants.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        for node in &self.children {
            if let Node::Element(el) = node {
                out.extend(el.descendants());
            }
        }
        out
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>, extra: &[(&str, String)]) -> ExportResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attrs {
            start.push_attribute((k.as_str(), v.as_str()));
        }
        for (k, v) in extra {
            start.push_attribute((*k, v.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for node in &self.children {
            match node {
                Node::Element(el) => el.write(writer, &[])?,
                Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

/// Output viewport written onto the root `<svg>` at serialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Fill the viewport exactly, ignoring the viewBox aspect ratio.
    pub stretch: bool,
}

#[derive(Debug, Clone)]
pub struct VectorDocument {
    template: TemplateId,
    canvas: [u32; 2],
    render_id: RenderId,
    resource_ids: Vec<String>,
    root: Element,
}

impl VectorDocument {
    pub(crate) fn new(
        template: TemplateId,
        canvas: [u32; 2],
        render_id: RenderId,
        resource_ids: Vec<String>,
        root: Element,
    ) -> Self {
        Self { template, canvas, render_id, resource_ids, root }
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn canvas(&self) -> [u32; 2] {
        self.canvas
    }

    pub fn render_id(&self) -> RenderId {
        self.render_id
    }

    /// Ids of the locally scoped resources (gradients, filters) in this document.
    pub fn resource_ids(&self) -> &[String] {
        &self.resource_ids
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Canonical text form at the intrinsic canvas size.
    pub fn to_svg(&self) -> ExportResult<String> {
        self.serialize(Viewport { width: self.canvas[0], height: self.canvas[1], stretch: false })
    }

    /// Scaled copy for display. Geometry stays in canvas units.
    pub fn to_preview_svg(&self) -> ExportResult<String> {
        let [w, h] = self.template.descriptor().preview_size;
        self.serialize(Viewport { width: w, height: h, stretch: false })
    }

    /// Text form handed to the rasterizer: viewport stretched to `width`x`height`.
    pub fn to_raster_svg(&self, width: u32, height: u32) -> ExportResult<String> {
        self.serialize(Viewport { width, height, stretch: true })
    }

    pub fn serialize(&self, viewport: Viewport) -> ExportResult<String> {
        let mut extra = vec![
            ("width", viewport.width.to_string()),
            ("height", viewport.height.to_string()),
        ];
        if viewport.stretch {
            extra.push(("preserveAspectRatio", "none".to_string()));
        }

        let mut writer = Writer::new(Vec::new());
        self.root.write(&mut writer, &extra)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| crate::error::ExportError::Xml(e.to_string()))
    }

    /// Hash of the canonical form with generated resource ids masked out.
    ///
    /// Two renders of the same theme share a fingerprint even though their
    /// resource ids differ.
    pub fn content_fingerprint(&self) -> ExportResult<String> {
        let mut svg = self.to_svg()?;
        let mut ids: Vec<(usize, &String)> = self.resource_ids.iter().enumerate().collect();
        // Longest first so an id that prefixes another is not replaced early.
        ids.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        for (index, id) in ids {
            svg = svg.replace(id.as_str(), &format!("res-{}", index));
        }
        Ok(sha256_hex(svg.as_bytes()))
    }
}
