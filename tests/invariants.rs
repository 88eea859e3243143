//! Contract Invariant Tests
//!
//! These tests verify the export guarantees end to end.

use std::sync::Arc;

use brandkit_core::{
    document::VectorDocument,
    render, render_fresh,
    surface::{MemorySink, RenderingSurface, ResvgSurface},
    templates::{BANNER, PROFILE, WATERMARK},
    DirectorySink, ExportError, ExportPipeline, ExportRequest, ExportResult, Exporter, HandleTable,
    OutputKind, RenderId, Rasterizer, Theme,
};

fn create_test_theme() -> Theme {
    Theme {
        title: "X".to_string(),
        subtitle: "Y".to_string(),
        primary_color: "#111111".into(),
        secondary_color: "#222222".into(),
        background_color: "#000000".into(),
        show_guides: true,
    }
}

fn create_pipeline() -> ExportPipeline<ResvgSurface, MemorySink> {
    ExportPipeline::new(ResvgSurface, MemorySink::new())
}

fn png_size(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png).unwrap();
    (img.width(), img.height())
}

fn guide_counts(doc: &VectorDocument) -> (usize, usize) {
    let svg = doc.to_svg().unwrap();
    let xml = roxmltree::Document::parse(&svg).unwrap();
    let guides: Vec<_> = xml
        .descendants()
        .filter(|n| n.attribute("data-guide") == Some("true"))
        .collect();
    let rects = guides
        .iter()
        .flat_map(|g| g.descendants())
        .filter(|n| n.has_tag_name("rect"))
        .count();
    let captions = guides
        .iter()
        .flat_map(|g| g.descendants())
        .filter(|n| n.has_tag_name("text"))
        .count();
    (rects, captions)
}

/// Feeds the decoder a truncated document, the way a broken renderer would.
struct TruncatingSurface;

impl RenderingSurface for TruncatingSurface {
    type Image = <ResvgSurface as RenderingSurface>::Image;
    type Canvas = <ResvgSurface as RenderingSurface>::Canvas;

    fn decode_vector_to_image(&self, data: &[u8]) -> ExportResult<Self::Image> {
        ResvgSurface.decode_vector_to_image(&data[..data.len() / 2])
    }

    fn draw_image_to_surface(&self, image: &Self::Image, width: u32, height: u32) -> ExportResult<Self::Canvas> {
        ResvgSurface.draw_image_to_surface(image, width, height)
    }

    fn encode_surface_to_bytes(&self, canvas: &Self::Canvas) -> ExportResult<Vec<u8>> {
        ResvgSurface.encode_surface_to_bytes(canvas)
    }
}

/// Rejects only the banner document; the other templates decode slowly so the
/// banner failure lands while they are still in flight.
struct BannerRejectingSurface;

impl RenderingSurface for BannerRejectingSurface {
    type Image = <ResvgSurface as RenderingSurface>::Image;
    type Canvas = <ResvgSurface as RenderingSurface>::Canvas;

    fn decode_vector_to_image(&self, data: &[u8]) -> ExportResult<Self::Image> {
        if String::from_utf8_lossy(data).contains(r#"viewBox="0 0 2048 1152""#) {
            return Err(ExportError::decode("banner rejected"));
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
        ResvgSurface.decode_vector_to_image(data)
    }

    fn draw_image_to_surface(&self, image: &Self::Image, width: u32, height: u32) -> ExportResult<Self::Canvas> {
        ResvgSurface.draw_image_to_surface(image, width, height)
    }

    fn encode_surface_to_bytes(&self, canvas: &Self::Canvas) -> ExportResult<Vec<u8>> {
        ResvgSurface.encode_surface_to_bytes(canvas)
    }
}

#[test]
fn invariant_render_differs_only_in_resource_ids() {
    let theme = create_test_theme();
    for desc in [&PROFILE, &BANNER, &WATERMARK] {
        let a = render_fresh(desc, &theme);
        let b = render_fresh(desc, &theme);

        assert_ne!(a.resource_ids(), b.resource_ids());
        assert_ne!(a.to_svg().unwrap(), b.to_svg().unwrap());
        assert_eq!(a.content_fingerprint().unwrap(), b.content_fingerprint().unwrap());
    }
}

#[test]
fn invariant_fingerprint_tracks_visible_content() {
    let theme = create_test_theme();
    let other = Theme { primary_color: "#333333".into(), ..theme.clone() };
    let a = render_fresh(&BANNER, &theme);
    let b = render_fresh(&BANNER, &other);
    assert_ne!(a.content_fingerprint().unwrap(), b.content_fingerprint().unwrap());
}

#[test]
fn invariant_resource_ids_referenced_consistently() {
    let doc = render(&PROFILE, &create_test_theme(), RenderId::new());
    let svg = doc.to_svg().unwrap();
    for id in doc.resource_ids() {
        assert!(svg.contains(&format!(r#"id="{}""#, id)));
        assert!(svg.contains(&format!("url(#{})", id)));
    }
}

#[test]
fn invariant_color_normalization() {
    let theme: Theme = serde_json::from_str(
        r##"{"primaryColor": "ff3d9a", "secondaryColor": "#7a5cff", "backgroundColor": ""}"##,
    )
    .unwrap();
    assert_eq!(theme.primary_color.as_str(), "#ff3d9a");
    assert_eq!(theme.secondary_color.as_str(), "#7a5cff");
    assert_eq!(theme.background_color.as_str(), "#000000");
}

#[test]
fn invariant_invalid_color_propagates_silently() {
    let theme = Theme { primary_color: "not-a-color".into(), ..create_test_theme() };
    let svg = render_fresh(&BANNER, &theme).to_svg().unwrap();
    assert!(svg.contains(r##"stop-color="#not-a-color""##));
}

#[test]
fn invariant_banner_guides_follow_flag() {
    let mut theme = create_test_theme();

    theme.show_guides = false;
    assert_eq!(guide_counts(&render_fresh(&BANNER, &theme)), (0, 0));
    let svg = render_fresh(&BANNER, &theme).to_svg().unwrap();
    assert!(!svg.contains("stroke-dasharray"));

    theme.show_guides = true;
    assert_eq!(guide_counts(&render_fresh(&BANNER, &theme)), (1, 1));
}

#[test]
fn invariant_watermark_never_has_guides() {
    let theme = create_test_theme();
    assert!(theme.show_guides);
    assert_eq!(guide_counts(&render_fresh(&WATERMARK, &theme)), (0, 0));
    assert_eq!(guide_counts(&render_fresh(&PROFILE, &theme)), (0, 0));
}

#[tokio::test]
async fn invariant_raster_size_matches_request() {
    let rasterizer = Rasterizer::new(ResvgSurface, HandleTable::new());
    let doc = render_fresh(&PROFILE, &create_test_theme());
    for (w, h) in [(800, 800), (120, 40), (33, 77)] {
        let artifact = rasterizer.rasterize(&doc, w, h).await.unwrap();
        assert_eq!((artifact.width(), artifact.height()), (w, h));
        assert_eq!(png_size(artifact.bytes()), (w, h));
    }
}

#[tokio::test]
async fn invariant_concurrent_raster_exports_independent() {
    let pipeline = create_pipeline();
    let theme = create_test_theme();
    let profile = ExportRequest::new("profile", OutputKind::Raster);
    let banner = ExportRequest::new("banner", OutputKind::Raster);

    let (p, b) = tokio::join!(pipeline.export(&theme, &profile), pipeline.export(&theme, &banner));
    assert_eq!(p.unwrap().unwrap().size, [800, 800]);
    assert_eq!(b.unwrap().unwrap().size, [2048, 1152]);

    // Reverse order, same results.
    let (b, p) = tokio::join!(pipeline.export(&theme, &banner), pipeline.export(&theme, &profile));
    assert_eq!(b.unwrap().unwrap().size, [2048, 1152]);
    assert_eq!(p.unwrap().unwrap().size, [800, 800]);

    for delivered in pipeline.sink().delivered() {
        let expected = match delivered.filename.as_str() {
            "profile.png" => (800, 800),
            "banner.png" => (2048, 1152),
            other => panic!("unexpected delivery {}", other),
        };
        assert_eq!(png_size(&delivered.bytes), expected);
        assert_eq!(delivered.mime, "image/png");
    }
    assert_eq!(pipeline.sink().len(), 4);
    assert_eq!(pipeline.handles().live(), 0);
}

#[tokio::test]
async fn invariant_missing_target_is_silent_noop() {
    let pipeline = create_pipeline();
    let theme = create_test_theme();

    for kind in [OutputKind::Vector, OutputKind::Raster] {
        let outcome = pipeline.export(&theme, &ExportRequest::new("unknown", kind)).await.unwrap();
        assert!(outcome.is_none());
    }
    assert!(pipeline.sink().is_empty());
    assert_eq!(pipeline.handles().issued(), 0);

    let exporter = Exporter::new(MemorySink::new(), HandleTable::new());
    assert!(exporter.export_vector(None, "profile.svg").unwrap().is_none());
    assert!(exporter.export_raster(None, "profile.png").unwrap().is_none());
    assert!(exporter.sink().is_empty());
}

#[tokio::test]
async fn invariant_watermark_end_to_end() {
    let pipeline = create_pipeline();
    let theme = create_test_theme();

    let file = pipeline
        .export(&theme, &ExportRequest::new("watermark", OutputKind::Raster))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.filename, "watermark.png");
    assert_eq!(file.size, [300, 300]);

    let delivered = pipeline.sink().delivered();
    let img = image::load_from_memory_with_format(&delivered[0].bytes, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    assert_eq!(img.dimensions(), (300, 300));

    // Transparent outside the circle.
    assert_eq!(img.get_pixel(5, 5)[3], 0);

    // Inside the circle the color runs from #111111 (top-left) to #222222 (bottom-right).
    let near_start = img.get_pixel(100, 100);
    let near_end = img.get_pixel(200, 200);
    for px in [near_start, near_end] {
        assert!(px[3] > 200, "alpha {:?}", px);
        for c in 0..3 {
            assert!((0x10..=0x23).contains(&px[c]), "channel {:?}", px);
        }
    }
    assert!(near_start[0] < near_end[0]);

    let svg = render_fresh(&WATERMARK, &theme).to_svg().unwrap();
    assert!(!svg.contains("data-guide"));
}

#[tokio::test]
async fn invariant_decode_failure_rejects_and_releases() {
    let pipeline = ExportPipeline::new(TruncatingSurface, MemorySink::new());
    let err = pipeline
        .export(&create_test_theme(), &ExportRequest::new("profile", OutputKind::Raster))
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Decode(_)));
    assert!(pipeline.sink().is_empty());
    assert_eq!(pipeline.handles().issued(), 1);
    assert_eq!(pipeline.handles().live(), 0);
}

#[tokio::test]
async fn invariant_batch_failure_does_not_cancel_siblings() {
    let pipeline = ExportPipeline::new(BannerRejectingSurface, MemorySink::new());
    let err = pipeline
        .export_all(&create_test_theme(), &[OutputKind::Raster])
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Decode(_)));

    let mut names: Vec<_> = pipeline.sink().delivered().into_iter().map(|d| d.filename).collect();
    names.sort();
    assert_eq!(names, ["profile.png", "watermark.png"]);
    assert_eq!(pipeline.handles().live(), 0);
}

#[tokio::test]
async fn invariant_export_all_writes_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ExportPipeline::new(ResvgSurface, DirectorySink::new(dir.path()));
    let theme = create_test_theme();

    let manifest = pipeline
        .export_all(&theme, &[OutputKind::Vector, OutputKind::Raster])
        .await
        .unwrap();

    assert_eq!(manifest.files.len(), 6);
    assert!(!manifest.manifest_hash.is_empty());
    assert_eq!(pipeline.handles().live(), 0);

    for (name, size) in [("profile", (800, 800)), ("banner", (2048, 1152)), ("watermark", (300, 300))] {
        let svg = std::fs::read_to_string(dir.path().join(format!("{}.svg", name))).unwrap();
        assert!(roxmltree::Document::parse(&svg).is_ok());
        let png = std::fs::read(dir.path().join(format!("{}.png", name))).unwrap();
        assert_eq!(png_size(&png), size);
    }

    for entry in &manifest.files {
        let bytes = std::fs::read(dir.path().join(&entry.file.filename)).unwrap();
        assert_eq!(entry.file.byte_len, bytes.len());
        assert_eq!(entry.file.sha256, brandkit_core::hashing::sha256_hex(&bytes));
    }
}

#[tokio::test]
async fn invariant_request_hash_stable_across_batches() {
    let pipeline = create_pipeline();
    let theme = create_test_theme();

    let m1 = pipeline.export_all(&theme, &[OutputKind::Vector]).await.unwrap();
    let m2 = pipeline.export_all(&theme, &[OutputKind::Vector]).await.unwrap();

    let h1: Vec<_> = m1.files.iter().map(|f| f.request_hash.clone()).collect();
    let h2: Vec<_> = m2.files.iter().map(|f| f.request_hash.clone()).collect();
    assert_eq!(h1, h2);
    assert_ne!(m1.id, m2.id);
}

#[test]
fn invariant_handles_share_payload() {
    // Raster payloads reach the sink through the artifact's own buffer.
    let bytes: Arc<[u8]> = Arc::from(&b"abc"[..]);
    let table = HandleTable::new();
    let handle = table.create(Arc::clone(&bytes), "image/png");
    assert!(Arc::ptr_eq(handle.bytes(), &bytes));
}
