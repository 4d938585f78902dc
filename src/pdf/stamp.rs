//! Embeds the signature image into a page.
//!
//! The image becomes a FlateDecode DeviceRGB XObject with a DeviceGray SMask
//! carrying the alpha channel, drawn by a `q .. cm /Name Do Q` fragment
//! appended to the page contents.

use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Document, Object, Stream};
use tracing::info;

use crate::field::SignatureField;

use super::{page_dimensions, page_object_id, PdfError, PdfResult};

pub(super) fn stamp_signature(
    document: &mut Document,
    field: &SignatureField,
    image_path: &Path,
) -> PdfResult<()> {
    let page_id = page_object_id(document, field.page_index)?;
    let page = page_dimensions(document, page_id)?;

    let rgba = image::open(image_path)
        .map_err(|source| PdfError::Image {
            path: image_path.display().to_string(),
            source,
        })?
        .to_rgba8();
    let (img_w, img_h) = rgba.dimensions();

    let pixel_count = img_w as usize * img_h as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        rgb.push(pixel[0]);
        rgb.push(pixel[1]);
        rgb.push(pixel[2]);
        alpha.push(pixel[3]);
    }

    let smask_id = document.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(img_w),
            "Height" => i64::from(img_h),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&alpha)?,
    ));
    let image_id = document.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(img_w),
            "Height" => i64::from(img_h),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "SMask" => smask_id,
            "Filter" => "FlateDecode",
        },
        deflate(&rgb)?,
    ));

    let name = format!("SigIm{}", image_id.0);
    register_xobject(document, page_id, &name, image_id)?;

    // Fit the image inside the field preserving aspect ratio, centered.
    let (draw_w, draw_h) = fit_within(field.width, field.height, img_w, img_h);
    // Field origin is the page's top-left; PDF user space starts at the
    // MediaBox's lower-left corner, which need not be 0,0.
    let x = page.origin_x + field.x + (field.width - draw_w) / 2.0;
    let y = page.origin_y + (page.height - field.y - field.height) + (field.height - draw_h) / 2.0;

    let content = format!("q {draw_w:.2} 0 0 {draw_h:.2} {x:.2} {y:.2} cm /{name} Do Q");
    document
        .add_page_contents(page_id, content.into_bytes())
        .map_err(|source| PdfError::Malformed(format!("cannot extend page contents: {source}")))?;

    info!(
        page = field.page_index,
        x,
        y,
        width = draw_w,
        height = draw_h,
        "signature stamped"
    );
    Ok(())
}

/// Largest width/height that fits inside the field while keeping the image
/// aspect ratio. Zero-sized images fill the field.
pub(super) fn fit_within(field_w: f64, field_h: f64, img_w: u32, img_h: u32) -> (f64, f64) {
    if img_w == 0 || img_h == 0 {
        return (field_w, field_h);
    }
    let scale = (field_w / f64::from(img_w)).min(field_h / f64::from(img_h));
    (f64::from(img_w) * scale, f64::from(img_h) * scale)
}

fn deflate(data: &[u8]) -> PdfResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Adds the image under the page's `Resources/XObject` dictionary, creating
/// either level when absent. `Resources` may be inline or a reference.
fn register_xobject(
    document: &mut Document,
    page_id: lopdf::ObjectId,
    name: &str,
    image_id: lopdf::ObjectId,
) -> PdfResult<()> {
    let mut resources = {
        let page_dict = document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| PdfError::Malformed("page node is not a dictionary".into()))?;
        page_dict
            .remove(b"Resources")
            .unwrap_or_else(|| Object::Dictionary(dictionary! {}))
    };

    match &mut resources {
        Object::Reference(id) => {
            let dict = document
                .get_object_mut(*id)
                .and_then(Object::as_dict_mut)
                .map_err(|_| PdfError::Malformed("Resources is not a dictionary".into()))?;
            ensure_xobject_dict(dict)?.set(name, image_id);
        }
        Object::Dictionary(dict) => {
            ensure_xobject_dict(dict)?.set(name, image_id);
        }
        _ => return Err(PdfError::Malformed("Resources has an unexpected type".into())),
    }

    let page_dict = document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| PdfError::Malformed("page node is not a dictionary".into()))?;
    page_dict.set("Resources", resources);
    Ok(())
}

fn ensure_xobject_dict(
    resources: &mut lopdf::Dictionary,
) -> PdfResult<&mut lopdf::Dictionary> {
    let existing = resources
        .remove(b"XObject")
        .unwrap_or_else(|| Object::Dictionary(dictionary! {}));

    let sanitized = match existing {
        Object::Dictionary(dict) => Object::Dictionary(dict),
        // An XObject reference gets shadowed rather than chased.
        Object::Reference(_) => Object::Dictionary(dictionary! {}),
        _ => return Err(PdfError::Malformed("XObject has an unexpected type".into())),
    };

    resources.set("XObject", sanitized);
    match resources.get_mut(b"XObject") {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        _ => Err(PdfError::Malformed("XObject has an unexpected type".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::write_test_pdf;
    use super::super::{DocumentBackend, LopdfBackend};
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        // Wide image in a squarer field: width binds.
        let (w, h) = fit_within(100.0, 100.0, 200, 50);
        assert!((w - 100.0).abs() < 1e-9);
        assert!((h - 25.0).abs() < 1e-9);

        // Tall image: height binds.
        let (w, h) = fit_within(100.0, 50.0, 40, 80);
        assert!((w - 25.0).abs() < 1e-9);
        assert!((h - 50.0).abs() < 1e-9);
    }

    #[test]
    fn fit_within_fills_the_field_for_empty_images() {
        assert_eq!(fit_within(120.0, 40.0, 0, 10), (120.0, 40.0));
    }

    #[test]
    fn stamp_adds_xobject_and_content_to_the_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let original = dir.path().join("doc.pdf");
        let signature = dir.path().join("signature.png");
        let output = dir.path().join("doc-Signed.pdf");
        write_test_pdf(&original, 1);
        RgbaImage::from_pixel(40, 16, Rgba([0, 0, 0, 255]))
            .save(&signature)
            .expect("signature image written");

        let field = SignatureField {
            page_index: 0,
            x: 100.0,
            y: 600.0,
            width: 150.0,
            height: 50.0,
        };
        let backend = LopdfBackend::new();
        backend
            .stamp_to_file(&original, &field, &signature, &output)
            .expect("stamp succeeds");

        let stamped = Document::load(&output).expect("output reloads");
        let pages = stamped.get_pages();
        let page_id = *pages.get(&1).expect("page 1 exists");
        let page_dict = stamped
            .get_object(page_id)
            .and_then(Object::as_dict)
            .expect("page dictionary");
        let resources = page_dict
            .get(b"Resources")
            .and_then(Object::as_dict)
            .expect("resources dictionary");
        let xobjects = resources
            .get(b"XObject")
            .and_then(Object::as_dict)
            .expect("xobject dictionary");
        assert_eq!(xobjects.len(), 1);

        let content = stamped
            .get_page_content(page_id)
            .expect("page content readable");
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("Do"), "content should invoke the image");
    }

    #[test]
    fn stamp_translates_by_a_shifted_media_box_origin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let original = dir.path().join("offset.pdf");
        let signature = dir.path().join("signature.png");
        let output = dir.path().join("offset-Signed.pdf");
        super::super::tests::write_test_pdf_with_media_box(&original, [20, 30, 632, 822]);
        // 40x16 in a 100x40 field fills it exactly, so the draw origin is
        // the translated field corner.
        RgbaImage::from_pixel(40, 16, Rgba([0, 0, 0, 255]))
            .save(&signature)
            .expect("signature image written");

        let field = SignatureField {
            page_index: 0,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 40.0,
        };
        let backend = LopdfBackend::new();
        backend
            .stamp_to_file(&original, &field, &signature, &output)
            .expect("stamp succeeds");

        let stamped = Document::load(&output).expect("output reloads");
        let pages = stamped.get_pages();
        let page_id = *pages.get(&1).expect("page 1 exists");
        let content = stamped
            .get_page_content(page_id)
            .expect("page content readable");
        let text = String::from_utf8_lossy(&content);
        // x = 20 + 0, y = 30 + (792 - 0 - 40).
        assert!(
            text.contains("20.00 782.00 cm"),
            "draw matrix should include the MediaBox origin: {text}"
        );
    }

    #[test]
    fn stamp_fails_cleanly_on_a_missing_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let original = dir.path().join("doc.pdf");
        let output = dir.path().join("doc-Signed.pdf");
        write_test_pdf(&original, 1);

        let field = SignatureField {
            page_index: 0,
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 40.0,
        };
        let backend = LopdfBackend::new();
        let err = backend
            .stamp_to_file(&original, &field, Path::new("missing.png"), &output)
            .expect_err("stamp should fail");
        assert!(matches!(err, PdfError::Image { .. }));
        assert!(!output.exists());
    }
}
