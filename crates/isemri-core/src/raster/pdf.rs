//! PDF page-image and embedded-text extraction using lopdf and pdf-extract.
//!
//! Scanned work orders arrive as PDFs whose pages are full-page image
//! XObjects; extracting those images is the rasterization step. Born-digital
//! PDFs instead carry native text, which `extract_embedded_text` surfaces so
//! the pipeline can skip OCR entirely.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::error::DecodeError;

/// Extract the embedded text layer, if the PDF parses and has one.
pub(crate) fn extract_embedded_text(data: &[u8]) -> Option<String> {
    match pdf_extract::extract_text_from_mem(data) {
        Ok(text) => Some(text),
        Err(e) => {
            trace!("no embedded PDF text: {}", e);
            None
        }
    }
}

/// Extract page images from the first `max_pages` pages, in page order.
///
/// Unparsable input yields an empty vector.
pub(crate) fn extract_page_images(data: &[u8], max_pages: usize) -> Vec<DynamicImage> {
    let doc = match load_document(data) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("cannot rasterize PDF: {}", e);
            return Vec::new();
        }
    };

    let pages = doc.get_pages();
    let mut images = Vec::new();

    for (&page_num, &page_id) in pages.iter().take(max_pages) {
        match page_image(&doc, page_id) {
            Some(img) => images.push(img),
            None => debug!("page {} has no extractable image", page_num),
        }
    }

    images
}

fn load_document(data: &[u8]) -> Result<Document, DecodeError> {
    let mut doc = Document::load_mem(data).map_err(|e| DecodeError::Pdf(e.to_string()))?;

    // Some scanners emit empty-password encryption.
    if doc.is_encrypted() && doc.decrypt("").is_err() {
        return Err(DecodeError::Pdf("encrypted document".to_string()));
    }

    if doc.get_pages().is_empty() {
        return Err(DecodeError::NoPages);
    }
    Ok(doc)
}

/// The largest image XObject on a page, which for scans is the page itself.
fn page_image(doc: &Document, page_id: ObjectId) -> Option<DynamicImage> {
    let resources = page_resources(doc, page_id)?;
    let xobjects = resources.get(b"XObject").ok()?;
    let (_, xobj_dict) = doc.dereference(xobjects).ok()?;
    let xobj_dict = xobj_dict.as_dict().ok()?;

    let mut best: Option<DynamicImage> = None;
    for (_name, obj_ref) in xobj_dict.iter() {
        if let Ok((_, obj)) = doc.dereference(obj_ref) {
            if let Some(img) = image_from_object(doc, obj) {
                let keep = best
                    .as_ref()
                    .map(|b| img.width() * img.height() > b.width() * b.height())
                    .unwrap_or(true);
                if keep {
                    best = Some(img);
                }
            }
        }
    }
    best
}

fn image_from_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("image XObject: {}x{}", width, height);

    if let Some(filter) = image_filter(dict) {
        match filter {
            b"DCTDecode" => {
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode" => {
                trace!("unsupported image filter");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("unsupported bits per component: {}", bits);
        return None;
    }

    image_from_raw(&data, width, height, color_space)
}

fn image_filter(dict: &lopdf::Dictionary) -> Option<&[u8]> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

fn image_from_raw(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixel_count = (width * height) as usize;

    if color_space == b"DeviceRGB" || color_space == b"RGB" {
        let expected = pixel_count * 3;
        if data.len() < expected {
            return None;
        }
        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for chunk in data[..expected].chunks_exact(3) {
            rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba)
            .map(DynamicImage::ImageRgba8);
    }

    if color_space == b"DeviceGray" || color_space == b"G" {
        if data.len() < pixel_count {
            return None;
        }
        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for &gray in &data[..pixel_count] {
            rgba.extend_from_slice(&[gray, gray, gray, 255]);
        }
        return ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba)
            .map(DynamicImage::ImageRgba8);
    }

    trace!(
        "unsupported color space: {}",
        String::from_utf8_lossy(color_space)
    );
    None
}

/// Resources dictionary for a page, walking parent inheritance.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<lopdf::Dictionary> {
    let node = doc.get_object(node_id).ok()?;
    let Object::Dictionary(dict) = node else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
        return page_resources(doc, *parent_id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_not_a_document() {
        assert!(extract_page_images(b"%PDF-garbage", 5).is_empty());
        assert!(extract_page_images(&[], 5).is_empty());
    }

    #[test]
    fn test_raw_gray_decode() {
        let data = vec![128u8; 4];
        let img = image_from_raw(&data, 2, 2, b"DeviceGray").unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
    }

    #[test]
    fn test_raw_rgb_too_short() {
        let data = vec![0u8; 5];
        assert!(image_from_raw(&data, 2, 2, b"DeviceRGB").is_none());
    }
}
