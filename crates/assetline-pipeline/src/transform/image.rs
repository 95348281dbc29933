//! Image optimization

use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{AnimationDecoder, ColorType, ImageEncoder, ImageFormat};
use regex::Regex;
use tracing::debug;

/// Comments, XML declaration, doctype and editor metadata
static SVG_NOISE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<\?xml.*?\?>|<!DOCTYPE[^>]*>|<metadata\b.*?</metadata>")
        .expect("Invalid regex")
});

static SVG_GAP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("Invalid regex"));

/// Recompress raster images and strip SVG markup noise.
///
/// PNGs are recompressed losslessly, JPEGs re-encoded at `jpeg_quality`,
/// GIFs re-encoded frame by frame. Anything unrecognised, undecodable, or
/// that would grow is returned unchanged.
pub fn optimize(bytes: &[u8], file: &Path, jpeg_quality: u8) -> Vec<u8> {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let result = match extension.as_deref() {
        Some("png") => recompress_png(bytes),
        Some("jpg") | Some("jpeg") => recompress_jpeg(bytes, jpeg_quality),
        Some("gif") => recompress_gif(bytes),
        Some("svg") => Ok(minify_svg(&String::from_utf8_lossy(bytes)).into_bytes()),
        _ => return bytes.to_vec(),
    };

    match result {
        Ok(out) if out.len() < bytes.len() => {
            debug!(
                file = %file.display(),
                before = bytes.len(),
                after = out.len(),
                "recompressed"
            );
            out
        }
        Ok(_) => bytes.to_vec(),
        Err(e) => {
            debug!(file = %file.display(), error = %e, "passing image through");
            bytes.to_vec()
        }
    }
}

fn recompress_png(bytes: &[u8]) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color())?;
    Ok(out)
}

fn recompress_jpeg(bytes: &[u8], quality: u8) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        match img.color() {
            ColorType::L8 => {
                let gray = img.to_luma8();
                encoder.encode(gray.as_raw(), gray.width(), gray.height(), ColorType::L8)?;
            }
            _ => {
                let rgb = img.to_rgb8();
                encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
            }
        }
    }
    Ok(out)
}

fn recompress_gif(bytes: &[u8]) -> image::ImageResult<Vec<u8>> {
    let frames = GifDecoder::new(Cursor::new(bytes))?
        .into_frames()
        .collect_frames()?;
    let animated = frames.len() > 1;

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        if animated {
            encoder.set_repeat(Repeat::Infinite)?;
        }
        encoder.encode_frames(frames)?;
    }
    Ok(out)
}

/// Drop comments and metadata, and whitespace between tags
fn minify_svg(svg: &str) -> String {
    let stripped = SVG_NOISE_REGEX.replace_all(svg, "");
    SVG_GAP_REGEX
        .replace_all(stripped.trim(), "><")
        .into_owned()
}
