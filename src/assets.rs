//! The card's two raster assets plus an optional label font.
//!
//! All external IO happens here, once, before any rendering. A missing asset
//! is not an error: the renderer skips the corresponding layer, so the card
//! degrades to vectors-only output.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::error::CardResult;

/// Default file name for the upward arrow glyph, relative to the assets root.
pub const ARROW_FILE: &str = "arrow_up.png";
/// Default file name for the background glow image.
pub const GLOW_FILE: &str = "glow.png";
/// Default file name for the label font.
pub const LABEL_FONT_FILE: &str = "label_font.ttf";

#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode image bytes into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CardResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = (((*c as u16) * a + 127) / 255) as u8;
        }
    }
}

/// Prepared assets for one card. Every slot is optional.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    pub arrow: Option<PreparedImage>,
    pub glow: Option<PreparedImage>,
    pub label_font: Option<Arc<Vec<u8>>>,
}

impl AssetStore {
    /// No assets at all; every raster/text layer will be skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the well-known asset files from `root`. Missing or undecodable
    /// files are logged and left empty.
    pub fn load(root: &Path) -> Self {
        Self {
            arrow: load_optional_image(root, ARROW_FILE),
            glow: load_optional_image(root, GLOW_FILE),
            label_font: load_optional_bytes(root, LABEL_FONT_FILE).map(Arc::new),
        }
    }
}

fn load_optional_bytes(root: &Path, name: &str) -> Option<Vec<u8>> {
    let path = root.join(name);
    match std::fs::read(&path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "asset missing, layer will be skipped");
            None
        }
    }
}

fn load_optional_image(root: &Path, name: &str) -> Option<PreparedImage> {
    let bytes = load_optional_bytes(root, name)?;
    match decode_image(&bytes) {
        Ok(img) => Some(img),
        Err(e) => {
            tracing::warn!(asset = name, error = %e, "asset undecodable, layer will be skipped");
            None
        }
    }
}
