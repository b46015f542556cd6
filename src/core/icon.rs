//! Icon resolution for presto.
//!
//! Turns a lazy [IconRef] into a decoded [IconBitmap] through a fallback
//! chain, so one missing or broken icon never blocks the rest of the list:
//! 1. binary extraction at the stored index, when the reference is a default
//!    one or the path carries an executable/library extension;
//! 2. direct load when the path is an icon file (`.ico`/`.cur`);
//! 3. binary extraction at index 0;
//! 4. the shell library at its well-known default index.
//!
//! Binary extraction is a host capability ([HostShell::extract_icon]); the
//! `.ico` loader is in-crate and decodes the 32-bpp DIB case. Resolution is
//! pure CPU + file I/O and safe to run off the rendering thread; the
//! resulting bitmap is `Send` and handed to the presenter.

use crate::core::entry::{IconRef, SHELL_ICON_DEFAULT_INDEX, SHELL_ICON_LIBRARY};
use crate::core::shell::HostShell;

use phf::phf_set;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Decoded RGBA icon pixels, row-major, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl IconBitmap {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || rgba.len() != (width * height * 4) as usize {
            return None;
        }
        Some(IconBitmap {
            width,
            height,
            rgba,
        })
    }

    // Accessors

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Extensions whose files embed icon resources the host can extract.
static BINARY_ICON_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "exe", "dll", "com", "scr", "cpl", "ocx", "mun",
};

/// Extensions loaded directly by the in-crate decoder.
static ICON_FILE_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "ico", "cur",
};

/// Resolves icon references through the fallback chain.
pub struct IconResolver {
    shell: Arc<dyn HostShell>,
}

impl IconResolver {
    pub fn new(shell: Arc<dyn HostShell>) -> Self {
        IconResolver { shell }
    }

    /// Resolves one reference, or `None` when every fallback fails.
    pub fn resolve(&self, icon: &IconRef) -> Option<IconBitmap> {
        let path = icon.path();

        if icon.is_default() || has_extension_in(path, &BINARY_ICON_EXTENSIONS) {
            if let Some(bitmap) = self.shell.extract_icon(path, icon.index()) {
                return Some(bitmap);
            }
        }

        if has_extension_in(path, &ICON_FILE_EXTENSIONS) {
            match load_ico_file(Path::new(path)) {
                Some(bitmap) => return Some(bitmap),
                None => tracing::debug!("icon file {} not decodable", path),
            }
        }

        if let Some(bitmap) = self.shell.extract_icon(path, 0) {
            return Some(bitmap);
        }

        self.shell
            .extract_icon(SHELL_ICON_LIBRARY, SHELL_ICON_DEFAULT_INDEX)
    }
}

fn has_extension_in(path: &str, set: &phf::Set<&'static str>) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| set.contains(e.to_lowercase().as_str()))
}

/// Loads the best image of an `.ico`/`.cur` file.
///
/// Only the 32-bpp DIB payload is decoded; PNG-compressed images are skipped
/// and the next directory entry gets its chance.
pub(crate) fn load_ico_file(path: &Path) -> Option<IconBitmap> {
    let data = fs::read(path).ok()?;
    decode_ico(&data)
}

// ICONDIR field offsets.
const ICO_TYPE_ICON: u16 = 1;
const ICO_TYPE_CURSOR: u16 = 2;
const ICO_DIR_HEADER: usize = 6;
const ICO_DIR_ENTRY: usize = 16;

pub(crate) fn decode_ico(data: &[u8]) -> Option<IconBitmap> {
    if data.len() < ICO_DIR_HEADER {
        return None;
    }
    let reserved = u16::from_le_bytes([data[0], data[1]]);
    let kind = u16::from_le_bytes([data[2], data[3]]);
    let count = u16::from_le_bytes([data[4], data[5]]) as usize;
    if reserved != 0 || !matches!(kind, ICO_TYPE_ICON | ICO_TYPE_CURSOR) || count == 0 {
        return None;
    }

    // Directory entries, largest image first.
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let off = ICO_DIR_HEADER + i * ICO_DIR_ENTRY;
        let entry = data.get(off..off + ICO_DIR_ENTRY)?;
        let width = if entry[0] == 0 { 256u32 } else { entry[0] as u32 };
        let height = if entry[1] == 0 { 256u32 } else { entry[1] as u32 };
        let size = u32::from_le_bytes([entry[8], entry[9], entry[10], entry[11]]) as usize;
        let data_off = u32::from_le_bytes([entry[12], entry[13], entry[14], entry[15]]) as usize;
        entries.push((width, height, data_off, size));
    }
    entries.sort_by_key(|&(w, h, _, _)| std::cmp::Reverse(w * h));

    for (width, height, off, size) in entries {
        let Some(image) = data.get(off..off.checked_add(size)?) else {
            continue;
        };
        if let Some(bitmap) = decode_dib32(image, width, height) {
            return Some(bitmap);
        }
    }
    None
}

/// Decodes one 32-bpp bottom-up DIB icon image into top-down RGBA.
fn decode_dib32(image: &[u8], width: u32, height: u32) -> Option<IconBitmap> {
    if image.len() < 40 {
        return None;
    }
    let header_size = u32::from_le_bytes([image[0], image[1], image[2], image[3]]);
    // A PNG-compressed entry starts with the PNG signature, not a DIB header.
    if header_size != 40 {
        return None;
    }
    let bpp = u16::from_le_bytes([image[14], image[15]]);
    if bpp != 32 {
        return None;
    }
    let compression = u32::from_le_bytes([image[16], image[17], image[18], image[19]]);
    if compression != 0 {
        return None;
    }

    let row_len = (width * 4) as usize;
    let pixel_len = row_len * height as usize;
    let pixels = image.get(40..40 + pixel_len)?;

    // BGRA bottom-up to RGBA top-down. The AND mask after the pixel data is
    // redundant at 32 bpp and ignored.
    let mut rgba = vec![0u8; pixel_len];
    for row in 0..height as usize {
        let src_row = &pixels[(height as usize - 1 - row) * row_len..][..row_len];
        let dst_row = &mut rgba[row * row_len..][..row_len];
        for (src, dst) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }
    }
    IconBitmap::new(width, height, rgba)
}
