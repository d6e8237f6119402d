//! Pixel buffers for the adjustment pipeline.
//!
//! A [`PixelBuffer`] has exactly one owner. Pipeline stages take buffers by
//! value and hand back a new one, so a released buffer cannot be touched again.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Storage layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 16-bit opaque 5-6-5 RGB. Used wherever memory has to stay bounded.
    Rgb565,
    /// 32-bit packed ARGB with full alpha.
    Argb8888,
}

impl PixelFormat {
    /// Bytes of storage per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb565 => 2,
            Self::Argb8888 => 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb565 => write!(f, "RGB 565"),
            Self::Argb8888 => write!(f, "ARGB 8888"),
        }
    }
}

/// Identity of one buffer allocation. Two live buffers never share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
enum PixelData {
    Rgb565(Vec<u16>),
    Argb8888(Vec<u32>),
}

/// A width × height grid of pixels in one [`PixelFormat`].
///
/// Reads and writes always go through packed `0xAARRGGBB` values; the
/// storage format decides how much precision survives a write.
#[derive(Debug)]
pub struct PixelBuffer {
    id: BufferId,
    width: u32,
    height: u32,
    data: PixelData,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer (black for `Rgb565`, transparent black for `Argb8888`).
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize;
        let data = match format {
            PixelFormat::Rgb565 => PixelData::Rgb565(vec![0; len]),
            PixelFormat::Argb8888 => PixelData::Argb8888(vec![0; len]),
        };
        Self {
            id: BufferId::next(),
            width,
            height,
            data,
        }
    }

    /// Allocate a buffer with every pixel set to `argb`.
    pub fn filled(width: u32, height: u32, format: PixelFormat, argb: u32) -> Self {
        let len = width as usize * height as usize;
        let data = match format {
            PixelFormat::Rgb565 => PixelData::Rgb565(vec![argb_to_rgb565(argb); len]),
            PixelFormat::Argb8888 => PixelData::Argb8888(vec![argb; len]),
        };
        Self {
            id: BufferId::next(),
            width,
            height,
            data,
        }
    }

    /// Wrap row-major packed ARGB pixels. Returns `None` if the length does
    /// not match the dimensions.
    pub fn from_argb_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            id: BufferId::next(),
            width,
            height,
            data: PixelData::Argb8888(pixels),
        })
    }

    /// Build a fresh buffer from a row-major stream of ARGB values.
    pub(crate) fn from_argb_iter(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: impl Iterator<Item = u32>,
    ) -> Self {
        let data = match format {
            PixelFormat::Rgb565 => PixelData::Rgb565(pixels.map(argb_to_rgb565).collect()),
            PixelFormat::Argb8888 => PixelData::Argb8888(pixels.collect()),
        };
        Self {
            id: BufferId::next(),
            width,
            height,
            data,
        }
    }

    /// Convert an RGBA image into a buffer of the requested format.
    pub fn from_rgba_image(image: &RgbaImage, format: PixelFormat) -> Self {
        let (width, height) = image.dimensions();
        let pixels = image
            .pixels()
            .map(|p| pack_argb(p.0[3], p.0[0], p.0[1], p.0[2]));
        Self::from_argb_iter(width, height, format, pixels)
    }

    /// Copy the pixels out into an RGBA image.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut raw = Vec::with_capacity(self.pixel_count() * 4);
        for argb in self.argb_pixels() {
            let [a, r, g, b] = unpack_argb(argb);
            raw.extend_from_slice(&[r, g, b, a]);
        }
        RgbaImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        match self.data {
            PixelData::Rgb565(_) => PixelFormat::Rgb565,
            PixelData::Argb8888(_) => PixelFormat::Argb8888,
        }
    }

    /// Number of pixels, computed without overflow for any `u32` dimensions.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes held by the pixel storage.
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * self.format().bytes_per_pixel()
    }

    /// Packed ARGB value at `(x, y)`. Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let idx = self.index(x, y);
        match &self.data {
            PixelData::Rgb565(px) => rgb565_to_argb(px[idx]),
            PixelData::Argb8888(px) => px[idx],
        }
    }

    /// Store `argb` at `(x, y)`. `Rgb565` storage drops alpha and low bits.
    /// Panics if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        let idx = self.index(x, y);
        match &mut self.data {
            PixelData::Rgb565(px) => px[idx] = argb_to_rgb565(argb),
            PixelData::Argb8888(px) => px[idx] = argb,
        }
    }

    /// Row-major iterator over packed ARGB values.
    pub fn argb_pixels(&self) -> impl Iterator<Item = u32> + '_ {
        let (narrow, wide) = match &self.data {
            PixelData::Rgb565(px) => (Some(px.iter().map(|&p| rgb565_to_argb(p))), None),
            PixelData::Argb8888(px) => (None, Some(px.iter().copied())),
        };
        narrow
            .into_iter()
            .flatten()
            .chain(wide.into_iter().flatten())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

impl Clone for PixelBuffer {
    /// A clone is a separate allocation and gets its own [`BufferId`].
    fn clone(&self) -> Self {
        let data = match &self.data {
            PixelData::Rgb565(px) => PixelData::Rgb565(px.clone()),
            PixelData::Argb8888(px) => PixelData::Argb8888(px.clone()),
        };
        Self {
            id: BufferId::next(),
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Split a packed ARGB value into `[a, r, g, b]`.
#[inline]
pub const fn unpack_argb(argb: u32) -> [u8; 4] {
    [
        (argb >> 24) as u8,
        (argb >> 16) as u8,
        (argb >> 8) as u8,
        argb as u8,
    ]
}

#[inline]
pub const fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

fn argb_to_rgb565(argb: u32) -> u16 {
    let [_, r, g, b] = unpack_argb(argb);
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Expand 5/6-bit channels by bit replication so 0 and full scale map exactly.
fn rgb565_to_argb(px: u16) -> u32 {
    let r5 = ((px >> 11) & 0x1f) as u8;
    let g6 = ((px >> 5) & 0x3f) as u8;
    let b5 = (px & 0x1f) as u8;
    pack_argb(
        0xff,
        (r5 << 3) | (r5 >> 2),
        (g6 << 2) | (g6 >> 4),
        (b5 << 3) | (b5 >> 2),
    )
}
