//! Conversion of raw PDF image samples to PNG.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Colour spaces whose samples can be turned into gray or RGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        lookup: Vec<u8>,
    },
}

impl ColorSpace {
    pub(crate) fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }
}

/// Sample layout of an image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RasterLayout {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
    /// Gray samples map 0 to white instead of black.
    pub invert: bool,
}

/// Encode decompressed samples as a PNG file.
pub(crate) fn encode_png(layout: &RasterLayout, samples: &[u8]) -> Result<Vec<u8>, String> {
    let (pixels, color) = to_pixels(layout, samples)?;
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(&pixels, layout.width, layout.height, color)
        .map_err(|e| format!("PNG encoding failed: {}", e))?;
    Ok(out)
}

fn to_pixels(
    layout: &RasterLayout,
    samples: &[u8],
) -> Result<(Vec<u8>, ExtendedColorType), String> {
    let bpc = layout.bits_per_component;
    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(format!("unsupported bits per component: {}", bpc));
    }
    if layout.width == 0 || layout.height == 0 {
        return Err("image has zero width or height".to_string());
    }

    let values = unpack(
        samples,
        layout.width as usize,
        layout.height as usize,
        layout.color_space.components(),
        bpc,
    )?;

    match &layout.color_space {
        ColorSpace::Gray => {
            let pixels = values
                .iter()
                .map(|&v| {
                    let v = scale(v, bpc);
                    if layout.invert {
                        255 - v
                    } else {
                        v
                    }
                })
                .collect();
            Ok((pixels, ExtendedColorType::L8))
        }
        ColorSpace::Rgb => Ok((
            values.iter().map(|&v| scale(v, bpc)).collect(),
            ExtendedColorType::Rgb8,
        )),
        ColorSpace::Cmyk => {
            let pixels = values
                .chunks_exact(4)
                .flat_map(|c| {
                    cmyk_to_rgb(
                        scale(c[0], bpc),
                        scale(c[1], bpc),
                        scale(c[2], bpc),
                        scale(c[3], bpc),
                    )
                })
                .collect();
            Ok((pixels, ExtendedColorType::Rgb8))
        }
        ColorSpace::Indexed {
            base,
            hival,
            lookup,
        } => expand_palette(&values, bpc, base, *hival, lookup),
    }
}

fn expand_palette(
    indices: &[u8],
    bpc: u8,
    base: &ColorSpace,
    hival: u8,
    lookup: &[u8],
) -> Result<(Vec<u8>, ExtendedColorType), String> {
    if bpc > 8 {
        return Err("indexed images cannot use 16 bits per component".to_string());
    }
    let n = base.components();
    let color = match base {
        ColorSpace::Gray => ExtendedColorType::L8,
        ColorSpace::Rgb | ColorSpace::Cmyk => ExtendedColorType::Rgb8,
        ColorSpace::Indexed { .. } => return Err("nested indexed color space".to_string()),
    };

    let mut pixels = Vec::with_capacity(indices.len() * n.min(3));
    for &index in indices {
        let start = index.min(hival) as usize * n;
        let entry = lookup
            .get(start..start + n)
            .ok_or_else(|| format!("palette too short for index {}", index))?;
        match base {
            ColorSpace::Cmyk => pixels.extend(cmyk_to_rgb(entry[0], entry[1], entry[2], entry[3])),
            _ => pixels.extend_from_slice(entry),
        }
    }
    Ok((pixels, color))
}

/// Split packed rows into one byte per sample. 16-bit samples keep their
/// high byte; sub-byte samples keep their raw value.
fn unpack(
    data: &[u8],
    width: usize,
    height: usize,
    components: usize,
    bpc: u8,
) -> Result<Vec<u8>, String> {
    let bits = bpc as usize;
    let samples_per_row = width
        .checked_mul(components)
        .ok_or("image dimensions overflow")?;
    let row_bytes = samples_per_row
        .checked_mul(bits)
        .map(|b| b.div_ceil(8))
        .ok_or("image dimensions overflow")?;
    let needed = row_bytes
        .checked_mul(height)
        .ok_or("image dimensions overflow")?;
    if data.len() < needed {
        return Err(format!(
            "image data too short: {} bytes, expected {}",
            data.len(),
            needed
        ));
    }
    // A byte of slack per row is what undecoded predictor tags leave behind
    if data.len() - needed >= height.max(2) {
        return Err(format!(
            "image data too long: {} bytes, expected {}",
            data.len(),
            needed
        ));
    }

    let mut out = Vec::with_capacity(samples_per_row * height);
    for row in data.chunks_exact(row_bytes).take(height) {
        match bits {
            8 => out.extend_from_slice(&row[..samples_per_row]),
            16 => out.extend(row.chunks_exact(2).take(samples_per_row).map(|p| p[0])),
            _ => {
                let per_byte = 8 / bits;
                let mask = (1u8 << bits) - 1;
                for i in 0..samples_per_row {
                    let shift = 8 - bits * (i % per_byte + 1);
                    out.push((row[i / per_byte] >> shift) & mask);
                }
            }
        }
    }
    Ok(out)
}

fn scale(value: u8, bpc: u8) -> u8 {
    match bpc {
        8 | 16 => value,
        _ => {
            let max = (1u16 << bpc) - 1;
            (value as u16 * 255 / max) as u8
        }
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u16;
    [
        ((255 - c as u16) * k / 255) as u8,
        ((255 - m as u16) * k / 255) as u8,
        ((255 - y as u16) * k / 255) as u8,
    ]
}
