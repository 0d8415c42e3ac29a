//! BC1, BC2 and BC3.
//!
//! All three share the same colour block: two RGB565 endpoints and sixteen
//! 2 bit indices. BC1 additionally uses the endpoint order to switch into a
//! three colour mode with a transparent fourth entry. BC2 prefixes the colour
//! block with explicit 4 bit alpha, BC3 with a BC4 style alpha ramp.

use crate::{
    block::{
        bc4_5::{decode_ramp, encode_ramp},
        optimize::optimize_endpoints,
        settle, PIXELS_PER_BLOCK,
    },
    color::HdrColor,
    settings::BC15Settings,
};

/// Perceptual weights of red, green and blue, relative to green.
const LUMINANCE: [f32; 3] = [0.2125 / 0.7154, 1.0, 0.0721 / 0.7154];
const LUMINANCE_INVERSE: [f32; 3] = [0.7154 / 0.2125, 1.0, 0.7154 / 0.0721];

/// Palette entry for each rounded projection onto the endpoint line.
const STEPS_3: [u32; 3] = [0, 2, 1];
const STEPS_4: [u32; 4] = [0, 2, 3, 1];

/// Spreads a quantization error onto the not yet visited neighbours using
/// Floyd-Steinberg weights.
fn diffuse<const N: usize>(
    errors: &mut [[f32; N]; PIXELS_PER_BLOCK],
    pixel: usize,
    difference: [f32; N],
) {
    let mut spread = |target: usize, weight: f32| {
        for (error, difference) in errors[target].iter_mut().zip(difference) {
            *error += difference * weight;
        }
    };

    if pixel & 3 != 3 {
        spread(pixel + 1, 7.0 / 16.0);
    }
    if pixel < 12 {
        if pixel & 3 != 0 {
            spread(pixel + 3, 3.0 / 16.0);
        }
        spread(pixel + 4, 5.0 / 16.0);
        if pixel & 3 != 3 {
            spread(pixel + 5, 1.0 / 16.0);
        }
    }
}

#[inline]
fn encode_565(color: [f32; 3]) -> u16 {
    let r = (color[0].clamp(0.0, 1.0) * 31.0 + 0.5) as u16;
    let g = (color[1].clamp(0.0, 1.0) * 63.0 + 0.5) as u16;
    let b = (color[2].clamp(0.0, 1.0) * 31.0 + 0.5) as u16;
    (r << 11) | (g << 5) | b
}

#[inline]
fn decode_565(value: u16) -> [f32; 3] {
    [
        f32::from((value >> 11) & 31) / 31.0,
        f32::from((value >> 5) & 63) / 63.0,
        f32::from(value & 31) / 31.0,
    ]
}

#[inline]
fn scale(color: [f32; 3], weights: [f32; 3]) -> [f32; 3] {
    [color[0] * weights[0], color[1] * weights[1], color[2] * weights[2]]
}

#[inline]
fn subtract(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    add(a, scale(subtract(b, a), [t; 3]))
}

#[inline]
fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// The 8 byte colour block shared by BC1, BC2 and BC3.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ColorBlock {
    endpoints: [u16; 2],
    bitmap: u32,
}

impl ColorBlock {
    /// Every pixel transparent black, in three colour mode.
    const TRANSPARENT: Self = Self {
        endpoints: [0x0000, 0xFFFF],
        bitmap: 0xFFFF_FFFF,
    };

    fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= 8);
        Self {
            endpoints: [
                u16::from_le_bytes([bytes[0], bytes[1]]),
                u16::from_le_bytes([bytes[2], bytes[3]]),
            ],
            bitmap: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    fn to_bytes(self) -> [u8; 8] {
        let mut bytes = [0; 8];
        bytes[0..2].copy_from_slice(&self.endpoints[0].to_le_bytes());
        bytes[2..4].copy_from_slice(&self.endpoints[1].to_le_bytes());
        bytes[4..8].copy_from_slice(&self.bitmap.to_le_bytes());
        bytes
    }

    fn decode(self, allow_transparent: bool) -> [HdrColor; PIXELS_PER_BLOCK] {
        let first = decode_565(self.endpoints[0]);
        let second = decode_565(self.endpoints[1]);
        let opaque = |[r, g, b]: [f32; 3]| HdrColor::new(r, g, b, 1.0);

        let palette = if allow_transparent && self.endpoints[0] <= self.endpoints[1] {
            [
                opaque(first),
                opaque(second),
                opaque(mix(first, second, 0.5)),
                HdrColor::TRANSPARENT_BLACK,
            ]
        } else {
            [
                opaque(first),
                opaque(second),
                opaque(mix(first, second, 1.0 / 3.0)),
                opaque(mix(first, second, 2.0 / 3.0)),
            ]
        };

        let mut pixels = [HdrColor::TRANSPARENT_BLACK; PIXELS_PER_BLOCK];
        for (pixel, color) in pixels.iter_mut().enumerate() {
            *color = palette[((self.bitmap >> (2 * pixel)) & 3) as usize];
        }
        pixels
    }
}

/// Encodes the colour of 16 pixels.
///
/// With a `color_key`, pixels whose alpha is below it become transparent,
/// which forces the three colour mode. Without one the four colour mode is
/// always used.
fn encode_color(
    pixels: &[HdrColor; PIXELS_PER_BLOCK],
    color_key: Option<f32>,
    settings: &BC15Settings,
) -> ColorBlock {
    settle(
        fit_color(pixels, color_key, settings),
        |pixels| fit_color(pixels, color_key, settings),
        |block| block.decode(color_key.is_some()),
    )
}

fn fit_color(
    pixels: &[HdrColor; PIXELS_PER_BLOCK],
    color_key: Option<f32>,
    settings: &BC15Settings,
) -> ColorBlock {
    let mut transparent = [false; PIXELS_PER_BLOCK];
    let mut steps = 4;

    if let Some(threshold) = color_key {
        if settings.dither_alpha {
            let mut errors = [[0.0f32; 1]; PIXELS_PER_BLOCK];
            for pixel in 0..PIXELS_PER_BLOCK {
                let alpha = pixels[pixel].a + errors[pixel][0];
                let rounded = if alpha < threshold { 0.0 } else { 1.0 };
                transparent[pixel] = rounded == 0.0;
                diffuse(&mut errors, pixel, [alpha - rounded]);
            }
        } else {
            for (flag, pixel) in transparent.iter_mut().zip(pixels) {
                *flag = pixel.a < threshold;
            }
        }

        let transparent_count = transparent.iter().filter(|&&flag| flag).count();
        if transparent_count == PIXELS_PER_BLOCK {
            return ColorBlock::TRANSPARENT;
        }
        if transparent_count > 0 {
            steps = 3;
        }
    }

    let (luminance, luminance_inverse) = if settings.uniform {
        ([1.0; 3], [1.0; 3])
    } else {
        (LUMINANCE, LUMINANCE_INVERSE)
    };

    // The optimizer sees the colours already rounded to RGB565.
    let mut points = [[0.0f32; 3]; PIXELS_PER_BLOCK];
    let mut point_count = 0;
    let mut errors = [[0.0f32; 3]; PIXELS_PER_BLOCK];

    for pixel in 0..PIXELS_PER_BLOCK {
        let mut color = pixels[pixel].rgb();
        if settings.dither_rgb {
            color = add(color, errors[pixel]);
        }

        let quantized = decode_565(encode_565(color));
        if settings.dither_rgb {
            diffuse(&mut errors, pixel, subtract(color, quantized));
        }

        if !transparent[pixel] {
            points[point_count] = scale(quantized, luminance);
            point_count += 1;
        }
    }

    let (a, b) = optimize_endpoints(&points[..point_count], steps);

    let packed_a = encode_565(scale(a, luminance_inverse));
    let packed_b = encode_565(scale(b, luminance_inverse));

    if steps == 4 && packed_a == packed_b {
        return ColorBlock {
            endpoints: [packed_a, packed_b],
            bitmap: 0,
        };
    }

    let a = scale(decode_565(packed_a), luminance);
    let b = scale(decode_565(packed_b), luminance);

    // Three colours need endpoint 0 <= endpoint 1, four colours the opposite.
    let (endpoints, first, second) = if (steps == 3) == (packed_a <= packed_b) {
        ([packed_a, packed_b], a, b)
    } else {
        ([packed_b, packed_a], b, a)
    };

    let mut palette = [first, second, [0.0; 3], [0.0; 3]];
    if steps == 3 {
        palette[2] = mix(first, second, 0.5);
    } else {
        palette[2] = mix(first, second, 1.0 / 3.0);
        palette[3] = mix(first, second, 2.0 / 3.0);
    }

    let step_max = (steps - 1) as f32;
    let mut direction = subtract(second, first);
    let length = dot(direction, direction);
    let direction_scale = if packed_a != packed_b && length > 0.0 {
        step_max / length
    } else {
        0.0
    };
    direction = scale(direction, [direction_scale; 3]);

    let step_map: &[u32] = if steps == 3 { &STEPS_3 } else { &STEPS_4 };

    let mut errors = [[0.0f32; 3]; PIXELS_PER_BLOCK];
    let mut bitmap = 0u32;

    for pixel in 0..PIXELS_PER_BLOCK {
        let index = if steps == 3 && transparent[pixel] {
            3
        } else {
            let mut color = scale(pixels[pixel].rgb(), luminance);
            if settings.dither_rgb {
                color = add(color, errors[pixel]);
            }

            let projection = dot(subtract(color, first), direction);
            let index = if projection <= 0.0 {
                0
            } else if projection >= step_max {
                1
            } else {
                step_map[(projection + 0.5) as usize]
            };

            if settings.dither_rgb {
                diffuse(&mut errors, pixel, subtract(color, palette[index as usize]));
            }
            index
        };

        bitmap = (index << 30) | (bitmap >> 2);
    }

    ColorBlock { endpoints, bitmap }
}

fn saturate(pixels: &[HdrColor; PIXELS_PER_BLOCK]) -> [HdrColor; PIXELS_PER_BLOCK] {
    pixels.map(|pixel| pixel.clamp(0.0, 1.0))
}

/// Encodes 16 RGBA pixels into a BC1 block.
///
/// Pixels with alpha below the threshold of `settings` become transparent
/// black. Channels are clamped to `[0, 1]`.
pub fn encode_bc1(pixels: &[HdrColor; PIXELS_PER_BLOCK], settings: &BC15Settings) -> [u8; 8] {
    let pixels = saturate(pixels);
    encode_color(&pixels, Some(settings.alpha_threshold), settings).to_bytes()
}

/// Decodes a BC1 block.
pub fn decode_bc1(block: &[u8; 8]) -> [HdrColor; PIXELS_PER_BLOCK] {
    ColorBlock::from_bytes(block).decode(true)
}

/// Encodes 16 RGBA pixels into a BC2 block with 4 bit alpha.
pub fn encode_bc2(pixels: &[HdrColor; PIXELS_PER_BLOCK], settings: &BC15Settings) -> [u8; 16] {
    let pixels = saturate(pixels);

    let mut alpha_bits = [0u32; 2];
    let mut errors = [[0.0f32; 1]; PIXELS_PER_BLOCK];
    for pixel in 0..PIXELS_PER_BLOCK {
        let mut alpha = pixels[pixel].a;
        if settings.dither_alpha {
            alpha += errors[pixel][0];
        }

        let quantized = ((alpha * 15.0 + 0.5) as i32).clamp(0, 15) as u32;
        alpha_bits[pixel >> 3] = (quantized << 28) | (alpha_bits[pixel >> 3] >> 4);

        if settings.dither_alpha {
            diffuse(&mut errors, pixel, [alpha - quantized as f32 / 15.0]);
        }
    }

    let mut block = [0; 16];
    block[0..4].copy_from_slice(&alpha_bits[0].to_le_bytes());
    block[4..8].copy_from_slice(&alpha_bits[1].to_le_bytes());
    block[8..].copy_from_slice(&encode_color(&pixels, None, settings).to_bytes());
    block
}

/// Decodes a BC2 block.
pub fn decode_bc2(block: &[u8; 16]) -> [HdrColor; PIXELS_PER_BLOCK] {
    let mut pixels = ColorBlock::from_bytes(&block[8..]).decode(false);

    let alpha_bits = u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);
    for (pixel, color) in pixels.iter_mut().enumerate() {
        color.a = ((alpha_bits >> (4 * pixel)) & 15) as f32 / 15.0;
    }
    pixels
}

/// Encodes 16 RGBA pixels into a BC3 block with interpolated alpha.
pub fn encode_bc3(pixels: &[HdrColor; PIXELS_PER_BLOCK], settings: &BC15Settings) -> [u8; 16] {
    let pixels = saturate(pixels);

    let mut alpha = pixels.map(|pixel| pixel.a);
    if settings.dither_alpha {
        let mut errors = [[0.0f32; 1]; PIXELS_PER_BLOCK];
        for pixel in 0..PIXELS_PER_BLOCK {
            let value = alpha[pixel] + errors[pixel][0];
            let quantized = ((value * 255.0 + 0.5) as i32).clamp(0, 255) as f32 / 255.0;
            diffuse(&mut errors, pixel, [value - quantized]);
            alpha[pixel] = quantized;
        }
    }

    let mut block = [0; 16];
    block[..8].copy_from_slice(&encode_ramp(&alpha, false));
    block[8..].copy_from_slice(&encode_color(&pixels, None, settings).to_bytes());
    block
}

/// Decodes a BC3 block.
pub fn decode_bc3(block: &[u8; 16]) -> [HdrColor; PIXELS_PER_BLOCK] {
    let mut pixels = ColorBlock::from_bytes(&block[8..]).decode(false);
    let alpha = decode_ramp(&block[..8], false);
    for (color, alpha) in pixels.iter_mut().zip(alpha) {
        color.a = alpha;
    }
    pixels
}
