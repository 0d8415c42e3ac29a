#![allow(dead_code)]

use image::{Rgba, Rgba32FImage, RgbaImage};

pub mod metrics;

/// Deliberately not a multiple of 4, so the edge tiles get exercised.
pub const WIDTH: u32 = 37;
pub const HEIGHT: u32 = 29;

/// Deterministic noise in `[-1, 1]`.
fn noise(x: u32, y: u32, seed: u32) -> f32 {
    let mut hash = x
        .wrapping_mul(0x27d4_eb2d)
        .wrapping_add(y.wrapping_mul(0x1656_67b1))
        .wrapping_add(seed.wrapping_mul(0x9e37_79b9));
    hash ^= hash >> 15;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    (hash & 0xFFFF) as f32 / 32767.5 - 1.0
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Smooth colour ramps with a little noise on top. Alpha is opaque.
pub fn gradient_image() -> RgbaImage {
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let u = x as f32 / (WIDTH - 1) as f32;
        let v = y as f32 / (HEIGHT - 1) as f32;
        Rgba([
            unorm8(u + noise(x, y, 1) * 4.0 / 255.0),
            unorm8(v + noise(x, y, 2) * 4.0 / 255.0),
            unorm8(0.5 * (u + v) + noise(x, y, 3) * 4.0 / 255.0),
            255,
        ])
    })
}

/// A colour gradient whose alpha fades out diagonally.
pub fn alpha_image() -> RgbaImage {
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let u = x as f32 / (WIDTH - 1) as f32;
        let v = y as f32 / (HEIGHT - 1) as f32;
        Rgba([
            unorm8(0.2 + 0.6 * u),
            unorm8(0.8 - 0.5 * v),
            unorm8(0.4),
            unorm8(1.0 - 0.5 * (u + v)),
        ])
    })
}

/// Every pixel the same colour.
pub fn solid_image(color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba(color))
}

/// Linear light values from 0 to 16 with an opaque alpha.
pub fn hdr_image() -> Rgba32FImage {
    Rgba32FImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let u = x as f32 / (WIDTH - 1) as f32;
        let v = y as f32 / (HEIGHT - 1) as f32;
        let exposure = (4.0 * u).exp2();
        Rgba([exposure, exposure * (0.25 + 0.75 * v), exposure * 0.5, 1.0])
    })
}

/// Values in `[-1, 1]` for the signed BC4 and BC5 formats.
pub fn signed_image() -> Rgba32FImage {
    Rgba32FImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let u = x as f32 / (WIDTH - 1) as f32;
        let v = y as f32 / (HEIGHT - 1) as f32;
        Rgba([2.0 * u - 1.0, 1.0 - 2.0 * v, 0.0, 1.0])
    })
}

/// Clears the channels a format does not store to what its decoder returns.
pub fn mask_channels(rgba: &mut [u8], channels: usize) {
    for pixel in rgba.chunks_exact_mut(4) {
        for channel in channels..3 {
            pixel[channel] = 0;
        }
        if channels < 4 {
            pixel[3] = 255;
        }
    }
}
