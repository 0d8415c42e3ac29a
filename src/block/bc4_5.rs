//! BC4 and BC5: one or two independent 8 bit channel ramps.
//!
//! A ramp stores two endpoints and sixteen 3 bit indices. When the first
//! endpoint is larger than the second, the indices select from 8 evenly
//! spaced values. Otherwise they select from 6 evenly spaced values plus the
//! two extremes of the format. The same ramp stores the alpha of BC3.

use crate::{
    block::{optimize::optimize_ramp, settle, PIXELS_PER_BLOCK},
    color::HdrColor,
    settings::Signedness,
};

const INDEX_OFFSET: u32 = 16;
const INDEX_BITS: u32 = 3;

/// Converts a stored endpoint into its value.
#[inline]
fn endpoint_value(endpoint: u8, signed: bool) -> f32 {
    if signed {
        let endpoint = endpoint as i8;
        if endpoint == i8::MIN {
            -1.0
        } else {
            f32::from(endpoint) / 127.0
        }
    } else {
        f32::from(endpoint) / 255.0
    }
}

/// Quantizes a value into a stored endpoint. Signed values never produce -128.
#[inline]
fn quantize_endpoint(value: f32, signed: bool) -> u8 {
    if signed {
        ((value * 127.0).round() as i32).clamp(-127, 127) as i8 as u8
    } else {
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

/// All 8 values the indices of a ramp can select.
pub(crate) fn ramp_values(endpoints: [u8; 2], signed: bool) -> [f32; 8] {
    let first = endpoint_value(endpoints[0], signed);
    let second = endpoint_value(endpoints[1], signed);

    let eight_values = if signed {
        (endpoints[0] as i8) > (endpoints[1] as i8)
    } else {
        endpoints[0] > endpoints[1]
    };

    let mut ramp = [0.0; 8];
    ramp[0] = first;
    ramp[1] = second;

    if eight_values {
        for step in 1..7 {
            ramp[step + 1] = (first * (7 - step) as f32 + second * step as f32) / 7.0;
        }
    } else {
        for step in 1..5 {
            ramp[step + 1] = (first * (5 - step) as f32 + second * step as f32) / 5.0;
        }
        ramp[6] = if signed { -1.0 } else { 0.0 };
        ramp[7] = 1.0;
    }

    ramp
}

/// Decodes one 8 byte ramp block.
pub(crate) fn decode_ramp(block: &[u8], signed: bool) -> [f32; PIXELS_PER_BLOCK] {
    debug_assert!(block.len() >= 8);

    let ramp = ramp_values([block[0], block[1]], signed);
    let bits = u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);

    let mut values = [0.0; PIXELS_PER_BLOCK];
    for (pixel, value) in values.iter_mut().enumerate() {
        let index = (bits >> (INDEX_OFFSET + INDEX_BITS * pixel as u32)) & 7;
        *value = ramp[index as usize];
    }
    values
}

/// Encodes 16 values into one 8 byte ramp block.
///
/// Blocks that reach a boundary value of the format use the 6 value ramp,
/// whose two reserved entries represent the extremes exactly.
pub(crate) fn encode_ramp(values: &[f32; PIXELS_PER_BLOCK], signed: bool) -> [u8; 8] {
    settle(
        fit_ramp(values, signed),
        |values| fit_ramp(values, signed),
        |block| decode_ramp(block, signed),
    )
}

fn fit_ramp(values: &[f32; PIXELS_PER_BLOCK], signed: bool) -> [u8; 8] {
    let (min_norm, max_norm) = if signed { (-1.0, 1.0) } else { (0.0, 1.0) };

    let values = values.map(|value| {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(min_norm, max_norm)
        }
    });

    let block_min = values.iter().copied().fold(max_norm, f32::min);
    let block_max = values.iter().copied().fold(min_norm, f32::max);

    let touches_boundary = block_min == min_norm
        || block_max == max_norm
        || (signed && values.contains(&0.0));

    let endpoints = if touches_boundary {
        let (low, high) = optimize_ramp(&values, 6, signed);
        [quantize_endpoint(low, signed), quantize_endpoint(high, signed)]
    } else {
        let (low, high) = optimize_ramp(&values, 8, signed);
        [quantize_endpoint(high, signed), quantize_endpoint(low, signed)]
    };

    let ramp = ramp_values(endpoints, signed);

    let mut bits = u64::from(endpoints[0]) | (u64::from(endpoints[1]) << 8);
    for (pixel, &value) in values.iter().enumerate() {
        let mut best_index = 0;
        let mut best_delta = f32::MAX;
        for (index, &candidate) in ramp.iter().enumerate() {
            let delta = (candidate - value).abs();
            if delta < best_delta {
                best_index = index;
                best_delta = delta;
            }
        }
        bits |= (best_index as u64) << (INDEX_OFFSET + INDEX_BITS * pixel as u32);
    }

    bits.to_le_bytes()
}

/// Encodes a BC4 block from 16 single channel values.
///
/// Unsigned values are expected in `[0, 1]`, signed values in `[-1, 1]`.
/// Values outside are clamped.
pub fn encode_bc4(values: &[f32; PIXELS_PER_BLOCK], signedness: Signedness) -> [u8; 8] {
    encode_ramp(values, signedness.is_signed())
}

/// Decodes a BC4 block into 16 single channel values.
pub fn decode_bc4(block: &[u8; 8], signedness: Signedness) -> [f32; PIXELS_PER_BLOCK] {
    decode_ramp(block, signedness.is_signed())
}

/// Encodes the red and green channels of 16 pixels into a BC5 block.
pub fn encode_bc5(pixels: &[HdrColor; PIXELS_PER_BLOCK], signedness: Signedness) -> [u8; 16] {
    let signed = signedness.is_signed();
    let red = encode_ramp(&pixels.map(|pixel| pixel.r), signed);
    let green = encode_ramp(&pixels.map(|pixel| pixel.g), signed);

    let mut block = [0; 16];
    block[..8].copy_from_slice(&red);
    block[8..].copy_from_slice(&green);
    block
}

/// Decodes a BC5 block. Blue is 0 and alpha is 1.
pub fn decode_bc5(block: &[u8; 16], signedness: Signedness) -> [HdrColor; PIXELS_PER_BLOCK] {
    let signed = signedness.is_signed();
    let red = decode_ramp(&block[..8], signed);
    let green = decode_ramp(&block[8..], signed);

    let mut pixels = [HdrColor::OPAQUE_BLACK; PIXELS_PER_BLOCK];
    for (pixel, color) in pixels.iter_mut().enumerate() {
        color.r = red[pixel];
        color.g = green[pixel];
    }
    pixels
}
