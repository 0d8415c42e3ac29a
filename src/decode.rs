//! CPU based decoding of whole images.
//!
//! Decoded tiles that reach over the right or bottom edge of the image are cropped.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "bc15")]
use crate::block::{decode_bc1, decode_bc2, decode_bc3, decode_bc4, decode_bc5};
#[cfg(feature = "bc6h")]
use crate::block::decode_bc6h;
#[cfg(feature = "bc7")]
use crate::block::decode_bc7;
use crate::{
    block::Decoded,
    color::HdrColor,
    error::Error,
    CompressionVariant,
};

const CHANNELS: usize = 4;

/// A channel type of the decoded output.
trait OutputChannel: Copy + Send + Sync {
    fn from_f32(value: f32) -> Self;
}

impl OutputChannel for u8 {
    /// Clamps to `[0, 1]`, so negative SNORM values become 0.
    #[inline]
    fn from_f32(value: f32) -> Self {
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl OutputChannel for f32 {
    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

/// Decodes one block of `variant`. `block` holds exactly one block.
fn decode_block(variant: CompressionVariant, block: &[u8]) -> Decoded<HdrColor> {
    let mut bytes = [0u8; 16];
    bytes[..block.len()].copy_from_slice(block);
    let [low, _]: [[u8; 8]; 2] = bytemuck::cast(bytes);

    let clean = |pixels| Decoded {
        pixels,
        diagnostic: None,
    };

    match variant {
        #[cfg(feature = "bc15")]
        CompressionVariant::BC1(_) => clean(decode_bc1(&low)),
        #[cfg(feature = "bc15")]
        CompressionVariant::BC2(_) => clean(decode_bc2(&bytes)),
        #[cfg(feature = "bc15")]
        CompressionVariant::BC3(_) => clean(decode_bc3(&bytes)),
        #[cfg(feature = "bc15")]
        CompressionVariant::BC4(signedness) => clean(
            decode_bc4(&low, signedness).map(|red| HdrColor::new(red, 0.0, 0.0, 1.0)),
        ),
        #[cfg(feature = "bc15")]
        CompressionVariant::BC5(signedness) => clean(decode_bc5(&bytes, signedness)),
        #[cfg(feature = "bc6h")]
        CompressionVariant::BC6H(signedness, _) => decode_bc6h(&bytes, signedness),
        #[cfg(feature = "bc7")]
        CompressionVariant::BC7(_) => decode_bc7(&bytes),
    }
}

/// Decodes one row of blocks into the output rows it covers. Returns the
/// number of blocks that carried a diagnostic.
fn decompress_row<P: OutputChannel>(
    variant: CompressionVariant,
    width: usize,
    yy: usize,
    blocks: &[u8],
    output: &mut [P],
) -> usize {
    let block_size = variant.block_byte_size() as usize;
    let row_pitch = width * CHANNELS;
    let rows = output.len() / row_pitch;
    let mut flagged = 0;

    for (xx, block) in blocks.chunks_exact(block_size).enumerate() {
        let decoded = decode_block(variant, block);
        if let Some(diagnostic) = decoded.diagnostic {
            log::warn!("block ({xx}, {yy}): {diagnostic}");
            flagged += 1;
        }

        for (pixel, color) in decoded.pixels.iter().enumerate() {
            let x = xx * 4 + pixel % 4;
            let y = pixel / 4;
            if x >= width || y >= rows {
                continue;
            }
            let offset = y * row_pitch + x * CHANNELS;
            for (target, value) in output[offset..offset + CHANNELS]
                .iter_mut()
                .zip(color.to_array())
            {
                *target = P::from_f32(value);
            }
        }
    }

    flagged
}

fn decompress<P: OutputChannel>(
    variant: CompressionVariant,
    width: u32,
    height: u32,
    blocks: &[u8],
    output: &mut [P],
) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let expected = variant.blocks_byte_size(width, height);
    if blocks.len() != expected {
        return Err(Error::BlockDataSize {
            expected,
            actual: blocks.len(),
        });
    }

    let width = width as usize;
    let height = height as usize;
    let required = width * height * CHANNELS;
    if output.len() < required {
        return Err(Error::OutputTooSmall {
            required,
            actual: output.len(),
        });
    }

    let output = &mut output[..required];
    let output_rows = 4 * width * CHANNELS;
    let block_rows = width.div_ceil(4) * variant.block_byte_size() as usize;

    #[cfg(feature = "rayon")]
    let flagged: usize = output
        .par_chunks_mut(output_rows)
        .zip(blocks.par_chunks(block_rows))
        .enumerate()
        .map(|(yy, (output, blocks))| decompress_row(variant, width, yy, blocks, output))
        .sum();

    #[cfg(not(feature = "rayon"))]
    let flagged: usize = output
        .chunks_mut(output_rows)
        .zip(blocks.chunks(block_rows))
        .enumerate()
        .map(|(yy, (output, blocks))| decompress_row(variant, width, yy, blocks, output))
        .sum();

    if flagged > 0 {
        log::debug!(
            "{flagged} of {} {} blocks decoded with diagnostics",
            width.div_ceil(4) * height.div_ceil(4),
            variant.name()
        );
    }

    Ok(())
}

/// Decompresses blocks into tightly packed RGBA8 data.
///
/// Values are clamped to `[0, 1]` and rounded to 8 bits. BC4 decodes into red,
/// BC5 into red and green. Blue is 0 and alpha is 255 for both. BC6H is not
/// supported, use [`decompress_blocks_f32`] instead.
///
/// Malformed blocks decode to the colours their format mandates. Each one is
/// reported as a warning through the `log` crate.
pub fn decompress_blocks(
    variant: CompressionVariant,
    width: u32,
    height: u32,
    blocks: &[u8],
    rgba8_output: &mut [u8],
) -> Result<(), Error> {
    if variant.is_hdr() {
        return Err(Error::UnsupportedVariant {
            variant: variant.name(),
        });
    }
    decompress(variant, width, height, blocks, rgba8_output)
}

/// Decompresses blocks into tightly packed RGBA32F data.
///
/// Values are not clamped. Signed BC4 and BC5 data keeps its negative values
/// and BC6H its full half float range.
pub fn decompress_blocks_f32(
    variant: CompressionVariant,
    width: u32,
    height: u32,
    blocks: &[u8],
    rgba32f_output: &mut [f32],
) -> Result<(), Error> {
    decompress(variant, width, height, blocks, rgba32f_output)
}
