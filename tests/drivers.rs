//! The image drivers must produce exactly what the block functions produce
//! for each tile, whether or not the work is spread over threads.

use bcn_codec::{
    block::{self, PIXELS_PER_BLOCK},
    decode::decompress_blocks_f32,
    encode::{compress_rgba32f, compress_rgba8},
    CompressionVariant, HdrColor, LdrColor,
};

use crate::common::{HEIGHT, WIDTH};

mod common;

fn block_count() -> (usize, usize) {
    ((WIDTH as usize).div_ceil(4), (HEIGHT as usize).div_ceil(4))
}

fn load_tile(pixels: &[HdrColor], xx: usize, yy: usize) -> [HdrColor; PIXELS_PER_BLOCK] {
    std::array::from_fn(|pixel| {
        let x = (xx * 4 + pixel % 4).min(WIDTH as usize - 1);
        let y = (yy * 4 + pixel / 4).min(HEIGHT as usize - 1);
        pixels[y * WIDTH as usize + x]
    })
}

/// Encodes every tile with `encode` and concatenates the blocks in row-major order.
fn encode_tiles<const N: usize>(
    pixels: &[HdrColor],
    encode: impl Fn(&[HdrColor; PIXELS_PER_BLOCK]) -> [u8; N],
) -> Vec<u8> {
    let (block_width, block_height) = block_count();
    let mut blocks = Vec::with_capacity(block_width * block_height * N);
    for yy in 0..block_height {
        for xx in 0..block_width {
            blocks.extend_from_slice(&encode(&load_tile(pixels, xx, yy)));
        }
    }
    blocks
}

fn ldr_pixels(rgba: &[u8]) -> Vec<HdrColor> {
    rgba.chunks_exact(4)
        .map(|pixel| LdrColor::new(pixel[0], pixel[1], pixel[2], pixel[3]).to_hdr())
        .collect()
}

fn hdr_pixels(rgba: &[f32]) -> Vec<HdrColor> {
    rgba.chunks_exact(4)
        .map(|pixel| HdrColor::new(pixel[0], pixel[1], pixel[2], pixel[3]))
        .collect()
}

fn compress(variant: CompressionVariant, rgba: &[u8]) -> Vec<u8> {
    let mut blocks = vec![0; variant.blocks_byte_size(WIDTH, HEIGHT)];
    compress_rgba8(variant, rgba, &mut blocks, WIDTH, HEIGHT, WIDTH as usize * 4).unwrap();
    blocks
}

fn compress_f32(variant: CompressionVariant, rgba: &[f32]) -> Vec<u8> {
    let mut blocks = vec![0; variant.blocks_byte_size(WIDTH, HEIGHT)];
    compress_rgba32f(variant, rgba, &mut blocks, WIDTH, HEIGHT, WIDTH as usize * 4).unwrap();
    blocks
}

#[cfg(feature = "bc15")]
#[test]
fn bc15_matches_block_functions() {
    use bcn_codec::{BC15Settings, Signedness};

    let image = common::alpha_image();
    let pixels = ldr_pixels(&image);
    let settings = BC15Settings::dithered();

    assert_eq!(
        compress(CompressionVariant::BC1(settings), &image),
        encode_tiles(&pixels, |tile| block::encode_bc1(tile, &settings))
    );
    assert_eq!(
        compress(CompressionVariant::BC3(settings), &image),
        encode_tiles(&pixels, |tile| block::encode_bc3(tile, &settings))
    );

    let image = common::signed_image();
    let pixels = hdr_pixels(&image);
    assert_eq!(
        compress_f32(CompressionVariant::BC4(Signedness::Signed), &image),
        encode_tiles(&pixels, |tile| {
            block::encode_bc4(&tile.map(|pixel| pixel.r), Signedness::Signed)
        })
    );
}

#[cfg(feature = "bc6h")]
#[test]
fn bc6h_matches_block_functions() {
    use bcn_codec::{BC6HSettings, Signedness};

    let image = common::hdr_image();
    let pixels = hdr_pixels(&image);
    let settings = BC6HSettings::very_fast();
    let variant = CompressionVariant::BC6H(Signedness::Unsigned, settings);

    let blocks = compress_f32(variant, &image);
    assert_eq!(
        blocks,
        encode_tiles(&pixels, |tile| {
            block::encode_bc6h(tile, Signedness::Unsigned, &settings)
        })
    );

    let mut decoded = vec![0.0; image.len()];
    decompress_blocks_f32(variant, WIDTH, HEIGHT, &blocks, &mut decoded).unwrap();

    let (block_width, _) = block_count();
    for (index, block) in blocks.chunks_exact(16).enumerate() {
        let (xx, yy) = (index % block_width, index / block_width);
        let tile = block::decode_bc6h(block.try_into().unwrap(), Signedness::Unsigned);
        assert_eq!(tile.diagnostic, None);

        for (pixel, color) in tile.pixels.iter().enumerate() {
            let (x, y) = (xx * 4 + pixel % 4, yy * 4 + pixel / 4);
            if x < WIDTH as usize && y < HEIGHT as usize {
                let offset = (y * WIDTH as usize + x) * 4;
                assert_eq!(&decoded[offset..offset + 4], &color.to_array());
            }
        }
    }
}

#[cfg(feature = "bc7")]
#[test]
fn bc7_matches_block_functions() {
    use bcn_codec::BC7Settings;

    let image = common::gradient_image();
    let pixels = ldr_pixels(&image);
    let settings = BC7Settings::fast();

    assert_eq!(
        compress(CompressionVariant::BC7(settings), &image),
        encode_tiles(&pixels, |tile| block::encode_bc7(tile, &settings))
    );
}
