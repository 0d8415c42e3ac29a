//! CPU based encoding of whole images.
//!
//! Images are cut into tiles of 4x4 pixels. Tiles that reach over the right
//! or bottom edge repeat the last column and row of the image.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "rayon")]
use strength_reduce::StrengthReducedUsize;

#[cfg(feature = "bc15")]
use crate::block::{encode_bc1, encode_bc2, encode_bc3, encode_bc4, encode_bc5};
#[cfg(feature = "bc6h")]
use crate::block::encode_bc6h;
#[cfg(feature = "bc7")]
use crate::block::encode_bc7;
use crate::{
    block::PIXELS_PER_BLOCK,
    color::{HdrColor, LdrColor},
    error::Error,
    CompressionVariant,
};

const CHANNELS: usize = 4;

/// A row-major image whose pixels can be read as float colours.
trait PixelSource: Sync {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn pixel(&self, x: usize, y: usize) -> HdrColor;

    /// Loads the tile at block coordinates `(xx, yy)`, clamping at the image edges.
    fn load_block(&self, xx: usize, yy: usize) -> [HdrColor; PIXELS_PER_BLOCK] {
        std::array::from_fn(|pixel| {
            let x = (xx * 4 + pixel % 4).min(self.width() - 1);
            let y = (yy * 4 + pixel / 4).min(self.height() - 1);
            self.pixel(x, y)
        })
    }
}

struct Rgba8Image<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl PixelSource for Rgba8Image<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> HdrColor {
        let row = &self.data[y * self.stride..][..self.width * CHANNELS];
        let pixels: &[LdrColor] = bytemuck::cast_slice(row);
        pixels[x].to_hdr()
    }
}

struct Rgba32fImage<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl PixelSource for Rgba32fImage<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> HdrColor {
        let row = &self.data[y * self.stride..][..self.width * CHANNELS];
        let pixels: &[HdrColor] = bytemuck::cast_slice(row);
        pixels[x]
    }
}

/// Compresses raw RGBA8 data into BC1-7 block compressed format.
///
/// # Data Layout Requirements
/// The input data must be in RGBA8 format (8 bits per channel, 32 bits per pixel). The data is
/// expected to be in row-major order, with optional stride for padding between rows.
///
/// Width and height do not need to be multiples of 4.
///
/// # Buffer Requirements
/// The destination buffer must have sufficient capacity to store the compressed blocks.
/// The required size can be calculated using [`CompressionVariant::blocks_byte_size()`].
///
/// # Arguments
/// * `variant` - The block compression format to use
/// * `rgba_data` - Source RGBA8 pixel data
/// * `blocks_buffer` - Destination buffer for the compressed blocks
/// * `width` - Width of the image in pixels
/// * `height` - Height of the image in pixels
/// * `stride` - Number of bytes per row in the source data. `width * 4` for tightly packed data.
///
/// # Example
/// ```
/// use bcn_codec::{encode::compress_rgba8, BC15Settings, CompressionVariant};
///
/// let rgba_data = vec![0u8; 256 * 256 * 4];
/// let width = 256;
/// let height = 256;
/// let stride = width as usize * 4;
/// let variant = CompressionVariant::BC1(BC15Settings::basic());
///
/// let mut blocks_buffer = vec![0u8; variant.blocks_byte_size(width, height)];
///
/// compress_rgba8(
///     variant,
///     &rgba_data,
///     &mut blocks_buffer,
///     width,
///     height,
///     stride,
/// )
/// .unwrap();
/// ```
pub fn compress_rgba8(
    variant: CompressionVariant,
    rgba_data: &[u8],
    blocks_buffer: &mut [u8],
    width: u32,
    height: u32,
    stride: usize,
) -> Result<(), Error> {
    validate(rgba_data.len(), blocks_buffer.len(), variant, width, height, stride)?;

    let image = Rgba8Image {
        data: rgba_data,
        width: width as usize,
        height: height as usize,
        stride,
    };
    compress(variant, &image, blocks_buffer);
    Ok(())
}

/// Compresses raw RGBA32F data into BC1-7 block compressed format.
///
/// Works like [`compress_rgba8`], with `stride` counted in `f32` values instead of bytes.
/// This is the input to use for BC6H and for signed BC4 and BC5 data, whose
/// values leave `[0, 1]`. The other formats clamp to `[0, 1]`.
pub fn compress_rgba32f(
    variant: CompressionVariant,
    rgba_data: &[f32],
    blocks_buffer: &mut [u8],
    width: u32,
    height: u32,
    stride: usize,
) -> Result<(), Error> {
    validate(rgba_data.len(), blocks_buffer.len(), variant, width, height, stride)?;

    let image = Rgba32fImage {
        data: rgba_data,
        width: width as usize,
        height: height as usize,
        stride,
    };
    compress(variant, &image, blocks_buffer);
    Ok(())
}

fn validate(
    data_len: usize,
    blocks_len: usize,
    variant: CompressionVariant,
    width: u32,
    height: u32,
    stride: usize,
) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let row = width as usize * CHANNELS;
    if stride < row {
        return Err(Error::StrideTooSmall { stride, row });
    }

    let required = stride * (height as usize - 1) + row;
    if data_len < required {
        return Err(Error::PixelDataTooSmall {
            required,
            actual: data_len,
        });
    }

    let required = variant.blocks_byte_size(width, height);
    if blocks_len < required {
        return Err(Error::OutputTooSmall {
            required,
            actual: blocks_len,
        });
    }

    Ok(())
}

fn compress(variant: CompressionVariant, image: &impl PixelSource, blocks_buffer: &mut [u8]) {
    let block_width = image.width().div_ceil(4);
    let block_height = image.height().div_ceil(4);
    let block_size = variant.block_byte_size() as usize;
    let blocks_buffer = &mut blocks_buffer[..block_width * block_height * block_size];

    log::trace!(
        "compressing {}x{} pixels into {} {} blocks",
        image.width(),
        image.height(),
        block_width * block_height,
        variant.name()
    );

    #[cfg(feature = "rayon")]
    {
        let block_width = StrengthReducedUsize::new(block_width);
        blocks_buffer
            .par_chunks_mut(block_size)
            .enumerate()
            .for_each(|(index, block)| {
                let (yy, xx) = StrengthReducedUsize::div_rem(index, block_width);
                encode_block(variant, &image.load_block(xx, yy), block);
            });
    }

    #[cfg(not(feature = "rayon"))]
    for (index, block) in blocks_buffer.chunks_exact_mut(block_size).enumerate() {
        let (yy, xx) = (index / block_width, index % block_width);
        encode_block(variant, &image.load_block(xx, yy), block);
    }
}

/// Encodes one tile into `block`, which holds exactly one block.
fn encode_block(
    variant: CompressionVariant,
    pixels: &[HdrColor; PIXELS_PER_BLOCK],
    block: &mut [u8],
) {
    match variant {
        #[cfg(feature = "bc15")]
        CompressionVariant::BC1(settings) => block.copy_from_slice(&encode_bc1(pixels, &settings)),
        #[cfg(feature = "bc15")]
        CompressionVariant::BC2(settings) => block.copy_from_slice(&encode_bc2(pixels, &settings)),
        #[cfg(feature = "bc15")]
        CompressionVariant::BC3(settings) => block.copy_from_slice(&encode_bc3(pixels, &settings)),
        #[cfg(feature = "bc15")]
        CompressionVariant::BC4(signedness) => {
            block.copy_from_slice(&encode_bc4(&pixels.map(|pixel| pixel.r), signedness))
        }
        #[cfg(feature = "bc15")]
        CompressionVariant::BC5(signedness) => {
            block.copy_from_slice(&encode_bc5(pixels, signedness))
        }
        #[cfg(feature = "bc6h")]
        CompressionVariant::BC6H(signedness, settings) => {
            block.copy_from_slice(&encode_bc6h(pixels, signedness, &settings))
        }
        #[cfg(feature = "bc7")]
        CompressionVariant::BC7(settings) => block.copy_from_slice(&encode_bc7(pixels, &settings)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_tiles_repeat_the_last_pixel() {
        let mut data = vec![0u8; 5 * 5 * 4];
        for (index, pixel) in data.chunks_exact_mut(4).enumerate() {
            pixel.copy_from_slice(&[index as u8, 0, 0, 255]);
        }
        let image = Rgba8Image {
            data: &data,
            width: 5,
            height: 5,
            stride: 20,
        };

        let tile = image.load_block(1, 1);
        let last = LdrColor::new(24, 0, 0, 255).to_hdr();
        assert!(tile.iter().all(|&pixel| pixel == last));

        let tile = image.load_block(1, 0);
        assert_eq!(tile[0], LdrColor::new(4, 0, 0, 255).to_hdr());
        assert_eq!(tile[15], LdrColor::new(19, 0, 0, 255).to_hdr());
    }

    #[test]
    fn stride_skips_padding() {
        let data = [1.0, 0.5, 0.25, 1.0, -7.0, -7.0, 0.0, 0.0, 0.0, 1.0];
        let image = Rgba32fImage {
            data: &data,
            width: 1,
            height: 2,
            stride: 6,
        };
        assert_eq!(image.pixel(0, 0), HdrColor::new(1.0, 0.5, 0.25, 1.0));
        assert_eq!(image.pixel(0, 1), HdrColor::new(0.0, 0.0, 0.0, 1.0));
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn rejects_bad_buffers() {
        use crate::BC7Settings;

        let variant = CompressionVariant::BC7(BC7Settings::very_fast());
        let data = vec![0u8; 8 * 8 * 4];
        let mut blocks = vec![0u8; variant.blocks_byte_size(8, 8)];

        assert_eq!(
            compress_rgba8(variant, &data, &mut blocks, 0, 8, 32),
            Err(Error::EmptyImage {
                width: 0,
                height: 8
            })
        );
        assert_eq!(
            compress_rgba8(variant, &data, &mut blocks, 8, 8, 16),
            Err(Error::StrideTooSmall {
                stride: 16,
                row: 32
            })
        );
        assert_eq!(
            compress_rgba8(variant, &data[..100], &mut blocks, 8, 8, 32),
            Err(Error::PixelDataTooSmall {
                required: 256,
                actual: 100
            })
        );
        assert_eq!(
            compress_rgba8(variant, &data, &mut blocks[..16], 8, 8, 32),
            Err(Error::OutputTooSmall {
                required: 64,
                actual: 16
            })
        );
        assert_eq!(compress_rgba8(variant, &data, &mut blocks, 8, 8, 32), Ok(()));
    }
}
