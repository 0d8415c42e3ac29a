#![cfg_attr(docsrs, feature(doc_cfg))]
//! # bcn_codec
//!
//! CPU encoder and decoder for the BC1 to BC7 texture block compression formats.
//!
//! Every format compresses a tile of 4x4 pixels into one fixed size block.
//! The [`block`] module encodes and decodes single blocks. The [`encode`] and
//! [`decode`] modules run those over whole images.
//!
//! ## Supported block compressions
//!
//!  * BC1 (RGB, optional 1 bit alpha)
//!  * BC2 (RGBA, explicit 4 bit alpha)
//!  * BC3 (RGBA, interpolated alpha)
//!  * BC4 (R, unsigned or signed)
//!  * BC5 (RG, unsigned or signed)
//!  * BC6H (RGB half float, unsigned or signed)
//!  * BC7 (RGBA)
//!
//! ## Example
//!
//! ```
//! use bcn_codec::{decode::decompress_blocks, encode::compress_rgba8, BC7Settings, CompressionVariant};
//!
//! let width = 64;
//! let height = 64;
//! let rgba = vec![128u8; (width * height * 4) as usize];
//! let variant = CompressionVariant::BC7(BC7Settings::basic());
//!
//! let mut blocks = vec![0u8; variant.blocks_byte_size(width, height)];
//! compress_rgba8(variant, &rgba, &mut blocks, width, height, width as usize * 4).unwrap();
//!
//! let mut decoded = vec![0u8; rgba.len()];
//! decompress_blocks(variant, width, height, &blocks, &mut decoded).unwrap();
//! ```

mod bits;
pub mod block;
mod color;
pub mod decode;
pub mod encode;
mod error;
mod settings;

#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
pub use half;

pub use self::{
    bits::BitCursor,
    block::Decoded,
    color::{HdrColor, LdrColor},
    error::{Diagnostic, Error},
    settings::Signedness,
};

#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
pub use self::{color::IntColor, settings::BC6HSettings};

#[cfg(feature = "bc15")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc15")))]
pub use self::settings::BC15Settings;

#[cfg(feature = "bc7")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc7")))]
pub use self::settings::BC7Settings;

/// Compression variants supported by this crate.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum CompressionVariant {
    /// BC1 compression (RGB, optional 1 bit alpha)
    #[cfg(feature = "bc15")]
    BC1(BC15Settings),
    /// BC2 compression with sharp alpha (RGBA)
    #[cfg(feature = "bc15")]
    BC2(BC15Settings),
    /// BC3 compression with smooth alpha (RGBA)
    #[cfg(feature = "bc15")]
    BC3(BC15Settings),
    /// BC4 compression (R)
    #[cfg(feature = "bc15")]
    BC4(Signedness),
    /// BC5 compression (RG)
    #[cfg(feature = "bc15")]
    BC5(Signedness),
    /// BC6H compression (RGB HDR)
    #[cfg(feature = "bc6h")]
    BC6H(Signedness, BC6HSettings),
    /// BC7 compression with smooth alpha (RGBA)
    #[cfg(feature = "bc7")]
    BC7(BC7Settings),
}

impl CompressionVariant {
    /// Returns the bytes per row for the given width.
    ///
    /// The width is used to calculate how many blocks are needed per row,
    /// which is then multiplied by the block size.
    /// Width is rounded up to the nearest multiple of 4.
    pub const fn bytes_per_row(self, width: u32) -> u32 {
        let blocks_per_row = width.div_ceil(4);
        blocks_per_row * self.block_byte_size()
    }

    /// Returns the byte size required for storing compressed blocks for the given dimensions.
    ///
    /// Width and height are rounded up to the nearest multiple of 4.
    pub const fn blocks_byte_size(self, width: u32, height: u32) -> usize {
        let block_width = (width as usize).div_ceil(4);
        let block_height = (height as usize).div_ceil(4);
        let block_count = block_width * block_height;
        let block_size = self.block_byte_size() as usize;
        block_count * block_size
    }

    /// Size of one compressed block in bytes.
    pub const fn block_byte_size(self) -> u32 {
        match self {
            #[cfg(feature = "bc15")]
            CompressionVariant::BC1(_) | CompressionVariant::BC4(_) => 8,
            #[cfg(feature = "bc15")]
            CompressionVariant::BC2(_) | CompressionVariant::BC3(_) | CompressionVariant::BC5(_) => {
                16
            }
            #[cfg(feature = "bc6h")]
            CompressionVariant::BC6H(..) => 16,
            #[cfg(feature = "bc7")]
            CompressionVariant::BC7(_) => 16,
        }
    }

    /// Whether the format holds high dynamic range values that only a float output can carry.
    pub const fn is_hdr(self) -> bool {
        match self {
            #[cfg(feature = "bc6h")]
            CompressionVariant::BC6H(..) => true,
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// Short lower case name of the format.
    pub const fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "bc15")]
            CompressionVariant::BC1(_) => "bc1",
            #[cfg(feature = "bc15")]
            CompressionVariant::BC2(_) => "bc2",
            #[cfg(feature = "bc15")]
            CompressionVariant::BC3(_) => "bc3",
            #[cfg(feature = "bc15")]
            CompressionVariant::BC4(_) => "bc4",
            #[cfg(feature = "bc15")]
            CompressionVariant::BC5(_) => "bc5",
            #[cfg(feature = "bc6h")]
            CompressionVariant::BC6H(..) => "bc6h",
            #[cfg(feature = "bc7")]
            CompressionVariant::BC7(_) => "bc7",
        }
    }
}
