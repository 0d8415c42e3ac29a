use thiserror::Error;

/// Errors reported by the image level drivers in [`crate::encode`] and [`crate::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The image has no pixels.
    #[error("image dimensions {width}x{height} contain no pixels")]
    EmptyImage { width: u32, height: u32 },
    /// The pixel source holds fewer bytes or values than width, height and stride require.
    #[error("pixel data holds {actual} elements, but at least {required} are required")]
    PixelDataTooSmall { required: usize, actual: usize },
    /// The row stride is smaller than one row of pixels.
    #[error("stride {stride} is smaller than one row of {row} elements")]
    StrideTooSmall { stride: usize, row: usize },
    /// The compressed input does not hold exactly one block per tile.
    #[error("compressed data has {actual} bytes, expected {expected}")]
    BlockDataSize { expected: usize, actual: usize },
    /// The destination buffer cannot hold the result.
    #[error("output buffer has {actual} elements, but {required} are required")]
    OutputTooSmall { required: usize, actual: usize },
    /// The requested variant is not available for this pixel format.
    #[error("{variant} is not supported by this operation")]
    UnsupportedVariant { variant: &'static str },
}

/// A non-fatal finding while decoding a single block.
///
/// Malformed blocks still decode to the colours the format mandates. The
/// diagnostic tells the caller why it got those colours.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Error)]
pub enum Diagnostic {
    /// One of the four reserved BC6H mode selectors.
    #[error("BC6H: reserved mode {selector:#07b} encountered during decoding")]
    ReservedBc6hMode { selector: u8 },
    /// The BC7 mode selector has no bit set in its first byte.
    #[error("BC7: reserved mode 8 encountered during decoding")]
    ReservedBc7Mode,
}
