//! Encoding and decoding of single 4x4 blocks.
//!
//! Every function here works on 16 pixels in row-major order and on the raw
//! bytes of one block. The image level drivers in [`crate::encode`] and
//! [`crate::decode`] are built on top of them.

use crate::error::Diagnostic;

#[cfg(feature = "bc15")]
mod bc1_to_3;
#[cfg(feature = "bc15")]
mod bc4_5;
#[cfg(feature = "bc6h")]
mod bc6h;
#[cfg(feature = "bc7")]
mod bc7;
#[cfg(any(feature = "bc6h", feature = "bc7"))]
mod common;
#[cfg(any(feature = "bc15", feature = "bc6h", feature = "bc7"))]
mod optimize;

#[cfg(feature = "bc15")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc15")))]
pub use self::{
    bc1_to_3::{decode_bc1, decode_bc2, decode_bc3, encode_bc1, encode_bc2, encode_bc3},
    bc4_5::{decode_bc4, decode_bc5, encode_bc4, encode_bc5},
};
#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
pub use self::bc6h::{decode_bc6h, decode_bc6h_half, encode_bc6h};
#[cfg(feature = "bc7")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc7")))]
pub use self::bc7::{decode_bc7, encode_bc7};

/// Number of pixels in a block.
pub const PIXELS_PER_BLOCK: usize = 16;

/// The pixels of a decoded block, plus a diagnostic if the block was malformed.
///
/// Malformed blocks still produce the pixels the format mandates for them.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Decoded<T> {
    pub pixels: [T; PIXELS_PER_BLOCK],
    pub diagnostic: Option<Diagnostic>,
}

/// Extra encode passes spent on making a block reproduce itself.
#[cfg(any(feature = "bc15", feature = "bc6h", feature = "bc7"))]
const SETTLE_PASSES: usize = 4;

/// Turns `block` into one whose decoded pixels encode back to the same pixels.
///
/// Encoding an already decoded block must not lose more precision. The
/// decoded pixels are re-encoded until an encoding reproduces its input, and
/// the block that decoded to that input is returned. When no pass settles,
/// `block` is returned unchanged.
#[cfg(any(feature = "bc15", feature = "bc6h", feature = "bc7"))]
pub(crate) fn settle<B, P>(block: B, encode: impl Fn(&P) -> B, decode: impl Fn(&B) -> P) -> B
where
    B: Copy,
    P: PartialEq,
{
    let mut candidate = block;
    for _ in 0..SETTLE_PASSES {
        let decoded = decode(&candidate);
        let next = encode(&decoded);
        if decode(&next) == decoded {
            return candidate;
        }
        candidate = next;
    }
    block
}

#[cfg(all(test, any(feature = "bc15", feature = "bc6h", feature = "bc7")))]
mod tests {
    use super::*;

    #[test]
    fn settle_follows_encodings_to_a_fixed_point() {
        // Blocks store multiples of 0.2.
        let encode = |value: &f32| (value * 5.0).round() as i32;
        let decode = |block: &i32| *block as f32 / 5.0;
        assert_eq!(settle(2, encode, decode), 2);

        let noisy_encode = |value: &f32| (value * 5.0).round() as i32 + i32::from(*value < 0.3);
        assert_eq!(settle(0, noisy_encode, decode), 2);
    }

    #[test]
    fn settle_gives_up_on_cycles() {
        let encode = |value: &i32| 1 - *value;
        let decode = |block: &i32| *block;
        assert_eq!(settle(0, encode, decode), 0);
    }
}

/// Seeded test blocks shared by the codec tests.
#[cfg(test)]
pub(crate) mod samples {
    use super::PIXELS_PER_BLOCK;
    use crate::color::HdrColor;

    pub(crate) type Block = [HdrColor; PIXELS_PER_BLOCK];

    /// A xorshift generator, so every run sees the same blocks.
    pub(crate) struct Samples(u32);

    impl Samples {
        pub(crate) fn new(seed: u32) -> Self {
            Self(seed.max(1))
        }

        /// A value in `[0, 1)`.
        pub(crate) fn next(&mut self) -> f32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            (x >> 8) as f32 / (1u32 << 24) as f32
        }

        fn color(&mut self, alpha: bool) -> HdrColor {
            let a = if alpha { self.next() } else { 1.0 };
            HdrColor::new(self.next(), self.next(), self.next(), a)
        }

        pub(crate) fn solid(&mut self, alpha: bool) -> Block {
            [self.color(alpha); PIXELS_PER_BLOCK]
        }

        /// A diagonal blend between two colours.
        pub(crate) fn gradient(&mut self, alpha: bool) -> Block {
            let (from, to) = (self.color(alpha), self.color(alpha));
            std::array::from_fn(|pixel| {
                let t = (pixel % 4 + pixel / 4) as f32 / 6.0;
                from.lerp(to, t)
            })
        }

        pub(crate) fn two_colors(&mut self, alpha: bool) -> Block {
            let colors = [self.color(alpha), self.color(alpha)];
            std::array::from_fn(|_| colors[usize::from(self.next() < 0.5)])
        }

        /// `count` solid, gradient and two colour blocks each.
        pub(crate) fn blocks(seed: u32, count: usize, alpha: bool) -> Vec<Block> {
            let mut samples = Self::new(seed);
            let mut blocks = Vec::with_capacity(count * 3);
            for _ in 0..count {
                blocks.push(samples.solid(alpha));
                blocks.push(samples.gradient(alpha));
                blocks.push(samples.two_colors(alpha));
            }
            blocks
        }
    }
}
