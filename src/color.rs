//! Colour value types shared by all codecs.

use std::ops::{Add, Mul, Sub};

use bytemuck::{Pod, Zeroable};

/// An 8 bit per channel RGBA colour.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct LdrColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LdrColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn from_array(channels: [u8; 4]) -> Self {
        Self::new(channels[0], channels[1], channels[2], channels[3])
    }

    /// Returns channel `index` (0 = red, 3 = alpha).
    #[inline]
    pub const fn channel(self, index: usize) -> u8 {
        self.to_array()[index]
    }

    /// Returns a copy with channel `index` replaced.
    #[inline]
    pub const fn with_channel(self, index: usize, value: u8) -> Self {
        let mut channels = self.to_array();
        channels[index] = value;
        Self::from_array(channels)
    }

    /// Returns a copy with channel `index` exchanged with alpha.
    #[inline]
    pub const fn swap_with_alpha(self, index: usize) -> Self {
        let mut channels = self.to_array();
        let alpha = channels[3];
        channels[3] = channels[index];
        channels[index] = alpha;
        Self::from_array(channels)
    }

    /// Converts to normalized floats.
    pub fn to_hdr(self) -> HdrColor {
        const SCALE: f32 = 1.0 / 255.0;
        HdrColor::new(
            f32::from(self.r) * SCALE,
            f32::from(self.g) * SCALE,
            f32::from(self.b) * SCALE,
            f32::from(self.a) * SCALE,
        )
    }
}

/// A floating point RGBA colour. Channels are not clamped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct HdrColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl HdrColor {
    pub const TRANSPARENT_BLACK: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const OPAQUE_BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn from_array(channels: [f32; 4]) -> Self {
        Self::new(channels[0], channels[1], channels[2], channels[3])
    }

    pub const fn rgb(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn clamp(self, min: f32, max: f32) -> Self {
        Self::new(
            self.r.clamp(min, max),
            self.g.clamp(min, max),
            self.b.clamp(min, max),
            self.a.clamp(min, max),
        )
    }

    /// Linear interpolation towards `other`.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// Converts to 8 bit channels, clamping to `[0, 1]` and rounding to nearest.
    pub fn to_ldr(self) -> LdrColor {
        let quantize = |value: f32| (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        LdrColor::new(
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        )
    }
}

impl Add for HdrColor {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a + rhs.a,
        )
    }
}

impl Sub for HdrColor {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.r - rhs.r,
            self.g - rhs.g,
            self.b - rhs.b,
            self.a - rhs.a,
        )
    }
}

impl Mul<f32> for HdrColor {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}

#[cfg(feature = "bc6h")]
pub use self::int_color::IntColor;
#[cfg(feature = "bc6h")]
pub(crate) use self::int_color::F16_MAX;

#[cfg(feature = "bc6h")]
mod int_color {
    use std::ops::{Add, Sub};

    use bytemuck::{Pod, Zeroable};
    use half::f16;

    use super::HdrColor;

    /// Largest finite half float magnitude as raw bits.
    pub(crate) const F16_MAX: i32 = 0x7BFF;
    const F16_SIGN_MASK: u16 = 0x8000;
    const F16_MAGNITUDE_MASK: u16 = 0x7FFF;

    /// A signed integer RGB colour in the working precision of BC6H.
    ///
    /// The channels hold half float bit patterns (sign-magnitude for signed
    /// formats) or quantized endpoint values, depending on the stage.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
    #[repr(C)]
    pub struct IntColor {
        pub r: i32,
        pub g: i32,
        pub b: i32,
        pad: i32,
    }

    impl IntColor {
        pub const fn new(r: i32, g: i32, b: i32) -> Self {
            Self { r, g, b, pad: 0 }
        }

        pub const fn to_array(self) -> [i32; 3] {
            [self.r, self.g, self.b]
        }

        pub const fn from_array(channels: [i32; 3]) -> Self {
            Self::new(channels[0], channels[1], channels[2])
        }

        #[inline]
        pub const fn channel(self, index: usize) -> i32 {
            self.to_array()[index]
        }

        #[inline]
        pub const fn with_channel(self, index: usize, value: i32) -> Self {
            let mut channels = self.to_array();
            channels[index] = value;
            Self::from_array(channels)
        }

        /// Converts a float colour through half precision into integer bit patterns.
        ///
        /// Unsigned formats flush negative values to zero. Signed formats store
        /// sign and magnitude, with the magnitude clamped to the largest finite half.
        /// NaN becomes 0.
        pub fn from_hdr(color: HdrColor, signed: bool) -> Self {
            let convert = |value: f32| {
                if value.is_nan() {
                    return 0;
                }
                let bits = f16::from_f32(value).to_bits();
                if signed {
                    let magnitude = i32::from(bits & F16_MAGNITUDE_MASK).min(F16_MAX);
                    if bits & F16_SIGN_MASK != 0 {
                        -magnitude
                    } else {
                        magnitude
                    }
                } else if bits & F16_SIGN_MASK != 0 {
                    0
                } else {
                    i32::from(bits).min(F16_MAX)
                }
            };
            Self::new(convert(color.r), convert(color.g), convert(color.b))
        }

        /// Converts integer bit patterns back into half floats.
        pub fn to_f16(self, signed: bool) -> [f16; 3] {
            let convert = |value: i32| {
                if signed && value < 0 {
                    f16::from_bits(F16_SIGN_MASK | (-value) as u16)
                } else {
                    f16::from_bits(value as u16)
                }
            };
            [convert(self.r), convert(self.g), convert(self.b)]
        }

        /// Sign extends each channel from the given bit widths.
        pub fn sign_extend(self, precision: [u8; 3]) -> Self {
            let extend = |value: i32, bits: u8| {
                let shift = 32 - u32::from(bits);
                (value << shift) >> shift
            };
            Self::new(
                extend(self.r, precision[0]),
                extend(self.g, precision[1]),
                extend(self.b, precision[2]),
            )
        }

        /// Keeps only the low bits of each channel.
        pub fn wrap(self, precision: [u8; 3]) -> Self {
            let mask = |bits: u8| (1i32 << bits) - 1;
            Self::new(
                self.r & mask(precision[0]),
                self.g & mask(precision[1]),
                self.b & mask(precision[2]),
            )
        }

        pub fn clamp(self, min: i32, max: i32) -> Self {
            Self::new(
                self.r.clamp(min, max),
                self.g.clamp(min, max),
                self.b.clamp(min, max),
            )
        }

        /// Squared euclidean distance.
        #[inline]
        pub fn distance_squared(self, other: Self) -> f32 {
            let dr = self.r as f32 - other.r as f32;
            let dg = self.g as f32 - other.g as f32;
            let db = self.b as f32 - other.b as f32;
            dr * dr + dg * dg + db * db
        }
    }

    impl Add for IntColor {
        type Output = Self;

        #[inline]
        fn add(self, rhs: Self) -> Self {
            Self::new(
                self.r.wrapping_add(rhs.r),
                self.g.wrapping_add(rhs.g),
                self.b.wrapping_add(rhs.b),
            )
        }
    }

    impl Sub for IntColor {
        type Output = Self;

        #[inline]
        fn sub(self, rhs: Self) -> Self {
            Self::new(
                self.r.wrapping_sub(rhs.r),
                self.g.wrapping_sub(rhs.g),
                self.b.wrapping_sub(rhs.b),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldr_hdr_conversion_is_exact_for_all_values() {
        for value in 0..=255u8 {
            let color = LdrColor::new(value, 255 - value, value / 2, value);
            assert_eq!(color.to_hdr().to_ldr(), color);
        }
    }

    #[test]
    fn hdr_to_ldr_clamps() {
        let color = HdrColor::new(-0.5, 1.5, 0.5, 1.0).to_ldr();
        assert_eq!(color, LdrColor::new(0, 255, 128, 255));
    }

    #[test]
    fn swap_with_alpha_exchanges_channels() {
        let color = LdrColor::new(1, 2, 3, 4);
        assert_eq!(color.swap_with_alpha(0), LdrColor::new(4, 2, 3, 1));
        assert_eq!(color.swap_with_alpha(1), LdrColor::new(1, 4, 3, 2));
        assert_eq!(color.swap_with_alpha(2), LdrColor::new(1, 2, 4, 3));
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn int_color_sign_extension() {
        let color = IntColor::new(0b1_0000, 0b0_1111, 0b11_1111).sign_extend([5, 5, 6]);
        assert_eq!(color, IntColor::new(-16, 15, -1));
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn int_color_half_round_trip() {
        let color = HdrColor::new(1.0, -2.0, 65504.0, 1.0);

        let unsigned = IntColor::from_hdr(color, false);
        assert_eq!(unsigned, IntColor::new(0x3C00, 0, 0x7BFF));

        let signed = IntColor::from_hdr(color, true);
        assert_eq!(signed, IntColor::new(0x3C00, -0x4000, 0x7BFF));

        let halves = signed.to_f16(true);
        assert_eq!(halves[0].to_f32(), 1.0);
        assert_eq!(halves[1].to_f32(), -2.0);
        assert_eq!(halves[2].to_f32(), 65504.0);
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn int_color_nan_is_zero() {
        let color = HdrColor::new(f32::NAN, -f32::NAN, f32::INFINITY, 1.0);
        assert_eq!(IntColor::from_hdr(color, false), IntColor::new(0, 0, 0x7BFF));
        assert_eq!(IntColor::from_hdr(color, true), IntColor::new(0, 0, 0x7BFF));
    }
}
