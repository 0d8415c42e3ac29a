//! BC6H: three channel half float blocks, unsigned (UF16) or signed (SF16).
//!
//! Endpoints are stored as integers in the bit pattern space of half floats.
//! Fourteen modes trade endpoint precision against one or two regions, and
//! most modes store all but the first endpoint as deltas from it.

mod layout;

use half::f16;

use self::layout::{field_bits, Run};
use crate::{
    bits::BitCursor,
    block::{
        common::{
            best_shapes, fixup, is_fixup, region, region_pixels, weights, ComponentSearch,
            WEIGHT_MAX, WEIGHT_ROUND, WEIGHT_SHIFT,
        },
        optimize::optimize_endpoints,
        settle, Decoded, PIXELS_PER_BLOCK,
    },
    color::{HdrColor, IntColor, F16_MAX},
    error::Diagnostic,
    settings::{BC6HSettings, Signedness},
};

/// Largest finite half float.
const HALF_MAX: f32 = 65504.0;

/// Two endpoints for each of the (up to) two regions.
type Endpoints = [[IntColor; 2]; 2];

struct ModeInfo {
    selector: u8,
    /// Region count minus one.
    partitions: usize,
    /// Whether all endpoints but the first are stored as deltas.
    transformed: bool,
    index_precision: u8,
    /// Bit widths of the first endpoint and of the other endpoints.
    precision: [[u8; 3]; 2],
    layout: &'static [Run],
}

impl ModeInfo {
    const fn selector_bits(&self) -> usize {
        if self.selector < 2 {
            2
        } else {
            5
        }
    }

    const fn shape_count(&self) -> usize {
        if self.partitions > 0 {
            32
        } else {
            1
        }
    }

    const fn index_count(&self) -> usize {
        1 << self.index_precision
    }

    /// Precision every endpoint has once the deltas are resolved.
    const fn anchor(&self) -> [u8; 3] {
        self.precision[0]
    }
}

const fn mode(
    selector: u8,
    partitions: usize,
    transformed: bool,
    precision: [[u8; 3]; 2],
    layout: &'static [Run],
) -> ModeInfo {
    ModeInfo {
        selector,
        partitions,
        transformed,
        index_precision: if partitions > 0 { 3 } else { 4 },
        precision,
        layout,
    }
}

static MODES: [ModeInfo; 14] = [
    mode(0x00, 1, true, [[10, 10, 10], [5, 5, 5]], layout::MODE_0),
    mode(0x01, 1, true, [[7, 7, 7], [6, 6, 6]], layout::MODE_1),
    mode(0x02, 1, true, [[11, 11, 11], [5, 4, 4]], layout::MODE_2),
    mode(0x06, 1, true, [[11, 11, 11], [4, 5, 4]], layout::MODE_3),
    mode(0x0A, 1, true, [[11, 11, 11], [4, 4, 5]], layout::MODE_4),
    mode(0x0E, 1, true, [[9, 9, 9], [5, 5, 5]], layout::MODE_5),
    mode(0x12, 1, true, [[8, 8, 8], [6, 5, 5]], layout::MODE_6),
    mode(0x16, 1, true, [[8, 8, 8], [5, 6, 5]], layout::MODE_7),
    mode(0x1A, 1, true, [[8, 8, 8], [5, 5, 6]], layout::MODE_8),
    mode(0x1E, 1, false, [[6, 6, 6], [6, 6, 6]], layout::MODE_9),
    mode(0x03, 0, false, [[10, 10, 10], [10, 10, 10]], layout::MODE_10),
    mode(0x07, 0, true, [[11, 11, 11], [9, 9, 9]], layout::MODE_11),
    mode(0x0B, 0, true, [[12, 12, 12], [8, 8, 8]], layout::MODE_12),
    mode(0x0F, 0, true, [[16, 16, 16], [4, 4, 4]], layout::MODE_13),
];

/// The mode with this selector. `None` for the reserved selectors.
fn mode_info(selector: u8) -> Option<&'static ModeInfo> {
    MODES.iter().find(|info| info.selector == selector)
}

/// Scales a stored component to the 16 bit interpolation range.
fn unquantize(component: i32, precision: u8, signed: bool) -> i32 {
    let precision = i32::from(precision);
    if signed {
        if precision >= 16 {
            return component;
        }
        let magnitude = component.abs();
        let unquantized = if magnitude == 0 {
            0
        } else if magnitude >= (1 << (precision - 1)) - 1 {
            0x7FFF
        } else {
            ((magnitude << 15) + 0x4000) >> (precision - 1)
        };
        if component < 0 {
            -unquantized
        } else {
            unquantized
        }
    } else if precision >= 15 || component == 0 {
        component
    } else if component == (1 << precision) - 1 {
        0xFFFF
    } else {
        ((component << 16) + 0x8000) >> precision
    }
}

/// Rescales an interpolated value into half float bit patterns.
#[inline]
fn finish_unquantize(component: i32, signed: bool) -> i32 {
    if signed {
        if component < 0 {
            -(((-component) * 31) >> 5)
        } else {
            (component * 31) >> 5
        }
    } else {
        (component * 31) >> 6
    }
}

/// Inverse of [`unquantize`] for half float bit patterns.
fn quantize(value: i32, precision: u8, signed: bool) -> i32 {
    let precision = i32::from(precision);
    if signed {
        if precision >= 16 {
            return value;
        }
        let magnitude = (value.abs() << (precision - 1)) / (F16_MAX + 1);
        if value < 0 {
            -magnitude
        } else {
            magnitude
        }
    } else if precision >= 15 {
        value
    } else {
        (value << precision) / (F16_MAX + 1)
    }
}

fn quantize_color(color: IntColor, precision: [u8; 3], signed: bool) -> IntColor {
    IntColor::new(
        quantize(color.r, precision[0], signed),
        quantize(color.g, precision[1], signed),
        quantize(color.b, precision[2], signed),
    )
}

#[inline]
fn interpolate(a: i32, b: i32, weight: u32) -> i32 {
    let weight = weight as i32;
    (a * (WEIGHT_MAX as i32 - weight) + b * weight + WEIGHT_ROUND as i32) >> WEIGHT_SHIFT
}

/// Palette of an endpoint pair that has not been quantized yet.
fn unquantized_palette(pair: [IntColor; 2], info: &ModeInfo) -> [IntColor; 16] {
    let mut palette = [IntColor::default(); 16];
    for (entry, &weight) in palette.iter_mut().zip(weights(info.index_precision)) {
        *entry = IntColor::new(
            interpolate(pair[0].r, pair[1].r, weight),
            interpolate(pair[0].g, pair[1].g, weight),
            interpolate(pair[0].b, pair[1].b, weight),
        );
    }
    palette
}

/// Palette of a stored endpoint pair, exactly as a decoder produces it.
fn quantized_palette(pair: [IntColor; 2], info: &ModeInfo, signed: bool) -> [IntColor; 16] {
    let precision = info.anchor();
    let scale = |color: IntColor| {
        IntColor::new(
            unquantize(color.r, precision[0], signed),
            unquantize(color.g, precision[1], signed),
            unquantize(color.b, precision[2], signed),
        )
    };

    let mut palette = unquantized_palette([scale(pair[0]), scale(pair[1])], info);
    for entry in palette.iter_mut() {
        *entry = IntColor::new(
            finish_unquantize(entry.r, signed),
            finish_unquantize(entry.g, signed),
            finish_unquantize(entry.b, signed),
        );
    }
    palette
}

/// Nearest palette entry. The palette lies on a line, so the search stops as
/// soon as the error grows.
fn nearest(color: IntColor, palette: &[IntColor]) -> (usize, f32) {
    let mut best_index = 0;
    let mut best_error = color.distance_squared(palette[0]);
    for (index, &entry) in palette.iter().enumerate().skip(1) {
        if best_error <= 0.0 {
            break;
        }
        let error = color.distance_squared(entry);
        if error > best_error {
            break;
        }
        if error < best_error {
            best_error = error;
            best_index = index;
        }
    }
    (best_index, best_error)
}

/// Stores all endpoints but the first as deltas from it.
fn transform_forward(endpoints: &mut Endpoints, partitions: usize) {
    let anchor = endpoints[0][0];
    endpoints[0][1] = endpoints[0][1] - anchor;
    if partitions > 0 {
        endpoints[1][0] = endpoints[1][0] - anchor;
        endpoints[1][1] = endpoints[1][1] - anchor;
    }
}

/// Resolves deltas against the first endpoint, wrapping to its precision.
fn transform_inverse(
    endpoints: &mut Endpoints,
    partitions: usize,
    precision: [u8; 3],
    signed: bool,
) {
    let anchor = endpoints[0][0];
    let resolve = |delta: IntColor| {
        let value = (delta + anchor).wrap(precision);
        if signed {
            value.sign_extend(precision)
        } else {
            value
        }
    };

    endpoints[0][1] = resolve(endpoints[0][1]);
    if partitions > 0 {
        endpoints[1][0] = resolve(endpoints[1][0]);
        endpoints[1][1] = resolve(endpoints[1][1]);
    }
}

/// Bits needed to store `value`, including a sign bit for signed storage.
fn bit_width(value: i32, signed: bool) -> u32 {
    if value == 0 {
        0
    } else if value > 0 {
        32 - value.leading_zeros() + u32::from(signed)
    } else if signed {
        33 - (!value).leading_zeros()
    } else {
        u32::MAX
    }
}

/// Whether the (possibly delta encoded) endpoints fit the precision of the mode.
fn endpoints_fit(info: &ModeInfo, endpoints: &Endpoints, signed: bool) -> bool {
    let fits = |color: IntColor, precision: [u8; 3], signed: bool| {
        (0..3).all(|channel| {
            bit_width(color.channel(channel), signed) <= u32::from(precision[channel])
        })
    };

    let deltas_signed = signed || info.transformed;
    fits(endpoints[0][0], info.precision[0], signed)
        && fits(endpoints[0][1], info.precision[1], deltas_signed)
        && (info.partitions == 0
            || (fits(endpoints[1][0], info.precision[1], deltas_signed)
                && fits(endpoints[1][1], info.precision[1], deltas_signed)))
}

/// Makes sure the top index bit of every fix-up pixel is zero by swapping
/// the endpoints of its region and mirroring the region's indices.
fn swap_indices(
    info: &ModeInfo,
    shape: usize,
    endpoints: &mut Endpoints,
    indices: &mut [usize; PIXELS_PER_BLOCK],
) {
    let count = info.index_count();
    let high_bit = count >> 1;

    for region_id in 0..=info.partitions {
        if indices[fixup(info.partitions, shape, region_id)] & high_bit == 0 {
            continue;
        }
        endpoints[region_id].swap(0, 1);
        for (pixel, index) in indices.iter_mut().enumerate() {
            if region(info.partitions, shape, pixel) == region_id {
                *index = count - 1 - *index;
            }
        }
    }
}

/// Decodes a BC6H block into half floats.
///
/// Reserved modes decode to black and report
/// [`Diagnostic::ReservedBc6hMode`].
pub fn decode_bc6h_half(block: &[u8; 16], signedness: Signedness) -> Decoded<[f16; 3]> {
    let signed = signedness.is_signed();
    let mut cursor = BitCursor::from_block(*block);

    let mut selector = cursor.read_bits(2);
    if selector > 1 {
        selector |= cursor.read_bits(3) << 2;
    }

    let Some(info) = mode_info(selector) else {
        return Decoded {
            pixels: [[f16::ZERO; 3]; PIXELS_PER_BLOCK],
            diagnostic: Some(Diagnostic::ReservedBc6hMode { selector }),
        };
    };

    let mut endpoints: Endpoints = [[IntColor::default(); 2]; 2];
    let mut shape = 0;
    for (field, bit) in field_bits(info.layout) {
        let value = cursor.read_bit();
        match field.endpoint() {
            Some((region_id, endpoint, channel)) => {
                let color = &mut endpoints[region_id][endpoint];
                let bits = color.channel(channel) | (i32::from(value) << bit);
                *color = color.with_channel(channel, bits);
            }
            None => shape |= usize::from(value) << bit,
        }
    }

    if signed {
        endpoints[0][0] = endpoints[0][0].sign_extend(info.precision[0]);
    }
    if signed || info.transformed {
        endpoints[0][1] = endpoints[0][1].sign_extend(info.precision[1]);
        endpoints[1][0] = endpoints[1][0].sign_extend(info.precision[1]);
        endpoints[1][1] = endpoints[1][1].sign_extend(info.precision[1]);
    }
    if info.transformed {
        transform_inverse(&mut endpoints, info.partitions, info.anchor(), signed);
    }

    let palettes = [
        quantized_palette(endpoints[0], info, signed),
        quantized_palette(endpoints[1], info, signed),
    ];

    let mut pixels = [[f16::ZERO; 3]; PIXELS_PER_BLOCK];
    for (pixel, output) in pixels.iter_mut().enumerate() {
        let bits = if is_fixup(info.partitions, shape, pixel) {
            info.index_precision - 1
        } else {
            info.index_precision
        };
        let index = usize::from(cursor.read_bits(usize::from(bits)));
        *output = palettes[region(info.partitions, shape, pixel)][index].to_f16(signed);
    }
    debug_assert_eq!(cursor.remaining(), 0);

    Decoded {
        pixels,
        diagnostic: None,
    }
}

/// Decodes a BC6H block into float colours with an alpha of 1.
pub fn decode_bc6h(block: &[u8; 16], signedness: Signedness) -> Decoded<HdrColor> {
    let decoded = decode_bc6h_half(block, signedness);
    Decoded {
        pixels: decoded
            .pixels
            .map(|[r, g, b]| HdrColor::new(r.to_f32(), g.to_f32(), b.to_f32(), 1.0)),
        diagnostic: decoded.diagnostic,
    }
}

/// Encodes 16 pixels into a BC6H block. Alpha is ignored.
///
/// Unsigned encoding flushes negative values to zero. Values beyond the
/// largest finite half float are clamped to it.
pub fn encode_bc6h(
    pixels: &[HdrColor; PIXELS_PER_BLOCK],
    signedness: Signedness,
    settings: &BC6HSettings,
) -> [u8; 16] {
    settle(
        search_bc6h(pixels, signedness, settings),
        |pixels| search_bc6h(pixels, signedness, settings),
        |block| decode_bc6h(block, signedness).pixels,
    )
}

/// Searches the modes and shapes for the block closest to `pixels`.
fn search_bc6h(
    pixels: &[HdrColor; PIXELS_PER_BLOCK],
    signedness: Signedness,
    settings: &BC6HSettings,
) -> [u8; 16] {
    let mut encoder = BlockEncoder::new(pixels, signedness.is_signed());

    for info in MODES.iter() {
        if encoder.best_error <= 0.0 {
            break;
        }

        let shape_count = info.shape_count();
        let mut rough_errors = [0.0f32; 32];
        let mut rough_endpoints = [[[IntColor::default(); 2]; 2]; 32];
        for shape in 0..shape_count {
            (rough_errors[shape], rough_endpoints[shape]) = encoder.rough_error(info, shape);
        }

        let candidates = settings.shape_search.candidates(shape_count);
        for shape in best_shapes(&rough_errors[..shape_count], candidates) {
            if encoder.best_error <= 0.0 {
                break;
            }
            encoder.refine(info, shape, &rough_endpoints[shape]);
        }
    }

    encoder.block
}

struct BlockEncoder {
    signed: bool,
    /// The pixels as half float bit patterns.
    pixels: [IntColor; PIXELS_PER_BLOCK],
    float_pixels: [[f32; 3]; PIXELS_PER_BLOCK],
    best_error: f32,
    block: [u8; 16],
}

impl BlockEncoder {
    fn new(pixels: &[HdrColor; PIXELS_PER_BLOCK], signed: bool) -> Self {
        let low = if signed { -HALF_MAX } else { 0.0 };
        let float_pixels = pixels.map(|pixel| {
            pixel.rgb().map(|value| {
                if value.is_nan() {
                    0.0
                } else {
                    value.clamp(low, HALF_MAX)
                }
            })
        });
        let int_pixels = float_pixels
            .map(|[r, g, b]| IntColor::from_hdr(HdrColor::new(r, g, b, 1.0), signed));

        Self {
            signed,
            pixels: int_pixels,
            float_pixels,
            best_error: f32::MAX,
            block: [0; 16],
        }
    }

    /// Estimates how well a shape fits, using unquantized endpoints.
    fn rough_error(&self, info: &ModeInfo, shape: usize) -> (f32, Endpoints) {
        let (low, high) = if self.signed {
            (-F16_MAX, F16_MAX)
        } else {
            (0, F16_MAX)
        };

        let mut endpoints = [[IntColor::default(); 2]; 2];
        let mut error = 0.0;

        for (region_id, pair) in endpoints.iter_mut().enumerate().take(info.partitions + 1) {
            let (members, count) = region_pixels(info.partitions, shape, region_id);
            let members = &members[..count];

            match members {
                [only] => *pair = [self.pixels[*only]; 2],
                [first, second] => *pair = [self.pixels[*first], self.pixels[*second]],
                _ => {
                    let mut points = [[0.0f32; 3]; PIXELS_PER_BLOCK];
                    for (point, &pixel) in points.iter_mut().zip(members) {
                        *point = self.float_pixels[pixel];
                    }
                    let (a, b) = optimize_endpoints(&points[..count], 4);
                    let to_int = |[r, g, b]: [f32; 3]| {
                        IntColor::from_hdr(HdrColor::new(r, g, b, 1.0), self.signed).clamp(low, high)
                    };
                    *pair = [to_int(a), to_int(b)];

                    let palette = unquantized_palette(*pair, info);
                    for &pixel in members {
                        error += nearest(self.pixels[pixel], &palette[..info.index_count()]).1;
                    }
                }
            }
        }

        (error, endpoints)
    }

    /// Picks an index per pixel and sums the errors of each region.
    fn assign_indices(
        &self,
        info: &ModeInfo,
        shape: usize,
        endpoints: &Endpoints,
    ) -> ([usize; PIXELS_PER_BLOCK], [f32; 2]) {
        let palettes = [
            quantized_palette(endpoints[0], info, self.signed),
            quantized_palette(endpoints[1], info, self.signed),
        ];

        let mut indices = [0; PIXELS_PER_BLOCK];
        let mut errors = [0.0; 2];
        for (pixel, index) in indices.iter_mut().enumerate() {
            let region_id = region(info.partitions, shape, pixel);
            let (best, error) = nearest(
                self.pixels[pixel],
                &palettes[region_id][..info.index_count()],
            );
            *index = best;
            errors[region_id] += error;
        }
        (indices, errors)
    }

    fn region_error(&self, info: &ModeInfo, pair: [IntColor; 2], members: &[usize]) -> f32 {
        let palette = quantized_palette(pair, info, self.signed);
        members
            .iter()
            .map(|&pixel| nearest(self.pixels[pixel], &palette[..info.index_count()]).1)
            .sum()
    }

    /// Hill-climbs every channel of every region's quantized endpoints.
    fn optimize(
        &self,
        info: &ModeInfo,
        shape: usize,
        errors: [f32; 2],
        endpoints: &Endpoints,
    ) -> Endpoints {
        let mut optimized = *endpoints;
        let precision = info.anchor();

        for (region_id, pair) in optimized.iter_mut().enumerate().take(info.partitions + 1) {
            let (members, count) = region_pixels(info.partitions, shape, region_id);
            let members = &members[..count];
            let mut error = errors[region_id];

            for (channel, &bits) in precision.iter().enumerate() {
                let range = if self.signed {
                    let limit = (1 << (bits - 1)) - 1;
                    -limit..=limit
                } else {
                    0..=(1 << bits) - 1
                };
                let search = ComponentSearch {
                    range,
                    first_step: 1 << (bits - 1),
                    min_step: 1,
                };

                let current = *pair;
                let (a, b, refined) = search.refine_pair(
                    current[0].channel(channel),
                    current[1].channel(channel),
                    error,
                    |a, b| {
                        let candidate = [
                            current[0].with_channel(channel, a),
                            current[1].with_channel(channel, b),
                        ];
                        self.region_error(info, candidate, members)
                    },
                );

                *pair = [
                    current[0].with_channel(channel, a),
                    current[1].with_channel(channel, b),
                ];
                error = refined;
            }
        }

        optimized
    }

    /// Quantizes, optimizes and emits one shape of one mode if it beats the
    /// best block so far.
    fn refine(&mut self, info: &ModeInfo, shape: usize, rough: &Endpoints) {
        let precision = info.anchor();
        let signed = self.signed;

        let mut initial = [[IntColor::default(); 2]; 2];
        for region_id in 0..=info.partitions {
            for endpoint in 0..2 {
                initial[region_id][endpoint] =
                    quantize_color(rough[region_id][endpoint], precision, signed);
            }
        }

        let (mut initial_indices, initial_errors) = self.assign_indices(info, shape, &initial);
        swap_indices(info, shape, &mut initial, &mut initial_indices);

        if info.transformed {
            transform_forward(&mut initial, info.partitions);
        }
        if !endpoints_fit(info, &initial, signed) {
            return;
        }
        if info.transformed {
            transform_inverse(&mut initial, info.partitions, precision, signed);
        }

        let mut optimized = self.optimize(info, shape, initial_errors, &initial);
        let (mut optimized_indices, optimized_errors) =
            self.assign_indices(info, shape, &optimized);
        swap_indices(info, shape, &mut optimized, &mut optimized_indices);

        let initial_error: f32 = initial_errors[..=info.partitions].iter().sum();
        let optimized_error: f32 = optimized_errors[..=info.partitions].iter().sum();

        if info.transformed {
            transform_forward(&mut optimized, info.partitions);
        }

        if endpoints_fit(info, &optimized, signed)
            && optimized_error < initial_error
            && optimized_error < self.best_error
        {
            self.best_error = optimized_error;
            self.emit(info, shape, &optimized, &optimized_indices);
        } else if initial_error < self.best_error {
            if info.transformed {
                transform_forward(&mut initial, info.partitions);
            }
            self.best_error = initial_error;
            self.emit(info, shape, &initial, &initial_indices);
        }
    }

    fn emit(
        &mut self,
        info: &ModeInfo,
        shape: usize,
        endpoints: &Endpoints,
        indices: &[usize; PIXELS_PER_BLOCK],
    ) {
        let mut cursor = BitCursor::new();
        cursor.write_bits(info.selector_bits(), info.selector);

        for (field, bit) in field_bits(info.layout) {
            let value = match field.endpoint() {
                Some((region_id, endpoint, channel)) => {
                    endpoints[region_id][endpoint].channel(channel) >> bit
                }
                None => (shape >> bit) as i32,
            };
            cursor.write_bit((value & 1) as u8);
        }

        for (pixel, &index) in indices.iter().enumerate() {
            let bits = if is_fixup(info.partitions, shape, pixel) {
                info.index_precision - 1
            } else {
                info.index_precision
            };
            cursor.write_bits(usize::from(bits), index as u8);
        }

        self.block = cursor.into_block();
    }
}

#[cfg(test)]
mod tests {
    use super::{layout::Field, *};
    use crate::block::samples::Samples;

    #[test]
    fn layouts_match_precision() {
        for (mode_index, info) in MODES.iter().enumerate() {
            let mut seen = [[[0u32; 3]; 2]; 2];
            let mut shape_bits = 0u32;
            let mut total = info.selector_bits();

            for (field, bit) in field_bits(info.layout) {
                total += 1;
                match field.endpoint() {
                    Some((region_id, endpoint, channel)) => {
                        let mask = &mut seen[region_id][endpoint][channel];
                        assert_eq!(*mask & (1 << bit), 0, "mode {mode_index}: {field:?}{bit} twice");
                        *mask |= 1 << bit;
                    }
                    None => {
                        assert_eq!(field, Field::Shape);
                        shape_bits |= 1 << bit;
                    }
                }
            }

            let index_bits = PIXELS_PER_BLOCK * usize::from(info.index_precision)
                - (info.partitions + 1);
            assert_eq!(total + index_bits, 128, "mode {mode_index}");

            for region_id in 0..2 {
                for endpoint in 0..2 {
                    for channel in 0..3 {
                        let expected = if region_id > info.partitions {
                            0
                        } else {
                            let bits = info.precision[usize::from(region_id + endpoint > 0)][channel];
                            (1u32 << bits) - 1
                        };
                        assert_eq!(
                            seen[region_id][endpoint][channel], expected,
                            "mode {mode_index}, region {region_id}, endpoint {endpoint}, channel {channel}"
                        );
                    }
                }
            }

            let expected_shape = if info.partitions > 0 { 31 } else { 0 };
            assert_eq!(shape_bits, expected_shape, "mode {mode_index}");
        }
    }

    #[test]
    fn decode_known_signed_block() {
        let block = [
            0x40, 0xAF, 0xF6, 0x0B, 0xFD, 0x2E, 0xFF, 0xFF, 0x11, 0x71, 0x10, 0xA1, 0x21, 0xF2,
            0x33, 0x73,
        ];
        #[rustfmt::skip]
        let expected: [u16; 48] = [
            0x5BAB, 0x84B9, 0xDBE9, 0x5BA2, 0x84F6, 0xDBF1, 0x5B99, 0x8533, 0xDBFA, 0x5D9B, 0x8307, 0xD847,
            0x5B7E, 0x85F0, 0xDC15, 0x5BA2, 0x84F6, 0xDBF1, 0x5CC3, 0x81E8, 0xD8D6, 0x5D9B, 0x8307, 0xD847,
            0x5BA2, 0x84F6, 0xDBF1, 0x5B6D, 0x866B, 0xDC27, 0x5C27, 0x8117, 0xD93F, 0x5CC3, 0x81E8, 0xD8D6,
            0x5BA2, 0x84F6, 0xDBF1, 0x5CFE, 0x8235, 0xD8AF, 0x5C5B, 0x815C, 0xD91C, 0x5D66, 0x82C1, 0xD869,
        ];

        let decoded = decode_bc6h_half(&block, Signedness::Signed);
        assert_eq!(decoded.diagnostic, None);

        let bits: Vec<u16> = decoded
            .pixels
            .iter()
            .flat_map(|pixel| pixel.map(f16::to_bits))
            .collect();
        assert_eq!(bits, expected);
    }

    #[test]
    fn reserved_modes_decode_to_black() {
        for selector in [0x13u8, 0x17, 0x1B, 0x1F] {
            let mut block = [0xA5u8; 16];
            block[0] = (block[0] & !0x1F) | selector;

            for signedness in [Signedness::Unsigned, Signedness::Signed] {
                let decoded = decode_bc6h(&block, signedness);
                assert_eq!(
                    decoded.diagnostic,
                    Some(Diagnostic::ReservedBc6hMode { selector })
                );
                assert!(decoded
                    .pixels
                    .iter()
                    .all(|&pixel| pixel == HdrColor::OPAQUE_BLACK));
            }
        }
    }

    #[test]
    fn unquantize_extremes() {
        assert_eq!(unquantize(0, 10, false), 0);
        assert_eq!(unquantize(1023, 10, false), 0xFFFF);
        assert_eq!(unquantize(-511, 10, true), -0x7FFF);
        assert_eq!(unquantize(511, 10, true), 0x7FFF);
        assert_eq!(finish_unquantize(0xFFFF, false), F16_MAX);
        assert_eq!(finish_unquantize(-0x7FFF, true), -F16_MAX);
    }

    #[test]
    fn bit_widths() {
        assert_eq!(bit_width(0, true), 0);
        assert_eq!(bit_width(5, false), 3);
        assert_eq!(bit_width(5, true), 4);
        assert_eq!(bit_width(-1, true), 1);
        assert_eq!(bit_width(-2, true), 2);
        assert_eq!(bit_width(-3, true), 3);
        assert_eq!(bit_width(-3, false), u32::MAX);
    }

    fn max_error(a: &[HdrColor; 16], b: &[HdrColor; 16]) -> f32 {
        a.iter()
            .zip(b)
            .flat_map(|(a, b)| [(a.r - b.r).abs(), (a.g - b.g).abs(), (a.b - b.b).abs()])
            .fold(0.0, f32::max)
    }

    #[test]
    fn gradient_round_trip() {
        for signedness in [Signedness::Unsigned, Signedness::Signed] {
            let sign = if signedness.is_signed() { -1.0 } else { 1.0 };
            let mut pixels = [HdrColor::OPAQUE_BLACK; 16];
            for (index, pixel) in pixels.iter_mut().enumerate() {
                let t = index as f32 / 15.0;
                *pixel = HdrColor::new(1.0 + t, 1.5 - 0.5 * t, sign * (1.0 + 0.75 * t), 1.0);
            }

            let block = encode_bc6h(&pixels, signedness, &BC6HSettings::basic());
            let decoded = decode_bc6h(&block, signedness);
            assert_eq!(decoded.diagnostic, None);
            assert!(
                max_error(&pixels, &decoded.pixels) < 0.05,
                "{signedness:?}: {:?}",
                decoded.pixels
            );
        }
    }

    #[test]
    fn bright_constant_color() {
        let color = HdrColor::new(100.0, 2000.0, 0.25, 1.0);
        for settings in [BC6HSettings::very_fast(), BC6HSettings::very_slow()] {
            let block = encode_bc6h(&[color; 16], Signedness::Unsigned, &settings);
            let decoded = decode_bc6h(&block, Signedness::Unsigned);
            for pixel in decoded.pixels {
                assert!((pixel.r - color.r).abs() / color.r < 0.01, "{pixel:?}");
                assert!((pixel.g - color.g).abs() / color.g < 0.01, "{pixel:?}");
                assert!((pixel.b - color.b).abs() / color.b < 0.01, "{pixel:?}");
            }
        }
    }

    #[test]
    fn unsigned_flushes_negative_values() {
        let mut pixels = [HdrColor::new(-4.0, 0.5, 0.5, 1.0); 16];
        pixels[3] = HdrColor::new(f32::NAN, f32::INFINITY, 0.5, 1.0);

        let block = encode_bc6h(&pixels, Signedness::Unsigned, &BC6HSettings::very_fast());
        let decoded = decode_bc6h(&block, Signedness::Unsigned);
        for pixel in decoded.pixels {
            assert!(pixel.r >= 0.0 && pixel.r.is_finite());
            assert!(pixel.g.is_finite());
        }
    }

    #[test]
    fn two_color_block() {
        let mut pixels = [HdrColor::OPAQUE_BLACK; 16];
        for (index, pixel) in pixels.iter_mut().enumerate() {
            *pixel = if index % 4 < 2 {
                HdrColor::new(4.0, 0.25, 0.25, 1.0)
            } else {
                HdrColor::new(0.25, 0.25, 4.0, 1.0)
            };
        }

        let block = encode_bc6h(&pixels, Signedness::Unsigned, &BC6HSettings::basic());
        let decoded = decode_bc6h(&block, Signedness::Unsigned);
        for (original, decoded) in pixels.iter().zip(&decoded.pixels) {
            assert!((original.r - decoded.r).abs() / original.r < 0.05);
            assert!((original.b - decoded.b).abs() / original.b < 0.05);
        }
    }

    #[test]
    fn reencoding_is_exact() {
        let settings = BC6HSettings::basic();
        for signedness in [Signedness::Unsigned, Signedness::Signed] {
            let offset = if signedness.is_signed() { -4.0 } else { 0.0 };
            for pixels in Samples::blocks(31, 20, false) {
                let pixels = pixels.map(|pixel| {
                    HdrColor::new(8.0 * pixel.r + offset, 8.0 * pixel.g + offset, 8.0 * pixel.b, 1.0)
                });

                let first = decode_bc6h(&encode_bc6h(&pixels, signedness, &settings), signedness);
                let second =
                    decode_bc6h(&encode_bc6h(&first.pixels, signedness, &settings), signedness);
                assert_eq!(first.pixels, second.pixels, "{signedness:?}: {pixels:?}");
            }
        }
    }
}
