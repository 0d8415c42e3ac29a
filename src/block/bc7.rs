//! BC7: RGB and RGBA blocks with 8 bit channels.
//!
//! Eight modes trade the number of regions against endpoint and index
//! precision. Some modes extend their endpoints with a shared lowest bit (the
//! P-bit), some store alpha with its own indices, and those may rotate one
//! colour channel into the alpha slot.

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
    color::{HdrColor, LdrColor},
    error::Diagnostic,
    settings::BC7Settings,
};

const CHANNELS: usize = 4;
const MAX_REGIONS: usize = 3;
const MAX_SHAPES: usize = 64;

/// Two endpoints for each of the (up to) three regions.
type Endpoints = [[LdrColor; 2]; MAX_REGIONS];

struct ModeInfo {
    /// Region count minus one.
    partitions: usize,
    partition_bits: u8,
    /// Number of P-bits in the block.
    p_bits: usize,
    rotation_bits: u8,
    index_mode_bits: u8,
    index_precision: u8,
    /// Width of the separate alpha indices, 0 if alpha shares the colour indices.
    index_precision2: u8,
    /// Stored bits per channel, without the P-bit.
    precision: [u8; CHANNELS],
    precision_with_p: [u8; CHANNELS],
}

impl ModeInfo {
    const fn endpoint_count(&self) -> usize {
        (self.partitions + 1) * 2
    }

    const fn shape_count(&self) -> usize {
        1 << self.partition_bits
    }

    const fn has_p_bit(&self, channel: usize) -> bool {
        self.precision[channel] != self.precision_with_p[channel]
    }

    /// The P-bit used by endpoint `endpoint`, counted over all regions.
    const fn p_bit_index(&self, endpoint: usize) -> usize {
        endpoint * self.p_bits / self.endpoint_count()
    }

    const fn separate_alpha(&self) -> bool {
        self.index_precision2 != 0
    }

    /// Index widths of the colour and alpha channels. The index mode swaps them.
    const fn index_precisions(&self, index_mode: usize) -> (u8, u8) {
        if !self.separate_alpha() {
            (self.index_precision, self.index_precision)
        } else if index_mode == 0 {
            (self.index_precision, self.index_precision2)
        } else {
            (self.index_precision2, self.index_precision)
        }
    }
}

#[allow(clippy::too_many_arguments)]
const fn mode(
    partitions: usize,
    partition_bits: u8,
    p_bits: usize,
    rotation_bits: u8,
    index_mode_bits: u8,
    index_precision: u8,
    index_precision2: u8,
    precision: [u8; CHANNELS],
    precision_with_p: [u8; CHANNELS],
) -> ModeInfo {
    ModeInfo {
        partitions,
        partition_bits,
        p_bits,
        rotation_bits,
        index_mode_bits,
        index_precision,
        index_precision2,
        precision,
        precision_with_p,
    }
}

#[rustfmt::skip]
static MODES: [ModeInfo; 8] = [
    mode(2, 4, 6, 0, 0, 3, 0, [4, 4, 4, 0], [5, 5, 5, 0]),
    mode(1, 6, 2, 0, 0, 3, 0, [6, 6, 6, 0], [7, 7, 7, 0]),
    mode(2, 6, 0, 0, 0, 2, 0, [5, 5, 5, 0], [5, 5, 5, 0]),
    mode(1, 6, 4, 0, 0, 2, 0, [7, 7, 7, 0], [8, 8, 8, 0]),
    mode(0, 0, 0, 2, 1, 2, 3, [5, 5, 5, 6], [5, 5, 5, 6]),
    mode(0, 0, 0, 2, 0, 2, 2, [7, 7, 7, 8], [7, 7, 7, 8]),
    mode(0, 0, 2, 0, 0, 4, 0, [7, 7, 7, 7], [8, 8, 8, 8]),
    mode(1, 6, 4, 0, 0, 2, 0, [5, 5, 5, 5], [6, 6, 6, 6]),
];

/// Expands a stored component by replicating its top bits.
#[inline]
fn unquantize(component: u8, precision: u8) -> u8 {
    debug_assert!((1..=8).contains(&precision));
    let value = u32::from(component) << (8 - precision);
    (value | (value >> precision)) as u8
}

/// Channels without precision are fully opaque alpha.
fn unquantize_color(color: LdrColor, precision: [u8; CHANNELS]) -> LdrColor {
    let mut channels = color.to_array();
    for (value, &bits) in channels.iter_mut().zip(&precision) {
        *value = if bits == 0 {
            u8::MAX
        } else {
            unquantize(*value, bits)
        };
    }
    LdrColor::from_array(channels)
}

/// Quantizes to the stored value whose expansion is nearest to `component`.
fn quantize(component: u8, precision: u8) -> u8 {
    if precision >= 8 {
        return component;
    }
    nearest_stored(component, precision, |_| true)
}

/// Quantizes to the nearest value whose lowest bit is `p_bit`.
fn quantize_with_p_bit(component: u8, precision: u8, p_bit: u8) -> u8 {
    nearest_stored(component, precision, |candidate| candidate & 1 == u32::from(p_bit))
}

/// Picks among the stored values next to the rounded one, since rounding
/// alone can land one step off once the top bits are replicated.
fn nearest_stored(component: u8, precision: u8, allowed: impl Fn(u32) -> bool) -> u8 {
    let max = (1u32 << precision) - 1;
    let base = if precision >= 8 {
        u32::from(component)
    } else {
        (u32::from(component) + (1 << (7 - precision))).min(255) >> (8 - precision)
    };

    let mut best = (u32::MAX, 0);
    for candidate in [base.saturating_sub(1), base, base + 1] {
        if candidate > max || !allowed(candidate) {
            continue;
        }
        let distance = u32::from(unquantize(candidate as u8, precision).abs_diff(component));
        if distance < best.0 {
            best = (distance, candidate as u8);
        }
    }
    best.1
}

fn quantize_color(color: LdrColor, info: &ModeInfo, p_bit: u8) -> LdrColor {
    let mut channels = color.to_array();
    for (channel, value) in channels.iter_mut().enumerate() {
        let bits = info.precision_with_p[channel];
        *value = if bits == 0 {
            u8::MAX
        } else if info.has_p_bit(channel) {
            quantize_with_p_bit(*value, bits, p_bit)
        } else {
            quantize(*value, bits)
        };
    }
    LdrColor::from_array(channels)
}

#[inline]
fn interpolate(a: u8, b: u8, weight: u32) -> u8 {
    ((u32::from(a) * (WEIGHT_MAX - weight) + u32::from(b) * weight + WEIGHT_ROUND) >> WEIGHT_SHIFT)
        as u8
}

/// The colours a pair of full precision endpoints produces. Alpha may be
/// spread over a different number of entries than the colour channels.
fn palette(pair: [LdrColor; 2], color_precision: u8, alpha_precision: u8) -> [LdrColor; 16] {
    let mut palette = [LdrColor::default(); 16];
    for (entry, &weight) in palette.iter_mut().zip(weights(color_precision)) {
        entry.r = interpolate(pair[0].r, pair[1].r, weight);
        entry.g = interpolate(pair[0].g, pair[1].g, weight);
        entry.b = interpolate(pair[0].b, pair[1].b, weight);
    }
    for (entry, &weight) in palette.iter_mut().zip(weights(alpha_precision)) {
        entry.a = interpolate(pair[0].a, pair[1].a, weight);
    }
    palette
}

#[inline]
fn squared_error(a: LdrColor, b: LdrColor, channels: std::ops::Range<usize>) -> f32 {
    channels
        .map(|channel| {
            let delta = f32::from(a.channel(channel)) - f32::from(b.channel(channel));
            delta * delta
        })
        .sum()
}

/// Walks the palette from the first endpoint and stops once the error grows.
fn search(count: usize, error_of: impl Fn(usize) -> f32) -> (usize, f32) {
    let mut best = (0, f32::MAX);
    for index in 0..count {
        let error = error_of(index);
        if error > best.1 {
            break;
        }
        if error < best.1 {
            best = (index, error);
        }
        if best.1 <= 0.0 {
            break;
        }
    }
    best
}

/// Decodes a BC7 block.
///
/// Blocks with the reserved mode 8 decode to transparent black.
pub fn decode_bc7(block: &[u8; 16]) -> Decoded<HdrColor> {
    let mode = block[0].trailing_zeros() as usize;
    let Some(info) = MODES.get(mode) else {
        return Decoded {
            pixels: [HdrColor::TRANSPARENT_BLACK; PIXELS_PER_BLOCK],
            diagnostic: Some(Diagnostic::ReservedBc7Mode),
        };
    };

    let mut cursor = BitCursor::from_block(*block);
    cursor.seek(mode + 1);

    let shape = usize::from(cursor.read_bits(usize::from(info.partition_bits)));
    let rotation = usize::from(cursor.read_bits(usize::from(info.rotation_bits)));
    let index_mode = usize::from(cursor.read_bits(usize::from(info.index_mode_bits)));

    let mut endpoints = [LdrColor::default(); MAX_REGIONS * 2];
    for channel in 0..CHANNELS {
        let bits = info.precision[channel];
        for endpoint in endpoints.iter_mut().take(info.endpoint_count()) {
            let value = if bits == 0 {
                u8::MAX
            } else {
                cursor.read_bits(usize::from(bits))
            };
            *endpoint = endpoint.with_channel(channel, value);
        }
    }

    let mut p_bits = [0u8; 6];
    for p_bit in p_bits.iter_mut().take(info.p_bits) {
        *p_bit = cursor.read_bit();
    }

    for (index, endpoint) in endpoints
        .iter_mut()
        .enumerate()
        .take(info.endpoint_count())
    {
        let mut color = *endpoint;
        if info.p_bits > 0 {
            let p_bit = p_bits[info.p_bit_index(index)];
            for channel in (0..CHANNELS).filter(|&channel| info.has_p_bit(channel)) {
                color = color.with_channel(channel, (color.channel(channel) << 1) | p_bit);
            }
        }
        *endpoint = unquantize_color(color, info.precision_with_p);
    }

    let mut first = [0usize; PIXELS_PER_BLOCK];
    for (pixel, index) in first.iter_mut().enumerate() {
        let bits = if is_fixup(info.partitions, shape, pixel) {
            info.index_precision - 1
        } else {
            info.index_precision
        };
        *index = usize::from(cursor.read_bits(usize::from(bits)));
    }

    let mut second = first;
    if info.separate_alpha() {
        for (pixel, index) in second.iter_mut().enumerate() {
            let bits = if pixel == 0 {
                info.index_precision2 - 1
            } else {
                info.index_precision2
            };
            *index = usize::from(cursor.read_bits(usize::from(bits)));
        }
    }
    debug_assert_eq!(cursor.remaining(), 0);

    let (color_indices, alpha_indices) = if index_mode == 0 {
        (first, second)
    } else {
        (second, first)
    };
    let (color_precision, alpha_precision) = info.index_precisions(index_mode);
    let (color_weights, alpha_weights) = (weights(color_precision), weights(alpha_precision));

    let mut pixels = [HdrColor::TRANSPARENT_BLACK; PIXELS_PER_BLOCK];
    for (pixel, output) in pixels.iter_mut().enumerate() {
        let region_id = region(info.partitions, shape, pixel);
        let (a, b) = (endpoints[region_id * 2], endpoints[region_id * 2 + 1]);
        let color_weight = color_weights[color_indices[pixel]];
        let alpha_weight = alpha_weights[alpha_indices[pixel]];

        let mut color = LdrColor::new(
            interpolate(a.r, b.r, color_weight),
            interpolate(a.g, b.g, color_weight),
            interpolate(a.b, b.b, color_weight),
            interpolate(a.a, b.a, alpha_weight),
        );
        if rotation > 0 {
            color = color.swap_with_alpha(rotation - 1);
        }
        *output = color.to_hdr();
    }

    Decoded {
        pixels,
        diagnostic: None,
    }
}

/// Encodes 16 pixels into a BC7 block.
///
/// Channels are clamped to `[0, 1]` and rounded to 8 bits first.
pub fn encode_bc7(pixels: &[HdrColor; PIXELS_PER_BLOCK], settings: &BC7Settings) -> [u8; 16] {
    let pixels = pixels.map(HdrColor::to_ldr);
    settle(
        search_bc7(&pixels, settings),
        |pixels| search_bc7(pixels, settings),
        |block| ldr(&decode_bc7(block)),
    )
}

fn ldr(decoded: &Decoded<HdrColor>) -> [LdrColor; PIXELS_PER_BLOCK] {
    decoded.pixels.map(HdrColor::to_ldr)
}

/// Searches the modes, shapes, rotations and index modes for the block
/// closest to `pixels`.
fn search_bc7(pixels: &[LdrColor; PIXELS_PER_BLOCK], settings: &BC7Settings) -> [u8; 16] {
    let pixels = *pixels;
    let opaque = pixels.iter().all(|pixel| pixel.a == u8::MAX);

    let mut best_error = f32::MAX;
    let mut best_block = [0; 16];

    for (mode, info) in MODES.iter().enumerate() {
        if best_error <= 0.0 {
            break;
        }
        if !settings.three_subsets && info.partitions == 2 {
            continue;
        }
        if settings.mode6_only && mode != 6 {
            continue;
        }
        if opaque && mode == 7 {
            continue;
        }

        for rotation in 0..1usize << info.rotation_bits {
            let rotated = if rotation == 0 {
                pixels
            } else {
                pixels.map(|pixel| pixel.swap_with_alpha(rotation - 1))
            };

            for index_mode in 0..1usize << info.index_mode_bits {
                if best_error <= 0.0 {
                    break;
                }

                let encoder = ModeEncoder {
                    mode,
                    info,
                    rotation,
                    index_mode,
                    pixels: rotated,
                    float_pixels: rotated.map(|pixel| pixel.to_hdr().to_array()),
                };

                let shape_count = info.shape_count();
                let mut rough_errors = [0.0f32; MAX_SHAPES];
                let mut rough_endpoints = [[[LdrColor::default(); 2]; MAX_REGIONS]; MAX_SHAPES];
                for shape in 0..shape_count {
                    (rough_errors[shape], rough_endpoints[shape]) = encoder.rough_error(shape);
                }

                let candidates = settings.shape_search.candidates(shape_count);
                for shape in best_shapes(&rough_errors[..shape_count], candidates) {
                    if best_error <= 0.0 {
                        break;
                    }
                    let (error, block) = encoder.refine(shape, &rough_endpoints[shape]);
                    if error < best_error {
                        best_error = error;
                        best_block = block;
                    }
                }
            }
        }
    }

    best_block
}

/// Indices of every pixel. `alpha` is only stored by modes with separate alpha.
#[derive(Copy, Clone)]
struct Indices {
    color: [usize; PIXELS_PER_BLOCK],
    alpha: [usize; PIXELS_PER_BLOCK],
}

/// Searches one mode with a fixed rotation and index mode.
struct ModeEncoder<'a> {
    mode: usize,
    info: &'a ModeInfo,
    rotation: usize,
    index_mode: usize,
    /// The pixels after the rotation.
    pixels: [LdrColor; PIXELS_PER_BLOCK],
    float_pixels: [[f32; CHANNELS]; PIXELS_PER_BLOCK],
}

impl ModeEncoder<'_> {
    /// Error of the best palette entry, plus the chosen colour and alpha indices.
    fn nearest(&self, pixel: LdrColor, palette: &[LdrColor; 16]) -> (usize, usize, f32) {
        let (color_precision, alpha_precision) = self.info.index_precisions(self.index_mode);
        let color_count = 1 << color_precision;

        if self.info.separate_alpha() {
            let (color, color_error) =
                search(color_count, |index| squared_error(pixel, palette[index], 0..3));
            let (alpha, alpha_error) =
                search(1 << alpha_precision, |index| squared_error(pixel, palette[index], 3..4));
            (color, alpha, color_error + alpha_error)
        } else {
            let (index, error) = search(color_count, |index| {
                squared_error(pixel, palette[index], 0..CHANNELS)
            });
            (index, index, error)
        }
    }

    fn full_palette(&self, pair: [LdrColor; 2]) -> [LdrColor; 16] {
        let (color_precision, alpha_precision) = self.info.index_precisions(self.index_mode);
        palette(pair, color_precision, alpha_precision)
    }

    /// The palette of a pair of quantized endpoints.
    fn quantized_palette(&self, pair: [LdrColor; 2]) -> [LdrColor; 16] {
        let precision = self.info.precision_with_p;
        self.full_palette(pair.map(|endpoint| unquantize_color(endpoint, precision)))
    }

    /// Estimates how well a shape fits, using unquantized endpoints.
    fn rough_error(&self, shape: usize) -> (f32, Endpoints) {
        let partitions = self.info.partitions;
        let mut endpoints = [[LdrColor::default(); 2]; MAX_REGIONS];

        for (region_id, pair) in endpoints.iter_mut().enumerate().take(partitions + 1) {
            let (members, count) = region_pixels(partitions, shape, region_id);
            let members = &members[..count];

            match members {
                [] => {}
                [only] => *pair = [self.pixels[*only]; 2],
                [first, second] => *pair = [self.pixels[*first], self.pixels[*second]],
                _ if self.info.separate_alpha() => {
                    let mut points = [[0.0f32; 3]; PIXELS_PER_BLOCK];
                    for (point, &pixel) in points.iter_mut().zip(members) {
                        let [r, g, b, _] = self.float_pixels[pixel];
                        *point = [r, g, b];
                    }
                    let (a, b) = optimize_endpoints(&points[..count], 4);

                    let alphas = members.iter().map(|&pixel| self.pixels[pixel].a);
                    let low_alpha = alphas.clone().min().unwrap_or(0);
                    let high_alpha = alphas.max().unwrap_or(u8::MAX);

                    let mut low = HdrColor::new(a[0], a[1], a[2], 0.0).to_ldr();
                    let mut high = HdrColor::new(b[0], b[1], b[2], 0.0).to_ldr();
                    low.a = low_alpha;
                    high.a = high_alpha;
                    *pair = [low, high];
                }
                _ => {
                    let mut points = [[0.0f32; CHANNELS]; PIXELS_PER_BLOCK];
                    for (point, &pixel) in points.iter_mut().zip(members) {
                        *point = self.float_pixels[pixel];
                    }
                    let (a, b) = optimize_endpoints(&points[..count], 4);
                    *pair = [
                        HdrColor::from_array(a).to_ldr(),
                        HdrColor::from_array(b).to_ldr(),
                    ];
                }
            }
        }

        let palettes = endpoints.map(|pair| self.full_palette(pair));
        let error = (0..PIXELS_PER_BLOCK)
            .map(|pixel| {
                let region_id = region(partitions, shape, pixel);
                self.nearest(self.pixels[pixel], &palettes[region_id]).2
            })
            .sum();

        (error, endpoints)
    }

    fn region_error(&self, pair: [LdrColor; 2], members: &[usize]) -> f32 {
        let palette = self.quantized_palette(pair);
        members
            .iter()
            .map(|&pixel| self.nearest(self.pixels[pixel], &palette).2)
            .sum()
    }

    /// Quantizes the endpoints of a region, trying both values of every P-bit.
    fn quantize_region(&self, region_id: usize, rough: [LdrColor; 2], members: &[usize]) -> [LdrColor; 2] {
        let info = self.info;
        if info.p_bits == 0 {
            return rough.map(|endpoint| quantize_color(endpoint, info, 0));
        }

        let shared = info.p_bit_index(region_id * 2) == info.p_bit_index(region_id * 2 + 1);
        let choices: &[[u8; 2]] = if shared {
            &[[0, 0], [1, 1]]
        } else {
            &[[0, 0], [0, 1], [1, 0], [1, 1]]
        };

        let mut best = (f32::MAX, [LdrColor::default(); 2]);
        for &[p_a, p_b] in choices {
            let pair = [
                quantize_color(rough[0], info, p_a),
                quantize_color(rough[1], info, p_b),
            ];
            let error = self.region_error(pair, members);
            if error < best.0 {
                best = (error, pair);
            }
        }
        best.1
    }

    /// Picks the indices of every pixel and sums the errors of each region.
    fn assign_indices(&self, shape: usize, endpoints: &Endpoints) -> (Indices, [f32; MAX_REGIONS]) {
        let partitions = self.info.partitions;
        let palettes = endpoints.map(|pair| self.quantized_palette(pair));

        let mut indices = Indices {
            color: [0; PIXELS_PER_BLOCK],
            alpha: [0; PIXELS_PER_BLOCK],
        };
        let mut errors = [0.0; MAX_REGIONS];
        for pixel in 0..PIXELS_PER_BLOCK {
            let region_id = region(partitions, shape, pixel);
            let (color, alpha, error) = self.nearest(self.pixels[pixel], &palettes[region_id]);
            indices.color[pixel] = color;
            indices.alpha[pixel] = alpha;
            errors[region_id] += error;
        }
        (indices, errors)
    }

    /// Swaps endpoints so that every fix-up index has a zero top bit.
    fn swap_indices(&self, shape: usize, endpoints: &mut Endpoints, indices: &mut Indices) {
        let partitions = self.info.partitions;
        let (color_precision, alpha_precision) = self.info.index_precisions(self.index_mode);
        let color_count = 1 << color_precision;
        let alpha_count = 1 << alpha_precision;

        for (region_id, pair) in endpoints.iter_mut().enumerate().take(partitions + 1) {
            let anchor = fixup(partitions, shape, region_id);
            if indices.color[anchor] & (color_count >> 1) != 0 {
                if self.info.separate_alpha() {
                    let [a, b] = *pair;
                    *pair = [
                        LdrColor::new(b.r, b.g, b.b, a.a),
                        LdrColor::new(a.r, a.g, a.b, b.a),
                    ];
                } else {
                    pair.swap(0, 1);
                }
                for pixel in 0..PIXELS_PER_BLOCK {
                    if region(partitions, shape, pixel) == region_id {
                        indices.color[pixel] = color_count - 1 - indices.color[pixel];
                    }
                }
            }

            if self.info.separate_alpha() && indices.alpha[0] & (alpha_count >> 1) != 0 {
                let [a, b] = *pair;
                *pair = [a.with_channel(3, b.a), b.with_channel(3, a.a)];
                for index in indices.alpha.iter_mut() {
                    *index = alpha_count - 1 - *index;
                }
            }
        }

        if !self.info.separate_alpha() {
            indices.alpha = indices.color;
        }
    }

    /// Hill-climbs every stored channel of every region's quantized endpoints.
    /// Channels with a P-bit move in steps of two so their P-bit stays put.
    fn optimize(&self, shape: usize, errors: [f32; MAX_REGIONS], endpoints: &Endpoints) -> Endpoints {
        let info = self.info;
        let mut optimized = *endpoints;

        for (region_id, pair) in optimized.iter_mut().enumerate().take(info.partitions + 1) {
            let (members, count) = region_pixels(info.partitions, shape, region_id);
            let members = &members[..count];
            let mut error = errors[region_id];

            for (channel, &bits) in info.precision_with_p.iter().enumerate() {
                if bits == 0 {
                    continue;
                }
                let search = ComponentSearch {
                    range: 0..=(1 << bits) - 1,
                    first_step: 1 << (bits - 1),
                    min_step: if info.has_p_bit(channel) { 2 } else { 1 },
                };

                let current = *pair;
                let (a, b, refined) = search.refine_pair(
                    i32::from(current[0].channel(channel)),
                    i32::from(current[1].channel(channel)),
                    error,
                    |a, b| {
                        let candidate = [
                            current[0].with_channel(channel, a as u8),
                            current[1].with_channel(channel, b as u8),
                        ];
                        self.region_error(candidate, members)
                    },
                );

                *pair = [
                    current[0].with_channel(channel, a as u8),
                    current[1].with_channel(channel, b as u8),
                ];
                error = refined;
            }
        }

        optimized
    }

    /// Replaces each region's endpoints by the two member pixels furthest
    /// apart along the axis of `rough`. Pixels that already sit on a palette
    /// using both of its endpoints get those endpoints back exactly.
    fn extreme_endpoints(&self, shape: usize, rough: &Endpoints) -> Endpoints {
        let partitions = self.info.partitions;
        let separate_alpha = self.info.separate_alpha();
        let channels = if separate_alpha { 3 } else { CHANNELS };
        let mut endpoints = *rough;

        for (region_id, pair) in endpoints.iter_mut().enumerate().take(partitions + 1) {
            let (members, count) = region_pixels(partitions, shape, region_id);
            let members = &members[..count];

            let axis: [f32; CHANNELS] = std::array::from_fn(|channel| {
                f32::from(pair[1].channel(channel)) - f32::from(pair[0].channel(channel))
            });
            let project = |pixel: usize| -> f32 {
                (0..channels)
                    .map(|channel| axis[channel] * f32::from(self.pixels[pixel].channel(channel)))
                    .sum()
            };

            let lowest = members
                .iter()
                .copied()
                .min_by(|&a, &b| project(a).total_cmp(&project(b)));
            let highest = members
                .iter()
                .copied()
                .max_by(|&a, &b| project(a).total_cmp(&project(b)));
            let (Some(lowest), Some(highest)) = (lowest, highest) else {
                continue;
            };

            let mut low = self.pixels[lowest];
            let mut high = self.pixels[highest];
            if separate_alpha {
                let alphas = members.iter().map(|&pixel| self.pixels[pixel].a);
                low.a = alphas.clone().min().unwrap_or(low.a);
                high.a = alphas.max().unwrap_or(high.a);
            }
            *pair = [low, high];
        }

        endpoints
    }

    fn quantize_endpoints(&self, shape: usize, endpoints: &Endpoints) -> Endpoints {
        let partitions = self.info.partitions;
        let mut quantized = [[LdrColor::default(); 2]; MAX_REGIONS];
        for (region_id, pair) in quantized.iter_mut().enumerate().take(partitions + 1) {
            let (members, count) = region_pixels(partitions, shape, region_id);
            *pair = self.quantize_region(region_id, endpoints[region_id], &members[..count]);
        }
        quantized
    }

    /// Quantizes and optimizes one shape. Returns the error and the block.
    fn refine(&self, shape: usize, rough: &Endpoints) -> (f32, [u8; 16]) {
        let partitions = self.info.partitions;

        // Per region, start from whichever of the fitted line and the extreme
        // pixels quantizes better.
        let fitted = self.quantize_endpoints(shape, rough);
        let extremes = self.quantize_endpoints(shape, &self.extreme_endpoints(shape, rough));
        let (_, fitted_errors) = self.assign_indices(shape, &fitted);
        let (_, extreme_errors) = self.assign_indices(shape, &extremes);

        let mut initial = fitted;
        for region_id in 0..=partitions {
            if extreme_errors[region_id] < fitted_errors[region_id] {
                initial[region_id] = extremes[region_id];
            }
        }

        let (initial_indices, initial_errors) = self.assign_indices(shape, &initial);
        let optimized = self.optimize(shape, initial_errors, &initial);
        let (optimized_indices, optimized_errors) = self.assign_indices(shape, &optimized);

        let initial_error: f32 = initial_errors[..=partitions].iter().sum();
        let optimized_error: f32 = optimized_errors[..=partitions].iter().sum();

        let (mut endpoints, mut indices, error) = if optimized_error < initial_error {
            (optimized, optimized_indices, optimized_error)
        } else {
            (initial, initial_indices, initial_error)
        };
        self.swap_indices(shape, &mut endpoints, &mut indices);

        (error, self.emit(shape, &endpoints, &indices))
    }

    fn emit(&self, shape: usize, endpoints: &Endpoints, indices: &Indices) -> [u8; 16] {
        let info = self.info;
        let mut cursor = BitCursor::new();

        cursor.write_bits(self.mode + 1, 1 << self.mode);
        cursor.write_bits(usize::from(info.partition_bits), shape as u8);
        cursor.write_bits(usize::from(info.rotation_bits), self.rotation as u8);
        cursor.write_bits(usize::from(info.index_mode_bits), self.index_mode as u8);

        let flat = endpoints.as_flattened();
        for channel in 0..CHANNELS {
            let shift = u8::from(info.has_p_bit(channel));
            for endpoint in &flat[..info.endpoint_count()] {
                cursor.write_bits(
                    usize::from(info.precision[channel]),
                    endpoint.channel(channel) >> shift,
                );
            }
        }

        // Every endpoint carries its P-bit in the lowest bit of its red channel.
        let mut endpoint = 0;
        for p_bit in 0..info.p_bits {
            while info.p_bit_index(endpoint) < p_bit {
                endpoint += 1;
            }
            cursor.write_bit(flat[endpoint].r & 1);
        }

        let (first, second) = if self.index_mode == 0 {
            (&indices.color, &indices.alpha)
        } else {
            (&indices.alpha, &indices.color)
        };

        for (pixel, &index) in first.iter().enumerate() {
            let bits = if is_fixup(info.partitions, shape, pixel) {
                info.index_precision - 1
            } else {
                info.index_precision
            };
            cursor.write_bits(usize::from(bits), index as u8);
        }
        if info.separate_alpha() {
            for (pixel, &index) in second.iter().enumerate() {
                let bits = if pixel == 0 {
                    info.index_precision2 - 1
                } else {
                    info.index_precision2
                };
                cursor.write_bits(usize::from(bits), index as u8);
            }
        }
        debug_assert_eq!(cursor.remaining(), 0);

        cursor.into_block()
    }
}
