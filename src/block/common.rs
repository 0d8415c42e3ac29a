//! Tables and search helpers shared by BC6H and BC7.

use std::ops::RangeInclusive;

use crate::block::PIXELS_PER_BLOCK;

pub(crate) const WEIGHT_MAX: u32 = 64;
pub(crate) const WEIGHT_SHIFT: u32 = 6;
pub(crate) const WEIGHT_ROUND: u32 = 32;

const WEIGHTS_2: [u32; 4] = [0, 21, 43, 64];
const WEIGHTS_3: [u32; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
const WEIGHTS_4: [u32; 16] = [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

/// Interpolation weights for an index of the given bit width.
#[inline]
pub(crate) fn weights(precision: u8) -> &'static [u32] {
    match precision {
        2 => &WEIGHTS_2,
        3 => &WEIGHTS_3,
        4 => &WEIGHTS_4,
        _ => {
            debug_assert!(false, "unsupported index precision {precision}");
            &[]
        }
    }
}

/// Region id of every pixel, two bits per pixel. Entries 0..64 are the two
/// region shapes (BC6H uses the first 32), entries 64..128 the three region shapes.
const SHAPE_TABLE: [u32; 128] = [
    0x50505050, 0x40404040, 0x54545454, 0x54505040, 0x50404000, 0x55545450, 0x55545040,
    0x54504000, 0x50400000, 0x55555450, 0x55544000, 0x54400000, 0x55555440, 0x55550000,
    0x55555500, 0x55000000, 0x55150100, 0x00004054, 0x15010000, 0x00405054, 0x00004050,
    0x15050100, 0x05010000, 0x40505054, 0x00404050, 0x05010100, 0x14141414, 0x05141450,
    0x01155440, 0x00555500, 0x15014054, 0x05414150, 0x44444444, 0x55005500, 0x11441144,
    0x05055050, 0x05500550, 0x11114444, 0x41144114, 0x44111144, 0x15055054, 0x01055040,
    0x05041050, 0x05455150, 0x14414114, 0x50050550, 0x41411414, 0x00141400, 0x00041504,
    0x00105410, 0x10541000, 0x04150400, 0x50410514, 0x41051450, 0x05415014, 0x14054150,
    0x41050514, 0x41505014, 0x40011554, 0x54150140, 0x50505500, 0x00555050, 0x15151010,
    0x54540404, 0xAA685050, 0x6A5A5040, 0x5A5A4200, 0x5450A0A8, 0xA5A50000, 0xA0A05050,
    0x5555A0A0, 0x5A5A5050, 0xAA550000, 0xAA555500, 0xAAAA5500, 0x90909090, 0x94949494,
    0xA4A4A4A4, 0xA9A59450, 0x2A0A4250, 0xA5945040, 0x0A425054, 0xA5A5A500, 0x55A0A0A0,
    0xA8A85454, 0x6A6A4040, 0xA4A45000, 0x1A1A0500, 0x0050A4A4, 0xAAA59090, 0x14696914,
    0x69691400, 0xA08585A0, 0xAA821414, 0x50A4A450, 0x6A5A0200, 0xA9A58000, 0x5090A0A8,
    0xA8A09050, 0x24242424, 0x00AA5500, 0x24924924, 0x24499224, 0x50A50A50, 0x500AA550,
    0xAAAA4444, 0x66660000, 0xA5A0A5A0, 0x50A050A0, 0x69286928, 0x44AAAA44, 0x66666600,
    0xAA444444, 0x54A854A8, 0x95809580, 0x96969600, 0xA85454A8, 0x80959580, 0xAA141414,
    0x96960000, 0xAAAA1414, 0xA05050A0, 0xA0A5A5A0, 0x96000000, 0x40804080, 0xA9A8A9A8,
    0xAAAAAA44, 0x2A4A5254,
];

/// Fix-up pixels of regions 1 (high nibble) and 2 (low nibble), indexed like [`SHAPE_TABLE`].
/// Region 0 always has its fix-up at pixel 0.
const FIXUP_TABLE: [u8; 128] = [
    0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0,
    0xF0, 0xF0, 0x20, 0x80, 0x20, 0x20, 0x80, 0x80, 0xF0, 0x20, 0x80, 0x20, 0x20, 0x80, 0x80,
    0x20, 0x20, 0xF0, 0xF0, 0x60, 0x80, 0x20, 0x80, 0xF0, 0xF0, 0x20, 0x80, 0x20, 0x20, 0x20,
    0xF0, 0xF0, 0x60, 0x60, 0x20, 0x60, 0x80, 0xF0, 0xF0, 0x20, 0x20, 0xF0, 0xF0, 0xF0, 0xF0,
    0xF0, 0x20, 0x20, 0xF0, 0x3F, 0x38, 0xF8, 0xF3, 0x8F, 0x3F, 0xF3, 0xF8, 0x8F, 0x8F, 0x6F,
    0x6F, 0x6F, 0x5F, 0x3F, 0x38, 0x3F, 0x38, 0x8F, 0xF3, 0x3F, 0x38, 0x6F, 0xA8, 0x53, 0x8F,
    0x86, 0x6A, 0x8F, 0x5F, 0xFA, 0xF8, 0x8F, 0xF3, 0x3F, 0x5A, 0x6A, 0xA8, 0x89, 0xFA, 0xF6,
    0x3F, 0xF8, 0x5F, 0xF3, 0xF6, 0xF6, 0xF8, 0x3F, 0xF3, 0x5F, 0x5F, 0x5F, 0x8F, 0x5F, 0xAF,
    0x5F, 0xAF, 0x8F, 0xDF, 0xF3, 0xCF, 0x3F, 0x38,
];

const SHAPES_PER_TABLE: usize = 64;

#[inline]
fn table_index(partitions: usize, shape: usize) -> usize {
    debug_assert!((1..=2).contains(&partitions));
    debug_assert!(shape < SHAPES_PER_TABLE);
    (partitions - 1) * SHAPES_PER_TABLE + shape
}

/// Region of `pixel` in `shape`. `partitions` is the region count minus one.
#[inline]
pub(crate) fn region(partitions: usize, shape: usize, pixel: usize) -> usize {
    debug_assert!(pixel < PIXELS_PER_BLOCK);
    if partitions == 0 {
        return 0;
    }
    ((SHAPE_TABLE[table_index(partitions, shape)] >> (2 * pixel)) & 3) as usize
}

/// The pixel of `region` whose index has an implicit zero top bit.
#[inline]
pub(crate) fn fixup(partitions: usize, shape: usize, region: usize) -> usize {
    debug_assert!(region <= partitions);
    match region {
        0 => 0,
        1 => (FIXUP_TABLE[table_index(partitions, shape)] >> 4) as usize,
        _ => (FIXUP_TABLE[table_index(partitions, shape)] & 15) as usize,
    }
}

/// Whether `pixel` is the fix-up pixel of its region.
#[inline]
pub(crate) fn is_fixup(partitions: usize, shape: usize, pixel: usize) -> bool {
    fixup(partitions, shape, region(partitions, shape, pixel)) == pixel
}

/// Indices of the pixels that belong to `region`, with their count.
pub(crate) fn region_pixels(
    partitions: usize,
    shape: usize,
    region_id: usize,
) -> ([usize; PIXELS_PER_BLOCK], usize) {
    let mut pixels = [0; PIXELS_PER_BLOCK];
    let mut count = 0;
    for pixel in 0..PIXELS_PER_BLOCK {
        if region(partitions, shape, pixel) == region_id {
            pixels[count] = pixel;
            count += 1;
        }
    }
    (pixels, count)
}

/// Sorts shapes by rough error and returns the `candidates` best, best first.
///
/// Only the first `candidates` positions are brought into order.
pub(crate) fn best_shapes(
    rough_errors: &[f32],
    candidates: usize,
) -> impl Iterator<Item = usize> {
    let mut ranking: Vec<(f32, usize)> = rough_errors
        .iter()
        .copied()
        .enumerate()
        .map(|(shape, error)| (error, shape))
        .collect();

    let candidates = candidates.min(ranking.len());
    for k in 0..candidates {
        let mut best_index = k;
        for index in k + 1..ranking.len() {
            if ranking[index].0 < ranking[best_index].0 {
                best_index = index;
            }
        }
        ranking.swap(k, best_index);
    }

    ranking.into_iter().take(candidates).map(|(_, shape)| shape)
}

/// Step schedule of one endpoint component search.
#[derive(Clone, Debug)]
pub(crate) struct ComponentSearch {
    /// Values a component may take.
    pub(crate) range: RangeInclusive<i32>,
    /// First (largest) step, halved until it drops below `min_step`.
    pub(crate) first_step: i32,
    pub(crate) min_step: i32,
}

impl ComponentSearch {
    /// Searches around `value` with power of two steps and returns the best
    /// value found together with its error. Only improvements over `error` count.
    fn perturb(&self, value: i32, mut error: f32, error_of: impl Fn(i32) -> f32) -> (i32, f32) {
        let mut best = value;
        let mut step = self.first_step;

        while step >= self.min_step && step > 0 {
            let mut best_step = 0;
            for delta in [-step, step] {
                let candidate = best + delta;
                if !self.range.contains(&candidate) {
                    continue;
                }
                let candidate_error = error_of(candidate);
                if candidate_error < error {
                    error = candidate_error;
                    best_step = delta;
                }
            }
            best += best_step;
            step >>= 1;
        }

        (best, error)
    }

    /// Hill-climbs one channel of an endpoint pair.
    ///
    /// Starts with whichever endpoint gains the most, then alternates between
    /// the two endpoints until neither move lowers the error any more.
    pub(crate) fn refine_pair(
        &self,
        a: i32,
        b: i32,
        error: f32,
        error_of: impl Fn(i32, i32) -> f32,
    ) -> (i32, i32, f32) {
        let (moved_a, error_a) = self.perturb(a, error, |value| error_of(value, b));
        let (moved_b, error_b) = self.perturb(b, error, |value| error_of(a, value));

        let (mut a, mut b, mut error, mut move_b) = if error_a < error_b {
            if error_a >= error {
                return (a, b, error);
            }
            (moved_a, b, error_a, true)
        } else {
            if error_b >= error {
                return (a, b, error);
            }
            (a, moved_b, error_b, false)
        };

        loop {
            let (value, candidate_error) = if move_b {
                self.perturb(b, error, |value| error_of(a, value))
            } else {
                self.perturb(a, error, |value| error_of(value, b))
            };
            if candidate_error >= error {
                break;
            }
            if move_b {
                b = value;
            } else {
                a = value;
            }
            error = candidate_error;
            move_b = !move_b;
        }

        (a, b, error)
    }
}
