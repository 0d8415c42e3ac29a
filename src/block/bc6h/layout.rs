//! Bit layouts of the BC6H block headers.
//!
//! Every mode scatters the bits of its endpoint components and its shape id
//! over the header in its own order. A layout lists the header after the mode
//! selector as runs of consecutive bits of one field.

/// A header field. `W` is the first endpoint of region 0, `X` the second,
/// `Y` and `Z` the endpoints of region 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Field {
    Shape,
    Rw,
    Gw,
    Bw,
    Rx,
    Gx,
    Bx,
    Ry,
    Gy,
    By,
    Rz,
    Gz,
    Bz,
}

impl Field {
    /// Region, endpoint and channel of an endpoint field.
    pub(super) const fn endpoint(self) -> Option<(usize, usize, usize)> {
        match self {
            Field::Shape => None,
            Field::Rw => Some((0, 0, 0)),
            Field::Gw => Some((0, 0, 1)),
            Field::Bw => Some((0, 0, 2)),
            Field::Rx => Some((0, 1, 0)),
            Field::Gx => Some((0, 1, 1)),
            Field::Bx => Some((0, 1, 2)),
            Field::Ry => Some((1, 0, 0)),
            Field::Gy => Some((1, 0, 1)),
            Field::By => Some((1, 0, 2)),
            Field::Rz => Some((1, 1, 0)),
            Field::Gz => Some((1, 1, 1)),
            Field::Bz => Some((1, 1, 2)),
        }
    }
}

/// Bits `first..=last` of a field, or `last..=first` in descending order when
/// `last < first`.
#[derive(Copy, Clone, Debug)]
pub(super) struct Run {
    field: Field,
    first: u8,
    last: u8,
}

const fn run(field: Field, first: u8, last: u8) -> Run {
    Run { field, first, last }
}

const fn bit(field: Field, index: u8) -> Run {
    Run {
        field,
        first: index,
        last: index,
    }
}

/// Expands a layout into `(field, bit)` pairs in stream order.
pub(super) fn field_bits(layout: &'static [Run]) -> impl Iterator<Item = (Field, u32)> {
    layout.iter().flat_map(|run| {
        let (first, last) = (u32::from(run.first), u32::from(run.last));
        let ascending = first <= last;
        let count = first.abs_diff(last) + 1;
        (0..count).map(move |offset| {
            let bit = if ascending {
                first + offset
            } else {
                first - offset
            };
            (run.field, bit)
        })
    })
}

use Field::*;

#[rustfmt::skip]
pub(super) const MODE_0: &[Run] = &[
    bit(Gy, 4), bit(By, 4), bit(Bz, 4),
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 4), bit(Gz, 4), run(Gy, 0, 3),
    run(Gx, 0, 4), bit(Bz, 0), run(Gz, 0, 3),
    run(Bx, 0, 4), bit(Bz, 1), run(By, 0, 3),
    run(Ry, 0, 4), bit(Bz, 2),
    run(Rz, 0, 4), bit(Bz, 3),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_1: &[Run] = &[
    bit(Gy, 5), bit(Gz, 4), bit(Gz, 5),
    run(Rw, 0, 6), bit(Bz, 0), bit(Bz, 1), bit(By, 4),
    run(Gw, 0, 6), bit(By, 5), bit(Bz, 2), bit(Gy, 4),
    run(Bw, 0, 6), bit(Bz, 3), bit(Bz, 5), bit(Bz, 4),
    run(Rx, 0, 5), run(Gy, 0, 3),
    run(Gx, 0, 5), run(Gz, 0, 3),
    run(Bx, 0, 5), run(By, 0, 3),
    run(Ry, 0, 5),
    run(Rz, 0, 5),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_2: &[Run] = &[
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 4), bit(Rw, 10), run(Gy, 0, 3),
    run(Gx, 0, 3), bit(Gw, 10), bit(Bz, 0), run(Gz, 0, 3),
    run(Bx, 0, 3), bit(Bw, 10), bit(Bz, 1), run(By, 0, 3),
    run(Ry, 0, 4), bit(Bz, 2),
    run(Rz, 0, 4), bit(Bz, 3),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_3: &[Run] = &[
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 3), bit(Rw, 10), bit(Gz, 4), run(Gy, 0, 3),
    run(Gx, 0, 4), bit(Gw, 10), run(Gz, 0, 3),
    run(Bx, 0, 3), bit(Bw, 10), bit(Bz, 1), run(By, 0, 3),
    run(Ry, 0, 3), bit(Bz, 0), bit(Bz, 2),
    run(Rz, 0, 3), bit(Gy, 4), bit(Bz, 3),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_4: &[Run] = &[
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 3), bit(Rw, 10), bit(By, 4), run(Gy, 0, 3),
    run(Gx, 0, 3), bit(Gw, 10), bit(Bz, 0), run(Gz, 0, 3),
    run(Bx, 0, 4), bit(Bw, 10), run(By, 0, 3),
    run(Ry, 0, 3), bit(Bz, 1), bit(Bz, 2),
    run(Rz, 0, 3), bit(Bz, 4), bit(Bz, 3),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_5: &[Run] = &[
    run(Rw, 0, 8), bit(By, 4),
    run(Gw, 0, 8), bit(Gy, 4),
    run(Bw, 0, 8), bit(Bz, 4),
    run(Rx, 0, 4), bit(Gz, 4), run(Gy, 0, 3),
    run(Gx, 0, 4), bit(Bz, 0), run(Gz, 0, 3),
    run(Bx, 0, 4), bit(Bz, 1), run(By, 0, 3),
    run(Ry, 0, 4), bit(Bz, 2),
    run(Rz, 0, 4), bit(Bz, 3),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_6: &[Run] = &[
    run(Rw, 0, 7), bit(Gz, 4), bit(By, 4),
    run(Gw, 0, 7), bit(Bz, 2), bit(Gy, 4),
    run(Bw, 0, 7), bit(Bz, 3), bit(Bz, 4),
    run(Rx, 0, 5), run(Gy, 0, 3),
    run(Gx, 0, 4), bit(Bz, 0), run(Gz, 0, 3),
    run(Bx, 0, 4), bit(Bz, 1), run(By, 0, 3),
    run(Ry, 0, 5),
    run(Rz, 0, 5),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_7: &[Run] = &[
    run(Rw, 0, 7), bit(Bz, 0), bit(By, 4),
    run(Gw, 0, 7), bit(Gy, 5), bit(Gy, 4),
    run(Bw, 0, 7), bit(Gz, 5), bit(Bz, 4),
    run(Rx, 0, 4), bit(Gz, 4), run(Gy, 0, 3),
    run(Gx, 0, 5), run(Gz, 0, 3),
    run(Bx, 0, 4), bit(Bz, 1), run(By, 0, 3),
    run(Ry, 0, 4), bit(Bz, 2),
    run(Rz, 0, 4), bit(Bz, 3),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_8: &[Run] = &[
    run(Rw, 0, 7), bit(Bz, 1), bit(By, 4),
    run(Gw, 0, 7), bit(By, 5), bit(Gy, 4),
    run(Bw, 0, 7), bit(Bz, 5), bit(Bz, 4),
    run(Rx, 0, 4), bit(Gz, 4), run(Gy, 0, 3),
    run(Gx, 0, 4), bit(Bz, 0), run(Gz, 0, 3),
    run(Bx, 0, 5), run(By, 0, 3),
    run(Ry, 0, 4), bit(Bz, 2),
    run(Rz, 0, 4), bit(Bz, 3),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_9: &[Run] = &[
    run(Rw, 0, 5), bit(Gz, 4), bit(Bz, 0), bit(Bz, 1), bit(By, 4),
    run(Gw, 0, 5), bit(Gy, 5), bit(By, 5), bit(Bz, 2), bit(Gy, 4),
    run(Bw, 0, 5), bit(Gz, 5), bit(Bz, 3), bit(Bz, 5), bit(Bz, 4),
    run(Rx, 0, 5), run(Gy, 0, 3),
    run(Gx, 0, 5), run(Gz, 0, 3),
    run(Bx, 0, 5), run(By, 0, 3),
    run(Ry, 0, 5),
    run(Rz, 0, 5),
    run(Shape, 0, 4),
];

#[rustfmt::skip]
pub(super) const MODE_10: &[Run] = &[
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 9), run(Gx, 0, 9), run(Bx, 0, 9),
];

#[rustfmt::skip]
pub(super) const MODE_11: &[Run] = &[
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 8), bit(Rw, 10),
    run(Gx, 0, 8), bit(Gw, 10),
    run(Bx, 0, 8), bit(Bw, 10),
];

#[rustfmt::skip]
pub(super) const MODE_12: &[Run] = &[
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 7), run(Rw, 11, 10),
    run(Gx, 0, 7), run(Gw, 11, 10),
    run(Bx, 0, 7), run(Bw, 11, 10),
];

#[rustfmt::skip]
pub(super) const MODE_13: &[Run] = &[
    run(Rw, 0, 9), run(Gw, 0, 9), run(Bw, 0, 9),
    run(Rx, 0, 3), run(Rw, 15, 10),
    run(Gx, 0, 3), run(Gw, 15, 10),
    run(Bx, 0, 3), run(Bw, 15, 10),
];
