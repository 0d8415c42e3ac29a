//! Endpoint search along a line through colour space.
//!
//! Both optimizers start from the bounding box of the points and then run a
//! few Newton iterations that move the two endpoints so that the sum of the
//! squared distances between each point and its nearest palette entry shrinks.

/// Early exit threshold for the squared gradient of every channel.
const GRADIENT_EPSILON: f32 = 0.25 / 64.0;

/// Below this squared length the endpoints are used as they are.
const DEGENERATE_LENGTH: f32 = 1.0 / 4096.0;

const MAX_ITERATIONS: usize = 8;

const C3: [f32; 3] = [2.0 / 2.0, 1.0 / 2.0, 0.0 / 2.0];
const D3: [f32; 3] = [0.0 / 2.0, 1.0 / 2.0, 2.0 / 2.0];
const C4: [f32; 4] = [3.0 / 3.0, 2.0 / 3.0, 1.0 / 3.0, 0.0 / 3.0];
const D4: [f32; 4] = [0.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 3.0 / 3.0];

const C6: [f32; 6] = [
    5.0 / 5.0,
    4.0 / 5.0,
    3.0 / 5.0,
    2.0 / 5.0,
    1.0 / 5.0,
    0.0 / 5.0,
];
const D6: [f32; 6] = [
    0.0 / 5.0,
    1.0 / 5.0,
    2.0 / 5.0,
    3.0 / 5.0,
    4.0 / 5.0,
    5.0 / 5.0,
];
const C8: [f32; 8] = [
    7.0 / 7.0,
    6.0 / 7.0,
    5.0 / 7.0,
    4.0 / 7.0,
    3.0 / 7.0,
    2.0 / 7.0,
    1.0 / 7.0,
    0.0 / 7.0,
];
const D8: [f32; 8] = [
    0.0 / 7.0,
    1.0 / 7.0,
    2.0 / 7.0,
    3.0 / 7.0,
    4.0 / 7.0,
    5.0 / 7.0,
    6.0 / 7.0,
    7.0 / 7.0,
];

#[inline]
fn dot<const N: usize>(a: &[f32; N], b: &[f32; N]) -> f32 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

/// Finds two endpoints for `points` with a palette of 3 or 4 evenly spaced entries.
///
/// Works for any channel count up to 4. Before the Newton iterations the
/// channels 1.. of the bounding box corners may be swapped, choosing the box
/// diagonal along which the points spread the most.
pub(crate) fn optimize_endpoints<const N: usize>(
    points: &[[f32; N]],
    steps: usize,
) -> ([f32; N], [f32; N]) {
    debug_assert!(N >= 1 && N <= 4);
    debug_assert!(steps == 3 || steps == 4);

    let (weights_c, weights_d): (&[f32], &[f32]) = if steps == 3 {
        (&C3[..], &D3[..])
    } else {
        (&C4[..], &D4[..])
    };

    let mut x = [f32::MAX; N];
    let mut y = [-f32::MAX; N];
    for point in points {
        for channel in 0..N {
            x[channel] = x[channel].min(point[channel]);
            y[channel] = y[channel].max(point[channel]);
        }
    }

    let mut diagonal = [0.0; N];
    for channel in 0..N {
        diagonal[channel] = y[channel] - x[channel];
    }
    let length = dot(&diagonal, &diagonal);

    // Single colour.
    if length < f32::MIN_POSITIVE {
        return (x, y);
    }

    let inverse_length = 1.0 / length;
    let mut direction = [0.0; N];
    let mut middle = [0.0; N];
    for channel in 0..N {
        direction[channel] = diagonal[channel] * inverse_length;
        middle[channel] = (x[channel] + y[channel]) * 0.5;
    }

    // Channel c > 0 is flipped in diagonal d when bit (N - 1 - c) of d is set.
    let diagonal_count = 1 << (N - 1);
    let mut spread = [0.0f32; 8];
    for point in points {
        let mut projected = [0.0; N];
        for channel in 0..N {
            projected[channel] = (point[channel] - middle[channel]) * direction[channel];
        }
        for (pattern, total) in spread.iter_mut().enumerate().take(diagonal_count) {
            let mut sum = projected[0];
            for channel in 1..N {
                if pattern & (1 << (N - 1 - channel)) != 0 {
                    sum -= projected[channel];
                } else {
                    sum += projected[channel];
                }
            }
            *total += sum * sum;
        }
    }

    let mut best_diagonal = 0;
    for pattern in 1..diagonal_count {
        if spread[pattern] > spread[best_diagonal] {
            best_diagonal = pattern;
        }
    }
    for channel in 1..N {
        if best_diagonal & (1 << (N - 1 - channel)) != 0 {
            std::mem::swap(&mut x[channel], &mut y[channel]);
        }
    }

    // Two colours.
    if length < DEGENERATE_LENGTH {
        return (x, y);
    }

    let step_max = (steps - 1) as f32;

    for _ in 0..MAX_ITERATIONS {
        let mut palette = [[0.0; N]; 4];
        for (step, entry) in palette.iter_mut().enumerate().take(steps) {
            for channel in 0..N {
                entry[channel] = x[channel] * weights_c[step] + y[channel] * weights_d[step];
            }
        }

        let mut direction = [0.0; N];
        for channel in 0..N {
            direction[channel] = y[channel] - x[channel];
        }
        let length = dot(&direction, &direction);
        if length < DEGENERATE_LENGTH {
            break;
        }
        let scale = step_max / length;
        for value in direction.iter_mut() {
            *value *= scale;
        }

        let mut d2x = 0.0;
        let mut d2y = 0.0;
        let mut dx = [0.0; N];
        let mut dy = [0.0; N];

        for point in points {
            let mut offset = [0.0; N];
            for channel in 0..N {
                offset[channel] = point[channel] - x[channel];
            }
            let projection = dot(&offset, &direction);

            let step = if projection <= 0.0 {
                0
            } else if projection >= step_max {
                steps - 1
            } else {
                (projection + 0.5) as usize
            };

            let c = weights_c[step] * (1.0 / 8.0);
            let d = weights_d[step] * (1.0 / 8.0);
            d2x += c * weights_c[step];
            d2y += d * weights_d[step];
            for channel in 0..N {
                let difference = palette[step][channel] - point[channel];
                dx[channel] += c * difference;
                dy[channel] += d * difference;
            }
        }

        if d2x > 0.0 {
            let factor = -1.0 / d2x;
            for channel in 0..N {
                x[channel] += dx[channel] * factor;
            }
        }
        if d2y > 0.0 {
            let factor = -1.0 / d2y;
            for channel in 0..N {
                y[channel] += dy[channel] * factor;
            }
        }

        let converged = dx
            .iter()
            .chain(dy.iter())
            .all(|gradient| gradient * gradient < GRADIENT_EPSILON);
        if converged {
            break;
        }
    }

    (x, y)
}

/// Finds the two endpoints of a single channel ramp with 6 or 8 entries.
///
/// With 6 steps the ramp is completed by the two format extremes, which the
/// optimizer takes into account when it assigns points to ramp entries. The
/// value range is `[0, 1]`, or `[-1, 1]` when `signed` is set. The returned
/// pair is ordered, `low <= high`.
pub(crate) fn optimize_ramp(points: &[f32; 16], steps: usize, signed: bool) -> (f32, f32) {
    debug_assert!(steps == 6 || steps == 8);

    let (weights_c, weights_d): (&[f32], &[f32]) = if steps == 6 {
        (&C6[..], &D6[..])
    } else {
        (&C8[..], &D8[..])
    };

    let max_value = 1.0f32;
    let min_value = if signed { -1.0f32 } else { 0.0 };

    let mut x = max_value;
    let mut y = min_value;

    if steps == 8 {
        for &point in points {
            x = x.min(point);
            y = y.max(point);
        }
    } else {
        // The extremes are covered by the reserved entries.
        for &point in points {
            if point < x && point > min_value {
                x = point;
            }
            if point > y && point < max_value {
                y = point;
            }
        }
        if x > y {
            // Only extremes, which the reserved entries cover.
            std::mem::swap(&mut x, &mut y);
        } else if x == y {
            y = max_value;
        }
    }

    let step_max = (steps - 1) as f32;

    for _ in 0..MAX_ITERATIONS {
        if y - x < 1.0 / 256.0 {
            break;
        }

        let scale = step_max / (y - x);

        let mut ramp = [0.0f32; 8];
        for (step, entry) in ramp.iter_mut().enumerate().take(steps) {
            *entry = weights_c[step] * x + weights_d[step] * y;
        }
        if steps == 6 {
            ramp[6] = min_value;
            ramp[7] = max_value;
        }

        let mut dx = 0.0;
        let mut dy = 0.0;
        let mut d2x = 0.0;
        let mut d2y = 0.0;

        for &point in points {
            let projection = (point - x) * scale;

            let step = if projection <= 0.0 {
                if steps == 6 && point <= x * 0.5 {
                    6
                } else {
                    0
                }
            } else if projection >= step_max {
                if steps == 6 && point >= (y + 1.0) * 0.5 {
                    7
                } else {
                    steps - 1
                }
            } else {
                (projection + 0.5) as usize
            };

            // The reserved extremes don't depend on the endpoints.
            if step < steps {
                let difference = ramp[step] - point;
                dx += weights_c[step] * difference;
                d2x += weights_c[step] * weights_c[step];
                dy += weights_d[step] * difference;
                d2y += weights_d[step] * weights_d[step];
            }
        }

        if d2x > 0.0 {
            x -= dx / d2x;
        }
        if d2y > 0.0 {
            y -= dy / d2y;
        }
        if x > y {
            std::mem::swap(&mut x, &mut y);
        }

        if dx * dx < 1.0 / 64.0 && dy * dy < 1.0 / 64.0 {
            break;
        }
    }

    (x.clamp(min_value, max_value), y.clamp(min_value, max_value))
}
