#[derive(Debug, Clone)]
pub struct PsnrResult {
    pub overall_psnr: f64,
    pub overall_mse: f64,
    pub channel_results: ChannelResults,
}

#[derive(Debug, Clone)]
pub struct ChannelResults {
    pub red: ChannelMetrics,
    pub green: ChannelMetrics,
    pub blue: ChannelMetrics,
    pub alpha: ChannelMetrics,
}

#[derive(Debug, Clone)]
pub struct ChannelMetrics {
    pub psnr: f64,
    pub mse: f64,
}

/// Calculates quality metrics of RGBA8 data. Colour channels are compared in linear space.
///
/// `channels` is the number of leading channels the format stores, so BC4 passes 1
/// and BC5 passes 2. The overall values only average over those.
pub fn calculate_image_metrics(
    original: &[u8],
    compressed: &[u8],
    width: u32,
    height: u32,
    channels: usize,
) -> PsnrResult {
    assert_eq!(original.len(), compressed.len(), "image buffers must have same length");
    assert_eq!(
        original.len(),
        (width * height * 4) as usize,
        "buffer size doesn't match dimensions"
    );

    let to_unit = |channel: usize, value: u8| {
        if channel < 3 {
            srgb_to_linear(value)
        } else {
            f64::from(value) / 255.0
        }
    };

    let mut channel_mse = [0.0; 4];
    for (original, compressed) in original.chunks_exact(4).zip(compressed.chunks_exact(4)) {
        for channel in 0..4 {
            let diff = to_unit(channel, original[channel]) - to_unit(channel, compressed[channel]);
            channel_mse[channel] += diff * diff;
        }
    }

    summarize(channel_mse, f64::from(width * height), channels, 1.0)
}

/// Calculates quality metrics of RGBA32F data, with the peak signal taken from
/// the brightest value of `original`.
pub fn calculate_hdr_metrics(
    original: &[f32],
    compressed: &[f32],
    width: u32,
    height: u32,
    channels: usize,
) -> PsnrResult {
    assert_eq!(original.len(), compressed.len(), "image buffers must have same length");
    assert_eq!(
        original.len(),
        (width * height * 4) as usize,
        "buffer size doesn't match dimensions"
    );

    let peak = original
        .iter()
        .fold(0.0f64, |peak, &value| peak.max(f64::from(value).abs()));

    let mut channel_mse = [0.0; 4];
    for (original, compressed) in original.chunks_exact(4).zip(compressed.chunks_exact(4)) {
        for channel in 0..4 {
            let diff = f64::from(original[channel]) - f64::from(compressed[channel]);
            channel_mse[channel] += diff * diff;
        }
    }

    summarize(channel_mse, f64::from(width * height), channels, peak)
}

fn summarize(mut channel_mse: [f64; 4], pixel_count: f64, channels: usize, peak: f64) -> PsnrResult {
    channel_mse.iter_mut().for_each(|mse| *mse /= pixel_count);

    let calculate_psnr = |mse: f64| -> f64 {
        if mse == 0.0 {
            f64::INFINITY
        } else {
            20.0 * (peak / mse.sqrt()).log10()
        }
    };

    let overall_mse = channel_mse[..channels].iter().sum::<f64>() / channels as f64;
    let overall_psnr = calculate_psnr(overall_mse);

    let metrics = |mse: f64| ChannelMetrics {
        mse,
        psnr: calculate_psnr(mse),
    };

    PsnrResult {
        overall_psnr,
        overall_mse,
        channel_results: ChannelResults {
            red: metrics(channel_mse[0]),
            green: metrics(channel_mse[1]),
            blue: metrics(channel_mse[2]),
            alpha: metrics(channel_mse[3]),
        },
    }
}

#[inline]
fn srgb_to_linear(srgb: u8) -> f64 {
    let v = f64::from(srgb) / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
