use bcn_codec::{
    decode::{decompress_blocks, decompress_blocks_f32},
    encode::{compress_rgba32f, compress_rgba8},
    CompressionVariant,
};

use crate::common::{
    metrics::{calculate_hdr_metrics, calculate_image_metrics, PsnrResult},
    HEIGHT, WIDTH,
};

mod common;

fn print_metrics(name: &str, metrics: &PsnrResult) {
    println!("-----------------------");
    println!("Image name: {}", name);
    println!("Overall PSNR: {:.2} dB", metrics.overall_psnr);
    println!("Overall MSE: {:.6}", metrics.overall_mse);
    println!("Red channel PSNR: {:.2} dB", metrics.channel_results.red.psnr);
    println!("Green channel PSNR: {:.2} dB", metrics.channel_results.green.psnr);
    println!("Blue channel PSNR: {:.2} dB", metrics.channel_results.blue.psnr);
    println!("Alpha channel PSNR: {:.2} dB", metrics.channel_results.alpha.psnr);
    println!("-----------------------");
}

fn round_trip(variant: CompressionVariant, rgba: &[u8]) -> Vec<u8> {
    let mut blocks = vec![0; variant.blocks_byte_size(WIDTH, HEIGHT)];
    compress_rgba8(variant, rgba, &mut blocks, WIDTH, HEIGHT, WIDTH as usize * 4).unwrap();

    let mut decoded = vec![0; rgba.len()];
    decompress_blocks(variant, WIDTH, HEIGHT, &blocks, &mut decoded).unwrap();
    decoded
}

fn round_trip_f32(variant: CompressionVariant, rgba: &[f32]) -> Vec<f32> {
    let mut blocks = vec![0; variant.blocks_byte_size(WIDTH, HEIGHT)];
    compress_rgba32f(variant, rgba, &mut blocks, WIDTH, HEIGHT, WIDTH as usize * 4).unwrap();

    let mut decoded = vec![0.0; rgba.len()];
    decompress_blocks_f32(variant, WIDTH, HEIGHT, &blocks, &mut decoded).unwrap();
    decoded
}

/// Round trips `original` and checks the PSNR over the first `channels` channels.
fn assert_psnr(name: &str, variant: CompressionVariant, original: &[u8], channels: usize, floor: f64) {
    let mut expected = original.to_vec();
    common::mask_channels(&mut expected, channels);

    let decoded = round_trip(variant, original);
    let metrics = calculate_image_metrics(&expected, &decoded, WIDTH, HEIGHT, channels);
    print_metrics(name, &metrics);

    assert!(
        metrics.overall_psnr >= floor,
        "{name} with {}: {:.2} dB is below {floor} dB",
        variant.name(),
        metrics.overall_psnr
    );
}

fn assert_psnr_f32(
    name: &str,
    variant: CompressionVariant,
    original: &[f32],
    channels: usize,
    floor: f64,
) {
    let decoded = round_trip_f32(variant, original);
    let metrics = calculate_hdr_metrics(original, &decoded, WIDTH, HEIGHT, channels);
    print_metrics(name, &metrics);

    assert!(
        metrics.overall_psnr >= floor,
        "{name} with {}: {:.2} dB is below {floor} dB",
        variant.name(),
        metrics.overall_psnr
    );
}

/// Encoding an already decoded image must not lose more than the first pass did.
fn assert_no_drift(variant: CompressionVariant, original: &[u8], channels: usize) {
    let first = round_trip(variant, original);
    let second = round_trip(variant, &first);

    let mut expected = original.to_vec();
    common::mask_channels(&mut expected, channels);

    let loss = calculate_image_metrics(&expected, &first, WIDTH, HEIGHT, channels);
    let drift = calculate_image_metrics(&first, &second, WIDTH, HEIGHT, channels);
    assert!(
        drift.overall_psnr >= loss.overall_psnr,
        "{} drifted: {:.2} dB after the second pass, {:.2} dB after the first",
        variant.name(),
        drift.overall_psnr,
        loss.overall_psnr
    );
}

#[cfg(feature = "bc6h")]
fn assert_no_drift_f32(variant: CompressionVariant, original: &[f32], channels: usize) {
    let first = round_trip_f32(variant, original);
    let second = round_trip_f32(variant, &first);

    let loss = calculate_hdr_metrics(original, &first, WIDTH, HEIGHT, channels);
    let drift = calculate_hdr_metrics(&first, &second, WIDTH, HEIGHT, channels);
    assert!(
        drift.overall_psnr >= loss.overall_psnr,
        "{} drifted: {:.2} dB after the second pass, {:.2} dB after the first",
        variant.name(),
        drift.overall_psnr,
        loss.overall_psnr
    );
}

#[cfg(feature = "bc15")]
mod bc15 {
    use bcn_codec::{BC15Settings, Signedness};

    use super::*;

    #[test]
    fn psnr_bc1() {
        let image = common::gradient_image();
        assert_psnr("gradient", CompressionVariant::BC1(BC15Settings::basic()), &image, 3, 28.0);
        assert_psnr(
            "gradient",
            CompressionVariant::BC1(BC15Settings::dithered()),
            &image,
            3,
            26.0,
        );
    }

    #[test]
    fn psnr_bc2() {
        let image = common::alpha_image();
        assert_psnr("alpha", CompressionVariant::BC2(BC15Settings::basic()), &image, 4, 30.0);
    }

    #[test]
    fn psnr_bc3() {
        let image = common::alpha_image();
        assert_psnr("alpha", CompressionVariant::BC3(BC15Settings::basic()), &image, 4, 30.0);
        let image = common::gradient_image();
        assert_psnr("gradient", CompressionVariant::BC3(BC15Settings::uniform()), &image, 4, 28.0);
    }

    #[test]
    fn psnr_bc4() {
        let image = common::gradient_image();
        assert_psnr("gradient", CompressionVariant::BC4(Signedness::Unsigned), &image, 1, 32.0);

        let image = common::signed_image();
        assert_psnr_f32("signed", CompressionVariant::BC4(Signedness::Signed), &image, 1, 32.0);
    }

    #[test]
    fn psnr_bc5() {
        let image = common::gradient_image();
        assert_psnr("gradient", CompressionVariant::BC5(Signedness::Unsigned), &image, 2, 32.0);

        let image = common::signed_image();
        assert_psnr_f32("signed", CompressionVariant::BC5(Signedness::Signed), &image, 2, 32.0);
    }

    #[test]
    fn bc1_solid_color_is_stable() {
        let variant = CompressionVariant::BC1(BC15Settings::basic());
        let image = common::solid_image([200, 90, 17, 255]);

        let first = round_trip(variant, &image);
        let second = round_trip(variant, &first);
        assert_eq!(first, second);

        for (original, decoded) in image.as_raw().iter().zip(&first) {
            assert!(original.abs_diff(*decoded) <= 255 / 31 + 1);
        }
    }

    #[test]
    fn no_drift() {
        let image = common::gradient_image();
        assert_no_drift(CompressionVariant::BC1(BC15Settings::basic()), &image, 3);
        assert_no_drift(CompressionVariant::BC4(Signedness::Unsigned), &image, 1);
        assert_no_drift(CompressionVariant::BC5(Signedness::Unsigned), &image, 2);

        let image = common::alpha_image();
        assert_no_drift(CompressionVariant::BC2(BC15Settings::basic()), &image, 4);
        assert_no_drift(CompressionVariant::BC3(BC15Settings::basic()), &image, 4);
    }
}

#[cfg(feature = "bc6h")]
mod bc6h {
    use bcn_codec::{BC6HSettings, Signedness};

    use super::*;

    #[test]
    fn psnr_bc6h() {
        let image = common::hdr_image();
        assert_psnr_f32(
            "hdr",
            CompressionVariant::BC6H(Signedness::Unsigned, BC6HSettings::very_fast()),
            &image,
            3,
            30.0,
        );
        assert_psnr_f32(
            "hdr",
            CompressionVariant::BC6H(Signedness::Signed, BC6HSettings::basic()),
            &image,
            3,
            30.0,
        );

        let image = common::signed_image();
        assert_psnr_f32(
            "signed",
            CompressionVariant::BC6H(Signedness::Signed, BC6HSettings::basic()),
            &image,
            3,
            30.0,
        );
    }

    #[test]
    fn bc6h_alpha_is_opaque() {
        let image = common::hdr_image();
        let decoded = round_trip_f32(
            CompressionVariant::BC6H(Signedness::Unsigned, BC6HSettings::very_fast()),
            &image,
        );
        assert!(decoded.chunks_exact(4).all(|pixel| pixel[3] == 1.0));
    }

    #[test]
    fn no_drift() {
        let image = common::hdr_image();
        assert_no_drift_f32(
            CompressionVariant::BC6H(Signedness::Unsigned, BC6HSettings::very_fast()),
            &image,
            3,
        );

        let image = common::signed_image();
        assert_no_drift_f32(
            CompressionVariant::BC6H(Signedness::Signed, BC6HSettings::basic()),
            &image,
            3,
        );
    }
}

#[cfg(feature = "bc7")]
mod bc7 {
    use bcn_codec::BC7Settings;

    use super::*;

    #[test]
    fn psnr_bc7() {
        let image = common::gradient_image();
        assert_psnr("gradient", CompressionVariant::BC7(BC7Settings::very_fast()), &image, 4, 32.0);
        assert_psnr("gradient", CompressionVariant::BC7(BC7Settings::basic()), &image, 4, 34.0);

        let image = common::alpha_image();
        assert_psnr("alpha", CompressionVariant::BC7(BC7Settings::fast()), &image, 4, 36.0);
    }

    #[test]
    fn no_drift() {
        let image = common::gradient_image();
        assert_no_drift(CompressionVariant::BC7(BC7Settings::fast()), &image, 4);

        let image = common::alpha_image();
        assert_no_drift(CompressionVariant::BC7(BC7Settings::very_fast()), &image, 4);
    }
}
