use colorcore::{ChannelDepth, Chromaticity, Curve, PixelFormat, Primaries, Profile, Transform, TransformOptions};

fn main() {
    // Standard profiles are built in.
    let srgb_profile = Profile::create_stock_srgb();

    // Custom profiles are built from primaries and a gamma.
    let custom_primaries = Primaries::new(
        Chromaticity::new(0.630, 0.340),
        Chromaticity::new(0.310, 0.595),
        Chromaticity::new(0.155, 0.070),
        colorcore::white_points::D65,
    );
    let custom_profile = Profile::create(custom_primaries, Curve::Gamma(1.0 / 0.454_545_5), 0, "custom");

    // Applies the profiles.
    let mut t = Transform::create(
        Some(custom_profile.into()),
        PixelFormat::Rgb,
        ChannelDepth::Eight,
        Some(srgb_profile.into()),
        PixelFormat::Rgba,
        ChannelDepth::Wide(16),
        TransformOptions::default(),
    );

    let source_pixels = [0u8, 100, 254];
    let mut dest_pixels = [0u8; 8];
    t.run(1, &source_pixels, &mut dest_pixels, 1).unwrap();

    println!("{dest_pixels:?}");
}
