use colorcore::{ChannelDepth, PixelFormat, Profile, Transform, TransformOptions};
use std::env;
use std::fs;

fn main() {
    let path = env::args().nth(1).expect("Specify a profile as an argument");
    let bytes = fs::read(path).expect("failed to read profile");
    let p1 = Profile::unpack(&bytes).unwrap();
    let p2 = Profile::create_stock_srgb();

    let mut t = Transform::create(
        Some(p1.into()),
        PixelFormat::Rgb,
        ChannelDepth::Eight,
        Some(p2.into()),
        PixelFormat::Rgb,
        ChannelDepth::Eight,
        TransformOptions::default(),
    );

    let mut total_diff = 0usize;
    let mut max_diff = 0i32;
    let mut n = 0;

    for r in (0..256).step_by(3) {
        for g in (0..256).step_by(4) {
            for b in (0..256).step_by(5) {
                let input = [r as u8, g as u8, b as u8];
                let mut out = [0u8; 3];
                t.run(1, &input, &mut out, 1).unwrap();

                n += 1;
                if input != out {
                    let diff = (r as i32 - i32::from(out[0])).pow(2)
                        + (g as i32 - i32::from(out[1])).pow(2)
                        + (b as i32 - i32::from(out[2])).pow(2);
                    total_diff += diff as usize;
                    max_diff = max_diff.max(diff);
                    println!("{:02X}{:02X}{:02X} => {:02X}{:02X}{:02X} (off by {diff})", r, g, b, out[0], out[1], out[2]);
                }
            }
        }
    }

    println!("Average squared difference from sRGB: {:.5}. Max {max_diff}.", total_diff as f64 / f64::from(n));
}
