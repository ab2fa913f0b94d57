use colorcore::{ChannelDepth, PixelFormat, Profile, Transform, TransformOptions};
use std::sync::Arc;
use std::thread;

fn main() {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt::init();

    // Each Arc<Profile> can be shared across threads; Transform itself
    // carries no shared mutable state, so one per thread is enough.
    let profile = Arc::new(Profile::create_stock_srgb());

    thread::spawn({
        let profile = Arc::clone(&profile);
        move || {
            let mut tr = Transform::create(
                Some(profile.clone()),
                PixelFormat::Rgb,
                ChannelDepth::Eight,
                Some(profile),
                PixelFormat::Rgb,
                ChannelDepth::Eight,
                TransformOptions::default(),
            );
            let out = [0u8; 3];
            let mut out = out;
            tr.run(1, &[1u8, 2, 3], &mut out, 1).unwrap();
        }
    })
    .join()
    .unwrap();

    // A transform can also be built once and moved into a worker thread.
    let mut tr = Transform::create(
        Some(profile.clone()),
        PixelFormat::Rgb,
        ChannelDepth::Eight,
        Some(profile),
        PixelFormat::Rgb,
        ChannelDepth::Eight,
        TransformOptions::default(),
    );

    thread::spawn(move || {
        let mut out = [0u8; 3];
        tr.run(1, &[1u8, 2, 3], &mut out, 1).unwrap();
    })
    .join()
    .unwrap();
}
