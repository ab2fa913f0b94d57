//! The conversion engine: derives a source-to-destination matrix and pair
//! of transfer functions from two profiles (or `None` for XYZ), then runs
//! that math over a pixel buffer, sharded across worker threads.

use std::sync::Arc;

use crate::curve::{Curve, TransferKind};
use crate::error::ColorResult;
use crate::matrix::{self, Matrix3};
use crate::pixel_format::{pixel_bytes, ChannelDepth, PixelFormat};
use crate::profile::Profile;
use crate::task;

/// Caller-facing knobs mirroring the external interface's task-count and
/// external-CMM-opt-out parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    /// Forces every slab through the external-CMM fallback path, even for
    /// curves this crate's built-in math can evaluate natively.
    pub force_external_cmm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    Prepared,
}

struct Prepared {
    reformat_only: bool,
    matrix: Matrix3,
    src_transfer: TransferKind,
    dst_transfer: TransferKind,
    used_external_cmm: bool,
}

/// A prepared (or not-yet-prepared) conversion between a source and
/// destination pixel format/profile pair. Profiles are referenced, not
/// owned, so the same `Arc<Profile>` can back many transforms at once; a
/// `None` profile means XYZ pass-through (identity matrix, no transfer
/// function).
pub struct Transform {
    src_profile: Option<Arc<Profile>>,
    src_format: PixelFormat,
    src_depth: ChannelDepth,
    dst_profile: Option<Arc<Profile>>,
    dst_format: PixelFormat,
    dst_depth: ChannelDepth,
    options: TransformOptions,
    state: State,
    prepared: Option<Prepared>,
}

impl Transform {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        src_profile: Option<Arc<Profile>>,
        src_format: PixelFormat,
        src_depth: ChannelDepth,
        dst_profile: Option<Arc<Profile>>,
        dst_format: PixelFormat,
        dst_depth: ChannelDepth,
        options: TransformOptions,
    ) -> Self {
        Transform {
            src_profile,
            src_format,
            src_depth,
            dst_profile,
            dst_format,
            dst_depth,
            options,
            state: State::New,
            prepared: None,
        }
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.state == State::Prepared
    }

    /// Derives the source-to-destination matrix and both transfer-function
    /// kinds. Idempotent: once prepared, a second call is a no-op, matching
    /// `run`'s "prepare if not already prepared" contract.
    pub fn prepare(&mut self) -> ColorResult<()> {
        if self.state == State::Prepared {
            return Ok(());
        }

        let reformat_only = profiles_match(self.src_profile.as_deref(), self.dst_profile.as_deref());

        let src_to_xyz = match &self.src_profile {
            Some(p) => matrix::rgb_to_xyz_matrix(&p.query()?.primaries)?,
            None => Matrix3::identity(),
        };
        let dst_to_xyz = match &self.dst_profile {
            Some(p) => matrix::rgb_to_xyz_matrix(&p.query()?.primaries)?,
            None => Matrix3::identity(),
        };
        let matrix = dst_to_xyz.inverse()?.mul(&src_to_xyz);

        let (src_transfer, src_unsupported) = match &self.src_profile {
            None => (TransferKind::None, false),
            Some(p) => transfer_kind_for(&p.query()?.curve, false),
        };
        let (dst_transfer, dst_unsupported) = match &self.dst_profile {
            None => (TransferKind::None, false),
            Some(p) => transfer_kind_for(&p.query()?.curve, true),
        };

        let used_external_cmm = self.options.force_external_cmm || src_unsupported || dst_unsupported;
        #[cfg(feature = "tracing")]
        if used_external_cmm {
            tracing::debug!(
                forced = self.options.force_external_cmm,
                src_unsupported,
                dst_unsupported,
                "falling back to an approximated transfer function for a non-trivial curve"
            );
        }

        self.prepared = Some(Prepared { reformat_only, matrix, src_transfer, dst_transfer, used_external_cmm });
        self.state = State::Prepared;
        Ok(())
    }

    /// Prepares if needed, then shards `pixel_count` pixels across
    /// `task_count` workers and runs the kernel on each slab. `run(1, ..)`
    /// and `run(n, ..)` for any `n` produce bit-identical output: slabs
    /// are disjoint byte ranges and the kernel carries no cross-pixel
    /// state.
    pub fn run(&mut self, task_count: usize, src_pixels: &[u8], dst_pixels: &mut [u8], pixel_count: usize) -> ColorResult<()> {
        self.prepare()?;
        let prepared = self.prepared.as_ref().expect("prepare() always populates prepared state");

        let src_stride = pixel_bytes(self.src_format, self.src_depth);
        let dst_stride = pixel_bytes(self.dst_format, self.dst_depth);
        debug_assert_eq!(src_pixels.len(), src_stride * pixel_count);
        debug_assert_eq!(dst_pixels.len(), dst_stride * pixel_count);

        let ranges = task::shard_ranges(pixel_count, task_count);

        let mut slabs: Vec<(&[u8], &mut [u8])> = {
            let mut dst_rest = dst_pixels;
            let mut out = Vec::with_capacity(ranges.len());
            for (start, len) in &ranges {
                let (dst_slab, rest) = dst_rest.split_at_mut(len * dst_stride);
                dst_rest = rest;
                out.push((&src_pixels[start * src_stride..(start + len) * src_stride], dst_slab));
            }
            out
        };

        let math = PixelMath {
            src_format: self.src_format,
            src_depth: self.src_depth,
            dst_format: self.dst_format,
            dst_depth: self.dst_depth,
            matrix: prepared.matrix,
            src_transfer: prepared.src_transfer,
            dst_transfer: prepared.dst_transfer,
            reformat_only: prepared.reformat_only,
        };

        task::run_sharded(&mut slabs, |(src, dst)| {
            process_slab(&math, src, dst);
        });
        Ok(())
    }

    /// Whether the last `prepare()` had to approximate a non-trivial curve
    /// rather than evaluate it exactly.
    #[must_use]
    pub fn used_external_cmm(&self) -> bool {
        self.prepared.as_ref().is_some_and(|p| p.used_external_cmm)
    }
}

fn profiles_match(a: Option<&Profile>, b: Option<&Profile>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.pack() == b.pack() || matches!((a.query(), b.query()), (Ok(qa), Ok(qb)) if qa == qb),
        _ => false,
    }
}

/// Maps a profile's derived curve to the engine's transfer-function kind.
/// Returns `(kind, approximated)`; `approximated` flags a curve this
/// crate cannot evaluate exactly (`Complex`/`Unknown`), in which case the
/// curve's estimated gamma (if any) stands in for it, else identity. For
/// the destination side, `Gamma` is inverted up front so the per-pixel
/// kernel never divides.
fn transfer_kind_for(curve: &Curve, invert_gamma: bool) -> (TransferKind, bool) {
    match curve {
        Curve::Gamma(g) => (TransferKind::Gamma(if invert_gamma { 1.0 / g } else { *g }), false),
        Curve::Pq => (TransferKind::Pq, false),
        Curve::Hlg => (TransferKind::Hlg, false),
        Curve::Complex { estimated_gamma: Some(g), .. } => {
            (TransferKind::Gamma(if invert_gamma { 1.0 / g } else { *g }), true)
        }
        Curve::Complex { estimated_gamma: None, .. } | Curve::Unknown => (TransferKind::None, true),
    }
}

struct PixelMath {
    src_format: PixelFormat,
    src_depth: ChannelDepth,
    dst_format: PixelFormat,
    dst_depth: ChannelDepth,
    matrix: Matrix3,
    src_transfer: TransferKind,
    dst_transfer: TransferKind,
    reformat_only: bool,
}

fn process_slab(math: &PixelMath, src: &[u8], dst: &mut [u8]) {
    let src_stride = pixel_bytes(math.src_format, math.src_depth);
    let dst_stride = pixel_bytes(math.dst_format, math.dst_depth);
    let src_has_alpha = math.src_format.has_alpha();
    let dst_has_alpha = math.dst_format.has_alpha();
    let src_channel_bytes = math.src_depth.channel_bytes();
    let dst_channel_bytes = math.dst_depth.channel_bytes();

    for (src_pixel, dst_pixel) in src.chunks_exact(src_stride).zip(dst.chunks_exact_mut(dst_stride)) {
        let mut rgb = [0.0f32; 3];
        for (i, slot) in rgb.iter_mut().enumerate() {
            *slot = read_channel(&src_pixel[i * src_channel_bytes..], math.src_depth);
        }

        if !math.reformat_only {
            for v in &mut rgb {
                *v = math.src_transfer.apply(*v);
            }
            let xyz = math.matrix.mul_vec([f64::from(rgb[0]), f64::from(rgb[1]), f64::from(rgb[2])]);
            rgb = [xyz[0] as f32, xyz[1] as f32, xyz[2] as f32];
            for v in &mut rgb {
                *v = math.dst_transfer.apply(*v);
            }
        }

        for (i, value) in rgb.iter().enumerate() {
            write_channel(&mut dst_pixel[i * dst_channel_bytes..], math.dst_depth, *value);
        }

        if dst_has_alpha {
            let alpha = if src_has_alpha {
                read_channel(&src_pixel[3 * src_channel_bytes..], math.src_depth)
            } else {
                1.0
            };
            write_channel(&mut dst_pixel[3 * dst_channel_bytes..], math.dst_depth, alpha);
        }
    }
}

#[inline]
fn read_channel(bytes: &[u8], depth: ChannelDepth) -> f32 {
    match depth {
        ChannelDepth::Eight => f32::from(bytes[0]) / 255.0,
        ChannelDepth::Wide(_) => {
            let raw: u16 = bytemuck::pod_read_unaligned(&bytes[0..2]);
            f32::from(raw) / depth.max_channel()
        }
        ChannelDepth::Float => bytemuck::pod_read_unaligned(&bytes[0..4]),
    }
}

#[inline]
fn round_half_away_from_zero(x: f32) -> f32 {
    debug_assert!(x >= 0.0, "channel values are clamped non-negative by every transfer function before encoding");
    (x + 0.5).floor()
}

#[inline]
fn write_channel(out: &mut [u8], depth: ChannelDepth, value: f32) {
    match depth {
        ChannelDepth::Eight => {
            out[0] = round_half_away_from_zero(value * 255.0).clamp(0.0, 255.0) as u8;
        }
        ChannelDepth::Wide(_) => {
            let max = depth.max_channel();
            let raw = round_half_away_from_zero(value * max).clamp(0.0, max) as u16;
            out[0..2].copy_from_slice(bytemuck::bytes_of(&raw));
        }
        ChannelDepth::Float => {
            out[0..4].copy_from_slice(bytemuck::bytes_of(&value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primaries::Primaries;

    fn srgb() -> Arc<Profile> {
        Arc::new(Profile::create_stock_srgb())
    }

    #[test]
    fn identity_srgb_to_srgb_rgba8() {
        let profile = srgb();
        let mut transform = Transform::create(
            Some(profile.clone()),
            PixelFormat::Rgba,
            ChannelDepth::Eight,
            Some(profile),
            PixelFormat::Rgba,
            ChannelDepth::Eight,
            TransformOptions::default(),
        );
        let src = [10u8, 20, 30, 40, 255, 0, 0, 255];
        let mut dst = [0u8; 8];
        transform.run(1, &src, &mut dst, 2).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn parallel_determinism() {
        let profile_a = Arc::new(Profile::create(Primaries::bt709(), Curve::Gamma(2.2), 100, "a"));
        let profile_b = Arc::new(Profile::create(Primaries::bt2100(), Curve::Gamma(2.4), 100, "b"));
        let pixel_count = 1_000_003usize;
        let src: Vec<u8> = (0..pixel_count * 3).map(|i| (i % 256) as u8).collect();

        let mut outputs = Vec::new();
        for tasks in [1usize, 3, 7] {
            let mut transform = Transform::create(
                Some(profile_a.clone()),
                PixelFormat::Rgb,
                ChannelDepth::Eight,
                Some(profile_b.clone()),
                PixelFormat::Rgb,
                ChannelDepth::Eight,
                TransformOptions::default(),
            );
            let mut dst = vec![0u8; pixel_count * 3];
            transform.run(tasks, &src, &mut dst, pixel_count).unwrap();
            outputs.push(dst);
        }
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);
    }

    #[test]
    fn depth_rescale_reformat_only() {
        let profile = srgb();
        let mut transform = Transform::create(
            Some(profile.clone()),
            PixelFormat::Rgb,
            ChannelDepth::Eight,
            Some(profile),
            PixelFormat::Rgb,
            ChannelDepth::Wide(10),
            TransformOptions::default(),
        );
        let src = [128u8, 128, 128];
        let mut dst = [0u8; 6];
        transform.run(1, &src, &mut dst, 1).unwrap();
        let value = u16::from_ne_bytes([dst[0], dst[1]]);
        // 128/255*1023 = 513.506..., which rounds half-away-from-zero to 514.
        assert_eq!(514, value);
    }

    #[test]
    fn alpha_fabricated_as_full_opacity() {
        let profile = srgb();
        let mut transform = Transform::create(
            Some(profile.clone()),
            PixelFormat::Rgb,
            ChannelDepth::Eight,
            Some(profile),
            PixelFormat::Rgba,
            ChannelDepth::Eight,
            TransformOptions::default(),
        );
        let src = [1u8, 2, 3, 250, 251, 252];
        let mut dst = [0u8; 8];
        transform.run(1, &src, &mut dst, 2).unwrap();
        assert_eq!(255, dst[3]);
        assert_eq!(255, dst[7]);
    }

    #[test]
    fn gamma_roundtrip_float_preserves_channels() {
        let profile = Arc::new(Profile::create(Primaries::bt709(), Curve::Gamma(2.2), 100, "g"));
        let linear = Arc::new(Profile::create_linear(&profile).unwrap());

        let mut to_linear = Transform::create(
            Some(profile.clone()),
            PixelFormat::Rgb,
            ChannelDepth::Float,
            Some(linear.clone()),
            PixelFormat::Rgb,
            ChannelDepth::Float,
            TransformOptions::default(),
        );
        let mut from_linear = Transform::create(
            Some(linear),
            PixelFormat::Rgb,
            ChannelDepth::Float,
            Some(profile),
            PixelFormat::Rgb,
            ChannelDepth::Float,
            TransformOptions::default(),
        );

        let src: [f32; 3] = [0.2, 0.5, 0.8];
        let mut src_bytes = [0u8; 12];
        for (i, v) in src.iter().enumerate() {
            src_bytes[i * 4..i * 4 + 4].copy_from_slice(&v.to_ne_bytes());
        }
        let mut mid = [0u8; 12];
        to_linear.run(1, &src_bytes, &mut mid, 1).unwrap();
        let mut back = [0u8; 12];
        from_linear.run(1, &mid, &mut back, 1).unwrap();

        for i in 0..3 {
            let got = f32::from_ne_bytes(back[i * 4..i * 4 + 4].try_into().unwrap());
            assert!((got - src[i]).abs() < 1e-5, "channel {i}: {got} != {}", src[i]);
        }
    }

    #[test]
    fn reformat_only_when_profiles_match() {
        let profile = srgb();
        let mut transform = Transform::create(
            Some(profile.clone()),
            PixelFormat::Rgb,
            ChannelDepth::Eight,
            Some(profile),
            PixelFormat::Rgb,
            ChannelDepth::Eight,
            TransformOptions::default(),
        );
        transform.prepare().unwrap();
        assert!(!transform.used_external_cmm());
        assert!(transform.prepared.as_ref().unwrap().reformat_only);
    }
}
