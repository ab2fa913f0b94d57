//! A small, dependency-light engine for ICC display-RGB profiles: parsing
//! and synthesizing profiles, deriving their colorimetric attributes, and
//! running parallel pixel-format and color-space conversions between them.
//!
//! The profile side understands the handful of ICC v2/v4 tags a display
//! profile actually needs (`rXYZ`/`gXYZ`/`bXYZ`/`wtpt`, TRC curves, `chad`,
//! `desc`/multilocalized text, `lumi`) plus a best-effort fallback onto an
//! `A2B0` matrix tag. The transform side evaluates a derived 3x3 matrix
//! and a pair of transfer functions (pure gamma, SMPTE ST.2084 PQ, or
//! ARIB/BT.2100 HLG) directly, without shelling out to an external CMM.

#![allow(dead_code)]

mod curve;
mod error;
mod icc;
mod locale;
mod matrix;
mod mlu;
mod pixel_format;
mod primaries;
mod profile;
mod task;
mod transform;

pub use curve::{hlg_eotf, hlg_oetf, pq_eotf, pq_oetf, Curve, TransferKind};
pub use error::{ColorError, ColorResult};
pub use locale::Locale;
pub use matrix::{rgb_to_xyz_matrix, xyz_to_xy, Matrix3};
pub use mlu::Mlu;
pub use pixel_format::{pixel_bytes, ChannelDepth, PixelFormat};
pub use primaries::{white_points, Chromaticity, Primaries};
pub use profile::{Profile, ProfileAttributes, UNSPECIFIED_LUMINANCE};
pub use task::{run_sharded, shard_ranges};
pub use transform::{Transform, TransformOptions};
