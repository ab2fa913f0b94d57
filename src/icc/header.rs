//! The 128-byte ICC profile header (ICC.1:2022 section 7.2).

use crate::error::{ColorError, ColorResult};

pub const HEADER_SIZE: usize = 128;
pub const PROFILE_SIGNATURE: u32 = 0x6163_7370; // 'acsp'

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProfileVersion {
    #[must_use]
    pub fn is_v4_or_later(&self) -> bool {
        self.major >= 4
    }

    #[must_use]
    pub fn v2() -> Self {
        ProfileVersion { major: 2, minor: 1 }
    }

    #[must_use]
    pub fn v4() -> Self {
        ProfileVersion { major: 4, minor: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Display,
    Input,
    Output,
    ColorSpace,
}

impl DeviceClass {
    fn from_bytes(b: [u8; 4]) -> ColorResult<Self> {
        match &b {
            b"mntr" => Ok(DeviceClass::Display),
            b"scnr" => Ok(DeviceClass::Input),
            b"prtr" => Ok(DeviceClass::Output),
            b"spac" => Ok(DeviceClass::ColorSpace),
            other => Err(ColorError::ProfileParse(format!(
                "unrecognized device class {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    fn to_bytes(self) -> [u8; 4] {
        match self {
            DeviceClass::Display => *b"mntr",
            DeviceClass::Input => *b"scnr",
            DeviceClass::Output => *b"prtr",
            DeviceClass::ColorSpace => *b"spac",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Rgb,
    Xyz,
    Gray,
}

impl ColorSpace {
    fn from_bytes(b: [u8; 4]) -> ColorResult<Self> {
        match &b {
            b"RGB " => Ok(ColorSpace::Rgb),
            b"XYZ " => Ok(ColorSpace::Xyz),
            b"GRAY" => Ok(ColorSpace::Gray),
            other => Err(ColorError::ProfileParse(format!(
                "unrecognized color space {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    fn to_bytes(self) -> [u8; 4] {
        match self {
            ColorSpace::Rgb => *b"RGB ",
            ColorSpace::Xyz => *b"XYZ ",
            ColorSpace::Gray => *b"GRAY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingIntent {
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
}

impl RenderingIntent {
    fn from_u32(v: u32) -> ColorResult<Self> {
        match v {
            0 => Ok(RenderingIntent::Perceptual),
            1 => Ok(RenderingIntent::RelativeColorimetric),
            2 => Ok(RenderingIntent::Saturation),
            3 => Ok(RenderingIntent::AbsoluteColorimetric),
            other => Err(ColorError::ProfileParse(format!("invalid rendering intent {other}"))),
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            RenderingIntent::Perceptual => 0,
            RenderingIntent::RelativeColorimetric => 1,
            RenderingIntent::Saturation => 2,
            RenderingIntent::AbsoluteColorimetric => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IccHeader {
    pub size: u32,
    pub version: ProfileVersion,
    pub device_class: DeviceClass,
    pub color_space: ColorSpace,
    pub pcs: ColorSpace,
    pub rendering_intent: RenderingIntent,
}

impl IccHeader {
    pub fn parse(data: &[u8]) -> ColorResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(ColorError::ProfileParse(format!(
                "profile too small for header: {} bytes",
                data.len()
            )));
        }
        let size = u32::from_be_bytes(data[0..4].try_into().unwrap());
        let version = ProfileVersion { major: data[8], minor: data[9] >> 4 };
        let device_class = DeviceClass::from_bytes(data[12..16].try_into().unwrap())?;
        let color_space = ColorSpace::from_bytes(data[16..20].try_into().unwrap())?;
        let pcs = ColorSpace::from_bytes(data[20..24].try_into().unwrap())?;
        let signature = u32::from_be_bytes(data[36..40].try_into().unwrap());
        if signature != PROFILE_SIGNATURE {
            return Err(ColorError::ProfileParse(format!("bad profile signature 0x{signature:08x}")));
        }
        let rendering_intent = RenderingIntent::from_u32(u32::from_be_bytes(data[64..68].try_into().unwrap()))?;

        Ok(IccHeader { size, version, device_class, color_space, pcs, rendering_intent })
    }

    pub fn validate(&self, data_len: usize) -> ColorResult<()> {
        if self.size as usize > data_len {
            return Err(ColorError::ProfileParse(format!(
                "header declares {} bytes, profile has {data_len}",
                self.size
            )));
        }
        Ok(())
    }

    /// Writes the 128-byte header into `out`, which must already be sized
    /// to at least `HEADER_SIZE`; untouched fields (CMM type, platform,
    /// timestamps, creator, profile ID) are left zeroed.
    pub fn write(&self, out: &mut [u8]) {
        debug_assert!(out.len() >= HEADER_SIZE);
        out[0..4].copy_from_slice(&self.size.to_be_bytes());
        out[8] = self.version.major;
        out[9] = self.version.minor << 4;
        out[12..16].copy_from_slice(&self.device_class.to_bytes());
        out[16..20].copy_from_slice(&self.color_space.to_bytes());
        out[20..24].copy_from_slice(&self.pcs.to_bytes());
        out[36..40].copy_from_slice(&PROFILE_SIGNATURE.to_be_bytes());
        out[64..68].copy_from_slice(&self.rendering_intent.to_u32().to_be_bytes());
    }

    #[must_use]
    pub fn display_rgb(version: ProfileVersion) -> Self {
        IccHeader {
            size: 0,
            version,
            device_class: DeviceClass::Display,
            color_space: ColorSpace::Rgb,
            pcs: ColorSpace::Xyz,
            rendering_intent: RenderingIntent::RelativeColorimetric,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let h = IccHeader::display_rgb(ProfileVersion::v4());
        let mut buf = vec![0u8; HEADER_SIZE];
        h.write(&mut buf);
        let parsed = IccHeader::parse(&buf).unwrap();
        assert_eq!(parsed.device_class, DeviceClass::Display);
        assert_eq!(parsed.color_space, ColorSpace::Rgb);
        assert_eq!(parsed.pcs, ColorSpace::Xyz);
        assert_eq!(parsed.version.major, 4);
    }

    #[test]
    fn rejects_bad_signature() {
        let buf = vec![0u8; HEADER_SIZE];
        assert!(IccHeader::parse(&buf).is_err());
    }

    #[test]
    fn rejects_too_small() {
        let buf = vec![0u8; 64];
        assert!(IccHeader::parse(&buf).is_err());
    }
}
