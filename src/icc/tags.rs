//! ICC tag signatures and the tag data types this crate understands.

use super::sfixed;
use crate::error::{ColorError, ColorResult};
use crate::locale::Locale;
use crate::matrix::Matrix3;
use crate::mlu::Mlu;

macro_rules! sig {
    ($name:ident, $bytes:expr) => {
        pub const $name: u32 = u32::from_be_bytes(*$bytes);
    };
}

// Tag signatures (4-char names in the profile's tag table).
sig!(RED_COLORANT, b"rXYZ");
sig!(GREEN_COLORANT, b"gXYZ");
sig!(BLUE_COLORANT, b"bXYZ");
sig!(MEDIA_WHITE_POINT, b"wtpt");
sig!(RED_TRC, b"rTRC");
sig!(GREEN_TRC, b"gTRC");
sig!(BLUE_TRC, b"bTRC");
sig!(PROFILE_DESCRIPTION, b"desc");
sig!(CHROMATIC_ADAPTATION, b"chad");
sig!(LUMINANCE, b"lumi");
sig!(A2B0, b"A2B0");

// Tag type signatures (the 4 bytes at the start of tag data).
sig!(TYPE_XYZ, b"XYZ ");
sig!(TYPE_CURV, b"curv");
sig!(TYPE_PARA, b"para");
sig!(TYPE_MLUC, b"mluc");
sig!(TYPE_DESC, b"desc");
sig!(TYPE_SF32, b"sf32");
sig!(TYPE_TEXT, b"text");

/// A parsed, or about-to-be-written, tone curve tag.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveTag {
    /// `curv` with zero entries: identity, equivalent to `Gamma(1.0)`.
    Identity,
    /// `para` functionType 0, or a single-entry `curv`: pure power law.
    Gamma(f64),
    /// `para` functionType 1-4: `Y = (aX + b)^g + c` family. `params[0]`
    /// is always the gamma exponent `g`.
    Parametric { function_type: u16, params: Vec<f64> },
    /// `curv` with more than one sampled entry: an arbitrary LUT curve.
    Sampled(Vec<u16>),
}

impl CurveTag {
    /// The estimated scalar gamma this curve reduces to, if any -
    /// `Some` only for `Identity`/`Gamma`, mirroring the "LCMS type 1"
    /// pure-power recognition.
    #[must_use]
    pub fn as_pure_gamma(&self) -> Option<f64> {
        match self {
            CurveTag::Identity => Some(1.0),
            CurveTag::Gamma(g) => Some(*g),
            CurveTag::Parametric { .. } | CurveTag::Sampled(_) => None,
        }
    }

    /// `matrixCurveScale = a^g` for parametric types 1-4, used when this
    /// curve appears inside an A2B0 matrix-curve tag.
    #[must_use]
    pub fn matrix_curve_scale(&self) -> Option<f64> {
        match self {
            CurveTag::Parametric { params, .. } if params.len() >= 2 => Some(params[1].powf(params[0])),
            _ => None,
        }
    }

    fn parse(type_sig: u32, data: &[u8]) -> ColorResult<Self> {
        match type_sig {
            TYPE_CURV => {
                if data.len() < 12 {
                    return Err(ColorError::ProfileParse("curv tag shorter than header".into()));
                }
                let count = u32::from_be_bytes(data[8..12].try_into().unwrap());
                match count {
                    0 => Ok(CurveTag::Identity),
                    1 => {
                        if data.len() < 14 {
                            return Err(ColorError::ProfileParse("curv gamma entry truncated".into()));
                        }
                        Ok(CurveTag::Gamma(sfixed::read_u8fixed8(&data[12..14])))
                    }
                    n => {
                        let n = n as usize;
                        if data.len() < 12 + n * 2 {
                            return Err(ColorError::ProfileParse("curv sample table truncated".into()));
                        }
                        let samples = data[12..12 + n * 2]
                            .chunks_exact(2)
                            .map(|c| u16::from_be_bytes([c[0], c[1]]))
                            .collect();
                        Ok(CurveTag::Sampled(samples))
                    }
                }
            }
            TYPE_PARA => {
                if data.len() < 12 {
                    return Err(ColorError::ProfileParse("para tag shorter than header".into()));
                }
                let function_type = u16::from_be_bytes(data[8..10].try_into().unwrap());
                let param_count = match function_type {
                    0 => 1,
                    1 => 3,
                    2 => 4,
                    3 => 5,
                    4 => 7,
                    other => return Err(ColorError::ProfileParse(format!("unsupported para functionType {other}"))),
                };
                if data.len() < 12 + param_count * 4 {
                    return Err(ColorError::ProfileParse("para parameters truncated".into()));
                }
                let params = (0..param_count)
                    .map(|i| sfixed::read(&data[12 + i * 4..12 + i * 4 + 4]))
                    .collect::<Vec<_>>();
                if function_type == 0 {
                    Ok(CurveTag::Gamma(params[0]))
                } else {
                    Ok(CurveTag::Parametric { function_type, params })
                }
            }
            other => Err(ColorError::ProfileParse(format!("unrecognized curve tag type 0x{other:08x}"))),
        }
    }

    /// Serializes as a `para` functionType 0 tag (the only curve shape
    /// this crate synthesizes).
    fn write_gamma(g: f64) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + 4);
        out.extend_from_slice(&TYPE_PARA.to_be_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&[0u8; 2]);
        out.extend_from_slice(&sfixed::write(g));
        out
    }
}

/// A parsed tag's payload, keyed by tag signature in [`super::IccProfile`].
#[derive(Debug, Clone, PartialEq)]
pub enum TagData {
    Xyz([f64; 3]),
    Curve(CurveTag),
    Text(Mlu),
    Matrix(Matrix3),
    Unknown(Vec<u8>),
}

impl TagData {
    pub(crate) fn parse(tag_sig: u32, data: &[u8]) -> ColorResult<Self> {
        if data.len() < 4 {
            return Err(ColorError::ProfileParse("tag data shorter than type signature".into()));
        }
        let type_sig = u32::from_be_bytes(data[0..4].try_into().unwrap());
        match type_sig {
            TYPE_XYZ => {
                if data.len() < 20 {
                    return Err(ColorError::ProfileParse("XYZ tag shorter than one entry".into()));
                }
                let xyz = [sfixed::read(&data[8..12]), sfixed::read(&data[12..16]), sfixed::read(&data[16..20])];
                Ok(TagData::Xyz(xyz))
            }
            TYPE_CURV | TYPE_PARA => Ok(TagData::Curve(CurveTag::parse(type_sig, data)?)),
            TYPE_MLUC => Ok(TagData::Text(parse_mluc(data)?)),
            TYPE_DESC => Ok(TagData::Text(parse_desc(data)?)),
            TYPE_TEXT => Ok(TagData::Text(parse_text(data)?)),
            TYPE_SF32 if tag_sig == CHROMATIC_ADAPTATION => {
                if data.len() < 8 + 9 * 4 {
                    return Err(ColorError::ProfileParse("chad matrix truncated".into()));
                }
                let mut rows = [[0.0; 3]; 3];
                for (i, row) in rows.iter_mut().enumerate() {
                    for (j, cell) in row.iter_mut().enumerate() {
                        let off = 8 + (i * 3 + j) * 4;
                        *cell = sfixed::read(&data[off..off + 4]);
                    }
                }
                Ok(TagData::Matrix(Matrix3::from_rows(rows)))
            }
            _ => Ok(TagData::Unknown(data.to_vec())),
        }
    }

    #[must_use]
    pub fn as_xyz(&self) -> Option<[f64; 3]> {
        match self {
            TagData::Xyz(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_curve(&self) -> Option<&CurveTag> {
        match self {
            TagData::Curve(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&Mlu> {
        match self {
            TagData::Text(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_matrix(&self) -> Option<&Matrix3> {
        match self {
            TagData::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

fn parse_mluc(data: &[u8]) -> ColorResult<Mlu> {
    if data.len() < 16 {
        return Err(ColorError::ProfileParse("mluc tag shorter than header".into()));
    }
    let count = u32::from_be_bytes(data[8..12].try_into().unwrap()) as usize;
    let mut mlu = Mlu::new();
    if count == 0 {
        return Ok(mlu);
    }
    let record_size = u32::from_be_bytes(data[12..16].try_into().unwrap()) as usize;
    for i in 0..count {
        let record = 16 + i * record_size;
        if data.len() < record + record_size {
            return Err(ColorError::ProfileParse("mluc record truncated".into()));
        }
        let language: [u8; 2] = data[record..record + 2].try_into().unwrap();
        let country: [u8; 2] = data[record + 2..record + 4].try_into().unwrap();
        let len = u32::from_be_bytes(data[record + 4..record + 8].try_into().unwrap()) as usize;
        let offset = u32::from_be_bytes(data[record + 8..record + 12].try_into().unwrap()) as usize;
        if data.len() < offset + len {
            return Err(ColorError::ProfileParse("mluc text out of bounds".into()));
        }
        let utf16: Vec<u16> = data[offset..offset + len].chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        let text = String::from_utf16(&utf16).map_err(|_| ColorError::ProfileParse("mluc text is not valid UTF-16".into()))?;
        mlu.set_text(&text, Locale::from_bytes(language, country));
    }
    Ok(mlu)
}

fn write_mluc(mlu: &Mlu) -> Vec<u8> {
    let records: Vec<(Locale, Vec<u16>)> = mlu.entries().map(|(locale, text)| (*locale, text.encode_utf16().collect())).collect();
    let record_size = 12;
    let header_size = 16;
    let table_size = header_size + records.len() * record_size;

    let mut out = Vec::with_capacity(table_size + records.iter().map(|(_, u)| u.len() * 2).sum::<usize>());
    out.extend_from_slice(&TYPE_MLUC.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&(records.len() as u32).to_be_bytes());
    out.extend_from_slice(&(record_size as u32).to_be_bytes());

    let mut offsets = Vec::with_capacity(records.len());
    let mut running = table_size;
    for (_, utf16) in &records {
        offsets.push(running);
        running += utf16.len() * 2;
    }

    for ((locale, utf16), offset) in records.iter().zip(&offsets) {
        out.extend_from_slice(&locale.language_bytes());
        out.extend_from_slice(&locale.country_bytes());
        out.extend_from_slice(&((utf16.len() * 2) as u32).to_be_bytes());
        out.extend_from_slice(&(*offset as u32).to_be_bytes());
    }
    for (_, utf16) in &records {
        for unit in utf16 {
            out.extend_from_slice(&unit.to_be_bytes());
        }
    }
    out
}

fn parse_desc(data: &[u8]) -> ColorResult<Mlu> {
    if data.len() < 12 {
        return Err(ColorError::ProfileParse("desc tag shorter than header".into()));
    }
    let len = u32::from_be_bytes(data[8..12].try_into().unwrap()) as usize;
    if data.len() < 12 + len || len == 0 {
        return Err(ColorError::ProfileParse("desc ASCII field truncated".into()));
    }
    let bytes = &data[12..12 + len - 1]; // drop trailing NUL counted in len
    let text = String::from_utf8_lossy(bytes).into_owned();
    let mut mlu = Mlu::new();
    mlu.set_text(&text, Locale::none());
    Ok(mlu)
}

fn parse_text(data: &[u8]) -> ColorResult<Mlu> {
    let bytes = &data[8..];
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = String::from_utf8_lossy(&bytes[..end]).into_owned();
    let mut mlu = Mlu::new();
    mlu.set_text(&text, Locale::none());
    Ok(mlu)
}

pub(crate) fn write_xyz(xyz: [f64; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(20);
    out.extend_from_slice(&TYPE_XYZ.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    for component in xyz {
        out.extend_from_slice(&sfixed::write(component));
    }
    out
}

pub(crate) fn write_gamma_curve(g: f64) -> Vec<u8> {
    CurveTag::write_gamma(g)
}

pub(crate) fn write_description(mlu: &Mlu) -> Vec<u8> {
    write_mluc(mlu)
}

pub(crate) fn write_chad(m: &Matrix3) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + 9 * 4);
    out.extend_from_slice(&TYPE_SF32.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    for row in m.rows {
        for cell in row {
            out.extend_from_slice(&sfixed::write(cell));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xyz_tag_roundtrip() {
        let bytes = write_xyz([0.1, 0.2, 0.3]);
        let parsed = TagData::parse(RED_COLORANT, &bytes).unwrap();
        let xyz = parsed.as_xyz().unwrap();
        assert!((xyz[0] - 0.1).abs() < 1e-4);
        assert!((xyz[1] - 0.2).abs() < 1e-4);
        assert!((xyz[2] - 0.3).abs() < 1e-4);
    }

    #[test]
    fn gamma_curve_roundtrip() {
        let bytes = write_gamma_curve(2.4);
        let parsed = TagData::parse(RED_TRC, &bytes).unwrap();
        let curve = parsed.as_curve().unwrap();
        assert!((curve.as_pure_gamma().unwrap() - 2.4).abs() < 1e-4);
    }

    #[test]
    fn description_roundtrip() {
        let mut mlu = Mlu::new();
        mlu.set_text("hello", Locale::none());
        let bytes = write_description(&mlu);
        let parsed = TagData::parse(PROFILE_DESCRIPTION, &bytes).unwrap();
        assert_eq!("hello", parsed.as_text().unwrap().text(Locale::none()).unwrap());
    }

    #[test]
    fn chad_matrix_roundtrip() {
        let m = Matrix3::identity();
        let bytes = write_chad(&m);
        let parsed = TagData::parse(CHROMATIC_ADAPTATION, &bytes).unwrap();
        assert_eq!(&m, parsed.as_matrix().unwrap());
    }

    #[test]
    fn curv_identity_is_gamma_one() {
        let mut data = TYPE_CURV.to_be_bytes().to_vec();
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&0u32.to_be_bytes());
        let parsed = TagData::parse(RED_TRC, &data).unwrap();
        assert_eq!(Some(1.0), parsed.as_curve().unwrap().as_pure_gamma());
    }
}
