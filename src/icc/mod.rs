//! Byte-level ICC profile reading and writing: the 128-byte header, the
//! tag table, and the handful of tag types this crate's color math needs
//! (XYZType, curv/para curves, mluc/desc text, the chad matrix, and the
//! A2B0 matrix-offset fallback).

pub mod header;
pub mod sfixed;
pub mod tags;

use std::collections::HashMap;

use crate::error::{ColorError, ColorResult};
use header::IccHeader;
use tags::TagData;

const TAG_TABLE_START: usize = header::HEADER_SIZE + 4;
const TAG_ENTRY_SIZE: usize = 12;

/// A profile decoded down to its header and a signature-keyed tag map.
#[derive(Debug, Clone)]
pub struct IccProfile {
    pub header: IccHeader,
    tags: HashMap<u32, TagData>,
}

impl IccProfile {
    pub fn parse(data: &[u8]) -> ColorResult<Self> {
        let header = IccHeader::parse(data)?;
        header.validate(data.len())?;

        if data.len() < TAG_TABLE_START {
            return Err(ColorError::ProfileParse("profile too small for tag count".into()));
        }
        let tag_count = u32::from_be_bytes(data[header::HEADER_SIZE..TAG_TABLE_START].try_into().unwrap()) as usize;

        let table_size = tag_count * TAG_ENTRY_SIZE;
        if data.len() < TAG_TABLE_START + table_size {
            return Err(ColorError::ProfileParse("profile too small for tag table".into()));
        }

        let mut tags = HashMap::with_capacity(tag_count);
        for i in 0..tag_count {
            let entry_off = TAG_TABLE_START + i * TAG_ENTRY_SIZE;
            let entry = &data[entry_off..entry_off + TAG_ENTRY_SIZE];
            let signature = u32::from_be_bytes(entry[0..4].try_into().unwrap());
            let offset = u32::from_be_bytes(entry[4..8].try_into().unwrap()) as usize;
            let size = u32::from_be_bytes(entry[8..12].try_into().unwrap()) as usize;
            let end = offset.checked_add(size).ok_or_else(|| ColorError::ProfileParse("tag extent overflow".into()))?;
            if end > data.len() {
                return Err(ColorError::ProfileParse(format!(
                    "tag {signature:08x} extends past end of profile ({end} > {})",
                    data.len()
                )));
            }
            match TagData::parse(signature, &data[offset..end]) {
                Ok(parsed) => {
                    tags.insert(signature, parsed);
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(tag = %format!("{signature:08x}"), error = %_err, "tag payload did not match its declared type; keeping raw bytes");
                    tags.insert(signature, TagData::Unknown(data[offset..end].to_vec()));
                }
            }
        }

        Ok(IccProfile { header, tags })
    }

    #[must_use]
    pub fn tag(&self, signature: u32) -> Option<&TagData> {
        self.tags.get(&signature)
    }

    #[must_use]
    pub fn has_tag(&self, signature: u32) -> bool {
        self.tags.contains_key(&signature)
    }

    /// Reads the device-to-PCS matrix offset from an A2B0 tag, per the
    /// simplified matrix-only fallback this crate supports: a 32-bit
    /// big-endian offset at byte 16 of the tag data, pointing at nine
    /// consecutive s15Fixed16 values (relative to the start of the
    /// profile, matching how other ICC tag offsets are expressed).
    pub fn a2b0_matrix(&self, profile_bytes: &[u8]) -> ColorResult<crate::matrix::Matrix3> {
        let entry = self
            .tags
            .get(&tags::A2B0)
            .ok_or_else(|| ColorError::ProfileQuery("no A2B0 tag present".into()))?;
        let raw = match entry {
            TagData::Unknown(bytes) => bytes,
            _ => return Err(ColorError::ProfileQuery("A2B0 tag was not a matrix/LUT blob".into())),
        };
        if raw.len() < 20 {
            return Err(ColorError::ProfileQuery("A2B0 tag too short for a matrix offset".into()));
        }
        let matrix_offset = u32::from_be_bytes(raw[16..20].try_into().unwrap()) as usize;
        if matrix_offset == 0 || matrix_offset + 9 * 4 > profile_bytes.len() {
            return Err(ColorError::ProfileQuery("A2B0 matrix offset is zero or out of range".into()));
        }
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                let off = matrix_offset + (i * 3 + j) * 4;
                *cell = sfixed::read(&profile_bytes[off..off + 4]);
            }
        }
        Ok(crate::matrix::Matrix3::from_rows(rows))
    }
}

/// Reads the tag table without decoding tag payloads, returning each
/// tag's raw bytes keyed by signature in table order. Used by
/// [`crate::profile::Profile`] to keep every tag it does not understand
/// (or does not need to modify) byte-identical across a pack/parse
/// cycle.
pub fn read_tag_table(data: &[u8]) -> ColorResult<Vec<(u32, Vec<u8>)>> {
    let header = IccHeader::parse(data)?;
    header.validate(data.len())?;

    if data.len() < TAG_TABLE_START {
        return Err(ColorError::ProfileParse("profile too small for tag count".into()));
    }
    let tag_count = u32::from_be_bytes(data[header::HEADER_SIZE..TAG_TABLE_START].try_into().unwrap()) as usize;
    let table_size = tag_count * TAG_ENTRY_SIZE;
    if data.len() < TAG_TABLE_START + table_size {
        return Err(ColorError::ProfileParse("profile too small for tag table".into()));
    }

    let mut entries = Vec::with_capacity(tag_count);
    for i in 0..tag_count {
        let entry_off = TAG_TABLE_START + i * TAG_ENTRY_SIZE;
        let entry = &data[entry_off..entry_off + TAG_ENTRY_SIZE];
        let signature = u32::from_be_bytes(entry[0..4].try_into().unwrap());
        let offset = u32::from_be_bytes(entry[4..8].try_into().unwrap()) as usize;
        let size = u32::from_be_bytes(entry[8..12].try_into().unwrap()) as usize;
        let end = offset.checked_add(size).ok_or_else(|| ColorError::ProfileParse("tag extent overflow".into()))?;
        if end > data.len() {
            return Err(ColorError::ProfileParse(format!("tag {signature:08x} extends past end of profile")));
        }
        entries.push((signature, data[offset..end].to_vec()));
    }
    Ok(entries)
}

/// Assembles a complete ICC profile from a header and an ordered list of
/// `(signature, tag bytes)` pairs, writing the header, tag count, tag
/// table, and tag data (each entry padded to a 4-byte boundary) in turn.
/// Identical tag bytes are not deduplicated; each tag gets its own
/// offset, which keeps the writer simple at the cost of the shared-data
/// optimization real ICC encoders perform.
#[must_use]
pub fn build(mut header: IccHeader, entries: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let table_size = entries.len() * TAG_ENTRY_SIZE;
    let data_start = TAG_TABLE_START + table_size;

    let mut offsets = Vec::with_capacity(entries.len());
    let mut data_section = Vec::new();
    for (_, bytes) in entries {
        let offset = data_start + data_section.len();
        offsets.push(offset);
        data_section.extend_from_slice(bytes);
        while data_section.len() % 4 != 0 {
            data_section.push(0);
        }
    }

    let total_size = data_start + data_section.len();
    header.size = total_size as u32;

    let mut out = vec![0u8; total_size];
    header.write(&mut out[0..header::HEADER_SIZE]);
    out[header::HEADER_SIZE..TAG_TABLE_START].copy_from_slice(&(entries.len() as u32).to_be_bytes());

    for (i, (signature, bytes)) in entries.iter().enumerate() {
        let entry_off = TAG_TABLE_START + i * TAG_ENTRY_SIZE;
        out[entry_off..entry_off + 4].copy_from_slice(&signature.to_be_bytes());
        out[entry_off + 4..entry_off + 8].copy_from_slice(&(offsets[i] as u32).to_be_bytes());
        out[entry_off + 8..entry_off + 12].copy_from_slice(&(bytes.len() as u32).to_be_bytes());
    }

    out[data_start..].copy_from_slice(&data_section);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use header::ProfileVersion;

    #[test]
    fn build_then_parse_roundtrip() {
        let header = IccHeader::display_rgb(ProfileVersion::v4());
        let mut mlu = crate::mlu::Mlu::new();
        mlu.set_text("test profile", crate::locale::Locale::none());
        let entries = vec![
            (tags::RED_COLORANT, tags::write_xyz([0.4, 0.2, 0.02])),
            (tags::PROFILE_DESCRIPTION, tags::write_description(&mlu)),
        ];
        let bytes = build(header, &entries);
        let parsed = IccProfile::parse(&bytes).unwrap();
        assert!(parsed.has_tag(tags::RED_COLORANT));
        let desc = parsed.tag(tags::PROFILE_DESCRIPTION).unwrap().as_text().unwrap();
        assert_eq!("test profile", desc.text(crate::locale::Locale::none()).unwrap());
    }

    #[test]
    fn rejects_tag_past_end() {
        let data = vec![0u8; header::HEADER_SIZE + 4];
        assert!(IccProfile::parse(&data).is_err());
    }
}
