use crate::curve::Curve;
use crate::error::{ColorError, ColorResult};
use crate::icc::{self, header::IccHeader, header::ProfileVersion, tags};
use crate::locale::Locale;
use crate::matrix::{self, Matrix3};
use crate::mlu::Mlu;
use crate::primaries::Primaries;

/// Sentinel luminance meaning "no `lumi` tag present".
pub const UNSPECIFIED_LUMINANCE: u32 = 0;

/// The three observable attributes a profile reduces to for color
/// conversion purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileAttributes {
    pub primaries: Primaries,
    pub curve: Curve,
    pub luminance: u32,
}

/// An ICC color profile: a packed byte stream plus the tag table needed
/// to rebuild it after a targeted edit. Profiles own their bytes; cloning
/// one packs and re-parses to guarantee full independence, matching the
/// teacher's `clone` semantics for profile handles.
#[derive(Debug, Clone)]
pub struct Profile {
    header: IccHeader,
    entries: Vec<(u32, Vec<u8>)>,
    icc: icc::IccProfile,
    bytes: Vec<u8>,
    description_override: Option<String>,
}

impl Profile {
    /// Loads ICC bytes and caches a description: the caller's override if
    /// given, else the tag-derived `desc`, else the literal `"Unknown"`.
    pub fn parse(data: &[u8], description: Option<&str>) -> ColorResult<Self> {
        let icc = icc::IccProfile::parse(data)?;
        let entries = icc::read_tag_table(data)?;
        Ok(Profile {
            header: icc.header,
            entries,
            icc,
            bytes: data.to_vec(),
            description_override: description.map(str::to_owned),
        })
    }

    /// Byte-exact ICC serialization. `parse(profile.pack())` always yields
    /// a profile equal in every queried attribute.
    #[must_use]
    pub fn pack(&self) -> &[u8] {
        &self.bytes
    }

    /// Alias for [`Profile::parse`] with no description override, named
    /// to mirror `pack` as the external interface names it.
    pub fn unpack(data: &[u8]) -> ColorResult<Self> {
        Profile::parse(data, None)
    }

    /// Packs and re-parses, guaranteeing the result shares no state with
    /// `self`.
    pub fn deep_clone(&self) -> ColorResult<Self> {
        Profile::parse(&self.bytes, self.description_override.as_deref())
    }

    /// Synthesizes a display-RGB profile from primaries, a tone curve, a
    /// luminance, and a description.
    #[must_use]
    pub fn create(primaries: Primaries, curve: Curve, luminance: u32, description: &str) -> Self {
        let m = matrix::rgb_to_xyz_matrix(&primaries).unwrap_or_else(|_| Matrix3::identity());

        let mut desc = Mlu::new();
        desc.set_text(description, Locale::none());

        let mut entries = vec![
            (tags::RED_COLORANT, tags::write_xyz(m.column(0))),
            (tags::GREEN_COLORANT, tags::write_xyz(m.column(1))),
            (tags::BLUE_COLORANT, tags::write_xyz(m.column(2))),
            (tags::MEDIA_WHITE_POINT, tags::write_xyz(m.mul_vec([1.0, 1.0, 1.0]))),
            (tags::PROFILE_DESCRIPTION, tags::write_description(&desc)),
        ];

        match curve {
            Curve::Gamma(g) => {
                let bytes = tags::write_gamma_curve(g);
                entries.push((tags::RED_TRC, bytes.clone()));
                entries.push((tags::GREEN_TRC, bytes.clone()));
                entries.push((tags::BLUE_TRC, bytes));
            }
            Curve::Pq => {
                let identity = tags::write_gamma_curve(1.0);
                entries.push((tags::RED_TRC, identity.clone()));
                entries.push((tags::GREEN_TRC, identity.clone()));
                entries.push((tags::BLUE_TRC, identity));
                entries.push((PQ_HINT_TAG, pq_hint_bytes()));
            }
            Curve::Hlg => {
                let identity = tags::write_gamma_curve(1.0);
                entries.push((tags::RED_TRC, identity.clone()));
                entries.push((tags::GREEN_TRC, identity.clone()));
                entries.push((tags::BLUE_TRC, identity));
                entries.push((HLG_HINT_TAG, hlg_hint_bytes()));
            }
            Curve::Complex { .. } | Curve::Unknown => {
                // Nothing to mirror onto R/G/B: the caller is expected to
                // pre-pack such a curve externally, per the create() contract.
            }
        }

        if luminance != UNSPECIFIED_LUMINANCE {
            entries.push((tags::LUMINANCE, tags::write_xyz([0.0, f64::from(luminance), 0.0])));
        }

        let header = IccHeader::display_rgb(ProfileVersion::v4());
        let bytes = icc::build(header, &entries);
        let icc = icc::IccProfile::parse(&bytes).expect("profile built in-crate must parse");

        Profile { header: icc.header, entries, icc, bytes, description_override: None }
    }

    /// BT.709 primaries, `Gamma(2.4)`, 300 cd/m^2.
    #[must_use]
    pub fn create_stock_srgb() -> Self {
        Profile::create(Primaries::bt709(), Curve::Gamma(2.4), 300, "sRGB built-in")
    }

    /// Same primaries and luminance as `source`, curve forced to
    /// `Gamma(1.0)`, description suffixed with `" (Linear)"`.
    pub fn create_linear(source: &Profile) -> ColorResult<Self> {
        let attrs = source.query()?;
        let description = format!("{} (Linear)", source.description());
        Ok(Profile::create(attrs.primaries, Curve::Gamma(1.0), attrs.luminance, &description))
    }

    #[must_use]
    pub fn description(&self) -> String {
        if let Some(d) = &self.description_override {
            return d.clone();
        }
        self.icc
            .tag(tags::PROFILE_DESCRIPTION)
            .and_then(|t| t.as_text())
            .and_then(|mlu| mlu.text(Locale::none()).ok())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Derives `(primaries, curve, luminance)` from the profile's tags.
    /// Fails only when the media white-point tag is missing (or, for the
    /// A2B0 matrix fallback, when that matrix offset is invalid).
    pub fn query(&self) -> ColorResult<ProfileAttributes> {
        let primaries = self.derive_primaries()?;
        let mut curve = self.derive_curve();
        if self.is_pq_tagged() {
            curve = Curve::Pq;
        } else if self.is_hlg_tagged() {
            curve = Curve::Hlg;
        }
        let luminance = self.derive_luminance();
        Ok(ProfileAttributes { primaries, curve, luminance })
    }

    fn derive_primaries(&self) -> ColorResult<Primaries> {
        let white_xyz = self
            .icc
            .tag(tags::MEDIA_WHITE_POINT)
            .and_then(|t| t.as_xyz())
            .ok_or_else(|| ColorError::ProfileQuery("media white point (wtpt) tag missing".into()))?;

        let mut colorants = match (
            self.icc.tag(tags::RED_COLORANT).and_then(|t| t.as_xyz()),
            self.icc.tag(tags::GREEN_COLORANT).and_then(|t| t.as_xyz()),
            self.icc.tag(tags::BLUE_COLORANT).and_then(|t| t.as_xyz()),
        ) {
            (Some(r), Some(g), Some(b)) => Matrix3::from_columns([r, g, b]),
            _ => self.icc.a2b0_matrix(&self.bytes)?,
        };

        // Per the derivation algorithm: a present chad tag always implies
        // adapting the white point (the version>=4 clause only matters
        // for profiles that carry no chad tag at all, which never enter
        // this branch).
        let chad = self.icc.tag(tags::CHROMATIC_ADAPTATION).and_then(|t| t.as_matrix());
        let mut adapted_white = white_xyz;
        if let Some(chad) = chad {
            if let Ok(chad_inv) = chad.inverse() {
                colorants = matrix::unadapt_colorants(&colorants, chad).unwrap_or(colorants);
                adapted_white = chad_inv.mul_vec(white_xyz);
            }
        }

        let primaries = Primaries::new(
            matrix::xyz_to_xy(colorants.column(0)),
            matrix::xyz_to_xy(colorants.column(1)),
            matrix::xyz_to_xy(colorants.column(2)),
            matrix::xyz_to_xy(adapted_white),
        );
        if !primaries.is_valid() {
            return Err(ColorError::DegeneratePrimaries);
        }
        Ok(primaries)
    }

    fn derive_curve(&self) -> Curve {
        let Some(curve_tag) = self.icc.tag(tags::RED_TRC).and_then(|t| t.as_curve()) else {
            return if self.icc.has_tag(tags::A2B0) { Curve::Complex { estimated_gamma: None, matrix_curve_scale: None } } else { Curve::Unknown };
        };
        if let Some(g) = curve_tag.as_pure_gamma() {
            return Curve::Gamma(g);
        }
        let estimated_gamma = match curve_tag {
            crate::icc::tags::CurveTag::Parametric { params, .. } => params.first().copied(),
            _ => None,
        };
        let matrix_curve_scale = self.a2b0_matrix_curve_scale();
        Curve::Complex { estimated_gamma, matrix_curve_scale }
    }

    fn a2b0_matrix_curve_scale(&self) -> Option<f64> {
        let raw = match self.icc.tag(tags::A2B0)? {
            crate::icc::tags::TagData::Unknown(bytes) => bytes,
            _ => return None,
        };
        let pos = raw.windows(4).position(|w| w == b"para")?;
        let curve = crate::icc::tags::TagData::parse(0, &raw[pos..]).ok()?;
        curve.as_curve()?.matrix_curve_scale()
    }

    fn derive_luminance(&self) -> u32 {
        self.icc
            .tag(tags::LUMINANCE)
            .and_then(|t| t.as_xyz())
            .map(|xyz| xyz[1].round().max(0.0) as u32)
            .unwrap_or(UNSPECIFIED_LUMINANCE)
    }

    fn is_pq_tagged(&self) -> bool {
        self.icc.has_tag(PQ_HINT_TAG) || self.description().to_ascii_lowercase().contains("pq") || self.description().contains("ST.2084")
    }

    fn is_hlg_tagged(&self) -> bool {
        self.icc.has_tag(HLG_HINT_TAG) || self.description().to_ascii_lowercase().contains("hlg")
    }

    /// Rewrites the R/G/B tone curves to a pure gamma and repacks.
    pub fn set_gamma(&mut self, g: f64) -> ColorResult<()> {
        let bytes = tags::write_gamma_curve(g);
        self.replace_entry(tags::RED_TRC, bytes.clone());
        self.replace_entry(tags::GREEN_TRC, bytes.clone());
        self.replace_entry(tags::BLUE_TRC, bytes);
        self.rebuild()
    }

    /// Rewrites the `lumi` tag and repacks. Passing
    /// [`UNSPECIFIED_LUMINANCE`] removes the tag.
    pub fn set_luminance(&mut self, luminance: u32) -> ColorResult<()> {
        self.entries.retain(|(sig, _)| *sig != tags::LUMINANCE);
        if luminance != UNSPECIFIED_LUMINANCE {
            self.entries.push((tags::LUMINANCE, tags::write_xyz([0.0, f64::from(luminance), 0.0])));
        }
        self.rebuild()
    }

    /// Reads a multilocalized tag's text for a locale. `tag_name` is a
    /// 4-character ASCII tag name; its ICC signature is the big-endian
    /// reading of those four bytes.
    pub fn get_mlu(&self, tag_name: &str, locale: Locale) -> ColorResult<String> {
        let sig = tag_signature(tag_name)?;
        self.icc
            .tag(sig)
            .and_then(|t| t.as_text())
            .ok_or_else(|| ColorError::ProfileQuery(format!("tag '{tag_name}' is not present or not text")))?
            .text(locale)
    }

    /// Writes a multilocalized tag's text for a locale and repacks,
    /// merging with whatever locales the tag already carries.
    pub fn set_mlu(&mut self, tag_name: &str, locale: Locale, text: &str) -> ColorResult<()> {
        let sig = tag_signature(tag_name)?;
        let mut mlu = self.icc.tag(sig).and_then(|t| t.as_text()).cloned().unwrap_or_default();
        mlu.set_text(text, locale);
        self.replace_entry(sig, tags::write_description(&mlu));
        self.rebuild()
    }

    fn replace_entry(&mut self, signature: u32, bytes: Vec<u8>) {
        self.entries.retain(|(sig, _)| *sig != signature);
        self.entries.push((signature, bytes));
    }

    fn rebuild(&mut self) -> ColorResult<()> {
        self.bytes = icc::build(self.header, &self.entries);
        self.icc = icc::IccProfile::parse(&self.bytes)?;
        self.header = self.icc.header;
        Ok(())
    }
}

const PQ_HINT_TAG: u32 = u32::from_be_bytes(*b"pqh1");
const HLG_HINT_TAG: u32 = u32::from_be_bytes(*b"hlg1");

fn pq_hint_bytes() -> Vec<u8> {
    let mut mlu = Mlu::new();
    mlu.set_text("ST.2084", Locale::none());
    tags::write_description(&mlu)
}

fn hlg_hint_bytes() -> Vec<u8> {
    let mut mlu = Mlu::new();
    mlu.set_text("HLG", Locale::none());
    tags::write_description(&mlu)
}

fn tag_signature(tag_name: &str) -> ColorResult<u32> {
    let bytes = tag_name.as_bytes();
    if bytes.len() != 4 {
        return Err(ColorError::ProfileQuery(format!("tag name '{tag_name}' must be exactly 4 ASCII characters")));
    }
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_srgb_attributes() {
        let p = Profile::create_stock_srgb();
        let attrs = p.query().unwrap();
        assert!((attrs.primaries.red.x - 0.64).abs() < 1e-4);
        assert!((attrs.primaries.red.y - 0.33).abs() < 1e-4);
        assert!((attrs.primaries.green.x - 0.30).abs() < 1e-4);
        assert!((attrs.primaries.green.y - 0.60).abs() < 1e-4);
        assert!((attrs.primaries.blue.x - 0.15).abs() < 1e-4);
        assert!((attrs.primaries.blue.y - 0.06).abs() < 1e-4);
        assert!((attrs.primaries.white.x - 0.3127).abs() < 1e-4);
        assert!((attrs.primaries.white.y - 0.3290).abs() < 1e-4);
        assert_eq!(Curve::Gamma(2.4), attrs.curve);
        assert_eq!(300, attrs.luminance);
    }

    #[test]
    fn pack_then_parse_preserves_query() {
        let p = Profile::create_stock_srgb();
        let bytes = p.pack().to_vec();
        let reparsed = Profile::parse(&bytes, None).unwrap();
        assert_eq!(p.query().unwrap(), reparsed.query().unwrap());
        assert_eq!(p.description(), reparsed.description());
    }

    #[test]
    fn create_linear_preserves_primaries_and_forces_gamma_one() {
        let srgb = Profile::create_stock_srgb();
        let linear = Profile::create_linear(&srgb).unwrap();
        let attrs = linear.query().unwrap();
        assert_eq!(Curve::Gamma(1.0), attrs.curve);
        assert_eq!(300, attrs.luminance);
        assert!(linear.description().ends_with("(Linear)"));
    }

    #[test]
    fn deep_clone_is_independent_copy() {
        let mut p = Profile::create_stock_srgb();
        let cloned = p.deep_clone().unwrap();
        p.set_gamma(1.8).unwrap();
        assert_eq!(Curve::Gamma(2.4), cloned.query().unwrap().curve);
        assert_eq!(Curve::Gamma(1.8), p.query().unwrap().curve);
    }

    #[test]
    fn set_gamma_updates_query() {
        let mut p = Profile::create_stock_srgb();
        p.set_gamma(1.8).unwrap();
        assert_eq!(Curve::Gamma(1.8), p.query().unwrap().curve);
    }

    #[test]
    fn set_luminance_to_unspecified_removes_tag() {
        let mut p = Profile::create_stock_srgb();
        p.set_luminance(UNSPECIFIED_LUMINANCE).unwrap();
        assert_eq!(UNSPECIFIED_LUMINANCE, p.query().unwrap().luminance);
    }

    #[test]
    fn mlu_roundtrip_through_repack() {
        let mut p = Profile::create_stock_srgb();
        p.set_mlu("desc", Locale::new("fr_FR"), "sRGB (fran\u{e7}ais)").unwrap();
        assert_eq!("sRGB (fran\u{e7}ais)", p.get_mlu("desc", Locale::new("fr_FR")).unwrap());
    }

    #[test]
    fn pq_hint_is_recognized_on_query() {
        let p = Profile::create(Primaries::bt2100(), Curve::Pq, 1000, "HDR PQ");
        assert_eq!(Curve::Pq, p.query().unwrap().curve);
    }

    #[test]
    fn missing_white_point_fails_query() {
        let header = IccHeader::display_rgb(ProfileVersion::v4());
        let bytes = icc::build(header, &[]);
        let p = Profile::parse(&bytes, None).unwrap();
        assert_eq!(Err(ColorError::ProfileQuery("media white point (wtpt) tag missing".into())), p.query());
    }
}
