use colorcore::{ChannelDepth, Curve, Locale, PixelFormat, Primaries, Profile, Transform, TransformOptions};

#[test]
fn srgb_roundtrips_through_pack_and_parse() {
    let profile = Profile::create_stock_srgb();
    let bytes = profile.pack().to_vec();
    let reparsed = Profile::unpack(&bytes).unwrap();
    assert_eq!(profile.query().unwrap(), reparsed.query().unwrap());
}

#[test]
fn pq_profile_reports_pq_curve() {
    let profile = Profile::create(Primaries::bt2100(), Curve::Pq, 1000, "HDR PQ");
    assert_eq!(Curve::Pq, profile.query().unwrap().curve);
}

#[test]
fn hlg_profile_reports_hlg_curve() {
    let profile = Profile::create(Primaries::bt2100(), Curve::Hlg, 1000, "HDR HLG");
    assert_eq!(Curve::Hlg, profile.query().unwrap().curve);
}

#[test]
fn setting_a_localized_description_is_queryable() {
    let mut profile = Profile::create_stock_srgb();
    profile.set_mlu("desc", Locale::new("de_DE"), "sRGB eingebaut").unwrap();
    assert_eq!("sRGB eingebaut", profile.get_mlu("desc", Locale::new("de_DE")).unwrap());
    // The original, unset locale is untouched.
    assert_eq!("sRGB built-in", profile.get_mlu("desc", Locale::none()).unwrap());
}

#[test]
fn transform_between_two_custom_gamma_profiles() {
    let a = Profile::create(Primaries::bt709(), Curve::Gamma(2.2), 0, "a");
    let b = Profile::create(Primaries::bt709(), Curve::Gamma(1.8), 0, "b");

    let mut tr = Transform::create(
        Some(a.into()),
        PixelFormat::Rgb,
        ChannelDepth::Eight,
        Some(b.into()),
        PixelFormat::Rgb,
        ChannelDepth::Eight,
        TransformOptions::default(),
    );
    let mut dest = vec![0u8; 3];
    tr.run(1, &[0u8, 100, 255], &mut dest, 1).unwrap();
    assert_eq!(0, dest[0]);
    assert_eq!(255, dest[2]);
}
