//! Property-based tests for version ordering and image inspection

use std::cmp::Ordering;

use ble_ota_update::image::find_embedded_version;
use ble_ota_update::prelude::*;
use proptest::prelude::*;

fn arb_numbers() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..1000, 1..6)
}

fn arb_suffix() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{0,3}"
}

fn render(numbers: &[u64], suffix: &str) -> String {
    let dotted = numbers
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    if suffix.is_empty() {
        dotted
    } else {
        format!("{dotted}-{suffix}")
    }
}

proptest! {
    #[test]
    fn prop_parse_keeps_numbers_and_raw(numbers in arb_numbers(), suffix in arb_suffix()) {
        let raw = render(&numbers, &suffix);
        let v = VersionCode::parse(&raw);
        prop_assert_eq!(v.numbers(), numbers.as_slice());
        prop_assert_eq!(v.suffix(), suffix.as_str());
        prop_assert_eq!(v.to_string(), raw);
    }

    #[test]
    fn prop_compare_is_reflexive(numbers in arb_numbers()) {
        let v = VersionCode::parse(&render(&numbers, ""));
        prop_assert_eq!(v.compare(&v), Ordering::Equal);
    }

    #[test]
    fn prop_compare_is_antisymmetric(a in arb_numbers(), b in arb_numbers()) {
        let va = VersionCode::parse(&render(&a, ""));
        let vb = VersionCode::parse(&render(&b, ""));
        prop_assert_eq!(va.compare(&vb), vb.compare(&va).reverse());
    }

    #[test]
    fn prop_suffix_never_affects_order(
        numbers in arb_numbers(),
        s1 in arb_suffix(),
        s2 in arb_suffix(),
    ) {
        let a = VersionCode::parse(&render(&numbers, &s1));
        let b = VersionCode::parse(&render(&numbers, &s2));
        prop_assert_eq!(a.compare(&b), Ordering::Equal);
    }

    #[test]
    fn prop_trailing_zeros_are_equal(numbers in arb_numbers(), zeros in 1usize..4) {
        let mut padded = numbers.clone();
        padded.extend(std::iter::repeat_n(0, zeros));
        let a = VersionCode::parse(&render(&numbers, ""));
        let b = VersionCode::parse(&render(&padded, ""));
        prop_assert_eq!(a.compare(&b), Ordering::Equal);
    }

    #[test]
    fn prop_bumping_last_component_is_newer(numbers in arb_numbers()) {
        let mut bumped = numbers.clone();
        if let Some(last) = bumped.last_mut() {
            *last += 1;
        }
        let old = VersionCode::parse(&render(&numbers, ""));
        let new = VersionCode::parse(&render(&bumped, ""));
        prop_assert!(new.is_newer_than(&old));
        prop_assert!(!old.is_newer_than(&new));
    }

    #[test]
    fn prop_stamped_version_is_found(
        major in 0u64..100,
        minor in 0u64..100,
        patch in 0u64..100,
        lead in prop::collection::vec(0x80u8..=0xFF, 0..64),
        tail in prop::collection::vec(0x80u8..=0xFF, 0..64),
    ) {
        let version = format!("{major}.{minor}.{patch}");
        let mut data = lead;
        data.extend_from_slice(format!("VERSION={version}").as_bytes());
        data.push(0);
        data.extend_from_slice(&tail);

        let found = find_embedded_version(&data);
        prop_assert_eq!(found.as_ref().map(VersionCode::as_str), Some(version.as_str()));
    }

    #[test]
    fn prop_image_packet_count_covers_bytes(len in 1usize..20_000, chunk in 1usize..=500) {
        let image = match FirmwareImage::from_bytes(vec![0xA5; len]) {
            Ok(image) => image,
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };
        let packets = image.packet_count(chunk);
        prop_assert!(packets * chunk >= len);
        prop_assert!((packets - 1) * chunk < len);
    }
}
