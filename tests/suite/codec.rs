//! Dozenal codec tests

use dozen_types::{Dozenal, RadixError, decode, encode};

#[test]
fn round_trip_representative_range() {
    for n in -5_000..=5_000 {
        assert_eq!(decode(&encode(n)), Ok(n), "round trip of {n}");
    }
}

#[test]
fn round_trip_large_magnitudes() {
    let mut n: i64 = 1;
    while let Some(next) = n.checked_mul(7) {
        for value in [n, -n, n + 1, -(n + 1), n - 1] {
            assert_eq!(decode(&encode(value)), Ok(value), "round trip of {value}");
        }
        n = next;
    }
    assert_eq!(decode(&encode(i64::MAX)), Ok(i64::MAX));
    assert_eq!(decode(&encode(i64::MIN)), Ok(i64::MIN));
}

#[test]
fn powers_of_twelve_are_one_followed_by_zeros() {
    let mut n: i64 = 1;
    for zeros in 0..17 {
        assert_eq!(encode(n), format!("1{}", "0".repeat(zeros)));
        n *= 12;
    }
}

#[test]
fn reference_examples() {
    assert_eq!(encode(144), "100");
    assert_eq!(decode("100"), Ok(144));
    assert_eq!(encode(-15), "-13");
    assert_eq!(decode("-13"), Ok(-15));
}

#[test]
fn malformed_input_is_a_format_error() {
    for input in ["", "-", "1F"] {
        let err = decode(input).unwrap_err();
        assert!(err.is_format_error(), "{input:?} gave {err:?}");
    }
}

#[test]
fn case_and_whitespace_are_normalized() {
    assert_eq!(decode(" -xe "), decode("-XE"));
    assert!(decode(" -xe ").is_ok());
}

#[test]
fn invalid_glyph_error_names_character_and_position() {
    let err = decode("  10X7Z ").unwrap_err();
    assert_eq!(
        err,
        RadixError::InvalidGlyph {
            glyph: 'Z',
            position: 4
        }
    );
    assert_eq!(err.to_string(), "invalid dozenal glyph 'Z' at position 4");
}

#[test]
fn no_leading_zeros() {
    for n in 1..2_000 {
        assert!(!encode(n).starts_with('0'));
        assert!(!encode(-n).starts_with("-0"));
    }
}

#[test]
fn dozenal_newtype_agrees_with_functions() {
    for n in [-1_000_000, -1, 0, 1, 131, 14_400] {
        let d = Dozenal::new(n);
        assert_eq!(d.to_string(), encode(n));
        assert_eq!(d.to_string().parse::<Dozenal>(), Ok(d));
    }
}
