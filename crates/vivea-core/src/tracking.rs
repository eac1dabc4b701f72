//! Tracking identifiers: `VIV-<base36 millis>-<5 base36 chars>`, upper-cased

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

const PREFIX: &str = "VIV";
const RANDOM_LEN: usize = 5;
const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static TRACKING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^VIV-[0-9A-Z]+-[0-9A-Z]{5}$").expect("tracking pattern is valid"));

/// Lower-case base36 rendering of `value`
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Build a tracking id from an explicit timestamp and random source
pub fn tracking_id_at<R: Rng + ?Sized>(millis: u64, rng: &mut R) -> String {
    let random: String = (0..RANDOM_LEN)
        .map(|_| DIGITS[rng.gen_range(0..DIGITS.len())] as char)
        .collect();
    format!("{}-{}-{}", PREFIX, to_base36(millis), random).to_uppercase()
}

pub fn generate_tracking_id() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    tracking_id_at(millis, &mut rand::thread_rng())
}

pub fn is_tracking_id(candidate: &str) -> bool {
    TRACKING_RE.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_generated_ids_have_expected_shape() {
        let id = generate_tracking_id();
        assert!(is_tracking_id(&id), "bad id {}", id);
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn test_timestamp_segment_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = tracking_id_at(1_700_000_000_000, &mut rng);
        assert!(id.starts_with("VIV-LOYW3V28-"));
        assert_eq!(id.len(), "VIV-LOYW3V28-".len() + 5);
    }

    #[test]
    fn test_rejects_foreign_ids() {
        assert!(!is_tracking_id("viv-loyw3v28-abcde"));
        assert!(!is_tracking_id("VIV-LOYW3V28-ABCD"));
        assert!(!is_tracking_id("ABC-LOYW3V28-ABCDE"));
        assert!(!is_tracking_id("<script>"));
    }

    proptest! {
        #[test]
        fn any_timestamp_yields_a_valid_id(millis in 0u64..=4_102_444_800_000, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let id = tracking_id_at(millis, &mut rng);
            prop_assert!(is_tracking_id(&id));
        }
    }
}
