//! Volumes (imagegroups) and their page images
//!
//! Imagegroup ids mostly look like `I0886` but other shapes occur
//! (`I1CZ3945`, `I8LS68546`). Plain lexical comparison breaks down when the
//! digit widths differ, so ordering and before/after checks go through a
//! normalized key that zero-pads the trailing digit run.

use regex::Regex;
use std::sync::OnceLock;

/// One volume of a work, as listed by the metadata service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeInfo {
    /// 1-based volume number within the work
    pub vol_num: usize,
    /// Opaque locator used to query the volume's image list
    pub volume_prefix_url: String,
    /// Imagegroup id, e.g. `I0886`
    pub imagegroup: String,
}

/// One page image within a volume; ordinal = position in the listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub filename: String,
}

fn trailing_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.*?)(\d+)$").expect("valid regex"))
}

/// Fixed-width comparison key for an imagegroup id.
///
/// `I0886` and `I12345` compare by numeric value of the digit run; ids with
/// no trailing digits fall back to the id itself.
pub fn group_order_key(imagegroup: &str) -> String {
    match trailing_digits().captures(imagegroup) {
        Some(caps) => {
            let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let digits = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            format!("{}{:0>12}", prefix, digits)
        }
        None => imagegroup.to_string(),
    }
}

/// Sort volumes ascending by normalized imagegroup id.
pub fn sort_volumes(volumes: &mut [VolumeInfo]) {
    volumes.sort_by_key(|v| group_order_key(&v.imagegroup));
}

/// True when `imagegroup` orders strictly before `other`.
pub fn group_precedes(imagegroup: &str, other: &str) -> bool {
    group_order_key(imagegroup) < group_order_key(other)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vol(num: usize, imagegroup: &str) -> VolumeInfo {
        VolumeInfo {
            vol_num: num,
            volume_prefix_url: format!("bdr:V22084_{}", imagegroup),
            imagegroup: imagegroup.to_string(),
        }
    }

    #[test]
    fn test_order_key_pads_digit_run() {
        assert!(group_order_key("I0886") < group_order_key("I0887"));
        // lexically "I12345" < "I0886" would be false ordering
        assert!(group_order_key("I0886") < group_order_key("I12345"));
    }

    #[test]
    fn test_order_key_without_digits() {
        assert_eq!(group_order_key("IABC"), "IABC");
    }

    #[test]
    fn test_sort_volumes_ascending() {
        let mut volumes = vec![vol(3, "I12345"), vol(1, "I0886"), vol(2, "I0887")];
        sort_volumes(&mut volumes);
        let order: Vec<&str> = volumes.iter().map(|v| v.imagegroup.as_str()).collect();
        assert_eq!(order, vec!["I0886", "I0887", "I12345"]);
    }

    #[test]
    fn test_group_precedes() {
        assert!(group_precedes("I0886", "I0887"));
        assert!(!group_precedes("I0887", "I0886"));
        assert!(!group_precedes("I0886", "I0886"));
    }
}
