use super::{ResolutionError, Sensor};
use std::path::Path;
use tracing::{debug, error};

/// Marker identifying GeoEye alternate (non-DigitalGlobe) product naming
pub const GE01_ALT_MARKER: &str = "_5V";

/// Characters dropped from the end of a GE01 alternate name to form the
/// prefix shared by the multispectral and panchromatic products
pub const GE01_ALT_SUFFIX_LEN: usize = 24;

/// IKONOS multispectral band markers, in priority order
pub const IK01_BAND_MARKERS: [&str; 3] = ["blu", "msi", "bgrn"];

const ACCEPTED_PAN_EXTENSIONS: [&str; 2] = ["ntf", "tif"];

/// Derive the panchromatic companion filename for a multispectral image.
///
/// Returns the bare filename; the companion is expected in the same
/// directory as `mul_path`. Only the GE01 alternate naming rule touches the
/// filesystem (it globs the source directory for candidates).
pub fn derive_pan_name(sensor: Sensor, mul_path: &Path) -> Result<String, ResolutionError> {
    let mul_name = mul_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ResolutionError::NoCompanion(mul_path.to_path_buf()))?;

    match sensor {
        Sensor::WV02 | Sensor::WV03 | Sensor::QB02 => Ok(swap_band_marker(mul_name)),
        Sensor::GE01 if mul_name.contains(GE01_ALT_MARKER) => find_ge01_alternate(mul_path, mul_name),
        Sensor::GE01 => Ok(swap_band_marker(mul_name)),
        Sensor::IK01 => IK01_BAND_MARKERS
            .iter()
            .find(|marker| mul_name.contains(*marker))
            .map(|marker| mul_name.replacen(marker, "pan", 1))
            .ok_or_else(|| ResolutionError::NoCompanion(mul_path.to_path_buf())),
    }
}

fn swap_band_marker(mul_name: &str) -> String {
    mul_name.replace("-M", "-P")
}

/// Resolve a GE01 alternate-named companion by globbing for the shared prefix.
///
/// Exactly one candidate is required; zero or several exclude the image.
fn find_ge01_alternate(mul_path: &Path, mul_name: &str) -> Result<String, ResolutionError> {
    let no_companion = || ResolutionError::NoCompanion(mul_path.to_path_buf());

    let cut = mul_name
        .char_indices()
        .rev()
        .nth(GE01_ALT_SUFFIX_LEN - 1)
        .map(|(idx, _)| idx)
        .ok_or_else(no_companion)?;
    let pan_prefix = mul_name[..cut].replace("M0", "P0");

    let dir = mul_path.parent().unwrap_or_else(|| Path::new("."));
    let dir = dir.to_str().ok_or_else(no_companion)?;
    let pattern = format!(
        "{}*",
        Path::new(&glob::Pattern::escape(dir))
            .join(glob::Pattern::escape(&pan_prefix))
            .display()
    );
    debug!("Searching for GE01 panchromatic candidates: {}", pattern);

    let entries = glob::glob(&pattern).map_err(|e| {
        error!("Invalid candidate pattern {}: {}", pattern, e);
        no_companion()
    })?;

    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    ACCEPTED_PAN_EXTENSIONS
                        .iter()
                        .any(|accepted| ext.eq_ignore_ascii_case(accepted))
                })
        })
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();

    match candidates.len() {
        0 => Err(no_companion()),
        1 => Ok(candidates.remove(0)),
        count => Err(ResolutionError::AmbiguousCompanion {
            image: mul_path.to_path_buf(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const GE01_ALT_MUL: &str = "GE01_110108M0010160234A222000100252M_5V000500940.ntf";

    #[test]
    fn test_digitalglobe_marker_swap() {
        let pan = derive_pan_name(
            Sensor::WV02,
            Path::new("/src/WV02_12FEB061315046-M1BS-10300100106FC100.ntf"),
        )
        .unwrap();
        assert_eq!(pan, "WV02_12FEB061315046-P1BS-10300100106FC100.ntf");

        let pan = derive_pan_name(
            Sensor::GE01,
            Path::new("GE01_12FEB061315046-M1BS-10504100009FB900.ntf"),
        )
        .unwrap();
        assert_eq!(pan, "GE01_12FEB061315046-P1BS-10504100009FB900.ntf");
    }

    #[test]
    fn test_ikonos_single_substitution() {
        let pan = derive_pan_name(
            Sensor::IK01,
            Path::new("IK01_2009121113234710000011610960_msi_6516S.ntf"),
        )
        .unwrap();
        assert_eq!(pan, "IK01_2009121113234710000011610960_pan_6516S.ntf");

        let pan = derive_pan_name(
            Sensor::IK01,
            Path::new("IK01_2009121113234710000011610960_bgrn_6516S.ntf"),
        )
        .unwrap();
        assert_eq!(pan, "IK01_2009121113234710000011610960_pan_6516S.ntf");
    }

    #[test]
    fn test_ikonos_first_marker_wins() {
        // Only the highest-priority marker is replaced
        let pan = derive_pan_name(Sensor::IK01, Path::new("IK01_1_msi_blu.ntf")).unwrap();
        assert_eq!(pan, "IK01_1_msi_pan.ntf");
    }

    #[test]
    fn test_ikonos_without_marker_has_no_companion() {
        let err = derive_pan_name(Sensor::IK01, Path::new("IK01_2009_red.ntf")).unwrap_err();
        assert!(matches!(err, ResolutionError::NoCompanion(_)));
    }

    #[test]
    fn test_ge01_alternate_single_candidate() {
        let dir = TempDir::new().unwrap();
        let mul = dir.path().join(GE01_ALT_MUL);
        std::fs::write(&mul, b"mul").unwrap();
        let pan_name = "GE01_110108P0010160234A222000100252M_5V000500939.ntf";
        std::fs::write(dir.path().join(pan_name), b"pan").unwrap();
        // Sidecar sharing the prefix is not an accepted image
        std::fs::write(
            dir.path().join("GE01_110108P0010160234A222000100252M_5V000500939.txt"),
            b"meta",
        )
        .unwrap();

        assert_eq!(derive_pan_name(Sensor::GE01, &mul).unwrap(), pan_name);
    }

    #[test]
    fn test_ge01_alternate_no_candidate() {
        let dir = TempDir::new().unwrap();
        let mul = dir.path().join(GE01_ALT_MUL);
        std::fs::write(&mul, b"mul").unwrap();

        let err = derive_pan_name(Sensor::GE01, &mul).unwrap_err();
        assert!(matches!(err, ResolutionError::NoCompanion(_)));
    }

    #[test]
    fn test_ge01_alternate_ambiguous_candidates() {
        let dir = TempDir::new().unwrap();
        let mul = dir.path().join(GE01_ALT_MUL);
        std::fs::write(&mul, b"mul").unwrap();
        for name in [
            "GE01_110108P0010160234A222000100252M_5V000500939.ntf",
            "GE01_110108P0010160234A222000100252M_5V000500941.TIF",
        ] {
            std::fs::write(dir.path().join(name), b"pan").unwrap();
        }

        let err = derive_pan_name(Sensor::GE01, &mul).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::AmbiguousCompanion {
                image: mul,
                count: 2
            }
        );
    }

    #[test]
    fn test_ge01_alternate_short_name() {
        let err = derive_pan_name(Sensor::GE01, Path::new("GE01_5V.ntf")).unwrap_err();
        assert!(matches!(err, ResolutionError::NoCompanion(_)));
    }

    proptest! {
        #[test]
        fn prop_digitalglobe_swap_only_changes_band_marker(
            date in "[0-9]{2}[A-Z]{3}[0-9]{9}",
            catalog in "[0-9A-F]{16}",
        ) {
            let mul = format!("WV02_{date}-M1BS-{catalog}.ntf");
            let pan = derive_pan_name(Sensor::WV02, Path::new(&mul)).unwrap();
            prop_assert_eq!(&pan, &format!("WV02_{date}-P1BS-{catalog}.ntf"));
            prop_assert_eq!(pan.len(), mul.len());
            let again = derive_pan_name(Sensor::WV02, Path::new(&mul)).unwrap();
            prop_assert_eq!(pan, again);
        }
    }
}
