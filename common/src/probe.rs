use std::fmt;

use crate::{Error, Result};

/// Direct3D feature levels a device is probed at, lowest first so that
/// `Ord` reads as "supports more".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureLevel {
    Level11_0,
    Level11_1,
    Level12_0,
    Level12_1,
}

impl FeatureLevel {
    /// Probe order: highest level first.
    pub const DESCENDING: [FeatureLevel; 4] = [
        FeatureLevel::Level12_1,
        FeatureLevel::Level12_0,
        FeatureLevel::Level11_1,
        FeatureLevel::Level11_0,
    ];

    pub fn major_minor(self) -> (u32, u32) {
        match self {
            FeatureLevel::Level11_0 => (11, 0),
            FeatureLevel::Level11_1 => (11, 1),
            FeatureLevel::Level12_0 => (12, 0),
            FeatureLevel::Level12_1 => (12, 1),
        }
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = self.major_minor();
        write!(f, "{major}_{minor}")
    }
}

#[cfg(windows)]
impl From<FeatureLevel> for windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL {
    fn from(level: FeatureLevel) -> Self {
        use windows::Win32::Graphics::Direct3D::{
            D3D_FEATURE_LEVEL_11_0, D3D_FEATURE_LEVEL_11_1, D3D_FEATURE_LEVEL_12_0,
            D3D_FEATURE_LEVEL_12_1,
        };

        match level {
            FeatureLevel::Level11_0 => D3D_FEATURE_LEVEL_11_0,
            FeatureLevel::Level11_1 => D3D_FEATURE_LEVEL_11_1,
            FeatureLevel::Level12_0 => D3D_FEATURE_LEVEL_12_0,
            FeatureLevel::Level12_1 => D3D_FEATURE_LEVEL_12_1,
        }
    }
}

/// Calls `create` for each level in order and returns the first success.
///
/// When nothing succeeds the error names the lowest level that was tried, which
/// is what the user is told their GPU falls short of.
pub fn probe_feature_levels<T, E: fmt::Display>(
    levels: &[FeatureLevel],
    mut create: impl FnMut(FeatureLevel) -> std::result::Result<T, E>,
) -> Result<(FeatureLevel, T)> {
    for &level in levels {
        match create(level) {
            Ok(value) => {
                log::info!("created device at D3D_FEATURE_LEVEL_{level}");
                return Ok((level, value));
            }
            Err(e) => log::debug!("D3D_FEATURE_LEVEL_{level} unavailable: {e}"),
        }
    }

    let minimum = levels
        .iter()
        .min()
        .copied()
        .unwrap_or(FeatureLevel::Level11_0);

    Err(Error::UnsupportedHardware { minimum })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_is_sorted_highest_first() {
        let mut sorted = FeatureLevel::DESCENDING;
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, FeatureLevel::DESCENDING);
        assert_eq!(FeatureLevel::DESCENDING[0], FeatureLevel::Level12_1);
    }

    #[test]
    fn display_uses_underscore_notation() {
        assert_eq!(FeatureLevel::Level12_1.to_string(), "12_1");
        assert_eq!(FeatureLevel::Level11_0.to_string(), "11_0");
    }

    #[test]
    fn picks_the_highest_supported_level() {
        let mut tried = Vec::new();
        let (level, value) = probe_feature_levels(&FeatureLevel::DESCENDING, |level| {
            tried.push(level);
            if level <= FeatureLevel::Level11_1 {
                Ok(level.major_minor())
            } else {
                Err("not supported")
            }
        })
        .unwrap();

        assert_eq!(level, FeatureLevel::Level11_1);
        assert_eq!(value, (11, 1));
        assert_eq!(
            tried,
            vec![
                FeatureLevel::Level12_1,
                FeatureLevel::Level12_0,
                FeatureLevel::Level11_1
            ]
        );
    }

    #[test]
    fn stops_at_first_success() {
        let mut calls = 0;
        let (level, _) = probe_feature_levels(&FeatureLevel::DESCENDING, |_| {
            calls += 1;
            Ok::<_, String>(())
        })
        .unwrap();

        assert_eq!(level, FeatureLevel::Level12_1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn fails_with_lowest_level_tried() {
        let result = probe_feature_levels(&FeatureLevel::DESCENDING, |_| Err::<(), _>("nope"));
        match result {
            Err(Error::UnsupportedHardware { minimum }) => {
                assert_eq!(minimum, FeatureLevel::Level11_0)
            }
            other => panic!("unexpected result {other:?}"),
        }

        let result = probe_feature_levels(
            &[FeatureLevel::Level12_1, FeatureLevel::Level12_0],
            |_| Err::<(), _>("nope"),
        );
        assert!(matches!(
            result,
            Err(Error::UnsupportedHardware {
                minimum: FeatureLevel::Level12_0
            })
        ));
    }

    #[test]
    fn empty_list_is_unsupported() {
        let result = probe_feature_levels(&[], |_| Ok::<_, String>(()));
        assert!(matches!(
            result,
            Err(Error::UnsupportedHardware {
                minimum: FeatureLevel::Level11_0
            })
        ));
    }
}
