use crate::probe::FeatureLevel;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Your GPU doesn't support D3D_FEATURE_LEVEL_{minimum} or higher.")]
    UnsupportedHardware { minimum: FeatureLevel },
    #[error("no hardware adapter supports Direct3D 12")]
    NoAdapter,
    #[error("{0} returned no object")]
    MissingObject(&'static str),
    #[error("window: {0}")]
    Window(String),
    #[cfg(windows)]
    #[error("{0}")]
    Windows(#[from] windows::core::Error),
}

impl Error {
    /// Text for the fatal "unsupported GPU" message box, or `None` when the
    /// error is not about missing hardware support.
    ///
    /// No adapter passing the 11_0 check means the same thing to the user as a
    /// device that failed every level.
    pub fn fatal_message(&self) -> Option<String> {
        match self {
            Error::UnsupportedHardware { .. } => Some(self.to_string()),
            Error::NoAdapter => Some(
                Error::UnsupportedHardware {
                    minimum: FeatureLevel::Level11_0,
                }
                .to_string(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_hardware_names_the_minimum_level() {
        let e = Error::UnsupportedHardware {
            minimum: FeatureLevel::Level11_0,
        };
        assert_eq!(
            e.to_string(),
            "Your GPU doesn't support D3D_FEATURE_LEVEL_11_0 or higher."
        );
    }

    #[test]
    fn unsupported_hardware_is_fatal() {
        let e = Error::UnsupportedHardware {
            minimum: FeatureLevel::Level12_0,
        };
        assert_eq!(
            e.fatal_message().as_deref(),
            Some("Your GPU doesn't support D3D_FEATURE_LEVEL_12_0 or higher.")
        );
    }

    #[test]
    fn no_adapter_is_fatal_at_11_0() {
        assert_eq!(
            Error::NoAdapter.fatal_message().as_deref(),
            Some("Your GPU doesn't support D3D_FEATURE_LEVEL_11_0 or higher.")
        );
    }

    #[test]
    fn other_errors_are_not_fatal() {
        assert_eq!(Error::MissingObject("CreateSwapChain").fatal_message(), None);
        assert_eq!(Error::Window("no class".into()).fatal_message(), None);
    }

    #[cfg(windows)]
    #[test]
    fn windows_errors_are_not_fatal() {
        use windows::Win32::Foundation::E_FAIL;

        let e = Error::from(windows::core::Error::from(E_FAIL));
        assert_eq!(e.fatal_message(), None);
    }

    #[test]
    fn missing_object_names_the_call() {
        let e = Error::MissingObject("CreateSwapChain");
        assert_eq!(e.to_string(), "CreateSwapChain returned no object");
    }

    #[test]
    fn window_error_keeps_context() {
        let e = Error::Window("class already registered".into());
        assert_eq!(e.to_string(), "window: class already registered");
    }
}
