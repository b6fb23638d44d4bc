use crate::{Error, Result};

/// Finishes a submitted frame: `wait` always runs, because the command list is
/// in flight whether or not present succeeded. A wait failure wins over a
/// present failure since it leaves the allocator unsafe to reset.
pub fn settle_frame<E: Into<Error>>(
    presented: std::result::Result<(), E>,
    wait: impl FnOnce() -> Result<()>,
) -> Result<()> {
    wait()?;
    presented.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_after_successful_present() {
        let mut waited = false;
        settle_frame(Ok::<(), Error>(()), || {
            waited = true;
            Ok(())
        })
        .unwrap();
        assert!(waited);
    }

    #[test]
    fn waits_even_when_present_fails() {
        let mut waited = false;
        let result = settle_frame(Err(Error::MissingObject("Present1")), || {
            waited = true;
            Ok(())
        });

        assert!(waited);
        assert!(matches!(result, Err(Error::MissingObject("Present1"))));
    }

    #[test]
    fn wait_failure_is_reported_first() {
        let result = settle_frame(Err(Error::MissingObject("Present1")), || {
            Err(Error::Window("fence".into()))
        });
        assert!(matches!(result, Err(Error::Window(_))));
    }
}
