pub mod config;
pub mod error;
pub mod frame;
#[cfg(windows)]
pub mod gfx;
pub mod logging;
#[cfg(windows)]
pub mod os;
pub mod probe;
pub mod util;

pub use error::{Error, Result};
