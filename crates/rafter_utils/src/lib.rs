//! Various utilities shared by the Rafter crates

pub mod math;
pub mod packed;

mod ascii_display;
pub use ascii_display::*;

mod result_ext;
pub use result_ext::*;

mod seekable_take;
pub use seekable_take::*;

pub type AnyResult<T = (), E = anyhow::Error> = anyhow::Result<T, E>;

/// Shorthand for `Ok(())`, cause it looks ugly
pub const fn ok<E>() -> Result<(), E> {
    Ok(())
}
