//! A native IEEE 802.15.4-2020 MAC layer for constrained wireless devices.
//!
//! The crate turns a raw packet radio into a reliable, optionally
//! authenticated and encrypted, time-synchronized link. It is split along
//! the lines of the standard:
//!
//! - [`mac`]: the link-layer context and its attributes, frame assembly,
//!   incoming-frame filtering, the CCM* security procedures, and the TSCH
//!   mode (schedule, link selection and the slot state machine).
//! - [`phy`]: the radio driver contract the MAC is written against, and
//!   the frame buffer that crosses it.
//! - [`time`]: the network time reference bridging a low-power sleep
//!   counter and a high-resolution radio counter, and the timeout queue
//!   that drives the tickless TSCH loop.
//! - [`sync`]: executor-independent synchronization primitives used to
//!   compose the MAC activities inside a single task.
//!
//! Frame parsing and emission live in the companion `mac154-frame` crate.
//!
//! ## Logging
//!
//! The crate logs through `log` when the `log` feature is enabled (the
//! default, via `std`) and through `defmt` when only the `defmt` feature
//! is. With neither backend the log statements compile away. Parse and
//! security failures log once at debug level; structural TSCH failures
//! log at error level.
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

// The log macros are defined here, ahead of the modules, so they are in
// textual scope everywhere in the crate. Each level forwards to the
// backend the feature selection picked.

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
        #[cfg(all(feature = "defmt", not(feature = "log")))]
        ::defmt::error!($($arg)*);
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
        #[cfg(all(feature = "defmt", not(feature = "log")))]
        ::defmt::warn!($($arg)*);
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
        #[cfg(all(feature = "defmt", not(feature = "log")))]
        ::defmt::info!($($arg)*);
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
        #[cfg(all(feature = "defmt", not(feature = "log")))]
        ::defmt::debug!($($arg)*);
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
        #[cfg(all(feature = "defmt", not(feature = "log")))]
        ::defmt::trace!($($arg)*);
    }};
}

pub mod mac;
pub mod phy;
pub mod sync;
pub mod time;
