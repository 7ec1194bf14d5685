//! Logging macros.
//!
//! `defmt` on target builds, `tracing` on host builds, nothing otherwise.
//! Format strings must stay within the common subset: `{}` for integers and
//! `&str`, `{:#x}` for register words, `{:?}` for everything else.

#![allow(unused_macros)]

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        ::tracing::trace!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        ::tracing::debug!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        ::tracing::info!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        ::tracing::warn!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($s $(, $x)*);
        #[cfg(feature = "tracing")]
        ::tracing::error!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = ($( & $x ),*);
    }};
}
