//! Logging shim: `log` or `defmt` depending on the enabled feature, nothing otherwise.

#![allow(unused_macros, unused_imports)]

// Named with a trailing underscore: a local `warn` would clash with the built-in lint attribute
// of the same name when re-exported below.
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! trace_ {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        let _ = ($(&$x),*);
    }};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! debug_ {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        let _ = ($(&$x),*);
    }};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! warn_ {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        let _ = ($(&$x),*);
    }};
}

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        pub(crate) use defmt::{debug, trace, warn};
    } else if #[cfg(feature = "log")] {
        pub(crate) use log::{debug, trace, warn};
    } else {
        pub(crate) use debug_ as debug;
        pub(crate) use trace_ as trace;
        pub(crate) use warn_ as warn;
    }
}

#[cfg(test)]
mod tests {
    use super::{debug, trace, warn};

    #[test]
    fn macros_resolve_with_and_without_arguments() {
        let frame = [0x68u8, 0x3A, 0x7C];
        trace!("plain message");
        debug!("frame={:?}", frame);
        warn!("len {} of {}", frame.len(), 3,);
        assert_eq!(frame[0], 0x68);
    }
}
