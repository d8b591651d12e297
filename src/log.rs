//! Logging shim.
//!
//! What this crate logs happens at the GATT boundary: payload hex dumps, connection and
//! subscription changes, decode failures. With the `log` Cargo feature enabled, the level
//! macros below hand those messages to the `log` crate. Without it, `gated_log!` still routes
//! the arguments through `format_args!` so the messages keep type-checking, but nothing is
//! emitted and no formatting code is generated.

#[cfg(feature = "log")]
macro_rules! gated_log {
    ($level:ident, $($args:tt)*) => { log::$level!($($args)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! gated_log {
    ($level:ident, $($args:tt)*) => {{
        let _ = format_args!($($args)*);
    }};
}

macro_rules! error {
    ($($args:tt)*) => { gated_log!(error, $($args)*) };
}

macro_rules! warn {
    ($($args:tt)*) => { gated_log!(warn, $($args)*) };
}

macro_rules! info {
    ($($args:tt)*) => { gated_log!(info, $($args)*) };
}

macro_rules! debug {
    ($($args:tt)*) => { gated_log!(debug, $($args)*) };
}

macro_rules! trace {
    ($($args:tt)*) => { gated_log!(trace, $($args)*) };
}
