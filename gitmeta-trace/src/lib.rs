//! Three macros - [`coarse!`], [`detail!`], [`warn!`] - used throughout the workspace instead of
//! calling into `tracing` directly, so that depending on `gitmeta` never forces a subscriber on
//! callers: without the `tracing` feature every one of them compiles to nothing.
#![deny(rust_2018_idioms)]

#[cfg(feature = "tracing")]
#[doc(hidden)]
pub use tracing;

/// A span handle returned by [`coarse!`]/[`detail!`] when the `tracing` feature is disabled.
/// Entering it is a no-op; it exists so call sites don't need `#[cfg]` of their own.
#[cfg(not(feature = "tracing"))]
#[derive(Default)]
pub struct Span;

#[cfg(not(feature = "tracing"))]
impl Span {
    /// Run `f` without creating any tracing context.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        f()
    }
}

/// Open a span for an operation coarse enough to matter on every run: opening a repository,
/// loading the config chain, resolving HEAD.
#[macro_export]
macro_rules! coarse {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { $crate::tracing::info_span!($($arg)*) }
        #[cfg(not(feature = "tracing"))]
        { $crate::Span }
    }};
}

/// Open a span for an operation that's only interesting when diagnosing a specific repository:
/// a single reftable block read, one include-path expansion, one submodule entry.
#[macro_export]
macro_rules! detail {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { $crate::tracing::debug_span!($($arg)*) }
        #[cfg(not(feature = "tracing"))]
        { $crate::Span }
    }};
}

/// Emit a one-off warning about a behavior that's deliberately left unverified against upstream
/// git (the reftable deletion short-circuit, `excludesFile`/`info/exclude` ordering).
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { $crate::tracing::warn!($($arg)*); }
        #[cfg(not(feature = "tracing"))]
        { let _ = ($($arg)*,); }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_compile_and_run_without_the_tracing_feature() {
        let span = crate::coarse!("open");
        span.in_scope(|| {
            let inner = crate::detail!("config-tier", tier = "system");
            inner.in_scope(|| {
                crate::warn!("flagging {} as unverified", "reftable-short-circuit");
            });
        });
    }
}
