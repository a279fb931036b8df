#[cfg(any(test, feature = "tracing"))]
macro_rules! trace {
    ($($t:tt)*) => { tracing::trace!($($t)*) }
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! trace {
    ($($t:tt)*) => {};
}

#[cfg(any(test, feature = "tracing"))]
macro_rules! debug {
    ($($t:tt)*) => { tracing::debug!($($t)*) }
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! debug {
    ($($t:tt)*) => {};
}
