// VERIFIER LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_verifier")]
macro_rules! verifier_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_verifier"))]
macro_rules! verifier_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// BORROW STATE LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_borrow_states")]
macro_rules! borrow_state_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_borrow_states"))]
macro_rules! borrow_state_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
