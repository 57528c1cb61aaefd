//! Loader front end for an Intel 8085 execution engine: turns section-based
//! `.program` text files into a validated byte image inside a flat 64KB
//! memory. The engine itself (fetch, decode, execute) lives elsewhere and
//! only ever reads what this crate placed.

pub mod constant;
pub mod data;
pub mod instruction;
pub mod loader;
pub mod memory;
pub mod parser;
pub mod tokenizer;

use colorize::AnsiColor;
use constant::NAME;
use std::sync::atomic::{AtomicUsize, Ordering};

static VERBOSE_FLAG: AtomicUsize = AtomicUsize::new(0);

/// Process-wide verbosity for the `verbose_println!` family; set once from
/// the CLI before loading starts.
pub fn set_verbosity(level: usize) {
    VERBOSE_FLAG.store(level, Ordering::Relaxed);
}

#[doc(hidden)]
pub fn _verbose_println(msg: &str) {
    if VERBOSE_FLAG.load(Ordering::Relaxed) >= 1 {
        println!("{NAME}: {} {}", "verbose:".yellow(), msg)
    }
}

#[doc(hidden)]
pub fn _very_verbose_println(msg: &str) {
    if VERBOSE_FLAG.load(Ordering::Relaxed) >= 2 {
        println!("{NAME}: {} {}", "very-verbose:".yellow(), msg)
    }
}

#[doc(hidden)]
pub fn _very_very_verbose_println(msg: &str) {
    if VERBOSE_FLAG.load(Ordering::Relaxed) >= 3 {
        println!("{NAME}: {} {}", "very-very-verbose:".yellow(), msg)
    }
}

#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => ($crate::_verbose_println(&format!($($arg)*)));
}
#[macro_export]
macro_rules! very_verbose_println {
    ($($arg:tt)*) => ($crate::_very_verbose_println(&format!($($arg)*)));
}
#[macro_export]
macro_rules! very_very_verbose_println {
    ($($arg:tt)*) => ($crate::_very_very_verbose_println(&format!($($arg)*)));
}
