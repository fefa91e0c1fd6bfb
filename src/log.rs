use std::sync::Mutex;

use lazy_static::lazy_static;

pub use crate::util::rw::WriteHandle;

lazy_static! {
    static ref VERBOSE: Mutex<bool> = Mutex::new(false);
}

pub fn set_verbose(verb: bool) {
    if let Ok(mut var) = VERBOSE.lock() {
        *var = verb;
    }
}

pub fn get_verbose() -> bool {
    VERBOSE.lock().map(|v| *v).unwrap_or(false)
}

// Writes a line to a WriteHandle (or any io::Write), ignoring write
// failures. For user-facing warnings and errors.
#[macro_export]
macro_rules! write_errln {
    ($w:expr, $($arg:tt)*) => {{
        use std::io::Write as _;
        let _ = writeln!($w, $($arg)*);
    }};
}

// tt - TokenTree
// ($($arg:tt)*) Variable number of tts
#[macro_export]
macro_rules! verboseln {
    ($($arg:tt)*) => {{
        if $crate::log::get_verbose() {
            println!($($arg)*);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::{get_verbose, set_verbose, WriteHandle};

    #[test]
    fn test_macros() {
        verboseln!("something {}", 1);

        let (mut h, buff) = WriteHandle::string_buff_write_handle();
        write_errln!(h, "Warning: {}", "thing");
        write_errln!(h, "second");
        assert_eq!(buff.borrow().as_str(), "Warning: thing\nsecond\n");
    }

    #[test]
    fn test_verbose_flag() {
        set_verbose(true);
        assert!(get_verbose());
        set_verbose(false);
        assert!(!get_verbose());
    }
}
