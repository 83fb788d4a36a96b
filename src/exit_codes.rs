/// Exit codes for codeview.
///
/// `format` always prints code, so scripts that only read stdout keep
/// working when formatting is not possible; the exit code tells them
/// whether the output was actually formatted.
/// Success - Input was formatted, or the query answered
pub const SUCCESS: i32 = 0;

/// Formatting unavailable - The original code was printed unchanged
pub const FORMAT_UNAVAILABLE: i32 = 1;

/// Tool error - Configuration error, file access error, or internal error
pub const TOOL_ERROR: i32 = 2;

/// Helper functions for consistent exit behavior
pub mod exit {
    use super::{FORMAT_UNAVAILABLE, SUCCESS, TOOL_ERROR};

    /// Exit with success code (0)
    pub fn success() -> ! {
        std::process::exit(SUCCESS);
    }

    /// Exit with formatting unavailable code (1)
    pub fn format_unavailable() -> ! {
        std::process::exit(FORMAT_UNAVAILABLE);
    }

    /// Exit with tool error code (2)
    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
