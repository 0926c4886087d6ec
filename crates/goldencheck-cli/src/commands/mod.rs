pub mod init;
pub mod run;
pub mod validate;

/// Exit status when scoring or lint completed and everything passed.
pub const EXIT_PASS: i32 = 0;
/// Exit status when scoring or lint completed with failures.
pub const EXIT_FAIL: i32 = 1;
