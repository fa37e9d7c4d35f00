//! Wire protocol tests.

mod events_test;
mod line_test;
#[cfg(unix)]
mod process_test;
