//! Integration tests for gdpath-drive
//!
//! Uses wiremock to simulate the Drive v3 and Sheets v4 APIs and verifies
//! end-to-end behavior of the DriveClient and the executor on top of it.

mod common;

mod test_executor;
mod test_list;
mod test_mutations;
