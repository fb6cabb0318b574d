//! Integration tests for gdsync-drive
//!
//! Uses wiremock to stand in for the Drive v3 API and checks the client,
//! oracle, writer and allocator end to end.

mod common;

mod test_allocator;
mod test_oracle;
mod test_writer;
