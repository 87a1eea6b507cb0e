/*!
# Remote Finder DevKit - Mock hosts and helpers for tests

Library for testing the remote finder without real Graphite servers:
- In-process mock remote hosts (find + raw render endpoints)
- Recording of every request a mock host received
- Builders for completer and raw render payloads
- A harness starting several hosts at once
*/

pub mod fixtures;
pub mod mock_host;
pub mod test_utils;

pub use fixtures::{completer_body, raw_line};
pub use mock_host::{
    unreachable_host_url, Endpoint, MockHostBuilder, MockRemoteHost, RecordedRequest,
};
pub use test_utils::TestHarness;
