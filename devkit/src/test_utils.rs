/*!
Test harness for remote finder tests

Starts several mock remote hosts at once and keeps them alive for the
duration of a test:
- Host URLs in start order, ready for the finder's remote list
- Per-host request statistics
- Assertions on what each host received
*/

use crate::mock_host::{Endpoint, MockHostBuilder, MockRemoteHost};
use anyhow::Result;
use std::collections::HashMap;

/// Set of running mock hosts, in configuration order
pub struct TestHarness {
    pub hosts: Vec<MockRemoteHost>,
}

impl TestHarness {
    pub fn new() -> Self {
        env_logger::try_init().ok(); // logging for tests
        Self { hosts: Vec::new() }
    }

    /// Starts one mock host per builder, in order
    pub async fn with_hosts(builders: Vec<MockHostBuilder>) -> Result<Self> {
        let mut harness = Self::new();
        for builder in builders {
            harness.hosts.push(builder.start().await?);
        }
        log::info!("[harness] started {} mock hosts", harness.hosts.len());
        Ok(harness)
    }

    pub fn urls(&self) -> Vec<String> {
        self.hosts.iter().map(|h| h.url().to_string()).collect()
    }

    pub fn host(&self, index: usize) -> &MockRemoteHost {
        &self.hosts[index]
    }

    /// Fails unless host `index` received exactly these render calls
    pub fn assert_render_targets(&self, index: usize, expected: &[&[&str]]) -> Result<()> {
        let actual = self.host(index).render_targets();
        let expected: Vec<Vec<String>> = expected
            .iter()
            .map(|call| call.iter().map(|t| t.to_string()).collect())
            .collect();
        if actual != expected {
            anyhow::bail!(
                "host {} render targets mismatch: expected {:?}, got {:?}",
                index, expected, actual
            );
        }
        Ok(())
    }

    pub fn get_stats(&self) -> TestStats {
        let mut per_host = HashMap::new();
        for host in &self.hosts {
            per_host.insert(
                host.url().to_string(),
                (
                    host.requests_to(Endpoint::Find).len(),
                    host.requests_to(Endpoint::Render).len(),
                ),
            );
        }
        TestStats { per_host }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct TestStats {
    /// url -> (find calls, render calls)
    pub per_host: HashMap<String, (usize, usize)>,
}

impl TestStats {
    pub fn total_requests(&self) -> usize {
        self.per_host.values().map(|(f, r)| f + r).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_starts_hosts_in_order() {
        let harness = TestHarness::with_hosts(vec![
            MockRemoteHost::builder().metric("a", true),
            MockRemoteHost::builder().metric("b", true),
        ])
        .await
        .unwrap();

        let urls = harness.urls();
        assert_eq!(urls.len(), 2);
        assert_ne!(urls[0], urls[1]);
        assert_eq!(harness.get_stats().total_requests(), 0);
        harness.assert_render_targets(0, &[]).unwrap();
    }
}
