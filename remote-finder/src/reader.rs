use crate::client::RemoteClient;
use crate::error::{ParseError, Result};
use crate::intervals::{Interval, IntervalSet};
use crate::wire::{default_fill, parse_raw_line, Points, TimeInfo, DEFAULT_STEP};
use crate::RemoteHost;
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Reader bound to one (host, metric path) pair.
///
/// The interval bounds are fixed when the reader is built. A missing end is
/// frozen to the construction-time "now" and does not advance afterwards, so
/// a long-lived reader keeps reporting the upper bound it was created with.
#[derive(Debug, Clone)]
pub struct RemoteReader {
    client: RemoteClient,
    remote_uri: RemoteHost,
    metric_name: String,
    interval: Interval,
}

impl RemoteReader {
    pub fn new(
        client: RemoteClient,
        remote_uri: RemoteHost,
        metric_name: impl Into<String>,
        interval_start: Option<i64>,
        interval_end: Option<i64>,
    ) -> Self {
        let interval_start = interval_start.unwrap_or(0);
        let interval_end =
            interval_end.unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
        Self {
            client,
            remote_uri,
            metric_name: metric_name.into(),
            interval: Interval::new(interval_start, interval_end),
        }
    }

    pub fn remote_uri(&self) -> &RemoteHost {
        &self.remote_uri
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// The single interval recorded at construction; never does I/O
    pub fn get_intervals(&self) -> IntervalSet {
        debug!(
            reader = "remote",
            remote_uri = %self.remote_uri,
            metric_path = %self.metric_name,
            "get_intervals"
        );
        IntervalSet::new(vec![self.interval])
    }

    /// Series for `[start_time, end_time)`.
    ///
    /// Unreachable hosts, non-200 answers and empty bodies yield the default
    /// all-absent fill. A body that does not parse, or that carries more than
    /// one line, is returned as an error.
    pub async fn fetch(&self, start_time: i64, end_time: i64) -> Result<(TimeInfo, Points)> {
        debug!(
            reader = "remote",
            remote_uri = %self.remote_uri,
            metric_path = %self.metric_name,
            start = start_time,
            end = end_time,
            "fetch"
        );

        let body = match self
            .client
            .render(&self.remote_uri, &[self.metric_name.as_str()], start_time, end_time)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    remote_uri = %self.remote_uri,
                    metric_path = %self.metric_name,
                    error = %e,
                    "fetch failed, using default fill"
                );
                return Ok(default_fill(start_time, end_time, DEFAULT_STEP)?);
            }
        };

        let line = body.trim_end();
        if line.is_empty() {
            return Ok(default_fill(start_time, end_time, DEFAULT_STEP)?);
        }
        if line.contains('\n') {
            return Err(ParseError::UnexpectedLines(line.lines().count()).into());
        }

        let series = parse_raw_line(line)?;
        Ok((series.time_info, series.points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinderError;
    use std::time::Duration;

    fn client() -> RemoteClient {
        RemoteClient::new(Duration::from_secs(1), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_explicit_interval_is_returned_verbatim() {
        let reader = RemoteReader::new(client(), "http://a".into(), "a.b.c", Some(100), Some(200));
        let first = reader.get_intervals();
        assert_eq!(first.as_slice(), &[Interval::new(100, 200)]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(reader.get_intervals(), first);
    }

    #[test]
    fn test_missing_bounds_default_to_zero_and_frozen_now() {
        let before = OffsetDateTime::now_utc().unix_timestamp();
        let reader = RemoteReader::new(client(), "http://a".into(), "a.b.c", None, None);
        let after = OffsetDateTime::now_utc().unix_timestamp();

        let intervals = reader.get_intervals();
        let interval = intervals.as_slice()[0];
        assert_eq!(interval.start, 0);
        assert!(interval.end >= before && interval.end <= after);

        // frozen at construction
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(reader.get_intervals().as_slice()[0].end, interval.end);
    }

    #[test]
    fn test_inverted_bounds_collapse() {
        let reader = RemoteReader::new(client(), "http://a".into(), "a", Some(300), Some(100));
        assert_eq!(reader.get_intervals().as_slice(), &[Interval { start: 300, end: 300 }]);
    }

    #[tokio::test]
    async fn test_fetch_rejects_unfillable_window_without_panicking() {
        // nothing listens on port 9, so the default fill path is taken
        let reader = RemoteReader::new(client(), "http://127.0.0.1:9".into(), "a", None, None);
        let err = reader.fetch(i64::MIN, i64::MAX).await.unwrap_err();
        assert!(matches!(err, FinderError::Parse(ParseError::WindowTooLarge { .. })));
    }
}
