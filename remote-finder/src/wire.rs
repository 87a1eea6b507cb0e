//! Raw render line format
//!
//! A render endpoint asked for `format=raw` answers one line per series:
//!
//! ```text
//! <path>,<start>,<end>,<step>|<v1>,<v2>,...
//! ```
//!
//! where every value is a decimal number or the literal `None`. Points are
//! implicitly timestamped `start`, `start + step`, `start + 2*step`, ...
//!
//! Everything in this module is pure: no I/O, no logging.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Step used when no host supplied a cadence
pub const DEFAULT_STEP: i64 = 60;

/// Largest all-absent series this crate will synthesize
pub const MAX_POINTS: usize = 1 << 22;

/// Token a render endpoint uses for a missing datapoint
const NO_DATA: &str = "None";

/// Ordered datapoints of one series, `None` meaning "no data"
pub type Points = Vec<Option<f64>>;

/// Metric path -> datapoints, as returned by a bulk fetch
pub type SeriesMap = BTreeMap<String, Points>;

/// Cadence of a returned series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInfo {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl TimeInfo {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        Self { start, end, step }
    }

    /// Number of steps covering `[start, end)`, capped at `MAX_POINTS`
    pub fn point_count(&self) -> Result<usize, ParseError> {
        if self.end <= self.start || self.step <= 0 {
            return Ok(0);
        }
        // i128 holds any i64 span plus a step without wrapping
        let span = i128::from(self.end) - i128::from(self.start);
        let step = i128::from(self.step);
        let count = (span + step - 1) / step;
        usize::try_from(count)
            .ok()
            .filter(|count| *count <= MAX_POINTS)
            .ok_or(ParseError::WindowTooLarge {
                start: self.start,
                end: self.end,
                step: self.step,
            })
    }

    /// All-absent datapoints at this cadence
    pub fn empty_points(&self) -> Result<Points, ParseError> {
        Ok(vec![None; self.point_count()?])
    }
}

impl From<(i64, i64, i64)> for TimeInfo {
    fn from((start, end, step): (i64, i64, i64)) -> Self {
        Self::new(start, end, step)
    }
}

/// One parsed render line
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub path: String,
    pub time_info: TimeInfo,
    pub points: Points,
}

/// Synthesized all-absent series for a window with no real data
pub fn default_fill(start: i64, end: i64, step: i64) -> Result<(TimeInfo, Points), ParseError> {
    let time_info = TimeInfo::new(start, end, step);
    let points = time_info.empty_points()?;
    Ok((time_info, points))
}

/// Default mapping for a bulk fetch where no host returned anything
pub fn default_multi_fill<'a, I>(
    start: i64,
    end: i64,
    step: i64,
    paths: I,
) -> Result<(TimeInfo, SeriesMap), ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let time_info = TimeInfo::new(start, end, step);
    let points = time_info.empty_points()?;
    let series = paths
        .into_iter()
        .map(|path| (path.to_string(), points.clone()))
        .collect();
    Ok((time_info, series))
}

/// Parses one `meta|datapoints` line.
///
/// The caller strips the line terminator. An empty datapoints segment yields
/// the default fill for `[start, end)` at the parsed step, never an empty
/// sequence. A window too wide to fill is rejected with
/// `ParseError::WindowTooLarge`.
pub fn parse_raw_line(line: &str) -> Result<RawSeries, ParseError> {
    let (meta, datapoints) = match line.split_once('|') {
        Some((meta, datapoints)) if !datapoints.contains('|') => (meta, datapoints),
        _ => return Err(ParseError::MissingSeparator(line.to_string())),
    };

    let fields: Vec<&str> = meta.split(',').collect();
    let [path, start, end, step] = fields.as_slice() else {
        return Err(ParseError::FieldCount {
            expected: 4,
            found: fields.len(),
            meta: meta.to_string(),
        });
    };

    let start = parse_int("start", start)?;
    let end = parse_int("end", end)?;
    let step = parse_int("step", step)?;
    if step <= 0 {
        return Err(ParseError::InvalidStep(step));
    }

    let points = parse_datapoints(datapoints)?;
    let (time_info, points) = if points.is_empty() {
        default_fill(start, end, step)?
    } else {
        (TimeInfo::new(start, end, step), points)
    };

    Ok(RawSeries {
        path: path.to_string(),
        time_info,
        points,
    })
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, ParseError> {
    value.parse::<i64>().map_err(|_| ParseError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

fn parse_datapoints(segment: &str) -> Result<Points, ParseError> {
    if segment.is_empty() {
        return Ok(Vec::new());
    }
    segment
        .split(',')
        .map(|token| match token {
            NO_DATA => Ok(None),
            _ => token
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ParseError::InvalidDatapoint(token.to_string())),
        })
        .collect()
}
