use core::{
    fmt::{self, Display, Formatter},
    time::Duration,
};
use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::stat::Snapshot;

/// Final run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Wall time from the first launch until the last task finished.
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub total_issued: u64,
    pub total_successful: u64,
    /// Requests that ended without any response.
    pub total_errors: u64,
    pub total_attempts: u64,
    pub status_counts: BTreeMap<u16, u64>,
}

impl Report {
    pub fn new(elapsed: Duration, snapshot: Snapshot) -> Self {
        let Snapshot {
            issued,
            successful,
            errors,
            attempts,
            status_counts,
        } = snapshot;

        Self {
            elapsed,
            total_issued: issued,
            total_successful: successful,
            total_errors: errors,
            total_attempts: attempts,
            status_counts,
        }
    }

    /// Returns completed requests per second.
    pub fn rps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_issued as f64 / secs
        } else {
            0.0
        }
    }
}

impl Display for Report {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        writeln!(fmt, "Test report:")?;
        writeln!(fmt, "Total time:          {:?}", self.elapsed)?;
        writeln!(fmt, "Total requests:      {}", self.total_issued)?;
        writeln!(fmt, "HTTP 200 responses:  {}", self.total_successful)?;
        writeln!(fmt, "Transport errors:    {}", self.total_errors)?;
        writeln!(fmt, "Attempts:            {}", self.total_attempts)?;
        writeln!(fmt, "Requests per second: {:.2}", self.rps())?;
        writeln!(fmt, "Status code distribution:")?;
        if self.status_counts.is_empty() {
            writeln!(fmt, "  (none)")?;
        }
        for (code, count) in &self.status_counts {
            writeln!(fmt, "  {code}: {count}")?;
        }

        Ok(())
    }
}

fn as_millis<S>(v: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(v.as_secs_f64() * 1000.0)
}
