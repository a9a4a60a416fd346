//! Log rows and run summaries.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timestamp layout used in log rows and log file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Marker column carried only by the final row.
pub const END_MARKER: &str = "End";

/// Current local time formatted for log rows and file names.
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// One measurement appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Wall-clock time the sample was taken (`YYYY-MM-DD_HH-MM-SS`)
    pub timestamp: String,
    /// Seconds since the run started
    pub elapsed_secs: f64,
    /// Throughput in MiB/s
    pub throughput_mibps: f64,
    /// Set on the single summary row written at shutdown
    #[serde(default)]
    pub is_final: bool,
}

impl SampleRecord {
    /// A periodic sample taken now.
    pub fn periodic(elapsed: Duration, throughput_mibps: f64) -> Self {
        Self {
            timestamp: timestamp_now(),
            elapsed_secs: elapsed.as_secs_f64(),
            throughput_mibps,
            is_final: false,
        }
    }

    /// The end-of-run summary row.
    pub fn final_row(elapsed: Duration, throughput_mibps: f64) -> Self {
        Self {
            is_final: true,
            ..Self::periodic(elapsed, throughput_mibps)
        }
    }

    /// Render as a comma-separated log row, without the line terminator.
    pub fn to_row(&self) -> String {
        let mut row = format!(
            "{},{:.6},{:.6}",
            self.timestamp, self.elapsed_secs, self.throughput_mibps
        );
        if self.is_final {
            row.push(',');
            row.push_str(END_MARKER);
        }
        row
    }

    /// Parse a row produced by [`SampleRecord::to_row`].
    ///
    /// Periodic rows have three columns, the final row four with `End` last.
    pub fn parse_row(line: &str) -> io::Result<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        let is_final = match fields.len() {
            3 => false,
            4 if fields[3] == END_MARKER => true,
            4 => return Err(invalid(format!("unknown row marker {:?}", fields[3]))),
            n => return Err(invalid(format!("expected 3 or 4 columns, found {}", n))),
        };

        let elapsed_secs = fields[1]
            .parse::<f64>()
            .map_err(|e| invalid(format!("bad elapsed seconds {:?}: {}", fields[1], e)))?;
        let throughput_mibps = fields[2]
            .parse::<f64>()
            .map_err(|e| invalid(format!("bad throughput {:?}: {}", fields[2], e)))?;

        Ok(Self {
            timestamp: fields[0].to_string(),
            elapsed_secs,
            throughput_mibps,
            is_final,
        })
    }
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Machine-readable summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Timestamp the run started, same layout as the log rows
    pub started_at: String,
    /// Target that was written to
    pub output_path: PathBuf,
    /// Bytes per write
    pub chunk_size: usize,
    /// Sampling interval
    #[serde(with = "duration_serde")]
    pub sample_interval: Duration,
    /// Whether each write was followed by a flush to storage
    pub sync_after_write: bool,
    /// Number of periodic rows logged
    pub samples: u64,
    /// Total bytes accepted by the target
    pub bytes_written: u64,
    /// Wall time from start to the final report
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Lifetime average in MiB/s
    pub average_mibps: f64,
}

impl RunSummary {
    /// Load a summary from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the summary as pretty JSON to `<dir>/<started_at>.json`.
    pub fn save(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.started_at));
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_nanos().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = u128::deserialize(d)?;
        let nanos = u64::try_from(nanos).map_err(serde::de::Error::custom)?;
        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(elapsed_secs: f64, throughput_mibps: f64, is_final: bool) -> SampleRecord {
        SampleRecord {
            timestamp: "2024-03-01_12-30-05".to_string(),
            elapsed_secs,
            throughput_mibps,
            is_final,
        }
    }

    #[test]
    fn should_format_periodic_row_with_three_columns() {
        let row = record(1.25, 512.5, false).to_row();
        assert_eq!(row, "2024-03-01_12-30-05,1.250000,512.500000");
        assert_eq!(row.split(',').count(), 3);
    }

    #[test]
    fn should_append_end_marker_on_final_row() {
        let row = record(10.0, 3.0, true).to_row();
        assert_eq!(row, "2024-03-01_12-30-05,10.000000,3.000000,End");
    }

    #[test]
    fn should_parse_rows_back_to_same_fields() {
        for original in [record(0.25, 1.5, false), record(42.0, 0.0, true)] {
            let parsed = SampleRecord::parse_row(&original.to_row()).unwrap();
            assert_eq!(parsed, original);
        }
    }

    #[test]
    fn should_reject_rows_with_wrong_shape() {
        assert!(SampleRecord::parse_row("a,b").is_err());
        assert!(SampleRecord::parse_row("ts,1.0,2.0,Begin").is_err());
        assert!(SampleRecord::parse_row("ts,notanumber,2.0").is_err());
        assert!(SampleRecord::parse_row("ts,1.0,2.0,End,extra").is_err());
    }

    #[test]
    fn should_format_timestamp_with_underscores_and_dashes() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), "YYYY-MM-DD_HH-MM-SS".len());
        assert_eq!(&ts[10..11], "_");
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn should_save_and_load_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = RunSummary {
            started_at: "2024-03-01_12-30-05".to_string(),
            output_path: PathBuf::from("/dev/null"),
            chunk_size: 4096,
            sample_interval: Duration::from_millis(250),
            sync_after_write: false,
            samples: 8,
            bytes_written: 1 << 30,
            elapsed: Duration::from_secs(2),
            average_mibps: 512.0,
        };

        let path = summary.save(dir.path()).unwrap();
        assert!(path.ends_with("2024-03-01_12-30-05.json"));

        let loaded = RunSummary::load(&path).unwrap();
        assert_eq!(loaded.bytes_written, 1 << 30);
        assert_eq!(loaded.sample_interval, Duration::from_millis(250));
        assert_eq!(loaded.samples, 8);
    }

    #[test]
    fn should_reject_summary_with_out_of_range_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let nanos = u128::from(u64::MAX) + 1;
        let json = format!(
            r#"{{"started_at":"2024-03-01_12-30-05","output_path":"out.bin","chunk_size":1024,
                "sample_interval":250000000,"sync_after_write":true,"samples":1,
                "bytes_written":1024,"elapsed":{},"average_mibps":0.0}}"#,
            nanos
        );
        std::fs::write(&path, json).unwrap();

        let err = RunSummary::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
