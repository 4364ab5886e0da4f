//! JSONL reading and writing for event records
//!
//! One record per line. Event shape is best-effort by design, but the file
//! format is owned by this tool, so a line that is not valid JSON is an
//! error rather than a silent drop.

use flowtrace_core::EventRecord;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing capture files
#[derive(Debug, Error)]
pub enum JsonlError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line that is not a valid event record
    #[error("Malformed record on line {line}: {source}")]
    Malformed {
        line: usize,
        source: serde_json::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for capture file operations
pub type JsonlResult<T> = Result<T, JsonlError>;

/// Read one event record per line; blank lines are skipped
pub fn read_events(path: &Path) -> JsonlResult<Vec<EventRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| JsonlError::Malformed {
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }

    Ok(events)
}

/// Write records one JSON object per line to the given path, or stdout when
/// no path is given
pub fn write_events(path: Option<&Path>, events: &[EventRecord]) -> JsonlResult<()> {
    let mut writer = open_output(path)?;
    for event in events {
        let json = serde_json::to_string(event)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(())
}

/// Open the output sink: a buffered file, or stdout when no path is given
pub fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowtrace_core::Direction;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let events = vec![
            EventRecord::new(Direction::RequestTwoWay, "call")
                .with_span("s1")
                .with_from("a")
                .with_to("b"),
            EventRecord::new(Direction::RequestOneWay, "notify")
                .with_from("a")
                .with_to("c"),
        ];
        write_events(Some(&path), &events).unwrap();

        let back = read_events(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].span_id.as_deref(), Some("s1"));
        assert_eq!(back[1].direction, Direction::RequestOneWay);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let record = serde_json::to_string(
            &EventRecord::new(Direction::RequestOneWay, "notify")
                .with_from("a")
                .with_to("b"),
        )
        .unwrap();
        std::fs::write(&path, format!("\n{}\n\n", record)).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        std::fs::write(&path, "{\"not\": \"an event\"}\n").unwrap();

        let err = read_events(&path).unwrap_err();
        match err {
            JsonlError::Malformed { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
