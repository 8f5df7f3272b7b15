use std::{fs, path::Path};

use tracing::{info, warn};

use pclass_core::{rule::Trace, DIM_NUM};

use crate::{
    basic::parser::{parse_field, parse_u32},
    error::{IoError, RecordError, RecordErrorKind},
};

/// Five key columns, one unused column and the label.
pub const MIN_TRACE_FIELDS: usize = 7;

#[derive(Debug, Default)]
pub struct TraceSet {
    pub traces: Vec<Trace>,
    pub skipped: Vec<RecordError>,
}

fn parse_trace_fields(line: &str) -> Result<Trace, RecordErrorKind> {
    let fields: Vec<&str> = line.split('\t').filter(|f| !f.is_empty()).collect();
    if fields.len() < MIN_TRACE_FIELDS {
        return Err(RecordErrorKind::FieldCount {
            expected: MIN_TRACE_FIELDS,
            found: fields.len(),
        });
    }
    let number = |f: &str| {
        parse_field(parse_u32, f).ok_or_else(|| RecordErrorKind::Number(f.to_owned()))
    };
    let mut trace = Trace::default();
    for (k, f) in trace.key.iter_mut().zip(&fields[..DIM_NUM]) {
        *k = number(*f)?;
    }
    trace.label = number(fields[6])?;
    Ok(trace)
}

/// Parse one tab separated trace line: `sip dip sport dport proto <unused> label ...`, all
/// decimal.
pub fn parse_trace(line: &str, line_no: usize) -> Result<Trace, RecordError> {
    parse_trace_fields(line.trim_end()).map_err(|kind| kind.at(line_no))
}

/// Parse a whole trace file, skipping blank lines and malformed records.
pub fn parse_traces(content: &str) -> TraceSet {
    let mut set = TraceSet::default();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_trace(line, line_no + 1) {
            Ok(t) => set.traces.push(t),
            Err(e) => {
                warn!("skip trace record, {}", e);
                set.skipped.push(e);
            }
        }
    }
    set
}

pub fn read_traces(path: impl AsRef<Path>) -> Result<TraceSet, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| IoError::FileUnavailable {
        path: path.to_owned(),
        source,
    })?;
    let set = parse_traces(&content);
    info!(
        "read {} traces from {} ({} skipped)",
        set.traces.len(),
        path.display(),
        set.skipped.len()
    );
    Ok(set)
}
