//! CSV output formatting.

use crate::scanner::ScanReport;
use std::io::{self, Write};

/// Write one row per target: host, port, outcome, detail, extra.
pub fn write_csv<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["host", "port", "outcome", "detail", "extra"])?;

    for result in &report.results {
        wtr.write_record([
            result.target.host.clone(),
            result.target.port.to_string(),
            result.outcome.label().to_string(),
            result.outcome.detail_text(),
            result.outcome.extra().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ProbeOutcome, TargetResult};
    use crate::types::{Port, RunId, Target};
    use std::path::PathBuf;

    #[test]
    fn test_csv_rows() {
        let target = Target::new("example.com", Port::new(81).unwrap()).unwrap();
        let report = ScanReport::new(
            RunId::new(),
            PathBuf::from("out"),
            1,
            vec![TargetResult::new(target, ProbeOutcome::Closed("timed out after 3000 ms".into()))],
        );

        let mut buffer = Vec::new();
        write_csv(&mut buffer, &report).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "host,port,outcome,detail,extra\nexample.com,81,CLOSED,timed out after 3000 ms,\n"
        );
    }
}
