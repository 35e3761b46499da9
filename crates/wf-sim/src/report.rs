//! Plain-text tabular export of coupling records.

use std::io::Write;

use crate::error::SimResult;
use crate::record::CouplingRecord;

pub const COLUMNS: [&str; 10] = [
    "Time[d]",
    "TimeStep[d]",
    "Qo[sm3/d]",
    "Qw[sm3/d]",
    "Qwi[sm3/d]",
    "PwfProd[bar]",
    "PwfInj[bar]",
    "PwhProd[bar]",
    "PwhInj[bar]",
    "ESP[MW]",
];

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "nan".to_string(), |v| v.to_string())
}

/// Write one header line, then one line per record.
pub fn write_table<W: Write>(
    records: &[CouplingRecord],
    writer: &mut W,
    delimiter: &str,
) -> SimResult<()> {
    writeln!(writer, "{}", COLUMNS.join(delimiter))?;
    for r in records {
        let row = [
            r.time.to_string(),
            r.dt.to_string(),
            r.qo.to_string(),
            r.qw.to_string(),
            r.qwi.to_string(),
            r.pwf.to_string(),
            optional(r.injector_bhp),
            optional(r.wellhead_pressure),
            optional(r.injection_wellhead_pressure),
            r.booster_power.to_string(),
        ];
        writeln!(writer, "{}", row.join(delimiter))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: f64) -> CouplingRecord {
        CouplingRecord {
            time,
            dt: 0.5,
            pwf: 150.0,
            qo: 80.0,
            qw: 20.0,
            qwi: 100.0,
            water_cut: 0.2,
            injector_bhp: Some(320.0),
            wellhead_pressure: Some(20.0),
            injection_wellhead_pressure: None,
            booster_power: 0.25,
            picard_converged: true,
            picard_iterations: 3,
            operating_point_converged: true,
            cutbacks: 0,
        }
    }

    #[test]
    fn header_and_rows() {
        let mut out = Vec::new();
        write_table(&[record(0.5), record(1.0)], &mut out, "\t").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Time[d]\tTimeStep[d]"));
        assert_eq!(lines[0].split('\t').count(), COLUMNS.len());
        assert_eq!(
            lines[2],
            "1\t0.5\t80\t20\t100\t150\t320\t20\tnan\t0.25"
        );
    }

    #[test]
    fn empty_run_writes_header_only() {
        let mut out = Vec::new();
        write_table(&[], &mut out, ",").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", COLUMNS.join(",")));
    }
}
