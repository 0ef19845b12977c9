//! Lightcurve text input and folded-lightcurve text output.
//!
//! Input files are whitespace-delimited with at least four columns
//! `time flux <unused> quality`, preceded by `skip_rows` header lines. Only
//! rows whose quality flag equals 0 are kept.
//!
//! Output files start with the bin count `N` on its own line, followed by
//! `2 * N` tab-separated rows `time flux flux_err` covering two consecutive
//! cycles, all values with six decimals.

use crate::error::{Error, Result};
use crate::fold::BinnedFold;
use crate::lightcurve::Lightcurve;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header lines skipped by default.
pub const DEFAULT_SKIP_ROWS: usize = 1;

/// Number of cycles written to a folded lightcurve file.
pub const WRITTEN_CYCLES: usize = 2;

// ============================================================================
// Lightcurve input
// ============================================================================

/// Read a lightcurve file; the id is the file name without its extension.
pub fn read_lightcurve(path: impl AsRef<Path>, skip_rows: usize) -> Result<Lightcurve> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse_lightcurve(lightcurve_id(path), &text, skip_rows)
}

/// File stem of `path`, or the whole file name when there is none.
pub fn lightcurve_id(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse lightcurve text.
///
/// Blank lines after the header are ignored. Line numbers in
/// [`Error::Parse`] are 1-based.
pub fn parse_lightcurve(id: impl Into<String>, text: &str, skip_rows: usize) -> Result<Lightcurve> {
    let mut time = Vec::new();
    let mut flux = Vec::new();

    for (i, line) in text.lines().enumerate().skip(skip_rows) {
        let line_no = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 4 {
            return Err(Error::Parse {
                line: line_no,
                message: format!("expected at least 4 columns, found {}", fields.len()),
            });
        }
        let quality = parse_field(fields[3], line_no, "quality")?;
        if quality != 0.0 {
            continue;
        }
        time.push(parse_field(fields[0], line_no, "time")?);
        flux.push(parse_field(fields[1], line_no, "flux")?);
    }

    let lc = Lightcurve::new(id, time, flux)?;
    log::debug!("loaded lightcurve '{}' with {} good samples", lc.id(), lc.len());
    Ok(lc)
}

fn parse_field(field: &str, line: usize, name: &str) -> Result<f64> {
    field.parse::<f64>().map_err(|e| Error::Parse {
        line,
        message: format!("invalid {name} value '{field}': {e}"),
    })
}

// ============================================================================
// Folded lightcurve output
// ============================================================================

/// Rows of a folded lightcurve file.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedFile {
    /// Bin count from the first line
    pub n_bins: usize,
    /// `(time, flux, flux_err)` rows
    pub rows: Vec<(f64, f64, f64)>,
}

/// Write `binned` for two cycles of `period` to `path`.
pub fn write_folded(path: impl AsRef<Path>, binned: &BinnedFold, period: f64) -> Result<()> {
    let file = fs::File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_folded_to(&mut writer, binned, period)?;
    writer.flush()?;
    Ok(())
}

/// Write the folded lightcurve text to any writer.
pub fn write_folded_to<W: Write>(writer: &mut W, binned: &BinnedFold, period: f64) -> Result<()> {
    writeln!(writer, "{}", binned.len())?;
    for (t, f, e) in binned.cycles(period, WRITTEN_CYCLES) {
        writeln!(writer, "{}\t{}\t{}", fixed6(t), fixed6(f), fixed6(e))?;
    }
    Ok(())
}

/// Six-decimal fixed notation, `nan`/`inf` for non-finite values.
fn fixed6(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{v:.6}")
    }
}

/// Read a folded lightcurve file.
pub fn read_folded(path: impl AsRef<Path>) -> Result<FoldedFile> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_folded(&text)
}

/// Parse folded lightcurve text, checking the row count against `2 * N`.
pub fn parse_folded(text: &str) -> Result<FoldedFile> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| Error::Parse {
        line: 1,
        message: "missing bin count".to_string(),
    })?;
    let n_bins: usize = header.trim().parse().map_err(|e| Error::Parse {
        line: 1,
        message: format!("invalid bin count '{}': {e}", header.trim()),
    })?;

    let mut rows = Vec::with_capacity(WRITTEN_CYCLES * n_bins);
    for (i, line) in lines {
        let line_no = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(Error::Parse {
                line: line_no,
                message: format!("expected 3 columns, found {}", fields.len()),
            });
        }
        rows.push((
            parse_field(fields[0], line_no, "time")?,
            parse_field(fields[1], line_no, "flux")?,
            parse_field(fields[2], line_no, "flux_err")?,
        ));
    }

    if rows.len() != WRITTEN_CYCLES * n_bins {
        return Err(Error::Parse {
            line: 1,
            message: format!(
                "header announces {n_bins} bins but {} rows follow (expected {})",
                rows.len(),
                WRITTEN_CYCLES * n_bins
            ),
        });
    }

    Ok(FoldedFile { n_bins, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# time flux flux_err quality
1325.50 1.0002 0.0003 0
1325.52 0.9998 0.0003 0
1325.54 0.9001 0.0003 128
1325.56 1.0001 0.0003 0.0

1325.58 0.9999 0.0003 0
";

    #[test]
    fn test_parse_keeps_good_quality_rows() {
        let lc = parse_lightcurve("kplr1", SAMPLE, DEFAULT_SKIP_ROWS).unwrap();
        assert_eq!(lc.id(), "kplr1");
        assert_eq!(lc.len(), 4);
        assert_eq!(lc.time(), &[1325.50, 1325.52, 1325.56, 1325.58]);
        assert_eq!(lc.flux()[2], 1.0001);
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let text = "header\n1.0 1.0 0.0 0\n2.0 1.0 0.0\n";
        match parse_lightcurve("bad", text, 1) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }

        let text = "header\n1.0 abc 0.0 0\n";
        assert!(matches!(
            parse_lightcurve("bad", text, 1),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_skip_rows() {
        let text = "a\nb\n1.0 2.0 0 0\n";
        let lc = parse_lightcurve("skip", text, 2).unwrap();
        assert_eq!(lc.len(), 1);
        assert!(parse_lightcurve("skip", text, 1).is_err());
    }

    #[test]
    fn test_lightcurve_id_is_file_stem() {
        assert_eq!(lightcurve_id(Path::new("/data/lc/KIC_0042.txt")), "KIC_0042");
        assert_eq!(lightcurve_id(Path::new("plain")), "plain");
    }

    fn binned(n: usize) -> BinnedFold {
        BinnedFold {
            phase: (0..n).map(|k| (k as f64 + 0.5) / n as f64).collect(),
            flux: (0..n).map(|k| 1.0 - 0.001 * k as f64).collect(),
            flux_err: vec![0.0005; n],
            counts: vec![10; n],
        }
    }

    #[test]
    fn test_write_folded_layout() {
        let mut out = Vec::new();
        write_folded_to(&mut out, &binned(100), 2.5).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 201);
        assert_eq!(lines[0], "100");
        assert_eq!(lines[1], "0.012500\t1.000000\t0.000500");
        // second cycle starts at row N + 1 with doubled times
        assert_eq!(lines[101], "0.025000\t1.000000\t0.000500");

        let parsed = parse_folded(&text).unwrap();
        assert_eq!(parsed.n_bins, 100);
        assert_eq!(parsed.rows.len(), 200);
    }

    #[test]
    fn test_parse_folded_checks_row_count() {
        let text = "3\n0.1\t1.0\t0.0\n0.2\t1.0\t0.0\n";
        assert!(matches!(parse_folded(text), Err(Error::Parse { .. })));
        assert!(parse_folded("").is_err());
        assert!(parse_folded("x\n").is_err());
    }

    #[test]
    fn test_non_finite_values_round_trip() {
        let mut b = binned(2);
        b.flux_err[1] = f64::NAN;
        let mut out = Vec::new();
        write_folded_to(&mut out, &b, 1.0).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\tnan\n"));
        let parsed = parse_folded(&text).unwrap();
        assert!(parsed.rows[1].2.is_nan());
    }
}
