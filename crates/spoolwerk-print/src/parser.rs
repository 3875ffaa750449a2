// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output grammars of the SMB command-line tools.
//
// Every function here is pure: text in, typed records out.  Tolerant by
// construction, so lines or blocks that do not match are skipped rather
// than failing the whole parse.

use chrono::{DateTime, Utc};

use spoolwerk_core::types::{JobState, PrintJob, Printer, PrinterState};

/// Synthesize the locator for a printer on an SMB host.
pub fn smb_uri(host: &str, name: &str) -> String {
    format!("smb://{host}/{}", urlencoding::encode(name))
}

// ---------------------------------------------------------------------------
// enumprinters
// ---------------------------------------------------------------------------

/// Extract printers from `rpcclient enumprinters` output.
///
/// Only lines of the form `name:[\\server\printer]` count; the printer name
/// is whatever follows the server component.
pub fn parse_printer_list(output: &str, host: &str) -> Vec<Printer> {
    output
        .lines()
        .filter_map(|line| bracket_value(line, "name"))
        .filter_map(unc_share_name)
        .map(|name| Printer::new(name, smb_uri(host, name)))
        .collect()
}

/// `key:[value]` on one line, key matched case-insensitively.
fn bracket_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (label, rest) = line.trim().split_once(':')?;
    if !label.trim().eq_ignore_ascii_case(key) {
        return None;
    }
    rest.trim().strip_prefix('[')?.strip_suffix(']')
}

/// `\\server\name` -> `name`.
fn unc_share_name(value: &str) -> Option<&str> {
    let (server, name) = value.strip_prefix("\\\\")?.split_once('\\')?;
    (!server.is_empty() && !name.is_empty()).then_some(name)
}

// ---------------------------------------------------------------------------
// getprinter
// ---------------------------------------------------------------------------

/// Decoded `getprinter` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReading {
    pub state: PrinterState,
    pub message: Option<String>,
}

/// Decode the `status:[0x..]` field of `rpcclient getprinter` output.
///
/// A missing or malformed field yields `Unknown` with the raw text kept as
/// the message.
pub fn parse_printer_status(output: &str) -> StatusReading {
    let field = output.lines().find_map(|line| bracket_value(line, "status"));

    match field.map(|raw| (raw, parse_hex(raw))) {
        Some((_, Some(bits))) => {
            let state = PrinterState::from_status_bits(bits);
            let message = match state {
                PrinterState::Unknown => Some(format!("unrecognised status flags 0x{bits:x}")),
                other => other.message().map(str::to_owned),
            };
            StatusReading { state, message }
        }
        Some((raw, None)) => StatusReading {
            state: PrinterState::Unknown,
            message: Some(format!("unparseable status field: {raw}")),
        },
        None => {
            let raw = output.trim();
            StatusReading {
                state: PrinterState::Unknown,
                message: Some(if raw.is_empty() {
                    "getprinter returned no status field".to_owned()
                } else {
                    raw.to_owned()
                }),
            }
        }
    }
}

fn parse_hex(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))?;
    // Trailing text after the hex digits is ignored.
    let end = digits
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(digits.len());
    u32::from_str_radix(&digits[..end], 16).ok()
}

// ---------------------------------------------------------------------------
// enumjobs
// ---------------------------------------------------------------------------

/// Extract jobs from `rpcclient enumjobs` output.
///
/// Jobs are blank-line separated blocks of `Label: value` lines.  A block
/// without a numeric `Job Id` is skipped.  Missing fields default to
/// `"unknown"` / `0`; `User` has any `DOMAIN\` prefix stripped; `Status`
/// decodes through [`JobState::from_status_bits`].
pub fn parse_jobs(output: &str, printer_name: &str, observed_at: DateTime<Utc>) -> Vec<PrintJob> {
    blocks(output)
        .iter()
        .filter_map(|block| parse_job_block(block, printer_name, observed_at))
        .collect()
}

fn blocks(output: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_job_block(
    lines: &[&str],
    printer_name: &str,
    observed_at: DateTime<Utc>,
) -> Option<PrintJob> {
    // An id outside the spooler's u32 range cannot be addressed; drop the block.
    let job_id = u32::try_from(leading_number(field(lines, "job id")?)?).ok()?;

    let user_name = field(lines, "user")
        .map(strip_domain)
        .filter(|u| !u.is_empty())
        .unwrap_or("unknown");
    let document_name = field(lines, "document")
        .filter(|d| !d.is_empty())
        .unwrap_or("unknown");
    let total_pages = field(lines, "total pages")
        .and_then(leading_number)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0);
    let size = field(lines, "size").and_then(leading_number).unwrap_or(0);
    let status_bits = field(lines, "status").and_then(parse_hex).unwrap_or(0);

    Some(PrintJob {
        job_id,
        printer_name: printer_name.to_owned(),
        user_name: user_name.to_owned(),
        document_name: document_name.to_owned(),
        total_pages,
        pages_printed: 0,
        size,
        status: JobState::from_status_bits(status_bits),
        submitted_time: observed_at,
    })
}

/// Value of the first `label: value` line whose label matches.
fn field<'a>(lines: &[&'a str], label: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        let (key, value) = line.trim().split_once(':')?;
        key.trim().eq_ignore_ascii_case(label).then(|| value.trim())
    })
}

fn strip_domain(user: &str) -> &str {
    user.rsplit('\\').next().unwrap_or(user)
}

fn leading_number(value: &str) -> Option<u64> {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

// ---------------------------------------------------------------------------
// smbclient -L
// ---------------------------------------------------------------------------

/// Extract printer shares from `smbclient -L` output.
///
/// Columns are separated by two or more spaces (or a tab).  Rows whose
/// second column is `Printer` are kept; the `print$` driver share is not a
/// queue and is dropped.
pub fn parse_share_list(output: &str, host: &str) -> Vec<Printer> {
    output
        .lines()
        .filter_map(|line| {
            let columns = split_columns(line);
            let name = *columns.first()?;
            let kind = *columns.get(1)?;
            (kind.eq_ignore_ascii_case("printer") && !name.eq_ignore_ascii_case("print$"))
                .then(|| Printer::new(name, smb_uri(host, name)))
        })
        .collect()
}

fn split_columns(line: &str) -> Vec<&str> {
    let line = line.trim();
    let mut columns = Vec::new();
    let mut start = 0;
    let mut gap: Option<usize> = None;

    for (idx, ch) in line.char_indices() {
        if ch.is_whitespace() {
            gap.get_or_insert(idx);
        } else if let Some(gap_start) = gap.take() {
            let run = &line[gap_start..idx];
            if run.len() >= 2 || run.contains('\t') {
                columns.push(&line[start..gap_start]);
                start = idx;
            }
        }
    }
    if !line.is_empty() {
        columns.push(&line[start..]);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENUMPRINTERS: &str = "\
\tflags:[0x800000]
\tname:[\\\\printsrv\\HP-1]
\tdescription:[\\\\printsrv\\HP-1,HP LaserJet 4250,Floor 2]
\tcomment:[]

\tflags:[0x800000]
\tname:[\\\\printsrv\\Canon Colour]
\tdescription:[\\\\printsrv\\Canon Colour,Canon iR-ADV,]
\tcomment:[Reception]
";

    #[test]
    fn enumprinters_extracts_names_and_uris() {
        let printers = parse_printer_list(ENUMPRINTERS, "printsrv");
        assert_eq!(printers.len(), 2);
        assert_eq!(printers[0].name, "HP-1");
        assert_eq!(printers[0].uri, "smb://printsrv/HP-1");
        assert_eq!(printers[1].name, "Canon Colour");
        assert_eq!(printers[1].uri, "smb://printsrv/Canon%20Colour");
    }

    #[test]
    fn enumprinters_ignores_noise() {
        let output = "\
Connection to printsrv failed partially
name:[not-a-unc-path]
name:[\\\\printsrv\\]
\tname:[\\\\printsrv\\Lab]
";
        let printers = parse_printer_list(output, "printsrv");
        assert_eq!(printers, vec![Printer::new("Lab", "smb://printsrv/Lab")]);
        assert!(parse_printer_list("", "printsrv").is_empty());
    }

    #[test]
    fn getprinter_online() {
        let output = "\tprintername:[\\\\printsrv\\HP-1]\n\tstatus:[0x0]\n\tcjobs:[0]\n";
        let reading = parse_printer_status(output);
        assert_eq!(reading.state, PrinterState::Online);
        assert_eq!(reading.message, None);
    }

    #[test]
    fn getprinter_flags() {
        assert_eq!(parse_printer_status("status:[0x1]").state, PrinterState::Paused);
        assert_eq!(parse_printer_status("status:[0x2]").state, PrinterState::Error);
        assert_eq!(parse_printer_status("status:[0x4]").state, PrinterState::Offline);

        let odd = parse_printer_status("status:[0x400]");
        assert_eq!(odd.state, PrinterState::Unknown);
        assert!(odd.message.expect("message").contains("0x400"));
    }

    #[test]
    fn getprinter_missing_status_keeps_raw_text() {
        let reading = parse_printer_status("result was WERR_INVALID_PRINTER_NAME\n");
        assert_eq!(reading.state, PrinterState::Unknown);
        assert_eq!(
            reading.message.as_deref(),
            Some("result was WERR_INVALID_PRINTER_NAME")
        );
    }

    const ENUMJOBS: &str = "\
Job Id: 14
User: CORP\\alice
Document: quarterly.pdf
Total Pages: 12
Size: 482133
Status: 0x10

Job Id: 15
User: bob
Document: notes.txt
Total Pages: 1
Size: 2048
Status: 0x0

Job Id: 16
Status: 0x1
";

    #[test]
    fn enumjobs_blocks() {
        let now = Utc::now();
        let jobs = parse_jobs(ENUMJOBS, "HP-1", now);
        assert_eq!(jobs.len(), 3);

        assert_eq!(jobs[0].job_id, 14);
        assert_eq!(jobs[0].user_name, "alice");
        assert_eq!(jobs[0].document_name, "quarterly.pdf");
        assert_eq!(jobs[0].total_pages, 12);
        assert_eq!(jobs[0].size, 482_133);
        assert_eq!(jobs[0].status, JobState::Printing);
        assert_eq!(jobs[0].printer_name, "HP-1");
        assert_eq!(jobs[0].pages_printed, 0);
        assert_eq!(jobs[0].submitted_time, now);

        assert_eq!(jobs[1].user_name, "bob");
        assert_eq!(jobs[1].status, JobState::Queued);

        assert_eq!(jobs[2].user_name, "unknown");
        assert_eq!(jobs[2].document_name, "unknown");
        assert_eq!(jobs[2].total_pages, 0);
        assert_eq!(jobs[2].size, 0);
        assert_eq!(jobs[2].status, JobState::Paused);
    }

    #[test]
    fn enumjobs_skips_blocks_without_id() {
        let output = "User: alice\nDocument: a.pdf\n\n\n\nJob Id: abc\n\nJob Id: 7\n";
        let jobs = parse_jobs(output, "HP-1", Utc::now());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, 7);
        assert!(parse_jobs("   \n", "HP-1", Utc::now()).is_empty());
    }

    #[test]
    fn enumjobs_drops_out_of_range_ids() {
        let output = "Job Id: 4294967297\nDocument: x\nStatus: 0x0\n\nJob Id: 4294967295\nTotal Pages: 99999999999\n";
        let jobs = parse_jobs(output, "P", Utc::now());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, u32::MAX);
        assert_eq!(jobs[0].total_pages, u32::MAX);
    }

    #[test]
    fn enumjobs_document_may_contain_colons() {
        let output = "Job Id: 3\nDocument: C:\\Users\\alice\\report.pdf\n";
        let jobs = parse_jobs(output, "HP-1", Utc::now());
        assert_eq!(jobs[0].document_name, "C:\\Users\\alice\\report.pdf");
    }

    const SHARE_LIST: &str = "\
\tSharename       Type      Comment
\t---------       ----      -------
\tIPC$            IPC       IPC Service (Samba 4.19)
\tprint$          Disk      Printer Drivers
\tHP-1            Printer   HP LaserJet 4250
\tCanon Colour    Printer   Canon iR-ADV C5535
\tscans           Disk
SMB1 disabled -- no workgroup available
";

    #[test]
    fn share_list_keeps_printers_only() {
        let printers = parse_share_list(SHARE_LIST, "printsrv");
        let names: Vec<_> = printers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["HP-1", "Canon Colour"]);
        assert_eq!(printers[1].uri, "smb://printsrv/Canon%20Colour");
    }

    #[test]
    fn share_list_drops_print_dollar_even_if_typed_printer() {
        let output = "\tprint$          Printer   Drivers\n\tLab    Printer\n";
        let printers = parse_share_list(output, "h");
        assert_eq!(printers, vec![Printer::new("Lab", "smb://h/Lab")]);
    }

    #[test]
    fn columns_split_on_wide_gaps_only() {
        assert_eq!(
            split_columns("  Canon Colour    Printer   Canon iR-ADV"),
            vec!["Canon Colour", "Printer", "Canon iR-ADV"]
        );
        assert_eq!(split_columns("a\tb"), vec!["a", "b"]);
        assert!(split_columns("   ").is_empty());
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("0x10"), Some(0x10));
        assert_eq!(parse_hex("0X1f (printing)"), Some(0x1f));
        assert_eq!(parse_hex("16"), None);
        assert_eq!(parse_hex("0x"), None);
    }
}
