use std::io::{self, Write};

use transh_core::{print_size, ItemFailure, TrashedFile, DELETION_DATE_FORMAT};

const HEADERS: [&str; 7] = ["#", "held name", "size", "deleted at", "operator", "origin", "held at"];

/// Plain-text table of held files with a totals footer.
pub fn write_listing(out: &mut impl Write, entries: &[TrashedFile]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "trash is empty");
    }

    let rows: Vec<[String; 7]> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            [
                (idx + 1).to_string(),
                entry.held_name(),
                print_size(entry.file_size),
                entry.deletion_date.format(DELETION_DATE_FORMAT).to_string(),
                entry.operator.username.clone(),
                entry.origin_path.display().to_string(),
                entry.target_path.display().to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(out, &HEADERS.map(str::to_string), &widths)?;
    writeln!(out, "{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)))?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }

    let total: u64 = entries.iter().map(|entry| entry.file_size).sum();
    writeln!(out, "{} file(s), {} total", entries.len(), print_size(total))
}

fn write_row(out: &mut impl Write, cells: &[String; 7], widths: &[usize; 7]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}

/// One line per failed item, for stderr.
pub fn write_failures(out: &mut impl Write, failures: &[ItemFailure]) -> io::Result<()> {
    for failure in failures {
        writeln!(out, "transh: {}: {}", failure.item, failure.error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use transh_core::helpers::parse_deletion_date;
    use transh_core::{CoreError, Operator, RecordState};

    fn entry(held: &str, size: u64) -> TrashedFile {
        TrashedFile {
            file_name: "f".to_string(),
            origin_path: PathBuf::from("/home/me/f"),
            target_path: PathBuf::from("/t/fileInfos").join(held),
            operator: Operator {
                username: "me".to_string(),
                uid: "1000".to_string(),
            },
            file_size: size,
            deletion_date: parse_deletion_date("2025-08-29 17:35:30").expect("valid date"),
            state: RecordState::Held,
        }
    }

    #[test]
    fn empty_listing_says_so() {
        let mut out = Vec::new();
        write_listing(&mut out, &[]).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "trash is empty\n");
    }

    #[test]
    fn listing_has_header_rows_and_footer() {
        let mut out = Vec::new();
        write_listing(&mut out, &[entry("f.1", 10), entry("f.2", 2048)]).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("#  held name"));
        assert!(lines[0].ends_with("held at"));
        assert!(lines[2].contains("f.1") && lines[2].contains("2025-08-29 17:35:30"));
        assert!(lines[2].ends_with("/t/fileInfos/f.1"));
        assert!(lines[3].contains("2.0 K"));
        assert_eq!(lines[4], "2 file(s), 2.0 K total");
    }

    #[test]
    fn failures_name_the_item() {
        let mut out = Vec::new();
        let failures = [ItemFailure {
            item: "ghost".to_string(),
            error: CoreError::NotInTrash("ghost".to_string()),
        }];
        write_failures(&mut out, &failures).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "transh: ghost: ghost is not in the trash\n");
    }
}
