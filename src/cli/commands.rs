//! CLI command implementations
//!
//! Each command runs one table operation and prints one JSON object per
//! line. Keys and values are shown as UTF-8 (lossy).

use std::io::Write;

use serde_json::{json, Map, Value};

use super::args::{Cli, Command};
use super::errors::CliResult;
use crate::mvcc::ReadPointer;
use crate::observability::{Logger, Severity};
use crate::table::{decode_counter, ColumnValues, HandleConfig, Table, TableHandle};

/// Builds the handle described by the global options.
pub fn open_handle(cli: &Cli) -> CliResult<TableHandle> {
    let config = match &cli.config {
        Some(path) => HandleConfig::load(path)?,
        None => HandleConfig::log(&cli.data_dir),
    };
    Ok(TableHandle::new(config)?)
}

/// Parse, open, execute, print.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if cli.verbose {
        Logger::set_min_severity(Severity::Info);
    }
    let handle = open_handle(&cli)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_command(&handle, &cli.table, &cli.command, &mut out)
}

/// Runs `command` against table `table` of `handle`.
pub fn run_command(
    handle: &TableHandle,
    table: &str,
    command: &Command,
    out: &mut impl Write,
) -> CliResult<()> {
    let table = handle.get_table(table)?;
    let response = execute(&table, command)?;
    writeln!(out, "{}", serde_json::to_string(&response)?)?;
    Ok(())
}

fn execute(table: &Table, command: &Command) -> CliResult<Value> {
    let response = match command {
        Command::Put {
            row,
            column,
            value,
            version,
        } => {
            table.put(row.as_bytes(), &[column.as_bytes()], *version, &[value.as_bytes()])?;
            json!({ "ok": true, "row": row, "column": column, "version": version })
        }

        Command::Get {
            row,
            column,
            max,
            counter,
        } => {
            let found = table.get_with_version(row.as_bytes(), column.as_bytes(), &read_at(*max))?;
            match found {
                Some((value, version)) => {
                    let value = if *counter {
                        json!(decode_counter(&value)?)
                    } else {
                        json!(text(&value))
                    };
                    json!({ "found": true, "value": value, "version": version })
                }
                None => json!({ "found": false }),
            }
        }

        Command::Row { row, max } => {
            let columns = table.get_row(row.as_bytes(), &read_at(*max))?;
            json!({ "row": row, "columns": columns_json(&columns) })
        }

        Command::Delete {
            row,
            columns,
            version,
        } => {
            table.delete(row.as_bytes(), columns, *version)?;
            json!({ "ok": true, "deleted": columns.len(), "version": version })
        }

        Command::DeleteAll {
            row,
            columns,
            version,
        } => {
            table.delete_all(row.as_bytes(), columns, *version)?;
            json!({ "ok": true, "deleted": columns.len(), "version": version })
        }

        Command::UndeleteAll {
            row,
            columns,
            version,
        } => {
            table.undelete_all(row.as_bytes(), columns, *version)?;
            json!({ "ok": true, "undeleted": columns.len(), "version": version })
        }

        Command::Increment {
            row,
            column,
            amount,
            version,
            max,
        } => {
            let rp = read_for_write(*max, *version);
            let total = table.increment(row.as_bytes(), column.as_bytes(), *amount, &rp, *version)?;
            json!({ "row": row, "column": column, "value": total, "version": version })
        }

        Command::Cas {
            row,
            column,
            expected,
            new_value,
            version,
            max,
        } => {
            let rp = read_for_write(*max, *version);
            let swapped = table.compare_and_swap(
                row.as_bytes(),
                column.as_bytes(),
                expected.as_deref().map(str::as_bytes),
                new_value.as_deref().map(str::as_bytes),
                &rp,
                *version,
            )?;
            json!({ "swapped": swapped })
        }

        Command::Keys { limit, offset, max } => {
            let keys = table.get_keys(*limit, *offset, &read_at(*max))?;
            let keys: Vec<String> = keys.iter().map(|k| text(k)).collect();
            json!({ "keys": keys })
        }
    };
    Ok(response)
}

fn read_at(max: Option<u64>) -> ReadPointer {
    max.map_or_else(ReadPointer::max, ReadPointer::from_max)
}

/// Read-modify-write sees everything up to `max` plus its own write.
fn read_for_write(max: Option<u64>, write_version: u64) -> ReadPointer {
    match max {
        Some(max) => ReadPointer::full(max, write_version, std::iter::empty()),
        None => ReadPointer::max(),
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn columns_json(columns: &ColumnValues) -> Value {
    let map: Map<String, Value> = columns
        .iter()
        .map(|(column, value)| (text(column), Value::String(text(value))))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(handle: &TableHandle, command: Command) -> Value {
        let mut out = Vec::new();
        run_command(handle, "t", &command, &mut out).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.ends_with('\n'));
        serde_json::from_str(line.trim_end()).unwrap()
    }

    #[test]
    fn test_put_get_row() {
        let handle = TableHandle::memory();
        run(
            &handle,
            Command::Put {
                row: "r".into(),
                column: "c".into(),
                value: "v".into(),
                version: 2,
            },
        );

        let got = run(
            &handle,
            Command::Get {
                row: "r".into(),
                column: "c".into(),
                max: None,
                counter: false,
            },
        );
        assert_eq!(got, json!({ "found": true, "value": "v", "version": 2 }));

        let older = run(
            &handle,
            Command::Get {
                row: "r".into(),
                column: "c".into(),
                max: Some(1),
                counter: false,
            },
        );
        assert_eq!(older, json!({ "found": false }));

        let row = run(&handle, Command::Row { row: "r".into(), max: None });
        assert_eq!(row["columns"], json!({ "c": "v" }));
    }

    #[test]
    fn test_increment_and_counter_get() {
        let handle = TableHandle::memory();
        for version in 1..=3 {
            run(
                &handle,
                Command::Increment {
                    row: "r".into(),
                    column: "n".into(),
                    amount: 2,
                    version,
                    max: None,
                },
            );
        }
        let got = run(
            &handle,
            Command::Get {
                row: "r".into(),
                column: "n".into(),
                max: None,
                counter: true,
            },
        );
        assert_eq!(got["value"], 6);
    }

    #[test]
    fn test_cas_and_keys() {
        let handle = TableHandle::memory();
        let cas = |expected: Option<&str>, version| Command::Cas {
            row: "r".into(),
            column: "c".into(),
            expected: expected.map(String::from),
            new_value: Some("x".into()),
            version,
            max: None,
        };

        assert_eq!(run(&handle, cas(None, 1))["swapped"], true);
        assert_eq!(run(&handle, cas(None, 2))["swapped"], false);
        assert_eq!(run(&handle, cas(Some("x"), 3))["swapped"], true);

        let keys = run(&handle, Command::Keys { limit: 10, offset: 0, max: None });
        assert_eq!(keys, json!({ "keys": ["r"] }));
    }

    #[test]
    fn test_invalid_counter_is_error() {
        let handle = TableHandle::memory();
        run(
            &handle,
            Command::Put {
                row: "r".into(),
                column: "c".into(),
                value: "text".into(),
                version: 1,
            },
        );
        let mut out = Vec::new();
        let err = run_command(
            &handle,
            "t",
            &Command::Get {
                row: "r".into(),
                column: "c".into(),
                max: None,
                counter: true,
            },
            &mut out,
        )
        .unwrap_err();
        assert_eq!(err.code(), "OVC_INVALID_ARGUMENT");
        assert!(out.is_empty());
    }
}
