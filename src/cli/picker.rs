//! Resolving which price CSV to load, with an interactive fallback.
//!
//! Order: `-f`/`METALS_CSV`, then `metals.csv` in the working directory, then
//! a numbered list of `*.csv` files found below the working directory.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;

/// File used when no path is given.
pub const DEFAULT_DATA_FILE: &str = "metals.csv";

const SEARCH_DEPTH: usize = 4;
const SKIPPED_DIRS: [&str; 3] = [".git", "target", "node_modules"];

/// Decide which CSV to load.
///
/// Explicit paths are returned untouched so that a missing file surfaces as a
/// load error.
pub fn resolve_data_path(explicit: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let default = Path::new(DEFAULT_DATA_FILE);
    if default.is_file() {
        debug!(path = DEFAULT_DATA_FILE, "using default data file");
        return Ok(default.to_path_buf());
    }

    let candidates = csv_files_under(Path::new("."), SEARCH_DEPTH);
    if candidates.is_empty() {
        return Err(AppError::new(
            2,
            format!("No {DEFAULT_DATA_FILE} here and no other .csv files found. Pass one with `metals -f <prices.csv>`."),
        ));
    }

    let stdin = io::stdin();
    pick_interactively(&candidates, &mut stdin.lock(), &mut io::stdout())
}

/// What the user typed at the picker prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Listed(usize),
    Typed(PathBuf),
    Quit,
}

fn parse_selection(input: &str, listed: usize) -> Result<Selection, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Enter a number or a path.".to_string());
    }
    if input.eq_ignore_ascii_case("q") {
        return Ok(Selection::Quit);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=listed).contains(&n) => Ok(Selection::Listed(n - 1)),
        Ok(n) => Err(format!("No file numbered {n}; choose 1-{listed}.")),
        Err(_) => Ok(Selection::Typed(PathBuf::from(input))),
    }
}

fn pick_interactively(
    candidates: &[PathBuf],
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::new(2, format!("Picker I/O failed: {e}"));

    writeln!(out, "No {DEFAULT_DATA_FILE} in the working directory. CSV files found:").map_err(io_err)?;
    for (i, path) in candidates.iter().enumerate() {
        writeln!(out, "  [{}] {}", i + 1, display_relative(path)).map_err(io_err)?;
    }

    loop {
        write!(out, "File number or path (q quits): ").map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::new(2, "No file chosen (end of input)."));
        }

        let chosen = match parse_selection(&line, candidates.len()) {
            Ok(Selection::Quit) => return Err(AppError::new(2, "Canceled.")),
            Ok(Selection::Listed(i)) => candidates[i].clone(),
            Ok(Selection::Typed(path)) => path,
            Err(msg) => {
                writeln!(out, "{msg}").map_err(io_err)?;
                continue;
            }
        };

        match check_csv_file(&chosen) {
            Ok(()) => return Ok(chosen),
            Err(msg) => writeln!(out, "{msg}").map_err(io_err)?,
        }
    }
}

/// A readable file with a `.csv` extension.
fn check_csv_file(path: &Path) -> Result<(), String> {
    if path.is_dir() {
        return Err(format!("{} is a directory.", path.display()));
    }
    if !path.is_file() {
        return Err(format!("{} does not exist.", path.display()));
    }
    if !is_csv(path) {
        return Err(format!("{} is not a .csv file.", path.display()));
    }
    Ok(())
}

/// `*.csv` files under `root`, at most `max_depth` directories down, sorted.
fn csv_files_under(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => {
                    let skipped = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| SKIPPED_DIRS.contains(&n));
                    if depth < max_depth && !skipped {
                        pending.push((path, depth + 1));
                    }
                }
                Ok(ft) if ft.is_file() && is_csv(&path) => found.push(path),
                _ => {}
            }
        }
    }

    found.sort_by_key(|p| display_relative(p));
    found
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn display_relative(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_passed_through_even_if_missing() {
        let path = Path::new("no/such/prices.csv");
        assert_eq!(resolve_data_path(Some(path)).unwrap(), path.to_path_buf());
    }

    #[test]
    fn selections_parse_numbers_paths_and_quit() {
        assert_eq!(parse_selection(" 2\n", 3), Ok(Selection::Listed(1)));
        assert_eq!(parse_selection("Q", 3), Ok(Selection::Quit));
        assert_eq!(
            parse_selection("data/prices.csv", 3),
            Ok(Selection::Typed(PathBuf::from("data/prices.csv")))
        );
        assert!(parse_selection("4", 3).is_err());
        assert!(parse_selection("   ", 3).is_err());
    }

    #[test]
    fn finds_csv_files_and_skips_build_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "Date,Gold\n").unwrap();
        fs::write(dir.path().join("a.CSV"), "Date,Gold\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target").join("c.csv"), "").unwrap();
        fs::create_dir_all(dir.path().join("data").join("deep")).unwrap();
        fs::write(dir.path().join("data").join("d.csv"), "").unwrap();
        fs::write(dir.path().join("data").join("deep").join("e.csv"), "").unwrap();

        let names = |depth| -> Vec<String> {
            csv_files_under(dir.path(), depth)
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };
        assert_eq!(names(1), vec!["a.CSV", "b.csv", "d.csv"]);
        assert_eq!(names(2), vec!["a.CSV", "b.csv", "d.csv", "e.csv"]);
    }

    #[test]
    fn picker_reprompts_until_a_valid_choice() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("gold.csv");
        fs::write(&good, "Date,Gold\n").unwrap();
        let candidates = vec![good.clone()];

        let mut input = io::Cursor::new("7\nmissing.csv\n1\n");
        let mut out = Vec::new();
        let chosen = pick_interactively(&candidates, &mut input, &mut out).unwrap();
        assert_eq!(chosen, good);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("No file numbered 7"));
        assert!(printed.contains("missing.csv does not exist."));
    }

    #[test]
    fn picker_stops_on_quit_or_eof() {
        let candidates = vec![PathBuf::from("a.csv")];
        let mut out = Vec::new();
        assert!(pick_interactively(&candidates, &mut io::Cursor::new("q\n"), &mut out).is_err());
        assert!(pick_interactively(&candidates, &mut io::Cursor::new(""), &mut out).is_err());
    }
}
