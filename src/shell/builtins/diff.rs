use std::fs::File;
use std::io::{BufReader, Read};

use log::debug;

use crate::shell::builtins::prelude::*;

/// Compares two files byte for byte, printing `0` when they are identical
/// and `1` otherwise.
pub struct Diff;

impl BuiltinCommand for Diff {
    const BUILTIN: Builtin = Builtin::Diff;

    fn run(_shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        let (first, second) = match args {
            [first, second] => (first, second),
            _ => return Err(Self::failure("expected 2 arguments").into()),
        };

        let open = |path: &String| {
            File::open(path).map_err(|e| {
                debug!("cannot open {}: {}", path, e);
                Error::from(Self::failure("expected valid paths for files"))
            })
        };
        let (first, second) = (open(first)?, open(second)?);
        if first.metadata()?.is_dir() || second.metadata()?.is_dir() {
            return Err(Self::failure("paths are not files").into());
        }

        if same_contents(first, second) {
            writeln!(stdout, "0")?;
            Ok(CommandResult::Success)
        } else {
            writeln!(stdout, "1")?;
            Ok(CommandResult::Failure)
        }
    }
}

/// Read errors count as a difference.
fn same_contents(first: File, second: File) -> bool {
    let mut first = BufReader::new(first).bytes();
    let mut second = BufReader::new(second).bytes();
    loop {
        match (first.next(), second.next()) {
            (None, None) => return true,
            (Some(Ok(a)), Some(Ok(b))) if a == b => {}
            (Some(Err(e)), _) | (_, Some(Err(e))) => {
                debug!("read failed while comparing: {}", e);
                return false;
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ShellConfig;
    use std::fs;
    use std::path::Path;
    use tempdir::TempDir;

    fn diff<P: AsRef<Path>>(args: &[P]) -> (Result<CommandResult>, String) {
        let mut shell = Shell::new(ShellConfig::noninteractive());
        let args: Vec<String> = args
            .iter()
            .map(|p| p.as_ref().display().to_string())
            .collect();
        let mut out = Vec::new();
        let result = Diff::run(&mut shell, &args, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn error_message(result: Result<CommandResult>) -> String {
        match result {
            Ok(r) => panic!("expected an error, got {:?}", r),
            Err(e) => e.chained_message(),
        }
    }

    #[test]
    fn test_identical_files() {
        let dir = TempDir::new("smash-diff").unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "hello\nworld\n").unwrap();
        fs::write(&b, "hello\nworld\n").unwrap();

        let (result, output) = diff(&[&a, &b]);
        assert_eq!(result.unwrap(), CommandResult::Success);
        assert_eq!(output, "0\n");
    }

    #[test]
    fn test_different_files() {
        let dir = TempDir::new("smash-diff").unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        fs::write(&a, "hello\n").unwrap();
        fs::write(&b, "hellO\n").unwrap();
        fs::write(&c, "hello\nmore").unwrap();

        let (result, output) = diff(&[&a, &b]);
        assert_eq!(result.unwrap(), CommandResult::Failure);
        assert_eq!(output, "1\n");

        // a prefix is not equal
        let (result, output) = diff(&[&a, &c]);
        assert_eq!(result.unwrap(), CommandResult::Failure);
        assert_eq!(output, "1\n");
    }

    #[test]
    fn test_empty_files_are_equal() {
        let dir = TempDir::new("smash-diff").unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let (result, output) = diff(&[&a, &b]);
        assert_eq!(result.unwrap(), CommandResult::Success);
        assert_eq!(output, "0\n");
    }

    #[test]
    fn test_wrong_number_of_arguments() {
        let (result, output) = diff(&["a"]);
        assert_eq!(error_message(result), "diff: expected 2 arguments");
        assert_eq!(output, "");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new("smash-diff").unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "x").unwrap();

        let (result, output) = diff(&[a.clone(), dir.path().join("missing")]);
        assert_eq!(error_message(result), "diff: expected valid paths for files");
        assert_eq!(output, "");
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new("smash-diff").unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "x").unwrap();

        let (result, output) = diff(&[a.as_path(), dir.path()]);
        assert_eq!(error_message(result), "diff: paths are not files");
        assert_eq!(output, "");
    }
}
