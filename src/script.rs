//! Line-oriented command scripts.
//!
//! ```text
//! CD /
//! CR /f1 10
//! CP /f1 /f2
//! MV /f2 /d1/f2
//! DL /f1
//! DD /d1
//! LL
//! ```
//! One command per line, whitespace separated. Blank lines and lines starting with `#` are
//! skipped.

use super::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("{cmd} expects {expected} argument(s), got {got}")]
    Arity {
        cmd: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid size {0:?}")]
    BadSize(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// CR
    CreateFile { path: String, size: usize },
    /// CP
    CopyFile { src: String, dst: String },
    /// DL
    RemoveFile { path: String },
    /// MV
    MoveFile { src: String, dst: String },
    /// LL
    List,
    /// CD
    CreateDir { path: String },
    /// DD
    RemoveDir { path: String },
}

fn arity(cmd: &'static str, args: &[&str], expected: usize) -> std::result::Result<(), ScriptError> {
    if args.len() != expected {
        return Err(ScriptError::Arity {
            cmd,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

impl Command {
    /// Parses one script line. `Ok(None)` for blank and comment lines.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, ScriptError> {
        let mut tokens = line.split_whitespace();
        let Some(cmd) = tokens.next() else {
            return Ok(None);
        };
        if cmd.starts_with('#') {
            return Ok(None);
        }
        let args: Vec<&str> = tokens.collect();
        let command = match cmd {
            "CR" => {
                arity("CR", &args, 2)?;
                let size = args[1]
                    .parse()
                    .map_err(|_| ScriptError::BadSize(args[1].to_string()))?;
                Command::CreateFile {
                    path: args[0].to_string(),
                    size,
                }
            }
            "CP" => {
                arity("CP", &args, 2)?;
                Command::CopyFile {
                    src: args[0].to_string(),
                    dst: args[1].to_string(),
                }
            }
            "DL" => {
                arity("DL", &args, 1)?;
                Command::RemoveFile {
                    path: args[0].to_string(),
                }
            }
            "MV" => {
                arity("MV", &args, 2)?;
                Command::MoveFile {
                    src: args[0].to_string(),
                    dst: args[1].to_string(),
                }
            }
            "LL" => {
                arity("LL", &args, 0)?;
                Command::List
            }
            "CD" => {
                arity("CD", &args, 1)?;
                Command::CreateDir {
                    path: args[0].to_string(),
                }
            }
            "DD" => {
                arity("DD", &args, 1)?;
                Command::RemoveDir {
                    path: args[0].to_string(),
                }
            }
            other => return Err(ScriptError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }

    /// Commands that claim a new inode.
    pub fn needs_inode(&self) -> bool {
        matches!(
            self,
            Command::CreateFile { .. } | Command::CopyFile { .. } | Command::CreateDir { .. }
        )
    }

    pub fn is_root_bootstrap(&self) -> bool {
        matches!(self, Command::CreateDir { path } if path::split(path).is_ok_and(|c| c.is_empty()))
    }

    /// Applies the command. Only `LL` produces a listing.
    pub fn run(&self, fs: &mut FileSystem) -> Result<Option<Vec<Listing>>> {
        match self {
            Command::CreateFile { path, size } => fs.create_file(path, *size).map(|_| None),
            Command::CopyFile { src, dst } => fs.copy_file(src, dst).map(|_| None),
            Command::RemoveFile { path } => fs.remove_file(path).map(|_| None),
            Command::MoveFile { src, dst } => fs.move_file(src, dst).map(|_| None),
            Command::List => Ok(Some(fs.list_files())),
            Command::CreateDir { path } => fs.create_directory(path).map(|_| None),
            Command::RemoveDir { path } => fs.remove_directory(path).map(|_| None),
        }
    }

    /// Runs the command the way the driver does: commands that claim an inode fail with
    /// `NoFreeInode` up front when the table is full, and with `verify` every mutating
    /// command is followed by a full `check`.
    pub fn execute(&self, fs: &mut FileSystem, verify: bool) -> Result<Option<Vec<Listing>>> {
        if self.needs_inode() && !fs.has_free_inode() {
            return Err(FsError::NoFreeInode);
        }
        let listing = self.run(fs)?;
        if verify && !matches!(self, Command::List) {
            fs.check()?;
        }
        Ok(listing)
    }
}

/// Parses a whole script into `(line number, command)` pairs, one-based, skipping blanks.
pub fn parse_script(
    text: &str,
) -> impl Iterator<Item = (usize, std::result::Result<Command, ScriptError>)> + '_ {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| Command::parse(line).transpose().map(|cmd| (i + 1, cmd)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        assert_eq!(
            Command::parse("CR /d1/f1 10").unwrap(),
            Some(Command::CreateFile {
                path: "/d1/f1".to_string(),
                size: 10
            })
        );
        assert_eq!(
            Command::parse("  CP /a   /b ").unwrap(),
            Some(Command::CopyFile {
                src: "/a".to_string(),
                dst: "/b".to_string()
            })
        );
        assert_eq!(
            Command::parse("DL /a").unwrap(),
            Some(Command::RemoveFile {
                path: "/a".to_string()
            })
        );
        assert_eq!(
            Command::parse("MV /a /d/a").unwrap(),
            Some(Command::MoveFile {
                src: "/a".to_string(),
                dst: "/d/a".to_string()
            })
        );
        assert_eq!(Command::parse("LL").unwrap(), Some(Command::List));
        assert_eq!(
            Command::parse("CD /d").unwrap(),
            Some(Command::CreateDir {
                path: "/d".to_string()
            })
        );
        assert_eq!(
            Command::parse("DD /d").unwrap(),
            Some(Command::RemoveDir {
                path: "/d".to_string()
            })
        );
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   \t").unwrap(), None);
        assert_eq!(Command::parse("# CR /x 1").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            Command::parse("RM /a"),
            Err(ScriptError::UnknownCommand("RM".to_string()))
        );
        assert_eq!(
            Command::parse("CR /a"),
            Err(ScriptError::Arity {
                cmd: "CR",
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            Command::parse("CR /a ten"),
            Err(ScriptError::BadSize("ten".to_string()))
        );
        assert!(Command::parse("CR /a -1").is_err());
        assert!(Command::parse("LL extra").is_err());
    }

    #[test]
    fn script_keeps_line_numbers() {
        let text = "CD /\n\nCR /f1 10\nXX\nLL\n";
        let parsed: Vec<_> = parse_script(text).collect();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0].0, 1);
        assert_eq!(parsed[1].0, 3);
        assert_eq!(parsed[2].0, 4);
        assert!(parsed[2].1.is_err());
        assert_eq!(parsed[3], (5, Ok(Command::List)));
    }

    #[test]
    fn classifies_commands() {
        let root = Command::parse("CD /").unwrap().unwrap();
        let dir = Command::parse("CD /d").unwrap().unwrap();
        assert!(root.is_root_bootstrap());
        assert!(!dir.is_root_bootstrap());
        assert!(dir.needs_inode());
        assert!(!Command::List.needs_inode());
    }

    #[test]
    fn runs_against_a_filesystem() {
        let mut fs = FileSystem::new();
        for (_, cmd) in parse_script("CD /\nCR /f1 10\nCD /d1\nCR /d1/f2 5") {
            assert_eq!(cmd.unwrap().run(&mut fs).unwrap(), None);
        }
        let listing = Command::List.run(&mut fs).unwrap().unwrap();
        let names: Vec<_> = listing.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["/", "f1", "d1", "f2"]);
        assert_eq!(listing[0].size, 15);
    }
}
