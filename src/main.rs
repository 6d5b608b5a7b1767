use simdisk::script::parse_script;
use simdisk::{FileSystem, FsError};

use clap::{value_parser, Arg, ArgAction, Command as Cli};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Cli {
    Cli::new("simdisk")
        .about("Runs a command script against a simulated 128 KiB disk and writes its image")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("script")
                .help("command script, one command per line")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("where the disk image is written")
                .default_value("my_fs.txt")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("stop at the first failing command")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verify")
                .long("verify")
                .help("check every invariant of the disk after each command")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = cli().get_matches();
    let (Some(script_path), Some(output)) = (
        matches.get_one::<PathBuf>("script"),
        matches.get_one::<PathBuf>("output"),
    ) else {
        error!("missing script or output path");
        return ExitCode::FAILURE;
    };
    let strict = matches.get_flag("strict");
    let verify = matches.get_flag("verify");

    let script = match std::fs::read_to_string(script_path) {
        Ok(script) => script,
        Err(e) => {
            error!("cannot read {}: {}", script_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut fs = FileSystem::new();
    if let Err(e) = fs.create_directory("/") {
        error!("cannot initialise root: {}", e);
        return ExitCode::FAILURE;
    }

    let mut failures = 0;
    for (line, parsed) in parse_script(&script) {
        let cmd = match parsed {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("line {}: {}", line, e);
                failures += 1;
                if strict {
                    break;
                }
                continue;
            }
        };
        if cmd.is_root_bootstrap() {
            warn!("line {}: root already initialised, skipping", line);
            continue;
        }
        match cmd.execute(&mut fs, verify) {
            Ok(Some(listing)) => {
                for entry in listing {
                    println!("{}", entry);
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("line {}: {:?} failed: {}", line, cmd, e);
                failures += 1;
                if strict || matches!(e, FsError::InconsistentTree(_)) {
                    break;
                }
            }
        }
    }

    if let Err(e) = fs.save(output) {
        error!("cannot write image: {}", e);
        return ExitCode::FAILURE;
    }
    if failures > 0 {
        info!("{} command(s) failed", failures);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
