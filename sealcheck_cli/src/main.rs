/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use clap::{Parser, Subcommand};
use sealcheck_core::{CheckReport, OsFileProvider, check_files};
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser)]
#[command(
    name = "sealcheck",
    version,
    about = "Checks switch-on-type statements for unhandled implementors"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze source files and report missing switch cases
    Check {
        /// Source files forming one compilation unit
        files: Vec<PathBuf>,
        /// Print findings as a JSON array instead of rendered diagnostics
        #[arg(long)]
        json: bool,
    },
    /// Insert a placeholder case for every missing type
    Fix {
        /// Source files forming one compilation unit
        files: Vec<PathBuf>,
        /// Rewrite the files in place instead of printing the result
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check { files, json } => check(&files, json),
        Command::Fix { files, write } => fix(&files, write),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            exit(2);
        }
    }
}

fn run_analysis(files: &[PathBuf]) -> Result<CheckReport, Box<dyn std::error::Error>> {
    if files.is_empty() {
        return Err("no input files".into());
    }
    let roots: Vec<&str> = files
        .iter()
        .map(|p| p.to_str().ok_or("non-utf8 path"))
        .collect::<Result<_, _>>()?;
    let provider = OsFileProvider::new(PathBuf::new());

    match check_files(&roots, provider) {
        Ok(report) => Ok(report),
        Err(summary) => {
            summary.emit();
            Err("analysis aborted".into())
        }
    }
}

fn check(files: &[PathBuf], json: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let report = run_analysis(files)?;

    if json {
        let findings: Vec<serde_json::Value> = report
            .findings()
            .iter()
            .map(|finding| {
                let file_data = report.files().get(finding.file_id()).ok();
                serde_json::json!({
                    "id": "missing-case-coverage",
                    "severity": "warning",
                    "file": file_data.map(|f| f.name().to_string()),
                    "line": file_data.map(|f| f.line_number_for_index(finding.span().start)),
                    "marker": finding.marker(),
                    "missing": finding.missing(),
                    "message": finding.message(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        report.emit();
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}

fn fix(files: &[PathBuf], write: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let report = run_analysis(files)?;

    if report.is_clean() {
        println!("nothing to fix");
        return Ok(0);
    }

    for (file_id, fixed_source) in report.apply_fixes() {
        let file_data = report.files().get(file_id)?;
        if write {
            std::fs::write(&file_data.path, &fixed_source)?;
            println!("fixed {}", file_data.name());
        } else {
            print!("{fixed_source}");
        }
    }

    Ok(0)
}
