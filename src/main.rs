use std::path::Path;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use afg_editor::config::load_editor_config;
use afg_editor::sanity::{collect_into, Finding, Severity};
use afg_editor::{EditorConfig, EditorDocument};

#[derive(serde::Serialize)]
struct FileReport {
    file: String,
    severity: Severity,
    findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<Vec<String>>,
}

fn check_file(path: &Path, config: &EditorConfig, infer: bool) -> FileReport {
    let mut document = EditorDocument::new(config);
    let mut findings: Vec<Finding> = Vec::new();
    let severity = {
        let mut sink = collect_into(&mut findings);
        let severity = document.open(path, &config.catalog, &mut sink);
        // a file that could not be read has nothing left to check
        if path.is_file() {
            severity.max(document.sanity_check_all(config, &mut sink))
        } else {
            severity
        }
    };

    let steps = (infer && document.solution.is_initialized())
        .then(|| document.solution.steps().iter().map(|s| s.to_string()).collect());
    FileReport {
        file: path.display().to_string(),
        severity,
        findings,
        steps,
    }
}

fn print_report(report: &FileReport) {
    println!("{}: {}", report.file, report.severity);
    for finding in &report.findings {
        println!("  [{}] {}", finding.severity, finding.message);
    }
    if let Some(steps) = &report.steps {
        println!("  steps:");
        for (i, step) in steps.iter().enumerate() {
            println!("    {:>3} {}", i, step);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let infer = args.iter().any(|a| a == "--infer");
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    if files.is_empty() || args.iter().any(|a| a == "--help") {
        eprintln!("usage: afg_editor [--json] [--infer] <file.afg>...");
        std::process::exit(2);
    }

    // installs the global subscriber; [Config] and [Level] messages go to stderr
    App::new().add_plugins(LogPlugin::default());

    let config = load_editor_config();
    let reports: Vec<FileReport> = files
        .iter()
        .map(|file| check_file(Path::new(file.as_str()), &config, infer))
        .collect();

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("[afg_editor] Failed to serialize report: {}", e);
                std::process::exit(2);
            }
        }
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if reports.iter().any(|r| r.severity == Severity::Error) {
        std::process::exit(1);
    }
}
