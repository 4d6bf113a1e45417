use anyhow::{bail, Context, Result};
use plumage::validation::{
    BlendValidationEvent, BlendValidationSeverity, BlendValidator, JsonAssetKind,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("blend_check: {err:#}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args)? {
        Command::Audit(options) => options,
        Command::ShowHelp => {
            print_usage();
            return Ok(0);
        }
    };
    let documents = gather_documents(&options.inputs)?;
    if documents.is_empty() {
        bail!("no JSON documents under the given paths");
    }
    let reports: Vec<DocumentReport> = documents.into_iter().map(audit_document).collect();
    let dangling = cross_reference(&reports);
    let totals = tally(&reports, &dangling);
    if options.json_report {
        print_json_report(&reports, &dangling, &totals);
    } else {
        print_text_report(&reports, &dangling, &totals);
    }
    let failed = totals.errors > 0 || (options.fail_on_warn && totals.warnings > 0);
    Ok(if failed { 2 } else { 0 })
}

enum Command {
    Audit(AuditOptions),
    ShowHelp,
}

struct AuditOptions {
    inputs: Vec<PathBuf>,
    fail_on_warn: bool,
    json_report: bool,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut fail_on_warn = false;
    let mut json_report = false;
    let mut inputs = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::ShowHelp),
            "--fail-on-warn" => fail_on_warn = true,
            "--json" => json_report = true,
            flag if flag.starts_with('-') => bail!("unrecognized option '{flag}'"),
            path => inputs.push(PathBuf::from(path)),
        }
    }
    if inputs.is_empty() {
        bail!("no input paths (see --help)");
    }
    Ok(Command::Audit(AuditOptions { inputs, fail_on_warn, json_report }))
}

fn print_usage() {
    eprintln!(
        "blend_check: audit animation JSON documents

Usage:
  blend_check [--fail-on-warn] [--json] <path>...

Paths may be files or directories; directories are searched recursively for
.json documents. Clips, skeletons and blend spaces are validated, and blend
space samples are checked against the clips found in the same run (runs
without any clip documents skip that check). --json replaces the text output
with a single machine-readable report. --fail-on-warn exits 2 on warnings as
well as errors.
"
    );
}

/// Every distinct .json file reachable from `inputs`, in sorted order.
fn gather_documents(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for input in inputs {
        if input.is_dir() {
            let mut pending = vec![input.clone()];
            while let Some(dir) = pending.pop() {
                let entries = fs::read_dir(&dir)
                    .with_context(|| format!("failed to read directory '{}'", dir.display()))?;
                for entry in entries {
                    let path = entry?.path();
                    if path.is_dir() {
                        pending.push(path);
                    } else if is_json_document(&path) {
                        found.insert(path);
                    }
                }
            }
        } else if input.is_file() {
            if is_json_document(input) {
                found.insert(input.clone());
            } else {
                eprintln!("[blend_check] ignoring '{}': not a JSON document", input.display());
            }
        } else if input.exists() {
            bail!("path '{}' is neither a file nor a directory", input.display());
        } else {
            bail!("path '{}' does not exist", input.display());
        }
    }
    Ok(found.into_iter().collect())
}

fn is_json_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

struct DocumentReport {
    path: PathBuf,
    kind: JsonAssetKind,
    events: Vec<BlendValidationEvent>,
    provides: Vec<String>,
    references: Vec<String>,
}

fn audit_document(path: PathBuf) -> DocumentReport {
    let events = BlendValidator::validate_path(&path);
    let value = fs::read(&path).ok().and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
    let kind = match &value {
        Some(value) => BlendValidator::classify_document(&path, value),
        None => JsonAssetKind::Unknown,
    };
    let (provides, references) = match &value {
        Some(value) => document_clip_links(&path, kind, value),
        None => (Vec::new(), Vec::new()),
    };
    DocumentReport { path, kind, events, provides, references }
}

/// Clip keys a document supplies (clips answer to both their `name` field and
/// their file stem) or the keys its samples point at (blend spaces).
fn document_clip_links(path: &Path, kind: JsonAssetKind, value: &Value) -> (Vec<String>, Vec<String>) {
    match kind {
        JsonAssetKind::Clip => {
            let mut provides = Vec::new();
            if let Some(name) = value.get("name").and_then(Value::as_str) {
                provides.push(name.to_string());
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                provides.push(stem.to_string());
            }
            provides.dedup();
            (provides, Vec::new())
        }
        JsonAssetKind::Blend1d | JsonAssetKind::Blend2d => {
            let mut references = Vec::new();
            if let Some(samples) = value.get("samples").and_then(Value::as_array) {
                for sample in samples {
                    if let Some(clip) = sample.get("clip").and_then(Value::as_str) {
                        references.push(clip.to_string());
                    }
                }
            }
            (Vec::new(), references)
        }
        JsonAssetKind::Skeleton | JsonAssetKind::Unknown => (Vec::new(), Vec::new()),
    }
}

/// Blend-space references with no matching clip in the same run. Skipped
/// entirely when the run provided no clip keys, so auditing a lone blend
/// space does not flag every sample.
fn cross_reference(reports: &[DocumentReport]) -> Vec<(PathBuf, String)> {
    let provided: BTreeSet<&str> =
        reports.iter().flat_map(|report| report.provides.iter().map(String::as_str)).collect();
    if provided.is_empty() {
        return Vec::new();
    }
    let mut dangling = BTreeSet::new();
    for report in reports {
        for clip in &report.references {
            if !provided.contains(clip.as_str()) {
                dangling.insert((report.path.clone(), clip.clone()));
            }
        }
    }
    dangling.into_iter().collect()
}

#[derive(Default, Serialize)]
struct AuditTotals {
    documents: usize,
    clips: usize,
    skeletons: usize,
    blend_spaces: usize,
    warnings: usize,
    errors: usize,
}

fn tally(reports: &[DocumentReport], dangling: &[(PathBuf, String)]) -> AuditTotals {
    let mut totals = AuditTotals { documents: reports.len(), ..AuditTotals::default() };
    for report in reports {
        match report.kind {
            JsonAssetKind::Clip => totals.clips += 1,
            JsonAssetKind::Skeleton => totals.skeletons += 1,
            JsonAssetKind::Blend1d | JsonAssetKind::Blend2d => totals.blend_spaces += 1,
            JsonAssetKind::Unknown => {}
        }
        for event in &report.events {
            match event.severity {
                BlendValidationSeverity::Warning => totals.warnings += 1,
                BlendValidationSeverity::Error => totals.errors += 1,
                BlendValidationSeverity::Info => {}
            }
        }
    }
    totals.warnings += dangling.len();
    totals
}

fn kind_label(kind: JsonAssetKind) -> &'static str {
    match kind {
        JsonAssetKind::Clip => "clip",
        JsonAssetKind::Skeleton => "skeleton",
        JsonAssetKind::Blend1d => "blend_space_1d",
        JsonAssetKind::Blend2d => "blend_space_2d",
        JsonAssetKind::Unknown => "unknown",
    }
}

fn print_text_report(
    reports: &[DocumentReport],
    dangling: &[(PathBuf, String)],
    totals: &AuditTotals,
) {
    for report in reports {
        println!("{} [{}]", report.path.display(), kind_label(report.kind));
        for event in &report.events {
            println!("  {}: {}", event.severity, event.message);
        }
    }
    if !dangling.is_empty() {
        println!("unresolved clip references:");
        for (path, clip) in dangling {
            println!("  {} -> '{}'", path.display(), clip);
        }
    }
    println!(
        "audited {} documents ({} clips, {} skeletons, {} blend spaces): {} warnings, {} errors",
        totals.documents,
        totals.clips,
        totals.skeletons,
        totals.blend_spaces,
        totals.warnings,
        totals.errors
    );
}

fn print_json_report(
    reports: &[DocumentReport],
    dangling: &[(PathBuf, String)],
    totals: &AuditTotals,
) {
    let documents: Vec<Value> = reports
        .iter()
        .map(|report| {
            let events: Vec<Value> = report
                .events
                .iter()
                .map(|event| {
                    json!({
                        "severity": event.severity.to_string(),
                        "message": event.message,
                    })
                })
                .collect();
            json!({
                "path": report.path.display().to_string(),
                "kind": kind_label(report.kind),
                "events": events,
            })
        })
        .collect();
    let unresolved: Vec<Value> = dangling
        .iter()
        .map(|(path, clip)| {
            json!({
                "path": path.display().to_string(),
                "clip": clip,
            })
        })
        .collect();
    let report = json!({
        "documents": documents,
        "unresolved_references": unresolved,
        "totals": totals,
    });
    println!("{report:#}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args_separates_flags_from_inputs() {
        let args = vec!["--json".to_string(), "fixtures".to_string(), "extra.json".to_string()];
        let Command::Audit(options) = parse_args(&args).expect("parse args") else {
            panic!("expected an audit command");
        };
        assert!(options.json_report);
        assert!(!options.fail_on_warn);
        assert_eq!(options.inputs, vec![PathBuf::from("fixtures"), PathBuf::from("extra.json")]);
    }

    #[test]
    fn parse_args_help_short_circuits() {
        let args = vec!["--fail-on-warn".to_string(), "-h".to_string(), "fixtures".to_string()];
        assert!(matches!(parse_args(&args), Ok(Command::ShowHelp)));
    }

    #[test]
    fn parse_args_rejects_unknown_options_and_empty_runs() {
        assert!(parse_args(&["--verbose".to_string()]).is_err());
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn clip_documents_answer_to_name_and_stem() {
        let value = json!({ "name": "walk_loop", "frame_rate": 30, "tracks": [] });
        let (provides, references) =
            document_clip_links(Path::new("anims/walk.json"), JsonAssetKind::Clip, &value);
        assert_eq!(provides, vec!["walk_loop".to_string(), "walk".to_string()]);
        assert!(references.is_empty());
    }

    #[test]
    fn blend_documents_list_their_sample_references() {
        let value = json!({
            "samples": [
                { "clip": "walk", "position": 0.0 },
                { "position": 1.0 },
                { "clip": "run", "position": 2.0 }
            ]
        });
        let (provides, references) =
            document_clip_links(Path::new("blend/move.json"), JsonAssetKind::Blend1d, &value);
        assert!(provides.is_empty());
        assert_eq!(references, vec!["walk".to_string(), "run".to_string()]);
    }

    #[test]
    fn cross_reference_flags_clips_missing_from_the_run() {
        let reports = vec![
            report(JsonAssetKind::Clip, "clips/walk.json", vec!["walk"], vec![]),
            report(JsonAssetKind::Blend1d, "blend/move.json", vec![], vec!["walk", "sprint"]),
        ];
        let dangling = cross_reference(&reports);
        assert_eq!(dangling, vec![(PathBuf::from("blend/move.json"), "sprint".to_string())]);
    }

    #[test]
    fn cross_reference_skips_runs_without_clips() {
        let reports =
            vec![report(JsonAssetKind::Blend1d, "blend/move.json", vec![], vec!["walk"])];
        assert!(cross_reference(&reports).is_empty());
    }

    fn report(
        kind: JsonAssetKind,
        path: &str,
        provides: Vec<&str>,
        references: Vec<&str>,
    ) -> DocumentReport {
        DocumentReport {
            path: PathBuf::from(path),
            kind,
            events: Vec::new(),
            provides: provides.into_iter().map(str::to_string).collect(),
            references: references.into_iter().map(str::to_string).collect(),
        }
    }
}
