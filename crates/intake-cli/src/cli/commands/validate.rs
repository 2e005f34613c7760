use super::{exit_codes, read_input};
use crate::cli::args::ValidateArgs;
use intake_core::report::{console, markdown};
use intake_core::validate::{
    descriptor, resolve_envelope, validate_directory, validate_file, validate_record,
};
use serde_json::Value;
use std::path::Path;

const DEFAULT_SCHEMA_PATH: &str = "schemas/result-schema-v3.0.json";

pub async fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let schema = match load_schema(&args) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    if let Some(path) = &args.path {
        if path.is_dir() {
            return run_directory(path, &args, schema.as_ref());
        }
        let report = validate_file(path, schema.as_ref());
        print_single(&report, &args.format)?;
        return Ok(if report.valid {
            exit_codes::OK
        } else {
            exit_codes::INVALID
        });
    }

    let input = match read_input(&args.file, &args.env).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let envelope = resolve_envelope(&input);
    let report = validate_record(envelope, schema.as_ref());
    print_single(&report, &args.format)?;
    Ok(if report.valid {
        exit_codes::OK
    } else {
        exit_codes::INVALID
    })
}

fn run_directory(
    dir: &Path,
    args: &ValidateArgs,
    schema: Option<&Value>,
) -> anyhow::Result<i32> {
    let report = validate_directory(dir, &args.pattern, schema);
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        console::print_directory(&report);
    }
    if !report.success {
        if let Some(error) = &report.error {
            eprintln!("error: {}", error);
        }
        return Ok(exit_codes::CONFIG_ERROR);
    }
    Ok(if report.invalid_files == 0 {
        exit_codes::OK
    } else {
        exit_codes::INVALID
    })
}

fn print_single(
    report: &intake_core::validate::ValidationReport,
    format: &str,
) -> anyhow::Result<()> {
    if format == "json" {
        // The rendered comment rides along for thread posting.
        let mut out = serde_json::to_value(report)?;
        out["comment"] = Value::String(markdown::render_comment(&report.errors));
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        console::print_validation(report);
    }
    Ok(())
}

/// Resolve the schema descriptor: explicit path failures are configuration
/// errors; a missing default descriptor degrades to explicit-checks-only.
fn load_schema(args: &ValidateArgs) -> anyhow::Result<Option<Value>> {
    if args.no_schema {
        return Ok(None);
    }
    if let Some(path) = &args.schema {
        return descriptor::load_descriptor(path).map(Some);
    }
    let default = Path::new(DEFAULT_SCHEMA_PATH);
    if default.exists() {
        match descriptor::load_descriptor(default) {
            Ok(schema) => Ok(Some(schema)),
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "could not load default schema descriptor, using explicit checks only");
                Ok(None)
            }
        }
    } else {
        tracing::debug!(path = DEFAULT_SCHEMA_PATH, "no schema descriptor found, using explicit checks only");
        Ok(None)
    }
}
