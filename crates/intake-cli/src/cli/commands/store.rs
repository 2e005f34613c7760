use super::{exit_codes, read_input};
use crate::cli::args::StoreArgs;
use intake_core::errors::StoreError;
use intake_core::report::console;
use intake_core::storage::Store;
use serde_json::{json, Value};

pub async fn run(args: StoreArgs) -> anyhow::Result<i32> {
    let input = match read_input(&args.file, &args.env).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    // Input is either a validation report (the normal pipeline) or a bare
    // record envelope passed directly. Older validator builds reported
    // `success` where current ones report `valid`; accept both.
    let passed = input
        .get("valid")
        .or_else(|| input.get("success"))
        .and_then(Value::as_bool);
    let envelope: &Value = match passed {
        Some(false) => {
            eprintln!("error: validation did not succeed; cannot store invalid data");
            let errors = input
                .get("error_count")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            eprintln!("validation errors: {} error(s)", errors);
            return Ok(exit_codes::INVALID);
        }
        Some(true) => match input.get("validated_data") {
            Some(v) => v,
            None => {
                eprintln!("error: no validated_data in input; cannot store");
                return Ok(exit_codes::INVALID);
            }
        },
        None => &input,
    };

    let store = Store::new(&args.submissions_dir);
    match store.store(envelope) {
        Ok(report) => {
            if args.format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                console::print_store(&report);
            }
            Ok(exit_codes::OK)
        }
        Err(err) => {
            if args.format == "json" {
                let out = json!({
                    "success": false,
                    "error": err.to_string(),
                    "detail": serde_json::to_value(&err)?,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                console::print_store_error(&err);
            }
            Ok(match err {
                StoreError::StorageIo { .. } => exit_codes::CONFIG_ERROR,
                _ => exit_codes::INVALID,
            })
        }
    }
}
