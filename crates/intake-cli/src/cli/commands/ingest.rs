use super::{exit_codes, read_input};
use crate::cli::args::IngestArgs;
use intake_core::ingest::ingest_event;
use intake_core::report::console;

pub async fn run(args: IngestArgs) -> anyhow::Result<i32> {
    let event = match read_input(&args.file, &args.env).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let report = ingest_event(&event);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        console::print_ingest(&report);
    }

    Ok(if report.success {
        exit_codes::OK
    } else {
        exit_codes::INVALID
    })
}
