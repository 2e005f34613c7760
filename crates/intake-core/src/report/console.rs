//! Human-readable stage summaries on stderr.

use crate::errors::StoreError;
use crate::ingest::IngestReport;
use crate::report::markdown::group_by_section;
use crate::storage::StoreReport;
use crate::validate::{DirectoryReport, ValidationReport};

pub fn print_ingest(report: &IngestReport) {
    if report.success {
        eprintln!(
            "✔ Payload extracted ({})",
            report.extraction.method.as_str()
        );
        return;
    }

    if !report.extraction.success {
        eprintln!("✖ No payload found in submission body");
    } else if let Some(err) = &report.validation.error {
        eprintln!("✖ Payload is not valid JSON");
        eprintln!("    {}", err);
    }
    if let Some(error) = &report.error {
        eprintln!("    {}", error);
    }
}

pub fn print_validation(report: &ValidationReport) {
    if report.valid {
        eprintln!("✔ VALID - All validation checks passed");
    } else {
        eprintln!(
            "✖ INVALID - {} error{}",
            report.error_count,
            if report.error_count != 1 { "s" } else { "" }
        );
        eprintln!();
        for (section, group) in group_by_section(&report.errors) {
            eprintln!("{} ({} error{}):", section, group.len(), if group.len() != 1 { "s" } else { "" });
            for defect in group {
                eprintln!("  • [{}] {}", defect.field_path, defect.message);
            }
            eprintln!();
        }
    }

    if !report.warnings.is_empty() {
        eprintln!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            eprintln!("  • {}", warning);
        }
    }
}

pub fn print_directory(report: &DirectoryReport) {
    eprintln!("Total Files: {}", report.total_files);
    eprintln!("Valid Files: {}", report.valid_files);
    eprintln!("Invalid Files: {}", report.invalid_files);

    if report.invalid_files > 0 {
        eprintln!("\nInvalid Files:");
        for file in report.files.iter().filter(|f| !f.valid) {
            eprintln!("\n  {} ({} errors)", file.file, file.error_count);
            for defect in file.errors.iter().take(5) {
                eprintln!("    • [{}] {}", defect.field_path, defect.message);
            }
            if file.error_count > 5 {
                eprintln!("    ... and {} more errors", file.error_count - 5);
            }
        }
    }
}

pub fn print_store(report: &StoreReport) {
    eprintln!(
        "✔ Stored {} in partition {}/{:02}",
        report.run_id, report.partition_year, report.partition_month
    );
    eprintln!("    {}", report.file_path);
    if report.duplicate_removed {
        if let Some(removed) = &report.removed_file {
            eprintln!("    replaced stale duplicate: {}", removed);
        }
    }
    for warning in &report.warnings {
        eprintln!("    warning: {}", warning);
    }
}

pub fn print_store_error(error: &StoreError) {
    eprintln!("✖ Store rejected the record");
    eprintln!("    {}", error);
}
