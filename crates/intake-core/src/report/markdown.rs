//! Markdown rendering of a defect list, grouped one block per top-level
//! section, for posting back to the submission thread.

use crate::errors::Defect;

pub fn render_comment(defects: &[Defect]) -> String {
    if defects.is_empty() {
        return "✅ **Validation passed!**".to_string();
    }

    let mut lines = vec!["❌ **Validation failed**".to_string(), String::new()];
    lines.push(format!("Found {} validation error(s):", defects.len()));
    lines.push(String::new());

    for (section, group) in group_by_section(defects) {
        lines.push(format!("### {}", section));
        for defect in group {
            lines.push(format!("- **`{}`**: {}", defect.field_path, defect.message));
        }
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}

/// Group defects by the top segment of their dotted path, preserving first
/// appearance order.
pub fn group_by_section<'a>(defects: &'a [Defect]) -> Vec<(String, Vec<&'a Defect>)> {
    let mut groups: Vec<(String, Vec<&Defect>)> = Vec::new();
    for defect in defects {
        let section = top_level_section(&defect.field_path);
        match groups.iter_mut().find(|(name, _)| *name == section) {
            Some((_, group)) => group.push(defect),
            None => groups.push((section, vec![defect])),
        }
    }
    groups
}

fn top_level_section(field_path: &str) -> String {
    match field_path.split_once('.') {
        Some((head, _)) => head.to_string(),
        None if field_path.is_empty() => "root".to_string(),
        None => field_path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Defect, DefectCategory};

    #[test]
    fn comment_groups_defects_per_top_level_section() {
        let defects = vec![
            Defect::missing_field("schema_version", "schema_version"),
            Defect::missing_field("result_data.submission.submitted_by", "submitted_by"),
            Defect::new(
                DefectCategory::Enum,
                "result_data.run_identity.run_number",
                "bad run_number",
            ),
        ];
        let comment = render_comment(&defects);
        assert!(comment.contains("### schema_version"));
        assert!(comment.contains("### result_data"));
        assert!(comment.contains("`result_data.run_identity.run_number`"));
        assert!(comment.starts_with("❌"));
    }

    #[test]
    fn empty_defect_list_renders_success() {
        assert!(render_comment(&[]).starts_with("✅"));
    }
}
