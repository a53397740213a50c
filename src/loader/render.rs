use crate::model::Checklist;

/// Renders a checklist as a markdown task list.
///
/// ```text
/// # <name>
///
/// <description>
///
/// - [ ] **[<SEVERITY>]** <text>
///   - <help_text>
/// ```
pub fn render_checklist(checklist: &Checklist) -> String {
    let mut output = String::new();
    output.push_str("# ");
    output.push_str(&checklist.name);
    output.push_str("\n\n");

    if let Some(description) = checklist.description.as_deref().map(str::trim) {
        if !description.is_empty() {
            output.push_str(description);
            output.push_str("\n\n");
        }
    }

    for item in &checklist.items {
        output.push_str(&format!(
            "- [ ] **[{}]** {}\n",
            item.severity.to_string().to_uppercase(),
            item.text.trim()
        ));
        if let Some(help) = &item.help_text {
            output.push_str(&format!("  - {}\n", help.trim()));
        }
    }

    output
}
