use atestado_core::{ActionKind, ActionRowView, AppViewModel, StatusKind};

const STEP_LABELS: [&str; 5] = [
    "Select document",
    "Analyse",
    "Download RDF",
    "Infer",
    "Import to graph store",
];

/// Renders the view model as terminal lines.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::with_capacity(4 + view.actions.len());

    lines.push(render_steps(view.current_step));
    lines.push(format!(
        "Document: {}",
        view.file_name.as_deref().unwrap_or("(none)")
    ));

    for row in &view.actions {
        lines.push(format_action_row(row));
    }

    if view.overlay {
        match &view.polling_task {
            Some(task_id) => lines.push(format!("Processing, please wait (task {task_id})")),
            None => lines.push("Processing, please wait".to_string()),
        }
    }
    lines
}

fn render_steps(current_step: u8) -> String {
    STEP_LABELS
        .iter()
        .zip(1u8..)
        .map(|(label, id)| {
            let marker = if current_step > id {
                "x"
            } else if current_step == id {
                ">"
            } else {
                " "
            };
            format!("[{marker}] {id}. {label}")
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn format_action_row(row: &ActionRowView) -> String {
    format!(
        "  {:<10} {:<8} {}",
        action_label(row.action),
        status_badge(row.status),
        row.message
    )
}

fn action_label(action: ActionKind) -> &'static str {
    match action {
        ActionKind::Process => "Process",
        ActionKind::Download => "RDF",
        ActionKind::Infer => "Infer",
        ActionKind::Import => "Import",
    }
}

fn status_badge(status: StatusKind) -> &'static str {
    match status {
        StatusKind::Ok => "OK",
        StatusKind::Error => "ERROR",
        StatusKind::Processing => "...",
        StatusKind::Waiting => "waiting",
    }
}
