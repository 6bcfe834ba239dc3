//! Plan and status rendering for the terminal.

use colored::Colorize;

use crate::diff::{OperationKind, Plan};
use crate::executor::Revision;

/// Render a plan summary: one line per operation, then the statement count.
pub fn render_plan_summary(plan: &Plan, colored: bool) -> String {
    let mut out = String::new();
    for op in &plan.operations {
        let marker = match op.kind {
            OperationKind::Create => "+",
            OperationKind::Alter | OperationKind::Replace | OperationKind::Recreate => "~",
            OperationKind::Rename => ">",
            OperationKind::Drop => "-"
        };
        let line = format!(
            "{} {} {} {}",
            marker,
            op.kind.label(),
            op.category.label(),
            op.object
        );
        if colored {
            let painted = match op.kind {
                OperationKind::Create => line.green().to_string(),
                OperationKind::Drop => line.red().to_string(),
                OperationKind::Rename => line.cyan().to_string(),
                _ => line.yellow().to_string()
            };
            out.push_str(&painted);
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    let statements = plan.statements().len();
    out.push_str(&format!(
        "{} operation(s), {} statement(s)\n",
        plan.operations.len(),
        statements
    ));
    out
}

/// Render migration status: local files against recorded revisions.
pub fn render_status(
    local_versions: &[String],
    revisions: &[Revision],
    colored: bool
) -> String {
    let mut out = String::new();
    for version in local_versions {
        let revision = revisions.iter().find(|r| &r.version == version);
        let line = match revision {
            None => format!("{}  pending", version),
            Some(r) if r.error.is_some() => format!(
                "{}  failed at {}/{}: {}",
                version,
                r.applied,
                r.total,
                r.error.as_deref().unwrap_or_default()
            ),
            Some(r) if r.applied < r.total => {
                format!("{}  partial {}/{}", version, r.applied, r.total)
            }
            Some(r) => format!("{}  applied ({} statements)", version, r.total)
        };
        if colored {
            let painted = match revision {
                None => line.yellow().to_string(),
                Some(r) if r.error.is_some() => line.red().to_string(),
                Some(r) if r.applied < r.total => line.yellow().to_string(),
                Some(_) => line.green().to_string()
            };
            out.push_str(&painted);
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }
    for revision in revisions {
        if !local_versions.contains(&revision.version) {
            let line = format!("{}  applied, but missing locally", revision.version);
            out.push_str(&if colored { line.red().to_string() } else { line });
            out.push('\n');
        }
    }
    out
}
