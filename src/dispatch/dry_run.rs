//! Dry-run rendering: what a batch would do, without doing any of it.

use super::ClusterHandler;
use crate::queue::Task;
use std::fmt::Write;

/// Describe every task, including its scheduler command when `cluster` is set
pub fn render_plan(tasks: &[Task], cluster: Option<&ClusterHandler>) -> String {
    let mut out = String::new();
    for task in tasks {
        let paths = &task.request.paths;
        let _ = writeln!(out, "{} {}", task.job_name, task.name);
        let _ = writeln!(out, "  source:    {}", paths.mul_source.display());
        let _ = writeln!(out, "  companion: {}", paths.pan_source.display());
        let _ = writeln!(out, "  output:    {}", paths.pansharp_final_output.display());
        if let Some(handler) = cluster {
            let _ = writeln!(
                out,
                "  submit:    {}",
                handler.submit_command(task).display_line()
            );
        }
    }
    out
}
