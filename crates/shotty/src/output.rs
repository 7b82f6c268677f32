//! One-line rendering of lifecycle progress

use colored::{ColoredString, Colorize};
use shotty_cloud::{BatchReport, FailureKind, LifecycleEvent};

pub fn event_line(event: &LifecycleEvent) -> ColoredString {
    match event {
        LifecycleEvent::Stopping { instance_id } => format!("Stopping {}...", instance_id).yellow(),
        LifecycleEvent::Starting { instance_id } => format!("Starting {}...", instance_id).green(),
        LifecycleEvent::WaitingStopped { instance_id } => {
            format!("  Waiting for {} to stop", instance_id).dimmed()
        }
        LifecycleEvent::WaitingRunning { instance_id } => {
            format!("  Waiting for {} to run", instance_id).dimmed()
        }
        LifecycleEvent::SnapshotCreating { volume_id } => {
            format!("  Creating snapshot of {}...", volume_id).cyan()
        }
        LifecycleEvent::SnapshotCreated {
            volume_id,
            snapshot_id,
        } => format!("  ✓ {} requested for {}", snapshot_id, volume_id).green(),
        LifecycleEvent::SnapshotSkipped { volume_id } => {
            format!("  Skipping {}, snapshot already in progress", volume_id).dimmed()
        }
        LifecycleEvent::Failed {
            instance_id,
            failure,
        } => {
            let verb = match failure.kind {
                FailureKind::StopRequest => "stop",
                FailureKind::StartRequest => "start",
                FailureKind::WaitStopped | FailureKind::WaitRunning => "wait for",
                FailureKind::Snapshot => "snapshot",
            };
            format!("✗ Could not {} {}: {}", verb, instance_id, failure).red()
        }
        LifecycleEvent::Done { instance_id } => format!("✓ {} done", instance_id).green().bold(),
    }
}

pub fn print_event(event: &LifecycleEvent) {
    println!("{}", event_line(event));
}

pub fn print_summary(report: &BatchReport) {
    let line = report.to_string();
    if report.is_success() {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotty_cloud::{CloudError, InstanceFailure};

    #[test]
    fn test_event_lines() {
        colored::control::set_override(false);

        let line = event_line(&LifecycleEvent::Stopping {
            instance_id: "i-1".to_string(),
        });
        assert_eq!(line.to_string(), "Stopping i-1...");

        let line = event_line(&LifecycleEvent::SnapshotSkipped {
            volume_id: "vol-1".to_string(),
        });
        assert_eq!(
            line.to_string(),
            "  Skipping vol-1, snapshot already in progress"
        );
    }

    #[test]
    fn test_failure_line_keeps_error_detail() {
        colored::control::set_override(false);

        let failure = InstanceFailure::new(
            FailureKind::StopRequest,
            CloudError::Api("IncorrectInstanceState".to_string()),
        );
        let line = event_line(&LifecycleEvent::Failed {
            instance_id: "i-2".to_string(),
            failure,
        });
        assert_eq!(
            line.to_string(),
            "✗ Could not stop i-2: stop request failed: API error: IncorrectInstanceState"
        );
    }

    #[test]
    fn test_snapshot_and_restart_failures_render_separately() {
        colored::control::set_override(false);

        let snapshot = InstanceFailure::new(
            FailureKind::Snapshot,
            CloudError::Api("SnapshotLimit".to_string()),
        )
        .on_volume("vol-2");
        let restart = InstanceFailure::new(
            FailureKind::StartRequest,
            CloudError::Api("NoCapacity".to_string()),
        );

        let lines: Vec<String> = [snapshot, restart]
            .into_iter()
            .map(|failure| {
                event_line(&LifecycleEvent::Failed {
                    instance_id: "i-1".to_string(),
                    failure,
                })
                .to_string()
            })
            .collect();
        assert_eq!(
            lines,
            vec![
                "✗ Could not snapshot i-1: snapshot failed on vol-2: API error: SnapshotLimit",
                "✗ Could not start i-1: start request failed: API error: NoCapacity",
            ]
        );
    }
}
