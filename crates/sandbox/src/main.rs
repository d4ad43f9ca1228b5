mod bootstrap;
mod scenario;

use std::process::ExitCode;

use tracing::{error, info};

fn main() -> ExitCode {
    let wiring = match bootstrap::build_sandbox() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    match scenario::run_scenario(wiring) {
        Ok(report) => {
            info!(
                attack_calls = report.attack_calls,
                follow_latency_ms = report.follow_latency.as_millis() as u64,
                "sandbox_scenario_passed"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "sandbox_scenario_failed");
            ExitCode::FAILURE
        }
    }
}
