use std::time::Duration;
use anyhow::Result;
use tokio::signal::ctrl_c;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};
use elevator_sim::facility::Facility;
use elevator_sim::init::initialize;
use elevator_sim::models::Level;

/// One step of a demo scenario
enum Action {
    PressUp(Level),
    PressDown(Level),
    /// A passenger in the given unit chooses a destination
    Destination { unit_id: u32, level: Level },
    Pause(Duration),
}

struct Scenario {
    name: &'static str,
    actions: Vec<Action>,
}

fn scenarios() -> Vec<Scenario> {
    let short = Duration::from_millis(100);
    let boarding = Duration::from_millis(500);
    vec![
        Scenario {
            name: "Basic up call",
            actions: vec![
                Action::PressUp(2),
                Action::Pause(boarding),
                Action::Destination { unit_id: 1, level: 5 },
            ],
        },
        Scenario {
            name: "Basic down call",
            actions: vec![
                Action::PressDown(8),
                Action::Pause(boarding),
                Action::Destination { unit_id: 1, level: 3 },
            ],
        },
        Scenario {
            name: "Multiple calls including a basement level",
            actions: vec![
                Action::PressUp(-1),
                Action::Pause(short),
                Action::PressDown(7),
                Action::Pause(short),
                Action::PressUp(0),
                Action::Pause(short),
            ],
        },
        Scenario {
            name: "Up and down calls at the same level",
            actions: vec![
                Action::PressUp(4),
                Action::Pause(short),
                Action::PressDown(4),
                Action::Pause(short),
            ],
        },
    ]
}

/// The main entry point of the elevator simulation
///
/// Replays the demo scenarios against a facility built from the configuration files and shuts
/// down once every scenario has settled, or on Ctrl-C
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

/// The core logic of the simulation
///
/// 1. Loads settings, initializes logging and sets up the fleet
/// 2. Runs each scenario and waits for the facility to become idle again
/// 3. Logs the final fleet status as JSON
/// 4. Shuts the facility down
async fn run() -> Result<()> {
    let context = initialize().await?;
    let facility = context.facility.clone();

    tokio::select! {
        result = run_scenarios(&facility) => {
            if let Err(e) = result {
                error!("Scenario run failed: {}", e);
            }
        }
        _ = ctrl_c() => {
            info!("Received shutdown signal. Shutting down gracefully...");
        }
    }

    info!("Final fleet status: {}", serde_json::to_string_pretty(&facility.fleet_status())?);
    facility.shutdown().await;
    Ok(())
}

async fn run_scenarios(facility: &Facility) -> Result<()> {
    // Generous upper bound for one scenario to settle at the configured speeds
    let timing = &facility.settings().timing;
    let span = (facility.bounds().max() - facility.bounds().min()) as u32 + 1;
    let settle_limit = (timing.travel() + timing.door_open() + timing.door_close()) * span * 4;

    for scenario in scenarios() {
        info!("--- Scenario: {} ---", scenario.name);
        for action in scenario.actions {
            let result = match action {
                Action::PressUp(level) => facility.floor_press_up(level).map(|_| ()),
                Action::PressDown(level) => facility.floor_press_down(level).map(|_| ()),
                Action::Destination { unit_id, level } => facility.unit(unit_id)
                    .and_then(|unit| unit.add_internal_request(level))
                    .map(|_| ()),
                Action::Pause(duration) => {
                    sleep(duration).await;
                    Ok(())
                }
            };
            if let Err(e) = result {
                warn!("Scenario '{}': {}", scenario.name, e);
            }
        }

        if timeout(settle_limit, wait_until_quiescent(facility)).await.is_err() {
            warn!("Scenario '{}' did not settle within {:?}", scenario.name, settle_limit);
        }
        info!("Fleet status: {}", serde_json::to_string(&facility.fleet_status())?);
    }
    Ok(())
}

async fn wait_until_quiescent(facility: &Facility) {
    let poll = facility.settings().timing.redispatch_interval();
    while !facility.is_quiescent() {
        sleep(poll).await;
    }
}
