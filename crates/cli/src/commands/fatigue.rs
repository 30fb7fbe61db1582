//! Fatigue command - score a driver's self-report

use anyhow::{Context, Result};
use fleet_inspect_domain::{fatigue::MAX_FATIGUE_SCORE, score_fatigue};

use super::state_symbol;
use crate::args::FatigueArgs;

pub async fn execute(args: FatigueArgs) -> Result<()> {
    let assessment = score_fatigue(
        args.slept_seven_hours,
        args.fatigue_free,
        args.fit_to_drive,
        args.took_medication,
    );

    if args.json {
        let json =
            serde_json::to_string_pretty(&assessment).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        println!(
            "{} Score: {}/{} ({}, {})",
            state_symbol(assessment.state),
            assessment.score,
            MAX_FATIGUE_SCORE,
            assessment.state,
            assessment.state.color()
        );
    }

    Ok(())
}
