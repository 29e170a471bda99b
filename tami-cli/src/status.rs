//! Status rendering.

use chrono::{DateTime, Utc};
use tami_core::{Lifecycle, PetState, Pose, Vital};

const BAR_WIDTH: usize = 20;

fn bar(percent: u8) -> String {
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Multi-line status block for `pet` as of `now`.
pub fn render(pet: &PetState, name: &str, now: DateTime<Utc>, sleep_duration_secs: u32) -> String {
    let mood = match (pet.lifecycle(), pet.pose()) {
        (Lifecycle::Dead, _) => "dead".to_string(),
        (_, Pose::Sleeping) => match pet.sleep_remaining_secs(now, sleep_duration_secs) {
            Some(secs) if secs > 0 => format!("sleeping ({secs}s left)"),
            _ => "waking up".to_string(),
        },
        (Lifecycle::Critical, _) => "in trouble".to_string(),
        (_, Pose::Drowsy) => "drowsy".to_string(),
        (_, Pose::Normal) => "fine".to_string(),
    };

    let mut out = format!("{name}, day {}: {mood}\n", pet.age_days(now).max(0));
    for vital in Vital::ALL {
        let pct = pet.vitals.percent(vital);
        out.push_str(&format!("  {:<10} {} {pct:>3}%\n", vital.label(), bar(pct)));
    }
    out
}

/// Whether moving from `prev` to `next` should raise the "needs you" alert.
///
/// Fires once when the pet enters the critical stage, not on every tick it
/// stays there.
pub fn should_alert(prev: Lifecycle, next: Lifecycle) -> bool {
    next == Lifecycle::Critical && prev != Lifecycle::Critical
}

/// The critical notification line.
pub fn alert(name: &str) -> String {
    format!("!! {name} needs you! Check on it with 'status'.")
}
