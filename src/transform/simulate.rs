//! Generic progress simulation for file types without a real transcoder.
//!
//! Every tool in the catalog needs *some* terminal behaviour, even where no
//! actual transform exists (video, audio, office formats). This stage
//! reports synthetic monotonic progress on a fixed tick interval and
//! resolves to a pass-through artifact of the unmodified source content.
//! It never fails.
//!
//! The tick interval is a display affordance, not a timeout: ticks exist
//! only so a host UI has something to animate.

use crate::item::Artifact;
use rand::Rng;
use std::time::Duration;

/// Run the simulation, invoking `on_progress` on every tick.
///
/// Progress grows by a random increment in `(0, 40]` per tick and is
/// clamped to 100 on the final tick; `on_progress` always sees a
/// monotonically non-decreasing sequence ending at exactly 100. Resolves
/// with `passthrough` unchanged.
pub async fn run(
    passthrough: Artifact,
    tick: Duration,
    mut on_progress: impl FnMut(f32),
) -> Artifact {
    let mut interval = tokio::time::interval(tick);
    interval.tick().await; // first tick fires immediately

    let mut progress = 0.0f32;
    loop {
        interval.tick().await;
        progress += random_increment();
        if progress >= 100.0 {
            on_progress(100.0);
            return passthrough;
        }
        on_progress(progress);
    }
}

fn random_increment() -> f32 {
    // Re-roll the (measure-zero) exact zero so increments stay positive.
    loop {
        let step = rand::thread_rng().gen_range(0.0..=40.0f32);
        if step > 0.0 {
            return step;
        }
    }
}
