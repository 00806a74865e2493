use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) const TARGET: &str = "telemetry::turn_loop";
pub(crate) const EVENT_TURN: &str = "turn_completed";
pub(crate) const EVENT_SIDE_CHANNEL: &str = "side_channel_result";

#[derive(Debug, Serialize)]
pub struct TurnCompletionEvent {
    pub turn_index: u64,
    pub latency_ms: u64,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SideChannelEvent {
    pub channel: &'static str,
    pub turn_count: usize,
    pub success: bool,
    pub detail: Option<String>,
}

pub fn record_turn_completed(turn_index: u64, latency: Duration, success: bool) {
    let event = TurnCompletionEvent {
        turn_index,
        latency_ms: duration_to_ms(latency),
        success,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_TURN,
            turn_index = event.turn_index,
            latency_ms = event.latency_ms,
            success = event.success,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_TURN,
            %err,
            "failed to encode turn completion event"
        ),
    }
}

pub fn record_side_channel(
    channel: &'static str,
    turn_count: usize,
    success: bool,
    detail: Option<String>,
) {
    let event = SideChannelEvent {
        channel,
        turn_count,
        success,
        detail,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => {
            if event.success {
                info!(
                    target: TARGET,
                    event = EVENT_SIDE_CHANNEL,
                    channel = event.channel,
                    turn_count = event.turn_count,
                    payload = %payload
                )
            } else {
                warn!(
                    target: TARGET,
                    event = EVENT_SIDE_CHANNEL,
                    channel = event.channel,
                    turn_count = event.turn_count,
                    payload = %payload
                )
            }
        }
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_SIDE_CHANNEL,
            %err,
            "failed to encode side channel event"
        ),
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
