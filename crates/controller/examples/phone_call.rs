//! Example: layer a phone call over a media app and watch the notifications.
//!
//! Run with: cargo run -p carlink_controller --example phone_call

use std::sync::Arc;

use carlink_controller::{StateController, StateControllerConfig};
use carlink_events::{InMemoryBridge, InterruptionKind, SystemEvent};
use carlink_state::{AppCapabilities, HmiState};

fn main() {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter("carlink_controller=debug")
        .init();

    println!("=== Phone Call Walkthrough ===\n");

    let bridge = Arc::new(InMemoryBridge::new());
    let mut controller = StateController::new(StateControllerConfig::default(), bridge.clone());

    controller.on_application_registered(1801, 2718, 1, AppCapabilities::MEDIA);
    controller.set_regular_state(1801, HmiState::full_audible(), false);
    println!("media app playing:   {}", controller.current_state(1801).unwrap());

    controller.on_event(SystemEvent::InterruptionChanged {
        kind: InterruptionKind::PhoneCall,
        active: true,
    });
    println!("phone call active:   {}", controller.current_state(1801).unwrap());

    controller.on_event(SystemEvent::InterruptionChanged {
        kind: InterruptionKind::PhoneCall,
        active: false,
    });
    println!("phone call over:     {}", controller.current_state(1801).unwrap());

    println!("\nnotifications sent to the mobile side:");
    for notification in bridge.statuses_for(1801) {
        println!("  -> {}", notification.state());
    }
}
