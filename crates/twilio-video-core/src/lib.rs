//! Twilio Video bridge core.
//!
//! Platform-uniform facade over the native Twilio Video SDK modules.
//! Pure Rust crate; the native sides are reached through the traits in
//! [`native`] and consumed by host shells via UniFFI bindings.

pub mod backend;
pub mod bridge;
pub mod errors;
pub mod events;
pub mod listeners;
pub mod native;
pub mod options;
pub mod preferences;
pub mod stats;

#[cfg(test)]
mod testing;

pub use bridge::Bridge;
pub use errors::{BridgeError, NativeRejection, TwilioError, TwilioErrorCode};
pub use events::{EventError, EventName, VideoEvent};
pub use listeners::{EventHub, Subscription, SubscriptionId, VideoEventListener};
pub use native::{
    AndroidVideoView, IosVideoModule, ListenerId, NativeEventEmitter, NativeListener,
    NativeModules, Pending, Platform, Promise, ViewCommand,
};
pub use options::{ConnectionOptions, NormalizedConnectOptions};
pub use preferences::{Preferences, PreferencesStore};
pub use stats::{ConnectionStats, StatsReport, TrackStats};
