//! Per-platform strategies behind the bridge.
//!
//! iOS exposes a module with methods and its own emitter; Android exposes a
//! view driven by numbered commands. Both are reduced to [`VideoBackend`].

use std::sync::Arc;
use std::time::Duration;

use crate::errors::{BridgeError, NativeRejection};
use crate::events::EventName;
use crate::native::{ListenerId, NativeListener, NativeModules, Pending, Platform};
use crate::options::NormalizedConnectOptions;

mod android;
mod ios;

pub use android::AndroidBackend;
pub use ios::IosBackend;

pub trait VideoBackend: Send + Sync {
    fn platform(&self) -> Platform;

    /// Whether the native side emits `event` at all.
    fn supports(&self, event: EventName) -> bool;

    /// Called once when the bridge mounts, before listeners are added.
    fn attach(&self);

    /// Called once at teardown, before listeners are removed, so the
    /// native side stops emitting first.
    fn stop_events(&self);

    /// Called once at teardown, after listeners are removed.
    fn detach(&self);

    fn connect(&self, room_name: &str, access_token: &str, options: &NormalizedConnectOptions);
    fn disconnect(&self);
    fn flip_camera(&self);
    fn set_local_video_enabled(&self, enabled: bool) -> Pending<bool>;
    fn set_local_audio_enabled(&self, enabled: bool) -> Pending<bool>;
    fn set_remote_audio_enabled(&self, participant_sid: Option<&str>, enabled: bool)
        -> Pending<bool>;
    fn set_bluetooth_headset_connected(&self, enabled: bool) -> Pending<bool>;
    fn toggle_sound_setup(&self, speaker: bool);
    fn disable_open_sles(&self);
    fn send_string(&self, message: &str);
    fn get_stats(&self);
    fn request_stats(&self, interval: Duration) -> Result<(), BridgeError>;
    fn cancel_stats_request(&self);

    fn subscribe(
        &self,
        event: EventName,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection>;
    fn unsubscribe(&self, id: ListenerId);
}

/// Pick the backend for `platform`. Modules for other platforms are ignored.
pub fn select(
    platform: Platform,
    modules: &NativeModules,
) -> Result<Box<dyn VideoBackend>, BridgeError> {
    match platform {
        Platform::Ios => modules
            .ios
            .clone()
            .map(|m| Box::new(IosBackend::new(m)) as Box<dyn VideoBackend>)
            .ok_or(BridgeError::ModuleUnavailable(platform)),
        Platform::Android => modules
            .android
            .clone()
            .map(|v| Box::new(AndroidBackend::new(v)) as Box<dyn VideoBackend>)
            .ok_or(BridgeError::ModuleUnavailable(platform)),
    }
}
