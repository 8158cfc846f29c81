use std::sync::Arc;
use std::time::Duration;

use crate::backend::VideoBackend;
use crate::errors::{BridgeError, NativeRejection};
use crate::events::EventName;
use crate::native::{IosVideoModule, ListenerId, NativeListener, Pending, Platform};
use crate::options::NormalizedConnectOptions;
use crate::stats::StatsSchedule;

/// Forwards to the iOS module and listens on its emitter by bare event name.
pub struct IosBackend {
    module: Arc<dyn IosVideoModule>,
    stats: StatsSchedule,
}

impl IosBackend {
    pub fn new(module: Arc<dyn IosVideoModule>) -> Self {
        Self {
            module,
            stats: StatsSchedule::default(),
        }
    }
}

impl VideoBackend for IosBackend {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn supports(&self, _event: EventName) -> bool {
        true
    }

    fn attach(&self) {
        self.module.change_listener_status(true);
        self.module.start_local_video();
        self.module.start_local_audio();
    }

    fn stop_events(&self) {
        self.stats.cancel();
        self.module.change_listener_status(false);
    }

    fn detach(&self) {
        self.module.stop_local_video();
        self.module.stop_local_audio();
    }

    fn connect(&self, room_name: &str, access_token: &str, options: &NormalizedConnectOptions) {
        self.module.connect(room_name, access_token, options);
    }

    fn disconnect(&self) {
        self.module.disconnect();
    }

    fn flip_camera(&self) {
        self.module.flip_camera();
    }

    fn set_local_video_enabled(&self, enabled: bool) -> Pending<bool> {
        let (promise, pending) = Pending::channel();
        self.module.set_local_video_enabled(enabled, promise);
        pending
    }

    fn set_local_audio_enabled(&self, enabled: bool) -> Pending<bool> {
        let (promise, pending) = Pending::channel();
        self.module.set_local_audio_enabled(enabled, promise);
        pending
    }

    fn set_remote_audio_enabled(
        &self,
        participant_sid: Option<&str>,
        enabled: bool,
    ) -> Pending<bool> {
        // Playback is scoped per participant on iOS.
        match participant_sid {
            Some(sid) => self.module.set_remote_audio_playback(sid, enabled),
            None => tracing::debug!("remote audio toggle without participant is a no-op on iOS"),
        }
        Pending::ready(enabled)
    }

    fn set_bluetooth_headset_connected(&self, enabled: bool) -> Pending<bool> {
        Pending::ready(enabled)
    }

    fn toggle_sound_setup(&self, speaker: bool) {
        self.module.toggle_sound_setup(speaker);
    }

    fn disable_open_sles(&self) {}

    fn send_string(&self, message: &str) {
        self.module.send_string(message);
    }

    fn get_stats(&self) {
        self.module.get_stats();
    }

    fn request_stats(&self, interval: Duration) -> Result<(), BridgeError> {
        let module = self.module.clone();
        self.stats.start(interval, move || module.get_stats())
    }

    fn cancel_stats_request(&self) {
        self.stats.cancel();
    }

    fn subscribe(
        &self,
        event: EventName,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection> {
        self.module.add_listener(event.as_str(), listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.module.remove_listener(id);
    }
}
