use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::backend::{self, VideoBackend};
use crate::errors::BridgeError;
use crate::events::{
    self, CameraEvent, DataMessage, DataTrackEvent, EventName, ParticipantEvent, RoomErrorEvent,
    RoomEvent, TrackEvent, VideoEvent,
};
use crate::listeners::{EventHub, Subscription, VideoEventListener};
use crate::native::{ListenerId, NativeListener, NativeModules, Pending, Platform};
use crate::options::ConnectionOptions;
use crate::stats::StatsReport;

/// Native listener for one event name: normalizes the body and hands it to the hub.
struct Forwarder {
    event: EventName,
    hub: EventHub,
}

impl NativeListener for Forwarder {
    fn on_native_event(&self, body: Value) {
        match events::normalize(self.event, body) {
            Ok(event) => self.hub.dispatch(&event),
            Err(e) => tracing::warn!(event = %self.event, "dropping malformed native event: {e}"),
        }
    }
}

/// Platform-uniform facade over the native Twilio Video module.
///
/// Construction selects the backend for the platform and registers one
/// native listener per supported event. [`Bridge::teardown`] (or drop)
/// releases all of them exactly once. Calls are forwarded without checking
/// connection state; failures come back through the error-carrying events.
///
/// Every method takes `&self` and no lock is held while the native side
/// runs, so listeners may call back into the bridge.
pub struct Bridge {
    backend: Box<dyn VideoBackend>,
    hub: EventHub,
    native_listeners: Mutex<Vec<(EventName, ListenerId)>>,
    torn_down: AtomicBool,
}

impl Bridge {
    pub fn new(platform: Platform, modules: NativeModules) -> Result<Self, BridgeError> {
        let backend = backend::select(platform, &modules)?;
        let bridge = Self {
            backend,
            hub: EventHub::new(),
            native_listeners: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        };
        // On error the bridge is dropped here, releasing whatever was registered.
        bridge.register()?;
        Ok(bridge)
    }

    /// Build for the compilation target's platform.
    pub fn for_current_platform(modules: NativeModules) -> Result<Self, BridgeError> {
        let platform = Platform::current().ok_or_else(|| {
            BridgeError::UnsupportedPlatform(std::env::consts::OS.to_string())
        })?;
        Self::new(platform, modules)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(EventName, ListenerId)>> {
        self.native_listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self) -> Result<(), BridgeError> {
        self.backend.attach();
        for &event in EventName::ALL {
            if !self.backend.supports(event) {
                continue;
            }
            let forwarder = Arc::new(Forwarder {
                event,
                hub: self.hub.clone(),
            });
            let id = self
                .backend
                .subscribe(event, forwarder)
                .map_err(|source| BridgeError::Listener { event, source })?;
            self.listeners().push((event, id));
        }
        tracing::info!(
            platform = %self.backend.platform(),
            listeners = self.active_subscriptions(),
            "bridge registered"
        );
        Ok(())
    }

    /// Stop native emission, release every native listener, then detach
    /// from the module. Runs once.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.backend.stop_events();
        let registered = std::mem::take(&mut *self.listeners());
        for (event, id) in registered {
            tracing::trace!(%event, "removing native listener");
            self.backend.unsubscribe(id);
        }
        self.backend.detach();
        self.hub.close();
        tracing::info!(platform = %self.backend.platform(), "bridge torn down");
    }

    pub fn platform(&self) -> Platform {
        self.backend.platform()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Number of native listeners currently held.
    pub fn active_subscriptions(&self) -> usize {
        self.listeners().len()
    }

    /// Number of UI listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }

    pub fn connect(&self, room_name: &str, access_token: &str, options: &ConnectionOptions) {
        if room_name.is_empty() || access_token.is_empty() {
            tracing::warn!("connect called with an empty room name or access token");
        }
        let options = options.normalize();
        tracing::debug!(
            room_name,
            enable_audio = options.enable_audio,
            enable_video = options.enable_video,
            "connect"
        );
        self.backend.connect(room_name, access_token, &options);
    }

    pub fn disconnect(&self) {
        tracing::debug!("disconnect");
        self.backend.disconnect();
    }

    pub fn flip_camera(&self) {
        self.backend.flip_camera();
    }

    /// Resolves to the applied value, or the native rejection.
    pub fn set_local_video_enabled(&self, enabled: bool) -> Pending<bool> {
        tracing::debug!(enabled, "set local video");
        self.backend.set_local_video_enabled(enabled)
    }

    pub fn set_local_audio_enabled(&self, enabled: bool) -> Pending<bool> {
        tracing::debug!(enabled, "set local audio");
        self.backend.set_local_audio_enabled(enabled)
    }

    /// Toggle remote audio playback. iOS scopes it to `participant_sid`;
    /// Android applies it to every remote participant.
    pub fn set_remote_audio_enabled(
        &self,
        participant_sid: Option<&str>,
        enabled: bool,
    ) -> Pending<bool> {
        self.backend.set_remote_audio_enabled(participant_sid, enabled)
    }

    pub fn set_bluetooth_headset_connected(&self, enabled: bool) -> Pending<bool> {
        self.backend.set_bluetooth_headset_connected(enabled)
    }

    /// Route audio to the speaker (`true`) or the headset.
    pub fn toggle_sound_setup(&self, speaker: bool) {
        self.backend.toggle_sound_setup(speaker);
    }

    pub fn disable_open_sles(&self) {
        self.backend.disable_open_sles();
    }

    pub fn send_string(&self, message: &str) {
        self.backend.send_string(message);
    }

    pub fn get_stats(&self) {
        self.backend.get_stats();
    }

    /// Emit `statsReceived` every `interval_ms` until cancelled.
    pub fn request_stats(&self, interval_ms: u64) -> Result<(), BridgeError> {
        if interval_ms == 0 {
            return Err(BridgeError::InvalidStatsInterval);
        }
        self.backend.request_stats(Duration::from_millis(interval_ms))
    }

    pub fn cancel_stats_request(&self) {
        self.backend.cancel_stats_request();
    }

    /// Register a listener for one event name.
    pub fn on<L>(&self, event: EventName, listener: L) -> Subscription
    where
        L: VideoEventListener + 'static,
    {
        self.hub.subscribe(event, Arc::new(listener))
    }

    pub fn on_shared(&self, event: EventName, listener: Arc<dyn VideoEventListener>) -> Subscription {
        self.hub.subscribe(event, listener)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

macro_rules! typed_listeners {
    ($($method:ident => $variant:ident($payload:ty);)+) => {
        /// Typed registration, one per event name.
        impl Bridge {
            $(
                pub fn $method<F>(&self, callback: F) -> Subscription
                where
                    F: Fn(&$payload) + Send + Sync + 'static,
                {
                    self.on(EventName::$variant, move |event: &VideoEvent| {
                        if let VideoEvent::$variant(payload) = event {
                            callback(payload);
                        }
                    })
                }
            )+
        }
    };
}

typed_listeners! {
    on_room_did_connect => RoomDidConnect(RoomEvent);
    on_room_did_disconnect => RoomDidDisconnect(RoomErrorEvent);
    on_room_did_fail_to_connect => RoomDidFailToConnect(RoomErrorEvent);
    on_room_participant_did_connect => RoomParticipantDidConnect(ParticipantEvent);
    on_room_participant_did_disconnect => RoomParticipantDidDisconnect(ParticipantEvent);
    on_participant_added_video_track => ParticipantAddedVideoTrack(TrackEvent);
    on_participant_removed_video_track => ParticipantRemovedVideoTrack(TrackEvent);
    on_participant_added_audio_track => ParticipantAddedAudioTrack(TrackEvent);
    on_participant_removed_audio_track => ParticipantRemovedAudioTrack(TrackEvent);
    on_participant_added_data_track => ParticipantAddedDataTrack(DataTrackEvent);
    on_participant_removed_data_track => ParticipantRemovedDataTrack(DataTrackEvent);
    on_participant_enabled_video_track => ParticipantEnabledVideoTrack(TrackEvent);
    on_participant_disabled_video_track => ParticipantDisabledVideoTrack(TrackEvent);
    on_participant_enabled_audio_track => ParticipantEnabledAudioTrack(TrackEvent);
    on_participant_disabled_audio_track => ParticipantDisabledAudioTrack(TrackEvent);
    on_data_track_message_received => DataTrackMessageReceived(DataMessage);
    on_stats_received => StatsReceived(StatsReport);
    on_camera_did_start => CameraDidStart(CameraEvent);
    on_camera_was_interrupted => CameraWasInterrupted(CameraEvent);
    on_camera_interruption_ended => CameraInterruptionEnded(CameraEvent);
    on_camera_did_stop_running => CameraDidStopRunning(CameraEvent);
}
