//! UniFFI bindings for twilio-video-core.
//!
//! Provides a TwilioVideoClient object that wraps the bridge, its host
//! module adapters, and the preferences store into a single FFI-safe
//! interface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde_json::{Map, Value};
use twilio_video_core::{
    AndroidVideoView, Bridge, EventError as CoreEventError, EventName, IosVideoModule, ListenerId,
    NativeEventEmitter, NativeListener, NativeModules, NativeRejection, NormalizedConnectOptions,
    Pending, Platform as CorePlatform, Promise, Subscription, VideoEvent as CoreVideoEvent,
    VideoEventListener, ViewCommand,
    events::{Participant as CoreParticipant, Track as CoreTrack, TrackEvent as CoreTrackEvent},
};

uniffi::include_scaffolding!("twilio_video");

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before creating a client.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("twilio_video_core=debug,twilio_video_ffi=debug")
                }),
            )
            .with_ansi(false)
            .init();
    });
}

// ── FFI-safe type conversions ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

impl From<CorePlatform> for Platform {
    fn from(p: CorePlatform) -> Self {
        match p {
            CorePlatform::Ios => Self::Ios,
            CorePlatform::Android => Self::Android,
        }
    }
}

impl From<Platform> for CorePlatform {
    fn from(p: Platform) -> Self {
        match p {
            Platform::Ios => Self::Ios,
            Platform::Android => Self::Android,
        }
    }
}

/// Payload members the typed fields do not cover, as a JSON object.
fn extra_json(extra: Map<String, Value>) -> Option<String> {
    (!extra.is_empty()).then(|| Value::Object(extra).to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub sid: String,
    pub identity: String,
    pub extra_json: Option<String>,
}

impl From<CoreParticipant> for Participant {
    fn from(p: CoreParticipant) -> Self {
        Self {
            sid: p.sid,
            identity: p.identity,
            extra_json: extra_json(p.extra),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub enabled: bool,
    pub track_name: String,
    pub track_sid: String,
    pub extra_json: Option<String>,
}

impl From<CoreTrack> for Track {
    fn from(t: CoreTrack) -> Self {
        Self {
            enabled: t.enabled,
            track_name: t.track_name,
            track_sid: t.track_sid,
            extra_json: extra_json(t.extra),
        }
    }
}

/// Error carried inside an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// SDK error with a numeric code.
    Twilio {
        code: u32,
        message: String,
        /// Known name for `code`, if any.
        name: Option<String>,
    },
    /// Any other shape, such as a bare string.
    Other { message: Option<String>, raw_json: String },
}

impl From<CoreEventError> for EventError {
    fn from(e: CoreEventError) -> Self {
        let text = e.message().map(str::to_string);
        match e {
            CoreEventError::Twilio(t) => Self::Twilio {
                name: t.kind().map(|k| k.name().to_string()),
                code: t.code,
                message: t.message,
            },
            CoreEventError::Other(raw) => Self::Other {
                message: text,
                raw_json: raw.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TwilioVideoEvent {
    RoomDidConnect { room_name: String, room_sid: String, participants: Vec<Participant>, extra_json: Option<String> },
    RoomDidDisconnect { room_name: String, room_sid: String, participant: Option<String>, error: Option<EventError>, extra_json: Option<String> },
    RoomDidFailToConnect { room_name: String, room_sid: String, participant: Option<String>, error: Option<EventError>, extra_json: Option<String> },
    RoomParticipantDidConnect { room_name: String, room_sid: String, participant: Participant, extra_json: Option<String> },
    RoomParticipantDidDisconnect { room_name: String, room_sid: String, participant: Participant, extra_json: Option<String> },
    ParticipantAddedVideoTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    ParticipantRemovedVideoTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    ParticipantAddedAudioTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    ParticipantRemovedAudioTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    ParticipantAddedDataTrack { participant: Participant, track_json: Option<String>, extra_json: Option<String> },
    ParticipantRemovedDataTrack { participant: Participant, track_json: Option<String>, extra_json: Option<String> },
    ParticipantEnabledVideoTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    ParticipantDisabledVideoTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    ParticipantEnabledAudioTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    ParticipantDisabledAudioTrack { participant: Participant, track: Track, error: Option<EventError>, extra_json: Option<String> },
    DataTrackMessageReceived { message: String, sender_id: Option<String>, extra_json: Option<String> },
    StatsReceived { stats_json: String },
    CameraDidStart { extra_json: Option<String> },
    CameraWasInterrupted { extra_json: Option<String> },
    CameraInterruptionEnded { extra_json: Option<String> },
    CameraDidStopRunning { error: Option<String>, extra_json: Option<String> },
}

struct TrackParts {
    participant: Participant,
    track: Track,
    error: Option<EventError>,
    extra_json: Option<String>,
}

impl From<CoreTrackEvent> for TrackParts {
    fn from(e: CoreTrackEvent) -> Self {
        Self {
            participant: e.participant.into(),
            track: e.track.into(),
            error: e.error.map(EventError::from),
            extra_json: extra_json(e.extra),
        }
    }
}

macro_rules! track_event {
    ($variant:ident, $event:expr) => {{
        let TrackParts { participant, track, error, extra_json } = $event.into();
        TwilioVideoEvent::$variant { participant, track, error, extra_json }
    }};
}

impl From<CoreVideoEvent> for TwilioVideoEvent {
    fn from(e: CoreVideoEvent) -> Self {
        match e {
            CoreVideoEvent::RoomDidConnect(r) => Self::RoomDidConnect {
                room_name: r.room_name,
                room_sid: r.room_sid,
                participants: r.participants.into_iter().map(Participant::from).collect(),
                extra_json: extra_json(r.extra),
            },
            CoreVideoEvent::RoomDidDisconnect(r) => Self::RoomDidDisconnect {
                room_name: r.room_name,
                room_sid: r.room_sid,
                participant: r.participant,
                error: r.error.map(EventError::from),
                extra_json: extra_json(r.extra),
            },
            CoreVideoEvent::RoomDidFailToConnect(r) => Self::RoomDidFailToConnect {
                room_name: r.room_name,
                room_sid: r.room_sid,
                participant: r.participant,
                error: r.error.map(EventError::from),
                extra_json: extra_json(r.extra),
            },
            CoreVideoEvent::RoomParticipantDidConnect(p) => Self::RoomParticipantDidConnect {
                room_name: p.room_name,
                room_sid: p.room_sid,
                participant: p.participant.into(),
                extra_json: extra_json(p.extra),
            },
            CoreVideoEvent::RoomParticipantDidDisconnect(p) => Self::RoomParticipantDidDisconnect {
                room_name: p.room_name,
                room_sid: p.room_sid,
                participant: p.participant.into(),
                extra_json: extra_json(p.extra),
            },
            CoreVideoEvent::ParticipantAddedVideoTrack(t) => track_event!(ParticipantAddedVideoTrack, t),
            CoreVideoEvent::ParticipantRemovedVideoTrack(t) => track_event!(ParticipantRemovedVideoTrack, t),
            CoreVideoEvent::ParticipantAddedAudioTrack(t) => track_event!(ParticipantAddedAudioTrack, t),
            CoreVideoEvent::ParticipantRemovedAudioTrack(t) => track_event!(ParticipantRemovedAudioTrack, t),
            CoreVideoEvent::ParticipantAddedDataTrack(d) => Self::ParticipantAddedDataTrack {
                participant: d.participant.into(),
                track_json: d.track.map(|v| v.to_string()),
                extra_json: extra_json(d.extra),
            },
            CoreVideoEvent::ParticipantRemovedDataTrack(d) => Self::ParticipantRemovedDataTrack {
                participant: d.participant.into(),
                track_json: d.track.map(|v| v.to_string()),
                extra_json: extra_json(d.extra),
            },
            CoreVideoEvent::ParticipantEnabledVideoTrack(t) => track_event!(ParticipantEnabledVideoTrack, t),
            CoreVideoEvent::ParticipantDisabledVideoTrack(t) => track_event!(ParticipantDisabledVideoTrack, t),
            CoreVideoEvent::ParticipantEnabledAudioTrack(t) => track_event!(ParticipantEnabledAudioTrack, t),
            CoreVideoEvent::ParticipantDisabledAudioTrack(t) => track_event!(ParticipantDisabledAudioTrack, t),
            CoreVideoEvent::DataTrackMessageReceived(m) => Self::DataTrackMessageReceived {
                message: m.message,
                sender_id: m.sender_id,
                extra_json: extra_json(m.extra),
            },
            CoreVideoEvent::StatsReceived(report) => Self::StatsReceived {
                stats_json: serde_json::to_string(&report).unwrap_or_else(|e| {
                    tracing::warn!("failed to encode stats report: {e}");
                    "{}".to_string()
                }),
            },
            CoreVideoEvent::CameraDidStart(c) => Self::CameraDidStart { extra_json: extra_json(c.extra) },
            CoreVideoEvent::CameraWasInterrupted(c) => Self::CameraWasInterrupted { extra_json: extra_json(c.extra) },
            CoreVideoEvent::CameraInterruptionEnded(c) => Self::CameraInterruptionEnded { extra_json: extra_json(c.extra) },
            CoreVideoEvent::CameraDidStopRunning(c) => Self::CameraDidStopRunning {
                error: c.error,
                extra_json: extra_json(c.extra),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub enable_audio: Option<bool>,
    pub enable_video: Option<bool>,
    pub enable_remote_audio: Option<bool>,
    pub enable_h264_codec: Option<bool>,
    pub audio_bitrate: Option<u32>,
    pub video_bitrate: Option<u32>,
}

impl From<ConnectionOptions> for twilio_video_core::ConnectionOptions {
    fn from(o: ConnectionOptions) -> Self {
        Self {
            enable_audio: o.enable_audio,
            enable_video: o.enable_video,
            enable_remote_audio: o.enable_remote_audio,
            enable_h264_codec: o.enable_h264_codec,
            audio_bitrate: o.audio_bitrate,
            video_bitrate: o.video_bitrate,
        }
    }
}

/// Connect options as handed to the iOS host, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeConnectOptions {
    pub enable_audio: bool,
    pub enable_video: bool,
    pub enable_remote_audio: Option<bool>,
    pub enable_h264_codec: Option<bool>,
    pub audio_bitrate: Option<u32>,
    pub video_bitrate: Option<u32>,
}

impl From<&NormalizedConnectOptions> for NativeConnectOptions {
    fn from(o: &NormalizedConnectOptions) -> Self {
        Self {
            enable_audio: o.enable_audio,
            enable_video: o.enable_video,
            enable_remote_audio: o.enable_remote_audio,
            enable_h264_codec: o.enable_h264_codec,
            audio_bitrate: o.audio_bitrate,
            video_bitrate: o.video_bitrate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub enable_audio_on_join: bool,
    pub enable_video_on_join: bool,
    pub enable_h264_codec: bool,
    pub speaker_on_join: bool,
    pub stats_interval_ms: Option<u64>,
}

impl From<twilio_video_core::Preferences> for Preferences {
    fn from(p: twilio_video_core::Preferences) -> Self {
        Self {
            enable_audio_on_join: p.enable_audio_on_join,
            enable_video_on_join: p.enable_video_on_join,
            enable_h264_codec: p.enable_h264_codec,
            speaker_on_join: p.speaker_on_join,
            stats_interval_ms: p.stats_interval_ms,
        }
    }
}

// ── Error conversion ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum TwilioVideoError {
    #[error("Unsupported platform: {msg}")]
    UnsupportedPlatform { msg: String },
    #[error("Module unavailable: {msg}")]
    ModuleUnavailable { msg: String },
    #[error("Unknown event: {msg}")]
    UnknownEvent { msg: String },
    #[error("Rejected ({code}): {msg}")]
    Rejected { code: String, msg: String },
    #[error("Promise dropped: {msg}")]
    PromiseDropped { msg: String },
    #[error("Invalid stats interval: {msg}")]
    InvalidStatsInterval { msg: String },
    #[error("No runtime: {msg}")]
    NoRuntime { msg: String },
    #[error("Listener error: {msg}")]
    Listener { msg: String },
    #[error("Invalid payload: {msg}")]
    InvalidPayload { msg: String },
}

impl From<twilio_video_core::BridgeError> for TwilioVideoError {
    fn from(e: twilio_video_core::BridgeError) -> Self {
        use twilio_video_core::BridgeError as E;
        tracing::error!("BridgeError: {e}");
        let msg = e.to_string();
        match e {
            E::UnsupportedPlatform(_) => Self::UnsupportedPlatform { msg },
            E::ModuleUnavailable(_) => Self::ModuleUnavailable { msg },
            E::UnknownEvent(_) => Self::UnknownEvent { msg },
            E::Rejected(r) => Self::Rejected {
                code: r.code,
                msg: r.message,
            },
            E::PromiseDropped => Self::PromiseDropped { msg },
            E::InvalidStatsInterval => Self::InvalidStatsInterval { msg },
            E::NoRuntime => Self::NoRuntime { msg },
            E::Listener { .. } => Self::Listener { msg },
        }
    }
}

/// Error a host callback can raise to reject a promise-returning call.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Rejected ({code}): {msg}")]
    Rejected { code: String, msg: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for HostError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Rejected {
            code: "E_CALLBACK".to_string(),
            msg: e.reason,
        }
    }
}

impl From<HostError> for NativeRejection {
    fn from(e: HostError) -> Self {
        match e {
            HostError::Rejected { code, msg } => NativeRejection::new(code, msg),
        }
    }
}

// ── Callback interfaces ───────────────────────────────────────────────

pub trait TwilioVideoListener: Send + Sync {
    fn on_event(&self, event: TwilioVideoEvent);
}

/// Host-side iOS video module.
pub trait IosHostModule: Send + Sync {
    fn connect(&self, room_name: String, access_token: String, options: NativeConnectOptions);
    fn disconnect(&self);
    fn flip_camera(&self);
    fn set_local_video_enabled(&self, enabled: bool) -> Result<bool, HostError>;
    fn set_local_audio_enabled(&self, enabled: bool) -> Result<bool, HostError>;
    fn set_remote_audio_playback(&self, participant_sid: String, enabled: bool);
    fn send_string(&self, message: String);
    fn get_stats(&self);
    fn toggle_sound_setup(&self, speaker: bool);
    fn start_local_video(&self);
    fn stop_local_video(&self);
    fn start_local_audio(&self);
    fn stop_local_audio(&self);
    fn change_listener_status(&self, enabled: bool);
}

/// Host-side Android view manager. `args_json` is a JSON array.
pub trait AndroidHostView: Send + Sync {
    fn dispatch_command(&self, command_id: u32, command_name: String, args_json: String);
}

// ── Host adapters: FFI callbacks → core native traits ──────────────────

/// Emitter fed by `deliver_native_event`, keyed by the host's event names.
#[derive(Default)]
struct HostEmitter {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, String, Arc<dyn NativeListener>)>>,
}

impl HostEmitter {
    fn add(&self, event_name: &str, listener: Arc<dyn NativeListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, event_name.to_string(), listener));
        id
    }

    fn remove(&self, id: ListenerId) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(lid, _, _)| *lid != id);
    }

    fn emit(&self, event_name: &str, body: Value) -> usize {
        // Snapshot so listeners can re-enter the emitter.
        let targets: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, name, _)| name == event_name)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in &targets {
            listener.on_native_event(body.clone());
        }
        targets.len()
    }
}

struct IosHost {
    host: Box<dyn IosHostModule>,
    emitter: Arc<HostEmitter>,
}

impl NativeEventEmitter for IosHost {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection> {
        Ok(self.emitter.add(event_name, listener))
    }

    fn remove_listener(&self, id: ListenerId) {
        self.emitter.remove(id);
    }
}

impl IosVideoModule for IosHost {
    fn connect(&self, room_name: &str, access_token: &str, options: &NormalizedConnectOptions) {
        self.host
            .connect(room_name.to_string(), access_token.to_string(), options.into());
    }

    fn disconnect(&self) {
        self.host.disconnect();
    }

    fn flip_camera(&self) {
        self.host.flip_camera();
    }

    fn set_local_video_enabled(&self, enabled: bool, promise: Promise<bool>) {
        promise.settle(self.host.set_local_video_enabled(enabled).map_err(NativeRejection::from));
    }

    fn set_local_audio_enabled(&self, enabled: bool, promise: Promise<bool>) {
        promise.settle(self.host.set_local_audio_enabled(enabled).map_err(NativeRejection::from));
    }

    fn set_remote_audio_playback(&self, participant_sid: &str, enabled: bool) {
        self.host
            .set_remote_audio_playback(participant_sid.to_string(), enabled);
    }

    fn send_string(&self, message: &str) {
        self.host.send_string(message.to_string());
    }

    fn get_stats(&self) {
        self.host.get_stats();
    }

    fn toggle_sound_setup(&self, speaker: bool) {
        self.host.toggle_sound_setup(speaker);
    }

    fn start_local_video(&self) {
        self.host.start_local_video();
    }

    fn stop_local_video(&self) {
        self.host.stop_local_video();
    }

    fn start_local_audio(&self) {
        self.host.start_local_audio();
    }

    fn stop_local_audio(&self) {
        self.host.stop_local_audio();
    }

    fn change_listener_status(&self, enabled: bool) {
        self.host.change_listener_status(enabled);
    }
}

struct AndroidHost {
    host: Box<dyn AndroidHostView>,
    emitter: Arc<HostEmitter>,
}

impl NativeEventEmitter for AndroidHost {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection> {
        Ok(self.emitter.add(event_name, listener))
    }

    fn remove_listener(&self, id: ListenerId) {
        self.emitter.remove(id);
    }
}

impl AndroidVideoView for AndroidHost {
    fn dispatch_command(&self, command: ViewCommand, args: Vec<Value>) {
        self.host.dispatch_command(
            command.id(),
            command.name().to_string(),
            Value::Array(args).to_string(),
        );
    }
}

// ── Bridge listener: FFI callback → core listener ─────────────────────

struct BridgeListener {
    ffi_listener: Arc<dyn TwilioVideoListener>,
}

impl VideoEventListener for BridgeListener {
    fn on_event(&self, event: &CoreVideoEvent) {
        self.ffi_listener.on_event(event.clone().into());
    }
}

// ── TwilioVideoClient: main FFI object ────────────────────────────────

pub struct TwilioVideoClient {
    bridge: Bridge,
    emitter: Arc<HostEmitter>,
    subscriptions: Mutex<HashMap<u64, Vec<Subscription>>>,
    next_listener_id: AtomicU64,
    preferences: twilio_video_core::PreferencesStore,
    rt: tokio::runtime::Runtime,
}

impl TwilioVideoClient {
    pub fn new(
        platform: Platform,
        data_dir: String,
        ios_module: Option<Box<dyn IosHostModule>>,
        android_view: Option<Box<dyn AndroidHostView>>,
    ) -> Result<Self, TwilioVideoError> {
        tracing::debug!(?platform, "TwilioVideoClient::new()");
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| TwilioVideoError::NoRuntime { msg: e.to_string() })?;

        let emitter = Arc::new(HostEmitter::default());
        let mut modules = NativeModules::default();
        if let Some(host) = ios_module {
            modules = modules.with_ios(Arc::new(IosHost {
                host,
                emitter: emitter.clone(),
            }));
        }
        if let Some(host) = android_view {
            modules = modules.with_android(Arc::new(AndroidHost {
                host,
                emitter: emitter.clone(),
            }));
        }

        let bridge = Bridge::new(platform.into(), modules)?;
        let preferences = twilio_video_core::PreferencesStore::new(&data_dir);

        Ok(Self {
            bridge,
            emitter,
            subscriptions: Mutex::new(HashMap::new()),
            next_listener_id: AtomicU64::new(1),
            preferences,
            rt,
        })
    }

    fn subscriptions(&self) -> MutexGuard<'_, HashMap<u64, Vec<Subscription>>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Settled promises are read without entering the runtime, so a
    /// listener running on a runtime thread can still toggle media.
    fn wait<T: Send + 'static>(&self, pending: Pending<T>) -> Result<T, TwilioVideoError> {
        let settled = match pending.try_settled() {
            Ok(settled) => settled,
            Err(pending) => self.rt.block_on(async { pending.await }),
        };
        settled.map_err(TwilioVideoError::from)
    }

    pub fn platform(&self) -> Platform {
        self.bridge.platform().into()
    }

    /// Feed an event emitted by the host into the bridge. Returns how many
    /// native listeners received it.
    pub fn deliver_native_event(
        &self,
        event_name: String,
        payload_json: String,
    ) -> Result<u32, TwilioVideoError> {
        let body = if payload_json.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&payload_json)
                .map_err(|e| TwilioVideoError::InvalidPayload { msg: e.to_string() })?
        };
        let delivered = self.emitter.emit(&event_name, body);
        if delivered == 0 {
            tracing::trace!(event_name, "native event had no listener");
        }
        Ok(u32::try_from(delivered).unwrap_or(u32::MAX))
    }

    /// Register `listener` for one event, or every event when `event_name` is `None`.
    pub fn add_listener(
        &self,
        event_name: Option<String>,
        listener: Box<dyn TwilioVideoListener>,
    ) -> Result<u64, TwilioVideoError> {
        let events: Vec<EventName> = match event_name {
            Some(name) => vec![name.parse()?],
            None => EventName::ALL.to_vec(),
        };
        let bridge_listener: Arc<dyn VideoEventListener> = Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        });

        let subs = events
            .into_iter()
            .map(|event| self.bridge.on_shared(event, bridge_listener.clone()))
            .collect();
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions().insert(id, subs);
        Ok(id)
    }

    pub fn remove_listener(&self, id: u64) -> bool {
        // Subscriptions release on drop, outside the map lock.
        let removed = self.subscriptions().remove(&id);
        removed.is_some()
    }

    pub fn active_subscriptions(&self) -> u32 {
        u32::try_from(self.bridge.active_subscriptions()).unwrap_or(u32::MAX)
    }

    pub fn teardown(&self) {
        let released = std::mem::take(&mut *self.subscriptions());
        drop(released);
        self.bridge.teardown();
    }

    pub fn connect(&self, room_name: String, access_token: String, options: ConnectionOptions) {
        self.bridge
            .connect(&room_name, &access_token, &options.into());
    }

    /// Connect using stored preferences, then apply the audio route and
    /// periodic stats they ask for.
    pub fn connect_with_preferences(
        &self,
        room_name: String,
        access_token: String,
    ) -> Result<(), TwilioVideoError> {
        let prefs = self.preferences.get();
        // A hand-edited file may still hold 0.
        let stats_interval_ms = prefs.stats_interval_ms.filter(|ms| *ms > 0);
        if prefs.stats_interval_ms.is_some() && stats_interval_ms.is_none() {
            tracing::warn!("ignoring stored stats interval of 0");
        }
        let _guard = self.rt.enter();
        self.bridge
            .connect(&room_name, &access_token, &prefs.connection_options());
        self.bridge.toggle_sound_setup(prefs.speaker_on_join);
        if let Some(interval_ms) = stats_interval_ms {
            self.bridge.request_stats(interval_ms)?;
        }
        Ok(())
    }

    pub fn disconnect(&self) {
        self.bridge.disconnect();
    }

    pub fn flip_camera(&self) {
        self.bridge.flip_camera();
    }

    pub fn set_local_video_enabled(&self, enabled: bool) -> Result<bool, TwilioVideoError> {
        let pending = self.bridge.set_local_video_enabled(enabled);
        self.wait(pending)
    }

    pub fn set_local_audio_enabled(&self, enabled: bool) -> Result<bool, TwilioVideoError> {
        let pending = self.bridge.set_local_audio_enabled(enabled);
        self.wait(pending)
    }

    pub fn set_remote_audio_enabled(
        &self,
        participant_sid: Option<String>,
        enabled: bool,
    ) -> Result<bool, TwilioVideoError> {
        let pending = self
            .bridge
            .set_remote_audio_enabled(participant_sid.as_deref(), enabled);
        self.wait(pending)
    }

    pub fn set_bluetooth_headset_connected(&self, enabled: bool) -> Result<bool, TwilioVideoError> {
        let pending = self.bridge.set_bluetooth_headset_connected(enabled);
        self.wait(pending)
    }

    pub fn toggle_sound_setup(&self, speaker: bool) {
        self.bridge.toggle_sound_setup(speaker);
    }

    pub fn disable_open_sles(&self) {
        self.bridge.disable_open_sles();
    }

    pub fn send_string(&self, message: String) {
        self.bridge.send_string(&message);
    }

    pub fn get_stats(&self) {
        self.bridge.get_stats();
    }

    pub fn request_stats(&self, interval_ms: u64) -> Result<(), TwilioVideoError> {
        // Periodic polling runs on the client runtime.
        let _guard = self.rt.enter();
        self.bridge.request_stats(interval_ms).map_err(TwilioVideoError::from)
    }

    pub fn cancel_stats_request(&self) {
        self.bridge.cancel_stats_request();
    }

    pub fn get_preferences(&self) -> Preferences {
        self.preferences.get().into()
    }

    pub fn set_enable_audio_on_join(&self, enabled: bool) {
        self.preferences.set_enable_audio_on_join(enabled);
    }

    pub fn set_enable_video_on_join(&self, enabled: bool) {
        self.preferences.set_enable_video_on_join(enabled);
    }

    pub fn set_enable_h264_codec(&self, enabled: bool) {
        self.preferences.set_enable_h264_codec(enabled);
    }

    pub fn set_speaker_on_join(&self, speaker: bool) {
        self.preferences.set_speaker_on_join(speaker);
    }

    pub fn set_stats_interval_ms(&self, interval_ms: Option<u64>) {
        self.preferences.set_stats_interval_ms(interval_ms);
    }
}
