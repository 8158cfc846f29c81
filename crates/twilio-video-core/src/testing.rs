//! Recording native modules for tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::errors::NativeRejection;
use crate::native::{
    AndroidVideoView, IosVideoModule, ListenerId, NativeEventEmitter, NativeListener, Promise,
    ViewCommand,
};
use crate::options::NormalizedConnectOptions;

pub struct NullListener;

impl NativeListener for NullListener {
    fn on_native_event(&self, _body: Value) {}
}

/// In-memory emitter shared by both fakes.
#[derive(Default)]
pub struct FakeEmitter {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, String, Arc<dyn NativeListener>)>>,
    history: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
}

impl FakeEmitter {
    fn add(&self, name: &str, listener: Arc<dyn NativeListener>) -> Result<ListenerId, NativeRejection> {
        if self.fail_on.lock().unwrap().as_deref() == Some(name) {
            return Err(NativeRejection::new("E_LISTENER", format!("cannot listen to {name}")));
        }
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().unwrap().push((id, name.to_string(), listener));
        self.history.lock().unwrap().push(name.to_string());
        Ok(id)
    }

    fn remove(&self, id: ListenerId) {
        self.listeners.lock().unwrap().retain(|(lid, _, _)| *lid != id);
    }

    /// Deliver `body` to every listener on `name`; returns how many were called.
    pub fn emit(&self, name: &str, body: Value) -> usize {
        let targets: Vec<_> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, n, _)| n == name)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in &targets {
            listener.on_native_event(body.clone());
        }
        targets.len()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn listened_names(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }

    pub fn fail_on(&self, name: &str) {
        *self.fail_on.lock().unwrap() = Some(name.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IosCall {
    Connect {
        room_name: String,
        access_token: String,
        options: NormalizedConnectOptions,
    },
    Disconnect,
    FlipCamera,
    SetLocalVideoEnabled(bool),
    SetLocalAudioEnabled(bool),
    SetRemoteAudioPlayback(String, bool),
    SendString(String),
    GetStats,
    ToggleSoundSetup(bool),
    StartLocalVideo,
    StopLocalVideo,
    StartLocalAudio,
    StopLocalAudio,
    ChangeListenerStatus(bool),
    RemoveListener,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseMode {
    Resolve,
    Reject,
    Drop,
}

pub struct FakeIosModule {
    calls: Mutex<Vec<IosCall>>,
    promise_mode: Mutex<PromiseMode>,
    pub emitter: FakeEmitter,
}

impl FakeIosModule {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            promise_mode: Mutex::new(PromiseMode::Resolve),
            emitter: FakeEmitter::default(),
        }
    }

    pub fn calls(&self) -> Vec<IosCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &IosCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn set_promise_mode(&self, mode: PromiseMode) {
        *self.promise_mode.lock().unwrap() = mode;
    }

    pub fn listened_names(&self) -> Vec<String> {
        self.emitter.listened_names()
    }

    fn record(&self, call: IosCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn settle(&self, enabled: bool, promise: Promise<bool>) {
        match *self.promise_mode.lock().unwrap() {
            PromiseMode::Resolve => promise.resolve(enabled),
            PromiseMode::Reject => promise.reject("E_FAKE", "rejected by fake"),
            PromiseMode::Drop => drop(promise),
        }
    }
}

impl NativeEventEmitter for FakeIosModule {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection> {
        self.emitter.add(event_name, listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.record(IosCall::RemoveListener);
        self.emitter.remove(id);
    }
}

impl IosVideoModule for FakeIosModule {
    fn connect(&self, room_name: &str, access_token: &str, options: &NormalizedConnectOptions) {
        self.record(IosCall::Connect {
            room_name: room_name.to_string(),
            access_token: access_token.to_string(),
            options: options.clone(),
        });
    }

    fn disconnect(&self) {
        self.record(IosCall::Disconnect);
    }

    fn flip_camera(&self) {
        self.record(IosCall::FlipCamera);
    }

    fn set_local_video_enabled(&self, enabled: bool, promise: Promise<bool>) {
        self.record(IosCall::SetLocalVideoEnabled(enabled));
        self.settle(enabled, promise);
    }

    fn set_local_audio_enabled(&self, enabled: bool, promise: Promise<bool>) {
        self.record(IosCall::SetLocalAudioEnabled(enabled));
        self.settle(enabled, promise);
    }

    fn set_remote_audio_playback(&self, participant_sid: &str, enabled: bool) {
        self.record(IosCall::SetRemoteAudioPlayback(participant_sid.to_string(), enabled));
    }

    fn send_string(&self, message: &str) {
        self.record(IosCall::SendString(message.to_string()));
    }

    fn get_stats(&self) {
        self.record(IosCall::GetStats);
    }

    fn toggle_sound_setup(&self, speaker: bool) {
        self.record(IosCall::ToggleSoundSetup(speaker));
    }

    fn start_local_video(&self) {
        self.record(IosCall::StartLocalVideo);
    }

    fn stop_local_video(&self) {
        self.record(IosCall::StopLocalVideo);
    }

    fn start_local_audio(&self) {
        self.record(IosCall::StartLocalAudio);
    }

    fn stop_local_audio(&self) {
        self.record(IosCall::StopLocalAudio);
    }

    fn change_listener_status(&self, enabled: bool) {
        self.record(IosCall::ChangeListenerStatus(enabled));
    }
}

pub struct FakeAndroidView {
    commands: Mutex<Vec<(u32, Vec<Value>)>>,
    pub emitter: FakeEmitter,
}

impl FakeAndroidView {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            emitter: FakeEmitter::default(),
        }
    }

    pub fn commands(&self) -> Vec<(u32, Vec<Value>)> {
        self.commands.lock().unwrap().clone()
    }

    pub fn listened_names(&self) -> Vec<String> {
        self.emitter.listened_names()
    }
}

impl NativeEventEmitter for FakeAndroidView {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection> {
        self.emitter.add(event_name, listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.emitter.remove(id);
    }
}

impl AndroidVideoView for FakeAndroidView {
    fn dispatch_command(&self, command: ViewCommand, args: Vec<Value>) {
        self.commands.lock().unwrap().push((command.id(), args));
    }
}
