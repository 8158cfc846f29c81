//! Capability interfaces implemented by the host's native Twilio modules.
//!
//! The bridge never resolves a process-wide module: hosts hand their
//! implementations in through [`NativeModules`] and the bridge picks one
//! at construction.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::errors::{BridgeError, NativeRejection};
use crate::options::NormalizedConnectOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }

    /// Platform of the compilation target, if it is a supported one.
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "ios") {
            Some(Self::Ios)
        } else if cfg!(target_os = "android") {
            Some(Self::Android)
        } else {
            None
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ios") {
            Ok(Self::Ios)
        } else if s.eq_ignore_ascii_case("android") {
            Ok(Self::Android)
        } else {
            Err(BridgeError::UnsupportedPlatform(s.to_string()))
        }
    }
}

/// Handle a native emitter returns for one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Receives raw event bodies from a native emitter.
pub trait NativeListener: Send + Sync {
    fn on_native_event(&self, body: Value);
}

/// Named event channel exposed by a native module.
pub trait NativeEventEmitter: Send + Sync {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection>;

    fn remove_listener(&self, id: ListenerId);
}

/// The iOS module: direct methods plus its own event emitter.
pub trait IosVideoModule: NativeEventEmitter {
    fn connect(&self, room_name: &str, access_token: &str, options: &NormalizedConnectOptions);
    fn disconnect(&self);
    fn flip_camera(&self);
    fn set_local_video_enabled(&self, enabled: bool, promise: Promise<bool>);
    fn set_local_audio_enabled(&self, enabled: bool, promise: Promise<bool>);
    fn set_remote_audio_playback(&self, participant_sid: &str, enabled: bool);
    fn send_string(&self, message: &str);
    fn get_stats(&self);
    fn toggle_sound_setup(&self, speaker: bool);
    fn start_local_video(&self);
    fn stop_local_video(&self);
    fn start_local_audio(&self);
    fn stop_local_audio(&self);
    /// Turns native event emission on or off.
    fn change_listener_status(&self, enabled: bool);
}

/// The Android view component, driven through numbered commands.
pub trait AndroidVideoView: NativeEventEmitter {
    fn dispatch_command(&self, command: ViewCommand, args: Vec<Value>);
}

/// Command identifiers understood by the Android view manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ViewCommand {
    ConnectToRoom = 1,
    Disconnect = 2,
    SwitchCamera = 3,
    ToggleVideo = 4,
    ToggleSound = 5,
    GetStats = 6,
    DisableOpenSles = 7,
    ToggleSoundSetup = 8,
    ToggleRemoteSound = 9,
    ReleaseResource = 10,
    ToggleBluetoothHeadset = 11,
    SendString = 12,
}

impl ViewCommand {
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ConnectToRoom => "connectToRoom",
            Self::Disconnect => "disconnect",
            Self::SwitchCamera => "switchCamera",
            Self::ToggleVideo => "toggleVideo",
            Self::ToggleSound => "toggleSound",
            Self::GetStats => "getStats",
            Self::DisableOpenSles => "disableOpenSLES",
            Self::ToggleSoundSetup => "toggleSoundSetup",
            Self::ToggleRemoteSound => "toggleRemoteSound",
            Self::ReleaseResource => "releaseResource",
            Self::ToggleBluetoothHeadset => "toggleBluetoothHeadset",
            Self::SendString => "sendString",
        }
    }
}

/// Native modules available to the host. Only the one matching the
/// bridge's platform is ever used.
#[derive(Clone, Default)]
pub struct NativeModules {
    pub ios: Option<Arc<dyn IosVideoModule>>,
    pub android: Option<Arc<dyn AndroidVideoView>>,
}

impl NativeModules {
    pub fn with_ios(mut self, module: Arc<dyn IosVideoModule>) -> Self {
        self.ios = Some(module);
        self
    }

    pub fn with_android(mut self, view: Arc<dyn AndroidVideoView>) -> Self {
        self.android = Some(view);
        self
    }
}

type Settled<T> = Result<T, NativeRejection>;

/// Resolver handed to the native side for promise-returning calls.
pub struct Promise<T> {
    tx: oneshot::Sender<Settled<T>>,
}

impl<T> Promise<T> {
    pub fn resolve(self, value: T) {
        // The caller may have stopped waiting.
        let _ = self.tx.send(Ok(value));
    }

    pub fn reject(self, code: impl Into<String>, message: impl Into<String>) {
        let _ = self.tx.send(Err(NativeRejection::new(code, message)));
    }

    pub fn settle(self, result: Result<T, NativeRejection>) {
        let _ = self.tx.send(result);
    }
}

/// Caller side of a [`Promise`]. The native call has already been issued
/// when this is handed out; awaiting it only waits for the outcome.
pub struct Pending<T> {
    rx: oneshot::Receiver<Settled<T>>,
}

impl<T> Pending<T> {
    pub fn channel() -> (Promise<T>, Pending<T>) {
        let (tx, rx) = oneshot::channel();
        (Promise { tx }, Pending { rx })
    }

    /// Already-settled value, for backends that answer without the native side.
    pub fn ready(value: T) -> Self {
        let (promise, pending) = Self::channel();
        promise.resolve(value);
        pending
    }

    /// The outcome if the native side has already settled, otherwise the
    /// still-pending handle.
    pub fn try_settled(mut self) -> Result<Result<T, BridgeError>, Self> {
        match self.rx.try_recv() {
            Ok(settled) => Ok(settled.map_err(BridgeError::Rejected)),
            Err(oneshot::error::TryRecvError::Empty) => Err(self),
            Err(oneshot::error::TryRecvError::Closed) => Ok(Err(BridgeError::PromiseDropped)),
        }
    }
}

impl<T: Send + 'static> IntoFuture for Pending<T> {
    type Output = Result<T, BridgeError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            match self.rx.await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(rejection)) => Err(BridgeError::Rejected(rejection)),
                Err(_) => Err(BridgeError::PromiseDropped),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("ios".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Android);
        assert!(matches!(
            "windows".parse::<Platform>(),
            Err(BridgeError::UnsupportedPlatform(p)) if p == "windows"
        ));
    }

    #[test]
    fn view_command_ids_are_stable() {
        assert_eq!(ViewCommand::ConnectToRoom.id(), 1);
        assert_eq!(ViewCommand::ToggleVideo.id(), 4);
        assert_eq!(ViewCommand::ReleaseResource.id(), 10);
        assert_eq!(ViewCommand::SendString.id(), 12);
        assert_eq!(ViewCommand::GetStats.id(), 6);
        assert_eq!(ViewCommand::GetStats.name(), "getStats");
    }

    #[tokio::test]
    async fn pending_resolves_with_native_value() {
        let (promise, pending) = Pending::channel();
        promise.resolve(true);
        assert!(pending.await.unwrap());
    }

    #[tokio::test]
    async fn pending_surfaces_rejection_unmodified() {
        let (promise, pending) = Pending::<bool>::channel();
        promise.reject("E_AUDIO", "no local audio track");
        match pending.await {
            Err(BridgeError::Rejected(r)) => {
                assert_eq!(r.code, "E_AUDIO");
                assert_eq!(r.message, "no local audio track");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_promise_is_reported() {
        let (promise, pending) = Pending::<bool>::channel();
        drop(promise);
        assert!(matches!(pending.await, Err(BridgeError::PromiseDropped)));
    }

    #[tokio::test]
    async fn ready_is_already_settled() {
        assert!(!Pending::ready(false).await.unwrap());
    }

    #[test]
    fn try_settled_reports_each_state() {
        let (promise, pending) = Pending::<bool>::channel();
        let pending = match pending.try_settled() {
            Err(still_pending) => still_pending,
            Ok(_) => panic!("settled before the native side answered"),
        };
        promise.resolve(false);
        assert!(matches!(pending.try_settled(), Ok(Ok(false))));

        let (promise, pending) = Pending::<bool>::channel();
        drop(promise);
        assert!(matches!(pending.try_settled(), Ok(Err(BridgeError::PromiseDropped))));

        let (promise, pending) = Pending::<bool>::channel();
        promise.reject("E_VIDEO", "no camera");
        assert!(matches!(
            pending.try_settled(),
            Ok(Err(BridgeError::Rejected(r))) if r.code == "E_VIDEO"
        ));
    }
}
