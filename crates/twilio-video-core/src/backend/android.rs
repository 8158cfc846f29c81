use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::backend::VideoBackend;
use crate::errors::{BridgeError, NativeRejection};
use crate::events::EventName;
use crate::native::{AndroidVideoView, ListenerId, NativeListener, Pending, Platform, ViewCommand};
use crate::options::NormalizedConnectOptions;
use crate::stats::StatsSchedule;

/// Drives the Android view through view-manager commands and listens on
/// the `TwilioVideo.on*` device event channels.
///
/// Commands return nothing, so promise-returning toggles settle with the
/// requested value as soon as the command is dispatched. The view has no
/// recurring stats command, so periodic stats re-dispatch `getStats`.
pub struct AndroidBackend {
    view: Arc<dyn AndroidVideoView>,
    stats: StatsSchedule,
}

impl AndroidBackend {
    pub fn new(view: Arc<dyn AndroidVideoView>) -> Self {
        Self {
            view,
            stats: StatsSchedule::default(),
        }
    }

    fn run(&self, command: ViewCommand, args: Vec<Value>) {
        dispatch(self.view.as_ref(), command, args);
    }
}

fn dispatch(view: &dyn AndroidVideoView, command: ViewCommand, args: Vec<Value>) {
    tracing::trace!(command = command.name(), id = command.id(), "dispatching view command");
    view.dispatch_command(command, args);
}

impl VideoBackend for AndroidBackend {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn supports(&self, event: EventName) -> bool {
        !event.is_camera_lifecycle()
    }

    fn attach(&self) {}

    fn stop_events(&self) {
        self.stats.cancel();
    }

    fn detach(&self) {
        self.run(ViewCommand::ReleaseResource, vec![]);
    }

    fn connect(&self, room_name: &str, access_token: &str, options: &NormalizedConnectOptions) {
        if options.enable_h264_codec.is_some() || options.audio_bitrate.is_some() {
            tracing::debug!("codec and bitrate options are not forwarded on Android");
        }
        self.run(
            ViewCommand::ConnectToRoom,
            vec![
                json!(room_name),
                json!(access_token),
                json!(options.enable_audio),
                json!(options.enable_video),
                json!(options.enable_remote_audio.unwrap_or(true)),
            ],
        );
    }

    fn disconnect(&self) {
        self.run(ViewCommand::Disconnect, vec![]);
    }

    fn flip_camera(&self) {
        self.run(ViewCommand::SwitchCamera, vec![]);
    }

    fn set_local_video_enabled(&self, enabled: bool) -> Pending<bool> {
        self.run(ViewCommand::ToggleVideo, vec![json!(enabled)]);
        Pending::ready(enabled)
    }

    fn set_local_audio_enabled(&self, enabled: bool) -> Pending<bool> {
        self.run(ViewCommand::ToggleSound, vec![json!(enabled)]);
        Pending::ready(enabled)
    }

    fn set_remote_audio_enabled(
        &self,
        participant_sid: Option<&str>,
        enabled: bool,
    ) -> Pending<bool> {
        // The Android view toggles every remote participant at once.
        if let Some(sid) = participant_sid {
            tracing::debug!(participant_sid = sid, "participant scope ignored on Android");
        }
        self.run(ViewCommand::ToggleRemoteSound, vec![json!(enabled)]);
        Pending::ready(enabled)
    }

    fn set_bluetooth_headset_connected(&self, enabled: bool) -> Pending<bool> {
        self.run(ViewCommand::ToggleBluetoothHeadset, vec![json!(enabled)]);
        Pending::ready(enabled)
    }

    fn toggle_sound_setup(&self, speaker: bool) {
        self.run(ViewCommand::ToggleSoundSetup, vec![json!(speaker)]);
    }

    fn disable_open_sles(&self) {
        self.run(ViewCommand::DisableOpenSles, vec![]);
    }

    fn send_string(&self, message: &str) {
        self.run(ViewCommand::SendString, vec![json!(message)]);
    }

    fn get_stats(&self) {
        self.run(ViewCommand::GetStats, vec![]);
    }

    fn request_stats(&self, interval: Duration) -> Result<(), BridgeError> {
        let view = self.view.clone();
        self.stats.start(interval, move || {
            dispatch(view.as_ref(), ViewCommand::GetStats, vec![]);
        })
    }

    fn cancel_stats_request(&self) {
        self.stats.cancel();
    }

    fn subscribe(
        &self,
        event: EventName,
        listener: Arc<dyn NativeListener>,
    ) -> Result<ListenerId, NativeRejection> {
        self.view.add_listener(event.android_channel(), listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.view.remove_listener(id);
    }
}
