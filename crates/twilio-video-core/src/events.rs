use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{BridgeError, TwilioError};
use crate::stats::StatsReport;

macro_rules! event_names {
    ($($variant:ident => $name:literal, $channel:literal;)+) => {
        /// Every event the bridge listens for.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EventName {
            $($variant,)+
        }

        impl EventName {
            pub const ALL: &'static [EventName] = &[$(EventName::$variant,)+];

            /// Name used by the iOS emitter, e.g. `roomDidConnect`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Channel used by the Android emitter, e.g. `TwilioVideo.onRoomDidConnect`.
            pub fn android_channel(self) -> &'static str {
                match self {
                    $(Self::$variant => $channel,)+
                }
            }
        }

        impl FromStr for EventName {
            type Err = BridgeError;

            /// Accepts both the bare name and the Android channel name.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name | $channel => Ok(Self::$variant),)+
                    other => Err(BridgeError::UnknownEvent(other.to_string())),
                }
            }
        }
    };
}

event_names! {
    RoomDidConnect => "roomDidConnect", "TwilioVideo.onRoomDidConnect";
    RoomDidDisconnect => "roomDidDisconnect", "TwilioVideo.onRoomDidDisconnect";
    RoomDidFailToConnect => "roomDidFailToConnect", "TwilioVideo.onRoomDidFailToConnect";
    RoomParticipantDidConnect => "roomParticipantDidConnect", "TwilioVideo.onRoomParticipantDidConnect";
    RoomParticipantDidDisconnect => "roomParticipantDidDisconnect", "TwilioVideo.onRoomParticipantDidDisconnect";
    ParticipantAddedVideoTrack => "participantAddedVideoTrack", "TwilioVideo.onParticipantAddedVideoTrack";
    ParticipantRemovedVideoTrack => "participantRemovedVideoTrack", "TwilioVideo.onParticipantRemovedVideoTrack";
    ParticipantAddedAudioTrack => "participantAddedAudioTrack", "TwilioVideo.onParticipantAddedAudioTrack";
    ParticipantRemovedAudioTrack => "participantRemovedAudioTrack", "TwilioVideo.onParticipantRemovedAudioTrack";
    ParticipantAddedDataTrack => "participantAddedDataTrack", "TwilioVideo.onParticipantAddedDataTrack";
    ParticipantRemovedDataTrack => "participantRemovedDataTrack", "TwilioVideo.onParticipantRemovedDataTrack";
    ParticipantEnabledVideoTrack => "participantEnabledVideoTrack", "TwilioVideo.onParticipantEnabledVideoTrack";
    ParticipantDisabledVideoTrack => "participantDisabledVideoTrack", "TwilioVideo.onParticipantDisabledVideoTrack";
    ParticipantEnabledAudioTrack => "participantEnabledAudioTrack", "TwilioVideo.onParticipantEnabledAudioTrack";
    ParticipantDisabledAudioTrack => "participantDisabledAudioTrack", "TwilioVideo.onParticipantDisabledAudioTrack";
    DataTrackMessageReceived => "dataTrackMessageReceived", "TwilioVideo.onDataTrackMessageReceived";
    StatsReceived => "statsReceived", "TwilioVideo.onStatsReceived";
    CameraDidStart => "cameraDidStart", "TwilioVideo.onCameraDidStart";
    CameraWasInterrupted => "cameraWasInterrupted", "TwilioVideo.onCameraWasInterrupted";
    CameraInterruptionEnded => "cameraInterruptionEnded", "TwilioVideo.onCameraInterruptionEnded";
    CameraDidStopRunning => "cameraDidStopRunning", "TwilioVideo.onCameraDidStopRunning";
}

impl EventName {
    /// Camera lifecycle events only exist on iOS.
    pub fn is_camera_lifecycle(self) -> bool {
        matches!(
            self,
            Self::CameraDidStart
                | Self::CameraWasInterrupted
                | Self::CameraInterruptionEnded
                | Self::CameraDidStopRunning
        )
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields the typed payloads do not model, kept exactly as the SDK sent them.
pub type Extra = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub sid: String,
    pub identity: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub enabled: bool,
    pub track_name: String,
    pub track_sid: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// The `error` member of an event.
///
/// An object carrying a numeric `code` and a `message` is an SDK error.
/// Anything else, such as the bare string Android sends when no camera is
/// available, is kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventError {
    Twilio(TwilioError),
    Other(Value),
}

impl EventError {
    pub fn twilio(&self) -> Option<&TwilioError> {
        match self {
            Self::Twilio(e) => Some(e),
            Self::Other(_) => None,
        }
    }

    /// Human-readable text, when the error has any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Twilio(e) => Some(&e.message),
            Self::Other(Value::String(s)) => Some(s),
            Self::Other(Value::Object(o)) => o.get("message").and_then(Value::as_str),
            Self::Other(_) => None,
        }
    }
}

/// `roomDidConnect`: the room and everyone already in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEvent {
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub room_sid: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `roomDidDisconnect` / `roomDidFailToConnect`. A clean disconnect has no error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomErrorEvent {
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub room_sid: String,
    /// Identity of the local participant, when the SDK reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EventError>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEvent {
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub room_sid: String,
    pub participant: Participant,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Audio and video track events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub participant: Participant,
    pub track: Track,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EventError>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Data track added/removed. The track body differs per SDK and is kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTrackEvent {
    pub participant: Participant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Camera lifecycle payload; `cameraDidStopRunning` carries a description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A normalized native event, as delivered to UI listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoEvent {
    RoomDidConnect(RoomEvent),
    RoomDidDisconnect(RoomErrorEvent),
    RoomDidFailToConnect(RoomErrorEvent),
    RoomParticipantDidConnect(ParticipantEvent),
    RoomParticipantDidDisconnect(ParticipantEvent),
    ParticipantAddedVideoTrack(TrackEvent),
    ParticipantRemovedVideoTrack(TrackEvent),
    ParticipantAddedAudioTrack(TrackEvent),
    ParticipantRemovedAudioTrack(TrackEvent),
    ParticipantAddedDataTrack(DataTrackEvent),
    ParticipantRemovedDataTrack(DataTrackEvent),
    ParticipantEnabledVideoTrack(TrackEvent),
    ParticipantDisabledVideoTrack(TrackEvent),
    ParticipantEnabledAudioTrack(TrackEvent),
    ParticipantDisabledAudioTrack(TrackEvent),
    DataTrackMessageReceived(DataMessage),
    StatsReceived(StatsReport),
    CameraDidStart(CameraEvent),
    CameraWasInterrupted(CameraEvent),
    CameraInterruptionEnded(CameraEvent),
    CameraDidStopRunning(CameraEvent),
}

impl VideoEvent {
    pub fn name(&self) -> EventName {
        match self {
            Self::RoomDidConnect(_) => EventName::RoomDidConnect,
            Self::RoomDidDisconnect(_) => EventName::RoomDidDisconnect,
            Self::RoomDidFailToConnect(_) => EventName::RoomDidFailToConnect,
            Self::RoomParticipantDidConnect(_) => EventName::RoomParticipantDidConnect,
            Self::RoomParticipantDidDisconnect(_) => EventName::RoomParticipantDidDisconnect,
            Self::ParticipantAddedVideoTrack(_) => EventName::ParticipantAddedVideoTrack,
            Self::ParticipantRemovedVideoTrack(_) => EventName::ParticipantRemovedVideoTrack,
            Self::ParticipantAddedAudioTrack(_) => EventName::ParticipantAddedAudioTrack,
            Self::ParticipantRemovedAudioTrack(_) => EventName::ParticipantRemovedAudioTrack,
            Self::ParticipantAddedDataTrack(_) => EventName::ParticipantAddedDataTrack,
            Self::ParticipantRemovedDataTrack(_) => EventName::ParticipantRemovedDataTrack,
            Self::ParticipantEnabledVideoTrack(_) => EventName::ParticipantEnabledVideoTrack,
            Self::ParticipantDisabledVideoTrack(_) => EventName::ParticipantDisabledVideoTrack,
            Self::ParticipantEnabledAudioTrack(_) => EventName::ParticipantEnabledAudioTrack,
            Self::ParticipantDisabledAudioTrack(_) => EventName::ParticipantDisabledAudioTrack,
            Self::DataTrackMessageReceived(_) => EventName::DataTrackMessageReceived,
            Self::StatsReceived(_) => EventName::StatsReceived,
            Self::CameraDidStart(_) => EventName::CameraDidStart,
            Self::CameraWasInterrupted(_) => EventName::CameraWasInterrupted,
            Self::CameraInterruptionEnded(_) => EventName::CameraInterruptionEnded,
            Self::CameraDidStopRunning(_) => EventName::CameraDidStopRunning,
        }
    }

    /// The SDK error carried by the event, if it has a typed one.
    pub fn error(&self) -> Option<&TwilioError> {
        self.event_error().and_then(EventError::twilio)
    }

    /// The `error` member as sent, typed or not.
    pub fn event_error(&self) -> Option<&EventError> {
        match self {
            Self::RoomDidDisconnect(e) | Self::RoomDidFailToConnect(e) => e.error.as_ref(),
            Self::ParticipantAddedVideoTrack(e)
            | Self::ParticipantRemovedVideoTrack(e)
            | Self::ParticipantAddedAudioTrack(e)
            | Self::ParticipantRemovedAudioTrack(e)
            | Self::ParticipantEnabledVideoTrack(e)
            | Self::ParticipantDisabledVideoTrack(e)
            | Self::ParticipantEnabledAudioTrack(e)
            | Self::ParticipantDisabledAudioTrack(e) => e.error.as_ref(),
            _ => None,
        }
    }
}

/// Convert a raw native body into a typed event.
///
/// An `error` object with `code` and `message` becomes a [`TwilioError`];
/// an absent or `null` error stays `None`. A `null` body is treated as an
/// empty one, since camera events are emitted without data.
pub fn normalize(name: EventName, raw: Value) -> Result<VideoEvent, serde_json::Error> {
    let body = if raw.is_null() {
        Value::Object(Default::default())
    } else {
        raw
    };

    Ok(match name {
        EventName::RoomDidConnect => VideoEvent::RoomDidConnect(serde_json::from_value(body)?),
        EventName::RoomDidDisconnect => {
            VideoEvent::RoomDidDisconnect(serde_json::from_value(body)?)
        }
        EventName::RoomDidFailToConnect => {
            VideoEvent::RoomDidFailToConnect(serde_json::from_value(body)?)
        }
        EventName::RoomParticipantDidConnect => {
            VideoEvent::RoomParticipantDidConnect(serde_json::from_value(body)?)
        }
        EventName::RoomParticipantDidDisconnect => {
            VideoEvent::RoomParticipantDidDisconnect(serde_json::from_value(body)?)
        }
        EventName::ParticipantAddedVideoTrack => {
            VideoEvent::ParticipantAddedVideoTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantRemovedVideoTrack => {
            VideoEvent::ParticipantRemovedVideoTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantAddedAudioTrack => {
            VideoEvent::ParticipantAddedAudioTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantRemovedAudioTrack => {
            VideoEvent::ParticipantRemovedAudioTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantAddedDataTrack => {
            VideoEvent::ParticipantAddedDataTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantRemovedDataTrack => {
            VideoEvent::ParticipantRemovedDataTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantEnabledVideoTrack => {
            VideoEvent::ParticipantEnabledVideoTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantDisabledVideoTrack => {
            VideoEvent::ParticipantDisabledVideoTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantEnabledAudioTrack => {
            VideoEvent::ParticipantEnabledAudioTrack(serde_json::from_value(body)?)
        }
        EventName::ParticipantDisabledAudioTrack => {
            VideoEvent::ParticipantDisabledAudioTrack(serde_json::from_value(body)?)
        }
        EventName::DataTrackMessageReceived => {
            VideoEvent::DataTrackMessageReceived(serde_json::from_value(body)?)
        }
        EventName::StatsReceived => VideoEvent::StatsReceived(serde_json::from_value(body)?),
        EventName::CameraDidStart => VideoEvent::CameraDidStart(serde_json::from_value(body)?),
        EventName::CameraWasInterrupted => {
            VideoEvent::CameraWasInterrupted(serde_json::from_value(body)?)
        }
        EventName::CameraInterruptionEnded => {
            VideoEvent::CameraInterruptionEnded(serde_json::from_value(body)?)
        }
        EventName::CameraDidStopRunning => {
            VideoEvent::CameraDidStopRunning(serde_json::from_value(body)?)
        }
    })
}
