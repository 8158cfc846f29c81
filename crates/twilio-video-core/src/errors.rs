use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::EventName;
use crate::native::Platform;

macro_rules! error_codes {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// Numeric error codes reported by the Twilio Video SDKs.
        ///
        /// Hosts branch on the numeric value, so every discriminant is fixed.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum TwilioErrorCode {
            $($variant = $code,)+
        }

        impl TwilioErrorCode {
            pub const ALL: &'static [TwilioErrorCode] = &[$(TwilioErrorCode::$variant,)+];

            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Host-facing constant name, e.g. `ROOM_NOT_FOUND`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

error_codes! {
    AccessTokenInvalid = 20101 => "ACCESS_TOKEN_INVALID",
    AccessTokenHeaderInvalid = 20102 => "ACCESS_TOKEN_HEADER_INVALID",
    AccessTokenIssuerInvalid = 20103 => "ACCESS_TOKEN_ISSUER_INVALID",
    AccessTokenExpired = 20104 => "ACCESS_TOKEN_EXPIRED_EXCEPTION",
    AccessTokenNotYetValid = 20105 => "ACCESS_TOKEN_NOT_YET_VALID",
    AccessTokenGrantsInvalid = 20106 => "ACCESS_TOKEN_GRANTS_INVALID",
    AccessTokenSignatureInvalid = 20107 => "ACCESS_TOKEN_SIGNATURE_INVALID",
    SignalingConnectionError = 53000 => "SIGNALING_CONNECTION_ERROR",
    SignalingConnectionDisconnected = 53001 => "SIGNALING_CONNECTION_DISCONNECTED",
    SignalingConnectionTimeout = 53002 => "SIGNALING_CONNECTION_TIMEOUT",
    SignalingIncomingMessageInvalid = 53003 => "SIGNALING_INCOMING_MESSAGE_INVALID",
    SignalingOutgoingMessageInvalid = 53004 => "SIGNALING_OUTGOING_MESSAGE_INVALID",
    SignalingDnsResolutionError = 53005 => "SIGNALING_DNS_RESOLUTION_ERROR",
    SignalingServerBusy = 53006 => "SIGNALING_SERVER_BUSY",
    RoomNameInvalid = 53100 => "ROOM_NAME_INVALID",
    RoomNameTooLong = 53101 => "ROOM_NAME_TOO_LONG",
    RoomNameCharsInvalid = 53102 => "ROOM_NAME_CHARS_INVALID",
    RoomCreateFailed = 53103 => "ROOM_CREATE_FAILED",
    RoomConnectFailed = 53104 => "ROOM_CONNECT_FAILED",
    RoomMaxParticipantsExceeded = 53105 => "ROOM_MAX_PARTICIPANTS_EXCEEDED",
    RoomNotFound = 53106 => "ROOM_NOT_FOUND",
    RoomMaxParticipantsOutOfRange = 53107 => "ROOM_MAX_PARTICIPANTS_OUT_OF_RANGE",
    RoomTypeInvalid = 53108 => "ROOM_TYPE_INVALID",
    RoomTimeoutOutOfRange = 53109 => "ROOM_TIMEOUT_OUT_OF_RANGE",
    RoomStatusCallbackMethodInvalid = 53110 => "ROOM_STATUS_CALLBACK_METHOD_INVALID",
    RoomStatusCallbackInvalid = 53111 => "ROOM_STATUS_CALLBACK_INVALID",
    RoomStatusInvalid = 53112 => "ROOM_STATUS_INVALID",
    RoomRoomExists = 53113 => "ROOM_ROOM_EXISTS",
    RoomInvalidParameters = 53114 => "ROOM_INVALID_PARAMETERS",
    RoomMediaRegionInvalid = 53115 => "ROOM_MEDIA_REGION_INVALID",
    RoomMediaRegionUnavailable = 53116 => "ROOM_MEDIA_REGION_UNAVAILABLE",
    RoomSubscriptionOperationNotSupported = 53117 => "ROOM_SUBSCRIPTION_OPERATION_NOT_SUPPORTED",
    RoomRoomCompleted = 53118 => "ROOM_ROOM_COMPLETED",
    RoomAccountLimitExceeded = 53119 => "ROOM_ACCOUNT_LIMIT_EXCEEDED",
    ParticipantIdentityInvalid = 53200 => "PARTICIPANT_IDENTITY_INVALID",
    ParticipantIdentityTooLong = 53201 => "PARTICIPANT_IDENTITY_TOO_LONG",
    ParticipantIdentityCharsInvalid = 53202 => "PARTICIPANT_IDENTITY_CHARS_INVALID",
    ParticipantMaxTracksExceeded = 53203 => "PARTICIPANT_MAX_TRACKS_EXCEEDED",
    ParticipantNotFound = 53204 => "PARTICIPANT_NOT_FOUND",
    ParticipantDuplicateIdentity = 53205 => "PARTICIPANT_DUPLICATE_IDENTITY",
    ParticipantAccountLimitExceeded = 53206 => "PARTICIPANT_ACCOUNT_LIMIT_EXCEEDED",
    ParticipantInvalidSubscribeRule = 53215 => "PARTICIPANT_INVALID_SUBSCRIBE_RULE",
    TrackInvalid = 53300 => "TRACK_INVALID",
    TrackNameInvalid = 53301 => "TRACK_NAME_INVALID",
    TrackNameTooLong = 53302 => "TRACK_NAME_TOO_LONG",
    TrackNameCharsInvalid = 53303 => "TRACK_NAME_CHARS_INVALID",
    TrackNameIsDuplicated = 53304 => "TRACK_NAME_IS_DUPLICATED",
    TrackServerTrackCapacityReached = 53305 => "TRACK_SERVER_TRACK_CAPACITY_REACHED",
    TrackDataTrackMessageTooLarge = 53306 => "TRACK_DATA_TRACK_MESSAGE_TOO_LARGE",
    TrackDataTrackSendBufferFull = 53307 => "TRACK_DATA_TRACK_SEND_BUFFER_FULL",
    MediaClientLocalDescFailed = 53400 => "MEDIA_CLIENT_LOCAL_DESC_FAILED",
    MediaServerLocalDescFailed = 53401 => "MEDIA_SERVER_LOCAL_DESC_FAILED",
    MediaClientRemoteDescFailed = 53402 => "MEDIA_CLIENT_REMOTE_DESC_FAILED",
    MediaServerRemoteDescFailed = 53403 => "MEDIA_SERVER_REMOTE_DESC_FAILED",
    MediaNoSupportedCodec = 53404 => "MEDIA_NO_SUPPORTED_CODEC",
    MediaConnectionError = 53405 => "MEDIA_CONNECTION_ERROR",
    MediaDataTrackFailed = 53406 => "MEDIA_DATA_TRACK_FAILED",
    MediaDtlsTransportFailed = 53407 => "MEDIA_DTLS_TRANSPORT_FAILED",
    MediaIceRestartNotAllowed = 53408 => "MEDIA_ICE_RESTART_NOT_ALLOWED",
    ConfigurationAcquireFailed = 53500 => "CONFIGURATION_ACQUIRE_FAILED",
    ConfigurationAcquireTurnFailed = 53501 => "CONFIGURATION_ACQUIRE_TURN_FAILED",
}

impl TwilioErrorCode {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Typed error delivered to event callbacks.
///
/// `code` keeps the raw value reported by the SDK, including codes newer
/// than [`TwilioErrorCode`] knows about.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct TwilioError {
    pub code: u32,
    pub message: String,
}

impl TwilioError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Option<TwilioErrorCode> {
        TwilioErrorCode::from_code(self.code)
    }
}

/// Rejection reported by a native promise, surfaced as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("native rejection {code}: {message}")]
pub struct NativeRejection {
    pub code: String,
    pub message: String,
}

impl NativeRejection {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("no native module provided for {0}")]
    ModuleUnavailable(Platform),
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error(transparent)]
    Rejected(#[from] NativeRejection),
    #[error("native side dropped the promise without settling it")]
    PromiseDropped,
    #[error("stats interval must be greater than zero")]
    InvalidStatsInterval,
    #[error("periodic stats need a running tokio runtime")]
    NoRuntime,
    #[error("listener registration failed for {event}: {source}")]
    Listener {
        event: EventName,
        source: NativeRejection,
    },
}
