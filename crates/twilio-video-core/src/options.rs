use serde::{Deserialize, Serialize};

/// Options accepted by `connect`. Every field is optional.
///
/// `audio_bitrate` and `video_bitrate` are meant to be given together;
/// that pairing is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_audio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_video: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_remote_audio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_h264_codec: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_bitrate: Option<u32>,
}

/// Options as forwarded to the native module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedConnectOptions {
    pub enable_audio: bool,
    pub enable_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_remote_audio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_h264_codec: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_bitrate: Option<u32>,
}

impl ConnectionOptions {
    /// Apply connect defaults: local audio and video are on unless the
    /// caller said otherwise. Everything else passes through.
    pub fn normalize(&self) -> NormalizedConnectOptions {
        if self.audio_bitrate.is_some() != self.video_bitrate.is_some() {
            tracing::warn!(
                audio_bitrate = ?self.audio_bitrate,
                video_bitrate = ?self.video_bitrate,
                "only one bitrate given, native encoding parameters may be ignored"
            );
        }

        NormalizedConnectOptions {
            enable_audio: self.enable_audio.unwrap_or(true),
            enable_video: self.enable_video.unwrap_or(true),
            enable_remote_audio: self.enable_remote_audio,
            enable_h264_codec: self.enable_h264_codec,
            audio_bitrate: self.audio_bitrate,
            video_bitrate: self.video_bitrate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_enable_audio_and_video() {
        let n = ConnectionOptions::default().normalize();
        assert!(n.enable_audio);
        assert!(n.enable_video);
        assert_eq!(n.enable_remote_audio, None);
        assert_eq!(n.enable_h264_codec, None);
    }

    #[test]
    fn explicit_values_are_not_overridden() {
        let n = ConnectionOptions {
            enable_audio: Some(true),
            enable_video: Some(false),
            ..Default::default()
        }
        .normalize();
        assert!(n.enable_audio);
        assert!(!n.enable_video);
    }

    #[test]
    fn codec_and_bitrates_pass_through() {
        let n = ConnectionOptions {
            enable_h264_codec: Some(true),
            audio_bitrate: Some(16),
            video_bitrate: Some(1200),
            ..Default::default()
        }
        .normalize();
        assert_eq!(n.enable_h264_codec, Some(true));
        assert_eq!(n.audio_bitrate, Some(16));
        assert_eq!(n.video_bitrate, Some(1200));
    }

    #[test]
    fn one_sided_bitrate_is_forwarded_unchanged() {
        let n = ConnectionOptions {
            audio_bitrate: Some(32),
            ..Default::default()
        }
        .normalize();
        assert_eq!(n.audio_bitrate, Some(32));
        assert_eq!(n.video_bitrate, None);
    }

    #[test]
    fn options_use_host_key_names() {
        let opts: ConnectionOptions =
            serde_json::from_str(r#"{"enableAudio":false,"enableH264Codec":true}"#).unwrap();
        assert_eq!(opts.enable_audio, Some(false));
        assert_eq!(opts.enable_h264_codec, Some(true));

        let json = serde_json::to_value(opts.normalize()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"enableAudio": false, "enableVideo": true, "enableH264Codec": true})
        );
    }
}
