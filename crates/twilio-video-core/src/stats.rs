use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::BridgeError;

/// Payload of `statsReceived`, keyed by peer connection id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsReport(pub BTreeMap<String, ConnectionStats>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionStats {
    pub remote_audio_track_stats: Vec<TrackStats>,
    pub remote_video_track_stats: Vec<TrackStats>,
    pub local_audio_track_stats: Vec<TrackStats>,
    pub local_video_track_stats: Vec<TrackStats>,
}

/// Per-track figures. Audio, video, local and remote tracks each fill
/// a different subset of the optional fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackStats {
    pub codec: String,
    pub packets_lost: i64,
    pub timestamp: f64,
    pub track_sid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_sent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets_sent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_trip_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_received: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets_received: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl StatsReport {
    pub fn connection(&self, peer_connection_id: &str) -> Option<&ConnectionStats> {
        self.0.get(peer_connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Recurring stats request for modules without a native timer.
/// Dropping the poller stops the task.
pub(crate) struct StatsPoller {
    _cancel_tx: watch::Sender<bool>,
    _handle: JoinHandle<()>,
}

impl StatsPoller {
    /// Calls `tick` right away and then every `interval`.
    pub(crate) fn spawn<F>(interval: Duration, tick: F) -> Result<Self, BridgeError>
    where
        F: Fn() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(BridgeError::InvalidStatsInterval);
        }
        let rt = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let handle = rt.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => tick(),
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("stats polling stopped");
        });

        Ok(Self {
            _cancel_tx: cancel_tx,
            _handle: handle,
        })
    }
}

/// At most one running [`StatsPoller`]; starting a new one replaces the old.
#[derive(Default)]
pub(crate) struct StatsSchedule {
    poller: Mutex<Option<StatsPoller>>,
}

impl StatsSchedule {
    pub(crate) fn start<F>(&self, interval: Duration, tick: F) -> Result<(), BridgeError>
    where
        F: Fn() + Send + 'static,
    {
        let poller = StatsPoller::spawn(interval, tick)?;
        *self.poller.lock().unwrap_or_else(PoisonError::into_inner) = Some(poller);
        Ok(())
    }

    pub(crate) fn cancel(&self) {
        let stopped = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if stopped.is_some() {
            tracing::debug!("periodic stats cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn report_parses_native_shape() {
        let json = serde_json::json!({
            "PC1": {
                "remoteAudioTrackStats": [
                    {"codec": "opus", "packetsLost": 2, "timestamp": 1.5, "trackSid": "MT1",
                     "audioLevel": 120, "jitter": 3, "bytesReceived": 2048.0, "packetsReceived": 40}
                ],
                "remoteVideoTrackStats": [],
                "localAudioTrackStats": [],
                "localVideoTrackStats": [
                    {"codec": "VP8", "packetsLost": 0, "timestamp": 2.0, "trackSid": "MT2",
                     "dimensions": {"width": 640, "height": 480}, "frameRate": 30,
                     "bytesSent": 4096.0, "packetsSent": 80, "roundTripTime": 12.0}
                ]
            }
        });
        let report: StatsReport = serde_json::from_value(json).unwrap();
        let pc = report.connection("PC1").unwrap();
        assert_eq!(pc.remote_audio_track_stats[0].audio_level, Some(120));
        assert_eq!(
            pc.local_video_track_stats[0].dimensions,
            Some(Dimensions { width: 640, height: 480 })
        );
        assert!(pc.remote_video_track_stats.is_empty());
    }

    #[test]
    fn missing_arrays_default_to_empty() {
        let report: StatsReport =
            serde_json::from_value(serde_json::json!({"PC1": {}})).unwrap();
        assert!(report.connection("PC1").unwrap().local_audio_track_stats.is_empty());
    }

    #[test]
    fn unknown_track_fields_are_kept() {
        let track: TrackStats = serde_json::from_value(serde_json::json!({
            "codec": "opus", "trackSid": "MT1", "totalAudioEnergy": 0.25
        }))
        .unwrap();
        assert_eq!(track.extra["totalAudioEnergy"], 0.25);
        assert_eq!(serde_json::to_value(&track).unwrap()["totalAudioEnergy"], 0.25);
    }

    #[test]
    fn poller_needs_a_runtime() {
        let res = StatsPoller::spawn(Duration::from_millis(10), || {});
        assert!(matches!(res, Err(BridgeError::NoRuntime)));
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let res = StatsPoller::spawn(Duration::ZERO, || {});
        assert!(matches!(res, Err(BridgeError::InvalidStatsInterval)));
    }

    #[tokio::test]
    async fn poller_ticks_until_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let poller = StatsPoller::spawn(Duration::from_millis(10), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(count.load(Ordering::SeqCst) >= 2);

        drop(poller);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let stopped_at = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[tokio::test]
    async fn schedule_replaces_and_cancels() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let schedule = StatsSchedule::default();

        let f = first.clone();
        schedule
            .start(Duration::from_millis(10), move || {
                f.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let s = second.clone();
        schedule
            .start(Duration::from_millis(10), move || {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let first_stopped_at = first.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(first.load(Ordering::SeqCst), first_stopped_at);
        assert!(second.load(Ordering::SeqCst) >= 2);

        schedule.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second_stopped_at = second.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(second.load(Ordering::SeqCst), second_stopped_at);
    }

    #[tokio::test]
    async fn schedule_keeps_running_poller_on_zero_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let schedule = StatsSchedule::default();
        schedule
            .start(Duration::from_millis(10), move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let res = schedule.start(Duration::ZERO, || {});
        assert!(matches!(res, Err(BridgeError::InvalidStatsInterval)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(count.load(Ordering::SeqCst) >= 2);
        schedule.cancel();
    }
}
