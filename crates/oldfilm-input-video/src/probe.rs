use serde::Deserialize;

use crate::VideoError;

const FALLBACK_FPS: f64 = 30.0;

/// What ffprobe reports about the first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_ms: u64,
}

impl MediaInfo {
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Presentation time of the `n`th frame after `start_ms`.
    pub fn position_of(&self, start_ms: u64, n: u64) -> u64 {
        let t = start_ms + (n as f64 * 1000.0 / self.fps).round() as u64;
        if self.duration_ms > 0 {
            t.min(self.duration_ms)
        } else {
            t
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// `"30000/1001"` or `"25"`; zero or malformed rates yield `None`.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let fps = match s.split_once('/') {
        Some((n, d)) => {
            let n: f64 = n.trim().parse().ok()?;
            let d: f64 = d.trim().parse().ok()?;
            if d == 0.0 {
                return None;
            }
            n / d
        }
        None => s.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Parses `ffprobe -of json` output for `file`.
pub fn parse_probe(json: &str, file: &str) -> Result<MediaInfo, VideoError> {
    let report: ProbeReport =
        serde_json::from_str(json).map_err(|e| VideoError::Probe(format!("parse json: {e}")))?;

    let stream = report
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| VideoError::NoVideoStream(file.to_string()))?;
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(VideoError::NoVideoStream(file.to_string())),
    };

    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(FALLBACK_FPS);

    let duration_ms = report
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .map_or(0, |d| (d * 1000.0).round() as u64);

    Ok(MediaInfo {
        width,
        height,
        fps,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_typical_report() {
        let json = r#"{
            "programs": [],
            "streams": [{ "width": 1080, "height": 1920, "r_frame_rate": "30000/1001" }],
            "format": { "duration": "12.345678" }
        }"#;
        let info = parse_probe(json, "clip.mp4").expect("probe");
        assert_eq!((info.width, info.height), (1080, 1920));
        assert!((info.fps - 29.97).abs() < 0.01);
        assert_eq!(info.duration_ms, 12_346);
        assert_eq!(info.frame_len(), 1080 * 1920 * 4);
    }

    #[test]
    fn audio_only_files_have_no_video_stream() {
        let err = parse_probe(r#"{ "streams": [], "format": {} }"#, "a.wav").expect_err("none");
        assert!(matches!(err, VideoError::NoVideoStream(f) if f == "a.wav"));
    }

    #[test]
    fn frame_rates() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("50/2"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("n/a"), None);
    }

    #[test]
    fn unknown_rate_and_duration_fall_back() {
        let json = r#"{ "streams": [{ "width": 2, "height": 2, "r_frame_rate": "0/0" }] }"#;
        let info = parse_probe(json, "x").expect("probe");
        assert_eq!(info.fps, FALLBACK_FPS);
        assert_eq!(info.duration_ms, 0);
    }

    #[test]
    fn positions_advance_with_frames_and_stop_at_duration() {
        let info = MediaInfo {
            width: 1,
            height: 1,
            fps: 25.0,
            duration_ms: 1_000,
        };
        assert_eq!(info.position_of(0, 0), 0);
        assert_eq!(info.position_of(200, 5), 400);
        assert_eq!(info.position_of(0, 500), 1_000);
    }
}
