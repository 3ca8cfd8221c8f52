//! Server-sent event framing for `GET /events/{job_id}`

use bytes::Bytes;
use codeagent_errors::StreamError;
use codeagent_types::{Job, JobStatus, ProgressEvent};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;

/// One dispatched event: optional `event:` name and the joined `data:` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Line-fed SSE parser
///
/// Feed lines without their terminator; a blank line dispatches the frame
/// accumulated so far.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id and retry carry nothing we act on
            _ => {}
        }
        None
    }

    /// Flush a frame left open when the stream ended without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(SseFrame { event, data })
    }
}

#[derive(Deserialize)]
struct PhaseFrame {
    phase: String,
    #[serde(default)]
    percent: f64,
}

#[derive(Deserialize)]
struct FinishedFrame {
    status: JobStatus,
    #[serde(default)]
    error: Option<String>,
}

/// Normalise a frame into a [`ProgressEvent`].
///
/// `progress` frames carry `{phase, percent}`, `finished` frames carry
/// `{status, error?}` and unnamed frames carry either a full job snapshot or
/// a bare progress event. Unknown named events are ignored.
///
/// # Errors
///
/// Returns `StreamError::Decode` when a recognised frame holds malformed JSON.
pub fn normalize_frame(frame: &SseFrame) -> Result<Option<ProgressEvent>, StreamError> {
    let data = frame.data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    let decode = |e: serde_json::Error| StreamError::Decode {
        message: e.to_string(),
    };

    match frame.event.as_deref() {
        Some("progress") => {
            if let Ok(phase) = serde_json::from_str::<PhaseFrame>(data) {
                return Ok(Some(ProgressEvent::phase(phase.phase, phase.percent)));
            }
            serde_json::from_str::<ProgressEvent>(data)
                .map(Some)
                .map_err(decode)
        }
        Some("finished") => {
            let finished: FinishedFrame = serde_json::from_str(data).map_err(decode)?;
            Ok(Some(ProgressEvent {
                status: Some(finished.status),
                progress: None,
                error: finished.error,
            }))
        }
        None | Some("message" | "status") => {
            let value: serde_json::Value = serde_json::from_str(data).map_err(decode)?;
            if value.get("job_id").is_some() || value.get("id").is_some() {
                let job: Job = serde_json::from_value(value).map_err(decode)?;
                return Ok(Some(ProgressEvent::from(&job)));
            }
            serde_json::from_value::<ProgressEvent>(value)
                .map(Some)
                .map_err(decode)
        }
        Some(other) => {
            tracing::trace!(event = other, "ignoring unknown event frame");
            Ok(None)
        }
    }
}

type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Decoded progress events read from an open event-stream response
pub struct JobEventStream {
    reader: BufReader<StreamReader<ByteStream, Bytes>>,
    decoder: SseDecoder,
    line: Vec<u8>,
    finished: bool,
}

impl JobEventStream {
    #[must_use]
    pub fn new(response: reqwest::Response) -> Self {
        let bytes: ByteStream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();
        Self {
            reader: BufReader::new(StreamReader::new(bytes)),
            decoder: SseDecoder::new(),
            line: Vec::new(),
            finished: false,
        }
    }

    /// Next progress event.
    ///
    /// Returns `None` once the server closes the stream cleanly. Malformed
    /// frames and lines that are not UTF-8 surface as
    /// `Some(Err(StreamError::Decode))` and reading may continue; a transport error surfaces as `StreamError::Transport` and
    /// ends the stream.
    pub async fn next_event(&mut self) -> Option<Result<ProgressEvent, StreamError>> {
        loop {
            if self.finished {
                return None;
            }

            self.line.clear();
            let frame = match self.reader.read_until(b'\n', &mut self.line).await {
                Ok(0) => {
                    self.finished = true;
                    self.decoder.finish()
                }
                Ok(_) => match std::str::from_utf8(&self.line) {
                    Ok(line) => self.decoder.push_line(line.trim_end_matches('\n')),
                    Err(e) => {
                        tracing::debug!(error = %e, "event stream line is not UTF-8");
                        return Some(Err(StreamError::Decode {
                            message: format!("event stream line is not UTF-8: {e}"),
                        }));
                    }
                },
                Err(e) => {
                    self.finished = true;
                    return Some(Err(StreamError::Transport {
                        message: e.to_string(),
                    }));
                }
            };

            if let Some(frame) = frame {
                match normalize_frame(&frame) {
                    Ok(Some(event)) => return Some(Ok(event)),
                    Ok(None) => {}
                    Err(e) => return Some(Err(e)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(text: &str) -> Vec<SseFrame> {
        let mut decoder = SseDecoder::new();
        let mut frames: Vec<SseFrame> = text.lines().filter_map(|l| decoder.push_line(l)).collect();
        frames.extend(decoder.finish());
        frames
    }

    #[test]
    fn test_named_and_unnamed_frames() {
        let frames = decode_all(
            ": keepalive\n\
             event: progress\n\
             data: {\"phase\":\"clone\",\"percent\":10}\n\
             \n\
             data: {\"status\":\"running\"}\n\
             \n",
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("progress"));
        assert_eq!(frames[1].event, None);
    }

    #[test]
    fn test_multiline_data_joined() {
        let frames = decode_all("data: {\"status\":\ndata: \"failed\"}\n\n");
        assert_eq!(frames[0].data, "{\"status\":\n\"failed\"}");
        let event = normalize_frame(&frames[0]).unwrap().unwrap();
        assert_eq!(event.status, Some(JobStatus::Failed));
    }

    #[test]
    fn test_unterminated_frame_flushed() {
        let frames = decode_all("data: {\"status\":\"queued\"}");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_progress_frame_normalized() {
        let frame = SseFrame {
            event: Some("progress".into()),
            data: r#"{"phase":"analyze:semgrep","percent":55.5}"#.into(),
        };
        let event = normalize_frame(&frame).unwrap().unwrap();
        assert_eq!(event.status, None);
        assert_eq!(event.progress.unwrap().phase, "analyze:semgrep");
    }

    #[test]
    fn test_finished_frame_normalized() {
        let frame = SseFrame {
            event: Some("finished".into()),
            data: r#"{"status":"failed","error":"semgrep crashed"}"#.into(),
        };
        let event = normalize_frame(&frame).unwrap().unwrap();
        assert_eq!(event.status, Some(JobStatus::Failed));
        assert_eq!(event.error.as_deref(), Some("semgrep crashed"));
    }

    #[test]
    fn test_job_snapshot_normalized() {
        let frame = SseFrame {
            event: None,
            data: r#"{"job_id":"j1","status":"running","progress":{"phase":"clone","percent":5}}"#
                .into(),
        };
        let event = normalize_frame(&frame).unwrap().unwrap();
        assert_eq!(event.status, Some(JobStatus::Running));
        assert_eq!(event.progress.unwrap().phase, "clone");
    }

    #[test]
    fn test_unknown_event_ignored_and_bad_json_rejected() {
        let ping = SseFrame {
            event: Some("ping".into()),
            data: "not json".into(),
        };
        assert_eq!(normalize_frame(&ping).unwrap(), None);

        let broken = SseFrame {
            event: None,
            data: "{oops".into(),
        };
        assert!(matches!(
            normalize_frame(&broken),
            Err(StreamError::Decode { .. })
        ));
    }
}
