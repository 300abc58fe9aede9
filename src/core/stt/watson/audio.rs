//! Audio sources for a recognition session.
//!
//! Two shapes are supported:
//! - a finite byte stream (file, in-memory buffer, any `AsyncRead`), read to EOF
//! - an unbounded queue fed by a recorder, drained until the recorder stops

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Largest audio frame sent to the service.
pub const AUDIO_CHUNK_SIZE: usize = 1024;

/// Pause between frames, and poll interval while a live queue is empty.
pub const SEND_INTERVAL: Duration = Duration::from_millis(10);

/// Audio to be streamed by a recognition session.
pub struct AudioSource {
    kind: SourceKind,
}

enum SourceKind {
    /// `None` once EOF has been reached and the reader closed
    Stream(Option<Box<dyn AsyncRead + Send + Unpin>>),
    Queue { queue: AudioQueue, pending: Bytes },
}

impl std::fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            SourceKind::Stream(reader) => f
                .debug_struct("AudioSource::Stream")
                .field("open", &reader.is_some())
                .finish(),
            SourceKind::Queue { pending, .. } => f
                .debug_struct("AudioSource::Queue")
                .field("pending", &pending.len())
                .finish(),
        }
    }
}

impl AudioSource {
    /// Stream audio from any async reader until EOF.
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            kind: SourceKind::Stream(Some(Box::new(reader))),
        }
    }

    /// Stream an in-memory buffer.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::from_reader(std::io::Cursor::new(data.into()))
    }

    /// Stream the contents of a file.
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::from_reader(file))
    }

    /// Drain a recorder queue.
    pub fn from_queue(queue: AudioQueue) -> Self {
        Self {
            kind: SourceKind::Queue {
                queue,
                pending: Bytes::new(),
            },
        }
    }

    /// Next frame of at most [`AUDIO_CHUNK_SIZE`] bytes, or `None` when exhausted.
    ///
    /// Finite streams yield full frames until the last one. A queue that is
    /// empty but still recording is polled every [`SEND_INTERVAL`].
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        match &mut self.kind {
            SourceKind::Stream(slot) => {
                let Some(reader) = slot.as_mut() else {
                    return Ok(None);
                };

                let mut buf = vec![0u8; AUDIO_CHUNK_SIZE];
                let mut filled = 0;
                while filled < AUDIO_CHUNK_SIZE {
                    let n = reader.read(&mut buf[filled..]).await?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }

                if filled < AUDIO_CHUNK_SIZE {
                    // EOF: close the reader
                    slot.take();
                }

                if filled == 0 {
                    return Ok(None);
                }
                buf.truncate(filled);
                Ok(Some(Bytes::from(buf)))
            }
            SourceKind::Queue { queue, pending } => {
                loop {
                    if !pending.is_empty() {
                        let n = pending.len().min(AUDIO_CHUNK_SIZE);
                        return Ok(Some(pending.split_to(n)));
                    }

                    match queue.rx.try_recv() {
                        Ok(chunk) => *pending = chunk,
                        Err(TryRecvError::Disconnected) => return Ok(None),
                        Err(TryRecvError::Empty) => {
                            if !queue.is_recording() {
                                // The recorder may have pushed between the
                                // empty check and the flag read.
                                match queue.rx.try_recv() {
                                    Ok(chunk) => *pending = chunk,
                                    Err(_) => return Ok(None),
                                }
                            } else {
                                tokio::time::sleep(SEND_INTERVAL).await;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Consumer half of a recorder queue.
pub struct AudioQueue {
    rx: mpsc::UnboundedReceiver<Bytes>,
    recording: Arc<AtomicBool>,
}

/// Producer half of a recorder queue, held by the recording device.
#[derive(Clone)]
pub struct AudioQueueProducer {
    tx: mpsc::UnboundedSender<Bytes>,
    recording: Arc<AtomicBool>,
}

impl AudioQueue {
    /// Create a queue in the recording state.
    pub fn channel() -> (AudioQueueProducer, AudioQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recording = Arc::new(AtomicBool::new(true));
        (
            AudioQueueProducer {
                tx,
                recording: recording.clone(),
            },
            AudioQueue { rx, recording },
        )
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }
}

impl AudioQueueProducer {
    /// Queue captured audio. Returns false if the session has gone away.
    pub fn push(&self, audio: impl Into<Bytes>) -> bool {
        let audio = audio.into();
        if audio.is_empty() {
            return true;
        }
        self.tx.send(audio).is_ok()
    }

    /// Signal that no more audio will be queued.
    pub fn stop_recording(&self) {
        self.recording.store(false, Ordering::Release);
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }
}
