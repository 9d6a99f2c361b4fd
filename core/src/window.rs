//! Buffered clip windows around a matched span.

use serde::{Deserialize, Serialize};

use crate::source::FrameNumber;

/// Frames kept before and after a matched span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBuffer {
    pub pre: FrameNumber,
    pub post: FrameNumber,
}

impl WindowBuffer {
    /// Sequence clips keep twice the buffer before the span and the buffer
    /// after it.
    pub fn for_sequence(buffer_frames: u32) -> Self {
        let buffer = FrameNumber::from(buffer_frames);
        Self {
            pre: buffer * 2,
            post: buffer,
        }
    }

    pub fn fixed(pre: u32, post: u32) -> Self {
        Self {
            pre: FrameNumber::from(pre),
            post: FrameNumber::from(post),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub frame_start: FrameNumber,
    pub frame_end: FrameNumber,
}

/// Extend `[sequence_start, sequence_end]` by the buffer, clamped to
/// `[0, frame_count]`.
///
/// A span reaching past `frame_count` (inconsistent match metadata) keeps its
/// own end so the window always contains the span.
pub fn resolve(
    sequence_start: FrameNumber,
    sequence_end: FrameNumber,
    frame_count: FrameNumber,
    buffer: WindowBuffer,
) -> Window {
    let sequence_start = sequence_start.max(0);
    let upper = frame_count.max(sequence_end);
    Window {
        frame_start: (sequence_start - buffer.pre).max(0),
        frame_end: (sequence_end + buffer.post).min(upper),
    }
}
