use crate::domain::frame::{DetectionEvent, Frame};
use crate::domain::ports::CodeDetector;

/// Reads frames whose buffer already carries decoded symbol payloads.
///
/// Scanners that decode on-device, and recorded streams, hand over one payload
/// per line. Codes are yielded top to bottom. Blank lines and lines with control
/// characters are skipped, and a buffer that is not UTF-8 yields nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadDetector;

impl PayloadDetector {
    pub fn new() -> Self {
        Self
    }
}

impl CodeDetector for PayloadDetector {
    fn detect<'a>(&'a self, frame: &'a Frame) -> Box<dyn Iterator<Item = DetectionEvent> + 'a> {
        let Ok(text) = std::str::from_utf8(&frame.data) else {
            return Box::new(std::iter::empty());
        };

        Box::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.chars().any(char::is_control))
                .map(move |code| DetectionEvent {
                    raw_code: code.to_string(),
                    frame_id: frame.id,
                }),
        )
    }
}
