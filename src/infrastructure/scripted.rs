use crate::domain::catalog::ProductCatalog;
use crate::domain::frame::{Frame, FramePull};
use crate::domain::ports::FrameSource;
use crate::error::{Result, ScanPayError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// One step of a frame script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedFrame {
    /// A frame carrying these newline-separated symbol payloads.
    Payload(Vec<u8>),
    /// The source reports that no frame is ready.
    Empty,
    /// The pull never completes; the caller's timeout has to fire.
    Stall,
    /// The read fails with the given reason.
    Fail(String),
}

/// A frame source that replays a prepared script.
///
/// Script format, one frame per line:
/// - `product123` a frame with one code; `a|b` a frame with two codes
/// - an empty line is a frame with no code in it
/// - `#none` no frame ready, `#timeout` a stalled pull, `#error [reason]` a read failure
/// - `//` starts a comment line
///
/// When the script runs out the source reports end of stream.
#[derive(Debug, Default)]
pub struct ScriptedFrameSource {
    frames: VecDeque<ScriptedFrame>,
    unavailable: Option<String>,
    opened: bool,
    next_id: u64,
}

impl ScriptedFrameSource {
    pub fn new(frames: impl IntoIterator<Item = ScriptedFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    /// A source whose device cannot be opened.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Shorthand for a script where every frame shows exactly the given code.
    pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(
            codes
                .into_iter()
                .map(|code| ScriptedFrame::Payload(code.as_bytes().to_vec())),
        )
    }

    pub fn from_script<R: BufRead>(reader: R) -> Result<Self> {
        let mut frames = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.starts_with("//") {
                continue;
            }
            let frame = match line.split_once(' ').unwrap_or((line, "")) {
                ("#none", _) => ScriptedFrame::Empty,
                ("#timeout", _) => ScriptedFrame::Stall,
                ("#error", reason) => ScriptedFrame::Fail(if reason.is_empty() {
                    "scripted read failure".to_string()
                } else {
                    reason.trim().to_string()
                }),
                (directive, _) if directive.starts_with('#') => {
                    return Err(ScanPayError::ValidationError(format!(
                        "Unknown frame script directive {} on line {}",
                        directive,
                        index + 1
                    )));
                }
                _ => ScriptedFrame::Payload(
                    line.split('|')
                        .map(str::trim)
                        .collect::<Vec<_>>()
                        .join("\n")
                        .into_bytes(),
                ),
            };
            frames.push(frame);
        }
        Ok(Self::new(frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

/// Writes a frame script that shows every product in `catalog` once, in id
/// order, with an empty frame after each so the item leaves view.
pub fn write_catalog_script<W: Write>(catalog: &ProductCatalog, mut out: W) -> Result<()> {
    for product in catalog.products() {
        writeln!(out, "// {} {}", product.name, product.price)?;
        writeln!(out, "{}", product.id)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[async_trait]
impl FrameSource for ScriptedFrameSource {
    async fn open(&mut self) -> Result<()> {
        if let Some(reason) = &self.unavailable {
            return Err(ScanPayError::DeviceUnavailable(reason.clone()));
        }
        self.opened = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<FramePull> {
        if !self.opened {
            return Err(ScanPayError::DeviceUnavailable(
                "frame source is not open".to_string(),
            ));
        }

        match self.frames.pop_front() {
            None => Ok(FramePull::EndOfStream),
            Some(ScriptedFrame::Payload(data)) => {
                self.next_id += 1;
                Ok(FramePull::Frame(Frame::new(self.next_id, data)))
            }
            Some(ScriptedFrame::Empty) => Ok(FramePull::Empty),
            Some(ScriptedFrame::Stall) => std::future::pending().await,
            Some(ScriptedFrame::Fail(reason)) => Err(ScanPayError::FrameReadError(reason)),
        }
    }

    async fn close(&mut self) {
        self.opened = false;
    }
}
