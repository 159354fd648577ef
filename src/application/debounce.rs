/// Keeps one physical scan gesture from being charged more than once.
///
/// After a charge the code is armed. While armed, the same code is suppressed
/// if it was already seen on the previous tick (the item is still in view) or if
/// the charge happened no more than `window` ticks ago. Charging a different
/// code re-arms on that code.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: u64,
    armed: Option<Armed>,
}

#[derive(Debug, Clone)]
struct Armed {
    code: String,
    charged_at: u64,
    last_seen: u64,
}

impl Debouncer {
    pub fn new(window: u64) -> Self {
        Self {
            window,
            armed: None,
        }
    }

    /// Returns `true` if `code` seen at `tick` must not be charged.
    pub fn suppress(&mut self, code: &str, tick: u64) -> bool {
        let Some(armed) = self.armed.as_mut() else {
            return false;
        };
        if armed.code != code {
            return false;
        }

        let still_in_view = tick <= armed.last_seen + 1;
        let within_window = tick.saturating_sub(armed.charged_at) <= self.window;
        if still_in_view || within_window {
            armed.last_seen = tick;
            true
        } else {
            false
        }
    }

    /// Notes that `code` is in view at `tick` without acting on it, e.g. when
    /// it sits behind the code that wins the frame.
    pub fn seen(&mut self, code: &str, tick: u64) {
        if let Some(armed) = self.armed.as_mut()
            && armed.code == code
        {
            armed.last_seen = armed.last_seen.max(tick);
        }
    }

    pub fn charged(&mut self, code: &str, tick: u64) {
        self.armed = Some(Armed {
            code: code.to_string(),
            charged_at: tick,
            last_seen: tick,
        });
    }

    pub fn reset(&mut self) {
        self.armed = None;
    }
}
