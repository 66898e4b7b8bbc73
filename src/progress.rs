//! Progress reporting hooks.
//!
//! Both codec directions accept an optional callback invoked with a stage
//! tag, a percentage, and a short message. The callback must return quickly
//! and cannot influence the codec; errors are never delivered through it.

use std::fmt;

/// Pipeline stage identifying a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Frequency counting over the input.
    Analyze,
    /// Building the hash-chain index.
    Index,
    /// Emitting the token stream.
    Encode,
    /// Replaying the token stream.
    Decode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Analyze => "analyze",
            Stage::Index => "index",
            Stage::Encode => "encode",
            Stage::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Callback receiving `(stage, percent, message)` reports.
pub type ProgressFn<'a> = &'a mut dyn FnMut(Stage, u8, &str);

/// Progress sink that suppresses duplicate percentages per stage.
pub struct Progress<'a> {
    callback: Option<ProgressFn<'a>>,
    last: Option<(Stage, u8)>,
}

impl<'a> Progress<'a> {
    /// Wrap a callback.
    pub fn new(callback: ProgressFn<'a>) -> Self {
        Self {
            callback: Some(callback),
            last: None,
        }
    }

    /// A sink that drops every report.
    pub fn none() -> Progress<'static> {
        Progress {
            callback: None,
            last: None,
        }
    }

    /// Forward a report unless the same stage already reported this percent.
    pub fn report(&mut self, stage: Stage, percent: u8, message: &str) {
        let percent = percent.min(100);
        if self.last == Some((stage, percent)) {
            return;
        }
        self.last = Some((stage, percent));
        if let Some(cb) = self.callback.as_mut() {
            cb(stage, percent, message);
        }
    }
}

/// Percent of `done` out of `total`, saturating at 100.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as u64 * 100) / total as u64).min(100) as u8
}
