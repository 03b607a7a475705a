//! Several input sources polled as one.

use super::InputSource;

/// Reports exit or input if any inner source does. Every source is polled on
/// every call so that none of them keeps a stale press queued.
#[derive(Default)]
pub struct CombinedInput {
    sources: Vec<Box<dyn InputSource + Send>>,
}

impl CombinedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl InputSource + Send + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl InputSource for CombinedInput {
    fn poll_exit_requested(&self) -> bool {
        self.sources
            .iter()
            .fold(false, |exit, source| source.poll_exit_requested() | exit)
    }

    fn poll_any_input(&self) -> bool {
        self.sources
            .iter()
            .fold(false, |pressed, source| source.poll_any_input() | pressed)
    }
}
