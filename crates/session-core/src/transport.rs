//! Client-side token carrier (cookie, header, ...)

use std::time::Duration;

pub trait TokenTransport {
    fn get_token(&self) -> Option<String>;

    fn set_token(&mut self, value: &str, ttl: Duration);
}

/// Transport that just records what it was asked to do.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    pub presented: Option<String>,
    pub written: Vec<(String, Duration)>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn new(presented: Option<&str>) -> Self {
        Self {
            presented: presented.map(str::to_string),
            written: Vec::new(),
        }
    }
}

#[cfg(test)]
impl TokenTransport for RecordingTransport {
    fn get_token(&self) -> Option<String> {
        self.presented.clone()
    }

    fn set_token(&mut self, value: &str, ttl: Duration) {
        self.written.push((value.to_string(), ttl));
    }
}
