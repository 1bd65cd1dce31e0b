//! Pending answer entered through the numeric keypad.

use crow_defence_core::{Anomaly, Digit};

/// Bounded sequence of digits making up the pending answer.
#[derive(Clone, Debug)]
pub(crate) struct InputBuffer {
    digits: String,
    capacity: usize,
}

impl InputBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            digits: String::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a digit unless the buffer is full. Returns whether it changed.
    pub(crate) fn append(&mut self, digit: Digit) -> bool {
        if self.digits.len() >= self.capacity {
            return false;
        }
        self.digits.push(digit.as_char());
        true
    }

    /// Removes the last digit. Returns whether it changed.
    pub(crate) fn delete_last(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.digits.clear();
    }

    pub(crate) fn text(&self) -> &str {
        &self.digits
    }

    /// Parses the buffer as a decimal answer.
    pub(crate) fn parse(&self) -> Result<u32, Anomaly> {
        self.digits.parse().map_err(|_| Anomaly::InvalidInput)
    }
}
