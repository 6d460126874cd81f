//! Per-connection throttle for inbound WebSocket frames.
//!
//! Two sliding windows are checked on every frame: a short burst window and
//! a longer sustained window. A rejected frame is not counted.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Sliding window of accepted frame timestamps
#[derive(Debug)]
struct Window {
    timestamps: VecDeque<Instant>,
    limit: usize,
    span: Duration,
}

impl Window {
    fn new(limit: usize, span: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(limit),
            limit,
            span,
        }
    }

    fn expire(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.duration_since(*oldest) > self.span {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.timestamps.len() >= self.limit
    }
}

/// Which window rejected a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleLimit {
    Burst,
    Sustained,
}

impl ThrottleLimit {
    /// Metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            ThrottleLimit::Burst => "burst",
            ThrottleLimit::Sustained => "sustained",
        }
    }

    /// Text for the error event sent back to the client
    pub fn client_message(&self) -> &'static str {
        match self {
            ThrottleLimit::Burst => "Rate limit exceeded. Please slow down.",
            ThrottleLimit::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

impl fmt::Display for ThrottleLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Burst and sustained limits for one connection
#[derive(Debug)]
pub struct FrameThrottle {
    burst: Window,
    sustained: Window,
}

impl Default for FrameThrottle {
    /// 10 frames per second, 100 frames per minute
    fn default() -> Self {
        Self::new(10, Duration::from_secs(1), 100, Duration::from_secs(60))
    }
}

impl FrameThrottle {
    pub fn new(burst: usize, burst_span: Duration, sustained: usize, sustained_span: Duration) -> Self {
        Self {
            burst: Window::new(burst, burst_span),
            sustained: Window::new(sustained, sustained_span),
        }
    }

    /// Admit a frame, or name the window that is exhausted.
    ///
    /// # Example
    ///
    /// ```
    /// use cp_server::api::throttle::{FrameThrottle, ThrottleLimit};
    /// use std::time::Duration;
    ///
    /// let mut throttle = FrameThrottle::new(2, Duration::from_secs(1), 10, Duration::from_secs(60));
    /// assert!(throttle.check().is_ok());
    /// assert!(throttle.check().is_ok());
    /// assert_eq!(throttle.check(), Err(ThrottleLimit::Burst));
    /// ```
    pub fn check(&mut self) -> Result<(), ThrottleLimit> {
        let now = Instant::now();
        self.burst.expire(now);
        self.sustained.expire(now);

        if self.burst.is_full() {
            return Err(ThrottleLimit::Burst);
        }
        if self.sustained.is_full() {
            return Err(ThrottleLimit::Sustained);
        }

        self.burst.timestamps.push_back(now);
        self.sustained.timestamps.push_back(now);
        Ok(())
    }
}
