use crate::gb::ppu::buffer::FrameBuffer;
use crate::gb::{DISPLAY_REFRESH_RATE, EmulatorMessage};
use log::debug;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

/// The display hands finished frames to the frontend.
/// It also takes care of syncing the frame rate.
pub struct Display {
    sender: Sender<EmulatorMessage>,
    frame_limiter: Option<FrameLimiter>,
}

impl Display {
    pub fn new(sender: Sender<EmulatorMessage>, fps_limit: bool) -> Self {
        Self {
            sender,
            frame_limiter: fps_limit.then(|| FrameLimiter::new(DISPLAY_REFRESH_RATE)),
        }
    }

    /// Sends a copy of the frame to the frontend and syncs the frame rate.
    pub fn send_frame(&mut self, buffer: &FrameBuffer) {
        if self.sender.send(EmulatorMessage::Frame(buffer.clone())).is_err() {
            debug!(target: "video", "Frontend is gone, dropping frame");
        }
        if let Some(limiter) = self.frame_limiter.as_mut() {
            limiter.wait();
        }
    }
}

/// Limits FPS with the configured refresh rate.
#[derive(Clone)]
struct FrameLimiter {
    frame_duration: Duration,
    last_call: Instant,
}

impl FrameLimiter {
    /// Creates a new frame limiter with the given refresh rate.
    #[inline]
    pub fn new(refresh_rate: f64) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / refresh_rate),
            last_call: Instant::now(),
        }
    }

    /// Blocks the current thread until the allotted frame time has passed.
    #[inline]
    pub fn wait(&mut self) {
        let elapsed = self.last_call.elapsed();
        if elapsed < self.frame_duration {
            spin_sleep::sleep(self.frame_duration - elapsed);
        }
        self.last_call = Instant::now();
    }
}
