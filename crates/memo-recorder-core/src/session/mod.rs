mod capture;
mod clock;
mod controller;

pub use {
    capture::{CaptureSession, SessionState},
    clock::{Clock, DEFAULT_TICK_PERIOD},
    controller::SessionController,
};
