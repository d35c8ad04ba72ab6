//! Bounded status polling

use embedded_hal::delay::DelayNs;

use crate::driver::error::{IoError, IoResult};

/// Poll `done` until it returns `true` or `timeout_us` elapses
///
/// `done` is evaluated before the first delay and once more after the last
/// one, so the total time spent waiting never exceeds `timeout_us`.
pub fn poll_until<D, F>(delay: &mut D, timeout_us: u32, interval_us: u32, mut done: F) -> IoResult<()>
where
    D: DelayNs,
    F: FnMut() -> bool,
{
    let interval_us = interval_us.max(1);
    let max_iterations = timeout_us / interval_us;
    for _ in 0..max_iterations {
        if done() {
            return Ok(());
        }
        delay.delay_us(interval_us);
    }
    if done() {
        Ok(())
    } else {
        Err(IoError::Timeout)
    }
}
