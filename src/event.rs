//! Polling observer facility for counter movement.
//!
//! A [`Monitor`] wraps the read-compare-publish loop that applications
//! otherwise reimplement around [`Ls7366r::count`]: poll the counter, and
//! when it has moved, hand one [`CountEvent`] to every registered
//! observer. Publishing with no observers registered is a no-op, so a
//! monitor can be polled unconditionally.
//!
//! The observer list is a fixed-capacity vector; capacity is the const
//! parameter `N` and [`Monitor::subscribe`] fails once it is full. Nothing
//! here allocates.

use heapless::Vec;

use crate::driver::Ls7366r;
use crate::error::Error;
use crate::status::Direction;
use crate::transport::Transport;

/// One observed movement of the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CountEvent {
    /// The count at this poll.
    pub count: i32,
    /// Change since the previous poll.
    pub delta: i32,
    /// Direction of the movement, derived from the sign of `delta`.
    pub direction: Direction,
}

/// Receiver for counter movement events.
pub trait CountObserver {
    /// Called once per poll that observed movement.
    fn on_count(&mut self, event: CountEvent);
}

/// The observer list is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObserversFull;

/// Polls a counter session and publishes movement to registered
/// observers.
pub struct Monitor<'a, const N: usize> {
    observers: Vec<&'a mut dyn CountObserver, N>,
    last: i32,
}

impl<'a, const N: usize> Monitor<'a, N> {
    /// An empty monitor with a previous count of zero (the counter's
    /// post-construction state).
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            last: 0,
        }
    }

    /// Register an observer.
    ///
    /// Observers are notified in subscription order.
    ///
    /// # Errors
    ///
    /// [`ObserversFull`] when `N` observers are already registered.
    pub fn subscribe(&mut self, observer: &'a mut dyn CountObserver) -> Result<(), ObserversFull> {
        self.observers.push(observer).map_err(|_| ObserversFull)
    }

    /// Read the counter and publish if it has moved.
    ///
    /// Returns the published event, or `None` when the count is unchanged
    /// (in which case nothing is published).
    pub fn poll<T: Transport>(
        &mut self,
        counter: &mut Ls7366r<T>,
    ) -> Result<Option<CountEvent>, Error<T::Error>> {
        let count = counter.count()?;
        let delta = count.wrapping_sub(self.last);
        if delta == 0 {
            return Ok(None);
        }
        self.last = count;
        let event = CountEvent {
            count,
            delta,
            direction: if delta > 0 {
                Direction::Clockwise
            } else {
                Direction::CounterClockwise
            },
        };
        for observer in self.observers.iter_mut() {
            observer.on_count(event);
        }
        Ok(Some(event))
    }
}

impl<const N: usize> Default for Monitor<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
