/// Milliseconds on a monotonic clock.
pub type Millis = u64;

/// Monotonic time source used to time scan windows.
pub trait Clock {
    fn now(&self) -> Millis;
}

impl<F> Clock for F
where
    F: Fn() -> Millis,
{
    fn now(&self) -> Millis {
        self()
    }
}

/// Milliseconds since construction, backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn closure_is_a_clock() {
        let t = Cell::new(5u64);
        let clock = || t.get();
        assert_eq!(clock.now(), 5);
        t.set(17);
        assert_eq!(clock.now(), 17);
    }

    #[cfg(feature = "std")]
    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock::new();
        let a = clock.now();
        assert!(clock.now() >= a);
    }
}
