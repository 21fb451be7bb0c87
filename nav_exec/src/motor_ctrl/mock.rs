//! Recording motor driver used in tests
//!
//! Clones share the same log, so a test can keep a handle while the driver
//! itself is owned by [`super::MotorCtrl`].

use std::cell::RefCell;
use std::rc::Rc;

use robot_if::eqpt::{Direction, DriverError, MotorDriver, WheelId, NUM_WHEELS};

/// A write accepted by the mock driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MockWrite {
    Dir(WheelId, Direction),
    Power(WheelId, u16),
}

#[derive(Debug, Default)]
struct Inner {
    writes: Vec<MockWrite>,

    /// Number of write calls since the last `fail_next_at`.
    num_calls: usize,

    /// Index of the call which will fail.
    fail_at: Option<usize>,

    fail_always: bool,
}

#[derive(Debug, Default, Clone)]
pub struct MockDriver {
    inner: Rc<RefCell<Inner>>,
}

impl MockDriver {
    /// All accepted writes, oldest first.
    pub fn writes(&self) -> Vec<MockWrite> {
        self.inner.borrow().writes.clone()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().writes.clear();
    }

    /// Make the `n`th write call from now fail, counting from zero.
    pub fn fail_next_at(&self, n: usize) {
        let mut inner = self.inner.borrow_mut();
        inner.num_calls = 0;
        inner.fail_at = Some(n);
    }

    pub fn set_fail_always(&self, fail: bool) {
        self.inner.borrow_mut().fail_always = fail;
    }

    /// Last accepted power for each wheel.
    pub fn powers(&self) -> [u16; NUM_WHEELS] {
        let mut powers = [0; NUM_WHEELS];
        for w in self.inner.borrow().writes.iter() {
            if let MockWrite::Power(wheel, p) = w {
                powers[wheel.index()] = *p;
            }
        }
        powers
    }

    fn record(&mut self, write: MockWrite) -> Result<(), DriverError> {
        let mut inner = self.inner.borrow_mut();
        let idx = inner.num_calls;
        inner.num_calls += 1;

        if inner.fail_always || inner.fail_at == Some(idx) {
            return Err(DriverError::Rejected("injected fault".into()));
        }

        inner.writes.push(write);
        Ok(())
    }
}

impl MotorDriver for MockDriver {
    fn set_direction(&mut self, wheel: WheelId, dir: Direction) -> Result<(), DriverError> {
        self.record(MockWrite::Dir(wheel, dir))
    }

    fn set_power(&mut self, wheel: WheelId, power: u16) -> Result<(), DriverError> {
        self.record(MockWrite::Power(wheel, power))
    }
}
