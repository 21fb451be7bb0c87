//! # Distance Sensor Interface
//!
//! The sonar delivers readings at its own pace. Readings travel from the sensor driver to the
//! navigation loop over a bounded channel: the driver never blocks when pushing, and the loop
//! drains whatever has arrived at the start of each cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A raw distance reading.
///
/// Units: centimetres
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DistanceSample(pub u16);

/// Producer side of the sample channel, owned by the sensor driver.
#[derive(Debug, Clone)]
pub struct SampleSender(SyncSender<DistanceSample>);

/// Consumer side of the sample channel, owned by the navigation loop.
#[derive(Debug)]
pub struct SampleReceiver(Receiver<DistanceSample>);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a sample could not be handed over.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SampleSendError {
    #[error("The sample queue is full, sample dropped")]
    QueueFull,

    #[error("The sample receiver has been dropped")]
    Disconnected,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new sample channel holding at most `capacity` undelivered samples.
pub fn sample_channel(capacity: usize) -> (SampleSender, SampleReceiver) {
    let (tx, rx) = sync_channel(capacity);
    (SampleSender(tx), SampleReceiver(rx))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SampleSender {
    /// Push a sample without blocking. If the queue is full the sample is dropped.
    pub fn push(&self, sample: DistanceSample) -> Result<(), SampleSendError> {
        match self.0.try_send(sample) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SampleSendError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(SampleSendError::Disconnected),
        }
    }
}

impl SampleReceiver {
    /// Iterate over every sample that has arrived, without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = DistanceSample> + '_ {
        self.0.try_iter()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
