//! Thermistor reading data structures.

use serde::Deserialize;
use std::time::SystemTime;

/// One thermistor sample as reported by a sensor board.
///
/// Temperature is in Celsius.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Position of this sample in the device's thermistor array
    #[serde(skip)]
    pub slot: usize,
    /// Battery segment the thermistor belongs to
    pub segment_number: u32,
    /// Thermistor number within the device
    pub thermistor_number: u32,
    /// Temperature in Celsius
    pub temperature: f64,
}

/// Body of `GET /api/thermistors`.
///
/// Unpopulated slots are sent as `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct ThermistorPayload {
    pub count: u32,
    pub timestamp: String,
    pub thermistors: Vec<Option<Reading>>,
}

/// A successful poll: the non-null readings in device order.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    /// Readings in slot order, null slots skipped
    pub readings: Vec<Reading>,
    /// Device-side timestamp, passed through unparsed
    pub device_timestamp: String,
    /// Thermistor count claimed by the device
    pub count: u32,
    /// Local time the response was received
    pub received_at: SystemTime,
}

impl PollReport {
    /// Build a report from a decoded payload, skipping null slots.
    pub fn from_payload(payload: ThermistorPayload, received_at: SystemTime) -> Self {
        let readings = payload
            .thermistors
            .into_iter()
            .enumerate()
            .filter_map(|(slot, reading)| reading.map(|r| Reading { slot, ..r }))
            .collect();

        Self {
            readings,
            device_timestamp: payload.timestamp,
            count: payload.count,
            received_at,
        }
    }
}
