//! Consumer session: one open/close cycle of a period-processing client.
//!
//! A session wraps the lifecycle calls a client makes against a [`Device`]
//! and keeps the bookkeeping the client needs per period:
//!
//! 1. [`wait_period`](AudioSession::wait_period) returns the half to process
//!    and records how many periods the engine has completed so far.
//! 2. The client reads capture and writes playback for that half.
//! 3. [`finish_period`](AudioSession::finish_period) counts every period that
//!    completed while the client was busy as an under-run.

use core::fmt::Write as _;

use heapless::{String, Vec};
use platform::{AudioClock, CyclicDmaChannel, RegisterBus};

use crate::config::MAX_CHANNELS;
use crate::coordinator::{Command, Device};
use crate::dma::Direction;
use crate::error::Error;
use crate::notify::PeriodNotifier;

/// Capacity of [`ChannelInfo::name`].
pub const CHANNEL_NAME_LEN: usize = 8;

const MAX_CHANNEL_ENTRIES: usize = MAX_CHANNELS as usize;

/// Where one channel lives inside an interleaved period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Index the client uses
    pub sw_id: u32,
    /// Slot index on the wire
    pub hw_id: u32,
    /// Capture or playback
    pub direction: Direction,
    /// `IN-n` or `OUT-n`
    pub name: String<CHANNEL_NAME_LEN>,
    /// Word offset of the channel's first sample in a period
    pub start_offset: u32,
    /// Words between consecutive samples of the channel
    pub stride: u32,
}

/// Channel table for `channels` interleaved channels in `direction`.
pub fn channel_table(
    direction: Direction,
    channels: u32,
) -> Result<Vec<ChannelInfo, MAX_CHANNEL_ENTRIES>, Error> {
    let prefix = match direction {
        Direction::Capture => "IN",
        Direction::Playback => "OUT",
    };
    let mut table = Vec::new();
    for index in 0..channels {
        let mut name = String::new();
        write!(name, "{}-{}", prefix, index).map_err(|_| Error::InvalidChannelCount(channels))?;
        table
            .push(ChannelInfo {
                sw_id: index,
                hw_id: index,
                direction,
                name,
                start_offset: index,
                stride: channels,
            })
            .map_err(|_| Error::InvalidChannelCount(channels))?;
    }
    Ok(table)
}

/// Per-client period bookkeeping.
pub struct AudioSession<'n> {
    notifier: &'n PeriodNotifier,
    completions: u32,
    underruns: u32,
    waited: bool,
    inputs: Vec<ChannelInfo, MAX_CHANNEL_ENTRIES>,
    outputs: Vec<ChannelInfo, MAX_CHANNEL_ENTRIES>,
}

impl<'n> AudioSession<'n> {
    /// Reset the notification and bring `device` up with the given geometry.
    pub fn open<B, D, C>(
        device: &mut Device<'n, B, D, C>,
        period_frames: u32,
        channels: u32,
    ) -> Result<Self, Error>
    where
        B: RegisterBus,
        D: CyclicDmaChannel,
        C: AudioClock,
    {
        let notifier = device.notifier();
        notifier.reset();
        device.buffers_setup(period_frames, channels)?;
        Ok(Self {
            notifier,
            completions: 0,
            underruns: 0,
            waited: false,
            inputs: channel_table(Direction::Capture, channels)?,
            outputs: channel_table(Direction::Playback, channels)?,
        })
    }

    /// Wait for the next completed period; returns the half to process.
    pub async fn wait_period(&mut self) -> u8 {
        let half = self.notifier.wait().await;
        self.acknowledge();
        half
    }

    /// [`wait_period`](Self::wait_period) for callers without an executor.
    pub fn wait_period_blocking(&mut self) -> u8 {
        embassy_futures::block_on(self.wait_period())
    }

    /// Non-blocking [`wait_period`](Self::wait_period).
    pub fn try_period(&mut self) -> Option<u8> {
        let half = self.notifier.try_take()?;
        self.acknowledge();
        Some(half)
    }

    fn acknowledge(&mut self) {
        self.completions = self.notifier.interrupts();
        self.waited = true;
    }

    /// Mark the current period processed.
    pub fn finish_period(&mut self) {
        let missed = self.notifier.interrupts().wrapping_sub(self.completions);
        if missed != 0 {
            debug!("{} period(s) completed during processing", missed);
        }
        self.underruns = self.underruns.saturating_add(missed);
    }

    /// Periods the client fell behind by, summed over the session.
    pub fn underruns(&self) -> u32 {
        self.underruns
    }

    /// Capture channels.
    pub fn input_channels(&self) -> &[ChannelInfo] {
        &self.inputs
    }

    /// Playback channels.
    pub fn output_channels(&self) -> &[ChannelInfo] {
        &self.outputs
    }

    /// Start streaming.
    pub fn start<B, D, C>(&self, device: &mut Device<'n, B, D, C>) -> Result<(), Error>
    where
        B: RegisterBus,
        D: CyclicDmaChannel,
        C: AudioClock,
    {
        device.start_stop(Command::Start)
    }

    /// Stop streaming.
    pub fn stop<B, D, C>(&self, device: &mut Device<'n, B, D, C>) -> Result<(), Error>
    where
        B: RegisterBus,
        D: CyclicDmaChannel,
        C: AudioClock,
    {
        device.start_stop(Command::Stop)
    }

    /// Silence playback if the client ever ran, then shut the device down.
    pub fn close<B, D, C>(self, device: &mut Device<'n, B, D, C>) -> Result<(), Error>
    where
        B: RegisterBus,
        D: CyclicDmaChannel,
        C: AudioClock,
    {
        let silence = if self.waited {
            device.zero_playback()
        } else {
            Ok(())
        };
        if self.underruns != 0 {
            debug!("session closed with {} under-runs", self.underruns);
        }
        let exit = device.exit();
        silence.and(exit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn outputs_are_named_out() {
        let table = channel_table(Direction::Playback, 8).unwrap();
        assert_eq!(table.len(), 8);
        assert_eq!(table[7].name.as_str(), "OUT-7");
        assert_eq!(table[7].direction, Direction::Playback);
    }

    #[test]
    fn channels_are_interleaved() {
        let table = channel_table(Direction::Capture, 3).unwrap();
        let layout: std::vec::Vec<_> = table
            .iter()
            .map(|c| (c.name.as_str(), c.start_offset, c.stride))
            .collect();
        assert_eq!(layout, [("IN-0", 0, 3), ("IN-1", 1, 3), ("IN-2", 2, 3)]);
    }

    #[test]
    fn too_many_channels() {
        assert_eq!(
            channel_table(Direction::Capture, 9),
            Err(Error::InvalidChannelCount(9))
        );
    }
}
