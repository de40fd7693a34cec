//! The receiving half of the framing protocol.

use crate::framing::{approx_eq, checksum, MAX_POSSIBLE_DELAY, RING_BUF_SIZE, SHORT_TRANSITIONS};

/// Decoder phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Searching for the 0xFF/0x55 preamble and recovering the bit clock.
    Header,
    Length,
    Checksum,
    Payload,
}

/// Error returned by [`Decoder::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderInitError {
    /// `buffer.len()` was outside `16..=255`.
    BadBufferSize,
}

/// Result of a single [`Decoder::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// Nothing new to report.
    Continue,
    /// A checksum-valid frame was delivered to the sink this tick.
    FrameReceived,
}

/// Receives a successfully decoded frame.
///
/// Implemented for any `FnMut(&[u8])`, so a capturing closure can be used
/// directly in place of a hand-written type.
pub trait FrameSink {
    /// Called once per validated frame, synchronously from [`Decoder::step`].
    fn on_frame(&mut self, data: &[u8]);
}

impl<F: FnMut(&[u8])> FrameSink for F {
    fn on_frame(&mut self, data: &[u8]) {
        self(data)
    }
}

/// Demodulates a Manchester-coded, self-clocking line signal back into
/// framed payloads.
///
/// `step` should be called once per sample. The decoder recovers its own
/// bit clock from the preamble, so no external timing information is
/// required beyond a consistent sample rate.
pub struct Decoder<'a, S: FrameSink> {
    buffer: &'a mut [u8],
    mode: Mode,
    last: Option<bool>,
    ticks: u8,
    pre_ticks: u8,
    interval: u8,
    bit_index: u8,
    bit_accum: u8,
    payload_length: u8,
    chksum: u8,
    index: u16,
    sink: S,
}

impl<'a, S: FrameSink> Decoder<'a, S> {
    /// Creates a decoder over a caller-owned scratch buffer.
    ///
    /// `buffer` is reused both as the edge-interval ring buffer during
    /// clock recovery and as the payload accumulator afterwards, so its
    /// length doubles as the largest payload this decoder can accept; it
    /// must be between 16 and 255 bytes.
    pub fn new(buffer: &'a mut [u8], sink: S) -> Result<Self, DecoderInitError> {
        if buffer.len() < RING_BUF_SIZE || buffer.len() > 255 {
            return Err(DecoderInitError::BadBufferSize);
        }
        buffer.fill(0);
        Ok(Decoder {
            buffer,
            mode: Mode::Header,
            last: None,
            ticks: 0,
            pre_ticks: 0,
            interval: 0,
            bit_index: 0x80,
            bit_accum: 0,
            payload_length: 0,
            chksum: 0,
            index: 0,
            sink,
        })
    }

    /// Feeds one sampled line level into the decoder.
    pub fn step(&mut self, bit: bool) -> StepOutcome {
        self.ticks = self.ticks.saturating_add(1);
        match self.mode {
            Mode::Header => {
                self.step_header(bit);
                StepOutcome::Continue
            }
            Mode::Length | Mode::Checksum | Mode::Payload => self.step_body(bit),
        }
    }

    fn step_header(&mut self, bit: bool) {
        let edge = self.last != Some(bit);
        if !edge {
            return;
        }
        self.append_to_ring_buffer(0);
        self.ticks = 0;

        let mut total: u32 = 0;
        let mut avg: u32 = 0;
        let mut long_count: u32 = 0;
        for i in 0..RING_BUF_SIZE {
            let idx = (self.index as usize + i) & (RING_BUF_SIZE - 1);
            let val = self.buffer[idx];
            if val == MAX_POSSIBLE_DELAY {
                break;
            }
            if i < RING_BUF_SIZE - SHORT_TRANSITIONS {
                total += val as u32;
                if i == RING_BUF_SIZE - SHORT_TRANSITIONS - 1 {
                    avg = total / (RING_BUF_SIZE - SHORT_TRANSITIONS) as u32;
                }
            } else if avg > 0 && approx_eq(val as u16, (2 * avg) as u16) {
                long_count += 1;
            }
        }

        if long_count == SHORT_TRANSITIONS as u32 && avg > 0 {
            self.mode = Mode::Length;
            self.ticks = 0;
            self.interval = avg as u8;
        }
        self.last = Some(bit);
    }

    fn step_body(&mut self, bit: bool) -> StepOutcome {
        let save_ticks = self.mode != Mode::Payload;

        if self.last == Some(bit) {
            let gap = (self.ticks as u16).saturating_sub(self.pre_ticks as u16);
            if longer_than_tolerance(gap, 2 * self.interval as u16) {
                self.reset();
            }
            return StepOutcome::Continue;
        }
        self.last = Some(bit);

        let interval = self.interval as u16;
        if self.pre_ticks == 0 && approx_eq(self.ticks as u16, interval) {
            if save_ticks {
                self.append_to_ring_buffer(0);
            }
            self.pre_ticks = self.ticks;
        } else if approx_eq(self.ticks as u16, 2 * interval) {
            if save_ticks {
                self.append_to_ring_buffer(self.pre_ticks);
            }
            self.pre_ticks = 0;
            self.ticks = 0;
            if self.sink_bit(bit) {
                return self.on_byte_complete();
            }
        }
        StepOutcome::Continue
    }

    /// Saves the most recent tick count in the ring buffer at `self.index`,
    /// then advances `self.index`. The very first entry is the sentinel
    /// [`MAX_POSSIBLE_DELAY`], since no prior edge exists to measure from.
    fn append_to_ring_buffer(&mut self, offset: u8) {
        let slot = (self.index as usize) & (RING_BUF_SIZE - 1);
        self.buffer[slot] = if self.index == 0 {
            MAX_POSSIBLE_DELAY
        } else {
            self.ticks.wrapping_sub(offset)
        };
        self.index = self.index.wrapping_add(1);
    }

    /// Folds `bit` into the MSB-first byte accumulator.
    /// Returns `true` once a full byte has been assembled.
    fn sink_bit(&mut self, bit: bool) -> bool {
        if bit {
            self.bit_accum |= self.bit_index;
        }
        self.bit_index >>= 1;
        if self.bit_index == 0 {
            self.bit_index = 0x80;
            true
        } else {
            false
        }
    }

    fn on_byte_complete(&mut self) -> StepOutcome {
        let byte = self.bit_accum;
        self.bit_accum = 0;
        match self.mode {
            Mode::Header => unreachable!("bytes are only assembled outside Header"),
            Mode::Length => {
                self.payload_length = byte;
                if self.payload_length == 0 || self.payload_length as usize > self.buffer.len() {
                    self.reset();
                } else {
                    self.mode = Mode::Checksum;
                }
                StepOutcome::Continue
            }
            Mode::Checksum => {
                self.chksum = byte;
                self.index = 0;
                self.mode = Mode::Payload;
                StepOutcome::Continue
            }
            Mode::Payload => {
                self.buffer[self.index as usize] = byte;
                self.index += 1;
                if self.index != self.payload_length as u16 {
                    return StepOutcome::Continue;
                }
                let len = self.payload_length as usize;
                let valid = checksum(&self.buffer[..len]) == self.chksum;
                if valid {
                    self.sink.on_frame(&self.buffer[..len]);
                }
                self.reset();
                self.index = 0;
                if valid {
                    StepOutcome::FrameReceived
                } else {
                    StepOutcome::Continue
                }
            }
        }
    }

    /// Returns the decoder to [`Mode::Header`] without disturbing the ring
    /// buffer contents or `last` — a real preamble overlapping a false
    /// header is still recoverable this way.
    fn reset(&mut self) {
        self.mode = Mode::Header;
        self.ticks = 0;
        self.bit_index = 0x80;
        self.interval = 0;
        self.bit_accum = 0;
        self.payload_length = 0;
        self.pre_ticks = 0;
    }
}

fn longer_than_tolerance(elapsed: u16, interval_budget: u16) -> bool {
    let max = interval_budget + interval_budget / 4;
    elapsed > max
}
