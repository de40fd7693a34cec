//! # edgeframe
//!
//! A bit-serial, self-clocking framing protocol for short messages sent
//! over noisy one-bit channels, such as a cheap ASK/OOK RF transmitter and
//! receiver pair.
//!
//! Two state machines are provided:
//!
//! * [`Encoder`] turns a queued payload into a stream of line-level
//!   commands (`Hold` / `DriveLow` / `DriveHigh` / `Done`) that the caller
//!   drives onto an output pin, one per tick.
//! * [`Decoder`] turns a stream of sampled line levels back into payloads.
//!   It recovers its own bit clock from a preamble, so the sender and
//!   receiver do not need a shared external clock.
//!
//! # Wire format
//!
//! Every frame is, in order: a fast preamble (the byte `0xFF`, used for
//! clock recovery), a slow preamble (`0x55`, used to confirm frame start),
//! a length byte, a one-byte sum-and-invert checksum, and the payload.
//! Every byte is Manchester coded (a logical `1` is a low-then-high
//! half-bit pair, a logical `0` is high-then-low) and sent MSB-first.
//!
//! # No dynamic allocation
//!
//! Both state machines operate over caller-supplied buffers and perform no
//! allocation, making them usable in `no_std` environments such as a
//! microcontroller's timer interrupt handler.
//!
//! ```
//! use edgeframe::{Decoder, Encoder, LineCommand, StepOutcome};
//!
//! let mut enc_buf = [0u8; 8];
//! let mut enc = Encoder::new(&mut enc_buf, 1).unwrap();
//! enc.enqueue(&[0xAA, 0x00]).unwrap();
//!
//! let mut dec_buf = [0u8; 32];
//! let mut received: Option<std::vec::Vec<u8>> = None;
//! let mut dec = Decoder::new(&mut dec_buf, |data: &[u8]| received = Some(data.to_vec())).unwrap();
//!
//! let mut level = false;
//! loop {
//!     match enc.step() {
//!         LineCommand::Hold => {}
//!         LineCommand::DriveLow => level = false,
//!         LineCommand::DriveHigh => level = true,
//!         LineCommand::Done => break,
//!     }
//!     if dec.step(level) == StepOutcome::FrameReceived {
//!         break;
//!     }
//! }
//! assert_eq!(received, Some(std::vec![0xAA, 0x00]));
//! ```

#![no_std]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod framing;

pub use decoder::{Decoder, DecoderInitError, FrameSink, StepOutcome};
pub use encoder::{Encoder, EncoderEnqueueError, EncoderInitError, LineCommand};
