/*!
    Shared types for the ffmpeg demux and decode crates.

    This crate defines the vocabulary that crosses crate boundaries. It has
    no dependency on FFmpeg, so consumers can depend on it without pulling
    in FFmpeg bindings.

    # Core Types

    - [`Rational`] - Rational numbers for time bases and frame rates
    - [`Pts`] and [`MediaDuration`] - Timestamps in time_base units
    - [`MappedFrame`] - Decoded video copied into host memory

    # Format Types

    - [`PixelFormat`] - Video pixel formats
    - [`PlaneLayout`] - Plane sizes of a packed image
    - [`SampleFormat`] and [`AudioFormat`] - Audio formats

    # Stream Information

    - [`MediaKind`] - Media type of an elementary stream
    - [`StreamInfo`] - Static description of one elementary stream
    - [`Metadata`] - Container and stream tags

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
    - [`ParseError`] - Unknown names in `FromStr` implementations
*/

mod error;
mod format;
mod frame;
mod media;
mod rational;
mod stream;
mod timestamp;

pub use error::{Error, ParseError, Result};
pub use format::{AudioFormat, PixelFormat, PlaneLayout, SampleFormat};
pub use frame::MappedFrame;
pub use media::{MediaKind, Metadata};
pub use rational::Rational;
pub use stream::StreamInfo;
pub use timestamp::{MediaDuration, Pts};
