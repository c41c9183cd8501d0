/*!
    Packets, frames and decoding for the ffmpeg demux and decode crates.

    This crate turns encoded packets into raw frames. Every handle it hands
    out ([`Packet`], [`Frame`], [`Stream`], [`Codec`]) is a cheap,
    reference-counted clone that can cross thread boundaries.

    Video decoding may run on a hardware accelerator, see [`HwDevice`].
    Frames decoded on a device stay in device memory until
    [`VideoBuffer::map`] copies them to the host.
*/

mod audio;
mod buffer;
mod codec;
mod config;
mod frame;
mod hw;
mod packet;
mod stream;
mod video;

pub use audio::AudioFrame;
pub use buffer::VideoBuffer;
pub use codec::Codec;
pub use config::VideoDecoderConfig;
pub use frame::Frame;
pub use hw::HwDevice;
pub use packet::Packet;
pub use stream::Stream;
pub use video::VideoFrame;

static_assertions::assert_impl_all!(Packet: Send, Sync, Clone, Default);
static_assertions::assert_impl_all!(Frame: Send, Sync, Clone, Default);
static_assertions::assert_impl_all!(AudioFrame: Send, Sync, Clone, Default);
static_assertions::assert_impl_all!(VideoFrame: Send, Sync, Clone, Default);
static_assertions::assert_impl_all!(Stream: Send, Sync, Clone);
static_assertions::assert_impl_all!(Codec: Send, Sync, Clone);
