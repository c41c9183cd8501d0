/*!
    Error types for the ffmpeg demux and decode crates.
*/

use thiserror::Error;

/**
    Error type for the ffmpeg demux and decode crates.

    Opening, codec initialization and seeking each have their own variant so
    callers can tell a dead session apart from a recoverable failure.
*/
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be opened, parsed or probed.
    #[error("failed to open '{location}': {message}")]
    Open { location: String, message: String },

    /// No usable decoder for a stream.
    #[error("no usable decoder for stream {index}: {message}")]
    CodecInit { index: usize, message: String },

    /// Seek rejected or failed.
    #[error("seek failed: {message}")]
    Seek { message: String },

    /// A single packet could not be decoded.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The decoder is in a state it cannot recover from.
    #[error("decoder state error: {message}")]
    DecoderState { message: String },

    /// The media source specification is malformed.
    #[error("invalid input specification: {message}")]
    InvalidInput { message: String },

    /// Valid data in a format that is not handled.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// Hardware device creation or frame transfer failed.
    #[error("hardware device error: {message}")]
    HwDevice { message: String },

    /// The operation needs a loaded source.
    #[error("no media loaded")]
    NotLoaded,
}

impl Error {
    /**
        Create an open error for the given location.
    */
    pub fn open(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Open {
            location: location.into(),
            message: message.into(),
        }
    }

    /**
        Create a codec initialization error for the given stream index.
    */
    pub fn codec_init(index: usize, message: impl Into<String>) -> Self {
        Self::CodecInit {
            index,
            message: message.into(),
        }
    }

    /**
        Create a seek error with the given message.
    */
    pub fn seek(message: impl Into<String>) -> Self {
        Self::Seek {
            message: message.into(),
        }
    }

    /**
        Create a per-packet decode error with the given message.
    */
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /**
        Create a fatal decoder state error with the given message.
    */
    pub fn decoder_state(message: impl Into<String>) -> Self {
        Self::DecoderState {
            message: message.into(),
        }
    }

    /**
        Create an invalid input specification error with the given message.
    */
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /**
        Create an unsupported format error with the given message.
    */
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /**
        Create a hardware device error with the given message.
    */
    pub fn hw_device(message: impl Into<String>) -> Self {
        Self::HwDevice {
            message: message.into(),
        }
    }

    /**
        Returns true if this error came from opening a source.
    */
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::InvalidInput { .. })
    }

    /**
        Returns true if this is a seek error.
    */
    pub fn is_seek(&self) -> bool {
        matches!(self, Self::Seek { .. })
    }

    /**
        Returns true if the error leaves the decoder unusable.

        Per-packet decode errors are recoverable, the next packet may
        decode fine.
    */
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DecoderState { .. })
    }
}

/**
    Result type alias for the ffmpeg demux and decode crates.
*/
pub type Result<T> = std::result::Result<T, Error>;

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}
