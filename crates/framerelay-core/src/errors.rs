use thiserror::Error;

/// Failure taxonomy of a single capture run.
///
/// Every variant is fatal to the run that raised it and to nothing else:
/// the session drops back to idle and a later `start()` may retry. The
/// process keeps serving (possibly with a stale framebuffer).
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("unsupported pixel depth {0} (expected 24 or 32)")]
    UnsupportedDepth(u8),

    #[error("configuration invalid: {reason}")]
    InvalidConfig { reason: String },

    #[error("could not open source '{input}': {reason}")]
    Open { input: String, reason: String },

    #[error("could not read stream information: {0}")]
    StreamInfo(String),

    #[error("no video stream found in the input")]
    NoVideoStream,

    #[error("decoder setup failed: {0}")]
    Codec(String),

    #[error("error decoding video frame: {0}")]
    Decode(String),

    #[error("failed to create scale context for conversion: {0}")]
    Scaler(String),
}

/// Errors raised by the input-relay transport.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to open HID device '{path}': {source}")]
    DeviceOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write HID report: {0}")]
    ReportWrite(#[from] std::io::Error),
}
