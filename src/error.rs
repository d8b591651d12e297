use core::fmt;

/// Errors returned by the codec and the service plumbing around it.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Packet does not start with a header byte (bit 7 of byte 0 is clear).
    ///
    /// This is the only error that fails a whole decode. Anything else wrong
    /// inside a packet degrades to "decode as many complete messages as
    /// possible".
    MissingHeader,

    /// Invalid value supplied for field.
    ///
    /// Returned when a message cannot be represented where it is being put,
    /// eg. appending an event whose timestamp moves backwards within the
    /// packet under construction.
    InvalidValue,

    /// Unexpectedly reached EOF while reading or writing data.
    ///
    /// This is returned when an outbound payload does not fit into the
    /// notification buffer, and when reaching EOF prematurely while reading
    /// data from a buffer.
    Eof,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::MissingHeader => "missing packet header",
            Error::InvalidValue => "invalid value for field",
            Error::Eof => "end of buffer",
        })
    }
}
