pub type ParseResult<T> = core::result::Result<T, ProtocolError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A field read would run past the end of the buffer. Classification
    /// fixes valid frame lengths, so hitting this means a decoder defect.
    OutOfBounds {
        field: &'static str,
        end: usize,
        len: usize,
    },
    CrcMismatch {
        expected: u16,
        actual: u16,
    },
    InvalidMeasurementKind(Box<str>),
}
