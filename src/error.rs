//! Contains detailed error representation.
//!
//! See the main [`PanoError`] which contains a variant for each specialized error type. The
//! subtypes used in each variant are opaque by design. They can be roughly inspected through
//! their respective `kind` methods which work similar to `std::io::Error::kind`.

use std::error::Error;
use std::fmt;
use std::io;

/// The binary formats this crate reads or writes.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssetFormat {
    /// Multi-channel OpenEXR source containers.
    Exr,
    /// PNG preview output.
    Png,
    /// The RVL compressed depth container.
    Rvl,
}

impl AssetFormat {
    fn as_str(self) -> &'static str {
        match self {
            AssetFormat::Exr => "EXR",
            AssetFormat::Png => "PNG",
            AssetFormat::Rvl => "RVL",
        }
    }
}

/// The generic error type for asset extraction and encoding operations.
///
/// This high level enum allows, by variant matching, a rough separation of concerns between
/// underlying IO, the caller, format specifications, and this crate's implementation.
#[derive(Debug)]
pub enum PanoError {
    /// An error was encountered while decoding.
    ///
    /// The input data did not conform to the format it claims to be: a bad magic number, a
    /// truncated header or payload, or channel data inconsistent with the declared dimensions.
    Decoding(DecodingError),

    /// An error was encountered while encoding.
    Encoding(EncodingError),

    /// An error was encountered in input arguments.
    ///
    /// This is a catch-all case for strictly internal operations such as filtering and
    /// quantization that involve no external format specifications.
    Parameter(ParameterError),

    /// An operation can not be completed by the chosen abstraction.
    ///
    /// Chiefly: a source channel uses a pixel encoding the pipeline does not handle.
    Unsupported(UnsupportedError),

    /// Completing the operation would have required more resources than allowed.
    Limits(LimitError),

    /// An error occurred while interacting with the environment.
    IoError(io::Error),
}

/// An error was encountered while decoding an asset.
///
/// This is used as an opaque representation for the [`PanoError::Decoding`] variant.
#[derive(Debug)]
pub struct DecodingError {
    format: AssetFormat,
    underlying: Box<dyn Error + Send + Sync>,
}

impl DecodingError {
    /// Create a `DecodingError` that stems from the decoding of `format`.
    pub fn new(format: AssetFormat, err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        DecodingError {
            format,
            underlying: err.into(),
        }
    }

    /// Returns the format that was being decoded.
    pub fn format(&self) -> AssetFormat {
        self.format
    }
}

/// An error was encountered while encoding an asset.
///
/// This is used as an opaque representation for the [`PanoError::Encoding`] variant.
#[derive(Debug)]
pub struct EncodingError {
    format: AssetFormat,
    underlying: Box<dyn Error + Send + Sync>,
}

impl EncodingError {
    /// Create an `EncodingError` that stems from the encoding of `format`.
    pub fn new(format: AssetFormat, err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        EncodingError {
            format,
            underlying: err.into(),
        }
    }

    /// Returns the format that was being encoded.
    pub fn format(&self) -> AssetFormat {
        self.format
    }
}

/// An error was encountered in inputs arguments.
///
/// This is used as an opaque representation for the [`PanoError::Parameter`] variant.
#[derive(Debug)]
pub struct ParameterError {
    kind: ParameterErrorKind,
}

impl ParameterError {
    /// Construct a `ParameterError` directly from a corresponding kind.
    pub fn from_kind(kind: ParameterErrorKind) -> Self {
        ParameterError { kind }
    }

    /// Returns the corresponding `ParameterErrorKind`.
    pub fn kind(&self) -> ParameterErrorKind {
        self.kind.clone()
    }
}

/// Details how a parameter is malformed.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ParameterErrorKind {
    /// Two buffers that must agree in size do not.
    DimensionMismatch,
    /// A near/far plane pair is unusable: `near >= far`, non-finite, or non-positive.
    InvalidDepthRange {
        /// The offending near plane.
        near: f32,
        /// The offending far plane.
        far: f32,
    },
    /// A string describing the parameter.
    Generic(String),
}

/// An operation was not supported by the pipeline.
///
/// This is used as an opaque representation for the [`PanoError::Unsupported`] variant.
#[derive(Debug)]
pub struct UnsupportedError {
    format: AssetFormat,
    kind: UnsupportedErrorKind,
}

impl UnsupportedError {
    /// Create an `UnsupportedError` for a format together with a detailed kind.
    pub fn from_format_and_kind(format: AssetFormat, kind: UnsupportedErrorKind) -> Self {
        UnsupportedError { format, kind }
    }

    /// Returns the corresponding `UnsupportedErrorKind`.
    pub fn kind(&self) -> UnsupportedErrorKind {
        self.kind.clone()
    }

    /// Returns the format the unsupported input belongs to.
    pub fn format(&self) -> AssetFormat {
        self.format
    }
}

/// Details what feature is not supported.
#[derive(Clone, Debug, Hash, PartialEq)]
#[non_exhaustive]
pub enum UnsupportedErrorKind {
    /// A source channel uses a pixel encoding the quantizer/denoiser pipeline cannot consume.
    PixelEncoding(String),
    /// Some feature specified by string.
    GenericFeature(String),
}

/// Indicates the limit that prevented an operation from completing.
///
/// This is used as an opaque representation for the [`PanoError::Limits`] variant.
#[derive(Debug)]
pub struct LimitError {
    kind: LimitErrorKind,
}

impl LimitError {
    /// Construct a `LimitError` directly from a corresponding kind.
    pub fn from_kind(kind: LimitErrorKind) -> Self {
        LimitError { kind }
    }

    /// Returns the corresponding `LimitErrorKind`.
    pub fn kind(&self) -> LimitErrorKind {
        self.kind.clone()
    }
}

/// Indicates the limit that prevented an operation from completing.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitErrorKind {
    /// The resulting buffer would exceed dimension limits in either direction.
    DimensionError,
    /// The operation would have performed an allocation larger than allowed.
    InsufficientMemory,
}

impl fmt::Display for PanoError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PanoError::Decoding(e) => e.fmt(fmt),
            PanoError::Encoding(e) => e.fmt(fmt),
            PanoError::Parameter(e) => e.fmt(fmt),
            PanoError::Unsupported(e) => e.fmt(fmt),
            PanoError::Limits(e) => e.fmt(fmt),
            PanoError::IoError(e) => e.fmt(fmt),
        }
    }
}

impl fmt::Display for DecodingError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Format error decoding {}: {}",
            self.format.as_str(),
            self.underlying
        )
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Format error encoding {}: {}",
            self.format.as_str(),
            self.underlying
        )
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ParameterErrorKind::DimensionMismatch => {
                write!(fmt, "The color and depth buffers must have matching dimensions")
            }
            ParameterErrorKind::InvalidDepthRange { near, far } => write!(
                fmt,
                "The near/far planes ({near}, {far}) do not describe a valid depth range"
            ),
            ParameterErrorKind::Generic(message) => {
                write!(fmt, "The parameter is malformed: {message}")
            }
        }
    }
}

impl fmt::Display for UnsupportedError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            UnsupportedErrorKind::PixelEncoding(detail) => write!(
                fmt,
                "The {} pixel encoding is not supported: {detail}",
                self.format.as_str()
            ),
            UnsupportedErrorKind::GenericFeature(detail) => write!(
                fmt,
                "The {} feature is not supported: {detail}",
                self.format.as_str()
            ),
        }
    }
}

impl fmt::Display for LimitError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            LimitErrorKind::DimensionError => write!(fmt, "Buffer dimensions are too large"),
            LimitErrorKind::InsufficientMemory => write!(fmt, "Insufficient memory"),
        }
    }
}

impl Error for PanoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PanoError::Decoding(e) => Some(&*e.underlying),
            PanoError::Encoding(e) => Some(&*e.underlying),
            PanoError::Parameter(_) => None,
            PanoError::Unsupported(_) => None,
            PanoError::Limits(_) => None,
            PanoError::IoError(e) => Some(e),
        }
    }
}

impl From<io::Error> for PanoError {
    fn from(err: io::Error) -> PanoError {
        PanoError::IoError(err)
    }
}

/// Result of an asset decoding/encoding process.
pub type PanoResult<T> = Result<T, PanoError>;
