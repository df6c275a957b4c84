use crate::enums::TraceFormat;

/// Basic Error types.
#[derive(Debug)]
pub enum JsError {
    /// TryFromSliceError from the std library.
    TryFromSlice(std::array::TryFromSliceError),
    /// IoError from the std library.
    StdIoError(std::io::Error),
    /// A wrapped `quick_xml` error from reading or writing a sidecar file.
    Xml(quick_xml::Error),
    /// Enum creation error.
    ParseEnum { f: String, code: String },
    /// A caller asked for something the dataset cannot do in its current state.
    PreconditionViolated { msg: String },
    /// A sidecar file is missing a field, or declares something inconsistent.
    MalformedMetadata { msg: String },
    /// A data-home environment variable does not agree with the dataset path.
    EnvironmentMisconfigured { msg: String },
    /// Trace property lookup by label failed.
    PropertyNotFound { label: String },
    /// Data property lookup by label failed.
    DataPropertyNotFound { label: String },
    /// The on-disk trace format is recognised but the codec does not handle it.
    UnsupportedTraceFormat { format: TraceFormat },
    /// A logical index does not fall on the framework grid of an axis.
    AddressOutOfGrid { axis: usize, value: i64 },
    /// An extent file ended before the requested record did.
    ShortRead { a: usize, b: usize },
    /// Bit converter cannot fulfil the conversion.
    BitConversionError { msg: String },
    #[cfg(feature = "to_json")]
    /// Serialisation/Deserialisation error.
    SerdeError(serde_json::Error),
}

impl From<std::array::TryFromSliceError> for JsError {
    fn from(e: std::array::TryFromSliceError) -> Self {
        Self::TryFromSlice(e)
    }
}

impl From<std::io::Error> for JsError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<quick_xml::Error> for JsError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e)
    }
}

impl std::fmt::Display for JsError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use self::JsError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => write!(fmt, "{}", x),
            StdIoError(x) => write!(fmt, "{}", x),
            TryFromSlice(x) => write!(fmt, "{}", x),
            Xml(x) => write!(fmt, "Could not process sidecar XML: {}", x),
            ParseEnum { f, code } => write!(fmt, "Could not parse source ({}) to {}.", code, f),
            PreconditionViolated { msg } => write!(fmt, "Precondition violated: {}", msg),
            MalformedMetadata { msg } => write!(fmt, "Malformed dataset: {}", msg),
            EnvironmentMisconfigured { msg } => write!(fmt, "Data home misconfigured: {}", msg),
            PropertyNotFound { label } => write!(fmt, "Trace property '{}' not found.", label),
            DataPropertyNotFound { label } => write!(fmt, "Data property '{}' not found.", label),
            UnsupportedTraceFormat { format } => {
                write!(fmt, "Trace format {} is not supported by the codec.", format)
            }
            AddressOutOfGrid { axis, value } => write!(
                fmt,
                "Logical index {} does not fall on the grid of axis {}.",
                value, axis
            ),
            ShortRead { a, b } => write!(
                fmt,
                "Extent ended early (read {}-bytes, needed {}-bytes).",
                a, b
            ),
            BitConversionError { msg } => write!(fmt, "Bit conversion failed: {}", msg),
        }
    }
}

impl From<JsError> for String {
    fn from(e: JsError) -> String {
        e.to_string()
    }
}

impl std::error::Error for JsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::JsError::*;
        match self {
            #[cfg(feature = "to_json")]
            SerdeError(x) => x.source(),
            StdIoError(x) => x.source(),
            TryFromSlice(x) => x.source(),
            Xml(x) => x.source(),
            _ => None,
        }
    }
}
