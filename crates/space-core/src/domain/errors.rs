use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SpaceResult<T> = Result<T, SpaceError>;
pub type ParserResult<T> = SpaceResult<T>;
pub type PipelineResult<T> = SpaceResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl SpaceErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Failure kinds a caller can branch on to present distinct messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceErrorKind {
    /// One input file could not be turned into a record.
    Parse,
    /// The filtered input file list (or the parsed batch) is empty.
    EmptyInput,
    /// The wavelength ranges of the batch do not intersect.
    NoCommonRange,
    /// Records disagree on their sample axis after alignment.
    AlignmentInvariant,
    InvalidInput,
    Io,
    Computation,
}

impl SpaceErrorKind {
    pub const fn category(self) -> SpaceErrorCategory {
        match self {
            Self::Parse | Self::EmptyInput | Self::NoCommonRange | Self::InvalidInput => {
                SpaceErrorCategory::InputValidationError
            }
            Self::Io => SpaceErrorCategory::IoSystemError,
            Self::Computation => SpaceErrorCategory::ComputationError,
            Self::AlignmentInvariant => SpaceErrorCategory::InternalError,
        }
    }

    pub const fn is_batch_fatal(self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::NoCommonRange | Self::AlignmentInvariant
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceError {
    kind: SpaceErrorKind,
    placeholder: &'static str,
    message: String,
}

impl SpaceError {
    pub fn new(
        kind: SpaceErrorKind,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            placeholder,
            message: message.into(),
        }
    }

    pub fn parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaceErrorKind::Parse, placeholder, message)
    }

    pub fn empty_input(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaceErrorKind::EmptyInput, placeholder, message)
    }

    pub fn no_common_range(message: impl Into<String>) -> Self {
        Self::new(SpaceErrorKind::NoCommonRange, "INPUT.NO_COMMON_RANGE", message)
    }

    pub fn alignment_invariant(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaceErrorKind::AlignmentInvariant, placeholder, message)
    }

    pub fn invalid_input(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaceErrorKind::InvalidInput, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaceErrorKind::Io, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SpaceErrorKind::Computation, placeholder, message)
    }

    pub const fn kind(&self) -> SpaceErrorKind {
        self.kind
    }

    pub const fn category(&self) -> SpaceErrorCategory {
        self.kind.category()
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category().is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category()
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for SpaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category().as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for SpaceError {}
