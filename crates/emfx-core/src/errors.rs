use emfx_core_types::Identifier;
use thiserror::Error;

/// Result type alias using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the engine. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Document
    InvalidEncoding,
    InvalidDocument,
    MissingRequiredAttribute,
    UnsupportedVersion,
    UnknownElement,
    InvalidReference,

    // Lookup
    NotFound,

    // Loading
    NoLoader,
    UnsupportedScheme,
    InvalidOptions,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidEncoding => "ERR_INVALID_ENCODING",
            ExErrorKind::InvalidDocument => "ERR_INVALID_DOCUMENT",
            ExErrorKind::MissingRequiredAttribute => "ERR_MISSING_REQUIRED_ATTRIBUTE",
            ExErrorKind::UnsupportedVersion => "ERR_UNSUPPORTED_VERSION",
            ExErrorKind::UnknownElement => "ERR_UNKNOWN_ELEMENT",
            ExErrorKind::InvalidReference => "ERR_INVALID_REFERENCE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::NoLoader => "ERR_NO_LOADER",
            ExErrorKind::UnsupportedScheme => "ERR_UNSUPPORTED_SCHEME",
            ExErrorKind::InvalidOptions => "ERR_INVALID_OPTIONS",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification fields used by log events and external
/// callers, plus free-form context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    object_id: Option<String>,
    locator: Option<String>,
    feature: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            object_id: None,
            locator: None,
            feature: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add object ID context
    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    /// Add document locator context
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// Add feature name context
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the object ID context, if any
    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    /// Get the locator context, if any
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Get the feature context, if any
    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(locator) = &self.locator {
            write!(f, " (locator: {})", locator)?;
        }
        if let Some(object_id) = &self.object_id {
            write!(f, " (object_id: {})", object_id)?;
        }
        if let Some(feature) = &self.feature {
            write!(f, " (feature: {})", feature)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for model loading, resolution and reflective access
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    // ===== Document Errors =====
    /// Document bytes are not valid UTF-8
    #[error("Invalid encoding: {message}")]
    InvalidEncoding { message: String },

    /// One feature name is used both for owned children and for
    /// non-owning values on the same class
    #[error("Feature '{feature}' of {class} is used both as containment and as a non-containment value")]
    FeatureShapeConflict { class: String, feature: String },

    /// Document has no usable top-level element
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// A metamodel element lacks a mandatory attribute
    #[error("Missing required attribute: {name}")]
    MissingRequiredAttribute { name: String },

    /// The document declares a format version this parser does not handle
    #[error("Unsupported document version: {marker}")]
    UnsupportedVersion { marker: String },

    /// An element could not be dispatched to any constructor
    #[error("Unknown element: {tag}")]
    UnknownElement { tag: String },

    /// A link string is malformed (as opposed to merely unresolved)
    #[error("Invalid reference: {reference}")]
    InvalidReference { reference: String },

    /// XML syntax error reported by the tokenizer
    #[error("XML error: {message}")]
    Xml { message: String },

    /// JSON syntax or shape error in the alternate tree syntax
    #[error("JSON error: {message}")]
    Json { message: String },

    // ===== Lookup Errors =====
    /// No object with this identifier in the resource
    #[error("Object not found: {object_id}")]
    ObjectNotFound { object_id: Identifier },

    /// No classifier with this identifier in the resource's metamodel
    #[error("Classifier not found: {classifier_id}")]
    ClassifierNotFound { classifier_id: Identifier },

    // ===== Loading Errors =====
    /// The resource set has no loader to fetch a missing document
    #[error("No loader configured to load {locator}")]
    NoLoader { locator: String },

    /// The locator uses a scheme the loader cannot read
    #[error("Unsupported locator scheme '{scheme}' in {locator}")]
    UnsupportedScheme { scheme: String, locator: String },

    /// Reading the document failed
    #[error("I/O error reading {locator}: {message}")]
    Io { locator: String, message: String },

    /// Parse options could not be read
    #[error("Invalid parse options: {message}")]
    InvalidOptions { message: String },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from ModelError to ExError
impl From<ModelError> for ExError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidEncoding { message } => {
                ExError::new(ExErrorKind::InvalidEncoding).with_message(message)
            }
            ModelError::InvalidDocument { reason } => {
                ExError::new(ExErrorKind::InvalidDocument).with_message(reason)
            }
            ModelError::FeatureShapeConflict { class, feature } => {
                ExError::new(ExErrorKind::InvalidDocument)
                    .with_feature(feature)
                    .with_message(format!("Conflicting containment for a feature of {}", class))
            }
            ModelError::MissingRequiredAttribute { name } => {
                ExError::new(ExErrorKind::MissingRequiredAttribute)
                    .with_feature(name)
                    .with_message("Metamodel element lacks a required attribute")
            }
            ModelError::UnsupportedVersion { marker } => {
                ExError::new(ExErrorKind::UnsupportedVersion)
                    .with_message(format!("Unsupported version marker {}", marker))
            }
            ModelError::UnknownElement { tag } => ExError::new(ExErrorKind::UnknownElement)
                .with_message(format!("Cannot dispatch element <{}>", tag)),
            ModelError::InvalidReference { reference } => {
                ExError::new(ExErrorKind::InvalidReference)
                    .with_message(format!("Malformed link '{}'", reference))
            }
            ModelError::Xml { message } => {
                ExError::new(ExErrorKind::InvalidDocument).with_message(message)
            }
            ModelError::Json { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            ModelError::ObjectNotFound { object_id } => ExError::new(ExErrorKind::NotFound)
                .with_object_id(object_id.to_string())
                .with_message("Object not found"),
            ModelError::ClassifierNotFound { classifier_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_object_id(classifier_id.to_string())
                    .with_message("Classifier not found")
            }
            ModelError::NoLoader { locator } => ExError::new(ExErrorKind::NoLoader)
                .with_locator(locator)
                .with_message("Resource set has no loader"),
            ModelError::UnsupportedScheme { scheme, locator } => {
                ExError::new(ExErrorKind::UnsupportedScheme)
                    .with_locator(locator)
                    .with_message(format!("Scheme '{}' is not supported", scheme))
            }
            ModelError::Io { locator, message } => ExError::new(ExErrorKind::Io)
                .with_locator(locator)
                .with_message(message),
            ModelError::InvalidOptions { message } => {
                ExError::new(ExErrorKind::InvalidOptions).with_message(message)
            }
            ModelError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}
