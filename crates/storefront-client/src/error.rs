//! # Client Error Types
//!
//! Errors raised by the cart store, the API adapters and checkout, plus the
//! user-facing shape the mobile UI renders.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Domain         │  │   Remote API    │  │     Local               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(..)       │  │  RemoteCart     │  │  Storage                │ │
//! │  │  (validation,   │  │  OrderSubmission│  │  Serialization          │ │
//! │  │   rental, ...)  │  │  BranchLookup   │  │  SubmissionInProgress   │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                    │
//! │  │  Configuration  │   ClientError ──► UserError { code, field,         │
//! │  │  InvalidConfig  │                               message }            │
//! │  │  InvalidUrl     │                                                    │
//! │  │  ConfigLoad/Save│                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Remote errors carry `status: None` when the request never got an HTTP
//! response (DNS, refused connection, timeout).

use serde::Serialize;
use storefront_core::CoreError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can go wrong in the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Cart, pricing or checkout rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Remote API Errors
    // =========================================================================
    /// The remote cart rejected or never answered a request.
    #[error("Remote cart request failed: {message}")]
    RemoteCart {
        status: Option<u16>,
        message: String,
    },

    /// Order placement failed. Re-submitting the same draft is safe.
    #[error("Order submission failed: {message}")]
    OrderSubmission {
        status: Option<u16>,
        message: String,
    },

    /// Branch availability could not be fetched.
    #[error("Branch lookup failed: {message}")]
    BranchLookup {
        status: Option<u16>,
        message: String,
    },

    /// The order endpoint answered 2xx but the body could not be read.
    /// The order was most likely placed; submitting again may duplicate it.
    #[error("Order response could not be read: {0}")]
    OrderOutcomeUnknown(String),

    /// A checkout is already running for this session.
    #[error("An order is already being submitted")]
    SubmissionInProgress,

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Reading or writing local storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// HTTP status of a remote failure, if a response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RemoteCart { status, .. }
            | ClientError::OrderSubmission { status, .. }
            | ClientError::BranchLookup { status, .. } => *status,
            _ => None,
        }
    }

    /// True when the request never reached the server or got no response.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ClientError::RemoteCart { status: None, .. }
                | ClientError::OrderSubmission { status: None, .. }
                | ClientError::BranchLookup { status: None, .. }
        )
    }

    /// Returns true if the caller may retry the same operation.
    ///
    /// ## Retryable Errors
    /// - Any transport failure (no HTTP response)
    /// - Order submission rejected with 429 or 5xx
    ///
    /// ## Non-Retryable Errors
    /// - Domain errors: the customer has to change the input
    /// - Configuration and local storage errors
    pub fn is_retryable(&self) -> bool {
        if self.is_network() {
            return true;
        }
        match self {
            ClientError::OrderSubmission {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// User-Facing Error
// =============================================================================

/// The message generic transport failures are shown with.
pub const NETWORK_RETRY_MESSAGE: &str =
    "Could not reach the store. Check your connection and try again.";

pub const STORAGE_MESSAGE: &str =
    "Your cart could not be saved on this device. Free up some storage and try again.";

pub const DATA_FORMAT_MESSAGE: &str =
    "Some cart data could not be read. Update the app and reopen your cart.";

pub const ORDER_UNCONFIRMED_MESSAGE: &str =
    "Your order may have been placed but could not be confirmed. Check your orders before ordering again.";

/// What the UI receives when an operation fails.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INVALID_CUSTOMER_INFO",
///   "field": "phoneNumber",
///   "message": "Invalid phoneNumber: must be a mobile number starting with 0 or 84"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Input the message belongs next to, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Human-readable error message for display
    pub message: String,

    pub retryable: bool,
}

/// Error codes for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidRentalSelection,
    IncompleteRentalSelection,
    InvalidCustomerInfo,
    MissingShippingAddress,
    BranchUnavailable,
    InvalidLineItem,
    NotFound,
    /// Transport failure; show the generic retry prompt
    Network,
    /// The server answered with an error
    Server,
    /// The order was sent but its confirmation could not be read
    OrderUnconfirmed,
    SubmissionInProgress,
    /// On-device storage failed
    Storage,
    /// Stored or received data is not in the expected format
    DataFormat,
    Configuration,
}

impl UserError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        UserError {
            code,
            field: None,
            message: message.into(),
            retryable: false,
        }
    }

    fn with_field(mut self, field: Option<&str>) -> Self {
        self.field = field.map(str::to_string);
        self
    }
}

impl From<&CoreError> for UserError {
    fn from(err: &CoreError) -> Self {
        let code = match err {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InvalidRentalSelection { .. } => ErrorCode::InvalidRentalSelection,
            CoreError::IncompleteRentalSelection { .. } => ErrorCode::IncompleteRentalSelection,
            CoreError::InvalidCustomerInfo { .. } => ErrorCode::InvalidCustomerInfo,
            CoreError::MissingShippingAddress => ErrorCode::MissingShippingAddress,
            CoreError::BranchUnavailable { .. } => ErrorCode::BranchUnavailable,
            CoreError::InvalidLineItem { .. } => ErrorCode::InvalidLineItem,
            CoreError::ItemNotFound(_) => ErrorCode::NotFound,
        };
        UserError::new(code, err.to_string()).with_field(err.field())
    }
}

impl From<&ClientError> for UserError {
    fn from(err: &ClientError) -> Self {
        if err.is_network() {
            return UserError {
                retryable: true,
                ..UserError::new(ErrorCode::Network, NETWORK_RETRY_MESSAGE)
            };
        }

        match err {
            ClientError::Core(core) => UserError::from(core),
            ClientError::RemoteCart { message, .. }
            | ClientError::OrderSubmission { message, .. }
            | ClientError::BranchLookup { message, .. } => UserError {
                retryable: err.is_retryable(),
                ..UserError::new(ErrorCode::Server, message.clone())
            },
            ClientError::OrderOutcomeUnknown(_) => {
                UserError::new(ErrorCode::OrderUnconfirmed, ORDER_UNCONFIRMED_MESSAGE)
            }
            ClientError::SubmissionInProgress => {
                UserError::new(ErrorCode::SubmissionInProgress, err.to_string())
            }
            ClientError::Storage(_) => UserError::new(ErrorCode::Storage, STORAGE_MESSAGE),
            ClientError::Serialization(_) => {
                UserError::new(ErrorCode::DataFormat, DATA_FORMAT_MESSAGE)
            }
            ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_) => {
                UserError::new(ErrorCode::Configuration, err.to_string())
            }
        }
    }
}

impl From<ClientError> for UserError {
    fn from(err: ClientError) -> Self {
        UserError::from(&err)
    }
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for UserError {}
