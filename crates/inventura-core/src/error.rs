use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    NotLoggedIn,
    ItemNotFound,
    SnapshotNotFound,
    DuplicateItemNumber,
    InvalidEnumValue,
    ValidationFailed,
    RowLocked,
    InvalidCredentials,
    SessionExpired,
    ConfirmationRequired,
    ConfirmationInvalid,
    CacheWriteFailed,
    ExportWriteFailed,
    StoreUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    pub const ALL: [Self; 17] = [
        Self::NotInitialized,
        Self::ConfigParseError,
        Self::NotLoggedIn,
        Self::ItemNotFound,
        Self::SnapshotNotFound,
        Self::DuplicateItemNumber,
        Self::InvalidEnumValue,
        Self::ValidationFailed,
        Self::RowLocked,
        Self::InvalidCredentials,
        Self::SessionExpired,
        Self::ConfirmationRequired,
        Self::ConfirmationInvalid,
        Self::CacheWriteFailed,
        Self::ExportWriteFailed,
        Self::StoreUnavailable,
        Self::InternalUnexpected,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::NotLoggedIn => "E1003",
            Self::ItemNotFound => "E2001",
            Self::SnapshotNotFound => "E2002",
            Self::DuplicateItemNumber => "E2003",
            Self::InvalidEnumValue => "E2004",
            Self::ValidationFailed => "E2005",
            Self::RowLocked => "E2006",
            Self::InvalidCredentials => "E4001",
            Self::SessionExpired => "E4002",
            Self::ConfirmationRequired => "E4003",
            Self::ConfirmationInvalid => "E4004",
            Self::CacheWriteFailed => "E5001",
            Self::ExportWriteFailed => "E5002",
            Self::StoreUnavailable => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::NotLoggedIn => "Not logged in",
            Self::ItemNotFound => "Item not found",
            Self::SnapshotNotFound => "Inventory snapshot not found",
            Self::DuplicateItemNumber => "Item number already exists",
            Self::InvalidEnumValue => "Invalid cadence/status value",
            Self::ValidationFailed => "Validation failed",
            Self::RowLocked => "Row is locked",
            Self::InvalidCredentials => "Invalid credentials",
            Self::SessionExpired => "Session expired",
            Self::ConfirmationRequired => "Confirmation required",
            Self::ConfirmationInvalid => "Confirmation token invalid or expired",
            Self::CacheWriteFailed => "Value cache write failed",
            Self::ExportWriteFailed => "Export write failed",
            Self::StoreUnavailable => "Store unavailable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `inv init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .inventura/config.toml and retry."),
            Self::NotLoggedIn | Self::SessionExpired => {
                Some("Run `inv login --email <email>` to start a new session.")
            }
            Self::ItemNotFound => Some("List catalog ids with `inv item list --cadence <cadence>`."),
            Self::SnapshotNotFound => Some("List saved snapshots with `inv snapshot list`."),
            Self::DuplicateItemNumber => {
                Some("Item numbers are unique per cadence; edit the existing item instead.")
            }
            Self::InvalidEnumValue => {
                Some("Cadence is daily|weekly|monthly; status is active|pre_activation|inactive.")
            }
            Self::RowLocked => Some("Unlock the row with `inv count lock <item>` first."),
            Self::ConfirmationRequired => Some("Re-run `inv confirm <token>` to proceed."),
            Self::ConfirmationInvalid => Some("Request a fresh token by repeating the command."),
            Self::CacheWriteFailed => Some("Check permissions on .inventura/values/."),
            Self::StoreUnavailable => Some("Check that .inventura/inventura.db is readable."),
            Self::ValidationFailed
            | Self::InvalidCredentials
            | Self::ExportWriteFailed
            | Self::InternalUnexpected => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
