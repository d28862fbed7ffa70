/// Error code registry for panbatch
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Resolution errors
/// - 5000-5999: Dispatch errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_SOURCE: u16 = 1003;
    pub const CONFIG_INVALID_DESTINATION: u16 = 1004;
    pub const CONFIG_CONFLICTING_OPTIONS: u16 = 1005;
    pub const CONFIG_INVALID_VALUE: u16 = 1006;
    pub const CONFIG_INCOMPATIBLE_VERSION: u16 = 1007;

    // Resolution errors (2000-2999)
    pub const RESOLUTION_GENERIC: u16 = 2000;
    pub const RESOLUTION_UNKNOWN_SENSOR: u16 = 2001;
    pub const RESOLUTION_NO_COMPANION: u16 = 2002;
    pub const RESOLUTION_AMBIGUOUS: u16 = 2003;
    pub const RESOLUTION_MISSING_FILE: u16 = 2004;
    pub const RESOLUTION_SHARED_COMPANION: u16 = 2005;

    // Dispatch errors (5000-5999)
    pub const DISPATCH_GENERIC: u16 = 5000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_GENERIC => "Generic configuration error",
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::CONFIG_PARSE_ERROR => "Configuration file could not be parsed",
        ErrorCode::CONFIG_INVALID_SOURCE => "Source is not a directory, manifest or image",
        ErrorCode::CONFIG_INVALID_DESTINATION => "Destination is not a directory",
        ErrorCode::CONFIG_CONFLICTING_OPTIONS => "Dispatch options are mutually exclusive",
        ErrorCode::CONFIG_INVALID_VALUE => "Invalid option value",
        ErrorCode::CONFIG_INCOMPATIBLE_VERSION => "External tool version is not supported",

        ErrorCode::RESOLUTION_GENERIC => "Generic resolution error",
        ErrorCode::RESOLUTION_UNKNOWN_SENSOR => "Image name matches no known sensor",
        ErrorCode::RESOLUTION_NO_COMPANION => "No panchromatic companion could be derived",
        ErrorCode::RESOLUTION_AMBIGUOUS => "More than one panchromatic candidate matched",
        ErrorCode::RESOLUTION_MISSING_FILE => "Panchromatic companion does not exist",
        ErrorCode::RESOLUTION_SHARED_COMPANION => "Panchromatic companion already used by another image",

        ErrorCode::DISPATCH_GENERIC => "Generic dispatch error",

        _ => "Unknown error",
    }
}
