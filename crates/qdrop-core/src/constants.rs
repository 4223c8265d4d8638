//! Shared constants

/// Default maximum artifact size (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;

/// Extension accepted when none is configured.
pub const DEFAULT_ALLOWED_EXTENSION: &str = ".apk";

/// Content type sent for Android packages.
pub const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

/// Content type sent when nothing more specific is known.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Root path of organization records in the document store.
pub const DEFAULT_ORGANIZATIONS_PATH: &str = "organizations";

/// Root path of build records in the document store.
pub const DEFAULT_BUILDS_PATH: &str = "builds";

/// Lifetime of a presigned PUT URL issued by the broker.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 15 * 60;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Preference keys used for form prefill.
pub const PREF_ORG_ID: &str = "org_id";
pub const PREF_LABEL: &str = "label";
pub const PREF_USER: &str = "user";
