//! System-wide constants and defaults.

/// Label holding a container's cached description.
pub const DESCRIPTION_LABEL: &str = "app.description";

/// Length of the runtime's canonical short container id.
pub const SHORT_ID_LENGTH: usize = 12;

/// Container ports tried, in order, when choosing a primary URL.
pub const PREFERRED_PORTS: [u16; 5] = [80, 8080, 443, 3000, 5000];

/// The only preferred port served over TLS.
pub const HTTPS_PORT: u16 = 443;

/// Default listen address: all interfaces, privileged HTTP port.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:80";

/// Default host used in primary URLs.
pub const DEFAULT_LAN_HOST: &str = "localhost";

/// Wall-clock bound for ordinary runtime calls, in seconds.
pub const DEFAULT_RUNTIME_TIMEOUT_SECS: u64 = 30;

/// Wall-clock bound for image pulls, in seconds.
pub const DEFAULT_PULL_TIMEOUT_SECS: u64 = 300;

/// Wall-clock bound for a description generation request, in seconds.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;

/// Messages API endpoint used for description generation.
pub const DEFAULT_GENERATION_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Model used for description generation.
pub const DEFAULT_GENERATION_MODEL: &str = "claude-sonnet-4-5-20250929";

/// API version header value sent to the messages endpoint.
pub const GENERATION_API_VERSION: &str = "2023-06-01";

/// Token budget for a one-sentence description.
pub const GENERATION_MAX_TOKENS: u32 = 100;

/// Name of the runtime CLI binary.
pub const DOCKER_BIN: &str = "docker";

/// Image name shown when a container's image carries no tag.
pub const UNKNOWN_IMAGE: &str = "unknown";
