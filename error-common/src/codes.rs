// Error codes implementation
// Stable codes attached to every failure surfaced by the authentication core

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const SESSION_INVALIDATED: &str = "AUTH_2003";
    pub const SERVICE_UNAVAILABLE: &str = "AUTH_2004";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
}

pub mod cache {
    pub const MALFORMED_ENTRY: &str = "CACHE_5001";
}

pub mod system {
    pub const CONFIGURATION: &str = "SYS_9001";
    pub const INTERNAL: &str = "SYS_9002";
}
