//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [cache] Section Defaults
// ============================================================================

pub mod cache {
    /// Ten minutes.
    pub fn ttl_secs() -> u64 {
        600
    }

    pub fn notebooks() -> usize {
        1024
    }

    pub fn pages() -> usize {
        256
    }

    pub fn renders() -> usize {
        1024
    }

    pub fn compositions() -> usize {
        256
    }
}

// ============================================================================
// [render] Section Defaults
// ============================================================================

pub mod render {
    pub fn max_depth() -> usize {
        16
    }

    pub fn chrome() -> Option<String> {
        None
    }

    pub fn locale() -> Option<String> {
        None
    }
}

// ============================================================================
// [templates] Section Defaults
// ============================================================================

pub mod templates {
    pub fn account() -> Option<String> {
        None
    }

    pub fn folder() -> String {
        "/Template".into()
    }
}

// ============================================================================
// [server] Section Defaults
// ============================================================================

pub mod server {
    pub fn name() -> String {
        crate::memory::LOCAL_SERVER.into()
    }

    pub fn rest_base() -> String {
        "/home".into()
    }
}
