//! Sandbox configuration.

/// Configuration for the guest sandbox engine.
///
/// The determinism settings (no threads, no SIMD, NaN canonicalization)
/// are fixed by the engine and not configurable.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Maximum native stack, in bytes, that guest code may consume.
    /// Default: 512 KiB.
    pub max_wasm_stack: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_wasm_stack: 512 * 1024, // 512 KiB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert_eq!(config.max_wasm_stack, 512 * 1024);
    }
}
