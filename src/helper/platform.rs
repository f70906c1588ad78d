//! Host platform naming for release downloads

/// Map a machine architecture name onto the name release artifacts use.
/// Unknown names pass through unchanged.
pub fn normalize_arch(arch: &str) -> String {
    match arch {
        "x86_64" | "amd64" => "amd64".to_string(),
        "arm64" | "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// Operating system name used in release artifacts
pub fn normalize_os(os: &str) -> String {
    match os {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// `(os, arch)` of the running host, normalized
pub fn host_platform() -> (String, String) {
    (
        normalize_os(std::env::consts::OS),
        normalize_arch(std::env::consts::ARCH),
    )
}
