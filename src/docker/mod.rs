//! Docker CLI access for the container launch path.

pub mod client;
pub mod error;

pub use client::DockerClient;
pub use error::DockerError;

/// Official image reference for a MongoDB version.
pub fn image_for_version(version: &str) -> String {
    format!("mongo:{}", version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_for_version() {
        assert_eq!(image_for_version("6.0"), "mongo:6.0");
        assert_eq!(image_for_version("7.0.2"), "mongo:7.0.2");
    }
}
