//! # solr-multisub-ports
//!
//! Port traits for the solr-multisub hexagonal architecture.
//!
//! This crate defines the interfaces between the use cases and
//! infrastructure. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod logger;
pub mod subscription;

pub use logger::*;
pub use subscription::*;

pub use solr_multisub_domain::SubscriptionDescriptor;

#[cfg(test)]
mod tests {
    use super::*;
    use solr_multisub_domain::domain_crate_version;
    use solr_multisub_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut in_deps = false;
        let mut deps = Vec::new();

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("solr-multisub-") {
                let name = line.split(['=', '.']).next().unwrap_or("").trim();
                deps.push(name.to_owned());
            }
        }
        deps
    }

    #[test]
    fn ports_depends_only_on_domain_and_shared() {
        let deps = workspace_deps();
        let allowed = ["solr-multisub-domain", "solr-multisub-shared"];
        for dep in &deps {
            assert!(allowed.contains(&dep.as_str()), "unexpected dependency: {dep}");
        }
        assert_eq!(deps.len(), allowed.len());
    }

    #[test]
    fn ports_can_use_domain_and_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
