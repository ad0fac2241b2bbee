#![allow(dead_code)]

pub use boot_k8s_cluster_test_utils::builders;
pub use boot_k8s_cluster_test_utils::{
    FakeExecutor, RecordedCommand, SharedBuffer, init_tracing,
};

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}
