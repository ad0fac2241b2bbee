//! Shared helpers for the integration tests: config builders, a recording
//! executor that never spawns processes, and an inspectable async sink.

pub mod builders;
pub mod fake_executor;
pub mod shared_buffer;

pub use fake_executor::{FakeExecutor, RecordedCommand};
pub use shared_buffer::SharedBuffer;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is only shown for failing tests; raise the level with
/// `RUST_LOG=boot_k8s_cluster=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("boot_k8s_cluster=info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .try_init();
    });
}
