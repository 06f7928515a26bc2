//! # MeshMarket Test Suite
//!
//! Cross-subsystem integration scenarios. Unit tests live next to the code
//! they cover; everything here exercises two or more subsystems together.
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── action_lifecycle.rs   # Workflow + scanner choreography
//!     └── durability.rs         # Checkpoint recovery over RocksDB reopen
//! ```
//!
//! ```bash
//! cargo test -p mm-tests
//! cargo test -p mm-tests integration::
//! ```

pub mod integration;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install the log subscriber once per test binary. `RUST_LOG` selects the
/// verbosity; codes mailed by the test sink appear at info level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
