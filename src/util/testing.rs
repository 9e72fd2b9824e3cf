//! Shared test setup: tracing subscriber and sample trees.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Once;

use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let module_filter = filter_fn(|metadata| metadata.target().starts_with("rstree"));
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Two-level sample used throughout the tests:
///
/// ```text
/// A
/// └── B
///     ├── C
///     └── D
/// ```
pub fn sample_tree() -> Value {
    json!({
        "name": "A",
        "children": [
            {
                "name": "B",
                "children": [
                    {"name": "C"},
                    {"name": "D"}
                ]
            }
        ]
    })
}

/// Two roots with string ids, for relation chains on a named key.
///
/// ```text
/// eu (id=eu)          us (id=us)
/// ├── de              └── ny
/// │   └── berlin
/// └── fr
/// ```
pub fn sample_forest() -> Value {
    json!([
        {
            "id": "eu",
            "children": [
                {"id": "de", "children": [{"id": "berlin"}]},
                {"id": "fr"}
            ]
        },
        {
            "id": "us",
            "children": [{"id": "ny"}]
        }
    ])
}

/// Write `doc` as JSON to `dir/name` and return the path.
pub fn write_tree(dir: &Path, name: &str, doc: &Value) -> PathBuf {
    let path = dir.join(name);
    let content = serde_json::to_string_pretty(doc).expect("serialize test tree");
    std::fs::write(&path, content).expect("write test tree");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
        init_test_setup();
    }

    #[test]
    fn given_sample_tree_then_has_four_nodes() {
        let mut count = 0;
        crate::domain::parse(&sample_tree(), "children", |_: &Value, _| count += 1).unwrap();
        assert_eq!(count, 4);
    }
}
