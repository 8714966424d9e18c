/*! Integration tests for dynattr.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - value: Conversion rules between stored values and Rust types
 * - list: ValueList ordering, combinators and list-level events
 * - attributes: AttributeMap case-insensitivity and map-level events
 * - storage: Adapters, round trips and auto-save
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("dynattr=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod attributes;
mod helpers;
mod list;
mod value;
