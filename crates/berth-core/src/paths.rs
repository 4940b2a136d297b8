//! Well-known names and locations of the packed output layout.

use std::path::{Path, PathBuf};

/// Directory under the output root holding everything but the public tree.
pub const APPROOT_DIR: &str = "approot";

/// Name of the generated global configuration document.
pub const GLOBAL_FILE: &str = "global.json";

/// Directory under `approot` holding relocated application trees.
pub const SRC_DIR: &str = "src";

/// Default name of the dependency-cache directory.
pub const PACKAGES_DIR: &str = "packages";

/// Name of the settings document placed in the public tree.
pub const SETTINGS_FILE: &str = "web.config";

/// Name of the hosting launcher binary invoked by launcher scripts.
pub const LAUNCHER_BIN: &str = "apphost";

/// Fixed hosting entry point passed to the launcher.
pub const HOST_ENTRY_POINT: &str = "application.host";

/// Executable directory inside a bundled runtime package.
pub const RUNTIME_BIN_DIR: &str = "bin";

/// `<out>/approot`
pub fn approot(out: &Path) -> PathBuf {
    out.join(APPROOT_DIR)
}

/// `<out>/approot/global.json`
pub fn global_file(out: &Path) -> PathBuf {
    approot(out).join(GLOBAL_FILE)
}

/// `<out>/approot/src/<project>` - the relocated application tree.
pub fn app_dir(out: &Path, project: &str) -> PathBuf {
    approot(out).join(SRC_DIR).join(project)
}

/// `<out>/approot/<cache-dir>` - the output dependency cache, where a
/// bundled runtime is embedded.
pub fn packages_dir(out: &Path, cache_dir: &str) -> PathBuf {
    approot(out).join(cache_dir)
}
