// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Version strings baked in at compile time by `shadow-rs`.

use shadow_rs::{formatcp, shadow};

shadow!(build);

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Set on CI for tagged releases.
const OFFICIAL: bool = option_env!("THAISPA_RELEASE").is_some();

const DIRTY_SUFFIX: &str = if build::GIT_CLEAN { "" } else { "-dirty" };

/// `x.y.z` for releases, `x.y.z-dev+<commit>[-dirty]` otherwise.
#[allow(clippy::const_is_empty)]
pub const VERSION: &str = if OFFICIAL {
    build::PKG_VERSION
} else if build::SHORT_COMMIT.is_empty() {
    formatcp!("{}-dev", build::PKG_VERSION)
} else {
    formatcp!(
        "{}-dev+{}{}",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        DIRTY_SUFFIX
    )
};

/// Shown by `--version --verbose` style long help.
pub const LONG_VERSION: &str = formatcp!(
    "{}\nbranch: {}\nbuilt:  {}\nrustc:  {}",
    VERSION,
    build::BRANCH,
    build::BUILD_TIME,
    build::RUST_VERSION
);
