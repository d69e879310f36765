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

use std::{
    panic::{self, PanicHookInfo},
    sync::{LazyLock, Once},
};

use backtrace::Backtrace;
use prometheus::{IntCounter, register_int_counter};

pub static PANIC_COUNTER: LazyLock<IntCounter> =
    LazyLock::new(|| register_int_counter!("thaispa_panic_counter", "panic_counter").unwrap());

fn log_panic(info: &PanicHookInfo<'_>) {
    let backtrace = format!("{:?}", Backtrace::new());
    let thread = std::thread::current();
    let thread = thread.name().unwrap_or("<unnamed>");
    match info.location() {
        Some(location) => tracing::error!(
            message = %info,
            thread,
            backtrace = %backtrace,
            panic.file = location.file(),
            panic.line = location.line(),
            panic.column = location.column(),
        ),
        None => tracing::error!(message = %info, thread, backtrace = %backtrace),
    }
}

/// Logs every panic through `tracing` and counts it, then defers to the
/// hook that was installed before. Installing twice is a no-op.
pub fn set_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            log_panic(info);
            PANIC_COUNTER.inc();
            previous(info);
        }));
    });
}

/// Panics observed since the hook was installed.
#[must_use]
pub fn panic_count() -> u64 { PANIC_COUNTER.get() }
