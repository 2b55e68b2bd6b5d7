//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of ZiAug.
//! The ZiAug project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Logging Module
//!
//! ZiAug logs through the `log` facade and never installs a logger itself.
//! Loading a pretrained model emits a burst of warnings from third-party
//! code; [`ZiLogLevelGuard`] raises the level threshold for the duration of
//! the load and puts the previous threshold back when it goes out of scope.

use log::LevelFilter;

/// Scoped override of the global `log` level threshold.
///
/// The previous threshold is restored when the guard is dropped, which also
/// happens on early `?` returns and during unwinding.
#[derive(Debug)]
#[must_use = "the previous log level is restored as soon as the guard is dropped"]
pub struct ZiLogLevelGuard {
    previous: LevelFilter,
}

impl ZiLogLevelGuard {
    /// Sets the global threshold to `level` until the guard is dropped.
    pub fn new(level: LevelFilter) -> Self {
        let previous = log::max_level();
        log::set_max_level(level);
        Self { previous }
    }

    /// Threshold that will be restored on drop.
    pub fn previous(&self) -> LevelFilter {
        self.previous
    }
}

impl Drop for ZiLogLevelGuard {
    fn drop(&mut self) {
        log::set_max_level(self.previous);
    }
}
