// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use pfwd_common::error::{ForwardError, Result};

/// Empties the persistent log in place and returns how many bytes it held.
/// A missing file is left missing.
///
/// The file is truncated rather than replaced, so a writer that already has
/// it open in append mode keeps logging into the same file.
pub fn clear(path: &Path) -> Result<u64> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(ForwardError::persistence(path, e)),
    };

    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| ForwardError::persistence(path, e))?;
    Ok(size)
}
