#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Serializes script creation and process spawning within a test binary, so
/// no child inherits a script that another thread still holds open for
/// writing (ETXTBSY).
pub fn serial() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Writes an executable POSIX shell script.
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Worker stub that checks its positional arguments and prints `trials`
/// copies of `value`.
pub fn fixed_worker(dir: &Path, id: u32, value: u64) -> PathBuf {
    script(
        dir,
        "worker",
        &format!(
            r#"[ "$1" = "{id}" ] || {{ echo "bad suite id $1" >&2; exit 9; }}
i=0
while [ "$i" -lt "$2" ]; do
  echo {value}
  i=$((i + 1))
done"#
        ),
    )
}
