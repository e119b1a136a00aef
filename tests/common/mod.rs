//! Fake mongod and shell executables for integration tests.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prints the readiness line the way mongod 4.4+ does (structured JSON).
pub const READY: &str =
    r#"echo "{\"t\":{},\"s\":\"I\",\"c\":\"NETWORK\",\"msg\":\"Waiting for connections\",\"attr\":{\"port\":$port,\"ssl\":\"off\"}}""#;

pub fn write_executable(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// A fake mongod living in `dir`.
///
/// Before running `body` it records its arguments, `--dbpath` and PID in
/// `dir/args`, `dir/dbpath` and `dir/pid`. `$port` holds the `--port` value.
pub struct FakeMongod {
    pub dir: PathBuf,
    pub binary: PathBuf,
}

impl FakeMongod {
    pub fn new(dir: &Path, body: &str) -> Self {
        let script = format!(
            r#"#!/bin/sh
echo "$@" > {dir}/args
echo $$ > {dir}/pid
port=""
dbpath=""
while [ $# -gt 0 ]; do
  case "$1" in
    --port) port="$2"; shift ;;
    --dbpath) dbpath="$2"; shift ;;
  esac
  shift
done
echo "$dbpath" > {dir}/dbpath
{body}
"#,
            dir = dir.display(),
            body = body
        );
        let binary = dir.join("mongod");
        write_executable(&binary, &script);
        Self {
            dir: dir.to_path_buf(),
            binary,
        }
    }

    /// Reports ready and then stays up until killed.
    pub fn ready(dir: &Path) -> Self {
        Self::new(dir, &format!("{}\nexec sleep 60", READY))
    }

    fn read(&self, file: &str) -> String {
        std::fs::read_to_string(self.dir.join(file))
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    pub fn args(&self) -> String {
        self.read("args")
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(self.read("dbpath"))
    }

    pub fn pid(&self) -> u32 {
        self.read("pid").parse().unwrap()
    }
}

/// A fake mongo shell that records its arguments and exits with `code`.
pub fn fake_shell(dir: &Path, code: i32) -> PathBuf {
    let path = dir.join("mongosh");
    let script = format!(
        "#!/bin/sh\necho \"$@\" > {}/shell_args\necho '{{ ok: 1 }}'\nexit {}\n",
        dir.display(),
        code
    );
    write_executable(&path, &script);
    path
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub fn is_alive(pid: u32) -> bool {
    memongo::error::is_pid_alive(pid)
}
