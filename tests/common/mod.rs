//! A scriptable stand-in for the `bw` binary.
//!
//! The fake records every invocation (argv plus the session and password
//! environment variables) to a log file and answers from fixture files.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const UNLOCKED_STATUS: &str = r#"{"serverUrl":"https://vault.example.com","lastSync":"2024-05-06T07:08:09.000Z","userEmail":"me@example.com","userId":"u-1","status":"unlocked"}"#;
pub const LOCKED_STATUS: &str = r#"{"serverUrl":"https://vault.example.com","lastSync":null,"userEmail":"me@example.com","userId":"u-1","status":"locked"}"#;
pub const LOGGED_OUT_STATUS: &str = r#"{"serverUrl":null,"lastSync":null,"status":"unauthenticated"}"#;

pub const ITEMS: &str = r#"[
  {"id":"i-1","name":"GitHub","notes":null,"creationDate":"2023-01-02T03:04:05.000Z","revisionDate":"2024-05-06T07:08:09.000Z","passwordHistory":null,
   "login":{"username":"octocat","password":"hunter2","passwordRevisionDate":null,"uris":[{"match":null,"uri":"https://github.com"}]}},
  {"id":"i-2","name":"Recovery codes","notes":"1234 5678","type":2,"login":null}
]"#;

pub const GENERATED: &str = "Gen3rated!Pw";
pub const NEW_SESSION: &str = "new-session-token";

/// One recorded run of the fake binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub session: Option<String>,
    pub password: Option<String>,
}

pub struct FakeBw {
    dir: TempDir,
}

impl FakeBw {
    pub fn new(status: &str, items: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("status.json"), status).unwrap();
        fs::write(root.join("items.json"), items).unwrap();

        let script = format!(
            r#"#!/bin/sh
log="{root}/calls.log"
printf 'ARGS' >> "$log"
for a in "$@"; do printf '\t%s' "$a" >> "$log"; done
printf '\n' >> "$log"
printf 'SESSION\t%s\n' "${{BW_SESSION-<unset>}}" >> "$log"
printf 'PASSWORD\t%s\n' "${{BW_PASSWORD-<unset>}}" >> "$log"
if [ -f "{root}/fail" ]; then
  echo "boom" >&2
  exit 1
fi
case "$1" in
  status) cat "{root}/status.json" ;;
  list) cat "{root}/items.json" ;;
  login|unlock) echo "{session}" ;;
  generate) echo "{generated}" ;;
  get) echo "item-password" ;;
  sync) echo "Syncing complete." ;;
  update) echo "No update available." ;;
  *) echo "unknown command" >&2; exit 2 ;;
esac
"#,
            root = root.display(),
            session = NEW_SESSION,
            generated = GENERATED,
        );

        let bin = root.join("bw");
        fs::write(&bin, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
        }

        Self { dir }
    }

    pub fn binary(&self) -> PathBuf {
        self.dir.path().join("bw")
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a config file inside the fixture directory.
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config").join("config.yaml")
    }

    /// Make every subsequent invocation exit non-zero.
    pub fn fail_all(&self) {
        fs::write(self.dir.path().join("fail"), "").unwrap();
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        let log = match fs::read_to_string(self.dir.path().join("calls.log")) {
            Ok(log) => log,
            Err(_) => return Vec::new(),
        };

        let lines: Vec<&str> = log.lines().collect();
        lines
            .chunks(3)
            .map(|chunk| {
                let args = chunk[0]
                    .strip_prefix("ARGS")
                    .unwrap()
                    .split('\t')
                    .skip(1)
                    .map(str::to_string)
                    .collect();
                Invocation {
                    args,
                    session: env_value(chunk[1], "SESSION"),
                    password: env_value(chunk[2], "PASSWORD"),
                }
            })
            .collect()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter_map(|i| i.args.first().cloned())
            .collect()
    }
}

fn env_value(line: &str, key: &str) -> Option<String> {
    let value = line.strip_prefix(key).unwrap().strip_prefix('\t').unwrap();
    if value == "<unset>" {
        None
    } else {
        Some(value.to_string())
    }
}
