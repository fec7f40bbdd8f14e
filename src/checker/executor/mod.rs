use std::error::Error;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use log::warn;
use serde_json::Value;

use super::errors::RainbowError;

/// One row of bindings returned by a query.
pub type Row = serde_json::Map<String, Value>;
/// A result table: one row object per match.
pub type ResultTable = Vec<Row>;

/// Uniform interface over Cypher execution strategies. Callers stay
/// oblivious to whether queries run in-process or in a child process.
/// `None` means the query's outcome could not be determined.
pub trait QueryExecutor {
    fn execute(&mut self, query: &str) -> Option<ResultTable>;
}

/// An embedded Cypher engine. This is the seam for in-process execution;
/// the checker hands the engine a `CREATE` statement followed by `MATCH`
/// queries and expects a table of bindings back.
pub trait CypherEngine {
    fn exec(&mut self, query: &str) -> Result<ResultTable, Box<dyn Error>>;
}

/// Adapts an embedded engine to the executor interface. Engine failures
/// degrade to an undetermined outcome rather than aborting the run.
pub struct InProcessExecutor<E: CypherEngine> {
    engine: E,
}

impl<E: CypherEngine> InProcessExecutor<E> {
    pub fn new(engine: E) -> Self {
        InProcessExecutor { engine }
    }
}

impl<E: CypherEngine> QueryExecutor for InProcessExecutor<E> {
    fn execute(&mut self, query: &str) -> Option<ResultTable> {
        match self.engine.exec(query) {
            Ok(rows) => Some(rows),
            Err(why) => {
                warn!("embedded query execution failed: {}", why);
                None
            }
        }
    }
}

/// Streams queries to an external executor process over a line protocol:
/// each query is written followed by a `--` sentinel line and a flush, and
/// exactly one JSON line is read back per query (null, a boolean, or an
/// array of row objects).
pub struct SubprocessExecutor {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl SubprocessExecutor {
    const DELIMITER: &'static str = "--";

    /// Spawn `program` with the source path as its only argument.
    pub fn spawn(program: &Path, source: &Path) -> Result<Self, RainbowError> {
        let mut child = Command::new(program)
            .arg(source)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|why| RainbowError::ExecutorSpawn {
                path: program.to_path_buf(),
                source: why,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(BufReader::new);
        match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => Ok(SubprocessExecutor {
                child,
                stdin: Some(stdin),
                stdout,
            }),
            _ => Err(RainbowError::ExecutorSpawn {
                path: program.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "executor pipes unavailable",
                ),
            }),
        }
    }

    fn read_response(&mut self) -> Option<ResultTable> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).ok()?;
        if read == 0 {
            warn!("executor closed its output before responding");
            return None;
        }

        match serde_json::from_str::<Value>(line.trim()) {
            // A bare boolean is shorthand for the counting projection.
            Ok(Value::Bool(flag)) => {
                let mut row = Row::new();
                row.insert(String::from("invalidcalls"), Value::Bool(flag));
                Some(vec![row])
            }
            Ok(Value::Array(rows)) => {
                let mut table = ResultTable::new();
                for row in rows {
                    match row {
                        Value::Object(bindings) => table.push(bindings),
                        _ => return None,
                    }
                }
                Some(table)
            }
            Ok(_) => None,
            Err(why) => {
                warn!("unreadable executor response: {}", why);
                None
            }
        }
    }
}

impl QueryExecutor for SubprocessExecutor {
    fn execute(&mut self, query: &str) -> Option<ResultTable> {
        let stdin = self.stdin.as_mut()?;
        writeln!(stdin, "{}", query).ok()?;
        writeln!(stdin, "{}", Self::DELIMITER).ok()?;
        stdin.flush().ok()?;
        self.read_response()
    }
}

/// Teardown closes stdin so the child observes end of input, then awaits
/// it. Running through `Drop` guarantees the process is reaped on error
/// paths as well.
impl Drop for SubprocessExecutor {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Err(why) = self.child.wait() {
            warn!("executor did not exit cleanly: {}", why);
        }
    }
}

/// Executor adapter tests
#[cfg(test)]
mod tests {
    use std::error::Error;

    use serde_json::json;

    use super::*;

    struct ScriptedEngine {
        responses: Vec<Result<ResultTable, String>>,
        queries: Vec<String>,
    }

    impl CypherEngine for ScriptedEngine {
        fn exec(&mut self, query: &str) -> Result<ResultTable, Box<dyn Error>> {
            self.queries.push(query.to_string());
            match self.responses.remove(0) {
                Ok(rows) => Ok(rows),
                Err(why) => Err(why.into()),
            }
        }
    }

    #[test]
    fn test_in_process_executor_passes_rows_through() {
        let mut row = Row::new();
        row.insert(String::from("invalidcalls"), json!(true));
        let engine = ScriptedEngine {
            responses: vec![Ok(vec![row.clone()])],
            queries: Vec::new(),
        };
        let mut executor = InProcessExecutor::new(engine);

        assert_eq!(executor.execute("MATCH (a) RETURN a"), Some(vec![row]));
    }

    #[test]
    fn test_in_process_executor_maps_failure_to_unknown() {
        let engine = ScriptedEngine {
            responses: vec![Err(String::from("engine exploded"))],
            queries: Vec::new(),
        };
        let mut executor = InProcessExecutor::new(engine);

        assert_eq!(executor.execute("MATCH (a) RETURN a"), None);
    }

    #[cfg(unix)]
    mod subprocess {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        use serde_json::json;

        use super::super::*;
        use crate::checker::errors::RainbowError;

        /// Writes a shell script that replies with the given lines, one per
        /// query, and drains stdin so writes never fail.
        fn scripted_executor(dir: &tempfile::TempDir, lines: &[&str]) -> PathBuf {
            let path = dir.path().join("executor.sh");
            let mut script = String::from("#!/bin/sh\n");
            for line in lines {
                script.push_str(&format!("printf '%s\\n' '{}'\n", line));
            }
            script.push_str("cat > /dev/null\n");
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(script.as_bytes()).unwrap();
            let mut permissions = file.metadata().unwrap().permissions();
            permissions.set_mode(0o755);
            std::fs::set_permissions(&path, permissions).unwrap();
            path
        }

        #[test]
        fn test_subprocess_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            let script = scripted_executor(
                &dir,
                &["null", "[{\"invalidcalls\": true}]", "true", "[]"],
            );
            let mut executor =
                SubprocessExecutor::spawn(&script, Path::new("test.cpp")).unwrap();

            // CREATE acknowledgement is null, an undetermined table
            assert_eq!(executor.execute("CREATE (`a__1` {name: 'a'})"), None);

            let rows = executor.execute("MATCH (a) RETURN count(*) > 0 AS invalidcalls");
            assert_eq!(rows.as_ref().map(Vec::len), Some(1));
            assert_eq!(rows.unwrap()[0].get("invalidcalls"), Some(&json!(true)));

            // A bare boolean is normalized into a counting row
            let rows = executor.execute("MATCH (a) RETURN count(*) > 0 AS invalidcalls");
            assert_eq!(rows.unwrap()[0].get("invalidcalls"), Some(&json!(true)));

            assert_eq!(executor.execute("MATCH (a) RETURN *"), Some(Vec::new()));
        }

        #[test]
        fn test_subprocess_early_exit_is_unknown() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("dead.sh");
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
            let mut permissions = file.metadata().unwrap().permissions();
            permissions.set_mode(0o755);
            std::fs::set_permissions(&path, permissions).unwrap();
            drop(file);

            let mut executor = SubprocessExecutor::spawn(&path, Path::new("test.cpp")).unwrap();
            assert_eq!(executor.execute("RETURN 0"), None);
        }

        #[test]
        fn test_spawn_failure_is_reported() {
            let result =
                SubprocessExecutor::spawn(Path::new("/nonexistent/executor"), Path::new("x"));
            assert!(matches!(
                result,
                Err(RainbowError::ExecutorSpawn { .. })
            ));
        }
    }
}
