//! Cross-backend equivalence: one scripted operation sequence, run once
//! against the local backend in a tempdir and once against an in-memory
//! workload, must produce identical outcome traces: the same values, the same
//! error kinds, in the same order.

use std::sync::Arc;

use eyre::Result;
use pathbind_core::{
    FileOps, LocalPath, MkdirOptions, RemoteClient, RemotePath, RemoveOptions, WriteOptions,
};
use pathbind_testkit::InMemoryWorkload;

fn outcome<T>(result: pathbind_core::Result<T>, show: impl FnOnce(&T) -> String) -> String {
    match result {
        Ok(value) => format!("ok:{}", show(&value)),
        Err(err) => format!("err:{:?}", err.kind()),
    }
}

fn unit<T>(_: &T) -> String {
    String::new()
}

fn collect_names<P: FileOps>(iter: impl Iterator<Item = pathbind_core::Result<P>>) -> String {
    let mut names = Vec::new();
    for item in iter {
        match item {
            Ok(path) => names.push(path.path().name().to_string()),
            Err(err) => names.push(format!("err:{:?}", err.kind())),
        }
    }
    names.sort();
    names.join(",")
}

fn run_script<P: FileOps>(root: &P) -> Vec<String> {
    let mut trace = Vec::new();
    let mut record = |label: &str, entry: String| trace.push(format!("{label} {entry}"));

    let data = root.child("data").unwrap();
    record("mkdir data", outcome(data.mkdir(&MkdirOptions::default()), unit));
    record("mkdir data again", outcome(data.mkdir(&MkdirOptions::default()), unit));

    let a_log = data.child("a.log").unwrap();
    let b_log = data.child("b.log").unwrap();
    let c_txt = data.child("c.txt").unwrap();
    record(
        "write a.log",
        outcome(a_log.write_bytes(b"alpha", &WriteOptions::default()), unit),
    );
    record(
        "write b.log",
        outcome(
            b_log.write_bytes(
                b"beta!",
                &WriteOptions {
                    mode: Some(0o600),
                    ..Default::default()
                },
            ),
            unit,
        ),
    );
    record(
        "write c.txt",
        outcome(c_txt.write_bytes(b"gamma", &WriteOptions::default()), unit),
    );

    let nested = data.child("sub").unwrap().child("d.log").unwrap();
    record(
        "write nested with parents",
        outcome(
            nested.write_bytes(
                b"delta",
                &WriteOptions {
                    make_parents: true,
                    ..Default::default()
                },
            ),
            unit,
        ),
    );
    let orphan = root.child("no-dir").unwrap().child("x").unwrap();
    record(
        "write orphan",
        outcome(orphan.write_bytes(b"x", &WriteOptions::default()), unit),
    );

    record("exists data", outcome(data.exists(), |v| v.to_string()));
    record("is_dir data", outcome(data.is_dir(), |v| v.to_string()));
    record("is_file a.log", outcome(a_log.is_file(), |v| v.to_string()));
    let missing = root.child("missing").unwrap();
    record("exists missing", outcome(missing.exists(), |v| v.to_string()));

    record(
        "read a.log",
        outcome(a_log.read_bytes(), |v| String::from_utf8_lossy(v).into_owned()),
    );
    record("read data", outcome(data.read_bytes(), |_| String::new()));

    let binary = data.child("bin").unwrap();
    record(
        "write bin",
        outcome(binary.write_bytes(&[0xff, 0xfe], &WriteOptions::default()), unit),
    );
    record("read_text bin", outcome(binary.read_text(), |_| String::new()));

    record(
        "stat b.log",
        outcome(b_log.stat(), |st| {
            format!("{:?} size={:?} mode={:o}", st.kind, st.size, st.mode)
        }),
    );
    record(
        "stat data",
        outcome(data.stat(), |st| {
            format!("{:?} size={:?} mode={:o}", st.kind, st.size, st.mode)
        }),
    );
    record("stat missing", outcome(missing.stat(), |_| String::new()));

    record(
        "glob *.log",
        outcome(data.glob("*.log"), |_| String::new()),
    );
    if let Ok(iter) = data.glob("*.log") {
        record("glob *.log names", collect_names(iter));
    }
    if let Ok(iter) = data.glob("**/*.log") {
        record("glob recursive names", collect_names(iter));
    }
    if let Ok(iter) = data.iterdir() {
        record("iterdir names", collect_names(iter));
    }
    record("glob bad pattern", outcome(data.glob("**.log"), |_| String::new()));

    record(
        "mkdir exist_ok on file",
        outcome(
            c_txt.mkdir(&MkdirOptions {
                exist_ok: true,
                ..Default::default()
            }),
            unit,
        ),
    );

    record("unlink c.txt", outcome(c_txt.unlink(false), unit));
    record("unlink c.txt again", outcome(c_txt.unlink(false), unit));
    record("unlink c.txt missing_ok", outcome(c_txt.unlink(true), unit));

    let sub = data.child("sub").unwrap();
    record("rmdir populated sub", outcome(sub.rmdir(), unit));

    let renamed = data.child("renamed.log").unwrap();
    record(
        "rename a.log",
        outcome(a_log.rename(renamed.path()), |p| p.path().name().to_string()),
    );
    record("read renamed", outcome(renamed.read_bytes(), |v| {
        String::from_utf8_lossy(v).into_owned()
    }));
    record("exists old a.log", outcome(a_log.exists(), |v| v.to_string()));

    let moved = data.child("moved").unwrap();
    record(
        "rename sub tree",
        outcome(sub.rename(moved.path()), |p| p.path().name().to_string()),
    );
    record(
        "read moved/d.log",
        outcome(moved.child("d.log").unwrap().read_bytes(), |v| {
            String::from_utf8_lossy(v).into_owned()
        }),
    );
    record("exists old sub", outcome(sub.exists(), |v| v.to_string()));

    record(
        "remove data non-recursive",
        outcome(data.remove(&RemoveOptions::default()), unit),
    );
    record(
        "remove data recursive",
        outcome(
            data.remove(&RemoveOptions {
                recursive: true,
                missing_ok: false,
            }),
            unit,
        ),
    );
    record("exists data after", outcome(data.exists(), |v| v.to_string()));
    if let Ok(iter) = data.glob("*") {
        record("glob removed dir", collect_names(iter));
    }

    trace
}

#[test]
fn scripted_sequence_matches_across_backends() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let local_root = LocalPath::parse(temp.path().to_str().unwrap())?;
    let local_trace = run_script(&local_root);

    let workload = Arc::new(InMemoryWorkload::new());
    let client: Arc<dyn RemoteClient> = workload;
    let remote_root = RemotePath::parse(client, "/")?;
    let remote_trace = run_script(&remote_root);

    assert_eq!(local_trace, remote_trace);
    Ok(())
}

#[test]
fn scripted_sequence_matches_without_native_recursive_remove() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let local_root = LocalPath::parse(temp.path().to_str().unwrap())?;
    let local_trace = run_script(&local_root);

    let workload = Arc::new(InMemoryWorkload::new().without_recursive_remove());
    let client: Arc<dyn RemoteClient> = workload;
    let remote_root = RemotePath::parse(client, "/")?;
    let remote_trace = run_script(&remote_root);

    assert_eq!(local_trace, remote_trace);
    Ok(())
}
