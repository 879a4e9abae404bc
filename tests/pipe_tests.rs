use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

async fn run_extract(input: &[u8], extra: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_vbind-site"))
        .arg("extract")
        .args(extra)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn vbind-site");

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(input).await.expect("Failed to write to stdin");
    stdin.shutdown().await.expect("Failed to close stdin");
    drop(stdin);

    child.wait_with_output().await.expect("Failed to read output")
}

#[tokio::test]
async fn test_extract_mode_prints_tokens() {
    let output = run_extract(b"<div class=\"px-4 py-2 md:w-1/2\"></div>", &[]).await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["div", "class", "px-4", "py-2", "md:w-1/2", "/div"]);
}

#[tokio::test]
async fn test_extract_mode_unique() {
    let output = run_extract(b"flex flex p-4 flex", &["--unique"]).await;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "flex\np-4\n");
}

#[tokio::test]
async fn test_extract_mode_empty_input() {
    let output = run_extract(b"", &[]).await;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_concurrent_invocations() {
    let (a, b, c) = tokio::join!(
        run_extract(b"const a = 'bg-red-500 text-lg';", &["-u"]),
        run_extract(b"const b = 'bg-green-500 text-xl';", &["-u"]),
        run_extract(b"const c = 'bg-yellow-500 text-2xl';", &["-u"]),
    );
    for (output, class) in [(a, "bg-red-500"), (b, "bg-green-500"), (c, "bg-yellow-500")] {
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains(class));
    }
}
