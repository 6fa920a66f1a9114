use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const SERVICES: &str = "TCP,80,HTTP\nUDP,53,DNS\n";

fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("svctop-cli-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn svctop(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_svctop"));
    cmd.current_dir(dir)
        .env_remove("SVCTOP_OUT_DIR")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &[u8]) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn help_exits_zero() {
    let dir = workdir("help");
    let out = svctop(&dir).arg("--help").output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("flows"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_top_n_exits_one() {
    let dir = workdir("noarg");
    fs::write(dir.join("services.csv"), SERVICES).unwrap();
    let out = svctop(&dir).args(["flows", "services.csv"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(!out.stderr.is_empty());
    assert!(!dir.join("Top-Services.txt").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn non_numeric_top_n_exits_one() {
    let dir = workdir("ten");
    fs::write(dir.join("services.csv"), SERVICES).unwrap();
    let out = svctop(&dir).args(["flows", "services.csv", "ten"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.join("Top-Services.txt").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_services_file_exits_one() {
    let dir = workdir("nosvc");
    let out = svctop(&dir).args(["flows", "nope.csv", "5"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("nope.csv"));
    assert!(!dir.join("Top-Services.txt").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn empty_stdin_still_writes_report() {
    let dir = workdir("empty");
    fs::write(dir.join("services.csv"), SERVICES).unwrap();
    let out = svctop(&dir).args(["flows", "services.csv", "3"]).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(dir.join("Top-Services.txt")).unwrap(),
        "--- Top 3 Services Report (by Bytes) ---\nService,Total Packets,Total Bytes\n"
    );
    assert!(!dir.join("unrecognized.txt").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn flows_from_stdin() {
    let dir = workdir("stdin");
    fs::write(dir.join("services.csv"), SERVICES).unwrap();
    let reports = dir.join("reports");
    fs::create_dir_all(&reports).unwrap();

    let mut cmd = svctop(&dir);
    cmd.args(["--quiet", "flows", "services.csv", "1", "--out-dir"]).arg(&reports);
    let out = run_with_stdin(
        cmd,
        b"TCP,40000,80,10,1000\nUDP,53,40001,2,200\nTCP,7000,7001,1,10\ngarbage\n",
    );
    assert_eq!(out.status.code(), Some(0));
    // --quiet leaves stdout empty
    assert!(out.stdout.is_empty());

    assert_eq!(
        fs::read_to_string(reports.join("Top-Services.txt")).unwrap(),
        "--- Top 1 Services Report (by Bytes) ---\n\
         Service,Total Packets,Total Bytes\n\
         HTTP,10,1000\n\
         other,3,210\n"
    );
    assert_eq!(
        fs::read_to_string(reports.join("unrecognized.txt")).unwrap(),
        "Protocol,Port,Packets,Bytes\nTCP,7000,1,10\n"
    );
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn import_iana_then_use_it() {
    let dir = workdir("iana");
    fs::write(
        dir.join("registry.csv"),
        "Service Name,Port Number,Transport Protocol,Description\n\
         http,80,tcp,World Wide Web\n\
         domain,53,udp,\"Domain Name Server, DNS\"\n\
         broken,eighty,tcp,\n",
    )
    .unwrap();

    let out = svctop(&dir)
        .args(["import-iana", "registry.csv", "services.csv"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(dir.join("services.csv")).unwrap(),
        "TCP,80,http\nUDP,53,domain\n"
    );

    let out = run_with_stdin(
        {
            let mut cmd = svctop(&dir);
            cmd.args(["-q", "flows", "services.csv", "5"]);
            cmd
        },
        b"UDP,33000,53,4,400\n",
    );
    assert_eq!(out.status.code(), Some(0));
    assert!(fs::read_to_string(dir.join("Top-Services.txt"))
        .unwrap()
        .contains("domain,4,400\n"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn chart_subcommand_reads_a_report() {
    let dir = workdir("chart");
    fs::write(
        dir.join("Top-Services.txt"),
        "--- Top 2 Services Report (by Bytes) ---\n\
         Service,Total Packets,Total Bytes\n\
         HTTP,15,1500\n\
         DNS,4,400\n",
    )
    .unwrap();

    let out = svctop(&dir)
        .args(["chart", "Top-Services.txt", "--out-dir", "plots"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(dir.join("plots/packet_composition.svg").exists());
    assert!(dir.join("plots/byte_composition.svg").exists());

    let out = svctop(&dir).args(["chart", "missing.txt"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    fs::remove_dir_all(&dir).unwrap();
}
