use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_compress_list_decompress_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("notes.txt");
    let content = "All work and no play makes Jack a dull boy.\n".repeat(5000);
    fs::write(&source, &content)?;

    // 1. Compress with an inferred output name
    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg("--chunk-size").arg("64KB").arg(&source);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("4 chunks"));

    let container = dir.path().join("notes.txt.pzip");
    assert!(container.exists());

    // 2. List the record table
    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-lv").arg(&container);
    cmd.assert().success().stdout(
        predicate::str::contains("chunks:         4")
            .and(predicate::str::contains("original size:  220000"))
            .and(predicate::str::contains("chunk size:     65536")),
    );

    // 3. Decompress into a fresh directory
    let restored = dir.path().join("out").join("notes.txt");
    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg(&container).arg("-o").arg(&restored);
    cmd.assert().success();

    assert_eq!(fs::read_to_string(&restored)?, content);
    Ok(())
}

#[test]
fn test_cli_refuses_overwrite_without_force() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("a.bin");
    fs::write(&source, b"abc")?;
    fs::write(dir.path().join("a.bin.pzip"), b"keep me")?;

    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg(&source);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read(dir.path().join("a.bin.pzip"))?, b"keep me");

    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg("-f").arg(&source);
    cmd.assert().success();
    assert_ne!(fs::read(dir.path().join("a.bin.pzip"))?, b"keep me");
    Ok(())
}

#[test]
fn test_cli_rejects_non_container() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let fake = dir.path().join("fake.pzip");
    fs::write(&fake, b"this is not a pzip container at all")?;

    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg(&fake);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid magic bytes"));
    assert!(!dir.path().join("fake").exists());
    Ok(())
}

#[test]
fn test_cli_missing_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg(dir.path().join("nothing.txt"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Input file does not exist"));
    Ok(())
}

#[test]
fn test_cli_rejects_zero_chunk_size() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-c").arg("0").arg("whatever");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
    Ok(())
}

#[test]
fn test_cli_rejects_output_aliasing_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("a.bin");
    fs::write(&source, b"precious bytes")?;
    fs::create_dir(dir.path().join("x"))?;

    // Same file spelled through a `..` component
    let alias = dir.path().join("x").join("..").join("a.bin");
    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg("-f").arg(&source).arg("-o").arg(&alias);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be the same"));
    assert_eq!(fs::read(&source)?, b"precious bytes");

    // Same for decompression of a container onto itself
    let container = dir.path().join("a.bin.pzip");
    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg(&source);
    cmd.assert().success();
    let before = fs::read(&container)?;

    let alias = dir.path().join("x").join("..").join("a.bin.pzip");
    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg("-f").arg(&container).arg("-o").arg(&alias);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be the same"));
    assert_eq!(fs::read(&container)?, before);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_cli_rejects_output_symlinked_to_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("a.bin");
    fs::write(&source, b"precious bytes")?;
    let link = dir.path().join("link.pzip");
    std::os::unix::fs::symlink(&source, &link)?;

    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("-q").arg("-f").arg(&source).arg("-o").arg(&link);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be the same"));
    assert_eq!(fs::read(&source)?, b"precious bytes");
    Ok(())
}

#[test]
fn test_cli_quiet_long_flag() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("a.txt");
    fs::write(&source, "quiet please\n".repeat(100))?;

    let mut cmd = Command::cargo_bin("pzip")?;
    cmd.arg("--quiet").arg("--quiet").arg(&source);
    cmd.assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
    assert!(dir.path().join("a.txt.pzip").exists());
    Ok(())
}
