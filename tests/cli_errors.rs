use std::fs;
use std::path::Path;

use predicates::prelude::*;

fn courseforge(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("courseforge");
    cmd.args([
        "--registry",
        root.join("courses.json").to_str().unwrap(),
        "--workspace",
        root.join("output").to_str().unwrap(),
    ])
    .env_remove("OPENAI_API_KEY")
    .env_remove("RUST_LOG");
    cmd
}

#[test]
fn outline_without_module_headings_is_a_user_error() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let outline = temp.path().join("outline.txt");
    fs::write(&outline, "Course: Orphans\n\nChapter 1: Lost\nNo module above me.\n")?;

    courseforge(temp.path())
        .args(["split", outline.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no module headings found"));
    assert!(!temp.path().join("output").join("1_modules").join("orphans").exists());
    Ok(())
}

#[test]
fn empty_document_is_a_user_error() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let outline = temp.path().join("outline.txt");
    fs::write(&outline, "\n  \n")?;

    courseforge(temp.path())
        .args(["course", "add", "--name", "Blank"])
        .assert()
        .success();
    courseforge(temp.path())
        .args(["split", outline.to_str().unwrap(), "--course", "blank"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("document is empty"));
    Ok(())
}

#[test]
fn unknown_course_is_a_user_error() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    courseforge(temp.path())
        .args(["convert", "--course", "ghost"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("course 'ghost' not found"));
    courseforge(temp.path())
        .args(["course", "remove", "--slug", "ghost"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn duplicate_course_is_a_user_error() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    courseforge(temp.path())
        .args(["course", "add", "--name", "Dup", "--slug", "dup"])
        .assert()
        .success();
    courseforge(temp.path())
        .args(["course", "add", "--name", "Dup again", "--slug", "dup"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
    Ok(())
}

#[test]
fn sql_stage_requires_course_json() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    courseforge(temp.path())
        .args(["course", "add", "--name", "Early"])
        .assert()
        .success();

    courseforge(temp.path())
        .args(["generate-sql", "--course", "early"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("run `courseforge convert` first"));

    let json_dir = temp.path().join("output").join("2_json");
    fs::create_dir_all(&json_dir)?;
    fs::write(
        json_dir.join("early.json"),
        r#"{"course_title":"Early","course_slug":"early","modules":[]}"#,
    )?;
    courseforge(temp.path())
        .args(["generate-sql", "--course", "early"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("contains no modules"));
    Ok(())
}

#[test]
fn ai_without_credential_fails_before_touching_the_document() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let outline = temp.path().join("outline.txt");
    fs::write(&outline, "Course: Keyless\n\nModule 1: A\nChapter 1: B\ntext\n")?;

    courseforge(temp.path())
        .args(["run", outline.to_str().unwrap(), "--ai"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("OPENAI_API_KEY is not set"));

    assert!(!temp.path().join("output").exists());
    assert!(!temp.path().join("courses.json").exists());
    Ok(())
}

#[test]
fn unsupported_input_type_is_a_user_error() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let outline = temp.path().join("outline.pdf");
    fs::write(&outline, "%PDF-1.4")?;

    courseforge(temp.path())
        .args(["split", outline.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported document type"));
    Ok(())
}
