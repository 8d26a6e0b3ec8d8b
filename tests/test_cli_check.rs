use assert_cmd::Command;
use assert_fs::{prelude::FileWriteStr, NamedTempFile};
use predicates::prelude::{predicate, PredicateBooleanExt};

fn check(snapshot: &str) -> Result<assert_cmd::assert::Assert, Box<dyn std::error::Error>> {
    let file = NamedTempFile::new("snapshot.json")?;
    file.write_str(snapshot)?;
    let mut cmd = Command::cargo_bin("tabula")?;
    cmd.arg("check")
        .arg("-f")
        .arg(file.path())
        .arg("--logging-level")
        .arg("off");
    let assert = cmd.assert();
    file.close()?;
    Ok(assert)
}

#[test]
fn test_valid_configuration() -> Result<(), Box<dyn std::error::Error>> {
    check(
        r#"{
            "policies": {"slots_per_day": 4},
            "subjects": [{"id": 1, "name": "Maths"}],
            "teachers": [{"id": 1, "name": "Ada", "subjects": [1]}],
            "students": [{"id": 1, "name": "Bob", "subjects": [1]}]
        }"#,
    )?
    .success()
    .stdout(predicate::str::starts_with(
        "VALID CONFIGURATION with 1 learner(s), 4 candidate placement(s)",
    ));
    Ok(())
}

#[test]
fn test_unavailable_teacher() -> Result<(), Box<dyn std::error::Error>> {
    check(
        r#"{
            "policies": {"slots_per_day": 2},
            "subjects": [{"id": 1, "name": "Maths"}],
            "teachers": [{"id": 1, "name": "Ada", "subjects": [1], "unavailable": [0, 1]}],
            "students": [{"id": 1, "name": "Bob", "subjects": [1]}]
        }"#,
    )?
    .failure()
    .code(1)
    .stdout(
        predicate::str::starts_with("INVALID CONFIGURATION\n")
            .and(predicate::str::contains("Bob requires Maths")),
    );
    Ok(())
}

#[test]
fn test_malformed_json() -> Result<(), Box<dyn std::error::Error>> {
    check(r#"{"teachers": "#)?.failure().code(1);
    Ok(())
}

#[test]
fn test_missing_file() {
    let mut cmd = Command::cargo_bin("tabula").unwrap();
    cmd.arg("check")
        .arg("-f")
        .arg("/nonexistent/snapshot.json")
        .arg("--logging-level")
        .arg("off");
    cmd.assert().failure().code(1);
}
