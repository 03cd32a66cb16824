use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("communes").unwrap()
}

fn write_csv(dir: &Path, header: &str) -> std::path::PathBuf {
    let path = dir.join("base.csv");
    let body = [
        header,
        "69123;LYON;69001;LYON;",
        "69123;LYON;69001;LYON;",
        "2A004;AJACCIO;20000;AJACCIO;",
        "97411;ST DENIS;97400;ST DENIS;",
    ]
    .join("\n");
    fs::write(&path, body).unwrap();
    path
}

const HEADER: &str = "#Code_commune_INSEE;Nom_de_la_commune;Code_postal;Libelle_d_acheminement;Ligne_5";

#[test]
fn build_writes_files_and_summary() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), HEADER);
    let out = tmp.path().join("cities");

    cmd()
        .args(["build", "--csv"])
        .arg(&csv)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Files written: 3"))
        .stdout(contains("Duplicates removed: 1"));

    assert!(out.join("cities_2A.json").exists());
    assert!(out.join("cities_974.json").exists());
}

#[test]
fn build_fails_on_missing_name_column() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "#Code_commune_INSEE;Commune;Code_postal;Libelle;Ligne_5");
    let out = tmp.path().join("cities");

    cmd()
        .args(["build", "--csv"])
        .arg(&csv)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .failure()
        .stderr(contains("Nom_de_la_commune"));

    assert!(!out.exists());
}

#[test]
fn build_rejects_bad_token_list() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), HEADER);

    cmd()
        .args(["build", "--tokens", "975,xyz", "--csv"])
        .arg(&csv)
        .arg("--out-dir")
        .arg(tmp.path().join("cities"))
        .assert()
        .failure()
        .stderr(contains("invalid department token"));
}

#[test]
fn config_file_supplies_aliases_and_delimiter() {
    let tmp = TempDir::new().unwrap();
    let csv = tmp.path().join("base.csv");
    fs::write(&csv, "insee,commune,cp\n69123,LYON,69001\n").unwrap();
    let config = tmp.path().join("communes.toml");
    fs::write(
        &config,
        "[csv]\ndelimiter = \",\"\n[csv.aliases]\nname = [\"commune\"]\npostal_code = [\"cp\"]\ninsee = [\"insee\"]\n",
    )
    .unwrap();
    let out = tmp.path().join("cities");

    cmd()
        .arg("--config")
        .arg(&config)
        .args(["build", "--csv"])
        .arg(&csv)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("cities_69.json").exists());
}

#[test]
fn dedup_compact_audit_round() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(
        dir.join("cities_69.json"),
        r#"[{"name":"Lyon","cp":"69001","dept":"69","region":""},{"name":"LYON","cp":"69001","dept":"69","region":""}]"#,
    )
    .unwrap();

    cmd()
        .args(["dedup", "--dir"])
        .arg(dir)
        .assert()
        .success()
        .stdout(contains("cities_69.json: 1 duplicate(s) removed"));

    let out = dir.join("compact").join("cities_compact.json");
    cmd()
        .args(["compact", "--dir"])
        .arg(dir)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains(": 1"));
    assert!(out.exists());

    let output = cmd()
        .args(["--json", "audit", "--dir"])
        .arg(dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["records"], 1);
    assert_eq!(report["invalid_records"], 0);
    assert!(report["missing_files"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "cities_2A.json"));
}

#[test]
fn invalid_lists_reasons() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("cities_69.json"),
        r#"[{"name":"Vienne","cp":"38200","dept":"69","region":""}]"#,
    )
    .unwrap();

    cmd()
        .args(["invalid", "--dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(contains("INVALID: 1"))
        .stdout(contains("does not match postal code"));
}

#[test]
fn audit_on_missing_dir_fails() {
    cmd()
        .args(["audit", "--dir", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(contains("does not exist"));
}
