//! CLI integration tests for crud-typegen binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const UNIVERSE: &str = "tests/fixtures/rds_universe.json";
const MANIFEST: &str = "tests/fixtures/rds_manifest.json";
const HEADER: &str = "tests/fixtures/header.txt";

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("crud-typegen"))
}

// Helper to create a temp input file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const SMALL_UNIVERSE: &str = r#"{"types": [
    {"package": "example.com/rds", "name": "CreateInput", "kind": "struct", "fields": [
        {"name": "Name", "type": "string", "tag": "json:\"name\""}
    ]}
]}"#;

fn small_manifest(role_type: &str) -> String {
    format!(
        r#"{{"package": {{"path": "example.com/apis/v1", "name": "v1"}},
            "targets": [{{"input": "Params", "roles": {{"create_input": ["{}"]}}}}]}}"#,
        role_type
    )
}

mod generate_command {
    use super::*;

    #[test]
    fn writes_to_stdout() {
        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "// Code generated by crud-typegen. DO NOT EDIT.\n\npackage v1alpha1\n",
            ))
            .stdout(predicate::str::contains(
                "import (\n\ttime \"example.com/time\"\n)\n",
            ))
            .stdout(predicate::str::contains("type DBInstanceParameters struct {"))
            .stdout(predicate::str::contains("type DBInstanceObservation struct {"));
    }

    #[test]
    fn aggregates_every_input_role() {
        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .assert()
            .success()
            .stdout(predicate::str::contains(concat!(
                "// +kubebuilder:object:generate=true\n",
                "// +crud-typegen:types:aggregated=",
                "example.com/aws/rds.CreateDBInstanceInput,",
                "example.com/aws/rds.DeleteDBInstanceInput,",
                "example.com/aws/rds.DescribeDBInstancesInput,",
                "example.com/aws/rds.ModifyDBInstanceInput\n",
                "type DBInstanceParameters struct {\n",
                "\tAllocatedStorage *int64 `json:\"allocatedStorage,omitempty\"`\n",
                "\tApplyImmediately *bool `json:\"applyImmediately,omitempty\"`\n",
                "\tEngine *Engine `json:\"engine\"`\n",
                "\tFilters []Filter `json:\"filters,omitempty\"`\n",
                "\tSkipFinalSnapshot *bool `json:\"skipFinalSnapshot,omitempty\"`\n",
                "\tTags []Tag `json:\"tags,omitempty\"`\n",
                "\tVpcSecurityGroupIds []*string `json:\"vpcSecurityGroupIds,omitempty\"`\n",
                "}\n",
            )))
            .stdout(predicate::str::contains("DBInstanceIdentifier *string `json:\"dbInstanceIdentifier\"`").not());
    }

    #[test]
    fn output_skips_input_fields() {
        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .assert()
            .success()
            .stdout(predicate::str::contains(concat!(
                "type DBInstanceObservation struct {\n",
                "\tDBInstanceIdentifier *string `json:\"dbInstanceIdentifier,omitempty\"`\n",
                "\tDBInstanceStatus *string `json:\"dbInstanceStatus,omitempty\"`\n",
                "\tEndpoint *Endpoint `json:\"endpoint,omitempty\"`\n",
                "\tInstanceCreateTime *time.Time `json:\"instanceCreateTime,omitempty\"`\n",
                "}\n",
            )));
    }

    #[test]
    fn dependencies_declared_once() {
        let output = cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();

        assert_eq!(stdout.matches("type Engine string\n").count(), 1);
        assert_eq!(stdout.matches("type Tag struct {").count(), 1);
        assert_eq!(stdout.matches("type Filter struct {").count(), 1);
        assert_eq!(stdout.matches("type Endpoint struct {").count(), 1);
        // Types already in the destination package or without a struct/basic shape.
        assert!(!stdout.contains("type ProviderConfig"));
        assert!(!stdout.contains("type Time"));
    }

    #[test]
    fn output_is_deterministic() {
        let run = || {
            cmd()
                .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
                .output()
                .unwrap()
                .stdout
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn writes_output_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("zz_generated.go");

        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .arg("--output")
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("type DBInstanceParameters struct {"));
    }

    #[test]
    fn overwrites_generated_file() {
        let dir = TempDir::new().unwrap();
        let output = write_temp_file(
            &dir,
            "zz_generated.go",
            "// Code generated by an older tool. DO NOT EDIT.\n\npackage v1alpha1\n",
        );

        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .arg("--output")
            .arg(&output)
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("// Code generated by crud-typegen. DO NOT EDIT."));
    }

    #[test]
    fn refuses_to_overwrite_handwritten_file() {
        let dir = TempDir::new().unwrap();
        let output = write_temp_file(&dir, "types.go", "package v1alpha1\n\ntype Mine struct{}\n");

        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .arg("--output")
            .arg(&output)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("--force"));

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content, "package v1alpha1\n\ntype Mine struct{}\n");
    }

    #[test]
    fn force_overwrites_handwritten_file() {
        let dir = TempDir::new().unwrap();
        let output = write_temp_file(&dir, "types.go", "package v1alpha1\n");

        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST, "--force"])
            .arg("--output")
            .arg(&output)
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("type DBInstanceObservation struct {"));
    }

    #[test]
    fn header_above_marker() {
        cmd()
            .args([
                "generate",
                "--universe",
                UNIVERSE,
                "--manifest",
                MANIFEST,
                "--header",
                HEADER,
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("/*\nCopyright 2024 The Example Authors."))
            .stdout(predicate::str::contains(
                "*/\n\n// Code generated by crud-typegen. DO NOT EDIT.\n\npackage v1alpha1\n",
            ));
    }

    #[test]
    fn missing_header_file() {
        cmd()
            .args([
                "generate",
                "--universe",
                UNIVERSE,
                "--manifest",
                MANIFEST,
                "--header",
                "nonexistent/header.txt",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn template_dir_overrides_field_template() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "field.tmpl", "\t{{ .Name }} {{ .Type }}\n");

        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .arg("--template-dir")
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("\tApplyImmediately *bool\n"))
            .stdout(predicate::str::contains("type Engine string\n"));
    }

    #[test]
    fn template_dir_with_bad_template() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "struct.tmpl", "type {{ .Name struct {}\n");

        cmd()
            .args(["generate", "--universe", UNIVERSE, "--manifest", MANIFEST])
            .arg("--template-dir")
            .arg(dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("struct.tmpl"));
    }
}

mod closure_command {
    use super::*;

    #[test]
    fn text_output() {
        cmd()
            .args([
                "closure",
                "--universe",
                UNIVERSE,
                "--type",
                "example.com/aws/rds.DBInstance",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("struct\texample.com/aws/rds.DBInstance\n"))
            .stdout(predicate::str::contains("struct\texample.com/aws/rds.Endpoint\n"))
            .stdout(predicate::str::contains("basic\texample.com/aws/rds.Engine\n"))
            .stdout(predicate::str::contains("external\texample.com/time.Time\n"))
            .stdout(predicate::str::contains("Tag").not());
    }

    #[test]
    fn json_output() {
        let output = cmd()
            .args([
                "closure",
                "--universe",
                UNIVERSE,
                "--type",
                "example.com/aws/rds.CreateDBInstanceInput",
                "--json",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["root"], "example.com/aws/rds.CreateDBInstanceInput");
        let names: Vec<&str> = value["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "example.com/aws/rds.CreateDBInstanceInput",
                "example.com/aws/rds.Engine",
                "example.com/aws/rds.Tag",
            ]
        );
    }

    #[test]
    fn unknown_type() {
        cmd()
            .args([
                "closure",
                "--universe",
                UNIVERSE,
                "--type",
                "example.com/aws/rds.Missing",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown type example.com/aws/rds.Missing"));
    }

    #[test]
    fn invalid_type_name() {
        cmd()
            .args(["closure", "--universe", UNIVERSE, "--type", "example.com/aws/rds."])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid type reference"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn clean_universe_passes() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "universe.json", SMALL_UNIVERSE);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 files checked, all passed"));
    }

    #[test]
    fn warnings_pass_without_strict() {
        cmd()
            .args(["lint", UNIVERSE])
            .assert()
            .success()
            .stdout(predicate::str::contains("W001"));
    }

    #[test]
    fn strict_fails_on_warnings() {
        cmd()
            .args(["lint", UNIVERSE, "--strict"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("1 warnings"));
    }

    #[test]
    fn broken_reference_fails() {
        let dir = TempDir::new().unwrap();
        let file = write_temp_file(
            &dir,
            "universe.json",
            r#"{"types": [
                {"package": "example.com/rds", "name": "CreateInput", "kind": "struct", "fields": [
                    {"name": "Tags", "type": "[]example.com/rds.Tag"}
                ]}
            ]}"#,
        );

        cmd()
            .args(["lint", file.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E006"))
            .stdout(predicate::str::contains("/types/0/fields/0/type"));
    }

    #[test]
    fn json_format() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "good.json", SMALL_UNIVERSE);
        write_temp_file(&dir, "bad.json", "{ not json");

        let output = cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--format", "json"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["files_checked"], 2);
        assert_eq!(value["passed"], 1);
        assert_eq!(value["failed"], 1);
    }

    #[test]
    fn quiet_hides_passing_files() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "good.json", SMALL_UNIVERSE);
        write_temp_file(&dir, "bad.json", "{ not json");

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--quiet"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Linting").not())
            .stdout(predicate::str::contains("good.json").not())
            .stdout(predicate::str::contains("bad.json"));
    }

    #[test]
    fn path_not_found() {
        cmd()
            .args(["lint", "nonexistent/dir"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn universe_not_found() {
        cmd()
            .args([
                "generate",
                "--universe",
                "nonexistent.json",
                "--manifest",
                MANIFEST,
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn universe_invalid_json() {
        let dir = TempDir::new().unwrap();
        let universe = write_temp_file(&dir, "universe.json", "{ not valid json }");

        cmd()
            .args(["generate", "--universe", universe.to_str().unwrap()])
            .args(["--manifest", MANIFEST])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn manifest_schema_violation() {
        let dir = TempDir::new().unwrap();
        let manifest = write_temp_file(
            &dir,
            "manifest.json",
            r#"{"package": {"path": "example.com/apis/v1"}, "targets": []}"#,
        );

        cmd()
            .args(["generate", "--universe", UNIVERSE])
            .args(["--manifest", manifest.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("loading manifest"));
    }

    #[test]
    fn unknown_role_type() {
        let dir = TempDir::new().unwrap();
        let universe = write_temp_file(&dir, "universe.json", SMALL_UNIVERSE);
        let manifest = write_temp_file(
            &dir,
            "manifest.json",
            &small_manifest("example.com/rds.ModifyInput"),
        );

        cmd()
            .args(["generate", "--universe", universe.to_str().unwrap()])
            .args(["--manifest", manifest.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains(
                "target Params: unknown create_input type example.com/rds.ModifyInput",
            ));
    }

    #[test]
    fn unknown_dependency() {
        let dir = TempDir::new().unwrap();
        let universe = write_temp_file(
            &dir,
            "universe.json",
            r#"{"types": [
                {"package": "example.com/rds", "name": "CreateInput", "kind": "struct", "fields": [
                    {"name": "Engine", "type": "example.com/rds.Engine"}
                ]}
            ]}"#,
        );
        let manifest = write_temp_file(
            &dir,
            "manifest.json",
            &small_manifest("example.com/rds.CreateInput"),
        );

        cmd()
            .args(["generate", "--universe", universe.to_str().unwrap()])
            .args(["--manifest", manifest.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("example.com/rds.Engine"));
    }
}

mod required_args {
    use super::*;

    #[test]
    fn generate_requires_manifest() {
        cmd()
            .args(["generate", "--universe", UNIVERSE])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--manifest"));
    }

    #[test]
    fn closure_requires_type() {
        cmd()
            .args(["closure", "--universe", UNIVERSE])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--type"));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Aggregate CRUD operation types and emit their declarations",
            ));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("crud-typegen"));
    }

    #[test]
    fn generate_help() {
        cmd()
            .args(["generate", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--universe"))
            .stdout(predicate::str::contains("--template-dir"))
            .stdout(predicate::str::contains("--force"));
    }
}

#[cfg(feature = "remote")]
mod remote {
    use super::*;

    #[test]
    fn universe_from_url() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/universe.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SMALL_UNIVERSE)
            .create();

        let dir = TempDir::new().unwrap();
        let manifest = write_temp_file(
            &dir,
            "manifest.json",
            &small_manifest("example.com/rds.CreateInput"),
        );

        cmd()
            .args(["generate", "--universe", &format!("{}/universe.json", server.url())])
            .args(["--manifest", manifest.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "type Params struct {\n\tName string `json:\"name\"`\n}\n",
            ));

        mock.assert();
    }

    #[test]
    fn universe_url_404() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/missing.json").with_status(404).create();

        cmd()
            .args([
                "closure",
                "--universe",
                &format!("{}/missing.json", server.url()),
                "--type",
                "example.com/rds.CreateInput",
            ])
            .assert()
            .code(3) // Network errors are exit code 3
            .stderr(
                predicate::str::contains("failed to fetch").or(predicate::str::contains("404")),
            );
    }
}
