use std::ffi::OsString;
use std::path::PathBuf;

use mdfixture_core::contract::{ConversionJob, DocumentConverter};
use mdfixture_core::error::FixtureError;
use mdfixture_core::export::PandocConverter;
use serial_test::serial;
use tempfile::tempdir;

fn job(include_in_header: Option<PathBuf>) -> ConversionJob {
    ConversionJob {
        input: PathBuf::from("/tmp/in.md"),
        output: PathBuf::from("/tmp/out.pdf"),
        extra_args: vec!["--toc".to_string()],
        include_in_header,
    }
}

#[test]
fn test_command_args_order() {
    let converter = PandocConverter::new("pandoc", "12pt");
    let args = converter.command_args(&job(Some(PathBuf::from("/tmp/nohyphenation"))));
    let expected: Vec<OsString> = [
        "/tmp/in.md",
        "-f",
        "markdown",
        "-o",
        "/tmp/out.pdf",
        "--toc",
        "-V",
        "margin-left=12pt",
        "-V",
        "margin-right=12pt",
        "-V",
        "margin-top=12pt",
        "-V",
        "margin-bottom=12pt",
        "--include-in-header=/tmp/nohyphenation",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    assert_eq!(args, expected);
}

#[test]
fn test_command_args_without_header_include() {
    let converter = PandocConverter::new("pandoc", "10pt");
    let args = converter.command_args(&job(None));
    assert_eq!(args.len(), 14);
    assert!(!args
        .iter()
        .any(|arg| arg.to_string_lossy().starts_with("--include-in-header")));
}

#[tokio::test]
#[serial]
async fn test_missing_program_is_unavailable() {
    let converter = PandocConverter::new("definitely-not-a-real-converter-binary", "10pt");
    let err = converter.convert(&job(None)).await.unwrap_err();
    match err {
        FixtureError::ConverterUnavailable { program, .. } => {
            assert_eq!(program, "definitely-not-a-real-converter-binary")
        }
        other => panic!("expected ConverterUnavailable, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_non_zero_exit_is_conversion_error() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("fake-pandoc.sh");
    std::fs::write(&script, "#!/bin/sh\necho 'boom' >&2\nexit 43\n").unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = std::fs::metadata(&script).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&script, permissions).unwrap();
    }

    let converter = PandocConverter::new(&script, "10pt");
    let err = converter.convert(&job(None)).await.unwrap_err();
    match err {
        FixtureError::ConversionProcess {
            exit_code, stderr, ..
        } => {
            assert_eq!(exit_code, Some(43));
            assert_eq!(stderr, "boom");
        }
        other => panic!("expected ConversionProcess, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_successful_conversion_returns_ok() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("fake-pandoc.sh");
    let output = dir.path().join("out.html");
    // Writes to the path following `-o`.
    std::fs::write(
        &script,
        "#!/bin/sh\nwhile [ \"$1\" != \"-o\" ]; do shift; done\necho converted > \"$2\"\n",
    )
    .unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = std::fs::metadata(&script).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&script, permissions).unwrap();
    }

    let converter = PandocConverter::new(&script, "10pt");
    let job = ConversionJob {
        output: output.clone(),
        ..job(None)
    };
    converter.convert(&job).await.unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "converted\n");
}
