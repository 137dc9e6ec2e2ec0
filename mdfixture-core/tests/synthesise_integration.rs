use std::path::PathBuf;

use mdfixture_core::blocks::BlockRequest;
use mdfixture_core::compose::DocumentComposer;
use mdfixture_core::config::ExportConfig;
use mdfixture_core::contract::{MockDocumentConverter, MockPageRenderer};
use mdfixture_core::error::FixtureError;
use mdfixture_core::export::{ExportPipeline, ExportTarget};
use mdfixture_core::random::RandomContentProvider;
use mdfixture_core::synthesise::{synthesise, DocumentJob};
use tempfile::tempdir;

fn blocks() -> Vec<BlockRequest> {
    vec![
        BlockRequest::new("header").option("level", 1),
        BlockRequest::new("paragraphs")
            .option("amount", 2)
            .option("keywords", vec!["invoice", "overdue"])
            .option("kwDistance", 3),
    ]
}

#[tokio::test]
async fn test_synthesise_exports_every_job_in_order() {
    let out = tempdir().unwrap();
    let scratch = tempdir().unwrap();

    let mut converter = MockDocumentConverter::new();
    converter.expect_convert().times(1).returning(|job| {
        std::fs::write(&job.output, b"%PDF fake").unwrap();
        Ok(())
    });

    let jobs = vec![
        DocumentJob {
            output: out.path().join("plain.md"),
            target: None,
            blocks: blocks(),
        },
        DocumentJob {
            output: out.path().join("report.pdf"),
            target: None,
            blocks: blocks(),
        },
    ];

    let mut composer = DocumentComposer::new(RandomContentProvider::with_seed(99));
    let pipeline = ExportPipeline::new(
        converter,
        MockPageRenderer::new(),
        ExportConfig {
            scratch_dir: scratch.path().to_path_buf(),
            ..ExportConfig::default()
        },
    );
    let report = synthesise(&jobs, &mut composer, &pipeline).await.unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.documents[0].target, "markdown");
    assert_eq!(report.documents[0].path, out.path().join("plain.md"));
    assert_eq!(report.documents[1].target, "file");
    assert_eq!(report.documents[1].bytes_written, b"%PDF fake".len());

    let markdown = std::fs::read_to_string(out.path().join("plain.md")).unwrap();
    assert!(markdown.starts_with("# "), "{markdown}");
    assert!(markdown.contains("invoice"), "{markdown}");
    assert!(markdown.contains("overdue"), "{markdown}");
    assert_eq!(report.documents[0].bytes_written, markdown.len());
}

#[tokio::test]
async fn test_explicit_target_overrides_extension() {
    let out = tempdir().unwrap();
    let scratch = tempdir().unwrap();

    let mut converter = MockDocumentConverter::new();
    converter.expect_convert().times(1).returning(|job| {
        assert_eq!(job.extra_args, vec!["--standalone".to_string()]);
        std::fs::write(&job.output, b"converted").unwrap();
        Ok(())
    });

    let jobs = vec![DocumentJob {
        output: out.path().join("page.md.html"),
        target: Some(ExportTarget::File {
            args: vec!["--standalone".to_string()],
        }),
        blocks: blocks(),
    }];

    let mut composer = DocumentComposer::new(RandomContentProvider::with_seed(1));
    let pipeline = ExportPipeline::new(
        converter,
        MockPageRenderer::new(),
        ExportConfig {
            scratch_dir: scratch.path().to_path_buf(),
            ..ExportConfig::default()
        },
    );
    let report = synthesise(&jobs, &mut composer, &pipeline).await.unwrap();
    assert_eq!(report.documents[0].target, "file");
}

#[tokio::test]
async fn test_synthesise_stops_at_first_failure() {
    let out = tempdir().unwrap();
    let scratch = tempdir().unwrap();

    let mut converter = MockDocumentConverter::new();
    converter.expect_convert().times(1).returning(|_| {
        Err(FixtureError::ConversionProcess {
            program: "pandoc".to_string(),
            exit_code: Some(1),
            stderr: "unknown output format".to_string(),
        })
    });

    let last: PathBuf = out.path().join("never.md");
    let jobs = vec![
        DocumentJob {
            output: out.path().join("broken.xyz"),
            target: None,
            blocks: blocks(),
        },
        DocumentJob {
            output: last.clone(),
            target: None,
            blocks: blocks(),
        },
    ];

    let mut composer = DocumentComposer::new(RandomContentProvider::with_seed(2));
    let pipeline = ExportPipeline::new(
        converter,
        MockPageRenderer::new(),
        ExportConfig {
            scratch_dir: scratch.path().to_path_buf(),
            ..ExportConfig::default()
        },
    );
    let err = synthesise(&jobs, &mut composer, &pipeline)
        .await
        .unwrap_err();

    assert!(matches!(err, FixtureError::ConversionProcess { .. }), "{err:?}");
    assert!(!last.exists());
}

#[test]
fn test_job_config_deserializes() {
    let job: DocumentJob = serde_json::from_str(
        r#"{
            "output": "out/mail.eml",
            "target": {"kind": "email", "subject": "Hello"},
            "blocks": [{"block": "paragraphs", "amount": 1}]
        }"#,
    )
    .unwrap();

    assert_eq!(job.blocks.len(), 1);
    assert_eq!(job.blocks[0].block, "paragraphs");
    assert_eq!(job.resolved_target().kind(), "email");

    let inferred: DocumentJob = serde_json::from_str(r#"{"output": "shot.png"}"#).unwrap();
    assert_eq!(inferred.resolved_target(), ExportTarget::Image);
    assert!(inferred.blocks.is_empty());
}
