use ::common::config::{ApiConfig, ArchiveFormat, JudgeConfig};
use taskgen::metadata::MetadataProber;
use taskgen::submit::build_submission;
use taskgen::{
    Attachment, AttachmentKind, Pipeline, RubricItem, RubricModel, Session, SubmissionClient,
    SubmissionOutcome, TaskDraft,
};

use crate::common::{TestApp, routes};

fn session() -> Session {
    let mut draft = TaskDraft::new();
    draft.task_name = "sample-task".into();
    draft.sector = "Government".into();
    draft.occupation = "Compliance Officers".into();
    draft.instruction = "List every compliance gap you can find in the attached memo.".into();
    draft.expert_hours = 2.0;
    draft.junior_hours = 5.5;
    draft.rubric = RubricModel::from_items([
        RubricItem::new("Accuracy", "Every gap is real", 10),
        RubricItem::new("Coverage", "", 15),
        RubricItem::new("Clarity", "", 5),
    ]);

    let mut session = Session::new(draft);
    session.attach(
        AttachmentKind::Solution,
        Attachment::from_bytes("answer.txt", b"1. Missing retention policy\n".to_vec()),
    );
    session.attach(
        AttachmentKind::Reference,
        Attachment::from_bytes("memo.md", b"# Memo\n".to_vec()),
    );
    session
}

fn client_for(app: &TestApp) -> SubmissionClient {
    SubmissionClient::new(&ApiConfig {
        base_url: format!("{}/", app.base_url()),
        enabled: true,
        timeout_secs: 10,
    })
    .unwrap()
}

#[tokio::test]
async fn generated_package_is_stored_by_collector() {
    let app = TestApp::spawn().await;
    let out = tempfile::tempdir().unwrap();
    let mut pipeline = Pipeline::new(
        MetadataProber::disabled(),
        client_for(&app),
        JudgeConfig::default(),
        ArchiveFormat::Zip,
    );
    let mut session = session();

    let report = pipeline
        .request_generate(&mut session, out.path())
        .await
        .unwrap();
    assert!(report.archive_path.exists());

    let SubmissionOutcome::Saved(record) = &report.submission else {
        panic!("expected saved outcome, got {:?}", report.submission);
    };
    assert_eq!(record.task_id, report.task_id.as_str());
    assert_eq!(record.status, "pending");
    assert_eq!(
        report.submission.status_line(),
        "Successfully saved to database"
    );

    let res = app.get(&routes::task(report.task_id.as_str())).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["task_name"], "sample-task");
}

#[tokio::test]
async fn duplicate_submission_surfaces_server_detail() {
    let app = TestApp::spawn().await;
    let client = client_for(&app);
    let mut session = session();
    let task_id = session.get_or_create_task_id();

    let draft = &session.draft;
    let items = draft.rubric.list_items();
    let artifacts = taskgen::templates::Artifacts::render(draft, &items, &JudgeConfig::default());
    let payload = build_submission(&task_id, draft, &items, &artifacts, &Default::default());

    assert!(client.submit(&payload).await.is_saved());
    let second = client.submit(&payload).await;
    assert_eq!(
        second,
        SubmissionOutcome::Failed("Task with this ID already exists".into())
    );
    assert_eq!(
        second.status_line(),
        "Database save failed: Task with this ID already exists"
    );
}
