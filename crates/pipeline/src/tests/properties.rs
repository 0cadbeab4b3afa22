use super::support::{doc_snippets, web_snippets, FnFactory, Harness, StubTool};
use crate::session::Session;
use crate::types::{
    HallucinationVerdict, PipelineErrorKind, PipelineOutcome, RouteDecision, FALLBACK_ANSWER,
    REMEDIATION_NOTE,
};
use ragcrew_core::AppError;
use std::path::Path;
use std::sync::atomic::Ordering;

const GROUNDED: &str = "ANSWER: It relies on attention.\nGROUNDED: yes";
const UNGROUNDED: &str = "ANSWER: It relies on recurrence.\nGROUNDED: no";

fn grounded_harness() -> Harness {
    Harness::new(
        StubTool::returning("document_search", doc_snippets()),
        StubTool::returning("web_search", web_snippets()),
    )
    .router(&["vectorstore"])
    .retriever(&["transformer attention"])
    .grader(&["RELEVANT: 1"])
    .checker(&[GROUNDED])
    .answerer(&["The Transformer relies entirely on attention."])
}

#[tokio::test]
async fn test_grounded_run_answers_from_documents() {
    let harness = grounded_harness();
    let outcome = harness.pipeline().run("What does the Transformer rely on?").await;

    match &outcome {
        PipelineOutcome::Answered {
            answer,
            degradations,
        } => {
            assert_eq!(answer.text, "The Transformer relies entirely on attention.");
            assert_eq!(answer.route, RouteDecision::VectorStore);
            assert_eq!(answer.verdict, HallucinationVerdict::Grounded);
            assert!(!answer.remediated);
            assert_eq!(answer.sources, vec![doc_snippets()[0].provenance.clone()]);
            assert!(degradations.is_empty());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(harness.document.queries(), vec!["transformer attention"]);
    assert_eq!(harness.web.calls(), 0);
}

#[tokio::test]
async fn test_model_failure_still_yields_answer_text() {
    // Router has no scripted replies, so its call fails.
    let harness = Harness::new(
        StubTool::returning("document_search", doc_snippets()),
        StubTool::returning("web_search", web_snippets()),
    );
    let outcome = harness.pipeline().run("Anything?").await;

    assert_eq!(outcome.error_kind(), Some(PipelineErrorKind::Model));
    assert!(!outcome.answer_text().trim().is_empty());
    assert_eq!(harness.document.calls() + harness.web.calls(), 0);
}

#[tokio::test]
async fn test_blank_replies_fall_back_to_fixed_sentence() {
    let harness = grounded_harness()
        .checker(&["ANSWER:\nGROUNDED: yes"])
        .answerer(&[""]);
    let outcome = harness.pipeline().run("What?").await;

    assert!(!outcome.is_error());
    assert_eq!(outcome.answer_text(), FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_blank_final_reply_uses_draft() {
    let harness = grounded_harness().answerer(&["<think>nothing to add</think>"]);
    let outcome = harness.pipeline().run("What?").await;

    assert_eq!(outcome.answer_text(), "It relies on attention.");
}

#[tokio::test]
async fn test_blank_question_fails_without_model_calls() {
    let harness = grounded_harness();
    let outcome = harness.pipeline().run("   ").await;

    assert_eq!(outcome.error_kind(), Some(PipelineErrorKind::Internal));
    assert!(!outcome.answer_text().is_empty());
    assert_eq!(harness.router.calls(), 0);
}

#[tokio::test]
async fn test_malformed_route_defaults_to_web_search() {
    let harness = grounded_harness().router(&["Hmm, vectorstore or maybe web_search?"]);
    let outcome = harness.pipeline().run("Who won yesterday?").await;

    assert_eq!(outcome.route(), Some(RouteDecision::WebSearch));
    assert_eq!(
        outcome.degradations().iter().map(|d| d.kind).collect::<Vec<_>>(),
        vec![PipelineErrorKind::RoutingError]
    );
    assert_eq!(harness.web.calls(), 1);
    assert_eq!(harness.document.calls(), 0);
}

#[tokio::test]
async fn test_empty_retrieval_skips_grader_model() {
    let harness = Harness::new(
        StubTool::returning("document_search", Vec::new()),
        StubTool::returning("web_search", web_snippets()),
    )
    .router(&["vectorstore"])
    .retriever(&["query"])
    .checker(&[GROUNDED])
    .answerer(&["final"]);
    let outcome = harness.pipeline().run("q").await;

    assert_eq!(harness.grader.calls(), 0);
    assert!(outcome
        .degradations()
        .iter()
        .any(|d| d.kind == PipelineErrorKind::GradingDegraded));
}

#[tokio::test]
async fn test_two_ungrounded_verdicts_remediate_once() {
    let harness = grounded_harness()
        .checker(&[UNGROUNDED, UNGROUNDED])
        .answerer(&["Best effort answer."]);
    let outcome = harness.pipeline().run("What does the Transformer rely on?").await;

    match &outcome {
        PipelineOutcome::Answered { answer, .. } => {
            assert!(answer.remediated);
            assert_eq!(answer.verdict, HallucinationVerdict::Ungrounded);
            assert!(answer.text.starts_with("Best effort answer."));
            assert!(answer.text.ends_with(REMEDIATION_NOTE));
            assert!(answer.sources.iter().all(|p| matches!(
                p,
                ragcrew_tools::Provenance::Web { .. }
            )));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(harness.web.calls(), 1);
    assert_eq!(harness.web.queries(), vec!["What does the Transformer rely on?"]);
    assert_eq!(harness.checker.calls(), 2);
    assert_eq!(harness.answerer.calls(), 1);
}

#[tokio::test]
async fn test_remediation_search_failure() {
    let harness = Harness::new(
        StubTool::returning("document_search", doc_snippets()),
        StubTool::failing("web_search", "quota exceeded"),
    )
    .router(&["vectorstore"])
    .retriever(&["query"])
    .grader(&["RELEVANT: 1,2"])
    .checker(&[UNGROUNDED]);
    let outcome = harness.pipeline().run("q").await;

    assert_eq!(
        outcome.error_kind(),
        Some(PipelineErrorKind::HallucinationRemediation)
    );
    assert!(outcome.answer_text().contains("quota exceeded"));
}

#[tokio::test]
async fn test_failed_recheck_is_a_remediation_failure() {
    // Only the first check is scripted, so the re-check call fails.
    let harness = grounded_harness().checker(&[UNGROUNDED]);
    let outcome = harness.pipeline().run("What does the Transformer rely on?").await;

    assert_eq!(
        outcome.error_kind(),
        Some(PipelineErrorKind::HallucinationRemediation)
    );
    assert!(!outcome.answer_text().trim().is_empty());
    assert_eq!(harness.web.calls(), 1);
    assert_eq!(harness.checker.calls(), 2);
    assert_eq!(harness.answerer.calls(), 0);
}

#[tokio::test]
async fn test_failed_redraft_finalise_is_a_remediation_failure() {
    let harness = Harness::new(
        StubTool::returning("document_search", doc_snippets()),
        StubTool::returning("web_search", web_snippets()),
    )
    .router(&["vectorstore"])
    .retriever(&["query"])
    .grader(&["RELEVANT: 1"])
    .checker(&[UNGROUNDED, GROUNDED]);
    let outcome = harness.pipeline().run("q").await;

    assert_eq!(
        outcome.error_kind(),
        Some(PipelineErrorKind::HallucinationRemediation)
    );
    assert_eq!(harness.web.calls(), 1);
}

#[tokio::test]
async fn test_document_failure_is_flagged_and_never_switches_tools() {
    let harness = Harness::new(
        StubTool::failing("document_search", "index unavailable"),
        StubTool::returning("web_search", web_snippets()),
    )
    .router(&["vectorstore"])
    .retriever(&["query"]);
    let pipeline = harness.pipeline();
    let slot = std::sync::Mutex::new(Some(pipeline));
    let factory = FnFactory::new(move |_| {
        slot.lock()
            .unwrap()
            .take()
            .ok_or_else(|| AppError::PipelineInitialization("already built".to_string()))
    });

    let mut session = Session::new(factory);
    session.initialize(Path::new("attention.pdf")).await.unwrap();
    let entry = session.submit("What is multi-head attention?").await.unwrap();

    assert!(entry.error_flag);
    assert_eq!(entry.error_kind, Some(PipelineErrorKind::RetrievalFailure));
    assert!(entry.answer.contains("index unavailable"));
    assert_eq!(harness.document.calls(), 1);
    assert_eq!(harness.web.calls(), 0);
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_history_append_clear_and_reinitialize() {
    let factory = FnFactory::new(|_| {
        let harness = Harness::new(
            StubTool::returning("document_search", doc_snippets()),
            StubTool::returning("web_search", web_snippets()),
        )
        .router(&["web_search", "web_search", "web_search"])
        .retriever(&["q1", "q2", "q3"])
        .grader(&["RELEVANT: 1", "RELEVANT: 1", "RELEVANT: 1"])
        .checker(&[GROUNDED, GROUNDED, GROUNDED])
        .answerer(&["first", "second", "third"]);
        Ok(harness.pipeline())
    });

    let mut session = Session::new(factory.clone());
    assert!(!session.is_initialized());
    session.initialize(Path::new("corpus")).await.unwrap();
    assert_eq!(session.corpus_path(), Some(Path::new("corpus")));

    for question in ["one", "two", "three"] {
        session.submit(question).await.unwrap();
    }

    let history = session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(
        history.iter().map(|e| e.query.as_str()).collect::<Vec<_>>(),
        vec!["one", "two", "three"]
    );
    assert_eq!(
        history.iter().map(|e| e.answer.as_str()).collect::<Vec<_>>(),
        vec!["first", "second", "third"]
    );
    assert!(history.iter().all(|e| !e.error_flag && e.processing_time >= 0.0));
    assert!(history[0].timestamp <= history[2].timestamp);

    session.clear_history();
    assert!(session.history().is_empty());
    assert!(session.is_initialized());

    session.initialize(Path::new("other")).await.unwrap();
    assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    assert_eq!(session.corpus_path(), Some(Path::new("other")));
    let entry = session.submit("again").await.unwrap();
    assert_eq!(entry.answer, "first");
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_submit_before_initialize() {
    let factory = FnFactory::new(|_| {
        Err(AppError::PipelineInitialization("unused".to_string()))
    });
    let mut session = Session::new(factory);

    let err = session.submit("hello").await.unwrap_err();
    assert!(matches!(err, AppError::PipelineInitialization(_)));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_failed_initialize_keeps_previous_pipeline() {
    let factory = FnFactory::new(|path| {
        if path == Path::new("bad") {
            return Err(AppError::Retrieval("unreadable corpus".to_string()));
        }
        Ok(grounded_harness().pipeline())
    });
    let mut session = Session::new(factory);
    session.initialize(Path::new("good")).await.unwrap();

    let err = session.initialize(Path::new("bad")).await.unwrap_err();
    assert!(matches!(err, AppError::PipelineInitialization(ref m) if m.contains("unreadable")));
    assert!(session.is_initialized());
    assert_eq!(session.corpus_path(), Some(Path::new("good")));

    let entry = session.submit("still works?").await.unwrap();
    assert!(!entry.error_flag);
}

#[tokio::test]
async fn test_blank_submission_is_rejected() {
    let factory = FnFactory::new(|_| Ok(grounded_harness().pipeline()));
    let mut session = Session::new(factory);
    session.initialize(Path::new("good")).await.unwrap();

    assert!(session.submit("  ").await.is_err());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_entry_serializes_for_the_ui() {
    let factory = FnFactory::new(|_| Ok(grounded_harness().pipeline()));
    let mut session = Session::new(factory);
    session.initialize(Path::new("good")).await.unwrap();
    let entry = session.submit("What does the Transformer rely on?").await.unwrap();

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["query"], "What does the Transformer rely on?");
    assert_eq!(json["error_flag"], false);
    assert_eq!(json["route"], "vectorstore");
    assert!(json.get("error_kind").is_none());
    assert_eq!(json["verdict"], "grounded");
    assert_eq!(json["sources"][0]["kind"], "document");
    assert_eq!(json["degradations"], serde_json::json!([]));
}

#[tokio::test]
async fn test_routing_degradation_reaches_the_history() {
    let factory = FnFactory::new(|_| Ok(grounded_harness().router(&["no idea"]).pipeline()));
    let mut session = Session::new(factory);
    session.initialize(Path::new("good")).await.unwrap();
    let entry = session.submit("Who won yesterday?").await.unwrap();

    assert!(!entry.error_flag);
    assert_eq!(entry.route, Some(RouteDecision::WebSearch));
    assert_eq!(entry.verdict, Some(HallucinationVerdict::Grounded));
    assert_eq!(
        entry.degradations.iter().map(|d| d.kind).collect::<Vec<_>>(),
        vec![PipelineErrorKind::RoutingError]
    );

    let json = serde_json::to_value(&session.history()[0]).unwrap();
    assert_eq!(json["degradations"][0]["kind"], "RoutingError");
}

#[tokio::test]
async fn test_failed_entry_has_no_verdict() {
    let factory = FnFactory::new(|_| {
        Ok(Harness::new(
            StubTool::returning("document_search", doc_snippets()),
            StubTool::returning("web_search", web_snippets()),
        )
        .pipeline())
    });
    let mut session = Session::new(factory);
    session.initialize(Path::new("good")).await.unwrap();
    let entry = session.submit("Anything?").await.unwrap();

    assert!(entry.error_flag);
    assert_eq!(entry.verdict, None);
    assert!(entry.degradations.is_empty());
}
