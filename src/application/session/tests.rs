use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;

use super::*;
use crate::adapters::memory::{
    InMemoryDocumentRepository, LoopbackConnector, LoopbackPeer, MockRenderer,
    MockSectionGenerator,
};
use crate::domain::document::{Document, Section};
use crate::domain::foundation::UserId;
use crate::domain::realtime::{ActiveUser, ChannelState, RealtimeMessage};
use crate::ports::{ChannelError, DocumentStoreError, ExportError, OrganizationProfile};

const DOC: &str = "prop-1";

fn proposal() -> Document {
    Document::new(
        DOC,
        "Cloud Migration",
        vec![
            Section::new("s1", "1.0 Intro", "", 1),
            Section::new("s2", "2.0 Approach", "", 2),
            Section::new("s3", "3.0 Team", "", 3),
        ],
    )
    .with_reference_number("W91-24-R-0001")
}

fn sid(s: &str) -> SectionId {
    SectionId::new(s)
}

fn config() -> SessionConfig {
    SessionConfig::new(LocalUser::new("alice", "Alice")).with_organization(OrganizationProfile {
        organization_name: "Acme Federal".into(),
        ..Default::default()
    })
}

struct Harness {
    session: EditingSession,
    repository: InMemoryDocumentRepository,
    renderer: MockRenderer,
    generator: MockSectionGenerator,
    peer: LoopbackPeer,
}

async fn open_with(repository: InMemoryDocumentRepository) -> Harness {
    let renderer = MockRenderer::new();
    let generator = MockSectionGenerator::new();
    let (connector, peer) = LoopbackConnector::pair();
    let services = SessionServices {
        documents: Arc::new(repository.clone()),
        renderer: Arc::new(renderer.clone()),
        generator: Arc::new(generator.clone()),
        connector: Arc::new(connector),
    };

    let session = EditingSession::open(DocumentId::new(DOC), Credential::new("token"), config(), services)
        .await
        .unwrap();

    Harness {
        session,
        repository,
        renderer,
        generator,
        peer,
    }
}

async fn open() -> Harness {
    open_with(InMemoryDocumentRepository::new().with_document(proposal())).await
}

async fn next_matching(
    events: &mut broadcast::Receiver<SessionEvent>,
    wanted: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    loop {
        let event = events.recv().await.unwrap();
        if wanted(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn open_activates_first_section_and_connects() {
    let h = open().await;

    let snapshot = h.session.snapshot().await.unwrap();

    assert_eq!(snapshot.active_section, Some(sid("s1")));
    assert_eq!(snapshot.buffer.as_deref(), Some(""));
    assert_eq!(snapshot.channel_state, ChannelState::Open);
    assert_eq!(snapshot.save_status, SaveStatus::Saved);
    assert_eq!(snapshot.metadata.reference_number.as_deref(), Some("W91-24-R-0001"));
}

#[tokio::test]
async fn open_fails_when_document_cannot_be_loaded() {
    let (connector, _peer) = LoopbackConnector::pair();
    let services = SessionServices {
        documents: Arc::new(InMemoryDocumentRepository::new()),
        renderer: Arc::new(MockRenderer::new()),
        generator: Arc::new(MockSectionGenerator::new()),
        connector: Arc::new(connector),
    };

    let err = EditingSession::open(DocumentId::new("missing"), Credential::new("t"), config(), services)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SessionError::Load(DocumentStoreError::DocumentNotFound(DocumentId::new("missing")))
    );
}

#[tokio::test(start_paused = true)]
async fn failed_connect_degrades_to_local_editing() {
    let repository = InMemoryDocumentRepository::new().with_document(proposal());
    let services = SessionServices {
        documents: Arc::new(repository.clone()),
        renderer: Arc::new(MockRenderer::new()),
        generator: Arc::new(MockSectionGenerator::new()),
        connector: Arc::new(LoopbackConnector::failing(ChannelError::ConnectFailed(
            "refused".into(),
        ))),
    };
    let session = EditingSession::open(DocumentId::new(DOC), Credential::new("t"), config(), services)
        .await
        .unwrap();

    session.edit("offline text").await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.channel_state, ChannelState::Disconnected);
    assert_eq!(snapshot.save_status, SaveStatus::Saved);
    assert_eq!(repository.saves().len(), 1);
    assert_eq!(repository.saves()[0].content, "offline text");
}

#[tokio::test(start_paused = true)]
async fn switching_sections_commits_outgoing_text_before_the_timer() {
    let h = open().await;

    h.session.activate_section(&sid("s2")).await.unwrap();
    h.session.edit("Our approach is...").await.unwrap();
    let activation = h.session.activate_section(&sid("s3")).await.unwrap();

    assert_eq!(activation.previous, Some(sid("s2")));
    let snapshot = h.session.snapshot().await.unwrap();
    assert_eq!(snapshot.section_content(&sid("s2")), Some("Our approach is..."));
    assert_eq!(snapshot.active_section, Some(sid("s3")));
    assert_eq!(snapshot.buffer.as_deref(), Some(""));

    // The forced save lands without waiting out the quiet period.
    sleep(Duration::from_millis(10)).await;
    let saves = h.repository.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].section_id, sid("s2"));
    assert_eq!(saves[0].content, "Our approach is...");
}

#[tokio::test(start_paused = true)]
async fn rapid_keystrokes_produce_one_save_after_quiet_period() {
    let h = open().await;

    for text in ["H", "He", "Hel", "Hell", "Hello"] {
        h.session.edit(text).await.unwrap();
        sleep(Duration::from_millis(40)).await;
    }
    // Last keystroke at ~160ms; the save is due at ~2160ms.
    sleep(Duration::from_millis(1850)).await;
    assert!(h.repository.saves().is_empty());
    assert_eq!(h.session.snapshot().await.unwrap().save_status, SaveStatus::Pending);

    sleep(Duration::from_millis(300)).await;
    let saves = h.repository.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].content, "Hello");
    assert_eq!(
        h.repository.section_content(&DocumentId::new(DOC), &sid("s1")).as_deref(),
        Some("Hello")
    );
    assert_eq!(h.session.snapshot().await.unwrap().save_status, SaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn every_keystroke_is_broadcast() {
    let mut h = open().await;

    h.session.edit("a").await.unwrap();
    h.session.edit("ab").await.unwrap();

    for expected in ["a", "ab"] {
        let message = h.peer.from_session.recv().await.unwrap();
        assert_eq!(
            message,
            RealtimeMessage::ContentChanged {
                user_id: UserId::new("alice"),
                section_id: sid("s1"),
                content: expected.into(),
            }
        );
    }
}

#[tokio::test]
async fn remote_change_to_other_section_is_applied() {
    let h = open().await;
    let mut events = h.session.subscribe();

    h.peer
        .to_session
        .send(RealtimeMessage::ContentChanged {
            user_id: UserId::new("bob"),
            section_id: sid("s2"),
            content: "draft text".into(),
        })
        .await
        .unwrap();

    let event = next_matching(&mut events, |e| {
        matches!(e, SessionEvent::RemoteContentApplied { .. })
    })
    .await;
    assert_eq!(
        event,
        SessionEvent::RemoteContentApplied {
            section_id: sid("s2"),
            user_id: UserId::new("bob"),
        }
    );

    let snapshot = h.session.snapshot().await.unwrap();
    assert_eq!(snapshot.section_content(&sid("s2")), Some("draft text"));
    assert_eq!(snapshot.section_content(&sid("s1")), Some(""));
}

#[tokio::test]
async fn remote_change_to_active_section_is_ignored() {
    let h = open().await;
    let mut events = h.session.subscribe();
    h.session.edit("mine").await.unwrap();

    h.peer
        .to_session
        .send(RealtimeMessage::ContentChanged {
            user_id: UserId::new("bob"),
            section_id: sid("s1"),
            content: "theirs".into(),
        })
        .await
        .unwrap();

    next_matching(&mut events, |e| {
        matches!(e, SessionEvent::RemoteContentIgnored { .. })
    })
    .await;

    let snapshot = h.session.snapshot().await.unwrap();
    assert_eq!(snapshot.buffer.as_deref(), Some("mine"));
    assert_eq!(snapshot.section_content(&sid("s1")), Some(""));
}

#[tokio::test]
async fn own_echoes_are_ignored() {
    let h = open().await;
    let mut events = h.session.subscribe();

    h.peer
        .to_session
        .send(RealtimeMessage::ContentChanged {
            user_id: UserId::new("alice"),
            section_id: sid("s2"),
            content: "echo".into(),
        })
        .await
        .unwrap();
    h.peer
        .to_session
        .send(RealtimeMessage::UserJoined {
            user_id: UserId::new("bob"),
            user_name: Some("Bob".into()),
        })
        .await
        .unwrap();

    next_matching(&mut events, |e| matches!(e, SessionEvent::PresenceChanged { .. })).await;

    let snapshot = h.session.snapshot().await.unwrap();
    assert_eq!(snapshot.section_content(&sid("s2")), Some(""));
}

#[tokio::test]
async fn presence_roster_follows_hub_and_clamps_cursors() {
    let h = open().await;
    let mut events = h.session.subscribe();
    h.session.edit("short").await.unwrap();

    let messages = [
        RealtimeMessage::InitialState {
            user_id: Some(UserId::new("alice")),
            active_users: vec![
                ActiveUser::new(UserId::new("alice"), "Alice", 0),
                ActiveUser::new(UserId::new("bob"), "Bob", 3),
            ],
        },
        RealtimeMessage::UserJoined {
            user_id: UserId::new("carol"),
            user_name: Some("Carol".into()),
        },
        RealtimeMessage::CursorUpdate {
            user_id: UserId::new("carol"),
            section_id: Some(sid("s1")),
            position: 400,
        },
        RealtimeMessage::UserLeft {
            user_id: UserId::new("bob"),
        },
    ];
    for message in messages {
        h.peer.to_session.send(message).await.unwrap();
    }
    for _ in 0..4 {
        next_matching(&mut events, |e| matches!(e, SessionEvent::PresenceChanged { .. })).await;
    }

    let snapshot = h.session.snapshot().await.unwrap();
    assert_eq!(snapshot.collaborators.len(), 1);
    let carol = snapshot.collaborator(&UserId::new("carol")).unwrap();
    assert_eq!(carol.name, "Carol");
    assert_eq!(carol.section_id, Some(sid("s1")));
    // Clamped to the live buffer length of "short".
    assert_eq!(carol.offset, 5);
    assert!(snapshot.collaborator(&UserId::new("alice")).is_none());
}

#[tokio::test]
async fn closed_channel_is_reported_and_roster_cleared() {
    let h = open().await;
    let mut events = h.session.subscribe();
    h.peer
        .to_session
        .send(RealtimeMessage::UserJoined {
            user_id: UserId::new("bob"),
            user_name: None,
        })
        .await
        .unwrap();
    next_matching(&mut events, |e| matches!(e, SessionEvent::PresenceChanged { .. })).await;

    drop(h.peer);

    let event = next_matching(&mut events, |e| {
        matches!(e, SessionEvent::ChannelStateChanged { .. })
    })
    .await;
    assert_eq!(
        event,
        SessionEvent::ChannelStateChanged {
            state: ChannelState::Disconnected
        }
    );
    let snapshot = h.session.snapshot().await.unwrap();
    assert!(snapshot.collaborators.is_empty());
    assert_eq!(snapshot.channel_state, ChannelState::Disconnected);

    // Editing still works without collaboration.
    h.session.edit("still typing").await.unwrap();
}

#[tokio::test]
async fn move_cursor_clamps_and_broadcasts() {
    let mut h = open().await;
    h.session.edit("abc").await.unwrap();
    let _ = h.peer.from_session.recv().await;

    let offset = h.session.move_cursor(10).await.unwrap();

    assert_eq!(offset, 3);
    assert_eq!(
        h.peer.from_session.recv().await.unwrap(),
        RealtimeMessage::CursorUpdate {
            user_id: UserId::new("alice"),
            section_id: Some(sid("s1")),
            position: 3,
        }
    );
}

#[tokio::test]
async fn activating_unknown_section_is_an_error() {
    let h = open().await;

    let err = h.session.activate_section(&sid("s9")).await.unwrap_err();

    assert_eq!(err, SessionError::SectionNotFound(sid("s9")));
    assert_eq!(h.session.snapshot().await.unwrap().active_section, Some(sid("s1")));
}

#[tokio::test(start_paused = true)]
async fn failed_save_is_reported_without_blocking_edits() {
    let repository = InMemoryDocumentRepository::new().with_document(proposal());
    repository.fail_saves(Some(DocumentStoreError::unavailable("503")));
    let h = open_with(repository).await;
    let mut events = h.session.subscribe();

    h.session.edit("draft").await.unwrap();
    let failure = next_matching(&mut events, |e| matches!(e, SessionEvent::SaveFailed { .. })).await;

    assert!(matches!(failure, SessionEvent::SaveFailed { section_id, .. } if section_id == sid("s1")));
    let snapshot = h.session.snapshot().await.unwrap();
    assert!(matches!(snapshot.save_status, SaveStatus::Failed { .. }));
    assert_eq!(snapshot.buffer.as_deref(), Some("draft"));
    assert_eq!(snapshot.section_content(&sid("s1")), Some("draft"));

    // No automatic retry.
    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.repository.saves().len(), 1);

    // A later successful save of the same section clears the failure.
    h.repository.fail_saves(None);
    h.session.edit("draft 2").await.unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(h.session.snapshot().await.unwrap().save_status, SaveStatus::Saved);
    assert_eq!(
        h.repository.section_content(&DocumentId::new(DOC), &sid("s1")).as_deref(),
        Some("draft 2")
    );
}

#[tokio::test(start_paused = true)]
async fn failure_stays_visible_after_other_section_saves() {
    let repository = InMemoryDocumentRepository::new().with_document(proposal());
    repository.fail_saves(Some(DocumentStoreError::unavailable("503")));
    let h = open_with(repository).await;
    let mut events = h.session.subscribe();

    h.session.edit("intro draft").await.unwrap();
    next_matching(&mut events, |e| matches!(e, SessionEvent::SaveFailed { .. })).await;

    h.repository.fail_saves(None);
    h.session.activate_section(&sid("s2")).await.unwrap();
    h.session.edit("approach").await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    let snapshot = h.session.snapshot().await.unwrap();
    assert_eq!(
        h.repository.section_content(&DocumentId::new(DOC), &sid("s2")).as_deref(),
        Some("approach")
    );
    assert_eq!(
        h.repository.section_content(&DocumentId::new(DOC), &sid("s1")).as_deref(),
        Some("")
    );
    assert!(matches!(snapshot.save_status, SaveStatus::Failed { .. }));
}

#[tokio::test(start_paused = true)]
async fn close_makes_a_last_attempt_for_failed_sections() {
    let repository = InMemoryDocumentRepository::new().with_document(proposal());
    repository.fail_saves(Some(DocumentStoreError::unavailable("503")));
    let h = open_with(repository).await;
    let mut events = h.session.subscribe();

    h.session.edit("intro draft").await.unwrap();
    next_matching(&mut events, |e| matches!(e, SessionEvent::SaveFailed { .. })).await;
    h.session.activate_section(&sid("s2")).await.unwrap();

    h.repository.fail_saves(None);
    let status = h.session.close().await.unwrap();

    assert_eq!(status, SaveStatus::Saved);
    assert_eq!(
        h.repository.section_content(&DocumentId::new(DOC), &sid("s1")).as_deref(),
        Some("intro draft")
    );
}

#[tokio::test(start_paused = true)]
async fn close_reports_failure_when_last_attempt_fails() {
    let repository = InMemoryDocumentRepository::new().with_document(proposal());
    repository.fail_saves(Some(DocumentStoreError::unavailable("503")));
    let h = open_with(repository).await;

    h.session.edit("intro draft").await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    let status = h.session.close().await.unwrap();

    assert!(matches!(status, SaveStatus::Failed { .. }));
    assert_eq!(h.repository.saves().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn close_flushes_pending_edits_and_waits_for_saves() {
    let repository = InMemoryDocumentRepository::new()
        .with_document(proposal())
        .with_save_delay(Duration::from_millis(500));
    let h = open_with(repository).await;

    h.session.edit("unsaved").await.unwrap();
    let status = h.session.close().await.unwrap();

    assert_eq!(status, SaveStatus::Saved);
    assert_eq!(
        h.repository.section_content(&DocumentId::new(DOC), &sid("s1")).as_deref(),
        Some("unsaved")
    );
    assert_eq!(h.session.snapshot().await.unwrap_err(), SessionError::Closed);
}

#[tokio::test(start_paused = true)]
async fn edit_during_in_flight_save_is_saved_afterwards() {
    let repository = InMemoryDocumentRepository::new()
        .with_document(proposal())
        .with_save_delay(Duration::from_millis(3000));
    let h = open_with(repository).await;

    h.session.edit("first").await.unwrap();
    // Save starts at 2000ms and takes until 5000ms.
    sleep(Duration::from_millis(2100)).await;
    assert_eq!(h.session.snapshot().await.unwrap().save_status, SaveStatus::Saving);
    h.session.edit("second").await.unwrap();

    sleep(Duration::from_secs(10)).await;
    let contents: Vec<String> = h.repository.saves().into_iter().map(|s| s.content).collect();
    assert_eq!(contents, vec!["first".to_string(), "second".to_string()]);
}

#[tokio::test]
async fn export_reflects_unsaved_buffer() {
    let h = open().await;
    h.session.activate_section(&sid("s2")).await.unwrap();
    h.session.edit("Our approach is...").await.unwrap();

    let exported = h.session.export(ExportFormat::Docx).await.unwrap();

    assert_eq!(exported.filename, "W91-24-R-0001.docx");
    let requests = h.renderer.requests();
    assert_eq!(requests.len(), 1);
    let sections = &requests[0].document.sections;
    assert_eq!(
        sections.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
        vec!["s1", "s2", "s3"]
    );
    assert_eq!(sections[1].content, "Our approach is...");
    assert_eq!(requests[0].document.organization.organization_name, "Acme Federal");
}

#[tokio::test]
async fn export_failure_is_surfaced_to_caller() {
    let renderer = MockRenderer::new().with_error(ExportError::Rejected {
        status: 502,
        message: "bad gateway".into(),
    });
    let (connector, _peer) = LoopbackConnector::pair();
    let session = EditingSession::open(
        DocumentId::new(DOC),
        Credential::new("t"),
        config(),
        SessionServices {
            documents: Arc::new(InMemoryDocumentRepository::new().with_document(proposal())),
            renderer: Arc::new(renderer),
            generator: Arc::new(MockSectionGenerator::new()),
            connector: Arc::new(connector),
        },
    )
    .await
    .unwrap();

    let err = session.export(ExportFormat::Pdf).await.unwrap_err();

    assert!(matches!(err, SessionError::Export(ExportError::Rejected { status: 502, .. })));
    // The session is unaffected.
    session.edit("still fine").await.unwrap();
}

#[tokio::test]
async fn build_export_request_lists_every_section() {
    let h = open().await;
    h.session.edit("intro").await.unwrap();

    let request = h.session.build_export_request(ExportFormat::Xlsx).await.unwrap();

    assert_eq!(request.format, ExportFormat::Xlsx);
    assert_eq!(request.document.sections.len(), 3);
    assert_eq!(request.document.sections[0].content, "intro");
}

#[tokio::test]
async fn suggestion_is_only_applied_when_accepted() {
    let h = open().await;
    h.session.activate_section(&sid("s2")).await.unwrap();
    h.session.edit("rough notes").await.unwrap();

    let suggestion = h
        .session
        .suggest_section(vec!["Describe the migration plan".into()], "win theme: speed")
        .await
        .unwrap();

    assert_eq!(suggestion, "Draft for 2.0 Approach.");
    let call = &h.generator.calls()[0];
    assert_eq!(call.section_title, "2.0 Approach");
    assert_eq!(call.requirements, vec!["Describe the migration plan".to_string()]);
    assert_eq!(
        h.session.snapshot().await.unwrap().buffer.as_deref(),
        Some("rough notes")
    );

    h.session.accept_suggestion(suggestion.clone()).await.unwrap();
    assert_eq!(
        h.session.snapshot().await.unwrap().buffer.as_deref(),
        Some(suggestion.as_str())
    );
}
