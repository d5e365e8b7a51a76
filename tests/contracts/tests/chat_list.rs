use chatlist_client::{ChatListScreen, ChatListView, ClientConfig, StoreError};
use chatlist_contracts::{chats_document, eventually, user, ScriptedDirectory};
use chatlist_model::RecipientName;
use serde_json::json;
use std::sync::Arc;

fn mount(directory: &ScriptedDirectory, uid: &str) -> ChatListScreen {
    ChatListScreen::mount(
        Arc::new(directory.clone()),
        directory.config().clone(),
        Some(user(uid)),
    )
    .unwrap()
}

#[tokio::test]
async fn empty_chats_issue_no_lookups() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.publish_chats(&user("me"), json!({ "chats": [] }));

    let screen = mount(&directory, "me");
    screen.settle().await;

    assert!(screen.chats().is_empty());
    assert_eq!(screen.view(), ChatListView::Empty);
    assert_eq!(directory.total_lookups(), 0);
}

#[tokio::test]
async fn missing_chats_field_is_empty() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.publish_chats(&user("me"), json!({ "updatedAt": 5 }));

    let screen = mount(&directory, "me");
    screen.settle().await;

    assert!(screen.chats().is_empty());
    assert!(screen.is_subscribed());
}

#[tokio::test]
async fn resolves_display_name() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.add_user("u1", "Alice");
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "hi", 1000)]));

    let screen = mount(&directory, "me");
    screen.settle().await;

    assert_eq!(screen.chats()[0].chat_id, "c1");
    assert_eq!(
        screen.names().get("u1"),
        Some(&RecipientName::Resolved("Alice".into()))
    );
}

#[tokio::test]
async fn transport_failure_records_error_sentinel() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.fail_user("u1", StoreError::Transport("connection reset".into()));
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "hi", 1000)]));

    let screen = mount(&directory, "me");
    screen.settle().await;

    let name = screen.name_for("u1");
    assert_eq!(name, RecipientName::LookupFailed);
    assert_eq!(name.as_str(), "Error");
    assert_eq!(screen.rows()[0].display_name(), "Error");
}

#[tokio::test]
async fn missing_or_blank_records_are_unknown_user() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.add_user("blank", "  ");
    directory.publish_chats(
        &user("me"),
        chats_document(&[("c1", "ghost", "", 1), ("c2", "blank", "", 2)]),
    );

    let screen = mount(&directory, "me");
    screen.settle().await;

    assert_eq!(screen.name_for("ghost"), RecipientName::UnknownUser);
    assert_eq!(screen.name_for("blank"), RecipientName::UnknownUser);
    for row in screen.rows() {
        assert!(!row.display_name().trim().is_empty());
    }
}

#[tokio::test]
async fn recurring_uid_is_looked_up_once() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.add_user("u1", "Alice");
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "hi", 1000)]));

    let screen = mount(&directory, "me");
    screen.settle().await;

    directory.publish_chats(
        &user("me"),
        chats_document(&[("c1", "u1", "still there?", 2000)]),
    );
    assert!(screen.wait_for_revision(2).await);
    screen.settle().await;

    assert_eq!(screen.chats()[0].last_message, "still there?");
    assert_eq!(directory.lookups_for("u1"), 1);
}

#[tokio::test]
async fn in_flight_uid_is_not_looked_up_again() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.add_user("u1", "Alice");
    directory.hold("u1");
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "hi", 1000)]));

    let screen = mount(&directory, "me");
    eventually(|| screen.resolver().is_pending("u1")).await;
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "again", 2000)]));
    assert!(screen.wait_for_revision(2).await);
    eventually(|| screen.resolver().lookups_issued() == 1).await;

    assert_eq!(screen.rows()[0].display_name(), "Loading...");

    directory.release("u1");
    screen.settle().await;
    assert_eq!(screen.rows()[0].display_name(), "Alice");
    assert_eq!(directory.lookups_for("u1"), 1);
}

#[tokio::test]
async fn out_of_order_batches_keep_both_names() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.add_user("u1", "Alice");
    directory.add_user("u2", "Bob");
    directory.hold("u1");
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "", 1)]));

    let screen = mount(&directory, "me");
    eventually(|| screen.resolver().is_pending("u1")).await;
    directory.publish_chats(
        &user("me"),
        chats_document(&[("c1", "u1", "", 1), ("c2", "u2", "", 2)]),
    );
    assert!(screen.wait_for_revision(2).await);

    let mut names = screen.resolver().watch();
    names
        .wait_for(|names| names.contains_key("u2"))
        .await
        .unwrap();
    assert_eq!(screen.name_for("u1"), RecipientName::Loading);

    directory.release("u1");
    screen.settle().await;
    let names = screen.names();
    assert_eq!(names["u1"], RecipientName::Resolved("Alice".into()));
    assert_eq!(names["u2"], RecipientName::Resolved("Bob".into()));
}

#[tokio::test]
async fn dismissed_screen_drops_late_results() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.add_user("u1", "Alice");
    directory.hold("u1");
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "hi", 1000)]));

    let mut screen = mount(&directory, "me");
    eventually(|| directory.lookups_for("u1") == 1).await;

    screen.dismiss();
    directory.release("u1");
    screen.settle().await;

    assert!(screen.names().is_empty());
    assert_eq!(
        directory.store().listener_count(&directory.chats_path(&user("me"))),
        0
    );
}

#[tokio::test]
async fn dropping_the_screen_releases_the_listener() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    let path = directory.chats_path(&user("me"));
    {
        let _screen = mount(&directory, "me");
        assert_eq!(directory.store().listener_count(&path), 1);
    }
    assert_eq!(directory.store().listener_count(&path), 0);
}

#[tokio::test]
async fn listener_error_releases_subscription() {
    let directory = ScriptedDirectory::new(ClientConfig::default());
    directory.publish_chats(&user("me"), chats_document(&[("c1", "u1", "hi", 1000)]));
    let path = directory.chats_path(&user("me"));

    let screen = mount(&directory, "me");
    screen.settle().await;
    directory
        .store()
        .close_listeners(&path, StoreError::PermissionDenied("signed out".into()));
    assert!(!screen.wait_for_revision(2).await);

    assert!(!screen.is_subscribed());
    assert_eq!(screen.chats().len(), 1);
    assert_eq!(directory.store().listener_count(&path), 0);
}
