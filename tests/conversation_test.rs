use campus_portal::application::conversation::{AUTO_REPLY, ConversationSession, Directory};
use campus_portal::domain::conversation::{Author, Correspondent};
use std::time::Duration;

const DELAY: Duration = Duration::from_secs(1);

fn session() -> ConversationSession {
    ConversationSession::new(Directory::demo()).with_reply(DELAY, AUTO_REPLY)
}

#[tokio::test(start_paused = true)]
async fn test_send_appends_now_and_replies_later() {
    let session = session();
    session.select_correspondent("c1").unwrap();
    let before = session.messages().len();

    let sent = session.send("When do exams start?").unwrap();
    let log = session.messages();
    assert_eq!(log.len(), before + 1);
    assert_eq!(log.last().unwrap(), &sent);
    assert_eq!(sent.author, Author::Me);

    tokio::time::sleep(DELAY / 2).await;
    assert_eq!(session.messages().len(), before + 1);

    tokio::time::sleep(DELAY).await;
    let log = session.messages();
    assert_eq!(log.len(), before + 2);
    let reply = log.last().unwrap();
    assert_eq!(reply.author, Author::Counterpart);
    assert_eq!(reply.body, AUTO_REPLY);
    assert_ne!(reply.id, sent.id);
}

#[tokio::test(start_paused = true)]
async fn test_reply_lands_after_interim_messages() {
    let session = session();
    session.select_correspondent("c2").unwrap();
    let before = session.messages().len();

    session.send("first").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    session.send("second").unwrap();
    tokio::time::sleep(DELAY * 2).await;

    let tail: Vec<(Author, String)> = session.messages()[before..]
        .iter()
        .map(|m| (m.author, m.body.clone()))
        .collect();
    assert_eq!(
        tail,
        vec![
            (Author::Me, "first".to_string()),
            (Author::Me, "second".to_string()),
            (Author::Counterpart, AUTO_REPLY.to_string()),
            (Author::Counterpart, AUTO_REPLY.to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_message_schedules_nothing() {
    let session = session();
    session.select_correspondent("c3").unwrap();
    let before = session.messages().len();

    assert!(session.send(" \t\n").is_none());
    tokio::time::sleep(DELAY * 2).await;
    assert_eq!(session.messages().len(), before);
}

#[tokio::test(start_paused = true)]
async fn test_reply_is_dropped_after_switching_correspondent() {
    let session = session();
    session.select_correspondent("c1").unwrap();
    session.send("hello").unwrap();

    session.select_correspondent("c3").unwrap();
    let after_switch = session.messages();
    tokio::time::sleep(DELAY * 2).await;

    assert_eq!(session.messages(), after_switch);
    assert_eq!(session.active().unwrap().id, "c3");
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_messages_sees_the_reply() {
    let session = session();
    session.select_correspondent("c2").unwrap();
    let before = session.messages().len();

    session.send("Any news on my project?").unwrap();
    assert!(session.wait_for_messages(before + 2, DELAY * 3).await);
    assert_eq!(session.messages().last().unwrap().author, Author::Counterpart);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_messages_gives_up_when_reply_is_dropped() {
    let session = session();
    session.select_correspondent("c1").unwrap();
    session.send("hello").unwrap();
    session.select_correspondent("c2").unwrap();
    let after_switch = session.messages().len();

    assert!(!session.wait_for_messages(after_switch + 1, DELAY * 3).await);
    assert_eq!(session.messages().len(), after_switch);
}

#[test]
fn test_send_outside_runtime_appends_nothing() {
    let session = session();
    session.select_correspondent("c3").unwrap();
    let before = session.messages();

    assert!(session.send("Are my books ready?").is_none());
    assert_eq!(session.messages(), before);
}

#[test]
fn test_unread_is_zero_right_after_selection() {
    let directory = Directory::new(vec![
        Correspondent::new("a", "Registrar").with_unread(5),
        Correspondent::new("b", "Bursar").with_unread(1),
    ]);
    let session = ConversationSession::new(directory);

    session.select_correspondent("a").unwrap();
    assert_eq!(session.correspondent("a").unwrap().unread_count, 0);
    assert_eq!(session.correspondent("b").unwrap().unread_count, 1);
}
