mod common;

use common::{
    link_speaker, seed_conference, seed_event, seed_location, seed_skill, seed_user,
    user_skill_rows, utc,
};
use ldto_core::repo::event_user_repo::{event_user_ids, remove_event_user};
use ldto_core::repo::skill_repo::{replace_user_skill, user_skill_scores};
use ldto_core::repo::subscription_repo::list_subscriptions;
use ldto_core::{
    open_db_in_memory, Conference, ConferenceTrait, Event, EventTrait, Record, SkillTrait, User,
    UserTrait,
};

#[test]
fn conference_lists_its_events_by_start() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "2016", None);
    let other_id = seed_conference(&conn, "2017", None);
    seed_event(
        &conn,
        conference_id,
        "closing",
        utc(2016, 10, 22, 17, 0),
        utc(2016, 10, 22, 18, 0),
    );
    seed_event(
        &conn,
        conference_id,
        "opening",
        utc(2016, 10, 22, 9, 0),
        utc(2016, 10, 22, 9, 30),
    );
    seed_event(
        &conn,
        other_id,
        "elsewhere",
        utc(2017, 10, 28, 9, 0),
        utc(2017, 10, 28, 9, 30),
    );

    let conference = Conference::factory_from_uid(&conn, "2016")
        .query_row()
        .unwrap()
        .unwrap();
    let events = conference
        .factory_event_by_conference(&conn)
        .unwrap()
        .query_rows()
        .unwrap();
    let uids = events
        .iter()
        .map(|event| event.event_uid().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(uids, ["opening", "closing"]);

    let parent = events[0].event_conference(&conn).unwrap().unwrap();
    assert_eq!(parent.conference_uid().unwrap(), "2016");
}

#[test]
fn conference_location_exposes_geo_when_complete() {
    let conn = open_db_in_memory().unwrap();
    let with_geo = seed_location(&conn, "unito", Some((45.07, 7.68)));
    let without_geo = seed_location(&conn, "somewhere", None);
    seed_conference(&conn, "2016", Some(with_geo));
    seed_conference(&conn, "2017", Some(without_geo));
    seed_conference(&conn, "2018", None);

    let geo_of = |uid: &str| {
        let conference = Conference::factory_from_uid(&conn, uid)
            .query_row()
            .unwrap()
            .unwrap();
        conference
            .conference_location(&conn)
            .unwrap()
            .and_then(|location| location.geo())
    };

    assert_eq!(geo_of("2016"), Some((45.07, 7.68)));
    assert_eq!(geo_of("2017"), None);
    assert_eq!(geo_of("2018"), None);
}

#[test]
fn event_speakers_and_user_events_follow_the_join() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "2016", None);
    let talk = seed_event(
        &conn,
        conference_id,
        "kernel",
        utc(2016, 10, 22, 10, 0),
        utc(2016, 10, 22, 11, 0),
    );
    let workshop = seed_event(
        &conn,
        conference_id,
        "git",
        utc(2016, 10, 22, 14, 0),
        utc(2016, 10, 22, 16, 0),
    );
    let ada = seed_user(&conn, "ada", "Ada", "Lovelace");
    let linus = seed_user(&conn, "linus", "Linus", "Torvalds");
    seed_user(&conn, "idle", "Idle", "User");

    link_speaker(&conn, talk, linus, 1);
    link_speaker(&conn, talk, ada, 0);
    link_speaker(&conn, workshop, ada, 0);

    let event = Event::factory_by_id(&conn, talk).query_row().unwrap().unwrap();
    let mut speakers = event
        .factory_user_by_event(&conn)
        .unwrap()
        .query_rows()
        .unwrap()
        .iter()
        .map(|user| user.user_full_name().unwrap())
        .collect::<Vec<_>>();
    speakers.sort();
    assert_eq!(speakers, ["Ada Lovelace", "Linus Torvalds"]);
    assert_eq!(event_user_ids(&conn, talk).unwrap(), [ada, linus]);

    let user = User::factory_by_id(&conn, ada).query_row().unwrap().unwrap();
    assert_eq!(
        user.factory_event_by_user(&conn).unwrap().count().unwrap(),
        2
    );

    assert_eq!(remove_event_user(&conn, workshop, ada).unwrap(), 1);
    assert_eq!(
        user.factory_event_by_user(&conn).unwrap().count().unwrap(),
        1
    );
}

#[test]
fn repeated_skill_assignment_keeps_one_row_per_pair() {
    let mut conn = open_db_in_memory().unwrap();
    let ada = seed_user(&conn, "ada", "Ada", "Lovelace");
    let rust = seed_skill(&conn, "rust", Some("Rust programming"));
    let sql = seed_skill(&conn, "sql", None);

    replace_user_skill(&mut conn, ada, rust, 1).unwrap();
    replace_user_skill(&mut conn, ada, rust, 3).unwrap();
    replace_user_skill(&mut conn, ada, sql, -1).unwrap();

    assert_eq!(user_skill_rows(&conn, ada, rust), 1);
    let scores = user_skill_scores(&conn, ada).unwrap();
    assert_eq!(scores.get(&rust), Some(&3));
    assert_eq!(scores.get(&sql), Some(&-1));

    let user = User::factory_by_id(&conn, ada).query_row().unwrap().unwrap();
    let mut phrases = user
        .factory_user_skills(&conn)
        .unwrap()
        .query_rows()
        .unwrap()
        .iter()
        .map(|skill| skill.skill_phrase().unwrap().to_string())
        .collect::<Vec<_>>();
    phrases.sort();
    assert_eq!(phrases, ["Rust programming", "sql"]);
}

#[test]
fn add_subscription_reports_existing_subscriptions() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "2016", None);
    let id = seed_event(
        &conn,
        conference_id,
        "git",
        utc(2016, 10, 22, 14, 0),
        utc(2016, 10, 22, 16, 0),
    );
    let event = Event::factory_by_id(&conn, id).query_row().unwrap().unwrap();

    assert!(!event.add_subscription(&conn, "ada@example.org").unwrap());
    assert!(event.add_subscription(&conn, " ADA@example.org ").unwrap());
    assert!(!event.add_subscription(&conn, "linus@example.org").unwrap());

    assert_eq!(
        list_subscriptions(&conn, id).unwrap(),
        ["ada@example.org", "linus@example.org"]
    );
}

#[test]
fn event_passed_is_strict_against_stored_end() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "2016", None);
    let end = utc(2016, 10, 22, 11, 0);
    let id = seed_event(&conn, conference_id, "kernel", utc(2016, 10, 22, 10, 0), end);
    let event = Event::factory_by_id(&conn, id).query_row().unwrap().unwrap();

    assert!(!event.is_event_passed_at(end).unwrap());
    assert!(event
        .is_event_passed_at(end + chrono::Duration::seconds(1))
        .unwrap());
    assert!(event.is_event_passed().unwrap());
}
