#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use ldto_core::model::location::{Location, LocationColumn};
use ldto_core::repo::event_user_repo::add_event_user;
use ldto_core::{
    ColumnValue, Conference, ConferenceColumn, Event, EventColumn, Record, Skill, SkillColumn,
    User, UserColumn,
};
use rusqlite::Connection;

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

pub fn seed_location(conn: &Connection, uid: &str, geo: Option<(f64, f64)>) -> i64 {
    let mut payload = vec![
        ColumnValue::new(LocationColumn::Uid, uid),
        ColumnValue::new(LocationColumn::Name, "Dipartimento di Informatica"),
        ColumnValue::new(LocationColumn::Address, "Via Pessinetto 12, Torino"),
    ];
    if let Some((lat, lon)) = geo {
        payload.push(ColumnValue::new(LocationColumn::Lat, lat));
        payload.push(ColumnValue::new(LocationColumn::Lon, lon));
    }
    Location::insert_row(conn, &payload).unwrap()
}

pub fn seed_conference(conn: &Connection, uid: &str, location_id: Option<i64>) -> i64 {
    Conference::insert_row(
        conn,
        &[
            ColumnValue::new(ConferenceColumn::Uid, uid),
            ColumnValue::new(ConferenceColumn::Title, "Linux Day"),
            ColumnValue::new(ConferenceColumn::Url, "https://linuxdaytorino.org/2016/"),
            ColumnValue::new(ConferenceColumn::Description, "Free software day"),
            ColumnValue::new(ConferenceColumn::Start, utc(2016, 10, 22, 9, 0)),
            ColumnValue::new(ConferenceColumn::End, utc(2016, 10, 22, 18, 0)),
            ColumnValue::new(ConferenceColumn::LocationId, location_id),
        ],
    )
    .unwrap()
}

pub fn seed_event(
    conn: &Connection,
    conference_id: i64,
    uid: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> i64 {
    Event::insert_row(
        conn,
        &[
            ColumnValue::new(EventColumn::Uid, uid),
            ColumnValue::new(EventColumn::Title, format!("Talk {uid}")),
            ColumnValue::new(EventColumn::Start, start),
            ColumnValue::new(EventColumn::End, end),
            ColumnValue::new(EventColumn::ConferenceId, conference_id),
        ],
    )
    .unwrap()
}

pub fn seed_user(conn: &Connection, uid: &str, name: &str, surname: &str) -> i64 {
    User::insert_row(
        conn,
        &[
            ColumnValue::new(UserColumn::Uid, uid),
            ColumnValue::new(UserColumn::Name, name),
            ColumnValue::new(UserColumn::Surname, surname),
        ],
    )
    .unwrap()
}

pub fn seed_skill(conn: &Connection, uid: &str, phrase: Option<&str>) -> i64 {
    Skill::insert_row(
        conn,
        &[
            ColumnValue::new(SkillColumn::Uid, uid),
            ColumnValue::new(SkillColumn::Phrase, phrase),
        ],
    )
    .unwrap()
}

pub fn link_speaker(conn: &Connection, event_id: i64, user_id: i64, order: i64) {
    add_event_user(conn, event_id, user_id, order).unwrap();
}

pub fn user_skill_rows(conn: &Connection, user_id: i64, skill_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM user_skill WHERE user_ID = ?1 AND skill_ID = ?2;",
        [user_id, skill_id],
        |row| row.get(0),
    )
    .unwrap()
}
