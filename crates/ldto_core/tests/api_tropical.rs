mod common;

use common::{seed_conference, seed_event, seed_location, utc};
use ldto_core::api::tropical::handle;
use ldto_core::{
    open_db_in_memory, ApiError, ColumnValue, Event, EventColumn, Record, RequestContext,
    SiteApi, StaticAuthorizer,
};

fn generated_at() -> chrono::DateTime<chrono::Utc> {
    utc(2016, 10, 1, 8, 0)
}

#[test]
fn missing_conference_argument_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let authorizer = StaticAuthorizer::anonymous();

    for ctx in [
        RequestContext::new(&authorizer),
        RequestContext::new(&authorizer).with_query("conference", ""),
    ] {
        let err = handle(&conn, &ctx, generated_at()).unwrap_err();
        assert_eq!(
            err,
            ApiError::NotFound("Missing 'conference' argument".to_string())
        );
    }
}

#[test]
fn unknown_conference_and_event_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed_conference(&conn, "2016", None);
    let authorizer = StaticAuthorizer::anonymous();

    let ctx = RequestContext::new(&authorizer).with_query("conference", "1999");
    assert_eq!(
        handle(&conn, &ctx, generated_at()).unwrap_err(),
        ApiError::NotFound("Conference not found".to_string())
    );

    let ctx = RequestContext::new(&authorizer)
        .with_query("conference", "2016")
        .with_query("event", "missing");
    let err = handle(&conn, &ctx, generated_at()).unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(err.message(), "Event not found");
}

#[test]
fn conference_export_uses_conference_data_and_location_geo() {
    let conn = open_db_in_memory().unwrap();
    let location_id = seed_location(&conn, "unito", Some((45.07, 7.68)));
    let conference_id = seed_conference(&conn, "2016", Some(location_id));
    let authorizer = StaticAuthorizer::anonymous();
    let ctx = RequestContext::new(&authorizer).with_query("conference", "2016");

    let response = handle(&conn, &ctx, generated_at()).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("text/calendar"));
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=2016.ics")
    );

    let lines = response.body.split("\r\n").collect::<Vec<_>>();
    let uid_line = format!("UID:{conference_id}");
    assert!(lines.contains(&uid_line.as_str()));
    assert!(!lines.contains(&"UID:2016"));
    assert!(lines.contains(&"SUMMARY:Linux Day"));
    assert!(lines.contains(&"DESCRIPTION:Free software day"));
    assert!(lines.contains(&"URL;VALUE=URI:https://linuxdaytorino.org/2016/"));
    assert!(lines.contains(&"GEO:45.07;7.68"));
    assert!(lines.contains(&"DTSTART:20161022T090000Z"));
    assert!(lines.contains(&"DTEND:20161022T180000Z"));
    assert!(lines.contains(&"DTSTAMP:20161001T080000Z"));
}

#[test]
fn event_export_uses_event_id_and_names_file_after_uids() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "2016", None);
    let event_id = seed_event(
        &conn,
        conference_id,
        "kernel",
        utc(2016, 10, 22, 15, 0),
        utc(2016, 10, 22, 16, 0),
    );
    let authorizer = StaticAuthorizer::anonymous();
    let ctx = RequestContext::new(&authorizer)
        .with_query("conference", "2016")
        .with_query("event", "kernel");

    let response = handle(&conn, &ctx, generated_at()).unwrap();
    let body = &response.body;
    assert!(body.contains(&format!("UID:{event_id}\r\n")));
    assert!(!body.contains("UID:2016-kernel"));
    assert!(body.contains("SUMMARY:Talk kernel\r\n"));
    assert!(body.contains("DTSTART:20161022T150000Z\r\n"));
    assert!(!body.contains("DESCRIPTION:"));
    assert!(!body.contains("URL;VALUE=URI:"));
    assert!(!body.contains("GEO:"));
    assert!(body.ends_with("END:VCALENDAR\r\n"));
    assert_eq!(
        response.header("Content-Disposition"),
        Some("attachment; filename=2016-kernel.ics")
    );
}

#[test]
fn event_permalink_becomes_url_line() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "2016", None);
    let event_id = seed_event(
        &conn,
        conference_id,
        "git",
        utc(2016, 10, 22, 14, 0),
        utc(2016, 10, 22, 16, 0),
    );
    Event::update_by_id(
        &conn,
        event_id,
        &[
            ColumnValue::new(EventColumn::Url, "https://linuxdaytorino.org/2016/git"),
            ColumnValue::new(EventColumn::Description, "Branching\n<em>for real</em>"),
        ],
    )
    .unwrap();
    let authorizer = StaticAuthorizer::anonymous();
    let ctx = RequestContext::new(&authorizer)
        .with_query("conference", "2016")
        .with_query("event", "git");

    let body = handle(&conn, &ctx, generated_at()).unwrap().body;
    assert!(body.contains("URL;VALUE=URI:https://linuxdaytorino.org/2016/git\r\n"));
    assert!(body.contains("DESCRIPTION:Branching for real\r\n"));
}

#[test]
fn debug_flag_skips_download_headers() {
    let mut conn = open_db_in_memory().unwrap();
    seed_conference(&conn, "2016", None);
    let authorizer = StaticAuthorizer::anonymous();
    let ctx = RequestContext::new(&authorizer)
        .with_query("conference", "2016")
        .with_query("debug", "1");

    let api = SiteApi::try_new(&mut conn, "https://linuxdaytorino.org").unwrap();
    let response = api.tropical(&ctx);
    assert_eq!(response.status, 200);
    assert!(response.headers.is_empty());
    assert!(response.body.starts_with("BEGIN:VCALENDAR\r\n"));

    let missing = api.tropical(&RequestContext::new(&authorizer));
    assert_eq!(missing.status, 404);
    assert_eq!(missing.body, "Missing 'conference' argument");
}
